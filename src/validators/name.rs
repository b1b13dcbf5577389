use super::ValidationError;

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::NameEmpty);
    }

    if trimmed.len() > 100 {
        return Err(ValidationError::NameTooLong);
    }

    Ok(())
}
