//! Embedded database migrations for `SQLite`.
//!
//! Migrations are embedded at compile time, run programmatically, and
//! tracked in the `_roster_migrations` table.
//!
//! # Example
//!
//! ```rust,ignore
//! use roster::sqlite::migrations;
//! use sqlx::SqlitePool;
//!
//! async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::Error> {
//!     migrations::run(pool).await?;
//!     Ok(())
//! }
//! ```

use sqlx::{Executor, SqlitePool};

const CORE_MIGRATIONS: &[(&str, &str)] = &[
    (
        "20250115000001_create_organizations_table",
        include_str!("../../migrations_sqlite/core/20250115000001_create_organizations_table.sql"),
    ),
    (
        "20250115000002_create_memberships_table",
        include_str!("../../migrations_sqlite/core/20250115000002_create_memberships_table.sql"),
    ),
    (
        "20250115000003_create_invitations_table",
        include_str!("../../migrations_sqlite/core/20250115000003_create_invitations_table.sql"),
    ),
    (
        "20250115000004_create_active_selections_table",
        include_str!(
            "../../migrations_sqlite/core/20250115000004_create_active_selections_table.sql"
        ),
    ),
];

/// Runs all pending migrations.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    pool.execute(
        r"
        CREATE TABLE IF NOT EXISTS _roster_migrations (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )
        ",
    )
    .await?;

    run_migrations(pool, CORE_MIGRATIONS).await
}

/// Runs a set of migrations against the database.
///
/// # Limitations
///
/// SQL statements are split by semicolons (`;`). Migrations containing
/// semicolons within string literals will not work correctly; the bundled
/// migrations avoid this.
async fn run_migrations(pool: &SqlitePool, migrations: &[(&str, &str)]) -> Result<(), sqlx::Error> {
    for (name, sql) in migrations {
        let applied: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _roster_migrations WHERE name = ?)")
                .bind(*name)
                .fetch_one(pool)
                .await?;

        if !applied {
            // SQLite doesn't support multiple statements in one execute,
            // so split by semicolons and run each statement.
            for statement in sql.split(';') {
                let trimmed = statement.trim();
                if !trimmed.is_empty() {
                    pool.execute(trimmed).await?;
                }
            }

            sqlx::query("INSERT INTO _roster_migrations (name) VALUES (?)")
                .bind(*name)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}
