use sqlx::SqlitePool;
use tracing::info;

/// Current schema version.  Bump this whenever the schema changes and add a
/// corresponding migration arm in `run_migrations`.
const SCHEMA_VERSION: i64 = 1;

/// Initialize the database schema and run any pending migrations.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    create_schema(pool).await?;
    run_migrations(pool).await?;
    Ok(())
}

async fn create_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // Role and preference columns are free text: values are resolved against
    // their registries at read time, so a stray value can never fail a read.
    // password_hash is NULL for accounts without a local credential.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id                     TEXT    PRIMARY KEY,
            email                  TEXT    NOT NULL UNIQUE,
            name                   TEXT,
            password_hash          TEXT,
            role                   TEXT    NOT NULL DEFAULT 'USER',
            theme_preference       TEXT    NOT NULL DEFAULT 'system',
            color_theme_preference TEXT    NOT NULL DEFAULT 'neutral',
            language_preference    TEXT    NOT NULL DEFAULT 'en',
            last_login_at          INTEGER,
            last_login_device      TEXT,
            created_at             INTEGER NOT NULL,
            updated_at             INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // --- Indexes --------------------------------------------------------

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_role       ON users(role)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Apply any schema migrations required to reach `SCHEMA_VERSION`.
///
/// Uses `PRAGMA user_version` as the migration counter.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let current_version: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    info!(
        "Database schema at version {}; target version {}",
        current_version, SCHEMA_VERSION
    );

    // Version 1 is the initial schema created above; later versions add their
    // ALTER statements here.

    sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
        .execute(pool)
        .await?;

    info!("Database schema is now at version {}", SCHEMA_VERSION);

    Ok(())
}
