//! Centralized configuration (environment variables + defaults).

use anyhow::Context;
use std::path::PathBuf;

/// Database URL must be provided (no default) for safety.
pub fn database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

/// Pool size for the Postgres store (optional, default 5).
pub fn max_connections() -> anyhow::Result<u32> {
    match std::env::var("DATABASE_MAX_CONNECTIONS") {
        Ok(v) => {
            let n = v
                .parse::<u32>()
                .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;
            Ok(n.max(1))
        }
        Err(_) => Ok(5),
    }
}

/// Directory holding the reversible `*.up.sql` / `*.down.sql` migrations.
pub fn migrations_dir() -> PathBuf {
    std::env::var("CATALOG_MIGRATIONS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./migrations"))
}

/// Log filter used when `RUST_LOG` is not set.
pub fn log_filter() -> String {
    std::env::var("CATALOG_LOG").unwrap_or_else(|_| "component_catalog=info".to_string())
}
