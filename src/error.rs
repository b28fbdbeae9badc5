//! Error type shared by the engine, the stores and the write path.

use thiserror::Error;

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A referenced row (supplier, component, color, variant, picture) does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The write lacks enough (or consistent) context to derive its identifiers.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A derived identifier or a (component, color) pair is already taken.
    #[error("{identifier} '{value}' already exists")]
    Conflict {
        identifier: &'static str,
        value: String,
    },

    #[error("database error: {0}")]
    Database(sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        CatalogError::NotFound { entity, id }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        CatalogError::Validation(message.into())
    }

    pub fn conflict(identifier: &'static str, value: impl Into<String>) -> Self {
        CatalogError::Conflict {
            identifier,
            value: value.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, CatalogError::Conflict { .. })
    }
}

// SQLSTATE for unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let identifier = match db_err.constraint() {
                    Some("uq_component_variant_sku") => "variant_sku",
                    Some("uq_picture_name") => "picture_name",
                    Some("uq_component_variant_component_color") => "component_variant",
                    _ => "unique key",
                };
                return CatalogError::conflict(identifier, db_err.message());
            }
        }
        CatalogError::Database(err)
    }
}
