use super::{non_blank, SupplierId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    pub name: String,
    /// Short code used as the identifier prefix. Never stored blank.
    pub supplier_code: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Supplier {
    pub const ENTITY: &'static str = "supplier";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub supplier_code: Option<String>,
}

impl NewSupplier {
    pub fn new(name: impl Into<String>, supplier_code: Option<&str>) -> Self {
        Self {
            name: name.into(),
            supplier_code: supplier_code.map(str::to_string),
        }
    }

    pub(crate) fn cleaned_code(&self) -> Option<String> {
        non_blank(self.supplier_code.clone())
    }
}

/// Partial update. `supplier_code: Some(None)` (or a blank code) clears the code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupplierChanges {
    pub name: Option<String>,
    pub supplier_code: Option<Option<String>>,
}

impl SupplierChanges {
    pub fn code(supplier_code: Option<&str>) -> Self {
        Self {
            supplier_code: Some(supplier_code.map(str::to_string)),
            ..Default::default()
        }
    }
}
