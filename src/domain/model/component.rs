use super::{ComponentId, SupplierId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub product_number: String,
    pub description: Option<String>,
    pub supplier_id: Option<SupplierId>,
    pub created_at: DateTime<Utc>,
}

impl Component {
    pub const ENTITY: &'static str = "component";
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewComponent {
    pub product_number: String,
    pub description: Option<String>,
    pub supplier_id: Option<SupplierId>,
}

impl NewComponent {
    pub fn new(product_number: impl Into<String>) -> Self {
        Self {
            product_number: product_number.into(),
            ..Default::default()
        }
    }

    pub fn with_supplier(mut self, supplier_id: SupplierId) -> Self {
        self.supplier_id = Some(supplier_id);
        self
    }
}

/// Partial update. Only `product_number` and `supplier_id` feed derived identifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComponentChanges {
    pub product_number: Option<String>,
    pub description: Option<Option<String>>,
    pub supplier_id: Option<Option<SupplierId>>,
}

impl ComponentChanges {
    pub fn product_number(product_number: impl Into<String>) -> Self {
        Self {
            product_number: Some(product_number.into()),
            ..Default::default()
        }
    }

    pub fn supplier(supplier_id: Option<SupplierId>) -> Self {
        Self {
            supplier_id: Some(supplier_id),
            ..Default::default()
        }
    }
}
