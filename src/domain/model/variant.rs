use super::{ColorId, ComponentId, VariantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ComponentVariant {
    pub id: VariantId,
    pub component_id: ComponentId,
    pub color_id: ColorId,
    pub variant_sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ComponentVariant {
    pub const ENTITY: &'static str = "component_variant";
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NewVariant {
    pub component_id: ComponentId,
    pub color_id: ColorId,
}

impl NewVariant {
    pub fn new(component_id: ComponentId, color_id: ColorId) -> Self {
        Self {
            component_id,
            color_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct VariantChanges {
    pub component_id: Option<ComponentId>,
    pub color_id: Option<ColorId>,
}

/// A variant row ready for insertion, SKU already derived.
#[derive(Debug, Clone)]
pub struct VariantDraft {
    pub component_id: ComponentId,
    pub color_id: ColorId,
    pub variant_sku: String,
}
