use super::{ComponentId, PictureId, VariantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Picture {
    pub id: PictureId,
    /// Always set; for variant pictures it equals the variant's component.
    pub component_id: ComponentId,
    pub variant_id: Option<VariantId>,
    pub picture_order: i32,
    pub picture_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Picture {
    pub const ENTITY: &'static str = "picture";

    pub fn is_component_level(&self) -> bool {
        self.variant_id.is_none()
    }
}

/// Either `component_id` or `variant_id` must be given. When `variant_id` is set the
/// component is taken from the variant; `picture_order` defaults to the next free slot.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct NewPicture {
    pub component_id: Option<ComponentId>,
    pub variant_id: Option<VariantId>,
    pub picture_order: Option<i32>,
}

impl NewPicture {
    pub fn for_component(component_id: ComponentId) -> Self {
        Self {
            component_id: Some(component_id),
            ..Default::default()
        }
    }

    pub fn for_variant(variant_id: VariantId) -> Self {
        Self {
            variant_id: Some(variant_id),
            ..Default::default()
        }
    }

    pub fn at(mut self, picture_order: i32) -> Self {
        self.picture_order = Some(picture_order);
        self
    }
}

/// Partial update. `variant_id: Some(None)` turns the picture into a component-level one.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PictureChanges {
    pub component_id: Option<ComponentId>,
    pub variant_id: Option<Option<VariantId>>,
    pub picture_order: Option<i32>,
}

/// A picture row ready for insertion, owner resolved and name derived.
#[derive(Debug, Clone)]
pub struct PictureDraft {
    pub component_id: ComponentId,
    pub variant_id: Option<VariantId>,
    pub picture_order: i32,
    pub picture_name: String,
}
