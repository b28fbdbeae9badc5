//! Catalog entity rows and the payloads the write path accepts.
//!
//! Rows mirror the persisted tables one to one; derived columns (`variant_sku`,
//! `picture_name`) are only ever written by the engine.

pub mod color;
pub mod component;
pub mod picture;
pub mod supplier;
pub mod variant;

pub use color::{Color, NewColor};
pub use component::{Component, ComponentChanges, NewComponent};
pub use picture::{NewPicture, Picture, PictureChanges, PictureDraft};
pub use supplier::{NewSupplier, Supplier, SupplierChanges};
pub use variant::{ComponentVariant, NewVariant, VariantChanges, VariantDraft};

pub type SupplierId = i64;
pub type ColorId = i64;
pub type ComponentId = i64;
pub type VariantId = i64;
pub type PictureId = i64;

/// Trims a free-text field and maps blank input to `None`.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
