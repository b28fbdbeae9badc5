pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;

// Convenience re-exports (keeps call-sites clean)
pub use app::CatalogService;
pub use domain::model::{
    Color, Component, ComponentChanges, ComponentVariant, NewColor, NewComponent, NewPicture,
    NewSupplier, NewVariant, Picture, PictureChanges, Supplier, SupplierChanges, VariantChanges,
};
pub use domain::{compute_picture_name, compute_variant_sku, CascadeReport, StaleIdentifier};
pub use error::{CatalogError, CatalogResult};
pub use storage::{CatalogStore, CatalogTx, MemoryStore, PgCatalogStore};
