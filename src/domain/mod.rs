//! The derived identifier engine: naming, propagation, uniqueness and repair.

pub mod model;
pub mod naming;
pub mod propagation;
pub mod repair;
pub mod uniqueness;

pub use naming::{compute_picture_name, compute_variant_sku, normalize_segment, MAIN_PICTURE_TOKEN};
pub use propagation::{
    propagate_on_color_change, propagate_on_component_change, propagate_on_supplier_change,
    propagate_on_supplier_detached, propagate_on_variant_change, CascadeReport, NamingContext,
};
pub use repair::{audit, repair, StaleField, StaleIdentifier};
pub use uniqueness::IdentifierKind;
