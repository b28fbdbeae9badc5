//! Storage seam for the catalog: a store hands out transactions, and every engine
//! read and write goes through one of them.

use crate::domain::model::{
    Color, ColorId, Component, ComponentId, ComponentVariant, NewColor, NewComponent, NewSupplier,
    Picture, PictureDraft, PictureId, Supplier, SupplierId, VariantDraft, VariantId,
};
use crate::error::CatalogResult;
use async_trait::async_trait;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    type Tx: CatalogTx;

    /// Opens a transaction. Nothing it writes is visible to others before `commit`.
    async fn begin(&self) -> CatalogResult<Self::Tx>;
}

/// One open transaction against the catalog tables.
///
/// Uniqueness of derived identifiers is checked by the engine before writing; a
/// backend may enforce it again, in which case the violation surfaces as
/// `CatalogError::Conflict` no later than `commit`.
///
/// Deletes follow the schema's foreign keys: removing a component removes its
/// variants and pictures, removing a variant removes its pictures.
#[async_trait]
pub trait CatalogTx: Send {
    // --- point reads ---
    async fn supplier(&mut self, id: SupplierId) -> CatalogResult<Option<Supplier>>;
    async fn color(&mut self, id: ColorId) -> CatalogResult<Option<Color>>;
    async fn component(&mut self, id: ComponentId) -> CatalogResult<Option<Component>>;
    async fn variant(&mut self, id: VariantId) -> CatalogResult<Option<ComponentVariant>>;
    async fn picture(&mut self, id: PictureId) -> CatalogResult<Option<Picture>>;

    // --- naming reads ---
    // Parent rows a derived identifier is computed from. A backend with concurrent
    // writers must keep them from changing until this transaction ends; the memory
    // store is single writer, so a plain read is enough there.
    async fn supplier_for_naming(&mut self, id: SupplierId) -> CatalogResult<Option<Supplier>> {
        self.supplier(id).await
    }
    async fn color_for_naming(&mut self, id: ColorId) -> CatalogResult<Option<Color>> {
        self.color(id).await
    }
    async fn component_for_naming(&mut self, id: ComponentId) -> CatalogResult<Option<Component>> {
        self.component(id).await
    }
    async fn variant_for_naming(
        &mut self,
        id: VariantId,
    ) -> CatalogResult<Option<ComponentVariant>> {
        self.variant(id).await
    }

    // --- affected sets ---
    async fn components_of_supplier(
        &mut self,
        supplier_id: SupplierId,
    ) -> CatalogResult<Vec<Component>>;
    async fn variants_of_component(
        &mut self,
        component_id: ComponentId,
    ) -> CatalogResult<Vec<ComponentVariant>>;
    async fn variants_of_color(&mut self, color_id: ColorId)
        -> CatalogResult<Vec<ComponentVariant>>;
    /// Direct pictures of the component plus the pictures of all its variants.
    async fn pictures_of_component(
        &mut self,
        component_id: ComponentId,
    ) -> CatalogResult<Vec<Picture>>;
    async fn pictures_of_variant(&mut self, variant_id: VariantId) -> CatalogResult<Vec<Picture>>;
    /// Highest `picture_order` within one (component, variant) group.
    async fn max_picture_order(
        &mut self,
        component_id: ComponentId,
        variant_id: Option<VariantId>,
    ) -> CatalogResult<Option<i32>>;

    // --- uniqueness lookups ---
    async fn variant_id_by_sku(&mut self, sku: &str) -> CatalogResult<Option<VariantId>>;
    async fn variant_id_by_pair(
        &mut self,
        component_id: ComponentId,
        color_id: ColorId,
    ) -> CatalogResult<Option<VariantId>>;
    async fn picture_id_by_name(&mut self, name: &str) -> CatalogResult<Option<PictureId>>;

    // --- full scans (audit) ---
    async fn all_variants(&mut self) -> CatalogResult<Vec<ComponentVariant>>;
    async fn all_pictures(&mut self) -> CatalogResult<Vec<Picture>>;

    // --- writes ---
    async fn insert_supplier(&mut self, new: &NewSupplier) -> CatalogResult<Supplier>;
    async fn update_supplier(&mut self, supplier: &Supplier) -> CatalogResult<()>;
    async fn delete_supplier(&mut self, id: SupplierId) -> CatalogResult<()>;

    async fn insert_color(&mut self, new: &NewColor) -> CatalogResult<Color>;
    async fn update_color(&mut self, color: &Color) -> CatalogResult<()>;
    async fn delete_color(&mut self, id: ColorId) -> CatalogResult<()>;

    async fn insert_component(&mut self, new: &NewComponent) -> CatalogResult<Component>;
    async fn update_component(&mut self, component: &Component) -> CatalogResult<()>;
    async fn delete_component(&mut self, id: ComponentId) -> CatalogResult<()>;

    async fn insert_variant(&mut self, draft: &VariantDraft) -> CatalogResult<ComponentVariant>;
    /// Rewrites `component_id`, `color_id`, `variant_sku` and `updated_at`.
    async fn update_variant(&mut self, variant: &ComponentVariant) -> CatalogResult<()>;
    async fn delete_variant(&mut self, id: VariantId) -> CatalogResult<()>;

    async fn insert_picture(&mut self, draft: &PictureDraft) -> CatalogResult<Picture>;
    /// Rewrites owner columns, `picture_order`, `picture_name` and `updated_at`.
    async fn update_picture(&mut self, picture: &Picture) -> CatalogResult<()>;
    async fn delete_picture(&mut self, id: PictureId) -> CatalogResult<()>;

    async fn commit(self) -> CatalogResult<()>;
    async fn rollback(self) -> CatalogResult<()>;
}
