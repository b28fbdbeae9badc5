//! The catalog write path.
//!
//! Every call runs in its own transaction: committed when the operation and all of
//! its cascades succeed, rolled back otherwise.

use crate::app::writes;
use crate::domain::model::{
    Color, ColorId, Component, ComponentChanges, ComponentId, ComponentVariant, NewColor,
    NewComponent, NewPicture, NewSupplier, NewVariant, Picture, PictureChanges, PictureId,
    Supplier, SupplierChanges, SupplierId, VariantChanges, VariantId,
};
use crate::domain::propagation::CascadeReport;
use crate::domain::repair::{self, StaleIdentifier};
use crate::error::{CatalogError, CatalogResult};
use crate::storage::{CatalogStore, CatalogTx};
use tracing::{info, warn};

pub struct CatalogService<S: CatalogStore> {
    store: S,
}

async fn finish<T: CatalogTx, R>(
    tx: T,
    operation: &'static str,
    result: CatalogResult<R>,
) -> CatalogResult<R> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            warn!(operation, error = %err, "write rejected, rolling back");
            tx.rollback().await?;
            Err(err)
        }
    }
}

fn found<R>(row: Option<R>, entity: &'static str, id: i64) -> CatalogResult<R> {
    row.ok_or_else(|| CatalogError::not_found(entity, id))
}

impl<S: CatalogStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // --- suppliers ---

    pub async fn create_supplier(&self, new: NewSupplier) -> CatalogResult<Supplier> {
        let mut tx = self.store.begin().await?;
        let result = writes::create_supplier(&mut tx, new).await;
        let supplier = finish(tx, "create_supplier", result).await?;
        info!(supplier_id = supplier.id, "supplier created");
        Ok(supplier)
    }

    pub async fn update_supplier(
        &self,
        id: SupplierId,
        changes: SupplierChanges,
    ) -> CatalogResult<(Supplier, CascadeReport)> {
        let mut tx = self.store.begin().await?;
        let result = writes::update_supplier(&mut tx, id, changes).await;
        let (supplier, report) = finish(tx, "update_supplier", result).await?;
        info!(
            supplier_id = id,
            cascaded = report.len(),
            "supplier updated"
        );
        Ok((supplier, report))
    }

    pub async fn delete_supplier(&self, id: SupplierId) -> CatalogResult<CascadeReport> {
        let mut tx = self.store.begin().await?;
        let result = writes::delete_supplier(&mut tx, id).await;
        let report = finish(tx, "delete_supplier", result).await?;
        info!(supplier_id = id, cascaded = report.len(), "supplier deleted");
        Ok(report)
    }

    // --- colors ---

    pub async fn create_color(&self, new: NewColor) -> CatalogResult<Color> {
        let mut tx = self.store.begin().await?;
        let result = writes::create_color(&mut tx, new).await;
        let color = finish(tx, "create_color", result).await?;
        info!(color_id = color.id, name = %color.name, "color created");
        Ok(color)
    }

    pub async fn rename_color(
        &self,
        id: ColorId,
        name: impl Into<String>,
    ) -> CatalogResult<(Color, CascadeReport)> {
        let mut tx = self.store.begin().await?;
        let result = writes::rename_color(&mut tx, id, name).await;
        let (color, report) = finish(tx, "rename_color", result).await?;
        info!(color_id = id, name = %color.name, cascaded = report.len(), "color renamed");
        Ok((color, report))
    }

    pub async fn delete_color(&self, id: ColorId) -> CatalogResult<()> {
        let mut tx = self.store.begin().await?;
        let result = writes::delete_color(&mut tx, id).await;
        finish(tx, "delete_color", result).await?;
        info!(color_id = id, "color deleted");
        Ok(())
    }

    // --- components ---

    pub async fn create_component(&self, new: NewComponent) -> CatalogResult<Component> {
        let mut tx = self.store.begin().await?;
        let result = writes::create_component(&mut tx, new).await;
        let component = finish(tx, "create_component", result).await?;
        info!(
            component_id = component.id,
            product_number = %component.product_number,
            "component created"
        );
        Ok(component)
    }

    pub async fn update_component(
        &self,
        id: ComponentId,
        changes: ComponentChanges,
    ) -> CatalogResult<(Component, CascadeReport)> {
        let mut tx = self.store.begin().await?;
        let result = writes::update_component(&mut tx, id, changes).await;
        let (component, report) = finish(tx, "update_component", result).await?;
        info!(component_id = id, cascaded = report.len(), "component updated");
        Ok((component, report))
    }

    pub async fn delete_component(&self, id: ComponentId) -> CatalogResult<()> {
        let mut tx = self.store.begin().await?;
        let result = writes::delete_component(&mut tx, id).await;
        finish(tx, "delete_component", result).await?;
        info!(component_id = id, "component deleted");
        Ok(())
    }

    // --- variants ---

    pub async fn add_variant(&self, new: NewVariant) -> CatalogResult<ComponentVariant> {
        let mut tx = self.store.begin().await?;
        let result = writes::add_variant(&mut tx, new).await;
        let variant = finish(tx, "add_variant", result).await?;
        info!(variant_id = variant.id, sku = %variant.variant_sku, "variant added");
        Ok(variant)
    }

    pub async fn update_variant(
        &self,
        id: VariantId,
        changes: VariantChanges,
    ) -> CatalogResult<(ComponentVariant, CascadeReport)> {
        let mut tx = self.store.begin().await?;
        let result = writes::update_variant(&mut tx, id, changes).await;
        let (variant, report) = finish(tx, "update_variant", result).await?;
        info!(
            variant_id = id,
            sku = %variant.variant_sku,
            cascaded = report.len(),
            "variant updated"
        );
        Ok((variant, report))
    }

    pub async fn delete_variant(&self, id: VariantId) -> CatalogResult<()> {
        let mut tx = self.store.begin().await?;
        let result = writes::delete_variant(&mut tx, id).await;
        finish(tx, "delete_variant", result).await?;
        info!(variant_id = id, "variant deleted");
        Ok(())
    }

    // --- pictures ---

    pub async fn add_picture(&self, new: NewPicture) -> CatalogResult<Picture> {
        let mut tx = self.store.begin().await?;
        let result = writes::add_picture(&mut tx, new).await;
        let picture = finish(tx, "add_picture", result).await?;
        info!(picture_id = picture.id, name = %picture.picture_name, "picture added");
        Ok(picture)
    }

    pub async fn update_picture(
        &self,
        id: PictureId,
        changes: PictureChanges,
    ) -> CatalogResult<Picture> {
        let mut tx = self.store.begin().await?;
        let result = writes::update_picture(&mut tx, id, changes).await;
        let picture = finish(tx, "update_picture", result).await?;
        info!(picture_id = id, name = %picture.picture_name, "picture updated");
        Ok(picture)
    }

    pub async fn delete_picture(&self, id: PictureId) -> CatalogResult<()> {
        let mut tx = self.store.begin().await?;
        let result = writes::delete_picture(&mut tx, id).await;
        finish(tx, "delete_picture", result).await?;
        info!(picture_id = id, "picture deleted");
        Ok(())
    }

    // --- reads ---

    pub async fn supplier(&self, id: SupplierId) -> CatalogResult<Supplier> {
        let mut tx = self.store.begin().await?;
        let row = tx.supplier(id).await;
        tx.rollback().await?;
        found(row?, Supplier::ENTITY, id)
    }

    pub async fn color(&self, id: ColorId) -> CatalogResult<Color> {
        let mut tx = self.store.begin().await?;
        let row = tx.color(id).await;
        tx.rollback().await?;
        found(row?, Color::ENTITY, id)
    }

    pub async fn component(&self, id: ComponentId) -> CatalogResult<Component> {
        let mut tx = self.store.begin().await?;
        let row = tx.component(id).await;
        tx.rollback().await?;
        found(row?, Component::ENTITY, id)
    }

    pub async fn variant(&self, id: VariantId) -> CatalogResult<ComponentVariant> {
        let mut tx = self.store.begin().await?;
        let row = tx.variant(id).await;
        tx.rollback().await?;
        found(row?, ComponentVariant::ENTITY, id)
    }

    pub async fn picture(&self, id: PictureId) -> CatalogResult<Picture> {
        let mut tx = self.store.begin().await?;
        let row = tx.picture(id).await;
        tx.rollback().await?;
        found(row?, Picture::ENTITY, id)
    }

    pub async fn variants_of_component(
        &self,
        component_id: ComponentId,
    ) -> CatalogResult<Vec<ComponentVariant>> {
        let mut tx = self.store.begin().await?;
        let result = match tx.component(component_id).await {
            Ok(Some(_)) => tx.variants_of_component(component_id).await,
            Ok(None) => Err(CatalogError::not_found(Component::ENTITY, component_id)),
            Err(err) => Err(err),
        };
        tx.rollback().await?;
        result
    }

    /// Direct pictures and pictures of the component's variants.
    pub async fn pictures_of_component(
        &self,
        component_id: ComponentId,
    ) -> CatalogResult<Vec<Picture>> {
        let mut tx = self.store.begin().await?;
        let result = match tx.component(component_id).await {
            Ok(Some(_)) => tx.pictures_of_component(component_id).await,
            Ok(None) => Err(CatalogError::not_found(Component::ENTITY, component_id)),
            Err(err) => Err(err),
        };
        tx.rollback().await?;
        result
    }

    // --- maintenance ---

    pub async fn audit(&self) -> CatalogResult<Vec<StaleIdentifier>> {
        let mut tx = self.store.begin().await?;
        let result = repair::audit(&mut tx).await;
        tx.rollback().await?;
        result
    }

    pub async fn repair(&self) -> CatalogResult<CascadeReport> {
        let mut tx = self.store.begin().await?;
        let result = repair::repair(&mut tx).await;
        finish(tx, "repair", result).await
    }
}
