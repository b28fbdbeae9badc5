//! Change propagation for derived identifiers.
//!
//! Every rule runs in two phases inside the caller's transaction: collect the full
//! affected set first, then recompute each row and write only the rows whose stored
//! value differs. A row's new value depends on its own foreign keys and the current
//! parent fields, never on its siblings, so the order inside a batch is irrelevant.

use crate::domain::model::{
    Color, ColorId, Component, ComponentId, ComponentVariant, Picture, PictureId, Supplier,
    SupplierId, VariantId,
};
use crate::domain::naming::{compute_picture_name, compute_variant_sku};
use crate::domain::uniqueness::{ensure_available, IdentifierKind, Planned};
use crate::error::{CatalogError, CatalogResult};
use crate::storage::CatalogTx;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Rows whose derived values were rewritten by one cascade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub variants: Vec<VariantId>,
    pub pictures: Vec<PictureId>,
}

impl CascadeReport {
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty() && self.pictures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.variants.len() + self.pictures.len()
    }

    pub fn merge(&mut self, other: CascadeReport) {
        self.variants.extend(other.variants);
        self.pictures.extend(other.pictures);
    }
}

/// Memoized parent lookups for one cascade.
///
/// Must be created after the triggering parent write, since cached rows are never refreshed.
/// Parents are read through the `*_for_naming` methods, so they stay put until commit.
#[derive(Default)]
pub struct NamingContext {
    components: HashMap<ComponentId, Component>,
    supplier_codes: HashMap<SupplierId, Option<String>>,
    color_names: HashMap<ColorId, String>,
    variants: HashMap<VariantId, ComponentVariant>,
}

impl NamingContext {
    pub fn new() -> Self {
        Self::default()
    }

    async fn component<T: CatalogTx>(
        &mut self,
        tx: &mut T,
        id: ComponentId,
    ) -> CatalogResult<Component> {
        if let Some(component) = self.components.get(&id) {
            return Ok(component.clone());
        }
        let component = tx
            .component_for_naming(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(Component::ENTITY, id))?;
        self.components.insert(id, component.clone());
        Ok(component)
    }

    async fn supplier_code<T: CatalogTx>(
        &mut self,
        tx: &mut T,
        supplier_id: Option<SupplierId>,
    ) -> CatalogResult<Option<String>> {
        let Some(id) = supplier_id else {
            return Ok(None);
        };
        if let Some(code) = self.supplier_codes.get(&id) {
            return Ok(code.clone());
        }
        let supplier = tx
            .supplier_for_naming(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(Supplier::ENTITY, id))?;
        self.supplier_codes.insert(id, supplier.supplier_code.clone());
        Ok(supplier.supplier_code)
    }

    async fn color_name<T: CatalogTx>(&mut self, tx: &mut T, id: ColorId) -> CatalogResult<String> {
        if let Some(name) = self.color_names.get(&id) {
            return Ok(name.clone());
        }
        let color = tx
            .color_for_naming(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(Color::ENTITY, id))?;
        self.color_names.insert(id, color.name.clone());
        Ok(color.name)
    }

    async fn variant<T: CatalogTx>(
        &mut self,
        tx: &mut T,
        id: VariantId,
    ) -> CatalogResult<ComponentVariant> {
        if let Some(variant) = self.variants.get(&id) {
            return Ok(variant.clone());
        }
        let variant = tx
            .variant_for_naming(id)
            .await?
            .ok_or_else(|| CatalogError::not_found(ComponentVariant::ENTITY, id))?;
        self.variants.insert(id, variant.clone());
        Ok(variant)
    }

    pub async fn variant_sku<T: CatalogTx>(
        &mut self,
        tx: &mut T,
        component_id: ComponentId,
        color_id: ColorId,
    ) -> CatalogResult<String> {
        let component = self.component(tx, component_id).await?;
        let code = self.supplier_code(tx, component.supplier_id).await?;
        let color = self.color_name(tx, color_id).await?;
        Ok(compute_variant_sku(
            code.as_deref(),
            &component.product_number,
            &color,
        ))
    }

    /// Resolves the component a picture belongs to.
    ///
    /// A variant picture always takes its variant's component; an explicit
    /// `component_id` that disagrees with it is rejected.
    pub async fn picture_owner<T: CatalogTx>(
        &mut self,
        tx: &mut T,
        component_id: Option<ComponentId>,
        variant_id: Option<VariantId>,
    ) -> CatalogResult<ComponentId> {
        match (variant_id, component_id) {
            (Some(variant_id), given) => {
                let variant = self.variant(tx, variant_id).await?;
                if let Some(given) = given {
                    if given != variant.component_id {
                        return Err(CatalogError::validation(format!(
                            "cannot determine owning component: component {} does not own variant {} (owned by component {})",
                            given, variant_id, variant.component_id
                        )));
                    }
                }
                Ok(variant.component_id)
            }
            (None, Some(component_id)) => {
                self.component(tx, component_id).await?;
                Ok(component_id)
            }
            (None, None) => Err(CatalogError::validation(
                "cannot determine owning component: picture has neither component_id nor variant_id",
            )),
        }
    }

    pub async fn picture_name<T: CatalogTx>(
        &mut self,
        tx: &mut T,
        component_id: ComponentId,
        variant_id: Option<VariantId>,
        picture_order: i32,
    ) -> CatalogResult<String> {
        let component = self.component(tx, component_id).await?;
        let code = self.supplier_code(tx, component.supplier_id).await?;
        let color = match variant_id {
            Some(variant_id) => {
                let variant = self.variant(tx, variant_id).await?;
                Some(self.color_name(tx, variant.color_id).await?)
            }
            None => None,
        };
        Ok(compute_picture_name(
            code.as_deref(),
            &component.product_number,
            color.as_deref(),
            picture_order,
        ))
    }
}

/// Recomputes the SKU of every given variant and writes the ones that changed.
pub async fn refresh_variants<T: CatalogTx>(
    tx: &mut T,
    ctx: &mut NamingContext,
    variants: Vec<ComponentVariant>,
    report: &mut CascadeReport,
) -> CatalogResult<()> {
    let mut plans = Vec::new();
    let mut rows = Vec::new();
    for variant in variants {
        let sku = ctx
            .variant_sku(tx, variant.component_id, variant.color_id)
            .await?;
        if sku != variant.variant_sku {
            plans.push(Planned::update(variant.id, sku.clone()));
            rows.push(ComponentVariant {
                variant_sku: sku,
                ..variant
            });
        }
    }

    ensure_available(tx, IdentifierKind::VariantSku, &plans).await?;

    for row in rows {
        tx.update_variant(&row).await?;
        report.variants.push(row.id);
    }
    Ok(())
}

/// Re-derives owner and name of every given picture and writes the ones that changed.
pub async fn refresh_pictures<T: CatalogTx>(
    tx: &mut T,
    ctx: &mut NamingContext,
    pictures: Vec<Picture>,
    report: &mut CascadeReport,
) -> CatalogResult<()> {
    let mut plans = Vec::new();
    let mut rows = Vec::new();
    for picture in pictures {
        let owner = match picture.variant_id {
            Some(variant_id) => ctx.variant(tx, variant_id).await?.component_id,
            None => picture.component_id,
        };
        let name = ctx
            .picture_name(tx, owner, picture.variant_id, picture.picture_order)
            .await?;
        if name != picture.picture_name {
            plans.push(Planned::update(picture.id, name.clone()));
        }
        if name != picture.picture_name || owner != picture.component_id {
            rows.push(Picture {
                component_id: owner,
                picture_name: name,
                ..picture
            });
        }
    }

    ensure_available(tx, IdentifierKind::PictureName, &plans).await?;

    for row in rows {
        tx.update_picture(&row).await?;
        report.pictures.push(row.id);
    }
    Ok(())
}

/// Every variant and picture of the given components, refreshed as one batch.
async fn refresh_components<T: CatalogTx>(
    tx: &mut T,
    component_ids: &[ComponentId],
) -> CatalogResult<CascadeReport> {
    let mut variants = Vec::new();
    let mut pictures = BTreeMap::new();
    for &component_id in component_ids {
        variants.extend(tx.variants_of_component(component_id).await?);
        for picture in tx.pictures_of_component(component_id).await? {
            pictures.insert(picture.id, picture);
        }
    }

    let mut ctx = NamingContext::new();
    let mut report = CascadeReport::default();
    refresh_variants(tx, &mut ctx, variants, &mut report).await?;
    refresh_pictures(tx, &mut ctx, pictures.into_values().collect(), &mut report).await?;
    Ok(report)
}

/// Component `product_number` or `supplier_id` changed: all its variants and all its
/// pictures (direct and through variants).
pub async fn propagate_on_component_change<T: CatalogTx>(
    tx: &mut T,
    component_id: ComponentId,
) -> CatalogResult<CascadeReport> {
    let report = refresh_components(tx, &[component_id]).await?;
    debug!(
        component_id,
        variants = report.variants.len(),
        pictures = report.pictures.len(),
        "component cascade applied"
    );
    Ok(report)
}

/// Supplier code changed: every variant and picture of every component using the supplier.
pub async fn propagate_on_supplier_change<T: CatalogTx>(
    tx: &mut T,
    supplier_id: SupplierId,
) -> CatalogResult<CascadeReport> {
    let components: Vec<ComponentId> = tx
        .components_of_supplier(supplier_id)
        .await?
        .iter()
        .map(|c| c.id)
        .collect();
    let report = refresh_components(tx, &components).await?;
    debug!(
        supplier_id,
        components = components.len(),
        variants = report.variants.len(),
        pictures = report.pictures.len(),
        "supplier cascade applied"
    );
    Ok(report)
}

/// Several components lost their supplier at once (the supplier was deleted). Their
/// identifiers are refreshed together so siblings may trade values.
pub async fn propagate_on_supplier_detached<T: CatalogTx>(
    tx: &mut T,
    component_ids: &[ComponentId],
) -> CatalogResult<CascadeReport> {
    let report = refresh_components(tx, component_ids).await?;
    debug!(
        components = component_ids.len(),
        variants = report.variants.len(),
        pictures = report.pictures.len(),
        "supplier detach cascade applied"
    );
    Ok(report)
}

/// Color renamed: every variant using it and every picture of those variants.
pub async fn propagate_on_color_change<T: CatalogTx>(
    tx: &mut T,
    color_id: ColorId,
) -> CatalogResult<CascadeReport> {
    let variants = tx.variants_of_color(color_id).await?;
    let mut pictures = Vec::new();
    for variant in &variants {
        pictures.extend(tx.pictures_of_variant(variant.id).await?);
    }

    let mut ctx = NamingContext::new();
    let mut report = CascadeReport::default();
    refresh_variants(tx, &mut ctx, variants, &mut report).await?;
    refresh_pictures(tx, &mut ctx, pictures, &mut report).await?;

    debug!(
        color_id,
        variants = report.variants.len(),
        pictures = report.pictures.len(),
        "color cascade applied"
    );
    Ok(report)
}

/// Variant moved to another component or color: its own SKU plus its pictures, whose
/// `component_id` follows the variant.
pub async fn propagate_on_variant_change<T: CatalogTx>(
    tx: &mut T,
    variant_id: VariantId,
) -> CatalogResult<CascadeReport> {
    let variant = tx
        .variant(variant_id)
        .await?
        .ok_or_else(|| CatalogError::not_found(ComponentVariant::ENTITY, variant_id))?;
    let pictures = tx.pictures_of_variant(variant_id).await?;

    let mut ctx = NamingContext::new();
    let mut report = CascadeReport::default();
    refresh_variants(tx, &mut ctx, vec![variant], &mut report).await?;
    refresh_pictures(tx, &mut ctx, pictures, &mut report).await?;

    debug!(
        variant_id,
        pictures = report.pictures.len(),
        "variant cascade applied"
    );
    Ok(report)
}
