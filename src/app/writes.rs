//! Catalog write operations.
//!
//! Each operation runs inside a transaction owned by the caller, so a write path
//! that already holds one can compose several of them and commit once. Every
//! mutation of a field that feeds a derived identifier runs the matching
//! propagation rule before returning.

use crate::domain::model::{
    non_blank, Color, ColorId, Component, ComponentChanges, ComponentId,
    ComponentVariant, NewColor, NewComponent, NewPicture, NewSupplier, NewVariant, Picture,
    PictureChanges, PictureDraft, PictureId, Supplier, SupplierChanges, SupplierId,
    VariantChanges, VariantDraft, VariantId,
};
use crate::domain::propagation::{
    propagate_on_color_change, propagate_on_component_change, propagate_on_supplier_change,
    propagate_on_supplier_detached, propagate_on_variant_change, CascadeReport, NamingContext,
};
use crate::domain::uniqueness::{
    ensure_available, ensure_variant_pair_available, IdentifierKind, Planned,
};
use crate::error::{CatalogError, CatalogResult};
use crate::storage::CatalogTx;
use tracing::debug;

fn found<R>(row: Option<R>, entity: &'static str, id: i64) -> CatalogResult<R> {
    row.ok_or_else(|| CatalogError::not_found(entity, id))
}

fn require_text(value: &str, what: &str) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::validation(format!("{} must not be blank", what)));
    }
    Ok(())
}

fn require_order(picture_order: i32) -> CatalogResult<()> {
    if picture_order < 0 {
        return Err(CatalogError::validation(format!(
            "picture_order must not be negative (got {})",
            picture_order
        )));
    }
    Ok(())
}

async fn require_supplier<T: CatalogTx>(tx: &mut T, supplier_id: SupplierId) -> CatalogResult<()> {
    found(tx.supplier(supplier_id).await?, Supplier::ENTITY, supplier_id).map(|_| ())
}

// --- suppliers ---

pub async fn create_supplier<T: CatalogTx>(tx: &mut T, new: NewSupplier) -> CatalogResult<Supplier> {
    require_text(&new.name, "supplier name")?;
    let supplier = tx.insert_supplier(&new).await?;
    debug!(supplier_id = supplier.id, "supplier inserted");
    Ok(supplier)
}

pub async fn update_supplier<T: CatalogTx>(
    tx: &mut T,
    id: SupplierId,
    changes: SupplierChanges,
) -> CatalogResult<(Supplier, CascadeReport)> {
    let mut supplier = found(tx.supplier(id).await?, Supplier::ENTITY, id)?;

    if let Some(name) = changes.name {
        require_text(&name, "supplier name")?;
        supplier.name = name;
    }
    let mut code_changed = false;
    if let Some(code) = changes.supplier_code {
        let code = non_blank(code);
        code_changed = code != supplier.supplier_code;
        supplier.supplier_code = code;
    }

    tx.update_supplier(&supplier).await?;
    let report = if code_changed {
        propagate_on_supplier_change(tx, id).await?
    } else {
        CascadeReport::default()
    };
    Ok((supplier, report))
}

/// Detaches the supplier from its components, then deletes it. The detached
/// components are renamed in a single batch.
pub async fn delete_supplier<T: CatalogTx>(
    tx: &mut T,
    id: SupplierId,
) -> CatalogResult<CascadeReport> {
    require_supplier(tx, id).await?;

    let components = tx.components_of_supplier(id).await?;
    for component in &components {
        let detached = Component {
            supplier_id: None,
            ..component.clone()
        };
        tx.update_component(&detached).await?;
    }
    tx.delete_supplier(id).await?;

    let detached: Vec<ComponentId> = components.iter().map(|c| c.id).collect();
    propagate_on_supplier_detached(tx, &detached).await
}

// --- colors ---

pub async fn create_color<T: CatalogTx>(tx: &mut T, new: NewColor) -> CatalogResult<Color> {
    require_text(&new.name, "color name")?;
    let color = tx.insert_color(&new).await?;
    debug!(color_id = color.id, "color inserted");
    Ok(color)
}

pub async fn rename_color<T: CatalogTx>(
    tx: &mut T,
    id: ColorId,
    name: impl Into<String>,
) -> CatalogResult<(Color, CascadeReport)> {
    let name = name.into();
    require_text(&name, "color name")?;
    let mut color = found(tx.color(id).await?, Color::ENTITY, id)?;
    if color.name == name {
        return Ok((color, CascadeReport::default()));
    }

    color.name = name;
    tx.update_color(&color).await?;
    let report = propagate_on_color_change(tx, id).await?;
    Ok((color, report))
}

/// Fails while any variant still uses the color.
pub async fn delete_color<T: CatalogTx>(tx: &mut T, id: ColorId) -> CatalogResult<()> {
    found(tx.color(id).await?, Color::ENTITY, id)?;
    let in_use = tx.variants_of_color(id).await?.len();
    if in_use > 0 {
        return Err(CatalogError::validation(format!(
            "color {} is still used by {} variant(s)",
            id, in_use
        )));
    }
    tx.delete_color(id).await
}

// --- components ---

pub async fn create_component<T: CatalogTx>(
    tx: &mut T,
    new: NewComponent,
) -> CatalogResult<Component> {
    require_text(&new.product_number, "product_number")?;
    if let Some(supplier_id) = new.supplier_id {
        require_supplier(tx, supplier_id).await?;
    }
    let new = NewComponent {
        description: non_blank(new.description),
        ..new
    };
    let component = tx.insert_component(&new).await?;
    debug!(component_id = component.id, "component inserted");
    Ok(component)
}

pub async fn update_component<T: CatalogTx>(
    tx: &mut T,
    id: ComponentId,
    changes: ComponentChanges,
) -> CatalogResult<(Component, CascadeReport)> {
    let before = found(tx.component(id).await?, Component::ENTITY, id)?;
    let mut component = before.clone();

    if let Some(product_number) = changes.product_number {
        require_text(&product_number, "product_number")?;
        component.product_number = product_number;
    }
    if let Some(description) = changes.description {
        component.description = non_blank(description);
    }
    if let Some(supplier_id) = changes.supplier_id {
        if let Some(supplier_id) = supplier_id {
            require_supplier(tx, supplier_id).await?;
        }
        component.supplier_id = supplier_id;
    }

    tx.update_component(&component).await?;

    let naming_changed = component.product_number != before.product_number
        || component.supplier_id != before.supplier_id;
    let report = if naming_changed {
        propagate_on_component_change(tx, id).await?
    } else {
        CascadeReport::default()
    };
    Ok((component, report))
}

pub async fn delete_component<T: CatalogTx>(tx: &mut T, id: ComponentId) -> CatalogResult<()> {
    found(tx.component(id).await?, Component::ENTITY, id)?;
    tx.delete_component(id).await
}

// --- variants ---

pub async fn add_variant<T: CatalogTx>(
    tx: &mut T,
    new: NewVariant,
) -> CatalogResult<ComponentVariant> {
    let mut ctx = NamingContext::new();
    let sku = ctx
        .variant_sku(tx, new.component_id, new.color_id)
        .await?;

    ensure_variant_pair_available(tx, None, new.component_id, new.color_id).await?;
    ensure_available(tx, IdentifierKind::VariantSku, &[Planned::insert(sku.clone())]).await?;

    let variant = tx
        .insert_variant(&VariantDraft {
            component_id: new.component_id,
            color_id: new.color_id,
            variant_sku: sku,
        })
        .await?;
    debug!(variant_id = variant.id, sku = %variant.variant_sku, "variant inserted");
    Ok(variant)
}

/// Moves a variant to another component and/or color. Its SKU and its pictures follow.
pub async fn update_variant<T: CatalogTx>(
    tx: &mut T,
    id: VariantId,
    changes: VariantChanges,
) -> CatalogResult<(ComponentVariant, CascadeReport)> {
    let before = found(tx.variant(id).await?, ComponentVariant::ENTITY, id)?;
    let component_id = changes.component_id.unwrap_or(before.component_id);
    let color_id = changes.color_id.unwrap_or(before.color_id);

    if component_id == before.component_id && color_id == before.color_id {
        return Ok((before, CascadeReport::default()));
    }

    found(tx.component(component_id).await?, Component::ENTITY, component_id)?;
    found(tx.color(color_id).await?, Color::ENTITY, color_id)?;
    ensure_variant_pair_available(tx, Some(id), component_id, color_id).await?;

    tx.update_variant(&ComponentVariant {
        component_id,
        color_id,
        ..before
    })
    .await?;
    let report = propagate_on_variant_change(tx, id).await?;

    let variant = found(tx.variant(id).await?, ComponentVariant::ENTITY, id)?;
    Ok((variant, report))
}

pub async fn delete_variant<T: CatalogTx>(tx: &mut T, id: VariantId) -> CatalogResult<()> {
    found(tx.variant(id).await?, ComponentVariant::ENTITY, id)?;
    tx.delete_variant(id).await
}

// --- pictures ---

async fn next_picture_order<T: CatalogTx>(
    tx: &mut T,
    component_id: ComponentId,
    variant_id: Option<VariantId>,
) -> CatalogResult<i32> {
    match tx.max_picture_order(component_id, variant_id).await? {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| CatalogError::validation("picture_order exhausted for this group")),
    }
}

pub async fn add_picture<T: CatalogTx>(tx: &mut T, new: NewPicture) -> CatalogResult<Picture> {
    if let Some(order) = new.picture_order {
        require_order(order)?;
    }

    let mut ctx = NamingContext::new();
    let component_id = ctx
        .picture_owner(tx, new.component_id, new.variant_id)
        .await?;
    let picture_order = match new.picture_order {
        Some(order) => order,
        None => next_picture_order(tx, component_id, new.variant_id).await?,
    };
    let picture_name = ctx
        .picture_name(tx, component_id, new.variant_id, picture_order)
        .await?;

    ensure_available(
        tx,
        IdentifierKind::PictureName,
        &[Planned::insert(picture_name.clone())],
    )
    .await?;

    let picture = tx
        .insert_picture(&PictureDraft {
            component_id,
            variant_id: new.variant_id,
            picture_order,
            picture_name,
        })
        .await?;
    debug!(picture_id = picture.id, name = %picture.picture_name, "picture inserted");
    Ok(picture)
}

pub async fn update_picture<T: CatalogTx>(
    tx: &mut T,
    id: PictureId,
    changes: PictureChanges,
) -> CatalogResult<Picture> {
    let before = found(tx.picture(id).await?, Picture::ENTITY, id)?;
    if let Some(order) = changes.picture_order {
        require_order(order)?;
    }

    let variant_id = changes.variant_id.unwrap_or(before.variant_id);
    // a variant picture takes its component from the variant unless one is given explicitly
    let component_hint = match (changes.component_id, variant_id) {
        (Some(component_id), _) => Some(component_id),
        (None, None) => Some(before.component_id),
        (None, Some(_)) => None,
    };
    let picture_order = changes.picture_order.unwrap_or(before.picture_order);

    let mut ctx = NamingContext::new();
    let component_id = ctx.picture_owner(tx, component_hint, variant_id).await?;
    let picture_name = ctx
        .picture_name(tx, component_id, variant_id, picture_order)
        .await?;

    if picture_name != before.picture_name {
        ensure_available(
            tx,
            IdentifierKind::PictureName,
            &[Planned::update(id, picture_name.clone())],
        )
        .await?;
    }

    let after = Picture {
        component_id,
        variant_id,
        picture_order,
        picture_name,
        ..before.clone()
    };
    if after == before {
        return Ok(before);
    }
    tx.update_picture(&after).await?;
    found(tx.picture(id).await?, Picture::ENTITY, id)
}

pub async fn delete_picture<T: CatalogTx>(tx: &mut T, id: PictureId) -> CatalogResult<()> {
    found(tx.picture(id).await?, Picture::ENTITY, id)?;
    tx.delete_picture(id).await
}
