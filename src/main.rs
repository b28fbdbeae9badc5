//! End-to-end walkthrough of the derived identifier engine on the in-memory store.
//!
//! Run with `cargo run` (set `RUST_LOG=component_catalog=debug` to see cascades).

use component_catalog::infra::logging;
use component_catalog::{
    CatalogService, ComponentChanges, MemoryStore, NewColor, NewComponent, NewPicture,
    NewSupplier, NewVariant, SupplierChanges,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let catalog = CatalogService::new(MemoryStore::new());

    println!("> Seeding catalog");
    let supplier = catalog
        .create_supplier(NewSupplier::new("Supplies Inc", Some("SUP")))
        .await?;
    let component = catalog
        .create_component(NewComponent::new("X-1").with_supplier(supplier.id))
        .await?;
    let dark_blue = catalog.create_color(NewColor::new("Dark Blue")).await?;
    let red = catalog.create_color(NewColor::new("Red")).await?;

    let blue_variant = catalog
        .add_variant(NewVariant::new(component.id, dark_blue.id))
        .await?;
    let red_variant = catalog
        .add_variant(NewVariant::new(component.id, red.id))
        .await?;
    catalog
        .add_picture(NewPicture::for_component(component.id))
        .await?;
    catalog
        .add_picture(NewPicture::for_variant(blue_variant.id))
        .await?;
    catalog
        .add_picture(NewPicture::for_variant(blue_variant.id))
        .await?;
    print_identifiers(&catalog, component.id).await?;

    println!("\n> Renaming color 'Dark Blue' -> 'Navy'");
    let (_, report) = catalog.rename_color(dark_blue.id, "Navy").await?;
    println!(
        "  rewrote {} variant(s), {} picture(s)",
        report.variants.len(),
        report.pictures.len()
    );
    let untouched = catalog.variant(red_variant.id).await?;
    println!("  untouched: {}", untouched.variant_sku);

    println!("\n> Changing product number 'X-1' -> 'X-2'");
    let (_, report) = catalog
        .update_component(component.id, ComponentChanges::product_number("X-2"))
        .await?;
    println!("  rewrote {} row(s)", report.len());

    println!("\n> Clearing the supplier code");
    let (_, report) = catalog
        .update_supplier(supplier.id, SupplierChanges::code(None))
        .await?;
    println!("  rewrote {} row(s)", report.len());
    print_identifiers(&catalog, component.id).await?;

    println!("\n> Adding a second Red variant (must be rejected)");
    match catalog
        .add_variant(NewVariant::new(component.id, red.id))
        .await
    {
        Ok(v) => anyhow::bail!("duplicate variant was accepted: {}", v.variant_sku),
        Err(err) => println!("  rejected: {}", err),
    }

    let stale = catalog.audit().await?;
    println!("\n> Audit: {} stale identifier(s)", stale.len());
    Ok(())
}

async fn print_identifiers(
    catalog: &CatalogService<MemoryStore>,
    component_id: i64,
) -> anyhow::Result<()> {
    for variant in catalog.variants_of_component(component_id).await? {
        println!("  variant {:>3}  {}", variant.id, variant.variant_sku);
    }
    for picture in catalog.pictures_of_component(component_id).await? {
        println!("  picture {:>3}  {}", picture.id, picture.picture_name);
    }
    Ok(())
}
