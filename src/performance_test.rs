// src/performance_test.rs
// Times a supplier-code cascade that rewrites every variant and picture of many components.
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Instant;

use component_catalog::{
    CatalogService, MemoryStore, NewColor, NewComponent, NewPicture, NewSupplier, NewVariant,
    SupplierChanges,
};

const COLOR_NAMES: [&str; 6] = ["Red", "Dark Blue", "Forest Green", "Black", "White", "Sand"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let num_components = 1_000;
    println!(
        "--- Cascade Performance Test: supplier code change over {} components ---",
        num_components
    );

    let catalog = CatalogService::new(MemoryStore::new());
    let mut rng = rand::thread_rng();

    let supplier = catalog
        .create_supplier(NewSupplier::new("Bench Supplier", Some("BENCH")))
        .await?;
    let mut colors = Vec::with_capacity(COLOR_NAMES.len());
    for name in COLOR_NAMES {
        colors.push(catalog.create_color(NewColor::new(name)).await?);
    }

    // --- Seed: every component gets a random subset of colors and a few pictures ---
    let seed_start = Instant::now();
    let mut rows = 0usize;
    for i in 0..num_components {
        let component = catalog
            .create_component(
                NewComponent::new(format!("P-{:05}", i)).with_supplier(supplier.id),
            )
            .await?;
        catalog
            .add_picture(NewPicture::for_component(component.id))
            .await?;
        rows += 1;

        let variant_count = rng.gen_range(1..=3);
        for color in colors.choose_multiple(&mut rng, variant_count) {
            let variant = catalog
                .add_variant(NewVariant::new(component.id, color.id))
                .await?;
            rows += 1;
            for _ in 0..rng.gen_range(0..=2) {
                catalog
                    .add_picture(NewPicture::for_variant(variant.id))
                    .await?;
                rows += 1;
            }
        }
    }
    println!(
        "Seeded {} derived rows in {} ms",
        rows,
        seed_start.elapsed().as_millis()
    );

    // --- Time the cascade itself ---
    let start_time = Instant::now();
    let (_, report) = catalog
        .update_supplier(supplier.id, SupplierChanges::code(Some("BENCH2")))
        .await?;
    let duration = start_time.elapsed();
    let avg_time_per_row = duration.as_micros() as f64 / report.len().max(1) as f64;

    println!("\n--- Results ---");
    println!(
        "Rewrote {} variants and {} pictures in {} ms",
        report.variants.len(),
        report.pictures.len(),
        duration.as_millis()
    );
    println!("Average time per row: {:.2} µs (microseconds)", avg_time_per_row);

    println!("\nNote: This test uses the in-memory store. Against PostgreSQL every row is a round trip, so expect I/O latency to dominate.");
    Ok(())
}
