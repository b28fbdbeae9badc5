use serde_json::json;

use component_catalog::infra::{config, logging};
use component_catalog::{CatalogService, PgCatalogStore};

fn usage_and_exit() -> ! {
    eprintln!(
        "Usage: cargo run --bin preflight -- [--migrate] [--repair]\n\
         \n\
         Requires env vars:\n\
           DATABASE_URL\n\
         Optional:\n\
           DATABASE_MAX_CONNECTIONS (default 5), CATALOG_MIGRATIONS_DIR (default ./migrations)\n"
    );
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        usage_and_exit();
    }
    let run_migrations = args.iter().any(|a| a == "--migrate");
    let run_repair = args.iter().any(|a| a == "--repair");

    let database_url = config::database_url()?;
    let max_connections = config::max_connections()?;
    let migrations_dir = config::migrations_dir();

    eprintln!("> Preflight:");
    eprintln!("  DATABASE_MAX_CONNECTIONS={}", max_connections);
    eprintln!("  CATALOG_MIGRATIONS_DIR={}", migrations_dir.display());

    let store = PgCatalogStore::connect(&database_url, max_connections)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to the database: {}", e))?;
    store.ping().await?;
    eprintln!("  Database reachable.");

    if run_migrations {
        eprintln!("  Running migrations...");
        store.migrate(&migrations_dir).await?;
        eprintln!("  Migrations applied.");
    }

    let catalog = CatalogService::new(store);
    let stale = catalog.audit().await?;
    eprintln!("  Stale derived identifiers: {}", stale.len());

    let repaired = if run_repair && !stale.is_empty() {
        let report = catalog.repair().await?;
        let remaining = catalog.audit().await?;
        if !remaining.is_empty() {
            return Err(anyhow::anyhow!(
                "{} identifier(s) still stale after repair",
                remaining.len()
            ));
        }
        Some(report)
    } else {
        None
    };

    let summary = json!({
        "database": "ok",
        "migrated": run_migrations,
        "stale": stale,
        "repaired": repaired,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !stale.is_empty() && repaired.is_none() {
        eprintln!("> Preflight found stale identifiers. Re-run with --repair");
        std::process::exit(1);
    }
    eprintln!("> Preflight OK.");
    Ok(())
}
