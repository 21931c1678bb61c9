//! Database seeder for Khata development and testing.
//!
//! Seeds a development company with a small grocery catalog, a few customers
//! and a few sellers. Records that already exist (same SKU or same name) are
//! skipped, so the seeder can be rerun.
//!
//! Usage: cargo run --bin seeder

use std::sync::Arc;

use anyhow::Context;
use khata_core::actor::{ActorContext, ActorRole};
use khata_core::catalog::{CatalogService, NewProduct};
use khata_core::directory::{CounterpartyKind, DirectoryService, NewCounterparty};
use khata_core::store::LedgerStore;
use khata_db::PgStore;
use khata_shared::AppConfig;
use khata_shared::telemetry::init_tracing;
use khata_shared::types::{CompanyId, UserId};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

/// Development company (consistent for all seeds).
const DEV_COMPANY_ID: Uuid = Uuid::from_u128(1);
/// Development admin (consistent for all seeds).
const DEV_ADMIN_ID: Uuid = Uuid::from_u128(2);

/// Name, SKU, price in paise, opening stock, unit.
const PRODUCTS: [(&str, &str, i64, i64, &str); 6] = [
    ("Basmati Rice 5kg", "RICE-5KG", 62_500, 40, "bag"),
    ("Toor Dal 1kg", "DAL-1KG", 14_500, 60, "pkt"),
    ("Mustard Oil 1L", "OIL-1L", 17_800, 36, "btl"),
    ("Sugar 1kg", "SUGAR-1KG", 4_500, 80, "pkt"),
    ("Assam Tea 250g", "TEA-250G", 12_000, 48, "pkt"),
    ("Neem Soap", "SOAP-NEEM", 3_500, 120, "pc"),
];

const CUSTOMERS: [(&str, Option<&str>); 3] = [
    ("Kiran Stores", Some("+91 98450 11223")),
    ("Lakshmi Traders", None),
    ("Gupta Kirana", Some("+91 99000 44556")),
];

const SELLERS: [(&str, Option<&str>); 2] = [
    ("Hindustan Wholesale", Some("+91 80 2345 6789")),
    ("Annapurna Mills", None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!("connecting to database");
    let db = khata_db::connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    let store: Arc<dyn LedgerStore> = Arc::new(PgStore::new(db));
    let attempts = config.ledger.max_commit_attempts;

    let admin = ActorContext::new(
        UserId::from_uuid(DEV_ADMIN_ID),
        "Dev Admin",
        ActorRole::Admin,
        CompanyId::from_uuid(DEV_COMPANY_ID),
    );

    seed_catalog(&CatalogService::new(Arc::clone(&store), attempts), &admin).await?;
    let directory = DirectoryService::new(store, attempts);
    seed_counterparties(&directory, &admin, CounterpartyKind::Customer, &CUSTOMERS).await?;
    seed_counterparties(&directory, &admin, CounterpartyKind::Seller, &SELLERS).await?;

    info!(company_id = %admin.company_id, "seeding complete");
    Ok(())
}

/// Registers the development catalog.
async fn seed_catalog(catalog: &CatalogService, admin: &ActorContext) -> anyhow::Result<()> {
    let existing = catalog.list(admin).await?;
    let mut inserted = 0;

    for (name, sku, paise, stock, unit) in PRODUCTS {
        if existing.iter().any(|p| p.sku == sku) {
            continue;
        }
        catalog
            .register(
                admin,
                NewProduct {
                    name: name.to_string(),
                    sku: sku.to_string(),
                    numeric_price: Decimal::new(paise, 2),
                    opening_stock: stock,
                    unit_of_measure: unit.to_string(),
                },
            )
            .await
            .with_context(|| format!("Failed to register {sku}"))?;
        inserted += 1;
    }

    info!(inserted, skipped = PRODUCTS.len() - inserted, "products seeded");
    Ok(())
}

/// Creates customers or sellers by name.
async fn seed_counterparties(
    directory: &DirectoryService,
    admin: &ActorContext,
    kind: CounterpartyKind,
    seeds: &[(&str, Option<&str>)],
) -> anyhow::Result<()> {
    let existing = directory.list_all(admin, Some(kind)).await?;
    let mut inserted = 0;

    for (name, phone) in seeds {
        if existing.iter().any(|c| c.name == *name) {
            continue;
        }
        directory
            .create(
                admin,
                NewCounterparty {
                    kind,
                    name: (*name).to_string(),
                    phone: phone.map(str::to_string),
                },
            )
            .await
            .with_context(|| format!("Failed to create {kind} {name}"))?;
        inserted += 1;
    }

    info!(%kind, inserted, skipped = seeds.len() - inserted, "counterparties seeded");
    Ok(())
}
