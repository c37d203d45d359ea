//! # Seed Data Generator
//!
//! Populates a database with development data.
//!
//! ## Usage
//! ```bash
//! # 200 products (default) into ./vitrine_dev.db
//! cargo run -p vitrine-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p vitrine-db --bin seed -- --products 1000
//!
//! # Specify database path
//! cargo run -p vitrine-db --bin seed -- --db ./data/vitrine.db
//! ```
//!
//! ## Generated Data
//! - 2 boutiques (`DKR-01`, `THS-01`)
//! - 1 super-admin account (`admin@vitrine.local`)
//! - 2 suppliers
//! - N products across five categories, SKU `{CATEGORY}-{NAME}-{INDEX}`
//! - A Stock row for every product at every boutique
//!
//! Set `RUST_LOG=vitrine_db=debug` to see every statement.

use rust_decimal::Decimal;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vitrine_core::{
    Money, NewBoutique, NewProduct, NewStock, NewSupplier, NewUserAccount, Role, TaxRate,
};
use vitrine_db::query::Filter;
use vitrine_db::{Database, DbConfig};

const DEFAULT_PRODUCTS: usize = 200;
const DEFAULT_DB_PATH: &str = "./vitrine_dev.db";
const ADMIN_EMAIL: &str = "admin@vitrine.local";
const ADMIN_PASSWORD_ENV: &str = "VITRINE_SEED_ADMIN_PASSWORD";

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &str, &[&str])] = &[
    (
        "BOI",
        "boissons",
        &[
            "Jus de bissap",
            "Jus de bouye",
            "Jus de gingembre",
            "Eau minerale",
            "Cafe Touba",
            "The vert",
            "Lait caille",
            "Soda orange",
        ],
    ),
    (
        "EPI",
        "epicerie",
        &[
            "Riz brise",
            "Huile arachide",
            "Sucre morceaux",
            "Mil",
            "Fonio",
            "Concentre tomate",
            "Oignons",
            "Sel iode",
        ],
    ),
    (
        "COS",
        "cosmetiques",
        &[
            "Savon karite",
            "Beurre karite",
            "Huile coco",
            "Creme mains",
            "Parfum encens",
        ],
    ),
    (
        "TEX",
        "textile",
        &[
            "Pagne wax",
            "Boubou brode",
            "Foulard bazin",
            "Chemise lin",
        ],
    ),
    (
        "ART",
        "artisanat",
        &[
            "Panier tresse",
            "Masque bois",
            "Bracelet perles",
            "Sac cuir",
        ],
    ),
];

/// Size variants and their price add-on, in francs
const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 250), ("L", 500), ("Lot de 3", 1200)];

/// VAT rates in percent
const TAX_RATES: &[i64] = &[0, 18];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count = DEFAULT_PRODUCTS;
    let mut db_path = String::from(DEFAULT_DB_PATH);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse()?;
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Vitrine POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -p, --products <N>  Number of products to generate (default: {})", DEFAULT_PRODUCTS);
                println!("  -d, --db <PATH>     Database file path (default: {})", DEFAULT_DB_PATH);
                println!("  -h, --help          Show this help message");
                println!();
                println!("Environment:");
                println!("  {}  Admin password (default: changeme-dev)", ADMIN_PASSWORD_ENV);
                println!("  RUST_LOG                     Log filter (default: info)");
                return Ok(());
            }
            other => {
                warn!(argument = %other, "Ignoring unknown argument");
            }
        }
        i += 1;
    }

    info!(db = %db_path, products = count, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;

    let existing = db.products().count(Filter::everything()).await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        println!("Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Boutiques
    let dakar = db
        .boutiques()
        .create(NewBoutique {
            name: "Vitrine Plateau".to_string(),
            code: "DKR-01".to_string(),
            address: Some("Avenue Pompidou".to_string()),
            city: Some("Dakar".to_string()),
            country: Some("SN".to_string()),
            ..Default::default()
        })
        .await?;
    let thies = db
        .boutiques()
        .create(NewBoutique {
            name: "Vitrine Thies Centre".to_string(),
            code: "THS-01".to_string(),
            city: Some("Thies".to_string()),
            country: Some("SN".to_string()),
            ..Default::default()
        })
        .await?;
    info!("Created 2 boutiques");

    // Admin account
    let password = env::var(ADMIN_PASSWORD_ENV).unwrap_or_else(|_| "changeme-dev".to_string());
    let admin = db
        .user_repo()
        .register(NewUserAccount {
            email: ADMIN_EMAIL.to_string(),
            password,
            full_name: "Administrateur".to_string(),
            role: Some(Role::SuperAdmin),
        })
        .await?;
    info!(email = %admin.email, "Created super-admin");

    // Suppliers
    let suppliers = vec![
        NewSupplier {
            name: "Grossiste Sandaga".to_string(),
            contact_name: Some("Ibrahima Fall".to_string()),
            phone: Some("+221 33 800 00 01".to_string()),
            ..Default::default()
        },
        NewSupplier {
            name: "Cooperative Karite Kaolack".to_string(),
            email: Some("contact@karite-kaolack.sn".to_string()),
            ..Default::default()
        },
    ];
    let created = db.suppliers().create_many(suppliers, false).await?;
    info!(created, "Created suppliers");

    // Products
    let products: Vec<NewProduct> = catalogue().take(count).collect();
    let ids: Vec<String> = products.iter().filter_map(|p| p.id.clone()).collect();
    let created = db.products().create_many(products, false).await?;
    info!(created, "Created products");

    // Stock at every boutique
    let stocks: Vec<NewStock> = ids
        .iter()
        .enumerate()
        .flat_map(|(seed, product_id)| {
            [&dakar.id, &thies.id].into_iter().map(move |boutique_id| NewStock {
                id: None,
                boutique_id: boutique_id.clone(),
                product_id: product_id.clone(),
                quantity: Some((seed % 101) as i64),
            })
        })
        .collect();
    let created = db.stocks().create_many(stocks, false).await?;
    info!(created, "Created stock rows");

    info!(elapsed = ?start.elapsed(), "Seed complete");
    Ok(())
}

/// Endless product stream; each pass over the categories gets new SKUs.
fn catalogue() -> impl Iterator<Item = NewProduct> {
    (0usize..).flat_map(|round| {
        CATEGORIES
            .iter()
            .enumerate()
            .flat_map(move |(category_idx, (code, category, names))| {
                names.iter().enumerate().flat_map(move |(name_idx, name)| {
                    SIZES.iter().enumerate().map(move |(size_idx, (size, addon))| {
                        let seed = round * 10_000 + category_idx * 1000 + name_idx * 20 + size_idx;
                        generate_product(code, category, name, size, *addon, seed)
                    })
                })
            })
    })
}

/// Generates a single product with realistic data.
fn generate_product(
    code: &str,
    category: &str,
    name: &str,
    size: &str,
    price_addon: i64,
    seed: usize,
) -> NewProduct {
    let short: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let sku = format!("{}-{}-{:04}", code, short, seed);

    // 250 - 2200 francs in steps of 50, plus the size add-on
    let price = 250 + ((seed * 17) % 40) as i64 * 50 + price_addon;

    // Cost between 60% and 80% of price
    let cost = price * (60 + (seed % 20) as i64) / 100;

    NewProduct {
        id: Some(uuid::Uuid::new_v4().to_string()),
        sku,
        name: format!("{} {}", name, size),
        category: Some(category.to_string()),
        price: Money::new(Decimal::from(price)),
        cost: Some(Money::new(Decimal::from(cost))),
        barcode: Some(format!("621{:010}", seed)),
        tax_rate: Some(TaxRate::new(Decimal::from(TAX_RATES[seed % TAX_RATES.len()]))),
        is_active: Some(true),
    }
}
