//! # Seed Data Generator
//!
//! Populates a development database with an admin account and a small
//! photo catalog.
//!
//! ## Usage
//! ```bash
//! # Default database and admin
//! cargo run -p lumen-storefront-api --bin seed
//!
//! # Specify database path and admin credentials
//! cargo run -p lumen-storefront-api --bin seed -- \
//!     --db ./data/lumen.db --admin-email owner@example.com --admin-password s3cret-pass
//! ```
//!
//! ## Generated Data
//! - One admin account
//! - A handful of categories (landscapes, portraits, street, ...)
//! - Several products per category with placeholder CDN URLs
//!
//! Prices range from $1,500.00 to $9,500.00 ARS; dimensions alternate
//! between landscape and portrait orientation.

use std::env;

use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

use lumen_core::validation::{slugify, validate_email, validate_password};
use lumen_core::{Category, Product, Role, User, DEFAULT_CURRENCY};
use lumen_db::{Database, DbConfig, ProductQuery};
use lumen_storefront_api::auth::hash_password;

/// Category name and the product titles filed under it.
const CATALOG: &[(&str, &[&str])] = &[
    (
        "Landscapes",
        &[
            "Lake at Dawn",
            "Patagonian Peaks",
            "Salt Flats at Noon",
            "Glacier Edge",
            "Vineyard Rows",
            "Desert Dunes",
        ],
    ),
    (
        "Portraits",
        &[
            "Fisherman in Fog",
            "Tango Dancer",
            "Market Vendor",
            "Grandmother's Hands",
        ],
    ),
    (
        "Street",
        &[
            "Rainy Crosswalk",
            "Night Bus",
            "Corner Café",
            "Neon Alley",
            "Subway Rush",
        ],
    ),
    (
        "Wildlife",
        &[
            "Condor in Flight",
            "Sea Lion Colony",
            "Flamingo Lagoon",
            "Fox in Snow",
        ],
    ),
    (
        "Black & White",
        &["Empty Pier", "Old Lighthouse", "Cathedral Steps"],
    ),
];

const CDN_BASE: &str = "https://cdn.lumen.example.com";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./lumen.db");
    let mut admin_email = String::from("admin@lumen.example.com");
    let mut admin_password = String::from("change-me-please");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--admin-email" => {
                if let Some(value) = args.get(i + 1) {
                    admin_email = value.clone();
                    i += 1;
                }
            }
            "--admin-password" => {
                if let Some(value) = args.get(i + 1) {
                    admin_password = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lumen Storefront Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>             Database file path (default: ./lumen.db)");
                println!("      --admin-email <EMAIL>   Admin account (default: admin@lumen.example.com)");
                println!("      --admin-password <PW>   Admin password (default: change-me-please)");
                println!("  -h, --help                  Show this help message");
                return Ok(());
            }
            other => {
                eprintln!("Ignoring unknown argument: {other}");
            }
        }
        i += 1;
    }

    let admin_email = validate_email(&admin_email).context("Invalid --admin-email")?;
    validate_password(&admin_password).context("Invalid --admin-password")?;

    println!("🌱 Lumen Storefront Seed Data Generator");
    println!("=======================================");
    println!("Database: {}", db_path);
    println!("Admin:    {}", admin_email);
    println!();

    // Connect to database
    let db = Database::new(DbConfig::new(&db_path))
        .await
        .context("Failed to open database")?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing products
    let existing = db.products().count_active().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Admin account
    match db.users().get_by_email(&admin_email).await? {
        Some(user) if user.role.is_admin() => println!("✓ Admin already exists"),
        Some(user) => {
            db.users().set_role(&user.id, Role::Admin).await?;
            println!("✓ Promoted existing account to admin");
        }
        None => {
            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4().to_string(),
                email: admin_email.clone(),
                password_hash: hash_password(&admin_password)?,
                full_name: Some("Store Admin".to_string()),
                role: Role::Admin,
                created_at: now,
                updated_at: now,
            };
            db.users().insert(&user).await?;
            println!("✓ Created admin account");
        }
    }

    // Categories and products
    println!();
    println!("Generating catalog...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    for (category_idx, (name, titles)) in CATALOG.iter().enumerate() {
        let now = Utc::now();
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            slug: slugify(name),
            description: None,
            created_at: now,
            updated_at: now,
        };
        db.categories().insert(&category).await?;
        println!("  + {} ({})", category.name, category.slug);

        for (title_idx, title) in titles.iter().enumerate() {
            let product = generate_product(&category.id, title, category_idx * 100 + title_idx);

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.title, e);
                continue;
            }

            generated += 1;
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    // Verify FTS
    println!();
    println!("Verifying FTS index...");
    for term in ["lake", "night"] {
        let query = ProductQuery::new(Some(term.to_string()), None, None, None);
        let results = db.products().search(&query).await?;
        println!("  Search '{}': {} results", term, results.len());
    }

    db.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product with deterministic price and dimensions.
fn generate_product(category_id: &str, title: &str, seed: usize) -> Product {
    let now = Utc::now();
    let id = Uuid::new_v4().to_string();
    let slug = slugify(title);

    // $1,500.00 - $9,500.00 in steps of $500
    let price_cents = 150_000 + ((seed * 7) % 17) as i64 * 50_000;

    let (width_px, height_px) = if seed % 2 == 0 { (6000, 4000) } else { (4000, 6000) };

    Product {
        id,
        category_id: Some(category_id.to_string()),
        title: title.to_string(),
        description: Some(format!("Fine-art print file: {title}.")),
        price_cents,
        currency: DEFAULT_CURRENCY.to_string(),
        preview_url: format!("{CDN_BASE}/previews/{slug}.jpg"),
        asset_url: format!("{CDN_BASE}/originals/{slug}.tiff"),
        width_px: Some(width_px),
        height_px: Some(height_px),
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}
