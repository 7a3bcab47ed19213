//! # Seed Data Generator
//!
//! Populates the database with demo clients, products and sales.
//!
//! ## Usage
//! ```bash
//! # 100 clients, 200 products, 500 sales (default)
//! cargo run -p ventas-db --bin seed
//!
//! # Custom amounts
//! cargo run -p ventas-db --bin seed -- --clients 20 --products 40 --sales 100
//!
//! # Specify database path
//! cargo run -p ventas-db --bin seed -- --db ./data/ventas.db
//! ```
//!
//! ## Generated Data
//! - Clients: `{first} {last}` with unique `{first}.{last}.{n}@example.com`
//! - Products: names from a few categories, each with a price band and a
//!   stock band
//! - Sales: 1-5 items of quantity 1-3, spread over the days since
//!   2023-01-01 and recorded through the sale workflow itself, so stock and
//!   totals are consistent. Every tenth sale is cancelled afterwards.
//!
//! Everything is derived from the row index, so two runs produce the same
//! data (ids aside).

use std::env;
use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use ventas_core::{CoreError, FixedClock, NewClient, NewProduct, SaleRequest};
use ventas_db::{Database, DbConfig, ServiceError};

const FIRST_NAMES: &[&str] = &[
    "Juan", "María", "Carlos", "Ana", "Luis", "Sofía", "Jorge", "Lucía", "Miguel", "Elena",
    "Pedro", "Valeria", "Diego", "Camila", "Andrés", "Daniela",
];

const LAST_NAMES: &[&str] = &[
    "Pérez", "López", "García", "Hernández", "Martínez", "Rodríguez", "Sánchez", "Ramírez",
    "Torres", "Flores", "Rivera", "Gómez",
];

/// (category, names, price band in cents, stock band)
const CATEGORIES: &[(&str, &[&str], (i64, i64), (i64, i64))] = &[
    (
        "Electrónica",
        &[
            "Smartphone Galaxy Pro",
            "Laptop UltraBook 15\"",
            "Audífonos Bluetooth",
            "Smart TV 55\" 4K",
            "Tablet Pro 11\"",
            "Teclado Mecánico RGB",
        ],
        (5_000, 5_000_000),
        (5, 100),
    ),
    (
        "Hogar",
        &[
            "Licuadora de Alta Potencia",
            "Aspiradora Robot",
            "Lámpara LED Inteligente",
            "Cafetera Espresso",
            "Juego de Toallas",
        ],
        (2_000, 500_000),
        (10, 200),
    ),
    (
        "Oficina",
        &[
            "Silla Ergonómica",
            "Monitor 27\" 4K IPS",
            "Webcam HD 1080p",
            "Hub USB-C 7 en 1",
            "Bolígrafos Gel (Pack 12)",
        ],
        (1_500, 200_000),
        (10, 300),
    ),
    (
        "Alimentos",
        &[
            "Café de Especialidad 500g",
            "Miel Orgánica 750ml",
            "Chocolate Artesanal 70%",
            "Quinoa Orgánica 1kg",
        ],
        (1_000, 50_000),
        (50, 1_000),
    ),
];

/// Sales are spread from this date onward.
fn first_sale_day() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 1, 1, 9, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut clients: usize = 100;
    let mut products: usize = 200;
    let mut sales: usize = 500;
    let mut db_path = String::from("./ventas.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" | "-c" => {
                if i + 1 < args.len() {
                    clients = args[i + 1].parse().unwrap_or(clients);
                    i += 1;
                }
            }
            "--products" | "-p" => {
                if i + 1 < args.len() {
                    products = args[i + 1].parse().unwrap_or(products);
                    i += 1;
                }
            }
            "--sales" | "-s" => {
                if i + 1 < args.len() {
                    sales = args[i + 1].parse().unwrap_or(sales);
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
                println!("Ventas Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --clients <N>    Number of clients (default: 100)");
                println!("  -p, --products <N>   Number of products (default: 200)");
                println!("  -s, --sales <N>      Number of sales (default: 500)");
                println!("  -d, --db <PATH>      Database file path (default: ./ventas.db)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Ventas Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!("Clients: {}  Products: {}  Sales: {}", clients, products, sales);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.clients().count().await? + db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has data");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    let start = std::time::Instant::now();

    // Clients
    let mut client_ids = Vec::with_capacity(clients);
    for n in 0..clients {
        let client = db.clients().create(&generate_client(n)).await?;
        client_ids.push(client.id);
    }
    println!("✓ {} clients", client_ids.len());

    // Products
    let mut product_ids = Vec::with_capacity(products);
    for n in 0..products {
        let product = db.products().create(&generate_product(n)).await?;
        product_ids.push(product.id);
    }
    println!("✓ {} products", product_ids.len());

    if client_ids.is_empty() || product_ids.is_empty() {
        println!("⚠ Sales need at least one client and one product; none generated.");
        return Ok(());
    }

    // Sales, each recorded at its own backdated instant
    let span_minutes = (Utc::now() - first_sale_day()).num_minutes().max(1);
    let mut created = Vec::with_capacity(sales);
    let mut short_of_stock = 0usize;

    for n in 0..sales {
        let offset = (n as i64 * span_minutes) / sales.max(1) as i64;
        let sold_at = first_sale_day() + Duration::minutes(offset);
        let request = generate_sale(n, &client_ids, &product_ids);

        let workflow = db
            .clone()
            .with_clock(Arc::new(FixedClock::new(sold_at)))
            .workflow();

        match workflow.create(&request).await {
            Ok(detail) => created.push(detail.sale.id),
            Err(ServiceError::Domain(CoreError::InsufficientStock { .. })) => short_of_stock += 1,
            Err(e) => return Err(e.into()),
        }

        if (n + 1) % 100 == 0 {
            println!("  Recorded {} sales...", n + 1);
        }
    }
    println!(
        "✓ {} sales ({} skipped for lack of stock)",
        created.len(),
        short_of_stock
    );

    let mut cancelled = 0usize;
    for sale_id in created.iter().step_by(10) {
        db.workflow().cancel(sale_id).await?;
        cancelled += 1;
    }
    println!("✓ {} sales cancelled", cancelled);

    let summary = db.reports().sales_summary().await?;
    println!();
    println!(
        "Revenue recorded: ${}.{:02} over {} sales",
        summary.total_revenue_cents / 100,
        summary.total_revenue_cents % 100,
        summary.total_sales
    );
    println!("Elapsed: {:?}", start.elapsed());
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn generate_client(n: usize) -> NewClient {
    let first = FIRST_NAMES[n % FIRST_NAMES.len()];
    let last = LAST_NAMES[(n / FIRST_NAMES.len() + n) % LAST_NAMES.len()];

    NewClient {
        name: format!("{} {}", first, last),
        email: format!("{}.{}.{}@example.com", ascii_slug(first), ascii_slug(last), n),
        phone: Some(format!("+52 55 {:04} {:04}", (n * 37) % 10_000, (n * 91) % 10_000)),
        address: Some(format!("Calle {} #{}, CDMX", 1 + n % 80, 10 + (n * 7) % 990)),
    }
}

fn generate_product(n: usize) -> NewProduct {
    let (category, names, (min_price, max_price), (min_stock, max_stock)) =
        CATEGORIES[n % CATEGORIES.len()];
    let name = names[(n / CATEGORIES.len()) % names.len()];
    let edition = n / (CATEGORIES.len() * names.len());

    let price_span = (max_price - min_price) as usize;
    let stock_span = (max_stock - min_stock) as usize;

    NewProduct {
        name: if edition == 0 {
            name.to_string()
        } else {
            format!("{} v{}", name, edition + 1)
        },
        description: Some(format!("{} de la categoría {}", name, category)),
        // Round to whole currency units
        price_cents: (min_price + ((n * 7_919) % price_span.max(1)) as i64) / 100 * 100,
        stock: min_stock + ((n * 31) % stock_span.max(1)) as i64,
        image_url: None,
    }
}

fn generate_sale(n: usize, client_ids: &[String], product_ids: &[String]) -> SaleRequest {
    let client_id = &client_ids[(n * 7) % client_ids.len()];
    let item_count = 1 + n % 5;

    let items = (0..item_count).map(|k| {
        let product_id = product_ids[(n * 13 + k * 31) % product_ids.len()].clone();
        let quantity = 1 + ((n + k) % 3) as i64;
        (product_id, quantity)
    });

    SaleRequest::new(client_id, items)
}

fn ascii_slug(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            'ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
