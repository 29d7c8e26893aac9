use storefront::{
    config::AppConfig,
    db::{DbPool, create_pool, run_migrations},
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;

    let phones = ensure_category(&pool, "Phones").await?;
    let accessories = ensure_category(&pool, "Accessories").await?;
    seed_products(&pool, phones, accessories).await?;

    println!("Seed completed");
    Ok(())
}

async fn ensure_category(pool: &DbPool, name: &str) -> anyhow::Result<Uuid> {
    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO categories (id, name)
        VALUES ($1, $2)
        ON CONFLICT (name) DO NOTHING
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_optional(pool)
    .await?;

    // Already present: look it up.
    let id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM categories WHERE name = $1")
                .bind(name)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured category {name}");
    Ok(id)
}

async fn seed_products(pool: &DbPool, phones: Uuid, accessories: Uuid) -> anyhow::Result<()> {
    let products = vec![
        ("Basic Phone", "Long battery, physical keypad", 450000_i64, phones, "basic-phone.jpg"),
        ("Smartphone Lite", "6.1 inch screen, dual camera", 2990000, phones, "smartphone-lite.jpg"),
        ("Phone Case", "Shock resistant silicone case", 45000, accessories, "phone-case.jpg"),
        ("USB-C Cable", "1m braided cable", 70000, accessories, "usb-c-cable.jpg"),
        ("Fast Charger", "20W wall charger", 150000, accessories, "fast-charger.jpg"),
    ];

    for (name, detail, price, category_id, image) in products {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, price, image, detail, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(price)
        .bind(image)
        .bind(detail)
        .bind(category_id)
        .execute(pool)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}
