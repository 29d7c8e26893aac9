#![allow(dead_code)]

use storefront::{
    models::{Category, CustomerInfo, NewProduct, Product},
    store::{CatalogStore, MemoryStore},
};
use uuid::Uuid;

pub async fn seed_product(store: &MemoryStore, name: &str, price: i64) -> anyhow::Result<Product> {
    seed_product_in(store, name, price, None).await
}

pub async fn seed_product_in(
    store: &MemoryStore,
    name: &str,
    price: i64,
    category_id: Option<Uuid>,
) -> anyhow::Result<Product> {
    let product = store
        .insert_product(NewProduct {
            id: Uuid::new_v4(),
            name: name.into(),
            price,
            image: format!("{}.jpg", name.to_lowercase().replace(' ', "-")),
            detail: format!("{name} detail"),
            category_id,
        })
        .await?;
    Ok(product)
}

pub async fn seed_category(store: &MemoryStore, name: &str) -> anyhow::Result<Category> {
    Ok(store.insert_category(Uuid::new_v4(), name.into()).await?)
}

pub fn customer() -> CustomerInfo {
    CustomerInfo {
        name: "Nguyen Van A".into(),
        address: "12 Le Loi, District 1".into(),
        email: "a@example.com".into(),
        phone: "0901234567".into(),
    }
}
