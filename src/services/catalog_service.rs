use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Category, Page, Product, ProductFilter},
    store::CatalogStore,
};

pub async fn list_products<S: CatalogStore + ?Sized>(
    store: &S,
    filter: &ProductFilter,
) -> AppResult<Page<Product>> {
    store.query_products(filter).await
}

pub async fn get_product<S: CatalogStore + ?Sized>(store: &S, id: Uuid) -> AppResult<Product> {
    store.get_product(id).await?.ok_or(AppError::NotFound)
}

pub async fn list_categories<S: CatalogStore + ?Sized>(store: &S) -> AppResult<Vec<Category>> {
    store.list_categories().await
}

pub async fn get_category<S: CatalogStore + ?Sized>(store: &S, id: Uuid) -> AppResult<Category> {
    store.get_category(id).await?.ok_or(AppError::NotFound)
}
