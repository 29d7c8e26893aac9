use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::ProductList,
    error::AppResult,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::ProductQuery,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in name and detail"),
        ("category_id" = Option<Uuid>, Query, description = "Only products in this category"),
        ("price_range" = Option<String>, Query, description = "Bracket: 0-50000, 50000-100000, 100000-max"),
        ("min_price" = Option<i64>, Query, description = "Lower price bound"),
        ("max_price" = Option<i64>, Query, description = "Upper price bound"),
        ("sort_by" = Option<String>, Query, description = "created_at, price, name"),
        ("sort_order" = Option<String>, Query, description = "asc, desc")
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>),
        (status = 400, description = "Invalid filter"),
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    let filter = query.into_filter()?;
    let result = catalog_service::list_products(state.store.as_ref(), &filter).await?;
    let meta = Meta::for_page(filter.page.page, filter.page.per_page, &result);
    Ok(Json(ApiResponse::success(
        "Products",
        ProductList {
            items: result.items,
        },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Get product", body = ApiResponse<Product>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product = catalog_service::get_product(state.store.as_ref(), id).await?;
    Ok(Json(ApiResponse::success("Product", product, None)))
}
