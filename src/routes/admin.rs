use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post, put},
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
    dto::{
        categories::CategoryInput,
        orders::{OrderList, OrderWithLines, Statistics, UpdateOrderStatusRequest},
        products::ProductInput,
    },
    error::AppResult,
    models::{Category, FormMode, Order, Product},
    response::{ApiResponse, Meta},
    routes::params::OrderListQuery,
    services::admin_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/statistics", get(statistics))
        .route("/products", post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/categories", post(create_category))
        .route(
            "/categories/{id}",
            put(update_category).delete(delete_category),
        )
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Pending, Shipped, Completed, Cancelled"),
        ("sort_order" = Option<String>, Query, description = "asc, desc (default newest first)")
    ),
    responses(
        (status = 200, description = "All orders", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown status"),
    ),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let filter = query.into_filter()?;
    let result = admin_service::list_orders(state.store.as_ref(), &filter).await?;
    let meta = Meta::for_page(filter.page.page, filter.page.per_page, &result);
    Ok(Json(ApiResponse::success(
        "Orders",
        OrderList {
            items: result.items,
        },
        Some(meta),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with lines and total", body = ApiResponse<OrderWithLines>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let order = admin_service::get_order_details(state.store.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(
        "Order found",
        order,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    patch,
    path = "/api/admin/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Update order status", body = ApiResponse<Order>),
        (status = 400, description = "Transition not allowed"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Status changed concurrently"),
    ),
    tag = "Admin"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = admin_service::update_order_status(state.store.as_ref(), id, payload.status).await?;
    Ok(Json(ApiResponse::success(
        "Order updated",
        order,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    get,
    path = "/api/admin/statistics",
    responses(
        (status = 200, description = "Revenue and units sold over all orders", body = ApiResponse<Statistics>),
        (status = 503, description = "Could not read order lines"),
    ),
    tag = "Admin"
)]
pub async fn statistics(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Statistics>>> {
    let stats = admin_service::compute_statistics(state.store.as_ref()).await?;
    Ok(Json(ApiResponse::success(
        "Statistics",
        stats,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid product"),
        (status = 409, description = "Name already taken"),
    ),
    tag = "Admin"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let product =
        admin_service::save_product(state.store.as_ref(), FormMode::Create, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Product created",
            product,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductInput>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let product =
        admin_service::save_product(state.store.as_ref(), FormMode::Edit(id), payload).await?;
    Ok(Json(ApiResponse::success(
        "Product updated",
        product,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Value>>> {
    admin_service::delete_product(state.store.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(
        "Product deleted",
        json!({ "id": id }),
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/categories",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 409, description = "Name already taken"),
    ),
    tag = "Admin"
)]
pub async fn create_category(
    State(state): State<AppState>,
    Json(payload): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let category =
        admin_service::save_category(state.store.as_ref(), FormMode::Create, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Category created",
            category,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category renamed", body = ApiResponse<Category>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryInput>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let category =
        admin_service::save_category(state.store.as_ref(), FormMode::Edit(id), payload).await?;
    Ok(Json(ApiResponse::success(
        "Category updated",
        category,
        Some(Meta::empty()),
    )))
}

#[utoipa::path(
    delete,
    path = "/api/admin/categories/{id}",
    params(
        ("id" = Uuid, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted, its products kept uncategorised"),
        (status = 404, description = "Not Found"),
    ),
    tag = "Admin"
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Value>>> {
    admin_service::delete_category(state.store.as_ref(), id).await?;
    Ok(Json(ApiResponse::success(
        "Category deleted",
        json!({ "id": id }),
        Some(Meta::empty()),
    )))
}
