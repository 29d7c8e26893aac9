use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutRequest, OrderWithLines},
    error::{AppError, AppResult},
    response::{ApiResponse, Meta},
    services::{admin_service, cart_service, checkout_service},
    state::AppState,
};

pub fn checkout_router() -> Router<AppState> {
    Router::new().route("/", post(checkout))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(get_order))
}

/// Prices are taken from the catalog at submission time, never from the request.
///
/// A request carrying an `order_id` that was already placed returns that order
/// with 200 instead of placing it again.
#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order placed", body = ApiResponse<OrderWithLines>),
        (status = 200, description = "Order with this id was already placed", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Empty cart or missing customer details"),
        (status = 503, description = "Store unavailable or timed out, safe to retry"),
    ),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<OrderWithLines>>)> {
    if payload.items.is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }
    payload.customer.validate()?;

    if let Some(order_id) = payload.order_id
        && let Some(placed) = checkout_service::find_placed(state.store.as_ref(), order_id).await?
    {
        return Ok((
            StatusCode::OK,
            Json(ApiResponse::success(
                "Order already placed",
                placed,
                Some(Meta::empty()),
            )),
        ));
    }

    let summary = cart_service::resolve(state.store.as_ref(), &payload.items).await?;
    let placed = checkout_service::place_order_as(
        state.store.as_ref(),
        payload.order_id.unwrap_or_else(Uuid::new_v4),
        payload.customer,
        &summary.items,
        state.checkout_timeout,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Order placed",
            placed,
            Some(Meta::empty()),
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with its lines", body = ApiResponse<OrderWithLines>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let order = admin_service::get_order_details(state.store.as_ref(), id).await?;
    Ok(Json(ApiResponse::success("Order", order, Some(Meta::empty()))))
}
