use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::cart::{CartSummary, ResolveCartRequest},
    error::AppResult,
    response::{ApiResponse, Meta},
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/resolve", post(resolve_cart))
}

/// The cart itself lives on the client; this joins its entries with current products.
#[utoipa::path(
    post,
    path = "/api/cart/resolve",
    request_body = ResolveCartRequest,
    responses(
        (status = 200, description = "Cart lines with current prices", body = ApiResponse<CartSummary>),
        (status = 503, description = "Catalog unavailable"),
    ),
    tag = "Cart"
)]
pub async fn resolve_cart(
    State(state): State<AppState>,
    Json(payload): Json<ResolveCartRequest>,
) -> AppResult<Json<ApiResponse<CartSummary>>> {
    let summary = cart_service::resolve(state.store.as_ref(), &payload.items).await?;
    Ok(Json(ApiResponse::success(
        "Cart",
        summary,
        Some(Meta::empty()),
    )))
}
