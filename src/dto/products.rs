use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

/// Admin product form. On edit, a missing or blank `image` keeps the current one.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ProductInput {
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    #[serde(default)]
    pub detail: String,
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
