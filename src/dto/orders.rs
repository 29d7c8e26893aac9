use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use uuid::Uuid;

use crate::{
    cart::CartEntry,
    error::{AppError, AppResult},
    models::{CustomerInfo, Order, OrderLine, OrderStatus},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub customer: CustomerInfo,
    pub items: Vec<CartEntry>,
    /// Client-chosen id. Resubmitting with the same id returns the order
    /// already placed under it instead of placing another.
    #[serde(default)]
    pub order_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderWithLines {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub total: i64,
}

impl OrderWithLines {
    pub fn new(order: Order, lines: Vec<OrderLine>) -> AppResult<Self> {
        let total = lines
            .iter()
            .try_fold(0_i64, |acc, line| acc.checked_add(line.subtotal()?))
            .ok_or_else(|| AppError::Validation("order total out of range".into()))?;
        Ok(Self {
            order,
            lines,
            total,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Statistics {
    pub total_revenue: i64,
    pub total_units_sold: i64,
}
