use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub detail: String,
    pub category_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer_name: String,
    pub customer_address: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    /// Price of one unit at the moment the order was placed.
    pub unit_price: i64,
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    /// `None` when `quantity * unit_price` does not fit in an `i64`.
    pub fn subtotal(&self) -> Option<i64> {
        self.unit_price.checked_mul(i64::from(self.quantity))
    }
}

/// Lifecycle of an order once it has been placed.
///
/// `Pending` may move to `Shipped` or `Cancelled`, `Shipped` may move to
/// `Completed` or `Cancelled`. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Pending,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Shipped,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Completed => "Completed",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Shipped)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
                | (OrderStatus::Shipped, OrderStatus::Completed)
                | (OrderStatus::Shipped, OrderStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::Validation(format!("unknown order status '{s}'")))
    }
}

/// Shopper details captured at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
}

impl CustomerInfo {
    pub fn validate(&self) -> Result<(), AppError> {
        let required = [
            ("name", &self.name),
            ("address", &self.address),
            ("email", &self.email),
            ("phone", &self.phone),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(AppError::Validation(format!("customer {field} is required")));
        }
        if !self.email.contains('@') {
            return Err(AppError::Validation("customer email is invalid".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: Uuid,
    pub customer: CustomerInfo,
    pub status: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: i64,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub id: Uuid,
    pub name: String,
    pub price: i64,
    pub image: String,
    pub detail: String,
    pub category_id: Option<Uuid>,
}

/// Fields replaced on an existing product. `image: None` keeps the current one.
#[derive(Debug, Clone)]
pub struct ProductChanges {
    pub name: String,
    pub price: i64,
    pub image: Option<String>,
    pub detail: String,
    pub category_id: Option<Uuid>,
}

/// Whether an admin form submission creates a record or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    CreatedAt,
    Price,
    Name,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub per_page: i64,
}

impl PageRequest {
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub search: Option<String>,
    pub sort_by: ProductSort,
    pub direction: SortDirection,
    pub page: PageRequest,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category_id) = self.category_id
            && product.category_id != Some(category_id)
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some(search) = self.search.as_ref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            return product.name.to_lowercase().contains(&needle)
                || product.detail.to_lowercase().contains(&needle);
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub direction: SortDirection,
    pub page: PageRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

/// A price bracket written as `min-max`, where `max` may be the word `max`.
///
/// A lower bound of `0` means no lower bound at all, matching the storefront's
/// preset brackets `0-50000`, `50000-100000` and `100000-max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl FromStr for PriceRange {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::Validation(format!("invalid price range '{s}'"));
        let (min, max) = s.trim().split_once('-').ok_or_else(invalid)?;

        let min: i64 = min.trim().parse().map_err(|_| invalid())?;
        let max = match max.trim() {
            "max" => None,
            value => Some(value.parse::<i64>().map_err(|_| invalid())?),
        };
        if min < 0 || max.is_some_and(|max| max < min) {
            return Err(invalid());
        }

        Ok(Self {
            min: (min > 0).then_some(min),
            max,
        })
    }
}
