use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    cart::CartEntry,
    error::{AppError, AppResult},
    models::Product,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveCartRequest {
    pub items: Vec<CartEntry>,
}

/// A cart entry joined with the product it currently refers to.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartLineItem {
    pub product: Product,
    pub quantity: u32,
    pub subtotal: i64,
}

impl CartLineItem {
    pub fn new(product: Product, quantity: u32) -> AppResult<Self> {
        let subtotal = product
            .price
            .checked_mul(i64::from(quantity))
            .ok_or_else(|| {
                AppError::Validation(format!("subtotal for {} is out of range", product.name))
            })?;
        Ok(Self {
            product,
            quantity,
            subtotal,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartSummary {
    pub items: Vec<CartLineItem>,
    pub total: i64,
}

impl CartSummary {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
        }
    }

    pub fn from_items(items: Vec<CartLineItem>) -> AppResult<Self> {
        let total = items
            .iter()
            .try_fold(0_i64, |acc, item| acc.checked_add(item.subtotal))
            .ok_or_else(|| AppError::Validation("cart total out of range".into()))?;
        Ok(Self { items, total })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
