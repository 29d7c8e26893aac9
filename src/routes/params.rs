use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        OrderFilter, OrderStatus, PageRequest, PriceRange, ProductFilter, ProductSort,
        SortDirection,
    },
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn new(page: Option<i64>, per_page: Option<i64>) -> Self {
        Self { page, per_page }
    }

    pub fn normalize(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            per_page: self.per_page.unwrap_or(20).clamp(1, 100),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl From<SortOrder> for SortDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => SortDirection::Asc,
            SortOrder::Desc => SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortBy {
    CreatedAt,
    Price,
    Name,
}

impl From<ProductSortBy> for ProductSort {
    fn from(sort: ProductSortBy) -> Self {
        match sort {
            ProductSortBy::CreatedAt => ProductSort::CreatedAt,
            ProductSortBy::Price => ProductSort::Price,
            ProductSortBy::Name => ProductSort::Name,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matches name or detail, case-insensitive.
    pub q: Option<String>,
    pub category_id: Option<Uuid>,
    /// Preset bracket such as `0-50000` or `100000-max`. Explicit bounds win.
    pub price_range: Option<String>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub sort_by: Option<ProductSortBy>,
    pub sort_order: Option<SortOrder>,
}

impl ProductQuery {
    pub fn into_filter(self) -> AppResult<ProductFilter> {
        let range = self
            .price_range
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<PriceRange>)
            .transpose()?;

        Ok(ProductFilter {
            category_id: self.category_id,
            min_price: self.min_price.or(range.and_then(|r| r.min)),
            max_price: self.max_price.or(range.and_then(|r| r.max)),
            search: self.q.filter(|s| !s.trim().is_empty()),
            sort_by: self.sort_by.map(Into::into).unwrap_or_default(),
            direction: self.sort_order.map(Into::into).unwrap_or_default(),
            page: Pagination::new(self.page, self.per_page).normalize(),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn into_filter(self) -> AppResult<OrderFilter> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::parse::<OrderStatus>)
            .transpose()?;

        Ok(OrderFilter {
            status,
            direction: self.sort_order.map(Into::into).unwrap_or_default(),
            page: Pagination::new(self.page, self.per_page).normalize(),
        })
    }
}
