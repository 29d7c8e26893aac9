//! Persistence seams.
//!
//! Everything the storefront reads or writes remotely goes through
//! [`CatalogStore`] and [`OrderStore`]. [`OrmStore`] talks to PostgreSQL;
//! [`MemoryStore`] keeps everything in process and can be told to fail.

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        Category, NewOrder, NewOrderLine, NewProduct, Order, OrderFilter, OrderLine, OrderStatus,
        Page, Product, ProductChanges, ProductFilter,
    },
};

pub mod memory;
pub mod orm;

pub use memory::MemoryStore;
pub use orm::OrmStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>>;

    /// Fetch every product in `ids` that still exists, in one round trip.
    /// Missing ids are simply absent from the result.
    async fn get_products(&self, ids: &[Uuid]) -> AppResult<Vec<Product>>;

    async fn query_products(&self, filter: &ProductFilter) -> AppResult<Page<Product>>;

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>>;

    async fn list_categories(&self) -> AppResult<Vec<Category>>;

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product>;

    /// Returns `None` when no product has this id.
    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>>;

    /// Returns whether a product was removed.
    async fn delete_product(&self, id: Uuid) -> AppResult<bool>;

    async fn insert_category(&self, id: Uuid, name: String) -> AppResult<Category>;

    async fn update_category(&self, id: Uuid, name: String) -> AppResult<Option<Category>>;

    /// Removes the category and detaches its products.
    async fn delete_category(&self, id: Uuid) -> AppResult<bool>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order and all of its lines as one atomic unit.
    ///
    /// Either every record becomes visible or none does. The order's
    /// `created_at` comes from the store's clock.
    async fn create_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> AppResult<(Order, Vec<OrderLine>)>;

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>>;

    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<Page<Order>>;

    /// Compare-and-set on the order status.
    ///
    /// Returns `None` when the order does not exist or its status is no
    /// longer `expected`.
    async fn set_order_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> AppResult<Option<Order>>;

    /// All order lines, or only those of one order.
    async fn list_order_lines(&self, order_id: Option<Uuid>) -> AppResult<Vec<OrderLine>>;
}

#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub action: String,
    pub resource: Option<String>,
    pub metadata: Option<Value>,
}

/// Everything the HTTP layer needs from one backend.
pub trait Storefront: CatalogStore + OrderStore + AuditLog {}

impl<T: CatalogStore + OrderStore + AuditLog> Storefront for T {}
