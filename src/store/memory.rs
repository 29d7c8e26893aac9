use std::{
    collections::BTreeMap,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{
        Category, NewOrder, NewOrderLine, NewProduct, Order, OrderFilter, OrderLine, OrderStatus,
        Page, Product, ProductChanges, ProductFilter, ProductSort, SortDirection,
    },
    store::{AuditEntry, AuditLog, CatalogStore, OrderStore},
};

#[derive(Debug, Default)]
struct Collections {
    products: BTreeMap<Uuid, Product>,
    categories: BTreeMap<Uuid, Category>,
    orders: Vec<Order>,
    order_lines: Vec<OrderLine>,
    audit: Vec<AuditEntry>,
}

/// In-process store with the same semantics as [`super::OrmStore`].
///
/// Failures can be switched on to exercise error paths: reads and commits
/// can be made to fail, and commits or their acknowledgements can be delayed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Collections>,
    fail_reads: AtomicBool,
    fail_commits: AtomicBool,
    commit_delay: Mutex<Option<Duration>>,
    ack_delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read fail with [`AppError::StoreUnavailable`].
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `create_order` fail without writing anything.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Hold every `create_order` for `delay` before it commits.
    pub fn delay_commits(&self, delay: Option<Duration>) {
        *self
            .commit_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Hold every `create_order` for `delay` after it has committed.
    pub fn delay_acks(&self, delay: Option<Duration>) {
        *self.ack_delay.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Number of store operations issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn order_count(&self) -> usize {
        self.data().orders.len()
    }

    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.data().audit.clone()
    }

    fn data(&self) -> MutexGuard<'_, Collections> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_read(&self) -> AppResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("reads are failing".into()));
        }
        Ok(())
    }

    fn begin_write(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn get_product(&self, id: Uuid) -> AppResult<Option<Product>> {
        self.begin_read()?;
        Ok(self.data().products.get(&id).cloned())
    }

    async fn get_products(&self, ids: &[Uuid]) -> AppResult<Vec<Product>> {
        self.begin_read()?;
        let data = self.data();
        Ok(ids
            .iter()
            .filter_map(|id| data.products.get(id).cloned())
            .collect())
    }

    async fn query_products(&self, filter: &ProductFilter) -> AppResult<Page<Product>> {
        self.begin_read()?;
        let mut matching: Vec<Product> = self
            .data()
            .products
            .values()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match filter.sort_by {
                ProductSort::CreatedAt => a.created_at.cmp(&b.created_at),
                ProductSort::Price => a.price.cmp(&b.price),
                ProductSort::Name => a.name.cmp(&b.name),
            };
            match filter.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.page.offset().max(0) as usize)
            .take(filter.page.per_page.max(0) as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn get_category(&self, id: Uuid) -> AppResult<Option<Category>> {
        self.begin_read()?;
        Ok(self.data().categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        self.begin_read()?;
        let mut categories: Vec<Category> = self.data().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_product(&self, product: NewProduct) -> AppResult<Product> {
        self.begin_write();
        let mut data = self.data();
        if data.products.values().any(|p| p.name == product.name) {
            return Err(AppError::Conflict(format!(
                "product '{}' already exists",
                product.name
            )));
        }
        let product = Product {
            id: product.id,
            name: product.name,
            price: product.price,
            image: product.image,
            detail: product.detail,
            category_id: product.category_id,
            created_at: Utc::now(),
        };
        data.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(&self, id: Uuid, changes: ProductChanges) -> AppResult<Option<Product>> {
        self.begin_write();
        let mut data = self.data();
        if data
            .products
            .values()
            .any(|p| p.id != id && p.name == changes.name)
        {
            return Err(AppError::Conflict(format!(
                "product '{}' already exists",
                changes.name
            )));
        }
        let Some(product) = data.products.get_mut(&id) else {
            return Ok(None);
        };
        product.name = changes.name;
        product.price = changes.price;
        product.detail = changes.detail;
        product.category_id = changes.category_id;
        if let Some(image) = changes.image {
            product.image = image;
        }
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: Uuid) -> AppResult<bool> {
        self.begin_write();
        Ok(self.data().products.remove(&id).is_some())
    }

    async fn insert_category(&self, id: Uuid, name: String) -> AppResult<Category> {
        self.begin_write();
        let mut data = self.data();
        if data.categories.values().any(|c| c.name == name) {
            return Err(AppError::Conflict(format!("category '{name}' already exists")));
        }
        let category = Category {
            id,
            name,
            created_at: Utc::now(),
        };
        data.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: Uuid, name: String) -> AppResult<Option<Category>> {
        self.begin_write();
        let mut data = self.data();
        if data.categories.values().any(|c| c.id != id && c.name == name) {
            return Err(AppError::Conflict(format!("category '{name}' already exists")));
        }
        let Some(category) = data.categories.get_mut(&id) else {
            return Ok(None);
        };
        category.name = name;
        Ok(Some(category.clone()))
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<bool> {
        self.begin_write();
        let mut data = self.data();
        if data.categories.remove(&id).is_none() {
            return Ok(false);
        }
        for product in data.products.values_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn create_order(
        &self,
        order: NewOrder,
        lines: Vec<NewOrderLine>,
    ) -> AppResult<(Order, Vec<OrderLine>)> {
        self.begin_write();
        if lines.is_empty() {
            return Err(AppError::Validation("an order needs at least one line".into()));
        }

        let delay = *self
            .commit_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(AppError::StoreUnavailable("commit rejected".into()));
        }

        let now = Utc::now();
        let order = Order {
            id: order.id,
            customer_name: order.customer.name,
            customer_address: order.customer.address,
            customer_email: order.customer.email,
            customer_phone: order.customer.phone,
            status: order.status,
            created_at: now,
            updated_at: now,
        };
        let lines: Vec<OrderLine> = lines
            .into_iter()
            .map(|line| OrderLine {
                id: line.id,
                order_id: order.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                created_at: now,
            })
            .collect();

        {
            let mut data = self.data();
            if data.orders.iter().any(|o| o.id == order.id) {
                return Err(AppError::Conflict(format!("order {} already exists", order.id)));
            }
            data.orders.push(order.clone());
            data.order_lines.extend(lines.iter().cloned());
        }

        let ack_delay = *self.ack_delay.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = ack_delay {
            tokio::time::sleep(delay).await;
        }
        Ok((order, lines))
    }

    async fn get_order(&self, id: Uuid) -> AppResult<Option<Order>> {
        self.begin_read()?;
        Ok(self.data().orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> AppResult<Page<Order>> {
        self.begin_read()?;
        // Ties on created_at stay in commit order, newest first when descending.
        let mut matching: Vec<Order> = self
            .data()
            .orders
            .iter()
            .filter(|o| filter.status.is_none_or(|status| o.status == status))
            .cloned()
            .collect();
        match filter.direction {
            SortDirection::Asc => matching.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
            SortDirection::Desc => {
                matching.reverse();
                matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(filter.page.offset().max(0) as usize)
            .take(filter.page.per_page.max(0) as usize)
            .collect();
        Ok(Page { items, total })
    }

    async fn set_order_status(
        &self,
        id: Uuid,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> AppResult<Option<Order>> {
        self.begin_write();
        let mut data = self.data();
        let Some(order) = data
            .orders
            .iter_mut()
            .find(|o| o.id == id && o.status == expected)
        else {
            return Ok(None);
        };
        order.status = next;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn list_order_lines(&self, order_id: Option<Uuid>) -> AppResult<Vec<OrderLine>> {
        self.begin_read()?;
        Ok(self
            .data()
            .order_lines
            .iter()
            .filter(|line| order_id.is_none_or(|id| line.order_id == id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AuditLog for MemoryStore {
    async fn record_audit(&self, entry: AuditEntry) -> AppResult<()> {
        self.begin_write();
        self.data().audit.push(entry);
        Ok(())
    }
}
