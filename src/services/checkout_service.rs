use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::{CartStorage, CartStore},
    dto::{cart::CartLineItem, orders::OrderWithLines},
    error::{AppError, AppResult},
    models::{CustomerInfo, NewOrder, NewOrderLine, OrderStatus},
    services::cart_service,
    store::{AuditLog, CatalogStore, OrderStore},
};

/// Persist one order and its lines for the given cart items under a fresh id.
pub async fn place_order<S>(
    store: &S,
    customer: CustomerInfo,
    items: &[CartLineItem],
    timeout: Duration,
) -> AppResult<OrderWithLines>
where
    S: OrderStore + AuditLog + ?Sized,
{
    place_order_as(store, Uuid::new_v4(), customer, items, timeout).await
}

/// Persist one order and its lines under a caller-chosen id.
///
/// Input is checked before the store is touched: every quantity must be at
/// least 1 and each product may appear only once. Unit prices are copied
/// from the products as they were resolved, so later catalog edits never
/// change a placed order. The commit is abandoned with
/// [`AppError::Timeout`] once `timeout` elapses.
///
/// Placing the same `order_id` twice never creates a second order: if an
/// earlier attempt already committed, that order is returned.
pub async fn place_order_as<S>(
    store: &S,
    order_id: Uuid,
    customer: CustomerInfo,
    items: &[CartLineItem],
    timeout: Duration,
) -> AppResult<OrderWithLines>
where
    S: OrderStore + AuditLog + ?Sized,
{
    if items.is_empty() {
        return Err(AppError::Validation("cart is empty".into()));
    }
    customer.validate()?;

    let mut seen = HashSet::with_capacity(items.len());
    let lines = items
        .iter()
        .map(|item| {
            if !seen.insert(item.product.id) {
                return Err(AppError::Validation(format!(
                    "{} appears more than once",
                    item.product.name
                )));
            }
            if item.quantity == 0 {
                return Err(AppError::Validation(format!(
                    "quantity for {} must be at least 1",
                    item.product.name
                )));
            }
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                AppError::Validation(format!("quantity for {} is too large", item.product.name))
            })?;
            Ok(NewOrderLine {
                id: Uuid::new_v4(),
                product_id: item.product.id,
                quantity,
                unit_price: item.product.price,
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let new_order = NewOrder {
        id: order_id,
        customer,
        status: OrderStatus::Pending,
    };

    let created = tokio::time::timeout(timeout, store.create_order(new_order, lines))
        .await
        .map_err(|_| AppError::Timeout)?;
    let (order, lines) = match created {
        Ok(created) => created,
        Err(AppError::Conflict(reason)) => {
            return match find_placed(store, order_id).await? {
                Some(placed) => {
                    tracing::info!(order_id = %order_id, "order was already placed");
                    Ok(placed)
                }
                None => Err(AppError::Conflict(reason)),
            };
        }
        Err(err) => return Err(err),
    };

    let placed = OrderWithLines::new(order, lines)?;
    tracing::info!(
        order_id = %placed.order.id,
        lines = placed.lines.len(),
        total = placed.total,
        "order placed"
    );

    if let Err(err) = log_audit(
        store,
        "order_placed",
        Some("orders"),
        Some(serde_json::json!({ "order_id": placed.order.id, "total": placed.total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(placed)
}

/// The committed order with this id, if there is one.
pub async fn find_placed<S: OrderStore + ?Sized>(
    store: &S,
    order_id: Uuid,
) -> AppResult<Option<OrderWithLines>> {
    let Some(order) = store.get_order(order_id).await? else {
        return Ok(None);
    };
    let lines = store.list_order_lines(Some(order_id)).await?;
    OrderWithLines::new(order, lines).map(Some)
}

/// One shopper's checkout session.
///
/// At most one placement runs at a time; a second attempt while the first is
/// still pending fails with [`AppError::Conflict`]. The cart is cleared only
/// after the order has been committed.
///
/// An attempt that fails with a retryable error keeps its order id, and the
/// next attempt reuses it. If the first attempt did commit after all, the
/// retry returns that order instead of placing a second one.
pub struct Checkout<S, C> {
    store: Arc<S>,
    cart: CartStore<C>,
    timeout: Duration,
    in_flight: AtomicBool,
    pending: Mutex<Option<Uuid>>,
}

struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S, C> Checkout<S, C>
where
    S: OrderStore + AuditLog,
    C: CartStorage,
{
    pub fn new(store: Arc<S>, cart: CartStore<C>, timeout: Duration) -> Self {
        Self {
            store,
            cart,
            timeout,
            in_flight: AtomicBool::new(false),
            pending: Mutex::new(None),
        }
    }

    /// Resume with the order id of an earlier attempt that did not confirm.
    pub fn with_pending_order(self, order_id: Option<Uuid>) -> Self {
        self.set_pending(order_id);
        self
    }

    /// Order id the next attempt will reuse, if the last one did not confirm.
    pub fn pending_order(&self) -> Option<Uuid> {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_pending(&self, order_id: Option<Uuid>) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = order_id;
    }

    pub fn cart(&self) -> &CartStore<C> {
        &self.cart
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Place an order for already resolved items.
    pub async fn place_order(
        &self,
        customer: CustomerInfo,
        items: &[CartLineItem],
    ) -> AppResult<OrderWithLines> {
        let _guard = self.begin()?;
        self.submit(customer, items).await
    }

    /// Resolve the stored cart against the catalog and place an order for it.
    pub async fn checkout_cart<K: CatalogStore + ?Sized>(
        &self,
        catalog: &K,
        customer: CustomerInfo,
    ) -> AppResult<OrderWithLines> {
        let _guard = self.begin()?;
        let summary = cart_service::resolve(catalog, &self.cart.get()).await?;
        if summary.is_empty() {
            return Err(AppError::Validation("cart is empty".into()));
        }
        self.submit(customer, &summary.items).await
    }

    fn begin(&self) -> AppResult<InFlight<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::Conflict("an order is already being placed".into()))?;
        Ok(InFlight(&self.in_flight))
    }

    async fn submit(
        &self,
        customer: CustomerInfo,
        items: &[CartLineItem],
    ) -> AppResult<OrderWithLines> {
        let order_id = self.pending_order().unwrap_or_else(Uuid::new_v4);
        self.set_pending(Some(order_id));

        let result =
            place_order_as(self.store.as_ref(), order_id, customer, items, self.timeout).await;
        match result {
            Ok(placed) => {
                self.set_pending(None);
                if let Err(err) = self.cart.clear() {
                    tracing::warn!(order_id = %placed.order.id, error = %err, "order placed but cart was not cleared");
                }
                Ok(placed)
            }
            Err(err) => {
                if !err.is_retryable() {
                    self.set_pending(None);
                }
                Err(err)
            }
        }
    }
}
