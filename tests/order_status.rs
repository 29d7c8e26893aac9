mod common;

use storefront::{
    error::AppError,
    models::{NewOrder, NewOrderLine, OrderFilter, OrderStatus},
    services::admin_service,
    store::{MemoryStore, OrderStore},
};
use uuid::Uuid;

use common::customer;

async fn pending_order(store: &MemoryStore) -> anyhow::Result<Uuid> {
    let (order, _) = store
        .create_order(
            NewOrder {
                id: Uuid::new_v4(),
                customer: customer(),
                status: OrderStatus::Pending,
            },
            vec![NewOrderLine {
                id: Uuid::new_v4(),
                product_id: Uuid::new_v4(),
                quantity: 1,
                unit_price: 10000,
            }],
        )
        .await?;
    Ok(order.id)
}

#[test]
fn transition_table() {
    use OrderStatus::*;

    let allowed = [
        (Pending, Shipped),
        (Pending, Cancelled),
        (Shipped, Completed),
        (Shipped, Cancelled),
    ];
    for from in OrderStatus::ALL {
        for to in OrderStatus::ALL {
            assert_eq!(
                from.can_transition_to(to),
                allowed.contains(&(from, to)),
                "{from} -> {to}"
            );
        }
    }
    assert!(Completed.is_terminal());
    assert!(Cancelled.is_terminal());
    assert!(!Pending.is_terminal());
}

#[test]
fn status_parses_case_insensitively() {
    assert_eq!("shipped".parse::<OrderStatus>().ok(), Some(OrderStatus::Shipped));
    assert!(matches!(
        "lost".parse::<OrderStatus>(),
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn order_moves_through_its_lifecycle() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let id = pending_order(&store).await?;

    let order = admin_service::update_order_status(&store, id, OrderStatus::Shipped).await?;
    assert_eq!(order.status, OrderStatus::Shipped);
    assert!(order.updated_at >= order.created_at);

    let order = admin_service::update_order_status(&store, id, OrderStatus::Completed).await?;
    assert_eq!(order.status, OrderStatus::Completed);

    let err = admin_service::update_order_status(&store, id, OrderStatus::Cancelled)
        .await
        .expect_err("completed is terminal");
    assert!(matches!(err, AppError::Validation(_)));

    let actions: Vec<_> = store
        .audit_entries()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(actions, vec!["order_status_update", "order_status_update"]);
    Ok(())
}

#[tokio::test]
async fn pending_cannot_skip_to_completed() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let id = pending_order(&store).await?;

    let err = admin_service::update_order_status(&store, id, OrderStatus::Completed)
        .await
        .expect_err("must ship first");
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let store = MemoryStore::new();
    let err = admin_service::update_order_status(&store, Uuid::new_v4(), OrderStatus::Shipped)
        .await
        .expect_err("no such order");
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test]
async fn stale_expected_status_does_not_write() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let id = pending_order(&store).await?;
    store
        .set_order_status(id, OrderStatus::Pending, OrderStatus::Cancelled)
        .await?;

    let lost = store
        .set_order_status(id, OrderStatus::Pending, OrderStatus::Shipped)
        .await?;
    assert!(lost.is_none());

    let order = store.get_order(id).await?.expect("order exists");
    assert_eq!(order.status, OrderStatus::Cancelled);
    Ok(())
}

#[tokio::test]
async fn list_orders_filters_by_status() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let shipped = pending_order(&store).await?;
    pending_order(&store).await?;
    admin_service::update_order_status(&store, shipped, OrderStatus::Shipped).await?;

    let page = admin_service::list_orders(
        &store,
        &OrderFilter {
            status: Some(OrderStatus::Pending),
            ..OrderFilter::default()
        },
    )
    .await?;
    assert_eq!(page.total, 1);
    assert!(page.items.iter().all(|o| o.status == OrderStatus::Pending));

    let all = admin_service::list_orders(&store, &OrderFilter::default()).await?;
    assert_eq!(all.total, 2);
    Ok(())
}
