mod common;

use std::{sync::Arc, time::Duration};

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use storefront::{
    cart::{CartStore, MemoryCartStorage},
    dto::cart::CartLineItem,
    error::AppError,
    models::{CustomerInfo, ProductChanges},
    routes::create_app,
    services::{
        admin_service, cart_service,
        checkout_service::{self, Checkout},
    },
    state::AppState,
    store::{CatalogStore, MemoryStore, OrderStore},
};
use tower::ServiceExt;

use common::{customer, seed_product};

const TIMEOUT: Duration = Duration::from_secs(10);

fn session(store: &Arc<MemoryStore>) -> Checkout<MemoryStore, MemoryCartStorage> {
    Checkout::new(
        store.clone(),
        CartStore::new(MemoryCartStorage::new()),
        TIMEOUT,
    )
}

#[tokio::test]
async fn empty_cart_is_rejected_before_touching_the_store() {
    let store = MemoryStore::new();

    let err = checkout_service::place_order(&store, customer(), &[], TIMEOUT)
        .await
        .expect_err("empty cart");

    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(store.calls(), 0);
    assert_eq!(store.order_count(), 0);
}

#[tokio::test]
async fn incomplete_customer_details_are_rejected() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let checkout = session(&store);
    checkout.cart().add(a.id, &a.name)?;
    let items = cart_service::resolve(store.as_ref(), &checkout.cart().get())
        .await?
        .items;

    let calls = store.calls();
    let missing_phone = CustomerInfo {
        phone: "  ".into(),
        ..customer()
    };
    let err = checkout
        .place_order(missing_phone, &items)
        .await
        .expect_err("missing phone");
    assert!(matches!(err, AppError::Validation(_)));

    let bad_email = CustomerInfo {
        email: "not-an-email".into(),
        ..customer()
    };
    let err = checkout
        .checkout_cart(store.as_ref(), bad_email)
        .await
        .expect_err("bad email");
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(store.order_count(), 0);
    assert_eq!(checkout.cart().get().len(), 1);
    // Only the catalog read for the second attempt.
    assert_eq!(store.calls() - calls, 1);
    Ok(())
}

#[tokio::test]
async fn successful_checkout_snapshots_prices_and_clears_cart() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let b = seed_product(&store, "B", 50000).await?;

    let checkout = session(&store);
    checkout.cart().add(a.id, &a.name)?;
    checkout.cart().add(a.id, &a.name)?;
    checkout.cart().add(b.id, &b.name)?;

    let placed = checkout.checkout_cart(store.as_ref(), customer()).await?;

    assert_eq!(store.order_count(), 1);
    assert_eq!(placed.lines.len(), 2);
    assert_eq!(placed.total, 70000);
    assert!(placed.lines.iter().all(|line| line.order_id == placed.order.id));
    assert!(checkout.cart().get().is_empty());
    assert!(!checkout.is_submitting());

    store
        .update_product(
            a.id,
            ProductChanges {
                name: a.name.clone(),
                price: 99000,
                image: None,
                detail: a.detail.clone(),
                category_id: None,
            },
        )
        .await?;

    let details = admin_service::get_order_details(store.as_ref(), placed.order.id).await?;
    let line_a = details
        .lines
        .iter()
        .find(|line| line.product_id == a.id)
        .expect("line for A");
    assert_eq!(line_a.unit_price, 10000);
    assert_eq!(line_a.quantity, 2);
    assert_eq!(details.total, 70000);

    let audit = store.audit_entries();
    assert!(audit.iter().any(|entry| entry.action == "order_placed"));
    Ok(())
}

#[tokio::test]
async fn failed_commit_keeps_the_cart_and_writes_nothing() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let checkout = session(&store);
    checkout.cart().add(a.id, &a.name)?;
    store.fail_commits(true);

    let err = checkout
        .checkout_cart(store.as_ref(), customer())
        .await
        .expect_err("commit fails");

    assert!(err.is_retryable());
    assert_eq!(store.order_count(), 0);
    assert!(store.list_order_lines(None).await?.is_empty());
    assert_eq!(checkout.cart().get().len(), 1);
    assert!(!checkout.is_submitting());

    store.fail_commits(false);
    checkout.checkout_cart(store.as_ref(), customer()).await?;
    assert_eq!(store.order_count(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_commit_times_out_as_retryable() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let checkout = session(&store);
    checkout.cart().add(a.id, &a.name)?;
    store.delay_commits(Some(Duration::from_secs(60)));

    let err = checkout
        .checkout_cart(store.as_ref(), customer())
        .await
        .expect_err("commit is too slow");

    assert!(matches!(err, AppError::Timeout));
    assert!(err.is_retryable());
    assert_eq!(store.order_count(), 0);
    assert_eq!(checkout.cart().get().len(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn second_submission_while_pending_is_rejected() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let checkout = session(&store);
    checkout.cart().add(a.id, &a.name)?;
    store.delay_commits(Some(Duration::from_secs(1)));

    let (first, second) = tokio::join!(
        checkout.checkout_cart(store.as_ref(), customer()),
        checkout.checkout_cart(store.as_ref(), customer()),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(AppError::Conflict(_))));
    assert_eq!(store.order_count(), 1);
    Ok(())
}

#[tokio::test]
async fn http_checkout_prices_come_from_the_catalog() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let app = create_app(AppState::new(store.clone(), TIMEOUT));

    let payload = serde_json::json!({
        "customer": customer(),
        "items": [{ "id": a.id, "quantity": 3 }],
    });
    let response = app
        .oneshot(
            Request::post("/api/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&payload)?))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body: serde_json::Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
    assert_eq!(body["data"]["total"], 30000);
    assert_eq!(body["data"]["lines"][0]["unit_price"], 10000);
    assert_eq!(body["data"]["order"]["status"], "Pending");
    assert_eq!(store.order_count(), 1);
    Ok(())
}

#[tokio::test]
async fn http_checkout_with_empty_cart_is_bad_request() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let app = create_app(AppState::new(store.clone(), TIMEOUT));

    let payload = serde_json::json!({ "customer": customer(), "items": [] });
    let response = app
        .oneshot(
            Request::post("/api/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&payload)?))?,
        )
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(store.calls(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn retry_after_unconfirmed_commit_returns_the_same_order() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let checkout = session(&store);
    checkout.cart().add(a.id, &a.name)?;
    store.delay_acks(Some(Duration::from_secs(60)));

    let err = checkout
        .checkout_cart(store.as_ref(), customer())
        .await
        .expect_err("commit is not confirmed in time");
    assert!(matches!(err, AppError::Timeout));
    assert_eq!(store.order_count(), 1);
    assert_eq!(checkout.cart().get().len(), 1);
    let pending = checkout.pending_order().expect("order id kept for retry");

    store.delay_acks(None);
    let placed = checkout.checkout_cart(store.as_ref(), customer()).await?;

    assert_eq!(placed.order.id, pending);
    assert_eq!(placed.total, 10000);
    assert_eq!(store.order_count(), 1);
    assert!(checkout.cart().get().is_empty());
    assert_eq!(checkout.pending_order(), None);
    Ok(())
}

#[tokio::test]
async fn rejected_checkout_does_not_keep_an_order_id() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let checkout = session(&store);
    checkout.cart().add(a.id, &a.name)?;

    let bad_email = CustomerInfo {
        email: "nope".into(),
        ..customer()
    };
    checkout
        .checkout_cart(store.as_ref(), bad_email)
        .await
        .expect_err("bad email");
    assert_eq!(checkout.pending_order(), None);
    Ok(())
}

#[tokio::test]
async fn zero_or_repeated_items_are_rejected_when_placing() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let a = seed_product(&store, "A", 10000).await?;

    let zero = [CartLineItem {
        product: a.clone(),
        quantity: 0,
        subtotal: 0,
    }];
    let err = checkout_service::place_order(&store, customer(), &zero, TIMEOUT)
        .await
        .expect_err("zero quantity");
    assert!(matches!(err, AppError::Validation(_)));

    let one = CartLineItem::new(a.clone(), 1)?;
    let repeated = [one.clone(), one];
    let err = checkout_service::place_order(&store, customer(), &repeated, TIMEOUT)
        .await
        .expect_err("repeated product");
    assert!(matches!(err, AppError::Validation(_)));

    assert_eq!(store.order_count(), 0);
    Ok(())
}

async fn post_checkout(
    app: axum::Router,
    payload: &serde_json::Value,
) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let response = app
        .oneshot(
            Request::post("/api/checkout")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(payload)?))?,
        )
        .await?;
    let status = response.status();
    let body = serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
    Ok((status, body))
}

#[tokio::test]
async fn http_checkout_merges_entries_like_cart_resolve() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let app = create_app(AppState::new(store.clone(), TIMEOUT));
    let items = serde_json::json!([
        { "id": a.id, "quantity": 0 },
        { "id": a.id, "quantity": 2 },
    ]);

    let response = app
        .clone()
        .oneshot(
            Request::post("/api/cart/resolve")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(
                    &serde_json::json!({ "items": items }),
                )?))?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let resolved: serde_json::Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;

    let (status, placed) = post_checkout(
        app,
        &serde_json::json!({ "customer": customer(), "items": items }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["data"]["lines"].as_array().map(Vec::len), Some(1));
    assert_eq!(placed["data"]["lines"][0]["quantity"], 3);
    assert_eq!(placed["data"]["total"], 30000);
    assert_eq!(placed["data"]["total"], resolved["data"]["total"]);
    Ok(())
}

#[tokio::test]
async fn http_checkout_resubmitted_with_same_id_places_one_order() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let a = seed_product(&store, "A", 10000).await?;
    let app = create_app(AppState::new(store.clone(), TIMEOUT));
    let order_id = uuid::Uuid::new_v4();
    let payload = serde_json::json!({
        "customer": customer(),
        "items": [{ "id": a.id, "quantity": 1 }],
        "order_id": order_id,
    });

    let (status, first) = post_checkout(app.clone(), &payload).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, second) = post_checkout(app, &payload).await?;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(first["data"]["order"]["id"], order_id.to_string());
    assert_eq!(second["data"]["order"]["id"], order_id.to_string());
    assert_eq!(store.order_count(), 1);
    Ok(())
}
