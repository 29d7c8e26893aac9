use anyhow::anyhow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::{
        categories::CategoryInput,
        orders::{OrderWithLines, Statistics},
        products::ProductInput,
    },
    error::{AppError, AppResult},
    models::{
        Category, FormMode, NewProduct, Order, OrderFilter, OrderStatus, Page, Product,
        ProductChanges,
    },
    store::{AuditLog, CatalogStore, OrderStore},
};

pub async fn list_orders<S: OrderStore + ?Sized>(
    store: &S,
    filter: &OrderFilter,
) -> AppResult<Page<Order>> {
    store.list_orders(filter).await
}

pub async fn get_order_details<S: OrderStore + ?Sized>(
    store: &S,
    id: Uuid,
) -> AppResult<OrderWithLines> {
    let order = store.get_order(id).await?.ok_or(AppError::NotFound)?;
    let lines = store.list_order_lines(Some(order.id)).await?;
    OrderWithLines::new(order, lines)
}

pub async fn update_order_status<S>(store: &S, id: Uuid, next: OrderStatus) -> AppResult<Order>
where
    S: OrderStore + AuditLog + ?Sized,
{
    let current = store.get_order(id).await?.ok_or(AppError::NotFound)?;
    if !current.status.can_transition_to(next) {
        return Err(AppError::Validation(format!(
            "order cannot move from {} to {next}",
            current.status
        )));
    }

    let order = store
        .set_order_status(id, current.status, next)
        .await?
        .ok_or_else(|| AppError::Conflict("order status changed concurrently".into()))?;

    tracing::info!(order_id = %order.id, from = %current.status, to = %next, "order status updated");
    if let Err(err) = log_audit(
        store,
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "from": current.status, "to": next })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(order)
}

/// Revenue and units sold across every order line ever placed.
///
/// Scans all lines on each call. A failed read is returned as an error rather
/// than reported as zero.
pub async fn compute_statistics<S: OrderStore + ?Sized>(store: &S) -> AppResult<Statistics> {
    let lines = store.list_order_lines(None).await?;
    let mut stats = Statistics {
        total_revenue: 0,
        total_units_sold: 0,
    };
    for line in &lines {
        stats.total_revenue = line
            .subtotal()
            .and_then(|subtotal| stats.total_revenue.checked_add(subtotal))
            .ok_or_else(|| AppError::Internal(anyhow!("revenue total out of range")))?;
        stats.total_units_sold += i64::from(line.quantity);
    }
    tracing::debug!(lines = lines.len(), ?stats, "statistics computed");
    Ok(stats)
}

pub async fn save_product<S>(store: &S, mode: FormMode, input: ProductInput) -> AppResult<Product>
where
    S: CatalogStore + AuditLog + ?Sized,
{
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("product name is required".into()));
    }
    if input.price < 0 {
        return Err(AppError::Validation("product price cannot be negative".into()));
    }
    if let Some(category_id) = input.category_id
        && store.get_category(category_id).await?.is_none()
    {
        return Err(AppError::Validation(format!("category {category_id} does not exist")));
    }
    let image = input
        .image
        .map(|image| image.trim().to_string())
        .filter(|image| !image.is_empty());

    let (product, action) = match mode {
        FormMode::Create => {
            let image = image
                .ok_or_else(|| AppError::Validation("product image is required".into()))?;
            let product = store
                .insert_product(NewProduct {
                    id: Uuid::new_v4(),
                    name,
                    price: input.price,
                    image,
                    detail: input.detail,
                    category_id: input.category_id,
                })
                .await?;
            (product, "product_create")
        }
        FormMode::Edit(id) => {
            let product = store
                .update_product(
                    id,
                    ProductChanges {
                        name,
                        price: input.price,
                        image,
                        detail: input.detail,
                        category_id: input.category_id,
                    },
                )
                .await?
                .ok_or(AppError::NotFound)?;
            (product, "product_update")
        }
    };

    if let Err(err) = log_audit(
        store,
        action,
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(product)
}

pub async fn delete_product<S>(store: &S, id: Uuid) -> AppResult<()>
where
    S: CatalogStore + AuditLog + ?Sized,
{
    if !store.delete_product(id).await? {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        store,
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

pub async fn save_category<S>(store: &S, mode: FormMode, input: CategoryInput) -> AppResult<Category>
where
    S: CatalogStore + AuditLog + ?Sized,
{
    let name = input.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("category name is required".into()));
    }

    let (category, action) = match mode {
        FormMode::Create => (
            store.insert_category(Uuid::new_v4(), name).await?,
            "category_create",
        ),
        FormMode::Edit(id) => (
            store
                .update_category(id, name)
                .await?
                .ok_or(AppError::NotFound)?,
            "category_update",
        ),
    };

    if let Err(err) = log_audit(
        store,
        action,
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(category)
}

/// Remove a category. Its products stay in the catalog without a category.
pub async fn delete_category<S>(store: &S, id: Uuid) -> AppResult<()>
where
    S: CatalogStore + AuditLog + ?Sized,
{
    if !store.delete_category(id).await? {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        store,
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}
