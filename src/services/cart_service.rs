use std::collections::HashMap;

use crate::{
    cart::{CartEntry, normalize_entries},
    dto::cart::{CartLineItem, CartSummary},
    error::AppResult,
    models::Product,
    store::CatalogStore,
};

/// Join cart entries with the products they name.
///
/// Entries are normalized first: quantities are clamped to at least 1 and
/// duplicates of one product are merged, so a cart submitted from anywhere
/// resolves to the same lines. Products are fetched in a single batch.
/// Entries whose product no longer exists are dropped; the rest keep their
/// cart order. A failed fetch is returned as an error so callers can tell it
/// apart from an empty cart.
pub async fn resolve<S: CatalogStore + ?Sized>(
    catalog: &S,
    entries: &[CartEntry],
) -> AppResult<CartSummary> {
    let entries = normalize_entries(entries);
    if entries.is_empty() {
        return Ok(CartSummary::empty());
    }

    let ids: Vec<_> = entries.iter().map(|entry| entry.product_id).collect();
    let products: HashMap<_, Product> = catalog
        .get_products(&ids)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut items = Vec::with_capacity(entries.len());
    for entry in &entries {
        match products.get(&entry.product_id) {
            Some(product) => items.push(CartLineItem::new(product.clone(), entry.quantity)?),
            None => {
                tracing::debug!(product_id = %entry.product_id, "dropping cart entry for missing product");
            }
        }
    }

    CartSummary::from_items(items)
}
