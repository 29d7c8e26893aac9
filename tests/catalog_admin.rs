mod common;

use storefront::{
    dto::{categories::CategoryInput, products::ProductInput},
    error::AppError,
    format::{format_price, format_price_vnd},
    models::{FormMode, PriceRange, ProductFilter, ProductSort, SortDirection},
    routes::params::ProductQuery,
    services::{admin_service, catalog_service},
    store::MemoryStore,
};
use uuid::Uuid;

use common::{seed_category, seed_product, seed_product_in};

fn input(name: &str, price: i64, image: Option<&str>) -> ProductInput {
    ProductInput {
        name: name.into(),
        price,
        image: image.map(str::to_string),
        detail: "detail".into(),
        category_id: None,
    }
}

#[tokio::test]
async fn create_requires_an_image_and_edit_keeps_it() -> anyhow::Result<()> {
    let store = MemoryStore::new();

    let err = admin_service::save_product(&store, FormMode::Create, input("Cable", 70000, None))
        .await
        .expect_err("image required");
    assert!(matches!(err, AppError::Validation(_)));

    let created = admin_service::save_product(
        &store,
        FormMode::Create,
        input("Cable", 70000, Some("cable.jpg")),
    )
    .await?;

    let edited = admin_service::save_product(
        &store,
        FormMode::Edit(created.id),
        input("Cable 2m", 90000, Some("  ")),
    )
    .await?;
    assert_eq!(edited.id, created.id);
    assert_eq!(edited.name, "Cable 2m");
    assert_eq!(edited.price, 90000);
    assert_eq!(edited.image, "cable.jpg");

    let audit: Vec<_> = store
        .audit_entries()
        .into_iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(audit, vec!["product_create", "product_update"]);
    Ok(())
}

#[tokio::test]
async fn product_input_is_validated() -> anyhow::Result<()> {
    let store = MemoryStore::new();

    for bad in [
        input(" ", 1000, Some("x.jpg")),
        input("Negative", -1, Some("x.jpg")),
        ProductInput {
            category_id: Some(Uuid::new_v4()),
            ..input("Orphan", 1000, Some("x.jpg"))
        },
    ] {
        let err = admin_service::save_product(&store, FormMode::Create, bad)
            .await
            .expect_err("invalid product");
        assert!(matches!(err, AppError::Validation(_)));
    }

    seed_product(&store, "Taken", 1000).await?;
    let err = admin_service::save_product(&store, FormMode::Create, input("Taken", 1, Some("t.jpg")))
        .await
        .expect_err("duplicate name");
    assert!(matches!(err, AppError::Conflict(_)));

    let err = admin_service::save_product(
        &store,
        FormMode::Edit(Uuid::new_v4()),
        input("Ghost", 1000, None),
    )
    .await
    .expect_err("no such product");
    assert!(matches!(err, AppError::NotFound));
    Ok(())
}

#[tokio::test]
async fn deleting_a_category_detaches_its_products() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let phones = seed_category(&store, "Phones").await?;
    let phone = seed_product_in(&store, "Basic Phone", 450000, Some(phones.id)).await?;

    admin_service::delete_category(&store, phones.id).await?;

    let phone = catalog_service::get_product(&store, phone.id).await?;
    assert_eq!(phone.category_id, None);
    assert!(matches!(
        catalog_service::get_category(&store, phones.id).await,
        Err(AppError::NotFound)
    ));
    assert!(matches!(
        admin_service::delete_category(&store, phones.id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn category_form_creates_and_renames() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let created = admin_service::save_category(
        &store,
        FormMode::Create,
        CategoryInput {
            name: "Accessories".into(),
        },
    )
    .await?;
    let renamed = admin_service::save_category(
        &store,
        FormMode::Edit(created.id),
        CategoryInput {
            name: "Add-ons".into(),
        },
    )
    .await?;
    assert_eq!(renamed.id, created.id);
    assert_eq!(renamed.name, "Add-ons");

    let err = admin_service::save_category(
        &store,
        FormMode::Create,
        CategoryInput { name: "".into() },
    )
    .await
    .expect_err("blank name");
    assert!(matches!(err, AppError::Validation(_)));
    Ok(())
}

#[tokio::test]
async fn delete_product_reports_missing() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let product = seed_product(&store, "Charger", 150000).await?;

    admin_service::delete_product(&store, product.id).await?;
    assert!(matches!(
        admin_service::delete_product(&store, product.id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn product_listing_filters_by_category_price_and_search() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let phones = seed_category(&store, "Phones").await?;
    seed_product_in(&store, "Basic Phone", 450000, Some(phones.id)).await?;
    seed_product_in(&store, "Smartphone Lite", 2990000, Some(phones.id)).await?;
    seed_product(&store, "Phone Case", 45000).await?;
    seed_product(&store, "USB-C Cable", 70000).await?;

    let in_phones = catalog_service::list_products(
        &store,
        &ProductFilter {
            category_id: Some(phones.id),
            sort_by: ProductSort::Price,
            direction: SortDirection::Asc,
            ..ProductFilter::default()
        },
    )
    .await?;
    let names: Vec<_> = in_phones.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Basic Phone", "Smartphone Lite"]);

    let cheap = catalog_service::list_products(
        &store,
        &ProductQuery {
            price_range: Some("0-50000".into()),
            ..ProductQuery::default()
        }
        .into_filter()?,
    )
    .await?;
    assert_eq!(cheap.total, 1);
    assert_eq!(cheap.items[0].name, "Phone Case");

    let search = catalog_service::list_products(
        &store,
        &ProductFilter {
            search: Some("PHONE".into()),
            ..ProductFilter::default()
        },
    )
    .await?;
    assert_eq!(search.total, 3);
    Ok(())
}

#[test]
fn price_range_presets() -> anyhow::Result<()> {
    assert_eq!(
        "0-50000".parse::<PriceRange>()?,
        PriceRange {
            min: None,
            max: Some(50000)
        }
    );
    assert_eq!(
        "50000-100000".parse::<PriceRange>()?,
        PriceRange {
            min: Some(50000),
            max: Some(100000)
        }
    );
    assert_eq!(
        "100000-max".parse::<PriceRange>()?,
        PriceRange {
            min: Some(100000),
            max: None
        }
    );
    assert!("cheap".parse::<PriceRange>().is_err());
    assert!("500-100".parse::<PriceRange>().is_err());
    Ok(())
}

#[test]
fn explicit_bounds_win_over_preset() -> anyhow::Result<()> {
    let filter = ProductQuery {
        price_range: Some("50000-100000".into()),
        max_price: Some(80000),
        per_page: Some(500),
        ..ProductQuery::default()
    }
    .into_filter()?;
    assert_eq!(filter.min_price, Some(50000));
    assert_eq!(filter.max_price, Some(80000));
    assert_eq!(filter.page.per_page, 100);
    Ok(())
}

#[test]
fn prices_use_dot_grouping() {
    assert_eq!(format_price(0), "0");
    assert_eq!(format_price(999), "999");
    assert_eq!(format_price(70000), "70.000");
    assert_eq!(format_price(1250000), "1.250.000");
    assert_eq!(format_price(-45000), "-45.000");
    assert_eq!(format_price_vnd(150000), "150.000 VND");
}
