use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::CartEntry,
    dto::{
        cart::{CartLineItem, CartSummary, ResolveCartRequest},
        categories::{CategoryInput, CategoryList},
        orders::{CheckoutRequest, OrderList, OrderWithLines, Statistics, UpdateOrderStatusRequest},
        products::{ProductInput, ProductList},
    },
    models::{Category, CustomerInfo, Order, OrderLine, OrderStatus, Product},
    response::{ApiResponse, Meta},
    routes::{admin, cart, categories, health, orders, params, products},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        products::list_products,
        products::get_product,
        categories::list_categories,
        categories::get_category,
        cart::resolve_cart,
        orders::checkout,
        orders::get_order,
        admin::list_all_orders,
        admin::get_order_admin,
        admin::update_order_status,
        admin::statistics,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::create_category,
        admin::update_category,
        admin::delete_category
    ),
    components(
        schemas(
            Product,
            Category,
            Order,
            OrderLine,
            OrderStatus,
            CustomerInfo,
            CartEntry,
            CartLineItem,
            CartSummary,
            ResolveCartRequest,
            CheckoutRequest,
            OrderWithLines,
            OrderList,
            UpdateOrderStatusRequest,
            Statistics,
            ProductInput,
            ProductList,
            CategoryInput,
            CategoryList,
            params::SortOrder,
            params::ProductSortBy,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<CartSummary>,
            ApiResponse<OrderWithLines>,
            ApiResponse<OrderList>,
            ApiResponse<Statistics>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog browsing"),
        (name = "Categories", description = "Catalog categories"),
        (name = "Cart", description = "Cart reconciliation"),
        (name = "Orders", description = "Checkout and order lookup"),
        (name = "Admin", description = "Order management, statistics and catalog editing"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
