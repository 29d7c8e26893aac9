//! Command-line storefront: browse the catalog, keep a local cart and check out.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use storefront::{
    cart::{CartStore, FileCartStorage},
    config::{DEFAULT_CART_PATH, DEFAULT_CHECKOUT_TIMEOUT},
    db::create_pool,
    dto::cart::CartSummary,
    format::format_price_vnd,
    models::{CustomerInfo, PriceRange, ProductFilter},
    services::{admin_service, cart_service, catalog_service, checkout_service::Checkout},
    store::OrmStore,
};
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "shop", about = "Storefront CLI", long_about = None)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true, global = true)]
    database_url: Option<String>,

    /// Where the local cart is kept
    #[arg(long, env = "CART_PATH", default_value = DEFAULT_CART_PATH, global = true)]
    cart_path: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List products, newest first
    Products(ProductsArgs),
    /// List categories
    Categories,
    /// Show one product
    Product { id: Uuid },
    /// Inspect or change the local cart
    Cart(CartCommand),
    /// Place an order for everything in the cart
    Checkout(CheckoutArgs),
    /// Show a placed order
    Order { id: Uuid },
}

#[derive(Debug, Args)]
struct ProductsArgs {
    #[arg(long)]
    category: Option<Uuid>,

    /// Price bracket such as 0-50000 or 100000-max
    #[arg(long)]
    price: Option<PriceRange>,

    #[arg(long, short)]
    search: Option<String>,
}

#[derive(Debug, Args)]
struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Add one unit of a product
    Add { id: Uuid },
    Remove { id: Uuid },
    /// Set the quantity of a product already in the cart (minimum 1)
    Set { id: Uuid, quantity: i64 },
    Show,
    Clear,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,

    /// Seconds to wait for the order to commit
    #[arg(long, env = "CHECKOUT_TIMEOUT_SECS", default_value_t = DEFAULT_CHECKOUT_TIMEOUT.as_secs())]
    timeout: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,storefront=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cart = CartStore::new(FileCartStorage::new(&cli.cart_path));

    match cli.command {
        Commands::Products(args) => {
            let store = connect(cli.database_url.as_deref()).await?;
            let filter = ProductFilter {
                category_id: args.category,
                min_price: args.price.and_then(|range| range.min),
                max_price: args.price.and_then(|range| range.max),
                search: args.search,
                ..ProductFilter::default()
            };
            let page = catalog_service::list_products(&store, &filter).await?;
            if page.items.is_empty() {
                println!("no products found");
            }
            for product in page.items {
                println!("{}  {:>14}  {}", product.id, format_price_vnd(product.price), product.name);
            }
        }
        Commands::Categories => {
            let store = connect(cli.database_url.as_deref()).await?;
            for category in catalog_service::list_categories(&store).await? {
                println!("{}  {}", category.id, category.name);
            }
        }
        Commands::Product { id } => {
            let store = connect(cli.database_url.as_deref()).await?;
            let product = catalog_service::get_product(&store, id).await?;
            println!("name: {}", product.name);
            println!("price: {}", format_price_vnd(product.price));
            println!("image: {}", product.image);
            println!(
                "category: {}",
                product
                    .category_id
                    .map_or_else(|| "none".to_string(), |value| value.to_string())
            );
            println!("detail: {}", product.detail);
        }
        Commands::Cart(command) => run_cart(command, &cart, cli.database_url.as_deref()).await?,
        Commands::Checkout(args) => {
            let store = Arc::new(connect(cli.database_url.as_deref()).await?);
            let pending_path = cli.cart_path.with_extension("pending");
            let checkout = Checkout::new(store.clone(), cart, Duration::from_secs(args.timeout))
                .with_pending_order(read_pending(&pending_path));
            let customer = CustomerInfo {
                name: args.name,
                address: args.address,
                email: args.email,
                phone: args.phone,
            };
            let result = checkout.checkout_cart(store.as_ref(), customer).await;
            save_pending(&pending_path, checkout.pending_order())?;
            match result {
                Ok(placed) => {
                    println!("order placed: {}", placed.order.id);
                    println!("total: {}", format_price_vnd(placed.total));
                }
                Err(err) if err.is_retryable() => {
                    anyhow::bail!("{err}; your cart was kept, try again");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Commands::Order { id } => {
            let store = connect(cli.database_url.as_deref()).await?;
            let details = admin_service::get_order_details(&store, id).await?;
            println!("order: {} ({})", details.order.id, details.order.status);
            println!("placed: {}", details.order.created_at);
            for line in &details.lines {
                println!(
                    "  {} x{} @ {}",
                    line.product_id,
                    line.quantity,
                    format_price_vnd(line.unit_price)
                );
            }
            println!("total: {}", format_price_vnd(details.total));
        }
    }

    Ok(())
}

async fn run_cart(
    command: CartCommand,
    cart: &CartStore<FileCartStorage>,
    database_url: Option<&str>,
) -> anyhow::Result<()> {
    match command.command {
        CartSubcommand::Add { id } => {
            let store = connect(database_url).await?;
            let product = catalog_service::get_product(&store, id).await?;
            let quantity = cart.add(product.id, &product.name)?;
            println!("{} in cart: {quantity}", product.name);
        }
        CartSubcommand::Remove { id } => cart.remove(id)?,
        CartSubcommand::Set { id, quantity } => {
            if !cart.set_quantity(id, quantity)? {
                println!("{id} is not in the cart");
            }
        }
        CartSubcommand::Show => {
            let store = connect(database_url).await?;
            let summary = cart_service::resolve(&store, &cart.get()).await?;
            print_cart(&summary);
        }
        CartSubcommand::Clear => cart.clear()?,
    }
    Ok(())
}

fn print_cart(summary: &CartSummary) {
    if summary.is_empty() {
        println!("cart is empty");
        return;
    }
    for item in &summary.items {
        println!(
            "{}  x{}  {}",
            item.product.name,
            item.quantity,
            format_price_vnd(item.subtotal)
        );
    }
    println!("total: {}", format_price_vnd(summary.total));
}

/// Order id left behind by a checkout that did not confirm.
fn read_pending(path: &Path) -> Option<Uuid> {
    let text = std::fs::read_to_string(path).ok()?;
    match text.trim().parse() {
        Ok(id) => Some(id),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring unreadable pending order id");
            None
        }
    }
}

fn save_pending(path: &Path, order_id: Option<Uuid>) -> anyhow::Result<()> {
    match order_id {
        Some(id) => std::fs::write(path, id.to_string())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove {}", path.display()));
            }
        },
    }
    Ok(())
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<OrmStore> {
    let url = database_url.context("DATABASE_URL is required for this command")?;
    let pool = create_pool(url)
        .await
        .context("failed to connect to database")?;
    Ok(OrmStore::new(pool))
}
