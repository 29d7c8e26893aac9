use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub checkout_timeout: Duration,
    pub cart_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let checkout_timeout = env::var("CHECKOUT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CHECKOUT_TIMEOUT);
        let cart_path = env::var("CART_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CART_PATH));
        Ok(Self {
            port,
            database_url,
            host,
            checkout_timeout,
            cart_path,
        })
    }
}

pub const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CART_PATH: &str = ".storefront/cart.json";
