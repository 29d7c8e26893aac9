use std::{sync::Arc, time::Duration};

use crate::store::Storefront;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Storefront>,
    pub checkout_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn Storefront>, checkout_timeout: Duration) -> Self {
        Self {
            store,
            checkout_timeout,
        }
    }
}
