//! Client-side cart, persisted locally as a JSON array of `{id, quantity}`.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartEntry {
    #[serde(rename = "id")]
    pub product_id: Uuid,
    pub quantity: u32,
}

/// Largest quantity one cart entry can hold. Order lines store quantities as `i32`.
pub const MAX_QUANTITY: u32 = i32::MAX as u32;

/// Clamp every quantity into `1..=MAX_QUANTITY` and merge entries naming the
/// same product. Merged entries keep the position of their first occurrence.
pub fn normalize_entries(entries: &[CartEntry]) -> Vec<CartEntry> {
    let mut merged: Vec<CartEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        let quantity = entry.quantity.clamp(1, MAX_QUANTITY);
        match merged.iter_mut().find(|e| e.product_id == entry.product_id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(quantity).min(MAX_QUANTITY);
            }
            None => merged.push(CartEntry {
                product_id: entry.product_id,
                quantity,
            }),
        }
    }
    merged
}

/// Durable string slot holding the serialized cart.
pub trait CartStorage {
    fn read_cart(&self) -> Option<String>;
    fn write_cart(&self, raw: &str) -> AppResult<()>;
    fn remove_cart(&self) -> AppResult<()>;
}

/// Keeps the cart in one file; writes go through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileCartStorage {
    path: PathBuf,
}

impl FileCartStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileCartStorage {
    fn read_cart(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Some(raw),
            Err(err) if err.kind() == io::ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "cart file unreadable");
                None
            }
        }
    }

    fn write_cart(&self, raw: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, raw).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing {}", self.path.display()))?;
        Ok(())
    }

    fn remove_cart(&self) -> AppResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("removing {}", self.path.display()))
                .into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryCartStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryCartStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }
}

impl CartStorage for MemoryCartStorage {
    fn read_cart(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write_cart(&self, raw: &str) -> AppResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(raw.to_string());
        Ok(())
    }

    fn remove_cart(&self) -> AppResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[derive(Debug)]
pub struct CartStore<S> {
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Current entries. Missing or corrupt data reads as an empty cart.
    pub fn get(&self) -> Vec<CartEntry> {
        let Some(raw) = self.storage.read_cart() else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<CartEntry>>(&raw) {
            Ok(entries) => normalize_entries(&entries),
            Err(err) => {
                tracing::warn!(error = %err, "stored cart is malformed, treating it as empty");
                Vec::new()
            }
        }
    }

    pub fn save(&self, entries: &[CartEntry]) -> AppResult<()> {
        let raw = serde_json::to_string(entries).context("serializing cart")?;
        self.storage.write_cart(&raw)
    }

    /// Add one unit of a product and return its new quantity.
    pub fn add(&self, product_id: Uuid, product_name: &str) -> AppResult<u32> {
        let mut entries = self.get();
        let quantity = match entries.iter_mut().find(|e| e.product_id == product_id) {
            Some(entry) => {
                entry.quantity = entry.quantity.saturating_add(1).min(MAX_QUANTITY);
                entry.quantity
            }
            None => {
                entries.push(CartEntry {
                    product_id,
                    quantity: 1,
                });
                1
            }
        };
        self.save(&entries)?;
        tracing::info!(%product_id, product = product_name, quantity, "added to cart");
        Ok(quantity)
    }

    pub fn remove(&self, product_id: Uuid) -> AppResult<()> {
        let entries: Vec<CartEntry> = self
            .get()
            .into_iter()
            .filter(|e| e.product_id != product_id)
            .collect();
        self.save(&entries)
    }

    /// Set the quantity of an entry already in the cart, clamped into
    /// `1..=MAX_QUANTITY`. Returns whether an entry was updated.
    pub fn set_quantity(&self, product_id: Uuid, quantity: i64) -> AppResult<bool> {
        let quantity = u32::try_from(quantity.clamp(1, i64::from(MAX_QUANTITY)))
            .unwrap_or(MAX_QUANTITY);
        let mut entries = self.get();
        let Some(entry) = entries.iter_mut().find(|e| e.product_id == product_id) else {
            return Ok(false);
        };
        entry.quantity = quantity;
        self.save(&entries)?;
        Ok(true)
    }

    pub fn clear(&self) -> AppResult<()> {
        self.storage.remove_cart()
    }
}
