//! Device-local cart copies.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::CartStoreError;
use crate::domain::aggregates::CartItem;

pub trait LocalCartStore: Send + Sync {
    /// Stored items; nothing stored yet reads as an empty list.
    fn load(&self) -> Result<Vec<CartItem>, CartStoreError>;
    fn save(&self, items: &[CartItem]) -> Result<(), CartStoreError>;
}

/// One JSON file per device.
#[derive(Debug, Clone)]
pub struct FileCartStore {
    path: PathBuf,
}

impl FileCartStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_device(dir: impl AsRef<Path>, device_id: &str) -> Self {
        let safe: String = device_id.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' }).collect();
        Self::new(dir.as_ref().join(format!("cart-{safe}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LocalCartStore for FileCartStore {
    fn load(&self) -> Result<Vec<CartItem>, CartStoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(vec![]),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, items: &[CartItem]) -> Result<(), CartStoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        // write-then-rename; readers never see a partial file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(items)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryCartStore {
    items: Mutex<Vec<CartItem>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<CartItem>) -> Self {
        Self { items: Mutex::new(items) }
    }
}

impl LocalCartStore for MemoryCartStore {
    fn load(&self) -> Result<Vec<CartItem>, CartStoreError> {
        Ok(self.items.lock().map_err(|_| CartStoreError::Poisoned)?.clone())
    }

    fn save(&self, items: &[CartItem]) -> Result<(), CartStoreError> {
        *self.items.lock().map_err(|_| CartStoreError::Poisoned)? = items.to_vec();
        Ok(())
    }
}
