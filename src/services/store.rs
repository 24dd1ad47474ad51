use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io: {0}")]
    Io(#[from] std::io::Error),

    #[error("store encoding: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LastPrice {
    pub price: f64,
    /// Unix seconds.
    pub timestamp: u64,
}

/// The last price that was notified about, kept in a small JSON file.
pub struct PriceStore {
    path: PathBuf,
}

impl PriceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing or unreadable file means no previous price.
    pub fn load(&self) -> Option<f64> {
        if !self.path.exists() {
            tracing::debug!("no last price file at {:?}", self.path);
            return None;
        }
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("⚠️ could not read {:?}: {}", self.path, e);
                return None;
            }
        };
        match serde_json::from_str::<LastPrice>(&content) {
            Ok(last) => Some(last.price),
            Err(e) => {
                tracing::warn!("⚠️ ignoring malformed {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub fn save(&self, price: f64) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let record = LastPrice {
            price,
            timestamp: unix_now(),
        };
        std::fs::write(&self.path, serde_json::to_string(&record)?)?;
        tracing::debug!("💾 last price {} saved to {:?}", price, self.path);
        Ok(())
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
