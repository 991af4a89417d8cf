use match_core::{CatalogParseError, RewardCatalog};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

/// Error loading a catalog from disk.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] CatalogParseError),
}

/// Shared read access to the reward catalog, with atomic reload.
///
/// The catalog behind the handle is immutable; a reload parses the whole
/// document first and then swaps the `Arc`, so readers observe either the
/// old catalog or the new one, never a partial load. A failed reload leaves
/// the current catalog in place.
#[derive(Clone)]
pub struct CatalogHandle {
    inner: Arc<RwLock<Option<Arc<RewardCatalog>>>>,
}

impl CatalogHandle {
    /// A handle with no catalog loaded. Grant paths against it fail with
    /// `RewardError::CatalogUnavailable`.
    pub fn unloaded() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    pub fn new(catalog: RewardCatalog) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(Arc::new(catalog)))),
        }
    }

    /// Load a catalog from a JSON file. Startup path: a failure here is
    /// fatal and the caller exits before serving traffic.
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogLoadError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = RewardCatalog::from_json(&json)?;
        Ok(Self::new(catalog))
    }

    /// Re-read the file and swap the catalog in one step.
    pub async fn reload_from_file(&self, path: &Path) -> Result<(), CatalogLoadError> {
        let json = tokio::fs::read_to_string(path).await?;
        let catalog = RewardCatalog::from_json(&json)?;
        let mut slot = self.inner.write().await;
        let previous = slot.replace(Arc::new(catalog));
        tracing::info!(
            replaced = previous.is_some(),
            "reward catalog reloaded"
        );
        Ok(())
    }

    /// The currently loaded catalog, if any.
    pub async fn current(&self) -> Option<Arc<RewardCatalog>> {
        self.inner.read().await.clone()
    }
}
