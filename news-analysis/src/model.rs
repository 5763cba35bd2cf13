//! Guarded one-time loading of analysis models.
//!
//! A model is loaded on first use, on the blocking pool, and shared afterwards. Concurrent
//! first callers wait for the same load instead of starting their own, and no caller can
//! observe a partially built model. A failed load is not cached; the next call retries.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::types::{AnalysisError, Result};

pub type Loader<M> = fn() -> Result<M>;

pub struct LazyModel<M> {
    name: &'static str,
    loader: Loader<M>,
    cell: OnceCell<Arc<M>>,
}

impl<M: Send + Sync + 'static> LazyModel<M> {
    pub const fn new(name: &'static str, loader: Loader<M>) -> Self {
        Self {
            name,
            loader,
            cell: OnceCell::const_new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Returns the loaded model, loading it first if nobody has yet.
    pub async fn get(&self) -> Result<Arc<M>> {
        self.cell
            .get_or_try_init(|| async {
                let started = Instant::now();
                debug!("Loading model {}", self.name);

                let loader = self.loader;
                let model = tokio::task::spawn_blocking(loader)
                    .await
                    .map_err(|e| AnalysisError::model(self.name, format!("model loader did not complete: {e}")))??;

                info!("Loaded model {} in {:?}", self.name, started.elapsed());
                Ok::<_, AnalysisError>(Arc::new(model))
            })
            .await
            .cloned()
    }
}
