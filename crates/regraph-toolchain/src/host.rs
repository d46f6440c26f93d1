//! Host that backs each model with a scratch directory.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use regraph_core::{DesignHost, ModelHandle, RegraphError, Result};
use tempfile::TempDir;
use tracing::debug;
use uuid::Uuid;

/// Hands out one temporary directory per model and deletes it on release.
#[derive(Debug, Default)]
pub struct ProcessHost {
    /// Parent for scratch directories; the system temp dir when unset.
    scratch_root: Option<PathBuf>,
    models: Mutex<HashMap<Uuid, TempDir>>,
}

impl ProcessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Models opened and not yet released.
    pub fn open_count(&self) -> usize {
        self.models.lock().map(|m| m.len()).unwrap_or(0)
    }

    fn scratch_dir(&self) -> std::io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("regraph-model-");
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}

#[async_trait]
impl DesignHost for ProcessHost {
    async fn open_model(&self, doc_id: &str) -> Result<ModelHandle> {
        let dir = self
            .scratch_dir()
            .map_err(|e| RegraphError::Host(format!("cannot create model directory: {}", e)))?;
        let model = ModelHandle::with_workspace(doc_id, dir.path());

        let mut models = self
            .models
            .lock()
            .map_err(|_| RegraphError::Host("model registry poisoned".to_string()))?;
        models.insert(model.id(), dir);
        debug!(doc_id = %doc_id, model = %model.id(), "Opened model");
        Ok(model)
    }

    async fn close_model(&self, model: ModelHandle) -> Result<()> {
        let dir = self
            .models
            .lock()
            .map_err(|_| RegraphError::Host("model registry poisoned".to_string()))?
            .remove(&model.id())
            .ok_or_else(|| RegraphError::Host(format!("unknown model {}", model.id())))?;

        dir.close().map_err(|e| {
            RegraphError::Host(format!(
                "cannot remove model directory for {}: {}",
                model.document(),
                e
            ))
        })?;
        debug!(doc_id = %model.document(), model = %model.id(), "Closed model");
        Ok(())
    }
}
