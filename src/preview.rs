use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::validate::LocalFile;

/// A local copy of a selected thumbnail that the shell can render before upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewHandle {
    pub id: String,
    pub path: PathBuf,
}

/// Owns every live preview file. Nothing else deletes them, so callers must
/// release a handle once it is superseded or its draft goes away.
#[derive(Debug)]
pub struct PreviewStore {
    dir: PathBuf,
    live: HashMap<String, PathBuf>,
}

impl PreviewStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            live: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    #[cfg(test)]
    pub fn is_live(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    pub fn create(&mut self, source: &LocalFile) -> anyhow::Result<PreviewHandle> {
        std::fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create preview dir {}", self.dir.to_string_lossy())
        })?;
        let id = Uuid::new_v4().to_string();
        let ext = source
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("img");
        let dst = self.dir.join(format!("{id}.{ext}"));
        std::fs::copy(&source.path, &dst).with_context(|| {
            format!(
                "failed to copy preview from {} to {}",
                source.path.to_string_lossy(),
                dst.to_string_lossy()
            )
        })?;
        debug!(preview = %id, "preview created");
        self.live.insert(id.clone(), dst.clone());
        Ok(PreviewHandle { id, path: dst })
    }

    /// Unknown or already released handles are ignored.
    pub fn release(&mut self, handle: &PreviewHandle) {
        let Some(path) = self.live.remove(&handle.id) else {
            return;
        };
        if let Err(e) = std::fs::remove_file(&path) {
            warn!(preview = %handle.id, error = %e, "failed to remove preview file");
        } else {
            debug!(preview = %handle.id, "preview released");
        }
    }

    pub fn release_all(&mut self) {
        for (id, path) in self.live.drain() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(preview = %id, error = %e, "failed to remove preview file");
            }
        }
    }
}
