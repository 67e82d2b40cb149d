use std::sync::Arc;

use serde::Deserialize;

use crate::api::AdminBackend;
use crate::cascade::SelectionCascade;
use crate::config::AdminConfig;
use crate::dashboard::DashboardState;
use crate::drafts::ResourceForm;
use crate::notify::Notifier;
use crate::preview::PreviewStore;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Everything the daemon holds between requests. Only the main loop owns it,
/// so handlers take `&mut` and never lock.
pub struct AppState {
    pub cfg: AdminConfig,
    pub backend: Arc<dyn AdminBackend>,
    pub cascade: SelectionCascade,
    pub form: ResourceForm,
    pub previews: PreviewStore,
    pub notices: Notifier,
    pub dashboard: DashboardState,
}

impl AppState {
    pub fn new(cfg: AdminConfig, backend: Arc<dyn AdminBackend>) -> Self {
        let previews = PreviewStore::new(cfg.preview_dir.clone());
        Self {
            cfg,
            backend,
            cascade: SelectionCascade::default(),
            form: ResourceForm::default(),
            previews,
            notices: Notifier::default(),
            dashboard: DashboardState::default(),
        }
    }

    /// Drops every draft preview. Run on shutdown.
    pub fn shutdown(&mut self) {
        self.form.discard(&mut self.previews);
        self.previews.release_all();
    }
}
