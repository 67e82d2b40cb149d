use serde_json::{json, Value};

use crate::ipc::error::ok;
use crate::ipc::types::{AppState, Request};

fn handle_health(state: &mut AppState, req: &Request) -> Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "apiUrl": state.cfg.api_url,
            "dashboardWatching": state.dashboard.watching(),
        }),
    )
}

fn handle_config_get(state: &mut AppState, req: &Request) -> Value {
    let cfg = &state.cfg;
    ok(
        &req.id,
        json!({
            "apiUrl": cfg.api_url,
            "httpTimeoutMs": cfg.http_timeout.as_millis() as u64,
            "dashboardRefreshSecs": cfg.dashboard_refresh.as_secs(),
            "previewDir": cfg.preview_dir.to_string_lossy(),
        }),
    )
}

fn handle_notifications_drain(state: &mut AppState, req: &Request) -> Value {
    ok(&req.id, json!({ "notices": state.notices.drain() }))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        "notifications.drain" => Some(handle_notifications_drain(state, req)),
        _ => None,
    }
}
