use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::dashboard::DASHBOARD_FAILED_MESSAGE;
use crate::ipc::helpers::{backend_failed, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};

async fn refresh(state: &mut AppState) -> Result<Value, HandlerErr> {
    let backend = state.backend.clone();
    match state.dashboard.refresh(backend.as_ref()).await {
        Ok(overview) => Ok(json!({ "overview": overview })),
        Err(e) => Err(backend_failed(&mut state.notices, DASHBOARD_FAILED_MESSAGE, e)),
    }
}

/// Serves the cached overview unless there is none yet or `refresh` is set.
async fn overview(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let force = params
        .get("refresh")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if !force {
        if let Some(snapshot) = state.dashboard.snapshot() {
            return Ok(json!({ "overview": snapshot }));
        }
    }
    refresh(state).await
}

/// Turns on periodic refresh and fetches once right away. A failed first
/// fetch still leaves the watch on.
async fn watch(state: &mut AppState) -> Result<Value, HandlerErr> {
    state.dashboard.set_watching(true);
    let first = refresh(state).await;
    Ok(json!({
        "watching": true,
        "refreshSecs": state.cfg.dashboard_refresh.as_secs(),
        "overview": first.ok().and_then(|v| v.get("overview").cloned()),
    }))
}

/// Called by the main loop on every refresh tick.
pub async fn on_tick(state: &mut AppState) {
    if !state.dashboard.watching() {
        return;
    }
    debug!("dashboard refresh tick");
    if let Err(e) = refresh(state).await {
        warn!(code = e.code, "scheduled dashboard refresh failed");
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let result = match req.method.as_str() {
        "dashboard.overview" => overview(state, &req.params).await,
        "dashboard.refresh" => refresh(state).await,
        "dashboard.watch" => watch(state).await,
        "dashboard.unwatch" => {
            state.dashboard.set_watching(false);
            Ok(json!({ "watching": false }))
        }
        _ => return None,
    };
    Some(respond(&req.id, result))
}
