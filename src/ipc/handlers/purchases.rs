use serde_json::{json, Value};
use tracing::info;

use crate::ipc::helpers::{backend_failed, get_required_str, invalid, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::models::PaymentStatus;
use crate::purchases::{load_tabs, resolve_names, sort_newest_first, summarize};
use crate::validate::ValidationError;

async fn list(state: &mut AppState) -> Result<Value, HandlerErr> {
    match load_tabs(state.backend.as_ref()).await {
        Ok((subject, standard)) => Ok(json!({ "subject": subject, "standard": standard })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch purchases", e)),
    }
}

async fn by_user(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let user_id = get_required_str(params, "userId")?;
    let mut purchases = match state.backend.user_purchases(&user_id).await {
        Ok(p) => p,
        Err(e) => return Err(backend_failed(&mut state.notices, "Failed to fetch purchases", e)),
    };
    sort_newest_first(&mut purchases);
    let summary = summarize(&purchases);
    match resolve_names(state.backend.as_ref(), purchases).await {
        Ok(rows) => Ok(json!({ "purchases": rows, "summary": summary })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch purchases", e)),
    }
}

async fn update_status(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let raw = get_required_str(params, "status")?;
    let status = PaymentStatus::parse(&raw)
        .ok_or_else(|| invalid(&mut state.notices, ValidationError::UnknownStatus(raw.clone())))?;
    match state.backend.update_purchase_status(&id, status).await {
        Ok(()) => {
            info!(%id, status = status.as_str(), "purchase status updated");
            state
                .notices
                .success(format!("Status updated to {}", status.as_str()));
            Ok(json!({ "id": id, "paymentStatus": status }))
        }
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to update status", e)),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let p = &req.params;
    let result = match req.method.as_str() {
        "purchases.list" => list(state).await,
        "purchases.byUser" => by_user(state, p).await,
        "purchases.updateStatus" => update_status(state, p).await,
        _ => return None,
    };
    Some(respond(&req.id, result))
}
