use serde_json::{json, Value};
use tracing::info;

use crate::api::ResourceFilter;
use crate::ipc::handlers::cascade::{fetch_boards, run_effects};
use crate::ipc::helpers::{
    backend_failed, get_opt_file, get_opt_str, get_required_str, get_str_or_empty, invalid,
    respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::models::ResourceKind;
use crate::submit::{build_patch, ResourceEdit};

async fn list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let filter = ResourceFilter {
        board_id: get_opt_str(params, "boardId"),
        standard_id: get_opt_str(params, "standardId"),
        subject_id: get_opt_str(params, "subjectId"),
    };
    match state.backend.list_resources(&filter).await {
        Ok(resources) => Ok(json!({ "resources": resources })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch resources", e)),
    }
}

async fn get(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match state.backend.get_resource(&id).await {
        Ok(resource) => Ok(json!({ "resource": resource })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch resource", e)),
    }
}

/// Loads a resource and points the cascade at its board, standard and
/// subject so the edit screen opens with all three lists filled.
async fn edit(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let resource = match state.backend.get_resource(&id).await {
        Ok(r) => r,
        Err(e) => return Err(backend_failed(&mut state.notices, "Failed to fetch resource", e)),
    };
    fetch_boards(state).await;
    let (board, standard, subject) = resource.hierarchy();
    let effects = state.cascade.restore(board, standard, subject);
    run_effects(state, effects).await;
    Ok(json!({ "resource": resource, "cascade": state.cascade }))
}

/// Ids not given in params fall back to the current cascade selection.
async fn update(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    let raw_kind = get_required_str(params, "type")?;
    let kind = ResourceKind::parse(&raw_kind)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown resource type: {raw_kind}")))?;

    let files = get_opt_file(params, "file").and_then(|file| {
        get_opt_file(params, "thumbnail").map(|thumbnail| (file, thumbnail))
    });
    let (file, thumbnail) = files.map_err(|e| invalid(&mut state.notices, e))?;

    let or_selected = |key: &str, current: Option<&str>| {
        get_opt_str(params, key).or_else(|| current.map(String::from))
    };
    let edit = ResourceEdit {
        name: get_str_or_empty(params, "name"),
        description: get_str_or_empty(params, "description"),
        kind,
        board_id: or_selected("boardId", state.cascade.board_id()),
        standard_id: or_selected("standardId", state.cascade.standard_id()),
        subject_id: or_selected("subjectId", state.cascade.subject_id()),
        file,
        video_url: get_opt_str(params, "videoUrl"),
        thumbnail,
    };
    let patch = build_patch(edit).map_err(|e| invalid(&mut state.notices, e))?;

    match state.backend.update_resource(&id, &patch).await {
        Ok(()) => {
            info!(%id, "resource updated");
            state.notices.success("Resource updated successfully");
            Ok(json!({ "id": id }))
        }
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to update resource", e)),
    }
}

async fn delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match state.backend.delete_resource(&id).await {
        Ok(()) => {
            info!(%id, "resource deleted");
            state.notices.success("Resource deleted successfully");
            Ok(json!({ "id": id }))
        }
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to delete resource", e)),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let p = &req.params;
    let result = match req.method.as_str() {
        "resources.list" => list(state, p).await,
        "resources.get" => get(state, p).await,
        "resources.edit" => edit(state, p).await,
        "resources.update" => update(state, p).await,
        "resources.delete" => delete(state, p).await,
        _ => return None,
    };
    Some(respond(&req.id, result))
}
