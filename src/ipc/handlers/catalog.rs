use serde_json::{json, Value};
use tracing::info;

use crate::catalog::{board_input, standard_input, subject_input};
use crate::ipc::helpers::{
    backend_failed, get_opt_f64, get_opt_file, get_required_str, get_str_or_empty, invalid,
    respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::validate::LocalFile;

fn image_param(state: &mut AppState, params: &Value) -> Result<Option<LocalFile>, HandlerErr> {
    get_opt_file(params, "image").map_err(|e| invalid(&mut state.notices, e))
}

fn done(state: &mut AppState, message: &str, result: Value) -> Result<Value, HandlerErr> {
    info!("{message}");
    state.notices.success(message);
    Ok(result)
}

async fn boards_list(state: &mut AppState) -> Result<Value, HandlerErr> {
    match state.backend.list_boards().await {
        Ok(boards) => Ok(json!({ "boards": boards })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch boards", e)),
    }
}

async fn boards_save(
    state: &mut AppState,
    params: &Value,
    id: Option<String>,
) -> Result<Value, HandlerErr> {
    let image = image_param(state, params)?;
    let input = board_input(&get_str_or_empty(params, "name"), image)
        .map_err(|e| invalid(&mut state.notices, e))?;
    let (saved, ok_msg, fail_msg) = match &id {
        Some(id) => (
            state.backend.update_board(id, &input).await,
            "Board updated successfully",
            "Failed to update board",
        ),
        None => (
            state.backend.create_board(&input).await,
            "Board created successfully",
            "Failed to create board",
        ),
    };
    match saved {
        Ok(board) => done(state, ok_msg, json!({ "board": board })),
        Err(e) => Err(backend_failed(&mut state.notices, fail_msg, e)),
    }
}

async fn boards_delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match state.backend.delete_board(&id).await {
        Ok(()) => done(state, "Board deleted successfully", json!({ "id": id })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to delete board", e)),
    }
}

async fn standards_list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let board_id = get_required_str(params, "boardId")?;
    match state.backend.list_standards(&board_id).await {
        Ok(standards) => Ok(json!({ "standards": standards })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch standards", e)),
    }
}

async fn standards_get(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match state.backend.get_standard(&id).await {
        Ok(standard) => Ok(json!({ "standard": standard })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch standard", e)),
    }
}

async fn standards_save(
    state: &mut AppState,
    params: &Value,
    id: Option<String>,
) -> Result<Value, HandlerErr> {
    let image = image_param(state, params)?;
    let input = standard_input(
        &get_str_or_empty(params, "grade"),
        get_opt_f64(params, "price"),
        &get_str_or_empty(params, "boardId"),
        image,
    )
    .map_err(|e| invalid(&mut state.notices, e))?;
    let (saved, ok_msg, fail_msg) = match &id {
        Some(id) => (
            state.backend.update_standard(id, &input).await,
            "Standard updated successfully",
            "Failed to update standard",
        ),
        None => (
            state
                .backend
                .create_standard(&input.board_id, &input)
                .await,
            "Standard created successfully",
            "Failed to create standard",
        ),
    };
    match saved {
        Ok(standard) => done(state, ok_msg, json!({ "standard": standard })),
        Err(e) => Err(backend_failed(&mut state.notices, fail_msg, e)),
    }
}

async fn standards_delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match state.backend.delete_standard(&id).await {
        Ok(()) => done(state, "Standard deleted successfully", json!({ "id": id })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to delete standard", e)),
    }
}

async fn subjects_list(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let standard_id = get_required_str(params, "standardId")?;
    match state.backend.list_subjects(&standard_id).await {
        Ok(subjects) => Ok(json!({ "subjects": subjects })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch subjects", e)),
    }
}

async fn subjects_save(
    state: &mut AppState,
    params: &Value,
    id: Option<String>,
) -> Result<Value, HandlerErr> {
    let image = image_param(state, params)?;
    let input = subject_input(
        &get_str_or_empty(params, "name"),
        get_opt_f64(params, "price"),
        image,
    )
    .map_err(|e| invalid(&mut state.notices, e))?;
    let (saved, ok_msg, fail_msg) = match &id {
        Some(id) => (
            state.backend.update_subject(id, &input).await,
            "Subject updated successfully",
            "Failed to update subject",
        ),
        None => {
            let standard_id = get_required_str(params, "standardId")?;
            (
                state.backend.create_subject(&standard_id, &input).await,
                "Subject created successfully",
                "Failed to create subject",
            )
        }
    };
    match saved {
        Ok(subject) => done(state, ok_msg, json!({ "subject": subject })),
        Err(e) => Err(backend_failed(&mut state.notices, fail_msg, e)),
    }
}

async fn subjects_delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match state.backend.delete_subject(&id).await {
        Ok(()) => done(state, "Subject deleted successfully", json!({ "id": id })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to delete subject", e)),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let p = &req.params;
    let id = || get_required_str(p, "id");
    let result = match req.method.as_str() {
        "boards.list" => boards_list(state).await,
        "boards.create" => boards_save(state, p, None).await,
        "boards.update" => match id() {
            Ok(id) => boards_save(state, p, Some(id)).await,
            Err(e) => Err(e),
        },
        "boards.delete" => boards_delete(state, p).await,
        "standards.list" => standards_list(state, p).await,
        "standards.get" => standards_get(state, p).await,
        "standards.create" => standards_save(state, p, None).await,
        "standards.update" => match id() {
            Ok(id) => standards_save(state, p, Some(id)).await,
            Err(e) => Err(e),
        },
        "standards.delete" => standards_delete(state, p).await,
        "subjects.list" => subjects_list(state, p).await,
        "subjects.create" => subjects_save(state, p, None).await,
        "subjects.update" => match id() {
            Ok(id) => subjects_save(state, p, Some(id)).await,
            Err(e) => Err(e),
        },
        "subjects.delete" => subjects_delete(state, p).await,
        _ => return None,
    };
    Some(respond(&req.id, result))
}
