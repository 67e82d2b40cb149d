use serde_json::{json, Value};
use tracing::info;

use crate::catalog::student_input;
use crate::ipc::helpers::{
    backend_failed, get_opt_str, get_required_str, get_str_or_empty, invalid, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};

async fn list(state: &mut AppState) -> Result<Value, HandlerErr> {
    match state.backend.list_students().await {
        Ok(students) => Ok(json!({ "students": students })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch students", e)),
    }
}

async fn get(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match state.backend.get_student(&id).await {
        Ok(student) => Ok(json!({ "student": student })),
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to fetch student", e)),
    }
}

async fn save(state: &mut AppState, params: &Value, id: Option<String>) -> Result<Value, HandlerErr> {
    let input = student_input(
        &get_str_or_empty(params, "name"),
        &get_str_or_empty(params, "email"),
        get_opt_str(params, "password").as_deref(),
        id.is_none(),
    )
    .map_err(|e| invalid(&mut state.notices, e))?;

    let (saved, ok_msg, fail_msg) = match &id {
        Some(id) => (
            state.backend.update_student(id, &input).await,
            "Student updated successfully",
            "Failed to update student",
        ),
        None => (
            state.backend.create_student(&input).await,
            "Student created successfully",
            "Failed to create student",
        ),
    };
    match saved {
        Ok(student) => {
            info!(id = ?id, "{ok_msg}");
            state.notices.success(ok_msg);
            Ok(json!({ "student": student }))
        }
        Err(e) => Err(backend_failed(&mut state.notices, fail_msg, e)),
    }
}

async fn delete(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let id = get_required_str(params, "id")?;
    match state.backend.delete_student(&id).await {
        Ok(()) => {
            state.notices.success("Student deleted successfully");
            Ok(json!({ "id": id }))
        }
        Err(e) => Err(backend_failed(&mut state.notices, "Failed to delete student", e)),
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let p = &req.params;
    let result = match req.method.as_str() {
        "students.list" => list(state).await,
        "students.get" => get(state, p).await,
        "students.create" => save(state, p, None).await,
        "students.update" => match get_required_str(p, "id") {
            Ok(id) => save(state, p, Some(id)).await,
            Err(e) => Err(e),
        },
        "students.delete" => delete(state, p).await,
        _ => return None,
    };
    Some(respond(&req.id, result))
}
