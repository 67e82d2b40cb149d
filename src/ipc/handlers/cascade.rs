use std::collections::VecDeque;

use serde_json::{json, Value};
use tracing::warn;

use crate::cascade::{CascadeEffect, CascadeEvent};
use crate::ipc::helpers::{get_opt_str, respond, HandlerErr};
use crate::ipc::types::{AppState, Request};

/// Runs fetch effects in order and feeds their results back into the
/// cascade until nothing is left. Failures surface as notices only.
pub(crate) async fn run_effects(state: &mut AppState, effects: Vec<CascadeEffect>) {
    let mut queue: VecDeque<CascadeEffect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        let follow_up = match effect {
            CascadeEffect::FetchStandards(board_id) => {
                let result = state.backend.list_standards(&board_id).await.map_err(|e| {
                    warn!(board = %board_id, error = %e, "standards fetch failed");
                    e.to_string()
                });
                state
                    .cascade
                    .apply(CascadeEvent::StandardsLoaded { board_id, result })
            }
            CascadeEffect::FetchSubjects(standard_id) => {
                let result = state
                    .backend
                    .list_subjects(&standard_id)
                    .await
                    .map_err(|e| {
                        warn!(standard = %standard_id, error = %e, "subjects fetch failed");
                        e.to_string()
                    });
                state.cascade.apply(CascadeEvent::SubjectsLoaded {
                    standard_id,
                    result,
                })
            }
            CascadeEffect::Notify(message) => {
                state.notices.error(message);
                Vec::new()
            }
        };
        queue.extend(follow_up);
    }
}

fn snapshot(state: &AppState) -> Value {
    json!(state.cascade)
}

/// Fills the boards list. A failure becomes a notice like any other level.
pub(crate) async fn fetch_boards(state: &mut AppState) {
    let result = state.backend.list_boards().await.map_err(|e| {
        warn!(error = %e, "boards fetch failed");
        e.to_string()
    });
    let effects = state.cascade.apply(CascadeEvent::BoardsLoaded(result));
    run_effects(state, effects).await;
}

async fn load_boards(state: &mut AppState) -> Result<Value, HandlerErr> {
    fetch_boards(state).await;
    Ok(snapshot(state))
}

async fn select(state: &mut AppState, event: CascadeEvent) -> Result<Value, HandlerErr> {
    let effects = state.cascade.apply(event);
    run_effects(state, effects).await;
    Ok(snapshot(state))
}

async fn restore(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let effects = state.cascade.restore(
        get_opt_str(params, "boardId"),
        get_opt_str(params, "standardId"),
        get_opt_str(params, "subjectId"),
    );
    run_effects(state, effects).await;
    Ok(snapshot(state))
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let p = &req.params;
    let result = match req.method.as_str() {
        "cascade.get" => Ok(snapshot(state)),
        "cascade.loadBoards" => load_boards(state).await,
        "cascade.selectBoard" => {
            select(state, CascadeEvent::BoardSelected(get_opt_str(p, "boardId"))).await
        }
        "cascade.selectStandard" => {
            select(
                state,
                CascadeEvent::StandardSelected(get_opt_str(p, "standardId")),
            )
            .await
        }
        "cascade.selectSubject" => {
            select(
                state,
                CascadeEvent::SubjectSelected(get_opt_str(p, "subjectId")),
            )
            .await
        }
        "cascade.restore" => restore(state, p).await,
        "cascade.reset" => {
            state.cascade.reset();
            Ok(snapshot(state))
        }
        _ => return None,
    };
    Some(respond(&req.id, result))
}
