use serde_json::{json, Value};

use crate::drafts::{DraftError, DraftField};
use crate::ipc::helpers::{
    get_opt_file, get_required_str, get_required_u32, invalid, respond, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::models::ResourceKind;
use crate::submit::{
    submit_drafts, Selection, SubmitError, BATCH_FAILED_MESSAGE, BATCH_OK_MESSAGE,
};
use crate::validate::ValidationError;

fn draft_err(state: &mut AppState, e: DraftError) -> HandlerErr {
    match e {
        DraftError::LastDraft => HandlerErr {
            code: "last_draft",
            message: e.to_string(),
            details: None,
        },
        DraftError::UnknownDraft(_) => HandlerErr::not_found(e.to_string()),
        DraftError::WrongKind { .. } => HandlerErr::bad_params(e.to_string()),
        DraftError::Invalid(v) => invalid(&mut state.notices, v),
    }
}

fn form_view(state: &AppState) -> Value {
    json!({
        "kind": state.form.kind(),
        "drafts": state.form.active().drafts(),
        "form": state.form,
    })
}

fn set_kind(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let raw = get_required_str(params, "kind")?;
    let kind = ResourceKind::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown resource kind: {raw}")))?;
    state.form.set_kind(kind);
    Ok(form_view(state))
}

fn remove(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let seq = get_required_u32(params, "seq")?;
    let batch = state.form.active_mut();
    match batch.remove(seq, &mut state.previews) {
        Ok(()) => Ok(form_view(state)),
        Err(e) => Err(draft_err(state, e)),
    }
}

fn update(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let seq = get_required_u32(params, "seq")?;
    let name = get_required_str(params, "field")?;
    let value = get_required_str(params, "value")?;
    let field = DraftField::parse(&name, value)
        .ok_or_else(|| HandlerErr::bad_params(format!("unknown draft field: {name}")))?;
    match state.form.active_mut().update(seq, field) {
        Ok(()) => Ok(json!({ "draft": state.form.active().get(seq) })),
        Err(e) => Err(draft_err(state, e)),
    }
}

fn set_thumbnail(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let seq = get_required_u32(params, "seq")?;
    let file = match get_opt_file(params, "file") {
        Ok(Some(f)) => f,
        Ok(None) => return Err(invalid(&mut state.notices, ValidationError::MissingThumbnail)),
        Err(e) => return Err(invalid(&mut state.notices, e)),
    };
    let batch = state.form.active_mut();
    match batch.set_thumbnail(seq, file, &mut state.previews) {
        Ok(preview) => Ok(json!({ "seq": seq, "preview": preview })),
        Err(e) => Err(draft_err(state, e)),
    }
}

fn set_pdf(state: &mut AppState, params: &Value) -> Result<Value, HandlerErr> {
    let seq = get_required_u32(params, "seq")?;
    let file = match get_opt_file(params, "file") {
        Ok(Some(f)) => f,
        Ok(None) => return Err(invalid(&mut state.notices, ValidationError::MissingPdf)),
        Err(e) => return Err(invalid(&mut state.notices, e)),
    };
    match state.form.active_mut().set_pdf(seq, file) {
        Ok(()) => Ok(json!({ "draft": state.form.active().get(seq) })),
        Err(e) => Err(draft_err(state, e)),
    }
}

/// On full success the form is reset. On any failure the drafts stay, each
/// carrying its own status.
async fn submit(state: &mut AppState) -> Result<Value, HandlerErr> {
    let selection = Selection::from_parts(
        state.cascade.board_id(),
        state.cascade.standard_id(),
        state.cascade.subject_id(),
    );
    let batch = state.form.active_mut();
    match submit_drafts(state.backend.as_ref(), selection, batch).await {
        Ok(outcome) => {
            state.notices.success(BATCH_OK_MESSAGE);
            state.form.discard(&mut state.previews);
            Ok(json!({ "outcome": outcome }))
        }
        Err(SubmitError::Invalid { seq, source }) => {
            let mut e = invalid(&mut state.notices, source);
            e.details = seq.map(|s| json!({ "seq": s }));
            Err(e)
        }
        Err(SubmitError::Partial(outcome)) => {
            state.notices.error(BATCH_FAILED_MESSAGE);
            Err(HandlerErr {
                code: "batch_failed",
                message: BATCH_FAILED_MESSAGE.to_string(),
                details: Some(json!({
                    "outcome": outcome,
                    "drafts": state.form.active().drafts(),
                })),
            })
        }
    }
}

pub async fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let p = &req.params;
    let result = match req.method.as_str() {
        "drafts.get" => Ok(form_view(state)),
        "drafts.setKind" => set_kind(state, p),
        "drafts.append" => {
            let seq = state.form.active_mut().append();
            Ok(json!({ "seq": seq, "drafts": state.form.active().drafts() }))
        }
        "drafts.remove" => remove(state, p),
        "drafts.update" => update(state, p),
        "drafts.setThumbnail" => set_thumbnail(state, p),
        "drafts.setPdf" => set_pdf(state, p),
        "drafts.discard" => {
            state.form.discard(&mut state.previews);
            Ok(form_view(state))
        }
        "drafts.submit" => submit(state).await,
        _ => return None,
    };
    Some(respond(&req.id, result))
}
