use std::path::PathBuf;

use serde_json::{json, Value};
use tracing::{error, warn};

use crate::api::ApiError;
use crate::ipc::error::err;
use crate::notify::Notifier;
use crate::validate::{LocalFile, ValidationError};

pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<Value>,
}

impl HandlerErr {
    pub fn response(self, id: &str) -> Value {
        err(id, self.code, self.message, self.details)
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        Self {
            code: "bad_params",
            message: message.into(),
            details: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: "not_found",
            message: message.into(),
            details: None,
        }
    }
}

pub fn respond(id: &str, result: Result<Value, HandlerErr>) -> Value {
    match result {
        Ok(v) => crate::ipc::error::ok(id, v),
        Err(e) => e.response(id),
    }
}

/// Validation failures never reach the backend. The user sees the message as
/// an error notice too.
pub fn invalid(notices: &mut Notifier, e: ValidationError) -> HandlerErr {
    warn!(error = %e, "validation failed");
    notices.error(e.to_string());
    HandlerErr {
        code: "validation_failed",
        message: e.to_string(),
        details: None,
    }
}

/// Backend failures are logged with their cause; the user only gets `notice`.
pub fn backend_failed(notices: &mut Notifier, notice: &str, e: ApiError) -> HandlerErr {
    error!(error = %e, "{notice}");
    notices.error(notice);
    let code = match &e {
        ApiError::Status { status: 404, .. } => "not_found",
        _ => "backend_failed",
    };
    HandlerErr {
        code,
        message: notice.to_string(),
        details: Some(json!({ "reason": e.to_string() })),
    }
}

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

/// Missing, `null` and blank strings all read as `None`.
pub fn get_opt_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn get_str_or_empty(params: &Value, key: &str) -> String {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

pub fn get_required_u32(params: &Value, key: &str) -> Result<u32, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_u64())
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {key}")))
}

/// Prices arrive from text inputs, so numeric strings are accepted too.
/// Anything unparsable is passed on as NaN and rejected by validation.
pub fn get_opt_f64(params: &Value, key: &str) -> Option<f64> {
    match params.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().parse::<f64>().unwrap_or(f64::NAN)),
        _ => None,
    }
}

/// A file param is either a path string or `{ "path", "mime"? }`.
pub fn get_opt_file(params: &Value, key: &str) -> Result<Option<LocalFile>, ValidationError> {
    let (path, mime) = match params.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(p)) => (p.as_str(), None),
        Some(obj @ Value::Object(_)) => match obj.get("path").and_then(|v| v.as_str()) {
            Some(p) => (p, obj.get("mime").and_then(|v| v.as_str())),
            None => return Ok(None),
        },
        Some(_) => return Ok(None),
    };
    if path.trim().is_empty() {
        return Ok(None);
    }
    LocalFile::inspect(&PathBuf::from(path), mime).map(Some)
}
