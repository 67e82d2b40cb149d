use serde::Serialize;
use serde_json::{json, Value};

/// One protocol line. Exactly one of `result` / `error` is present.
#[derive(Serialize)]
struct Envelope<'a> {
    id: &'a str,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

fn encode(envelope: Envelope<'_>) -> Value {
    let (id, ok) = (envelope.id, envelope.ok);
    serde_json::to_value(envelope).unwrap_or_else(|_| json!({ "id": id, "ok": ok }))
}

pub fn ok(id: &str, result: Value) -> Value {
    encode(Envelope {
        id,
        ok: true,
        result: Some(result),
        error: None,
    })
}

pub fn err(id: &str, code: &str, message: impl Into<String>, details: Option<Value>) -> Value {
    encode(Envelope {
        id,
        ok: false,
        result: None,
        error: Some(ErrorBody {
            code,
            message: message.into(),
            details,
        }),
    })
}
