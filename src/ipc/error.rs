use serde_json::json;

use crate::activation::FlowError;
use crate::api::ApiError;

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(details) = details {
        error["details"] = details;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error
    })
}

/// Handler-level failure carried up to the IPC envelope. Every error a page
/// produces ends up here; nothing propagates past the request loop.
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_params(message: impl Into<String>) -> Self {
        HandlerErr::new("bad_params", message)
    }

    pub fn no_backend() -> Self {
        HandlerErr::new("no_backend", "connect to a backend first")
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

impl From<ApiError> for HandlerErr {
    fn from(e: ApiError) -> Self {
        HandlerErr {
            code: e.code.as_str(),
            message: e.message,
            details: e.status.map(|s| json!({ "httpStatus": s })),
        }
    }
}

impl From<FlowError> for HandlerErr {
    fn from(e: FlowError) -> Self {
        HandlerErr {
            code: e.code(),
            message: e.message(),
            details: None,
        }
    }
}
