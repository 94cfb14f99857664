use serde_json::json;

use crate::api::HttpBackend;
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::session::Session;

fn backend_connect(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let base_url = get_required_str(params, "baseUrl")?;
    if base_url.trim().is_empty() {
        return Err(HandlerErr::bad_params("baseUrl must not be empty"));
    }
    let token = get_optional_str(params, "token");
    state.backend = Some(Box::new(HttpBackend::new(base_url.clone(), token)));
    Ok(json!({ "connected": true, "baseUrl": base_url }))
}

fn session_sign_in(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let session = Session {
        user_id: get_required_str(params, "userId")?,
        name: get_required_str(params, "name")?,
        role: get_required_str(params, "role")?,
    };
    let result = session.to_json();
    state.session = Some(session);
    Ok(result)
}

fn session_current(state: &AppState) -> serde_json::Value {
    match &state.session {
        Some(session) => json!({ "signedIn": true, "session": session.to_json() }),
        None => json!({ "signedIn": false }),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(ok(
            &req.id,
            json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }),
        )),
        "backend.connect" => Some(match backend_connect(state, &req.params) {
            Ok(result) => ok(&req.id, result),
            Err(e) => e.response(&req.id),
        }),
        "session.signIn" => Some(match session_sign_in(state, &req.params) {
            Ok(result) => ok(&req.id, result),
            Err(e) => e.response(&req.id),
        }),
        "session.signOut" => {
            state.session = None;
            Some(ok(&req.id, json!({ "signedIn": false })))
        }
        "session.current" => Some(ok(&req.id, session_current(state))),
        _ => None,
    }
}
