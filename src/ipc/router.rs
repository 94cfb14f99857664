use super::handlers;
use super::types::{AppState, Request};
use crate::ipc::error::err;

pub fn handle_request(state: &mut AppState, req: Request) -> serde_json::Value {
    if let Some(resp) = handlers::core::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::periode::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::jadwal::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::absensi::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::penilaian::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::forum::try_handle(state, &req) {
        return resp;
    }
    if let Some(resp) = handlers::veteran::try_handle(state, &req) {
        return resp;
    }

    err(
        &req.id,
        "not_implemented",
        format!("unknown method: {}", req.method),
        None,
    )
}
