use serde_json::json;

use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::get_required_i64;
use crate::ipc::types::{AppState, Request};
use crate::model::AbsensiRow;

fn rows_json(rows: &[AbsensiRow]) -> serde_json::Value {
    json!(rows
        .iter()
        .map(|r| json!({
            "studentId": r.student_id,
            "studentName": r.student_name,
            "present": r.present,
            "note": r.note,
        }))
        .collect::<Vec<_>>())
}

fn parse_rows(params: &serde_json::Value) -> Result<Vec<AbsensiRow>, HandlerErr> {
    let raw = params
        .get("rows")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing rows"))?;
    serde_json::from_value(raw).map_err(|e| HandlerErr::bad_params(format!("invalid rows: {}", e)))
}

fn open(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let jadwal_id = get_required_i64(params, "jadwalId")?;
    let backend = state.backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    let rows = backend.absensi_open(jadwal_id)?;
    Ok(json!({ "jadwalId": jadwal_id, "rows": rows_json(&rows) }))
}

/// Save then re-fetch, strictly in that order; the response carries the
/// authoritative rows, never the ones the UI submitted.
fn save(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let jadwal_id = get_required_i64(params, "jadwalId")?;
    let rows = parse_rows(params)?;
    let backend = state.backend.as_deref().ok_or_else(HandlerErr::no_backend)?;

    backend.absensi_save(jadwal_id, &rows)?;
    let refreshed = backend.absensi_open(jadwal_id)?;
    Ok(json!({
        "jadwalId": jadwal_id,
        "saved": true,
        "rows": rows_json(&refreshed),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "absensi.open" => open(state, &req.params),
        "absensi.save" => save(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
