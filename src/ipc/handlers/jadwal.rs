use serde_json::json;

use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_page_params};
use crate::ipc::types::{AppState, Request};
use crate::model::{Jadwal, JadwalKind};
use crate::view::{matches_category, matches_search, paginate, FetchWarning};

fn jadwal_json(row: &Jadwal) -> serde_json::Value {
    json!({
        "id": row.id,
        "kind": row.kind.map(|k| k.as_str()),
        "course": row.course,
        "lecturer": row.lecturer,
        "room": row.room,
        "semesterId": row.semester_id,
        "date": row.date,
        "timeSlot": row.time_slot,
    })
}

/// Fan-out across all schedule sources. Each source that fails degrades to
/// an empty collection and a warning; the batch itself never fails.
fn open(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let AppState {
        backend, jadwal, ..
    } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;

    let mut rows: Vec<Jadwal> = Vec::new();
    let mut warnings: Vec<FetchWarning> = Vec::new();
    let mut per_kind = Vec::new();
    for kind in JadwalKind::ALL {
        match backend.list_jadwal(kind) {
            Ok(mut fetched) => {
                per_kind.push(json!({ "kind": kind.as_str(), "count": fetched.len() }));
                rows.append(&mut fetched);
            }
            Err(e) => {
                per_kind.push(json!({ "kind": kind.as_str(), "count": 0 }));
                warnings.push(FetchWarning {
                    source: kind.as_str().to_string(),
                    message: e.message,
                });
            }
        }
    }

    jadwal.rows = rows;
    jadwal.warnings = warnings;
    jadwal.loaded = true;

    Ok(json!({
        "totalRows": jadwal.rows.len(),
        "sources": per_kind,
        "warnings": jadwal.warnings.iter().map(|w| w.to_json()).collect::<Vec<_>>(),
    }))
}

fn view(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let jadwal = &state.jadwal;
    if !jadwal.loaded {
        return Err(HandlerErr::new("not_loaded", "call jadwal.open first"));
    }

    let search = get_optional_str(params, "search").unwrap_or_default();
    let kind_filter = match get_optional_str(params, "kind") {
        Some(raw) => Some(
            JadwalKind::parse(&raw)
                .ok_or_else(|| HandlerErr::bad_params(format!("unknown kind: {}", raw)))?,
        ),
        None => None,
    };
    let semester_filter = params.get("semesterId").and_then(|v| v.as_i64());
    let (page, page_size) = get_page_params(params)?;

    let filtered: Vec<&Jadwal> = jadwal
        .rows
        .iter()
        .filter(|r| matches_search(&search, &[&r.course, &r.lecturer, &r.room]))
        .filter(|r| match (kind_filter, r.kind) {
            (Some(wanted), Some(actual)) => wanted == actual,
            (Some(_), None) => false,
            (None, _) => true,
        })
        .filter(|r| matches_category(semester_filter.as_ref(), &r.semester_id))
        .collect();

    let (items, info) = paginate(&filtered, page, page_size);
    Ok(json!({
        "items": items.iter().map(|r| jadwal_json(r)).collect::<Vec<_>>(),
        "pageInfo": info.to_json(),
        "warnings": jadwal.warnings.iter().map(|w| w.to_json()).collect::<Vec<_>>(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "jadwal.open" => open(state),
        "jadwal.view" => view(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
