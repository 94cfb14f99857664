use std::path::PathBuf;

use serde_json::json;

use crate::export::{write_html_snapshot, write_xlsx, Cell};
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_required_i64, get_required_str};
use crate::ipc::types::{AppState, Request};
use crate::model::{PenilaianKind, PenilaianRow};

fn parse_kind(params: &serde_json::Value) -> Result<PenilaianKind, HandlerErr> {
    let raw = get_required_str(params, "kind")?;
    PenilaianKind::parse(&raw)
        .ok_or_else(|| HandlerErr::bad_params("kind must be pbl or jurnal"))
}

fn rows_json(rows: &[PenilaianRow]) -> serde_json::Value {
    json!(rows
        .iter()
        .map(|r| json!({
            "studentId": r.student_id,
            "studentName": r.student_name,
            "scores": r.scores.iter().map(|s| json!({
                "criterion": s.criterion,
                "value": s.value,
            })).collect::<Vec<_>>(),
            "note": r.note,
        }))
        .collect::<Vec<_>>())
}

fn open(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let kind = parse_kind(params)?;
    let jadwal_id = get_required_i64(params, "jadwalId")?;
    let backend = state.backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    let rows = backend.penilaian_open(kind, jadwal_id)?;
    Ok(json!({
        "kind": kind.as_str(),
        "jadwalId": jadwal_id,
        "rows": rows_json(&rows),
    }))
}

fn save(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let kind = parse_kind(params)?;
    let jadwal_id = get_required_i64(params, "jadwalId")?;
    let raw = params
        .get("rows")
        .cloned()
        .ok_or_else(|| HandlerErr::bad_params("missing rows"))?;
    let rows: Vec<PenilaianRow> = serde_json::from_value(raw)
        .map_err(|e| HandlerErr::bad_params(format!("invalid rows: {}", e)))?;
    let backend = state.backend.as_deref().ok_or_else(HandlerErr::no_backend)?;

    // Save first, then the authoritative re-fetch; never reordered.
    backend.penilaian_save(kind, jadwal_id, &rows)?;
    let refreshed = backend.penilaian_open(kind, jadwal_id)?;
    Ok(json!({
        "kind": kind.as_str(),
        "jadwalId": jadwal_id,
        "saved": true,
        "rows": rows_json(&refreshed),
    }))
}

/// Flattens assessment rows into a header + table. Criterion columns follow
/// the order of the first row that carries scores.
fn tabulate(rows: &[PenilaianRow]) -> (Vec<String>, Vec<Vec<Cell>>) {
    let criteria: Vec<String> = rows
        .iter()
        .find(|r| !r.scores.is_empty())
        .map(|r| r.scores.iter().map(|s| s.criterion.clone()).collect())
        .unwrap_or_default();

    let mut headers = vec!["NIM".to_string(), "Nama".to_string()];
    headers.extend(criteria.iter().cloned());
    headers.push("Catatan".to_string());

    let table = rows
        .iter()
        .map(|r| {
            let mut cells = vec![
                Cell::Text(r.student_id.clone()),
                Cell::Text(r.student_name.clone()),
            ];
            for criterion in &criteria {
                match r.scores.iter().find(|s| &s.criterion == criterion) {
                    Some(score) => cells.push(Cell::Number(score.value)),
                    None => cells.push(Cell::Text(String::new())),
                }
            }
            cells.push(Cell::Text(r.note.clone().unwrap_or_default()));
            cells
        })
        .collect();
    (headers, table)
}

fn export(
    state: &mut AppState,
    params: &serde_json::Value,
    format: ExportFormat,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = parse_kind(params)?;
    let jadwal_id = get_required_i64(params, "jadwalId")?;
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let backend = state.backend.as_deref().ok_or_else(HandlerErr::no_backend)?;

    let rows = backend.penilaian_open(kind, jadwal_id)?;
    let (headers, table) = tabulate(&rows);
    let title = format!("Penilaian {} #{}", kind.as_str(), jadwal_id);

    let summary = match format {
        ExportFormat::Xlsx => write_xlsx(&out_path, "Penilaian", &headers, &table),
        ExportFormat::Html => write_html_snapshot(&out_path, &title, &headers, &table),
    }
    .map_err(|e| HandlerErr::new("export_failed", format!("{:#}", e)))?;

    Ok(json!({
        "outPath": out_path.to_string_lossy(),
        "rowCount": rows.len(),
        "bytesWritten": summary.bytes_written,
        "sha256": summary.sha256_hex,
    }))
}

enum ExportFormat {
    Xlsx,
    Html,
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "penilaian.open" => open(state, &req.params),
        "penilaian.save" => save(state, &req.params),
        "penilaian.exportXlsx" => export(state, &req.params, ExportFormat::Xlsx),
        "penilaian.exportHtml" => export(state, &req.params, ExportFormat::Html),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
