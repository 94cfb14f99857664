use chrono::Utc;
use serde_json::json;

use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_page_params, get_required_str, require_confirm};
use crate::ipc::types::{AppState, Request};
use crate::model::MahasiswaVeteran;
use crate::view::{
    apply_optimistic, matches_category, matches_search, paginate, prune_banner, reconcile, Banner,
    Patch,
};

fn student_json(s: &MahasiswaVeteran) -> serde_json::Value {
    json!({
        "studentId": s.student_id,
        "name": s.name,
        "angkatan": s.angkatan,
        "isVeteran": s.is_veteran,
    })
}

fn list(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let AppState {
        backend, veteran, ..
    } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    let students = backend.veteran_list()?;
    reconcile(&mut veteran.students, students);
    prune_banner(&mut veteran.banner, Utc::now());
    Ok(json!({
        "students": veteran.students.iter().map(student_json).collect::<Vec<_>>(),
        "busyStudentId": veteran.busy_student,
        "banner": veteran.banner.as_ref().map(|b| b.to_json()),
    }))
}

fn view(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let veteran = &mut state.veteran;
    prune_banner(&mut veteran.banner, Utc::now());
    let search = get_optional_str(params, "search").unwrap_or_default();
    let angkatan = params
        .get("angkatan")
        .and_then(|v| v.as_i64())
        .map(|v| v as i32);
    let (page, page_size) = get_page_params(params)?;

    let filtered: Vec<&MahasiswaVeteran> = veteran
        .students
        .iter()
        .filter(|s| matches_search(&search, &[&s.name, &s.student_id]))
        .filter(|s| matches_category(angkatan.as_ref(), &s.angkatan))
        .collect();
    let (items, info) = paginate(&filtered, page, page_size);
    Ok(json!({
        "items": items.iter().map(|s| student_json(s)).collect::<Vec<_>>(),
        "pageInfo": info.to_json(),
        "busyStudentId": veteran.busy_student,
        "banner": veteran.banner.as_ref().map(|b| b.to_json()),
    }))
}

/// Single-row toggle: the row is busy-marked for the duration of the call,
/// patched optimistically, then resynced from the authoritative list.
fn toggle(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let student_id = get_required_str(params, "studentId")?;
    let is_veteran = params
        .get("isVeteran")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params("missing isVeteran"))?;

    let AppState {
        backend, veteran, ..
    } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    if veteran.busy_student.is_some() {
        return Err(HandlerErr::new(
            "row_busy",
            "another veteran toggle is still in flight",
        ));
    }

    veteran.busy_student = Some(student_id.clone());
    if let Some(found) = veteran
        .students
        .iter()
        .find(|s| s.student_id == student_id)
        .cloned()
    {
        let mut patched = found;
        patched.is_veteran = is_veteran;
        apply_optimistic(
            &mut veteran.students,
            &student_id,
            Patch::Update(patched),
            |s| s.student_id.clone(),
        );
    }

    let result = backend.veteran_set(&student_id, is_veteran);
    if let Ok(students) = backend.veteran_list() {
        reconcile(&mut veteran.students, students);
    }
    veteran.busy_student = None;

    match result {
        Ok(()) => {
            veteran.banner = Some(Banner::success("veteran flag updated"));
            Ok(json!({
                "studentId": student_id,
                "isVeteran": is_veteran,
                "students": veteran.students.iter().map(student_json).collect::<Vec<_>>(),
            }))
        }
        Err(e) => {
            veteran.banner = Some(Banner::error(format!("failed to update flag: {}", e.message)));
            Err(HandlerErr::from(e))
        }
    }
}

fn bulk_set(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let is_veteran = params
        .get("isVeteran")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params("missing isVeteran"))?;
    let student_ids: Vec<String> = params
        .get("studentIds")
        .and_then(|v| v.as_array())
        .ok_or_else(|| HandlerErr::bad_params("missing studentIds"))?
        .iter()
        .filter_map(|v| v.as_str().map(String::from))
        .collect();
    if student_ids.is_empty() {
        return Err(HandlerErr::new("validation", "studentIds must not be empty"));
    }
    require_confirm(params)?;

    let AppState {
        backend, veteran, ..
    } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    let updated = backend.veteran_bulk_set(&student_ids, is_veteran)?;
    if let Ok(students) = backend.veteran_list() {
        reconcile(&mut veteran.students, students);
    }
    veteran.banner = Some(Banner::success(format!("{} students updated", updated)));
    Ok(json!({
        "updated": updated,
        "students": veteran.students.iter().map(student_json).collect::<Vec<_>>(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "veteran.list" => list(state),
        "veteran.view" => view(state, &req.params),
        "veteran.toggle" => toggle(state, &req.params),
        "veteran.bulkSet" => bulk_set(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
