use chrono::Utc;
use serde_json::json;

use crate::activation::{commit_enabled, PendingActivation, Proceeded, TargetKind};
use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{
    get_optional_str, get_page_params, get_required_i64, get_required_str, require_confirm,
};
use crate::ipc::types::{AppState, PeriodePage, Request};
use crate::model::{valid_year_label, TahunAjaran};
use crate::view::{matches_search, paginate, prune_banner, reconcile, Banner};

fn year_json(year: &TahunAjaran) -> serde_json::Value {
    json!({
        "id": year.id,
        "label": year.label,
        "isActive": year.is_active,
        "semesters": year.semesters.iter().map(|s| json!({
            "id": s.id,
            "kind": s.kind,
            "displayName": format!("{} {}", s.kind.display_name(), year.label),
            "isActive": s.is_active,
        })).collect::<Vec<_>>(),
    })
}

fn page_json(page: &PeriodePage) -> serde_json::Value {
    json!({
        "years": page.years.iter().map(year_json).collect::<Vec<_>>(),
        "flow": page.flow.to_json(),
        "loadingYearId": page.loading_year,
        "loadingSemesterId": page.loading_semester,
        "banner": page.banner.as_ref().map(|b| b.to_json()),
    })
}

/// Looks up the activation target in the cached list, returning its display
/// name and current active flag.
fn find_target(
    years: &[TahunAjaran],
    kind: TargetKind,
    target_id: i64,
) -> Option<(String, bool)> {
    match kind {
        TargetKind::Year => years
            .iter()
            .find(|y| y.id == target_id)
            .map(|y| (y.label.clone(), y.is_active)),
        TargetKind::Semester => years.iter().find_map(|y| {
            y.semesters.iter().find(|s| s.id == target_id).map(|s| {
                (
                    format!("{} {}", s.kind.display_name(), y.label),
                    s.is_active,
                )
            })
        }),
    }
}

fn list(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let AppState {
        backend, periode, ..
    } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    let years = backend.list_tahun_ajaran()?;
    reconcile(&mut periode.years, years);
    prune_banner(&mut periode.banner, Utc::now());
    Ok(page_json(periode))
}

fn view(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let periode = &mut state.periode;
    prune_banner(&mut periode.banner, Utc::now());
    let search = get_optional_str(params, "search").unwrap_or_default();
    let (page, page_size) = get_page_params(params)?;

    let filtered: Vec<&TahunAjaran> = periode
        .years
        .iter()
        .filter(|y| matches_search(&search, &[&y.label]))
        .collect();
    let (items, info) = paginate(&filtered, page, page_size);
    Ok(json!({
        "items": items.iter().map(|y| year_json(y)).collect::<Vec<_>>(),
        "pageInfo": info.to_json(),
        "flow": periode.flow.to_json(),
        "loadingYearId": periode.loading_year,
        "loadingSemesterId": periode.loading_semester,
        "banner": periode.banner.as_ref().map(|b| b.to_json()),
    }))
}

fn create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let label = get_required_str(params, "label")?;
    if !valid_year_label(&label) {
        return Err(HandlerErr::new(
            "validation",
            "label must be consecutive years in YYYY/YYYY form, e.g. 2024/2025",
        ));
    }
    let AppState {
        backend, periode, ..
    } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    let created = backend.create_tahun_ajaran(&label)?;
    // Authoritative resync after the mutation.
    if let Ok(years) = backend.list_tahun_ajaran() {
        reconcile(&mut periode.years, years);
    }
    periode.banner = Some(Banner::success(format!("{} created", created.label)));
    Ok(json!({
        "created": year_json(&created),
        "page": page_json(periode),
    }))
}

fn delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let id = get_required_i64(params, "id")?;
    require_confirm(params)?;
    let AppState {
        backend, periode, ..
    } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    // The backend refuses to delete the active year; its error flows back as-is.
    backend.delete_tahun_ajaran(id)?;
    if let Ok(years) = backend.list_tahun_ajaran() {
        reconcile(&mut periode.years, years);
    }
    periode.banner = Some(Banner::success("academic year deleted"));
    Ok(page_json(periode))
}

fn activate_begin(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let kind = get_required_str(params, "targetKind")?;
    let kind = TargetKind::parse(&kind)
        .ok_or_else(|| HandlerErr::bad_params("targetKind must be year or semester"))?;
    let target_id = get_required_i64(params, "targetId")?;

    let periode = &mut state.periode;
    let (display_name, is_active) = find_target(&periode.years, kind, target_id)
        .ok_or_else(|| HandlerErr::new("not_found", "activation target not in the current list"))?;
    periode.flow.begin(kind, target_id, &display_name, is_active)?;
    Ok(periode.flow.to_json())
}

fn activate_set_cascade(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let cascade = params
        .get("cascade")
        .and_then(|v| v.as_bool())
        .ok_or_else(|| HandlerErr::bad_params("missing cascade"))?;
    let periode = &mut state.periode;
    periode.flow.set_cascade(cascade)?;
    Ok(periode.flow.to_json())
}

/// Leaves the choice dialog. The cascade flag is snapshotted here; when the
/// operator declined the cascade the commit runs immediately, otherwise the
/// typed-phrase dialog opens.
fn activate_choose(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    if let Some(cascade) = params.get("cascade").and_then(|v| v.as_bool()) {
        state.periode.flow.set_cascade(cascade)?;
    }
    match state.periode.flow.proceed()? {
        Proceeded::NeedsPhrase => Ok(state.periode.flow.to_json()),
        Proceeded::ReadyToCommit(pending) => commit_and_resync(state, pending),
    }
}

fn activate_confirm(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let typed = get_required_str(params, "text")?;
    let pending = state.periode.flow.confirm_phrase(&typed)?;
    commit_and_resync(state, pending)
}

fn activate_cancel(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    state.periode.flow.cancel()?;
    Ok(state.periode.flow.to_json())
}

fn activate_state(
    state: &mut AppState,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let periode = &state.periode;
    let mut result = json!({
        "flow": periode.flow.to_json(),
        "loadingYearId": periode.loading_year,
        "loadingSemesterId": periode.loading_semester,
    });
    // The UI polls this with the current text-field value to enable/disable
    // the commit button.
    if let Some(typed) = get_optional_str(params, "text") {
        result["commitEnabled"] = json!(commit_enabled(&typed));
    }
    Ok(result)
}

/// One commit attempt: busy-mark the row, call the activation endpoint, fire
/// the best-effort broadcast, then re-fetch the list exactly once whatever
/// the outcome. The flow is back at Idle when this returns.
fn commit_and_resync(
    state: &mut AppState,
    pending: PendingActivation,
) -> Result<serde_json::Value, HandlerErr> {
    let AppState {
        backend,
        session,
        periode,
        ..
    } = state;
    let Some(backend) = backend.as_deref() else {
        periode.flow.finish();
        return Err(HandlerErr::no_backend());
    };

    match pending.kind {
        TargetKind::Year => periode.loading_year = Some(pending.target_id),
        TargetKind::Semester => periode.loading_semester = Some(pending.target_id),
    }

    let outcome = crate::activation::run_commit(backend, session.as_ref(), &pending);

    match pending.kind {
        TargetKind::Year => periode.loading_year = None,
        TargetKind::Semester => periode.loading_semester = None,
    }
    periode.flow.finish();
    periode.banner = Some(if outcome.success {
        Banner::success(outcome.message.clone())
    } else {
        Banner::error(outcome.message.clone())
    });

    // Idempotent resync: the client distrusts its own beliefs after any
    // attempt. A failed resync keeps the stale cache and says so.
    let resynced = match backend.list_tahun_ajaran() {
        Ok(years) => {
            reconcile(&mut periode.years, years);
            true
        }
        Err(e) => {
            eprintln!("tahun-ajaran resync failed: {}", e);
            false
        }
    };

    Ok(json!({
        "committed": outcome.success,
        "message": outcome.message,
        "broadcastAttempted": outcome.broadcast_attempted,
        "resynced": resynced,
        "page": page_json(periode),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "periode.list" => list(state),
        "periode.view" => view(state, &req.params),
        "periode.create" => create(state, &req.params),
        "periode.delete" => delete(state, &req.params),
        "periode.activate.begin" => activate_begin(state, &req.params),
        "periode.activate.setCascade" => activate_set_cascade(state, &req.params),
        "periode.activate.choose" => activate_choose(state, &req.params),
        "periode.activate.confirm" => activate_confirm(state, &req.params),
        "periode.activate.cancel" => activate_cancel(state),
        "periode.activate.state" => activate_state(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
