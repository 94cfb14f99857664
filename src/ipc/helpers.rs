use crate::ipc::error::HandlerErr;
use crate::view::{DEFAULT_PAGE_SIZE, PAGE_SIZE_OPTIONS};

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_required_i64(params: &serde_json::Value, key: &str) -> Result<i64, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &serde_json::Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

pub fn get_bool(params: &serde_json::Value, key: &str, default: bool) -> bool {
    params.get(key).and_then(|v| v.as_bool()).unwrap_or(default)
}

/// Mutating actions (delete, bulk toggles) require `confirm: true` so the UI
/// cannot fire them without an explicit confirmation step.
pub fn require_confirm(params: &serde_json::Value) -> Result<(), HandlerErr> {
    if get_bool(params, "confirm", false) {
        Ok(())
    } else {
        Err(HandlerErr::new(
            "confirm_required",
            "set confirm=true after the operator confirms the action",
        ))
    }
}

/// Reads `page` / `pageSize`, defaulting to page 1 and the standard size.
/// The size must come from the enumerated option set.
pub fn get_page_params(params: &serde_json::Value) -> Result<(usize, usize), HandlerErr> {
    let page = params
        .get("page")
        .and_then(|v| v.as_u64())
        .unwrap_or(1)
        .max(1) as usize;
    let page_size = params
        .get("pageSize")
        .and_then(|v| v.as_u64())
        .map(|v| v as usize)
        .unwrap_or(DEFAULT_PAGE_SIZE);
    if !PAGE_SIZE_OPTIONS.contains(&page_size) {
        return Err(HandlerErr::bad_params(format!(
            "pageSize must be one of {:?}",
            PAGE_SIZE_OPTIONS
        )));
    }
    Ok((page, page_size))
}
