use chrono::{DateTime, Duration, Utc};
use serde_json::json;

/// Page sizes the UI may request. Anything else is rejected as bad params.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [5, 10, 25, 50];
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Transient banners live this long before the next view/list request
/// prunes them (the UI shell polls; there is no in-daemon timer).
const BANNER_TTL_SECONDS: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl PageInfo {
    pub fn to_json(self) -> serde_json::Value {
        json!({
            "page": self.page,
            "pageSize": self.page_size,
            "totalItems": self.total_items,
            "totalPages": self.total_pages,
        })
    }
}

pub fn total_pages(total_items: usize, page_size: usize) -> usize {
    if total_items == 0 {
        0
    } else {
        total_items.div_ceil(page_size)
    }
}

/// Slices one page out of an already-filtered collection. The requested page
/// is clamped into `1..=total_pages` (page 1 when the collection is empty).
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> (Vec<T>, PageInfo) {
    let total = total_pages(items.len(), page_size);
    let page = page.clamp(1, total.max(1));
    let start = (page - 1) * page_size;
    let slice = items
        .iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect::<Vec<_>>();
    (
        slice,
        PageInfo {
            page,
            page_size,
            total_items: items.len(),
            total_pages: total,
        },
    )
}

/// Case-insensitive substring match across the searchable text fields of a
/// row. An empty query matches everything.
pub fn matches_search(query: &str, fields: &[&str]) -> bool {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return true;
    }
    fields.iter().any(|f| f.to_lowercase().contains(&q))
}

/// Equality filter for categorical fields; `None` means "all".
pub fn matches_category<T: PartialEq>(selected: Option<&T>, value: &T) -> bool {
    match selected {
        Some(s) => s == value,
        None => true,
    }
}

/// Local mutation applied ahead of the authoritative re-fetch.
#[derive(Debug, Clone)]
pub enum Patch<T> {
    Insert(T),
    Update(T),
    Remove,
}

/// Applies an optimistic patch to the cached collection. `key` identifies
/// the affected record; `Insert` appends regardless of key.
pub fn apply_optimistic<T, K, F>(items: &mut Vec<T>, key: &K, patch: Patch<T>, key_of: F)
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    match patch {
        Patch::Insert(item) => items.push(item),
        Patch::Update(item) => {
            if let Some(slot) = items.iter_mut().find(|it| key_of(it) == *key) {
                *slot = item;
            }
        }
        Patch::Remove => items.retain(|it| key_of(it) != *key),
    }
}

/// Authoritative resync: the server snapshot wins wholesale. Kept as its own
/// function so the optimistic half and the reconcile half stay independently
/// testable.
pub fn reconcile<T>(items: &mut Vec<T>, server_snapshot: Vec<T>) {
    *items = server_snapshot;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
}

impl BannerKind {
    fn as_str(self) -> &'static str {
        match self {
            BannerKind::Success => "success",
            BannerKind::Error => "error",
        }
    }
}

/// Self-dismissing success/error banner.
#[derive(Debug, Clone)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Banner::with_expiry(BannerKind::Success, message, Utc::now())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Banner::with_expiry(BannerKind::Error, message, Utc::now())
    }

    fn with_expiry(kind: BannerKind, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Banner {
            kind,
            message: message.into(),
            expires_at: now + Duration::seconds(BANNER_TTL_SECONDS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "kind": self.kind.as_str(),
            "message": self.message,
        })
    }
}

/// Drops the banner once its deadline has passed. Setting a new banner
/// simply overwrites the slot, which supersedes the old deadline.
pub fn prune_banner(slot: &mut Option<Banner>, now: DateTime<Utc>) {
    if slot.as_ref().is_some_and(|b| b.is_expired(now)) {
        *slot = None;
    }
}

/// One degraded source in a fan-out fetch. The batch never aborts; failed
/// sources contribute an empty collection plus one of these.
#[derive(Debug, Clone)]
pub struct FetchWarning {
    pub source: String,
    pub message: String,
}

impl FetchWarning {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "source": self.source,
            "message": self.message,
        })
    }
}
