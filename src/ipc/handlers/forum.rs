use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::ipc::error::{ok, HandlerErr};
use crate::ipc::helpers::{get_optional_str, get_page_params, get_required_str, require_confirm};
use crate::ipc::types::{AppState, Request};
use crate::model::ForumThread;
use crate::view::{
    apply_optimistic, matches_category, matches_search, paginate, prune_banner, reconcile, Banner,
    Patch,
};

fn thread_json(t: &ForumThread) -> serde_json::Value {
    json!({
        "id": t.id,
        "title": t.title,
        "content": t.content,
        "category": t.category,
        "authorName": t.author_name,
        "replyCount": t.reply_count,
        "createdAt": t.created_at,
    })
}

fn list(state: &mut AppState) -> Result<serde_json::Value, HandlerErr> {
    let AppState { backend, forum, .. } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    let threads = backend.forum_list()?;
    reconcile(&mut forum.threads, threads);
    prune_banner(&mut forum.banner, Utc::now());
    Ok(json!({
        "threads": forum.threads.iter().map(thread_json).collect::<Vec<_>>(),
        "banner": forum.banner.as_ref().map(|b| b.to_json()),
    }))
}

fn view(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let forum = &mut state.forum;
    prune_banner(&mut forum.banner, Utc::now());
    let search = get_optional_str(params, "search").unwrap_or_default();
    let category = get_optional_str(params, "category");
    let (page, page_size) = get_page_params(params)?;

    let filtered: Vec<&ForumThread> = forum
        .threads
        .iter()
        .filter(|t| matches_search(&search, &[&t.title, &t.author_name]))
        .filter(|t| matches_category(category.as_ref(), &t.category))
        .collect();
    let (items, info) = paginate(&filtered, page, page_size);
    Ok(json!({
        "items": items.iter().map(|t| thread_json(t)).collect::<Vec<_>>(),
        "pageInfo": info.to_json(),
        "banner": forum.banner.as_ref().map(|b| b.to_json()),
    }))
}

/// Optimistic create: a placeholder thread is inserted under a temporary id
/// before the authoritative re-fetch replaces the whole collection.
fn create(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let title = get_required_str(params, "title")?;
    let content = get_required_str(params, "content")?;
    let category = get_required_str(params, "category")?;
    if title.trim().is_empty() {
        return Err(HandlerErr::new("validation", "title must not be empty"));
    }

    let AppState {
        backend,
        session,
        forum,
        ..
    } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    let author = session
        .as_ref()
        .map(|s| s.name.clone())
        .unwrap_or_else(|| "Anonim".to_string());

    let placeholder_id = format!("pending-{}", Uuid::new_v4());
    let placeholder = ForumThread {
        id: placeholder_id.clone(),
        title: title.clone(),
        content: content.clone(),
        category: category.clone(),
        author_name: author,
        reply_count: 0,
        created_at: Utc::now().to_rfc3339(),
    };
    apply_optimistic(
        &mut forum.threads,
        &placeholder_id,
        Patch::Insert(placeholder),
        |t| t.id.clone(),
    );

    let created = backend.forum_create(&title, &content, &category);
    // Authoritative resync either way; the placeholder never survives it.
    if let Ok(threads) = backend.forum_list() {
        reconcile(&mut forum.threads, threads);
    } else {
        forum.threads.retain(|t| t.id != placeholder_id);
    }
    let created = created?;
    forum.banner = Some(Banner::success("thread posted"));
    Ok(json!({
        "created": thread_json(&created),
        "threads": forum.threads.iter().map(thread_json).collect::<Vec<_>>(),
    }))
}

/// Optimistic reply-count bump, then authoritative resync.
fn reply(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let thread_id = get_required_str(params, "threadId")?;
    let content = get_required_str(params, "content")?;
    if content.trim().is_empty() {
        return Err(HandlerErr::new("validation", "reply must not be empty"));
    }

    let AppState { backend, forum, .. } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;

    if let Some(bumped) = forum.threads.iter().find(|t| t.id == thread_id).cloned() {
        let mut bumped = bumped;
        bumped.reply_count += 1;
        apply_optimistic(&mut forum.threads, &thread_id, Patch::Update(bumped), |t| {
            t.id.clone()
        });
    }

    let result = backend.forum_reply(&thread_id, &content);
    if let Ok(threads) = backend.forum_list() {
        reconcile(&mut forum.threads, threads);
    }
    result?;
    Ok(json!({
        "threadId": thread_id,
        "replied": true,
        "threads": forum.threads.iter().map(thread_json).collect::<Vec<_>>(),
    }))
}

fn delete(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let thread_id = get_required_str(params, "threadId")?;
    require_confirm(params)?;

    let AppState { backend, forum, .. } = state;
    let backend = backend.as_deref().ok_or_else(HandlerErr::no_backend)?;
    backend.forum_delete(&thread_id)?;
    apply_optimistic(
        &mut forum.threads,
        &thread_id,
        Patch::<ForumThread>::Remove,
        |t| t.id.clone(),
    );
    if let Ok(threads) = backend.forum_list() {
        reconcile(&mut forum.threads, threads);
    }
    forum.banner = Some(Banner::success("thread deleted"));
    Ok(json!({
        "deleted": true,
        "threads": forum.threads.iter().map(thread_json).collect::<Vec<_>>(),
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let result = match req.method.as_str() {
        "forum.list" => list(state),
        "forum.view" => view(state, &req.params),
        "forum.create" => create(state, &req.params),
        "forum.reply" => reply(state, &req.params),
        "forum.delete" => delete(state, &req.params),
        _ => return None,
    };
    Some(match result {
        Ok(value) => ok(&req.id, value),
        Err(e) => e.response(&req.id),
    })
}
