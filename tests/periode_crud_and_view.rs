mod test_support;

use serde_json::json;
use test_support::{
    open_periode, request_err, request_ok, seeded_years, state_with, year, FakeBackend,
};

#[test]
fn list_reconciles_the_cache_from_the_server() {
    let fake = FakeBackend::with_years(seeded_years());
    let mut state = state_with(&fake);

    let page = request_ok(&mut state, "1", "periode.list", json!({}));
    let years = page["years"].as_array().expect("years");
    assert_eq!(years.len(), 3);
    assert_eq!(years[0]["label"], "2023/2024");
    assert_eq!(years[0]["isActive"], true);
    // Semesters come with ready-made display names.
    assert_eq!(years[0]["semesters"][0]["displayName"], "Ganjil 2023/2024");
    assert_eq!(page["flow"]["state"], "idle");

    // A second list re-fetches and replaces the cache wholesale.
    fake.0.borrow_mut().years = vec![year(9, "2030/2031", true)];
    let page = request_ok(&mut state, "2", "periode.list", json!({}));
    assert_eq!(page["years"].as_array().expect("years").len(), 1);
    assert_eq!(page["years"][0]["label"], "2030/2031");
}

#[test]
fn view_filters_by_search_and_paginates() {
    let years = (1..=12)
        .map(|i| year(i, &format!("{}/{}", 2013 + i, 2014 + i), i == 1))
        .collect();
    let fake = FakeBackend::with_years(years);
    let mut state = state_with(&fake);
    open_periode(&mut state);

    // Default page size is 10; 12 rows make 2 pages.
    let view = request_ok(&mut state, "1", "periode.view", json!({}));
    assert_eq!(view["items"].as_array().expect("items").len(), 10);
    assert_eq!(view["pageInfo"]["totalItems"], 12);
    assert_eq!(view["pageInfo"]["totalPages"], 2);

    let view = request_ok(&mut state, "2", "periode.view", json!({ "page": 2 }));
    assert_eq!(view["items"].as_array().expect("items").len(), 2);

    // "2020" matches both 2019/2020 and 2020/2021.
    let view = request_ok(&mut state, "3", "periode.view", json!({ "search": "2020" }));
    let labels: Vec<&str> = view["items"]
        .as_array()
        .expect("items")
        .iter()
        .map(|y| y["label"].as_str().unwrap())
        .collect();
    assert_eq!(labels, vec!["2019/2020", "2020/2021"]);

    // Only the enumerated page sizes are accepted.
    let (code, _) = request_err(&mut state, "4", "periode.view", json!({ "pageSize": 7 }));
    assert_eq!(code, "bad_params");
    let view = request_ok(&mut state, "5", "periode.view", json!({ "pageSize": 25 }));
    assert_eq!(view["items"].as_array().expect("items").len(), 12);
}

#[test]
fn create_validates_the_label_before_any_call() {
    let fake = FakeBackend::with_years(seeded_years());
    let mut state = state_with(&fake);
    open_periode(&mut state);
    let baseline = fake.calls();

    for bad in ["2024/2026", "2024-2025", "24/25", "abcd/efgh", ""] {
        let (code, _) = request_err(
            &mut state,
            "1",
            "periode.create",
            json!({ "label": bad }),
        );
        assert_eq!(code, "validation", "label {:?}", bad);
    }
    assert_eq!(fake.calls(), baseline);

    let created = request_ok(
        &mut state,
        "2",
        "periode.create",
        json!({ "label": "2026/2027" }),
    );
    assert_eq!(created["created"]["label"], "2026/2027");
    assert_eq!(created["created"]["isActive"], false);
    // The page was resynced and carries a success banner.
    assert_eq!(created["page"]["years"].as_array().expect("years").len(), 4);
    assert_eq!(created["page"]["banner"]["kind"], "success");
}

#[test]
fn delete_requires_confirmation_and_respects_backend_rules() {
    let fake = FakeBackend::with_years(seeded_years());
    let mut state = state_with(&fake);
    open_periode(&mut state);

    let (code, _) = request_err(&mut state, "1", "periode.delete", json!({ "id": 3 }));
    assert_eq!(code, "confirm_required");

    // The backend refuses to delete the active year; the message flows back.
    let (_, message) = request_err(
        &mut state,
        "2",
        "periode.delete",
        json!({ "id": 1, "confirm": true }),
    );
    assert!(message.contains("cannot delete the active year"));

    let page = request_ok(
        &mut state,
        "3",
        "periode.delete",
        json!({ "id": 3, "confirm": true }),
    );
    assert_eq!(page["years"].as_array().expect("years").len(), 2);
    assert_eq!(page["banner"]["kind"], "success");
}

#[test]
fn periode_methods_without_a_backend_say_so() {
    let mut state = akademikd::ipc::AppState::new();
    let (code, _) = test_support::request_err(&mut state, "1", "periode.list", json!({}));
    assert_eq!(code, "no_backend");
}
