mod test_support;

use akademikd::model::AbsensiRow;
use serde_json::json;
use test_support::{request_err, request_ok, state_with, FakeBackend};

fn row(student_id: &str, name: &str, present: bool) -> AbsensiRow {
    AbsensiRow {
        student_id: student_id.to_string(),
        student_name: name.to_string(),
        present,
        note: None,
    }
}

#[test]
fn open_returns_the_sheet_for_a_session() {
    let fake = FakeBackend::default();
    fake.0.borrow_mut().absensi = vec![row("2021001", "Andi", true), row("2021002", "Budi", false)];
    let mut state = state_with(&fake);

    let sheet = request_ok(&mut state, "1", "absensi.open", json!({ "jadwalId": 42 }));
    assert_eq!(sheet["jadwalId"], 42);
    let rows = sheet["rows"].as_array().expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["studentId"], "2021001");
    assert_eq!(rows[1]["present"], false);
}

#[test]
fn save_writes_then_refetches_in_that_order() {
    let fake = FakeBackend::default();
    fake.0.borrow_mut().absensi = vec![row("2021001", "Andi", false)];
    let mut state = state_with(&fake);

    let saved = request_ok(
        &mut state,
        "1",
        "absensi.save",
        json!({
            "jadwalId": 42,
            "rows": [
                { "student_id": "2021001", "student_name": "Andi", "present": true },
            ],
        }),
    );
    assert_eq!(saved["saved"], true);
    // The response carries the re-fetched rows, not the submitted payload.
    assert_eq!(saved["rows"][0]["present"], true);

    let calls = fake.calls();
    let save_pos = calls.iter().position(|c| c == "absensi_save").expect("save call");
    let open_pos = calls.iter().position(|c| c == "absensi_open").expect("open call");
    assert!(save_pos < open_pos, "save must precede the re-fetch: {:?}", calls);
}

#[test]
fn save_rejects_malformed_rows_before_any_call() {
    let fake = FakeBackend::default();
    let mut state = state_with(&fake);

    let (code, _) = request_err(&mut state, "1", "absensi.save", json!({ "jadwalId": 42 }));
    assert_eq!(code, "bad_params");

    let (code, _) = request_err(
        &mut state,
        "2",
        "absensi.save",
        json!({ "jadwalId": 42, "rows": [{ "student_id": "2021001" }] }),
    );
    assert_eq!(code, "bad_params");
    assert!(fake.calls().is_empty());
}
