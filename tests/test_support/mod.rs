#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;

use akademikd::api::{ApiError, ApiResult, Backend};
use akademikd::ipc::{handle_request, AppState, Request};
use akademikd::model::{
    AbsensiRow, BroadcastNotification, ForumThread, Jadwal, JadwalKind, MahasiswaVeteran,
    PenilaianKind, PenilaianRow, Semester, SemesterKind, TahunAjaran,
};

/// Scripted in-memory stand-in for the REST backend. Records every call in
/// order so tests can assert on call counts and sequencing.
#[derive(Default)]
pub struct FakeInner {
    pub years: Vec<TahunAjaran>,
    pub jadwal: Vec<(JadwalKind, Vec<Jadwal>)>,
    pub absensi: Vec<AbsensiRow>,
    pub penilaian: Vec<PenilaianRow>,
    pub threads: Vec<ForumThread>,
    pub students: Vec<MahasiswaVeteran>,

    /// HTTP status the next activation call should fail with.
    pub activate_failure: Option<u16>,
    pub broadcast_failure: bool,
    pub list_tahun_ajaran_failure: bool,
    pub failing_jadwal_kinds: Vec<JadwalKind>,

    pub calls: Vec<String>,
    pub activate_calls: Vec<(String, i64, bool)>,
    pub broadcast_messages: Vec<BroadcastNotification>,
    next_thread_id: u64,
}

#[derive(Clone, Default)]
pub struct FakeBackend(pub Rc<RefCell<FakeInner>>);

impl FakeBackend {
    pub fn with_years(years: Vec<TahunAjaran>) -> Self {
        let fake = FakeBackend::default();
        fake.0.borrow_mut().years = years;
        fake
    }

    pub fn list_tahun_ajaran_calls(&self) -> usize {
        self.0
            .borrow()
            .calls
            .iter()
            .filter(|c| *c == "list_tahun_ajaran")
            .count()
    }

    pub fn calls(&self) -> Vec<String> {
        self.0.borrow().calls.clone()
    }
}

impl Backend for FakeBackend {
    fn list_tahun_ajaran(&self) -> ApiResult<Vec<TahunAjaran>> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("list_tahun_ajaran".to_string());
        if inner.list_tahun_ajaran_failure {
            return Err(ApiError::from_status(500, None));
        }
        Ok(inner.years.clone())
    }

    fn create_tahun_ajaran(&self, label: &str) -> ApiResult<TahunAjaran> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("create_tahun_ajaran".to_string());
        let id = inner.years.iter().map(|y| y.id).max().unwrap_or(0) + 1;
        let year = TahunAjaran {
            id,
            label: label.to_string(),
            is_active: false,
            semesters: vec![
                Semester {
                    id: id * 10 + 1,
                    tahun_ajaran_id: id,
                    kind: SemesterKind::Odd,
                    is_active: false,
                },
                Semester {
                    id: id * 10 + 2,
                    tahun_ajaran_id: id,
                    kind: SemesterKind::Even,
                    is_active: false,
                },
            ],
        };
        inner.years.push(year.clone());
        Ok(year)
    }

    fn delete_tahun_ajaran(&self, id: i64) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("delete_tahun_ajaran".to_string());
        if inner.years.iter().any(|y| y.id == id && y.is_active) {
            return Err(ApiError::from_status(
                422,
                Some("cannot delete the active year".to_string()),
            ));
        }
        inner.years.retain(|y| y.id != id);
        Ok(())
    }

    fn activate_tahun_ajaran(&self, id: i64, update_student_semester: bool) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("activate_tahun_ajaran".to_string());
        inner
            .activate_calls
            .push(("year".to_string(), id, update_student_semester));
        if let Some(status) = inner.activate_failure {
            return Err(ApiError::from_status(status, None));
        }
        for year in &mut inner.years {
            year.is_active = year.id == id;
        }
        Ok(())
    }

    fn activate_semester(&self, id: i64, update_student_semester: bool) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("activate_semester".to_string());
        inner
            .activate_calls
            .push(("semester".to_string(), id, update_student_semester));
        if let Some(status) = inner.activate_failure {
            return Err(ApiError::from_status(status, None));
        }
        for year in &mut inner.years {
            let owns_target = year.semesters.iter().any(|s| s.id == id);
            year.is_active = owns_target;
            for semester in &mut year.semesters {
                semester.is_active = semester.id == id;
            }
        }
        Ok(())
    }

    fn broadcast_notification(&self, notification: &BroadcastNotification) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("broadcast_notification".to_string());
        inner.broadcast_messages.push(notification.clone());
        if inner.broadcast_failure {
            return Err(ApiError::from_status(502, None));
        }
        Ok(())
    }

    fn list_jadwal(&self, kind: JadwalKind) -> ApiResult<Vec<Jadwal>> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push(format!("list_jadwal:{}", kind.as_str()));
        if inner.failing_jadwal_kinds.contains(&kind) {
            return Err(ApiError::from_status(500, None));
        }
        let mut rows = inner
            .jadwal
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default();
        for row in &mut rows {
            row.kind = Some(kind);
        }
        Ok(rows)
    }

    fn absensi_open(&self, _jadwal_id: i64) -> ApiResult<Vec<AbsensiRow>> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("absensi_open".to_string());
        Ok(inner.absensi.clone())
    }

    fn absensi_save(&self, _jadwal_id: i64, rows: &[AbsensiRow]) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("absensi_save".to_string());
        inner.absensi = rows.to_vec();
        Ok(())
    }

    fn penilaian_open(&self, kind: PenilaianKind, _jadwal_id: i64) -> ApiResult<Vec<PenilaianRow>> {
        let mut inner = self.0.borrow_mut();
        inner
            .calls
            .push(format!("penilaian_open:{}", kind.as_str()));
        Ok(inner.penilaian.clone())
    }

    fn penilaian_save(
        &self,
        kind: PenilaianKind,
        _jadwal_id: i64,
        rows: &[PenilaianRow],
    ) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner
            .calls
            .push(format!("penilaian_save:{}", kind.as_str()));
        inner.penilaian = rows.to_vec();
        Ok(())
    }

    fn forum_list(&self) -> ApiResult<Vec<ForumThread>> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("forum_list".to_string());
        Ok(inner.threads.clone())
    }

    fn forum_create(&self, title: &str, content: &str, category: &str) -> ApiResult<ForumThread> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("forum_create".to_string());
        inner.next_thread_id += 1;
        let thread = ForumThread {
            id: format!("t-{}", inner.next_thread_id),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            author_name: "Server".to_string(),
            reply_count: 0,
            created_at: "2026-08-28T00:00:00Z".to_string(),
        };
        inner.threads.push(thread.clone());
        Ok(thread)
    }

    fn forum_reply(&self, thread_id: &str, _content: &str) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("forum_reply".to_string());
        match inner.threads.iter_mut().find(|t| t.id == thread_id) {
            Some(thread) => {
                thread.reply_count += 1;
                Ok(())
            }
            None => Err(ApiError::from_status(404, None)),
        }
    }

    fn forum_delete(&self, thread_id: &str) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("forum_delete".to_string());
        inner.threads.retain(|t| t.id != thread_id);
        Ok(())
    }

    fn veteran_list(&self) -> ApiResult<Vec<MahasiswaVeteran>> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("veteran_list".to_string());
        Ok(inner.students.clone())
    }

    fn veteran_set(&self, student_id: &str, is_veteran: bool) -> ApiResult<()> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("veteran_set".to_string());
        match inner
            .students
            .iter_mut()
            .find(|s| s.student_id == student_id)
        {
            Some(student) => {
                student.is_veteran = is_veteran;
                Ok(())
            }
            None => Err(ApiError::from_status(404, None)),
        }
    }

    fn veteran_bulk_set(&self, student_ids: &[String], is_veteran: bool) -> ApiResult<usize> {
        let mut inner = self.0.borrow_mut();
        inner.calls.push("veteran_bulk_set".to_string());
        let mut updated = 0;
        for student in &mut inner.students {
            if student_ids.contains(&student.student_id) {
                student.is_veteran = is_veteran;
                updated += 1;
            }
        }
        Ok(updated)
    }
}

pub fn semester(id: i64, year_id: i64, kind: SemesterKind, is_active: bool) -> Semester {
    Semester {
        id,
        tahun_ajaran_id: year_id,
        kind,
        is_active,
    }
}

pub fn year(id: i64, label: &str, is_active: bool) -> TahunAjaran {
    TahunAjaran {
        id,
        label: label.to_string(),
        is_active,
        semesters: vec![
            semester(id * 10 + 1, id, SemesterKind::Odd, is_active),
            semester(id * 10 + 2, id, SemesterKind::Even, false),
        ],
    }
}

/// Three seeded years: 2023/2024 is the active period.
pub fn seeded_years() -> Vec<TahunAjaran> {
    vec![
        year(1, "2023/2024", true),
        year(2, "2024/2025", false),
        year(3, "2025/2026", false),
    ]
}

pub fn state_with(fake: &FakeBackend) -> AppState {
    AppState::with_backend(Box::new(fake.clone()))
}

pub fn request(
    state: &mut AppState,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let resp = handle_request(
        state,
        Request {
            id: id.to_string(),
            method: method.to_string(),
            params,
        },
    );
    assert_eq!(resp.get("id").and_then(|v| v.as_str()), Some(id));
    resp
}

/// Sends a request and unwraps the `result` payload, failing on errors.
pub fn request_ok(
    state: &mut AppState,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let resp = request(state, id, method, params);
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "expected ok for {}: {}",
        method,
        resp
    );
    resp.get("result").cloned().unwrap_or(json!(null))
}

/// Sends a request expected to fail, returning (code, message).
pub fn request_err(
    state: &mut AppState,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> (String, String) {
    let resp = request(state, id, method, params);
    assert_eq!(
        resp.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "expected error for {}: {}",
        method,
        resp
    );
    let error = resp.get("error").expect("error object");
    (
        error
            .get("code")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        error
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
    )
}

/// Drives the periode page to a freshly-listed state.
pub fn open_periode(state: &mut AppState) {
    let _ = request_ok(state, "seed-list", "periode.list", json!({}));
}

pub fn jadwal_row(id: i64, course: &str, lecturer: &str, room: &str, semester_id: i64) -> Jadwal {
    Jadwal {
        id,
        kind: None,
        course: course.to_string(),
        lecturer: lecturer.to_string(),
        room: room.to_string(),
        semester_id,
        date: "2026-09-01".to_string(),
        time_slot: "07:30-09:10".to_string(),
    }
}

pub fn veteran_student(student_id: &str, name: &str, angkatan: i32, is_veteran: bool) -> MahasiswaVeteran {
    MahasiswaVeteran {
        student_id: student_id.to_string(),
        name: name.to_string(),
        angkatan,
        is_veteran,
    }
}
