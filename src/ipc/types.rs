use serde::Deserialize;

use crate::activation::Flow;
use crate::api::Backend;
use crate::model::{ForumThread, Jadwal, MahasiswaVeteran, TahunAjaran};
use crate::session::Session;
use crate::view::{Banner, FetchWarning};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Daemon-wide state: the backend connection, the injected session, and one
/// cache per dashboard page. Each page owns its own collection; pages never
/// share mutable state.
pub struct AppState {
    pub backend: Option<Box<dyn Backend>>,
    pub session: Option<Session>,
    pub periode: PeriodePage,
    pub jadwal: JadwalPage,
    pub forum: ForumPage,
    pub veteran: VeteranPage,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            backend: None,
            session: None,
            periode: PeriodePage::default(),
            jadwal: JadwalPage::default(),
            forum: ForumPage::default(),
            veteran: VeteranPage::default(),
        }
    }

    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        let mut state = AppState::new();
        state.backend = Some(backend);
        state
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new()
    }
}

/// Tahun-ajaran page: cached year list plus the activation flow. Busy ids
/// are tracked per granularity so committing one row leaves the rest of the
/// table interactive.
#[derive(Default)]
pub struct PeriodePage {
    pub years: Vec<TahunAjaran>,
    pub flow: Flow,
    pub loading_year: Option<i64>,
    pub loading_semester: Option<i64>,
    pub banner: Option<Banner>,
}

#[derive(Default)]
pub struct JadwalPage {
    pub rows: Vec<Jadwal>,
    pub warnings: Vec<FetchWarning>,
    pub loaded: bool,
}

#[derive(Default)]
pub struct ForumPage {
    pub threads: Vec<ForumThread>,
    pub banner: Option<Banner>,
}

#[derive(Default)]
pub struct VeteranPage {
    pub students: Vec<MahasiswaVeteran>,
    pub busy_student: Option<String>,
    pub banner: Option<Banner>,
}
