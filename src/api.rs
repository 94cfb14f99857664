use std::fmt::{Display, Formatter};

use serde_json::json;

use crate::model::{
    AbsensiRow, BroadcastNotification, ForumThread, Jadwal, JadwalKind, MahasiswaVeteran,
    PenilaianKind, PenilaianRow, TahunAjaran,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCode {
    /// Rejected client-side before any request was issued.
    Validation,
    Forbidden,
    NotFound,
    /// HTTP 5xx; carries the status for the activation hint heuristic.
    Server,
    Network,
    Other,
}

impl ApiErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiErrorCode::Validation => "validation",
            ApiErrorCode::Forbidden => "forbidden",
            ApiErrorCode::NotFound => "not_found",
            ApiErrorCode::Server => "server_error",
            ApiErrorCode::Network => "network_error",
            ApiErrorCode::Other => "request_failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    /// HTTP status when one was received.
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn from_status(status: u16, body_message: Option<String>) -> Self {
        let code = match status {
            403 => ApiErrorCode::Forbidden,
            404 => ApiErrorCode::NotFound,
            500..=599 => ApiErrorCode::Server,
            _ => ApiErrorCode::Other,
        };
        let message = body_message.unwrap_or_else(|| match code {
            ApiErrorCode::Forbidden => "access denied for this account".to_string(),
            ApiErrorCode::NotFound => "record not found".to_string(),
            ApiErrorCode::Server => format!("server error ({})", status),
            _ => format!("request failed ({})", status),
        });
        ApiError {
            code,
            message,
            status: Some(status),
        }
    }

    pub fn is_server_error(&self) -> bool {
        self.code == ApiErrorCode::Server
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

/// REST surface of the academic backend. The daemon never talks HTTP
/// directly; handlers go through this trait so tests can inject a fake.
pub trait Backend {
    fn list_tahun_ajaran(&self) -> ApiResult<Vec<TahunAjaran>>;
    fn create_tahun_ajaran(&self, label: &str) -> ApiResult<TahunAjaran>;
    fn delete_tahun_ajaran(&self, id: i64) -> ApiResult<()>;
    fn activate_tahun_ajaran(&self, id: i64, update_student_semester: bool) -> ApiResult<()>;
    fn activate_semester(&self, id: i64, update_student_semester: bool) -> ApiResult<()>;
    fn broadcast_notification(&self, notification: &BroadcastNotification) -> ApiResult<()>;

    fn list_jadwal(&self, kind: JadwalKind) -> ApiResult<Vec<Jadwal>>;

    fn absensi_open(&self, jadwal_id: i64) -> ApiResult<Vec<AbsensiRow>>;
    fn absensi_save(&self, jadwal_id: i64, rows: &[AbsensiRow]) -> ApiResult<()>;

    fn penilaian_open(&self, kind: PenilaianKind, jadwal_id: i64) -> ApiResult<Vec<PenilaianRow>>;
    fn penilaian_save(
        &self,
        kind: PenilaianKind,
        jadwal_id: i64,
        rows: &[PenilaianRow],
    ) -> ApiResult<()>;

    fn forum_list(&self) -> ApiResult<Vec<ForumThread>>;
    fn forum_create(&self, title: &str, content: &str, category: &str) -> ApiResult<ForumThread>;
    fn forum_reply(&self, thread_id: &str, content: &str) -> ApiResult<()>;
    fn forum_delete(&self, thread_id: &str) -> ApiResult<()>;

    fn veteran_list(&self) -> ApiResult<Vec<MahasiswaVeteran>>;
    fn veteran_set(&self, student_id: &str, is_veteran: bool) -> ApiResult<()>;
    fn veteran_bulk_set(&self, student_ids: &[String], is_veteran: bool) -> ApiResult<usize>;
}

/// Blocking HTTP implementation used by the production sidecar.
pub struct HttpBackend {
    base_url: String,
    bearer_token: Option<String>,
    client: reqwest::blocking::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, bearer_token: Option<String>) -> Self {
        HttpBackend {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
            client: reqwest::blocking::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorize(
        &self,
        req: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        match &self.bearer_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn send(&self, req: reqwest::blocking::RequestBuilder) -> ApiResult<serde_json::Value> {
        let resp = self
            .authorize(req)
            .send()
            .map_err(|e| ApiError::new(ApiErrorCode::Network, e.to_string()))?;
        let status = resp.status().as_u16();
        if !resp.status().is_success() {
            // Backends wrap errors as {"message": "..."}; fall back to the status line.
            let body_message = resp
                .json::<serde_json::Value>()
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from));
            return Err(ApiError::from_status(status, body_message));
        }
        if status == 204 {
            return Ok(serde_json::Value::Null);
        }
        resp.json::<serde_json::Value>()
            .map_err(|e| ApiError::new(ApiErrorCode::Other, format!("invalid response body: {e}")))
    }

    fn get_json(&self, path: &str) -> ApiResult<serde_json::Value> {
        self.send(self.client.get(self.url(path)))
    }

    fn post_json(&self, path: &str, body: serde_json::Value) -> ApiResult<serde_json::Value> {
        self.send(self.client.post(self.url(path)).json(&body))
    }

    fn delete(&self, path: &str) -> ApiResult<serde_json::Value> {
        self.send(self.client.delete(self.url(path)))
    }

    fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> ApiResult<T> {
        serde_json::from_value(value)
            .map_err(|e| ApiError::new(ApiErrorCode::Other, format!("unexpected payload: {e}")))
    }
}

impl Backend for HttpBackend {
    fn list_tahun_ajaran(&self) -> ApiResult<Vec<TahunAjaran>> {
        Self::decode(self.get_json("tahun-ajaran")?)
    }

    fn create_tahun_ajaran(&self, label: &str) -> ApiResult<TahunAjaran> {
        Self::decode(self.post_json("tahun-ajaran", json!({ "label": label }))?)
    }

    fn delete_tahun_ajaran(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("tahun-ajaran/{id}"))?;
        Ok(())
    }

    fn activate_tahun_ajaran(&self, id: i64, update_student_semester: bool) -> ApiResult<()> {
        self.post_json(
            &format!("tahun-ajaran/{id}/activate"),
            json!({ "update_student_semester": update_student_semester }),
        )?;
        Ok(())
    }

    fn activate_semester(&self, id: i64, update_student_semester: bool) -> ApiResult<()> {
        self.post_json(
            &format!("semesters/{id}/activate"),
            json!({ "update_student_semester": update_student_semester }),
        )?;
        Ok(())
    }

    fn broadcast_notification(&self, notification: &BroadcastNotification) -> ApiResult<()> {
        let body = serde_json::to_value(notification)
            .map_err(|e| ApiError::new(ApiErrorCode::Other, e.to_string()))?;
        self.post_json("notifications/broadcast", body)?;
        Ok(())
    }

    fn list_jadwal(&self, kind: JadwalKind) -> ApiResult<Vec<Jadwal>> {
        let mut rows: Vec<Jadwal> = Self::decode(self.get_json(kind.endpoint_segment())?)?;
        for row in &mut rows {
            row.kind = Some(kind);
        }
        Ok(rows)
    }

    fn absensi_open(&self, jadwal_id: i64) -> ApiResult<Vec<AbsensiRow>> {
        Self::decode(self.get_json(&format!("persamaan-persepsi/{jadwal_id}/absensi"))?)
    }

    fn absensi_save(&self, jadwal_id: i64, rows: &[AbsensiRow]) -> ApiResult<()> {
        let body = serde_json::to_value(rows)
            .map_err(|e| ApiError::new(ApiErrorCode::Other, e.to_string()))?;
        self.post_json(
            &format!("persamaan-persepsi/{jadwal_id}/absensi"),
            json!({ "rows": body }),
        )?;
        Ok(())
    }

    fn penilaian_open(&self, kind: PenilaianKind, jadwal_id: i64) -> ApiResult<Vec<PenilaianRow>> {
        Self::decode(self.get_json(&format!("{}/{jadwal_id}", kind.endpoint_segment()))?)
    }

    fn penilaian_save(
        &self,
        kind: PenilaianKind,
        jadwal_id: i64,
        rows: &[PenilaianRow],
    ) -> ApiResult<()> {
        let body = serde_json::to_value(rows)
            .map_err(|e| ApiError::new(ApiErrorCode::Other, e.to_string()))?;
        self.post_json(
            &format!("{}/{jadwal_id}", kind.endpoint_segment()),
            json!({ "rows": body }),
        )?;
        Ok(())
    }

    fn forum_list(&self) -> ApiResult<Vec<ForumThread>> {
        Self::decode(self.get_json("forum/threads")?)
    }

    fn forum_create(&self, title: &str, content: &str, category: &str) -> ApiResult<ForumThread> {
        Self::decode(self.post_json(
            "forum/threads",
            json!({ "title": title, "content": content, "category": category }),
        )?)
    }

    fn forum_reply(&self, thread_id: &str, content: &str) -> ApiResult<()> {
        self.post_json(
            &format!("forum/threads/{thread_id}/replies"),
            json!({ "content": content }),
        )?;
        Ok(())
    }

    fn forum_delete(&self, thread_id: &str) -> ApiResult<()> {
        self.delete(&format!("forum/threads/{thread_id}"))?;
        Ok(())
    }

    fn veteran_list(&self) -> ApiResult<Vec<MahasiswaVeteran>> {
        Self::decode(self.get_json("mahasiswa-veteran")?)
    }

    fn veteran_set(&self, student_id: &str, is_veteran: bool) -> ApiResult<()> {
        self.post_json(
            &format!("mahasiswa-veteran/{student_id}"),
            json!({ "is_veteran": is_veteran }),
        )?;
        Ok(())
    }

    fn veteran_bulk_set(&self, student_ids: &[String], is_veteran: bool) -> ApiResult<usize> {
        let result = self.post_json(
            "mahasiswa-veteran/bulk",
            json!({ "student_ids": student_ids, "is_veteran": is_veteran }),
        )?;
        Ok(result
            .get("updated")
            .and_then(|v| v.as_u64())
            .unwrap_or(student_ids.len() as u64) as usize)
    }
}
