use serde::{Deserialize, Serialize};

/// One academic year ("2024/2025") owning its two semesters. The backend
/// guarantees at most one active year; the client never asserts it locally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TahunAjaran {
    pub id: i64,
    pub label: String,
    pub is_active: bool,
    #[serde(default)]
    pub semesters: Vec<Semester>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Semester {
    pub id: i64,
    pub tahun_ajaran_id: i64,
    pub kind: SemesterKind,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemesterKind {
    Odd,
    Even,
}

impl SemesterKind {
    pub fn display_name(self) -> &'static str {
        match self {
            SemesterKind::Odd => "Ganjil",
            SemesterKind::Even => "Genap",
        }
    }
}

/// Schedule sources fetched in one fan-out batch when the jadwal page opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JadwalKind {
    KuliahBesar,
    Praktikum,
    Pbl,
    JurnalReading,
    PersamaanPersepsi,
    Ujian,
}

impl JadwalKind {
    pub const ALL: [JadwalKind; 6] = [
        JadwalKind::KuliahBesar,
        JadwalKind::Praktikum,
        JadwalKind::Pbl,
        JadwalKind::JurnalReading,
        JadwalKind::PersamaanPersepsi,
        JadwalKind::Ujian,
    ];

    /// Path segment of the backend listing endpoint (`/jadwal-kuliah-besar`, ...).
    pub fn endpoint_segment(self) -> &'static str {
        match self {
            JadwalKind::KuliahBesar => "jadwal-kuliah-besar",
            JadwalKind::Praktikum => "jadwal-praktikum",
            JadwalKind::Pbl => "jadwal-pbl",
            JadwalKind::JurnalReading => "jadwal-jurnal-reading",
            JadwalKind::PersamaanPersepsi => "jadwal-persamaan-persepsi",
            JadwalKind::Ujian => "jadwal-ujian",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JadwalKind::KuliahBesar => "kuliah-besar",
            JadwalKind::Praktikum => "praktikum",
            JadwalKind::Pbl => "pbl",
            JadwalKind::JurnalReading => "jurnal-reading",
            JadwalKind::PersamaanPersepsi => "persamaan-persepsi",
            JadwalKind::Ujian => "ujian",
        }
    }

    pub fn parse(s: &str) -> Option<JadwalKind> {
        JadwalKind::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jadwal {
    pub id: i64,
    #[serde(skip_deserializing)]
    pub kind: Option<JadwalKind>,
    pub course: String,
    pub lecturer: String,
    pub room: String,
    pub semester_id: i64,
    /// ISO date, as delivered by the backend.
    pub date: String,
    pub time_slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsensiRow {
    pub student_id: String,
    pub student_name: String,
    pub present: bool,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PenilaianKind {
    Pbl,
    Jurnal,
}

impl PenilaianKind {
    pub fn endpoint_segment(self) -> &'static str {
        match self {
            PenilaianKind::Pbl => "penilaian-pbl",
            PenilaianKind::Jurnal => "penilaian-jurnal",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PenilaianKind::Pbl => "pbl",
            PenilaianKind::Jurnal => "jurnal",
        }
    }

    pub fn parse(s: &str) -> Option<PenilaianKind> {
        match s {
            "pbl" => Some(PenilaianKind::Pbl),
            "jurnal" => Some(PenilaianKind::Jurnal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenilaianRow {
    pub student_id: String,
    pub student_name: String,
    /// Criterion name -> score. Criteria differ between PBL and jurnal
    /// sessions; the daemon treats them as opaque columns.
    #[serde(default)]
    pub scores: Vec<PenilaianScore>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PenilaianScore {
    pub criterion: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForumThread {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    pub author_name: String,
    pub reply_count: u64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MahasiswaVeteran {
    /// Student number (NIM).
    pub student_id: String,
    pub name: String,
    /// Cohort year, e.g. 2021.
    pub angkatan: i32,
    pub is_veteran: bool,
}

/// Fire-and-forget announcement sent after a successful period activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastNotification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub send_to_all: bool,
}

/// Checks the `YYYY/YYYY` year-label format with consecutive years.
pub fn valid_year_label(label: &str) -> bool {
    let Some((first, second)) = label.split_once('/') else {
        return false;
    };
    if first.len() != 4 || second.len() != 4 {
        return false;
    }
    let (Ok(a), Ok(b)) = (first.parse::<i32>(), second.parse::<i32>()) else {
        return false;
    };
    b == a + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn year_label_requires_consecutive_years() {
        assert!(valid_year_label("2024/2025"));
        assert!(valid_year_label("1999/2000"));
        assert!(!valid_year_label("2024/2026"));
        assert!(!valid_year_label("2024/2024"));
        assert!(!valid_year_label("2024-2025"));
        assert!(!valid_year_label("24/25"));
        assert!(!valid_year_label("abcd/efgh"));
        assert!(!valid_year_label(""));
    }

    #[test]
    fn jadwal_kind_round_trips_through_parse() {
        for kind in JadwalKind::ALL {
            assert_eq!(JadwalKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(JadwalKind::parse("unknown"), None);
    }
}
