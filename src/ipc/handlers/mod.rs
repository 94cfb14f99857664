pub mod absensi;
pub mod core;
pub mod forum;
pub mod jadwal;
pub mod penilaian;
pub mod periode;
pub mod veteran;
