//! Utility functions for sync windows, timestamp parsing and file persistence.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `[end - length, end]`.
pub fn trailing_window(end: DateTime<Utc>, length: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
    (end - length, end)
}

/// RFC 3339 with second precision and a `Z` suffix.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a user-supplied instant.
///
/// Accepts:
/// - YYYY-MM-DD -> midnight UTC
/// - RFC 3339 datetime -> converted to UTC
/// - Naive datetime YYYY-MM-DDTHH:MM:SS -> interpreted as UTC
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|ndt| ndt.and_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(ndt.and_utc());
    }
    None
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("state"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `bytes` by writing a sibling temp file and renaming it
/// over the target, so readers never observe a truncated file.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = temp_sibling(path);
    {
        let mut file = std::fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }
    std::fs::rename(&tmp_path, path).inspect_err(|_| {
        let _ = std::fs::remove_file(&tmp_path);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn trailing_window_spans_length() {
        let end = Utc.with_ymd_and_hms(2025, 7, 7, 12, 0, 0).unwrap();
        let (start, stop) = trailing_window(end, Duration::hours(24));
        assert_eq!(stop, end);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 7, 6, 12, 0, 0).unwrap());
    }

    #[test]
    fn format_timestamp_uses_seconds() {
        let ts = Utc.with_ymd_and_hms(2025, 12, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(ts), "2025-12-15T10:30:00Z");
    }

    #[test]
    fn parse_timestamp_accepts_date_only() {
        let result = parse_timestamp("2025-12-15").unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2025, 12, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_converts_offsets() {
        let result = parse_timestamp("2025-12-15T10:30:00+02:00").unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2025, 12, 15, 8, 30, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_accepts_naive_datetime() {
        let result = parse_timestamp("2025-12-15T10:30:00").unwrap();
        assert_eq!(result, Utc.with_ymd_and_hms(2025, 12, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn parse_timestamp_rejects_invalid() {
        assert!(parse_timestamp("not-a-date").is_none());
    }

    #[test]
    fn write_atomic_replaces_contents_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, b"old contents that are longer").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"new");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![OsString::from("settings.json")]);
    }

    #[test]
    fn temp_sibling_stays_in_same_directory() {
        let tmp = temp_sibling(Path::new("/var/lib/health/log.json"));
        assert_eq!(tmp, PathBuf::from("/var/lib/health/log.json.tmp"));
    }
}
