//! Rotating file sink
//!
//! Records for UTC day `D` go to `{dir}/{prefix}-{D}.log` (`{prefix}.log`
//! when the date key is empty). Before each append the current size is
//! read from the filesystem; when a non-empty file would grow past
//! `max_bytes` it is renamed to `{prefix}-{D}_{HHMMSS}.log` (UTC time of
//! rotation), or `{prefix}-{D}_{HHMMSS}_{6 hex}.log` if that name is taken.
//! Rotated files are never deleted.
//!
//! Within a process, rotate+append is serialized by a mutex and every
//! record goes out in a single `write_all` on an append-mode handle.
//! Across processes only the append guarantee holds: two writers may both
//! decide to rotate, which costs an extra backup file but never tears a
//! record.

use chrono::{DateTime, Utc};
use marlog_core::settings::Settings;
use marlog_core::Sink;
use marlog_core_types::schema::{EVENT_ROTATED, EVENT_SINK_WRITE_FAILED};
use marlog_errors::{io_error, rotation_error, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Source of the rotation timestamp
pub type Clock = fn() -> DateTime<Utc>;

#[derive(Debug)]
pub struct FileSink {
    dir: PathBuf,
    prefix: String,
    max_bytes: u64,
    clock: Clock,
    lock: Mutex<()>,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, max_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            max_bytes: max_bytes.max(1),
            clock: Utc::now,
            lock: Mutex::new(()),
        }
    }

    /// Directory `log_path`, prefix `app_name`, threshold `max_log_bytes`
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.log_path(),
            settings.app_name(),
            settings.max_log_bytes(),
        )
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Active file for a date key
    pub fn path_for(&self, date_key: &str) -> PathBuf {
        self.dir.join(format!("{}.log", self.stem(date_key)))
    }

    fn stem(&self, date_key: &str) -> String {
        if date_key.is_empty() {
            self.prefix.clone()
        } else {
            format!("{}-{}", self.prefix, date_key)
        }
    }

    fn backup_path(&self, date_key: &str, now: DateTime<Utc>) -> PathBuf {
        let base = format!("{}_{}", self.stem(date_key), now.format("%H%M%S"));
        let candidate = self.dir.join(format!("{}.log", base));
        if !candidate.exists() {
            return candidate;
        }
        let salt = hex::encode(&uuid::Uuid::new_v4().as_bytes()[..3]);
        self.dir.join(format!("{}_{}.log", base, salt))
    }

    /// Append one record, rotating first if needed
    ///
    /// Returns the backup path when this write rotated the active file.
    /// A failed rotation is reported and the append still goes ahead.
    ///
    /// # Errors
    ///
    /// The directory cannot be created, or the append itself fails.
    pub fn try_write(&self, formatted: &str, date_key: &str) -> Result<Option<PathBuf>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        fs::create_dir_all(&self.dir).map_err(|e| io_error("create_log_dir", &self.dir, e))?;

        let path = self.path_for(date_key);
        let incoming = formatted.len() as u64;
        let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

        let mut rotated = None;
        if size > 0 && size.saturating_add(incoming) > self.max_bytes {
            let backup = self.backup_path(date_key, (self.clock)());
            match fs::rename(&path, &backup) {
                Ok(()) => {
                    marlog_core::diagnostic!(
                        debug,
                        "rotate",
                        EVENT_ROTATED,
                        from = %path.display(),
                        to = %backup.display(),
                        size = size,
                    );
                    rotated = Some(backup);
                }
                Err(e) => {
                    let err = rotation_error(&path, &backup, e);
                    marlog_core::diagnostic!(
                        warn,
                        "rotate",
                        EVENT_SINK_WRITE_FAILED,
                        err_code = err.code(),
                        error = %err,
                    );
                }
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| io_error("open_log", &path, e))?;
        file.write_all(formatted.as_bytes())
            .map_err(|e| io_error("append_log", &path, e))?;

        Ok(rotated)
    }
}

impl Sink for FileSink {
    fn write(&self, formatted: &str, date_key: &str) {
        if let Err(err) = self.try_write(formatted, date_key) {
            marlog_core::diagnostic!(
                warn,
                "append",
                EVENT_SINK_WRITE_FAILED,
                err_code = err.code(),
                error = %err,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 34, 56).unwrap()
    }

    #[test]
    fn test_paths() {
        let sink = FileSink::new("/var/log/shop", "shop", 100);
        assert_eq!(
            sink.path_for("2024-06-01"),
            PathBuf::from("/var/log/shop/shop-2024-06-01.log")
        );
        assert_eq!(sink.path_for(""), PathBuf::from("/var/log/shop/shop.log"));
    }

    #[test]
    fn test_creates_directory_and_appends() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let sink = FileSink::new(&dir, "app", 1024);

        sink.write("one\n", "2024-06-01");
        sink.write("two\n", "2024-06-01");

        let content = fs::read_to_string(dir.join("app-2024-06-01.log")).unwrap();
        assert_eq!(content, "one\ntwo\n");
    }

    #[test]
    fn test_rotation_backup_name() {
        let tmp = TempDir::new().unwrap();
        let sink = FileSink::new(tmp.path(), "app", 10).with_clock(noon);

        assert_eq!(sink.try_write("12345678\n", "2024-06-01").unwrap(), None);
        let backup = sink.try_write("abc\n", "2024-06-01").unwrap().unwrap();

        assert_eq!(backup, tmp.path().join("app-2024-06-01_123456.log"));
        assert_eq!(fs::read_to_string(&backup).unwrap(), "12345678\n");
        assert_eq!(
            fs::read_to_string(tmp.path().join("app-2024-06-01.log")).unwrap(),
            "abc\n"
        );
    }

    #[test]
    fn test_rotation_collision_gets_hex_suffix() {
        let tmp = TempDir::new().unwrap();
        let sink = FileSink::new(tmp.path(), "app", 5).with_clock(noon);

        sink.try_write("aaaa\n", "").unwrap();
        let first = sink.try_write("bbbb\n", "").unwrap().unwrap();
        let second = sink.try_write("cccc\n", "").unwrap().unwrap();

        assert_eq!(first, tmp.path().join("app_123456.log"));
        let name = second.file_name().unwrap().to_str().unwrap().to_string();
        assert!(name.starts_with("app_123456_"), "{}", name);
        let salt = name
            .trim_start_matches("app_123456_")
            .trim_end_matches(".log");
        assert_eq!(salt.len(), 6);
        assert!(salt.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fs::read_to_string(&second).unwrap(), "bbbb\n");
    }

    #[test]
    fn test_oversized_first_record_is_written_whole() {
        let tmp = TempDir::new().unwrap();
        let sink = FileSink::new(tmp.path(), "app", 4);
        let big = "x".repeat(100);

        assert_eq!(sink.try_write(&big, "d").unwrap(), None);
        assert_eq!(
            fs::read_to_string(tmp.path().join("app-d.log")).unwrap(),
            big
        );
    }

    #[test]
    fn test_unwritable_directory_is_swallowed() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "not a dir").unwrap();

        let sink = FileSink::new(blocker.join("logs"), "app", 100);
        sink.write("lost\n", "2024-06-01");
        assert!(sink.try_write("lost\n", "2024-06-01").is_err());
    }
}
