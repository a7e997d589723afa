//! Recording index stored in SQLite.
//!
//! Audio files live in `<data dir>/recordings/`; the `recordings` table keeps one
//! row of metadata per file for the browser and the `play`/`delete` commands.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Metadata of one stored recording.
#[derive(Debug, Clone, PartialEq)]
pub struct Recording {
    pub id: i64,
    pub file_name: String,
    pub file_path: PathBuf,
    pub duration: Duration,
    pub created_at: DateTime<Local>,
    /// Size of the audio file in bytes when it was saved
    pub file_size: u64,
}

/// A recording about to be indexed.
#[derive(Debug, Clone)]
pub struct NewRecording {
    pub file_path: PathBuf,
    pub duration: Duration,
    pub created_at: DateTime<Local>,
    pub file_size: u64,
}

impl NewRecording {
    fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Access to the recordings database.
pub struct RecordingStore {
    data_dir: PathBuf,
    database_path: PathBuf,
    /// Opened on first use
    connection: Option<Connection>,
}

impl RecordingStore {
    /// Creates a store rooted at `data_dir`. Nothing is opened yet.
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            database_path: data_dir.join("recordings.db"),
            connection: None,
        }
    }

    fn connection(&mut self) -> Result<&Connection> {
        let connection = match self.connection.take() {
            Some(connection) => connection,
            None => {
                let connection = Connection::open(&self.database_path).with_context(|| {
                    format!("Failed to open {}", self.database_path.display())
                })?;
                connection.execute(
                    "CREATE TABLE IF NOT EXISTS recordings (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        file_name TEXT NOT NULL,
                        file_path TEXT NOT NULL,
                        duration_ms INTEGER NOT NULL,
                        created_date TEXT NOT NULL,
                        file_size INTEGER NOT NULL
                    )",
                    [],
                )?;
                connection
            }
        };
        let connection: &Connection = self.connection.insert(connection);
        Ok(connection)
    }

    /// Directory new audio files are written to. Created if missing.
    pub fn recordings_dir(&self) -> Result<PathBuf> {
        let dir = self.data_dir.join("recordings");
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Path for a recording started at `started`: `Recording_YYYYMMDD_HHMMSS.wav`.
    pub fn new_recording_path(&self, started: DateTime<Local>) -> Result<PathBuf> {
        Ok(self.recordings_dir()?.join(recording_file_name(started)))
    }

    /// Indexes a saved recording and returns its id.
    pub fn insert(&mut self, recording: &NewRecording) -> Result<i64> {
        let file_name = recording.file_name();
        let connection = self.connection()?;
        connection.execute(
            "INSERT INTO recordings (file_name, file_path, duration_ms, created_date, file_size)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                file_name,
                recording.file_path.to_string_lossy(),
                recording.duration.as_millis() as i64,
                recording.created_at,
                recording.file_size as i64,
            ],
        )?;
        let id = connection.last_insert_rowid();
        tracing::debug!("Indexed recording #{} ({})", id, file_name);
        Ok(id)
    }

    /// All recordings, newest first.
    pub fn list(&mut self) -> Result<Vec<Recording>> {
        let connection = self.connection()?;
        let mut statement = connection.prepare(
            "SELECT id, file_name, file_path, duration_ms, created_date, file_size
             FROM recordings ORDER BY created_date DESC, id DESC",
        )?;
        let recordings = statement
            .query_map([], recording_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(recordings)
    }

    pub fn get(&mut self, id: i64) -> Result<Option<Recording>> {
        let connection = self.connection()?;
        let recording = connection
            .query_row(
                "SELECT id, file_name, file_path, duration_ms, created_date, file_size
                 FROM recordings WHERE id = ?1",
                params![id],
                recording_from_row,
            )
            .optional()?;
        Ok(recording)
    }

    /// The `index`-th most recent recording, 1-based.
    pub fn nth_newest(&mut self, index: usize) -> Result<Option<Recording>> {
        if index == 0 {
            return Ok(None);
        }
        Ok(self.list()?.into_iter().nth(index - 1))
    }

    /// Removes the row and its audio file. Returns false if `id` is unknown.
    pub fn delete(&mut self, id: i64) -> Result<bool> {
        let Some(recording) = self.get(id)? else {
            return Ok(false);
        };

        self.connection()?
            .execute("DELETE FROM recordings WHERE id = ?1", params![id])?;

        match std::fs::remove_file(&recording.file_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Audio file already gone: {}", recording.file_path.display());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to delete {}", recording.file_path.display())
                })
            }
        }
        tracing::info!("Deleted recording #{} ({})", id, recording.file_name);
        Ok(true)
    }
}

fn recording_from_row(row: &Row<'_>) -> rusqlite::Result<Recording> {
    Ok(Recording {
        id: row.get(0)?,
        file_name: row.get(1)?,
        file_path: PathBuf::from(row.get::<_, String>(2)?),
        duration: Duration::from_millis(row.get::<_, i64>(3)?.max(0) as u64),
        created_at: row.get(4)?,
        file_size: row.get::<_, i64>(5)?.max(0) as u64,
    })
}

pub fn recording_file_name(started: DateTime<Local>) -> String {
    format!("Recording_{}.wav", started.format("%Y%m%d_%H%M%S"))
}

/// `m:ss`, or `h:mm:ss` past an hour.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

pub fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let bytes_f = bytes as f64;
    if bytes_f < KIB {
        format!("{bytes} B")
    } else if bytes_f < KIB * KIB {
        format!("{:.1} KB", bytes_f / KIB)
    } else {
        format!("{:.1} MB", bytes_f / (KIB * KIB))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 5, 4, hour, 30, 0).unwrap()
    }

    fn save(store: &mut RecordingStore, hour: u32) -> (i64, PathBuf) {
        let path = store.new_recording_path(at(hour)).unwrap();
        std::fs::write(&path, b"RIFF").unwrap();
        let id = store
            .insert(&NewRecording {
                file_path: path.clone(),
                duration: Duration::from_millis(1_500),
                created_at: at(hour),
                file_size: 4,
            })
            .unwrap();
        (id, path)
    }

    #[test]
    fn test_file_name_format() {
        assert_eq!(recording_file_name(at(9)), "Recording_20260504_093000.wav");
    }

    #[test]
    fn test_insert_and_get() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::new(dir.path());
        let (id, path) = save(&mut store, 10);

        let recording = store.get(id).unwrap().unwrap();
        assert_eq!(recording.file_name, "Recording_20260504_103000.wav");
        assert_eq!(recording.file_path, path);
        assert_eq!(recording.duration, Duration::from_millis(1_500));
        assert_eq!(recording.created_at, at(10));
        assert!(store.get(id + 100).unwrap().is_none());
    }

    #[test]
    fn test_list_is_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::new(dir.path());
        save(&mut store, 8);
        save(&mut store, 12);
        save(&mut store, 10);

        let hours: Vec<String> = store
            .list()
            .unwrap()
            .iter()
            .map(|r| r.created_at.format("%H").to_string())
            .collect();
        assert_eq!(hours, vec!["12", "10", "08"]);
        assert_eq!(
            store.nth_newest(2).unwrap().unwrap().created_at,
            at(10)
        );
        assert!(store.nth_newest(0).unwrap().is_none());
        assert!(store.nth_newest(4).unwrap().is_none());
    }

    #[test]
    fn test_delete_removes_row_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::new(dir.path());
        let (id, path) = save(&mut store, 11);

        assert!(store.delete(id).unwrap());
        assert!(!path.exists());
        assert!(store.list().unwrap().is_empty());
        assert!(!store.delete(id).unwrap());
    }

    #[test]
    fn test_delete_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = RecordingStore::new(dir.path());
        let (id, path) = save(&mut store, 11);
        std::fs::remove_file(&path).unwrap();

        assert!(store.delete(id).unwrap());
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(format_duration(Duration::from_secs(75)), "1:15");
        assert_eq!(format_duration(Duration::from_secs(3_725)), "1:02:05");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2_048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
