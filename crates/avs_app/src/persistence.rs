//! File-backed stores under the data directory.
//!
//! - `profiles.csv`: registered travelers, one row each.
//! - `office.ron`: the office record and document sequence counter.
//! - `sessions/<id>.ron`: pending URLs, last aggregation and trip per session.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use avs_core::{
    AggregationResult, OfficeConfig, OfficeConfigStore, SessionStore, StoreError,
    TravelerProfile, TripMetadata,
};
use avs_engine::{session_filename, AtomicFileWriter, PersistError};
use avs_logging::{avs_debug, avs_info, avs_warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const PROFILES_FILENAME: &str = "profiles.csv";
pub const OFFICE_FILENAME: &str = "office.ron";
pub const SESSIONS_DIR: &str = "sessions";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct PersistedSession {
    pending_urls: Vec<String>,
    aggregation: Option<AggregationResult>,
    trip: Option<TripMetadata>,
}

/// Session state kept in one RON file per session id. Every mutation is
/// written through immediately.
#[derive(Debug)]
pub struct FileSessionStore {
    writer: AtomicFileWriter,
    filename: String,
    state: PersistedSession,
}

impl FileSessionStore {
    /// Opens the session, starting empty when no file exists yet.
    pub fn open(data_dir: &Path, session_id: &str) -> Result<Self, StoreError> {
        let dir = data_dir.join(SESSIONS_DIR);
        let filename = session_filename(session_id);
        let state = match read_ron::<PersistedSession>(&dir.join(&filename))? {
            Some(state) => state,
            None => {
                avs_info!("New session {:?}", session_id);
                PersistedSession::default()
            }
        };
        Ok(Self {
            writer: AtomicFileWriter::new(dir),
            filename,
            state,
        })
    }

    pub fn path(&self) -> PathBuf {
        self.writer.dir().join(&self.filename)
    }

    fn flush(&self) -> Result<(), StoreError> {
        write_ron(&self.writer, &self.filename, &self.state)
    }
}

impl SessionStore for FileSessionStore {
    fn pending_urls(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.state.pending_urls.clone())
    }

    fn append_pending_url(&mut self, url: &str) -> Result<(), StoreError> {
        self.state.pending_urls.push(url.to_string());
        self.flush()
    }

    fn clear_pending_urls(&mut self) -> Result<(), StoreError> {
        self.state.pending_urls.clear();
        self.flush()
    }

    fn save_aggregation(&mut self, result: &AggregationResult) -> Result<(), StoreError> {
        self.state.aggregation = Some(result.clone());
        self.flush()
    }

    fn load_aggregation(&self) -> Result<Option<AggregationResult>, StoreError> {
        Ok(self.state.aggregation.clone())
    }

    fn clear_aggregation(&mut self) -> Result<(), StoreError> {
        self.state.aggregation = None;
        self.flush()
    }

    fn save_trip(&mut self, trip: &TripMetadata) -> Result<(), StoreError> {
        self.state.trip = Some(trip.clone());
        self.flush()
    }

    fn load_trip(&self) -> Result<Option<TripMetadata>, StoreError> {
        Ok(self.state.trip.clone())
    }
}

/// The singleton office record in `office.ron`.
#[derive(Debug, Clone)]
pub struct FileOfficeStore {
    writer: AtomicFileWriter,
}

impl FileOfficeStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            writer: AtomicFileWriter::new(data_dir),
        }
    }
}

impl OfficeConfigStore for FileOfficeStore {
    fn load(&self) -> Result<OfficeConfig, StoreError> {
        let path = self.writer.dir().join(OFFICE_FILENAME);
        Ok(read_ron(&path)?.unwrap_or_else(|| {
            avs_warn!("No office configuration at {:?}; using defaults", path);
            OfficeConfig::default()
        }))
    }

    fn save(&mut self, config: &OfficeConfig) -> Result<(), StoreError> {
        write_ron(&self.writer, OFFICE_FILENAME, config)
    }
}

/// Registered travelers in `profiles.csv`, in registration order.
#[derive(Debug, Clone)]
pub struct ProfileFile {
    writer: AtomicFileWriter,
}

impl ProfileFile {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            writer: AtomicFileWriter::new(data_dir),
        }
    }

    fn path(&self) -> PathBuf {
        self.writer.dir().join(PROFILES_FILENAME)
    }

    pub fn load(&self) -> Result<Vec<TravelerProfile>, StoreError> {
        let path = self.path();
        let mut reader = match csv::Reader::from_path(&path) {
            Ok(reader) => reader,
            Err(err) if is_not_found(&err) => return Ok(Vec::new()),
            Err(err) => return Err(corrupt(&path, err)),
        };
        reader
            .deserialize()
            .collect::<Result<Vec<TravelerProfile>, _>>()
            .map_err(|err| corrupt(&path, err))
    }

    /// Appends a profile and returns its index.
    pub fn add(&self, profile: TravelerProfile) -> Result<usize, StoreError> {
        let mut profiles = self.load()?;
        profiles.push(profile);

        let mut csv_writer = csv::Writer::from_writer(Vec::new());
        for profile in &profiles {
            csv_writer
                .serialize(profile)
                .map_err(|err| corrupt(&self.path(), err))?;
        }
        let bytes = csv_writer
            .into_inner()
            .map_err(|err| StoreError::Other(err.to_string()))?;
        self.writer
            .write(PROFILES_FILENAME, &bytes)
            .map_err(persist_error)?;
        avs_info!("Registered profile #{}", profiles.len() - 1);
        Ok(profiles.len() - 1)
    }
}

fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StoreError::Io(err)),
    };
    let value = ron::from_str(&content).map_err(|err| corrupt(path, err))?;
    avs_debug!("Loaded {:?}", path);
    Ok(Some(value))
}

fn write_ron<T: Serialize>(
    writer: &AtomicFileWriter,
    filename: &str,
    value: &T,
) -> Result<(), StoreError> {
    let pretty = ron::ser::PrettyConfig::new();
    let content = ron::ser::to_string_pretty(value, pretty)
        .map_err(|err| StoreError::Other(format!("failed to serialize {filename}: {err}")))?;
    writer.write_str(filename, &content).map_err(persist_error)?;
    Ok(())
}

fn persist_error(err: PersistError) -> StoreError {
    match err {
        PersistError::Io(err) => StoreError::Io(err),
        other => StoreError::Other(other.to_string()),
    }
}

fn corrupt(path: &Path, err: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt {
        location: path.display().to_string(),
        message: err.to_string(),
    }
}

fn is_not_found(err: &csv::Error) -> bool {
    matches!(err.kind(), csv::ErrorKind::Io(source) if source.kind() == io::ErrorKind::NotFound)
}
