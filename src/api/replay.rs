use std::{fs, path::PathBuf};

use crate::RaceEngineerError;

use super::{FetchError, Query, RaceDataSource, SessionKey};

/// Serves previously saved API responses from disk.
///
/// A query for `laps` of session `9158` reads `<dir>/9158/laps.json` when it exists and
/// `<dir>/laps.json` otherwise. Extra filters are not applied.
pub struct ReplaySource {
    dir: PathBuf,
    label: String,
}

impl ReplaySource {
    pub fn new(dir: PathBuf) -> Result<Self, RaceEngineerError> {
        if !dir.is_dir() {
            return Err(RaceEngineerError::MissingReplayDir {
                path: format!("{:?}", dir),
            });
        }
        let label = format!("file://{}", dir.display());
        Ok(Self { dir, label })
    }

    fn file_for(&self, query: &Query) -> PathBuf {
        let file_name = format!("{}.json", query.resource);
        if let Some(SessionKey::Key(key)) = &query.session {
            let per_session = self.dir.join(key.to_string()).join(&file_name);
            if per_session.exists() {
                return per_session;
            }
        }
        self.dir.join(file_name)
    }
}

impl RaceDataSource for ReplaySource {
    fn base_url(&self) -> &str {
        &self.label
    }

    fn get(&self, query: &Query) -> Result<String, FetchError> {
        fs::read_to_string(self.file_for(query)).map_err(|e| FetchError::Replay { source: e })
    }
}
