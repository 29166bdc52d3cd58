use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default location of the extended tracker
pub const DEFAULT_TRACKER_FILE: &str = "tracker-extended.xlsx";

/// Default location of the plain tracker, used when the extended one is missing
pub const DEFAULT_TRACKER_FALLBACK_FILE: &str = "tracker.xlsx";

/// None of the tracker candidate files exist.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("tracker file not found, looked for: {}", display_paths(candidates))]
pub struct TrackerNotFoundError {
    /// Paths that were tried, in order
    pub candidates: Vec<PathBuf>,
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| format!("'{}'", p.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolve the tracker file: the extended variant first, then the plain fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerLocator {
    primary: PathBuf,
    fallback: PathBuf,
}

impl TrackerLocator {
    /// TrackerLocator factory
    pub fn new<P: Into<PathBuf>, F: Into<PathBuf>>(primary: P, fallback: F) -> Self {
        Self {
            primary: primary.into(),
            fallback: fallback.into(),
        }
    }

    /// First candidate that exists on disk.
    ///
    /// A missing tracker is never treated as an empty one.
    pub fn locate(&self) -> Result<&Path, TrackerNotFoundError> {
        [&self.primary, &self.fallback]
            .into_iter()
            .find(|path| path.is_file())
            .map(PathBuf::as_path)
            .ok_or_else(|| TrackerNotFoundError {
                candidates: vec![self.primary.clone(), self.fallback.clone()],
            })
    }
}

impl Default for TrackerLocator {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKER_FILE, DEFAULT_TRACKER_FALLBACK_FILE)
    }
}
