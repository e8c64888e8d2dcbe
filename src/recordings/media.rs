use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::db::Recording;

/// Where downloaded recording media lives.
pub trait MediaStore {
    /// Remove everything stored for `recording`. Nothing stored is not an error.
    fn erase(&self, recording: &Recording) -> Result<()>;
}

/// Media kept under `<root>/<recording_id>`, either a file or a directory.
pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a recording, or `None` when the id cannot be a single
    /// path component.
    pub fn path_for(&self, recording_id: &str) -> Option<PathBuf> {
        let valid = !recording_id.is_empty()
            && recording_id != "."
            && recording_id != ".."
            && !recording_id.contains(['/', '\\', '\0']);
        valid.then(|| self.root.join(recording_id))
    }
}

impl MediaStore for LocalMediaStore {
    fn erase(&self, recording: &Recording) -> Result<()> {
        let Some(path) = self.path_for(&recording.recording_id) else {
            debug!(
                "Recording id {:?} has no media path",
                recording.recording_id
            );
            return Ok(());
        };

        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to inspect {}", path.display()))
            }
        };

        if metadata.is_dir() {
            std::fs::remove_dir_all(&path)
        } else {
            std::fs::remove_file(&path)
        }
        .with_context(|| format!("Failed to remove media at {}", path.display()))?;

        debug!("Removed media at {}", path.display());
        Ok(())
    }
}
