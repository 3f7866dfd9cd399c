use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::shared::constants::VIDEO_EXTENSIONS;

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("training root not found: {0}")]
    RootNotFound(PathBuf),
    #[error("training root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// A training video discovered under the root, labeled by the lowercased
/// name of its immediate containing directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainingVideo {
    pub path: PathBuf,
    pub label: String,
}

/// Recursively enumerates training videos beneath a root directory.
///
/// Only files whose extension is on the video allow-list are yielded.
/// Traversal is lexicographic by file name, so label IDs derived from the
/// walk order are reproducible across platforms. Entries that cannot be
/// read are skipped; a missing or non-directory root is an error, so a
/// misconfigured run fails before any work happens.
pub struct VideoWalker {
    root: PathBuf,
}

impl VideoWalker {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    pub fn collect(&self) -> Result<Vec<TrainingVideo>, WalkError> {
        if !self.root.exists() {
            return Err(WalkError::RootNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(WalkError::NotADirectory(self.root.clone()));
        }

        let videos = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .flatten() // skip unreadable entries
            .filter(|entry| entry.path().is_file())
            .filter(|entry| has_video_extension(entry.path()))
            .filter_map(|entry| {
                let label = parent_label(entry.path())?;
                Some(TrainingVideo {
                    path: entry.path().to_path_buf(),
                    label,
                })
            })
            .collect();

        Ok(videos)
    }
}

fn has_video_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Lowercased name of the file's immediate containing directory.
fn parent_label(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .map(|name| name.to_lowercase())
}
