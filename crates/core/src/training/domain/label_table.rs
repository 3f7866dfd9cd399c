use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelTableError {
    #[error("failed to access label table at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("label table serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// The persisted mapping from label string to integer ID.
///
/// Written once per run (fully overwriting any previous table) and loaded
/// at inference time to translate the recognizer's integer output back into
/// a human-readable label.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTable {
    labels: HashMap<String, u32>,
}

impl LabelTable {
    pub fn new(labels: HashMap<String, u32>) -> Self {
        Self { labels }
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.labels.get(label).copied()
    }

    /// Reverse lookup used at inference time.
    pub fn label_for(&self, id: u32) -> Option<&str> {
        self.labels
            .iter()
            .find(|(_, &v)| v == id)
            .map(|(k, _)| k.as_str())
    }

    pub fn labels(&self) -> &HashMap<String, u32> {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn save(&self, path: &Path) -> Result<(), LabelTableError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| LabelTableError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn load(path: &Path) -> Result<Self, LabelTableError> {
        let json = fs::read_to_string(path).map_err(|e| LabelTableError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(serde_json::from_str(&json)?)
    }
}
