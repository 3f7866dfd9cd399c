use std::path::Path;

use crate::training::domain::training_set::TrainingSet;

/// An opaque trained-recognizer artifact.
///
/// The serialization format is owned by the producing trainer; callers only
/// ever persist it and hand the file to inference tooling.
pub trait RecognizerModel {
    fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>>;
}

/// Fits a recognizer over the collected face crops.
///
/// Training consumes the full set at once. An empty set is an error: a run
/// that found no faces must fail before anything is written to disk.
pub trait RecognizerTrainer: Send {
    fn train(
        &mut self,
        set: &TrainingSet,
    ) -> Result<Box<dyn RecognizerModel>, Box<dyn std::error::Error>>;
}
