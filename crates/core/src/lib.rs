//! Face-recognizer training pipeline.
//!
//! Walks a directory of labeled training videos, extracts face crops with a
//! pretrained detector, fits a recognizer over the collected samples, and
//! persists the trained model together with its label table.

pub mod dataset;
pub mod detection;
pub mod pipeline;
pub mod shared;
pub mod training;
pub mod video;
