use std::path::PathBuf;

/// Container-level properties of an opened training video.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    /// Declared frame count; 0 when the container does not report one.
    pub total_frames: usize,
    pub source_path: Option<PathBuf>,
}
