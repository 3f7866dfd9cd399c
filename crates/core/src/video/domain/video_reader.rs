use std::path::Path;

use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Decodes frames from one training video at a time.
///
/// The sequence produced by [`frames`](VideoReader::frames) is finite,
/// forward-only and non-restartable; callers must invoke
/// [`close`](VideoReader::close) once per opened file, on every exit path,
/// to release decoder resources before the next `open`.
pub trait VideoReader: Send {
    /// Opens a video container and returns its metadata.
    fn open(&mut self, path: &Path) -> Result<VideoMetadata, Box<dyn std::error::Error>>;

    /// Returns a lazy iterator over frames in decode order.
    fn frames(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<Frame, Box<dyn std::error::Error>>> + '_>;

    /// Releases any resources held for the currently opened file.
    fn close(&mut self);
}
