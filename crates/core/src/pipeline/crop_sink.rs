use crate::shared::frame::Frame;

/// Injectable side effect invoked once per collected face crop.
///
/// This is the debug-preview seam: interactive runs plug in a sink that
/// shows or saves each crop, headless runs use [`NullCropSink`]. Output
/// correctness never depends on what a sink does.
pub trait CropSink: Send {
    fn publish(&mut self, crop: &Frame, label_id: u32) -> Result<(), Box<dyn std::error::Error>>;
}

/// Sink that discards every crop; the default for headless execution.
pub struct NullCropSink;

impl CropSink for NullCropSink {
    fn publish(&mut self, _crop: &Frame, _label_id: u32) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
