use std::path::Path;

use crate::dataset::domain::label_allocator::LabelAllocator;
use crate::dataset::infrastructure::video_walker::{TrainingVideo, VideoWalker};
use crate::detection::domain::face_detector::FaceDetector;
use crate::pipeline::crop_sink::CropSink;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::training::domain::recognizer_trainer::RecognizerTrainer;
use crate::training::domain::training_set::TrainingSet;
use crate::video::domain::video_reader::VideoReader;

/// Counters describing what one training run saw and produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrainingReport {
    pub videos_found: usize,
    pub videos_skipped: usize,
    pub frames_decoded: usize,
    pub samples_collected: usize,
    pub labels_assigned: usize,
}

/// Orchestrates the whole training pipeline: walk the dataset, decode each
/// video, detect faces per frame, collect verbatim crops, fit the
/// recognizer, and persist the model plus its label table.
///
/// Strictly sequential; the only mutable state is the training set and the
/// label allocator, both owned by `execute` for its duration. Skipping
/// rules follow the error taxonomy: a bad root is fatal up front, a bad
/// video is skipped, a faceless frame contributes nothing, and an empty
/// training set fails at the trainer before any file is written.
pub struct TrainRecognizerUseCase {
    reader: Box<dyn VideoReader>,
    detector: Box<dyn FaceDetector>,
    trainer: Box<dyn RecognizerTrainer>,
    crop_sink: Box<dyn CropSink>,
    logger: Box<dyn PipelineLogger>,
}

impl TrainRecognizerUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        detector: Box<dyn FaceDetector>,
        trainer: Box<dyn RecognizerTrainer>,
        crop_sink: Box<dyn CropSink>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            reader,
            detector,
            trainer,
            crop_sink,
            logger,
        }
    }

    pub fn execute(
        &mut self,
        data_root: &Path,
        model_path: &Path,
        labels_path: &Path,
    ) -> Result<TrainingReport, Box<dyn std::error::Error>> {
        let videos = VideoWalker::new(data_root).collect()?;

        let mut allocator = LabelAllocator::new();
        let mut training_set = TrainingSet::new();
        let mut report = TrainingReport {
            videos_found: videos.len(),
            ..TrainingReport::default()
        };

        for (i, video) in videos.iter().enumerate() {
            self.logger.progress(i + 1, videos.len());

            if let Err(e) = self.reader.open(&video.path) {
                log::warn!("cannot open {}: {e}", video.path.display());
                self.logger.video_skipped(&video.path, "unreadable");
                report.videos_skipped += 1;
                continue;
            }

            let collected = collect_from_video(
                &mut *self.reader,
                &mut *self.detector,
                &mut *self.crop_sink,
                &mut *self.logger,
                video,
                &mut allocator,
                &mut training_set,
                &mut report,
            );
            // Decoder resources go back before the next file, even when a
            // collaborator failed mid-video.
            self.reader.close();
            collected?;
        }

        report.labels_assigned = allocator.len();
        report.samples_collected = training_set.len();
        self.logger.metric("samples", training_set.len() as f64);
        self.logger.info(&format!(
            "collected {} samples across {} labels",
            training_set.len(),
            allocator.len()
        ));

        let model = self.trainer.train(&training_set)?;
        model.save(model_path)?;
        allocator.to_table().save(labels_path)?;

        self.logger.summary();
        Ok(report)
    }
}

/// Decodes one opened video and appends every detected face crop.
///
/// The label ID is allocated on the first decoded frame, so a video that
/// yields nothing never grows the label table. A decode error ends this
/// video's stream; a detector or sink error aborts the run.
#[allow(clippy::too_many_arguments)]
fn collect_from_video(
    reader: &mut dyn VideoReader,
    detector: &mut dyn FaceDetector,
    crop_sink: &mut dyn CropSink,
    logger: &mut dyn PipelineLogger,
    video: &TrainingVideo,
    allocator: &mut LabelAllocator,
    training_set: &mut TrainingSet,
    report: &mut TrainingReport,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut label_id: Option<u32> = None;
    let mut frames_in_video = 0usize;
    let mut faces_in_video = 0usize;

    for item in reader.frames() {
        let frame = match item {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("decode error in {}: {e}", video.path.display());
                break;
            }
        };
        frames_in_video += 1;

        let id = *label_id.get_or_insert_with(|| allocator.allocate(&video.label));

        let gray = frame.to_grayscale();
        let boxes = detector.detect(&gray)?;
        logger.metric("faces_per_frame", boxes.len() as f64);

        for face in &boxes {
            let Some(visible) = face.clamp_to(gray.width(), gray.height()) else {
                continue;
            };
            let crop = gray.crop(
                visible.x as u32,
                visible.y as u32,
                visible.width as u32,
                visible.height as u32,
            );
            crop_sink.publish(&crop, id)?;
            training_set.push(crop, id);
            faces_in_video += 1;
        }
    }

    report.frames_decoded += frames_in_video;
    if frames_in_video == 0 {
        report.videos_skipped += 1;
        logger.video_skipped(&video.path, "no decodable frames");
    }
    log::debug!(
        "{}: {frames_in_video} frames, {faces_in_video} faces",
        video.path.display()
    );
    Ok(())
}
