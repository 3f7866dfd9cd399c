use std::path::PathBuf;
use std::process;

use clap::Parser;

use facetrain_core::detection::domain::face_detector::{DetectorOptions, FaceDetector};
use facetrain_core::detection::infrastructure::model_resolver;
use facetrain_core::detection::infrastructure::onnx_pyramid_detector::OnnxPyramidDetector;
use facetrain_core::pipeline::crop_sink::{CropSink, NullCropSink};
use facetrain_core::pipeline::infrastructure::image_crop_sink::ImageCropSink;
use facetrain_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use facetrain_core::pipeline::train_recognizer_use_case::TrainRecognizerUseCase;
use facetrain_core::shared::constants::{
    DEFAULT_DATA_DIR, DEFAULT_LABELS_PATH, DEFAULT_MODEL_PATH, DETECTOR_MODEL_NAME,
    DETECTOR_MODEL_URL, EMBEDDING_MODEL_NAME, EMBEDDING_MODEL_URL,
};
use facetrain_core::training::domain::recognizer_trainer::RecognizerTrainer;
use facetrain_core::training::infrastructure::embedding_trainer::OnnxEmbeddingTrainer;
use facetrain_core::video::infrastructure::ffmpeg_reader::FfmpegReader;

/// Trains a face recognizer from a directory of labeled videos.
///
/// Each immediate subdirectory name becomes a person label; every face
/// found in that subdirectory's videos becomes a training sample.
#[derive(Parser)]
#[command(name = "facetrain")]
struct Cli {
    /// Root directory of training videos.
    #[arg(default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    /// Output path for the trained recognizer model.
    #[arg(long, default_value = DEFAULT_MODEL_PATH)]
    model_out: PathBuf,

    /// Output path for the label table (label name to integer ID).
    #[arg(long, default_value = DEFAULT_LABELS_PATH)]
    labels_out: PathBuf,

    /// Detection pyramid step between passes (must be greater than 1.0).
    #[arg(long, default_value = "1.1")]
    scale_factor: f64,

    /// Overlapping candidate detections required to confirm a face.
    #[arg(long, default_value = "5")]
    min_neighbors: u32,

    /// Face detection confidence threshold (0.0-1.0).
    #[arg(long, default_value = "0.5")]
    confidence: f64,

    /// Save every collected face crop to this directory (debug preview).
    #[arg(long)]
    preview_dir: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let detector = build_detector(&cli)?;
    let trainer = build_trainer()?;
    let crop_sink: Box<dyn CropSink> = match &cli.preview_dir {
        Some(dir) => Box::new(ImageCropSink::new(dir)),
        None => Box::new(NullCropSink),
    };

    let mut use_case = TrainRecognizerUseCase::new(
        Box::new(FfmpegReader::new()),
        detector,
        trainer,
        crop_sink,
        Box::new(StdoutPipelineLogger::default()),
    );

    let report = use_case.execute(&cli.data_dir, &cli.model_out, &cli.labels_out)?;

    log::info!(
        "Trained {} labels from {} samples ({} videos, {} skipped)",
        report.labels_assigned,
        report.samples_collected,
        report.videos_found,
        report.videos_skipped
    );
    log::info!("Model written to {}", cli.model_out.display());
    log::info!("Label table written to {}", cli.labels_out.display());
    Ok(())
}

fn build_detector(cli: &Cli) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {DETECTOR_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        DETECTOR_MODEL_NAME,
        DETECTOR_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    let options = DetectorOptions {
        scale_factor: cli.scale_factor,
        min_neighbors: cli.min_neighbors,
    };
    Ok(Box::new(OnnxPyramidDetector::new(
        &model_path,
        options,
        cli.confidence,
    )?))
}

fn build_trainer() -> Result<Box<dyn RecognizerTrainer>, Box<dyn std::error::Error>> {
    log::info!("Resolving model: {EMBEDDING_MODEL_NAME}");
    let model_path = model_resolver::resolve(
        EMBEDDING_MODEL_NAME,
        EMBEDDING_MODEL_URL,
        None,
        Some(Box::new(download_progress)),
    )?;
    eprintln!();

    Ok(Box::new(OnnxEmbeddingTrainer::new(&model_path)?))
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.data_dir.exists() {
        return Err(format!("Training directory not found: {}", cli.data_dir.display()).into());
    }
    if cli.scale_factor <= 1.0 {
        return Err(format!(
            "Scale factor must be greater than 1.0, got {}",
            cli.scale_factor
        )
        .into());
    }
    if !(0.0..=1.0).contains(&cli.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            cli.confidence
        )
        .into());
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading model... {pct}%");
    } else {
        eprint!("\rDownloading model... {downloaded} bytes");
    }
}
