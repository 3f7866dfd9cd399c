//! ArcFace embedding trainer using ONNX Runtime.
//!
//! Each grayscale face crop is pushed through a pretrained embedding model;
//! the trained artifact is one L2-normalized centroid per label ID, which an
//! inference tool matches against by cosine similarity.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::shared::frame::Frame;
use crate::training::domain::recognizer_trainer::{RecognizerModel, RecognizerTrainer};
use crate::training::domain::training_set::TrainingSet;

/// Embedding model input resolution.
const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct OnnxEmbeddingTrainer {
    session: ort::session::Session,
}

impl OnnxEmbeddingTrainer {
    pub fn new(model_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let intra_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let session = ort::session::Session::builder()?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)?
            .with_inter_threads(1)?
            .with_intra_threads(intra_threads)?
            .commit_from_file(model_path)?;
        Ok(Self { session })
    }

    fn embed(&mut self, crop: &Frame) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

impl RecognizerTrainer for OnnxEmbeddingTrainer {
    fn train(
        &mut self,
        set: &TrainingSet,
    ) -> Result<Box<dyn RecognizerModel>, Box<dyn std::error::Error>> {
        if set.is_empty() {
            return Err("training set is empty: no faces were collected".into());
        }

        let embeddings = set
            .images()
            .iter()
            .map(|crop| self.embed(crop))
            .collect::<Result<Vec<_>, _>>()?;

        let classes = centroids(&embeddings, set.label_ids());
        let embedding_dim = embeddings[0].len();

        Ok(Box::new(EmbeddingModel {
            embedding_dim,
            classes,
        }))
    }
}

/// One recognized class: the normalized mean embedding of all samples that
/// carried `label_id`, plus how many samples contributed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassCentroid {
    pub label_id: u32,
    pub sample_count: usize,
    pub centroid: Vec<f32>,
}

/// The trainer's artifact, serialized as JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingModel {
    pub embedding_dim: usize,
    pub classes: Vec<ClassCentroid>,
}

impl EmbeddingModel {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl RecognizerModel for EmbeddingModel {
    fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Averages embeddings per label ID and renormalizes each mean.
///
/// Classes come out sorted by label ID; labels with no samples simply have
/// no centroid.
fn centroids(embeddings: &[Vec<f32>], label_ids: &[u32]) -> Vec<ClassCentroid> {
    debug_assert_eq!(embeddings.len(), label_ids.len());

    let mut ids: Vec<u32> = label_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();

    ids.into_iter()
        .map(|label_id| {
            let members: Vec<&Vec<f32>> = embeddings
                .iter()
                .zip(label_ids)
                .filter(|(_, &id)| id == label_id)
                .map(|(e, _)| e)
                .collect();

            let dim = members[0].len();
            let mut centroid = vec![0.0f32; dim];
            for e in &members {
                for (acc, v) in centroid.iter_mut().zip(e.iter()) {
                    *acc += v;
                }
            }
            for v in centroid.iter_mut() {
                *v /= members.len() as f32;
            }
            l2_normalize(&mut centroid);

            ClassCentroid {
                label_id,
                sample_count: members.len(),
                centroid,
            }
        })
        .collect()
}

pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Resize crop to 112x112 (nearest-center sampling), replicate the gray
/// channel into RGB, normalize, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let gray = crop.to_grayscale();
    let src_w = gray.width() as usize;
    let src_h = gray.height() as usize;
    let data = gray.data();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let v = (data[src_y * src_w + src_x] as f32 - NORM_MEAN) / NORM_STD;
            for c in 0..3 {
                tensor[[0, c, y, x]] = v;
            }
        }
    }

    tensor
}
