pub mod artifact;
pub mod infer;
pub mod quantize;
pub mod trainer;
pub mod window;
pub use artifact::{Prediction, TrainedModel};
pub use infer::{Detection, GestureDetector};
pub use quantize::{quantize, QuantizedModel};
pub use trainer::{train, TrainerConfig, TrainingReport};
pub use window::{Window, WindowBuilder, Windows, DEFAULT_TIME_STEPS};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("window size must be a positive integer")]
    InvalidWindowSize,

    #[error("training set produced no windows (samples need at least {time_steps} readings)")]
    EmptyTrainingSet { time_steps: usize },

    #[error("hold-out fraction must lie in [0, 1) (got {0})")]
    InvalidSplitFraction(f64),

    #[error("feature length mismatch: expected {expected}, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("artifact IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("artifact is corrupt: {0}")]
    CorruptArtifact(String),
}

/// Centers and scales a feature vector with the stats fixed at training time.
pub(crate) fn standardize(features: &[f32], mean: &[f32], std: &[f32]) -> Vec<f32> {
    features
        .iter()
        .zip(mean.iter().zip(std.iter()))
        .map(|(&v, (&m, &s))| (v - m) / s)
        .collect()
}

/// Softmax over negative euclidean distances; returns the winning index and
/// its probability mass.
pub(crate) fn nearest_by_softmax(distances: &[f32]) -> (usize, f32) {
    let min = distances.iter().copied().fold(f32::INFINITY, f32::min);
    let weights: Vec<f32> = distances.iter().map(|&d| (-(d - min)).exp()).collect();
    let total: f32 = weights.iter().sum();
    let mut best = 0;
    for (idx, &w) in weights.iter().enumerate() {
        if w > weights[best] {
            best = idx;
        }
    }
    (best, weights[best] / total)
}

pub(crate) fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
