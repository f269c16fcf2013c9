use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::model::artifact::{Prediction, TrainedModel};
use crate::model::{euclidean, nearest_by_softmax, standardize, ModelError};

/// Device-deployable artifact: the trained centroids squeezed to u8 with one
/// affine (scale, zero_point) pair. Standardization stats stay in float; they
/// are tiny next to the centroid tensor.
#[derive(Clone, Debug, PartialEq)]
pub struct QuantizedModel {
    pub labels: Vec<String>,
    pub time_steps: usize,
    pub num_channels: usize,
    pub feature_mean: Vec<f32>,
    pub feature_std: Vec<f32>,
    pub scale: f32,
    pub zero_point: u8,
    pub centroids: Vec<Vec<u8>>,
}

/// On-disk layout; centroid bytes travel base64-encoded.
#[derive(Serialize, Deserialize)]
struct QuantizedModelFile {
    labels: Vec<String>,
    time_steps: usize,
    num_channels: usize,
    feature_mean: Vec<f32>,
    feature_std: Vec<f32>,
    scale: f32,
    zero_point: u8,
    centroids_b64: Vec<String>,
}

/// Converts a trained model into the quantized on-device format.
pub fn quantize(model: &TrainedModel) -> Result<QuantizedModel, ModelError> {
    model.validate()?;
    let mut min = 0.0f32;
    let mut max = 0.0f32;
    for centroid in &model.centroids {
        for &v in centroid {
            min = min.min(v);
            max = max.max(v);
        }
    }
    // The range always includes zero so the zero point is representable; a
    // constant tensor still needs a non-degenerate step.
    let scale = if max > min { (max - min) / 255.0 } else { 1.0 };
    let zero_point = (-min / scale).round().clamp(0.0, 255.0) as u8;
    let centroids = model
        .centroids
        .iter()
        .map(|centroid| {
            centroid
                .iter()
                .map(|&v| ((v / scale).round() + f32::from(zero_point)).clamp(0.0, 255.0) as u8)
                .collect()
        })
        .collect();
    Ok(QuantizedModel {
        labels: model.labels.clone(),
        time_steps: model.time_steps,
        num_channels: model.num_channels,
        feature_mean: model.feature_mean.clone(),
        feature_std: model.feature_std.clone(),
        scale,
        zero_point,
        centroids,
    })
}

impl QuantizedModel {
    pub fn feature_len(&self) -> usize {
        self.time_steps * self.num_channels
    }

    pub fn dequantize(&self, q: u8) -> f32 {
        (f32::from(q) - f32::from(self.zero_point)) * self.scale
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let len = self.feature_len();
        if self.labels.is_empty() || self.labels.len() != self.centroids.len() {
            return Err(ModelError::CorruptArtifact(
                "label vocabulary and centroids disagree".into(),
            ));
        }
        if self.feature_mean.len() != len
            || self.feature_std.len() != len
            || self.centroids.iter().any(|c| c.len() != len)
        {
            return Err(ModelError::CorruptArtifact(
                "tensor lengths do not match the feature length".into(),
            ));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ModelError::CorruptArtifact("non-positive scale".into()));
        }
        Ok(())
    }

    /// Classifies one flattened window against the dequantized centroids.
    pub fn classify(&self, features: &[f32]) -> Result<Prediction, ModelError> {
        if features.len() != self.feature_len() {
            return Err(ModelError::FeatureMismatch {
                expected: self.feature_len(),
                actual: features.len(),
            });
        }
        let standardized = standardize(features, &self.feature_mean, &self.feature_std);
        let distances: Vec<f32> = self
            .centroids
            .iter()
            .map(|centroid| {
                let dequantized: Vec<f32> = centroid.iter().map(|&q| self.dequantize(q)).collect();
                euclidean(&standardized, &dequantized)
            })
            .collect();
        let (index, confidence) = nearest_by_softmax(&distances);
        Ok(Prediction {
            index,
            label: self.labels[index].clone(),
            confidence,
        })
    }

    pub fn save_json_path(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let file = QuantizedModelFile {
            labels: self.labels.clone(),
            time_steps: self.time_steps,
            num_channels: self.num_channels,
            feature_mean: self.feature_mean.clone(),
            feature_std: self.feature_std.clone(),
            scale: self.scale,
            zero_point: self.zero_point,
            centroids_b64: self.centroids.iter().map(|c| BASE64.encode(c)).collect(),
        };
        let out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(out, &file)?;
        Ok(())
    }

    pub fn load_json_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let input = BufReader::new(File::open(path)?);
        let file: QuantizedModelFile = serde_json::from_reader(input)?;
        let centroids = file
            .centroids_b64
            .iter()
            .map(|s| {
                BASE64
                    .decode(s)
                    .map_err(|e| ModelError::CorruptArtifact(format!("bad centroid base64: {e}")))
            })
            .collect::<Result<Vec<Vec<u8>>, ModelError>>()?;
        let model = Self {
            labels: file.labels,
            time_steps: file.time_steps,
            num_channels: file.num_channels,
            feature_mean: file.feature_mean,
            feature_std: file.feature_std,
            scale: file.scale,
            zero_point: file.zero_point,
            centroids,
        };
        model.validate()?;
        Ok(model)
    }
}
