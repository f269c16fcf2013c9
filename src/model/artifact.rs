use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::model::{euclidean, nearest_by_softmax, standardize, ModelError};

/// Trained sequence classifier. The label vocabulary is ordered and fixed at
/// training time; index i of `centroids` belongs to `labels[i]`. Immutable
/// once written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    pub labels: Vec<String>,
    pub time_steps: usize,
    pub num_channels: usize,
    pub feature_mean: Vec<f32>,
    pub feature_std: Vec<f32>,
    pub centroids: Vec<Vec<f32>>,
}

/// Outcome of classifying one window.
#[derive(Clone, Debug)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

impl TrainedModel {
    pub fn feature_len(&self) -> usize {
        self.time_steps * self.num_channels
    }

    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let len = self.feature_len();
        if self.labels.is_empty() || self.labels.len() != self.centroids.len() {
            return Err(ModelError::CorruptArtifact(
                "label vocabulary and centroids disagree".into(),
            ));
        }
        if self.feature_mean.len() != len || self.feature_std.len() != len {
            return Err(ModelError::CorruptArtifact(
                "standardization stats do not match the feature length".into(),
            ));
        }
        if self.centroids.iter().any(|c| c.len() != len) {
            return Err(ModelError::CorruptArtifact(
                "centroid length does not match the feature length".into(),
            ));
        }
        Ok(())
    }

    /// Classifies one flattened window in the float path.
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
            .map(|c| euclidean(&standardized, c))
            .collect();
        let (index, confidence) = nearest_by_softmax(&distances);
        Ok(Prediction {
            index,
            label: self.labels[index].clone(),
            confidence,
        })
    }

    pub fn save_json_path(&self, path: impl AsRef<Path>) -> Result<(), ModelError> {
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn load_json_path(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let file = BufReader::new(File::open(path)?);
        let model: Self = serde_json::from_reader(file)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_model() -> TrainedModel {
        TrainedModel {
            labels: vec!["A".into(), "B".into()],
            time_steps: 2,
            num_channels: 5,
            feature_mean: vec![0.0; 10],
            feature_std: vec![1.0; 10],
            centroids: vec![vec![0.0; 10], vec![1.0; 10]],
        }
    }

    #[test]
    fn classify_picks_the_nearest_centroid() {
        let model = tiny_model();
        let near_b = vec![0.9; 10];
        let prediction = model.classify(&near_b).unwrap();
        assert_eq!(prediction.label, "B");
        assert!(prediction.confidence > 0.5);
    }

    #[test]
    fn wrong_arity_is_a_feature_mismatch() {
        let model = tiny_model();
        assert!(matches!(
            model.classify(&[0.0; 3]),
            Err(ModelError::FeatureMismatch {
                expected: 10,
                actual: 3
            })
        ));
    }

    #[test]
    fn json_round_trip() {
        let model = tiny_model();
        let path = std::env::temp_dir().join(format!("stepsign-model-{}.json", std::process::id()));
        model.save_json_path(&path).unwrap();
        let back = TrainedModel::load_json_path(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(model, back);
    }

    #[test]
    fn corrupt_artifact_is_rejected() {
        let mut model = tiny_model();
        model.centroids.pop();
        assert!(model.validate().is_err());
    }
}
