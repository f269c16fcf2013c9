use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::dataset::Dataset;
use crate::model::artifact::TrainedModel;
use crate::model::window::{WindowBuilder, DEFAULT_TIME_STEPS};
use crate::model::{standardize, ModelError};
use crate::signal::NUM_CHANNELS;

#[derive(Clone, Copy, Debug)]
pub struct TrainerConfig {
    pub time_steps: usize,
    /// Fraction of windows held out per label for the accuracy report.
    pub test_fraction: f64,
    pub split_seed: u64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            time_steps: DEFAULT_TIME_STEPS,
            test_fraction: 0.2,
            split_seed: 42,
        }
    }
}

/// Model plus the training-run bookkeeping the trainer binary reports.
#[derive(Clone, Debug)]
pub struct TrainingReport {
    pub model: TrainedModel,
    pub windows_total: usize,
    pub train_windows: usize,
    pub test_windows: usize,
    pub test_accuracy: Option<f32>,
}

/// Fits a nearest-centroid sequence classifier over the dataset's windows.
/// The label vocabulary is the sorted set of labels present; feature stats
/// and centroids are computed on the training split only.
pub fn train(dataset: &Dataset, config: &TrainerConfig) -> Result<TrainingReport, ModelError> {
    if !(0.0..1.0).contains(&config.test_fraction) {
        return Err(ModelError::InvalidSplitFraction(config.test_fraction));
    }
    let builder = WindowBuilder::new(config.time_steps)?;
    let feature_len = builder.feature_len();

    let mut features: Vec<Vec<f32>> = Vec::new();
    let mut labels: Vec<&str> = Vec::new();
    for sample in dataset.samples() {
        for window in builder.windows(sample) {
            features.push(window.features());
            labels.push(sample.label.label());
        }
    }
    if features.is_empty() {
        return Err(ModelError::EmptyTrainingSet {
            time_steps: config.time_steps,
        });
    }

    let vocab: Vec<String> = labels
        .iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_owned)
        .collect();

    // Stratified hold-out split so every label lands in both partitions.
    let mut rng = StdRng::seed_from_u64(config.split_seed);
    let mut train_idx: Vec<usize> = Vec::new();
    let mut test_idx: Vec<usize> = Vec::new();
    for label in &vocab {
        let mut indices: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == label).collect();
        indices.shuffle(&mut rng);
        let held_out = (indices.len() as f64 * config.test_fraction).floor() as usize;
        test_idx.extend_from_slice(&indices[..held_out]);
        train_idx.extend_from_slice(&indices[held_out..]);
    }

    let mut mean = vec![0.0f64; feature_len];
    for &i in &train_idx {
        for (slot, &v) in mean.iter_mut().zip(&features[i]) {
            *slot += v as f64;
        }
    }
    let n = train_idx.len() as f64;
    for slot in &mut mean {
        *slot /= n;
    }
    let mut variance = vec![0.0f64; feature_len];
    for &i in &train_idx {
        for (slot, (&v, &m)) in variance.iter_mut().zip(features[i].iter().zip(&mean)) {
            let diff = v as f64 - m;
            *slot += diff * diff;
        }
    }
    let feature_mean: Vec<f32> = mean.iter().map(|&m| m as f32).collect();
    let feature_std: Vec<f32> = variance
        .iter()
        .map(|&v| ((v / n).sqrt() as f32).max(1e-6))
        .collect();

    let mut centroids = vec![vec![0.0f32; feature_len]; vocab.len()];
    let mut counts = vec![0usize; vocab.len()];
    for &i in &train_idx {
        let class = vocab
            .iter()
            .position(|l| l == labels[i])
            .ok_or_else(|| ModelError::CorruptArtifact("label missing from vocabulary".into()))?;
        let standardized = standardize(&features[i], &feature_mean, &feature_std);
        for (slot, v) in centroids[class].iter_mut().zip(standardized) {
            *slot += v;
        }
        counts[class] += 1;
    }
    for (centroid, &count) in centroids.iter_mut().zip(&counts) {
        if count > 0 {
            for slot in centroid.iter_mut() {
                *slot /= count as f32;
            }
        }
    }

    let model = TrainedModel {
        labels: vocab,
        time_steps: config.time_steps,
        num_channels: NUM_CHANNELS,
        feature_mean,
        feature_std,
        centroids,
    };
    model.validate()?;

    let test_accuracy = if test_idx.is_empty() {
        None
    } else {
        let mut correct = 0usize;
        for &i in &test_idx {
            let prediction = model.classify(&features[i])?;
            if prediction.label == labels[i] {
                correct += 1;
            }
        }
        Some(correct as f32 / test_idx.len() as f32)
    };

    Ok(TrainingReport {
        windows_total: features.len(),
        train_windows: train_idx.len(),
        test_windows: test_idx.len(),
        test_accuracy,
        model,
    })
}

/// Small all-classes dataset shared by the model-layer tests.
#[cfg(test)]
pub(crate) fn synthetic_dataset(samples_per_gesture: usize) -> Dataset {
    use crate::dataset::GestureSample;
    use crate::signal::{GestureKind, SynthesisConfig, Synthesizer};
    let synth = Synthesizer::new(SynthesisConfig::default()).unwrap();
    let mut dataset = Dataset::new();
    for kind in GestureKind::ALL {
        for i in 0..samples_per_gesture {
            let seed = (i as u64) * 31 + kind.label().len() as u64;
            let trace = synth.synthesize(kind, 1.2, seed).unwrap();
            let sample = GestureSample::from_trace(format!("{}_{i}", kind.label()), kind, &trace);
            dataset.push(sample).unwrap();
        }
    }
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::GestureSample;
    use crate::signal::{GestureKind, SynthesisConfig, Synthesizer};

    #[test]
    fn vocabulary_is_sorted_and_complete() {
        let report = train(&synthetic_dataset(4), &TrainerConfig::default()).unwrap();
        assert_eq!(
            report.model.labels,
            vec!["DOUBLE_TAP", "HEEL_PRESS", "REST", "TAP_LONG", "TAP_SHORT"]
        );
    }

    #[test]
    fn holdout_accuracy_is_high_on_synthetic_gestures() {
        let report = train(&synthetic_dataset(4), &TrainerConfig::default()).unwrap();
        assert_eq!(report.windows_total, 5 * 4 * 21);
        assert!(report.test_windows > 0);
        let accuracy = report.test_accuracy.unwrap();
        assert!(accuracy > 0.9, "accuracy was {accuracy}");
    }

    #[test]
    fn unseen_sample_is_classified_correctly() {
        let report = train(&synthetic_dataset(4), &TrainerConfig::default()).unwrap();
        let synth = Synthesizer::new(SynthesisConfig::default()).unwrap();
        let trace = synth.synthesize(GestureKind::HeelPress, 1.2, 9999).unwrap();
        let sample = GestureSample::from_trace("fresh", GestureKind::HeelPress, &trace);
        let builder = WindowBuilder::new(report.model.time_steps).unwrap();
        let window = builder.windows(&sample).next().unwrap();
        let prediction = report.model.classify(&window.features()).unwrap();
        assert_eq!(prediction.label, "HEEL_PRESS");
    }

    #[test]
    fn all_samples_too_short_is_an_empty_training_set() {
        let synth = Synthesizer::new(SynthesisConfig::default()).unwrap();
        let mut dataset = Dataset::new();
        let trace = synth.synthesize(GestureKind::Rest, 0.5, 1).unwrap();
        dataset
            .push(GestureSample::from_trace("REST_0", GestureKind::Rest, &trace))
            .unwrap();
        assert!(matches!(
            train(&dataset, &TrainerConfig::default()),
            Err(ModelError::EmptyTrainingSet { time_steps: 100 })
        ));
    }

    #[test]
    fn bad_split_fraction_is_rejected() {
        let config = TrainerConfig {
            test_fraction: 1.0,
            ..TrainerConfig::default()
        };
        assert!(matches!(
            train(&synthetic_dataset(1), &config),
            Err(ModelError::InvalidSplitFraction(_))
        ));
    }
}
