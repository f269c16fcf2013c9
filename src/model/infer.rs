use std::collections::HashMap;

use crate::dataset::GestureSample;
use crate::model::quantize::QuantizedModel;
use crate::model::window::WindowBuilder;
use crate::model::ModelError;

/// Aggregate verdict over every window of one capture.
#[derive(Clone, Debug)]
pub struct Detection {
    pub label: String,
    pub index: usize,
    /// Mean confidence of the windows that voted for the winner.
    pub confidence: f32,
    pub windows: usize,
    pub votes: usize,
}

/// On-device classifier: slides windows over a live capture and lets each
/// window vote for its nearest class.
pub struct GestureDetector {
    model: QuantizedModel,
    builder: WindowBuilder,
}

impl GestureDetector {
    pub fn new(model: QuantizedModel) -> Result<Self, ModelError> {
        model.validate()?;
        let builder = WindowBuilder::new(model.time_steps)?;
        Ok(Self { model, builder })
    }

    pub fn model(&self) -> &QuantizedModel {
        &self.model
    }

    /// Returns `None` when the capture is shorter than one window.
    pub fn detect(&self, sample: &GestureSample) -> Result<Option<Detection>, ModelError> {
        let mut votes: HashMap<usize, usize> = HashMap::new();
        let mut scores: HashMap<usize, f32> = HashMap::new();
        let mut windows = 0usize;
        for window in self.builder.windows(sample) {
            let prediction = self.model.classify(&window.features())?;
            *votes.entry(prediction.index).or_insert(0) += 1;
            *scores.entry(prediction.index).or_insert(0.0) += prediction.confidence;
            windows += 1;
        }
        if windows == 0 {
            return Ok(None);
        }
        let mut winner: Option<(usize, usize, f32)> = None;
        for (&index, &count) in &votes {
            let score = scores.get(&index).copied().unwrap_or(0.0);
            let better = match winner {
                None => true,
                Some((_, best_count, best_score)) => {
                    count > best_count || (count == best_count && score > best_score)
                }
            };
            if better {
                winner = Some((index, count, score));
            }
        }
        let (index, count, score) = winner
            .ok_or_else(|| ModelError::CorruptArtifact("no window produced a vote".into()))?;
        Ok(Some(Detection {
            label: self.model.labels[index].clone(),
            index,
            confidence: score / count as f32,
            windows,
            votes: count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::GestureSample;
    use crate::model::quantize::quantize;
    use crate::model::trainer::{synthetic_dataset, train, TrainerConfig};
    use crate::signal::{GestureKind, SynthesisConfig, Synthesizer};

    fn detector() -> GestureDetector {
        let report = train(&synthetic_dataset(4), &TrainerConfig::default()).unwrap();
        GestureDetector::new(quantize(&report.model).unwrap()).unwrap()
    }

    #[test]
    fn fresh_captures_of_every_kind_are_recognized() {
        let detector = detector();
        let synth = Synthesizer::new(SynthesisConfig::default()).unwrap();
        for kind in GestureKind::ALL {
            let trace = synth.synthesize(kind, 1.2, 7777).unwrap();
            let sample = GestureSample::from_trace("live", kind, &trace);
            let detection = detector.detect(&sample).unwrap().unwrap();
            assert_eq!(detection.label, kind.label(), "kind {kind}");
            assert_eq!(detection.windows, 21);
            assert!(detection.confidence > 0.0);
        }
    }

    #[test]
    fn capture_shorter_than_a_window_yields_none() {
        let detector = detector();
        let synth = Synthesizer::new(SynthesisConfig::default()).unwrap();
        let trace = synth.synthesize(GestureKind::Rest, 0.5, 1).unwrap();
        let sample = GestureSample::from_trace("short", GestureKind::Rest, &trace);
        assert!(detector.detect(&sample).unwrap().is_none());
    }
}
