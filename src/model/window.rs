use crate::dataset::{GestureSample, Reading};
use crate::model::ModelError;
use crate::signal::{GestureKind, NUM_CHANNELS};

/// One second of readings at the default sampling rate.
pub const DEFAULT_TIME_STEPS: usize = 100;

/// A fixed-length contiguous slice of one sample's readings, tagged with the
/// sample's label. Borrowed, never mutated.
#[derive(Clone, Copy, Debug)]
pub struct Window<'a> {
    pub label: GestureKind,
    pub readings: &'a [Reading],
}

impl Window<'_> {
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Flattens the window time-major: feature index = t * 5 + channel.
    pub fn features(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.readings.len() * NUM_CHANNELS);
        for reading in self.readings {
            for &v in &reading.channels {
                out.push(v as f32);
            }
        }
        out
    }
}

/// Slices samples into overlapping fixed-length windows with stride 1.
#[derive(Clone, Copy, Debug)]
pub struct WindowBuilder {
    time_steps: usize,
}

impl WindowBuilder {
    pub fn new(time_steps: usize) -> Result<Self, ModelError> {
        if time_steps == 0 {
            return Err(ModelError::InvalidWindowSize);
        }
        Ok(Self { time_steps })
    }

    pub fn time_steps(&self) -> usize {
        self.time_steps
    }

    pub fn feature_len(&self) -> usize {
        self.time_steps * NUM_CHANNELS
    }

    /// Lazy iterator over the sample's windows. A sample shorter than the
    /// window yields no items; that is a skip, not an error.
    pub fn windows<'a>(&self, sample: &'a GestureSample) -> Windows<'a> {
        Windows {
            label: sample.label,
            readings: &sample.readings,
            time_steps: self.time_steps,
            next: 0,
        }
    }

    pub fn count(&self, sample: &GestureSample) -> usize {
        (sample.len() + 1).saturating_sub(self.time_steps)
    }
}

pub struct Windows<'a> {
    label: GestureKind,
    readings: &'a [Reading],
    time_steps: usize,
    next: usize,
}

impl<'a> Iterator for Windows<'a> {
    type Item = Window<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let end = self.next.checked_add(self.time_steps)?;
        if end > self.readings.len() {
            return None;
        }
        let window = Window {
            label: self.label,
            readings: &self.readings[self.next..end],
        };
        self.next += 1;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.readings.len() + 1)
            .saturating_sub(self.time_steps)
            .saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Windows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::GestureSample;
    use crate::signal::{GestureKind, SynthesisConfig, Synthesizer};

    fn sample_of_len(n: usize) -> GestureSample {
        let synth = Synthesizer::new(SynthesisConfig::default()).unwrap();
        let trace = synth
            .synthesize(GestureKind::TapLong, n as f64 / 100.0, 9)
            .unwrap();
        assert_eq!(trace.len(), n);
        GestureSample::from_trace("TAP_LONG_0", GestureKind::TapLong, &trace)
    }

    #[test]
    fn two_hundred_readings_yield_101_windows_of_100() {
        let sample = sample_of_len(200);
        let builder = WindowBuilder::new(100).unwrap();
        let windows: Vec<_> = builder.windows(&sample).collect();
        assert_eq!(windows.len(), 101);
        assert_eq!(builder.count(&sample), 101);
        assert!(windows.iter().all(|w| w.len() == 100));
        assert!(windows.iter().all(|w| w.label == GestureKind::TapLong));
    }

    #[test]
    fn stride_is_one_reading() {
        let sample = sample_of_len(120);
        let builder = WindowBuilder::new(100).unwrap();
        let windows: Vec<_> = builder.windows(&sample).collect();
        assert_eq!(windows[0].readings[0], sample.readings[0]);
        assert_eq!(windows[1].readings[0], sample.readings[1]);
        assert_eq!(windows[20].readings[99], sample.readings[119]);
    }

    #[test]
    fn exact_length_sample_yields_one_full_window() {
        let sample = sample_of_len(100);
        let builder = WindowBuilder::new(100).unwrap();
        let windows: Vec<_> = builder.windows(&sample).collect();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].readings, sample.readings.as_slice());
    }

    #[test]
    fn short_sample_yields_zero_windows_without_error() {
        let sample = sample_of_len(99);
        let builder = WindowBuilder::new(100).unwrap();
        assert_eq!(builder.windows(&sample).count(), 0);
        assert_eq!(builder.count(&sample), 0);
    }

    #[test]
    fn iterator_is_restartable() {
        let sample = sample_of_len(150);
        let builder = WindowBuilder::new(100).unwrap();
        assert_eq!(builder.windows(&sample).count(), 51);
        assert_eq!(builder.windows(&sample).count(), 51);
    }

    #[test]
    fn zero_window_size_is_rejected() {
        assert!(matches!(
            WindowBuilder::new(0),
            Err(ModelError::InvalidWindowSize)
        ));
    }

    #[test]
    fn features_are_time_major() {
        let sample = sample_of_len(100);
        let builder = WindowBuilder::new(100).unwrap();
        let window = builder.windows(&sample).next().unwrap();
        let features = window.features();
        assert_eq!(features.len(), 500);
        assert_eq!(features[0], sample.readings[0].channels[0] as f32);
        assert_eq!(features[5], sample.readings[1].channels[0] as f32);
        assert_eq!(features[7], sample.readings[1].channels[2] as f32);
    }
}
