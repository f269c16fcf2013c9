use std::fmt;
use std::str::FromStr;
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use crate::signal::config::{SynthesisConfig, NUM_CHANNELS};
use crate::signal::error::SignalError;
/// Gesture classes the classifier is trained on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureKind {
    TapShort,
    TapLong,
    DoubleTap,
    HeelPress,
    Rest,
}
impl GestureKind {
    pub const ALL: [GestureKind; 5] = [
        GestureKind::TapShort,
        GestureKind::TapLong,
        GestureKind::DoubleTap,
        GestureKind::HeelPress,
        GestureKind::Rest,
    ];
    /// Label string used in the dataset CSV and the model vocabulary.
    pub fn label(self) -> &'static str {
        match self {
            GestureKind::TapShort => "TAP_SHORT",
            GestureKind::TapLong => "TAP_LONG",
            GestureKind::DoubleTap => "DOUBLE_TAP",
            GestureKind::HeelPress => "HEEL_PRESS",
            GestureKind::Rest => "REST",
        }
    }
}
impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
impl FromStr for GestureKind {
    type Err = SignalError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GestureKind::ALL
            .into_iter()
            .find(|kind| kind.label() == s)
            .ok_or_else(|| SignalError::UnsupportedGesture(s.to_string()))
    }
}
/// One bell-shaped pressure pulse superimposed on the noise floor.
#[derive(Clone, Copy, Debug)]
struct Pulse {
    peak_secs: f64,
    width_secs: f64,
}
type ChannelGains = [f64; NUM_CHANNELS];
/// Which pulses a gesture produces and how hard each channel is pressed.
/// Channel roles: fsr1 heel, fsr2 ball, fsr3 big toe, fsr4 mid toes, fsr5 edge.
fn pulse_plan(kind: GestureKind) -> (&'static [Pulse], ChannelGains) {
    const SHORT_TAP: &[Pulse] = &[Pulse {
        peak_secs: 0.6,
        width_secs: 0.2,
    }];
    const LONG_TAP: &[Pulse] = &[Pulse {
        peak_secs: 0.8,
        width_secs: 0.8,
    }];
    const DOUBLE_TAP: &[Pulse] = &[
        Pulse {
            peak_secs: 0.6,
            width_secs: 0.2,
        },
        Pulse {
            peak_secs: 1.1,
            width_secs: 0.2,
        },
    ];
    const HEEL: &[Pulse] = &[Pulse {
        peak_secs: 1.0,
        width_secs: 1.0,
    }];
    match kind {
        GestureKind::TapShort => (SHORT_TAP, [0.0, 1.0, 0.8, 0.6, 0.0]),
        GestureKind::TapLong => (LONG_TAP, [0.0, 1.0, 1.0, 1.0, 0.0]),
        GestureKind::DoubleTap => (DOUBLE_TAP, [0.0, 1.0, 0.8, 0.0, 0.0]),
        GestureKind::HeelPress => (HEEL, [1.0, 0.0, 0.0, 0.0, 0.0]),
        GestureKind::Rest => (&[], [0.0; NUM_CHANNELS]),
    }
}
/// Synthesized pressure trace: N timestamps plus an N x 5 channel matrix.
#[derive(Clone, Debug)]
pub struct PressureTrace {
    pub timestamps: Vec<f64>,
    pub channels: Array2<f64>,
}
impl PressureTrace {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
    pub fn duration_secs(&self) -> f64 {
        self.timestamps.last().copied().unwrap_or(0.0)
    }
}
/// Generates physically plausible pressure traces for each gesture class.
/// Pure: the only state is the config, and all randomness comes from the
/// per-call seed, so equal inputs reproduce bit-identical traces.
pub struct Synthesizer {
    config: SynthesisConfig,
}
impl Synthesizer {
    pub fn new(config: SynthesisConfig) -> Result<Self, SignalError> {
        config.validate()?;
        Ok(Self { config })
    }
    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }
    pub fn synthesize(
        &self,
        kind: GestureKind,
        duration_secs: f64,
        seed: u64,
    ) -> Result<PressureTrace, SignalError> {
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(SignalError::InvalidParameter {
                name: "duration",
                value: duration_secs,
            });
        }
        let points = (duration_secs * self.config.sample_rate_hz).floor() as usize;
        let timestamps = linspace(duration_secs, points);
        let noise = Normal::new(0.0, self.config.noise_std).map_err(|_| {
            SignalError::InvalidParameter {
                name: "noise level",
                value: self.config.noise_std,
            }
        })?;
        let mut rng = StdRng::seed_from_u64(seed);
        let mut channels = Array2::zeros((points, NUM_CHANNELS));
        for row in 0..points {
            for col in 0..NUM_CHANNELS {
                // Pressure never reads below zero, even on negative draws.
                channels[[row, col]] = noise.sample(&mut rng).max(0.0);
            }
        }
        let (pulses, gains) = pulse_plan(kind);
        for pulse in pulses {
            let sigma = pulse.width_secs / 4.0;
            let denom = 2.0 * sigma * sigma;
            for (row, &t) in timestamps.iter().enumerate() {
                let lobe = self.config.tap_pressure * (-(t - pulse.peak_secs).powi(2) / denom).exp();
                for (col, &gain) in gains.iter().enumerate() {
                    if gain != 0.0 {
                        channels[[row, col]] += lobe * gain;
                    }
                }
            }
        }
        channels.mapv_inplace(|v| v.max(0.0));
        Ok(PressureTrace {
            timestamps,
            channels,
        })
    }
}
/// Evenly spaced points over [0, duration], both ends inclusive.
fn linspace(duration_secs: f64, points: usize) -> Vec<f64> {
    match points {
        0 => Vec::new(),
        1 => vec![0.0],
        _ => {
            let last = (points - 1) as f64;
            (0..points)
                .map(|i| duration_secs * (i as f64 / last))
                .collect()
        }
    }
}
