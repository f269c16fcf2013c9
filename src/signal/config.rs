use crate::signal::error::SignalError;
/// Number of FSR channels on the insole.
pub const NUM_CHANNELS: usize = 5;
/// Channel names as they appear in the dataset header.
pub const CHANNEL_LABELS: [&str; NUM_CHANNELS] = ["fsr1", "fsr2", "fsr3", "fsr4", "fsr5"];
/// Nominal length of one recorded gesture sample.
pub const DEFAULT_GESTURE_DURATION_SECS: f64 = 2.0;
/// Knobs for the waveform generator. Defaults mirror the constants the
/// firmware team calibrated against the physical insole.
#[derive(Clone, Copy, Debug)]
pub struct SynthesisConfig {
    /// Readings per second.
    pub sample_rate_hz: f64,
    /// Standard deviation of the background sensor noise.
    pub noise_std: f64,
    /// Peak pressure of a deliberate tap, in normalized sensor units.
    pub tap_pressure: f64,
}
impl SynthesisConfig {
    pub fn validate(&self) -> Result<(), SignalError> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(SignalError::InvalidParameter {
                name: "sample rate",
                value: self.sample_rate_hz,
            });
        }
        if !self.noise_std.is_finite() || self.noise_std < 0.0 {
            return Err(SignalError::InvalidParameter {
                name: "noise level",
                value: self.noise_std,
            });
        }
        if !self.tap_pressure.is_finite() || self.tap_pressure <= 0.0 {
            return Err(SignalError::InvalidParameter {
                name: "tap pressure",
                value: self.tap_pressure,
            });
        }
        Ok(())
    }
}
impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 100.0,
            noise_std: 0.03,
            tap_pressure: 0.8,
        }
    }
}
