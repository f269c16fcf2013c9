pub mod config;
pub mod error;
pub mod plot;
pub mod synth;
pub use config::{SynthesisConfig, CHANNEL_LABELS, DEFAULT_GESTURE_DURATION_SECS, NUM_CHANNELS};
pub use error::SignalError;
pub use plot::{render_gesture_png, PlotStyle};
pub use synth::{GestureKind, PressureTrace, Synthesizer};
