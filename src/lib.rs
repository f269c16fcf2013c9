pub mod bridge;
pub mod dataset;
pub mod model;
pub mod oracle;
pub mod relay;
pub mod signal;
pub mod signer;
pub use bridge::{BridgeConfig, BridgeError, SigningBridge, SimulatedCapture};
pub use dataset::{Dataset, DatasetError, GestureSample, Reading};
pub use model::{GestureDetector, ModelError, QuantizedModel, TrainedModel, WindowBuilder};
pub use oracle::{MonitorConfig, OracleError, PriceMonitor};
pub use relay::{DirRelay, MemoryRelay, SigningRelay};
pub use signal::{GestureKind, SignalError, SynthesisConfig, Synthesizer};
pub use signer::DeviceKey;
