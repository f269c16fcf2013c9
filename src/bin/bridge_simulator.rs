use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::info;

use stepsign::bridge::{BridgeConfig, SigningBridge, SimulatedCapture};
use stepsign::model::{GestureDetector, QuantizedModel};
use stepsign::relay::{DirRelay, SigningRelay};
use stepsign::signal::{GestureKind, SynthesisConfig, DEFAULT_GESTURE_DURATION_SECS};
use stepsign::signer::DeviceKey;

// Demo secret shared with the companion app; a real device would keep this in
// its secure element.
const DEVICE_KEY_B64: &str = "xY+HWAwzztWjYp00T8y+G0sEwT+P3N+c1eY4j8lVpjs=";
const QUANTIZED_PATH: &str = "trained_model/model_v1.q8.json";
const DEFAULT_RELAY_ROOT: &str = "relay";
const CAPTURE_SEED: u64 = 1_000;

fn parse_args() -> Result<PathBuf> {
    let mut args = env::args().skip(1);
    let root = match args.next() {
        None => PathBuf::from(DEFAULT_RELAY_ROOT),
        Some(path) => PathBuf::from(path),
    };
    if args.next().is_some() {
        bail!("Usage: bridge_simulator [<relay-dir>]");
    }
    Ok(root)
}

fn main() -> Result<()> {
    env_logger::init();
    let relay_root = parse_args()?;

    let model = QuantizedModel::load_json_path(QUANTIZED_PATH)
        .with_context(|| format!("failed to load quantized model {QUANTIZED_PATH}"))?;
    info!(
        "device model loaded ({} classes, {} time steps)",
        model.labels.len(),
        model.time_steps
    );
    let detector = GestureDetector::new(model)?;

    let key = DeviceKey::from_base64(DEVICE_KEY_B64).context("bad device key")?;
    info!("signing as {}", key.address());

    let mut relay = DirRelay::open(&relay_root)
        .with_context(|| format!("failed to open relay under {}", relay_root.display()))?;
    // Requests left over from a previous run are meaningless now.
    relay.clear().context("failed to clear stale relay state")?;
    info!("listening for signing requests under {}", relay_root.display());

    let capture = SimulatedCapture::new(
        SynthesisConfig::default(),
        GestureKind::DoubleTap,
        DEFAULT_GESTURE_DURATION_SECS,
        CAPTURE_SEED,
    )?;

    let mut bridge = SigningBridge::new(relay, capture, detector, key, BridgeConfig::default());
    let report = bridge.run().context("bridge stopped")?;
    info!(
        "bridge finished: {} signed, {} rejected over {} polls",
        report.signed, report.rejected, report.polls
    );
    Ok(())
}
