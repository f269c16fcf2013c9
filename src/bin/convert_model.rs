use std::fs;

use anyhow::{Context, Result};
use log::info;

use stepsign::model::{quantize, QuantizedModel, TrainedModel};

const MODEL_PATH: &str = "trained_model/model_v1.json";
const QUANTIZED_PATH: &str = "trained_model/model_v1.q8.json";

fn main() -> Result<()> {
    env_logger::init();
    let model = TrainedModel::load_json_path(MODEL_PATH)
        .with_context(|| format!("failed to load model {MODEL_PATH}"))?;
    info!("trained model loaded from {MODEL_PATH}");

    let quantized = quantize(&model).context("quantization failed")?;
    quantized
        .save_json_path(QUANTIZED_PATH)
        .with_context(|| format!("failed to save quantized model {QUANTIZED_PATH}"))?;
    info!("quantized model saved to {QUANTIZED_PATH}");

    // Load it back the way the device would, as a smoke check.
    QuantizedModel::load_json_path(QUANTIZED_PATH)
        .context("quantized artifact failed to reload")?;

    let original_kb = fs::metadata(MODEL_PATH)?.len() as f64 / 1024.0;
    let quantized_kb = fs::metadata(QUANTIZED_PATH)?.len() as f64 / 1024.0;
    info!("original size:  {original_kb:.2} KB");
    info!("quantized size: {quantized_kb:.2} KB");
    info!(
        "size reduction: {:.2}%",
        (1.0 - quantized_kb / original_kb) * 100.0
    );
    Ok(())
}
