use std::fs;

use anyhow::{Context, Result};
use log::info;

use stepsign::dataset::Dataset;
use stepsign::model::{train, TrainerConfig};

const DATASET_PATH: &str = "generated_data/csv/full_gesture_dataset.csv";
const MODEL_DIR: &str = "trained_model";
const MODEL_PATH: &str = "trained_model/model_v1.json";

fn main() -> Result<()> {
    env_logger::init();
    let dataset = Dataset::read_csv_path(DATASET_PATH)
        .with_context(|| format!("failed to load dataset {DATASET_PATH}"))?;
    info!(
        "dataset loaded: {} samples / {} readings",
        dataset.len(),
        dataset.reading_count()
    );

    let config = TrainerConfig::default();
    let report = train(&dataset, &config).context("training failed")?;
    info!(
        "gesture classes ({}): {}",
        report.model.labels.len(),
        report.model.labels.join(", ")
    );
    info!(
        "windows: {} total -> {} train / {} held out",
        report.windows_total, report.train_windows, report.test_windows
    );
    if let Some(accuracy) = report.test_accuracy {
        info!("hold-out accuracy: {:.2}%", accuracy * 100.0);
    }

    fs::create_dir_all(MODEL_DIR)?;
    report
        .model
        .save_json_path(MODEL_PATH)
        .with_context(|| format!("failed to save model {MODEL_PATH}"))?;
    info!("model saved to {MODEL_PATH}");
    Ok(())
}
