use std::env;
use std::fs;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use log::info;

use stepsign::dataset::{Dataset, GestureSample};
use stepsign::signal::{
    render_gesture_png, GestureKind, PlotStyle, SynthesisConfig, Synthesizer,
    DEFAULT_GESTURE_DURATION_SECS,
};

const SAMPLES_PER_GESTURE: usize = 50;
const DEFAULT_BASE_SEED: u64 = 42;
const CSV_DIR: &str = "generated_data/csv";
const PLOTS_DIR: &str = "generated_data/plots";

fn parse_args() -> Result<u64> {
    let mut args = env::args().skip(1);
    match args.next() {
        None => Ok(DEFAULT_BASE_SEED),
        Some(flag) if flag == "--seed" => {
            let value = args
                .next()
                .ok_or_else(|| anyhow!("--seed needs a value"))?;
            value
                .parse()
                .with_context(|| format!("seed must be an unsigned integer, got {value:?}"))
        }
        Some(_) => bail!("Usage: generate_dataset [--seed <n>]"),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let base_seed = parse_args()?;
    fs::create_dir_all(CSV_DIR)?;
    fs::create_dir_all(PLOTS_DIR)?;

    info!("generating the simulated gesture dataset (base seed {base_seed})");
    let synth = Synthesizer::new(SynthesisConfig::default())?;
    let mut dataset = Dataset::new();
    let mut seed = base_seed;
    for kind in GestureKind::ALL {
        info!("  {SAMPLES_PER_GESTURE} samples for {kind}");
        for i in 0..SAMPLES_PER_GESTURE {
            let trace = synth.synthesize(kind, DEFAULT_GESTURE_DURATION_SECS, seed)?;
            seed = seed.wrapping_add(1);
            if i == 0 {
                let title = format!("{kind} (sample #1)");
                let png = render_gesture_png(&trace, &title, PlotStyle::default())?;
                let path = PathBuf::from(PLOTS_DIR).join(format!("{kind}_sample_1.png"));
                fs::write(&path, png)
                    .with_context(|| format!("failed to write plot {}", path.display()))?;
            }
            let sample_id = format!("{}_{i}", kind.label());
            dataset.push(GestureSample::from_trace(sample_id, kind, &trace))?;
        }
    }

    let out = PathBuf::from(CSV_DIR).join("full_gesture_dataset.csv");
    dataset
        .write_csv_path(&out)
        .with_context(|| format!("failed to write dataset {}", out.display()))?;
    info!(
        "dataset complete: {} samples / {} readings -> {}",
        dataset.len(),
        dataset.reading_count(),
        out.display()
    );
    info!("example plots under {PLOTS_DIR}/");
    Ok(())
}
