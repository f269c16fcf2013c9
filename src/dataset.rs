use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{Reader, Writer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::signal::{GestureKind, PressureTrace, SignalError, NUM_CHANNELS};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Signal(#[from] SignalError),

    #[error("dataset contains no readings")]
    Empty,

    #[error("sample {sample_id} already present in dataset")]
    DuplicateSample { sample_id: String },

    #[error("row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("sample {sample_id}: {reason}")]
    InvalidSample { sample_id: String, reason: String },
}

/// One multi-channel pressure reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    pub timestamp: f64,
    pub channels: [f64; NUM_CHANNELS],
}

/// A labeled recording of one gesture, readings ordered by timestamp.
#[derive(Clone, Debug)]
pub struct GestureSample {
    pub sample_id: String,
    pub label: GestureKind,
    pub readings: Vec<Reading>,
}

impl GestureSample {
    /// Wraps a synthesized trace with its label and id.
    pub fn from_trace(sample_id: impl Into<String>, label: GestureKind, trace: &PressureTrace) -> Self {
        let readings = trace
            .timestamps
            .iter()
            .zip(trace.channels.rows())
            .map(|(&timestamp, row)| {
                let mut channels = [0.0; NUM_CHANNELS];
                for (slot, &v) in channels.iter_mut().zip(row.iter()) {
                    *slot = v;
                }
                Reading {
                    timestamp,
                    channels,
                }
            })
            .collect();
        Self {
            sample_id: sample_id.into(),
            label,
            readings,
        }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Checks the per-sample invariants: strictly increasing timestamps and
    /// component-wise non-negative channel values.
    pub fn validate(&self) -> Result<(), DatasetError> {
        for pair in self.readings.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(DatasetError::InvalidSample {
                    sample_id: self.sample_id.clone(),
                    reason: "timestamps must be strictly increasing".into(),
                });
            }
        }
        for reading in &self.readings {
            if reading.channels.iter().any(|&v| v < 0.0) {
                return Err(DatasetError::InvalidSample {
                    sample_id: self.sample_id.clone(),
                    reason: format!("negative channel value at t={}", reading.timestamp),
                });
            }
        }
        Ok(())
    }
}

/// Row layout of the dataset CSV; field order defines the header.
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    sample_id: String,
    timestamp: f64,
    fsr1: f64,
    fsr2: f64,
    fsr3: f64,
    fsr4: f64,
    fsr5: f64,
    gesture_label: String,
}

/// Insertion-ordered collection of gesture samples, partitioned by sample id.
#[derive(Debug, Default)]
pub struct Dataset {
    samples: Vec<GestureSample>,
    index: HashMap<String, usize>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: GestureSample) -> Result<(), DatasetError> {
        sample.validate()?;
        if self.index.contains_key(&sample.sample_id) {
            return Err(DatasetError::DuplicateSample {
                sample_id: sample.sample_id,
            });
        }
        self.index.insert(sample.sample_id.clone(), self.samples.len());
        self.samples.push(sample);
        Ok(())
    }

    pub fn samples(&self) -> &[GestureSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn reading_count(&self) -> usize {
        self.samples.iter().map(GestureSample::len).sum()
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), DatasetError> {
        let mut out = Writer::from_writer(writer);
        for sample in &self.samples {
            for reading in &sample.readings {
                out.serialize(CsvRow {
                    sample_id: sample.sample_id.clone(),
                    timestamp: reading.timestamp,
                    fsr1: reading.channels[0],
                    fsr2: reading.channels[1],
                    fsr3: reading.channels[2],
                    fsr4: reading.channels[3],
                    fsr5: reading.channels[4],
                    gesture_label: sample.label.label().to_string(),
                })?;
            }
        }
        out.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        self.write_csv(File::create(path)?)
    }

    pub fn read_csv<R: io::Read>(reader: R) -> Result<Self, DatasetError> {
        let mut input = Reader::from_reader(reader);
        let mut dataset = Dataset::new();
        for (row_idx, record) in input.deserialize::<CsvRow>().enumerate() {
            let row = record?;
            let label: GestureKind = row.gesture_label.parse()?;
            let reading = Reading {
                timestamp: row.timestamp,
                channels: [row.fsr1, row.fsr2, row.fsr3, row.fsr4, row.fsr5],
            };
            match dataset.index.get(&row.sample_id) {
                Some(&at) => {
                    let sample = &mut dataset.samples[at];
                    if sample.label != label {
                        return Err(DatasetError::InvalidRow {
                            row: row_idx + 1,
                            reason: format!(
                                "sample {} relabeled from {} to {}",
                                row.sample_id, sample.label, label
                            ),
                        });
                    }
                    sample.readings.push(reading);
                }
                None => {
                    let at = dataset.samples.len();
                    dataset.index.insert(row.sample_id.clone(), at);
                    dataset.samples.push(GestureSample {
                        sample_id: row.sample_id,
                        label,
                        readings: vec![reading],
                    });
                }
            }
        }
        if dataset.is_empty() {
            return Err(DatasetError::Empty);
        }
        for sample in &dataset.samples {
            sample.validate()?;
        }
        Ok(dataset)
    }

    pub fn read_csv_path(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        Self::read_csv(File::open(path)?)
    }
}
