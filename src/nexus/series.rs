//! Time-series log extraction.
//!
//! A log field is a `:`-separated public path into the run file, translated
//! here to the native `/` separator. The two conventional log categories
//! store their time/value pair differently: `selog` fields keep them under a
//! `value_log` sub-group, `runlog` fields directly in the field group. A
//! path carrying neither token tries the selog shape first, then the runlog
//! shape.
//!
//! Values are decoded by the dataset's declared element type into a tagged
//! [`LogValue`]: numeric channels become `Numeric(f64)`, string channels
//! (sparse instruments log categorical text) become `Text`. Time and value
//! arrays must agree in length; a mismatch is data corruption, never
//! truncation.

use super::{read_f64_dataset, RunFile};
use crate::error::{JournalError, Result};
use hdf5::types::{TypeDescriptor, VarLenUnicode};
use hdf5::{Dataset, Group};
use serde::ser::{Serialize, Serializer};
use serde_json::{json, Value};
use tracing::debug;

/// A single decoded log reading.
#[derive(Debug, Clone, PartialEq)]
pub enum LogValue {
    /// Numeric channel reading.
    Numeric(f64),
    /// Categorical text reading.
    Text(String),
}

impl Serialize for LogValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            LogValue::Numeric(number) => serializer.serialize_f64(*number),
            LogValue::Text(text) => serializer.serialize_str(text),
        }
    }
}

/// One `(time, value)` sample.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Seconds relative to the run's time origin.
    pub time: f64,
    /// Decoded reading at that time.
    pub value: LogValue,
}

/// An extracted series plus its identifying header.
#[derive(Debug, Clone)]
pub struct LogSeries {
    /// Run label the series belongs to.
    pub run: String,
    /// Public field path as requested.
    pub field: String,
    /// Samples in storage order.
    pub points: Vec<SeriesPoint>,
}

impl LogSeries {
    /// Serialize as the positional row layout consumed by clients: a
    /// `[run, field]` header pair followed by `[time, value]` rows.
    ///
    /// Multiple runs' series are concatenated by index, not by key, so this
    /// header-then-data shape is part of the contract.
    pub fn to_rows(&self) -> Value {
        let mut rows = Vec::with_capacity(self.points.len() + 1);
        rows.push(json!([self.run, self.field]));
        for point in &self.points {
            rows.push(json!([point.time, point.value]));
        }
        Value::Array(rows)
    }
}

enum LogCategory {
    SampleLog,
    RunLog,
    Unknown,
}

fn categorize(field_path: &str) -> LogCategory {
    if field_path.contains("selog") {
        LogCategory::SampleLog
    } else if field_path.contains("runlog") {
        LogCategory::RunLog
    } else {
        LogCategory::Unknown
    }
}

/// Extract a named log field from an open run file.
pub fn extract_series(file: &RunFile, field_path: &str, run_label: &str) -> Result<LogSeries> {
    let native_path = field_path.replace(':', "/");
    debug!(field = field_path, run = run_label, "extracting log series");
    let group = file
        .hdf5()
        .group(&native_path)
        .map_err(|_| JournalError::NotFound(format!("field {field_path} not present in run file")))?;

    let (value_ds, time_ds) = match categorize(field_path) {
        LogCategory::SampleLog => sample_log_pair(&group)?,
        LogCategory::RunLog => run_log_pair(&group)?,
        LogCategory::Unknown => sample_log_pair(&group)
            .or_else(|_| run_log_pair(&group))
            .map_err(|_| {
                JournalError::SchemaMismatch(format!(
                    "no value/time structure found under {field_path}"
                ))
            })?,
    };

    let times = read_f64_dataset(&time_ds, "time")?;
    let values = decode_values(&value_ds, field_path)?;
    if times.len() != values.len() {
        return Err(JournalError::DataCorruption(format!(
            "{field_path}: time has {} entries but value has {}",
            times.len(),
            values.len()
        )));
    }

    let points = times
        .into_iter()
        .zip(values)
        .map(|(time, value)| SeriesPoint { time, value })
        .collect();
    Ok(LogSeries {
        run: run_label.to_string(),
        field: field_path.to_string(),
        points,
    })
}

/// selog shape: `value_log/value` and `value_log/time` under the field group.
fn sample_log_pair(group: &Group) -> Result<(Dataset, Dataset)> {
    let value_log = group
        .group("value_log")
        .map_err(|_| JournalError::SchemaMismatch("missing value_log group".into()))?;
    Ok((
        dataset(&value_log, "value")?,
        dataset(&value_log, "time")?,
    ))
}

/// runlog shape: `value` and `time` directly in the field group.
fn run_log_pair(group: &Group) -> Result<(Dataset, Dataset)> {
    Ok((dataset(group, "value")?, dataset(group, "time")?))
}

fn dataset(group: &Group, name: &str) -> Result<Dataset> {
    group
        .dataset(name)
        .map_err(|_| JournalError::SchemaMismatch(format!("missing {name} dataset")))
}

/// Decode the value channel by its declared element type.
///
/// String values stored as an `(n, 1)` array flatten to one reading per
/// sample, matching the scalar-per-sample model.
fn decode_values(dataset: &Dataset, field_path: &str) -> Result<Vec<LogValue>> {
    let descriptor = dataset
        .dtype()
        .and_then(|dtype| dtype.to_descriptor())
        .map_err(|err| JournalError::SchemaMismatch(format!("{field_path}: {err}")))?;

    match descriptor {
        TypeDescriptor::Integer(_) | TypeDescriptor::Unsigned(_) | TypeDescriptor::Float(_) => {
            let numbers = read_f64_dataset(dataset, "value")?;
            Ok(numbers.into_iter().map(LogValue::Numeric).collect())
        }
        TypeDescriptor::FixedAscii(_)
        | TypeDescriptor::FixedUnicode(_)
        | TypeDescriptor::VarLenAscii
        | TypeDescriptor::VarLenUnicode => {
            let texts = dataset
                .read_raw::<VarLenUnicode>()
                .map_err(|err| JournalError::SchemaMismatch(format!("{field_path}: {err}")))?;
            Ok(texts
                .into_iter()
                .map(|text| LogValue::Text(text.to_string()))
                .collect())
        }
        other => Err(JournalError::SchemaMismatch(format!(
            "{field_path}: unsupported value element type {other:?}"
        ))),
    }
}
