//! NeXus/HDF5 run-file access.
//!
//! A run's data file is a hierarchical HDF5 file with one primary group,
//! `raw_data_1`, containing the run timestamps, the `*log` sub-groups and
//! the `detector_1` / `monitor_<n>` count tables. `RunFile` wraps the open
//! handle; it is opened read-only per request and dropped when the request
//! ends, so handles never outlive one extraction (RAII covers the error
//! paths too).

pub mod catalog;
pub mod series;
pub mod spectrum;

pub use catalog::{catalog_fields, LogGroup};
pub use series::{extract_series, LogSeries, LogValue, SeriesPoint};
pub use spectrum::{
    detector_analysis, extract_monitor, extract_spectrum, monitor_range, spectrum_range,
    BinnedCounts,
};

use crate::error::{JournalError, Result};
use hdf5::types::VarLenUnicode;
use hdf5::{Dataset, Group};
use std::path::Path;
use tracing::debug;

/// Primary data group present in every run file.
pub(crate) const MAIN_GROUP: &str = "raw_data_1";

/// A run data file opened read-only.
pub struct RunFile {
    file: hdf5::File,
}

impl RunFile {
    /// Open a data file read-only. An unopenable or corrupt file is
    /// reported as `NotFound`; no raw HDF5 error escapes.
    pub fn open(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "opening run data file");
        let file = hdf5::File::open(path).map_err(|err| {
            JournalError::NotFound(format!("failed to open {}: {err}", path.display()))
        })?;
        Ok(Self { file })
    }

    pub(crate) fn hdf5(&self) -> &hdf5::File {
        &self.file
    }

    pub(crate) fn main_group(&self) -> Result<Group> {
        self.file
            .group(MAIN_GROUP)
            .map_err(|_| JournalError::SchemaMismatch(format!("missing {MAIN_GROUP} group")))
    }

    /// Run start and end timestamps from the primary group.
    pub fn run_times(&self) -> Result<(String, String)> {
        let main = self.main_group()?;
        Ok((
            read_string_scalar(&main, "start_time")?,
            read_string_scalar(&main, "end_time")?,
        ))
    }
}

/// First element of a string dataset.
pub(crate) fn read_string_scalar(group: &Group, name: &str) -> Result<String> {
    let dataset = group
        .dataset(name)
        .map_err(|_| JournalError::SchemaMismatch(format!("missing {name} dataset")))?;
    let values = dataset
        .read_raw::<VarLenUnicode>()
        .map_err(|err| JournalError::SchemaMismatch(format!("{name}: {err}")))?;
    values
        .first()
        .map(|value| value.to_string())
        .ok_or_else(|| JournalError::SchemaMismatch(format!("{name} dataset is empty")))
}

/// Full numeric dataset, flattened.
pub(crate) fn read_f64(group: &Group, name: &str) -> Result<Vec<f64>> {
    let dataset = group
        .dataset(name)
        .map_err(|_| JournalError::SchemaMismatch(format!("missing {name} dataset")))?;
    read_f64_dataset(&dataset, name)
}

pub(crate) fn read_f64_dataset(dataset: &Dataset, name: &str) -> Result<Vec<f64>> {
    dataset
        .read_raw::<f64>()
        .map_err(|err| JournalError::SchemaMismatch(format!("{name}: {err}")))
}
