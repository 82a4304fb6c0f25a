//! Detector and monitor spectrum extraction.
//!
//! Detector counts live in `detector_1/counts`, a 3-D table indexed
//! `[period][spectrum][tof_bin]`; only period 0 is supported. Monitors are
//! separate `monitor_<n>` groups whose `data` table is read at `[0][0]`.
//! Both share a per-file `time_of_flight` bin array that counts are zipped
//! against positionally.

use super::{read_f64, read_f64_dataset, RunFile};
use crate::error::{JournalError, Result};
use hdf5::{Dataset, Group};
use serde_json::{json, Value};
use tracing::debug;

/// Counts paired positionally with their time-of-flight bins.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedCounts {
    /// Shared time-of-flight bin centers.
    pub time_of_flight: Vec<f64>,
    /// Counts per bin for the selected channel.
    pub counts: Vec<f64>,
}

impl BinnedCounts {
    /// Serialize as `[time_of_flight, count]` rows.
    pub fn to_rows(&self) -> Value {
        Value::Array(
            self.time_of_flight
                .iter()
                .zip(&self.counts)
                .map(|(tof, count)| json!([tof, count]))
                .collect(),
        )
    }
}

/// Extract one detector spectrum (period 0) by index.
pub fn extract_spectrum(file: &RunFile, spectrum_index: usize) -> Result<BinnedCounts> {
    let detector = detector_group(file)?;
    let time_of_flight = read_f64(&detector, "time_of_flight")?;
    let counts_ds = counts_dataset(&detector)?;
    let (spectra, bins) = counts_shape(&counts_ds)?;
    if spectrum_index >= spectra {
        return Err(JournalError::NotFound(format!(
            "spectrum index {spectrum_index} out of range (0..{spectra})"
        )));
    }

    debug!(spectrum_index, spectra, bins, "extracting detector spectrum");
    let flat = read_f64_dataset(&counts_ds, "counts")?;
    let start = spectrum_index * bins;
    let row = flat
        .get(start..start + bins)
        .ok_or_else(|| {
            JournalError::DataCorruption(format!(
                "counts table shorter than its declared shape ({} values)",
                flat.len()
            ))
        })?
        .to_vec();
    zip_checked(time_of_flight, row, "detector counts")
}

/// Extract a monitor spectrum by monitor number.
pub fn extract_monitor(file: &RunFile, monitor_index: usize) -> Result<BinnedCounts> {
    let main = file.main_group()?;
    let name = format!("monitor_{monitor_index}");
    let monitor = main
        .group(&name)
        .map_err(|_| JournalError::NotFound(format!("no {name} group in run file")))?;
    let time_of_flight = read_f64(&monitor, "time_of_flight")?;
    let data_ds = monitor
        .dataset("data")
        .map_err(|_| JournalError::SchemaMismatch(format!("{name}: missing data dataset")))?;

    let shape = data_ds.shape();
    let bins = *shape
        .last()
        .ok_or_else(|| JournalError::SchemaMismatch(format!("{name}: scalar data dataset")))?;
    let flat = read_f64_dataset(&data_ds, "data")?;
    // [0][0] row of the (period, channel, bin) table.
    let row = flat
        .get(..bins)
        .ok_or_else(|| {
            JournalError::DataCorruption(format!(
                "{name}: data table shorter than its declared shape"
            ))
        })?
        .to_vec();
    zip_checked(time_of_flight, row, "monitor counts")
}

/// Number of addressable detector spectra (row count of the counts table).
pub fn spectrum_range(file: &RunFile) -> Result<usize> {
    let detector = detector_group(file)?;
    let counts_ds = counts_dataset(&detector)?;
    Ok(counts_shape(&counts_ds)?.0)
}

/// Highest monitor number present in the file.
///
/// Discovery, not a stored count: scans the primary group for member names
/// containing `monitor` and takes the highest numeric suffix, skipping
/// non-numeric ones. Defaults to 0 when none parse.
pub fn monitor_range(file: &RunFile) -> Result<usize> {
    let main = file.main_group()?;
    let members = main
        .member_names()
        .map_err(|err| JournalError::SchemaMismatch(format!("member listing: {err}")))?;
    Ok(members
        .iter()
        .filter(|name| name.contains("monitor"))
        .filter_map(|name| name.split('_').nth(1))
        .filter_map(|suffix| suffix.parse::<usize>().ok())
        .max()
        .unwrap_or(0))
}

/// Data-quality diagnostic: `"<active>/<total>"` where active counts
/// detector rows with at least one non-zero reading.
pub fn detector_analysis(file: &RunFile) -> Result<String> {
    let detector = detector_group(file)?;
    let counts_ds = counts_dataset(&detector)?;
    let (spectra, bins) = counts_shape(&counts_ds)?;
    let flat = read_f64_dataset(&counts_ds, "counts")?;

    let active = (0..spectra)
        .filter(|row| {
            flat.get(row * bins..(row + 1) * bins)
                .is_some_and(|counts| counts.iter().any(|&count| count != 0.0))
        })
        .count();
    Ok(format!("{active}/{spectra}"))
}

fn detector_group(file: &RunFile) -> Result<Group> {
    file.main_group()?
        .group("detector_1")
        .map_err(|_| JournalError::SchemaMismatch("missing detector_1 group".into()))
}

fn counts_dataset(detector: &Group) -> Result<Dataset> {
    detector
        .dataset("counts")
        .map_err(|_| JournalError::SchemaMismatch("missing detector counts dataset".into()))
}

/// Validate the `[period][spectrum][bin]` layout and return (spectra, bins).
fn counts_shape(counts_ds: &Dataset) -> Result<(usize, usize)> {
    let shape = counts_ds.shape();
    if shape.len() != 3 {
        return Err(JournalError::SchemaMismatch(format!(
            "detector counts table has {} dimensions, expected 3",
            shape.len()
        )));
    }
    Ok((shape[1], shape[2]))
}

fn zip_checked(time_of_flight: Vec<f64>, counts: Vec<f64>, what: &str) -> Result<BinnedCounts> {
    if time_of_flight.len() != counts.len() {
        return Err(JournalError::DataCorruption(format!(
            "{what}: {} time-of-flight bins but {} counts",
            time_of_flight.len(),
            counts.len()
        )));
    }
    Ok(BinnedCounts {
        time_of_flight,
        counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_pair_bins_with_counts() {
        let spectrum = BinnedCounts {
            time_of_flight: vec![5.0, 10.0],
            counts: vec![0.0, 3.0],
        };
        assert_eq!(spectrum.to_rows(), json!([[5.0, 0.0], [10.0, 3.0]]));
    }

    #[test]
    fn mismatched_lengths_are_corruption() {
        let err = zip_checked(vec![1.0, 2.0], vec![1.0], "detector counts").unwrap_err();
        assert!(matches!(err, JournalError::DataCorruption(_)));
    }
}
