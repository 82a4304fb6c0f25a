//! Public operation facade.
//!
//! `JournalService` is the surface a transport shell (HTTP handlers, the
//! bundled CLI) calls into. Inputs are plain strings, multi-value parameters
//! are semicolon-separated lists, and every operation returns a
//! `serde_json::Value` success payload; failures are rendered to the
//! structured `{"response": "ERR. ..."}` payload by the shell via
//! [`crate::error::JournalError::to_response`].
//!
//! Payload shapes are positional where clients consume them positionally:
//! log-data blocks are header-then-rows, spectra carry a
//! `[runs, index, kind]` header, and log-field catalogs flatten to
//! `[group, path, path, ...]` rows.

use crate::config::Settings;
use crate::error::{JournalError, Result};
use crate::format;
use crate::journal::{JournalFetcher, JournalSearchEngine};
use crate::locate;
use crate::nexus::{self, RunFile};
use chrono::Local;
use serde_json::{json, Value};
use tracing::info;

/// The run-data and journal operations exposed to the transport shell.
pub struct JournalService<F> {
    engine: JournalSearchEngine<F>,
    settings: Settings,
}

impl<F: JournalFetcher> JournalService<F> {
    /// Build a service from settings and a journal fetcher.
    pub fn new(settings: Settings, fetcher: F) -> Self {
        let engine = JournalSearchEngine::new(fetcher, settings.fetch_timeout());
        Self { engine, settings }
    }

    /// The underlying search engine, for callers needing typed results.
    pub fn engine(&self) -> &JournalSearchEngine<F> {
        &self.engine
    }

    fn open_run(&self, instrument: &str, cycle: &str, run: &str) -> Result<RunFile> {
        let path = locate::locate(&self.settings.data_root, instrument, cycle, run)?;
        RunFile::open(&path)
    }

    /// Ordered cycle list for an instrument.
    pub async fn list_cycles(&self, instrument: &str) -> Result<Value> {
        Ok(json!(self.engine.list_cycles(instrument).await?))
    }

    /// One cycle's journal records, display-formatted (relative dates,
    /// `duration` as `HH:MM:SS`).
    pub async fn list_journal(&self, instrument: &str, cycle: &str) -> Result<Value> {
        let records = self.engine.journal(instrument, cycle).await?;
        let now = Local::now().naive_local();
        Ok(Value::Array(
            records
                .iter()
                .map(|record| format::format_record(record, now))
                .collect(),
        ))
    }

    /// Search every cycle for `needle` in `field` (default `user_name`).
    pub async fn search_journal(
        &self,
        instrument: &str,
        field: Option<&str>,
        needle: &str,
    ) -> Result<Value> {
        let field = field.unwrap_or(crate::journal::search::DEFAULT_SEARCH_FIELD);
        let matches = self
            .engine
            .search_all_cycles(instrument, field, needle)
            .await?;
        Ok(json!(matches))
    }

    /// Cycle containing the given run number.
    pub async fn find_run(&self, instrument: &str, run_number: &str) -> Result<Value> {
        Ok(Value::String(
            self.engine.find_cycle_for_run(instrument, run_number).await?,
        ))
    }

    /// Change poll: latest cycle name when the index changed, else `""`.
    pub async fn poll_instrument(&self, instrument: &str) -> Result<Value> {
        let changed = self.engine.ping_cycle(instrument).await?;
        Ok(Value::String(changed.unwrap_or_default()))
    }

    /// Log field catalog for the first (cycle, run) of the given lists, as
    /// `[group, path, path, ...]` rows.
    pub fn list_log_fields(&self, instrument: &str, cycles: &str, runs: &str) -> Result<Value> {
        let cycle = first_item(cycles, "cycle")?;
        let run = first_item(runs, "run")?;
        let file = self.open_run(instrument, cycle, run)?;
        let groups = nexus::catalog_fields(&file)?;
        Ok(Value::Array(
            groups
                .into_iter()
                .map(|group| {
                    let mut row = vec![json!(group.name)];
                    row.extend(group.fields.into_iter().map(|field| json!(field)));
                    Value::Array(row)
                })
                .collect(),
        ))
    }

    /// Log data for every requested run and field.
    ///
    /// Per run: the `[start_time, end_time]` pair first, then one block per
    /// field, each block a `[run, field]` header followed by `[time, value]`
    /// rows.
    pub fn read_log_data(
        &self,
        instrument: &str,
        cycle: &str,
        runs: &str,
        fields: &str,
    ) -> Result<Value> {
        info!(instrument, cycle, runs, "reading log data");
        let mut payload = Vec::new();
        for run in split_list(runs) {
            let file = self.open_run(instrument, cycle, run)?;
            let (start_time, end_time) = file.run_times()?;
            let mut blocks = vec![json!([start_time, end_time])];
            for field in split_list(fields) {
                blocks.push(nexus::extract_series(&file, field, run)?.to_rows());
            }
            payload.push(Value::Array(blocks));
        }
        Ok(Value::Array(payload))
    }

    /// Detector spectrum at `index` for every requested run, prefixed by a
    /// `[runs, index, "detector"]` header.
    pub fn read_spectrum(
        &self,
        instrument: &str,
        cycle: &str,
        runs: &str,
        index: &str,
    ) -> Result<Value> {
        let spectrum_index = parse_index(index, "spectrum")?;
        let mut payload = vec![json!([runs, index, "detector"])];
        for run in split_list(runs) {
            let file = self.open_run(instrument, cycle, run)?;
            payload.push(nexus::extract_spectrum(&file, spectrum_index)?.to_rows());
        }
        Ok(Value::Array(payload))
    }

    /// Monitor spectrum at `index` for every requested run, prefixed by a
    /// `[runs, index, "monitor"]` header.
    pub fn read_monitor(
        &self,
        instrument: &str,
        cycle: &str,
        runs: &str,
        index: &str,
    ) -> Result<Value> {
        let monitor_index = parse_index(index, "monitor")?;
        let mut payload = vec![json!([runs, index, "monitor"])];
        for run in split_list(runs) {
            let file = self.open_run(instrument, cycle, run)?;
            payload.push(nexus::extract_monitor(&file, monitor_index)?.to_rows());
        }
        Ok(Value::Array(payload))
    }

    /// Count of addressable detector spectra, probed on the first run.
    pub fn read_spectrum_range(&self, instrument: &str, cycle: &str, runs: &str) -> Result<Value> {
        let run = first_item(runs, "run")?;
        let file = self.open_run(instrument, cycle, run)?;
        Ok(json!(nexus::spectrum_range(&file)?))
    }

    /// Highest monitor number present, probed on the first run.
    pub fn read_monitor_range(&self, instrument: &str, cycle: &str, runs: &str) -> Result<Value> {
        let run = first_item(runs, "run")?;
        let file = self.open_run(instrument, cycle, run)?;
        Ok(json!(nexus::monitor_range(&file)?))
    }

    /// `"<active>/<total>"` detector activity diagnostic for one run.
    pub fn detector_analysis(&self, instrument: &str, cycle: &str, run: &str) -> Result<Value> {
        let file = self.open_run(instrument, cycle, run)?;
        Ok(Value::String(nexus::detector_analysis(&file)?))
    }
}

/// Items of a semicolon-separated parameter, empty segments dropped.
fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(';').filter(|item| !item.is_empty())
}

fn first_item<'a>(list: &'a str, what: &str) -> Result<&'a str> {
    split_list(list)
        .next()
        .ok_or_else(|| JournalError::NotFound(format!("empty {what} list")))
}

fn parse_index(index: &str, what: &str) -> Result<usize> {
    index
        .parse::<usize>()
        .map_err(|_| JournalError::NotFound(format!("'{index}' is not a valid {what} index")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_drops_empty_segments() {
        let items: Vec<&str> = split_list("71158;;71159;").collect();
        assert_eq!(items, ["71158", "71159"]);
    }

    #[test]
    fn first_item_of_empty_list_is_an_error() {
        assert!(first_item("", "run").is_err());
        assert_eq!(first_item("a;b", "run").unwrap(), "a");
    }

    #[test]
    fn non_numeric_index_is_rejected() {
        let err = parse_index("five", "spectrum").unwrap_err();
        assert!(err.to_string().contains("five"));
    }
}
