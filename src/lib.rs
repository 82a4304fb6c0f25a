//! # NeXus Journal Core Library
//!
//! This crate is the run-data extraction and journal-search engine behind a
//! neutron-scattering data browser. It gives remote clients structured access
//! to per-cycle run metadata ("journals", XML indexes maintained per
//! instrument) and to per-run measurement data (sample/run logs, detector
//! spectra, monitor spectra) stored as NeXus/HDF5 files under a shared data
//! root. The transport shell that carries results to clients (HTTP, the
//! bundled CLI, whatever) sits outside this crate; everything here is pure
//! transformation over documents and files supplied by a fetcher or the
//! filesystem.
//!
//! ## Crate Structure
//!
//! - **`api`**: The `JournalService` facade exposing the public operations
//!   (list cycles, search journals, read log data, read spectra, ...) with
//!   plain-string inputs and JSON payloads, as consumed by a transport shell.
//! - **`config`**: `Settings` loaded from TOML via the `config` crate: data
//!   root, journal mirror root, fetch timeout, log level.
//! - **`error`**: The `JournalError` taxonomy (`Fetch`, `NotFound`,
//!   `SchemaMismatch`, `DataCorruption`, `Timeout`) and the structured
//!   `{"response": "ERR. ..."}` payload every failure is rendered to.
//! - **`format`**: Display formatting for journal records: relative date
//!   rendering ("Today at: ...") and `duration` seconds to `HH:MM:SS`.
//! - **`journal`**: The XML side: the `JournalFetcher` trait, cycle-document
//!   parsing into ordered `JournalRecord`s, and the multi-cycle
//!   `JournalSearchEngine` with change polling.
//! - **`locate`**: Resolution of an (instrument, cycle, run) triple to the
//!   physical `.nxs` file under the platform data root.
//! - **`nexus`**: The HDF5 side: opening run files, cataloguing log groups,
//!   extracting time-series log fields and detector/monitor spectra.

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod journal;
pub mod locate;
pub mod nexus;
