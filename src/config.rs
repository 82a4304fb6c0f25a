//! Configuration management.
use crate::error::JournalError;
use config::Config;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Engine settings, loaded from `config/<name>.toml`.
///
/// Every field has a default so the engine runs without a config file; a
/// site installation overrides the data and journal roots.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Root of the instrument data tree
    /// (`<data_root>/NDX<INSTRUMENT>/Instrument/data/<cycle>/`).
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    /// Root of the journal index mirror consumed by the filesystem fetcher.
    #[serde(default = "default_journal_root")]
    pub journal_root: PathBuf,
    /// Upper bound on each journal fetch, in seconds.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Settings {
    /// Load settings from `config/<name>.toml`, defaulting every missing key.
    ///
    /// A missing file is not an error; the built-in defaults apply.
    pub fn new(config_name: Option<&str>) -> Result<Self, JournalError> {
        let config_path = format!("config/{}", config_name.unwrap_or("default"));
        let s = Config::builder()
            .add_source(config::File::with_name(&config_path).required(false))
            .build()
            .map_err(JournalError::Config)?;

        s.try_deserialize().map_err(JournalError::Config)
    }

    /// The fetch bound as a `Duration`.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_root: default_data_root(),
            journal_root: default_journal_root(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

// Platform convention inherited from the facility file servers.
fn default_data_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("/ISISdata/inst$")
    } else {
        PathBuf::from("/isisdata")
    }
}

fn default_journal_root() -> PathBuf {
    default_data_root().join("journals")
}

fn default_fetch_timeout_secs() -> u64 {
    30
}
