//! Journal metadata: fetching, parsing and searching.
//!
//! The engine never opens network sockets itself. Documents arrive through
//! the [`JournalFetcher`] trait; the transport shell supplies an
//! implementation for its environment (HTTP, mounted share, ...). A
//! filesystem-backed fetcher for local journal mirrors ships here and doubles
//! as the test fixture base.

pub mod parser;
pub mod search;

pub use parser::{parse_cycle_document, parse_cycle_list, JournalRecord};
pub use search::JournalSearchEngine;

use crate::error::{JournalError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// A fetched journal document plus the source's last-modification time.
///
/// The timestamp feeds the change-polling mechanism; fetchers that cannot
/// report one leave it `None` and polling becomes a no-op for them.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Raw XML body.
    pub body: String,
    /// Source `Last-Modified` equivalent, if the fetcher knows it.
    pub last_modified: Option<DateTime<Utc>>,
}

/// Source of journal documents for an instrument.
///
/// `instrument` is case-insensitive; implementations normalize it to their
/// storage convention. Both methods are plain blocking-or-async I/O; the
/// search engine wraps every call in a bounded timeout, so implementations
/// need no timeout logic of their own.
#[async_trait]
pub trait JournalFetcher: Send + Sync {
    /// Fetch the instrument's index document (`journal_main.xml`).
    async fn fetch_index(&self, instrument: &str) -> Result<FetchedDocument>;

    /// Fetch one cycle's journal document. `cycle` is a name taken from the
    /// index, which by convention is the journal file name itself.
    async fn fetch_cycle(&self, instrument: &str, cycle: &str) -> Result<FetchedDocument>;
}

/// Fetcher reading a local mirror of the journal tree.
///
/// Mirrors keep the remote layout: `<root>/ndx<instrument>/journal_main.xml`
/// next to the per-cycle journal files. Last-modification comes from file
/// mtime.
#[derive(Debug, Clone)]
pub struct FileSystemFetcher {
    root: PathBuf,
}

impl FileSystemFetcher {
    /// Create a fetcher over a mirror root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn instrument_dir(&self, instrument: &str) -> PathBuf {
        self.root.join(format!("ndx{}", instrument.to_lowercase()))
    }

    fn load(&self, path: &Path) -> Result<FetchedDocument> {
        let body = fs::read_to_string(path)
            .map_err(|err| JournalError::Fetch(format!("{}: {err}", path.display())))?;
        let last_modified = fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        Ok(FetchedDocument {
            body,
            last_modified,
        })
    }
}

#[async_trait]
impl JournalFetcher for FileSystemFetcher {
    async fn fetch_index(&self, instrument: &str) -> Result<FetchedDocument> {
        self.load(&self.instrument_dir(instrument).join("journal_main.xml"))
    }

    async fn fetch_cycle(&self, instrument: &str, cycle: &str) -> Result<FetchedDocument> {
        self.load(&self.instrument_dir(instrument).join(cycle))
    }
}
