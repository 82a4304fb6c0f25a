//! Multi-cycle journal search and change polling.
//!
//! `JournalSearchEngine` iterates an instrument's cycles in index order,
//! parsing one journal document per cycle. Scans are fail-fast: the first
//! unreachable cycle aborts the whole search with a fetch error rather than
//! returning partial results.
//!
//! The first entry of every index is excluded before scanning. The upstream
//! index lists a bootstrap record there that does not correspond to a run
//! cycle; whether that entry is always non-run data or the exclusion hides
//! the oldest real cycle is an open product question (tracked in DESIGN.md),
//! so the behavior is preserved as-is.

use crate::error::{JournalError, Result};
use crate::journal::{parser, FetchedDocument, JournalFetcher, JournalRecord};
use chrono::{DateTime, Utc};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;
use tracing::{debug, info};

/// Journal field searched when the caller does not name one.
pub const DEFAULT_SEARCH_FIELD: &str = "user_name";

/// Journal field holding the run number.
pub const RUN_NUMBER_FIELD: &str = "run_number";

/// Per-instrument last-seen index timestamps for change polling.
///
/// Mutex-guarded: concurrent polls for one instrument are a read-modify-write
/// sequence, and the guard makes the compare-and-update atomic. Keys are
/// lowercased instrument names.
#[derive(Debug, Default)]
struct PollCache {
    last_seen: Mutex<HashMap<String, DateTime<Utc>>>,
}

impl PollCache {
    /// Record the first observed timestamp without treating it as a change.
    fn seed(&self, instrument: &str, timestamp: DateTime<Utc>) {
        let mut map = self
            .last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        map.entry(instrument.to_lowercase()).or_insert(timestamp);
    }

    /// Compare-and-update. Returns true when `timestamp` is strictly newer
    /// than the stored value; the first observation stores without signaling.
    fn observe(&self, instrument: &str, timestamp: DateTime<Utc>) -> bool {
        let mut map = self
            .last_seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match map.entry(instrument.to_lowercase()) {
            Entry::Vacant(slot) => {
                slot.insert(timestamp);
                false
            }
            Entry::Occupied(mut slot) => {
                if timestamp > *slot.get() {
                    slot.insert(timestamp);
                    true
                } else {
                    false
                }
            }
        }
    }
}

/// Cross-cycle search, run lookup and change polling over a fetcher.
pub struct JournalSearchEngine<F> {
    fetcher: F,
    fetch_timeout: Duration,
    poll: PollCache,
}

impl<F: JournalFetcher> JournalSearchEngine<F> {
    /// Create an engine. `fetch_timeout` bounds every document fetch so one
    /// unreachable resource cannot stall a caller indefinitely.
    pub fn new(fetcher: F, fetch_timeout: Duration) -> Self {
        Self {
            fetcher,
            fetch_timeout,
            poll: PollCache::default(),
        }
    }

    async fn fetch_index(&self, instrument: &str) -> Result<FetchedDocument> {
        tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch_index(instrument))
            .await
            .map_err(|_| JournalError::Timeout(format!("journal index for {instrument}")))?
    }

    async fn fetch_cycle(&self, instrument: &str, cycle: &str) -> Result<FetchedDocument> {
        tokio::time::timeout(self.fetch_timeout, self.fetcher.fetch_cycle(instrument, cycle))
            .await
            .map_err(|_| JournalError::Timeout(format!("journal {cycle} for {instrument}")))?
    }

    /// Ordered cycle list from the instrument index, bootstrap entry
    /// included. Also seeds the poll cache on the first successful fetch.
    pub async fn list_cycles(&self, instrument: &str) -> Result<Vec<String>> {
        let doc = self.fetch_index(instrument).await?;
        let cycles = parser::parse_cycle_list(&doc.body)?;
        if let Some(modified) = doc.last_modified {
            self.poll.seed(instrument, modified);
        }
        debug!(instrument, count = cycles.len(), "listed cycles");
        Ok(cycles)
    }

    /// Parsed records of one cycle's journal.
    pub async fn journal(&self, instrument: &str, cycle: &str) -> Result<Vec<JournalRecord>> {
        let doc = self.fetch_cycle(instrument, cycle).await?;
        parser::parse_cycle_document(&doc.body)
    }

    /// Cycles that searches iterate: the index list minus its bootstrap
    /// first entry.
    async fn run_cycles(&self, instrument: &str) -> Result<Vec<String>> {
        let mut cycles = self.list_cycles(instrument).await?;
        if !cycles.is_empty() {
            cycles.remove(0);
        }
        Ok(cycles)
    }

    /// Search every cycle for records whose `field` value contains `needle`
    /// as a case-sensitive substring.
    ///
    /// Matches concatenate in cycle-list order; an empty result is success.
    /// The first unreachable cycle aborts the scan.
    pub async fn search_all_cycles(
        &self,
        instrument: &str,
        field: &str,
        needle: &str,
    ) -> Result<Vec<JournalRecord>> {
        let cycles = self.run_cycles(instrument).await?;
        let mut matches = Vec::new();
        for cycle in &cycles {
            let records = self.journal(instrument, cycle).await?;
            matches.extend(
                records
                    .into_iter()
                    .filter(|record| record.get(field).is_some_and(|value| value.contains(needle))),
            );
        }
        info!(
            instrument,
            field,
            needle,
            matches = matches.len(),
            "journal search complete"
        );
        Ok(matches)
    }

    /// First cycle (in index order) whose journal contains an exact
    /// `run_number` match. Early exit: remaining cycles are not scanned, so
    /// the result inherits whatever order the index reports.
    pub async fn find_cycle_for_run(&self, instrument: &str, run_number: &str) -> Result<String> {
        let cycles = self.run_cycles(instrument).await?;
        for cycle in cycles {
            let records = self.journal(instrument, &cycle).await?;
            if records
                .iter()
                .any(|record| record.get(RUN_NUMBER_FIELD) == Some(run_number))
            {
                debug!(instrument, run_number, %cycle, "run located");
                return Ok(cycle);
            }
        }
        Err(JournalError::NotFound(format!(
            "run {run_number} not present in any cycle of {instrument}"
        )))
    }

    /// Change poll: has the instrument's index been modified since last seen?
    ///
    /// Returns the most recently listed cycle name when the index reports a
    /// newer last-modified time (signaling "re-fetch"), `None` otherwise.
    /// The first observation for an instrument establishes the baseline
    /// without signaling a change.
    pub async fn ping_cycle(&self, instrument: &str) -> Result<Option<String>> {
        let doc = self.fetch_index(instrument).await?;
        let Some(modified) = doc.last_modified else {
            return Ok(None);
        };
        if !self.poll.observe(instrument, modified) {
            return Ok(None);
        }
        info!(instrument, %modified, "journal index changed");
        let cycles = parser::parse_cycle_list(&doc.body)?;
        Ok(cycles.last().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Canned fetcher: an index body plus per-cycle documents, counting
    /// cycle fetches so early-exit behavior is observable.
    struct MockFetcher {
        index: StdMutex<FetchedDocument>,
        cycles: HashMap<String, String>,
        cycle_fetches: AtomicUsize,
    }

    impl MockFetcher {
        fn new(cycle_names: &[&str], cycles: &[(&str, &str)]) -> Self {
            let body = index_body(cycle_names);
            Self {
                index: StdMutex::new(FetchedDocument {
                    body,
                    last_modified: Some(Utc.with_ymd_and_hms(2020, 11, 1, 0, 0, 0).unwrap()),
                }),
                cycles: cycles
                    .iter()
                    .map(|(name, body)| (name.to_string(), body.to_string()))
                    .collect(),
                cycle_fetches: AtomicUsize::new(0),
            }
        }

        fn touch_index(&self, names: &[&str], modified: DateTime<Utc>) {
            *self.index.lock().unwrap() = FetchedDocument {
                body: index_body(names),
                last_modified: Some(modified),
            };
        }
    }

    fn index_body(names: &[&str]) -> String {
        let entries: String = names
            .iter()
            .map(|name| format!("<file name=\"{name}\"/>"))
            .collect();
        format!("<journal>{entries}</journal>")
    }

    fn cycle_body(runs: &[(&str, &str)]) -> String {
        let entries: String = runs
            .iter()
            .map(|(run, user)| {
                format!(
                    "<NXentry><run_number>{run}</run_number><user_name>{user}</user_name></NXentry>"
                )
            })
            .collect();
        format!("<NXroot>{entries}</NXroot>")
    }

    #[async_trait]
    impl JournalFetcher for MockFetcher {
        async fn fetch_index(&self, _instrument: &str) -> Result<FetchedDocument> {
            Ok(self.index.lock().unwrap().clone())
        }

        async fn fetch_cycle(&self, _instrument: &str, cycle: &str) -> Result<FetchedDocument> {
            self.cycle_fetches.fetch_add(1, Ordering::SeqCst);
            self.cycles
                .get(cycle)
                .map(|body| FetchedDocument {
                    body: body.clone(),
                    last_modified: None,
                })
                .ok_or_else(|| JournalError::Fetch(format!("{cycle} unreachable")))
        }
    }

    fn engine(fetcher: MockFetcher) -> JournalSearchEngine<MockFetcher> {
        JournalSearchEngine::new(fetcher, Duration::from_secs(5))
    }

    fn three_cycle_fetcher() -> MockFetcher {
        MockFetcher::new(
            &["journal.xml", "journal_20_1.xml", "journal_20_2.xml"],
            &[
                (
                    "journal_20_1.xml",
                    &cycle_body(&[("100", "Dr Smith"), ("101", "Jones")]),
                ),
                (
                    "journal_20_2.xml",
                    &cycle_body(&[("200", "smithers"), ("201", "Dr Smith")]),
                ),
            ],
        )
    }

    #[tokio::test]
    async fn search_skips_bootstrap_entry_and_concatenates_in_cycle_order() {
        let engine = engine(three_cycle_fetcher());
        let matches = engine
            .search_all_cycles("emu", DEFAULT_SEARCH_FIELD, "mith")
            .await
            .unwrap();
        let runs: Vec<&str> = matches
            .iter()
            .filter_map(|record| record.get(RUN_NUMBER_FIELD))
            .collect();
        // "journal.xml" is never fetched; matches follow cycle order.
        assert_eq!(runs, ["100", "200", "201"]);
    }

    #[tokio::test]
    async fn search_is_case_sensitive() {
        let engine = engine(three_cycle_fetcher());
        let matches = engine
            .search_all_cycles("emu", DEFAULT_SEARCH_FIELD, "Smith")
            .await
            .unwrap();
        assert_eq!(matches.len(), 2);
    }

    #[tokio::test]
    async fn search_without_matches_is_empty_success() {
        let engine = engine(three_cycle_fetcher());
        let matches = engine
            .search_all_cycles("emu", DEFAULT_SEARCH_FIELD, "nobody")
            .await
            .unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn unreachable_cycle_aborts_scan() {
        let fetcher = MockFetcher::new(
            &["journal.xml", "journal_missing.xml", "journal_20_2.xml"],
            &[("journal_20_2.xml", &cycle_body(&[("200", "Dr Smith")]))],
        );
        let engine = engine(fetcher);
        let err = engine
            .search_all_cycles("emu", DEFAULT_SEARCH_FIELD, "Smith")
            .await
            .unwrap_err();
        assert!(matches!(err, JournalError::Fetch(_)));
    }

    #[tokio::test]
    async fn find_cycle_for_run_stops_at_first_match() {
        let engine = engine(three_cycle_fetcher());
        let cycle = engine.find_cycle_for_run("emu", "101").await.unwrap();
        assert_eq!(cycle, "journal_20_1.xml");
        // Early exit: only the first run cycle was fetched.
        assert_eq!(engine.fetcher.cycle_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn find_cycle_for_run_requires_exact_match() {
        let engine = engine(three_cycle_fetcher());
        // "10" is a prefix of real run numbers but not an exact one.
        let err = engine.find_cycle_for_run("emu", "10").await.unwrap_err();
        assert!(matches!(err, JournalError::NotFound(_)));
    }

    #[tokio::test]
    async fn ping_baselines_then_signals_newer_index() {
        let fetcher = three_cycle_fetcher();
        let engine = engine(fetcher);

        // First observation establishes the baseline.
        assert_eq!(engine.ping_cycle("emu").await.unwrap(), None);
        // Unchanged index stays quiet.
        assert_eq!(engine.ping_cycle("emu").await.unwrap(), None);

        engine.fetcher.touch_index(
            &[
                "journal.xml",
                "journal_20_1.xml",
                "journal_20_2.xml",
                "journal_20_3.xml",
            ],
            Utc.with_ymd_and_hms(2020, 12, 1, 0, 0, 0).unwrap(),
        );
        assert_eq!(
            engine.ping_cycle("emu").await.unwrap(),
            Some("journal_20_3.xml".to_string())
        );
        // The newer timestamp became the stored baseline.
        assert_eq!(engine.ping_cycle("emu").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_cycles_seeds_poll_baseline() {
        let engine = engine(three_cycle_fetcher());
        let cycles = engine.list_cycles("emu").await.unwrap();
        assert_eq!(cycles.len(), 3);
        // The listing's timestamp is the baseline, so an identical index
        // does not signal a change.
        assert_eq!(engine.ping_cycle("emu").await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_cycles_is_stable_absent_index_change() {
        let engine = engine(three_cycle_fetcher());
        let first = engine.list_cycles("emu").await.unwrap();
        let second = engine.list_cycles("emu").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetch_times_out() {
        struct StallingFetcher;

        #[async_trait]
        impl JournalFetcher for StallingFetcher {
            async fn fetch_index(&self, _instrument: &str) -> Result<FetchedDocument> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(JournalError::Fetch("unreachable".into()))
            }

            async fn fetch_cycle(&self, _i: &str, _c: &str) -> Result<FetchedDocument> {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(JournalError::Fetch("unreachable".into()))
            }
        }

        let engine = JournalSearchEngine::new(StallingFetcher, Duration::from_secs(1));
        let err = engine.list_cycles("emu").await.unwrap_err();
        assert!(matches!(err, JournalError::Timeout(_)));
    }
}
