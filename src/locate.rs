//! Data file location.
//!
//! Resolves an (instrument, cycle, run) triple to the physical `.nxs` file
//! under the shared data root. The naming convention only guarantees the
//! filename *suffix* (`...<run>.nxs`), so the walk returns the first match
//! in directory-walk order. This is a first-match policy, not a uniqueness
//! guarantee: duplicate suffixes under one cycle directory are not
//! disambiguated, and which duplicate wins depends on directory order.

use crate::error::{JournalError, Result};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Cycle data directory for an instrument:
/// `<data_root>/NDX<INSTRUMENT>/Instrument/data/<cycle>`.
///
/// Instrument identifiers are case-insensitive; the on-disk tree uses the
/// uppercased form.
pub fn data_directory(data_root: &Path, instrument: &str, cycle: &str) -> PathBuf {
    data_root
        .join(format!("NDX{}", instrument.to_uppercase()))
        .join("Instrument")
        .join("data")
        .join(cycle)
}

/// Locate the data file for a run.
///
/// Walks the cycle directory recursively and returns the first file whose
/// name ends with `<run>.nxs`. A missing or unreadable directory and an
/// absent match both surface as [`JournalError::NotFound`]; no raw I/O error
/// escapes this component.
pub fn locate(data_root: &Path, instrument: &str, cycle: &str, run: &str) -> Result<PathBuf> {
    let dir = data_directory(data_root, instrument, cycle);
    let suffix = format!("{run}.nxs");
    debug!(dir = %dir.display(), %suffix, "locating run data file");
    find_first(&dir, &suffix).ok_or_else(|| {
        JournalError::NotFound(format!(
            "no data file matching *{suffix} under {}",
            dir.display()
        ))
    })
}

/// Depth-first walk returning the first suffix match in directory order.
fn find_first(dir: &Path, suffix: &str) -> Option<PathBuf> {
    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_first(&path, suffix) {
                return Some(found);
            }
        } else if path
            .file_name()
            .and_then(OsStr::to_str)
            .is_some_and(|name| name.ends_with(suffix))
        {
            return Some(path);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn make_cycle_dir(root: &Path) -> PathBuf {
        let dir = data_directory(root, "emu", "cycle_20_1");
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn resolves_uppercased_instrument_path() {
        let dir = data_directory(Path::new("/isisdata"), "nimrod", "cycle_20_3");
        assert_eq!(
            dir,
            PathBuf::from("/isisdata/NDXNIMROD/Instrument/data/cycle_20_3")
        );
    }

    #[test]
    fn finds_file_by_run_suffix() {
        let root = TempDir::new().unwrap();
        let dir = make_cycle_dir(root.path());
        File::create(dir.join("EMU00071158.nxs")).unwrap();
        File::create(dir.join("EMU00071159.nxs")).unwrap();

        let found = locate(root.path(), "emu", "cycle_20_1", "71158").unwrap();
        assert!(found.ends_with("EMU00071158.nxs"));
    }

    #[test]
    fn descends_into_subdirectories() {
        let root = TempDir::new().unwrap();
        let dir = make_cycle_dir(root.path());
        let nested = dir.join("part_a");
        fs::create_dir_all(&nested).unwrap();
        File::create(nested.join("EMU00071200.nxs")).unwrap();

        let found = locate(root.path(), "EMU", "cycle_20_1", "71200").unwrap();
        assert!(found.ends_with("part_a/EMU00071200.nxs"));
    }

    #[test]
    fn missing_run_is_not_found() {
        let root = TempDir::new().unwrap();
        make_cycle_dir(root.path());
        let err = locate(root.path(), "emu", "cycle_20_1", "99999").unwrap_err();
        assert!(matches!(err, JournalError::NotFound(_)));
    }

    #[test]
    fn missing_cycle_directory_is_not_found() {
        let root = TempDir::new().unwrap();
        let err = locate(root.path(), "emu", "cycle_99_9", "71158").unwrap_err();
        assert!(matches!(err, JournalError::NotFound(_)));
    }

    #[test]
    fn suffix_must_include_extension() {
        let root = TempDir::new().unwrap();
        let dir = make_cycle_dir(root.path());
        File::create(dir.join("EMU00071158.log")).unwrap();
        assert!(locate(root.path(), "emu", "cycle_20_1", "71158").is_err());
    }
}
