//! Log field catalog.
//!
//! Enumerates the log containers of an open run file: every direct child of
//! `raw_data_1` whose name ends with `log` (`selog`, `runlog`, `framelog`,
//! ...) together with the full paths of its members. Order follows the
//! container's iteration order, not a lexical sort; callers must not assume
//! sorted output.

use super::{RunFile, MAIN_GROUP};
use crate::error::{JournalError, Result};
use serde::Serialize;

/// One log container and the field paths under it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LogGroup {
    /// Group name inside `raw_data_1`, e.g. `selog`.
    pub name: String,
    /// Absolute HDF5 paths of the group's members.
    pub fields: Vec<String>,
}

/// Enumerate the `*log` groups of a run file.
pub fn catalog_fields(file: &RunFile) -> Result<Vec<LogGroup>> {
    let main = file.main_group()?;
    let members = main
        .member_names()
        .map_err(|err| JournalError::SchemaMismatch(format!("{MAIN_GROUP}: {err}")))?;

    let mut groups = Vec::new();
    for name in members {
        if !name.ends_with("log") {
            continue;
        }
        let group = main
            .group(&name)
            .map_err(|err| JournalError::SchemaMismatch(format!("{name}: {err}")))?;
        let fields = group
            .member_names()
            .map_err(|err| JournalError::SchemaMismatch(format!("{name}: {err}")))?
            .into_iter()
            .map(|member| format!("/{MAIN_GROUP}/{name}/{member}"))
            .collect();
        groups.push(LogGroup { name, fields });
    }
    Ok(groups)
}
