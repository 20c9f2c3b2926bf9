//! Incremental rebuild decisions
//!
//! A unit is stale when its object is missing or its source was modified in
//! a later second than the object. Timestamps are compared at one-second
//! granularity: an edit landing in the same second as the previous compile
//! is not detected. Filesystems with coarser clocks (FAT: 2s) only widen
//! that window.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::pipeline::SourceUnit;
use crate::error::FilesystemError;
use crate::infra::filesystem::modified_time;

/// Whether `output` must be rebuilt from `input`
///
/// Fails if `input` does not exist.
pub fn is_stale(output: &Path, input: &Path) -> Result<bool, FilesystemError> {
    let input_time = modified_time(input)?.ok_or_else(|| FilesystemError::SourceMissing {
        path: input.to_path_buf(),
    })?;

    let Some(output_time) = modified_time(output)? else {
        tracing::debug!(output = %output.display(), "no object, stale");
        return Ok(true);
    };

    let stale = whole_seconds(input_time) > whole_seconds(output_time);
    tracing::debug!(input = %input.display(), stale, "compared timestamps");
    Ok(stale)
}

/// Units that need compiling, in discovery order
pub fn rebuild_set(units: &[SourceUnit]) -> Result<Vec<SourceUnit>, FilesystemError> {
    let mut stale = Vec::new();
    for unit in units {
        if is_stale(&unit.object, &unit.source)? {
            stale.push(unit.clone());
        }
    }
    Ok(stale)
}

/// Seconds since the epoch; pre-epoch times count as negative
fn whole_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(before) => {
            let before = before.duration();
            let secs = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}
