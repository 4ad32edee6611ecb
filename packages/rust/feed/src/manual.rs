//! Curated manual entries, merged ahead of the feed.

use std::path::Path;

use protomerge_shared::{ProtomergeError, RawRecord, Result};
use tracing::{info, warn};

use crate::{json_kind, records_from_elements};

/// Read the manual entries file.
///
/// Returns `Ok(None)` when the file does not exist. A file that cannot be read,
/// is not JSON, or is not a top-level array is [`ProtomergeError::ManualFileParse`].
pub fn read_manual_entries(path: &Path) -> Result<Option<Vec<RawRecord>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ProtomergeError::manual_file(path, e.to_string()))?;

    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| ProtomergeError::manual_file(path, format!("invalid JSON: {e}")))?;

    let serde_json::Value::Array(elements) = value else {
        return Err(ProtomergeError::manual_file(
            path,
            format!("expected a top-level array, got {}", json_kind(&value)),
        ));
    };

    Ok(Some(records_from_elements(elements)))
}

/// Load manual entries, recovering from every failure with an empty set.
///
/// Manual entries are optional; a missing or broken file never stops a run.
pub fn load_manual_entries(path: &Path) -> Vec<RawRecord> {
    match read_manual_entries(path) {
        Ok(Some(records)) => {
            info!(path = %path.display(), count = records.len(), "loaded manual entries");
            records
        }
        Ok(None) => {
            warn!(path = %path.display(), "no manual entries file found; continuing without it");
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "ignoring manual entries file");
            Vec::new()
        }
    }
}
