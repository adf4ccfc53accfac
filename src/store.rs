// Persistence for batch results: the failed-polls list read at the start of
// a retry run, and the resolved / still-pending files written at the end of
// every run.

use crate::error::{Result, UploaderError};
use crate::model::{PendingOperation, ResolvedAssets};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Read previously unresolved operations.
pub fn load_pending(path: &Path) -> Result<Vec<PendingOperation>> {
    if !path.exists() {
        return Err(UploaderError::NotFound(path.to_path_buf()));
    }
    let data = fs::read_to_string(path)?;
    let ops: Vec<PendingOperation> = serde_json::from_str(&data)?;
    tracing::debug!(path = %path.display(), count = ops.len(), "Loaded pending operations");
    Ok(ops)
}

/// Write the name → asset id map. Always writes, even when empty.
pub fn save_resolved(path: &Path, assets: &ResolvedAssets) -> Result<()> {
    write_pretty(path, assets)?;
    tracing::info!(path = %path.display(), count = assets.len(), "Saved asset ids");
    Ok(())
}

/// Write still-pending operations. Nothing is written for an empty list;
/// returns whether a file was created.
pub fn save_unresolved(path: &Path, ops: &[PendingOperation]) -> Result<bool> {
    if ops.is_empty() {
        return Ok(false);
    }
    write_pretty(path, ops)?;
    tracing::warn!(path = %path.display(), count = ops.len(), "Saved unresolved operations");
    Ok(true)
}

// Four-space indentation keeps the files diff-friendly with earlier runs.
fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    fs::write(path, buf)?;
    Ok(())
}
