//! Field pruning

use std::path::Path;
use tracing::{debug, info};
use transectaz_core::io::UpdateCursor;
use transectaz_core::Result;

/// Remove each of `fields` from the dataset's attribute table.
///
/// Absent fields are skipped, so pruning is idempotent. Returns the names
/// of the fields that were actually removed, as spelled in the table.
pub fn prune_fields<S: AsRef<str>>(path: impl AsRef<Path>, fields: &[S]) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut cursor = UpdateCursor::open(path)?;

    let mut removed = Vec::new();
    for name in fields {
        match cursor.delete_field(name.as_ref()) {
            Some(def) => removed.push(def.name),
            None => debug!("Field {} not present in {}, skipping", name.as_ref(), path.display()),
        }
    }
    cursor.commit()?;

    info!("Removed {} fields from {}", removed.len(), path.display());
    Ok(removed)
}
