//! Scoped, locked access to a dataset's attribute table
//!
//! An [`UpdateCursor`] takes an exclusive OS lock on the dataset when it is
//! opened and gives it back when it is dropped, on every exit path. Edits
//! are staged in memory and reach the disk only through [`UpdateCursor::commit`].

use crate::error::{Error, Result};
use crate::io::dbf;
use crate::io::paths::DatasetPaths;
use crate::vector::{Attributes, FieldDef, Schema};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Exclusive advisory lock on a dataset, held through a `<name>.shp.lock`
/// sidecar file
#[derive(Debug)]
pub struct DatasetLock {
    file: File,
    path: PathBuf,
}

impl DatasetLock {
    /// Try to lock the dataset without blocking.
    ///
    /// Fails with [`Error::ResourceLocked`] if another handle holds the lock.
    pub fn acquire(paths: &DatasetPaths) -> Result<Self> {
        let path = paths.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("Locked {}", paths.shp.display());
                Ok(Self { file, path })
            }
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(Error::ResourceLocked {
                    path: paths.shp.clone(),
                })
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

// The sidecar stays on disk: unlinking it would let a waiter that already
// opened it and a newcomer that recreates it both hold the lock.
impl Drop for DatasetLock {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released {}", self.path.display()),
            Err(e) => warn!("Failed to unlock {}: {}", self.path.display(), e),
        }
    }
}

/// Read-modify-write handle over the attribute table of one dataset
#[derive(Debug)]
pub struct UpdateCursor {
    paths: DatasetPaths,
    schema: Schema,
    rows: Vec<Attributes>,
    dirty: bool,
    _lock: DatasetLock,
}

impl UpdateCursor {
    /// Lock the dataset at `path` and load its attribute table
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let paths = DatasetPaths::new(path)?;
        paths.ensure_exists()?;
        let lock = DatasetLock::acquire(&paths)?;
        let (schema, rows) = dbf::read_table(&paths.dbf)?;

        Ok(Self {
            paths,
            schema,
            rows,
            dirty: false,
            _lock: lock,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[Attributes] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dataset(&self) -> &DatasetPaths {
        &self.paths
    }

    /// Apply `f` to every row exactly once, in table order.
    ///
    /// Stops at the first error; nothing is written until [`commit`](Self::commit).
    pub fn update_rows<F>(&mut self, mut f: F) -> Result<usize>
    where
        F: FnMut(usize, &mut Attributes) -> Result<()>,
    {
        for (idx, row) in self.rows.iter_mut().enumerate() {
            f(idx, row)?;
        }
        self.dirty = true;
        Ok(self.rows.len())
    }

    /// Remove a column from the table. Returns `None` if it does not exist.
    pub fn delete_field(&mut self, name: &str) -> Option<FieldDef> {
        let removed = self.schema.remove(name)?;
        for row in &mut self.rows {
            row.remove(&removed.name);
        }
        self.dirty = true;
        Some(removed)
    }

    /// Write staged changes back and release the lock
    pub fn commit(self) -> Result<()> {
        if self.dirty {
            dbf::write_table(&self.paths.dbf, &self.schema, &self.rows)?;
        }
        Ok(())
    }
}
