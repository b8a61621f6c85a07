//! I/O operations for reading and writing vector datasets and their locks

mod cursor;
pub mod dbf;
mod paths;
mod shp;

pub use cursor::{DatasetLock, UpdateCursor};
pub use paths::{derive_output_path, DatasetPaths, OUTPUT_SUFFIX};
pub use shp::{create_shapefile, ensure_absent, read_shapefile, Dataset, GeometryKind};
