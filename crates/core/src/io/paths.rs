//! Shapefile component paths and output naming

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Suffix appended to the input stem to name the azimuth output
pub const OUTPUT_SUFFIX: &str = "_az";

/// The sibling files that make up one shapefile dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub shp: PathBuf,
    pub shx: PathBuf,
    pub dbf: PathBuf,
    pub prj: PathBuf,
    pub cpg: PathBuf,
}

impl DatasetPaths {
    /// Resolve the components of the dataset whose main file is `path`.
    ///
    /// Sidecar extensions follow the case of the `.shp` extension.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let shp = path.as_ref().to_path_buf();
        let ext = shp
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| Error::invalid_input(format!("not a shapefile: {}", shp.display())))?;
        if !ext.eq_ignore_ascii_case("shp") {
            return Err(Error::invalid_input(format!(
                "not a shapefile: {}",
                shp.display()
            )));
        }

        let upper = ext.chars().all(|c| c.is_ascii_uppercase());
        let sibling = |e: &str| {
            if upper {
                shp.with_extension(e.to_ascii_uppercase())
            } else {
                shp.with_extension(e)
            }
        };

        Ok(Self {
            shx: sibling("shx"),
            dbf: sibling("dbf"),
            prj: sibling("prj"),
            cpg: sibling("cpg"),
            shp,
        })
    }

    /// Mandatory components: geometry, index and attribute table
    pub fn required(&self) -> [&Path; 3] {
        [&self.shp, &self.shx, &self.dbf]
    }

    /// Components that currently exist on disk
    pub fn existing(&self) -> Vec<&Path> {
        [&self.shp, &self.shx, &self.dbf, &self.prj, &self.cpg]
            .into_iter()
            .map(PathBuf::as_path)
            .filter(|p| p.exists())
            .collect()
    }

    /// Fail unless all mandatory components exist
    pub fn ensure_exists(&self) -> Result<()> {
        for p in self.required() {
            if !p.exists() {
                return Err(Error::invalid_input(format!(
                    "missing dataset component: {}",
                    p.display()
                )));
            }
        }
        Ok(())
    }

    /// Path of the sidecar file used for dataset locking
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.shp.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.shp.with_file_name(name)
    }

    /// Dataset name: the file stem of the `.shp`
    pub fn name(&self) -> String {
        self.shp
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Derive the output path for an input dataset: the stem gets `suffix`
/// and the original extension is kept (`MyUnit123.shp` becomes
/// `MyUnit123_az.shp`).
pub fn derive_output_path(input: impl AsRef<Path>, suffix: &str) -> Result<PathBuf> {
    let input = input.as_ref();
    let stem = input
        .file_stem()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::invalid_input(format!("input has no file name: {}", input.display())))?;

    let mut name = stem.to_os_string();
    name.push(suffix);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }
    Ok(input.with_file_name(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path_keeps_directory_and_extension() {
        assert_eq!(
            derive_output_path("Field42.shp", OUTPUT_SUFFIX).unwrap(),
            PathBuf::from("Field42_az.shp")
        );
        assert_eq!(
            derive_output_path("/data/soils/MyUnit123.shp", OUTPUT_SUFFIX).unwrap(),
            PathBuf::from("/data/soils/MyUnit123_az.shp")
        );
        assert_eq!(
            derive_output_path("unit.v2.SHP", OUTPUT_SUFFIX).unwrap(),
            PathBuf::from("unit.v2_az.SHP")
        );
    }

    #[test]
    fn test_output_path_requires_file_name() {
        assert!(derive_output_path("", OUTPUT_SUFFIX).is_err());
    }

    #[test]
    fn test_components() {
        let p = DatasetPaths::new("/tmp/t/Field42.shp").unwrap();
        assert_eq!(p.dbf, PathBuf::from("/tmp/t/Field42.dbf"));
        assert_eq!(p.prj, PathBuf::from("/tmp/t/Field42.prj"));
        assert_eq!(p.lock_path(), PathBuf::from("/tmp/t/Field42.shp.lock"));
        assert_eq!(p.name(), "Field42");

        let upper = DatasetPaths::new("LINES.SHP").unwrap();
        assert_eq!(upper.shx, PathBuf::from("LINES.SHX"));
    }

    #[test]
    fn test_rejects_other_extensions() {
        assert!(DatasetPaths::new("lines.geojson").is_err());
        assert!(DatasetPaths::new("lines").is_err());
    }
}
