//! Map documents
//!
//! A map document is a JSON file holding an ordered layer stack. A
//! [`MapSession`] is an open document bound to its backing file; it is the
//! explicit handle publishing code receives instead of looking up a
//! "current" map.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Where a new layer goes in the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayerPosition {
    /// Drawn above every other layer
    #[default]
    Top,
    Bottom,
}

fn default_visible() -> bool {
    true
}

/// A dataset shown on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    pub source: PathBuf,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl Layer {
    /// Visible layer named after the file stem of `source`
    pub fn from_source(source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let name = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.display().to_string());
        Self {
            name,
            source,
            visible: true,
        }
    }
}

/// Persisted map state. `layers[0]` is the top of the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDocument {
    pub title: String,
    #[serde(default)]
    pub layers: Vec<Layer>,
    /// Seconds since the Unix epoch of the last save
    #[serde(default)]
    pub saved_at: Option<u64>,
}

impl MapDocument {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            layers: Vec::new(),
            saved_at: None,
        }
    }

    /// Insert a layer. A layer with the same source is moved rather than
    /// duplicated.
    pub fn add_layer(&mut self, layer: Layer, position: LayerPosition) {
        self.layers.retain(|l| l.source != layer.source);
        match position {
            LayerPosition::Top => self.layers.insert(0, layer),
            LayerPosition::Bottom => self.layers.push(layer),
        }
    }

    pub fn find_layer(&self, source: &Path) -> Option<&Layer> {
        self.layers.iter().find(|l| l.source == source)
    }

    pub fn top_layer(&self) -> Option<&Layer> {
        self.layers.first()
    }
}

/// An open map document and the file it was loaded from
#[derive(Debug)]
pub struct MapSession {
    path: PathBuf,
    document: MapDocument,
}

impl MapSession {
    /// Create a new, empty map document on disk
    pub fn create(path: impl Into<PathBuf>, title: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.exists() {
            return Err(Error::invalid_input(format!(
                "map document already exists: {}",
                path.display()
            )));
        }
        let mut session = Self {
            path,
            document: MapDocument::new(title),
        };
        session.save()?;
        Ok(session)
    }

    /// Open an existing map document
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|e| {
            Error::MapDocument(format!("cannot read {}: {}", path.display(), e))
        })?;
        let document: MapDocument = serde_json::from_str(&text)?;
        debug!(
            "Opened map {} with {} layers",
            path.display(),
            document.layers.len()
        );
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &MapDocument {
        &self.document
    }

    pub fn add_layer(&mut self, layer: Layer, position: LayerPosition) {
        info!("Adding layer {} to {}", layer.name, self.path.display());
        self.document.add_layer(layer, position);
    }

    /// Write the document back to its file, replacing it atomically
    pub fn save(&mut self) -> Result<()> {
        self.document.saved_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs());

        let dir = self
            .path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let mut tmp = tempfile::Builder::new()
            .prefix(".transectaz-map-")
            .tempfile_in(dir)?;
        let json = serde_json::to_string_pretty(&self.document)?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;

        debug!("Saved map {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_layer_top_and_dedupe() {
        let mut doc = MapDocument::new("Soils");
        doc.add_layer(Layer::from_source("a.shp"), LayerPosition::Top);
        doc.add_layer(Layer::from_source("b.shp"), LayerPosition::Top);
        assert_eq!(doc.top_layer().unwrap().name, "b");

        doc.add_layer(Layer::from_source("a.shp"), LayerPosition::Top);
        assert_eq!(doc.layers.len(), 2);
        assert_eq!(doc.top_layer().unwrap().name, "a");

        doc.add_layer(Layer::from_source("c.shp"), LayerPosition::Bottom);
        assert_eq!(doc.layers.last().unwrap().name, "c");
    }

    #[test]
    fn test_session_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("soils.map.json");

        let mut session = MapSession::create(&path, "Soils").unwrap();
        session.add_layer(Layer::from_source("Unit_az.shp"), LayerPosition::Top);
        session.save().unwrap();

        let reopened = MapSession::open(&path).unwrap();
        assert_eq!(reopened.document().title, "Soils");
        assert_eq!(reopened.document().layers.len(), 1);
        assert!(reopened.document().saved_at.is_some());
        assert!(reopened
            .document()
            .find_layer(Path::new("Unit_az.shp"))
            .unwrap()
            .visible);
    }

    #[test]
    fn test_create_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, "{}").unwrap();
        assert!(MapSession::create(&path, "x").is_err());
    }

    #[test]
    fn test_open_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(MapSession::open(&path), Err(Error::MapDocument(_))));
        assert!(matches!(
            MapSession::open(dir.path().join("missing.json")),
            Err(Error::MapDocument(_))
        ));
    }

    #[test]
    fn test_layers_default_visible() {
        let doc: MapDocument =
            serde_json::from_str(r#"{"title":"t","layers":[{"name":"a","source":"a.shp"}]}"#)
                .unwrap();
        assert!(doc.layers[0].visible);
        assert!(doc.saved_at.is_none());
    }
}
