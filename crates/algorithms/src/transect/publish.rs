//! Publishing the output to a map session

use std::path::Path;
use transectaz_core::map::{Layer, LayerPosition, MapSession};
use transectaz_core::{Error, Result};

/// Add `dataset` as a visible layer of `session` and save the map.
///
/// There is no fallback when no session is open: the call fails with
/// [`Error::NoActiveSession`]. Returns the layer name.
pub fn publish_layer(
    session: Option<&mut MapSession>,
    dataset: impl AsRef<Path>,
    position: LayerPosition,
) -> Result<String> {
    let session = session.ok_or(Error::NoActiveSession)?;
    let layer = Layer::from_source(dataset.as_ref());
    let name = layer.name.clone();
    session.add_layer(layer, position);
    session.save()?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_session() {
        let err = publish_layer(None, "Field42_az.shp", LayerPosition::Top).unwrap_err();
        assert!(matches!(err, Error::NoActiveSession));
    }

    #[test]
    fn test_adds_layer_on_top_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let map = dir.path().join("soils.json");
        let mut session = MapSession::create(&map, "Soils").unwrap();
        session.add_layer(Layer::from_source("basemap.shp"), LayerPosition::Top);

        let name = publish_layer(Some(&mut session), "Field42_az.shp", LayerPosition::Top).unwrap();
        assert_eq!(name, "Field42_az");

        let saved = MapSession::open(&map).unwrap();
        let names: Vec<_> = saved.document().layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Field42_az", "basemap"]);
    }
}
