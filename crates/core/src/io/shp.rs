//! Shapefile datasets
//!
//! Geometry goes through the `shapefile` crate, attributes through
//! [`crate::io::dbf`]. Only 2D line, point and null shapes are mapped to
//! `geo-types`; other shape types are reported but carry no geometry.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::io::dbf;
use crate::io::paths::DatasetPaths;
use crate::vector::{Feature, FeatureCollection};
use geo_types::{Coord, Geometry, LineString, MultiLineString, Point};
use shapefile::{Polyline, Shape, ShapeReader};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Geometry family of a dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometryKind {
    /// No features, or only null shapes
    Empty,
    Point,
    Polyline,
    /// Any other shape type, by its shapefile name
    Other(String),
}

impl std::fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryKind::Empty => write!(f, "Empty"),
            GeometryKind::Point => write!(f, "Point"),
            GeometryKind::Polyline => write!(f, "Polyline"),
            GeometryKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A dataset loaded from disk
#[derive(Debug, Clone)]
pub struct Dataset {
    pub paths: DatasetPaths,
    pub kind: GeometryKind,
    pub features: FeatureCollection,
}

/// Read a shapefile with its attributes and CRS
pub fn read_shapefile(path: impl AsRef<Path>) -> Result<Dataset> {
    let paths = DatasetPaths::new(path)?;
    paths.ensure_exists()?;

    let reader = ShapeReader::from_path(&paths.shp)?;
    let shapes = reader.read()?;
    let (schema, rows) = dbf::read_table(&paths.dbf)?;

    if shapes.len() != rows.len() {
        return Err(Error::Format(format!(
            "{} has {} shapes but {} attribute records",
            paths.shp.display(),
            shapes.len(),
            rows.len()
        )));
    }

    let mut kind = GeometryKind::Empty;
    let crs = read_prj(&paths.prj)?;
    let mut features = FeatureCollection::new(schema).with_crs(crs);

    for (shape, properties) in shapes.into_iter().zip(rows) {
        let (shape_kind, geometry) = convert_shape(shape);
        if kind == GeometryKind::Empty {
            kind = shape_kind;
        } else if shape_kind != GeometryKind::Empty && shape_kind != kind {
            return Err(Error::Format(format!(
                "mixed shape types in {}: {} and {}",
                paths.shp.display(),
                kind,
                shape_kind
            )));
        }
        features.push(Feature {
            geometry,
            properties,
        });
    }

    debug!(
        "Read {} {} features from {}",
        features.len(),
        kind,
        paths.shp.display()
    );
    Ok(Dataset {
        paths,
        kind,
        features,
    })
}

fn read_prj(path: &Path) -> Result<Option<CRS>> {
    if !path.exists() {
        return Ok(None);
    }
    let wkt = fs::read_to_string(path)?;
    Ok(Some(CRS::from_wkt(wkt)))
}

fn line_from<P, F>(points: &[P], xy: F) -> LineString<f64>
where
    F: Fn(&P) -> (f64, f64),
{
    points
        .iter()
        .map(|p| {
            let (x, y) = xy(p);
            Coord { x, y }
        })
        .collect()
}

fn lines_geometry(mut parts: Vec<LineString<f64>>) -> Option<Geometry<f64>> {
    match parts.len() {
        0 => None,
        1 => parts.pop().map(Geometry::LineString),
        _ => Some(Geometry::MultiLineString(MultiLineString::new(parts))),
    }
}

fn convert_shape(shape: Shape) -> (GeometryKind, Option<Geometry<f64>>) {
    match shape {
        Shape::NullShape => (GeometryKind::Empty, None),
        Shape::Point(p) => (GeometryKind::Point, Some(Geometry::Point(Point::new(p.x, p.y)))),
        Shape::PointM(p) => (GeometryKind::Point, Some(Geometry::Point(Point::new(p.x, p.y)))),
        Shape::PointZ(p) => (GeometryKind::Point, Some(Geometry::Point(Point::new(p.x, p.y)))),
        Shape::Polyline(pl) => {
            let parts = pl.parts().iter().map(|part| line_from(part, |p| (p.x, p.y))).collect();
            (GeometryKind::Polyline, lines_geometry(parts))
        }
        Shape::PolylineM(pl) => {
            let parts = pl.parts().iter().map(|part| line_from(part, |p| (p.x, p.y))).collect();
            (GeometryKind::Polyline, lines_geometry(parts))
        }
        Shape::PolylineZ(pl) => {
            let parts = pl.parts().iter().map(|part| line_from(part, |p| (p.x, p.y))).collect();
            (GeometryKind::Polyline, lines_geometry(parts))
        }
        other => (GeometryKind::Other(format!("{:?}", other.shapetype())), None),
    }
}

fn to_polyline(geometry: &Geometry<f64>) -> Result<Polyline> {
    let to_points = |ls: &LineString<f64>| -> Vec<shapefile::Point> {
        ls.coords().map(|c| shapefile::Point::new(c.x, c.y)).collect()
    };
    let parts = match geometry {
        Geometry::LineString(ls) => vec![to_points(ls)],
        Geometry::MultiLineString(mls) => mls.0.iter().map(to_points).collect(),
        Geometry::Line(l) => vec![vec![
            shapefile::Point::new(l.start.x, l.start.y),
            shapefile::Point::new(l.end.x, l.end.y),
        ]],
        _ => return Err(Error::invalid_input("only line geometries can be written")),
    };
    if parts.is_empty() || parts.iter().any(|p| p.len() < 2) {
        return Err(Error::invalid_input("line parts need at least two vertices"));
    }
    Ok(Polyline::with_parts(parts))
}

/// Create a new polyline shapefile at `path` from `features`.
///
/// Never overwrites: if any component of the target already exists the call
/// fails with [`Error::InvalidInput`]. The dataset is staged in a temporary
/// directory beside the target and moved into place component by component,
/// `.shp` last; on failure nothing is left behind. `prj_from`, when given
/// and present, is copied as the new dataset's `.prj`.
pub fn create_shapefile(
    path: impl AsRef<Path>,
    features: &FeatureCollection,
    prj_from: Option<&Path>,
) -> Result<DatasetPaths> {
    let target = DatasetPaths::new(path)?;
    ensure_absent(&target)?;

    let dir = target
        .shp
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let staging = tempfile::Builder::new()
        .prefix(".transectaz-")
        .tempdir_in(dir)?;
    // The writer derives sidecar names with lowercase extensions
    let staged = DatasetPaths::new(staging.path().join(format!("{}.shp", target.name())))?;

    {
        let builder = dbf::table_builder(features.schema())?;
        let mut writer = shapefile::Writer::from_path(&staged.shp, builder)?;
        for feature in features.iter() {
            let geometry = feature
                .geometry
                .as_ref()
                .ok_or_else(|| Error::invalid_input("cannot write a feature without geometry"))?;
            let polyline = to_polyline(geometry)?;
            let record = dbf::to_record(features.schema(), &feature.properties)?;
            writer.write_shape_and_record(&polyline, &record)?;
        }
    }

    if let Some(prj) = prj_from.filter(|p| p.exists()) {
        fs::copy(prj, &staged.prj)?;
    }

    let moves = [
        (&staged.prj, &target.prj),
        (&staged.dbf, &target.dbf),
        (&staged.shx, &target.shx),
        (&staged.shp, &target.shp),
    ];
    let mut moved = Vec::new();
    for (from, to) in moves {
        if !from.exists() {
            continue;
        }
        let result = if to.exists() {
            Err(Error::invalid_input(format!(
                "output appeared while writing: {}",
                to.display()
            )))
        } else {
            fs::rename(from, to).map_err(Error::from)
        };
        if let Err(e) = result {
            for done in &moved {
                let _ = fs::remove_file(done);
            }
            return Err(e);
        }
        moved.push(to.clone());
    }

    info!(
        "Created {} ({} features)",
        target.shp.display(),
        features.len()
    );
    Ok(target)
}

/// Fail if any component of the dataset exists on disk
pub fn ensure_absent(paths: &DatasetPaths) -> Result<()> {
    if let Some(existing) = paths.required().into_iter().find(|p| p.exists()) {
        return Err(Error::invalid_input(format!(
            "output already exists: {}",
            existing.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{AttributeValue, FieldDef, Schema};
    use geo_types::line_string;

    fn lines() -> FeatureCollection {
        let schema = Schema::from_fields([FieldDef::numeric("Id", 6, 0)]).unwrap();
        let mut fc = FeatureCollection::new(schema);
        for (i, len) in [10.0, 20.0].into_iter().enumerate() {
            let ls = line_string![(x: 0.0, y: 0.0), (x: 0.0, y: len)];
            fc.push(
                Feature::new(Geometry::LineString(ls))
                    .with_property("Id", AttributeValue::Int(i as i64)),
            );
        }
        fc
    }

    #[test]
    fn test_create_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.shp");
        create_shapefile(&path, &lines(), None).unwrap();

        let ds = read_shapefile(&path).unwrap();
        assert_eq!(ds.kind, GeometryKind::Polyline);
        assert_eq!(ds.features.len(), 2);
        assert!(ds.features.crs().is_none());
        let ids = ds.features.column("Id").unwrap();
        assert_eq!(ids, vec![AttributeValue::Int(0), AttributeValue::Int(1)]);
        match &ds.features.features[1].geometry {
            Some(Geometry::LineString(ls)) => assert_eq!(ls.0.len(), 2),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_create_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lines.shp");
        fs::write(&path, b"keep me").unwrap();

        let err = create_shapefile(&path, &lines(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(fs::read(&path).unwrap(), b"keep me");
        assert!(!dir.path().join("lines.dbf").exists());
    }

    #[test]
    fn test_create_copies_prj() {
        let dir = tempfile::tempdir().unwrap();
        let prj = dir.path().join("src.prj");
        fs::write(&prj, r#"PROJCS["Test",UNIT["Meter",1.0]]"#).unwrap();
        let path = dir.path().join("lines.shp");
        create_shapefile(&path, &lines(), Some(&prj)).unwrap();

        let ds = read_shapefile(&path).unwrap();
        assert_eq!(ds.features.crs().and_then(|c| c.name()), Some("Test"));
    }

    #[test]
    fn test_rejects_point_geometry() {
        let schema = Schema::from_fields([FieldDef::numeric("Id", 6, 0)]).unwrap();
        let mut fc = FeatureCollection::new(schema);
        fc.push(
            Feature::new(Geometry::Point(Point::new(1.0, 2.0)))
                .with_property("Id", AttributeValue::Int(1)),
        );
        let dir = tempfile::tempdir().unwrap();
        let err = create_shapefile(dir.path().join("p.shp"), &fc, None).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
