//! Geometric measurements on line features: length, direction, centre

use geo::{Centroid, Coord, Euclidean, Geometry, Length, LineString};

/// Calculate the length of a linear geometry.
///
/// Returns Euclidean length in CRS units; 0 for non-linear geometries.
pub fn length(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::LineString(ls) => ls.length::<Euclidean>(),
        Geometry::MultiLineString(mls) => {
            mls.0.iter().map(|ls| ls.length::<Euclidean>()).sum()
        }
        Geometry::Line(l) => l.length::<Euclidean>(),
        _ => 0.0,
    }
}

/// First and last vertex of a linear geometry.
///
/// For multi-part lines this is the start of the first part and the end of
/// the last part.
pub fn endpoints(geom: &Geometry<f64>) -> Option<(Coord<f64>, Coord<f64>)> {
    let first_last = |ls: &LineString<f64>| Some((*ls.0.first()?, *ls.0.last()?));
    match geom {
        Geometry::LineString(ls) => first_last(ls),
        Geometry::MultiLineString(mls) => {
            let (start, _) = first_last(mls.0.first()?)?;
            let (_, end) = first_last(mls.0.last()?)?;
            Some((start, end))
        }
        Geometry::Line(l) => Some((l.start, l.end)),
        _ => None,
    }
}

/// Direction of a line from its first to its last vertex, in radians
/// counter-clockwise from east, in (-π, π].
///
/// Returns `None` for non-linear geometries and for lines whose endpoints
/// coincide.
pub fn direction(geom: &Geometry<f64>) -> Option<f64> {
    let (start, end) = endpoints(geom)?;
    let dx = end.x - start.x;
    let dy = end.y - start.y;
    if dx == 0.0 && dy == 0.0 {
        return None;
    }
    Some(dy.atan2(dx))
}

/// Convert a direction (degrees counter-clockwise from east) to a compass
/// bearing (degrees clockwise from north) in [0, `period`).
pub fn compass_bearing(direction_deg: f64, period: f64) -> f64 {
    let bearing = (90.0 - direction_deg).rem_euclid(period);
    // rem_euclid can round up to exactly `period` for tiny negative inputs
    if bearing >= period {
        0.0
    } else {
        bearing
    }
}

/// Length-weighted centre of a linear geometry
pub fn line_center(geom: &Geometry<f64>) -> Option<Coord<f64>> {
    let point = match geom {
        Geometry::LineString(ls) => ls.centroid(),
        Geometry::MultiLineString(mls) => mls.centroid(),
        Geometry::Line(l) => Some(l.centroid()),
        _ => None,
    }?;
    Some(point.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use geo::{MultiLineString, Point};
    use std::f64::consts::PI;

    fn ls(coords: &[(f64, f64)]) -> Geometry<f64> {
        Geometry::LineString(LineString::from(coords.to_vec()))
    }

    #[test]
    fn test_length_line() {
        let l = length(&ls(&[(0.0, 0.0), (3.0, 4.0)]));
        assert!((l - 5.0).abs() < 1e-10); // 3-4-5 triangle
    }

    #[test]
    fn test_length_multiline() {
        let mls = Geometry::MultiLineString(MultiLineString::new(vec![
            LineString::from(vec![(0.0, 0.0), (10.0, 0.0)]),
            LineString::from(vec![(0.0, 0.0), (0.0, 5.0)]),
        ]));
        assert!((length(&mls) - 15.0).abs() < 1e-10);
    }

    #[test]
    fn test_length_sums_segments() {
        let dog_leg = length(&ls(&[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]));
        assert_relative_eq!(dog_leg, 11.0, epsilon = 1e-12);
        let single = Geometry::Line(geo::Line::new((0.0, 0.0), (6.0, 8.0)));
        assert_relative_eq!(length(&single), 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_length_of_point_is_zero() {
        assert_eq!(length(&Geometry::Point(Point::new(1.0, 1.0))), 0.0);
    }

    #[test]
    fn test_direction_uses_endpoints() {
        // A dog-leg ending due north of its start
        let d = direction(&ls(&[(0.0, 0.0), (5.0, 5.0), (0.0, 10.0)])).unwrap();
        assert_relative_eq!(d, PI / 2.0, epsilon = 1e-12);

        let west = direction(&ls(&[(0.0, 0.0), (-1.0, 0.0)])).unwrap();
        assert_relative_eq!(west, PI, epsilon = 1e-12);
    }

    #[test]
    fn test_direction_of_closed_line_is_undefined() {
        assert!(direction(&ls(&[(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)])).is_none());
        assert!(direction(&Geometry::Point(Point::new(0.0, 0.0))).is_none());
    }

    #[test]
    fn test_compass_bearing() {
        assert_relative_eq!(compass_bearing(90.0, 360.0), 0.0);
        assert_relative_eq!(compass_bearing(0.0, 360.0), 90.0);
        assert_relative_eq!(compass_bearing(180.0, 360.0), 270.0);
        assert_relative_eq!(compass_bearing(135.0, 360.0), 315.0);
        assert_relative_eq!(compass_bearing(135.0, 180.0), 135.0);
        assert!(compass_bearing(90.0 + 1e-15, 360.0) < 360.0);
    }

    #[test]
    fn test_line_center() {
        let c = line_center(&ls(&[(0.0, 0.0), (10.0, 0.0)])).unwrap();
        assert_relative_eq!(c.x, 5.0);
        assert_relative_eq!(c.y, 0.0);
    }
}
