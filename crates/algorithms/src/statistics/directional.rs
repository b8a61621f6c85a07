//! Linear directional mean
//!
//! Summarises the trend of a set of lines: mean direction, circular
//! variance, mean centre and mean length, optionally per group of a case
//! field. Directions are taken from each line's first to its last vertex;
//! in orientation-only mode a line and its reverse count as the same.
//!
//! The statistic sits behind [`DirectionalStatsProvider`] so callers can
//! substitute another engine (or a deterministic stub in tests).

use crate::vector::{compass_bearing, direction, length, line_center};
use geo::{Coord, Geometry, LineString};
use std::collections::HashMap;
use std::f64::consts::PI;
use transectaz_core::vector::{AttributeValue, Feature, FeatureCollection, FieldDef, Schema};
use transectaz_core::{Algorithm, Error, Result, CRS};

/// Compass angle, degrees clockwise from north
pub const FIELD_COMPASS_ANGLE: &str = "CompassA";
/// Direction mean, degrees counter-clockwise from east
pub const FIELD_DIRECTION_MEAN: &str = "DirMean";
/// Circular variance, 0 (all parallel) to 1 (no trend)
pub const FIELD_CIRCULAR_VARIANCE: &str = "CirVar";
/// Mean centre X
pub const FIELD_MEAN_X: &str = "AveX";
/// Mean centre Y
pub const FIELD_MEAN_Y: &str = "AveY";
/// Mean line length
pub const FIELD_MEAN_LENGTH: &str = "AveLen";

const STAT_FIELD_LENGTH: u8 = 19;
const STAT_FIELD_DECIMALS: u8 = 11;

/// Parameters for the linear directional mean
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DirectionalMeanParams {
    /// Ignore line direction: a line and its reverse are equivalent
    pub orientation_only: bool,
    /// Attribute to group lines by; `None` summarises all lines together
    pub case_field: Option<String>,
}

/// Summary of one group of lines
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalMeanRecord {
    /// Value of the case field shared by the group
    pub case_value: Option<AttributeValue>,
    /// Degrees clockwise from north
    pub compass_angle: f64,
    /// Degrees counter-clockwise from east
    pub direction_mean: f64,
    pub circular_variance: f64,
    pub mean_center: Coord<f64>,
    pub mean_length: f64,
    pub feature_count: usize,
}

impl DirectionalMeanRecord {
    /// Segment of length `mean_length` through `mean_center`, pointing
    /// along the mean direction
    pub fn mean_line(&self) -> LineString<f64> {
        let theta = self.direction_mean.to_radians();
        let half = self.mean_length / 2.0;
        let (dx, dy) = (half * theta.cos(), half * theta.sin());
        let c = self.mean_center;
        LineString::from(vec![(c.x - dx, c.y - dy), (c.x + dx, c.y + dy)])
    }
}

/// A source of directional statistics over line features
pub trait DirectionalStatsProvider {
    /// Short name for messages and logs
    fn name(&self) -> &str;

    /// Compute one summary record per group of `features`
    fn directional_mean(
        &self,
        features: &FeatureCollection,
        params: &DirectionalMeanParams,
    ) -> Result<Vec<DirectionalMeanRecord>>;
}

/// Native linear directional mean
#[derive(Debug, Clone, Default)]
pub struct LinearDirectionalMean;

impl Algorithm for LinearDirectionalMean {
    type Input = FeatureCollection;
    type Output = Vec<DirectionalMeanRecord>;
    type Params = DirectionalMeanParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Linear Directional Mean"
    }

    fn description(&self) -> &'static str {
        "Mean direction, circular variance, mean centre and mean length of line features"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        linear_directional_mean(&input, &params)
    }
}

impl DirectionalStatsProvider for LinearDirectionalMean {
    fn name(&self) -> &str {
        Algorithm::name(self)
    }

    fn directional_mean(
        &self,
        features: &FeatureCollection,
        params: &DirectionalMeanParams,
    ) -> Result<Vec<DirectionalMeanRecord>> {
        linear_directional_mean(features, params)
    }
}

/// Hashable view of a case value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Null,
    Bool(bool),
    Int(i64),
    Float(u64),
    Text(String),
    Date(u32, u32, u32),
}

impl From<&AttributeValue> for GroupKey {
    fn from(value: &AttributeValue) -> Self {
        match value {
            AttributeValue::Null => GroupKey::Null,
            AttributeValue::Bool(b) => GroupKey::Bool(*b),
            AttributeValue::Int(i) => GroupKey::Int(*i),
            AttributeValue::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                GroupKey::Int(*f as i64)
            }
            AttributeValue::Float(f) => GroupKey::Float(f.to_bits()),
            AttributeValue::String(s) => GroupKey::Text(s.clone()),
            AttributeValue::Date { year, month, day } => GroupKey::Date(*year, *month, *day),
        }
    }
}

#[derive(Debug, Default)]
struct Accumulator {
    sin_sum: f64,
    cos_sum: f64,
    center_x: f64,
    center_y: f64,
    length_sum: f64,
    count: usize,
}

impl Accumulator {
    fn add(&mut self, angle: f64, center: Coord<f64>, len: f64) {
        self.sin_sum += angle.sin();
        self.cos_sum += angle.cos();
        self.center_x += center.x;
        self.center_y += center.y;
        self.length_sum += len;
        self.count += 1;
    }

    fn finish(&self, case_value: Option<AttributeValue>, orientation_only: bool) -> DirectionalMeanRecord {
        let n = self.count as f64;
        let resultant = self.sin_sum.hypot(self.cos_sum) / n;
        let mut mean = self.sin_sum.atan2(self.cos_sum);

        let (direction_mean, period) = if orientation_only {
            mean = mean.rem_euclid(2.0 * PI) / 2.0;
            (mean.to_degrees(), 180.0)
        } else {
            (mean.rem_euclid(2.0 * PI).to_degrees(), 360.0)
        };
        let direction_mean = if direction_mean >= period { 0.0 } else { direction_mean };

        DirectionalMeanRecord {
            case_value,
            compass_angle: compass_bearing(direction_mean, period),
            direction_mean,
            circular_variance: (1.0 - resultant).clamp(0.0, 1.0),
            mean_center: Coord {
                x: self.center_x / n,
                y: self.center_y / n,
            },
            mean_length: self.length_sum / n,
            feature_count: self.count,
        }
    }
}

fn feature_angle(feature: &Feature, index: usize, orientation_only: bool) -> Result<(f64, Coord<f64>, f64)> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| Error::invalid_input(format!("feature {} has no geometry", index)))?;
    if !matches!(
        geometry,
        Geometry::LineString(_) | Geometry::MultiLineString(_) | Geometry::Line(_)
    ) {
        return Err(Error::invalid_input(format!(
            "feature {} is not a line",
            index
        )));
    }
    let theta = direction(geometry).ok_or_else(|| {
        Error::invalid_input(format!("feature {} has no direction (closed or empty line)", index))
    })?;
    let center = line_center(geometry)
        .ok_or_else(|| Error::invalid_input(format!("feature {} has no centre", index)))?;

    let angle = if orientation_only {
        2.0 * theta.rem_euclid(PI)
    } else {
        theta
    };
    Ok((angle, center, length(geometry)))
}

/// Linear directional mean of `features`.
///
/// Groups are returned in order of their first appearance. Fails with
/// [`Error::InvalidInput`] on an empty collection, a missing case field, or
/// any feature that is not a line with distinct endpoints.
pub fn linear_directional_mean(
    features: &FeatureCollection,
    params: &DirectionalMeanParams,
) -> Result<Vec<DirectionalMeanRecord>> {
    if features.is_empty() {
        return Err(Error::invalid_input("no features to summarise"));
    }

    let case_field = match &params.case_field {
        Some(name) => Some(
            features
                .schema()
                .find(name)
                .ok_or_else(|| Error::invalid_input(format!("case field {} not found", name)))?
                .name
                .clone(),
        ),
        None => None,
    };

    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(Option<AttributeValue>, Accumulator)> = Vec::new();

    for (i, feature) in features.iter().enumerate() {
        let (angle, center, len) = feature_angle(feature, i, params.orientation_only)?;
        let case_value = case_field.as_ref().map(|name| {
            feature
                .get_property(name)
                .cloned()
                .unwrap_or(AttributeValue::Null)
        });
        let key = case_value.as_ref().map(GroupKey::from).unwrap_or(GroupKey::Null);

        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((case_value, Accumulator::default()));
            groups.len() - 1
        });
        groups[slot].1.add(angle, center, len);
    }

    Ok(groups
        .into_iter()
        .map(|(case_value, acc)| acc.finish(case_value, params.orientation_only))
        .collect())
}

/// Schema of a directional mean output table
pub fn output_schema(case_field: Option<&FieldDef>) -> Result<Schema> {
    let stat = |name: &str| FieldDef::numeric(name, STAT_FIELD_LENGTH, STAT_FIELD_DECIMALS);
    let mut fields: Vec<FieldDef> = case_field.cloned().into_iter().collect();
    fields.extend([
        stat(FIELD_COMPASS_ANGLE),
        stat(FIELD_DIRECTION_MEAN),
        stat(FIELD_CIRCULAR_VARIANCE),
        stat(FIELD_MEAN_X),
        stat(FIELD_MEAN_Y),
        stat(FIELD_MEAN_LENGTH),
    ]);
    Schema::from_fields(fields)
}

/// Turn summary records into line features, one mean line per record
pub fn records_to_collection(
    records: &[DirectionalMeanRecord],
    case_field: Option<&FieldDef>,
    crs: Option<CRS>,
) -> Result<FeatureCollection> {
    let schema = output_schema(case_field)?;
    let mut out = FeatureCollection::new(schema).with_crs(crs);

    for record in records {
        let mut feature = Feature::new(Geometry::LineString(record.mean_line()))
            .with_property(FIELD_COMPASS_ANGLE, AttributeValue::Float(record.compass_angle))
            .with_property(FIELD_DIRECTION_MEAN, AttributeValue::Float(record.direction_mean))
            .with_property(
                FIELD_CIRCULAR_VARIANCE,
                AttributeValue::Float(record.circular_variance),
            )
            .with_property(FIELD_MEAN_X, AttributeValue::Float(record.mean_center.x))
            .with_property(FIELD_MEAN_Y, AttributeValue::Float(record.mean_center.y))
            .with_property(FIELD_MEAN_LENGTH, AttributeValue::Float(record.mean_length));
        if let (Some(field), Some(value)) = (case_field, &record.case_value) {
            feature.set_property(field.name.clone(), value.clone());
        }
        out.push(feature);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn lines(defs: &[(i64, (f64, f64), (f64, f64))]) -> FeatureCollection {
        let schema = Schema::from_fields([FieldDef::numeric("Id", 6, 0)]).unwrap();
        let mut fc = FeatureCollection::new(schema);
        for &(id, a, b) in defs {
            fc.push(
                Feature::new(Geometry::LineString(LineString::from(vec![a, b])))
                    .with_property("Id", AttributeValue::Int(id)),
            );
        }
        fc
    }

    fn by_id() -> DirectionalMeanParams {
        DirectionalMeanParams {
            orientation_only: false,
            case_field: Some("Id".to_string()),
        }
    }

    #[test]
    fn test_single_line_per_group() {
        let fc = lines(&[
            (1, (0.0, 0.0), (0.0, 10.0)),  // north
            (2, (0.0, 0.0), (20.0, 0.0)),  // east
            (3, (0.0, 0.0), (-30.0, 0.0)), // west
        ]);
        let out = linear_directional_mean(&fc, &by_id()).unwrap();
        assert_eq!(out.len(), 3);

        assert_relative_eq!(out[0].compass_angle, 0.0, epsilon = 1e-9);
        assert_relative_eq!(out[0].direction_mean, 90.0, epsilon = 1e-9);
        assert_relative_eq!(out[1].compass_angle, 90.0, epsilon = 1e-9);
        assert_relative_eq!(out[2].compass_angle, 270.0, epsilon = 1e-9);

        assert_relative_eq!(out[1].mean_length, 20.0, epsilon = 1e-9);
        assert_relative_eq!(out[1].mean_center.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(out[0].circular_variance, 0.0, epsilon = 1e-12);
        assert_eq!(out[2].case_value, Some(AttributeValue::Int(3)));
    }

    #[test]
    fn test_grouped_mean_direction() {
        // North-east and north-west average to due north
        let fc = lines(&[
            (1, (0.0, 0.0), (10.0, 10.0)),
            (1, (0.0, 0.0), (-10.0, 10.0)),
        ]);
        let out = linear_directional_mean(&fc, &by_id()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].feature_count, 2);
        assert_relative_eq!(out[0].compass_angle, 0.0, epsilon = 1e-9);
        // R = cos(45°)
        assert_relative_eq!(
            out[0].circular_variance,
            1.0 - (PI / 4.0).cos(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_orientation_only_ignores_reversal() {
        let fc = lines(&[
            (1, (0.0, 0.0), (0.0, 10.0)),
            (1, (0.0, 10.0), (0.0, 0.0)),
        ]);
        let directed = linear_directional_mean(&fc, &by_id()).unwrap();
        // Opposite directions cancel out entirely
        assert_relative_eq!(directed[0].circular_variance, 1.0, epsilon = 1e-12);

        let params = DirectionalMeanParams {
            orientation_only: true,
            ..by_id()
        };
        let oriented = linear_directional_mean(&fc, &params).unwrap();
        assert_relative_eq!(oriented[0].circular_variance, 0.0, epsilon = 1e-12);
        assert_relative_eq!(oriented[0].direction_mean, 90.0, epsilon = 1e-9);
        assert_relative_eq!(oriented[0].compass_angle, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_without_case_field_single_group() {
        let fc = lines(&[(1, (0.0, 0.0), (1.0, 0.0)), (2, (0.0, 0.0), (3.0, 0.0))]);
        let out = linear_directional_mean(&fc, &DirectionalMeanParams::default()).unwrap();
        assert_eq!(out.len(), 1);
        assert!(out[0].case_value.is_none());
        assert_relative_eq!(out[0].mean_length, 2.0);
    }

    #[test]
    fn test_invalid_inputs() {
        let empty = lines(&[]);
        assert!(matches!(
            linear_directional_mean(&empty, &by_id()),
            Err(Error::InvalidInput(_))
        ));

        let fc = lines(&[(1, (0.0, 0.0), (1.0, 0.0))]);
        let params = DirectionalMeanParams {
            case_field: Some("Zone".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            linear_directional_mean(&fc, &params),
            Err(Error::InvalidInput(_))
        ));

        let degenerate = lines(&[(1, (5.0, 5.0), (5.0, 5.0))]);
        assert!(matches!(
            linear_directional_mean(&degenerate, &by_id()),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_mean_line_geometry() {
        let fc = lines(&[(1, (0.0, 0.0), (0.0, 10.0))]);
        let out = linear_directional_mean(&fc, &by_id()).unwrap();
        let line = out[0].mean_line();
        assert_relative_eq!(line.0[0].y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(line.0[1].y, 10.0, epsilon = 1e-9);
        assert_relative_eq!(line.0[1].x, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_records_to_collection_schema() {
        let fc = lines(&[(7, (0.0, 0.0), (0.0, 10.0))]);
        let out = linear_directional_mean(&fc, &by_id()).unwrap();
        let id_field = fc.schema().find("Id").cloned();
        let table = records_to_collection(&out, id_field.as_ref(), None).unwrap();

        let names: Vec<_> = table.schema().names().collect();
        assert_eq!(
            names,
            vec!["Id", "CompassA", "DirMean", "CirVar", "AveX", "AveY", "AveLen"]
        );
        assert_eq!(
            table.features[0].get_property("Id"),
            Some(&AttributeValue::Int(7))
        );
    }
}
