//! Unit and precision normalization of directional mean output

use super::params::RoundingMode;
use std::path::Path;
use tracing::info;
use transectaz_core::io::UpdateCursor;
use transectaz_core::vector::{AttributeValue, Attributes, Schema};
use transectaz_core::{Error, Result};

/// Round a compass bearing to whole degrees; 360 wraps to 0
pub fn round_bearing(degrees: f64, mode: RoundingMode) -> f64 {
    let rounded = mode.round(degrees);
    if rounded >= 360.0 {
        rounded - 360.0
    } else {
        rounded
    }
}

fn numeric_field(schema: &Schema, name: &str) -> Result<String> {
    let field = schema
        .find(name)
        .ok_or_else(|| Error::invalid_input(format!("field {} not found", name)))?;
    if !field.kind.is_numeric() {
        return Err(Error::invalid_input(format!(
            "field {} is {}, expected a numeric field",
            field.name, field.kind
        )));
    }
    Ok(field.name.clone())
}

/// Rewrite every record of the dataset: the direction field is rounded to
/// whole degrees and the length field multiplied by `length_factor`.
///
/// Each record is visited exactly once. A record with a missing or
/// non-numeric value aborts the step before anything is written. Returns the
/// number of records updated.
pub fn normalize_units(
    path: impl AsRef<Path>,
    direction_field: &str,
    length_field: &str,
    rounding: RoundingMode,
    length_factor: f64,
) -> Result<usize> {
    let path = path.as_ref();
    let mut cursor = UpdateCursor::open(path)?;
    let direction = numeric_field(cursor.schema(), direction_field)?;
    let length = numeric_field(cursor.schema(), length_field)?;

    let value_of = |row: &Attributes, name: &str, idx: usize| {
        row.get(name)
            .and_then(AttributeValue::as_f64)
            .ok_or_else(|| Error::invalid_input(format!("record {} has no value for {}", idx, name)))
    };

    let count = cursor.update_rows(|idx, row| {
        let bearing = value_of(row, &direction, idx)?;
        let meters = value_of(row, &length, idx)?;
        row.insert(
            direction.clone(),
            AttributeValue::Float(round_bearing(bearing, rounding)),
        );
        row.insert(length.clone(), AttributeValue::Float(meters * length_factor));
        Ok(())
    })?;
    cursor.commit()?;

    info!("Normalized {} records in {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_bearing() {
        assert_eq!(round_bearing(44.4, RoundingMode::HalfAwayFromZero), 44.0);
        assert_eq!(round_bearing(44.5, RoundingMode::HalfAwayFromZero), 45.0);
        assert_eq!(round_bearing(44.5, RoundingMode::HalfEven), 44.0);
        assert_eq!(round_bearing(359.7, RoundingMode::HalfAwayFromZero), 0.0);
        assert_eq!(round_bearing(0.2, RoundingMode::HalfEven), 0.0);
    }
}
