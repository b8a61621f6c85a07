//! Sequential identifiers for transect features

use std::path::Path;
use tracing::{debug, info};
use transectaz_core::io::UpdateCursor;
use transectaz_core::vector::{AttributeValue, FieldDef, FieldKind, Schema};
use transectaz_core::{Error, FeatureCollection, Result};

/// Check that `name` is a numeric field wide enough for `count` identifiers
fn id_field<'a>(schema: &'a Schema, name: &str, count: usize) -> Result<&'a FieldDef> {
    let field = schema
        .find(name)
        .ok_or_else(|| Error::invalid_input(format!("identifier field {} not found", name)))?;
    if !field.kind.is_numeric() {
        return Err(Error::invalid_input(format!(
            "identifier field {} is {}, expected a numeric field",
            field.name, field.kind
        )));
    }
    let width = match field.kind {
        FieldKind::Numeric { length, .. } | FieldKind::Float { length, .. } => Some(length as usize),
        _ => None,
    };
    if let Some(width) = width {
        if count.to_string().len() > width {
            return Err(Error::invalid_input(format!(
                "identifier field {} ({}) is too narrow for {} features",
                field.name, field.kind, count
            )));
        }
    }
    Ok(field)
}

/// Assign identifiers 1..=N, in file order, to the dataset at `path`.
///
/// The dataset stays locked for the duration of the update and is released
/// on every exit path. Returns the number of renumbered records.
pub fn renumber_features(path: impl AsRef<Path>, field: &str) -> Result<usize> {
    let path = path.as_ref();
    let mut cursor = UpdateCursor::open(path)?;
    let name = id_field(cursor.schema(), field, cursor.len())?.name.clone();

    let count = cursor.update_rows(|idx, row| {
        row.insert(name.clone(), AttributeValue::Int(idx as i64 + 1));
        Ok(())
    })?;
    cursor.commit()?;

    info!("Renumbered {} features in {}", count, path.display());
    Ok(count)
}

/// In-memory variant of [`renumber_features`]
pub fn renumber_collection(features: &mut FeatureCollection, field: &str) -> Result<usize> {
    let name = id_field(features.schema(), field, features.len())?.name.clone();
    let mut count = 0;
    for (idx, feature) in features.iter_mut().enumerate() {
        feature.set_property(name.clone(), AttributeValue::Int(idx as i64 + 1));
        count += 1;
    }
    debug!("Renumbered {} features in memory", count);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Geometry, LineString};
    use transectaz_core::Feature;

    fn collection(ids: &[i64], id_kind: FieldKind) -> FeatureCollection {
        let schema = Schema::from_fields([FieldDef::new("Id", id_kind)]).unwrap();
        let mut fc = FeatureCollection::new(schema);
        for &id in ids {
            let line = LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]);
            fc.push(Feature::new(Geometry::LineString(line)).with_property("Id", AttributeValue::Int(id)));
        }
        fc
    }

    fn ids(fc: &FeatureCollection) -> Vec<i64> {
        fc.column("Id")
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect()
    }

    #[test]
    fn test_contiguous_in_order() {
        let mut fc = collection(&[0, 0, 7, -3, 0], FieldKind::Numeric { length: 6, decimals: 0 });
        assert_eq!(renumber_collection(&mut fc, "id").unwrap(), 5);
        assert_eq!(ids(&fc), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_idempotent() {
        let mut fc = collection(&[0, 0, 0], FieldKind::Integer);
        renumber_collection(&mut fc, "Id").unwrap();
        let first = ids(&fc);
        renumber_collection(&mut fc, "Id").unwrap();
        assert_eq!(ids(&fc), first);
    }

    #[test]
    fn test_rejects_text_and_narrow_fields() {
        let mut text = collection(&[], FieldKind::Character { length: 10 });
        assert!(matches!(
            renumber_collection(&mut text, "Id"),
            Err(Error::InvalidInput(_))
        ));

        let mut narrow = collection(&[0; 10], FieldKind::Numeric { length: 1, decimals: 0 });
        assert!(matches!(
            renumber_collection(&mut narrow, "Id"),
            Err(Error::InvalidInput(_))
        ));

        let mut missing = collection(&[0], FieldKind::Integer);
        assert!(renumber_collection(&mut missing, "TransectNo").is_err());
    }
}
