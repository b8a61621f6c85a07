//! Directional statistic invocation
//!
//! Reads the renumbered transects, hands them to a
//! [`DirectionalStatsProvider`] and writes the summary as a new dataset.

use crate::statistics::{records_to_collection, DirectionalMeanParams, DirectionalStatsProvider};
use std::path::Path;
use tracing::{info, warn};
use transectaz_core::crs::LinearUnit;
use transectaz_core::io::{create_shapefile, ensure_absent, read_shapefile, DatasetPaths, GeometryKind};
use transectaz_core::{Error, Result};

/// Outcome of the compute step
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeSummary {
    pub input_features: usize,
    pub output_records: usize,
}

/// Run the directional statistic on `input` and write the result to
/// `output`.
///
/// Fails with [`Error::InvalidInput`] if `output` already exists, if the
/// input is not a line dataset or lacks the case field. Provider failures
/// other than invalid input are reported as [`Error::HostToolFailure`]. An
/// existing output is never touched, and a failed run leaves no output.
pub fn compute_directional_mean(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    provider: &dyn DirectionalStatsProvider,
    params: &DirectionalMeanParams,
) -> Result<ComputeSummary> {
    let output = DatasetPaths::new(output)?;
    ensure_absent(&output)?;

    let dataset = read_shapefile(input)?;
    match &dataset.kind {
        GeometryKind::Polyline => {}
        GeometryKind::Empty if dataset.features.is_empty() => {
            return Err(Error::invalid_input(format!(
                "{} has no features",
                dataset.paths.shp.display()
            )))
        }
        other => {
            return Err(Error::invalid_input(format!(
                "{} holds {} geometry, expected lines",
                dataset.paths.shp.display(),
                other
            )))
        }
    }

    let case_field = match &params.case_field {
        Some(name) => Some(
            dataset
                .features
                .schema()
                .find(name)
                .cloned()
                .ok_or_else(|| Error::invalid_input(format!("case field {} not found", name)))?,
        ),
        None => None,
    };

    let crs = dataset.features.crs().cloned();
    match crs.as_ref() {
        Some(c) if c.is_geographic() => warn!(
            "{} uses geographic coordinates ({}); lengths will be in degrees",
            dataset.paths.shp.display(),
            c
        ),
        Some(c) => match c.linear_unit() {
            Some(LinearUnit::Meter) | None => {}
            Some(unit) => warn!(
                "{} is in {:?}, not meters; length conversion assumes meters",
                dataset.paths.shp.display(),
                unit
            ),
        },
        None => warn!("{} has no .prj; assuming meters", dataset.paths.shp.display()),
    }

    info!(
        "Running {} on {} features",
        provider.name(),
        dataset.features.len()
    );
    let records = provider
        .directional_mean(&dataset.features, params)
        .map_err(|e| match e {
            Error::InvalidInput(_) => e,
            other => Error::HostToolFailure(other.to_string()),
        })?;

    if records.is_empty() {
        return Err(Error::HostToolFailure(format!(
            "{} returned no records",
            provider.name()
        )));
    }
    if let Some(bad) = records.iter().find(|r| {
        !(r.compass_angle.is_finite() && r.mean_length.is_finite() && r.direction_mean.is_finite())
    }) {
        return Err(Error::HostToolFailure(format!(
            "{} returned a non-finite record: {:?}",
            provider.name(),
            bad
        )));
    }

    let table = records_to_collection(&records, case_field.as_ref(), crs)?;
    create_shapefile(&output.shp, &table, Some(&dataset.paths.prj))?;

    Ok(ComputeSummary {
        input_features: dataset.features.len(),
        output_records: records.len(),
    })
}
