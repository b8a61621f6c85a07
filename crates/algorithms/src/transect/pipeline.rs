//! End-to-end transect azimuth run

use super::compute::compute_directional_mean;
use super::normalize::normalize_units;
use super::params::PipelineParams;
use super::prune::prune_fields;
use super::publish::publish_layer;
use super::renumber::renumber_features;
use super::stage::{MessageSink, PipelineError, PipelineStage};
use crate::statistics::{
    DirectionalMeanParams, DirectionalStatsProvider, LinearDirectionalMean, FIELD_COMPASS_ANGLE,
    FIELD_MEAN_LENGTH,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use transectaz_core::io::derive_output_path;
use transectaz_core::map::MapSession;
use transectaz_core::Error;

/// What a successful run did
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Features given a new identifier
    pub renumbered: usize,
    /// Records written by the directional statistic
    pub groups: usize,
    pub removed_fields: Vec<String>,
    /// Records rounded and converted
    pub normalized: usize,
    pub layer_name: String,
    pub elapsed: Duration,
}

/// Renumber, summarise, prune, normalize and publish a transect dataset.
///
/// Stages run strictly in order and the first failure stops the run. Work
/// already done by earlier stages is left on disk: a renumbered input stays
/// renumbered and a written output stays written.
pub struct TransectAzimuthPipeline {
    params: PipelineParams,
    provider: Box<dyn DirectionalStatsProvider>,
}

impl TransectAzimuthPipeline {
    /// Pipeline backed by the native [`LinearDirectionalMean`]
    pub fn new(params: PipelineParams) -> Self {
        Self::with_provider(params, Box::new(LinearDirectionalMean))
    }

    pub fn with_provider(params: PipelineParams, provider: Box<dyn DirectionalStatsProvider>) -> Self {
        Self { params, provider }
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    /// Run every stage on `input` and publish the result into `session`.
    ///
    /// One message goes to `sink` after each completed stage. Errors carry
    /// the stage that failed. Without a session the run fails in the
    /// Publishing stage before anything is touched.
    pub fn run(
        &self,
        input: &Path,
        session: Option<&mut MapSession>,
        sink: &mut dyn MessageSink,
    ) -> Result<PipelineReport, PipelineError> {
        let start = Instant::now();
        let params = &self.params;
        let at = |stage: PipelineStage| move |e| PipelineError::new(stage, e);

        // Nowhere to publish: fail before any dataset is modified
        if session.is_none() {
            return Err(PipelineError::new(
                PipelineStage::Publishing,
                Error::NoActiveSession,
            ));
        }
        params.validate().map_err(at(PipelineStage::Renumbering))?;
        let output = derive_output_path(input, &params.output_suffix)
            .map_err(at(PipelineStage::Renumbering))?;
        debug!("Output dataset: {}", output.display());

        let renumbered = renumber_features(input, &params.id_field)
            .map_err(at(PipelineStage::Renumbering))?;
        sink.message(
            PipelineStage::Renumbering,
            &format!("Renumbered {} transects", renumbered),
        );

        let stats_params = DirectionalMeanParams {
            orientation_only: params.orientation_only,
            case_field: Some(params.id_field.clone()),
        };
        let summary = compute_directional_mean(input, &output, self.provider.as_ref(), &stats_params)
            .map_err(at(PipelineStage::Computing))?;
        sink.message(
            PipelineStage::Computing,
            &format!(
                "Computed linear directional mean for {} transects into {}",
                summary.output_records,
                output.display()
            ),
        );

        let removed_fields = prune_fields(&output, &params.pruned_fields)
            .map_err(at(PipelineStage::Pruning))?;
        sink.message(
            PipelineStage::Pruning,
            &format!("Removed fields: {}", removed_fields.join(", ")),
        );

        let normalized = normalize_units(
            &output,
            FIELD_COMPASS_ANGLE,
            FIELD_MEAN_LENGTH,
            params.rounding,
            params.length_factor,
        )
        .map_err(at(PipelineStage::Normalizing))?;
        sink.message(
            PipelineStage::Normalizing,
            &format!("Rounded azimuths and converted lengths to feet for {} records", normalized),
        );

        let layer_name = publish_layer(session, &output, params.layer_position)
            .map_err(at(PipelineStage::Publishing))?;
        sink.message(
            PipelineStage::Publishing,
            &format!("Added layer {} to the map", layer_name),
        );

        let elapsed = start.elapsed();
        info!(
            "Transect azimuths for {} completed in {:.2?}",
            input.display(),
            elapsed
        );

        Ok(PipelineReport {
            input: input.to_path_buf(),
            output,
            renumbered,
            groups: summary.output_records,
            removed_fields,
            normalized,
            layer_name,
            elapsed,
        })
    }
}

impl Default for TransectAzimuthPipeline {
    fn default() -> Self {
        Self::new(PipelineParams::default())
    }
}
