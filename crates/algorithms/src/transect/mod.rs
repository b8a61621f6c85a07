//! Transect azimuth workflow
//!
//! Soil transects are digitised as polylines. This module turns a transect
//! dataset into a per-transect azimuth table in five steps:
//!
//! 1. **renumber**: sequential identifiers 1..=N in file order
//! 2. **compute**: linear directional mean per identifier into `<name>_az.shp`
//! 3. **prune**: drop the statistic fields nobody reads
//! 4. **normalize**: whole-degree azimuths, lengths in feet
//! 5. **publish**: add the output to a map session and save it
//!
//! Each step is usable on its own; [`TransectAzimuthPipeline`] runs them in
//! order.

mod compute;
mod normalize;
mod params;
mod pipeline;
mod prune;
mod publish;
mod renumber;
mod stage;

pub use compute::{compute_directional_mean, ComputeSummary};
pub use normalize::{normalize_units, round_bearing};
pub use params::{PipelineParams, RoundingMode, DEFAULT_ID_FIELD, METERS_TO_FEET};
pub use pipeline::{PipelineReport, TransectAzimuthPipeline};
pub use prune::prune_fields;
pub use publish::publish_layer;
pub use renumber::{renumber_collection, renumber_features};
pub use stage::{LogSink, MessageSink, PipelineError, PipelineStage};
