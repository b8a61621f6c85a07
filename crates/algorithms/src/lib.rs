//! # Transectaz Algorithms
//!
//! Line statistics and the transect azimuth workflow.
//!
//! ## Modules
//!
//! - **vector**: Per-line measurements (length, direction, centre)
//! - **statistics**: Linear directional mean
//! - **transect**: Renumber, compute, prune, normalize and publish

pub mod statistics;
pub mod transect;
pub mod vector;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::statistics::{
        linear_directional_mean, DirectionalMeanParams, DirectionalMeanRecord,
        DirectionalStatsProvider, LinearDirectionalMean,
    };
    pub use crate::transect::{
        LogSink, MessageSink, PipelineError, PipelineParams, PipelineReport, PipelineStage,
        RoundingMode, TransectAzimuthPipeline,
    };
    pub use crate::vector::{compass_bearing, direction, length, line_center};
    pub use transectaz_core::prelude::*;
}
