//! Statistical analysis algorithms for vector data
//!
//! - **directional**: Linear directional mean of line features

pub mod directional;

pub use directional::{
    linear_directional_mean, output_schema, records_to_collection, DirectionalMeanParams,
    DirectionalMeanRecord, DirectionalStatsProvider, LinearDirectionalMean,
    FIELD_CIRCULAR_VARIANCE, FIELD_COMPASS_ANGLE, FIELD_DIRECTION_MEAN, FIELD_MEAN_LENGTH,
    FIELD_MEAN_X, FIELD_MEAN_Y,
};
