//! # transectaz Core
//!
//! Core types, traits and I/O for the transectaz toolkit.
//!
//! This crate provides:
//! - `FeatureCollection`: Vector features with an attribute schema
//! - `CRS`: Coordinate Reference System passthrough from `.prj` files
//! - Shapefile I/O and a locked, scoped `UpdateCursor`
//! - `MapSession`: an open map document with a layer stack
//! - Algorithm traits for consistent API

pub mod crs;
pub mod error;
pub mod io;
pub mod map;
pub mod vector;

pub use crs::CRS;
pub use error::{Error, Result};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::map::{Layer, LayerPosition, MapSession};
    pub use crate::vector::{AttributeValue, Feature, FeatureCollection, FieldDef, Schema};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in transectaz.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
