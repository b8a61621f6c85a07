//! Vector analysis algorithms
//!
//! Geometric measurements on line features:
//! - Length: Euclidean length in CRS units
//! - Direction: first-to-last vertex angle, and its compass bearing
//! - Centre: length-weighted centroid

mod measurements;

pub use measurements::{compass_bearing, direction, endpoints, length, line_center};
