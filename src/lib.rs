//! Tawny Density - which suburb had the most sightings of a species?
//!
//! This library provides the suburb classification engine, the iNaturalist
//! observation source and report writers used by the `tawny-density` binary.

pub mod config;
pub mod error;
pub mod inat;
pub mod pip;
pub mod report;

pub use error::{FetchError, LoadError};
pub use pip::{Area, AreaIndex, BoundingBox, Point, TopArea};
