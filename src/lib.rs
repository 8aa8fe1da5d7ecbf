//! Precinct spatial index tooling.
//!
//! This library backs two one-shot binaries: `build-index`, which downloads
//! the national precinct-results TopoJSON, reprojects and simplifies it with
//! GDAL, and rewrites the features in R-tree bulk-load order; and
//! `upload-index`, which publishes the resulting file as a GitHub release
//! asset.

pub mod config;
pub mod convert;
pub mod features;
pub mod fetch;
pub mod github;
pub mod index;
pub mod pipeline;

pub use config::{BuildConfig, UploadConfig};
pub use convert::{Converter, Ogr2Ogr, ReprojectJob};
pub use index::SpatialIndex;
pub use pipeline::BuildError;
