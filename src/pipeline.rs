//! Index-builder pipeline: tool check through spatial-index write.
//!
//! Stages run strictly in sequence; each one's failure is tagged with a
//! [`BuildError`] variant so callers can tell which stage gave up without
//! parsing log output.

use std::path::Path;

use anyhow::{Context, Result};
use reqwest::Client;
use thiserror::Error;
use tracing::info;

use crate::config::BuildConfig;
use crate::convert::{Converter, ReprojectJob};
use crate::features;
use crate::fetch;
use crate::index::SpatialIndex;

/// Simplification tolerance in meters, applied while in EPSG:3857.
const SIMPLIFY_TOLERANCE_M: f64 = 100.0;
/// Decimal digits kept in output coordinates.
const COORDINATE_PRECISION: u32 = 5;

const GEOGRAPHIC_SRS: &str = "EPSG:4326";
const MERCATOR_SRS: &str = "EPSG:3857";

/// A build failure, tagged with the stage that produced it.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("conversion tool unavailable")]
    Tool(#[source] anyhow::Error),
    #[error("failed to prepare build directory")]
    Workspace(#[source] anyhow::Error),
    #[error("failed to fetch source dataset")]
    Fetch(#[source] anyhow::Error),
    #[error("format conversion failed")]
    Convert(#[source] anyhow::Error),
    #[error("spatial index construction failed")]
    Index(#[source] anyhow::Error),
}

/// Run the whole pipeline: tool check, workspace prep, download, the two
/// reprojection passes, then the spatial-index rewrite.
pub async fn run_build(
    config: &BuildConfig,
    converter: &impl Converter,
    client: &Client,
) -> std::result::Result<(), BuildError> {
    converter.check().map_err(BuildError::Tool)?;

    ensure_build_dir(&config.build_dir).map_err(BuildError::Workspace)?;

    fetch::fetch_topology(client, &config.topo_url, &config.topo_path)
        .await
        .map_err(BuildError::Fetch)?;

    convert(config, converter).map_err(BuildError::Convert)?;

    build_spatial_index(&config.geojson_path, &config.index_path).map_err(BuildError::Index)?;

    Ok(())
}

fn ensure_build_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        info!("Created build directory: {}", dir.display());
    }
    Ok(())
}

/// Round-trip through Mercator: the simplification tolerance is meaningful
/// in meters, so simplify there and come back to geographic coordinates.
fn convert(config: &BuildConfig, converter: &impl Converter) -> Result<()> {
    info!("Converting TopoJSON to GeoJSON (Mercator) - this could take a while...");
    converter.reproject(
        &config.topo_path,
        &config.mercator_path,
        &ReprojectJob::new(GEOGRAPHIC_SRS, MERCATOR_SRS),
    )?;

    info!("Reprojecting back to {} and simplifying...", GEOGRAPHIC_SRS);
    converter.reproject(
        &config.mercator_path,
        &config.geojson_path,
        &ReprojectJob::new(MERCATOR_SRS, GEOGRAPHIC_SRS)
            .simplify(SIMPLIFY_TOLERANCE_M)
            .coordinate_precision(COORDINATE_PRECISION),
    )?;

    info!("Final GeoJSON saved to {}", config.geojson_path.display());
    Ok(())
}

/// Rewrite a feature collection in R-tree bulk-load order.
pub fn build_spatial_index(input: &Path, output: &Path) -> Result<()> {
    let mut collection = features::read_collection(input)?;
    features::ensure_bboxes(&mut collection)?;

    info!("Indexing {} features...", collection.features.len());
    let index = SpatialIndex::bulk_load(collection.features)?;
    let ordered = index.into_ordered_features();

    features::write_collection(output, ordered)?;
    info!("Spatial index written to {}", output.display());
    Ok(())
}
