//! Pipeline configuration.
//!
//! Fixed production values live here as defaults; every stage takes a config
//! reference so tests can point the pipelines at scratch directories and
//! local hosts.

use std::path::{Path, PathBuf};

/// Source URL for the gzip-compressed precinct-results TopoJSON.
pub const TOPO_URL: &str =
    "https://int.nyt.com/newsgraphics/elections/map-data/2024/national/precincts-with-results.topojson.gz";

/// Environment variable holding the GitHub bearer token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

const GITHUB_API: &str = "https://api.github.com";
const GITHUB_UPLOADS: &str = "https://uploads.github.com";

/// Paths and source URL for the index-builder pipeline.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub build_dir: PathBuf,
    pub topo_url: String,
    /// Decompressed TopoJSON destination.
    pub topo_path: PathBuf,
    /// Intermediate EPSG:3857 GeoJSON.
    pub mercator_path: PathBuf,
    /// Simplified EPSG:4326 GeoJSON.
    pub geojson_path: PathBuf,
    /// Final spatially-ordered FeatureCollection.
    pub index_path: PathBuf,
}

impl BuildConfig {
    pub fn new<P: AsRef<Path>>(build_dir: P) -> Self {
        let build_dir = build_dir.as_ref().to_path_buf();
        Self {
            topo_url: TOPO_URL.to_string(),
            topo_path: build_dir.join("precincts-with-results.topojson"),
            mercator_path: build_dir.join("temp-mercator.geojson"),
            geojson_path: build_dir.join("precincts-with-results.geojson"),
            index_path: build_dir.join("precincts-with-results-spatial-index.json"),
            build_dir,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self::new("build")
    }
}

/// Target repository and asset location for the uploader.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub owner: String,
    pub repo: String,
    pub api_base: String,
    pub upload_base: String,
    pub asset_path: PathBuf,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            owner: "concerned-us-citizen".to_string(),
            repo: "protest-map".to_string(),
            api_base: GITHUB_API.to_string(),
            upload_base: GITHUB_UPLOADS.to_string(),
            asset_path: BuildConfig::default().index_path,
        }
    }
}
