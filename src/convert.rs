//! GDAL reprojection via the `ogr2ogr` command-line tool.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::info;

/// A single `ogr2ogr` reprojection pass.
#[derive(Debug, Clone)]
pub struct ReprojectJob {
    pub source_srs: String,
    pub target_srs: String,
    /// Simplification tolerance in the source projection's units.
    pub simplify: Option<f64>,
    /// Decimal digits kept in output coordinates.
    pub coordinate_precision: Option<u32>,
}

impl ReprojectJob {
    pub fn new(source_srs: &str, target_srs: &str) -> Self {
        Self {
            source_srs: source_srs.to_string(),
            target_srs: target_srs.to_string(),
            simplify: None,
            coordinate_precision: None,
        }
    }

    pub fn simplify(mut self, tolerance: f64) -> Self {
        self.simplify = Some(tolerance);
        self
    }

    pub fn coordinate_precision(mut self, digits: u32) -> Self {
        self.coordinate_precision = Some(digits);
        self
    }

    /// Full argument list for `ogr2ogr`, output path before input path.
    pub fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "GeoJSON".to_string(),
            output.display().to_string(),
            input.display().to_string(),
            "-s_srs".to_string(),
            self.source_srs.clone(),
            "-t_srs".to_string(),
            self.target_srs.clone(),
        ];
        if let Some(tolerance) = self.simplify {
            args.push("-simplify".to_string());
            args.push(tolerance.to_string());
        }
        if let Some(digits) = self.coordinate_precision {
            args.push("-lco".to_string());
            args.push(format!("COORDINATE_PRECISION={}", digits));
        }
        args
    }
}

/// Narrow seam over the external conversion tool so tests can substitute it.
pub trait Converter {
    /// Verify the tool is installed and runnable.
    fn check(&self) -> Result<()>;

    /// Reproject `input` into `output` according to `job`.
    fn reproject(&self, input: &Path, output: &Path, job: &ReprojectJob) -> Result<()>;
}

/// The real GDAL `ogr2ogr` binary, run with inherited stdio so its progress
/// output stays visible.
pub struct Ogr2Ogr;

impl Converter for Ogr2Ogr {
    fn check(&self) -> Result<()> {
        let status = Command::new("ogr2ogr")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .context("GDAL (ogr2ogr) is not installed. On macOS: brew install gdal")?;

        if !status.success() {
            anyhow::bail!(
                "ogr2ogr --version exited with {}. On macOS: brew install gdal",
                status
            );
        }
        info!("GDAL is installed");
        Ok(())
    }

    fn reproject(&self, input: &Path, output: &Path, job: &ReprojectJob) -> Result<()> {
        info!(
            "Reprojecting {} -> {} ({} -> {})",
            input.display(),
            output.display(),
            job.source_srs,
            job.target_srs
        );

        let status = Command::new("ogr2ogr")
            .args(job.args(input, output))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .context("Failed to run ogr2ogr")?;

        if !status.success() {
            anyhow::bail!("ogr2ogr exited with {}", status);
        }
        Ok(())
    }
}
