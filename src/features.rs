//! FeatureCollection I/O and bounding-box maintenance.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use geo::BoundingRect;
use geojson::{Bbox, Feature, FeatureCollection};
use tracing::info;

/// Parse a GeoJSON file as a FeatureCollection.
pub fn read_collection(path: &Path) -> Result<FeatureCollection> {
    info!("Reading {}...", path.display());
    let file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let collection: FeatureCollection = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse {} as a FeatureCollection", path.display()))?;
    Ok(collection)
}

/// Write features back out as `{ "type": "FeatureCollection", "features": [...] }`.
pub fn write_collection(path: &Path, features: Vec<Feature>) -> Result<()> {
    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Attach a computed bbox to every feature that lacks one.
///
/// Indexing requires an envelope per feature, so a feature without a geometry
/// to derive one from is an error.
pub fn ensure_bboxes(collection: &mut FeatureCollection) -> Result<()> {
    let mut computed = 0usize;
    for feature in &mut collection.features {
        if feature.bbox.is_none() {
            feature.bbox = Some(feature_bbox(feature)?);
            computed += 1;
        }
    }
    if computed > 0 {
        info!("Computed {} missing bounding boxes", computed);
    }
    Ok(())
}

/// `[min_lon, min_lat, max_lon, max_lat]` of a feature's geometry.
fn feature_bbox(feature: &Feature) -> Result<Bbox> {
    let geometry = feature
        .geometry
        .as_ref()
        .context("Feature has no geometry to derive a bbox from")?;
    let geometry: geo_types::Geometry<f64> = geometry
        .try_into()
        .context("Feature geometry is not convertible")?;
    let rect = geometry
        .bounding_rect()
        .context("Feature geometry has no extent")?;
    Ok(vec![rect.min().x, rect.min().y, rect.max().x, rect.max().y])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, Value};

    fn feature_with(value: Value) -> Feature {
        Feature {
            bbox: None,
            geometry: Some(Geometry::new(value)),
            id: None,
            properties: None,
            foreign_members: None,
        }
    }

    #[test]
    fn test_point_bbox_is_degenerate() {
        let mut collection = FeatureCollection {
            bbox: None,
            features: vec![feature_with(Value::Point(vec![-73.9, 40.7]))],
            foreign_members: None,
        };

        ensure_bboxes(&mut collection).unwrap();

        assert_eq!(
            collection.features[0].bbox,
            Some(vec![-73.9, 40.7, -73.9, 40.7])
        );
    }

    #[test]
    fn test_polygon_bbox() {
        let ring = vec![
            vec![0.0, 0.0],
            vec![2.0, 0.0],
            vec![2.0, 1.0],
            vec![0.0, 1.0],
            vec![0.0, 0.0],
        ];
        let mut collection = FeatureCollection {
            bbox: None,
            features: vec![feature_with(Value::Polygon(vec![ring]))],
            foreign_members: None,
        };

        ensure_bboxes(&mut collection).unwrap();

        assert_eq!(collection.features[0].bbox, Some(vec![0.0, 0.0, 2.0, 1.0]));
    }

    #[test]
    fn test_existing_bbox_is_kept() {
        let mut feature = feature_with(Value::Point(vec![5.0, 5.0]));
        feature.bbox = Some(vec![1.0, 2.0, 3.0, 4.0]);
        let mut collection = FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        };

        ensure_bboxes(&mut collection).unwrap();

        assert_eq!(collection.features[0].bbox, Some(vec![1.0, 2.0, 3.0, 4.0]));
    }

    #[test]
    fn test_feature_without_geometry_is_an_error() {
        let mut collection = FeatureCollection {
            bbox: None,
            features: vec![Feature {
                bbox: None,
                geometry: None,
                id: None,
                properties: None,
                foreign_members: None,
            }],
            foreign_members: None,
        };

        assert!(ensure_bboxes(&mut collection).is_err());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");

        let features = vec![feature_with(Value::Point(vec![1.5, 2.5]))];
        write_collection(&path, features).unwrap();

        let collection = read_collection(&path).unwrap();
        assert_eq!(collection.features.len(), 1);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["type"], "FeatureCollection");
    }
}
