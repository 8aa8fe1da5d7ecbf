//! Spatial ordering of features via an R-tree bulk load.
//!
//! The tree is never persisted or queried; its only observable output is the
//! traversal order, which clusters nearby features together so downstream
//! viewport and tile reads touch contiguous runs of the file.

use anyhow::Result;
use geojson::Feature;
use rstar::{RTree, RTreeObject, AABB};
use tracing::info;

/// Wrapper pairing a feature with its envelope for R-tree insertion.
pub struct IndexedFeature {
    feature: Feature,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedFeature {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedFeature {
    /// Requires the feature to carry a bbox already; 3D boxes are accepted
    /// with the elevation bounds ignored.
    fn new(feature: Feature) -> Result<Self> {
        let envelope = match feature.bbox.as_deref() {
            Some([min_x, min_y, max_x, max_y]) => {
                AABB::from_corners([*min_x, *min_y], [*max_x, *max_y])
            }
            Some([min_x, min_y, _, max_x, max_y, _]) => {
                AABB::from_corners([*min_x, *min_y], [*max_x, *max_y])
            }
            Some(other) => anyhow::bail!("Unexpected bbox of length {}", other.len()),
            None => anyhow::bail!("Feature is missing a bbox"),
        };
        Ok(Self { feature, envelope })
    }
}

/// Bulk-loaded R-tree over feature bounding boxes.
pub struct SpatialIndex {
    tree: RTree<IndexedFeature>,
}

impl SpatialIndex {
    /// Bulk-load all features in one pass (STR packing, delegated to rstar).
    pub fn bulk_load(features: Vec<Feature>) -> Result<Self> {
        let indexed = features
            .into_iter()
            .map(IndexedFeature::new)
            .collect::<Result<Vec<_>>>()?;
        let tree = RTree::bulk_load(indexed);
        info!("Spatial index built with {} entries", tree.size());
        Ok(Self { tree })
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// All features in traversal order. Deterministic for a given input.
    pub fn into_ordered_features(self) -> Vec<Feature> {
        self.tree.into_iter().map(|entry| entry.feature).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geojson::{Geometry, JsonObject, Value};

    fn point_feature(id: u64, lon: f64, lat: f64) -> Feature {
        let mut properties = JsonObject::new();
        properties.insert("id".to_string(), serde_json::json!(id));
        Feature {
            bbox: Some(vec![lon, lat, lon, lat]),
            geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
            id: None,
            properties: Some(properties),
            foreign_members: None,
        }
    }

    fn ids(features: &[Feature]) -> Vec<u64> {
        features
            .iter()
            .map(|f| f.properties.as_ref().unwrap()["id"].as_u64().unwrap())
            .collect()
    }

    #[test]
    fn test_count_and_bboxes_preserved() {
        let features = vec![
            point_feature(1, -73.9, 40.7),
            point_feature(2, -118.2, 34.0),
            point_feature(3, -87.6, 41.9),
        ];

        let index = SpatialIndex::bulk_load(features).unwrap();
        assert_eq!(index.len(), 3);

        let ordered = index.into_ordered_features();
        assert_eq!(ordered.len(), 3);
        assert!(ordered.iter().all(|f| f.bbox.is_some()));
    }

    #[test]
    fn test_ordering_is_stable_across_runs() {
        let features: Vec<Feature> = (0..200u32)
            .map(|i| {
                let lon = -120.0 + f64::from(i % 17) * 3.1;
                let lat = 25.0 + f64::from(i % 13) * 1.7;
                point_feature(u64::from(i), lon, lat)
            })
            .collect();

        let first = SpatialIndex::bulk_load(features.clone())
            .unwrap()
            .into_ordered_features();
        let second = SpatialIndex::bulk_load(features)
            .unwrap()
            .into_ordered_features();

        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_missing_bbox_is_an_error() {
        let mut feature = point_feature(1, 0.0, 0.0);
        feature.bbox = None;

        assert!(SpatialIndex::bulk_load(vec![feature]).is_err());
    }

    #[test]
    fn test_three_dimensional_bbox_accepted() {
        let mut feature = point_feature(1, -73.9, 40.7);
        feature.bbox = Some(vec![-73.9, 40.7, 0.0, -73.9, 40.7, 0.0]);

        let index = SpatialIndex::bulk_load(vec![feature]).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_bbox_filled_before_indexing() {
        // One of three features arrives without a bbox; after the fill pass
        // it must index cleanly and come back with the degenerate point box.
        let mut missing = point_feature(2, -73.9, 40.7);
        missing.bbox = None;
        let mut collection = geojson::FeatureCollection {
            bbox: None,
            features: vec![
                point_feature(1, -118.2, 34.0),
                missing,
                point_feature(3, -87.6, 41.9),
            ],
            foreign_members: None,
        };

        crate::features::ensure_bboxes(&mut collection).unwrap();
        let ordered = SpatialIndex::bulk_load(collection.features)
            .unwrap()
            .into_ordered_features();

        assert_eq!(ordered.len(), 3);
        let filled = ordered
            .iter()
            .find(|f| f.properties.as_ref().unwrap()["id"] == 2)
            .unwrap();
        assert_eq!(filled.bbox, Some(vec![-73.9, 40.7, -73.9, 40.7]));
    }
}
