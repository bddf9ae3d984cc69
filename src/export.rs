//! Map export for visualization consumers.
//!
//! Dimensionality reduction itself happens elsewhere; this module only zips
//! stored documents with externally computed 2D/3D coordinates and writes
//! the `{id, value, x, y[, z]}` records downstream viewers consume.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use crate::stores::StoredDocument;
use crate::types::WikivecError;

/// One document's position on the embedding map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub id: i64,
    pub value: String,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f32>,
}

/// Documents that carry an aggregate embedding, in stored order.
///
/// Projection runs over exactly this subset, so its output lines up with
/// [`map_points`].
pub fn embedded_documents(docs: &[StoredDocument]) -> Vec<&StoredDocument> {
    docs.iter().filter(|doc| doc.embedding.is_some()).collect()
}

/// Pairs documents with their reduced coordinates.
///
/// Each coordinate row must have two (x, y) or three (x, y, z) components
/// and there must be exactly one row per document.
pub fn map_points(
    docs: &[&StoredDocument],
    coords: &[Vec<f32>],
) -> Result<Vec<MapPoint>, WikivecError> {
    if docs.len() != coords.len() {
        return Err(WikivecError::Export(format!(
            "{} documents but {} coordinate rows",
            docs.len(),
            coords.len()
        )));
    }

    let mut points = Vec::with_capacity(docs.len());
    for (doc, coord) in docs.iter().zip(coords) {
        let (x, y, z) = match coord.as_slice() {
            [x, y] => (*x, *y, None),
            [x, y, z] => (*x, *y, Some(*z)),
            other => {
                return Err(WikivecError::Export(format!(
                    "coordinate row for document {} has {} components",
                    doc.id,
                    other.len()
                )));
            }
        };
        points.push(MapPoint {
            id: doc.id,
            value: doc.title.clone(),
            x,
            y,
            z,
        });
    }
    Ok(points)
}

/// Writes map points as pretty-printed JSON.
pub async fn write_map_json(
    path: impl AsRef<Path>,
    points: &[MapPoint],
) -> Result<(), WikivecError> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(points)
        .map_err(|err| WikivecError::Export(err.to_string()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }
    fs::write(path, json).await?;
    info!(path = %path.display(), points = points.len(), "wrote embedding map");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: i64, title: &str, embedded: bool) -> StoredDocument {
        StoredDocument {
            id,
            title: title.to_string(),
            embedding: embedded.then(|| vec![0.1, 0.2]),
        }
    }

    #[test]
    fn skips_documents_without_embeddings() {
        let docs = vec![doc(1, "A", true), doc(2, "B", false), doc(3, "C", true)];
        let embedded = embedded_documents(&docs);
        let ids: Vec<i64> = embedded.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn builds_2d_and_3d_points() {
        let docs = vec![doc(1, "A", true), doc(2, "B", true)];
        let refs = embedded_documents(&docs);

        let flat = map_points(&refs, &[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(flat[0].z, None);
        assert_eq!(flat[1].x, 3.0);

        let spatial = map_points(&refs, &[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!(spatial[0].z, Some(3.0));
        assert_eq!(spatial[1].value, "B");
    }

    #[test]
    fn mismatched_lengths_are_an_export_error() {
        let docs = vec![doc(1, "A", true)];
        let refs = embedded_documents(&docs);
        let err = map_points(&refs, &[]).unwrap_err();
        assert!(matches!(err, WikivecError::Export(_)));
    }

    #[tokio::test]
    async fn writes_json_that_omits_absent_z() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maps/points.json");
        let points = vec![MapPoint {
            id: 1,
            value: "Cat".to_string(),
            x: 0.5,
            y: -0.5,
            z: None,
        }];

        write_map_json(&path, &points).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"value\": \"Cat\""));
        assert!(!raw.contains("\"z\""));

        let parsed: Vec<MapPoint> = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, points);
    }
}
