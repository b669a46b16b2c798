//! TopoJSON decoding.
//!
//! Rings are stitched from shared arcs: a negative arc index `!i` walks arc
//! `i` backwards, and consecutive arcs share their joining vertex.

use std::collections::BTreeMap;

use foundation::math::GeoPoint;
use scene::{Feature, FeatureCollection, Geometry, Ring};
use serde::Deserialize;
use serde_json::Value;

use crate::dataset::{DecodeError, DecodedDataset, feature_name, id_string};

#[derive(Debug, Clone, Deserialize)]
pub struct Topology {
    #[serde(default)]
    pub transform: Option<TopologyTransform>,
    pub arcs: Vec<Vec<Vec<f64>>>,
    pub objects: BTreeMap<String, TopologyObject>,
}

/// Quantization transform; positions in arcs are then delta-encoded integers.
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
pub struct TopologyTransform {
    pub scale: [f64; 2],
    pub translate: [f64; 2],
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopologyObject {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub arcs: Option<Value>,
    #[serde(default)]
    pub geometries: Vec<TopologyObject>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Value>,
}

pub fn decode_topology_str(payload: &str, object: &str) -> Result<DecodedDataset, DecodeError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| DecodeError::Json(e.to_string()))?;
    decode_topology_value(value, object)
}

pub fn decode_topology_value(value: Value, object: &str) -> Result<DecodedDataset, DecodeError> {
    let topology: Topology =
        serde_json::from_value(value).map_err(|e| DecodeError::Json(e.to_string()))?;
    topology.features(object)
}

impl Topology {
    /// Converts the named object into features, in document order.
    pub fn features(&self, object: &str) -> Result<DecodedDataset, DecodeError> {
        let root = self
            .objects
            .get(object)
            .ok_or_else(|| DecodeError::MissingObject(object.to_string()))?;
        let arcs = self.absolute_arcs();

        let members: Vec<&TopologyObject> = if root.kind.as_deref() == Some("GeometryCollection") {
            root.geometries.iter().collect()
        } else {
            vec![root]
        };

        let mut features = Vec::with_capacity(members.len());
        let mut skipped = 0;
        for (index, member) in members.into_iter().enumerate() {
            let Some(geometry) = member.geometry(&arcs, index)? else {
                skipped += 1;
                continue;
            };
            let id = id_string(member.id.as_ref());
            let name = feature_name(member.properties.as_ref(), id.as_deref(), index);
            features.push(Feature::new(name, id, geometry));
        }

        Ok(DecodedDataset {
            collection: FeatureCollection::new(features),
            skipped,
        })
    }

    /// Arcs with quantization and delta encoding removed.
    fn absolute_arcs(&self) -> Vec<Vec<GeoPoint>> {
        self.arcs
            .iter()
            .map(|arc| {
                let (mut x, mut y) = (0.0, 0.0);
                arc.iter()
                    .filter(|p| p.len() >= 2)
                    .map(|p| match self.transform {
                        Some(t) => {
                            x += p[0];
                            y += p[1];
                            GeoPoint::new(x * t.scale[0] + t.translate[0], y * t.scale[1] + t.translate[1])
                        }
                        None => GeoPoint::new(p[0], p[1]),
                    })
                    .collect()
            })
            .collect()
    }
}

impl TopologyObject {
    fn geometry(&self, arcs: &[Vec<GeoPoint>], index: usize) -> Result<Option<Geometry>, DecodeError> {
        let invalid = |reason: String| DecodeError::InvalidFeature { index, reason };
        match self.kind.as_deref() {
            Some("Polygon") => {
                let refs: Vec<Vec<i64>> = self.arc_refs().map_err(invalid)?;
                Ok(Some(Geometry::Polygon(polygon(arcs, &refs)?)))
            }
            Some("MultiPolygon") => {
                let refs: Vec<Vec<Vec<i64>>> = self.arc_refs().map_err(invalid)?;
                let polys = refs
                    .iter()
                    .map(|p| polygon(arcs, p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(Geometry::MultiPolygon(polys)))
            }
            _ => Ok(None),
        }
    }

    fn arc_refs<T: serde::de::DeserializeOwned>(&self) -> Result<T, String> {
        let arcs = self.arcs.clone().ok_or("geometry missing arcs".to_string())?;
        serde_json::from_value(arcs).map_err(|e| format!("bad arc references: {e}"))
    }
}

fn polygon(arcs: &[Vec<GeoPoint>], rings: &[Vec<i64>]) -> Result<Vec<Ring>, DecodeError> {
    rings.iter().map(|r| ring(arcs, r)).collect()
}

fn ring(arcs: &[Vec<GeoPoint>], refs: &[i64]) -> Result<Ring, DecodeError> {
    let mut points: Vec<GeoPoint> = Vec::new();
    for &r in refs {
        let i = if r < 0 { !r } else { r };
        let arc = usize::try_from(i)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or(DecodeError::ArcOutOfRange {
                arc: r,
                arc_count: arcs.len(),
            })?;
        points.pop();
        let start = points.len();
        points.extend_from_slice(arc);
        if r < 0 {
            points[start..].reverse();
        }
    }
    if let Some(&first) = points.first() {
        while points.len() < 4 {
            points.push(first);
        }
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::decode_topology_str;
    use crate::DecodeError;
    use foundation::math::GeoPoint;
    use pretty_assertions::assert_eq;
    use scene::Geometry;

    const TOPOLOGY: &str = r#"{
        "type": "Topology",
        "transform": {"scale": [0.5, 0.5], "translate": [-10, -10]},
        "arcs": [
            [[0, 0], [20, 0], [0, 20]],
            [[20, 20], [-20, 0], [0, -20]]
        ],
        "objects": {
            "countries": {
                "type": "GeometryCollection",
                "geometries": [
                    {"type": "Polygon", "arcs": [[0, 1]], "id": "001", "properties": {"name": "Square"}},
                    {"type": "MultiPolygon", "arcs": [[[-2, -1]]], "id": 7},
                    {"type": "LineString", "arcs": [0]},
                    {"type": null}
                ]
            }
        }
    }"#;

    fn pts(coords: &[(f64, f64)]) -> Vec<GeoPoint> {
        coords.iter().map(|&(x, y)| GeoPoint::new(x, y)).collect()
    }

    #[test]
    fn stitches_quantized_arcs_into_closed_rings() {
        let decoded = decode_topology_str(TOPOLOGY, "countries").unwrap();
        assert_eq!(decoded.skipped, 2);
        let features = decoded.collection.features();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].name(), "Square");
        assert_eq!(features[0].id(), Some("001"));
        assert_eq!(
            features[0].geometry(),
            &Geometry::Polygon(vec![pts(&[
                (-10.0, -10.0),
                (0.0, -10.0),
                (0.0, 0.0),
                (-10.0, 0.0),
                (-10.0, -10.0),
            ])])
        );
    }

    #[test]
    fn negative_arcs_run_backwards() {
        let decoded = decode_topology_str(TOPOLOGY, "countries").unwrap();
        let feature = &decoded.collection.features()[1];
        assert_eq!(feature.name(), "7");
        assert_eq!(
            feature.geometry(),
            &Geometry::MultiPolygon(vec![vec![pts(&[
                (-10.0, -10.0),
                (-10.0, 0.0),
                (0.0, 0.0),
                (0.0, -10.0),
                (-10.0, -10.0),
            ])]])
        );
    }

    #[test]
    fn missing_object_and_bad_arcs_are_errors() {
        assert_eq!(
            decode_topology_str(TOPOLOGY, "land").unwrap_err(),
            DecodeError::MissingObject("land".into())
        );
        let bad = r#"{"type":"Topology","arcs":[],"objects":{"countries":
            {"type":"Polygon","arcs":[[3]]}}}"#;
        assert_eq!(
            decode_topology_str(bad, "countries").unwrap_err(),
            DecodeError::ArcOutOfRange { arc: 3, arc_count: 0 }
        );
    }

    #[test]
    fn unquantized_topology_uses_absolute_positions() {
        let doc = r#"{"type":"Topology","arcs":[[[0,0],[5,0],[5,5],[0,0]]],
            "objects":{"countries":{"type":"Polygon","arcs":[[0]],"properties":{"name":"Tri"}}}}"#;
        let decoded = decode_topology_str(doc, "countries").unwrap();
        let f = &decoded.collection.features()[0];
        assert_eq!(f.name(), "Tri");
        assert_eq!(f.geometry().vertex_count(), 4);
    }
}
