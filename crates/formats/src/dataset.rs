use scene::FeatureCollection;
use serde_json::Value;

/// Default topology object holding the region polygons.
pub const DEFAULT_OBJECT: &str = "countries";

#[derive(Debug, Clone, PartialEq)]
pub struct DecodedDataset {
    pub collection: FeatureCollection,
    /// Features dropped because they carry no area geometry.
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    Json(String),
    UnsupportedDocument(String),
    MissingObject(String),
    ArcOutOfRange { arc: i64, arc_count: usize },
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::Json(msg) => write!(f, "JSON parse error: {msg}"),
            DecodeError::UnsupportedDocument(ty) => {
                write!(f, "expected Topology or FeatureCollection, got {ty}")
            }
            DecodeError::MissingObject(name) => write!(f, "topology has no object {name:?}"),
            DecodeError::ArcOutOfRange { arc, arc_count } => {
                write!(f, "arc index {arc} out of range ({arc_count} arcs)")
            }
            DecodeError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decodes a dataset payload: a topology document (reading `object`) or a
/// plain GeoJSON FeatureCollection.
pub fn decode_dataset(payload: &str, object: &str) -> Result<DecodedDataset, DecodeError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| DecodeError::Json(e.to_string()))?;
    let ty = value
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("<missing type>")
        .to_string();
    match ty.as_str() {
        "Topology" => crate::topology::decode_topology_value(value, object),
        "FeatureCollection" => crate::geojson::decode_geojson_value(&value),
        _ => Err(DecodeError::UnsupportedDocument(ty)),
    }
}

/// Display name for a feature: `properties.name`, then its id, then its position.
pub(crate) fn feature_name(properties: Option<&Value>, id: Option<&str>, index: usize) -> String {
    properties
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| id.map(str::to_string))
        .unwrap_or_else(|| format!("Feature {index}"))
}

pub(crate) fn id_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeError, decode_dataset};

    #[test]
    fn rejects_other_documents() {
        let err = decode_dataset(r#"{"type":"Point","coordinates":[0,0]}"#, "countries").unwrap_err();
        assert_eq!(err, DecodeError::UnsupportedDocument("Point".into()));
        assert!(matches!(
            decode_dataset("not json", "countries"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn dispatches_on_document_type() {
        let fc = r#"{"type":"FeatureCollection","features":[]}"#;
        let decoded = decode_dataset(fc, "countries").unwrap();
        assert!(decoded.collection.is_empty());
        assert_eq!(decoded.skipped, 0);
    }
}
