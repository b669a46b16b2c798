use foundation::math::GeoPoint;
use scene::{Feature, FeatureCollection, Geometry, Ring};
use serde_json::Value;

use crate::dataset::{DecodeError, DecodedDataset, feature_name, id_string};

pub fn decode_geojson_str(payload: &str) -> Result<DecodedDataset, DecodeError> {
    let value: Value =
        serde_json::from_str(payload).map_err(|e| DecodeError::Json(e.to_string()))?;
    decode_geojson_value(&value)
}

/// Decodes a FeatureCollection, keeping Polygon and MultiPolygon features.
pub fn decode_geojson_value(value: &Value) -> Result<DecodedDataset, DecodeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| DecodeError::UnsupportedDocument("non-object".into()))?;
    let ty = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    if ty != "FeatureCollection" {
        return Err(DecodeError::UnsupportedDocument(ty.to_string()));
    }
    let features_val = obj
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| DecodeError::UnsupportedDocument("FeatureCollection without features".into()))?;

    let mut features = Vec::with_capacity(features_val.len());
    let mut skipped = 0;
    for (index, feat_val) in features_val.iter().enumerate() {
        let invalid = |reason: String| DecodeError::InvalidFeature { index, reason };
        let feat_obj = feat_val
            .as_object()
            .ok_or_else(|| invalid("feature must be an object".into()))?;
        let id = id_string(feat_obj.get("id"));
        let geometry = match feat_obj.get("geometry") {
            None | Some(Value::Null) => None,
            Some(g) => parse_geometry(g).map_err(invalid)?,
        };
        let Some(geometry) = geometry else {
            skipped += 1;
            continue;
        };
        let name = feature_name(feat_obj.get("properties"), id.as_deref(), index);
        features.push(Feature::new(name, id, geometry));
    }

    Ok(DecodedDataset {
        collection: FeatureCollection::new(features),
        skipped,
    })
}

/// `Ok(None)` for valid geometries that have no area.
fn parse_geometry(value: &Value) -> Result<Option<Geometry>, String> {
    let obj = value
        .as_object()
        .ok_or("geometry must be an object".to_string())?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type".to_string())?;

    let coords = || {
        obj.get("coordinates")
            .ok_or("geometry missing coordinates".to_string())
    };

    match ty {
        "Polygon" => Ok(Some(Geometry::Polygon(parse_polygon(coords()?)?))),
        "MultiPolygon" => Ok(Some(Geometry::MultiPolygon(parse_multi_polygon(coords()?)?))),
        "Point" | "MultiPoint" | "LineString" | "MultiLineString" | "GeometryCollection" => {
            Ok(None)
        }
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_point(coords: &Value) -> Result<GeoPoint, String> {
    let arr = coords
        .as_array()
        .ok_or("position must be an array".to_string())?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let lon = arr[0].as_f64().ok_or("lon must be a number".to_string())?;
    let lat = arr[1].as_f64().ok_or("lat must be a number".to_string())?;
    Ok(GeoPoint::new(lon, lat))
}

fn parse_ring(coords: &Value) -> Result<Ring, String> {
    let arr = coords
        .as_array()
        .ok_or("ring must be an array".to_string())?;
    arr.iter().map(parse_point).collect()
}

fn parse_polygon(coords: &Value) -> Result<Vec<Ring>, String> {
    let rings = coords
        .as_array()
        .ok_or("Polygon coordinates must be an array of rings".to_string())?;
    rings.iter().map(parse_ring).collect()
}

fn parse_multi_polygon(coords: &Value) -> Result<Vec<Vec<Ring>>, String> {
    let polys = coords
        .as_array()
        .ok_or("MultiPolygon coordinates must be an array of polygons".to_string())?;
    polys.iter().map(parse_polygon).collect()
}
