use std::sync::Arc;

use foundation::Aabb2;
use foundation::math::{GeoPoint, Vec2, spherical_centroid};

/// A closed ring of geographic positions; the first vertex is repeated at the end.
pub type Ring = Vec<GeoPoint>;

/// Area geometry in geographic degrees. The first ring of each polygon is its
/// exterior, any further rings are holes.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Polygon(Vec<Ring>),
    MultiPolygon(Vec<Vec<Ring>>),
}

impl Geometry {
    pub fn polygons(&self) -> impl Iterator<Item = &[Ring]> + '_ {
        let polys: Box<dyn Iterator<Item = &[Ring]> + '_> = match self {
            Geometry::Polygon(rings) => Box::new(std::iter::once(rings.as_slice())),
            Geometry::MultiPolygon(polys) => Box::new(polys.iter().map(Vec::as_slice)),
        };
        polys
    }

    pub fn rings(&self) -> impl Iterator<Item = &[GeoPoint]> + '_ {
        self.polygons()
            .flat_map(|rings| rings.iter().map(Vec::as_slice))
    }

    pub fn vertex_count(&self) -> usize {
        self.rings().map(<[GeoPoint]>::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rings().all(|r| r.len() < 3)
    }
}

/// A named region with its derived geographic bounds and centroid.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    name: String,
    id: Option<String>,
    geometry: Geometry,
    bounds: Aabb2,
    centroid: Option<GeoPoint>,
}

impl Feature {
    pub fn new(name: impl Into<String>, id: Option<String>, geometry: Geometry) -> Self {
        let bounds: Aabb2 = geometry
            .rings()
            .flatten()
            .map(|p| Vec2::new(p.lon_deg, p.lat_deg))
            .collect();
        let centroid = if geometry.is_empty() {
            None
        } else {
            spherical_centroid(geometry.rings())
        };
        Self {
            name: name.into(),
            id,
            geometry,
            bounds,
            centroid,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Longitude/latitude box in degrees (x = lon, y = lat).
    pub fn bounds(&self) -> Aabb2 {
        self.bounds
    }

    pub fn centroid(&self) -> Option<GeoPoint> {
        self.centroid
    }

    /// True when the geometry has no area to frame.
    pub fn is_degenerate(&self) -> bool {
        self.bounds.is_empty() || self.centroid.is_none()
    }
}

/// Ordered features of one dataset. Cheap to clone; features are shared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureCollection {
    features: Arc<[Feature]>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            features: features.into(),
        }
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Feature> {
        self.features.get(index)
    }

    /// First feature whose name matches case-insensitively.
    pub fn find_by_name(&self, name: &str) -> Option<&Feature> {
        let wanted = name.trim().to_lowercase();
        self.features
            .iter()
            .find(|f| f.name.to_lowercase() == wanted)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Feature> {
        self.features.iter()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
