use catalog::{ProjectionFactory, ProjectionId};
use foundation::Viewport;
use foundation::math::Rotation;
use scene::Feature;

use crate::path::GeoPath;

/// Scale used to measure a feature before fitting it.
pub const REFERENCE_SCALE: f64 = 100.0;

/// Share of the limiting viewport dimension a fitted feature may fill.
pub const FIT_FILL: f64 = 0.8;

/// Rotation and scale that frame one feature.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Framing {
    pub rotation: Rotation,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    DegenerateGeometry { name: String },
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::DegenerateGeometry { name } => {
                write!(f, "cannot frame {name:?}: geometry has no extent")
            }
        }
    }
}

impl std::error::Error for FitError {}

/// Centres a feature on its centroid and scales it to fit the viewport.
///
/// Features that span the rotated antimeridian can measure wider than they
/// look; that box is used as is.
#[derive(Debug, Default, Copy, Clone)]
pub struct FrameFitter {
    factory: ProjectionFactory,
}

impl FrameFitter {
    pub fn new(factory: ProjectionFactory) -> Self {
        Self { factory }
    }

    pub fn fit(
        &self,
        feature: &Feature,
        projection: ProjectionId,
        viewport: Viewport,
    ) -> Result<Framing, FitError> {
        let degenerate = || FitError::DegenerateGeometry {
            name: feature.name().to_string(),
        };
        let centroid = feature
            .centroid()
            .filter(|_| !feature.is_degenerate())
            .ok_or_else(degenerate)?;
        let rotation = Rotation::yaw_pitch(-centroid.lon_deg, -centroid.lat_deg);

        let reference = self
            .factory
            .build_id(projection, rotation, viewport)
            .with_scale(REFERENCE_SCALE);
        let bounds = GeoPath::new(&reference)
            .geometry(feature.geometry())
            .bounds()
            .ok_or_else(degenerate)?;

        let extent = (bounds.width() / viewport.width()).max(bounds.height() / viewport.height());
        if !(extent.is_finite() && extent > 0.0) {
            return Err(degenerate());
        }
        Ok(Framing {
            rotation,
            scale: REFERENCE_SCALE / extent * FIT_FILL,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{FIT_FILL, FitError, FrameFitter};
    use crate::path::GeoPath;
    use catalog::{ProjectionFactory, ProjectionId};
    use foundation::Viewport;
    use foundation::math::GeoPoint;
    use scene::{Feature, Geometry};

    fn rect(lon0: f64, lat0: f64, lon1: f64, lat1: f64) -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(lon0, lat0),
            GeoPoint::new(lon1, lat0),
            GeoPoint::new(lon1, lat1),
            GeoPoint::new(lon0, lat1),
            GeoPoint::new(lon0, lat0),
        ]
    }

    fn france() -> Feature {
        Feature::new(
            "France",
            Some("FRA".into()),
            Geometry::MultiPolygon(vec![
                vec![rect(-4.8, 42.3, 8.2, 51.1)],
                vec![rect(8.5, 41.4, 9.6, 43.0)],
            ]),
        )
    }

    #[test]
    fn centroid_lands_on_viewport_center() {
        let feature = france();
        let centroid = feature.centroid().unwrap();
        for (w, h) in [(960.0, 600.0), (500.0, 900.0)] {
            let viewport = Viewport::new(w, h);
            for id in ProjectionId::ALL {
                let framing = FrameFitter::default().fit(&feature, id, viewport).unwrap();
                let projection = ProjectionFactory
                    .build_id(id, framing.rotation, viewport)
                    .with_scale(framing.scale);
                let p = projection.project(centroid).unwrap();
                assert!((p.x - w / 2.0).abs() <= 1.0, "{id}: {p:?}");
                assert!((p.y - h / 2.0).abs() <= 1.0, "{id}: {p:?}");
            }
        }
    }

    #[test]
    fn fitted_box_leaves_padding() {
        let feature = france();
        let viewport = Viewport::new(960.0, 600.0);
        for id in ProjectionId::ALL {
            let framing = FrameFitter::default().fit(&feature, id, viewport).unwrap();
            let projection = ProjectionFactory
                .build_id(id, framing.rotation, viewport)
                .with_scale(framing.scale);
            let b = GeoPath::new(&projection)
                .geometry(feature.geometry())
                .bounds()
                .unwrap();
            let fill = (b.width() / viewport.width()).max(b.height() / viewport.height());
            assert!((fill - FIT_FILL).abs() < 1e-6, "{id}: {fill}");
        }
    }

    #[test]
    fn empty_geometry_cannot_be_framed() {
        let feature = Feature::new("Atlantis", None, Geometry::MultiPolygon(Vec::new()));
        let err = FrameFitter::default()
            .fit(&feature, ProjectionId::Mercator, Viewport::default())
            .unwrap_err();
        assert_eq!(
            err,
            FitError::DegenerateGeometry {
                name: "Atlantis".into()
            }
        );
    }
}
