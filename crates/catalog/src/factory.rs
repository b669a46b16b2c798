use foundation::Viewport;
use foundation::math::{Projection, Rotation};

use crate::{Fixup, ProjectionId, TRANSVERSE_ROLL_DEG, UnknownProjection};

/// Builds configured projections from catalog ids.
///
/// Stateless; a projection is rebuilt for every frame because its scale,
/// translation and rotation all follow the view.
#[derive(Debug, Default, Copy, Clone)]
pub struct ProjectionFactory;

impl ProjectionFactory {
    pub fn build(
        &self,
        id: &str,
        rotation: Rotation,
        viewport: Viewport,
    ) -> Result<Projection, UnknownProjection> {
        let id: ProjectionId = id.parse()?;
        Ok(self.build_id(id, rotation, viewport))
    }

    pub fn build_id(&self, id: ProjectionId, rotation: Rotation, viewport: Viewport) -> Projection {
        Projection::new(id.raw(), id.clip())
            .with_rotation(effective_rotation(id, rotation))
            .with_translate(viewport.center())
            .with_scale(world_scale(id, viewport))
    }
}

/// Heuristic scale that keeps the whole world on screen for `id`.
pub fn world_scale(id: ProjectionId, viewport: Viewport) -> f64 {
    viewport.min_side() / id.family().scale_divisor()
}

fn effective_rotation(id: ProjectionId, rotation: Rotation) -> Rotation {
    match id.fixup() {
        // The roll goes onto a zero base, never onto a previous roll.
        Fixup::ZeroBaseRotation => Rotation::yaw_pitch(rotation.lambda_deg, rotation.phi_deg)
            .with_roll(rotation.gamma_deg + TRANSVERSE_ROLL_DEG),
        Fixup::None | Fixup::StandardParallels { .. } => rotation,
    }
}

#[cfg(test)]
mod tests {
    use super::{ProjectionFactory, world_scale};
    use crate::ProjectionId;
    use foundation::Viewport;
    use foundation::math::{GeoPoint, Rotation};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn every_projection_builds_with_positive_scale() {
        let factory = ProjectionFactory;
        let sizes = [
            (960.0, 600.0),
            (320.0, 1280.0),
            (1.0, 1.0),
            (0.0, 0.0),
            (4096.0, 17.0),
        ];
        for id in ProjectionId::ALL {
            for (w, h) in sizes {
                let p = factory
                    .build(id.as_str(), Rotation::yaw_pitch(10.0, -20.0), Viewport::new(w, h))
                    .unwrap();
                assert!(p.scale() > 0.0, "{id} at {w}x{h}");
                assert!(p.scale().is_finite());
            }
        }
    }

    #[test]
    fn unknown_id_fails_closed() {
        let err = ProjectionFactory
            .build("geoBogus", Rotation::default(), Viewport::default())
            .unwrap_err();
        assert_eq!(err.id, "geoBogus");
    }

    #[test]
    fn scale_follows_family_divisor() {
        let viewport = Viewport::new(1000.0, 440.0);
        let cases = [
            (ProjectionId::Orthographic, 200.0),
            (ProjectionId::ConicConformal, 440.0 / 4.5),
            (ProjectionId::Mercator, 440.0 / 6.5),
            (ProjectionId::EqualEarth, 80.0),
        ];
        for (id, expected) in cases {
            let p = ProjectionFactory.build_id(id, Rotation::default(), viewport);
            assert_close(p.scale(), expected, 1e-9);
            assert_close(world_scale(id, viewport), expected, 1e-9);
        }
    }

    #[test]
    fn rotated_center_lands_on_viewport_center() {
        let viewport = Viewport::new(800.0, 500.0);
        for id in ProjectionId::ALL {
            let p = ProjectionFactory.build_id(id, Rotation::yaw_pitch(-10.0, 20.0), viewport);
            let center = p.project(GeoPoint::new(10.0, -20.0)).unwrap();
            assert_close(center.x, 400.0, 1e-6);
            assert_close(center.y, 250.0, 1e-6);
        }
    }

    #[test]
    fn transverse_mercator_rolls_from_a_zero_base() {
        let p = ProjectionFactory.build_id(
            ProjectionId::TransverseMercator,
            Rotation::yaw_pitch(15.0, -5.0),
            Viewport::default(),
        );
        assert_eq!(p.rotation(), Rotation::new(15.0, -5.0, 90.0));

        let other = ProjectionFactory.build_id(
            ProjectionId::Mercator,
            Rotation::yaw_pitch(15.0, -5.0),
            Viewport::default(),
        );
        assert_eq!(other.rotation(), Rotation::yaw_pitch(15.0, -5.0));
    }

    #[test]
    fn transverse_mercator_keeps_north_up() {
        let p = ProjectionFactory.build_id(
            ProjectionId::TransverseMercator,
            Rotation::default(),
            Viewport::default(),
        );
        let north = p.project(GeoPoint::new(0.0, 30.0)).unwrap();
        let center = p.project(GeoPoint::new(0.0, 0.0)).unwrap();
        assert!(north.y < center.y);
        assert_close(north.x, center.x, 1e-6);
    }
}
