//! Clipping on the rotated sphere.
//!
//! All coordinates here are `(lambda, phi)` radians in the projection's
//! rotated frame, so the clip region is always centred on `(0, 0)`.
//!
//! Polygons are clipped in a plane where the clip region is convex and then
//! mapped back: the `(lambda, phi)` strip for the antimeridian cut, and the
//! azimuthal-equidistant disc for small-circle clips.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use foundation::math::{Clip, EPSILON, Vec2, great_circle_point, lambda_phi_from_unit, unit_vector};

/// A rotated position, `(lambda, phi)` in radians.
pub type LonLat = (f64, f64);

/// Longest boundary edge left after clipping, in radians.
const BOUNDARY_STEP: f64 = 2.0 * PI / 180.0;

/// Sides of the polygon approximating a clip circle.
const CIRCLE_SIDES: usize = 360;

const BISECTION_STEPS: usize = 32;

/// Clips one ring (open, no repeated closing vertex) into zero or more rings.
pub fn clip_ring(clip: Clip, ring: &[LonLat]) -> Vec<Vec<LonLat>> {
    if ring.len() < 3 {
        return Vec::new();
    }
    match clip {
        Clip::Antimeridian => antimeridian_ring(ring),
        Clip::Circle { radius } => circle_ring(ring, radius),
    }
}

/// Splits a polyline into the visible runs.
pub fn clip_line(clip: Clip, line: &[LonLat]) -> Vec<Vec<LonLat>> {
    match clip {
        Clip::Antimeridian => antimeridian_line(line),
        Clip::Circle { .. } => circle_line(clip, line),
    }
}

/// Closed outline of the whole visible sphere (open ring, first vertex not repeated).
pub fn clip_outline(clip: Clip) -> Vec<LonLat> {
    match clip {
        Clip::Antimeridian => {
            let corners = [
                (-PI, -FRAC_PI_2),
                (-PI, FRAC_PI_2),
                (PI, FRAC_PI_2),
                (PI, -FRAC_PI_2),
            ];
            let mut out = Vec::new();
            for i in 0..corners.len() {
                let (a, b) = (corners[i], corners[(i + 1) % corners.len()]);
                out.push(a);
                densify_into(&mut out, a, b);
            }
            out
        }
        Clip::Circle { radius } => circle_polygon(radius)
            .into_iter()
            .map(from_azimuthal_plane)
            .collect(),
    }
}

fn wrap_pi(d: f64) -> f64 {
    d - TAU * (d / TAU).round()
}

fn antimeridian_ring(ring: &[LonLat]) -> Vec<Vec<LonLat>> {
    let first = ring[0];
    let mut unwrapped = Vec::with_capacity(ring.len() + 3);
    let mut u = first.0;
    unwrapped.push(first);
    for w in ring.windows(2) {
        u += wrap_pi(w[1].0 - w[0].0);
        unwrapped.push((u, w[1].1));
    }

    // A ring whose longitudes wind all the way round encloses a pole.
    let closing = u + wrap_pi(first.0 - ring[ring.len() - 1].0);
    if (closing - first.0).abs() > PI {
        let mean_phi = ring.iter().map(|p| p.1).sum::<f64>() / ring.len() as f64;
        let pole = if mean_phi < 0.0 { -FRAC_PI_2 } else { FRAC_PI_2 };
        unwrapped.push((closing, first.1));
        unwrapped.push((closing, pole));
        unwrapped.push((first.0, pole));
    }

    let (u_min, u_max) = unwrapped
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.0), hi.max(p.0))
        });
    if !(u_min.is_finite() && u_max.is_finite()) {
        return Vec::new();
    }

    let k_lo = ((u_min - PI) / TAU).floor() as i64;
    let k_hi = ((u_max + PI) / TAU).ceil() as i64;
    let mut pieces = Vec::new();
    for k in k_lo..=k_hi {
        let shift = TAU * k as f64;
        let shifted: Vec<LonLat> = unwrapped.iter().map(|p| (p.0 - shift, p.1)).collect();
        let clipped = clip_vertical(&clip_vertical(&shifted, -PI, true), PI, false);
        if clipped.len() < 3 || signed_area(&clipped).abs() < 1e-12 {
            continue;
        }
        pieces.push(densify_boundary(&clipped));
    }
    pieces
}

/// Sutherland–Hodgman against `lambda >= at` (`keep_right`) or `lambda <= at`.
fn clip_vertical(poly: &[LonLat], at: f64, keep_right: bool) -> Vec<LonLat> {
    let inside = |p: LonLat| if keep_right { p.0 >= at } else { p.0 <= at };
    let cross = |a: LonLat, b: LonLat| {
        let t = (at - a.0) / (b.0 - a.0);
        (at, a.1 + t * (b.1 - a.1))
    };
    let mut out = Vec::with_capacity(poly.len() + 4);
    let Some(&last) = poly.last() else {
        return out;
    };
    let mut prev = last;
    for &cur in poly {
        match (inside(prev), inside(cur)) {
            (true, true) => out.push(cur),
            (true, false) => out.push(cross(prev, cur)),
            (false, true) => {
                out.push(cross(prev, cur));
                out.push(cur);
            }
            (false, false) => {}
        }
        prev = cur;
    }
    out
}

fn signed_area(poly: &[LonLat]) -> f64 {
    let n = poly.len();
    (0..n)
        .map(|i| {
            let (a, b) = (poly[i], poly[(i + 1) % n]);
            a.0 * b.1 - b.0 * a.1
        })
        .sum::<f64>()
        / 2.0
}

fn on_boundary(p: LonLat) -> bool {
    p.0.abs() >= PI - EPSILON || p.1.abs() >= FRAC_PI_2 - EPSILON
}

/// Subdivides edges that run along the cut or a pole so they follow the
/// projected meridian or pole line.
fn densify_boundary(poly: &[LonLat]) -> Vec<LonLat> {
    let n = poly.len();
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let (a, b) = (poly[i], poly[(i + 1) % n]);
        out.push(a);
        if on_boundary(a) && on_boundary(b) {
            densify_into(&mut out, a, b);
        }
    }
    out
}

/// Pushes the interior points of `a → b`, spaced at most `BOUNDARY_STEP` apart.
fn densify_into(out: &mut Vec<LonLat>, a: LonLat, b: LonLat) {
    let len = (b.0 - a.0).hypot(b.1 - a.1);
    let steps = (len / BOUNDARY_STEP).ceil() as usize;
    for s in 1..steps {
        let t = s as f64 / steps as f64;
        out.push((a.0 + t * (b.0 - a.0), a.1 + t * (b.1 - a.1)));
    }
}

fn antimeridian_line(line: &[LonLat]) -> Vec<Vec<LonLat>> {
    let mut runs = Vec::new();
    let mut run: Vec<LonLat> = Vec::new();
    for &p in line {
        if let Some(&prev) = run.last() {
            let (a, b): (LonLat, LonLat) = (prev, p);
            if (b.0 - a.0).abs() > PI {
                let side = PI.copysign(a.0);
                let b_unwrapped = b.0 + TAU.copysign(a.0);
                let t = (side - a.0) / (b_unwrapped - a.0);
                let phi = a.1 + t * (b.1 - a.1);
                run.push((side, phi));
                runs.push(std::mem::take(&mut run));
                run.push((-side, phi));
            }
        }
        run.push(p);
    }
    runs.push(run);
    runs.retain(|r| r.len() >= 2);
    runs
}

fn circle_line(clip: Clip, line: &[LonLat]) -> Vec<Vec<LonLat>> {
    let visible = |p: LonLat| clip.contains(p.0, p.1);
    let mut runs = Vec::new();
    let mut run: Vec<LonLat> = Vec::new();
    let mut prev: Option<(LonLat, bool)> = None;
    for &p in line {
        let vis = visible(p);
        match prev {
            Some((q, q_vis)) if q_vis != vis => {
                run.push(horizon_crossing(clip, q, p, q_vis));
                if q_vis {
                    runs.push(std::mem::take(&mut run));
                }
            }
            _ => {}
        }
        if vis {
            run.push(p);
        }
        prev = Some((p, vis));
    }
    runs.push(run);
    runs.retain(|r| r.len() >= 2);
    runs
}

/// Last visible point on the great circle from `a` to `b` (or first, when
/// `a` is hidden), located by bisection.
fn horizon_crossing(clip: Clip, a: LonLat, b: LonLat, a_visible: bool) -> LonLat {
    let (ua, ub) = (unit_vector(a.0, a.1), unit_vector(b.0, b.1));
    let at = |t: f64| lambda_phi_from_unit(great_circle_point(ua, ub, t));
    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..BISECTION_STEPS {
        let mid = 0.5 * (lo + hi);
        let (l, p) = at(mid);
        if clip.contains(l, p) == a_visible {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    at(if a_visible { lo } else { hi })
}

fn circle_ring(ring: &[LonLat], radius: f64) -> Vec<Vec<LonLat>> {
    let clip = Clip::Circle { radius };
    let visible = ring.iter().filter(|p| clip.contains(p.0, p.1)).count();
    if visible == ring.len() {
        return vec![ring.to_vec()];
    }

    let plane: Vec<Vec2> = ring.iter().map(|&p| to_azimuthal_plane(p)).collect();
    if visible == 0 {
        // Entirely beyond the horizon, unless it wraps around the view centre.
        return if winding_number(&plane) != 0 {
            vec![clip_outline(clip)]
        } else {
            Vec::new()
        };
    }

    let clipped = clip_convex(&plane, &circle_polygon(radius));
    if clipped.len() < 3 {
        return Vec::new();
    }
    vec![clipped.into_iter().map(from_azimuthal_plane).collect()]
}

/// Azimuthal-equidistant coordinates around the rotated origin.
fn to_azimuthal_plane(p: LonLat) -> Vec2 {
    let (lambda, phi) = p;
    let c = (phi.cos() * lambda.cos()).clamp(-1.0, 1.0).acos();
    let dx = phi.cos() * lambda.sin();
    let dy = phi.sin();
    let m = dx.hypot(dy);
    if m < 1e-12 {
        return Vec2::new(c, 0.0);
    }
    Vec2::new(c * dx / m, c * dy / m)
}

fn from_azimuthal_plane(q: Vec2) -> LonLat {
    let c = q.length();
    if c < 1e-12 {
        return (0.0, 0.0);
    }
    let (dx, dy) = (q.x / c, q.y / c);
    let (sin_c, cos_c) = c.sin_cos();
    ((dx * sin_c).atan2(cos_c), (dy * sin_c).clamp(-1.0, 1.0).asin())
}

/// Counter-clockwise polygon inscribed in the clip circle.
fn circle_polygon(radius: f64) -> Vec<Vec2> {
    (0..CIRCLE_SIDES)
        .map(|i| {
            let a = TAU * i as f64 / CIRCLE_SIDES as f64;
            Vec2::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

fn winding_number(poly: &[Vec2]) -> i64 {
    let n = poly.len();
    let total: f64 = (0..n)
        .map(|i| {
            let (a, b) = (poly[i], poly[(i + 1) % n]);
            wrap_pi(b.y.atan2(b.x) - a.y.atan2(a.x))
        })
        .sum();
    (total / TAU).round() as i64
}

/// Sutherland–Hodgman against a convex, counter-clockwise clip polygon.
fn clip_convex(subject: &[Vec2], clip: &[Vec2]) -> Vec<Vec2> {
    let mut out = subject.to_vec();
    for i in 0..clip.len() {
        if out.is_empty() {
            break;
        }
        let (c0, c1) = (clip[i], clip[(i + 1) % clip.len()]);
        let edge = c1 - c0;
        let side = |p: Vec2| edge.x * (p.y - c0.y) - edge.y * (p.x - c0.x);
        let input = std::mem::take(&mut out);
        let mut prev = input[input.len() - 1];
        for &cur in &input {
            let (sp, sc) = (side(prev), side(cur));
            if sc >= 0.0 {
                if sp < 0.0 {
                    out.push(prev.lerp(cur, sp / (sp - sc)));
                }
                out.push(cur);
            } else if sp >= 0.0 {
                out.push(prev.lerp(cur, sp / (sp - sc)));
            }
            prev = cur;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, PI};

    use super::{LonLat, clip_line, clip_outline, clip_ring, from_azimuthal_plane, to_azimuthal_plane};
    use foundation::math::{Clip, Vec2};

    fn deg(points: &[(f64, f64)]) -> Vec<LonLat> {
        points
            .iter()
            .map(|&(l, p)| (l.to_radians(), p.to_radians()))
            .collect()
    }

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn ring_inside_strip_is_untouched() {
        let ring = deg(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        let pieces = clip_ring(Clip::Antimeridian, &ring);
        assert_eq!(pieces, vec![ring]);
    }

    #[test]
    fn ring_across_the_antimeridian_splits_in_two() {
        let ring = deg(&[(170.0, 0.0), (-170.0, 0.0), (-170.0, 10.0), (170.0, 10.0)]);
        let pieces = clip_ring(Clip::Antimeridian, &ring);
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert!(piece.iter().all(|p| p.0.abs() <= PI + 1e-12));
            let (lo, hi) = piece.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
                (lo.min(p.0.to_degrees()), hi.max(p.0.to_degrees()))
            });
            assert_close(hi - lo, 10.0, 1e-9);
        }
    }

    #[test]
    fn polar_ring_is_closed_through_its_pole() {
        let ring: Vec<LonLat> = (0..36)
            .map(|i| ((-180.0 + 10.0 * i as f64).to_radians(), (-70f64).to_radians()))
            .collect();
        let pieces = clip_ring(Clip::Antimeridian, &ring);
        assert_eq!(pieces.len(), 1);
        let piece = &pieces[0];
        assert!(piece.iter().any(|p| (p.1 + FRAC_PI_2).abs() < 1e-12));
        assert!(piece.iter().all(|p| p.1 <= (-70f64).to_radians() + 1e-12));
    }

    #[test]
    fn hidden_ring_vanishes_and_visible_ring_passes() {
        let clip = Clip::circle_deg(90.0);
        let near = deg(&[(0.0, 0.0), (5.0, 0.0), (5.0, 5.0)]);
        assert_eq!(clip_ring(clip, &near), vec![near.clone()]);
        let far = deg(&[(170.0, 0.0), (175.0, 0.0), (175.0, 5.0)]);
        assert!(clip_ring(clip, &far).is_empty());
    }

    #[test]
    fn ring_enclosing_the_view_from_beyond_the_horizon_fills_the_disc() {
        let clip = Clip::circle_deg(60.0);
        // Small circle of radius 80° around the rotated origin.
        let distance = 80f64.to_radians();
        let ring: Vec<LonLat> = (0..36)
            .map(|i| (10.0 * i as f64).to_radians())
            .map(|a| from_azimuthal_plane(Vec2::new(distance * a.cos(), distance * a.sin())))
            .collect();
        let pieces = clip_ring(clip, &ring);
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0], clip_outline(clip));
    }

    #[test]
    fn straddling_ring_is_cut_at_the_horizon() {
        let clip = Clip::circle_deg(90.0);
        let ring = deg(&[(80.0, -5.0), (100.0, -5.0), (100.0, 5.0), (80.0, 5.0)]);
        let pieces = clip_ring(clip, &ring);
        assert_eq!(pieces.len(), 1);
        for p in &pieces[0] {
            let c = (p.1.cos() * p.0.cos()).acos().to_degrees();
            assert!(c <= 90.0 + 1e-6, "{c}");
        }
    }

    #[test]
    fn azimuthal_plane_round_trips() {
        for p in deg(&[(10.0, 20.0), (-100.0, 45.0), (0.0, -80.0)]) {
            let q = from_azimuthal_plane(to_azimuthal_plane(p));
            assert_close(q.0, p.0, 1e-9);
            assert_close(q.1, p.1, 1e-9);
        }
    }

    #[test]
    fn line_splits_at_the_antimeridian() {
        let line = deg(&[(170.0, 10.0), (179.0, 10.0), (-179.0, 20.0), (-170.0, 20.0)]);
        let runs = clip_line(Clip::Antimeridian, &line);
        assert_eq!(runs.len(), 2);
        assert_close(runs[0].last().unwrap().0, PI, 1e-12);
        assert_close(runs[1][0].0, -PI, 1e-12);
        assert_close(runs[0].last().unwrap().1.to_degrees(), 15.0, 1e-9);
    }

    #[test]
    fn line_stops_at_the_horizon() {
        let clip = Clip::circle_deg(90.0);
        let line: Vec<LonLat> = (0..=36)
            .map(|i| ((-180.0 + 10.0 * i as f64).to_radians(), 0.0))
            .collect();
        let runs = clip_line(clip, &line);
        assert_eq!(runs.len(), 1);
        assert_close(runs[0][0].0.to_degrees(), -90.0, 1e-6);
        assert_close(runs[0].last().unwrap().0.to_degrees(), 90.0, 1e-6);
    }

    #[test]
    fn outlines_are_closed_loops() {
        let strip = clip_outline(Clip::Antimeridian);
        assert!(strip.len() > 4);
        assert!(strip.iter().all(|p| p.0.abs() <= PI && p.1.abs() <= FRAC_PI_2));
        assert_eq!(clip_outline(Clip::circle_deg(90.0)).len(), 360);
    }
}
