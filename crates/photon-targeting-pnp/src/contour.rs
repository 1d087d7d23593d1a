//! 2D point-set helpers used to summarize a projected target.

use nalgebra::{Point2, Vector2};
use photon_targeting_core::Pt2;

/// Rotated rectangle as produced by [`min_area_rect`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RotatedRect {
    pub center: Pt2,
    /// Extent along the rectangle's first axis.
    pub width: f64,
    /// Extent along the second axis.
    pub height: f64,
    /// Angle of the first axis from +x, degrees.
    pub angle_deg: f64,
    corners: [Pt2; 4],
}

impl RotatedRect {
    /// Rectangle around `center` whose first axis is `angle_deg` from +x.
    pub fn new(center: Pt2, width: f64, height: f64, angle_deg: f64) -> Self {
        let (s, c) = angle_deg.to_radians().sin_cos();
        let u = Vector2::new(c, s) * (width / 2.0);
        let v = Vector2::new(-s, c) * (height / 2.0);
        Self {
            center,
            width,
            height,
            angle_deg,
            corners: [center - u - v, center + u - v, center + u + v, center - u + v],
        }
    }

    pub fn corners(&self) -> [Pt2; 4] {
        self.corners
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Arithmetic mean of the points.
pub fn avg_point(points: &[Pt2]) -> Option<Pt2> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);
    Some(Point2::from(sum / points.len() as f64))
}

fn cross(o: &Pt2, a: &Pt2, b: &Pt2) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Convex hull by monotone chain, counter-clockwise in a y-up frame
/// (clockwise on screen), without repeated endpoints.
pub fn get_convex_hull(points: &[Pt2]) -> Vec<Pt2> {
    let mut pts: Vec<Pt2> = points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite())
        .collect();
    pts.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut hull: Vec<Pt2> = Vec::with_capacity(pts.len() * 2);
    for p in &pts {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in pts.iter().rev().skip(1) {
        while hull.len() >= lower_len
            && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

/// Polygon area (shoelace), in squared pixels. Order may be either way.
pub fn get_contour_area_pixels(points: &[Pt2]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    for (i, a) in points.iter().enumerate() {
        let b = &points[(i + 1) % points.len()];
        twice += a.x * b.y - b.x * a.y;
    }
    twice.abs() / 2.0
}

/// Smallest-area enclosing rectangle via rotating calipers over the hull.
pub fn min_area_rect(points: &[Pt2]) -> Option<RotatedRect> {
    let hull = get_convex_hull(points);
    match hull.len() {
        0 => None,
        1 => Some(rect_from_axis(&hull, Vector2::x())),
        2 => {
            let d = hull[1] - hull[0];
            let axis = d.try_normalize(1e-12).unwrap_or_else(Vector2::x);
            Some(rect_from_axis(&hull, axis))
        }
        n => {
            let mut best: Option<RotatedRect> = None;
            for i in 0..n {
                let edge = hull[(i + 1) % n] - hull[i];
                let Some(axis) = edge.try_normalize(1e-12) else {
                    continue;
                };
                let rect = rect_from_axis(&hull, axis);
                if best.as_ref().is_none_or(|b| rect.area() < b.area()) {
                    best = Some(rect);
                }
            }
            best
        }
    }
}

fn rect_from_axis(hull: &[Pt2], u: Vector2<f64>) -> RotatedRect {
    let v = Vector2::new(-u.y, u.x);
    let (mut u_min, mut u_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut v_min, mut v_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in hull {
        let pu = p.coords.dot(&u);
        let pv = p.coords.dot(&v);
        u_min = u_min.min(pu);
        u_max = u_max.max(pu);
        v_min = v_min.min(pv);
        v_max = v_max.max(pv);
    }
    let at = |a: f64, b: f64| Point2::from(u * a + v * b);
    let corners = [
        at(u_min, v_min),
        at(u_max, v_min),
        at(u_max, v_max),
        at(u_min, v_max),
    ];
    RotatedRect {
        center: at((u_min + u_max) / 2.0, (v_min + v_max) / 2.0),
        width: u_max - u_min,
        height: v_max - v_min,
        angle_deg: u.y.atan2(u.x).to_degrees(),
        corners,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hull_drops_interior_points() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(4.0, 3.0),
            Point2::new(0.0, 3.0),
            Point2::new(2.0, 1.5),
            Point2::new(1.0, 1.0),
        ];
        let hull = get_convex_hull(&pts);
        assert_eq!(hull.len(), 4);
        assert_relative_eq!(get_contour_area_pixels(&hull), 12.0);
    }

    #[test]
    fn min_area_rect_of_rotated_square() {
        let c = Point2::new(10.0, 20.0);
        let pts: Vec<Pt2> = (0..4)
            .map(|k| {
                let a = std::f64::consts::FRAC_PI_6 + k as f64 * std::f64::consts::FRAC_PI_2;
                c + Vector2::new(a.cos(), a.sin()) * 5.0
            })
            .collect();
        let rect = min_area_rect(&pts).expect("rect");
        assert_relative_eq!(rect.area(), 50.0, epsilon = 1e-9);
        assert_relative_eq!(rect.center, c, epsilon = 1e-9);
        assert_relative_eq!(
            get_contour_area_pixels(&rect.corners()),
            50.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn rotated_rect_from_center_and_size() {
        let rect = RotatedRect::new(Point2::new(5.0, 5.0), 4.0, 2.0, 90.0);
        let corners = rect.corners();
        assert_relative_eq!(corners[0], Point2::new(6.0, 3.0), epsilon = 1e-12);
        assert_relative_eq!(corners[2], Point2::new(4.0, 7.0), epsilon = 1e-12);
        assert_relative_eq!(get_contour_area_pixels(&corners), 8.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(min_area_rect(&[]).is_none());
        assert!(avg_point(&[]).is_none());
        let single = min_area_rect(&[Point2::new(1.0, 2.0)]).expect("rect");
        assert_eq!(single.area(), 0.0);
        let avg = avg_point(&[Point2::new(0.0, 0.0), Point2::new(2.0, 4.0)]).expect("avg");
        assert_relative_eq!(avg, Point2::new(1.0, 2.0));
    }
}
