//! Rectangle fitting and the skew conventions built on it.
//!
//! Angles are in degrees. Rectangle angles are measured in image
//! coordinates (x right, y down). Rotation angles follow the usual image
//! editing convention: positive turns the content counter-clockwise on
//! screen. Under these conventions [`canonical_angle`] of a fitted
//! rectangle is directly the rotation that levels it.

use imageproc::point::Point;

use crate::error::{NormalizeError, Result};
use crate::models::{BoundingEstimate, CropRect, Region};

/// Fold a fitted rectangle's raw angle into the rotation that makes its
/// long text lines horizontal, within (-45, 45].
pub fn canonical_angle(raw_angle: f32) -> f32 {
    if raw_angle < -45.0 {
        90.0 + raw_angle
    } else if raw_angle > 45.0 {
        -(90.0 - raw_angle)
    } else {
        raw_angle
    }
}

/// Width and height of the fitted rectangle once it has been levelled by
/// [`canonical_angle`]. Folding the angle by 90 degrees swaps the sides.
pub fn upright_size(estimate: &BoundingEstimate) -> (f32, f32) {
    if canonical_angle(estimate.angle) == estimate.angle {
        (estimate.width, estimate.height)
    } else {
        (estimate.height, estimate.width)
    }
}

/// Corners of the fitted rectangle, ordered top-left, top-right,
/// bottom-right, bottom-left as they will appear once levelled.
pub fn upright_corners(estimate: &BoundingEstimate) -> [(f32, f32); 4] {
    let (width, height) = upright_size(estimate);
    let theta = canonical_angle(estimate.angle).to_radians();
    let (sin, cos) = theta.sin_cos();
    let (cx, cy) = estimate.center;

    // u runs along the text lines, v across them (downwards once levelled).
    let (ux, uy) = (cos * width / 2.0, sin * width / 2.0);
    let (vx, vy) = (-sin * height / 2.0, cos * height / 2.0);

    [
        (cx - ux - vx, cy - uy - vy),
        (cx + ux - vx, cy + uy - vy),
        (cx + ux + vx, cy + uy + vy),
        (cx - ux + vx, cy - uy + vy),
    ]
}

/// Axis-aligned box of the levelled rectangle, grown by `margin` on every
/// side and shifted by `offset` (for a border added after rotation).
pub fn straight_rect(estimate: &BoundingEstimate, margin: u32, offset: u32) -> CropRect {
    let (width, height) = upright_size(estimate);
    let cx = estimate.center.0 + offset as f32;
    let cy = estimate.center.1 + offset as f32;
    let half_w = width / 2.0 + margin as f32;
    let half_h = height / 2.0 + margin as f32;

    CropRect::new(
        (cx - half_w).floor() as i64,
        (cy - half_h).floor() as i64,
        (cx + half_w).ceil() as i64,
        (cy + half_h).ceil() as i64,
    )
}

/// Fit the tightest rotated rectangle around every point of `region`.
///
/// Fails with a geometry error when the points are collinear or
/// coincident, since such a rectangle has no area to level or crop.
pub fn min_area_rect(region: &Region) -> Result<BoundingEstimate> {
    let hull = convex_hull(region.points());
    if hull.len() < 3 {
        return Err(NormalizeError::Geometry(format!(
            "region of {} points has a degenerate hull",
            region.len()
        )));
    }

    let pts: Vec<(f64, f64)> = hull.iter().map(|p| (p.x as f64, p.y as f64)).collect();
    let n = pts.len();
    let mut best: Option<(f64, BoundingEstimate)> = None;

    for i in 0..n {
        let (ax, ay) = pts[i];
        let (bx, by) = pts[(i + 1) % n];
        let (ex, ey) = (bx - ax, by - ay);
        let length = (ex * ex + ey * ey).sqrt();
        if length < f64::EPSILON {
            continue;
        }
        let (nx, ny) = (ex / length, ey / length);
        let (px, py) = (-ny, nx);

        let mut min_n = f64::MAX;
        let mut max_n = f64::MIN;
        let mut min_p = f64::MAX;
        let mut max_p = f64::MIN;
        for &(x, y) in &pts {
            let along = nx * (x - ax) + ny * (y - ay);
            let across = px * (x - ax) + py * (y - ay);
            min_n = min_n.min(along);
            max_n = max_n.max(along);
            min_p = min_p.min(across);
            max_p = max_p.max(across);
        }

        let width = max_n - min_n;
        let height = max_p - min_p;
        let area = width * height;
        if best.as_ref().is_some_and(|(best_area, _)| area >= *best_area) {
            continue;
        }

        let mid_n = (min_n + max_n) / 2.0;
        let mid_p = (min_p + max_p) / 2.0;
        let center = (
            (ax + mid_n * nx + mid_p * px) as f32,
            (ay + mid_n * ny + mid_p * py) as f32,
        );

        best = Some((
            area,
            BoundingEstimate {
                center,
                width: width as f32,
                height: height as f32,
                angle: fold_half_turn(ny.atan2(nx).to_degrees()) as f32,
            },
        ));
    }

    let (_, estimate) = best.ok_or_else(|| {
        NormalizeError::Geometry("region has no non-degenerate edge".to_string())
    })?;

    if estimate.width < 1.0 || estimate.height < 1.0 {
        return Err(NormalizeError::Geometry(format!(
            "fitted rectangle {:.2}x{:.2} is too thin",
            estimate.width, estimate.height
        )));
    }

    Ok(estimate)
}

/// An edge direction and its reverse describe the same rectangle side.
fn fold_half_turn(mut degrees: f64) -> f64 {
    while degrees >= 90.0 {
        degrees -= 180.0;
    }
    while degrees < -90.0 {
        degrees += 180.0;
    }
    degrees
}

/// Convex hull by Andrew's monotone chain. Collinear points are dropped.
pub fn convex_hull(points: &[Point<i32>]) -> Vec<Point<i32>> {
    let mut sorted: Vec<Point<i32>> = points.to_vec();
    sorted.sort_by(|a, b| a.x.cmp(&b.x).then(a.y.cmp(&b.y)));
    sorted.dedup();

    if sorted.len() < 3 {
        return sorted;
    }

    fn cross(o: Point<i32>, a: Point<i32>, b: Point<i32>) -> i64 {
        (a.x - o.x) as i64 * (b.y - o.y) as i64 - (a.y - o.y) as i64 * (b.x - o.x) as i64
    }

    let mut lower: Vec<Point<i32>> = Vec::new();
    for &p in &sorted {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0 {
            lower.pop();
        }
        lower.push(p);
    }

    let mut upper: Vec<Point<i32>> = Vec::new();
    for &p in sorted.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0 {
            upper.pop();
        }
        upper.push(p);
    }

    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}
