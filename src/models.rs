use imageproc::point::Point;

/// Closed boundary polygon of a connected foreground area.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    points: Vec<Point<i32>>,
}

impl Region {
    /// Returns `None` for polygons with fewer than three points.
    pub fn new(points: Vec<Point<i32>>) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        Some(Self { points })
    }

    /// The boundary of a whole `width` x `height` canvas.
    pub fn frame(width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1) as i32;
        let max_y = height.saturating_sub(1) as i32;
        Self {
            points: vec![
                Point::new(0, 0),
                Point::new(max_x, 0),
                Point::new(max_x, max_y),
                Point::new(0, max_y),
            ],
        }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed polygon area (shoelace formula).
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        let twice: i64 = (0..n)
            .map(|i| {
                let p = self.points[i];
                let q = self.points[(i + 1) % n];
                p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64
            })
            .sum();
        twice.abs() as f64 / 2.0
    }
}

/// Minimum-area rotated rectangle around a region.
///
/// `angle` is the direction of the `width` edge in image coordinates
/// (x right, y down), in degrees within [-90, 90). A rectangle and its
/// 90-degree twin describe the same box, so `angle` is only meaningful
/// together with which edge is called `width`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingEstimate {
    pub center: (f32, f32),
    pub width: f32,
    pub height: f32,
    pub angle: f32,
}

/// Axis-aligned rectangle with exclusive upper bounds. Coordinates may lie
/// outside the image until clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x0: i64,
    pub y0: i64,
    pub x1: i64,
    pub y1: i64,
}

impl CropRect {
    pub fn new(x0: i64, y0: i64, x1: i64, y1: i64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> i64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i64 {
        self.y1 - self.y0
    }

    /// Clamp to `[0, width) x [0, height)`.
    pub fn clamp(&self, width: u32, height: u32) -> Self {
        Self {
            x0: self.x0.max(0),
            y0: self.y0.max(0),
            x1: self.x1.min(width as i64),
            y1: self.y1.min(height as i64),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }
}
