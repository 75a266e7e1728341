use image::GrayImage;
use imageproc::contours::{BorderType, Contour, find_contours};

use crate::error::{NormalizeError, Result};
use crate::models::Region;

/// Trace region boundaries in a binary image (white = foreground).
///
/// Element 0 is always the frame enclosing the whole image and is not a
/// candidate; callers look at `regions[1..]`. When the foreground itself
/// reaches all four image edges (a dark surround around the page) its traced
/// outer border is that frame; otherwise a synthetic canvas outline stands
/// in. Hole borders outline background, not a foreground area, and are
/// dropped along with boundaries of fewer than three points.
pub fn extract_regions(binary: &GrayImage) -> Vec<Region> {
    let (width, height) = binary.dimensions();
    let contours: Vec<Contour<i32>> = find_contours(binary);

    let mut frame = None;
    let mut candidates = Vec::with_capacity(contours.len());
    for contour in contours {
        if contour.border_type == BorderType::Hole {
            continue;
        }
        let Some(region) = Region::new(contour.points) else {
            continue;
        };
        if frame.is_none() && spans_canvas(&region, width, height) {
            frame = Some(region);
        } else {
            candidates.push(region);
        }
    }

    let mut regions = Vec::with_capacity(candidates.len() + 1);
    regions.push(frame.unwrap_or_else(|| Region::frame(width, height)));
    regions.extend(candidates);
    regions
}

fn spans_canvas(region: &Region, width: u32, height: u32) -> bool {
    let max_x = width.saturating_sub(1) as i32;
    let max_y = height.saturating_sub(1) as i32;
    let points = region.points();
    points.iter().any(|p| p.x == 0)
        && points.iter().any(|p| p.y == 0)
        && points.iter().any(|p| p.x == max_x)
        && points.iter().any(|p| p.y == max_y)
}

/// Pick the region enclosing the largest area. Ties go to the region that
/// comes first.
pub fn select_dominant(candidates: &[Region]) -> Result<&Region> {
    let mut best: Option<(&Region, f64)> = None;
    for region in candidates {
        let area = region.area();
        match best {
            Some((_, best_area)) if area <= best_area => {}
            _ => best = Some((region, area)),
        }
    }
    best.map(|(region, _)| region)
        .ok_or(NormalizeError::NoRegionFound)
}
