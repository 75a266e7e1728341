use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into, warp_with};

use crate::error::{NormalizeError, Result};
use crate::models::CropRect;

/// Rotate `img` about `center` by `angle_degrees` (positive is
/// counter-clockwise on screen), keeping the canvas size. Exposed corners
/// repeat the nearest edge pixel instead of a solid fill.
pub fn rotate(img: &GrayImage, center: (f32, f32), angle_degrees: f32) -> GrayImage {
    if angle_degrees.rem_euclid(360.0) == 0.0 {
        return img.clone();
    }

    let (width, height) = img.dimensions();
    let (sin, cos) = angle_degrees.to_radians().sin_cos();
    let (cx, cy) = center;

    // Bilinear sampling reads the pixel to the right of and below the sample
    // point, so keep samples just inside the last row and column.
    let (interpolation, max_x, max_y) = if width >= 2 && height >= 2 {
        (
            Interpolation::Bilinear,
            (width - 1) as f32 - 1e-3,
            (height - 1) as f32 - 1e-3,
        )
    } else {
        (
            Interpolation::Nearest,
            width.saturating_sub(1) as f32,
            height.saturating_sub(1) as f32,
        )
    };

    warp_with(
        img,
        move |x, y| {
            let dx = x - cx;
            let dy = y - cy;
            let sx = cx + cos * dx - sin * dy;
            let sy = cy + sin * dx + cos * dy;
            (sx.clamp(0.0, max_x), sy.clamp(0.0, max_y))
        },
        interpolation,
        Luma([255]),
    )
}

/// Map the quadrilateral `src` (top-left, top-right, bottom-right,
/// bottom-left) onto an upright `width` x `height` image.
pub fn warp_perspective(
    img: &GrayImage,
    src: [(f32, f32); 4],
    width: u32,
    height: u32,
) -> Result<GrayImage> {
    if width == 0 || height == 0 {
        return Err(NormalizeError::Geometry(format!(
            "cannot warp onto a {}x{} target",
            width, height
        )));
    }

    let (w, h) = (width as f32, height as f32);
    let dst = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    let projection = Projection::from_control_points(src, dst).ok_or_else(|| {
        NormalizeError::Geometry(format!("no projective transform maps {:?}", src))
    })?;

    let mut output = GrayImage::new(width, height);
    warp_into(img, &projection, Interpolation::Bilinear, Luma([255]), &mut output);
    Ok(output)
}

/// Pad the canvas with a constant intensity on each side.
pub fn copy_make_border(
    img: &GrayImage,
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
    fill: u8,
) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut canvas = GrayImage::from_pixel(
        width + left + right,
        height + top + bottom,
        Luma([fill]),
    );
    image::imageops::replace(&mut canvas, img, left.into(), top.into());
    canvas
}

/// Crop to `rect` after clamping it to the image bounds.
pub fn crop(img: &GrayImage, rect: CropRect) -> Result<GrayImage> {
    let clamped = rect.clamp(img.width(), img.height());
    if clamped.is_empty() {
        return Err(NormalizeError::Geometry(format!(
            "crop {:?} is empty inside a {}x{} image",
            rect,
            img.width(),
            img.height()
        )));
    }

    Ok(image::imageops::crop_imm(
        img,
        clamped.x0 as u32,
        clamped.y0 as u32,
        clamped.width() as u32,
        clamped.height() as u32,
    )
    .to_image())
}
