use image::{ColorType, DynamicImage, GrayImage};
use imageproc::contrast::otsu_level;
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate as dilate_norm;

use crate::error::{NormalizeError, Result};

/// Which side of the cutoff becomes foreground (white).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Pixels brighter than the cutoff become white; dark text stays dark.
    Normal,
    /// Pixels at or below the cutoff become white, so dark text turns into
    /// the white blobs contour extraction follows.
    Inverted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMode {
    Fixed(u8),
    /// Cutoff from the image histogram (Otsu's method).
    Otsu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelShape {
    Rect,
    Ellipse,
}

impl KernelShape {
    fn norm(self) -> Norm {
        match self {
            KernelShape::Rect => Norm::LInf,
            KernelShape::Ellipse => Norm::L2,
        }
    }
}

/// Reduce any supported layout to single-channel luminance.
pub fn to_grayscale(img: &DynamicImage) -> Result<GrayImage> {
    match img.color() {
        ColorType::L8
        | ColorType::La8
        | ColorType::Rgb8
        | ColorType::Rgba8
        | ColorType::L16
        | ColorType::La16
        | ColorType::Rgb16
        | ColorType::Rgba16
        | ColorType::Rgb32F
        | ColorType::Rgba32F => Ok(img.to_luma8()),
        other => Err(NormalizeError::UnsupportedLayout(other)),
    }
}

/// Binarize `img`. Returns the image together with the cutoff that was used.
///
/// Under [`ThresholdMode::Otsu`] a perfectly uniform image has no foreground
/// in either polarity: there is nothing to separate, and treating it as one
/// big blob would hide a blank page.
pub fn threshold(img: &GrayImage, mode: ThresholdMode, polarity: Polarity) -> (GrayImage, u8) {
    let (cutoff, uniform) = match mode {
        ThresholdMode::Fixed(cutoff) => (cutoff, false),
        ThresholdMode::Otsu => (otsu_level(img), is_uniform(img)),
    };

    let background = match polarity {
        Polarity::Normal => 255u8,
        Polarity::Inverted => 0u8,
    };

    let mut binary = img.clone();
    for pixel in binary.pixels_mut() {
        pixel[0] = if uniform {
            background
        } else {
            let bright = pixel[0] > cutoff;
            match (polarity, bright) {
                (Polarity::Normal, true) | (Polarity::Inverted, false) => 255,
                _ => 0,
            }
        };
    }

    (binary, cutoff)
}

fn is_uniform(img: &GrayImage) -> bool {
    let mut pixels = img.pixels();
    match pixels.next() {
        Some(first) => pixels.all(|p| p[0] == first[0]),
        None => true,
    }
}

/// Grow white regions by `radius` pixels per iteration.
pub fn dilate(img: &GrayImage, shape: KernelShape, radius: u8, iterations: u32) -> GrayImage {
    let mut grown = img.clone();
    for _ in 0..iterations {
        grown = dilate_norm(&grown, shape.norm(), radius);
    }
    grown
}

/// Kernel radius that keeps dilation roughly resolution independent:
/// the kernel spans about `width / 150` pixels, and never less than 3.
pub fn kernel_radius_for_width(width: u32) -> u8 {
    let extent = (width / 150).max(3);
    (extent / 2).min(u8::MAX as u32) as u8
}
