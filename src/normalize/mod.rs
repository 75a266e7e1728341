pub mod contours;
pub mod geometry;
pub mod preprocessing;
pub mod steps;
pub mod transform;

use std::path::PathBuf;
use std::sync::Arc;

use image::{DynamicImage, GrayImage};

use crate::error::{Result, Stage};
use crate::models::BoundingEstimate;
use crate::pipeline::Pipeline;
use preprocessing::{KernelShape, Polarity, ThresholdMode};
use steps::*;

/// Turns a decoded photo into the image handed to recognition.
pub trait Preprocessor: Send + Sync {
    fn process(&self, image: DynamicImage) -> Result<GrayImage>;
}

/// How the detected region is levelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum CorrectionStrategy {
    /// Warp the fitted rectangle onto an upright canvas. Also absorbs mild
    /// camera tilt.
    #[default]
    Perspective,
    /// Rotate about the region centre, then crop. In-plane skew only.
    Rotate,
}

/// Page normalization policy and the standard step list.
#[derive(Debug, Clone)]
pub struct PageNormalizer {
    pub strategy: CorrectionStrategy,
    /// Fixed cutoff for the final binarization; Otsu when `None`.
    pub cutoff: Option<u8>,
    pub kernel_shape: KernelShape,
    /// Dilation radius; derived from the image width when `None`.
    pub kernel_radius: Option<u8>,
    pub dilate_iterations: u32,
    pub border: u32,
    pub fill: u8,
    pub debug_dir: Option<PathBuf>,
}

impl PageNormalizer {
    pub fn new() -> Self {
        Self {
            strategy: CorrectionStrategy::Perspective,
            cutoff: None,
            kernel_shape: KernelShape::Rect,
            kernel_radius: None,
            dilate_iterations: 2,
            border: 10,
            fill: 255,
            debug_dir: None,
        }
    }

    pub fn with_strategy(mut self, strategy: CorrectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_cutoff(mut self, cutoff: Option<u8>) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn with_debug_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.debug_dir = dir;
        self
    }

    fn final_mode(&self) -> ThresholdMode {
        self.cutoff.map_or(ThresholdMode::Otsu, ThresholdMode::Fixed)
    }

    fn detection_pipeline(&self) -> Pipeline {
        Pipeline::new()
            .add_step(Arc::new(ThresholdStep {
                mode: ThresholdMode::Otsu,
                polarity: Polarity::Inverted,
            }))
            .add_step(Arc::new(DilateStep {
                shape: self.kernel_shape,
                radius: self.kernel_radius,
                iterations: self.dilate_iterations,
            }))
            .add_step(Arc::new(RegionDetectionStep))
    }

    /// Assemble the full pipeline for the configured strategy.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let mut pipeline = self.detection_pipeline();
        if let Some(dir) = &self.debug_dir {
            pipeline = pipeline.with_debug(dir.clone())?;
        }

        let binarize = Arc::new(BinarizeStep { mode: self.final_mode() });
        let border = Arc::new(BorderStep { margin: self.border, fill: self.fill });

        Ok(match self.strategy {
            CorrectionStrategy::Perspective => pipeline
                .add_step(Arc::new(PerspectiveWarpStep))
                .add_step(binarize)
                .add_step(border),
            CorrectionStrategy::Rotate => pipeline
                .add_step(Arc::new(RotateStep))
                .add_step(binarize)
                .add_step(border)
                .add_step(Arc::new(CropStep {
                    offset: self.border,
                    margin: self.border,
                })),
        })
    }

    /// Run the whole pipeline. Either a fully normalized page or an error
    /// naming the failing stage.
    pub fn normalize(&self, image: DynamicImage) -> Result<GrayImage> {
        let data = self.build_pipeline()?.run(image)?;
        Ok(data.image)
    }

    /// Only locate the text block: threshold, dilate, detect.
    pub fn estimate(&self, image: DynamicImage) -> Result<BoundingEstimate> {
        let data = self.detection_pipeline().run(image)?;
        data.require_estimate().map_err(|e| e.at(Stage::RegionDetection))
    }
}

impl Default for PageNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor for PageNormalizer {
    fn process(&self, image: DynamicImage) -> Result<GrayImage> {
        self.normalize(image)
    }
}

/// Reduces the photo to grayscale and nothing else, for pages that are
/// already flat scans.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayscaleOnly;

impl Preprocessor for GrayscaleOnly {
    fn process(&self, image: DynamicImage) -> Result<GrayImage> {
        preprocessing::to_grayscale(&image).map_err(|e| e.at(Stage::Grayscale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn defaults_follow_the_documented_policy() {
        let normalizer = PageNormalizer::default();
        assert_eq!(normalizer.strategy, CorrectionStrategy::Perspective);
        assert_eq!(normalizer.final_mode(), ThresholdMode::Otsu);
        assert_eq!(normalizer.border, 10);
        assert_eq!(normalizer.dilate_iterations, 2);

        let fixed = normalizer.with_cutoff(Some(140));
        assert_eq!(fixed.final_mode(), ThresholdMode::Fixed(140));
    }

    #[test]
    fn step_lists_per_strategy() {
        let perspective: Vec<String> = PageNormalizer::new()
            .build_pipeline()
            .unwrap()
            .steps()
            .map(str::to_owned)
            .collect();
        assert_eq!(
            perspective,
            ["Threshold", "Dilation", "Region Detection", "Perspective Warp", "Binarization", "Border Padding"]
        );

        let rotate: Vec<String> = PageNormalizer::new()
            .with_strategy(CorrectionStrategy::Rotate)
            .build_pipeline()
            .unwrap()
            .steps()
            .map(str::to_owned)
            .collect();
        assert_eq!(
            rotate,
            ["Threshold", "Dilation", "Region Detection", "Rotation", "Binarization", "Border Padding", "Crop"]
        );
    }

    #[test]
    fn grayscale_only_keeps_geometry() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(7, 5, Luma([90])));
        let out = GrayscaleOnly.process(img).unwrap();
        assert_eq!(out.dimensions(), (7, 5));
        assert_eq!(out.get_pixel(3, 3)[0], 90);
    }
}
