use tracing::{debug, info};

use crate::error::{NormalizeError, Result, Stage};
use crate::normalize::{contours, geometry, preprocessing, transform};
use crate::normalize::preprocessing::{KernelShape, Polarity, ThresholdMode};
use crate::pipeline::{MetadataValue, PipelineContext, PipelineData, PipelineStep};

/// Binarize the working image ahead of region detection.
pub struct ThresholdStep {
    pub mode: ThresholdMode,
    pub polarity: Polarity,
}

impl PipelineStep for ThresholdStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let (binary, level) = preprocessing::threshold(&data.image, self.mode, self.polarity);
        debug!(level, mode = ?self.mode, "thresholded working copy");
        Ok(PipelineData { image: binary, ..data }
            .with_metadata("threshold_level", MetadataValue::Int(level.into())))
    }

    fn stage(&self) -> Stage {
        Stage::Threshold
    }
}

/// Merge glyphs into blocks. Without an explicit radius the kernel is sized
/// from the image width.
pub struct DilateStep {
    pub shape: KernelShape,
    pub radius: Option<u8>,
    pub iterations: u32,
}

impl PipelineStep for DilateStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let radius = self
            .radius
            .unwrap_or_else(|| preprocessing::kernel_radius_for_width(data.image.width()));
        debug!(radius, iterations = self.iterations, "dilating");
        let grown = preprocessing::dilate(&data.image, self.shape, radius, self.iterations);
        Ok(PipelineData { image: grown, ..data })
    }

    fn stage(&self) -> Stage {
        Stage::Dilate
    }
}

/// Find the dominant region and fit a rotated rectangle around it.
pub struct RegionDetectionStep;

impl PipelineStep for RegionDetectionStep {
    fn process(&self, mut data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let regions = contours::extract_regions(&data.image);
        // Element 0 is the image frame.
        let candidates = &regions[1..];
        debug!(candidates = candidates.len(), "extracted regions");

        let dominant = contours::select_dominant(candidates)?;
        let estimate = geometry::min_area_rect(dominant)?;
        let skew = geometry::canonical_angle(estimate.angle);
        info!(
            center_x = estimate.center.0,
            center_y = estimate.center.1,
            width = estimate.width,
            height = estimate.height,
            angle = estimate.angle,
            skew,
            "fitted text region"
        );

        data.estimate = Some(estimate);
        Ok(data
            .with_metadata("region_count", MetadataValue::Int(candidates.len() as i64))
            .with_metadata("skew_angle", MetadataValue::Float(skew)))
    }

    fn stage(&self) -> Stage {
        Stage::RegionDetection
    }
}

/// Level the original grayscale image about the region centre.
pub struct RotateStep;

impl PipelineStep for RotateStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let estimate = data.require_estimate()?;
        let skew = geometry::canonical_angle(estimate.angle);
        let rotated = transform::rotate(&data.original, estimate.center, skew);
        Ok(PipelineData { image: rotated, ..data })
    }

    fn stage(&self) -> Stage {
        Stage::Rotate
    }
}

/// Map the fitted rectangle of the original grayscale image straight onto
/// an upright canvas of the same size.
pub struct PerspectiveWarpStep;

impl PipelineStep for PerspectiveWarpStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let estimate = data.require_estimate()?;
        let (width, height) = geometry::upright_size(&estimate);
        let (width, height) = (width.round() as u32, height.round() as u32);
        let corners = geometry::upright_corners(&estimate);

        let warped = transform::warp_perspective(&data.original, corners, width, height)?;
        Ok(PipelineData { image: warped, ..data })
    }

    fn stage(&self) -> Stage {
        Stage::PerspectiveWarp
    }
}

/// Final binarization of the image handed to recognition.
pub struct BinarizeStep {
    pub mode: ThresholdMode,
}

impl PipelineStep for BinarizeStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let (binary, level) = preprocessing::threshold(&data.image, self.mode, Polarity::Normal);
        debug!(level, "binarized output");
        Ok(PipelineData { image: binary, ..data })
    }

    fn stage(&self) -> Stage {
        Stage::Binarize
    }
}

/// Pad each side with a constant intensity.
pub struct BorderStep {
    pub margin: u32,
    pub fill: u8,
}

impl PipelineStep for BorderStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let m = self.margin;
        let padded = transform::copy_make_border(&data.image, m, m, m, m, self.fill);
        Ok(PipelineData { image: padded, ..data })
    }

    fn stage(&self) -> Stage {
        Stage::Border
    }
}

/// Cut the levelled region out of a rotated, padded image. `offset` is the
/// padding added since the rectangle was fitted; `margin` is kept around it.
pub struct CropStep {
    pub offset: u32,
    pub margin: u32,
}

impl PipelineStep for CropStep {
    fn process(&self, data: PipelineData, _context: &PipelineContext) -> Result<PipelineData> {
        let estimate = data.require_estimate()?;
        let rect = geometry::straight_rect(&estimate, self.margin, self.offset);
        let cropped = transform::crop(&data.image, rect).map_err(|e| match e {
            NormalizeError::Geometry(msg) => {
                NormalizeError::Geometry(format!("text region falls outside the page: {}", msg))
            }
            other => other,
        })?;
        Ok(PipelineData { image: cropped, ..data })
    }

    fn stage(&self) -> Stage {
        Stage::Crop
    }
}
