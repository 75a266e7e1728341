use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Named stages of the normalization pipeline, used to label failures
/// and diagnostics output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decode,
    Grayscale,
    Threshold,
    Dilate,
    RegionDetection,
    Rotate,
    PerspectiveWarp,
    Binarize,
    Border,
    Crop,
    Encode,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Decode => "Decode",
            Stage::Grayscale => "Grayscale Conversion",
            Stage::Threshold => "Threshold",
            Stage::Dilate => "Dilation",
            Stage::RegionDetection => "Region Detection",
            Stage::Rotate => "Rotation",
            Stage::PerspectiveWarp => "Perspective Warp",
            Stage::Binarize => "Binarization",
            Stage::Border => "Border Padding",
            Stage::Crop => "Crop",
            Stage::Encode => "Encode",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors produced while turning a photo into a normalized page image.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("failed to decode image {origin}")]
    Decode {
        origin: String,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported pixel layout {0:?}")]
    UnsupportedLayout(image::ColorType),

    /// Thresholding and dilation left no candidate region (blank or uniform page).
    #[error("no text region found")]
    NoRegionFound,

    #[error("degenerate geometry: {0}")]
    Geometry(String),

    #[error("failed to encode image to {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("diagnostics directory {} is unusable", path.display())]
    Diagnostics {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{stage} failed")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<NormalizeError>,
    },
}

impl NormalizeError {
    /// Wrap this error with the stage it happened in.
    pub fn at(self, stage: Stage) -> Self {
        NormalizeError::Stage {
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, with all stage context removed.
    pub fn root_cause(&self) -> &NormalizeError {
        match self {
            NormalizeError::Stage { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The outermost stage recorded on this error, if any.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            NormalizeError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

pub type Result<T, E = NormalizeError> = std::result::Result<T, E>;
