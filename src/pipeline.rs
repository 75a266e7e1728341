use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GrayImage, ImageResult};
use tracing::{debug, warn};

use crate::error::{NormalizeError, Result, Stage};
use crate::models::BoundingEstimate;
use crate::normalize::preprocessing;

/// Data that flows through the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineData {
    /// The working image, replaced by each stage.
    pub image: GrayImage,

    /// Grayscale input, shared so correction steps can go back to the
    /// lossless pixels after thresholding.
    pub original: Arc<GrayImage>,

    /// Rectangle fitted around the dominant region, once detected.
    pub estimate: Option<BoundingEstimate>,

    /// Values recorded by steps for logging and inspection
    /// (e.g. "threshold_level", "skew_angle").
    pub metadata: HashMap<String, MetadataValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Float(f32),
    Int(i64),
}

impl PipelineData {
    pub fn from_image(image: GrayImage) -> Self {
        let original = Arc::new(image.clone());
        Self {
            image,
            original,
            estimate: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: MetadataValue) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.metadata.get(key) {
            Some(MetadataValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.metadata.get(key) {
            Some(MetadataValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// The fitted rectangle, or a geometry error when no detection step has
    /// run yet.
    pub fn require_estimate(&self) -> Result<BoundingEstimate> {
        self.estimate.ok_or_else(|| {
            NormalizeError::Geometry("no bounding estimate; region detection has not run".into())
        })
    }
}

/// Where intermediate images are dumped. Writing is best effort: a failed
/// dump is logged and never changes the pipeline result.
#[derive(Clone, Debug)]
pub struct DebugConfig {
    pub output_dir: PathBuf,
}

impl DebugConfig {
    fn stage_dir(&self, index: usize, name: &str) -> PathBuf {
        let dir_name = format!("{:02}_{}", index, name.to_lowercase().replace(' ', "_"));
        self.output_dir.join(dir_name)
    }

    fn save_input(&self, input: &DynamicImage) {
        let dir = self.output_dir.join("00_input");
        write_png(&dir, |path| input.save(path));
    }

    fn save_stage(&self, index: usize, name: &str, image: &GrayImage) {
        let dir = self.stage_dir(index, name);
        write_png(&dir, |path| image.save(path));
    }
}

fn write_png(dir: &Path, save: impl FnOnce(&Path) -> ImageResult<()>) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "could not create debug directory");
        return;
    }
    let path = dir.join("01.png");
    match save(&path) {
        Ok(()) => debug!(path = %path.display(), "saved debug image"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not save debug image"),
    }
}

/// Context available to all pipeline steps.
#[derive(Clone, Debug, Default)]
pub struct PipelineContext {
    pub debug: Option<DebugConfig>,
}

/// A single normalization stage.
pub trait PipelineStep: Send + Sync {
    fn process(&self, data: PipelineData, context: &PipelineContext) -> Result<PipelineData>;

    /// Stage used to label failures.
    fn stage(&self) -> Stage;

    /// Human-readable name, also used for the debug directory.
    fn name(&self) -> &str {
        self.stage().name()
    }
}

/// Composable pipeline builder. Input is always reduced to grayscale first;
/// the configured steps then run in order on a single item.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    context: PipelineContext,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable the per-stage image dump. The directory must be empty or
    /// not exist yet.
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        let diagnostics = |source: io::Error| NormalizeError::Diagnostics {
            path: output_dir.clone(),
            source,
        };

        if output_dir.exists() {
            let mut entries = std::fs::read_dir(&output_dir).map_err(diagnostics)?;
            if entries.next().is_some() {
                return Err(diagnostics(io::Error::new(
                    io::ErrorKind::DirectoryNotEmpty,
                    "debug directory is not empty",
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir).map_err(diagnostics)?;
        }

        self.context.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name())
    }

    /// Run every step on `input`.
    pub fn run(&self, input: DynamicImage) -> Result<PipelineData> {
        let debug = self.context.debug.as_ref();
        if let Some(debug) = debug {
            debug.save_input(&input);
        }

        let gray = preprocessing::to_grayscale(&input).map_err(|e| e.at(Stage::Grayscale))?;
        drop(input);
        if let Some(debug) = debug {
            debug.save_stage(1, Stage::Grayscale.name(), &gray);
        }

        let mut data = PipelineData::from_image(gray);
        for (idx, step) in self.steps.iter().enumerate() {
            debug!(step = step.name(), "running step");
            data = step
                .process(data, &self.context)
                .map_err(|e| e.at(step.stage()))?;
            debug!(
                step = step.name(),
                width = data.image.width(),
                height = data.image.height(),
                "step finished"
            );

            if let Some(debug) = debug {
                debug.save_stage(idx + 2, step.name(), &data.image);
            }
        }

        Ok(data)
    }
}
