use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow, bail};
use image::GrayImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use tracing::{debug, info};

use crate::image_io;

/// Reads the text of a normalized page. Finding no text is not an error;
/// implementations return an empty string.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &GrayImage) -> Result<String>;
}

/// Default location of the ocrs model files.
pub fn default_model_dir() -> Result<PathBuf> {
    let home_dir = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .context("cannot locate the home directory for the ocrs model cache")?;
    Ok(Path::new(&home_dir).join(".cache/ocrs"))
}

/// Load the ocrs detection and recognition models from `model_dir`.
pub fn init_ocr_engine(model_dir: &Path) -> Result<OcrEngine> {
    let detection_model_path = model_dir.join("text-detection.rten");
    let recognition_model_path = model_dir.join("text-recognition.rten");

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        bail!(
            "OCR models not found. Download them with ocrs-cli or place them manually.\n\
             Expected locations:\n  - {}\n  - {}",
            detection_model_path.display(),
            recognition_model_path.display()
        );
    }

    let detection_model = Model::load_file(&detection_model_path)
        .with_context(|| format!("failed to load {}", detection_model_path.display()))?;
    let recognition_model = Model::load_file(&recognition_model_path)
        .with_context(|| format!("failed to load {}", recognition_model_path.display()))?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
}

/// In-process recognition with ocrs. The engine is loaded on first use and
/// shared afterwards.
pub struct OcrsRecognizer {
    model_dir: PathBuf,
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl OcrsRecognizer {
    pub fn new(model_dir: PathBuf) -> Self {
        Self {
            model_dir,
            engine: Mutex::new(None),
        }
    }

    fn engine(&self) -> Result<Arc<OcrEngine>> {
        let mut guard = self
            .engine
            .lock()
            .map_err(|_| anyhow!("OCR engine lock poisoned"))?;
        if let Some(engine) = guard.as_ref() {
            return Ok(Arc::clone(engine));
        }

        info!(dir = %self.model_dir.display(), "loading ocrs models");
        let engine = Arc::new(init_ocr_engine(&self.model_dir)?);
        *guard = Some(Arc::clone(&engine));
        Ok(engine)
    }
}

impl Recognizer for OcrsRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let engine = self.engine()?;

        let rgb = image::DynamicImage::ImageLuma8(image.clone()).to_rgb8();
        let source = ImageSource::from_bytes(rgb.as_raw(), rgb.dimensions())
            .map_err(|e| anyhow!("image is not usable by ocrs: {:?}", e))?;
        let input = engine.prepare_input(source)?;
        let text = engine.get_text(&input)?;

        debug!(chars = text.len(), "ocrs finished");
        Ok(text.trim().to_string())
    }
}

/// Recognition through the `tesseract` executable.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    /// Tesseract language list, e.g. `ell` or `ell+eng`.
    pub languages: String,
    pub program: PathBuf,
}

impl TesseractRecognizer {
    pub fn new(languages: impl Into<String>) -> Self {
        Self {
            languages: languages.into(),
            program: PathBuf::from("tesseract"),
        }
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new("ell")
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, image: &GrayImage) -> Result<String> {
        let tmp = image_io::store_temp(image).context("failed to write temp image for OCR")?;

        let output = Command::new(&self.program)
            .arg(tmp.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .with_context(|| {
                format!("failed to run {} (is it installed?)", self.program.display())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("tesseract failed: {}", stderr.trim()));
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        debug!(chars = text.len(), languages = %self.languages, "tesseract finished");
        Ok(text)
    }
}
