use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};

use crate::normalize::{CorrectionStrategy, GrayscaleOnly, PageNormalizer, Preprocessor};
use crate::ocr::{self, OcrsRecognizer, Recognizer, TesseractRecognizer};
use crate::reader::ReaderDeps;
use crate::speech::{HttpSpeaker, LarynxSpeaker, Speaker};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OcrBackend {
    #[default]
    Ocrs,
    Tesseract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SpeechBackend {
    #[default]
    None,
    Larynx,
    Http,
}

/// Everything a page read can be configured with. Built by the CLI; the
/// library never reads the environment itself.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Recognition language hint (Tesseract language list).
    pub language: String,
    /// Fixed cutoff for the final binarization.
    pub cutoff: Option<u8>,
    pub debug_dir: Option<PathBuf>,
    pub strategy: CorrectionStrategy,
    /// When false the photo is only reduced to grayscale.
    pub normalize: bool,
    pub ocr: OcrBackend,
    /// ocrs model directory; `~/.cache/ocrs` when unset.
    pub model_dir: Option<PathBuf>,
    pub speech: SpeechBackend,
    pub speech_url: Option<String>,
    pub voice: Option<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            language: "ell".to_string(),
            cutoff: None,
            debug_dir: None,
            strategy: CorrectionStrategy::default(),
            normalize: true,
            ocr: OcrBackend::default(),
            model_dir: None,
            speech: SpeechBackend::default(),
            speech_url: None,
            voice: None,
        }
    }
}

impl ReaderConfig {
    pub fn normalizer(&self) -> PageNormalizer {
        PageNormalizer::new()
            .with_strategy(self.strategy)
            .with_cutoff(self.cutoff)
            .with_debug_dir(self.debug_dir.clone())
    }

    pub fn preprocessor(&self) -> Arc<dyn Preprocessor> {
        if self.normalize {
            Arc::new(self.normalizer())
        } else {
            Arc::new(GrayscaleOnly)
        }
    }

    pub fn recognizer(&self) -> Result<Arc<dyn Recognizer>> {
        let recognizer: Arc<dyn Recognizer> = match self.ocr {
            OcrBackend::Ocrs => {
                let model_dir = match &self.model_dir {
                    Some(dir) => dir.clone(),
                    None => ocr::default_model_dir()?,
                };
                Arc::new(OcrsRecognizer::new(model_dir))
            }
            OcrBackend::Tesseract => Arc::new(TesseractRecognizer::new(self.language.clone())),
        };
        Ok(recognizer)
    }

    pub fn speaker(&self) -> Result<Option<Arc<dyn Speaker>>> {
        let speaker: Arc<dyn Speaker> = match self.speech {
            SpeechBackend::None => return Ok(None),
            SpeechBackend::Larynx => Arc::new(LarynxSpeaker::new(self.voice.clone())),
            SpeechBackend::Http => {
                let Some(url) = &self.speech_url else {
                    bail!("the http speech backend needs an endpoint URL");
                };
                Arc::new(HttpSpeaker::new(url.clone(), self.voice.clone())?)
            }
        };
        Ok(Some(speaker))
    }

    /// Compose the collaborators selected by this configuration.
    pub fn build_deps(&self) -> Result<ReaderDeps> {
        Ok(ReaderDeps {
            preprocessor: self.preprocessor(),
            recognizer: self.recognizer()?,
            speaker: self.speaker()?,
        })
    }
}
