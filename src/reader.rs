use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use image::{DynamicImage, GrayImage};
use tracing::info;

use crate::image_io;
use crate::normalize::Preprocessor;
use crate::ocr::Recognizer;
use crate::speech::Speaker;

/// The collaborators a page read is composed of.
#[derive(Clone)]
pub struct ReaderDeps {
    pub preprocessor: Arc<dyn Preprocessor>,
    pub recognizer: Arc<dyn Recognizer>,
    /// Speech is skipped when `None`.
    pub speaker: Option<Arc<dyn Speaker>>,
}

#[derive(Debug, Clone, Default)]
pub struct ReadOutcome {
    pub text: String,
    /// Audio for `text`; empty when nothing was recognized or speech is off.
    pub audio: Vec<u8>,
}

/// Photo on disk to recognized text and audio.
pub fn read_page(path: &Path, deps: &ReaderDeps) -> Result<ReadOutcome> {
    let img = image_io::decode_file(path).context("reading image file")?;
    read_image(img, deps)
}

/// Decoded photo to recognized text and audio.
pub fn read_image(img: DynamicImage, deps: &ReaderDeps) -> Result<ReadOutcome> {
    let page = deps
        .preprocessor
        .process(img)
        .context("processing the image")?;
    read_normalized(&page, deps)
}

/// Recognition and speech for an already normalized page.
pub fn read_normalized(page: &GrayImage, deps: &ReaderDeps) -> Result<ReadOutcome> {
    let text = deps
        .recognizer
        .recognize(page)
        .context("running OCR on the image")?;

    if text.trim().is_empty() {
        info!("no text recognized; skipping speech");
        return Ok(ReadOutcome::default());
    }
    info!(chars = text.chars().count(), "recognized text");

    let audio = match &deps.speaker {
        Some(speaker) => speaker
            .speak(&text)
            .context("running text to speech on the text")?,
        None => Vec::new(),
    };

    Ok(ReadOutcome { text, audio })
}
