use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use page_reader::reader::read_normalized;
use page_reader::{CorrectionStrategy, OcrBackend, ReaderConfig, SpeechBackend, image_io, logging};

#[derive(Parser)]
#[command(name = "page-reader")]
#[command(about = "Straighten a photographed page, read its text and speak it")]
struct Cli {
    /// Path to input image file
    #[arg(value_name = "IMAGE")]
    image_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Save intermediate stage images to directory (must be empty)
    #[arg(long, value_name = "DIR", env = "PAGE_READER_DEBUG_OUT")]
    debug_out: Option<PathBuf>,

    /// Save the normalized page image
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Stop after normalization (requires --output)
    #[arg(long, requires = "output")]
    normalize_only: bool,

    /// Only convert to grayscale; for pages that are already flat scans
    #[arg(long, conflicts_with = "normalize_only")]
    no_normalize: bool,

    /// Fixed cutoff for the final binarization (Otsu when omitted)
    #[arg(long, value_name = "0-255", env = "PAGE_READER_THRESHOLD")]
    threshold: Option<u8>,

    #[arg(long, value_enum, default_value_t, env = "PAGE_READER_STRATEGY")]
    strategy: CorrectionStrategy,

    /// Recognition language list (Tesseract codes)
    #[arg(long, default_value = "ell", env = "PAGE_READER_LANG")]
    lang: String,

    #[arg(long, value_enum, default_value_t, env = "PAGE_READER_OCR")]
    ocr: OcrBackend,

    /// Directory holding the ocrs model files
    #[arg(long, value_name = "DIR", env = "PAGE_READER_MODELS_DIR")]
    models_dir: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t, env = "PAGE_READER_SPEECH")]
    speech: SpeechBackend,

    /// Endpoint of the HTTP speech server
    #[arg(long, value_name = "URL", env = "PAGE_READER_SPEECH_URL")]
    speech_url: Option<String>,

    #[arg(long, env = "PAGE_READER_VOICE")]
    voice: Option<String>,

    /// Where to write the synthesized audio
    #[arg(long, value_name = "FILE", default_value = "output.wav")]
    audio_out: PathBuf,
}

impl Cli {
    fn config(&self) -> ReaderConfig {
        ReaderConfig {
            language: self.lang.clone(),
            cutoff: self.threshold,
            debug_dir: self.debug_out.clone(),
            strategy: self.strategy,
            normalize: !self.no_normalize,
            ocr: self.ocr,
            model_dir: self.models_dir.clone(),
            speech: self.speech,
            speech_url: self.speech_url.clone(),
            voice: self.voice.clone(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logging::init(args.verbose);

    let config = args.config();
    let img = image_io::decode_file(&args.image_path).context("reading image file")?;
    info!(width = img.width(), height = img.height(), "image loaded");

    let deps = config.build_deps()?;
    let page = deps
        .preprocessor
        .process(img)
        .context("processing the image")?;

    if let Some(output) = &args.output {
        image_io::save_image(&page, output)?;
        println!("Normalized page saved to {}", output.display());
    }
    if args.normalize_only {
        return Ok(());
    }

    let outcome = read_normalized(&page, &deps)?;
    if outcome.text.is_empty() {
        println!("No text detected.");
        return Ok(());
    }
    println!("{}", outcome.text);

    if deps.speaker.is_some() {
        std::fs::write(&args.audio_out, &outcome.audio)
            .with_context(|| format!("failed to write {}", args.audio_out.display()))?;
        println!("Audio saved to {}", args.audio_out.display());
    }

    Ok(())
}
