pub mod config;
pub mod error;
pub mod image_io;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod ocr;
pub mod pipeline;
pub mod reader;
pub mod speech;

pub use config::{OcrBackend, ReaderConfig, SpeechBackend};
pub use error::{NormalizeError, Stage};
pub use models::{BoundingEstimate, CropRect, Region};
pub use normalize::{CorrectionStrategy, GrayscaleOnly, PageNormalizer, Preprocessor};
pub use ocr::Recognizer;
pub use pipeline::{DebugConfig, MetadataValue, Pipeline, PipelineContext, PipelineData, PipelineStep};
pub use reader::{ReadOutcome, ReaderDeps, read_image, read_page};
pub use speech::Speaker;
