mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from page_reader for tests
pub use page_reader::{
    BoundingEstimate, CorrectionStrategy, NormalizeError, PageNormalizer, Stage,
};
