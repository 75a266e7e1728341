use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageError, ImageFormat, ImageReader};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{NormalizeError, Result, Stage};

/// Decode a JPEG/PNG (or any format `image` recognises) from disk.
/// Failures are tagged with [`Stage::Decode`].
pub fn decode_file(path: &Path) -> Result<DynamicImage> {
    let decode_error = |source: ImageError| {
        NormalizeError::Decode {
            origin: path.display().to_string(),
            source,
        }
        .at(Stage::Decode)
    };

    let img = ImageReader::open(path)
        .map_err(|e| decode_error(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_error(ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)?;

    debug!(path = %path.display(), width = img.width(), height = img.height(), "decoded image");
    Ok(img)
}

/// Decode an in-memory image, e.g. an uploaded file body.
pub fn decode_bytes(bytes: &[u8]) -> Result<DynamicImage> {
    let decode_error = |source: ImageError| {
        NormalizeError::Decode {
            origin: format!("<{} byte buffer>", bytes.len()),
            source,
        }
        .at(Stage::Decode)
    };

    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| decode_error(ImageError::IoError(e)))?
        .decode()
        .map_err(decode_error)
}

/// Write the normalized page; the format follows the file extension.
pub fn save_image(img: &GrayImage, path: &Path) -> Result<()> {
    img.save(path).map_err(|source| encode_error(path.to_path_buf(), source))
}

fn encode_error(path: PathBuf, source: ImageError) -> NormalizeError {
    NormalizeError::Encode { path, source }.at(Stage::Encode)
}

/// Encode `img` as PNG into a temporary file that is removed on drop.
pub fn store_temp(img: &GrayImage) -> Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .prefix("page-")
        .suffix(".png")
        .tempfile()
        .map_err(|e| encode_error(std::env::temp_dir(), ImageError::IoError(e)))?;

    img.save_with_format(file.path(), ImageFormat::Png)
        .map_err(|source| encode_error(file.path().to_path_buf(), source))?;

    debug!(path = %file.path().display(), "stored temporary page image");
    Ok(file)
}
