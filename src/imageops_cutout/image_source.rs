use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbaImage};

use crate::error::Error;

const FILE_SCHEME: &str = "file://";

/// Where an input image comes from
///
/// Every variant is normalized to an RGBA bitmap before segmentation.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// An already decoded image
    Bitmap(DynamicImage),
    /// Encoded image bytes; the format is guessed from the content
    Bytes(Vec<u8>),
    /// A filesystem path or a `file://` URI
    Uri(String),
}

impl ImageSource {
    /// Decodes the source into a [`DynamicImage`].
    ///
    /// # Errors
    ///
    /// * `Error::UnsupportedUri` - When a URI uses a scheme other than `file://`
    /// * `Error::Io` - When the file cannot be read
    /// * `Error::Decode` - When the bytes are not a supported image
    pub fn decode(self) -> Result<DynamicImage, Error> {
        match self {
            Self::Bitmap(image) => Ok(image),
            Self::Bytes(bytes) => Ok(image::load_from_memory(&bytes)?),
            Self::Uri(uri) => {
                let path = resolve_uri(&uri)?;
                log::debug!("loading image from {}", path.display());
                let bytes = std::fs::read(&path)?;
                Ok(image::load_from_memory(&bytes)?)
            }
        }
    }

    /// Decodes the source and converts it to 8-bit RGBA.
    ///
    /// # Errors
    ///
    /// Same as [`ImageSource::decode`].
    pub fn into_rgba(self) -> Result<RgbaImage, Error> {
        Ok(self.decode()?.into_rgba8())
    }
}

impl From<DynamicImage> for ImageSource {
    fn from(image: DynamicImage) -> Self {
        Self::Bitmap(image)
    }
}

impl From<RgbaImage> for ImageSource {
    fn from(image: RgbaImage) -> Self {
        Self::Bitmap(DynamicImage::ImageRgba8(image))
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Uri(path.to_string_lossy().into_owned())
    }
}

/// Maps a URI onto a local path.
///
/// Plain paths pass through; `file://` and `file://localhost/` are stripped.
/// Any other `scheme://` (and `data:` URIs) is rejected.
fn resolve_uri(uri: &str) -> Result<PathBuf, Error> {
    if let Some(rest) = uri.strip_prefix(FILE_SCHEME) {
        let path = rest.strip_prefix("localhost").unwrap_or(rest);
        if path.is_empty() {
            return Err(Error::UnsupportedUri(uri.to_owned()));
        }
        return Ok(PathBuf::from(path));
    }
    if uri.contains("://") || uri.starts_with("data:") {
        return Err(Error::UnsupportedUri(uri.to_owned()));
    }
    Ok(PathBuf::from(uri))
}

/// Encodes an RGBA image as PNG.
///
/// # Errors
///
/// * `Error::Encode` - When the PNG encoder fails
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| Error::Encode(format!("PNG encoding failed: {e}")))?;
    Ok(buffer)
}
