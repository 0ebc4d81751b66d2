//! Rasterizable media surfaces backing canvas and video elements

use std::fmt;

use thiserror::Error;

/// Data URL returned by a surface with no pixels (zero width or height).
pub const BLANK_DATA_URL: &str = "data:,";

/// Failure to read pixels out of a surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// The surface holds cross-origin data and may not be read back
    #[error("SecurityError: {0}")]
    Tainted(String),

    /// Pixels were readable but could not be encoded
    #[error("EncodingError: {0}")]
    Encode(String),
}

/// A source of pixels that can be captured as a data URL.
///
/// Canvases expose their drawing buffer and videos their current frame, both
/// at native dimensions. Implementations return [`BLANK_DATA_URL`] when there
/// is nothing to draw.
pub trait Surface: fmt::Debug + Send + Sync {
    fn to_data_url(&self) -> Result<String, RasterError>;
}

/// An in-memory RGBA bitmap, encoded as PNG on capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Bitmap {
    /// Create a bitmap from raw RGBA pixels. Returns `None` when the buffer
    /// length does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        if rgba.len() != (width as usize) * (height as usize) * 4 {
            return None;
        }
        Some(Self { width, height, rgba })
    }

    /// A bitmap filled with a single color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take((width as usize) * (height as usize) * 4)
            .collect();
        Self { width, height, rgba }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[cfg(feature = "raster")]
    fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        use image::ImageEncoder;

        let mut buf = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut buf);
            encoder
                .write_image(&self.rgba, self.width, self.height, image::ColorType::Rgba8.into())
                .map_err(|e| RasterError::Encode(e.to_string()))?;
        }
        Ok(buf)
    }

    #[cfg(not(feature = "raster"))]
    fn encode_png(&self) -> Result<Vec<u8>, RasterError> {
        Err(RasterError::Encode(
            "PNG encoding requires the `raster` feature".into(),
        ))
    }
}

impl Surface for Bitmap {
    fn to_data_url(&self) -> Result<String, RasterError> {
        use base64::Engine as Base64Engine;

        if self.is_empty() {
            return Ok(BLANK_DATA_URL.to_string());
        }
        let png = self.encode_png()?;
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(png)
        ))
    }
}

/// A surface whose capture was produced ahead of time by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSurface {
    data_url: String,
}

impl StaticSurface {
    pub fn new(data_url: impl Into<String>) -> Self {
        Self { data_url: data_url.into() }
    }

    pub fn blank() -> Self {
        Self::new(BLANK_DATA_URL)
    }
}

impl Surface for StaticSurface {
    fn to_data_url(&self) -> Result<String, RasterError> {
        Ok(self.data_url.clone())
    }
}

/// A surface that refuses read-back, like a canvas drawn with cross-origin images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaintedSurface {
    reason: String,
}

impl TaintedSurface {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl Default for TaintedSurface {
    fn default() -> Self {
        Self::new("The canvas has been tainted by cross-origin data.")
    }
}

impl Surface for TaintedSurface {
    fn to_data_url(&self) -> Result<String, RasterError> {
        Err(RasterError::Tainted(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bitmap_is_blank() {
        let b = Bitmap::filled(0, 10, [0, 0, 0, 255]);
        assert!(b.is_empty());
        assert_eq!(b.to_data_url().unwrap(), BLANK_DATA_URL);
    }

    #[test]
    fn bitmap_rejects_mismatched_buffer() {
        assert!(Bitmap::from_rgba(2, 2, vec![0; 15]).is_none());
        assert!(Bitmap::from_rgba(2, 2, vec![0; 16]).is_some());
    }

    #[cfg(feature = "raster")]
    #[test]
    fn bitmap_encodes_png_data_url() {
        let b = Bitmap::filled(4, 3, [255, 0, 0, 255]);
        let url = b.to_data_url().expect("encode");
        assert!(url.starts_with("data:image/png;base64,iVBORw0KGgo"));
    }

    #[test]
    fn tainted_surface_reports_security_error() {
        let t = TaintedSurface::default();
        let err = t.to_data_url().unwrap_err();
        assert!(err.to_string().starts_with("SecurityError"));
    }
}
