//! Owned RGBA pixel buffers.
//!
//! [`PixelBuffer`] wraps decoded raster data as tightly packed RGBA bytes
//! (stride `width * 4`) and provides the operations the tile pipeline needs:
//! decode from a blob, grayscale conversion, compositing, linear resampling,
//! and encode/save. Buffers are value types; nothing here is shared across
//! threads.

use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};

use crate::error::PixelError;

/// JPEG quality used for every JPEG encode.
pub const JPEG_QUALITY: u8 = 90;

/// An owned `width x height` RGBA image.
///
/// Invariant: `pixels.len() == width * height * 4` at all times. Operations
/// that change dimensions build the new buffer first and swap it in whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zero-filled (transparent black) buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    /// Decode any supported raster format (PNG, JPEG, WebP) to RGBA.
    ///
    /// # Errors
    ///
    /// [`PixelError::Decode`] on empty, corrupt, or unsupported input.
    pub fn decode(data: &[u8]) -> Result<Self, PixelError> {
        if data.is_empty() {
            return Err(PixelError::Decode {
                message: "tile image data is empty".to_string(),
            });
        }
        let decoded = image::load_from_memory(data).map_err(|e| PixelError::Decode {
            message: e.to_string(),
        })?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Load and decode an image file.
    pub fn load(path: &Path) -> Result<Self, PixelError> {
        let data = std::fs::read(path).map_err(|e| PixelError::Decode {
            message: format!("failed to read '{}': {e}", path.display()),
        })?;
        Self::decode(&data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major, stride `width * 4`.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Convert to grayscale in place using the standard luminance weights
    /// (`0.299 R + 0.587 G + 0.114 B`, rounded). Alpha is untouched.
    ///
    /// Idempotent: once `R == G == B`, the weighted sum reduces to the
    /// identity.
    pub fn to_grayscale(&mut self) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            let r = pixel[0] as f64;
            let g = pixel[1] as f64;
            let b = pixel[2] as f64;
            let gray = (0.299 * r + 0.587 * g + 0.114 * b).round() as u8;
            pixel[0] = gray;
            pixel[1] = gray;
            pixel[2] = gray;
        }
    }

    /// Copy `src` into this buffer at `(x_offset, y_offset)`.
    ///
    /// The source must fit entirely inside the destination; the downsampler
    /// guarantees this when placing children on the 2x canvas.
    pub fn blit(&mut self, src: &Self, x_offset: u32, y_offset: u32) {
        debug_assert!(x_offset + src.width <= self.width);
        debug_assert!(y_offset + src.height <= self.height);

        let dst_stride = self.width as usize * 4;
        let src_stride = src.width as usize * 4;
        for row in 0..src.height as usize {
            let dst_start = (y_offset as usize + row) * dst_stride + x_offset as usize * 4;
            let src_start = row * src_stride;
            self.pixels[dst_start..dst_start + src_stride]
                .copy_from_slice(&src.pixels[src_start..src_start + src_stride]);
        }
    }

    /// Resample to `width x height` with bilinear interpolation.
    pub fn resize_linear(&self, width: u32, height: u32) -> Result<Self, PixelError> {
        let src = RgbaImage::from_raw(self.width, self.height, self.pixels.clone()).ok_or_else(
            || PixelError::Decode {
                message: "pixel buffer does not match its dimensions".to_string(),
            },
        )?;
        let resized = image::imageops::resize(&src, width, height, FilterType::Triangle);
        Ok(Self {
            width,
            height,
            pixels: resized.into_raw(),
        })
    }

    /// Encode to the given extension.
    ///
    /// PNG is lossless RGBA. JPEG drops alpha and encodes 3-channel RGB at
    /// [`JPEG_QUALITY`]. Anything else falls back to PNG.
    pub fn encode(&self, extension: &str) -> Result<Vec<u8>, PixelError> {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => self.encode_jpeg(),
            _ => self.encode_png(),
        }
    }

    /// Encode as lossless RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, PixelError> {
        let mut buffer = Vec::new();
        PngEncoder::new(&mut buffer)
            .write_image(
                &self.pixels,
                self.width,
                self.height,
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| PixelError::Encode {
                message: e.to_string(),
            })?;
        Ok(buffer)
    }

    /// Encode as JPEG, dropping the alpha channel.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>, PixelError> {
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for pixel in self.pixels.chunks_exact(4) {
            rgb.extend_from_slice(&pixel[..3]);
        }

        let mut buffer = Cursor::new(Vec::new());
        JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY)
            .write_image(&rgb, self.width, self.height, ExtendedColorType::Rgb8)
            .map_err(|e| PixelError::Encode {
                message: e.to_string(),
            })?;
        Ok(buffer.into_inner())
    }

    /// Encode based on the path's extension and write the file, creating
    /// parent directories as needed. Missing or unrecognized extensions
    /// encode as PNG.
    pub fn save(&self, path: &Path) -> Result<(), PixelError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| PixelError::CreateDir {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let encoded = self.encode(extension)?;
        std::fs::write(path, encoded).map_err(|e| PixelError::Write {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
