//! Encode/decode options and the geometry validator.
//!
//! Validation is pure and fail-fast: the first failing check aborts the
//! whole call and the native codec is never invoked. Negative dimensions
//! and malformed option records are unrepresentable in these types, so
//! only the buffer-size and range checks remain.

use serde::{Deserialize, Serialize};

use crate::bufsize;
use crate::error::{Error, Result};
use crate::format::{PixelFormat, Subsampling};

/// Parameters for a compress operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// Layout of the source pixel buffer.
    pub format: PixelFormat,
    /// Chroma subsampling; `None` picks 4:2:0, or grayscale for grayscale
    /// sources.
    pub subsampling: Option<Subsampling>,
    /// Row stride of the source buffer in bytes; `None` means tightly
    /// packed (`width * bytes_per_pixel`).
    pub stride: Option<u32>,
    /// JPEG quality in 0..=100; `None` leaves the codec default.
    pub quality: Option<u8>,
}

impl EncodeOptions {
    /// Tightly-packed options with default subsampling and quality.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width,
            height,
            format,
            subsampling: None,
            stride: None,
            quality: None,
        }
    }
}

/// Parameters for a decompress operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Desired output pixel layout; RGB when unspecified.
    pub format: PixelFormat,
}

/// Validated encode geometry handed to the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeGeometry {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub subsampling: Subsampling,
    /// Effective row stride in bytes.
    pub stride: usize,
    pub quality: Option<u8>,
}

/// Resolve the effective subsampling for an encode: explicit choice wins,
/// grayscale sources default to grayscale, everything else to 4:2:0.
fn effective_subsampling(options: &EncodeOptions) -> Subsampling {
    match options.subsampling {
        Some(samp) => samp,
        None if options.format == PixelFormat::Gray => Subsampling::Gray,
        None => Subsampling::default(),
    }
}

/// Validate a compress call against the source buffer length and an
/// optional caller-supplied destination length.
///
/// Check order (first failure wins): quality range, row geometry against
/// the source length, then destination usability and size. Zero
/// dimensions and under-sized strides all fault as
/// [`Error::SourceTooShort`]; they are the same defect, a source that
/// cannot cover the requested rows.
pub fn validate_encode(
    src_len: usize,
    options: &EncodeOptions,
    dst_len: Option<usize>,
) -> Result<EncodeGeometry> {
    if let Some(quality) = options.quality {
        if quality > 100 {
            return Err(Error::InvalidQuality);
        }
    }

    let bpp = options.format.bytes_per_pixel();
    let min_stride = (options.width as usize)
        .checked_mul(bpp)
        .ok_or(Error::InvalidWidth)?;
    let stride = match options.stride {
        Some(stride) => stride as usize,
        None => min_stride,
    };

    let needed = (options.height as usize)
        .checked_mul(stride)
        .ok_or(Error::InvalidWidth)?;
    if options.width == 0 || options.height == 0 || stride < min_stride || src_len < needed {
        return Err(Error::SourceTooShort {
            needed,
            actual: src_len,
        });
    }

    let subsampling = effective_subsampling(options);
    if let Some(dst_len) = dst_len {
        if dst_len == 0 {
            return Err(Error::InvalidDestinationBuffer);
        }
        let bound = bufsize::compressed_size(options.width, options.height, Some(subsampling));
        if dst_len < bound {
            return Err(Error::InsufficientOutputBuffer {
                needed: bound,
                actual: dst_len,
            });
        }
    }

    Ok(EncodeGeometry {
        width: options.width,
        height: options.height,
        format: options.format,
        subsampling,
        stride,
        quality: options.quality,
    })
}

/// Validate the source of a decode-side operation (decompress or
/// coefficient read). An empty source cannot carry a stream header.
pub fn validate_decode_source(src: &[u8]) -> Result<()> {
    if src.is_empty() {
        return Err(Error::InvalidSourceBuffer);
    }
    Ok(())
}

/// Validate a caller-supplied destination against an exact required size.
/// Shared by decompress (pixel output) and coefficient reads.
pub fn validate_destination(dst_len: usize, needed: usize) -> Result<()> {
    if dst_len < needed {
        return Err(Error::InsufficientOutputBuffer {
            needed,
            actual: dst_len,
        });
    }
    Ok(())
}
