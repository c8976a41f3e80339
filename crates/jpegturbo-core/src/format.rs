//! Pixel formats and chroma subsampling modes.
//!
//! The numeric values accepted by [`PixelFormat::from_raw`] and
//! [`Subsampling::from_raw`] follow the libjpeg-turbo `TJPF`/`TJSAMP`
//! constants, which is what callers coming from the C API pass around.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Supported pixel formats for encode input and decode output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum PixelFormat {
    /// 3 bytes per pixel: R, G, B. The decode default.
    #[default]
    Rgb = 0,
    /// 3 bytes per pixel: B, G, R.
    Bgr = 1,
    /// 4 bytes per pixel: R, G, B, padding.
    Rgbx = 2,
    /// 4 bytes per pixel: B, G, R, padding.
    Bgrx = 3,
    /// 4 bytes per pixel: padding, B, G, R.
    Xbgr = 4,
    /// 4 bytes per pixel: padding, R, G, B.
    Xrgb = 5,
    /// 1 byte per pixel, luminance only.
    Gray = 6,
    /// 4 bytes per pixel: R, G, B, A.
    Rgba = 7,
    /// 4 bytes per pixel: B, G, R, A.
    Bgra = 8,
    /// 4 bytes per pixel: A, B, G, R.
    Abgr = 9,
    /// 4 bytes per pixel: A, R, G, B.
    Argb = 10,
}

impl PixelFormat {
    /// Bytes occupied by a single pixel in this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray => 1,
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Rgbx
            | PixelFormat::Bgrx
            | PixelFormat::Xbgr
            | PixelFormat::Xrgb
            | PixelFormat::Rgba
            | PixelFormat::Bgra
            | PixelFormat::Abgr
            | PixelFormat::Argb => 4,
        }
    }

    /// Convert a raw `TJPF`-style integer into a format, failing with
    /// [`Error::InvalidInputFormat`] for unknown values.
    pub fn from_raw(value: i64) -> Result<Self> {
        match value {
            0 => Ok(PixelFormat::Rgb),
            1 => Ok(PixelFormat::Bgr),
            2 => Ok(PixelFormat::Rgbx),
            3 => Ok(PixelFormat::Bgrx),
            4 => Ok(PixelFormat::Xbgr),
            5 => Ok(PixelFormat::Xrgb),
            6 => Ok(PixelFormat::Gray),
            7 => Ok(PixelFormat::Rgba),
            8 => Ok(PixelFormat::Bgra),
            9 => Ok(PixelFormat::Abgr),
            10 => Ok(PixelFormat::Argb),
            _ => Err(Error::InvalidInputFormat),
        }
    }

    /// Like [`PixelFormat::from_raw`] but for decode output formats, where
    /// unknown values surface as [`Error::InvalidOutputFormat`].
    pub fn from_raw_output(value: i64) -> Result<Self> {
        Self::from_raw(value).map_err(|_| Error::InvalidOutputFormat)
    }
}

/// Chroma subsampling modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum Subsampling {
    /// 4:4:4 - no chroma downsampling.
    Samp444 = 0,
    /// 4:2:2 - chroma halved horizontally.
    Samp422 = 1,
    /// 4:2:0 - chroma halved in both dimensions. The default when the
    /// caller does not choose a mode.
    #[default]
    Samp420 = 2,
    /// Grayscale - no chroma planes at all.
    Gray = 3,
    /// 4:4:0 - chroma halved vertically.
    Samp440 = 4,
}

impl Subsampling {
    /// MCU width in pixels for this mode.
    pub fn mcu_width(self) -> usize {
        match self {
            Subsampling::Samp444 | Subsampling::Gray | Subsampling::Samp440 => 8,
            Subsampling::Samp422 | Subsampling::Samp420 => 16,
        }
    }

    /// MCU height in pixels for this mode.
    pub fn mcu_height(self) -> usize {
        match self {
            Subsampling::Samp444 | Subsampling::Gray | Subsampling::Samp422 => 8,
            Subsampling::Samp420 | Subsampling::Samp440 => 16,
        }
    }

    /// Luma sampling factors (horizontal, vertical) to hand to the codec.
    pub fn luma_sampling(self) -> (u8, u8) {
        match self {
            Subsampling::Samp444 | Subsampling::Gray => (1, 1),
            Subsampling::Samp422 => (2, 1),
            Subsampling::Samp420 => (2, 2),
            Subsampling::Samp440 => (1, 2),
        }
    }

    /// Convert a raw `TJSAMP`-style integer into a mode, failing with
    /// [`Error::InvalidSubsampling`] for unknown values.
    pub fn from_raw(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Subsampling::Samp444),
            1 => Ok(Subsampling::Samp422),
            2 => Ok(Subsampling::Samp420),
            3 => Ok(Subsampling::Gray),
            4 => Ok(Subsampling::Samp440),
            _ => Err(Error::InvalidSubsampling),
        }
    }
}
