//! The codec boundary: coefficient layout descriptors and the trait the
//! native JPEG codec is reached through.
//!
//! Everything above this boundary is pure and synchronous; everything below
//! it is the opaque native library. The dispatcher in the `jpegturbo` crate
//! is generic over [`JpegCodec`] so tests can substitute a mock.

use crate::error::{Error, Result};
use crate::format::PixelFormat;
use crate::validate::EncodeGeometry;
use std::ops::Range;

/// DCT block edge length. JPEG only operates on 8x8 blocks.
pub const BLOCK: usize = 8;

/// Elements in one DCT block.
pub const BLOCK_ELEMS: usize = BLOCK * BLOCK;

/// Quantization table slots in a JPEG stream.
pub const QT_SLOTS: usize = 4;

/// Block-grid geometry of one coefficient plane as reported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoefPlaneLayout {
    /// Rows of 8x8 blocks in this plane.
    pub block_rows: u32,
    /// Columns of 8x8 blocks in this plane.
    pub block_cols: u32,
    /// Index of the quantization table this plane references.
    pub qt_no: u8,
}

impl CoefPlaneLayout {
    /// Coefficient element count of this plane.
    pub fn elements(&self) -> usize {
        self.block_rows as usize * self.block_cols as usize * BLOCK_ELEMS
    }
}

/// Layout of a full coefficient dump: plane geometry in component order
/// (Y, Cb, Cr, then K for four-plane images) plus which quantization table
/// slots are populated.
///
/// The flat backing buffer convention is: each plane's blocks in row-major
/// order, planes back to back, followed by four 64-element quantization
/// table slots. All four slots are always reserved so a destination sized
/// for one image works for any image of the same plane geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefLayout {
    /// Per-plane block geometry, 1 (grayscale), 3, or 4 entries.
    pub planes: Vec<CoefPlaneLayout>,
    /// Which of the four quantization table slots hold a table.
    pub qt_present: [bool; QT_SLOTS],
}

impl CoefLayout {
    /// Total i16 elements the backing buffer must hold, including the four
    /// reserved quantization table slots.
    pub fn total_elements(&self) -> usize {
        let planes: usize = self.planes.iter().map(CoefPlaneLayout::elements).sum();
        planes + QT_SLOTS * BLOCK_ELEMS
    }

    /// Exact backing buffer size in bytes.
    pub fn required_bytes(&self) -> usize {
        self.total_elements() * std::mem::size_of::<i16>()
    }

    /// Element range of plane `index` within the backing buffer.
    pub fn plane_range(&self, index: usize) -> Range<usize> {
        let start: usize = self.planes[..index]
            .iter()
            .map(CoefPlaneLayout::elements)
            .sum();
        start..start + self.planes[index].elements()
    }

    /// Element range of quantization table slot `slot` within the backing
    /// buffer. Reserved whether or not the slot is populated.
    pub fn qt_range(&self, slot: usize) -> Range<usize> {
        let planes: usize = self.planes.iter().map(CoefPlaneLayout::elements).sum();
        let start = planes + slot * BLOCK_ELEMS;
        start..start + BLOCK_ELEMS
    }

    /// Reject component counts the marshaller has no plane names for.
    pub fn check_plane_count(&self) -> Result<()> {
        match self.planes.len() {
            1 | 3 | 4 => Ok(()),
            n => Err(Error::Codec(format!("unsupported component count: {n}"))),
        }
    }
}

/// One plane of a coefficient write, referencing the caller's backing
/// buffer directly. No data is copied on the way to the codec.
#[derive(Debug, Clone, Copy)]
pub struct CoefPlane<'a> {
    /// Contiguous blocks in row-major order, `block_rows * block_cols * 64`
    /// elements.
    pub data: &'a [i16],
    pub block_rows: u32,
    pub block_cols: u32,
    pub qt_no: u8,
}

/// Flat descriptor set handed to the codec for a coefficient write: one
/// entry per plane in component order, one per quantization table slot.
#[derive(Debug, Clone)]
pub struct CoefWriteRequest<'a> {
    pub planes: Vec<CoefPlane<'a>>,
    /// Populated table slots; absent slots pass through as `None` and leave
    /// the source image's table untouched.
    pub qts: [Option<&'a [u16]>; QT_SLOTS],
}

/// The native JPEG codec, treated as an opaque collaborator.
///
/// Implementations receive only pre-validated inputs: geometry has been
/// checked against buffer lengths and destination buffers are known to be
/// large enough before any of these methods run.
pub trait JpegCodec {
    /// Compress pixels into `dst`, returning the number of bytes written.
    /// `dst` is at least [`crate::bufsize::compressed_size`] bytes.
    fn compress(&self, src: &[u8], dst: &mut [u8], geometry: &EncodeGeometry) -> Result<usize>;

    /// Parse the stream header and return (width, height) in pixels.
    fn decompress_header(&self, src: &[u8]) -> Result<(u32, u32)>;

    /// Decompress into `dst`, which holds exactly
    /// `width * height * format.bytes_per_pixel()` bytes.
    fn decompress(
        &self,
        src: &[u8],
        dst: &mut [u8],
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Result<()>;

    /// Parse the stream header and report the coefficient layout.
    fn coef_layout(&self, src: &[u8]) -> Result<CoefLayout>;

    /// Entropy-decode all coefficient planes and quantization tables into
    /// `dst` following the [`CoefLayout`] flat-buffer convention. `dst`
    /// holds exactly `layout.total_elements()` elements.
    fn read_coefficients(&self, src: &[u8], dst: &mut [i16], layout: &CoefLayout) -> Result<()>;

    /// Re-encode `src` with its coefficient blocks (and any present
    /// quantization tables) replaced by the request's data, returning the
    /// compressed stream.
    fn write_coefficients(&self, src: &[u8], request: &CoefWriteRequest<'_>) -> Result<Vec<u8>>;
}
