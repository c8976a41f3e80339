//! Worst-case output buffer sizing.
//!
//! The compressed bound follows libjpeg-turbo's `tjBufSize`: the image is
//! padded up to whole MCUs, every component is counted at full resolution
//! plus the chroma scale factor, and a fixed allowance covers headers and
//! tables. Huffman coding can expand incompressible data, which is why the
//! bound is well above `width * height * bpp` for small images.
//!
//! The same functions back both the validator's destination-length check
//! and default allocation, so the two can never disagree.

use crate::codec::CoefLayout;
use crate::format::Subsampling;

/// Fixed allowance for markers, headers, and tables.
const HEADER_SLOP: usize = 2048;

fn pad(value: usize, to: usize) -> usize {
    value.div_ceil(to) * to
}

/// Conservative upper bound on the compressed size of a `width` x `height`
/// image at the given subsampling. `None` uses the encode default.
///
/// Compressing any source of this geometry never produces more bytes than
/// this, so a destination sized to it cannot overflow.
pub fn compressed_size(width: u32, height: u32, subsampling: Option<Subsampling>) -> usize {
    let samp = subsampling.unwrap_or_default();
    let padded_w = pad(width as usize, samp.mcu_width());
    let padded_h = pad(height as usize, samp.mcu_height());
    let chroma_sf = if samp == Subsampling::Gray {
        0
    } else {
        4 * 64 / (samp.mcu_width() * samp.mcu_height())
    };
    padded_w * padded_h * (2 + chroma_sf) + HEADER_SLOP
}

/// Upper bound on the compressed size of a `width` x `height` image at
/// *any* supported subsampling: largest MCU padding combined with the
/// largest per-pixel factor. Used where the stream's subsampling is not
/// known up front, e.g. when re-encoding coefficients.
pub fn compressed_size_bound(width: u32, height: u32) -> usize {
    pad(width as usize, 16) * pad(height as usize, 16) * 6 + HEADER_SLOP
}

/// Exact destination size in bytes for a coefficient dump of this layout.
pub fn dct_size(layout: &CoefLayout) -> usize {
    layout.required_bytes()
}
