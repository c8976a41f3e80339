//! Error taxonomy for jpegturbo operations.

use thiserror::Error;

/// Errors surfaced by validation, marshalling, and the native codec.
///
/// Every validation failure is raised before the native codec is touched;
/// [`Error::Codec`] is the only variant produced after a native call has
/// started, and it carries the codec's message verbatim.
#[derive(Debug, Error)]
pub enum Error {
    /// The source buffer is empty where image data was required.
    #[error("Invalid source buffer")]
    InvalidSourceBuffer,

    /// Width/height arithmetic overflowed the address space.
    #[error("Invalid width")]
    InvalidWidth,

    /// The pixel format is not one of the supported input formats.
    #[error("Invalid input format")]
    InvalidInputFormat,

    /// The pixel format is not one of the supported output formats.
    #[error("Invalid output format")]
    InvalidOutputFormat,

    /// Quality must lie in 0..=100.
    #[error("Invalid quality")]
    InvalidQuality,

    /// The chroma subsampling mode is not one of the supported modes.
    #[error("Invalid subsampling")]
    InvalidSubsampling,

    /// The source buffer is shorter than the declared geometry requires.
    /// Zero dimensions route here as well: they produce a required length
    /// that cannot be satisfied meaningfully.
    #[error("Source data is not long enough: need {needed} bytes, have {actual}")]
    SourceTooShort { needed: usize, actual: usize },

    /// A caller-supplied destination buffer is empty or unusable.
    #[error("Invalid destination buffer")]
    InvalidDestinationBuffer,

    /// A caller-supplied destination buffer is smaller than the computed
    /// worst-case output size.
    #[error("Insufficient output buffer: need {needed} bytes, have {actual}")]
    InsufficientOutputBuffer { needed: usize, actual: usize },

    /// A coefficient view does not have 8x8 trailing block dimensions, or a
    /// quantization table view is not exactly 8x8.
    #[error("Invalid component shape")]
    InvalidComponentShape,

    /// A coefficient or quantization table view has non-canonical strides
    /// (e.g. it was produced by slicing or transposing). The codec requires
    /// contiguous planar layout, so such views are rejected rather than
    /// silently copied.
    #[error("Invalid component stride")]
    InvalidComponentStride,

    /// Opaque failure surfaced verbatim from the native codec.
    #[error("jpeglib exited with an error: {0}")]
    Codec(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
