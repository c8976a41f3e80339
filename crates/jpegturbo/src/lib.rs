//! JPEG compression, decompression, and raw DCT coefficient access over
//! libjpeg-turbo.
//!
//! The crate splits into three layers. [`jpegturbo_core`] validates
//! arguments and marshals coefficient data without ever touching the codec.
//! [`TurboCodec`] is the native boundary. The functions here wire the two
//! together, in synchronous form and in `async` form that runs the codec on
//! a blocking worker.
//!
//! ```no_run
//! # async fn demo() -> jpegturbo::Result<()> {
//! let pixels = vec![0u8; 640 * 480 * 3];
//! let options = jpegturbo::EncodeOptions::new(640, 480, jpegturbo::PixelFormat::Rgb);
//! let jpeg = jpegturbo::compress(pixels, options).await?;
//!
//! let dct = jpegturbo::read_dct(jpeg.clone()).await?;
//! let rewritten = jpegturbo::write_dct(jpeg, dct).await?;
//! # let _ = rewritten;
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod turbo;

pub use dispatch::{DecompressInfo, DecompressOutput};
pub use jpegturbo_core::bufsize::{compressed_size, compressed_size_bound, dct_size};
pub use jpegturbo_core::codec::{
    CoefLayout, CoefPlane, CoefPlaneLayout, CoefWriteRequest, JpegCodec,
};
pub use jpegturbo_core::error::{Error, Result};
pub use jpegturbo_core::format::{PixelFormat, Subsampling};
pub use jpegturbo_core::marshal::{DctBuffer, DctComponent, DctData};
pub use jpegturbo_core::validate::{DecodeOptions, EncodeOptions};
pub use turbo::TurboCodec;

/// Worst-case compressed size for an image, the required destination length
/// for [`compress_into_sync`].
pub fn buffer_size(width: u32, height: u32, subsampling: Option<Subsampling>) -> usize {
    compressed_size(width, height, subsampling)
}

/// Encode raw pixels as a JPEG, returning a buffer trimmed to the actual
/// compressed size.
pub fn compress_sync(src: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
    dispatch::compress_with(&TurboCodec, src, options)
}

/// Encode into a caller-supplied buffer sized by [`buffer_size`]; returns
/// the number of bytes written.
pub fn compress_into_sync(src: &[u8], dst: &mut [u8], options: &EncodeOptions) -> Result<usize> {
    dispatch::compress_into_with(&TurboCodec, src, dst, options)
}

/// Asynchronous [`compress_sync`]; the codec runs on a blocking worker.
pub async fn compress(src: Vec<u8>, options: EncodeOptions) -> Result<Vec<u8>> {
    dispatch::compress_async_with(TurboCodec, src, options).await
}

/// Decode a JPEG into a freshly allocated pixel buffer.
pub fn decompress_sync(src: &[u8], options: DecodeOptions) -> Result<DecompressOutput> {
    dispatch::decompress_with(&TurboCodec, src, options)
}

/// Decode into a caller-supplied buffer of at least `width * height *
/// bytes_per_pixel` bytes.
pub fn decompress_into_sync(
    src: &[u8],
    dst: &mut [u8],
    options: DecodeOptions,
) -> Result<DecompressInfo> {
    dispatch::decompress_into_with(&TurboCodec, src, dst, options)
}

/// Asynchronous [`decompress_sync`].
pub async fn decompress(src: Vec<u8>, options: DecodeOptions) -> Result<DecompressOutput> {
    dispatch::decompress_async_with(TurboCodec, src, options).await
}

/// Read the pixel dimensions from a JPEG header without decoding it.
pub fn decompress_header_sync(src: &[u8]) -> Result<(u32, u32)> {
    dispatch::decompress_header_with(&TurboCodec, src)
}

/// Destination size in bytes that [`decompress_into_sync`] requires for
/// this stream at the requested output format.
pub fn decompress_size(src: &[u8], options: DecodeOptions) -> Result<usize> {
    dispatch::decompress_size_with(&TurboCodec, src, options)
}

/// Extract the quantized DCT coefficients and quantization tables of a
/// JPEG without decoding it to pixels.
pub fn read_dct_sync(src: &[u8]) -> Result<DctBuffer> {
    dispatch::read_dct_with(&TurboCodec, src)
}

/// [`read_dct_sync`] into a caller-supplied byte buffer; the returned views
/// alias `dst` with no copy. The buffer must hold at least
/// [`CoefLayout::required_bytes`] bytes and be `i16`-aligned.
pub fn read_dct_into_sync<'a>(src: &[u8], dst: &'a mut [u8]) -> Result<DctData<'a>> {
    dispatch::read_dct_into_with(&TurboCodec, src, dst)
}

/// Asynchronous [`read_dct_sync`].
pub async fn read_dct(src: Vec<u8>) -> Result<DctBuffer> {
    dispatch::read_dct_async_with(TurboCodec, src).await
}

/// Re-encode a JPEG with its coefficient blocks and quantization tables
/// replaced, losslessly reusing the source's entropy parameters.
pub fn write_dct_sync(src: &[u8], dct: &DctData<'_>) -> Result<Vec<u8>> {
    dispatch::write_dct_with(&TurboCodec, src, dct)
}

/// [`write_dct_sync`] into a caller-supplied buffer sized by
/// [`compressed_size_bound`]; returns the number of bytes written.
pub fn write_dct_into_sync(src: &[u8], dct: &DctData<'_>, dst: &mut [u8]) -> Result<usize> {
    dispatch::write_dct_into_with(&TurboCodec, src, dct, dst)
}

/// Asynchronous [`write_dct_sync`] over an owned coefficient buffer.
pub async fn write_dct(src: Vec<u8>, dct: DctBuffer) -> Result<Vec<u8>> {
    dispatch::write_dct_async_with(TurboCodec, src, dct).await
}
