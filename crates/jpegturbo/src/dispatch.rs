//! Orchestration between argument validation, marshalling, and the codec.
//!
//! Every public operation of the crate is a thin wrapper over a generic
//! function here, parameterized on [`JpegCodec`]. Validation always runs
//! before the codec is touched, so a bad argument can never reach a native
//! call. The asynchronous variants validate first too, then move the owned
//! inputs onto a blocking worker.

use jpegturbo_core::bufsize;
use jpegturbo_core::codec::JpegCodec;
use jpegturbo_core::error::{Error, Result};
use jpegturbo_core::format::PixelFormat;
use jpegturbo_core::marshal::{self, DctBuffer, DctData};
use jpegturbo_core::validate::{
    self, DecodeOptions, EncodeGeometry, EncodeOptions,
};
use serde::Serialize;

/// A decoded image with its pixel geometry.
#[derive(Debug, Clone, Serialize)]
pub struct DecompressOutput {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// Geometry of a decode that wrote into a caller-supplied buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecompressInfo {
    pub size: usize,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

// ---------------------------------------------------------------------------
// Compression
// ---------------------------------------------------------------------------

pub(crate) fn compress_with<C: JpegCodec>(
    codec: &C,
    src: &[u8],
    options: &EncodeOptions,
) -> Result<Vec<u8>> {
    let geometry = validate::validate_encode(src.len(), options, None)?;
    run_compress(codec, src, &geometry)
}

pub(crate) fn compress_into_with<C: JpegCodec>(
    codec: &C,
    src: &[u8],
    dst: &mut [u8],
    options: &EncodeOptions,
) -> Result<usize> {
    let geometry = validate::validate_encode(src.len(), options, Some(dst.len()))?;
    let size = codec.compress(src, dst, &geometry)?;
    tracing::debug!(size, width = geometry.width, height = geometry.height, "compress done");
    Ok(size)
}

fn run_compress<C: JpegCodec>(
    codec: &C,
    src: &[u8],
    geometry: &EncodeGeometry,
) -> Result<Vec<u8>> {
    let bound = bufsize::compressed_size(geometry.width, geometry.height, Some(geometry.subsampling));
    let mut dst = vec![0u8; bound];
    let size = codec.compress(src, &mut dst, geometry)?;
    tracing::debug!(size, width = geometry.width, height = geometry.height, "compress done");
    dst.truncate(size);
    Ok(dst)
}

pub(crate) async fn compress_async_with<C>(
    codec: C,
    src: Vec<u8>,
    options: EncodeOptions,
) -> Result<Vec<u8>>
where
    C: JpegCodec + Send + 'static,
{
    let geometry = validate::validate_encode(src.len(), &options, None)?;
    spawn(move || run_compress(&codec, &src, &geometry)).await
}

// ---------------------------------------------------------------------------
// Decompression
// ---------------------------------------------------------------------------

pub(crate) fn decompress_with<C: JpegCodec>(
    codec: &C,
    src: &[u8],
    options: DecodeOptions,
) -> Result<DecompressOutput> {
    validate::validate_decode_source(src)?;
    let (width, height) = codec.decompress_header(src)?;
    let needed = decoded_size(width, height, options.format)?;
    let mut data = vec![0u8; needed];
    codec.decompress(src, &mut data, width, height, options.format)?;
    tracing::debug!(width, height, format = ?options.format, "decompress done");
    Ok(DecompressOutput { data, width, height, format: options.format })
}

pub(crate) fn decompress_into_with<C: JpegCodec>(
    codec: &C,
    src: &[u8],
    dst: &mut [u8],
    options: DecodeOptions,
) -> Result<DecompressInfo> {
    validate::validate_decode_source(src)?;
    if dst.is_empty() {
        return Err(Error::InvalidDestinationBuffer);
    }
    let (width, height) = codec.decompress_header(src)?;
    let needed = decoded_size(width, height, options.format)?;
    validate::validate_destination(dst.len(), needed)?;
    codec.decompress(src, &mut dst[..needed], width, height, options.format)?;
    tracing::debug!(width, height, format = ?options.format, "decompress done");
    Ok(DecompressInfo { size: needed, width, height, format: options.format })
}

pub(crate) async fn decompress_async_with<C>(
    codec: C,
    src: Vec<u8>,
    options: DecodeOptions,
) -> Result<DecompressOutput>
where
    C: JpegCodec + Send + 'static,
{
    validate::validate_decode_source(&src)?;
    spawn(move || decompress_with(&codec, &src, options)).await
}

pub(crate) fn decompress_header_with<C: JpegCodec>(codec: &C, src: &[u8]) -> Result<(u32, u32)> {
    validate::validate_decode_source(src)?;
    codec.decompress_header(src)
}

/// Bytes a decode of `src` will produce at the requested output format.
pub(crate) fn decompress_size_with<C: JpegCodec>(
    codec: &C,
    src: &[u8],
    options: DecodeOptions,
) -> Result<usize> {
    let (width, height) = decompress_header_with(codec, src)?;
    decoded_size(width, height, options.format)
}

fn decoded_size(width: u32, height: u32, format: PixelFormat) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(format.bytes_per_pixel()))
        .ok_or(Error::InvalidWidth)
}

// ---------------------------------------------------------------------------
// Coefficient access
// ---------------------------------------------------------------------------

pub(crate) fn read_dct_with<C: JpegCodec>(codec: &C, src: &[u8]) -> Result<DctBuffer> {
    validate::validate_decode_source(src)?;
    let layout = codec.coef_layout(src)?;
    layout.check_plane_count()?;
    let mut elems = vec![0i16; layout.total_elements()];
    codec.read_coefficients(src, &mut elems, &layout)?;
    tracing::debug!(planes = layout.planes.len(), "coefficient read done");
    DctBuffer::new(elems, layout)
}

pub(crate) fn read_dct_into_with<'a, C: JpegCodec>(
    codec: &C,
    src: &[u8],
    dst: &'a mut [u8],
) -> Result<DctData<'a>> {
    validate::validate_decode_source(src)?;
    let layout = codec.coef_layout(src)?;
    layout.check_plane_count()?;
    validate::validate_destination(dst.len(), layout.required_bytes())?;
    let elems = marshal::cast_destination(dst, layout.required_bytes())?;
    codec.read_coefficients(src, &mut elems[..], &layout)?;
    tracing::debug!(planes = layout.planes.len(), "coefficient read done");
    marshal::dct_view(elems, &layout)
}

pub(crate) async fn read_dct_async_with<C>(codec: C, src: Vec<u8>) -> Result<DctBuffer>
where
    C: JpegCodec + Send + 'static,
{
    validate::validate_decode_source(&src)?;
    spawn(move || read_dct_with(&codec, &src)).await
}

pub(crate) fn write_dct_with<C: JpegCodec>(
    codec: &C,
    src: &[u8],
    dct: &DctData<'_>,
) -> Result<Vec<u8>> {
    validate::validate_decode_source(src)?;
    let request = marshal::write_request(dct)?;
    let out = codec.write_coefficients(src, &request)?;
    tracing::debug!(size = out.len(), "coefficient write done");
    Ok(out)
}

pub(crate) fn write_dct_into_with<C: JpegCodec>(
    codec: &C,
    src: &[u8],
    dct: &DctData<'_>,
    dst: &mut [u8],
) -> Result<usize> {
    validate::validate_decode_source(src)?;
    if dst.is_empty() {
        return Err(Error::InvalidDestinationBuffer);
    }
    let request = marshal::write_request(dct)?;
    // Subsampling is unknown until the stream is parsed, so size against
    // the mode-independent bound.
    let (width, height) = codec.decompress_header(src)?;
    validate::validate_destination(dst.len(), bufsize::compressed_size_bound(width, height))?;
    let out = codec.write_coefficients(src, &request)?;
    if out.len() > dst.len() {
        return Err(Error::InsufficientOutputBuffer { needed: out.len(), actual: dst.len() });
    }
    dst[..out.len()].copy_from_slice(&out);
    tracing::debug!(size = out.len(), "coefficient write done");
    Ok(out.len())
}

pub(crate) async fn write_dct_async_with<C>(
    codec: C,
    src: Vec<u8>,
    dct: DctBuffer,
) -> Result<Vec<u8>>
where
    C: JpegCodec + Send + 'static,
{
    validate::validate_decode_source(&src)?;
    spawn(move || {
        let view = dct.view()?;
        write_dct_with(&codec, &src, &view)
    })
    .await
}

// ---------------------------------------------------------------------------
// Blocking worker plumbing
// ---------------------------------------------------------------------------

async fn spawn<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Codec(format!("blocking worker failed: {e}")))?
}
