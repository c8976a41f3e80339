//! End-to-end tests against the real codec: encode, decode, and the
//! coefficient read/write path.

use jpegturbo::{
    buffer_size, compress, compress_into_sync, compress_sync, compressed_size_bound, decompress,
    decompress_header_sync, decompress_into_sync, decompress_size, decompress_sync, read_dct,
    read_dct_into_sync, read_dct_sync, write_dct, write_dct_into_sync, write_dct_sync,
    DecodeOptions, EncodeOptions, Error, PixelFormat, Subsampling,
};

/// Minimal valid 1x1 grayscale JPEG.
const MINIMAL_JPEG: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46, 0x00, 0x01, 0x01, 0x00, 0x00,
    0x01, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xDB, 0x00, 0x43, 0x00, 0x08, 0x06, 0x06, 0x07, 0x06,
    0x05, 0x08, 0x07, 0x07, 0x07, 0x09, 0x09, 0x08, 0x0A, 0x0C, 0x14, 0x0D, 0x0C, 0x0B, 0x0B,
    0x0C, 0x19, 0x12, 0x13, 0x0F, 0x14, 0x1D, 0x1A, 0x1F, 0x1E, 0x1D, 0x1A, 0x1C, 0x1C, 0x20,
    0x24, 0x2E, 0x27, 0x20, 0x22, 0x2C, 0x23, 0x1C, 0x1C, 0x28, 0x37, 0x29, 0x2C, 0x30, 0x31,
    0x34, 0x34, 0x34, 0x1F, 0x27, 0x39, 0x3D, 0x38, 0x32, 0x3C, 0x2E, 0x33, 0x34, 0x32, 0xFF,
    0xC0, 0x00, 0x0B, 0x08, 0x00, 0x01, 0x00, 0x01, 0x01, 0x01, 0x11, 0x00, 0xFF, 0xC4, 0x00,
    0x1F, 0x00, 0x00, 0x01, 0x05, 0x01, 0x01, 0x01, 0x01, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
    0xFF, 0xC4, 0x00, 0xB5, 0x10, 0x00, 0x02, 0x01, 0x03, 0x03, 0x02, 0x04, 0x03, 0x05, 0x05,
    0x04, 0x04, 0x00, 0x00, 0x01, 0x7D, 0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21,
    0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08,
    0x23, 0x42, 0xB1, 0xC1, 0x15, 0x52, 0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A,
    0x16, 0x17, 0x18, 0x19, 0x1A, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x34, 0x35, 0x36, 0x37,
    0x38, 0x39, 0x3A, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56,
    0x57, 0x58, 0x59, 0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75,
    0x76, 0x77, 0x78, 0x79, 0x7A, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92, 0x93,
    0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xA9,
    0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3, 0xC4, 0xC5, 0xC6,
    0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8, 0xD9, 0xDA, 0xE1, 0xE2,
    0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xF1, 0xF2, 0xF3, 0xF4, 0xF5, 0xF6, 0xF7,
    0xF8, 0xF9, 0xFA, 0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00, 0xFB, 0xD5,
    0xDB, 0x20, 0xA8, 0xF1, 0x7E, 0xFF, 0xD9,
];

/// Deterministic RGB gradient, tightly packed.
fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width.max(1)) as u8);
            pixels.push((y * 255 / height.max(1)) as u8);
            pixels.push(((x + y) % 256) as u8);
        }
    }
    pixels
}

fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut options = EncodeOptions::new(width, height, PixelFormat::Rgb);
    options.quality = Some(90);
    compress_sync(&gradient_rgb(width, height), &options).unwrap()
}

#[test]
fn compress_produces_a_decodable_jpeg() {
    let jpeg = sample_jpeg(64, 48);
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    assert_eq!(decompress_header_sync(&jpeg).unwrap(), (64, 48));

    let out = decompress_sync(&jpeg, DecodeOptions::default()).unwrap();
    assert_eq!((out.width, out.height), (64, 48));
    assert_eq!(out.data.len(), 64 * 48 * 3);
}

#[test]
fn lossy_roundtrip_stays_close_to_the_source() {
    let source = gradient_rgb(32, 32);
    let mut options = EncodeOptions::new(32, 32, PixelFormat::Rgb);
    options.quality = Some(95);
    options.subsampling = Some(Subsampling::Samp444);
    let jpeg = compress_sync(&source, &options).unwrap();
    let out = decompress_sync(&jpeg, DecodeOptions::default()).unwrap();

    let total_error: u64 = source
        .iter()
        .zip(&out.data)
        .map(|(&a, &b)| (a as i64 - b as i64).unsigned_abs())
        .sum();
    let mean_error = total_error as f64 / source.len() as f64;
    assert!(mean_error < 8.0, "mean per-channel error {mean_error} too high");
}

#[test]
fn compress_into_matches_the_allocating_path() {
    let pixels = gradient_rgb(40, 25);
    let options = EncodeOptions::new(40, 25, PixelFormat::Rgb);
    let allocated = compress_sync(&pixels, &options).unwrap();

    let mut dst = vec![0u8; buffer_size(40, 25, None)];
    let size = compress_into_sync(&pixels, &mut dst, &options).unwrap();
    assert_eq!(&dst[..size], &allocated[..]);
}

#[test]
fn grayscale_encodes_as_a_single_component_stream() {
    let pixels = vec![0x80u8; 16 * 16];
    let options = EncodeOptions::new(16, 16, PixelFormat::Gray);
    let jpeg = compress_sync(&pixels, &options).unwrap();

    let dct = read_dct_sync(&jpeg).unwrap();
    let view = dct.view().unwrap();
    assert!(view.cb.is_none());
    assert!(view.cr.is_none());
    assert_eq!(view.y.data.shape(), [2, 2, 8, 8]);
}

#[test]
fn stride_skips_row_padding() {
    // 10 pixels of RGB per row, padded to 40 bytes.
    let width = 10u32;
    let height = 8u32;
    let stride = 40usize;
    let tight = gradient_rgb(width, height);
    let mut padded = vec![0u8; stride * height as usize];
    for row in 0..height as usize {
        let src = &tight[row * 30..row * 30 + 30];
        padded[row * stride..row * stride + 30].copy_from_slice(src);
    }

    let mut tight_options = EncodeOptions::new(width, height, PixelFormat::Rgb);
    tight_options.quality = Some(90);
    let mut padded_options = tight_options.clone();
    padded_options.stride = Some(stride as u32);

    let from_tight = compress_sync(&tight, &tight_options).unwrap();
    let from_padded = compress_sync(&padded, &padded_options).unwrap();
    assert_eq!(from_tight, from_padded);
}

#[test]
fn bgra_decode_carries_four_channels() {
    let jpeg = sample_jpeg(8, 8);
    let options = DecodeOptions { format: PixelFormat::Bgra };
    let out = decompress_sync(&jpeg, options).unwrap();
    assert_eq!(out.data.len(), 8 * 8 * 4);
    assert_eq!(out.format, PixelFormat::Bgra);
}

#[test]
fn decompress_into_reports_geometry() {
    let jpeg = sample_jpeg(12, 7);
    let mut dst = vec![0u8; 12 * 7 * 3];
    let info = decompress_into_sync(&jpeg, &mut dst, DecodeOptions::default()).unwrap();
    assert_eq!((info.width, info.height, info.size), (12, 7, 12 * 7 * 3));
}

#[test]
fn decompress_size_matches_the_decoded_length() {
    let jpeg = sample_jpeg(12, 7);
    assert_eq!(decompress_size(&jpeg, DecodeOptions::default()).unwrap(), 12 * 7 * 3);
    let bgra = DecodeOptions { format: PixelFormat::Bgra };
    assert_eq!(decompress_size(&jpeg, bgra).unwrap(), 12 * 7 * 4);
}

#[test]
fn decode_matches_an_independent_decoder() {
    let jpeg = sample_jpeg(20, 14);
    let ours = decompress_sync(&jpeg, DecodeOptions::default()).unwrap();

    let theirs = image::load_from_memory(&jpeg).unwrap().to_rgb8();
    assert_eq!((theirs.width(), theirs.height()), (20, 14));
    // IDCT rounding and chroma upsampling differ between decoders, so
    // individual samples can diverge; the images as a whole must agree.
    let total_error: u64 = ours
        .data
        .iter()
        .zip(theirs.as_raw())
        .map(|(&a, &b)| (a as i64 - b as i64).unsigned_abs())
        .sum();
    let mean_error = total_error as f64 / ours.data.len() as f64;
    assert!(mean_error < 4.0, "mean per-channel error {mean_error} too high");
}

#[test]
fn read_dct_reflects_the_sampling_grid() {
    let jpeg = sample_jpeg(64, 48);
    let dct = read_dct_sync(&jpeg).unwrap();
    let view = dct.view().unwrap();

    // 4:2:0 default: full-resolution luma, halved chroma.
    assert_eq!(view.y.data.shape(), [6, 8, 8, 8]);
    assert_eq!(view.cb.as_ref().unwrap().data.shape(), [3, 4, 8, 8]);
    assert_eq!(view.cr.as_ref().unwrap().data.shape(), [3, 4, 8, 8]);
    assert!(view.k.is_none());

    assert_eq!(view.y.qt_no, 0);
    assert_eq!(view.cb.as_ref().unwrap().qt_no, 1);
    assert!(view.qts[0].is_some());
    assert!(view.qts[1].is_some());
    assert!(view.qts[0].unwrap().iter().all(|&q| q > 0));
}

#[test]
fn read_dct_is_deterministic() {
    let jpeg = sample_jpeg(24, 24);
    let first = read_dct_sync(&jpeg).unwrap();
    let second = read_dct_sync(&jpeg).unwrap();
    assert_eq!(first.elements(), second.elements());
}

#[test]
fn read_dct_into_aliases_the_destination() {
    let jpeg = sample_jpeg(24, 24);
    let owned = read_dct_sync(&jpeg).unwrap();
    let needed = owned.layout().required_bytes();

    let mut small = vec![0u8; needed - 1];
    let err = read_dct_into_sync(&jpeg, &mut small).unwrap_err();
    assert!(matches!(err, Error::InsufficientOutputBuffer { .. }));

    let mut dst = vec![0u8; needed];
    let view = read_dct_into_sync(&jpeg, &mut dst).unwrap();
    assert_eq!(view.y.data, owned.view().unwrap().y.data);
}

#[test]
fn read_dct_into_exact_size_for_a_full_resolution_image() {
    let pixels = gradient_rgb(560, 560);
    let mut options = EncodeOptions::new(560, 560, PixelFormat::Rgb);
    options.subsampling = Some(Subsampling::Samp444);
    let jpeg = compress_sync(&pixels, &options).unwrap();

    // Three 70x70 block planes plus the four reserved table slots.
    let needed = (3 * 70 * 70 * 8 * 8 * 2) + (4 * 8 * 8 * 2);
    let mut empty = [0u8; 0];
    let err = read_dct_into_sync(&jpeg, &mut empty).unwrap_err();
    assert!(matches!(err, Error::InsufficientOutputBuffer { .. }));

    let mut dst = vec![0u8; needed];
    let view = read_dct_into_sync(&jpeg, &mut dst).unwrap();
    assert_eq!(view.y.data.shape(), [70, 70, 8, 8]);
    assert_eq!(view.cb.as_ref().unwrap().data.shape(), [70, 70, 8, 8]);
}

#[test]
fn write_dct_passthrough_preserves_decoded_pixels() {
    let jpeg = sample_jpeg(32, 16);
    let original = decompress_sync(&jpeg, DecodeOptions::default()).unwrap();

    let dct = read_dct_sync(&jpeg).unwrap();
    let rewritten = write_dct_sync(&jpeg, &dct.view().unwrap()).unwrap();
    assert_eq!(decompress_header_sync(&rewritten).unwrap(), (32, 16));

    // Identical coefficients and tables decode to identical pixels.
    let roundtrip = decompress_sync(&rewritten, DecodeOptions::default()).unwrap();
    assert_eq!(original.data, roundtrip.data);
}

#[test]
fn write_dct_applies_modified_coefficients() {
    let jpeg = sample_jpeg(16, 16);
    let mut dct = read_dct_sync(&jpeg).unwrap();

    // Zero everything but the DC term of each block.
    let layout = dct.layout().clone();
    let elems = dct.elements_mut();
    for plane in 0..layout.planes.len() {
        for chunk in elems[layout.plane_range(plane)].chunks_mut(64) {
            chunk[1..].fill(0);
        }
    }

    let rewritten = write_dct_sync(&jpeg, &dct.view().unwrap()).unwrap();
    let flat = decompress_sync(&rewritten, DecodeOptions::default()).unwrap();
    assert_eq!((flat.width, flat.height), (16, 16));

    // With only DC left, each 8x8 tile is a constant color.
    let row = &flat.data[..8 * 3];
    for y in 1..8 {
        assert_eq!(&flat.data[y * 16 * 3..y * 16 * 3 + 8 * 3], row);
    }
}

#[test]
fn write_dct_into_respects_the_size_bound() {
    let jpeg = sample_jpeg(16, 16);
    let dct = read_dct_sync(&jpeg).unwrap();
    let view = dct.view().unwrap();

    let mut small = vec![0u8; 16];
    let err = write_dct_into_sync(&jpeg, &view, &mut small).unwrap_err();
    assert!(matches!(err, Error::InsufficientOutputBuffer { .. }));

    let mut dst = vec![0u8; compressed_size_bound(16, 16)];
    let size = write_dct_into_sync(&jpeg, &view, &mut dst).unwrap();
    assert_eq!(&dst[..2], &[0xFF, 0xD8]);
    assert!(size <= dst.len());
}

#[test]
fn minimal_grayscale_stream_exposes_one_plane() {
    assert_eq!(decompress_header_sync(MINIMAL_JPEG).unwrap(), (1, 1));

    let dct = read_dct_sync(MINIMAL_JPEG).unwrap();
    let view = dct.view().unwrap();
    assert_eq!(view.y.data.shape(), [1, 1, 8, 8]);
    assert!(view.cb.is_none());
    assert!(view.qts[0].is_some());
    assert!(view.qts[1].is_none());
}

#[test]
fn truncated_stream_surfaces_a_codec_error() {
    let jpeg = sample_jpeg(16, 16);
    let err = decompress_sync(&jpeg[..20], DecodeOptions::default()).unwrap_err();
    assert!(matches!(err, Error::Codec(_)));
}

#[test]
fn garbage_stream_surfaces_a_codec_error() {
    let garbage = vec![0x42u8; 128];
    let err = read_dct_sync(&garbage).unwrap_err();
    assert!(matches!(err, Error::Codec(_)));
}

#[tokio::test]
async fn async_compress_matches_sync() {
    let pixels = gradient_rgb(24, 24);
    let options = EncodeOptions::new(24, 24, PixelFormat::Rgb);
    let sync_out = compress_sync(&pixels, &options).unwrap();
    let async_out = compress(pixels, options).await.unwrap();
    assert_eq!(sync_out, async_out);
}

#[tokio::test]
async fn async_decompress_matches_sync() {
    let jpeg = sample_jpeg(24, 24);
    let sync_out = decompress_sync(&jpeg, DecodeOptions::default()).unwrap();
    let async_out = decompress(jpeg, DecodeOptions::default()).await.unwrap();
    assert_eq!(sync_out.data, async_out.data);
}

#[tokio::test]
async fn async_coefficient_roundtrip() {
    let jpeg = sample_jpeg(24, 24);
    let dct = read_dct(jpeg.clone()).await.unwrap();
    let rewritten = write_dct(jpeg, dct).await.unwrap();
    assert_eq!(decompress_header_sync(&rewritten).unwrap(), (24, 24));
}
