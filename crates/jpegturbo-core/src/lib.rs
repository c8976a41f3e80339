//! jpegturbo-core - codec-independent JPEG plumbing
//!
//! This crate holds everything that sits between a caller and the native
//! JPEG codec without touching the codec itself: option and geometry
//! validation, worst-case output buffer sizing, and the zero-copy
//! marshalling of DCT coefficient data between flat backing buffers and
//! per-plane strided views.
//!
//! The native codec is reached exclusively through the [`codec::JpegCodec`]
//! trait; the `jpegturbo` crate provides the libjpeg-turbo-backed
//! implementation and the blocking/async call dispatcher on top.

pub mod bufsize;
pub mod codec;
pub mod error;
pub mod format;
pub mod marshal;
pub mod validate;

pub use codec::{CoefLayout, CoefPlane, CoefPlaneLayout, CoefWriteRequest, JpegCodec};
pub use error::{Error, Result};
pub use format::{PixelFormat, Subsampling};
pub use marshal::{DctBuffer, DctComponent, DctData};
pub use validate::{DecodeOptions, EncodeGeometry, EncodeOptions};
