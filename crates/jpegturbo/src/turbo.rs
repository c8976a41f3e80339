//! libjpeg-turbo backed implementation of the codec boundary.
//!
//! Every operation follows the same shape: set up a libjpeg struct with an
//! unwinding error manager, run the standard call sequence, and let RAII
//! guards release the codec state on both the success and the error path.
//! libjpeg reports fatal errors through its `error_exit` hook, which never
//! returns; ours panics with the message code and each entry point catches
//! the unwind and surfaces it as [`Error::Codec`].

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;

use libc::{c_int, c_ulong};
use mozjpeg_sys::{
    jpeg_common_struct, jpeg_compress_struct, jpeg_copy_critical_parameters, jpeg_decompress_struct,
    jpeg_destroy_compress, jpeg_destroy_decompress, jpeg_error_mgr, jpeg_finish_compress,
    jpeg_finish_decompress, jpeg_mem_dest, jpeg_mem_src, jpeg_read_coefficients, jpeg_read_header,
    jpeg_read_scanlines, jpeg_set_colorspace, jpeg_set_defaults, jpeg_set_quality,
    jpeg_start_compress, jpeg_start_decompress, jpeg_std_error, jpeg_write_coefficients,
    jpeg_write_scanlines, jpeg_CreateCompress, jpeg_CreateDecompress, J_COLOR_SPACE, JDIMENSION,
    JPEG_LIB_VERSION,
};

use jpegturbo_core::codec::{
    CoefLayout, CoefPlaneLayout, CoefWriteRequest, JpegCodec, BLOCK_ELEMS, QT_SLOTS,
};
use jpegturbo_core::error::{Error, Result};
use jpegturbo_core::format::{PixelFormat, Subsampling};
use jpegturbo_core::validate::EncodeGeometry;

/// The production [`JpegCodec`]: stateless, every call owns its own codec
/// structs, so concurrent calls never share anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct TurboCodec;

fn color_space(format: PixelFormat) -> J_COLOR_SPACE {
    match format {
        PixelFormat::Rgb => J_COLOR_SPACE::JCS_EXT_RGB,
        PixelFormat::Bgr => J_COLOR_SPACE::JCS_EXT_BGR,
        PixelFormat::Rgbx => J_COLOR_SPACE::JCS_EXT_RGBX,
        PixelFormat::Bgrx => J_COLOR_SPACE::JCS_EXT_BGRX,
        PixelFormat::Xbgr => J_COLOR_SPACE::JCS_EXT_XBGR,
        PixelFormat::Xrgb => J_COLOR_SPACE::JCS_EXT_XRGB,
        PixelFormat::Gray => J_COLOR_SPACE::JCS_GRAYSCALE,
        PixelFormat::Rgba => J_COLOR_SPACE::JCS_EXT_RGBA,
        PixelFormat::Bgra => J_COLOR_SPACE::JCS_EXT_BGRA,
        PixelFormat::Abgr => J_COLOR_SPACE::JCS_EXT_ABGR,
        PixelFormat::Argb => J_COLOR_SPACE::JCS_EXT_ARGB,
    }
}

/// `error_exit` replacement: libjpeg requires this hook to never return,
/// so unwind out of the C frames instead of exiting the process.
unsafe extern "C-unwind" fn error_exit_unwind(cinfo: &mut jpeg_common_struct) {
    let code = (*cinfo.err).msg_code;
    panic!("libjpeg fatal error (message code {code})");
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unidentified codec failure".to_string()
    }
}

/// Run a codec call sequence, converting `error_exit` unwinds into
/// [`Error::Codec`]. Guards inside the closure drop during the unwind, so
/// codec state is released on every path.
fn guarded<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(Error::Codec(panic_message(payload))),
    }
}

struct Decompressor {
    cinfo: Box<jpeg_decompress_struct>,
    // The codec stores a pointer to this; the box keeps it stable.
    _err: Box<jpeg_error_mgr>,
}

impl Decompressor {
    fn new() -> Self {
        unsafe {
            let mut err: Box<jpeg_error_mgr> = Box::new(std::mem::zeroed());
            let mut cinfo: Box<jpeg_decompress_struct> = Box::new(std::mem::zeroed());
            cinfo.common.err = jpeg_std_error(&mut err);
            err.error_exit = Some(error_exit_unwind);
            jpeg_CreateDecompress(
                &mut *cinfo,
                JPEG_LIB_VERSION as c_int,
                std::mem::size_of::<jpeg_decompress_struct>(),
            );
            Self { cinfo, _err: err }
        }
    }

    /// Feed the source buffer and parse the stream header.
    fn read_header(&mut self, src: &[u8]) -> &mut jpeg_decompress_struct {
        unsafe {
            jpeg_mem_src(&mut *self.cinfo, src.as_ptr(), src.len() as c_ulong);
            jpeg_read_header(&mut *self.cinfo, 1);
        }
        &mut self.cinfo
    }
}

impl Drop for Decompressor {
    fn drop(&mut self) {
        unsafe {
            jpeg_destroy_decompress(&mut *self.cinfo);
        }
    }
}

struct Compressor {
    cinfo: Box<jpeg_compress_struct>,
    _err: Box<jpeg_error_mgr>,
}

impl Compressor {
    fn new() -> Self {
        unsafe {
            let mut err: Box<jpeg_error_mgr> = Box::new(std::mem::zeroed());
            let mut cinfo: Box<jpeg_compress_struct> = Box::new(std::mem::zeroed());
            cinfo.common.err = jpeg_std_error(&mut err);
            err.error_exit = Some(error_exit_unwind);
            jpeg_CreateCompress(
                &mut *cinfo,
                JPEG_LIB_VERSION as c_int,
                std::mem::size_of::<jpeg_compress_struct>(),
            );
            Self { cinfo, _err: err }
        }
    }
}

impl Drop for Compressor {
    fn drop(&mut self) {
        unsafe {
            jpeg_destroy_compress(&mut *self.cinfo);
        }
    }
}

/// Fetch one row of coefficient blocks from a virtual array.
///
/// # Safety
///
/// `cinfo` must own `barray` and `row` must be inside the plane's block
/// grid.
unsafe fn access_blocks(
    cinfo: &mut jpeg_decompress_struct,
    barray: *mut mozjpeg_sys::jvirt_barray_control,
    row: u32,
    writable: bool,
) -> Result<mozjpeg_sys::JBLOCKROW> {
    let access = (*cinfo.common.mem)
        .access_virt_barray
        .ok_or_else(|| Error::Codec("codec has no virtual array accessor".to_string()))?;
    let rows = access(
        &mut cinfo.common,
        barray,
        row as JDIMENSION,
        1,
        writable as c_int,
    );
    if rows.is_null() {
        return Err(Error::Codec("virtual coefficient array access failed".to_string()));
    }
    Ok(*rows)
}

impl JpegCodec for TurboCodec {
    fn compress(&self, src: &[u8], dst: &mut [u8], geometry: &EncodeGeometry) -> Result<usize> {
        guarded(|| unsafe {
            let mut compressor = Compressor::new();
            let cinfo = &mut *compressor.cinfo;

            // Hand libjpeg the destination directly; it only reallocates if
            // the output outgrows it, which the computed bound rules out.
            let mut outbuffer: *mut u8 = dst.as_mut_ptr();
            let mut outsize: c_ulong = dst.len() as c_ulong;
            jpeg_mem_dest(cinfo, &mut outbuffer, &mut outsize);

            cinfo.image_width = geometry.width;
            cinfo.image_height = geometry.height;
            cinfo.input_components = geometry.format.bytes_per_pixel() as c_int;
            cinfo.in_color_space = color_space(geometry.format);
            jpeg_set_defaults(cinfo);

            if geometry.subsampling == Subsampling::Gray {
                jpeg_set_colorspace(cinfo, J_COLOR_SPACE::JCS_GRAYSCALE);
            } else {
                let (h, v) = geometry.subsampling.luma_sampling();
                let luma = &mut *cinfo.comp_info;
                luma.h_samp_factor = h as c_int;
                luma.v_samp_factor = v as c_int;
                for chroma in 1..cinfo.num_components as usize {
                    let info = &mut *cinfo.comp_info.add(chroma);
                    info.h_samp_factor = 1;
                    info.v_samp_factor = 1;
                }
            }
            if let Some(quality) = geometry.quality {
                jpeg_set_quality(cinfo, quality as c_int, 1);
            }

            jpeg_start_compress(cinfo, 1);
            while cinfo.next_scanline < cinfo.image_height {
                let offset = cinfo.next_scanline as usize * geometry.stride;
                let row: [*const u8; 1] = [src.as_ptr().add(offset)];
                jpeg_write_scanlines(cinfo, row.as_ptr() as *mut *const u8, 1);
            }
            jpeg_finish_compress(cinfo);

            let size = outsize as usize;
            if outbuffer != dst.as_mut_ptr() {
                // Reallocation path: copy back and release the codec's
                // buffer.
                let grown = outbuffer;
                let copy = size.min(dst.len());
                ptr::copy_nonoverlapping(grown, dst.as_mut_ptr(), copy);
                libc::free(grown as *mut libc::c_void);
                if size > dst.len() {
                    return Err(Error::Codec(format!(
                        "compressed output ({size} bytes) exceeded the computed bound"
                    )));
                }
            }
            Ok(size)
        })
    }

    fn decompress_header(&self, src: &[u8]) -> Result<(u32, u32)> {
        guarded(|| {
            let mut decompressor = Decompressor::new();
            let cinfo = decompressor.read_header(src);
            Ok((cinfo.image_width, cinfo.image_height))
        })
    }

    fn decompress(
        &self,
        src: &[u8],
        dst: &mut [u8],
        _width: u32,
        _height: u32,
        format: PixelFormat,
    ) -> Result<()> {
        guarded(|| unsafe {
            let mut decompressor = Decompressor::new();
            let cinfo = decompressor.read_header(src);
            cinfo.out_color_space = color_space(format);
            jpeg_start_decompress(cinfo);

            let stride = cinfo.output_width as usize * format.bytes_per_pixel();
            while cinfo.output_scanline < cinfo.output_height {
                let offset = cinfo.output_scanline as usize * stride;
                let row: [*mut u8; 1] = [dst.as_mut_ptr().add(offset)];
                jpeg_read_scanlines(cinfo, row.as_ptr() as *mut *mut u8, 1);
            }
            jpeg_finish_decompress(cinfo);
            Ok(())
        })
    }

    fn coef_layout(&self, src: &[u8]) -> Result<CoefLayout> {
        guarded(|| unsafe {
            let mut decompressor = Decompressor::new();
            let cinfo = decompressor.read_header(src);

            let mut planes = Vec::with_capacity(cinfo.num_components as usize);
            for component in 0..cinfo.num_components as usize {
                let info = &*cinfo.comp_info.add(component);
                planes.push(CoefPlaneLayout {
                    block_rows: info.height_in_blocks,
                    block_cols: info.width_in_blocks,
                    qt_no: info.quant_tbl_no as u8,
                });
            }
            let mut qt_present = [false; QT_SLOTS];
            for (slot, present) in qt_present.iter_mut().enumerate() {
                *present = !cinfo.quant_tbl_ptrs[slot].is_null();
            }
            Ok(CoefLayout { planes, qt_present })
        })
    }

    fn read_coefficients(&self, src: &[u8], dst: &mut [i16], layout: &CoefLayout) -> Result<()> {
        guarded(|| unsafe {
            let mut decompressor = Decompressor::new();
            let cinfo = decompressor.read_header(src);

            let coef_arrays = jpeg_read_coefficients(cinfo);
            if coef_arrays.is_null() {
                return Err(Error::Codec("coefficient read failed".to_string()));
            }

            for (index, plane) in layout.planes.iter().enumerate() {
                let out = &mut dst[layout.plane_range(index)];
                let mut written = 0;
                for row in 0..plane.block_rows {
                    let blocks = access_blocks(cinfo, *coef_arrays.add(index), row, false)?;
                    for col in 0..plane.block_cols as usize {
                        let block = &*blocks.add(col);
                        out[written..written + BLOCK_ELEMS].copy_from_slice(&block[..]);
                        written += BLOCK_ELEMS;
                    }
                }
            }

            for slot in 0..QT_SLOTS {
                if !layout.qt_present[slot] {
                    continue;
                }
                let table = cinfo.quant_tbl_ptrs[slot];
                if table.is_null() {
                    continue;
                }
                let out = &mut dst[layout.qt_range(slot)];
                for (element, value) in out.iter_mut().zip((*table).quantval.iter()) {
                    *element = *value as i16;
                }
            }

            jpeg_finish_decompress(cinfo);
            Ok(())
        })
    }

    fn write_coefficients(&self, src: &[u8], request: &CoefWriteRequest<'_>) -> Result<Vec<u8>> {
        guarded(|| unsafe {
            let mut decompressor = Decompressor::new();
            let srcinfo = decompressor.read_header(src);
            let coef_arrays = jpeg_read_coefficients(srcinfo);
            if coef_arrays.is_null() {
                return Err(Error::Codec("coefficient read failed".to_string()));
            }

            if request.planes.len() != srcinfo.num_components as usize {
                return Err(Error::Codec(format!(
                    "plane count {} does not match the {}-component stream",
                    request.planes.len(),
                    srcinfo.num_components
                )));
            }
            for (index, plane) in request.planes.iter().enumerate() {
                let info = &*srcinfo.comp_info.add(index);
                if plane.block_rows != info.height_in_blocks
                    || plane.block_cols != info.width_in_blocks
                {
                    return Err(Error::Codec(format!(
                        "plane {index} grid {}x{} does not match the stream's {}x{}",
                        plane.block_rows,
                        plane.block_cols,
                        info.height_in_blocks,
                        info.width_in_blocks
                    )));
                }

                let mut read = 0;
                for row in 0..plane.block_rows {
                    let blocks = access_blocks(srcinfo, *coef_arrays.add(index), row, true)?;
                    for col in 0..plane.block_cols as usize {
                        let block = &mut *blocks.add(col);
                        block.copy_from_slice(&plane.data[read..read + BLOCK_ELEMS]);
                        read += BLOCK_ELEMS;
                    }
                }
            }

            // Replace tables before jpeg_copy_critical_parameters clones
            // them into the compressor.
            for (slot, table) in request.qts.iter().enumerate() {
                if let Some(table) = table {
                    let target = srcinfo.quant_tbl_ptrs[slot];
                    if !target.is_null() {
                        (*target).quantval.copy_from_slice(table);
                    }
                }
            }

            let mut compressor = Compressor::new();
            let dstinfo = &mut *compressor.cinfo;
            let mut outbuffer: *mut u8 = ptr::null_mut();
            let mut outsize: c_ulong = 0;
            jpeg_mem_dest(dstinfo, &mut outbuffer, &mut outsize);
            jpeg_copy_critical_parameters(srcinfo, dstinfo);
            jpeg_write_coefficients(dstinfo, coef_arrays);
            jpeg_finish_compress(dstinfo);

            let mut out = Vec::with_capacity(outsize as usize);
            if !outbuffer.is_null() {
                out.extend_from_slice(std::slice::from_raw_parts(outbuffer, outsize as usize));
                libc::free(outbuffer as *mut libc::c_void);
            }
            jpeg_finish_decompress(srcinfo);
            Ok(out)
        })
    }
}
