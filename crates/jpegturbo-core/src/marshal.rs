//! The DCT view marshaller.
//!
//! Round-trips coefficient data between a flat backing buffer (what the
//! codec produces and consumes) and per-plane strided views, without
//! copying in either direction.
//!
//! Read direction: [`dct_view`] interprets a backing slice per a
//! [`CoefLayout`] as one 4-D `[block_rows, block_cols, 8, 8]` view per
//! plane plus 8x8 quantization table views, all aliasing the backing
//! slice. Write direction: [`write_request`] validates every view's shape
//! and strides and extracts plane/table slice references for the codec -
//! offsets only, no data movement. Views with non-canonical strides (from
//! slicing or transposing) are rejected, because the codec requires
//! contiguous planar layout.

use ndarray::{ArrayView2, ArrayView4};

use crate::codec::{CoefLayout, CoefPlane, CoefWriteRequest, BLOCK, QT_SLOTS};
use crate::error::{Error, Result};

/// One coefficient plane: a non-owning 4-D view over the backing buffer
/// plus the quantization table slot it references.
#[derive(Debug, Clone, Copy)]
pub struct DctComponent<'a> {
    /// Coefficients with shape `[block_rows, block_cols, 8, 8]`.
    pub data: ArrayView4<'a, i16>,
    /// Index of the quantization table this plane uses.
    pub qt_no: u8,
}

/// Structured view of one image's coefficient data. All views alias a
/// single backing buffer and must not outlive it; the borrow checker
/// enforces exactly that.
#[derive(Debug, Clone)]
pub struct DctData<'a> {
    /// Luma plane, always present.
    pub y: DctComponent<'a>,
    /// Blue-difference chroma; absent for grayscale images.
    pub cb: Option<DctComponent<'a>>,
    /// Red-difference chroma; absent for grayscale images.
    pub cr: Option<DctComponent<'a>>,
    /// Key plane of four-plane (CMYK-style) images.
    pub k: Option<DctComponent<'a>>,
    /// Quantization table slots; unused slots are `None`, not zero-filled
    /// tables.
    pub qts: [Option<ArrayView2<'a, u16>>; QT_SLOTS],
}

impl<'a> DctData<'a> {
    /// Present planes in component order (Y, Cb, Cr, K).
    pub fn planes(&self) -> impl Iterator<Item = &DctComponent<'a>> {
        std::iter::once(&self.y)
            .chain(self.cb.as_ref())
            .chain(self.cr.as_ref())
            .chain(self.k.as_ref())
    }
}

/// Owned coefficient dump: the backing buffer plus its layout. Produced by
/// the owned read path and consumed by the owned write path; [`Self::view`]
/// derives the structured representation bound to `self`.
#[derive(Debug, Clone)]
pub struct DctBuffer {
    elems: Vec<i16>,
    layout: CoefLayout,
}

impl DctBuffer {
    /// Wrap a filled backing buffer. The buffer length must match the
    /// layout exactly.
    pub fn new(elems: Vec<i16>, layout: CoefLayout) -> Result<Self> {
        layout.check_plane_count()?;
        if elems.len() != layout.total_elements() {
            return Err(Error::Codec(format!(
                "coefficient buffer length {} does not match layout ({} elements)",
                elems.len(),
                layout.total_elements()
            )));
        }
        Ok(Self { elems, layout })
    }

    pub fn layout(&self) -> &CoefLayout {
        &self.layout
    }

    /// Raw backing elements, planes then quantization table slots.
    pub fn elements(&self) -> &[i16] {
        &self.elems
    }

    /// Mutable access to the backing elements, for editing coefficients in
    /// place before a write.
    pub fn elements_mut(&mut self) -> &mut [i16] {
        &mut self.elems
    }

    /// Structured per-plane view over this buffer.
    pub fn view(&self) -> Result<DctData<'_>> {
        dct_view(&self.elems, &self.layout)
    }
}

fn plane_view<'a>(
    backing: &'a [i16],
    layout: &CoefLayout,
    index: usize,
) -> Result<DctComponent<'a>> {
    let plane = &layout.planes[index];
    let range = layout.plane_range(index);
    let slice = backing
        .get(range)
        .ok_or_else(|| Error::Codec("coefficient layout exceeds backing buffer".to_string()))?;
    let shape = (
        plane.block_rows as usize,
        plane.block_cols as usize,
        BLOCK,
        BLOCK,
    );
    let data = ArrayView4::from_shape(shape, slice)
        .map_err(|e| Error::Codec(format!("coefficient plane shape mismatch: {e}")))?;
    if plane.qt_no as usize >= QT_SLOTS || !layout.qt_present[plane.qt_no as usize] {
        return Err(Error::Codec(format!(
            "component references absent quantization table {}",
            plane.qt_no
        )));
    }
    Ok(DctComponent {
        data,
        qt_no: plane.qt_no,
    })
}

/// Read direction: build the structured, zero-copy view of `backing`
/// described by `layout`. `backing` must hold exactly
/// `layout.total_elements()` elements.
pub fn dct_view<'a>(backing: &'a [i16], layout: &CoefLayout) -> Result<DctData<'a>> {
    layout.check_plane_count()?;

    let y = plane_view(backing, layout, 0)?;
    let (cb, cr) = if layout.planes.len() >= 3 {
        (
            Some(plane_view(backing, layout, 1)?),
            Some(plane_view(backing, layout, 2)?),
        )
    } else {
        (None, None)
    };
    let k = if layout.planes.len() == 4 {
        Some(plane_view(backing, layout, 3)?)
    } else {
        None
    };

    let mut qts: [Option<ArrayView2<'a, u16>>; QT_SLOTS] = [None; QT_SLOTS];
    for (slot, qt) in qts.iter_mut().enumerate() {
        if !layout.qt_present[slot] {
            continue;
        }
        let range = layout.qt_range(slot);
        let slice = backing
            .get(range)
            .ok_or_else(|| Error::Codec("coefficient layout exceeds backing buffer".to_string()))?;
        let table = ArrayView2::from_shape((BLOCK, BLOCK), bytemuck::cast_slice(slice))
            .map_err(|e| Error::Codec(format!("quantization table shape mismatch: {e}")))?;
        *qt = Some(table);
    }

    Ok(DctData { y, cb, cr, k, qts })
}

/// Canonical C-order strides for a `[rows, cols, 8, 8]` coefficient view.
fn canonical_plane_strides(cols: usize) -> [isize; 4] {
    [
        (cols * BLOCK * BLOCK) as isize,
        (BLOCK * BLOCK) as isize,
        BLOCK as isize,
        1,
    ]
}

fn plane_slice<'a>(component: &DctComponent<'a>) -> Result<CoefPlane<'a>> {
    let shape = component.data.shape();
    if shape[2] != BLOCK || shape[3] != BLOCK {
        return Err(Error::InvalidComponentShape);
    }
    if component.data.strides() != canonical_plane_strides(shape[1]) {
        return Err(Error::InvalidComponentStride);
    }
    // Canonical strides imply standard layout.
    let data = component
        .data
        .to_slice()
        .ok_or(Error::InvalidComponentStride)?;
    Ok(CoefPlane {
        data,
        block_rows: shape[0] as u32,
        block_cols: shape[1] as u32,
        qt_no: component.qt_no,
    })
}

fn qt_slice<'a>(table: &ArrayView2<'a, u16>) -> Result<&'a [u16]> {
    if table.shape() != [BLOCK, BLOCK] {
        return Err(Error::InvalidComponentShape);
    }
    if table.strides() != [BLOCK as isize, 1] {
        return Err(Error::InvalidComponentStride);
    }
    table.to_slice().ok_or(Error::InvalidComponentStride)
}

/// Write direction: validate every view and assemble the flat descriptor
/// set for the codec. Only offsets and references are computed; the codec
/// reads directly from the caller's backing buffers.
pub fn write_request<'a>(dct: &DctData<'a>) -> Result<CoefWriteRequest<'a>> {
    let mut planes = Vec::with_capacity(4);
    for component in dct.planes() {
        planes.push(plane_slice(component)?);
    }

    let mut qts: [Option<&'a [u16]>; QT_SLOTS] = [None; QT_SLOTS];
    for (slot, table) in dct.qts.iter().enumerate() {
        if let Some(table) = table {
            qts[slot] = Some(qt_slice(table)?);
        }
    }

    Ok(CoefWriteRequest { planes, qts })
}

/// Reinterpret the head of a caller-supplied byte destination as the i16
/// backing buffer for a coefficient read. The destination's size must
/// already be validated; misaligned buffers are unusable as element
/// storage.
pub fn cast_destination(dst: &mut [u8], needed_bytes: usize) -> Result<&mut [i16]> {
    let head = dst
        .get_mut(..needed_bytes)
        .ok_or(Error::InvalidDestinationBuffer)?;
    bytemuck::try_cast_slice_mut(head).map_err(|_| Error::InvalidDestinationBuffer)
}
