use crate::foundation::{
    error::{ThumbError, ThumbResult},
    math::mul_div255,
};

pub(crate) type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for premultiplied pixels.
pub(crate) fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    if src[3] == 0 {
        return dst;
    }
    if src[3] == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(src[3]);
    let mut out = [0u8; 4];
    for i in 0..4 {
        out[i] = src[i].saturating_add(mul_div255(u16::from(dst[i]), inv));
    }
    out
}

pub(crate) fn over_in_place(dst: &mut [u8], src: &[u8]) -> ThumbResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(ThumbError::render(
            "over_in_place expects equal-length rgba8 buffers",
        ));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Placement of a smaller premultiplied buffer inside a larger one.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Region {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) width: u32,
    pub(crate) height: u32,
}

/// Composite `src` (sized `region.width x region.height`) over `dst` at `(region.x, region.y)`.
///
/// The region must lie fully inside `dst`.
pub(crate) fn over_region(
    dst: &mut [u8],
    dst_width: u32,
    dst_height: u32,
    src: &[u8],
    region: Region,
) -> ThumbResult<()> {
    if src.len() != region.width as usize * region.height as usize * 4 {
        return Err(ThumbError::render("region buffer does not match its size"));
    }
    if region.x + region.width > dst_width || region.y + region.height > dst_height {
        return Err(ThumbError::render("region exceeds destination bounds"));
    }
    if dst.len() != dst_width as usize * dst_height as usize * 4 {
        return Err(ThumbError::render("destination buffer does not match its size"));
    }

    let src_stride = region.width as usize * 4;
    let dst_stride = dst_width as usize * 4;
    for row in 0..region.height as usize {
        let s = &src[row * src_stride..(row + 1) * src_stride];
        let d0 = (region.y as usize + row) * dst_stride + region.x as usize * 4;
        let d = &mut dst[d0..d0 + src_stride];
        over_in_place(d, s)?;
    }
    Ok(())
}
