use std::sync::Arc;

use crate::{
    assets::datauri::ImageSource,
    foundation::error::{ThumbError, ThumbResult},
};

/// Decoded raster image in premultiplied RGBA8 form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, tightly packed, premultiplied.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl DecodedImage {
    /// Build from straight RGBA8 pixels (premultiplies in place).
    pub fn from_straight_rgba8(width: u32, height: u32, mut rgba: Vec<u8>) -> ThumbResult<Self> {
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(ThumbError::decode("rgba buffer length mismatch"));
        }
        premultiply_rgba8_in_place(&mut rgba);
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba),
        })
    }
}

/// Decode encoded image bytes and convert to premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> ThumbResult<DecodedImage> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ThumbError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(ThumbError::decode("image has zero area"));
    }
    DecodedImage::from_straight_rgba8(width, height, rgba.into_raw())
}

/// Decode the pixels behind an [`ImageSource`] data URI.
pub fn decode_source(source: &ImageSource) -> ThumbResult<DecodedImage> {
    let uri = source.parse()?;
    decode_image(&uri.bytes)
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
