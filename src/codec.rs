//! PNG payload decoding and encoding.
//!
//! Frames travel through the pipes as complete PNG files. Decoding turns a
//! payload located by the [`FrameScanner`](crate::FrameScanner) into a
//! [`DynamicImage`]; encoding produces a payload with the same start and end
//! markers, ready for an `image2pipe` consumer. PNG is lossless, so encoding a
//! frame and decoding the result gives back the same pixels.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::configuration::PixelFormat;
use crate::error::FramePipeError;

/// Decode one PNG payload and convert it to `pixel_format`.
pub fn decode_frame(
    payload: &[u8],
    pixel_format: PixelFormat,
) -> Result<DynamicImage, image::ImageError> {
    let image = image::load_from_memory_with_format(payload, ImageFormat::Png)?;
    Ok(pixel_format.convert(image))
}

/// Encode an image as a self-delimited PNG payload.
///
/// Floating-point images are narrowed to 8 bits per channel first, since
/// PNG cannot store them.
pub fn encode_frame(image: &DynamicImage) -> Result<Vec<u8>, FramePipeError> {
    let narrowed;
    let image = match image {
        DynamicImage::ImageRgb32F(_) => {
            narrowed = DynamicImage::ImageRgb8(image.to_rgb8());
            &narrowed
        }
        DynamicImage::ImageRgba32F(_) => {
            narrowed = DynamicImage::ImageRgba8(image.to_rgba8());
            &narrowed
        }
        other => other,
    };

    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|error| FramePipeError::FrameEncode(error.to_string()))?;
    Ok(bytes)
}

/// Swap the red and blue channels of a colour image.
///
/// Grayscale images are returned unchanged. Used to hand frames to or from
/// code that stores pixels in BGR order.
pub fn swap_red_blue(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageRgb8(mut buffer) => {
            buffer.pixels_mut().for_each(|pixel| pixel.0.swap(0, 2));
            DynamicImage::ImageRgb8(buffer)
        }
        DynamicImage::ImageRgba8(mut buffer) => {
            buffer.pixels_mut().for_each(|pixel| pixel.0.swap(0, 2));
            DynamicImage::ImageRgba8(buffer)
        }
        DynamicImage::ImageRgb16(mut buffer) => {
            buffer.pixels_mut().for_each(|pixel| pixel.0.swap(0, 2));
            DynamicImage::ImageRgb16(buffer)
        }
        DynamicImage::ImageRgba16(mut buffer) => {
            buffer.pixels_mut().for_each(|pixel| pixel.0.swap(0, 2));
            DynamicImage::ImageRgba16(buffer)
        }
        gray @ (DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageLumaA16(_)) => gray,
        other => swap_red_blue(DynamicImage::ImageRgba8(other.to_rgba8())),
    }
}
