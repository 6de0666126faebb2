//! # Decoder Module
//!
//! Turns image files into RGB rasters for fingerprint extraction.
//!
//! The raster keeps the precision the file was stored with: 8-bit sources
//! stay 8-bit, anything deeper (16-bit PNG/TIFF, float formats) is held at
//! 16 bits and quantized later by the extractor.
//!
//! No global library initialization is involved; a decoder is an ordinary
//! value handed to whoever needs it.

mod fast_decode;

pub use fast_decode::{FastDecoder, ImageFormat};

use crate::error::DecodeError;
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use std::path::Path;

/// 16-bit RGB buffer
pub type Rgb16Image = ImageBuffer<Rgb<u16>, Vec<u16>>;

/// A decoded RGB raster
#[derive(Debug, Clone)]
pub enum RasterImage {
    /// 8 bits per channel
    Rgb8(RgbImage),
    /// 16 bits per channel
    Rgb16(Rgb16Image),
}

impl RasterImage {
    /// Convert a decoded image, keeping more than 8 bits of precision when present
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let color = image.color();
        let bytes_per_channel = color.bytes_per_pixel() / color.channel_count().max(1);
        if bytes_per_channel > 1 {
            RasterImage::Rgb16(image.into_rgb16())
        } else {
            RasterImage::Rgb8(image.into_rgb8())
        }
    }

    pub fn width(&self) -> u32 {
        match self {
            RasterImage::Rgb8(buffer) => buffer.width(),
            RasterImage::Rgb16(buffer) => buffer.width(),
        }
    }

    pub fn height(&self) -> u32 {
        match self {
            RasterImage::Rgb8(buffer) => buffer.height(),
            RasterImage::Rgb16(buffer) => buffer.height(),
        }
    }

    /// Bits per channel sample (8 or 16)
    pub fn bit_depth(&self) -> u8 {
        match self {
            RasterImage::Rgb8(_) => 8,
            RasterImage::Rgb16(_) => 16,
        }
    }

    /// Channel samples of one pixel at the raster's native depth
    pub fn pixel(&self, x: u32, y: u32) -> [u16; 3] {
        match self {
            RasterImage::Rgb8(buffer) => {
                let Rgb([r, g, b]) = *buffer.get_pixel(x, y);
                [r as u16, g as u16, b as u16]
            }
            RasterImage::Rgb16(buffer) => buffer.get_pixel(x, y).0,
        }
    }

    /// Per-channel sums over the half-open region `[x0, x1) x [y0, y1)`.
    pub fn channel_sums(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> [u64; 3] {
        let mut sums = [0u64; 3];
        for y in y0..y1 {
            for x in x0..x1 {
                let [r, g, b] = self.pixel(x, y);
                sums[0] += r as u64;
                sums[1] += g as u64;
                sums[2] += b as u64;
            }
        }
        sums
    }
}

impl From<RgbImage> for RasterImage {
    fn from(buffer: RgbImage) -> Self {
        RasterImage::Rgb8(buffer)
    }
}

impl From<Rgb16Image> for RasterImage {
    fn from(buffer: Rgb16Image) -> Self {
        RasterImage::Rgb16(buffer)
    }
}

/// Decodes image files into rasters
///
/// Implement this trait to plug in another image library.
pub trait ImageDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<RasterImage, DecodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_bit_images_stay_eight_bit() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(2, 2, Rgb([1, 2, 3])));
        let raster = RasterImage::from_dynamic(image);

        assert_eq!(raster.bit_depth(), 8);
        assert_eq!(raster.pixel(1, 1), [1, 2, 3]);
    }

    #[test]
    fn sixteen_bit_images_keep_precision() {
        let buffer = Rgb16Image::from_pixel(2, 2, Rgb([1000, 20000, 65535]));
        let raster = RasterImage::from_dynamic(DynamicImage::ImageRgb16(buffer));

        assert_eq!(raster.bit_depth(), 16);
        assert_eq!(raster.pixel(0, 0), [1000, 20000, 65535]);
    }

    #[test]
    fn grayscale_expands_to_rgb() {
        let gray = image::GrayImage::from_pixel(3, 1, image::Luma([42]));
        let raster = RasterImage::from_dynamic(DynamicImage::ImageLuma8(gray));

        assert_eq!(raster.pixel(2, 0), [42, 42, 42]);
    }

    #[test]
    fn channel_sums_cover_half_open_region() {
        let buffer = RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8, y as u8, 1]));
        let raster = RasterImage::from(buffer);

        // x in {1, 2}, y in {0}
        assert_eq!(raster.channel_sums(1, 0, 3, 1), [3, 0, 2]);
    }
}
