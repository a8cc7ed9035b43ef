use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageResult, RgbaImage};

/// Encodes a frame as JPEG. Alpha is dropped since JPEG has no alpha channel.
pub fn encode_jpeg(frame: &RgbaImage, quality: u8) -> ImageResult<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(frame.clone()).to_rgb8();
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
    encoder.encode_image(&rgb)?;
    Ok(bytes)
}
