//! Decoding of submitted sketches and their reduction to the 64x64
//! grayscale input every classifier works on.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{imageops::FilterType, DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use thiserror::Error;

/// Side of the square grayscale image classifiers consume.
pub const SKETCH_SIZE: u32 = 64;

#[derive(Debug, Error)]
pub enum SketchError {
    #[error("no image received")]
    MissingImage,

    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("payload is not an image")]
    NotAnImage,

    #[error("could not decode image: {0}")]
    InvalidImage(#[from] image::ImageError),
}

/// Raw bytes of an uploaded sketch and the file extension matching its
/// sniffed format.
#[derive(Debug, Clone)]
pub struct SketchUpload {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

pub fn decode_data_url(data: &str) -> Result<SketchUpload, SketchError> {
    let payload = match data.split_once(',') {
        Some((_header, encoded)) => encoded,
        None => data,
    };
    let cleaned: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if cleaned.is_empty() {
        return Err(SketchError::MissingImage);
    }

    let bytes = STANDARD.decode(cleaned.as_bytes())?;
    let kind = infer::get(&bytes)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .ok_or(SketchError::NotAnImage)?;

    Ok(SketchUpload {
        bytes,
        extension: kind.extension(),
    })
}

pub fn preprocess(bytes: &[u8]) -> Result<GrayImage, SketchError> {
    let decoded = image::load_from_memory(bytes)?;
    let flattened = DynamicImage::ImageRgb8(flatten_on_white(&decoded));
    let fitted = flattened.resize_to_fill(SKETCH_SIZE, SKETCH_SIZE, FilterType::CatmullRom);
    Ok(to_luminance(&fitted.to_rgb8()))
}

/// Alpha-composites the image over an opaque white background.
pub fn flatten_on_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        let blend = |c: u8| ((c as u32 * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        out.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

/// ITU-R 601-2 luma transform in 16 bit fixed point.
pub fn to_luminance(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let luma = (r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16;
        Luma([luma as u8])
    })
}
