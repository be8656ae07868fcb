use image::{imageops, imageops::FilterType, GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::f32::consts::PI;
use tracing::warn;

use super::Sample;
use crate::mood::SKETCH_SIZE;

/// Datasets smaller than this get augmented.
pub const AUGMENT_TARGET: usize = 200;

const MAX_ROTATION_DEG: f32 = 15.0;
const MIN_ZOOM: f32 = 0.9;
const MAX_ZOOM: f32 = 1.1;
const FLIP_PROBABILITY: f64 = 0.5;
const NOISE_SIGMA: f32 = 0.02;
const WHITE: Luma<u8> = Luma([255]);

/// Variants to add per original sample, if a dataset of `n` samples needs
/// augmenting at all.
pub fn augment_factor(n: usize) -> Option<usize> {
    if n == 0 || n >= AUGMENT_TARGET {
        return None;
    }
    Some((AUGMENT_TARGET / n).max(1))
}

fn to_image(sample: &Sample) -> Option<GrayImage> {
    let bytes = sample
        .pixels
        .iter()
        .map(|&p| (p.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    GrayImage::from_raw(SKETCH_SIZE, SKETCH_SIZE, bytes)
}

/// Scales around the center, cropping when enlarged and padding with white
/// when shrunk.
fn zoom(image: &GrayImage, factor: f32) -> GrayImage {
    let side = ((SKETCH_SIZE as f32 * factor).round() as u32).max(1);
    if side == SKETCH_SIZE {
        return image.clone();
    }
    let scaled = imageops::resize(image, side, side, FilterType::Triangle);
    if side > SKETCH_SIZE {
        let offset = (side - SKETCH_SIZE) / 2;
        imageops::crop_imm(&scaled, offset, offset, SKETCH_SIZE, SKETCH_SIZE).to_image()
    } else {
        let mut canvas = GrayImage::from_pixel(SKETCH_SIZE, SKETCH_SIZE, WHITE);
        let offset = ((SKETCH_SIZE - side) / 2) as i64;
        imageops::overlay(&mut canvas, &scaled, offset, offset);
        canvas
    }
}

fn variant<R: Rng + ?Sized>(image: &GrayImage, rng: &mut R) -> Vec<f32> {
    let angle = rng.random_range(-MAX_ROTATION_DEG..=MAX_ROTATION_DEG) * PI / 180.0;
    let rotated = rotate_about_center(image, angle, Interpolation::Bilinear, WHITE);
    let mut zoomed = zoom(&rotated, rng.random_range(MIN_ZOOM..=MAX_ZOOM));
    if rng.random_bool(FLIP_PROBABILITY) {
        zoomed = imageops::flip_horizontal(&zoomed);
    }
    zoomed
        .as_raw()
        .iter()
        .map(|&p| {
            let noise: f32 = StandardNormal.sample(rng);
            (p as f32 / 255.0 + noise * NOISE_SIGMA).clamp(0.0, 1.0)
        })
        .collect()
}

/// Returns the originals followed by `factor` randomized variants of each.
pub fn augment<R: Rng + ?Sized>(samples: &[Sample], factor: usize, rng: &mut R) -> Vec<Sample> {
    let mut augmented = samples.to_vec();
    augmented.reserve(samples.len() * factor);
    for sample in samples {
        let Some(image) = to_image(sample) else {
            warn!(
                "Not augmenting sample with {} pixels, expected {}",
                sample.pixels.len(),
                SKETCH_SIZE * SKETCH_SIZE
            );
            continue;
        };
        for _ in 0..factor {
            augmented.push(Sample {
                pixels: variant(&image, rng),
                label: sample.label,
            });
        }
    }
    augmented
}
