//! Simple generated doodles, one shape family per mood, for bootstrapping a
//! dataset before real drawings are collected.

use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{
        draw_filled_circle_mut, draw_filled_ellipse_mut, draw_hollow_ellipse_mut,
        draw_line_segment_mut, draw_polygon_mut,
    },
    geometric_transformations::{rotate_about_center, Interpolation},
    point::Point,
};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use std::{f32::consts::PI, path::Path};
use tracing::info;

use super::{create_structure, DatasetError};
use crate::mood::{MoodCounts, MoodLabel};

pub const SYNTHETIC_SIZE: u32 = 64;

const MAX_ROTATION_DEG: f32 = 10.0;
const NOISE_SIGMA: f64 = 5.0;
const ARC_STEPS: usize = 48;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

const LIGHTNING: [(i32, i32); 8] = [
    (25, 5),
    (35, 5),
    (20, 35),
    (30, 35),
    (15, 60),
    (40, 25),
    (30, 25),
    (45, 5),
];

/// Elliptical arc between two angles in degrees, measured clockwise from
/// the positive x axis (image y grows downwards).
fn draw_arc(
    canvas: &mut RgbImage,
    center: (f32, f32),
    radii: (f32, f32),
    degrees: (f32, f32),
    color: Rgb<u8>,
) {
    let (start, end) = (degrees.0.to_radians(), degrees.1.to_radians());
    let point = |t: f32| {
        (
            center.0 + radii.0 * t.cos(),
            center.1 + radii.1 * t.sin(),
        )
    };
    let mut previous = point(start);
    for step in 1..=ARC_STEPS {
        let current = point(start + (end - start) * step as f32 / ARC_STEPS as f32);
        draw_line_segment_mut(canvas, previous, current, color);
        previous = current;
    }
}

fn draw_thick_arc(
    canvas: &mut RgbImage,
    center: (f32, f32),
    radii: (f32, f32),
    degrees: (f32, f32),
) {
    draw_arc(canvas, center, radii, degrees, BLACK);
    draw_arc(canvas, center, (radii.0 - 1.0, radii.1 - 1.0), degrees, BLACK);
}

fn draw_face(canvas: &mut RgbImage) {
    draw_hollow_ellipse_mut(canvas, (32, 32), 22, 22, BLACK);
    draw_hollow_ellipse_mut(canvas, (32, 32), 21, 21, BLACK);
    draw_filled_circle_mut(canvas, (22, 22), 2, BLACK);
    draw_filled_circle_mut(canvas, (41, 22), 2, BLACK);
}

/// The undistorted doodle for a mood. Calm waves jitter, every other shape
/// is fixed.
pub fn render_doodle<R: Rng + ?Sized>(mood: MoodLabel, rng: &mut R) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(SYNTHETIC_SIZE, SYNTHETIC_SIZE, WHITE);
    match mood {
        MoodLabel::Happy => {
            draw_face(&mut canvas);
            draw_thick_arc(&mut canvas, (32.0, 35.0), (12.0, 10.0), (0.0, 180.0));
        }
        MoodLabel::Calm => {
            for y in (20..50).step_by(8) {
                for x in (0..SYNTHETIC_SIZE as i32).step_by(4) {
                    let jitter = rng.random_range(-2..=2);
                    draw_filled_circle_mut(&mut canvas, (x + 1, y + jitter + 1), 1, BLACK);
                }
            }
        }
        MoodLabel::Sad => {
            draw_face(&mut canvas);
            draw_thick_arc(&mut canvas, (32.0, 45.0), (12.0, 10.0), (180.0, 360.0));
            draw_filled_ellipse_mut(&mut canvas, (20, 35), 2, 5, BLUE);
        }
        MoodLabel::Energetic => {
            let points: Vec<Point<i32>> =
                LIGHTNING.iter().map(|&(x, y)| Point::new(x, y)).collect();
            draw_polygon_mut(&mut canvas, &points, BLACK);
        }
    }
    canvas
}

/// Random rotation over white plus per-channel Gaussian noise.
fn distort<R: Rng + ?Sized>(doodle: &RgbImage, rng: &mut R) -> RgbImage {
    let angle = rng.random_range(-MAX_ROTATION_DEG..=MAX_ROTATION_DEG) * PI / 180.0;
    let mut rotated = rotate_about_center(doodle, angle, Interpolation::Bilinear, WHITE);
    for pixel in rotated.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let noise: f64 = StandardNormal.sample(rng);
            *channel = (*channel as f64 + noise * NOISE_SIGMA).clamp(0.0, 255.0) as u8;
        }
    }
    rotated
}

/// Writes `samples_per_mood` distorted doodles per mood as
/// `<root>/<mood>/synthetic_<mood>_<NNN>.png`.
pub fn generate_synthetic<R: Rng + ?Sized>(
    root: &Path,
    samples_per_mood: usize,
    rng: &mut R,
) -> Result<MoodCounts, DatasetError> {
    create_structure(root)?;
    let mut counts = MoodCounts::default();
    for mood in MoodLabel::ALL {
        let dir = root.join(mood.as_str());
        for i in 0..samples_per_mood {
            let doodle = distort(&render_doodle(mood, rng), rng);
            doodle.save(dir.join(format!("synthetic_{}_{:03}.png", mood, i)))?;
            counts.increment(mood);
        }
        info!("Saved {} {} doodles to {:?}", samples_per_mood, mood, dir);
    }
    Ok(counts)
}
