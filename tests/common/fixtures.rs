//! Sketch fixtures and temporary server directories.

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

use super::constants::SKETCH_CANVAS_SIZE;

const APP_JS: &str = include_str!("../../static/js/app.js");

/// Directories a test server runs against, removed on drop.
pub struct TestDirs {
    pub temp_dir: TempDir,
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub static_dir: PathBuf,
}

pub fn create_test_dirs() -> anyhow::Result<TestDirs> {
    let temp_dir = TempDir::new()?;
    let uploads_dir = temp_dir.path().join("uploads");
    let static_dir = temp_dir.path().join("static");
    fs::create_dir_all(&uploads_dir)?;
    fs::create_dir_all(static_dir.join("js"))?;
    fs::write(static_dir.join("js").join("app.js"), APP_JS)?;
    Ok(TestDirs {
        db_path: temp_dir.path().join("mood_app.db"),
        uploads_dir,
        static_dir,
        temp_dir,
    })
}

/// PNG data URL of a canvas filled with one color.
pub fn sketch_data_url(color: [u8; 4]) -> String {
    let image = RgbaImage::from_pixel(SKETCH_CANVAS_SIZE, SKETCH_CANVAS_SIZE, Rgba(color));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode fixture sketch");
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

pub fn white_sketch() -> String {
    sketch_data_url([255, 255, 255, 255])
}

pub fn black_sketch() -> String {
    sketch_data_url([0, 0, 0, 255])
}

/// An untouched canvas: fully transparent, read as white.
pub fn transparent_sketch() -> String {
    sketch_data_url([0, 0, 0, 0])
}
