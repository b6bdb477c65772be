//! Test fixtures: encoded images and tus metadata.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Encode a gradient image of the given dimensions.
pub fn create_test_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 5 % 256) as u8, (y * 3 % 256) as u8, ((x ^ y) % 256) as u8])
    });
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .expect("encode test image");
    buffer
}

pub fn create_test_png(width: u32, height: u32) -> Vec<u8> {
    create_test_image(width, height, ImageFormat::Png)
}

/// Bytes that pass no image signature check.
pub fn create_text_file() -> Vec<u8> {
    b"hull inspection notes, not an image\n".repeat(16)
}

/// Build an `Upload-Metadata` header value from plain key/value pairs.
pub fn upload_metadata(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{} {}", key, STANDARD.encode(value)))
        .collect::<Vec<_>>()
        .join(",")
}
