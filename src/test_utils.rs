//! Test utilities and fixtures for podcover tests.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{key_in, png_bytes};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let temp = TempDir::new().unwrap();
//!     let key = key_in(&temp, "cover", "http://a/c.png", "");
//!     std::fs::write(&key.local_path, png_bytes(16, 9)).unwrap();
//!     // ... test logic
//! }
//! ```

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

use crate::cover::RequestKey;

/// Encodes a `width`x`height` PNG with a diagonal gradient.
///
/// Not a flat color, so resampling bugs show up in pixel comparisons.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        Rgba([r, g, 128, 255])
    });

    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("PNG encoding of a test image");
    out.into_inner()
}

/// Request key whose cache file `name` lives in `dir`.
pub fn key_in(dir: &TempDir, name: &str, cover_url: &str, page_url: &str) -> RequestKey {
    RequestKey::new(dir.path().join(name), cover_url, page_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_fixture_decodes() {
        let image = image::load_from_memory(&png_bytes(12, 7)).unwrap();
        assert_eq!((image.width(), image.height()), (12, 7));
    }

    #[test]
    fn test_key_in_temp_dir() {
        let temp = TempDir::new().unwrap();
        let key = key_in(&temp, "c", "http://a/c.png", "");
        assert!(key.local_path.starts_with(temp.path()));
        assert_eq!(key.cover_url, "http://a/c.png");
    }
}
