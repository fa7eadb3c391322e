//! Decoding and aspect-preserving scaling of cover images.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

/// Width/height pair in pixels.
///
/// A zero dimension means "unconstrained" when used as a requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const ZERO: Size = Size::new(0, 0);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes needed to hold this many RGBA pixels
    pub fn rgba_bytes(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height) * 4
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = String;

    /// Parse `WIDTHxHEIGHT`, e.g. `100x100`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width = w.trim().parse().map_err(|e| format!("bad width {w:?}: {e}"))?;
        let height = h.trim().parse().map_err(|e| format!("bad height {h:?}: {e}"))?;
        Ok(Size::new(width, height))
    }
}

/// How a decoded cover is fitted to the requested size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Keep aspect ratio and grow until the requested box is covered.
    /// One dimension matches the request, the other overflows it.
    #[default]
    Expand,
    /// Like `Expand`, then crop the overflow around the center so the
    /// result is exactly the requested size.
    Fill,
}

/// A decoded, scaled cover ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverImage {
    pixels: RgbaImage,
}

impl CoverImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Raw RGBA8 pixel data, row-major
    pub fn as_raw(&self) -> &[u8] {
        self.pixels.as_raw()
    }

    /// Memory held by the pixel buffer
    pub fn byte_len(&self) -> usize {
        self.pixels.as_raw().len()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Encode as PNG
    pub fn to_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut out = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;
        Ok(out)
    }

    /// Save to disk, format chosen by extension
    pub fn save(&self, path: &Path) -> Result<(), image::ImageError> {
        self.pixels.save(path)
    }
}

/// Size an image of `source` dimensions should be scaled to for `target`.
///
/// Integer arithmetic truncates, so in `Expand` the overflowing dimension
/// never ends up smaller than requested.
pub fn expanded_size(source: Size, target: Size) -> Size {
    if source.is_empty() || target == Size::ZERO {
        return source;
    }

    let (sw, sh) = (u64::from(source.width), u64::from(source.height));
    let (tw, th) = (u64::from(target.width), u64::from(target.height));

    let (w, h) = if tw == 0 {
        (th * sw / sh, th)
    } else if th == 0 {
        (tw, tw * sh / sw)
    } else {
        let width_for_height = th * sw / sh;
        if width_for_height >= tw {
            (width_for_height, th)
        } else {
            (tw, tw * sh / sw)
        }
    };

    Size::new(clamp_dimension(w), clamp_dimension(h))
}

fn clamp_dimension(value: u64) -> u32 {
    value.clamp(1, u64::from(u32::MAX)) as u32
}

/// Decode raw cover bytes, sniffing the format from the content.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Scale a decoded image to `target` with smooth resampling.
pub fn scale(image: DynamicImage, target: Size, mode: ScaleMode) -> CoverImage {
    let (width, height) = image.dimensions();
    let source = Size::new(width, height);
    let scaled_size = expanded_size(source, target);

    let scaled = if scaled_size == source {
        image.into_rgba8()
    } else {
        image
            .resize_exact(scaled_size.width, scaled_size.height, FilterType::Lanczos3)
            .into_rgba8()
    };

    let pixels = match mode {
        ScaleMode::Fill if !target.is_empty() && scaled_size != target => {
            let x = (scaled_size.width - target.width.min(scaled_size.width)) / 2;
            let y = (scaled_size.height - target.height.min(scaled_size.height)) / 2;
            imageops::crop_imm(&scaled, x, y, target.width, target.height).to_image()
        }
        _ => scaled,
    };

    CoverImage::from_rgba(pixels)
}

/// Decode and scale in one go. CPU bound; run off the async executor.
pub fn decode_and_scale(
    bytes: &[u8],
    target: Size,
    mode: ScaleMode,
) -> Result<CoverImage, image::ImageError> {
    decode(bytes).map(|image| scale(image, target, mode))
}
