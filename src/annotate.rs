//! Caption overlay for gallery images.
//!
//! The caption is drawn in white with a black outline, centred horizontally, with its baseline one
//! and a half font sizes above the bottom edge. The font size is a twentieth of the image width
//! and the outline is a fifteenth of the font size wide. The result is always a PNG.

use crate::error::{validation, ErrorType, IntoResult};
use crate::{utils, Result};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use anyhow::{anyhow, Context};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Bold sans-serif fonts tried, in order, when no font is given.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/System/Library/Fonts/Supplemental/Arial Bold.ttf",
    "/Library/Fonts/Arial Bold.ttf",
    "C:\\Windows\\Fonts\\arialbd.ttf",
];

/// Where and how large the caption is drawn on an image of a given size, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptionLayout {
    pub font_size: f32,
    pub outline: f32,
    pub center_x: f32,
    pub baseline_y: f32,
}

impl CaptionLayout {
    pub fn for_image(width: u32, height: u32) -> Self {
        let font_size = width as f32 / 20.0;
        Self {
            font_size,
            outline: font_size / 15.0,
            center_x: width as f32 / 2.0,
            baseline_y: height as f32 - font_size * 1.5,
        }
    }
}

/// Caption text together with the font it is drawn in.
pub struct Caption {
    text: String,
    font: FontVec,
}

impl Caption {
    pub fn new(text: impl Into<String>, font: FontVec) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }

    /// Loads the font at `font_path`, or the first installed font of `SYSTEM_FONTS`.
    ///
    /// # Errors
    /// - A `Config` error if no font is given and none of the system fonts is installed.
    /// - An `Io` error if the font file cannot be read.
    /// - A `Validation` error if the file is not a TrueType or OpenType font.
    pub async fn load(text: impl Into<String>, font_path: Option<&Path>) -> Result<Self> {
        let path = match font_path {
            Some(path) => path.to_path_buf(),
            None => system_font()
                .ok_or_else(|| anyhow!("No caption font is installed, pass one with --font"))
                .pub_result(ErrorType::Config)?,
        };
        debug!("Using the caption font {}", path.display());
        let bytes = utils::read_bytes(&path).await.pub_result(ErrorType::Io)?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| {
            validation(format!("'{}' is not a usable font: {e}", path.display()))
        })?;
        Ok(Self::new(text, font))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// The first installed font of `SYSTEM_FONTS`.
pub fn system_font() -> Option<PathBuf> {
    SYSTEM_FONTS.iter().map(PathBuf::from).find(|p| p.is_file())
}

/// Decodes `bytes`, draws `caption` over the image and returns it encoded as PNG. Without a
/// caption, or with a blank one, the image is only converted.
///
/// # Errors
/// A `Validation` error if `bytes` is not an image in a supported format.
pub fn annotate(bytes: &[u8], caption: Option<&Caption>) -> Result<Vec<u8>> {
    let mut canvas = image::load_from_memory(bytes)
        .map_err(|e| validation(format!("Unable to decode the image: {e}")))?
        .to_rgba8();
    if let Some(caption) = caption.filter(|c| !c.text.trim().is_empty()) {
        draw_caption(&mut canvas, &caption.text, &caption.font);
    }
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(canvas)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("Unable to encode the image as PNG")?;
    Ok(png)
}

fn draw_caption(canvas: &mut RgbaImage, text: &str, font: &impl Font) {
    let layout = CaptionLayout::for_image(canvas.width(), canvas.height());
    let scale = PxScale::from(layout.font_size);
    let (text_width, _) = text_size(scale, font, text);
    // draw_text_mut positions the top of the line, not the baseline
    let ascent = font.as_scaled(scale).ascent();
    let x = (layout.center_x - text_width as f32 / 2.0).round() as i32;
    let y = (layout.baseline_y - ascent).round() as i32;

    let radius = (layout.outline / 2.0).ceil().max(1.0) as i32;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx, dy) != (0, 0) && dx * dx + dy * dy <= radius * radius {
                draw_text_mut(canvas, OUTLINE, x + dx, y + dy, scale, font, text);
            }
        }
    }
    draw_text_mut(canvas, FILL, x, y, scale, font, text);
}
