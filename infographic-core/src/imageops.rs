//! Product image preprocessing and photo effects.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::Color;

/// Composite `img` onto an opaque `background`, dropping its alpha channel.
pub fn fill_transparency(img: &DynamicImage, background: Color) -> DynamicImage {
    let rgba = img.to_rgba8();
    let mut out = image::RgbImage::new(rgba.width(), rgba.height());
    let bg = [background.r, background.g, background.b];
    for (dst, src) in out.pixels_mut().zip(rgba.pixels()) {
        let a = src[3] as f32 / 255.0;
        for i in 0..3 {
            dst[i] = (src[i] as f32 * a + bg[i] as f32 * (1.0 - a)).round() as u8;
        }
    }
    DynamicImage::ImageRgb8(out)
}

/// Shrink to fit inside `max`, keeping the aspect ratio. Smaller images are
/// returned unchanged.
pub fn reduce_size(img: &DynamicImage, (max_w, max_h): (u32, u32)) -> DynamicImage {
    if img.width() <= max_w && img.height() <= max_h {
        return img.clone();
    }
    img.resize(max_w, max_h, FilterType::Lanczos3)
}

/// Centre `img` on a `size` canvas filled with `background`.
pub fn pad_to_size(img: &DynamicImage, (w, h): (u32, u32), background: Color) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(w, h, Rgba(background.to_rgba()));
    let x = (w as i64 - img.width() as i64) / 2;
    let y = (h as i64 - img.height() as i64) / 2;
    imageops::overlay(&mut canvas, &img.to_rgba8(), x, y);
    DynamicImage::ImageRgba8(canvas)
}

/// Sizes used to normalise product shots before they go into cards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrepareSpec {
    /// Bounding box the product is shrunk into.
    pub fit: (u32, u32),
    /// Final size after padding; should be at least `fit`.
    pub pad: (u32, u32),
    #[serde(default = "white")]
    pub background: Color,
}

fn white() -> Color {
    Color::WHITE
}

impl Default for PrepareSpec {
    fn default() -> Self {
        Self {
            fit: (220, 235),
            pad: (230, 245),
            background: Color::WHITE,
        }
    }
}

/// Flatten transparency, shrink, then pad: the normal product pipeline.
pub fn prepare_product(img: &DynamicImage, spec: &PrepareSpec) -> DynamicImage {
    let flat = fill_transparency(img, spec.background);
    let small = reduce_size(&flat, spec.fit);
    pad_to_size(&small, spec.pad, spec.background)
}

/// Photo effects applied before captioning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    /// Blend a flat color over the image; `alpha` is clamped to 0..=1.
    Overlay { color: Color, alpha: f32 },
    Blur { sigma: f32 },
    /// One-pixel frame; `margin` is the share of each side kept inside it.
    Portrait { color: Color, margin: f32 },
}

pub fn apply_effect(img: DynamicImage, effect: &Effect) -> DynamicImage {
    match *effect {
        Effect::Overlay { color, alpha } => overlay(&img, color, alpha),
        Effect::Blur { sigma } => img.blur(sigma),
        Effect::Portrait { color, margin } => portrait(img, color, margin),
    }
}

pub fn apply_effects(img: DynamicImage, effects: &[Effect]) -> DynamicImage {
    effects.iter().fold(img, apply_effect)
}

fn overlay(img: &DynamicImage, color: Color, alpha: f32) -> DynamicImage {
    let a = alpha.clamp(0.0, 1.0);
    let c = color.to_rgba();
    let mut rgba = img.to_rgba8();
    for p in rgba.pixels_mut() {
        for i in 0..4 {
            p[i] = (p[i] as f32 * (1.0 - a) + c[i] as f32 * a).round() as u8;
        }
    }
    DynamicImage::ImageRgba8(rgba)
}

fn portrait(img: DynamicImage, color: Color, margin: f32) -> DynamicImage {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return img;
    }
    let inset = (1.0 - margin.clamp(0.0, 1.0)).min(0.5);
    let left = ((w as f32 * inset) as u32).min(w - 1);
    let top = ((h as f32 * inset) as u32).min(h - 1);
    let right = (w - 1).saturating_sub(left).max(left);
    let bottom = (h - 1).saturating_sub(top).max(top);
    let px = Rgba(color.to_rgba());
    let mut rgba = img.to_rgba8();
    for x in left..=right {
        rgba.put_pixel(x, top, px);
        rgba.put_pixel(x, bottom, px);
    }
    for y in top..=bottom {
        rgba.put_pixel(left, y, px);
        rgba.put_pixel(right, y, px);
    }
    DynamicImage::ImageRgba8(rgba)
}
