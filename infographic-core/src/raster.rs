//! Conversions between decoded images and the premultiplied canvas surface,
//! plus deterministic PNG encoding.

use image::{DynamicImage, RgbaImage};
use png::{BitDepth, ColorType, Compression, Encoder, FilterType};
use tiny_skia::{ColorU8, Pixmap};

use crate::error::{Error, Result};

pub fn pixmap_from_image(img: &DynamicImage) -> Result<Pixmap> {
    let rgba = img.to_rgba8();
    let mut pixmap = Pixmap::new(rgba.width(), rgba.height()).ok_or_else(|| {
        Error::Render(format!(
            "cannot allocate {}x{} image surface",
            rgba.width(),
            rgba.height()
        ))
    })?;
    for (dst, p) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
        *dst = ColorU8::from_rgba(p[0], p[1], p[2], p[3]).premultiply();
    }
    Ok(pixmap)
}

/// Straight-alpha RGBA bytes of the whole surface.
pub fn straight_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.data().len());
    for p in pixmap.pixels() {
        let c = p.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}

pub fn image_from_pixmap(pixmap: &Pixmap) -> Result<RgbaImage> {
    RgbaImage::from_raw(pixmap.width(), pixmap.height(), straight_rgba(pixmap))
        .ok_or_else(|| Error::Render("surface size does not match its buffer".to_string()))
}

/// PNG bytes with fixed encoder settings, so equal pixels give equal files.
pub fn encode_png_deterministic(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut enc = Encoder::new(&mut buf, pixmap.width(), pixmap.height());
    enc.set_color(ColorType::Rgba);
    enc.set_depth(BitDepth::Eight);
    enc.set_filter(FilterType::NoFilter);
    enc.set_compression(Compression::Default);
    {
        let mut writer = enc.write_header()?;
        writer.write_image_data(&straight_rgba(pixmap))?;
    }
    Ok(buf)
}
