//! Canvas builder for infographics.
//!
//! A `Compositor` owns one raster surface. Every drawing call paints onto it
//! immediately, so layering follows call order: a later call covers an
//! earlier one wherever they overlap. Shapes and text are emitted as small
//! SVG fragments and rasterised onto the surface; images are blended in
//! directly with source-over, which makes their alpha channel the paste mask.

use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::{Pixmap, PixmapPaint, Transform};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::font::Font;
use crate::grid::{Cell, Point};
use crate::raster;
use crate::text::{Alignment, LayoutOptions, TextBlock, TextMetrics};

/// Padding between a product card's edge and its content.
pub const CARD_PADDING: i32 = 5;
/// Share of the card height reserved for the product image.
pub const CARD_IMAGE_RATIO: f32 = 0.70;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Corners {
    Radius(u32),
    /// Circle with radius half the shorter side, centred in the box.
    Circle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outline {
    pub color: Color,
    pub width: u32,
}

/// Filled rectangle; `bottom_right` is exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Section {
    pub top_left: Point,
    pub bottom_right: Point,
    pub color: Color,
    pub corners: Option<Corners>,
    pub outline: Option<Outline>,
}

impl Section {
    pub fn new(top_left: impl Into<Point>, bottom_right: impl Into<Point>, color: Color) -> Self {
        Self {
            top_left: top_left.into(),
            bottom_right: bottom_right.into(),
            color,
            corners: None,
            outline: None,
        }
    }

    pub fn from_cell(cell: &Cell, color: Color) -> Self {
        Self::new(cell.top_left, cell.bottom_right, color)
    }

    pub fn rounded(mut self, radius: u32) -> Self {
        self.corners = Some(Corners::Radius(radius));
        self
    }

    pub fn circle(mut self) -> Self {
        self.corners = Some(Corners::Circle);
        self
    }

    pub fn outline(mut self, color: Color, width: u32) -> Self {
        self.outline = Some(Outline { color, width });
        self
    }

    fn to_svg(&self) -> String {
        let (x, y) = (self.top_left.x, self.top_left.y);
        let w = self.bottom_right.x - self.top_left.x;
        let h = self.bottom_right.y - self.top_left.y;
        let mut paint = format!(
            "fill=\"{}\" fill-opacity=\"{}\"",
            self.color.svg_rgb(),
            self.color.svg_opacity()
        );
        // Keep the stroke inside the box.
        let inset = match self.outline {
            Some(o) if o.width > 0 => {
                paint.push_str(&format!(
                    " stroke=\"{}\" stroke-opacity=\"{}\" stroke-width=\"{}\"",
                    o.color.svg_rgb(),
                    o.color.svg_opacity(),
                    o.width
                ));
                o.width as f32 / 2.0
            }
            _ => 0.0,
        };
        match self.corners {
            Some(Corners::Circle) => {
                let r = w.min(h) / 2;
                format!(
                    "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" {paint}/>\n",
                    x as f32 + w as f32 / 2.0,
                    y as f32 + h as f32 / 2.0,
                    r as f32 - inset
                )
            }
            Some(Corners::Radius(radius)) => format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"{radius}\" ry=\"{radius}\" {paint}/>\n",
                x as f32 + inset,
                y as f32 + inset,
                w as f32 - 2.0 * inset,
                h as f32 - 2.0 * inset
            ),
            None => format!(
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" shape-rendering=\"crispEdges\" {paint}/>\n",
                x as f32 + inset,
                y as f32 + inset,
                w as f32 - 2.0 * inset,
                h as f32 - 2.0 * inset
            ),
        }
    }
}

/// Text drawn at a fixed point, wrapped to `max_width`.
#[derive(Clone, Debug)]
pub struct TextSpec<'a> {
    pub text: &'a str,
    pub position: Point,
    pub font: &'a Font,
    pub color: Color,
    pub max_width: u32,
    pub alignment: Alignment,
    pub line_spacing: f32,
    pub char_spacing: f32,
}

impl<'a> TextSpec<'a> {
    pub fn new(text: &'a str, position: impl Into<Point>, font: &'a Font) -> Self {
        Self {
            text,
            position: position.into(),
            font,
            color: Color::BLACK,
            max_width: 100,
            alignment: Alignment::Left,
            line_spacing: 5.0,
            char_spacing: 0.0,
        }
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn max_width(mut self, max_width: u32) -> Self {
        self.max_width = max_width;
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn line_spacing(mut self, spacing: f32) -> Self {
        self.line_spacing = spacing;
        self
    }

    pub fn char_spacing(mut self, spacing: f32) -> Self {
        self.char_spacing = spacing;
        self
    }

    fn options(&self) -> LayoutOptions {
        LayoutOptions {
            max_width: self.max_width as f32,
            alignment: self.alignment,
            line_spacing: self.line_spacing,
            char_spacing: self.char_spacing,
        }
    }
}

/// Full-width header or footer band with optional text.
#[derive(Clone, Debug)]
pub struct Band<'a> {
    pub height: u32,
    pub background: Color,
    pub text: &'a str,
    pub font: &'a Font,
    pub text_color: Color,
    pub alignment: Alignment,
    /// Left and right inset for the text.
    pub padding: u32,
    pub char_spacing: f32,
    /// Draws 1px rules above and below the text when set.
    pub rule: Option<Color>,
}

impl<'a> Band<'a> {
    pub fn new(height: u32, background: Color, text: &'a str, font: &'a Font) -> Self {
        Self {
            height,
            background,
            text,
            font,
            text_color: Color::BLACK,
            alignment: Alignment::Center,
            padding: 50,
            char_spacing: 0.0,
            rule: None,
        }
    }

    pub fn text_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }

    pub fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn char_spacing(mut self, spacing: f32) -> Self {
        self.char_spacing = spacing;
        self
    }

    pub fn rule(mut self, color: Color) -> Self {
        self.rule = Some(color);
        self
    }
}

/// Title, image and description inside one grid cell.
#[derive(Clone, Debug)]
pub struct ProductCard<'a> {
    pub top_left: Point,
    pub bottom_right: Point,
    pub title: &'a str,
    pub image: &'a DynamicImage,
    pub description: &'a str,
    pub title_font: &'a Font,
    pub description_font: &'a Font,
    pub text_color: Color,
    pub background: Option<Color>,
}

impl<'a> ProductCard<'a> {
    pub fn new(
        cell: &Cell,
        title: &'a str,
        image: &'a DynamicImage,
        description: &'a str,
        title_font: &'a Font,
        description_font: &'a Font,
    ) -> Self {
        Self {
            top_left: cell.top_left,
            bottom_right: cell.bottom_right,
            title,
            image,
            description,
            title_font,
            description_font,
            text_color: Color::BLACK,
            background: None,
        }
    }

    pub fn text_color(mut self, color: Color) -> Self {
        self.text_color = color;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = Some(color);
        self
    }
}

/// Where the parts of a product card go, given the title block height and
/// the source image size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CardLayout {
    pub title_origin: Point,
    pub text_width: u32,
    pub image_origin: Point,
    pub image_size: (u32, u32),
    pub image_area_height: u32,
    pub description_origin: Point,
}

impl CardLayout {
    pub fn compute(
        top_left: Point,
        bottom_right: Point,
        title_height: u32,
        image_size: (u32, u32),
    ) -> Self {
        let cell_w = bottom_right.x - top_left.x;
        let cell_h = bottom_right.y - top_left.y;
        let text_width = (cell_w - 2 * CARD_PADDING).max(1) as u32;
        let title_origin = top_left.offset(CARD_PADDING, CARD_PADDING);
        let image_top = title_origin.y + title_height as i32 + CARD_PADDING;
        let image_area_height = (cell_h.max(0) as f32 * CARD_IMAGE_RATIO).round() as u32;
        let image_size = fit_within(image_size, (text_width, image_area_height.max(1)));
        let image_left =
            top_left.x + CARD_PADDING + (text_width as i32 - image_size.0 as i32) / 2;
        Self {
            title_origin,
            text_width,
            image_origin: Point::new(image_left, image_top),
            image_size,
            image_area_height,
            description_origin: Point::new(
                top_left.x + CARD_PADDING,
                image_top + image_area_height as i32 + CARD_PADDING,
            ),
        }
    }
}

/// Largest size with the same aspect ratio that fits in `bounds`; never enlarges.
fn fit_within((w, h): (u32, u32), (max_w, max_h): (u32, u32)) -> (u32, u32) {
    if w <= max_w && h <= max_h {
        return (w, h);
    }
    let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
    (
        ((w as f64 * scale).round() as u32).clamp(1, max_w.max(1)),
        ((h as f64 * scale).round() as u32).clamp(1, max_h.max(1)),
    )
}

/// Quoted CSS family name; double quotes when the name has an apostrophe.
fn css_family(family: &str) -> String {
    if family.contains('\'') {
        format!("\"{}\"", family.replace('"', ""))
    } else {
        format!("'{family}'")
    }
}

fn svg_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[derive(Debug, Default)]
pub struct Compositor {
    canvas: Option<Pixmap>,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    fn canvas(&self) -> Result<&Pixmap> {
        self.canvas.as_ref().ok_or(Error::CanvasNotInitialized)
    }

    fn canvas_mut(&mut self) -> Result<&mut Pixmap> {
        self.canvas.as_mut().ok_or(Error::CanvasNotInitialized)
    }

    /// Allocate the surface and fill it with `background`.
    pub fn create_canvas(&mut self, width: u32, height: u32, background: Color) -> Result<&mut Self> {
        let mut pixmap =
            Pixmap::new(width, height).ok_or(Error::InvalidCanvasSize { width, height })?;
        pixmap.fill(background.to_skia());
        log::debug!("canvas {width}x{height} background {background}");
        self.canvas = Some(pixmap);
        Ok(self)
    }

    /// Start from an existing picture, e.g. to caption a photo.
    pub fn create_canvas_from_image(&mut self, image: &DynamicImage) -> Result<&mut Self> {
        if image.width() == 0 || image.height() == 0 {
            return Err(Error::InvalidCanvasSize {
                width: image.width(),
                height: image.height(),
            });
        }
        self.canvas = Some(raster::pixmap_from_image(image)?);
        Ok(self)
    }

    /// Stretch `image` over the whole canvas.
    pub fn set_background_image(&mut self, image: &DynamicImage) -> Result<&mut Self> {
        let (w, h) = self.dimensions()?;
        let resized = image.resize_exact(w, h, image::imageops::FilterType::Lanczos3);
        self.add_image(&resized, Point::new(0, 0))
    }

    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let c = self.canvas()?;
        Ok((c.width(), c.height()))
    }

    /// Color at a pixel, `None` outside the canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Result<Option<Color>> {
        let canvas = self.canvas()?;
        if x >= canvas.width() || y >= canvas.height() {
            return Ok(None);
        }
        Ok(canvas.pixel(x, y).map(|p| {
            let c = p.demultiply();
            Color {
                r: c.red(),
                g: c.green(),
                b: c.blue(),
                a: c.alpha(),
            }
        }))
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        raster::image_from_pixmap(self.canvas()?)
    }

    /// Parse an SVG fragment sized to the canvas and paint it on top.
    fn render_svg(&mut self, body: &str, fonts: &[&Font]) -> Result<()> {
        let canvas = self.canvas_mut()?;
        let (w, h) = (canvas.width(), canvas.height());
        let svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n"
        );
        let mut opt = usvg::Options::default();
        let mut fontdb = usvg::fontdb::Database::new();
        for font in fonts {
            fontdb.load_font_data(font.data().to_vec());
        }
        opt.fontdb = Arc::new(fontdb);
        let tree = usvg::Tree::from_str(&svg, &opt)
            .map_err(|e| Error::Render(format!("SVG parse error: {e:?}")))?;
        let mut pm = canvas.as_mut();
        resvg::render(&tree, Transform::identity(), &mut pm);
        Ok(())
    }

    /// Stamp a filled, optionally rounded or outlined, rectangle.
    pub fn create_section(&mut self, section: Section) -> Result<&mut Self> {
        self.canvas()?;
        let w = section.bottom_right.x - section.top_left.x;
        let h = section.bottom_right.y - section.top_left.y;
        if w < 0 || h < 0 {
            return Err(Error::Render(format!(
                "section bottom-right {:?} lies before top-left {:?}",
                section.bottom_right, section.top_left
            )));
        }
        if w == 0 || h == 0 {
            return Ok(self);
        }
        self.render_svg(&section.to_svg(), &[])?;
        Ok(self)
    }

    fn draw_block(
        &mut self,
        block: &TextBlock,
        font: &Font,
        color: Color,
        char_spacing: f32,
    ) -> Result<()> {
        if block.is_empty() {
            return Ok(());
        }
        let ascent = font.ascent();
        let mut body = String::new();
        for line in &block.lines {
            body.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\" fill-opacity=\"{}\" letter-spacing=\"{}\">{}</text>\n",
                line.x,
                line.y + ascent,
                svg_escape(&css_family(font.family())),
                font.size(),
                color.svg_rgb(),
                color.svg_opacity(),
                char_spacing,
                svg_escape(&line.text)
            ));
        }
        self.render_svg(&body, &[font])
    }

    /// Wrap and draw text starting at `spec.position`.
    pub fn add_text(&mut self, spec: &TextSpec<'_>) -> Result<&mut Self> {
        self.canvas()?;
        let block = TextBlock::layout(spec.text, spec.position, &spec.options(), spec.font);
        self.draw_block(&block, spec.font, spec.color, spec.char_spacing)?;
        Ok(self)
    }

    /// Paste `image` with its top-left at `position`. Transparent source
    /// pixels leave the canvas untouched.
    pub fn add_image(&mut self, image: &DynamicImage, position: impl Into<Point>) -> Result<&mut Self> {
        let position = position.into();
        let canvas = self.canvas_mut()?;
        let src = raster::pixmap_from_image(image)?;
        canvas.draw_pixmap(
            position.x,
            position.y,
            src.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(self)
    }

    fn add_band(&mut self, band: &Band<'_>, top: i32) -> Result<()> {
        let (width, _) = self.dimensions()?;
        self.create_section(Section::new(
            (0, top),
            (width as i32, top + band.height as i32),
            band.background,
        ))?;
        if band.text.trim().is_empty() {
            return Ok(());
        }
        let options = LayoutOptions {
            max_width: width.saturating_sub(2 * band.padding).max(1) as f32,
            alignment: band.alignment,
            line_spacing: 5.0,
            char_spacing: band.char_spacing,
        };
        let mut block = TextBlock::layout(
            band.text,
            Point::new(band.padding as i32, top),
            &options,
            band.font,
        );
        let slack = (band.height as f32 - block.height()).max(0.0);
        block.translate_y((slack / 2.0).floor());
        self.draw_block(&block, band.font, band.text_color, band.char_spacing)?;

        if let Some(rule) = band.rule {
            let gap = (band.font.size() / 4.0).round() as i32;
            let text_top = block.lines.first().map(|l| l.y as i32).unwrap_or(top);
            let text_bottom = text_top + block.height().ceil() as i32;
            let (left, right) = (band.padding as i32, width as i32 - band.padding as i32);
            for y in [text_top - gap, text_bottom + gap] {
                self.create_section(Section::new((left, y), (right, y + 1), rule))?;
            }
        }
        Ok(())
    }

    /// Full-width band along the top edge.
    pub fn add_header(&mut self, band: &Band<'_>) -> Result<&mut Self> {
        self.add_band(band, 0)?;
        Ok(self)
    }

    /// Full-width band along the bottom edge.
    pub fn add_footer(&mut self, band: &Band<'_>) -> Result<&mut Self> {
        let (_, height) = self.dimensions()?;
        self.add_band(band, height as i32 - band.height as i32)?;
        Ok(self)
    }

    /// Title on top, image in the middle 70% of the cell, description below.
    pub fn add_product_card(&mut self, card: &ProductCard<'_>) -> Result<&mut Self> {
        self.canvas()?;
        if let Some(bg) = card.background {
            self.create_section(Section::new(card.top_left, card.bottom_right, bg))?;
        }
        let probe = CardLayout::compute(card.top_left, card.bottom_right, 0, (1, 1));
        let options = LayoutOptions {
            max_width: probe.text_width as f32,
            alignment: Alignment::Center,
            ..Default::default()
        };
        let title = TextBlock::layout(card.title, probe.title_origin, &options, card.title_font);
        let layout = CardLayout::compute(
            card.top_left,
            card.bottom_right,
            title.height().ceil() as u32,
            (card.image.width(), card.image.height()),
        );
        log::debug!("product card {:?}: {:?}", card.top_left, layout);

        self.draw_block(&title, card.title_font, card.text_color, 0.0)?;
        if layout.image_size == (card.image.width(), card.image.height()) {
            self.add_image(card.image, layout.image_origin)?;
        } else {
            let scaled = card.image.resize_exact(
                layout.image_size.0,
                layout.image_size.1,
                image::imageops::FilterType::Lanczos3,
            );
            self.add_image(&scaled, layout.image_origin)?;
        }
        let description = TextBlock::layout(
            card.description,
            layout.description_origin,
            &options,
            card.description_font,
        );
        self.draw_block(&description, card.description_font, card.text_color, 0.0)?;
        Ok(self)
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        raster::encode_png_deterministic(self.canvas()?)
    }

    /// Write the canvas as PNG.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes)?;
        log::info!("saved {}", path.display());
        Ok(())
    }

    /// Write a preview PNG to the temp directory and hand it to the
    /// platform image viewer. Returns the preview path.
    pub fn show(&self) -> Result<PathBuf> {
        let path = std::env::temp_dir().join(format!("infographic-preview-{}.png", std::process::id()));
        self.save(&path)?;
        let opener = if cfg!(target_os = "macos") {
            "open"
        } else if cfg!(target_os = "windows") {
            "explorer"
        } else {
            "xdg-open"
        };
        if let Err(e) = std::process::Command::new(opener).arg(&path).spawn() {
            log::warn!("could not launch {opener} for {}: {e}", path.display());
        }
        Ok(path)
    }
}
