//! The product grid infographic: header, footer and one card per grid cell.

use image::DynamicImage;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::path::{Path, PathBuf};

use crate::collect::{self, load_image};
use crate::compositor::{Band, Compositor, ProductCard, Section};
use crate::config::{BandConfig, LayoutConfig};
use crate::error::{Error, Result};
use crate::font::Font;
use crate::imageops::{apply_effects, prepare_product};

/// One product card's content.
#[derive(Clone, Debug)]
pub struct ProductEntry {
    pub title: String,
    pub description: String,
    pub image: DynamicImage,
}

/// Faces used by the template, loaded once per render.
#[derive(Clone, Debug)]
pub struct TemplateFonts {
    pub header: Font,
    pub footer: Font,
    pub title: Font,
    pub description: Font,
}

impl TemplateFonts {
    pub fn load(config: &LayoutConfig) -> Result<Self> {
        let policy = config.font_policy;
        Ok(Self {
            header: config.header.font.load(policy)?,
            footer: config.footer.font.load(policy)?,
            title: config.card.title_font.load(policy)?,
            description: config.card.description_font.load(policy)?,
        })
    }

    /// Every role uses `font`, resized to the sizes in `config`.
    pub fn uniform(font: &Font, config: &LayoutConfig) -> Self {
        Self {
            header: font.with_size(config.header.font.size),
            footer: font.with_size(config.footer.font.size),
            title: font.with_size(config.card.title_font.size),
            description: font.with_size(config.card.description_font.size),
        }
    }
}

fn band<'a>(cfg: &'a BandConfig, font: &'a Font) -> Band<'a> {
    let mut band = Band::new(cfg.height, cfg.background, &cfg.text, font)
        .text_color(cfg.text_color)
        .align(cfg.alignment)
        .padding(cfg.padding)
        .char_spacing(cfg.char_spacing);
    if let Some(rule) = cfg.rule {
        band = band.rule(rule);
    }
    band
}

/// Load the fonts named in `config` and compose the grid.
pub fn compose_product_grid(config: &LayoutConfig, entries: &[ProductEntry]) -> Result<Compositor> {
    check_entries(config, entries)?;
    let fonts = TemplateFonts::load(config)?;
    compose_product_grid_with(config, &fonts, entries)
}

fn check_entries(config: &LayoutConfig, entries: &[ProductEntry]) -> Result<()> {
    let grid = config.grid_spec();
    grid.validate()?;
    if entries.len() < grid.cell_count() {
        return Err(Error::InsufficientSamples {
            available: entries.len(),
            requested: grid.cell_count(),
        });
    }
    if entries.len() > grid.cell_count() {
        log::warn!(
            "{} products for {} cells; the rest are left out",
            entries.len(),
            grid.cell_count()
        );
    }
    Ok(())
}

/// Canvas, background image, header, footer, then one card per cell.
pub fn compose_product_grid_with(
    config: &LayoutConfig,
    fonts: &TemplateFonts,
    entries: &[ProductEntry],
) -> Result<Compositor> {
    check_entries(config, entries)?;
    let cells = config.grid_spec().cells();

    let mut c = Compositor::new();
    c.create_canvas(config.canvas.width, config.canvas.height, config.canvas.background)?;
    if let Some(path) = &config.canvas.background_image {
        c.set_background_image(&load_image(path)?)?;
    }
    c.add_header(&band(&config.header, &fonts.header))?
        .add_footer(&band(&config.footer, &fonts.footer))?;

    let card_cfg = &config.card;
    for (cell, entry) in cells.iter().zip(entries) {
        if let Some(bg) = card_cfg.background {
            let mut section = Section::from_cell(cell, bg);
            if card_cfg.corner_radius > 0 {
                section = section.rounded(card_cfg.corner_radius);
            }
            c.create_section(section)?;
        }
        let card = ProductCard::new(
            cell,
            &entry.title,
            &entry.image,
            &entry.description,
            &fonts.title,
            &fonts.description,
        )
        .text_color(card_cfg.text_color);
        c.add_product_card(&card)?;
    }
    Ok(c)
}

/// Card title for the `index`-th (zero-based) product.
pub fn card_title(index: usize, path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}. {stem}", index + 1)
}

/// Sample products under `root`, build the grid and save it to
/// `config.output`. Nothing is written if any step fails.
pub fn render_product_grid<R: Rng + ?Sized>(
    config: &LayoutConfig,
    root: impl AsRef<Path>,
    rng: &mut R,
) -> Result<PathBuf> {
    let grid = config.grid_spec();
    grid.validate()?;
    let samples =
        collect::sample_images(root.as_ref(), &config.categories, grid.cell_count(), rng)?;
    let entries = samples
        .into_iter()
        .enumerate()
        .map(|(i, s)| ProductEntry {
            title: card_title(i, &s.path),
            description: s.category,
            image: apply_effects(prepare_product(&s.image, &config.prepare), &config.effects),
        })
        .collect::<Vec<_>>();
    let fonts = TemplateFonts::load(config)?;

    let mut config = config.clone();
    if let Some(title) = config.titles.choose(rng) {
        config.header.text = title.clone();
    }
    let compositor = compose_product_grid_with(&config, &fonts, &entries)?;

    if let Some(parent) = config.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    compositor.save(&config.output)?;
    Ok(config.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::config::tests::SAMPLE;
    use image::{Rgb, RgbImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn small_config() -> LayoutConfig {
        let mut c = LayoutConfig::from_json(SAMPLE).unwrap();
        c.canvas.width = 300;
        c.canvas.height = 400;
        c.grid.columns = 2;
        c.grid.rows = 2;
        c.grid.margin = 10;
        c.grid.vertical_margin = 10;
        c.header.height = 60;
        c.footer.height = 40;
        c.effects.clear();
        c
    }

    fn entries(n: usize) -> Vec<ProductEntry> {
        (0..n)
            .map(|i| ProductEntry {
                title: format!("{}. item", i + 1),
                description: "Makeup".to_string(),
                image: DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([200, 0, 0]))),
            })
            .collect()
    }

    #[test]
    fn titles_are_numbered_stems() {
        assert_eq!(card_title(0, Path::new("a/b/lip-gloss.png")), "1. lip-gloss");
        assert_eq!(card_title(8, Path::new("serum.v2.jpg")), "9. serum.v2");
    }

    #[test]
    fn too_few_entries_fail_before_fonts_load() {
        let err = compose_product_grid(&small_config(), &entries(3)).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientSamples {
                available: 3,
                requested: 4
            }
        ));
    }

    #[test]
    fn missing_fonts_are_reported_under_strict_policy() {
        let err = compose_product_grid(&small_config(), &entries(4)).unwrap_err();
        assert!(matches!(err, Error::FontLoad { .. }), "{err}");
    }

    #[test]
    fn grid_paints_bands_and_cards() {
        let Ok(font) = Font::system_default(12.0) else {
            eprintln!("no system font installed; skipping");
            return;
        };
        let mut config = small_config();
        config.card.background = Some(Color::rgb(0, 0, 255));
        let fonts = TemplateFonts::uniform(&font, &config);
        let c = compose_product_grid_with(&config, &fonts, &entries(4)).unwrap();
        assert_eq!(c.dimensions().unwrap(), (300, 400));
        // header and footer backgrounds at the canvas edges
        assert_eq!(c.pixel(1, 1).unwrap(), Some(Color::rgb(0xef, 0xef, 0xef)));
        assert_eq!(c.pixel(1, 398).unwrap(), Some(Color::parse("steelblue").unwrap()));
        // first cell starts at (10, 70); its padding corner keeps the card color
        let cells = config.grid_spec().cells();
        assert_eq!(cells[0].top_left, crate::grid::Point::new(10, 70));
        assert_eq!(c.pixel(11, 71).unwrap(), Some(Color::rgb(0, 0, 255)));
    }

    #[test]
    fn failed_sampling_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_config();
        config.output = dir.path().join("out").join("grid.png");
        let mut rng = StdRng::seed_from_u64(5);
        let err = render_product_grid(&config, dir.path(), &mut rng).unwrap_err();
        assert!(matches!(err, Error::InsufficientSamples { available: 0, .. }));
        assert!(!config.output.exists());
        assert!(!dir.path().join("out").exists());
    }
}
