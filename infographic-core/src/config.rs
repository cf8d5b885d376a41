//! Layout configuration, read once from JSON at startup.
//!
//! Environment overrides are merged explicitly through
//! [`LayoutConfig::with_overrides`]; nothing here reads the process
//! environment on its own.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::font::{FontPolicy, FontSpec};
use crate::grid::GridSpec;
use crate::imageops::{Effect, PrepareSpec};
use crate::text::Alignment;

/// Prefix shared by every override key.
pub const ENV_PREFIX: &str = "INFOGRAPHIC_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "white")]
    pub background: Color,
    /// Template picture stretched over the canvas before anything else.
    #[serde(default)]
    pub background_image: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub columns: u32,
    pub rows: u32,
    pub margin: u32,
    #[serde(default)]
    pub vertical_margin: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandConfig {
    pub height: u32,
    #[serde(default = "white")]
    pub background: Color,
    #[serde(default)]
    pub text: String,
    #[serde(default = "black")]
    pub text_color: Color,
    pub font: FontSpec,
    #[serde(default = "center")]
    pub alignment: Alignment,
    #[serde(default = "band_padding")]
    pub padding: u32,
    #[serde(default)]
    pub char_spacing: f32,
    #[serde(default)]
    pub rule: Option<Color>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    pub title_font: FontSpec,
    pub description_font: FontSpec,
    #[serde(default = "black")]
    pub text_color: Color,
    #[serde(default)]
    pub background: Option<Color>,
    #[serde(default)]
    pub corner_radius: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub canvas: CanvasConfig,
    pub grid: GridConfig,
    pub header: BandConfig,
    pub footer: BandConfig,
    pub card: CardConfig,
    #[serde(default)]
    pub prepare: PrepareSpec,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub font_policy: FontPolicy,
    /// Subdirectories of the product root to sample from.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Header titles; one is picked at random per render when non-empty.
    #[serde(default)]
    pub titles: Vec<String>,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

fn white() -> Color {
    Color::WHITE
}

fn black() -> Color {
    Color::BLACK
}

fn center() -> Alignment {
    Alignment::Center
}

fn band_padding() -> u32 {
    50
}

fn default_output() -> PathBuf {
    PathBuf::from("infographic.png")
}

impl LayoutConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        let config = Self::from_json(&raw)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        log::debug!("loaded layout config {}", path.display());
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `INFOGRAPHIC_*` overrides from `(key, value)` pairs, typically
    /// `std::env::vars()`. Unknown keys under the prefix are logged and ignored.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let Some(name) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value = value.as_ref();
            match name {
                "OUTPUT" => self.output = PathBuf::from(value),
                "FONT_POLICY" => self.font_policy = value.parse()?,
                "BACKGROUND" => self.canvas.background = Color::parse(value)?,
                other => {
                    log::warn!("ignoring unknown override {ENV_PREFIX}{other}");
                    continue;
                }
            }
            log::debug!("override {}={value}", key.as_ref());
        }
        Ok(self)
    }

    pub fn grid_spec(&self) -> GridSpec {
        GridSpec {
            canvas_width: self.canvas.width,
            canvas_height: self.canvas.height,
            columns: self.grid.columns,
            rows: self.grid.rows,
            header_height: self.header.height,
            footer_height: self.footer.height,
            margin: self.grid.margin,
            vertical_margin: self.grid.vertical_margin,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(Error::InvalidCanvasSize {
                width: self.canvas.width,
                height: self.canvas.height,
            });
        }
        if self.header.height as u64 + self.footer.height as u64 > self.canvas.height as u64 {
            return Err(Error::Config(format!(
                "header ({}) and footer ({}) are taller than the canvas ({})",
                self.header.height, self.footer.height, self.canvas.height
            )));
        }
        self.grid_spec().validate()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r##"{
        "canvas": { "width": 1200, "height": 1800, "background": "#ffffff" },
        "grid": { "columns": 3, "rows": 3, "margin": 50, "vertical_margin": 20 },
        "header": {
            "height": 180,
            "background": "efefef",
            "text": "Gift Ideas",
            "font": { "path": "fonts/Montserrat_700.ttf", "size": 50 }
        },
        "footer": {
            "height": 80,
            "background": "steelblue",
            "text_color": "white",
            "font": { "path": "fonts/Montserrat_400.ttf", "size": 20 },
            "rule": "#ffffff"
        },
        "card": {
            "title_font": { "path": "fonts/Montserrat_700.ttf", "size": 18 },
            "description_font": { "path": "fonts/Montserrat_400.ttf", "size": 14 }
        },
        "effects": [ { "effect": "blur", "sigma": 0.5 } ],
        "categories": ["Skincare", "Makeup"]
    }"##;

    #[test]
    fn parses_with_defaults() {
        let c = LayoutConfig::from_json(SAMPLE).unwrap();
        assert_eq!(c.canvas.background, Color::WHITE);
        assert_eq!(c.header.background, Color::rgb(0xef, 0xef, 0xef));
        assert_eq!(c.header.alignment, Alignment::Center);
        assert_eq!(c.header.padding, 50);
        assert_eq!(c.footer.text_color, Color::WHITE);
        assert_eq!(c.footer.rule, Some(Color::WHITE));
        assert_eq!(c.font_policy, FontPolicy::Strict);
        assert_eq!(c.prepare, PrepareSpec::default());
        assert_eq!(c.effects, vec![Effect::Blur { sigma: 0.5 }]);
        assert_eq!(c.output, PathBuf::from("infographic.png"));
        assert!(c.titles.is_empty());
    }

    #[test]
    fn grid_spec_uses_band_heights() {
        let c = LayoutConfig::from_json(SAMPLE).unwrap();
        let g = c.grid_spec();
        assert_eq!(g.header_height, 180);
        assert_eq!(g.footer_height, 80);
        assert_eq!(g.cell_count(), 9);
    }

    #[test]
    fn overrides_apply_only_prefixed_keys() {
        let c = LayoutConfig::from_json(SAMPLE)
            .unwrap()
            .with_overrides([
                ("INFOGRAPHIC_OUTPUT", "out/grid.png"),
                ("INFOGRAPHIC_FONT_POLICY", "system_fallback"),
                ("INFOGRAPHIC_BACKGROUND", "000000"),
                ("INFOGRAPHIC_UNKNOWN", "x"),
                ("OUTPUT", "ignored.png"),
            ])
            .unwrap();
        assert_eq!(c.output, PathBuf::from("out/grid.png"));
        assert_eq!(c.font_policy, FontPolicy::SystemFallback);
        assert_eq!(c.canvas.background, Color::BLACK);
    }

    #[test]
    fn bad_override_values_are_errors() {
        let c = LayoutConfig::from_json(SAMPLE).unwrap();
        assert!(matches!(
            c.clone().with_overrides([("INFOGRAPHIC_BACKGROUND", "not-a-color")]),
            Err(Error::InvalidColor(_))
        ));
        assert!(matches!(
            c.with_overrides([("INFOGRAPHIC_FONT_POLICY", "lenient")]),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        let zero_grid = SAMPLE.replace("\"columns\": 3", "\"columns\": 0");
        assert!(matches!(
            LayoutConfig::from_json(&zero_grid),
            Err(Error::InvalidGrid(_))
        ));
        let bad_color = SAMPLE.replace("steelblue", "no-such-color");
        assert!(matches!(LayoutConfig::from_json(&bad_color), Err(Error::Json(_))));
        let tall_header = SAMPLE.replace("\"height\": 180,", "\"height\": 1780,");
        assert!(matches!(
            LayoutConfig::from_json(&tall_header),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn huge_band_heights_are_an_error_not_an_overflow() {
        let huge = SAMPLE
            .replace("\"height\": 180,", "\"height\": 4000000000,")
            .replace("\"height\": 80,", "\"height\": 4000000000,");
        let err = LayoutConfig::from_json(&huge).unwrap_err();
        assert!(matches!(err, Error::Config(_)), "{err}");
    }

    #[test]
    fn from_path_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        std::fs::write(&path, SAMPLE).unwrap();
        assert!(LayoutConfig::from_path(&path).is_ok());
        let missing = dir.path().join("missing.json");
        let err = LayoutConfig::from_path(&missing).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
