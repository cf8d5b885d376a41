use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use usvg::fontdb;

use crate::error::{Error, Result};
use crate::text::TextMetrics;

/// What to do when a font file cannot be loaded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontPolicy {
    /// Fail with `Error::FontLoad` naming the path.
    #[default]
    Strict,
    /// Log a warning and use the system default sans-serif face.
    SystemFallback,
}

impl FromStr for FontPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "strict" => Ok(FontPolicy::Strict),
            "system_fallback" | "fallback" => Ok(FontPolicy::SystemFallback),
            other => Err(Error::Config(format!("unknown font policy {other:?}"))),
        }
    }
}

/// A font face loaded into memory at a fixed pixel size.
#[derive(Clone)]
pub struct Font {
    path: Option<PathBuf>,
    size: f32,
    data: Arc<Vec<u8>>,
    index: u32,
    family: String,
}

impl fmt::Debug for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Font")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("family", &self.family)
            .finish()
    }
}

impl Font {
    /// Load a font file, failing if it is missing or unreadable.
    pub fn load(path: impl AsRef<Path>, size: f32) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut font = Self::parse(data, 0, size).map_err(|reason| Error::FontLoad {
            path: path.to_path_buf(),
            reason,
        })?;
        font.path = Some(path.to_path_buf());
        log::debug!("loaded font {} ({})", path.display(), font.family);
        Ok(font)
    }

    pub fn load_with_policy(path: impl AsRef<Path>, size: f32, policy: FontPolicy) -> Result<Self> {
        match (Self::load(path.as_ref(), size), policy) {
            (Ok(font), _) => Ok(font),
            (Err(e), FontPolicy::SystemFallback) => {
                log::warn!("{e}; falling back to the system default font");
                Self::system_default(size)
            }
            (Err(e), FontPolicy::Strict) => Err(e),
        }
    }

    pub fn from_bytes(data: Vec<u8>, size: f32) -> Result<Self> {
        Self::parse(data, 0, size).map_err(|reason| Error::FontLoad {
            path: PathBuf::from("<memory>"),
            reason,
        })
    }

    /// The system's sans-serif face, or the first installed face.
    pub fn system_default(size: f32) -> Result<Self> {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        let id = db
            .query(&fontdb::Query {
                families: &[fontdb::Family::SansSerif],
                ..Default::default()
            })
            .or_else(|| db.faces().next().map(|f| f.id))
            .ok_or(Error::NoFallbackFont)?;
        let (data, index) = db
            .with_face_data(id, |data, index| (data.to_vec(), index))
            .ok_or(Error::NoFallbackFont)?;
        Self::parse(data, index, size).map_err(|_| Error::NoFallbackFont)
    }

    fn parse(data: Vec<u8>, index: u32, size: f32) -> std::result::Result<Self, String> {
        ttf_parser::Face::parse(&data, index).map_err(|e| e.to_string())?;
        // Family name as the SVG renderer will see it.
        let mut db = fontdb::Database::new();
        db.load_font_data(data.clone());
        let family = db
            .faces()
            .find(|f| f.index == index)
            .and_then(|f| f.families.first().map(|(n, _)| n.clone()))
            .ok_or_else(|| "font has no family name".to_string())?;
        Ok(Self {
            path: None,
            size,
            data: Arc::new(data),
            index,
            family,
        })
    }

    /// Same face at another size; the font data is shared.
    pub fn with_size(&self, size: f32) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Source file, `None` for in-memory and system faces.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub(crate) fn data(&self) -> &[u8] {
        &self.data
    }

    fn with_face<T>(&self, f: impl FnOnce(&ttf_parser::Face<'_>, f32) -> T) -> Option<T> {
        let face = ttf_parser::Face::parse(&self.data, self.index).ok()?;
        let scale = self.size / face.units_per_em() as f32;
        Some(f(&face, scale))
    }
}

impl TextMetrics for Font {
    fn text_width(&self, text: &str) -> f32 {
        self.with_face(|face, scale| {
            text.chars()
                .map(|c| {
                    face.glyph_index(c)
                        .and_then(|g| face.glyph_hor_advance(g))
                        .unwrap_or(0) as f32
                })
                .sum::<f32>()
                * scale
        })
        .unwrap_or(0.0)
    }

    fn line_height(&self) -> f32 {
        self.with_face(|face, scale| (face.ascender() as f32 - face.descender() as f32) * scale)
            .unwrap_or(self.size)
    }

    fn ascent(&self) -> f32 {
        self.with_face(|face, scale| face.ascender() as f32 * scale)
            .unwrap_or(self.size)
    }
}

/// Font reference as written in a layout config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub path: PathBuf,
    pub size: f32,
}

impl FontSpec {
    pub fn load(&self, policy: FontPolicy) -> Result<Font> {
        Font::load_with_policy(&self.path, self.size, policy)
    }
}
