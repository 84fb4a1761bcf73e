//! Font resolution and the per-build font cache.
//!
//! ## Font sets
//!
//! A [`FontSet`] maps style names (`Regular`, `Bold`, `Italic`, ...) to font
//! files for one family. Files are expected below the cache directory, named
//! `<Family>-<Style>.ttf` (or `.otf`) with spaces removed from the family, the
//! way font archives are usually unpacked:
//!
//! ```text
//! .cache/plugin/social/
//! └── Roboto/
//!     ├── Roboto-Regular.ttf
//!     ├── Roboto-Bold.ttf
//!     └── Roboto-Italic.ttf
//! ```
//!
//! Names like `Roboto_Condensed-Bold.ttf` belong to a different family and are
//! ignored. `Regular` is required; any style that isn't present falls back to
//! it.
//!
//! ## Faces
//!
//! [`RusttypeFonts`] parses each font file once and keeps one [`RusttypeFace`]
//! per (style, size). Each face memoizes its text measurements, since the
//! layout engine re-measures every growing candidate line. Both maps live as
//! long as the renderer, which is one build.

use super::layout::{TextExtent, TextMeasure};
use image::{Rgba, RgbaImage};
use regex::Regex;
use rusttype::{Font, Scale, point};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use walkdir::WalkDir;

/// Style every font set must provide.
pub const REGULAR: &str = "Regular";

#[derive(Error, Debug)]
pub enum FontError {
    #[error(
        "no \"{family}\" fonts found in {dir}: place {file_stem}-Regular.ttf (and optionally -Bold) there"
    )]
    NotFound {
        family: String,
        file_stem: String,
        dir: PathBuf,
    },
    #[error("font set for \"{0}\" has no Regular style")]
    MissingRegular(String),
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("not a usable TrueType/OpenType font: {0}")]
    Parse(PathBuf),
}

/// Style name → font file for one family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSet {
    family: String,
    styles: BTreeMap<String, PathBuf>,
}

impl FontSet {
    /// Build a font set from explicit paths. Requires a `Regular` entry.
    pub fn new(
        family: impl Into<String>,
        styles: BTreeMap<String, PathBuf>,
    ) -> Result<Self, FontError> {
        let family = family.into();
        if !styles.contains_key(REGULAR) {
            return Err(FontError::MissingRegular(family));
        }
        Ok(Self { family, styles })
    }

    /// Find the files of `family` anywhere below `dir`.
    ///
    /// Entries are visited in file-name order, so when the same style exists
    /// twice the later path wins deterministically.
    pub fn resolve(dir: &Path, family: &str) -> Result<Self, FontError> {
        let file_stem = family.replace(' ', "");
        let pattern = Regex::new(&format!(r"^{}-(\w+)\.[ot]tf$", regex::escape(&file_stem)))
            .expect("escaped family pattern must compile");

        let mut styles = BTreeMap::new();
        for entry in WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let name = entry.file_name().to_string_lossy();
            if let Some(caps) = pattern.captures(&name) {
                styles.insert(caps[1].to_string(), entry.path().to_path_buf());
            }
        }

        if styles.is_empty() {
            return Err(FontError::NotFound {
                family: family.to_string(),
                file_stem,
                dir: dir.to_path_buf(),
            });
        }
        Self::new(family, styles)
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    /// Styles actually present on disk.
    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.styles.keys().map(String::as_str)
    }

    /// Path for `style`, falling back to `Regular` for unknown styles.
    pub fn path(&self, style: &str) -> &Path {
        self.styles
            .get(style)
            .or_else(|| self.styles.get(REGULAR))
            .map(PathBuf::as_path)
            .unwrap_or_else(|| Path::new(""))
    }
}

/// A font at one size: measures and draws single lines of text.
pub trait TextFace: TextMeasure + Send + Sync {
    /// Draw `text` with the top of its line box at `(x, y)`.
    ///
    /// Glyph coverage becomes the alpha channel, so drawing onto a transparent
    /// layer and compositing the layer gives anti-aliased text.
    fn draw(&self, layer: &mut RgbaImage, text: &str, x: f32, y: f32, color: Rgba<u8>);
}

/// Supplies faces by style name and pixel size.
pub trait FontProvider: Send + Sync {
    fn face(&self, style: &str, size: f32) -> Result<Arc<dyn TextFace>, FontError>;
}

/// rusttype-backed [`FontProvider`] for a [`FontSet`].
pub struct RusttypeFonts {
    set: FontSet,
    fonts: Mutex<HashMap<PathBuf, Arc<Font<'static>>>>,
    faces: Mutex<HashMap<(String, u32), Arc<RusttypeFace>>>,
}

impl RusttypeFonts {
    pub fn new(set: FontSet) -> Self {
        Self {
            set,
            fonts: Mutex::new(HashMap::new()),
            faces: Mutex::new(HashMap::new()),
        }
    }

    fn load_font(&self, path: &Path) -> Result<Arc<Font<'static>>, FontError> {
        let mut fonts = self.fonts.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(font) = fonts.get(path) {
            return Ok(Arc::clone(font));
        }
        let data = std::fs::read(path).map_err(|source| FontError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::try_from_vec(data).ok_or_else(|| FontError::Parse(path.to_path_buf()))?;
        let font = Arc::new(font);
        fonts.insert(path.to_path_buf(), Arc::clone(&font));
        Ok(font)
    }
}

impl FontProvider for RusttypeFonts {
    fn face(&self, style: &str, size: f32) -> Result<Arc<dyn TextFace>, FontError> {
        let key = (style.to_string(), size.to_bits());
        let mut faces = self.faces.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(face) = faces.get(&key) {
            return Ok(Arc::clone(face) as Arc<dyn TextFace>);
        }
        let font = self.load_font(self.set.path(style))?;
        let face = Arc::new(RusttypeFace::new(font, size));
        faces.insert(key, Arc::clone(&face));
        Ok(face as Arc<dyn TextFace>)
    }
}

/// One font at one size, with memoized measurements.
pub struct RusttypeFace {
    font: Arc<Font<'static>>,
    scale: Scale,
    ascent: f32,
    line_height: f32,
    measurements: Mutex<HashMap<String, TextExtent>>,
}

impl RusttypeFace {
    /// `size` is the em size in pixels (as in CSS `font-size`).
    pub fn new(font: Arc<Font<'static>>, size: f32) -> Self {
        let units = f32::from(font.units_per_em());
        let unscaled = font.v_metrics_unscaled();
        let height = unscaled.ascent - unscaled.descent;
        let pixel_height = if units > 0.0 && height > 0.0 {
            size * height / units
        } else {
            size
        };
        let scale = Scale::uniform(pixel_height);
        let v_metrics = font.v_metrics(scale);
        Self {
            font,
            scale,
            ascent: v_metrics.ascent,
            line_height: v_metrics.ascent - v_metrics.descent,
            measurements: Mutex::new(HashMap::new()),
        }
    }
}

impl TextMeasure for RusttypeFace {
    fn measure(&self, text: &str) -> TextExtent {
        let mut measurements = self
            .measurements
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(extent) = measurements.get(text) {
            return *extent;
        }

        let mut width: f32 = 0.0;
        let mut top: Option<i32> = None;
        for glyph in self.font.layout(text, self.scale, point(0.0, self.ascent)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                width = width.max(bb.max.x as f32);
                top = Some(top.map_or(bb.min.y, |t| t.min(bb.min.y)));
            }
        }
        let extent = TextExtent {
            width,
            top: top.unwrap_or(0) as f32,
        };
        measurements.insert(text.to_string(), extent);
        extent
    }

    fn line_height(&self) -> f32 {
        self.line_height
    }
}

impl TextFace for RusttypeFace {
    fn draw(&self, layer: &mut RgbaImage, text: &str, x: f32, y: f32, color: Rgba<u8>) {
        let baseline = point(x, y + self.ascent);
        for glyph in self.font.layout(text, self.scale, baseline) {
            let Some(bb) = glyph.pixel_bounding_box() else {
                continue;
            };
            glyph.draw(|gx, gy, coverage| {
                let px = gx as i32 + bb.min.x;
                let py = gy as i32 + bb.min.y;
                if px < 0 || py < 0 {
                    return;
                }
                let (px, py) = (px as u32, py as u32);
                if px >= layer.width() || py >= layer.height() {
                    return;
                }
                let alpha = (coverage * f32::from(color.0[3])).round() as u8;
                if alpha == 0 {
                    return;
                }
                let dst = layer.get_pixel_mut(px, py);
                // Overlapping glyph edges keep the stronger coverage.
                if alpha > dst.0[3] {
                    *dst = Rgba([color.0[0], color.0[1], color.0[2], alpha]);
                }
            });
        }
    }
}
