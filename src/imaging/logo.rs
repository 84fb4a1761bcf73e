//! Logo loading for social cards.
//!
//! The logo is loaded once per build on a pool worker and shared read-only by
//! every render job. Where it comes from, first match wins:
//!
//! 1. `theme.logo`: an image path relative to `docs_dir`, replaced by the
//!    same relative path under `custom_dir` when that file exists.
//! 2. `theme.icon.logo`: an icon name such as `material/library`, looked up
//!    as `<custom_dir>/.icons/<name>.svg`, then `<icons_dir>/<name>.svg`.
//!    Icons are tinted with the card text color.
//! 3. The built-in `material/library` icon.
//!
//! SVGs are rasterized with resvg at [`SVG_SCALE`]× their intrinsic size and
//! then scaled down like any raster logo, which keeps thin strokes smooth.

use crate::config::ThemeSettings;
use crate::scheduler::JobPanicked;
use image::imageops::FilterType;
use image::{ImageReader, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, PostProcessingSteps, Tree, fontdb};
use std::path::{Path, PathBuf};
use thiserror::Error;


/// Width logos are resized to. Height keeps the aspect ratio.
pub const LOGO_WIDTH: u32 = 144;

/// Oversampling factor for SVG rasterization.
pub const SVG_SCALE: f32 = 10.0;

/// Icon used when neither a logo nor an icon is configured.
pub const DEFAULT_ICON: &str = "material/library";

const LIBRARY_ICON_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24"><path d="M12 8a3 3 0 0 0 3-3 3 3 0 0 0-3-3 3 3 0 0 0-3 3 3 3 0 0 0 3 3m0 3.54C9.64 9.35 6.5 8 3 8v11c3.5 0 6.64 1.35 9 3.54 2.36-2.19 5.5-3.54 9-3.54V8c-3.5 0-6.64 1.35-9 3.54Z"/></svg>"#;

#[derive(Error, Debug)]
pub enum LogoError {
    #[error("IO error reading logo {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to decode logo {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to parse SVG logo: {0}")]
    Svg(String),
    #[error("Icon \"{0}\" not found (looked in custom_dir/.icons and icons_dir)")]
    IconNotFound(String),
    #[error("Logo has zero size")]
    Empty,
    #[error(transparent)]
    Panicked(#[from] JobPanicked),
}

/// Where the logo is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoSource {
    /// PNG, JPEG, WebP, ... decoded with `image`.
    Raster(PathBuf),
    /// SVG file, optionally tinted with a fill color.
    Svg { path: PathBuf, fill: Option<String> },
    /// Built-in library icon, tinted.
    Builtin { fill: String },
}

/// Decide where the logo comes from. Pure apart from existence checks.
///
/// `text_color` is the CSS color icons are tinted with.
pub fn locate_logo(
    theme: &ThemeSettings,
    docs_dir: &Path,
    text_color: &str,
) -> Result<LogoSource, LogoError> {
    if let Some(logo) = theme.logo.as_deref().filter(|l| !l.is_empty()) {
        let mut path = docs_dir.join(logo);
        if let Some(custom_dir) = &theme.custom_dir {
            let custom = custom_dir.join(logo);
            if custom.exists() {
                path = custom;
            }
        }
        return Ok(if is_svg(&path) {
            LogoSource::Svg { path, fill: None }
        } else {
            LogoSource::Raster(path)
        });
    }

    let icon = theme.icon_logo().unwrap_or(DEFAULT_ICON);
    let file = format!("{icon}.svg");
    let candidates = [
        theme.custom_dir.as_ref().map(|d| d.join(".icons").join(&file)),
        theme.icons_dir.as_ref().map(|d| d.join(&file)),
    ];
    if let Some(path) = candidates.into_iter().flatten().find(|p| p.exists()) {
        return Ok(LogoSource::Svg {
            path,
            fill: Some(text_color.to_string()),
        });
    }

    if icon == DEFAULT_ICON {
        Ok(LogoSource::Builtin {
            fill: text_color.to_string(),
        })
    } else {
        Err(LogoError::IconNotFound(icon.to_string()))
    }
}

/// Load the logo and resize it to [`LOGO_WIDTH`].
pub fn load_resized_logo(source: &LogoSource) -> Result<RgbaImage, LogoError> {
    let logo = load_logo(source)?;
    resize_logo(&logo, LOGO_WIDTH)
}

/// Load the logo at its natural (or oversampled SVG) resolution.
pub fn load_logo(source: &LogoSource) -> Result<RgbaImage, LogoError> {
    match source {
        LogoSource::Raster(path) => {
            let reader = ImageReader::open(path).map_err(|source| LogoError::Io {
                path: path.clone(),
                source,
            })?;
            let image = reader.decode().map_err(|source| LogoError::Decode {
                path: path.clone(),
                source,
            })?;
            Ok(image.to_rgba8())
        }
        LogoSource::Svg { path, fill } => {
            let data = std::fs::read_to_string(path).map_err(|source| LogoError::Io {
                path: path.clone(),
                source,
            })?;
            let data = match fill {
                Some(fill) => tint_svg(&data, fill),
                None => data,
            };
            rasterize_svg(&data, SVG_SCALE)
        }
        LogoSource::Builtin { fill } => rasterize_svg(&tint_svg(LIBRARY_ICON_SVG, fill), SVG_SCALE),
    }
}

/// Resize to `width`, keeping the aspect ratio (height rounded down).
pub fn resize_logo(logo: &RgbaImage, width: u32) -> Result<RgbaImage, LogoError> {
    let (w, h) = logo.dimensions();
    if w == 0 || h == 0 {
        return Err(LogoError::Empty);
    }
    let height = ((u64::from(width) * u64::from(h)) / u64::from(w)).max(1) as u32;
    Ok(image::imageops::resize(logo, width, height, FilterType::Lanczos3))
}

/// Set a fill color on the root `<svg>` element.
pub fn tint_svg(data: &str, fill: &str) -> String {
    data.replacen("<svg", &format!("<svg fill=\"{fill}\""), 1)
}

fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Rasterize SVG markup at `scale` × its intrinsic size.
fn rasterize_svg(data: &str, scale: f32) -> Result<RgbaImage, LogoError> {
    let mut tree = Tree::from_str(data, &Options::default())
        .map_err(|e| LogoError::Svg(e.to_string()))?;
    // Without this step the tree has no renderable paths. No fonts are
    // loaded, so `<text>` in a logo is skipped and output stays deterministic.
    tree.postprocess(PostProcessingSteps::default(), &fontdb::Database::new());

    let size = tree.size;
    let width = (size.width() * scale).ceil() as u32;
    let height = (size.height() * scale).ceil() as u32;
    let mut pixmap = Pixmap::new(width, height).ok_or(LogoError::Empty)?;
    resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha; image expects straight alpha.
    let pixels: Vec<u8> = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(width, height, pixels).ok_or(LogoError::Empty)
}
