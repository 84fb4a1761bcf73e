//! Shared test utilities for the social-cards test suite.
//!
//! Provides a deterministic block-glyph font, so layout and composition can
//! be tested without font files, plus fixture writers for logos and a
//! call-counting render stub for cache tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let face = BlockFace::new(10.0);
//! assert_eq!(face.measure("abc").width, 15.0);
//!
//! let renderer = CardRenderer::new(Arc::new(BlockFonts::new()), ColorScheme::default());
//! let card = renderer.render(&request, &solid_logo(144, 144, RED)).unwrap();
//! ```

use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::imaging::fonts::{FontError, FontProvider, TextFace};
use crate::imaging::layout::{TextExtent, TextMeasure};

// =========================================================================
// Block font
// =========================================================================

/// Monospaced synthetic font.
///
/// Every char (spaces included) advances `size / 2`. Non-blank text has a top
/// bearing of `size / 5`, lines are `size` tall. Glyphs are drawn as solid
/// blocks covering 80% of the advance, from the bearing down to 90% of the
/// line height.
#[derive(Debug, Clone, Copy)]
pub struct BlockFace {
    size: f32,
}

impl BlockFace {
    pub fn new(size: f32) -> Self {
        Self { size }
    }

    pub fn advance(&self) -> f32 {
        self.size / 2.0
    }
}

impl TextMeasure for BlockFace {
    fn measure(&self, text: &str) -> TextExtent {
        let top = if text.trim().is_empty() {
            0.0
        } else {
            self.size / 5.0
        };
        TextExtent {
            width: text.chars().count() as f32 * self.advance(),
            top,
        }
    }

    fn line_height(&self) -> f32 {
        self.size
    }
}

impl TextFace for BlockFace {
    fn draw(&self, layer: &mut RgbaImage, text: &str, x: f32, y: f32, color: Rgba<u8>) {
        let y0 = (y + self.size / 5.0).max(0.0).floor() as u32;
        let y1 = ((y + self.size * 0.9).max(0.0).ceil() as u32).min(layer.height());
        for (i, c) in text.chars().enumerate() {
            if c.is_whitespace() {
                continue;
            }
            let left = x + i as f32 * self.advance();
            let x0 = left.max(0.0).floor() as u32;
            let x1 = ((left + self.advance() * 0.8).max(0.0).ceil() as u32).min(layer.width());
            for py in y0..y1 {
                for px in x0..x1 {
                    layer.put_pixel(px, py, color);
                }
            }
        }
    }
}

/// [`FontProvider`] handing out [`BlockFace`]s and recording every request.
#[derive(Debug, Default)]
pub struct BlockFonts {
    requests: Mutex<Vec<(String, f32)>>,
    failing: bool,
}

impl BlockFonts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider whose every face lookup fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// `(style, size)` of every face requested so far, in order.
    pub fn requests(&self) -> Vec<(String, f32)> {
        self.requests.lock().unwrap().clone()
    }
}

impl FontProvider for BlockFonts {
    fn face(&self, style: &str, size: f32) -> Result<Arc<dyn TextFace>, FontError> {
        self.requests.lock().unwrap().push((style.to_string(), size));
        if self.failing {
            return Err(FontError::MissingRegular("Block".into()));
        }
        Ok(Arc::new(BlockFace::new(size)))
    }
}

// =========================================================================
// Image fixtures
// =========================================================================

/// In-memory logo filled with one color.
pub fn solid_logo(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
    RgbaImage::from_pixel(width, height, color)
}

/// Write an opaque gray PNG, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    solid_logo(width, height, Rgba([128, 128, 128, 255]))
        .save(path)
        .unwrap();
}

/// Write a 24×24 SVG with a filled square, creating parent directories.
pub fn write_svg(path: &Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(
        path,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24"><rect x="4" y="4" width="16" height="16"/></svg>"#,
    )
    .unwrap();
}

// =========================================================================
// Render stub
// =========================================================================

/// Render function stand-in counting how often it is invoked.
#[derive(Debug, Default)]
pub struct CountingRender {
    calls: AtomicUsize,
}

impl CountingRender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce a small image whose pixels depend on `seed`.
    pub fn render(&self, seed: u8) -> RgbaImage {
        self.calls.fetch_add(1, Ordering::SeqCst);
        solid_logo(8, 8, Rgba([seed, 0, 0, 255]))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}
