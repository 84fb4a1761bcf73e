//! Card composition.
//!
//! Every card is a fixed 1200×630 canvas built from five layers, bottom to
//! top:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  site name (Bold 36, 1 line)                   ┌──────┐  │
//! │                                                │ logo │  │
//! │  Title title title (Bold 92, 3 lines)          └──────┘  │
//! │  title title                                             │
//! │                                                          │
//! │  Description (Regular 28, 2 lines)                       │
//! └──────────────────────────────────────────────────────────┘
//!   background: solid fill color
//! ```
//!
//! Each text block is laid out and drawn on its own transparent layer the
//! size of its box, then alpha-composited at the block's offset. Output is a
//! pure function of the request, the logo, the fonts and the colors, which is
//! what makes the content-addressed cache valid.

use super::fonts::{FontError, FontProvider, REGULAR};
use super::layout::{TextBox, layout_text};
use super::logo::LogoError;
use crate::card::CardRequest;
use crate::palette::ColorScheme;
use crate::scheduler::JobPanicked;
use image::imageops;
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use thiserror::Error;

pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;

/// Top-left corner of the logo.
pub const LOGO_OFFSET: (i64, i64) = (972, 60);

const BOLD: &str = "Bold";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("font error: {0}")]
    Font(#[from] FontError),
    #[error("logo unavailable: {0}")]
    Logo(#[from] Arc<LogoError>),
    #[error(transparent)]
    Panicked(#[from] JobPanicked),
}

/// Placement and typography of one text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSlot {
    pub style: &'static str,
    pub size: f32,
    pub text_box: TextBox,
    pub offset: (i64, i64),
}

pub const SITE_NAME_SLOT: TextSlot = TextSlot {
    style: BOLD,
    size: 36.0,
    text_box: TextBox {
        width: 826,
        height: 48,
        max_lines: 1,
        spacing: 20.0,
    },
    offset: (68, 64),
};

pub const TITLE_SLOT: TextSlot = TextSlot {
    style: BOLD,
    size: 92.0,
    text_box: TextBox {
        width: 826,
        height: 328,
        max_lines: 3,
        spacing: 30.0,
    },
    offset: (64, 160),
};

pub const DESCRIPTION_SLOT: TextSlot = TextSlot {
    style: REGULAR,
    size: 28.0,
    text_box: TextBox {
        width: 826,
        height: 80,
        max_lines: 2,
        spacing: 14.0,
    },
    offset: (68, 512),
};

/// Renders cards for one build. Shared read-only by all render jobs.
#[derive(Clone)]
pub struct CardRenderer {
    fonts: Arc<dyn FontProvider>,
    colors: ColorScheme,
}

impl CardRenderer {
    pub fn new(fonts: Arc<dyn FontProvider>, colors: ColorScheme) -> Self {
        Self { fonts, colors }
    }

    /// Compose the card for `request` with an already resized `logo`.
    pub fn render(&self, request: &CardRequest, logo: &RgbaImage) -> Result<RgbaImage, RenderError> {
        let mut card = RgbaImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, self.colors.fill);
        imageops::overlay(&mut card, logo, LOGO_OFFSET.0, LOGO_OFFSET.1);

        for (slot, text) in [
            (&SITE_NAME_SLOT, request.site_name.as_str()),
            (&TITLE_SLOT, request.title.as_str()),
            (&DESCRIPTION_SLOT, request.description.as_str()),
        ] {
            let layer = self.render_text(slot, text)?;
            imageops::overlay(&mut card, &layer, slot.offset.0, slot.offset.1);
        }
        Ok(card)
    }

    /// Draw one text block onto a transparent layer the size of its box.
    pub fn render_text(&self, slot: &TextSlot, text: &str) -> Result<RgbaImage, RenderError> {
        let face = self.fonts.face(slot.style, slot.size)?;
        let layout = layout_text(&*face, &slot.text_box, text);

        let mut layer = RgbaImage::from_pixel(
            slot.text_box.width,
            slot.text_box.height,
            Rgba([0, 0, 0, 0]),
        );
        for (line, y) in layout.positioned_lines() {
            face.draw(&mut layer, line, 0.0, y, self.colors.text);
        }
        Ok(layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::logo::{LogoSource, load_resized_logo};
    use crate::test_helpers::{BlockFonts, solid_logo};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn renderer() -> CardRenderer {
        CardRenderer::new(Arc::new(BlockFonts::new()), ColorScheme::default())
    }

    fn request() -> CardRequest {
        CardRequest::new("Docs", "Getting Started", "A short guide")
    }

    #[test]
    fn card_has_fixed_size() {
        let card = renderer().render(&request(), &solid_logo(144, 144, RED)).unwrap();
        assert_eq!(card.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
    }

    #[test]
    fn background_uses_fill_color() {
        let colors = ColorScheme::default();
        let card = renderer().render(&request(), &solid_logo(144, 144, RED)).unwrap();
        assert_eq!(*card.get_pixel(0, 0), colors.fill);
        assert_eq!(*card.get_pixel(CARD_WIDTH - 1, CARD_HEIGHT - 1), colors.fill);
    }

    #[test]
    fn logo_placed_top_right() {
        let card = renderer().render(&request(), &solid_logo(144, 100, RED)).unwrap();
        assert_eq!(*card.get_pixel(972, 60), RED);
        assert_eq!(*card.get_pixel(972 + 143, 60 + 99), RED);
        assert_ne!(*card.get_pixel(971, 60), RED);
        assert_ne!(*card.get_pixel(972, 60 + 100), RED);
    }

    #[test]
    fn builtin_icon_visible_on_card() {
        let colors = ColorScheme::default();
        let logo = load_resized_logo(&LogoSource::Builtin {
            fill: colors.text_css(),
        })
        .unwrap();
        let card = renderer().render(&request(), &logo).unwrap();

        let (x0, y0) = (LOGO_OFFSET.0 as u32, LOGO_OFFSET.1 as u32);
        let inked = (x0..x0 + logo.width())
            .flat_map(|x| (y0..y0 + logo.height()).map(move |y| (x, y)))
            .filter(|&(x, y)| *card.get_pixel(x, y) != colors.fill)
            .count();
        assert!(inked > 2000, "only {inked} logo pixels drawn");
    }

    #[test]
    fn transparent_logo_keeps_background() {
        let card = renderer()
            .render(&request(), &solid_logo(144, 144, Rgba([0, 0, 0, 0])))
            .unwrap();
        assert_eq!(*card.get_pixel(1000, 100), ColorScheme::default().fill);
    }

    #[test]
    fn title_drawn_in_text_color() {
        let colors = ColorScheme::default();
        let card = renderer().render(&request(), &solid_logo(144, 144, RED)).unwrap();
        // BlockFace(92): first glyph spans x 0..36, ink from y 15 down
        let (x, y) = (TITLE_SLOT.offset.0 as u32 + 10, TITLE_SLOT.offset.1 as u32 + 40);
        assert_eq!(*card.get_pixel(x, y), colors.text);
    }

    #[test]
    fn text_color_override_applies() {
        let colors = ColorScheme {
            fill: Rgba([0, 0, 0, 255]),
            text: Rgba([0, 255, 0, 255]),
        };
        let renderer = CardRenderer::new(Arc::new(BlockFonts::new()), colors);
        let card = renderer.render(&request(), &solid_logo(144, 144, RED)).unwrap();
        let (x, y) = (TITLE_SLOT.offset.0 as u32 + 10, TITLE_SLOT.offset.1 as u32 + 40);
        assert_eq!(*card.get_pixel(x, y), colors.text);
        assert_eq!(*card.get_pixel(5, 5), colors.fill);
    }

    #[test]
    fn render_is_deterministic() {
        let logo = solid_logo(144, 144, RED);
        let a = renderer().render(&request(), &logo).unwrap();
        let b = renderer().render(&request(), &logo).unwrap();
        assert_eq!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn different_titles_render_differently() {
        let logo = solid_logo(144, 144, RED);
        let a = renderer().render(&request(), &logo).unwrap();
        let other = CardRequest::new("Docs", "Installation guide", "A short guide");
        let b = renderer().render(&other, &logo).unwrap();
        assert_ne!(a.as_raw(), b.as_raw());
    }

    #[test]
    fn text_layer_matches_box() {
        let layer = renderer().render_text(&DESCRIPTION_SLOT, "Some text").unwrap();
        assert_eq!(layer.dimensions(), (826, 80));
        assert!(layer.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn empty_text_leaves_layer_transparent() {
        let layer = renderer().render_text(&TITLE_SLOT, "").unwrap();
        assert!(layer.pixels().all(|p| p.0[3] == 0));
    }

    #[test]
    fn slots_request_expected_faces() {
        let fonts = Arc::new(BlockFonts::new());
        let renderer = CardRenderer::new(fonts.clone(), ColorScheme::default());
        renderer.render(&request(), &solid_logo(1, 1, RED)).unwrap();
        assert_eq!(
            fonts.requests(),
            vec![
                ("Bold".to_string(), 36.0),
                ("Bold".to_string(), 92.0),
                ("Regular".to_string(), 28.0),
            ]
        );
    }

    #[test]
    fn font_failure_is_render_error() {
        let renderer = CardRenderer::new(Arc::new(BlockFonts::failing()), ColorScheme::default());
        let err = renderer.render(&request(), &solid_logo(1, 1, RED)).unwrap_err();
        assert!(matches!(err, RenderError::Font(_)));
    }

    #[test]
    fn slots_fit_on_canvas() {
        for slot in [SITE_NAME_SLOT, TITLE_SLOT, DESCRIPTION_SLOT] {
            assert!(slot.offset.0 as u32 + slot.text_box.width <= CARD_WIDTH);
            assert!(slot.offset.1 as u32 + slot.text_box.height <= CARD_HEIGHT);
        }
    }
}
