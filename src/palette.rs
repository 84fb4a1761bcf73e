//! Card color scheme resolution.
//!
//! Card colors come from three places, later ones winning:
//!
//! 1. the stock default (`indigo`),
//! 2. the theme palette's `primary` color, looked up in [`PALETTE`],
//! 3. explicit `cards_layout_options.background_color` / `color` overrides.
//!
//! The result is a [`ColorScheme`] built once per build and shared by every
//! render job.

use crate::config::{LayoutOptions, ThemeSettings};
use image::Rgba;

/// Named theme colors as `(name, fill, text)`.
pub const PALETTE: &[(&str, &str, &str)] = &[
    ("red", "#ef5552", "#ffffff"),
    ("pink", "#e92063", "#ffffff"),
    ("purple", "#ab47bd", "#ffffff"),
    ("deep-purple", "#7e56c2", "#ffffff"),
    ("indigo", "#4051b5", "#ffffff"),
    ("blue", "#2094f3", "#ffffff"),
    ("light-blue", "#02a6f2", "#ffffff"),
    ("cyan", "#00bdd6", "#ffffff"),
    ("teal", "#009485", "#ffffff"),
    ("green", "#4cae4f", "#ffffff"),
    ("light-green", "#8bc34b", "#ffffff"),
    ("lime", "#cbdc38", "#000000"),
    ("yellow", "#ffec3d", "#000000"),
    ("amber", "#ffc105", "#000000"),
    ("orange", "#ffa724", "#000000"),
    ("deep-orange", "#ff6e42", "#ffffff"),
    ("brown", "#795649", "#ffffff"),
    ("grey", "#757575", "#ffffff"),
    ("blue-grey", "#546d78", "#ffffff"),
    ("black", "#000000", "#ffffff"),
    ("white", "#ffffff", "#000000"),
];

const DEFAULT_COLOR: &str = "indigo";

/// Fill and text colors for one build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorScheme {
    pub fill: Rgba<u8>,
    pub text: Rgba<u8>,
}

impl ColorScheme {
    /// Look up a named palette color. Spaces are treated as dashes
    /// (`"deep purple"` → `deep-purple`).
    pub fn named(name: &str) -> Option<Self> {
        let key = name.trim().replace(' ', "-");
        PALETTE
            .iter()
            .find(|(n, _, _)| *n == key)
            .and_then(|(_, fill, text)| {
                Some(Self {
                    fill: parse_hex(fill)?,
                    text: parse_hex(text)?,
                })
            })
    }

    /// Resolve the scheme for a build from theme settings and overrides.
    ///
    /// Unknown palette names fall back to the default; override values that
    /// fail to parse are ignored (config validation rejects them earlier).
    pub fn resolve(theme: &ThemeSettings, options: &LayoutOptions) -> Self {
        let mut scheme = theme
            .primary_color()
            .and_then(Self::named)
            .unwrap_or_else(Self::default);

        if let Some(fill) = options.background_color.as_deref().and_then(parse_hex) {
            scheme.fill = fill;
        }
        if let Some(text) = options.color.as_deref().and_then(parse_hex) {
            scheme.text = text;
        }
        scheme
    }

    /// Text color as a CSS hex string, for tinting SVG icons.
    pub fn text_css(&self) -> String {
        to_css(self.text)
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::named(DEFAULT_COLOR).unwrap_or(Self {
            fill: Rgba([0x40, 0x51, 0xb5, 0xff]),
            text: Rgba([0xff, 0xff, 0xff, 0xff]),
        })
    }
}

/// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
pub fn parse_hex(value: &str) -> Option<Rgba<u8>> {
    let digits = value.trim().trim_start_matches('#');
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return None,
    };
    let bytes = hex::decode(expanded).ok()?;
    let alpha = bytes.get(3).copied().unwrap_or(0xff);
    Some(Rgba([bytes[0], bytes[1], bytes[2], alpha]))
}

/// Format a color as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
pub fn to_css(color: Rgba<u8>) -> String {
    let [r, g, b, a] = color.0;
    if a == 0xff {
        format!("#{}", hex::encode([r, g, b]))
    } else {
        format!("#{}", hex::encode([r, g, b, a]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PaletteEntry, PaletteSetting};

    fn theme_with_primary(primary: &str) -> ThemeSettings {
        ThemeSettings {
            palette: Some(PaletteSetting::Single(PaletteEntry {
                primary: Some(primary.to_string()),
                ..Default::default()
            })),
            ..Default::default()
        }
    }

    #[test]
    fn parse_hex_formats() {
        assert_eq!(parse_hex("#4051b5"), Some(Rgba([0x40, 0x51, 0xb5, 0xff])));
        assert_eq!(parse_hex("fff"), Some(Rgba([0xff, 0xff, 0xff, 0xff])));
        assert_eq!(parse_hex("#00000080"), Some(Rgba([0, 0, 0, 0x80])));
        assert_eq!(parse_hex("#12345"), None);
        assert_eq!(parse_hex("#gggggg"), None);
        assert_eq!(parse_hex(""), None);
    }

    #[test]
    fn to_css_omits_opaque_alpha() {
        assert_eq!(to_css(Rgba([0xab, 0x47, 0xbd, 0xff])), "#ab47bd");
        assert_eq!(to_css(Rgba([0, 0, 0, 0x80])), "#00000080");
    }

    #[test]
    fn default_scheme_is_indigo() {
        let scheme = ColorScheme::default();
        assert_eq!(to_css(scheme.fill), "#4051b5");
        assert_eq!(scheme.text_css(), "#ffffff");
    }

    #[test]
    fn palette_has_all_colors() {
        assert_eq!(PALETTE.len(), 21);
        for (name, _, _) in PALETTE {
            assert!(ColorScheme::named(name).is_some(), "{name} must parse");
        }
    }

    #[test]
    fn named_accepts_spaces() {
        let scheme = ColorScheme::named("deep purple").unwrap();
        assert_eq!(to_css(scheme.fill), "#7e56c2");
    }

    #[test]
    fn resolve_uses_palette_primary() {
        let scheme = ColorScheme::resolve(&theme_with_primary("amber"), &LayoutOptions::default());
        assert_eq!(to_css(scheme.fill), "#ffc105");
        assert_eq!(to_css(scheme.text), "#000000");
    }

    #[test]
    fn resolve_unknown_primary_keeps_default() {
        let scheme =
            ColorScheme::resolve(&theme_with_primary("custom"), &LayoutOptions::default());
        assert_eq!(scheme, ColorScheme::default());
    }

    #[test]
    fn resolve_overrides_win() {
        let options = LayoutOptions {
            background_color: Some("#ff1493".into()),
            color: Some("#000".into()),
            font_family: None,
        };
        let scheme = ColorScheme::resolve(&theme_with_primary("teal"), &options);
        assert_eq!(to_css(scheme.fill), "#ff1493");
        assert_eq!(to_css(scheme.text), "#000000");
    }
}
