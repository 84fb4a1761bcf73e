//! Build configuration module.
//!
//! Handles loading, migrating, and validating the `social.toml` file that
//! describes the site, its theme, and the social card options. Everything is
//! resolved once at configuration time into plain typed structs that the rest
//! of the build borrows; nothing here is global.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! site_name = "Documentation"
//! # site_url = "https://example.com/"
//! # site_description = "..."
//! docs_dir = "docs"
//! site_dir = "site"
//!
//! [theme]
//! # palette = { primary = "deep purple" }   # or a list; first entry wins
//! # logo = "assets/logo.png"                # relative to docs_dir
//! # icon = { logo = "material/library" }
//! # font = { text = "Roboto" }
//! # custom_dir = "overrides"
//! # icons_dir = "icons"
//!
//! [social]
//! enabled = true
//! cache_dir = ".cache/plugin/social"
//! cards_dir = "assets/images/social"
//! workers = 4
//!
//! [social.cards_layout_options]
//! # background_color = "#4051b5"
//! # color = "#ffffff"
//! # font_family = "Roboto"
//! ```
//!
//! ## Legacy Options
//!
//! Older configurations put card colors and font under `cards_color` and
//! `cards_font`. They are still accepted and are moved into
//! `cards_layout_options` by [`SocialConfig::migrate`] right after parsing,
//! so no other module ever sees them.
//!
//! Unknown keys are rejected to catch typos early.

use crate::palette;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Complete build configuration loaded from `social.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Site-level settings supplied by the host generator.
    pub site: SiteSettings,
    /// Theme settings (palette, logo, font).
    pub theme: ThemeSettings,
    /// Social card options.
    pub social: SocialConfig,
}

impl BuildConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.social.validate()
    }
}

/// Site settings the cards and meta tags are derived from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSettings {
    /// Rendered on every card and appended to page titles.
    pub site_name: String,
    /// Absolute base URL. Without it the meta tags use relative image URLs.
    pub site_url: Option<String>,
    /// Fallback description for pages without their own.
    pub site_description: Option<String>,
    /// Documentation source directory (logo paths are relative to it).
    pub docs_dir: PathBuf,
    /// Build output directory (cards are copied below it).
    pub site_dir: PathBuf,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Documentation".to_string(),
            site_url: None,
            site_description: None,
            docs_dir: PathBuf::from("docs"),
            site_dir: PathBuf::from("site"),
        }
    }
}

/// Theme settings consumed by the card renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThemeSettings {
    pub palette: Option<PaletteSetting>,
    /// Logo image path relative to `docs_dir`. Takes precedence over `icon`.
    pub logo: Option<String>,
    pub icon: Option<IconSettings>,
    pub font: Option<FontSetting>,
    /// Theme override directory searched before `docs_dir` and `icons_dir`.
    pub custom_dir: Option<PathBuf>,
    /// Directory holding `<set>/<name>.svg` icon files.
    pub icons_dir: Option<PathBuf>,
}

impl ThemeSettings {
    /// Primary color name of the first configured palette, if any.
    pub fn primary_color(&self) -> Option<&str> {
        let entry = match self.palette.as_ref()? {
            PaletteSetting::Single(entry) => entry,
            PaletteSetting::List(entries) => entries.first()?,
        };
        entry.primary.as_deref().filter(|p| !p.is_empty())
    }

    /// Text font family configured on the theme, if any.
    pub fn text_font(&self) -> Option<&str> {
        match self.font.as_ref()? {
            FontSetting::Families { text, .. } => text.as_deref(),
            FontSetting::Disabled(_) => None,
        }
    }

    /// Icon name used as logo when no logo image is configured.
    pub fn icon_logo(&self) -> Option<&str> {
        self.icon
            .as_ref()
            .and_then(|icon| icon.logo.as_deref())
            .filter(|logo| !logo.is_empty())
    }
}

/// A palette is either a single entry or a list of toggleable schemes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PaletteSetting {
    Single(PaletteEntry),
    List(Vec<PaletteEntry>),
}

/// One palette scheme. Keys other than `primary` are irrelevant to cards and
/// accepted as-is (palettes carry toggles, media queries, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub scheme: Option<String>,
    pub primary: Option<String>,
    pub accent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconSettings {
    pub logo: Option<String>,
}

/// `font = false` disables web fonts; otherwise families per role.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FontSetting {
    Disabled(bool),
    Families {
        text: Option<String>,
        code: Option<String>,
    },
}

/// Social card options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocialConfig {
    /// Master switch. When false every lifecycle hook is a no-op.
    pub enabled: bool,
    /// Directory holding rendered cards and font files across builds.
    pub cache_dir: PathBuf,
    /// Output directory for cards, relative to `site_dir` and `site_url`.
    pub cards_dir: String,
    /// Render worker pool size.
    pub workers: usize,
    pub cards_layout_options: LayoutOptions,

    /// Legacy: mirrors `enabled`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards: Option<bool>,
    /// Legacy: moved to `cards_layout_options.background_color` / `color`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards_color: Option<LegacyCardsColor>,
    /// Legacy: moved to `cards_layout_options.font_family`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cards_font: Option<String>,
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cache_dir: PathBuf::from(".cache/plugin/social"),
            cards_dir: "assets/images/social".to_string(),
            workers: DEFAULT_WORKERS,
            cards_layout_options: LayoutOptions::default(),
            cards: None,
            cards_color: None,
            cards_font: None,
        }
    }
}

/// Pool size used when `workers` is not configured.
pub const DEFAULT_WORKERS: usize = 4;

/// Layout overrides for card rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutOptions {
    pub background_color: Option<String>,
    pub color: Option<String>,
    pub font_family: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LegacyCardsColor {
    pub fill: Option<String>,
    pub text: Option<String>,
}

impl SocialConfig {
    /// Move legacy options into their current location.
    ///
    /// Legacy values win over anything already in `cards_layout_options`,
    /// matching how the options were applied historically. After this call
    /// the legacy fields are `None`.
    pub fn migrate(&mut self) {
        if let Some(cards) = self.cards.take()
            && cards != self.enabled
        {
            tracing::warn!(
                cards,
                enabled = self.enabled,
                "social.cards is deprecated and ignored; use social.enabled"
            );
        }

        if let Some(color) = self.cards_color.take() {
            if let Some(fill) = color.fill.filter(|v| !v.is_empty()) {
                self.cards_layout_options.background_color = Some(fill);
            }
            if let Some(text) = color.text.filter(|v| !v.is_empty()) {
                self.cards_layout_options.color = Some(text);
            }
        }

        if let Some(font) = self.cards_font.take().filter(|v| !v.is_empty()) {
            self.cards_layout_options.font_family = Some(font);
        }
    }

    /// Validate option values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Validation(
                "social.workers must be at least 1".into(),
            ));
        }
        if Path::new(&self.cards_dir).is_absolute() {
            return Err(ConfigError::Validation(
                "social.cards_dir must be relative to the site directory".into(),
            ));
        }
        let options = &self.cards_layout_options;
        for (key, value) in [
            ("background_color", &options.background_color),
            ("color", &options.color),
        ] {
            if let Some(value) = value
                && palette::parse_hex(value).is_none()
            {
                return Err(ConfigError::Validation(format!(
                    "social.cards_layout_options.{key}: invalid color {value:?} (expected #rgb, #rrggbb or #rrggbbaa)"
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// Config loading
// =============================================================================

/// Parse, migrate, and validate configuration text.
pub fn parse_config(content: &str) -> Result<BuildConfig, ConfigError> {
    let mut config: BuildConfig = toml::from_str(content)?;
    config.social.migrate();
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path`.
///
/// Returns the defaults if the file does not exist. Returns `Err` if the file
/// exists but contains invalid TOML, unknown keys, or invalid values.
pub fn load_config(path: &Path) -> Result<BuildConfig, ConfigError> {
    if !path.exists() {
        return Ok(BuildConfig::default());
    }
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Returns a fully-commented stock `social.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Social Cards Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Rendered on every card and appended to page titles (except the homepage).
site_name = "Documentation"

# Absolute base URL of the published site. Without it cards are still
# generated, but the meta tags point at relative URLs that social
# platforms cannot resolve.
# site_url = "https://example.com/"

# Fallback description for pages that don't set their own.
# site_description = "Project documentation"

# Documentation sources (logo paths are relative to this).
docs_dir = "docs"

# Build output. Cards are copied to <site_dir>/<cards_dir>/.
site_dir = "site"

# ---------------------------------------------------------------------------
# Theme
# ---------------------------------------------------------------------------
[theme]
# Palette primary color selects the card background and text colors.
# A list of palettes is accepted; the first entry is used.
# palette = { primary = "indigo" }

# Logo image, relative to docs_dir. PNG, JPEG, WebP and SVG are supported.
# logo = "assets/logo.svg"

# Icon used when no logo image is set, looked up as <icons_dir>/<name>.svg.
# icon = { logo = "material/library" }

# Text font family. Font files named <Family>-<Style>.ttf must be present
# somewhere below social.cache_dir.
# font = { text = "Roboto" }

# Override directory searched first for logos and .icons/.
# custom_dir = "overrides"

# icons_dir = "icons"

# ---------------------------------------------------------------------------
# Social cards
# ---------------------------------------------------------------------------
[social]
enabled = true

# Rendered cards are kept here across builds, keyed by content. Delete the
# directory to force every card to be rendered again.
cache_dir = ".cache/plugin/social"

# Output directory for cards, relative to site_dir and site_url.
cards_dir = "assets/images/social"

# Number of parallel render workers.
workers = 4

[social.cards_layout_options]
# Card background and text colors (#rgb, #rrggbb or #rrggbbaa).
# Defaults come from the theme palette.
# background_color = "#4051b5"
# color = "#ffffff"

# Font family, overrides theme.font.text.
# font_family = "Roboto"
"##
}
