//! Build lifecycle for social cards.
//!
//! The host generator drives three hooks:
//!
//! ```text
//! SocialCards::configure(&config)   resolve colors and fonts, open the cache,
//!                                   start loading the logo in the background
//!         │
//!         ▼
//! on_page(&mut page)  × N           validate title/description, submit the
//!                                   render job, return + inject meta tags
//!         │
//!         ▼
//! post_build()                      wait for every job; first failure wins
//! ```
//!
//! Configuration and validation problems fail immediately. Anything that goes
//! wrong inside a render job (fonts, logo, encoding, copying) is held until
//! [`SocialCards::post_build`], so pages keep streaming while cards render.
//!
//! With `social.enabled = false` the instance holds no state at all and every
//! hook returns immediately.

use crate::cache::{CacheError, CacheStats, CacheStatus, RenderCache};
use crate::card::{CardRequest, Fingerprint};
use crate::config::{BuildConfig, ConfigError, SiteSettings};
use crate::imaging::compositor::{CardRenderer, DESCRIPTION_SLOT, RenderError};
use crate::imaging::fonts::{FontError, FontProvider, FontSet, REGULAR, RusttypeFonts};
use crate::imaging::logo::{LogoError, load_resized_logo, locate_logo};
use crate::meta::{self, MetaTag, PageMeta};
use crate::palette::ColorScheme;
use crate::scheduler::{JobPanicked, JobPool, JobSet, PoolError, SharedJob};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Font family used when neither the cards nor the theme name one.
pub const DEFAULT_FONT_FAMILY: &str = "Roboto";

#[derive(Error, Debug)]
pub enum SocialError {
    #[error("cannot render social cards: {0}")]
    Configuration(#[from] FontError),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("page meta {field} of '{page}' must be a string, but is of type \"{found}\"")]
    Validation {
        page: String,
        field: &'static str,
        found: &'static str,
    },
    #[error("failed to render card: {0}")]
    Render(#[from] RenderError),
    #[error(transparent)]
    Io(#[from] CacheError),
}

impl From<JobPanicked> for SocialError {
    fn from(e: JobPanicked) -> Self {
        SocialError::Render(RenderError::Panicked(e))
    }
}

/// A page as handed over by the host generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Source path relative to `docs_dir`, e.g. `guide/setup.md`.
    pub src_path: String,
    /// Title the host derived for the page (first heading, nav title, ...).
    pub title: String,
    /// Front matter. Generated tags are appended to its `meta` list.
    #[serde(default)]
    pub meta: serde_json::Map<String, Value>,
    #[serde(default)]
    pub is_homepage: bool,
    #[serde(default)]
    pub canonical_url: Option<String>,
}

/// One finished card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardReport {
    pub page: String,
    pub fingerprint: Fingerprint,
    /// Where the card was copied in the site directory.
    pub dest: PathBuf,
    pub status: CacheStatus,
}

/// Outcome of the post-build barrier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Cards in page order.
    pub cards: Vec<CardReport>,
    pub stats: CacheStats,
}

type Logo = Arc<RgbaImage>;

struct BuildState {
    site: SiteSettings,
    cards_dir: String,
    renderer: Arc<CardRenderer>,
    cache: Arc<RenderCache>,
    logo: SharedJob<Logo, LogoError>,
    jobs: JobSet<CardReport, SocialError>,
    pool: JobPool,
}

/// Social card generation for one build.
pub struct SocialCards {
    state: Option<BuildState>,
}

impl SocialCards {
    /// Configure a build, resolving fonts from `cache_dir`.
    ///
    /// Fonts are resolved and the Regular face parsed right here, so a
    /// missing or broken font stops the build before any page is processed.
    pub fn configure(config: &BuildConfig) -> Result<Self, SocialError> {
        if !config.social.enabled {
            return Ok(Self::disabled());
        }

        let family = font_family(config);
        let set = FontSet::resolve(&config.social.cache_dir, family)?;
        tracing::debug!(family, styles = ?set.styles().collect::<Vec<_>>(), "resolved fonts");

        let fonts = RusttypeFonts::new(set);
        fonts.face(REGULAR, DESCRIPTION_SLOT.size)?;

        Self::configure_with_fonts(config, Arc::new(fonts))
    }

    /// Configure a build with an explicit font provider.
    pub fn configure_with_fonts(
        config: &BuildConfig,
        fonts: Arc<dyn FontProvider>,
    ) -> Result<Self, SocialError> {
        if !config.social.enabled {
            return Ok(Self::disabled());
        }
        config.validate()?;

        let social = &config.social;
        let colors = ColorScheme::resolve(&config.theme, &social.cards_layout_options);
        let pool = JobPool::new(social.workers)?;
        let cache = RenderCache::open(&social.cache_dir)?;

        // Submitted before any render job, which all wait on it.
        let theme = config.theme.clone();
        let docs_dir = config.site.docs_dir.clone();
        let fill = colors.text_css();
        let logo = pool.submit_shared(move || {
            let source = locate_logo(&theme, &docs_dir, &fill)?;
            tracing::debug!(?source, "loading logo");
            load_resized_logo(&source).map(Arc::new)
        });

        if config.site.site_url.is_none() {
            tracing::warn!(
                "site_url is not set: social cards are generated but not linked with absolute URLs"
            );
        }

        Ok(Self {
            state: Some(BuildState {
                site: config.site.clone(),
                cards_dir: social.cards_dir.clone(),
                renderer: Arc::new(CardRenderer::new(fonts, colors)),
                cache: Arc::new(cache),
                logo,
                jobs: JobSet::new(),
                pool,
            }),
        })
    }

    /// An instance whose hooks do nothing.
    pub fn disabled() -> Self {
        Self { state: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// Render jobs submitted so far.
    pub fn pending(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.jobs.len())
    }

    /// Submit the card for `page` and append its meta tags to `page.meta`.
    ///
    /// Returns the generated tags. A non-string `title` or `description` in
    /// the page metadata is a [`SocialError::Validation`].
    pub fn on_page(&mut self, page: &mut Page) -> Result<Vec<MetaTag>, SocialError> {
        let Some(state) = self.state.as_mut() else {
            return Ok(Vec::new());
        };

        let title = match string_meta(page, "title")? {
            Some(title) => title,
            None => page.title.clone(),
        };
        let description = match string_meta(page, "description")? {
            Some(description) => description,
            None => state.site.site_description.clone().unwrap_or_default(),
        };

        let request = CardRequest::new(state.site.site_name.as_str(), title, description);
        let fingerprint = request.fingerprint();
        let dest = meta::card_path(&state.site.site_dir, &state.cards_dir, &page.src_path);

        let job = {
            let renderer = Arc::clone(&state.renderer);
            let cache = Arc::clone(&state.cache);
            let logo = state.logo.clone();
            let request = request.clone();
            let page = page.src_path.clone();
            move || -> Result<CardReport, SocialError> {
                let fingerprint = request.fingerprint();
                let outcome = cache.publish(&fingerprint, &dest, || {
                    let logo = logo.wait().map_err(RenderError::from)?;
                    Ok::<_, SocialError>(renderer.render(&request, &logo)?)
                })?;
                Ok(CardReport {
                    page,
                    fingerprint,
                    dest,
                    status: outcome.status,
                })
            }
        };
        state.jobs.push(state.pool.submit(job));
        tracing::debug!(page = %page.src_path, %fingerprint, "card submitted");

        let image_url = meta::card_url(
            state.site.site_url.as_deref(),
            &state.cards_dir,
            &page.src_path,
        );
        let tags = meta::generate_meta(&PageMeta {
            title: &request.title,
            description: &request.description,
            site_name: &state.site.site_name,
            is_homepage: page.is_homepage,
            image_url: &image_url,
            canonical_url: page.canonical_url.as_deref(),
        });
        append_meta(page, &tags);
        Ok(tags)
    }

    /// Wait for every submitted card. Returns the first failure in page order.
    pub fn post_build(self) -> Result<BuildReport, SocialError> {
        let Some(state) = self.state else {
            return Ok(BuildReport::default());
        };

        let cards = state.jobs.join_all()?;
        let stats = state.cache.stats();
        tracing::info!(cards = cards.len(), %stats, "social cards ready");
        Ok(BuildReport { cards, stats })
    }
}

/// Family from the layout options, then the theme, then the default.
pub fn font_family(config: &BuildConfig) -> &str {
    config
        .social
        .cards_layout_options
        .font_family
        .as_deref()
        .or_else(|| config.theme.text_font())
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FONT_FAMILY)
}

/// Read a string field from the page metadata. Absent is `None`; any other
/// JSON type is a validation error.
fn string_meta(page: &Page, field: &'static str) -> Result<Option<String>, SocialError> {
    match page.meta.get(field) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => {
            let found = json_type(other);
            tracing::error!(page = %page.src_path, field, found, "page meta must be a string");
            Err(SocialError::Validation {
                page: page.src_path.clone(),
                field,
                found,
            })
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Append `tags` to the page's `meta` list, keeping existing entries.
fn append_meta(page: &mut Page, tags: &[MetaTag]) {
    let generated = tags.iter().map(MetaTag::to_json);
    match page.meta.get_mut("meta") {
        Some(Value::Array(existing)) => existing.extend(generated),
        Some(other) => {
            tracing::warn!(page = %page.src_path, found = json_type(other), "page meta.meta is not a list, replacing it");
            *other = Value::Array(generated.collect());
        }
        None => {
            page.meta
                .insert("meta".to_string(), Value::Array(generated.collect()));
        }
    }
}
