//! # Social Cards
//!
//! Build-time generation of Open Graph preview images ("social cards") for
//! documentation sites. For every page the site name, title, and description
//! are rendered onto a 1200×630 card with the site's colors and logo, and the
//! matching `og:*` / `twitter:*` meta tags are produced for the page template.
//!
//! # Architecture: Submit Now, Block Later
//!
//! Card generation hooks into the three phases of a host site build:
//!
//! ```text
//! 1. Configure   config     →  colors, fonts, cache, logo job (background)
//! 2. Per page    page meta  →  render job submitted + meta tags returned
//! 3. Post-build  barrier    →  every job joined, first failure fails the build
//! ```
//!
//! Pages are never held up by rendering: a page only computes its fingerprint
//! and tags synchronously, and the expensive work runs on a small worker pool
//! ([`scheduler`]) that is drained once after the last page.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`social`] | Lifecycle orchestrator: configure → per page → post-build |
//! | [`config`] | `social.toml` loading, legacy option migration, validation |
//! | [`palette`] | Theme palette table and card color resolution |
//! | [`card`] | Card requests and their MD5 content fingerprints |
//! | [`imaging`] | Text layout, fonts, logo loading, and card composition |
//! | [`cache`] | Content-addressed on-disk render cache |
//! | [`scheduler`] | Bounded worker pool, shared jobs, and the join-all barrier |
//! | [`meta`] | Open Graph / Twitter meta tags and card URLs |
//! | [`readtime`] | HTML text/image scanner and reading time estimate |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Content-Addressed Cards
//!
//! A card is a pure function of its text, so the cache key is the MD5 of the
//! site name, title, and description, and nothing else. Pages can move freely
//! without re-rendering, identical pages share one file, and a warm cache
//! makes repeated builds nearly free. The flip side is that theme changes
//! (colors, logo, font) need a manual cache clear.
//!
//! ## Deterministic Rendering
//!
//! The compositor has no randomness and no timestamps; the same inputs give
//! byte-identical PNGs. Without that the content-addressed cache would be
//! unsound.
//!
//! ## Pure-Rust Imaging
//!
//! Text is rasterized with `rusttype`, SVG logos with `resvg`, and everything
//! else is `image`. No system libraries, no Cairo, no FreeType.
//!
//! ## Fail Fast vs. Fail at the Barrier
//!
//! Configuration errors (no usable font) and invalid page metadata stop the
//! build on the spot. Failures inside render jobs are held until the
//! post-build barrier, which reports the first one in page order.

pub mod cache;
pub mod card;
pub mod config;
pub mod imaging;
pub mod meta;
pub mod output;
pub mod palette;
pub mod readtime;
pub mod scheduler;
pub mod social;

#[cfg(test)]
pub(crate) mod test_helpers;
