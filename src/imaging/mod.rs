//! Card imaging, pure Rust.
//!
//! | Step | Crate / function |
//! |---|---|
//! | **Measure & draw text** | `rusttype` glyph layout and coverage |
//! | **Rasterize SVG logos** | `resvg` at 10× oversampling |
//! | **Resize logo** | `image::imageops::resize`, Lanczos3 |
//! | **Composite** | `image::imageops::overlay` (alpha blending) |
//!
//! The module is split into:
//! - **Layout**: word wrap and vertical placement against a [`TextMeasure`]
//! - **Fonts**: font file resolution and the per-build face cache
//! - **Logo**: locating, loading, and resizing the logo
//! - **Compositor**: fixed card geometry and layer composition

pub mod compositor;
pub mod fonts;
pub mod layout;
pub mod logo;

pub use compositor::{CARD_HEIGHT, CARD_WIDTH, CardRenderer, RenderError};
pub use fonts::{FontError, FontProvider, FontSet, RusttypeFonts, TextFace};
pub use layout::{TextBox, TextExtent, TextLayout, TextMeasure, layout_text, wrap_lines};
pub use logo::{LOGO_WIDTH, LogoError, LogoSource, load_resized_logo, locate_logo};
