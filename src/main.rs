use clap::{Parser, Subcommand};
use social_cards::cache::RenderCache;
use social_cards::card::CardRequest;
use social_cards::imaging::{
    CardRenderer, FontSet, RenderError, RusttypeFonts, load_resized_logo, locate_logo,
};
use social_cards::meta::MetaTag;
use social_cards::palette::ColorScheme;
use social_cards::readtime::{self, ReadtimeScanner};
use social_cards::social::{self, Page, SocialCards, SocialError};
use social_cards::{config, output};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "social-cards")]
#[command(about = "Open Graph preview cards for documentation sites")]
#[command(long_about = "\
Open Graph preview cards for documentation sites

Every page gets a 1200x630 PNG card showing the site name, page title and
description on the theme color, plus the og:* and twitter:* meta tags that
point at it.

Layout:

  social.toml                       # Config (optional, defaults below)
  docs/                             # Sources; theme.logo is relative to this
  .cache/plugin/social/             # Card cache and font files
  │   ├── Roboto/Roboto-Regular.ttf # Font family, at least Regular
  │   ├── Roboto/Roboto-Bold.ttf
  │   └── <md5>.png                 # Cached cards, keyed by content
  site/assets/images/social/        # Cards copied per page

Cards are cached by the MD5 of site name + title + description. Delete the
cache directory after changing colors, logo or font.

Run 'social-cards gen-config' to generate a documented social.toml.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = "social.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a single card and copy it to a file
    Card {
        /// Card title
        #[arg(long)]
        title: String,
        /// Card description (defaults to site_description)
        #[arg(long)]
        description: Option<String>,
        /// Where to write the PNG
        #[arg(long)]
        output: PathBuf,
    },
    /// Generate cards and meta tags for a JSON list of pages
    Build {
        /// JSON array of pages ({src_path, title, meta, is_homepage, canonical_url})
        #[arg(long)]
        pages: PathBuf,
        /// Where to write the generated meta tags, keyed by page
        #[arg(long, default_value = "social-meta.json")]
        meta: PathBuf,
    },
    /// Estimate the reading time of an HTML file
    Readtime {
        html: PathBuf,
        #[arg(long, default_value_t = readtime::DEFAULT_WORDS_PER_MINUTE)]
        words_per_minute: u32,
    },
    /// Print a stock social.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("social_cards=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Card {
            title,
            description,
            output,
        } => {
            let config = config::load_config(&cli.config)?;
            let colors = ColorScheme::resolve(&config.theme, &config.social.cards_layout_options);
            let set = FontSet::resolve(&config.social.cache_dir, social::font_family(&config))?;
            let renderer = CardRenderer::new(Arc::new(RusttypeFonts::new(set)), colors);
            let cache = RenderCache::open(&config.social.cache_dir)?;

            let description = description
                .or_else(|| config.site.site_description.clone())
                .unwrap_or_default();
            let request = CardRequest::new(config.site.site_name.as_str(), title, description);
            let fingerprint = request.fingerprint();
            let outcome = cache.publish(&fingerprint, &output, || {
                let logo = locate_logo(&config.theme, &config.site.docs_dir, &colors.text_css())
                    .and_then(|source| load_resized_logo(&source))
                    .map_err(|e| RenderError::from(Arc::new(e)))?;
                Ok::<_, SocialError>(renderer.render(&request, &logo)?)
            })?;
            output::print_card_output(&request.title, &fingerprint, &outcome, &output);
        }
        Command::Build { pages, meta } => {
            let config = config::load_config(&cli.config)?;
            let content = std::fs::read_to_string(&pages)?;
            let mut pages: Vec<Page> = serde_json::from_str(&content)?;

            let mut cards = SocialCards::configure(&config)?;
            let mut tags: BTreeMap<String, Vec<MetaTag>> = BTreeMap::new();
            for page in &mut pages {
                match cards.on_page(page) {
                    Ok(page_tags) => {
                        tags.insert(page.src_path.clone(), page_tags);
                    }
                    Err(e @ SocialError::Validation { .. }) => {
                        eprintln!("error: {e}");
                        std::process::exit(1);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            let report = cards.post_build()?;

            std::fs::write(&meta, serde_json::to_string_pretty(&tags)?)?;
            output::print_build_output(&report, &config.site.site_dir);
            println!("Meta tags → {}", meta.display());
        }
        Command::Readtime {
            html,
            words_per_minute,
        } => {
            let content = std::fs::read_to_string(&html)?;
            let mut scanner = ReadtimeScanner::new();
            scanner.feed(&content);
            let minutes = readtime::minutes_for(scanner.words(), scanner.images(), words_per_minute);
            output::print_readtime_output(scanner.words(), scanner.images(), minutes);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
