//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Output is **page-centric, not file-centric**. Each card leads with its
//! positional index and the page it belongs to, with the output path and
//! cache status as indented context. This reads as an inventory of the site's
//! cards while still letting users find each file.
//!
//! # Output Format
//!
//! ## Build
//!
//! ```text
//! Cards
//! 001 index.md → assets/images/social/index.png
//!     Card: 0b1c2f6a7d8e9f00112233445566778a (cached)
//! 002 guide/setup.md → assets/images/social/guide/setup.png
//!     Card: 5a105e8b9d40e1329780d62ea2265d8a (rendered)
//!
//! Cache: 1 cached, 1 rendered (2 total)
//! ```
//!
//! ## Card
//!
//! ```text
//! Getting Started → card.png
//!     Card: 5a105e8b9d40e1329780d62ea2265d8a (rendered)
//! ```
//!
//! ## Readtime
//!
//! ```text
//! Words: 812
//! Images: 3
//! Reading time: 4 min
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::cache::{CacheOutcome, CacheStatus};
use crate::card::Fingerprint;
use crate::social::BuildReport;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

fn status_label(status: CacheStatus) -> &'static str {
    match status {
        CacheStatus::Hit => "cached",
        CacheStatus::Rendered => "rendered",
    }
}

/// Indented `Card:` context line.
fn card_line(fingerprint: &Fingerprint, status: CacheStatus) -> String {
    format!("    Card: {} ({})", fingerprint, status_label(status))
}

/// Show `path` relative to `root` when it lies below it.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

// ============================================================================
// build
// ============================================================================

/// Format the post-build report.
pub fn format_build_output(report: &BuildReport, site_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    if report.cards.is_empty() {
        lines.push("No cards generated".to_string());
        return lines;
    }

    lines.push("Cards".to_string());
    for (i, card) in report.cards.iter().enumerate() {
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            card.page,
            display_path(&card.dest, site_dir)
        ));
        lines.push(card_line(&card.fingerprint, card.status));
    }
    lines.push(String::new());
    lines.push(format!("Cache: {}", report.stats));
    lines
}

pub fn print_build_output(report: &BuildReport, site_dir: &Path) {
    for line in format_build_output(report, site_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// card
// ============================================================================

/// Format the result of rendering a single card.
pub fn format_card_output(
    title: &str,
    fingerprint: &Fingerprint,
    outcome: &CacheOutcome,
    output: &Path,
) -> Vec<String> {
    vec![
        format!("{} → {}", title, output.display()),
        card_line(fingerprint, outcome.status),
    ]
}

pub fn print_card_output(
    title: &str,
    fingerprint: &Fingerprint,
    outcome: &CacheOutcome,
    output: &Path,
) {
    for line in format_card_output(title, fingerprint, outcome, output) {
        println!("{}", line);
    }
}

// ============================================================================
// readtime
// ============================================================================

/// Format a reading time estimate.
pub fn format_readtime_output(words: usize, images: usize, minutes: u32) -> Vec<String> {
    vec![
        format!("Words: {}", words),
        format!("Images: {}", images),
        format!("Reading time: {} min", minutes),
    ]
}

pub fn print_readtime_output(words: usize, images: usize, minutes: u32) {
    for line in format_readtime_output(words, images, minutes) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStats;
    use crate::card::CardRequest;
    use crate::social::CardReport;
    use std::path::PathBuf;

    fn report(site_dir: &Path) -> BuildReport {
        BuildReport {
            cards: vec![
                CardReport {
                    page: "index.md".into(),
                    fingerprint: CardRequest::new("Docs", "Home", "").fingerprint(),
                    dest: site_dir.join("assets/images/social/index.png"),
                    status: CacheStatus::Hit,
                },
                CardReport {
                    page: "guide/setup.md".into(),
                    fingerprint: CardRequest::new("Docs", "Setup", "").fingerprint(),
                    dest: site_dir.join("assets/images/social/guide/setup.png"),
                    status: CacheStatus::Rendered,
                },
            ],
            stats: CacheStats { hits: 1, misses: 1 },
        }
    }

    // =========================================================================
    // build
    // =========================================================================

    #[test]
    fn build_output_lists_cards_with_status() {
        let site = PathBuf::from("site");
        let lines = format_build_output(&report(&site), &site);
        let home = CardRequest::new("Docs", "Home", "").fingerprint();
        let setup = CardRequest::new("Docs", "Setup", "").fingerprint();

        assert_eq!(
            lines,
            vec![
                "Cards".to_string(),
                "001 index.md → assets/images/social/index.png".to_string(),
                format!("    Card: {} (cached)", home),
                "002 guide/setup.md → assets/images/social/guide/setup.png".to_string(),
                format!("    Card: {} (rendered)", setup),
                String::new(),
                "Cache: 1 cached, 1 rendered (2 total)".to_string(),
            ]
        );
    }

    #[test]
    fn build_output_keeps_paths_outside_site_dir() {
        let lines = format_build_output(&report(Path::new("/tmp/out")), Path::new("site"));
        assert_eq!(
            lines[1],
            "001 index.md → /tmp/out/assets/images/social/index.png"
        );
    }

    #[test]
    fn build_output_empty() {
        let lines = format_build_output(&BuildReport::default(), Path::new("site"));
        assert_eq!(lines, vec!["No cards generated"]);
    }

    #[test]
    fn index_zero_padded() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    // =========================================================================
    // card / readtime
    // =========================================================================

    #[test]
    fn card_output() {
        let fingerprint = CardRequest::new("Docs", "Getting Started", "").fingerprint();
        let outcome = CacheOutcome {
            path: PathBuf::from(format!(".cache/{fingerprint}.png")),
            status: CacheStatus::Rendered,
        };
        let lines = format_card_output("Getting Started", &fingerprint, &outcome, Path::new("card.png"));
        assert_eq!(
            lines,
            vec![
                "Getting Started → card.png".to_string(),
                format!("    Card: {} (rendered)", fingerprint),
            ]
        );
    }

    #[test]
    fn readtime_output() {
        assert_eq!(
            format_readtime_output(812, 3, 4),
            vec!["Words: 812", "Images: 3", "Reading time: 4 min"]
        );
    }
}
