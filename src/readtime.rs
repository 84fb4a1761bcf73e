//! Reading time estimation for rendered pages.
//!
//! [`ReadtimeScanner`] walks an HTML fragment once and keeps two things: the
//! text content in document order and the number of `<img>` tags.
//! [`estimate_minutes`] turns that into minutes the way Medium popularized:
//! words at a fixed reading speed, plus 12 seconds for the first image,
//! 11 for the second, and so on down to 3 seconds for every image after the
//! tenth.

use regex::Regex;
use scraper::{Html, Node};
use std::sync::LazyLock;

/// Average adult reading speed.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 265;

const FIRST_IMAGE_SECONDS: u32 = 12;
const MIN_IMAGE_SECONDS: u32 = 3;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\W+").expect("static regex must compile"));

/// Text and image tally of one or more HTML fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadtimeScanner {
    /// Text of each fed fragment, in feed order.
    text: Vec<String>,
    images: usize,
}

impl ReadtimeScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `html`, adding to what earlier calls collected.
    ///
    /// Text nodes within one fragment are joined as they are, so adjacent
    /// inline elements don't split words. Separate fragments never merge.
    pub fn feed(&mut self, html: &str) {
        let fragment = Html::parse_fragment(html);
        let mut text = String::new();
        for node in fragment.tree.root().descendants() {
            match node.value() {
                Node::Text(node) => text.push_str(node),
                Node::Element(element) if element.name() == "img" => self.images += 1,
                _ => {}
            }
        }
        self.text.push(text);
    }

    /// Text content in document order, entities decoded. Fragments are
    /// separated by a newline.
    pub fn text(&self) -> String {
        self.text.join("\n")
    }

    pub fn images(&self) -> usize {
        self.images
    }

    pub fn words(&self) -> usize {
        NON_WORD
            .split(&self.text())
            .filter(|word| !word.is_empty())
            .count()
    }
}

/// Estimated reading time of `html` in whole minutes (at least 1).
pub fn estimate_minutes(html: &str, words_per_minute: u32) -> u32 {
    let mut scanner = ReadtimeScanner::new();
    scanner.feed(html);
    minutes_for(scanner.words(), scanner.images(), words_per_minute)
}

/// Reading time for a word and image count.
pub fn minutes_for(words: usize, images: usize, words_per_minute: u32) -> u32 {
    let wpm = f64::from(words_per_minute.max(1));
    let mut seconds = (words as f64 / wpm * 60.0).ceil() as u32;

    let mut charge = FIRST_IMAGE_SECONDS;
    for _ in 0..images {
        seconds += charge;
        charge = charge.saturating_sub(1).max(MIN_IMAGE_SECONDS);
    }

    seconds.div_ceil(60).max(1)
}
