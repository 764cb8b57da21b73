//! Quick readability check without full parsing.
//!
//! This module provides the [`is_probably_readerable`] function, which performs
//! a fast pre-flight check to determine if a document is likely to have extractable
//! article content without doing a full parse.
//!
//! ## Use Case
//!
//! Use this function to quickly filter out pages that are unlikely to contain article
//! content, saving the cost of a full parse:
//!
//! ```rust
//! use lede::{is_probably_readerable, Readability};
//!
//! let html = "<html>...</html>";
//!
//! // Quick check first
//! if is_probably_readerable(html, None) {
//!     // Do full parse
//!     let readability = Readability::new(html, None, None).unwrap();
//!     if let Ok(Some(article)) = readability.parse() {
//!         println!("Article extracted!");
//!     }
//! } else {
//!     println!("Not an article page, skipping parse");
//! }
//! ```
//!
//! ## Performance
//!
//! This check is significantly faster than a full parse because it only looks
//! for basic content signals without doing deep analysis or scoring.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use crate::constants::REGEXPS;

static CANDIDATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p, pre, article").unwrap());
static BR_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div > br").unwrap());

/// Options for the readability pre-flight check.
///
/// Controls the thresholds used by [`is_probably_readerable`] to determine
/// if a document is likely to be parseable.
///
/// ## Example
///
/// ```rust
/// use lede::{is_probably_readerable, ReaderableOptions};
///
/// let html = "<html>...</html>";
///
/// let options = ReaderableOptions {
///     min_content_length: 200,
///     min_score: 30.0,
/// };
///
/// let is_readerable = is_probably_readerable(html, Some(options));
/// ```
#[derive(Debug, Clone)]
pub struct ReaderableOptions {
    /// Minimum content length to consider a paragraph.
    ///
    /// Paragraphs shorter than this are ignored when calculating the
    /// readability score.
    ///
    /// Default: `140`
    pub min_content_length: usize,

    /// Minimum score threshold to consider a page readerable.
    ///
    /// The score is calculated based on the length and number of content
    /// paragraphs found in the document.
    ///
    /// Default: `20.0`
    pub min_score: f64,
}

impl Default for ReaderableOptions {
    fn default() -> Self {
        Self {
            min_content_length: 140,
            min_score: 20.0,
        }
    }
}

/// Quick check to determine if a document is likely to be readerable.
///
/// This function performs a fast analysis to predict whether full article extraction
/// is likely to succeed, without doing the expensive full parse. It looks for basic
/// content signals like paragraphs with sufficient text.
///
/// ## Arguments
///
/// * `html` - The HTML document to check
/// * `options` - Optional custom thresholds (uses defaults if `None`)
///
/// ## Returns
///
/// `true` if the document likely contains extractable article content, `false` otherwise.
///
/// ## Example
///
/// ```rust
/// use lede::is_probably_readerable;
///
/// let article_html = r#"
///     <html><body>
///         <article>
///             <p>This is a substantial paragraph with enough content to indicate
///             that this page likely contains article text that can be extracted.
///             Stretching it out past the minimum length makes the signal count.</p>
///             <p>Here's another paragraph with more content to increase the score,
///             also padded out far enough to clear the per-paragraph threshold.</p>
///         </article>
///     </body></html>
/// "#;
///
/// assert!(is_probably_readerable(article_html, None));
///
/// let non_article_html = "<html><body><p>Short</p></body></html>";
/// assert!(!is_probably_readerable(non_article_html, None));
/// ```
///
/// ## Algorithm
///
/// The function collects all `<p>`, `<pre>`, and `<article>` elements, plus any
/// `<div>` that uses `<br>` separators in place of paragraphs. Hidden nodes and
/// nodes whose class or id mark them as navigation, comments, or other unlikely
/// content are skipped, as are paragraphs nested inside list items. Each
/// remaining node longer than `min_content_length` adds the square root of its
/// excess length to a running score; the function returns `true` as soon as the
/// score passes `min_score`.
///
/// ## Performance
///
/// This function is much faster than a full parse, making it ideal for batch processing
/// large numbers of URLs, pre-filtering in crawlers or scrapers, and quick content
/// classification tasks.
pub fn is_probably_readerable(html: &str, options: Option<ReaderableOptions>) -> bool {
    let options = options.unwrap_or_default();
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    for node in document.select(&CANDIDATE_SELECTOR) {
        if seen.insert(node.id()) {
            nodes.push(node);
        }
    }
    // Pages that separate text with <br> instead of <p> still count.
    for br in document.select(&BR_SELECTOR) {
        if let Some(parent) = br.parent().and_then(ElementRef::wrap) {
            if seen.insert(parent.id()) {
                nodes.push(parent);
            }
        }
    }

    let mut score = 0.0;
    for node in nodes {
        if !is_node_visible(&node) {
            continue;
        }

        let element = node.value();
        let match_string = format!(
            "{} {}",
            element.attr("class").unwrap_or(""),
            element.attr("id").unwrap_or("")
        );
        if REGEXPS.unlikely_candidates.is_match(&match_string)
            && !REGEXPS.ok_maybe_its_a_candidate.is_match(&match_string)
        {
            continue;
        }

        if element.name() == "p" && has_list_ancestor(&node) {
            continue;
        }

        let text = node.text().collect::<String>();
        let text_len = text.trim().chars().count();
        if text_len < options.min_content_length {
            continue;
        }

        score += ((text_len - options.min_content_length) as f64).sqrt();
        if score > options.min_score {
            return true;
        }
    }

    false
}

fn is_node_visible(node: &ElementRef) -> bool {
    let element = node.value();
    if let Some(style) = element.attr("style") {
        if REGEXPS.hidden_style.is_match(style) {
            return false;
        }
    }
    if element.attr("hidden").is_some() {
        return false;
    }
    match element.attr("aria-hidden") {
        Some("true") => element
            .attr("class")
            .map_or(false, |class| class.contains("fallback-image")),
        _ => true,
    }
}

fn has_list_ancestor(node: &ElementRef) -> bool {
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "li")
}
