//! # lede
//!
//! Extraction of the main article content and metadata from web pages, using
//! the Readability algorithm familiar from Firefox Reader View.
//!
//! ## Overview
//!
//! lede takes raw HTML and boils it down to the part a reader came for: the
//! article. Navigation, advertisements, share widgets, and other clutter are
//! stripped away, while the title, author (byline), description, language, and
//! publish date are collected from meta tags and JSON-LD markup.
//!
//! ## Key Features
//!
//! - **Content Extraction**: Identifies and extracts main article content
//! - **Metadata Extraction**: Title, author, description, site name, language, and publish date
//! - **JSON-LD Support**: Parses structured data from JSON-LD markup
//! - **Multiple Retry Strategies**: Degrades strictness to handle unusual page layouts
//! - **Customizable Options**: Configure thresholds, scoring, and behavior
//! - **Pre-flight Check**: Quick check to determine if a page is likely readable
//!
//! ## Basic Usage
//!
//! ```rust
//! use lede::{Readability, ReadabilityOptions};
//!
//! let html = r#"<html><body><article><h1>Title</h1><p>Content...</p></article></body></html>"#;
//! let url = "https://example.com/article";
//!
//! let options = ReadabilityOptions::default();
//! let readability = Readability::new(html, Some(url), Some(options)).unwrap();
//!
//! if let Ok(Some(article)) = readability.parse() {
//!     println!("Title: {:?}", article.title);
//!     println!("Content: {:?}", article.content);
//!     println!("Author: {:?}", article.byline);
//! }
//! ```
//!
//! ## Advanced Usage
//!
//! ### Custom Options
//!
//! ```rust,no_run
//! use lede::{Readability, ReadabilityOptions};
//!
//! let html = "<html>...</html>";
//!
//! let options = ReadabilityOptions::builder()
//!     .char_threshold(300)
//!     .nb_top_candidates(10)
//!     .keep_classes(true)
//!     .build();
//!
//! let readability = Readability::new(html, None, Some(options)).unwrap();
//! let article = readability.parse();
//! ```
//!
//! ### Pre-flight Check
//!
//! Use [`is_probably_readerable`] to quickly check if a document is likely to be parseable
//! before doing the full parse:
//!
//! ```rust,no_run
//! use lede::is_probably_readerable;
//!
//! let html = "<html>...</html>";
//!
//! if is_probably_readerable(html, None) {
//!     // Proceed with full parsing
//! } else {
//!     // Skip parsing or use alternative strategy
//! }
//! ```
//!
//! ## Error Handling
//!
//! [`Readability::parse`] separates "nothing readable here" from real failures:
//! a page without extractable content yields `Ok(None)`, while configuration
//! problems such as an oversized document surface as errors.
//!
//! ```rust
//! use lede::{Readability, ReadabilityError};
//!
//! let html = "<html><body><p>Too short.</p></body></html>";
//! let url = "not a valid url";
//!
//! match Readability::new(html, Some(url), None) {
//!     Ok(readability) => match readability.parse() {
//!         Ok(Some(article)) => println!("Title: {:?}", article.title),
//!         Ok(None) => println!("No article found"),
//!         Err(e) => eprintln!("Error: {}", e),
//!     },
//!     Err(ReadabilityError::InvalidUrl(url)) => {
//!         eprintln!("Invalid URL: {}", url);
//!     }
//!     Err(e) => {
//!         eprintln!("Error: {}", e);
//!     }
//! }
//! ```
//!
//! ## Algorithm
//!
//! The extraction algorithm works in several phases. First, scripts and styles are removed
//! to prepare the document. Then potential content containers are identified throughout the page.
//! These candidates are scored based on various content signals like paragraph count, text length,
//! and link density. The best candidate is selected using adaptive strategies with multiple fallback
//! approaches. Nearby high-quality content is aggregated by examining sibling elements. Finally,
//! the extracted content goes through cleanup and post-processing to finalize the output.
//!
//! When a pass produces less text than `char_threshold`, the document is restored and
//! extraction retries with one strictness flag relaxed, until the flags are exhausted.

mod article;
mod cleaner;
mod constants;
mod content_extractor;
mod dom_utils;
mod error;
mod metadata;
mod options;
mod post_processor;
mod readability;
mod readerable;
mod scoring;
mod utils;

// Public exports
pub use article::Article;
pub use error::{ReadabilityError, Result};
pub use options::ReadabilityOptions;
pub use readability::Readability;
pub use readerable::{is_probably_readerable, ReaderableOptions};
