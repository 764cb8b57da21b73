//! Main Readability struct and parse implementation.
//!
//! This module contains the primary [`Readability`] struct which orchestrates
//! the entire article extraction pipeline.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lede::Readability;
//!
//! let html = std::fs::read_to_string("article.html")?;
//! let url = "https://example.com/article";
//!
//! let readability = Readability::new(&html, Some(url), None)?;
//!
//! if let Some(article) = readability.parse()? {
//!     println!("Title: {:?}", article.title);
//!     println!("Author: {:?}", article.byline);
//!     println!("Content length: {} chars", article.length);
//!
//!     // Save to file
//!     if let Some(content) = article.content {
//!         std::fs::write("output.html", content)?;
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use kuchikikiki::parse_html;
use kuchikikiki::traits::TendrilSink;
use kuchikikiki::NodeRef;

use crate::{
    article::Article,
    cleaner,
    content_extractor::grab_article,
    dom_utils,
    error::{ReadabilityError, Result},
    metadata::{get_article_metadata, get_json_ld, Metadata},
    options::ReadabilityOptions,
    post_processor,
    utils,
};

/// The main Readability parser.
///
/// This struct is the primary interface for extracting article content from
/// HTML documents. It implements Mozilla's Readability algorithm, which
/// powers Firefox's Reader View.
///
/// ## Lifecycle
///
/// Construct an instance with [`Readability::new()`], then call
/// [`parse()`](Readability::parse) to extract the content. Parsing consumes
/// the instance and mutates the document tree destructively; the result is
/// an [`Article`] holding the extracted content and metadata, or `None`
/// when the page has nothing article-shaped in it.
///
/// ## Features
///
/// - Intelligent content identification
/// - Metadata extraction (title, author, date, etc.)
/// - JSON-LD structured data parsing
/// - Multiple retry strategies for difficult pages
/// - Configurable thresholds and behavior
///
/// ## Example
///
/// ```rust
/// use lede::Readability;
///
/// let html = r#"
///     <html>
///     <head><title>Article Title</title></head>
///     <body>
///         <article>
///             <h1>Article Title</h1>
///             <p>First paragraph of content...</p>
///             <p>Second paragraph of content...</p>
///         </article>
///     </body>
///     </html>
/// "#;
///
/// let readability = Readability::new(html, None, None)?;
/// match readability.parse()? {
///     Some(article) => println!("Extracted {} characters", article.length),
///     None => println!("Could not extract article content"),
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
///
/// ## With Custom Options
///
/// ```rust,no_run
/// use lede::{Readability, ReadabilityOptions};
///
/// let html = "<html>...</html>";
///
/// let options = ReadabilityOptions::builder()
///     .char_threshold(300)
///     .debug(true)
///     .build();
///
/// let readability = Readability::new(html, None, Some(options))?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct Readability {
    /// The parsed document; every pipeline stage mutates this tree in place
    doc: NodeRef,

    /// Base URL for resolving relative links
    base_url: Option<String>,

    /// Configuration options
    options: ReadabilityOptions,

    /// Extracted metadata
    metadata: Metadata,
}

impl Readability {
    /// Create a new Readability instance
    ///
    /// # Arguments
    /// * `html` - The HTML content to parse
    /// * `url` - Optional base URL for resolving relative links
    /// * `options` - Optional configuration options
    ///
    /// # Returns
    /// Result containing the Readability instance or an error
    pub fn new(html: &str, url: Option<&str>, options: Option<ReadabilityOptions>) -> Result<Self> {
        if html.trim().is_empty() {
            return Err(ReadabilityError::ParseError("empty document".to_string()));
        }

        let base_url = url
            .map(|u| {
                if utils::is_url(u) {
                    Ok(u.to_string())
                } else {
                    Err(ReadabilityError::InvalidUrl(u.to_string()))
                }
            })
            .transpose()?;

        let doc = parse_html().one(html);
        let options = options.unwrap_or_default();

        Ok(Self {
            doc,
            base_url,
            options,
            metadata: Metadata::default(),
        })
    }

    /// Parse the document and extract article content.
    ///
    /// Runs the whole pipeline: noscript image recovery, metadata
    /// collection, document preparation, the scoring and retry loop, and
    /// post-processing of the winning content.
    ///
    /// # Returns
    /// * `Ok(Some(article))` when content was extracted
    /// * `Ok(None)` when the page holds no discernible article
    /// * `Err(_)` when a structural precondition fails (element limit)
    pub fn parse(mut self) -> Result<Option<Article>> {
        if self.options.max_elems_to_parse > 0 {
            let node_count = self
                .doc
                .descendants()
                .filter(|n| n.as_element().is_some())
                .count();
            if node_count > self.options.max_elems_to_parse {
                return Err(ReadabilityError::MaxElementsExceeded(node_count));
            }
        }

        cleaner::unwrap_noscript_images(&self.doc);

        let json_ld = if !self.options.disable_json_ld {
            get_json_ld(&self.doc)
        } else {
            Metadata::default()
        };
        self.metadata = get_article_metadata(&self.doc, json_ld);

        cleaner::prep_document(&self.doc);

        self.log("Grabbing article");
        let grabbed = match grab_article(&self.doc, &self.metadata, &self.options)? {
            Some(grabbed) => grabbed,
            None => return Ok(None),
        };

        // Serialize before URL rewriting so callers can see the content as
        // it appeared on the page.
        let raw_content = dom_utils::inner_html(&grabbed.content);

        post_processor::post_process_content(
            &grabbed.content,
            self.base_url.as_deref(),
            &self.options,
        );

        let content = dom_utils::inner_html(&grabbed.content);
        let text_content = grabbed.content.text_contents();
        let length = text_content.chars().count();

        let excerpt = self.metadata.excerpt.clone().or_else(|| {
            self.generate_excerpt_from_content(&grabbed.content)
                .or_else(|| self.generate_excerpt_from_text(&text_content))
        });

        self.log(&format!("Extracted article with {} characters", length));

        Ok(Some(Article {
            title: self.metadata.title.clone(),
            content: Some(content),
            raw_content: Some(raw_content),
            text_content: Some(text_content),
            length,
            excerpt,
            byline: self.metadata.byline.clone().or(grabbed.byline),
            dir: grabbed.dir,
            site_name: self.metadata.site_name.clone(),
            lang: self.metadata.lang.clone().or(grabbed.lang),
            published_time: self.metadata.published_time.clone(),
        }))
    }

    /// First paragraph with enough prose to stand in for a missing
    /// description. Byline-looking and link-heavy paragraphs are skipped.
    fn generate_excerpt_from_content(&self, content: &NodeRef) -> Option<String> {
        for paragraph in dom_utils::elements_by_tags(content, &["p"]) {
            let text = dom_utils::inner_text(&paragraph, true);
            if text.chars().count() < 25 {
                continue;
            }
            let match_string = dom_utils::class_and_id(&paragraph).to_lowercase();
            if match_string.contains("byline") || match_string.contains("author") {
                continue;
            }
            if dom_utils::link_density(&paragraph) > 0.8 {
                continue;
            }
            return Some(text);
        }
        None
    }

    fn generate_excerpt_from_text(&self, text: &str) -> Option<String> {
        let cleaned = text.trim();
        if cleaned.chars().count() <= 40 {
            return None;
        }
        Some(utils::truncate_at_word_boundary(cleaned, 300))
    }

    fn log(&self, message: &str) {
        if self.options.debug {
            eprintln!("Reader: (Readability) {}", message);
        }
    }
}
