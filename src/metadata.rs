//! Metadata extraction from HTML documents (JSON-LD, meta tags, etc.).

use std::collections::HashMap;

use kuchikikiki::NodeRef;
use regex::Regex;
use serde_json::Value;

use crate::constants::REGEXPS;
use crate::dom_utils;
use crate::utils;

/// Metadata extracted from the document
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub byline: Option<String>,
    pub excerpt: Option<String>,
    pub site_name: Option<String>,
    pub published_time: Option<String>,
    pub lang: Option<String>,
}

fn article_type_matches(value: &Value) -> bool {
    value
        .get("@type")
        .and_then(|t| t.as_str())
        .map_or(false, |t| REGEXPS.json_ld_article_types.is_match(t))
}

/// Extract JSON-LD structured data from document
///
/// Looks for <script type="application/ld+json"> tags and parses them for
/// article metadata. Supports Schema.org Article types; the first script
/// that parses and passes the schema gates wins.
pub fn get_json_ld(doc: &NodeRef) -> Metadata {
    let mut metadata = Metadata::default();
    let scripts = match doc.select("script[type='application/ld+json']") {
        Ok(scripts) => scripts,
        Err(()) => return metadata,
    };

    for script in scripts {
        let raw = script.text_contents();

        // Strip CDATA markers if present
        let content = raw
            .trim()
            .trim_start_matches("<![CDATA[")
            .trim_end_matches("]]>")
            .trim()
            .to_string();

        let mut parsed = match serde_json::from_str::<Value>(&content) {
            Ok(value) => value,
            Err(_) => continue,
        };

        if let Some(items) = parsed.as_array() {
            match items.iter().find(|item| article_type_matches(item)) {
                Some(article) => parsed = article.clone(),
                None => continue,
            }
        }

        let schema_regex = Regex::new(r"^https?://schema\.org/?$").unwrap();
        let context_matches = match parsed.get("@context") {
            Some(Value::String(ctx)) => schema_regex.is_match(ctx),
            Some(Value::Object(ctx)) => ctx
                .get("@vocab")
                .and_then(|v| v.as_str())
                .map_or(false, |v| schema_regex.is_match(v)),
            _ => false,
        };
        if !context_matches {
            continue;
        }

        if parsed.get("@type").is_none() {
            if let Some(graph) = parsed.get("@graph").and_then(|g| g.as_array()) {
                if let Some(article) = graph.iter().find(|item| article_type_matches(item)) {
                    parsed = article.clone();
                }
            }
        }
        if !article_type_matches(&parsed) {
            continue;
        }

        // Schema.org is loose about "name" vs "headline". When they
        // disagree, keep whichever resembles the page title.
        let name = parsed.get("name").and_then(|v| v.as_str());
        let headline = parsed.get("headline").and_then(|v| v.as_str());
        metadata.title = match (name, headline) {
            (Some(name), Some(headline)) if name != headline => {
                let page_title = get_article_title(doc).unwrap_or_default();
                let name_matches = dom_utils::text_similarity(name, &page_title) > 0.75;
                let headline_matches = dom_utils::text_similarity(headline, &page_title) > 0.75;
                if headline_matches && !name_matches {
                    Some(headline.trim().to_string())
                } else {
                    Some(name.trim().to_string())
                }
            }
            (Some(name), _) => Some(name.trim().to_string()),
            (None, Some(headline)) => Some(headline.trim().to_string()),
            (None, None) => None,
        };

        if let Some(author) = parsed.get("author") {
            if let Some(author_name) = author.get("name").and_then(|v| v.as_str()) {
                metadata.byline = Some(author_name.trim().to_string());
            } else if let Some(authors) = author.as_array() {
                let names: Vec<String> = authors
                    .iter()
                    .filter_map(|a| a.get("name").and_then(|n| n.as_str()))
                    .map(|n| n.trim().to_string())
                    .collect();
                if !names.is_empty() {
                    metadata.byline = Some(names.join(", "));
                }
            }
        }

        if let Some(description) = parsed.get("description").and_then(|v| v.as_str()) {
            metadata.excerpt = Some(description.trim().to_string());
        }
        if let Some(publisher_name) = parsed
            .get("publisher")
            .and_then(|p| p.get("name"))
            .and_then(|n| n.as_str())
        {
            metadata.site_name = Some(publisher_name.trim().to_string());
        }
        if let Some(date_published) = parsed.get("datePublished").and_then(|v| v.as_str()) {
            metadata.published_time = Some(date_published.trim().to_string());
        }
        break;
    }

    metadata
}

/// Extract article metadata from meta tags
///
/// Supports OpenGraph, Twitter Cards, Dublin Core, and standard meta tags.
/// JSON-LD values always take priority over meta tag values.
pub fn get_article_metadata(doc: &NodeRef, json_ld: Metadata) -> Metadata {
    let mut values: HashMap<String, String> = HashMap::new();
    let property_pattern = Regex::new(
        r"(?i)\s*(article|dc|dcterm|og|twitter)\s*:\s*(author|creator|description|published_time|title|site_name)\s*"
    ).unwrap();

    let name_pattern = Regex::new(
        r"(?i)^\s*(?:(?:article|dc|dcterm|og|twitter|parsely|weibo:(?:article|webpage))\s*[-\.:]\s*)?(author|author_name|creator|pub-date|description|title|site_name)\s*$"
    ).unwrap();

    if let Ok(metas) = doc.select("meta") {
        for meta in metas {
            let node = meta.as_node();
            let element_name = dom_utils::get_attr(node, "name");
            let element_property = dom_utils::get_attr(node, "property");
            let content = match dom_utils::get_attr(node, "content") {
                Some(content) if !content.is_empty() => content,
                _ => continue,
            };

            let mut matched = false;
            if let Some(property) = &element_property {
                // Handle space-separated properties (e.g. "dc:creator og:title")
                for part in property.split_whitespace() {
                    if let Some(found) = property_pattern.find(part) {
                        let key = part[found.start()..found.end()]
                            .to_lowercase()
                            .replace(char::is_whitespace, "");
                        values.insert(key, content.trim().to_string());
                        matched = true;
                    }
                }
            }
            if !matched {
                if let Some(name) = &element_name {
                    if name_pattern.is_match(name) {
                        let key = name
                            .to_lowercase()
                            .replace(char::is_whitespace, "")
                            .replace('.', ":");
                        values.insert(key, content.trim().to_string());
                    }
                }
            }
        }
    }

    let mut metadata = Metadata::default();
    metadata.title = json_ld.title.or_else(|| {
        values
            .get("dc:title")
            .or_else(|| values.get("dcterm:title"))
            .or_else(|| values.get("og:title"))
            .or_else(|| values.get("weibo:article:title"))
            .or_else(|| values.get("weibo:webpage:title"))
            .or_else(|| values.get("title"))
            .or_else(|| values.get("twitter:title"))
            .or_else(|| values.get("parsely-title"))
            .cloned()
    });

    if metadata.title.is_none() {
        metadata.title = get_article_title(doc);
    }
    if metadata.title.is_none() {
        metadata.title = Some(String::new());
    }

    let article_author = values
        .get("article:author")
        .or_else(|| values.get("article:author_name"))
        .filter(|v| !utils::is_url(v))
        .cloned();

    metadata.byline = json_ld.byline.or_else(|| {
        values
            .get("dc:creator")
            .or_else(|| values.get("dcterm:creator"))
            .or_else(|| values.get("author"))
            .or_else(|| values.get("parsely-author"))
            .or_else(|| article_author.as_ref())
            .cloned()
    });

    metadata.excerpt = json_ld.excerpt.or_else(|| {
        values
            .get("dc:description")
            .or_else(|| values.get("dcterm:description"))
            .or_else(|| values.get("og:description"))
            .or_else(|| values.get("weibo:article:description"))
            .or_else(|| values.get("weibo:webpage:description"))
            .or_else(|| values.get("description"))
            .or_else(|| values.get("twitter:description"))
            .cloned()
    });

    metadata.site_name = json_ld
        .site_name
        .or_else(|| values.get("og:site_name").cloned());

    metadata.published_time = json_ld.published_time.or_else(|| {
        values
            .get("article:published_time")
            .or_else(|| values.get("parsely-pub-date"))
            .cloned()
    });

    metadata.lang = extract_language(doc);

    metadata.title = metadata.title.map(|t| utils::unescape_html_entities(&t));
    metadata.byline = metadata.byline.map(|b| utils::unescape_html_entities(&b));
    metadata.excerpt = metadata
        .excerpt
        .map(|e| utils::unescape_html_entities(&e))
        .filter(|e| !e.trim().is_empty());
    metadata.site_name = metadata
        .site_name
        .map(|s| utils::unescape_html_entities(&s));
    metadata.published_time = metadata
        .published_time
        .map(|p| utils::unescape_html_entities(&p));

    metadata
}

/// Language in priority order: `<html lang>`, a Content-Language
/// http-equiv, then `lang`/`language` meta names.
fn extract_language(doc: &NodeRef) -> Option<String> {
    if let Ok(html) = doc.select_first("html") {
        if let Some(lang) = dom_utils::get_attr(html.as_node(), "lang") {
            let lang = lang.trim();
            if !lang.is_empty() {
                return Some(lang.to_string());
            }
        }
    }

    let equiv_selector =
        "meta[http-equiv='Content-Language'], meta[http-equiv='content-language']";
    if let Ok(metas) = doc.select(equiv_selector) {
        for meta in metas {
            if let Some(content) = dom_utils::get_attr(meta.as_node(), "content") {
                let lang = content.trim();
                if !lang.is_empty() {
                    return Some(lang.to_string());
                }
            }
        }
    }

    if let Ok(metas) = doc.select("meta[name='lang'], meta[name='language']") {
        for meta in metas {
            if let Some(content) = dom_utils::get_attr(meta.as_node(), "content") {
                let lang = content.trim();
                if !lang.is_empty() {
                    return Some(lang.to_string());
                }
            }
        }
    }

    None
}

/// Extract and clean the title from the document's `<title>` tag,
/// stripping site names hung off separators like `|`, `-`, or a colon.
pub fn get_article_title(doc: &NodeRef) -> Option<String> {
    let title_node = doc.select_first("title").ok()?;

    let orig_title = title_node.text_contents().trim().to_string();
    if orig_title.is_empty() {
        return None;
    }

    let mut cur_title = orig_title.clone();
    let mut title_had_hierarchical_separators = false;

    fn word_count(s: &str) -> usize {
        s.split_whitespace().count()
    }

    // Title separators: | - – — \ / > »
    let sep_regex = Regex::new(r"\s(\||\-|–|—|\\|/|>|»)\s").unwrap();

    if sep_regex.is_match(&cur_title) {
        title_had_hierarchical_separators = Regex::new(r"\s[\\//>»]\s")
            .unwrap()
            .is_match(&cur_title);

        let sep_matches: Vec<_> = sep_regex.find_iter(&orig_title).collect();
        if let Some(last_sep) = sep_matches.last() {
            cur_title = orig_title[..last_sep.start()].to_string();
            // Too short a front part means the site name came first.
            if word_count(&cur_title) < 3 {
                let first_sep_regex =
                    Regex::new(r"(?i)^[^\|\-–—\\//>»]*[\|\-–—\\//>»]").unwrap();
                cur_title = first_sep_regex.replace(&orig_title, "").to_string();
            }
        }
    } else if cur_title.contains(": ") {
        let trimmed_title = cur_title.trim().to_string();
        let has_matching_heading = dom_utils::elements_by_tags(doc, &["h1", "h2"])
            .iter()
            .any(|h| h.text_contents().trim() == trimmed_title);

        if !has_matching_heading {
            if let Some(last_colon_pos) = cur_title.rfind(':') {
                let after_colon = cur_title[(last_colon_pos + 1)..].trim().to_string();
                if word_count(&after_colon) < 3 {
                    if let Some(first_colon_pos) = cur_title.find(':') {
                        let after_first = cur_title[(first_colon_pos + 1)..].trim().to_string();
                        let before_first = &cur_title[..first_colon_pos];

                        if word_count(before_first) > 5 {
                            cur_title = orig_title.clone();
                        } else {
                            cur_title = after_first;
                        }
                    }
                } else {
                    cur_title = after_colon;
                }
            }
        }
    } else if cur_title.len() > 150 || cur_title.len() < 15 {
        let h1s = dom_utils::elements_by_tags(doc, &["h1"]);
        if h1s.len() == 1 {
            cur_title = h1s[0].text_contents().trim().to_string();
        }
    }

    cur_title = REGEXPS
        .normalize
        .replace_all(cur_title.trim(), " ")
        .to_string();

    // A stripped title of 4 words or fewer is suspicious unless exactly
    // one word came off a hierarchical separator.
    let cur_word_count = word_count(&cur_title);
    if cur_word_count <= 4 {
        let orig_without_sep = sep_regex.replace_all(&orig_title, " ").to_string();
        let orig_word_count = word_count(&orig_without_sep);

        if !title_had_hierarchical_separators || cur_word_count != orig_word_count - 1 {
            cur_title = orig_title;
        }
    }

    Some(cur_title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchikikiki::parse_html;
    use kuchikikiki::traits::TendrilSink;

    #[test]
    fn test_json_ld_extraction() {
        let html = r#"
            <html>
                <head>
                    <script type="application/ld+json">
                    {
                        "@context": "https://schema.org",
                        "@type": "Article",
                        "headline": "Test Article",
                        "author": {"name": "John Doe"},
                        "description": "Test description"
                    }
                    </script>
                </head>
            </html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_json_ld(&doc);

        assert_eq!(metadata.title, Some("Test Article".to_string()));
        assert_eq!(metadata.byline, Some("John Doe".to_string()));
        assert_eq!(metadata.excerpt, Some("Test description".to_string()));
    }

    #[test]
    fn test_json_ld_array_and_graph_payloads() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            [{"@context": "https://schema.org", "@type": "WebSite", "name": "ignored"},
             {"@context": "https://schema.org", "@type": "NewsArticle", "headline": "From Array",
              "publisher": {"name": "The Paper"}}]
            </script>
            <script type="application/ld+json">
            {"@context": "https://schema.org",
             "@graph": [{"@type": "BlogPosting", "headline": "From Graph"}]}
            </script>
            </head></html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_json_ld(&doc);

        // The first qualifying script wins outright.
        assert_eq!(metadata.title, Some("From Array".to_string()));
        assert_eq!(metadata.site_name, Some("The Paper".to_string()));
    }

    #[test]
    fn test_json_ld_requires_schema_context() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {"@context": "https://example.com", "@type": "Article", "headline": "Wrong vocab"}
            </script>
            </head></html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_json_ld(&doc);
        assert!(metadata.title.is_none());
    }

    #[test]
    fn test_json_ld_headline_preferred_when_name_is_site() {
        let html = r#"
            <html>
                <head>
                    <title>Rust Ownership Explained Carefully</title>
                    <script type="application/ld+json">
                    {
                        "@context": "https://schema.org",
                        "@type": "Article",
                        "name": "Example Publisher",
                        "headline": "Rust Ownership Explained Carefully"
                    }
                    </script>
                </head>
            </html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_json_ld(&doc);
        assert_eq!(
            metadata.title,
            Some("Rust Ownership Explained Carefully".to_string())
        );
    }

    #[test]
    fn test_json_ld_author_array() {
        let html = r#"
            <html><head>
            <script type="application/ld+json">
            {"@context": "https://schema.org", "@type": "Article", "headline": "Multi Author",
             "author": [{"name": "First Author"}, {"name": "Second Author"}]}
            </script>
            </head></html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_json_ld(&doc);
        assert_eq!(
            metadata.byline,
            Some("First Author, Second Author".to_string())
        );
    }

    #[test]
    fn test_meta_tag_extraction() {
        let html = r#"
            <html>
                <head>
                    <meta property="og:title" content="OG Title" />
                    <meta name="author" content="Jane Smith" />
                    <meta property="og:description" content="OG Description" />
                </head>
            </html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_article_metadata(&doc, Metadata::default());

        assert_eq!(metadata.title, Some("OG Title".to_string()));
        assert_eq!(metadata.byline, Some("Jane Smith".to_string()));
        assert_eq!(metadata.excerpt, Some("OG Description".to_string()));
    }

    #[test]
    fn test_meta_priority_prefers_dublin_core_title() {
        let html = r#"
            <html><head>
            <meta name="dc.title" content="DC Title" />
            <meta property="og:title" content="OG Title" />
            </head></html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_article_metadata(&doc, Metadata::default());
        assert_eq!(metadata.title, Some("DC Title".to_string()));
    }

    #[test]
    fn test_article_author_name_meta_is_respected() {
        let html = r#"
            <html>
                <head>
                    <meta name="article:author_name" content="Hazel Sheffield" />
                </head>
            </html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_article_metadata(&doc, Metadata::default());

        assert_eq!(metadata.byline, Some("Hazel Sheffield".to_string()));
    }

    #[test]
    fn test_article_author_url_is_ignored() {
        let html = r#"
            <html><head>
            <meta property="article:author" content="https://facebook.com/someauthor" />
            </head></html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_article_metadata(&doc, Metadata::default());
        assert!(metadata.byline.is_none());
    }

    #[test]
    fn test_space_separated_meta_properties() {
        let html = r#"
            <html><head>
            <meta property="unrelated:thing og:title" content="Shared Value" />
            </head></html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_article_metadata(&doc, Metadata::default());
        assert_eq!(metadata.title, Some("Shared Value".to_string()));
    }

    #[test]
    fn test_metadata_values_are_unescaped() {
        let html = r#"
            <html><head>
            <meta property="og:title" content="Dungeons &amp; Dragons" />
            </head></html>
        "#;

        let doc = parse_html().one(html);
        let metadata = get_article_metadata(&doc, Metadata::default());
        assert_eq!(metadata.title, Some("Dungeons & Dragons".to_string()));
    }

    #[test]
    fn test_title_extraction_with_separator() {
        let html = r#"
            <html>
                <head>
                    <title>Understanding the Rust Borrow Checker Deeply | Rust Blog</title>
                </head>
            </html>
        "#;

        let doc = parse_html().one(html);
        let title = get_article_title(&doc);
        assert_eq!(
            title,
            Some("Understanding the Rust Borrow Checker Deeply".to_string())
        );
    }

    #[test]
    fn test_title_extraction_colon_separator() {
        let html = r#"
            <html>
                <head>
                    <title>Site Name: The Article Title Goes Here</title>
                </head>
            </html>
        "#;

        let doc = parse_html().one(html);
        let title = get_article_title(&doc);
        assert_eq!(title, Some("The Article Title Goes Here".to_string()));
    }

    #[test]
    fn test_title_too_short_falls_back_to_lone_h1() {
        let html = r#"
            <html>
                <head><title>Short</title></head>
                <body><h1>The Complete Guide To Proper Titles</h1></body>
            </html>
        "#;

        let doc = parse_html().one(html);
        let title = get_article_title(&doc);
        assert_eq!(
            title,
            Some("The Complete Guide To Proper Titles".to_string())
        );
    }

    #[test]
    fn test_language_extraction() {
        let doc = parse_html().one("<html lang=\"en-US\"><body></body></html>");
        assert_eq!(extract_language(&doc).as_deref(), Some("en-US"));

        let doc = parse_html().one(
            "<html><head><meta http-equiv=\"content-language\" content=\"de\"></head></html>",
        );
        assert_eq!(extract_language(&doc).as_deref(), Some("de"));
    }

    #[test]
    fn test_json_ld_values_take_priority_over_meta_tags() {
        let html = r#"
            <html><head>
            <meta property="og:title" content="Meta Title" />
            <meta name="author" content="Meta Author" />
            </head></html>
        "#;

        let doc = parse_html().one(html);
        let json_ld = Metadata {
            title: Some("JSON-LD Title".to_string()),
            byline: Some("JSON-LD Author".to_string()),
            ..Metadata::default()
        };
        let metadata = get_article_metadata(&doc, json_ld);
        assert_eq!(metadata.title, Some("JSON-LD Title".to_string()));
        assert_eq!(metadata.byline, Some("JSON-LD Author".to_string()));
    }
}
