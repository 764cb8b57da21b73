//! Final fixups applied to extracted content before serialization.
//!
//! Runs after the grab loop has settled on an article: relative URLs are
//! resolved against the page URL, redundant wrapper elements are flattened,
//! and presentational classes are stripped down to the preserve list.

use std::collections::HashSet;

use kuchikikiki::NodeRef;
use url::Url;

use crate::constants::{CLASSES_TO_PRESERVE, REGEXPS};
use crate::dom_utils;
use crate::options::ReadabilityOptions;

/// Run all post-extraction fixups on the article content in place.
pub fn post_process_content(
    article_content: &NodeRef,
    base_url: Option<&str>,
    options: &ReadabilityOptions,
) {
    if let Some(base) = base_url {
        fix_relative_uris(article_content, base);
    }

    simplify_nested_elements(article_content);

    if !options.keep_classes {
        let preserve: HashSet<&str> = CLASSES_TO_PRESERVE
            .iter()
            .copied()
            .chain(options.classes_to_preserve.iter().map(|s| s.as_str()))
            .collect();
        clean_classes(article_content, &preserve);
    }
}

fn to_absolute_uri(uri: &str, base: &Url) -> String {
    // Hash links keep working within the extracted page, leave them alone.
    if uri.starts_with('#') {
        return uri.to_string();
    }
    match base.join(uri) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => uri.to_string(),
    }
}

/// Rewrite link and media URLs so they stay valid outside the original page.
///
/// `javascript:` links carry no destination worth keeping; they are replaced
/// by their text (or a span preserving richer children).
fn fix_relative_uris(article_content: &NodeRef, base_url: &str) {
    let base = match Url::parse(base_url) {
        Ok(base) => base,
        Err(_) => return,
    };

    for link in dom_utils::elements_by_tags(article_content, &["a"]) {
        let href = match dom_utils::get_attr(&link, "href") {
            Some(href) if !href.is_empty() => href,
            _ => continue,
        };

        if href.starts_with("javascript:") {
            let children: Vec<NodeRef> = link.children().collect();
            if children.len() == 1 && children[0].as_text().is_some() {
                let text = NodeRef::new_text(link.text_contents());
                link.insert_before(text);
            } else {
                let container = dom_utils::create_element("span");
                for child in children {
                    container.append(child);
                }
                link.insert_before(container);
            }
            link.detach();
        } else {
            dom_utils::set_attr(&link, "href", &to_absolute_uri(&href, &base));
        }
    }

    let medias = dom_utils::elements_by_tags(
        article_content,
        &["img", "picture", "figure", "video", "audio", "source"],
    );
    for media in medias {
        if let Some(src) = dom_utils::get_attr(&media, "src") {
            dom_utils::set_attr(&media, "src", &to_absolute_uri(&src, &base));
        }
        if let Some(poster) = dom_utils::get_attr(&media, "poster") {
            dom_utils::set_attr(&media, "poster", &to_absolute_uri(&poster, &base));
        }
        if let Some(srcset) = dom_utils::get_attr(&media, "srcset") {
            let fixed = REGEXPS
                .srcset_url
                .replace_all(&srcset, |caps: &regex::Captures| {
                    format!(
                        "{}{}{}",
                        to_absolute_uri(&caps[1], &base),
                        caps.get(2).map_or("", |m| m.as_str()),
                        caps.get(3).map_or("", |m| m.as_str()),
                    )
                });
            dom_utils::set_attr(&media, "srcset", &fixed);
        }
    }
}

/// Flatten chains of divs and sections that wrap a single child.
///
/// The reader wrapper itself (ids starting with "readability") is kept so
/// consumers can still target the page container.
fn simplify_nested_elements(article_content: &NodeRef) {
    let mut node = Some(article_content.clone());
    while let Some(current) = node {
        let is_wrapper_tag = current
            .as_element()
            .map_or(false, |el| matches!(el.name.local.as_ref(), "div" | "section"));

        if current.parent().is_some() && is_wrapper_tag {
            let reader_id = dom_utils::get_attr(&current, "id")
                .map_or(false, |id| id.starts_with("readability"));
            if !reader_id {
                if dom_utils::is_element_without_content(&current) {
                    node = dom_utils::remove_and_get_next_element(current);
                    continue;
                }
                if dom_utils::has_single_tag_inside_element(&current, "div")
                    || dom_utils::has_single_tag_inside_element(&current, "section")
                {
                    if let Some(child) = dom_utils::first_element_child(&current) {
                        for (name, value) in dom_utils::attr_pairs(&current) {
                            dom_utils::set_attr(&child, &name, &value);
                        }
                        current.insert_before(child.clone());
                        current.detach();
                        node = Some(child);
                        continue;
                    }
                }
            }
        }

        node = dom_utils::next_element_node(&current, false);
    }
}

fn clean_classes(node: &NodeRef, preserve: &HashSet<&str>) {
    if let Some(class_value) = dom_utils::get_attr(node, "class") {
        let kept: Vec<&str> = class_value
            .split_whitespace()
            .filter(|cls| preserve.contains(cls))
            .collect();
        if kept.is_empty() {
            dom_utils::remove_attr(node, "class");
        } else {
            dom_utils::set_attr(node, "class", &kept.join(" "));
        }
    }

    let mut child = dom_utils::first_element_child(node);
    while let Some(current) = child {
        clean_classes(&current, preserve);
        child = dom_utils::next_element_sibling(&current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchikikiki::parse_html;
    use kuchikikiki::traits::TendrilSink;

    fn content_of(html: &str) -> NodeRef {
        let doc = parse_html().one(html);
        doc.select_first("#content").unwrap().as_node().clone()
    }

    #[test]
    fn test_relative_urls_resolved_against_base() {
        let content = content_of(
            r##"<html><body><div id="content">
            <p><a href="/about">about</a> and <a href="#notes">notes</a></p>
            <img src="pics/a.jpg">
            </div></body></html>"##,
        );
        fix_relative_uris(&content, "https://example.com/blog/post");

        let doc = content;
        let links = dom_utils::elements_by_tags(&doc, &["a"]);
        assert_eq!(
            dom_utils::get_attr(&links[0], "href").as_deref(),
            Some("https://example.com/about")
        );
        assert_eq!(
            dom_utils::get_attr(&links[1], "href").as_deref(),
            Some("#notes")
        );
        let img = &dom_utils::elements_by_tags(&doc, &["img"])[0];
        assert_eq!(
            dom_utils::get_attr(img, "src").as_deref(),
            Some("https://example.com/blog/pics/a.jpg")
        );
    }

    #[test]
    fn test_javascript_link_replaced_by_its_text() {
        let content = content_of(
            r#"<html><body><div id="content">
            <p>Please <a href="javascript:void(0)">click here</a> now.</p>
            </div></body></html>"#,
        );
        fix_relative_uris(&content, "https://example.com/");

        assert!(dom_utils::elements_by_tags(&content, &["a"]).is_empty());
        let text = dom_utils::inner_text(&content, true);
        assert_eq!(text, "Please click here now.");
    }

    #[test]
    fn test_javascript_link_with_markup_becomes_span() {
        let content = content_of(
            r#"<html><body><div id="content">
            <a href="javascript:go()"><b>bold</b> tail</a>
            </div></body></html>"#,
        );
        fix_relative_uris(&content, "https://example.com/");

        assert!(dom_utils::elements_by_tags(&content, &["a"]).is_empty());
        let span = &dom_utils::elements_by_tags(&content, &["span"])[0];
        assert!(!dom_utils::elements_by_tags(span, &["b"]).is_empty());
        assert!(span.text_contents().contains("tail"));
    }

    #[test]
    fn test_srcset_urls_resolved_with_descriptors() {
        let content = content_of(
            r#"<html><body><div id="content">
            <img srcset="a.jpg 1x, b.jpg 2x" src="a.jpg">
            </div></body></html>"#,
        );
        fix_relative_uris(&content, "https://example.com/");

        let img = &dom_utils::elements_by_tags(&content, &["img"])[0];
        assert_eq!(
            dom_utils::get_attr(img, "srcset").as_deref(),
            Some("https://example.com/a.jpg 1x, https://example.com/b.jpg 2x")
        );
    }

    #[test]
    fn test_single_child_wrappers_flatten_with_attributes() {
        let content = content_of(
            r#"<html><body><article id="content">
            <div id="outer"><div class="inner"><p>text</p></div></div>
            </article></body></html>"#,
        );
        simplify_nested_elements(&content);

        let remaining = dom_utils::elements_by_tags(&content, &["div"]);
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            dom_utils::get_attr(&remaining[0], "id").as_deref(),
            Some("outer")
        );
        assert_eq!(
            dom_utils::get_attr(&remaining[0], "class").as_deref(),
            Some("inner")
        );
    }

    #[test]
    fn test_contentless_wrappers_removed() {
        let content = content_of(
            r#"<html><body><article id="content">
            <section>   </section><p>kept</p>
            </article></body></html>"#,
        );
        simplify_nested_elements(&content);

        assert!(dom_utils::elements_by_tags(&content, &["section"]).is_empty());
        assert_eq!(dom_utils::elements_by_tags(&content, &["p"]).len(), 1);
    }

    #[test]
    fn test_reader_page_wrapper_is_not_flattened() {
        let content = content_of(
            r#"<html><body><article id="content">
            <div id="readability-page-1" class="page"><div><p>x</p></div></div>
            </article></body></html>"#,
        );
        simplify_nested_elements(&content);

        let page = dom_utils::elements_by_tags(&content, &["div"])
            .into_iter()
            .find(|d| dom_utils::get_attr(d, "id").as_deref() == Some("readability-page-1"))
            .expect("page wrapper survives");
        assert!(dom_utils::first_element_child(&page).is_some());
    }

    #[test]
    fn test_classes_filtered_to_preserve_list() {
        let content = content_of(
            r#"<html><body><div id="content">
            <div class="page extra"><p class="lede junk">a</p><p class="junk">b</p></div>
            </div></body></html>"#,
        );
        let preserve: HashSet<&str> = ["page", "lede"].into_iter().collect();
        clean_classes(&content, &preserve);

        let div = &dom_utils::elements_by_tags(&content, &["div"])[0];
        assert_eq!(dom_utils::get_attr(div, "class").as_deref(), Some("page"));
        let paragraphs = dom_utils::elements_by_tags(&content, &["p"]);
        assert_eq!(
            dom_utils::get_attr(&paragraphs[0], "class").as_deref(),
            Some("lede")
        );
        assert_eq!(dom_utils::get_attr(&paragraphs[1], "class"), None);
    }

    #[test]
    fn test_keep_classes_bypasses_stripping() {
        let content = content_of(
            r#"<html><body><div id="content">
            <p class="junk">a</p>
            </div></body></html>"#,
        );
        let options = ReadabilityOptions::builder().keep_classes(true).build();
        post_process_content(&content, None, &options);

        let p = &dom_utils::elements_by_tags(&content, &["p"])[0];
        assert_eq!(dom_utils::get_attr(p, "class").as_deref(), Some("junk"));
    }
}
