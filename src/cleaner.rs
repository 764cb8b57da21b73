//! Document preparation and article cleanup passes.
//!
//! `prep_document` runs before scoring to normalize the raw page, and
//! `prep_article` runs after assembly to strip the junk that survived
//! inside the winning container.

use std::collections::HashSet;

use kuchikikiki::NodeRef;

use crate::constants::{
    DEFAULT_CHAR_THRESHOLD, DEPRECATED_SIZE_ATTRIBUTE_ELEMS, DIV_TO_P_ELEMS, EMBED_ELEMS,
    PRESENTATIONAL_ATTRIBUTES, REGEXPS,
};
use crate::content_extractor::GrabFlags;
use crate::dom_utils::{self, node_key, NodeKey};
use crate::options::ReadabilityOptions;
use crate::scoring;

/// Normalize the document before any scoring happens: drop scripts and
/// styles, collapse `<br>` runs into paragraphs, and retag `<font>`.
pub fn prep_document(doc: &NodeRef) {
    for node in dom_utils::elements_by_tags(doc, &["script", "noscript"]) {
        node.detach();
    }
    for node in dom_utils::elements_by_tags(doc, &["style"]) {
        node.detach();
    }
    if let Ok(body) = doc.select_first("body") {
        replace_brs(body.as_node());
    }
    for font in dom_utils::elements_by_tags(doc, &["font"]) {
        dom_utils::set_node_tag(&font, "span");
    }
}

/// Replace two or more consecutive `<br>`s (ignoring whitespace between
/// them) with a paragraph that absorbs the phrasing content that follows,
/// so `foo<br><br>bar` reads as two paragraphs.
fn replace_brs(root: &NodeRef) {
    for br in dom_utils::elements_by_tags(root, &["br"]) {
        if br.parent().is_none() {
            continue;
        }
        let mut next = dom_utils::next_skipping_whitespace(br.next_sibling());
        let mut replaced = false;
        while let Some(node) = next {
            if !dom_utils::is_tag(&node, "br") {
                break;
            }
            replaced = true;
            let sibling = node.next_sibling();
            node.detach();
            next = dom_utils::next_skipping_whitespace(sibling);
        }
        if !replaced {
            continue;
        }

        let paragraph = dom_utils::create_element("p");
        br.insert_before(paragraph.clone());
        br.detach();

        let mut sibling = paragraph.next_sibling();
        while let Some(node) = sibling {
            // Another br pair ahead means a fresh paragraph starts there.
            if dom_utils::is_tag(&node, "br") {
                if let Some(after) = dom_utils::next_skipping_whitespace(node.next_sibling()) {
                    if dom_utils::is_tag(&after, "br") {
                        break;
                    }
                }
            }
            if !dom_utils::is_phrasing_content(&node) {
                break;
            }
            let next_sibling = node.next_sibling();
            paragraph.append(node);
            sibling = next_sibling;
        }

        while let Some(last) = paragraph.last_child() {
            if dom_utils::is_whitespace(&last) {
                last.detach();
            } else {
                break;
            }
        }

        if let Some(parent) = paragraph.parent() {
            if dom_utils::is_tag(&parent, "p") {
                dom_utils::set_node_tag(&parent, "div");
            }
        }
    }
}

/// Find `noscript` fallbacks that hold the real version of a lazy-loaded
/// image and swap them in before scripts get stripped.
///
/// Browsers with scripting enabled expose noscript content as raw text, so
/// the payload is reparsed as a fragment. The placeholder's useful
/// attribute values are kept on the replacement under `data-old-` names.
pub fn unwrap_noscript_images(doc: &NodeRef) {
    // Placeholder imgs with no source at all carry no information.
    for img in dom_utils::elements_by_tags(doc, &["img"]) {
        let keeps_information = dom_utils::attr_pairs(&img).iter().any(|(name, value)| {
            matches!(name.as_str(), "src" | "srcset" | "data-src" | "data-srcset")
                || REGEXPS.img_extensions.is_match(value)
        });
        if !keeps_information {
            img.detach();
        }
    }

    for noscript in dom_utils::elements_by_tags(doc, &["noscript"]) {
        let mut payload = String::new();
        let mut has_element_child = false;
        for child in noscript.children() {
            if let Some(text) = child.as_text() {
                payload.push_str(&text.borrow());
            } else if child.as_element().is_some() {
                has_element_child = true;
            }
        }
        if payload.trim().is_empty() && has_element_child {
            payload = dom_utils::inner_html(&noscript);
        }

        let tmp = dom_utils::create_element("div");
        for node in dom_utils::parse_fragment_nodes(&payload, "div") {
            tmp.append(node);
        }
        let new_img = match single_image_of(&tmp) {
            Some(img) => img,
            None => continue,
        };
        let prev = match dom_utils::previous_element_sibling(&noscript) {
            Some(prev) => prev,
            None => continue,
        };
        let prev_img = match single_image_of(&prev) {
            Some(img) => img,
            None => continue,
        };

        for (name, value) in dom_utils::attr_pairs(&prev_img) {
            if value.is_empty() {
                continue;
            }
            if name != "src" && name != "srcset" && !REGEXPS.img_extensions.is_match(&value) {
                continue;
            }
            if dom_utils::get_attr(&new_img, &name).as_deref() == Some(value.as_str()) {
                continue;
            }
            let target = if dom_utils::get_attr(&new_img, &name).is_some() {
                format!("data-old-{}", name)
            } else {
                name
            };
            dom_utils::set_attr(&new_img, &target, &value);
        }

        if let Some(replacement) = dom_utils::first_element_child(&tmp) {
            prev.insert_before(replacement);
            prev.detach();
        }
    }
}

/// Descend through single-child wrappers to the lone `img`, if that is all
/// the subtree holds.
fn single_image_of(node: &NodeRef) -> Option<NodeRef> {
    let mut current = node.clone();
    loop {
        if dom_utils::is_tag(&current, "img") {
            return Some(current);
        }
        let mut element_children = current.children().filter(|c| c.as_element().is_some());
        let only = element_children.next()?;
        if element_children.next().is_some() || !current.text_contents().trim().is_empty() {
            return None;
        }
        current = only;
    }
}

/// Clean the assembled article in place. Steps run in a fixed order, each
/// finishing before the next starts.
pub fn prep_article(article_content: &NodeRef, flags: GrabFlags, options: &ReadabilityOptions) {
    clean_styles(article_content);

    let data_tables = mark_data_tables(article_content);
    fix_lazy_images(article_content);

    clean_conditionally(article_content, "form", flags, options, &data_tables);
    clean_conditionally(article_content, "fieldset", flags, options, &data_tables);
    clean_conditionally(article_content, "table", flags, options, &data_tables);
    clean_conditionally(article_content, "ul", flags, options, &data_tables);
    clean_conditionally(article_content, "ol", flags, options, &data_tables);

    clean(article_content, "object", options);
    clean(article_content, "embed", options);
    clean(article_content, "footer", options);
    clean(article_content, "link", options);
    clean(article_content, "aside", options);

    clean(article_content, "iframe", options);
    clean(article_content, "input", options);
    clean(article_content, "textarea", options);
    clean(article_content, "select", options);
    clean(article_content, "button", options);

    // Share widgets are cleaned within each top-level block, never the
    // block itself.
    let top_children: Vec<NodeRef> = article_content
        .children()
        .filter(|c| c.as_element().is_some())
        .collect();
    for child in top_children {
        clean_matched_nodes(&child, |node, match_string| {
            REGEXPS.share_elements.is_match(match_string)
                && node.text_contents().chars().count() < DEFAULT_CHAR_THRESHOLD
        });
    }

    clean_headers(article_content, flags);

    for h1 in dom_utils::elements_by_tags(article_content, &["h1"]) {
        dom_utils::set_node_tag(&h1, "h2");
    }

    for paragraph in dom_utils::elements_by_tags(article_content, &["p"]) {
        let media = dom_utils::elements_by_tags(&paragraph, &["img", "embed", "object", "iframe"]);
        if media.is_empty() && dom_utils::inner_text(&paragraph, false).is_empty() {
            paragraph.detach();
        }
    }

    for br in dom_utils::elements_by_tags(article_content, &["br"]) {
        if let Some(next) = dom_utils::next_skipping_whitespace(br.next_sibling()) {
            if dom_utils::is_tag(&next, "p") {
                br.detach();
            }
        }
    }

    collapse_single_cell_tables(article_content);
}

/// Strip presentational attributes everywhere except inside `svg`, where
/// they are structural.
fn clean_styles(root: &NodeRef) {
    let mut stack = vec![root.clone()];
    while let Some(node) = stack.pop() {
        if dom_utils::is_tag(&node, "svg") {
            continue;
        }
        for attribute in PRESENTATIONAL_ATTRIBUTES {
            dom_utils::remove_attr(&node, attribute);
        }
        if let Some(element) = node.as_element() {
            if DEPRECATED_SIZE_ATTRIBUTE_ELEMS.contains(&&*element.name.local) {
                dom_utils::remove_attr(&node, "width");
                dom_utils::remove_attr(&node, "height");
            }
        }
        let mut child = dom_utils::first_element_child(&node);
        while let Some(current) = child {
            child = dom_utils::next_element_sibling(&current);
            stack.push(current);
        }
    }
}

/// Classify every table as data (worth keeping) or layout.
fn mark_data_tables(root: &NodeRef) -> HashSet<NodeKey> {
    let mut data_tables = HashSet::new();
    for table in dom_utils::elements_by_tags(root, &["table"]) {
        if dom_utils::get_attr(&table, "role").as_deref() == Some("presentation") {
            continue;
        }
        if dom_utils::get_attr(&table, "datatable").as_deref() == Some("0") {
            continue;
        }
        if dom_utils::get_attr(&table, "summary").map_or(false, |s| !s.trim().is_empty()) {
            data_tables.insert(node_key(&table));
            continue;
        }
        let caption = dom_utils::elements_by_tags(&table, &["caption"]).into_iter().next();
        if caption.map_or(false, |c| c.first_child().is_some()) {
            data_tables.insert(node_key(&table));
            continue;
        }
        let structural =
            dom_utils::elements_by_tags(&table, &["col", "colgroup", "tfoot", "thead", "th"]);
        if !structural.is_empty() {
            data_tables.insert(node_key(&table));
            continue;
        }
        if !dom_utils::elements_by_tags(&table, &["table"]).is_empty() {
            // Nested tables mean layout.
            continue;
        }
        let (rows, columns) = row_and_column_count(&table);
        if rows == 1 || columns == 1 {
            continue;
        }
        if rows >= 10 || columns > 4 || rows * columns > 10 {
            data_tables.insert(node_key(&table));
        }
    }
    data_tables
}

/// Parse the leading integer of a span attribute the way `parseInt` would,
/// treating missing, malformed, and zero values as 1.
fn span_value(value: Option<String>) -> usize {
    let digits: String = value
        .unwrap_or_default()
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<usize>().unwrap_or(1).max(1)
}

fn row_and_column_count(table: &NodeRef) -> (usize, usize) {
    let mut rows = 0;
    let mut columns = 0;
    for tr in dom_utils::elements_by_tags(table, &["tr"]) {
        rows += span_value(dom_utils::get_attr(&tr, "rowspan"));
        let mut columns_in_row = 0;
        for td in dom_utils::elements_by_tags(&tr, &["td"]) {
            columns_in_row += span_value(dom_utils::get_attr(&td, "colspan"));
        }
        columns = columns.max(columns_in_row);
    }
    (rows, columns)
}

/// Recover real image sources hidden behind lazy-loading placeholders.
fn fix_lazy_images(root: &NodeRef) {
    for elem in dom_utils::elements_by_tags(root, &["img", "picture", "figure"]) {
        // A tiny base64 src next to a real-looking URL in another
        // attribute is a placeholder.
        let src = dom_utils::get_attr(&elem, "src").unwrap_or_default();
        if let Some(caps) = REGEXPS.b64_data_url.captures(&src) {
            let mime = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            if !mime.eq_ignore_ascii_case("image/svg+xml") {
                let has_image_elsewhere = dom_utils::attr_pairs(&elem)
                    .iter()
                    .any(|(name, value)| name != "src" && REGEXPS.img_extensions.is_match(value));
                if has_image_elsewhere {
                    let prefix_len = caps.get(0).map(|m| m.end()).unwrap_or(0);
                    if src.len() - prefix_len < 133 {
                        dom_utils::remove_attr(&elem, "src");
                    }
                }
            }
        }

        let src = dom_utils::get_attr(&elem, "src").unwrap_or_default();
        let srcset = dom_utils::get_attr(&elem, "srcset").unwrap_or_default();
        let class = dom_utils::get_attr(&elem, "class").unwrap_or_default();
        if (!src.trim().is_empty() || !srcset.trim().is_empty())
            && !class.to_lowercase().contains("lazy")
        {
            continue;
        }

        for (name, value) in dom_utils::attr_pairs(&elem) {
            if name == "src" || name == "srcset" || name == "alt" {
                continue;
            }
            let copy_to = if REGEXPS.lazy_srcset_value.is_match(&value) {
                Some("srcset")
            } else if REGEXPS.lazy_src_value.is_match(&value) {
                Some("src")
            } else {
                None
            };
            if let Some(target) = copy_to {
                if dom_utils::is_tag(&elem, "img") || dom_utils::is_tag(&elem, "picture") {
                    let existing = dom_utils::get_attr(&elem, target).unwrap_or_default();
                    if existing.trim().is_empty() || existing == value {
                        dom_utils::set_attr(&elem, target, &value);
                    } else {
                        dom_utils::set_attr(&elem, &format!("data-old-{}", target), &value);
                    }
                } else if dom_utils::is_tag(&elem, "figure")
                    && dom_utils::elements_by_tags(&elem, &["img", "picture"]).is_empty()
                {
                    let img = dom_utils::create_element("img");
                    dom_utils::set_attr(&img, target, &value);
                    elem.append(img);
                }
            }
        }
    }
}

fn is_video_url(value: &str, options: &ReadabilityOptions) -> bool {
    REGEXPS.videos.is_match(value)
        || options
            .allowed_video_regex
            .as_ref()
            .map_or(false, |re| re.is_match(value))
}

/// Remove every `tag` element under `root`, except embeds that point at an
/// allowed video host.
fn clean(root: &NodeRef, tag: &str, options: &ReadabilityOptions) {
    let is_embed = EMBED_ELEMS.contains(&tag);
    for node in dom_utils::elements_by_tags(root, &[tag]) {
        if node.parent().is_none() {
            continue;
        }
        if is_embed {
            let allowed = dom_utils::attr_pairs(&node)
                .iter()
                .any(|(_, value)| is_video_url(value, options));
            if allowed {
                continue;
            }
            if tag == "object" && is_video_url(&dom_utils::inner_html(&node), options) {
                continue;
            }
        }
        node.detach();
    }
}

fn clean_headers(root: &NodeRef, flags: GrabFlags) {
    for heading in dom_utils::elements_by_tags(root, &["h1", "h2"]) {
        if scoring::get_class_weight(&heading, flags) < 0.0 {
            heading.detach();
        }
    }
}

/// Walk `node`'s subtree (never `node` itself) removing elements the
/// filter flags.
fn clean_matched_nodes<F: Fn(&NodeRef, &str) -> bool>(node: &NodeRef, filter: F) {
    let end_key = dom_utils::next_element_node(node, true).map(|end| node_key(&end));
    let mut next = dom_utils::next_element_node(node, false);
    while let Some(current) = next {
        if end_key == Some(node_key(&current)) {
            break;
        }
        let match_string = dom_utils::class_and_id(&current);
        if filter(&current, &match_string) {
            next = dom_utils::remove_and_get_next_element(current);
        } else {
            next = dom_utils::next_element_node(&current, false);
        }
    }
}

/// Remove `tag` elements that look like junk by a pile of content
/// heuristics. Only runs while the `CLEAN_CONDITIONALLY` flag is up.
fn clean_conditionally(
    root: &NodeRef,
    tag: &str,
    flags: GrabFlags,
    options: &ReadabilityOptions,
    data_tables: &HashSet<NodeKey>,
) {
    if !flags.contains(GrabFlags::CLEAN_CONDITIONALLY) {
        return;
    }
    let nodes = dom_utils::elements_by_tags(root, &[tag]);
    for node in nodes.into_iter().rev() {
        if node.parent().is_none() {
            continue;
        }
        if should_clean(&node, tag, flags, options, data_tables) {
            node.detach();
        }
    }
}

fn should_clean(
    node: &NodeRef,
    tag: &str,
    flags: GrabFlags,
    options: &ReadabilityOptions,
    data_tables: &HashSet<NodeKey>,
) -> bool {
    let is_data_table = |n: &NodeRef| data_tables.contains(&node_key(n));

    if tag == "table" && is_data_table(node) {
        return false;
    }
    if dom_utils::has_ancestor_tag_filtered(node, "table", 0, &is_data_table) {
        return false;
    }
    if dom_utils::has_ancestor_tag(node, "code", 3) {
        return false;
    }
    if dom_utils::elements_by_tags(node, &["table"])
        .iter()
        .any(|t| is_data_table(t))
    {
        return false;
    }

    let mut is_list = tag == "ul" || tag == "ol";
    if !is_list {
        let total_text = dom_utils::inner_text(node, true).chars().count();
        if total_text > 0 {
            let list_text: usize = dom_utils::elements_by_tags(node, &["ul", "ol"])
                .iter()
                .map(|list| dom_utils::inner_text(list, true).chars().count())
                .sum();
            is_list = list_text as f64 / total_text as f64 > 0.9;
        }
    }

    let weight = scoring::get_class_weight(node, flags);
    if weight < 0.0 {
        return true;
    }

    let inner_text = dom_utils::inner_text(node, true);
    if inner_text.matches(',').count() >= 10 {
        return false;
    }

    let p = dom_utils::elements_by_tags(node, &["p"]).len();
    let img = dom_utils::elements_by_tags(node, &["img"]).len();
    let li = dom_utils::elements_by_tags(node, &["li"]).len() as isize - 100;
    let input = dom_utils::elements_by_tags(node, &["input"]).len();
    let heading_density = text_density(node, &["h1", "h2", "h3", "h4", "h5", "h6"]);

    let mut embed_count = 0;
    for embed in dom_utils::elements_by_tags(node, &EMBED_ELEMS) {
        for (_, value) in dom_utils::attr_pairs(&embed) {
            if is_video_url(&value, options) {
                return false;
            }
        }
        if dom_utils::is_tag(&embed, "object")
            && is_video_url(&dom_utils::inner_html(&embed), options)
        {
            return false;
        }
        embed_count += 1;
    }

    if REGEXPS.ad_words.is_match(&inner_text) || REGEXPS.loading_words.is_match(&inner_text) {
        return true;
    }

    let content_length = inner_text.chars().count();
    let link_density = dom_utils::link_density(node);
    let mut textish_tags: Vec<&str> = vec!["span", "li", "td"];
    textish_tags.extend_from_slice(&DIV_TO_P_ELEMS);
    let density = text_density(node, &textish_tags);
    let is_figure_child = dom_utils::has_ancestor_tag(node, "figure", 3);

    let have_to_remove = (!is_figure_child && img > 1 && (p as f64) < (img as f64) * 0.5)
        || (!is_list && li > p as isize)
        || (input as f64 > (p as f64 / 3.0).floor())
        || (!is_list
            && !is_figure_child
            && heading_density < 0.9
            && content_length < 25
            && (img == 0 || img > 2)
            && link_density > 0.0)
        || (!is_list && weight < 25.0 && link_density > 0.2 + options.link_density_modifier)
        || (weight >= 25.0 && link_density > 0.5 + options.link_density_modifier)
        || (embed_count == 1 && content_length < 75)
        || embed_count > 1
        || (img == 0 && density == 0.0);

    if is_list && have_to_remove {
        // Image galleries are lists that earn their keep: every item an
        // image, no deeper structure.
        for child in node.children().filter(|c| c.as_element().is_some()) {
            if child.children().filter(|c| c.as_element().is_some()).count() > 1 {
                return true;
            }
        }
        let li_count = dom_utils::elements_by_tags(node, &["li"]).len();
        return img != li_count;
    }

    have_to_remove
}

/// Proportion of the node's text living inside descendants with the given
/// tags.
fn text_density(node: &NodeRef, tags: &[&str]) -> f64 {
    let text_length = dom_utils::inner_text(node, true).chars().count();
    if text_length == 0 {
        return 0.0;
    }
    let children_length: usize = dom_utils::elements_by_tags(node, tags)
        .iter()
        .map(|child| dom_utils::inner_text(child, true).chars().count())
        .sum();
    children_length as f64 / text_length as f64
}

/// A table holding exactly one cell collapses into that cell, retagged to
/// match its content.
fn collapse_single_cell_tables(root: &NodeRef) {
    for table in dom_utils::elements_by_tags(root, &["table"]) {
        if table.parent().is_none() {
            continue;
        }
        let tbody = if dom_utils::has_single_tag_inside_element(&table, "tbody") {
            match dom_utils::first_element_child(&table) {
                Some(t) => t,
                None => continue,
            }
        } else {
            table.clone()
        };
        if !dom_utils::has_single_tag_inside_element(&tbody, "tr") {
            continue;
        }
        let row = match dom_utils::first_element_child(&tbody) {
            Some(r) => r,
            None => continue,
        };
        if !dom_utils::has_single_tag_inside_element(&row, "td") {
            continue;
        }
        let cell = match dom_utils::first_element_child(&row) {
            Some(c) => c,
            None => continue,
        };
        let all_phrasing = cell.children().all(|c| dom_utils::is_phrasing_content(&c));
        let cell = dom_utils::set_node_tag(&cell, if all_phrasing { "p" } else { "div" });
        table.insert_before(cell);
        table.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kuchikikiki::parse_html;
    use kuchikikiki::traits::TendrilSink;

    fn article_of(html: &str) -> NodeRef {
        let doc = parse_html().one(html);
        doc.select_first("#article").unwrap().as_node().clone()
    }

    #[test]
    fn test_replace_brs_collapses_chains_into_paragraphs() {
        let doc = parse_html().one("<html><body><div id=\"d\">foo<br>bar<br> <br><br>abc</div></body></html>");
        let body = doc.select_first("body").unwrap().as_node().clone();
        replace_brs(&body);
        let div = doc.select_first("#d").unwrap().as_node().clone();
        let brs = dom_utils::elements_by_tags(&div, &["br"]);
        assert_eq!(brs.len(), 1);
        let p = doc.select_first("#d p").unwrap();
        assert!(p.text_contents().contains("abc"));
    }

    #[test]
    fn test_replace_brs_retags_paragraph_parent_to_div() {
        let doc = parse_html()
            .one("<html><body><p id=\"p\">text<br><br>more</p></body></html>");
        let body = doc.select_first("body").unwrap().as_node().clone();
        replace_brs(&body);
        // The old paragraph is now a div holding an inner paragraph.
        let inner = doc.select_first("div > p").unwrap();
        assert_eq!(inner.text_contents(), "more");
        assert!(doc.select_first("#p").is_err() || !dom_utils::is_tag(
            doc.select_first("#p").unwrap().as_node(),
            "p"
        ));
    }

    #[test]
    fn test_unwrap_noscript_images_swaps_in_real_image() {
        let doc = parse_html().one(
            r#"<html><body><div id="c">
            <img id="placeholder" src="placeholder.gif">
            <noscript><img src="real.jpg"></noscript>
            </div></body></html>"#,
        );
        unwrap_noscript_images(&doc);
        let img = doc.select_first("#c img").unwrap();
        let img = img.as_node();
        assert_eq!(dom_utils::get_attr(img, "src").as_deref(), Some("real.jpg"));
        assert_eq!(
            dom_utils::get_attr(img, "data-old-src").as_deref(),
            Some("placeholder.gif")
        );
        // The noscript stays behind; script stripping removes it later.
        assert!(doc.select_first("noscript").is_ok());
    }

    #[test]
    fn test_unwrap_noscript_images_drops_sourceless_imgs() {
        let doc = parse_html().one(
            r#"<html><body>
            <img id="dead" alt="decoration">
            <img id="lazy" data-src="real.jpg" alt="kept">
            </body></html>"#,
        );
        unwrap_noscript_images(&doc);
        assert!(doc.select_first("#dead").is_err());
        assert!(doc.select_first("#lazy").is_ok());
    }

    #[test]
    fn test_prep_document_removes_scripts_and_styles() {
        let doc = parse_html().one(
            r#"<html><head><style>body { color: red; }</style></head><body>
            <script>alert(1)</script>
            <noscript>fallback</noscript>
            <font size="3" id="f">styled text</font>
            </body></html>"#,
        );
        prep_document(&doc);
        assert!(doc.select_first("script").is_err());
        assert!(doc.select_first("noscript").is_err());
        assert!(doc.select_first("style").is_err());
        assert!(doc.select_first("font").is_err());
        let span = doc.select_first("span").unwrap();
        assert_eq!(span.text_contents(), "styled text");
    }

    #[test]
    fn test_mark_data_tables_classification() {
        let doc = parse_html().one(
            r#"<html><body>
            <table id="presentation" role="presentation"><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>
            <table id="summary" summary="quarterly numbers"><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>
            <table id="headed"><tr><th>h</th><th>h</th></tr><tr><td>a</td><td>b</td></tr></table>
            <table id="small"><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>
            <table id="wide"><tr><td>a</td><td>b</td><td>c</td><td>d</td><td>e</td></tr><tr><td>a</td><td>b</td><td>c</td><td>d</td><td>e</td></tr></table>
            </body></html>"#,
        );
        let marked = mark_data_tables(&doc);
        let key_of = |id: &str| node_key(doc.select_first(id).unwrap().as_node());
        assert!(!marked.contains(&key_of("#presentation")));
        assert!(marked.contains(&key_of("#summary")));
        assert!(marked.contains(&key_of("#headed")));
        assert!(!marked.contains(&key_of("#small")));
        assert!(marked.contains(&key_of("#wide")));
    }

    #[test]
    fn test_row_and_column_count_honors_spans() {
        let doc = parse_html().one(
            r#"<html><body><table id="t">
            <tr rowspan="2"><td colspan="3">a</td><td>b</td></tr>
            <tr><td colspan="0">c</td></tr>
            <tr rowspan="junk"><td colspan="2x">d</td></tr>
            </table></body></html>"#,
        );
        let table = doc.select_first("#t").unwrap().as_node().clone();
        let (rows, columns) = row_and_column_count(&table);
        assert_eq!(rows, 4);
        assert_eq!(columns, 4);
    }

    #[test]
    fn test_prep_article_preserves_data_table_and_drops_layout_table() {
        let html = r#"<html><body><div id="article">
            <p>Sufficient paragraph text sits here to keep densities sane for the block.</p>
            <table id="data" summary="financial data">
            <tr><td><a href="/q1">Q1</a></td><td><a href="/q2">Q2</a></td></tr>
            <tr><td><a href="/q3">Q3</a></td><td><a href="/q4">Q4</a></td></tr>
            </table>
            <table id="layout"><tr>
            <td><a href="/home">Home</a></td><td><a href="/archive">Archive</a></td><td><a href="/about">About</a></td>
            </tr></table>
            </div></body></html>"#;
        let article = article_of(html);
        prep_article(&article, GrabFlags::all(), &ReadabilityOptions::default());
        let serialized = article.to_string();
        assert!(serialized.contains("id=\"data\""));
        assert!(!serialized.contains("id=\"layout\""));
    }

    #[test]
    fn test_prep_article_conditional_cleaning_respects_flag() {
        let html = r#"<html><body><div id="article">
            <ul id="nav" class="sidebar"><li><a href="/a">One</a></li><li><a href="/b">Two</a></li></ul>
            <p>Readable text long enough to stay.</p>
            </div></body></html>"#;

        let article = article_of(html);
        prep_article(&article, GrabFlags::all(), &ReadabilityOptions::default());
        assert!(!article.to_string().contains("id=\"nav\""));

        let article = article_of(html);
        prep_article(
            &article,
            GrabFlags::all() - GrabFlags::CLEAN_CONDITIONALLY,
            &ReadabilityOptions::default(),
        );
        assert!(article.to_string().contains("id=\"nav\""));
    }

    #[test]
    fn test_prep_article_strips_presentational_attributes() {
        let html = r##"<html><body><div id="article">
            <div id="inner" align="center" bgcolor="#fff" style="color: red">
            <p>Paragraph text that carries the article forward in earnest.</p>
            <table id="t" width="400" height="200"><tr><td>a</td><td>b</td></tr><tr><td>c</td><td>d</td></tr></table>
            <svg><rect style="fill: blue"></rect></svg>
            </div></div></body></html>"##;
        let article = article_of(html);
        prep_article(&article, GrabFlags::all(), &ReadabilityOptions::default());
        let inner = article.select_first("#inner").unwrap().as_node().clone();
        assert!(dom_utils::get_attr(&inner, "align").is_none());
        assert!(dom_utils::get_attr(&inner, "bgcolor").is_none());
        assert!(dom_utils::get_attr(&inner, "style").is_none());
        if let Ok(table) = article.select_first("#t") {
            assert!(dom_utils::get_attr(table.as_node(), "width").is_none());
            assert!(dom_utils::get_attr(table.as_node(), "height").is_none());
        }
        if let Ok(rect) = article.select_first("rect") {
            assert!(dom_utils::get_attr(rect.as_node(), "style").is_some());
        }
    }

    #[test]
    fn test_prep_article_removes_share_widgets_but_not_top_blocks() {
        let long_share = "x".repeat(600);
        let html = format!(
            r#"<html><body><div id="article">
            <div id="block">
            <p>The genuine paragraph content of the piece continues here at length.</p>
            <div id="widget" class="share-buttons">Share on socials</div>
            <div id="big" class="share">{}</div>
            </div>
            <div id="toplevel" class="share"><p>Top level block spared by scoping.</p></div>
            </div></body></html>"#,
            long_share
        );
        let article = article_of(&html);
        prep_article(&article, GrabFlags::all(), &ReadabilityOptions::default());
        let serialized = article.to_string();
        assert!(!serialized.contains("id=\"widget\""));
        // Oversized share block stays: the text threshold protects it.
        assert!(serialized.contains("id=\"big\""));
        assert!(serialized.contains("id=\"toplevel\""));
    }

    #[test]
    fn test_prep_article_headers_and_empty_paragraphs() {
        let html = r#"<html><body><div id="article">
            <h1>Becomes An H2</h1>
            <h2 class="footer promo">Low weight heading</h2>
            <p id="empty">   </p>
            <p id="media"><img src="kept.jpg"></p>
            <p>Actual paragraph content with words in it.</p>
            </div></body></html>"#;
        let article = article_of(html);
        prep_article(&article, GrabFlags::all(), &ReadabilityOptions::default());
        let serialized = article.to_string();
        assert!(article.select_first("h1").is_err());
        assert!(serialized.contains("Becomes An H2"));
        assert!(!serialized.contains("Low weight heading"));
        assert!(article.select_first("#empty").is_err());
        assert!(article.select_first("#media").is_ok());
    }

    #[test]
    fn test_prep_article_collapses_single_cell_table() {
        let html = r#"<html><body><div id="article">
            <table id="single"><tbody><tr><td>just some text</td></tr></tbody></table>
            <p>Regular paragraph to accompany the collapsed table content.</p>
            </div></body></html>"#;
        let article = article_of(html);
        prep_article(&article, GrabFlags::all(), &ReadabilityOptions::default());
        assert!(article.select_first("table").is_err());
        let collapsed = article
            .select("p")
            .unwrap()
            .find(|p| p.text_contents() == "just some text");
        assert!(collapsed.is_some());
    }

    #[test]
    fn test_fix_lazy_images_promotes_data_attributes() {
        let html = r#"<html><body><div id="article">
            <img id="a" class="lazy" data-lazy-src="photo.jpg">
            <img id="b" data-srcset-values="photo-1x.jpg 1x, photo-2x.jpg 2x">
            <img id="c" src="data:image/gif;base64,R0lGODlhAQABAAAAACH5" data-src="real.png">
            <figure id="f" data-background="cover.webp"><figcaption>caption</figcaption></figure>
            </div></body></html>"#;
        let doc = parse_html().one(html);
        let article = doc.select_first("#article").unwrap().as_node().clone();
        fix_lazy_images(&article);
        let attr = |sel: &str, name: &str| {
            dom_utils::get_attr(doc.select_first(sel).unwrap().as_node(), name)
        };
        assert_eq!(attr("#a", "src").as_deref(), Some("photo.jpg"));
        assert_eq!(
            attr("#b", "srcset").as_deref(),
            Some("photo-1x.jpg 1x, photo-2x.jpg 2x")
        );
        assert_eq!(attr("#c", "src").as_deref(), Some("real.png"));
        assert_eq!(attr("#f img", "src").as_deref(), Some("cover.webp"));
    }

    #[test]
    fn test_clean_exempts_allowed_video_embeds() {
        let html = r#"<html><body><div id="article">
            <iframe id="video" src="https://www.youtube.com/embed/xyz"></iframe>
            <iframe id="custom" src="https://videos.example.net/clip/7"></iframe>
            <iframe id="ad" src="https://ads.example.com/banner"></iframe>
            </div></body></html>"#;

        let doc = parse_html().one(html);
        let article = doc.select_first("#article").unwrap().as_node().clone();
        clean(&article, "iframe", &ReadabilityOptions::default());
        assert!(article.select_first("#video").is_ok());
        assert!(article.select_first("#custom").is_err());
        assert!(article.select_first("#ad").is_err());

        // A caller-supplied pattern extends the built-in allow list.
        let options = ReadabilityOptions::builder()
            .allowed_video_regex(regex::Regex::new(r"videos\.example\.net").unwrap())
            .build();
        let doc = parse_html().one(html);
        let article = doc.select_first("#article").unwrap().as_node().clone();
        clean(&article, "iframe", &options);
        assert!(article.select_first("#video").is_ok());
        assert!(article.select_first("#custom").is_ok());
        assert!(article.select_first("#ad").is_err());
    }

    #[test]
    fn test_should_clean_keeps_image_gallery_lists() {
        let html = r#"<html><body>
            <ul id="gallery">
            <li><img src="one.jpg"></li>
            <li><img src="two.jpg"></li>
            <li><img src="three.jpg"></li>
            </ul>
            </body></html>"#;
        let doc = parse_html().one(html);
        let list = doc.select_first("#gallery").unwrap().as_node().clone();
        let cleaned = should_clean(
            &list,
            "ul",
            GrabFlags::all(),
            &ReadabilityOptions::default(),
            &HashSet::new(),
        );
        assert!(!cleaned);
    }

    #[test]
    fn test_should_clean_removes_ad_blocks() {
        let html = r#"<html><body>
            <div><table id="box"><tr><td>advertisement</td></tr></table></div>
            </body></html>"#;
        let doc = parse_html().one(html);
        let table = doc.select_first("#box").unwrap().as_node().clone();
        let cleaned = should_clean(
            &table,
            "table",
            GrabFlags::all(),
            &ReadabilityOptions::default(),
            &HashSet::new(),
        );
        assert!(cleaned);
    }

    #[test]
    fn test_should_clean_keeps_code_adjacent_blocks() {
        let html = r#"<html><body>
            <code><table id="t"><tr><td><a href="/a">a</a></td><td><a href="/b">b</a></td></tr></table></code>
            </body></html>"#;
        let doc = parse_html().one(html);
        let table = doc.select_first("#t").unwrap().as_node().clone();
        let cleaned = should_clean(
            &table,
            "table",
            GrabFlags::all(),
            &ReadabilityOptions::default(),
            &HashSet::new(),
        );
        assert!(!cleaned);
    }
}
