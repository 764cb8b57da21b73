//! The article grabber: prepares the DOM, drives scoring, gathers the
//! winning candidate with its worthy siblings, and retries with relaxed
//! strictness when a pass comes up short.

use bitflags::bitflags;
use kuchikikiki::NodeRef;

use crate::cleaner;
use crate::constants::{ALTER_TO_DIV_EXCEPTIONS, DEFAULT_TAGS_TO_SCORE, REGEXPS, UNLIKELY_ROLES};
use crate::dom_utils::{self, node_key};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::options::ReadabilityOptions;
use crate::scoring::{self, ScoreMap, TopCandidate};

bitflags! {
    /// Strictness switches for a single extraction pass.
    ///
    /// All three start enabled. Each failed pass turns exactly one off, in
    /// declaration order, and none is ever turned back on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct GrabFlags: u8 {
        const STRIP_UNLIKELYS = 1 << 0;
        const WEIGHT_CLASSES = 1 << 1;
        const CLEAN_CONDITIONALLY = 1 << 2;
    }
}

/// A successful grab: the detached content container plus everything the
/// walk discovered along the way.
pub struct GrabbedArticle {
    pub content: NodeRef,
    pub text_length: usize,
    pub byline: Option<String>,
    pub lang: Option<String>,
    pub dir: Option<String>,
}

struct ExtractionAttempt {
    content: NodeRef,
    length: usize,
}

fn log(options: &ReadabilityOptions, message: &str) {
    if options.debug {
        eprintln!("Reader: (Readability) {}", message);
    }
}

/// Turn off the next strictness flag in degradation order. Returns false
/// when all of them are already off.
fn remove_next_flag(flags: &mut GrabFlags) -> bool {
    for flag in [
        GrabFlags::STRIP_UNLIKELYS,
        GrabFlags::WEIGHT_CLASSES,
        GrabFlags::CLEAN_CONDITIONALLY,
    ] {
        if flags.contains(flag) {
            flags.remove(flag);
            return true;
        }
    }
    false
}

/// Whether the node announces an author, and if so capture the byline.
///
/// A node qualifies through `rel="author"`, an `itemprop` mentioning
/// author, or a byline-looking class/id, provided its text is a plausible
/// name length (under 100 characters). An `itemprop~="name"` descendant is
/// preferred over the whole block's text.
fn check_byline(node: &NodeRef, match_string: &str, byline: &mut Option<String>) -> bool {
    if byline.is_some() {
        return false;
    }
    let rel = dom_utils::get_attr(node, "rel").unwrap_or_default();
    let itemprop = dom_utils::get_attr(node, "itemprop").unwrap_or_default();
    let looks_like_byline = rel == "author"
        || itemprop.contains("author")
        || REGEXPS.byline.is_match(match_string);
    if !looks_like_byline {
        return false;
    }
    let text = node.text_contents();
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.chars().count() >= 100 {
        return false;
    }
    let name_node = node.descendants().find(|descendant| {
        dom_utils::get_attr(descendant, "itemprop").map_or(false, |value| value.contains("name"))
    });
    let captured = match name_node {
        Some(name) => dom_utils::inner_text(&name, true),
        None => trimmed.to_string(),
    };
    *byline = Some(captured);
    true
}

/// Whether an h1/h2 repeats the already-known article title.
fn header_duplicates_title(node: &NodeRef, title: &str) -> bool {
    if !dom_utils::is_tag(node, "h1") && !dom_utils::is_tag(node, "h2") {
        return false;
    }
    if title.trim().is_empty() {
        return false;
    }
    let heading = dom_utils::inner_text(node, false);
    dom_utils::text_similarity(title, &heading) > 0.75
}

/// One walk over the whole document that prunes hopeless nodes, captures
/// byline and language, and collects the elements worth scoring.
///
/// Divs get special treatment on the way: runs of phrasing children are
/// wrapped in paragraphs, a div that is a pure paragraph wrapper is
/// unwrapped, and a div with no block children becomes a paragraph itself.
fn prepare_nodes(
    doc: &NodeRef,
    article_title: &str,
    byline: &mut Option<String>,
    lang: &mut Option<String>,
    flags: GrabFlags,
    options: &ReadabilityOptions,
) -> Vec<NodeRef> {
    let mut elements_to_score: Vec<NodeRef> = Vec::new();
    let mut should_remove_title_header = true;

    let mut cursor = dom_utils::first_element_child(doc);
    while let Some(node) = cursor {
        if node.as_element().is_none() {
            cursor = dom_utils::next_element_node(&node, false);
            continue;
        }
        let match_string = dom_utils::class_and_id(&node);

        if dom_utils::is_tag(&node, "html") {
            if let Some(value) = dom_utils::get_attr(&node, "lang") {
                *lang = Some(value);
            }
        }

        if !dom_utils::is_probably_visible(&node) {
            log(options, &format!("Removing hidden node - {}", match_string));
            cursor = dom_utils::remove_and_get_next_element(node);
            continue;
        }

        // Modal dialogs never hold the article.
        if dom_utils::get_attr(&node, "aria-modal").as_deref() == Some("true")
            && dom_utils::get_attr(&node, "role").as_deref() == Some("dialog")
        {
            cursor = dom_utils::remove_and_get_next_element(node);
            continue;
        }

        if check_byline(&node, &match_string, byline) {
            cursor = dom_utils::remove_and_get_next_element(node);
            continue;
        }

        if should_remove_title_header && header_duplicates_title(&node, article_title) {
            log(options, "Removing header duplicating the article title");
            should_remove_title_header = false;
            cursor = dom_utils::remove_and_get_next_element(node);
            continue;
        }

        if flags.contains(GrabFlags::STRIP_UNLIKELYS) {
            if REGEXPS.unlikely_candidates.is_match(&match_string)
                && !REGEXPS.ok_maybe_its_a_candidate.is_match(&match_string)
                && !dom_utils::has_ancestor_tag(&node, "table", 3)
                && !dom_utils::has_ancestor_tag(&node, "code", 3)
                && !dom_utils::is_tag(&node, "body")
                && !dom_utils::is_tag(&node, "a")
            {
                log(
                    options,
                    &format!("Removing unlikely candidate - {}", match_string),
                );
                cursor = dom_utils::remove_and_get_next_element(node);
                continue;
            }
            if let Some(role) = dom_utils::get_attr(&node, "role") {
                if UNLIKELY_ROLES.contains(&role.as_str()) {
                    cursor = dom_utils::remove_and_get_next_element(node);
                    continue;
                }
            }
        }

        let is_structural = dom_utils::is_tag(&node, "div")
            || dom_utils::is_tag(&node, "section")
            || dom_utils::is_tag(&node, "header")
            || matches!(
                node.as_element().map(|e| e.name.local.to_string()).as_deref(),
                Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6")
            );
        if is_structural && dom_utils::is_element_without_content(&node) {
            cursor = dom_utils::remove_and_get_next_element(node);
            continue;
        }

        if let Some(element) = node.as_element() {
            let tag: &str = &element.name.local;
            if DEFAULT_TAGS_TO_SCORE.contains(&tag) {
                elements_to_score.push(node.clone());
            }
        }

        let mut current = node;
        if dom_utils::is_tag(&current, "div") {
            // Wrap each run of phrasing children in its own paragraph.
            let mut paragraph: Option<NodeRef> = None;
            let mut child_cursor = current.first_child();
            while let Some(child) = child_cursor {
                let next_sibling = child.next_sibling();
                if dom_utils::is_phrasing_content(&child) {
                    if let Some(p) = &paragraph {
                        p.append(child);
                    } else if !dom_utils::is_whitespace(&child) {
                        let p = dom_utils::create_element("p");
                        child.insert_before(p.clone());
                        p.append(child);
                        paragraph = Some(p);
                    }
                } else if let Some(p) = paragraph.take() {
                    while let Some(last) = p.last_child() {
                        if dom_utils::is_whitespace(&last) {
                            last.detach();
                        } else {
                            break;
                        }
                    }
                }
                child_cursor = next_sibling;
            }

            if dom_utils::has_single_tag_inside_element(&current, "p")
                && dom_utils::link_density(&current) < 0.25
            {
                // The div is a pure wrapper; promote the paragraph.
                if let Some(only_child) = dom_utils::first_element_child(&current) {
                    current.insert_before(only_child.clone());
                    current.detach();
                    elements_to_score.push(only_child.clone());
                    current = only_child;
                }
            } else if !dom_utils::has_child_block_element(&current) {
                current = dom_utils::set_node_tag(&current, "p");
                elements_to_score.push(current.clone());
            }
        }

        cursor = dom_utils::next_element_node(&current, false);
    }

    elements_to_score
}

/// Gather the top candidate and any sibling that earns its way in, moving
/// them into a fresh container.
///
/// Siblings join when their score clears `max(10, top * 0.2)` (with a bonus
/// for sharing the candidate's class name) or when they are paragraphs with
/// enough low-link-density text. Joining elements that are not already
/// block containers are retagged to divs so they cannot be re-cleaned as
/// something else.
fn assemble_content(top_candidate: &NodeRef, scores: &ScoreMap) -> NodeRef {
    let article_content = dom_utils::create_element("div");
    let top_score = scores.get(top_candidate).unwrap_or(0.0);
    let sibling_score_threshold = (top_score * 0.2).max(10.0);
    let top_class = dom_utils::get_attr(top_candidate, "class").unwrap_or_default();

    let siblings: Vec<NodeRef> = match top_candidate.parent() {
        Some(parent) => parent
            .children()
            .filter(|c| c.as_element().is_some())
            .collect(),
        None => vec![top_candidate.clone()],
    };

    for sibling in siblings {
        let mut append = node_key(&sibling) == node_key(top_candidate);

        if !append {
            let mut content_bonus = 0.0;
            let sibling_class = dom_utils::get_attr(&sibling, "class").unwrap_or_default();
            if !top_class.is_empty() && sibling_class == top_class {
                content_bonus += top_score * 0.2;
            }
            match scores.get(&sibling) {
                Some(score) if score + content_bonus >= sibling_score_threshold => {
                    append = true;
                }
                _ => {
                    if dom_utils::is_tag(&sibling, "p") {
                        let link_density = dom_utils::link_density(&sibling);
                        let node_content = dom_utils::inner_text(&sibling, true);
                        let node_length = node_content.chars().count();
                        if node_length > 80 && link_density < 0.25 {
                            append = true;
                        } else if node_length > 0
                            && node_length < 80
                            && link_density == 0.0
                            && REGEXPS.end_of_sentence.is_match(&node_content)
                        {
                            append = true;
                        }
                    }
                }
            }
        }

        if append {
            let keep_tag = sibling
                .as_element()
                .map_or(false, |e| ALTER_TO_DIV_EXCEPTIONS.contains(&&*e.name.local));
            let node_to_append = if keep_tag {
                sibling
            } else {
                dom_utils::set_node_tag(&sibling, "div")
            };
            article_content.append(node_to_append);
        }
    }

    article_content
}

/// First non-blank `dir` attribute walking the candidate's ancestry, then
/// the body and root elements.
fn resolve_text_direction(
    top_candidate: &NodeRef,
    original_parent: Option<&NodeRef>,
    doc: &NodeRef,
) -> Option<String> {
    let mut chain: Vec<NodeRef> = Vec::new();
    if let Some(parent) = original_parent {
        chain.push(parent.clone());
    }
    chain.push(top_candidate.clone());
    if let Some(parent) = original_parent {
        chain.extend(dom_utils::node_ancestors(parent, 0));
    }
    if let Ok(body) = doc.select_first("body") {
        chain.push(body.as_node().clone());
    }
    if let Ok(html) = doc.select_first("html") {
        chain.push(html.as_node().clone());
    }
    for node in chain {
        if let Some(dir) = dom_utils::get_attr(&node, "dir") {
            if !dir.trim().is_empty() {
                return Some(dir);
            }
        }
    }
    None
}

/// Run the full extraction loop against a prepared document.
///
/// Each pass walks the document, scores candidates, assembles content, and
/// cleans it. A pass that yields less text than `char_threshold` restores
/// the page from its snapshot and relaxes one flag; when every flag is
/// spent, the longest recorded attempt wins, or `None` when even that is
/// empty.
pub fn grab_article(
    doc: &NodeRef,
    metadata: &Metadata,
    options: &ReadabilityOptions,
) -> Result<Option<GrabbedArticle>> {
    let page = match doc.select_first("body") {
        Ok(body) => body.as_node().clone(),
        Err(()) => return Ok(None),
    };
    let page_cache_html = dom_utils::inner_html(&page);
    let article_title = metadata.title.clone().unwrap_or_default();

    let mut flags = GrabFlags::all();
    let mut attempts: Vec<ExtractionAttempt> = Vec::new();
    let mut article_byline: Option<String> = metadata.byline.clone();
    let mut article_lang: Option<String> = None;

    loop {
        log(options, &format!("Starting grab with flags {:?}", flags));
        let mut scores = ScoreMap::new();
        let elements_to_score = prepare_nodes(
            doc,
            &article_title,
            &mut article_byline,
            &mut article_lang,
            flags,
            options,
        );
        let candidates = scoring::score_elements(&elements_to_score, flags, &mut scores);
        let TopCandidate { node: top_candidate, synthesized } =
            scoring::select_top_candidate(&page, &candidates, flags, &mut scores, options);
        log(
            options,
            &format!(
                "Top candidate <{}> class={:?}",
                top_candidate
                    .as_element()
                    .map(|e| e.name.local.to_string())
                    .unwrap_or_default(),
                dom_utils::get_attr(&top_candidate, "class").unwrap_or_default()
            ),
        );

        let original_parent = top_candidate.parent();
        let article_dir = resolve_text_direction(&top_candidate, original_parent.as_ref(), doc);

        let article_content = assemble_content(&top_candidate, &scores);
        cleaner::prep_article(&article_content, flags, options);

        if synthesized {
            // The synthesized container doubles as the page wrapper.
            dom_utils::set_attr(&top_candidate, "id", "readability-page-1");
            dom_utils::set_attr(&top_candidate, "class", "page");
        } else {
            let page_div = dom_utils::create_element("div");
            dom_utils::set_attr(&page_div, "id", "readability-page-1");
            dom_utils::set_attr(&page_div, "class", "page");
            let children: Vec<NodeRef> = article_content.children().collect();
            for child in children {
                page_div.append(child);
            }
            article_content.append(page_div);
        }

        let text_length = dom_utils::inner_text(&article_content, true).chars().count();
        if text_length >= options.char_threshold {
            return Ok(Some(GrabbedArticle {
                content: article_content,
                text_length,
                byline: article_byline,
                lang: article_lang,
                dir: article_dir,
            }));
        }

        log(
            options,
            &format!(
                "Pass produced {} chars (needed {}), relaxing flags",
                text_length, options.char_threshold
            ),
        );
        attempts.push(ExtractionAttempt {
            content: article_content,
            length: text_length,
        });

        // Put the page back the way it was before trying again.
        while let Some(child) = page.first_child() {
            child.detach();
        }
        for child in dom_utils::parse_fragment_nodes(&page_cache_html, "body") {
            page.append(child);
        }

        if !remove_next_flag(&mut flags) {
            // No flags left to relax; the longest attempt is as good as it
            // gets.
            attempts.sort_by(|a, b| b.length.cmp(&a.length));
            let best = match attempts.into_iter().next() {
                Some(attempt) if attempt.length > 0 => attempt,
                _ => {
                    log(options, "Giving up: every attempt came back empty");
                    return Ok(None);
                }
            };
            return Ok(Some(GrabbedArticle {
                content: best.content,
                text_length: best.length,
                byline: article_byline,
                lang: article_lang,
                dir: article_dir,
            }));
        }
    }
}
