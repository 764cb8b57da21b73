//! Helpers over the kuchikikiki DOM tree: traversal, attribute access,
//! element surgery, and the text heuristics shared by scoring and cleanup.

use html5ever::{namespace_url, ns, LocalName, QualName};
use kuchikikiki::traits::TendrilSink;
use kuchikikiki::{Attribute, ExpandedName, NodeRef};

use crate::constants::{DIV_TO_P_ELEMS, PHRASING_ELEMS, REGEXPS};

/// Identity key for a node, stable for as long as the node is alive.
///
/// Scores and data-table marks are kept in side tables keyed by this value
/// rather than on the tree itself.
pub type NodeKey = usize;

pub fn node_key(node: &NodeRef) -> NodeKey {
    std::rc::Rc::as_ptr(&node.0) as NodeKey
}

/// Whether the node is an element with the given (lowercase) tag name.
pub fn is_tag(node: &NodeRef, tag: &str) -> bool {
    node.as_element().map_or(false, |e| &*e.name.local == tag)
}

pub fn get_attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|e| e.attributes.borrow().get(name).map(|v| v.to_string()))
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(e) = node.as_element() {
        e.attributes.borrow_mut().insert(name, value.to_string());
    }
}

pub fn remove_attr(node: &NodeRef, name: &str) {
    if let Some(e) = node.as_element() {
        e.attributes.borrow_mut().remove(name);
    }
}

/// Snapshot of the element's attributes as (local name, value) pairs.
pub fn attr_pairs(node: &NodeRef) -> Vec<(String, String)> {
    match node.as_element() {
        Some(e) => e
            .attributes
            .borrow()
            .map
            .iter()
            .map(|(name, attr)| (name.local.to_string(), attr.value.clone()))
            .collect(),
        None => Vec::new(),
    }
}

/// The "class id" string most of the pattern checks run against.
pub fn class_and_id(node: &NodeRef) -> String {
    format!(
        "{} {}",
        get_attr(node, "class").unwrap_or_default(),
        get_attr(node, "id").unwrap_or_default()
    )
}

/// Create a detached HTML element with no attributes.
pub fn create_element(tag: &str) -> NodeRef {
    NodeRef::new_element(
        QualName::new(None, ns!(html), LocalName::from(tag)),
        Vec::<(ExpandedName, Attribute)>::new(),
    )
}

/// Replace the element with one of a different tag name, keeping attributes
/// and children in place. Returns the replacement.
pub fn set_node_tag(node: &NodeRef, tag: &str) -> NodeRef {
    let attributes = match node.as_element() {
        Some(e) => e.attributes.borrow().map.clone(),
        None => return node.clone(),
    };
    let replacement = NodeRef::new_element(
        QualName::new(None, ns!(html), LocalName::from(tag)),
        attributes,
    );
    while let Some(child) = node.first_child() {
        replacement.append(child);
    }
    node.insert_before(replacement.clone());
    node.detach();
    replacement
}

pub fn first_element_child(node: &NodeRef) -> Option<NodeRef> {
    node.children().find(|c| c.as_element().is_some())
}

pub fn next_element_sibling(node: &NodeRef) -> Option<NodeRef> {
    node.following_siblings().find(|s| s.as_element().is_some())
}

pub fn previous_element_sibling(node: &NodeRef) -> Option<NodeRef> {
    node.preceding_siblings().find(|s| s.as_element().is_some())
}

/// Next element in document order: children first unless `ignore_self_and_kids`,
/// then following siblings, then siblings of ancestors.
pub fn next_element_node(node: &NodeRef, ignore_self_and_kids: bool) -> Option<NodeRef> {
    if !ignore_self_and_kids {
        if let Some(first) = first_element_child(node) {
            return Some(first);
        }
    }
    if let Some(sibling) = next_element_sibling(node) {
        return Some(sibling);
    }
    let mut current = node.parent();
    while let Some(parent) = current {
        if let Some(sibling) = next_element_sibling(&parent) {
            return Some(sibling);
        }
        current = parent.parent();
    }
    None
}

/// Detach the node and return the element that follows it, skipping the
/// removed subtree.
pub fn remove_and_get_next_element(node: NodeRef) -> Option<NodeRef> {
    let next = next_element_node(&node, true);
    node.detach();
    next
}

/// Step forward over whitespace-only text and comment nodes, returning the
/// first meaningful sibling at or after `node`.
pub fn next_skipping_whitespace(node: Option<NodeRef>) -> Option<NodeRef> {
    let mut next = node;
    while let Some(n) = &next {
        if n.as_element().is_some() {
            break;
        }
        let blank = if let Some(text) = n.as_text() {
            text.borrow().trim().is_empty()
        } else if let Some(comment) = n.as_comment() {
            comment.borrow().trim().is_empty()
        } else {
            false
        };
        if !blank {
            break;
        }
        let after = n.next_sibling();
        next = after;
    }
    next
}

/// Concatenated descendant text, trimmed. Runs of two or more whitespace
/// characters collapse to a single space when `normalize_spaces` is set.
pub fn inner_text(node: &NodeRef, normalize_spaces: bool) -> String {
    let text = node.text_contents();
    let trimmed = text.trim();
    if normalize_spaces {
        REGEXPS.normalize.replace_all(trimmed, " ").into_owned()
    } else {
        trimmed.to_string()
    }
}

/// Serialized HTML of the node's children.
pub fn inner_html(node: &NodeRef) -> String {
    node.children().map(|c| c.to_string()).collect()
}

/// Fraction of the node's text that lives inside anchors. In-page hash
/// links only count at 0.3 of their text length.
pub fn link_density(node: &NodeRef) -> f64 {
    let text_length = inner_text(node, true).chars().count();
    if text_length == 0 {
        return 0.0;
    }
    let mut link_length = 0.0;
    if let Ok(anchors) = node.select("a") {
        for anchor in anchors {
            let href = anchor
                .attributes
                .borrow()
                .get("href")
                .map(|v| v.to_string())
                .unwrap_or_default();
            let coefficient = if !href.is_empty() && REGEXPS.hash_url.is_match(&href) {
                0.3
            } else {
                1.0
            };
            link_length += inner_text(anchor.as_node(), true).chars().count() as f64 * coefficient;
        }
    }
    link_length / text_length as f64
}

/// Similarity of two texts as 1 minus the share of `b`'s tokens that do not
/// appear in `a`, measured by joined token length. Returns 0 for empty input.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a_lower = a.to_lowercase();
    let b_lower = b.to_lowercase();
    let tokens_a: Vec<&str> = REGEXPS
        .tokenize
        .split(&a_lower)
        .filter(|t| !t.is_empty())
        .collect();
    let tokens_b: Vec<&str> = REGEXPS
        .tokenize
        .split(&b_lower)
        .filter(|t| !t.is_empty())
        .collect();
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return 0.0;
    }
    let unique_b: Vec<&str> = tokens_b
        .iter()
        .filter(|token| !tokens_a.contains(token))
        .copied()
        .collect();
    let merged_b = tokens_b.join(" ").chars().count() as f64;
    let unique_b_len = unique_b.join(" ").chars().count() as f64;
    1.0 - unique_b_len / merged_b
}

/// Whitespace for layout purposes: a blank text node or a `<br>`.
pub fn is_whitespace(node: &NodeRef) -> bool {
    if let Some(text) = node.as_text() {
        return text.borrow().trim().is_empty();
    }
    is_tag(node, "br")
}

/// Whether the node is phrasing content: text, a phrasing element, or an
/// `a`/`del`/`ins` whose children are all phrasing content.
pub fn is_phrasing_content(node: &NodeRef) -> bool {
    let mut queue = vec![node.clone()];
    while let Some(n) = queue.pop() {
        if n.as_text().is_some() {
            continue;
        }
        let tag = match n.as_element() {
            Some(e) => e.name.local.to_string(),
            None => return false,
        };
        if PHRASING_ELEMS.contains(&tag.as_str()) {
            continue;
        }
        if matches!(tag.as_str(), "a" | "del" | "ins") {
            queue.extend(n.children());
            continue;
        }
        return false;
    }
    true
}

/// An element with no visible content: blank text and either no element
/// children or only `<br>`/`<hr>` ones.
pub fn is_element_without_content(node: &NodeRef) -> bool {
    if node.as_element().is_none() {
        return false;
    }
    if !node.text_contents().trim().is_empty() {
        return false;
    }
    let element_children = node.children().filter(|c| c.as_element().is_some()).count();
    if element_children == 0 {
        return true;
    }
    let br_hr_count = node
        .descendants()
        .filter(|d| is_tag(d, "br") || is_tag(d, "hr"))
        .count();
    element_children == br_hr_count
}

/// Whether the element has exactly one element child with the given tag and
/// no non-whitespace text of its own.
pub fn has_single_tag_inside_element(element: &NodeRef, tag: &str) -> bool {
    let element_children: Vec<NodeRef> = element
        .children()
        .filter(|c| c.as_element().is_some())
        .collect();
    if element_children.len() != 1 || !is_tag(&element_children[0], tag) {
        return false;
    }
    !element.children().any(|child| {
        child
            .as_text()
            .map_or(false, |t| REGEXPS.has_content.is_match(&t.borrow()))
    })
}

/// Whether any descendant is a block-level element.
pub fn has_child_block_element(element: &NodeRef) -> bool {
    element.descendants().any(|descendant| {
        descendant.as_element().map_or(false, |e| {
            let tag: &str = &e.name.local;
            DIV_TO_P_ELEMS.contains(&tag)
        })
    })
}

/// Whether an ancestor within `max_depth` levels has the given tag.
/// `max_depth` of 0 means unlimited.
pub fn has_ancestor_tag(node: &NodeRef, tag: &str, max_depth: usize) -> bool {
    has_ancestor_tag_filtered(node, tag, max_depth, &|_| true)
}

/// Like [`has_ancestor_tag`], with an extra predicate the matching ancestor
/// must satisfy.
pub fn has_ancestor_tag_filtered<F>(node: &NodeRef, tag: &str, max_depth: usize, filter: &F) -> bool
where
    F: Fn(&NodeRef) -> bool,
{
    let mut depth = 0;
    for ancestor in node.ancestors() {
        if max_depth > 0 && depth > max_depth {
            return false;
        }
        if is_tag(&ancestor, tag) && filter(&ancestor) {
            return true;
        }
        depth += 1;
    }
    false
}

/// The node's ancestors, closest first, capped at `max_depth` when nonzero.
pub fn node_ancestors(node: &NodeRef, max_depth: usize) -> Vec<NodeRef> {
    let mut ancestors = Vec::new();
    for ancestor in node.ancestors() {
        ancestors.push(ancestor);
        if max_depth > 0 && ancestors.len() == max_depth {
            break;
        }
    }
    ancestors
}

/// Rough visibility check from attributes alone: inline display/visibility
/// styles, the `hidden` attribute, and `aria-hidden` (with the
/// fallback-image escape hatch).
pub fn is_probably_visible(node: &NodeRef) -> bool {
    if let Some(style) = get_attr(node, "style") {
        if REGEXPS.hidden_style.is_match(&style) {
            return false;
        }
    }
    if get_attr(node, "hidden").is_some() {
        return false;
    }
    match get_attr(node, "aria-hidden") {
        Some(value) if value == "true" => get_attr(node, "class")
            .map_or(false, |class| class.contains("fallback-image")),
        _ => true,
    }
}

/// All descendant elements whose tag name is in `tags`, in document order.
///
/// Collected up front so callers can mutate the tree while iterating.
pub fn elements_by_tags(node: &NodeRef, tags: &[&str]) -> Vec<NodeRef> {
    node.descendants()
        .filter(|descendant| {
            descendant.as_element().map_or(false, |e| {
                let tag: &str = &e.name.local;
                tags.contains(&tag)
            })
        })
        .collect()
}

/// Parse an HTML fragment as if it appeared inside a `context_tag` element,
/// returning the parsed top-level nodes.
pub fn parse_fragment_nodes(html: &str, context_tag: &str) -> Vec<NodeRef> {
    let context = QualName::new(None, ns!(html), LocalName::from(context_tag));
    let parsed = kuchikikiki::parse_fragment(context, Vec::new()).one(html);
    match parsed.first_child() {
        Some(root) => root.children().collect(),
        None => Vec::new(),
    }
}
