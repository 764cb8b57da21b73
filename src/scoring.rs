//! Candidate scoring and top-candidate selection.

use std::collections::HashMap;

use kuchikikiki::NodeRef;

use crate::constants::REGEXPS;
use crate::content_extractor::GrabFlags;
use crate::dom_utils::{self, node_key, NodeKey};
use crate::options::ReadabilityOptions;

/// Content scores for the current extraction pass, keyed by node identity.
///
/// Scores live beside the tree, never on it. The map is dropped and rebuilt
/// whenever extraction restarts with relaxed flags, so per-pass state cannot
/// leak into the next pass. A node absent from the map has no score at all,
/// which is different from having a score of zero.
#[derive(Default)]
pub struct ScoreMap {
    scores: HashMap<NodeKey, f64>,
}

impl ScoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: &NodeRef) -> Option<f64> {
        self.scores.get(&node_key(node)).copied()
    }

    pub fn set(&mut self, node: &NodeRef, score: f64) {
        self.scores.insert(node_key(node), score);
    }

    pub fn add(&mut self, node: &NodeRef, delta: f64) {
        *self.scores.entry(node_key(node)).or_insert(0.0) += delta;
    }

    pub fn contains(&self, node: &NodeRef) -> bool {
        self.scores.contains_key(&node_key(node))
    }
}

/// Result of top-candidate selection. `synthesized` is set when no scored
/// candidate existed and the whole page was wrapped in a fresh container.
pub struct TopCandidate {
    pub node: NodeRef,
    pub synthesized: bool,
}

/// Class/id weight for an element: -25 per negative pattern hit, +25 per
/// positive one, for class and id independently. Zero when class weighing
/// is switched off.
pub fn get_class_weight(node: &NodeRef, flags: GrabFlags) -> f64 {
    if !flags.contains(GrabFlags::WEIGHT_CLASSES) {
        return 0.0;
    }
    let mut weight = 0.0;
    if let Some(class) = dom_utils::get_attr(node, "class") {
        if !class.trim().is_empty() {
            if REGEXPS.negative.is_match(&class) {
                weight -= 25.0;
            }
            if REGEXPS.positive.is_match(&class) {
                weight += 25.0;
            }
        }
    }
    if let Some(id) = dom_utils::get_attr(node, "id") {
        if !id.trim().is_empty() {
            if REGEXPS.negative.is_match(&id) {
                weight -= 25.0;
            }
            if REGEXPS.positive.is_match(&id) {
                weight += 25.0;
            }
        }
    }
    weight
}

/// First-touch score for a node: a tag-name baseline plus class/id weight.
pub fn initialize_node(node: &NodeRef, flags: GrabFlags, scores: &mut ScoreMap) {
    let base = match node.as_element() {
        Some(element) => match &*element.name.local {
            "div" => 5.0,
            "pre" | "td" | "blockquote" => 3.0,
            "address" | "ol" | "ul" | "dl" | "dd" | "dt" | "li" | "form" => -3.0,
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "th" => -5.0,
            _ => 0.0,
        },
        None => 0.0,
    };
    scores.set(node, base + get_class_weight(node, flags));
}

/// Score the collected elements and propagate their scores up to five
/// ancestor levels. Every ancestor that receives score for the first time
/// becomes a candidate.
///
/// A paragraph's own contribution is one point, plus one per comma-separated
/// segment, plus one per 100 characters of text up to three. Ancestors get
/// the full contribution at level 0, half at level 1, and a third-per-level
/// beyond that.
pub fn score_elements(
    elements: &[NodeRef],
    flags: GrabFlags,
    scores: &mut ScoreMap,
) -> Vec<NodeRef> {
    let mut candidates = Vec::new();
    for element in elements {
        let parent_is_element = element
            .parent()
            .map_or(false, |parent| parent.as_element().is_some());
        if !parent_is_element {
            continue;
        }
        let inner_text = dom_utils::inner_text(element, true);
        if inner_text.chars().count() < 25 {
            continue;
        }
        let ancestors = dom_utils::node_ancestors(element, 5);
        if ancestors.is_empty() {
            continue;
        }

        let mut content_score = 1.0;
        content_score += REGEXPS.commas.split(&inner_text).count() as f64;
        content_score += ((inner_text.chars().count() / 100) as f64).min(3.0);

        for (level, ancestor) in ancestors.iter().enumerate() {
            if ancestor.as_element().is_none() {
                continue;
            }
            let has_element_parent = ancestor
                .parent()
                .map_or(false, |parent| parent.as_element().is_some());
            if !has_element_parent {
                continue;
            }
            if !scores.contains(ancestor) {
                initialize_node(ancestor, flags, scores);
                candidates.push(ancestor.clone());
            }
            let divider = match level {
                0 => 1.0,
                1 => 2.0,
                level => (level * 3) as f64,
            };
            scores.add(ancestor, content_score / divider);
        }
    }
    candidates
}

/// Scale candidate scores by link density, keep the best few, and refine the
/// winner: promote a shared ancestor when the runners-up agree on one, climb
/// to better-scoring parents, then climb out of single-child wrappers.
///
/// When no candidate exists (or the best one is the body itself), the whole
/// page is absorbed into a new container, which is returned with the
/// `synthesized` marker set.
pub fn select_top_candidate(
    page: &NodeRef,
    candidates: &[NodeRef],
    flags: GrabFlags,
    scores: &mut ScoreMap,
    options: &ReadabilityOptions,
) -> TopCandidate {
    let mut top_candidates: Vec<NodeRef> = Vec::new();
    for candidate in candidates {
        let density = dom_utils::link_density(candidate);
        let scaled = scores.get(candidate).unwrap_or(0.0) * (1.0 - density);
        scores.set(candidate, scaled);

        for slot in 0..options.nb_top_candidates {
            let incumbent = top_candidates.get(slot).and_then(|node| scores.get(node));
            let wins = match incumbent {
                None => true,
                Some(score) => scaled > score,
            };
            if wins {
                top_candidates.insert(slot, candidate.clone());
                if top_candidates.len() > options.nb_top_candidates {
                    top_candidates.pop();
                }
                break;
            }
        }
    }

    let mut top_candidate = match top_candidates.first() {
        Some(node) if !dom_utils::is_tag(node, "body") => node.clone(),
        _ => {
            // Nothing usable was scored. Move everything on the page into a
            // fresh container and work with that.
            let container = dom_utils::create_element("div");
            let children: Vec<NodeRef> = page.children().collect();
            for child in children {
                container.append(child);
            }
            page.append(container.clone());
            initialize_node(&container, flags, scores);
            return TopCandidate {
                node: container,
                synthesized: true,
            };
        }
    };

    // If several strong alternates share an ancestor with the winner, that
    // ancestor is probably the real article container.
    const MINIMUM_TOP_CANDIDATES: usize = 3;
    let top_score = scores.get(&top_candidate).unwrap_or(0.0);
    let mut alternative_ancestors: Vec<Vec<NodeKey>> = Vec::new();
    for alternate in top_candidates.iter().skip(1) {
        let alternate_score = scores.get(alternate).unwrap_or(0.0);
        if alternate_score / top_score >= 0.75 {
            let chain = dom_utils::node_ancestors(alternate, 0)
                .iter()
                .map(node_key)
                .collect();
            alternative_ancestors.push(chain);
        }
    }
    if alternative_ancestors.len() >= MINIMUM_TOP_CANDIDATES {
        let mut parent = top_candidate.parent();
        while let Some(ancestor) = parent {
            if dom_utils::is_tag(&ancestor, "body") || ancestor.as_element().is_none() {
                break;
            }
            let key = node_key(&ancestor);
            let lists_containing = alternative_ancestors
                .iter()
                .filter(|chain| chain.contains(&key))
                .take(MINIMUM_TOP_CANDIDATES)
                .count();
            if lists_containing >= MINIMUM_TOP_CANDIDATES {
                top_candidate = ancestor;
                break;
            }
            parent = ancestor.parent();
        }
    }
    if !scores.contains(&top_candidate) {
        initialize_node(&top_candidate, flags, scores);
    }

    // A parent may hold the candidate plus more of the article. Climb while
    // parents score at least a third of the starting score, and jump to any
    // parent that scores higher outright.
    let mut last_score = scores.get(&top_candidate).unwrap_or(0.0);
    let score_threshold = last_score / 3.0;
    let mut parent = top_candidate.parent();
    while let Some(candidate_parent) = parent {
        if dom_utils::is_tag(&candidate_parent, "body") || candidate_parent.as_element().is_none() {
            break;
        }
        let parent_score = match scores.get(&candidate_parent) {
            Some(score) => score,
            None => {
                parent = candidate_parent.parent();
                continue;
            }
        };
        if parent_score < score_threshold {
            break;
        }
        if parent_score > last_score {
            top_candidate = candidate_parent;
            break;
        }
        last_score = parent_score;
        parent = candidate_parent.parent();
    }

    // Lone-child wrappers around the candidate belong to the article too.
    let mut parent = top_candidate.parent();
    while let Some(candidate_parent) = parent {
        if dom_utils::is_tag(&candidate_parent, "body") || candidate_parent.as_element().is_none() {
            break;
        }
        let element_children = candidate_parent
            .children()
            .filter(|c| c.as_element().is_some())
            .count();
        if element_children != 1 {
            break;
        }
        top_candidate = candidate_parent.clone();
        parent = candidate_parent.parent();
    }
    if !scores.contains(&top_candidate) {
        initialize_node(&top_candidate, flags, scores);
    }

    TopCandidate {
        node: top_candidate,
        synthesized: false,
    }
}
