//! Shared patterns, tag sets, and tuning constants.
//!
//! Everything the extraction pipeline matches against lives here: the
//! class/id classification regexes, the tag lists that drive scoring and
//! cleanup, and the default numeric thresholds. Patterns are compiled once
//! on first use and shared for the lifetime of the process.

use once_cell::sync::Lazy;
use regex::Regex;

/// All compiled regular expressions used by the extraction pipeline.
///
/// Access through the [`REGEXPS`] static. The patterns mirror the ones
/// Firefox Reader View uses for its class/id and text judgments.
pub struct RegExps {
    /// Class/id substrings that mark an element as probable chrome.
    pub unlikely_candidates: Regex,
    /// Class/id substrings that veto an unlikely-candidate match.
    pub ok_maybe_its_a_candidate: Regex,
    /// Class/id substrings that raise an element's weight.
    pub positive: Regex,
    /// Class/id substrings that lower an element's weight.
    pub negative: Regex,
    /// Class/id/rel substrings that suggest an author byline.
    pub byline: Regex,
    /// Embed hosts that are kept during conditional cleaning.
    pub videos: Regex,
    /// Class/id substrings marking social share widgets.
    pub share_elements: Regex,
    /// Word splitter for text-similarity tokenization.
    pub tokenize: Regex,
    /// Matches entirely-whitespace strings.
    pub whitespace: Regex,
    /// Matches strings that end in a non-whitespace character.
    pub has_content: Regex,
    /// In-page fragment links (`#...`).
    pub hash_url: Regex,
    /// One `url [descriptor]` entry inside a `srcset` value.
    pub srcset_url: Regex,
    /// Base64 data URI prefix, capturing the MIME type.
    pub b64_data_url: Regex,
    /// Comma characters across scripts, for comma-segment counting.
    pub commas: Regex,
    /// schema.org types treated as articles in JSON-LD.
    pub json_ld_article_types: Regex,
    /// Whole-text ad markers in several languages.
    pub ad_words: Regex,
    /// Whole-text "loading" placeholders in several languages.
    pub loading_words: Regex,
    /// Runs of 2+ whitespace characters, collapsed during normalization.
    pub normalize: Regex,
    /// Inline style values that hide an element.
    pub hidden_style: Regex,
    /// File extensions that look like raster images.
    pub img_extensions: Regex,
    /// Lazy-loading attribute values shaped like a srcset entry.
    pub lazy_srcset_value: Regex,
    /// Lazy-loading attribute values shaped like a bare image URL.
    pub lazy_src_value: Regex,
    /// A sentence-ending period (followed by a space or end of text).
    pub end_of_sentence: Regex,
}

pub static REGEXPS: Lazy<RegExps> = Lazy::new(|| RegExps {
    unlikely_candidates: Regex::new(
        r"(?i)-ad-|ai2html|banner|breadcrumbs|combx|comment|community|cover-wrap|disqus|extra|footer|gdpr|header|legends|menu|related|remark|replies|rss|shoutbox|sidebar|skyscraper|social|sponsor|supplemental|ad-break|agegate|pagination|pager|popup|yom-remote",
    )
    .unwrap(),
    ok_maybe_its_a_candidate: Regex::new(r"(?i)and|article|body|column|content|main|mathjax|shadow")
        .unwrap(),
    positive: Regex::new(
        r"(?i)article|body|content|entry|hentry|h-entry|main|page|pagination|post|text|blog|story",
    )
    .unwrap(),
    negative: Regex::new(
        r"(?i)-ad-|hidden|^hid$| hid$| hid |^hid |banner|combx|comment|com-|contact|footer|gdpr|masthead|media|meta|outbrain|promo|related|scroll|share|shoutbox|sidebar|skyscraper|sponsor|shopping|tags|widget",
    )
    .unwrap(),
    byline: Regex::new(r"(?i)byline|author|dateline|writtenby|p-author").unwrap(),
    videos: Regex::new(
        r"(?i)//(www\.)?((dailymotion|youtube|youtube-nocookie|player\.vimeo|v\.qq|bilibili|live\.bilibili)\.com|(archive|upload\.wikimedia)\.org|player\.twitch\.tv)",
    )
    .unwrap(),
    share_elements: Regex::new(r"(?i)(\b|_)(share|sharedaddy)(\b|_)").unwrap(),
    tokenize: Regex::new(r"\W+").unwrap(),
    whitespace: Regex::new(r"^\s*$").unwrap(),
    has_content: Regex::new(r"\S$").unwrap(),
    hash_url: Regex::new(r"^#.+").unwrap(),
    srcset_url: Regex::new(r"(\S+)(\s+[\d.]+[xw])?(\s*(?:,|$))").unwrap(),
    b64_data_url: Regex::new(r"(?i)^data:\s*([^\s;,]+)\s*;\s*base64\s*,").unwrap(),
    commas: Regex::new(
        "[,\u{060C}\u{FE50}\u{FE10}\u{FE11}\u{2E41}\u{2E34}\u{2E32}\u{FF0C}]",
    )
    .unwrap(),
    json_ld_article_types: Regex::new(
        r"^Article|AdvertiserContentArticle|NewsArticle|AnalysisNewsArticle|AskPublicNewsArticle|BackgroundNewsArticle|OpinionNewsArticle|ReportageNewsArticle|ReviewNewsArticle|Report|SatiricalArticle|ScholarlyArticle|MedicalScholarlyArticle|SocialMediaPosting|BlogPosting|LiveBlogPosting|DiscussionForumPosting|TechArticle|APIReference$",
    )
    .unwrap(),
    ad_words: Regex::new(r"(?i)^(ad(vertising|vertisement)?|pub(licité)?|werb(ung)?|广告|Реклама|Anuncio)$")
        .unwrap(),
    loading_words: Regex::new(r"(?i)^((loading|正在加载|Загрузка|chargement|cargando)(…|\.\.\.)?)$")
        .unwrap(),
    normalize: Regex::new(r"\s{2,}").unwrap(),
    hidden_style: Regex::new(r"(?i)display\s*:\s*none|visibility\s*:\s*hidden").unwrap(),
    img_extensions: Regex::new(r"(?i)\.(jpg|jpeg|png|webp)").unwrap(),
    lazy_srcset_value: Regex::new(r"(?i)\.(jpg|jpeg|png|webp)\s+\d").unwrap(),
    lazy_src_value: Regex::new(r"(?i)^\s*\S+\.(jpg|jpeg|png|webp)\S*\s*$").unwrap(),
    end_of_sentence: Regex::new(r"\.( |$)").unwrap(),
});

/// Tags whose text feeds the scorer directly.
pub const DEFAULT_TAGS_TO_SCORE: [&str; 9] =
    ["section", "h2", "h3", "h4", "h5", "h6", "p", "td", "pre"];

/// Block-level tags that stop a `div` from being folded into a paragraph.
pub const DIV_TO_P_ELEMS: [&str; 9] = [
    "blockquote", "dl", "div", "img", "ol", "p", "pre", "table", "ul",
];

/// Tags that survive sibling assembly without being retagged to `div`.
pub const ALTER_TO_DIV_EXCEPTIONS: [&str; 6] = ["div", "article", "section", "p", "ol", "ul"];

/// Attributes stripped by the recursive style scrub.
pub const PRESENTATIONAL_ATTRIBUTES: [&str; 12] = [
    "align",
    "background",
    "bgcolor",
    "border",
    "cellpadding",
    "cellspacing",
    "frame",
    "hspace",
    "rules",
    "style",
    "valign",
    "vspace",
];

/// Tags that additionally lose their `width`/`height` attributes.
pub const DEPRECATED_SIZE_ATTRIBUTE_ELEMS: [&str; 5] = ["table", "th", "td", "hr", "pre"];

/// Inline-level tags counted as phrasing content.
pub const PHRASING_ELEMS: [&str; 39] = [
    "abbr", "audio", "b", "bdo", "br", "button", "cite", "code", "data", "datalist", "dfn", "em",
    "embed", "i", "img", "input", "kbd", "label", "mark", "math", "meter", "noscript", "object",
    "output", "progress", "q", "ruby", "samp", "script", "select", "small", "span", "strong",
    "sub", "sup", "textarea", "time", "var", "wbr",
];

/// ARIA roles removed when stripping unlikely candidates.
pub const UNLIKELY_ROLES: [&str; 7] = [
    "menu",
    "menubar",
    "complementary",
    "navigation",
    "alert",
    "alertdialog",
    "dialog",
];

/// Embed containers inspected for allowed-video exemptions.
pub const EMBED_ELEMS: [&str; 3] = ["object", "embed", "iframe"];

/// Minimum article length accepted without a retry, in characters.
pub const DEFAULT_CHAR_THRESHOLD: usize = 500;

/// How many top-scored candidates are kept for alternate comparison.
pub const DEFAULT_N_TOP_CANDIDATES: usize = 5;

/// Classes preserved when class stripping is enabled.
pub const CLASSES_TO_PRESERVE: [&str; 1] = ["page"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_stable_across_calls() {
        let samples = ["sidebar social", "article-body", "main content", ""];
        for s in samples {
            let first = (
                REGEXPS.positive.is_match(s),
                REGEXPS.negative.is_match(s),
                REGEXPS.unlikely_candidates.is_match(s),
            );
            for _ in 0..3 {
                let again = (
                    REGEXPS.positive.is_match(s),
                    REGEXPS.negative.is_match(s),
                    REGEXPS.unlikely_candidates.is_match(s),
                );
                assert_eq!(first, again);
            }
        }
    }

    #[test]
    fn unlikely_requires_ok_maybe_veto() {
        assert!(REGEXPS.unlikely_candidates.is_match("nav-menu"));
        assert!(!REGEXPS.ok_maybe_its_a_candidate.is_match("nav-menu"));
        // "article-sidebar" is unlikely but also ok-maybe, so it survives
        let s = "article-sidebar";
        assert!(REGEXPS.unlikely_candidates.is_match(s));
        assert!(REGEXPS.ok_maybe_its_a_candidate.is_match(s));
    }

    #[test]
    fn video_hosts_match() {
        for url in [
            "https://www.youtube.com/embed/abc",
            "//player.vimeo.com/video/123",
            "https://player.twitch.tv/?channel=x",
        ] {
            assert!(REGEXPS.videos.is_match(url), "{url}");
        }
        assert!(!REGEXPS.videos.is_match("https://example.com/video"));
    }

    #[test]
    fn commas_cover_fullwidth_variants() {
        assert_eq!(REGEXPS.commas.split("a,b\u{FF0C}c").count(), 3);
    }

    #[test]
    fn b64_data_url_captures_mime() {
        let caps = REGEXPS
            .b64_data_url
            .captures("data:image/png;base64,iVBOR")
            .unwrap();
        assert_eq!(&caps[1], "image/png");
    }

    #[test]
    fn srcset_entries_parse_with_descriptors() {
        let value = "a.jpg 1x, b.jpg 2x";
        let urls: Vec<_> = REGEXPS
            .srcset_url
            .captures_iter(value)
            .map(|c| c[1].to_string())
            .collect();
        assert_eq!(urls, ["a.jpg", "b.jpg"]);
    }
}
