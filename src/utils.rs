//! Small helpers shared across modules.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use url::Url;

static NAMED_ENTITIES: Lazy<Regex> = Lazy::new(|| Regex::new(r"&(quot|amp|apos|lt|gt);").unwrap());

static NUMERIC_ENTITIES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)&#(?:x([0-9a-f]{1,6})|([0-9]{1,7}));").unwrap());

/// Whether the string parses as an absolute URL.
pub fn is_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

/// Decode the basic named entities plus numeric character references.
///
/// NUL, surrogate, and out-of-range code points decode to U+FFFD.
pub fn unescape_html_entities(value: &str) -> String {
    let named = NAMED_ENTITIES.replace_all(value, |caps: &Captures| match &caps[1] {
        "quot" => "\"",
        "amp" => "&",
        "apos" => "'",
        "lt" => "<",
        "gt" => ">",
        _ => "",
    });
    NUMERIC_ENTITIES
        .replace_all(&named, |caps: &Captures| {
            let parsed = match caps.get(1) {
                Some(hex) => u32::from_str_radix(hex.as_str(), 16),
                None => caps[2].parse::<u32>(),
            };
            let code = match parsed {
                Ok(code) if code != 0 && code <= 0x0010_FFFF && !(0xD800..=0xDFFF).contains(&code) => code,
                _ => 0xFFFD,
            };
            char::from_u32(code).unwrap_or('\u{FFFD}').to_string()
        })
        .into_owned()
}

/// Truncate to at most `max_len` characters, backing up to the nearest word
/// boundary so no word is cut in half.
pub fn truncate_at_word_boundary(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        return text.trim().to_string();
    }
    let truncated: String = text.chars().take(max_len).collect();
    match truncated.rfind(char::is_whitespace) {
        Some(pos) => truncated[..pos].trim_end().to_string(),
        None => truncated.trim_end().to_string(),
    }
}
