//! Wikitext markup stripping.
//!
//! `extract_plain_text` is a pure function: no state, no failure modes, and
//! degenerate input simply comes back as an empty string. It is not a full
//! MediaWiki parser; it removes the structural markup that would pollute
//! sentence segmentation and leaves flowing prose behind.

use std::sync::OnceLock;

use regex::Regex;

static RE_COMMENT: OnceLock<Regex> = OnceLock::new();
static RE_REF_PAIR: OnceLock<Regex> = OnceLock::new();
static RE_REF_EMPTY: OnceLock<Regex> = OnceLock::new();
static RE_TABLE: OnceLock<Regex> = OnceLock::new();
static RE_MEDIA_LINK: OnceLock<Regex> = OnceLock::new();
static RE_PIPED_LINK: OnceLock<Regex> = OnceLock::new();
static RE_PLAIN_LINK: OnceLock<Regex> = OnceLock::new();
static RE_EXT_LINK: OnceLock<Regex> = OnceLock::new();
static RE_EXT_BARE: OnceLock<Regex> = OnceLock::new();
static RE_HEADING: OnceLock<Regex> = OnceLock::new();
static RE_QUOTES: OnceLock<Regex> = OnceLock::new();
static RE_HTML_TAG: OnceLock<Regex> = OnceLock::new();
static RE_MAGIC: OnceLock<Regex> = OnceLock::new();
static RE_LIST_MARKER: OnceLock<Regex> = OnceLock::new();
static RE_BLANK_RUNS: OnceLock<Regex> = OnceLock::new();

/// Converts raw wikitext into flat plain text.
pub fn extract_plain_text(wikitext: &str) -> String {
    if wikitext.trim().is_empty() {
        return String::new();
    }

    let re_comment = RE_COMMENT.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
    let re_ref_pair =
        RE_REF_PAIR.get_or_init(|| Regex::new(r"(?s)<ref[^>/]*?>.*?</ref>").unwrap());
    let re_ref_empty = RE_REF_EMPTY.get_or_init(|| Regex::new(r"<ref[^>]*?/>").unwrap());
    let re_table = RE_TABLE.get_or_init(|| Regex::new(r"(?s)\{\|.*?\|\}").unwrap());
    let re_media_link = RE_MEDIA_LINK
        .get_or_init(|| Regex::new(r"\[\[(?:[Cc]ategory|[Ff]ile|[Ii]mage):[^\[\]]*\]\]").unwrap());
    let re_piped_link =
        RE_PIPED_LINK.get_or_init(|| Regex::new(r"\[\[[^\[\]|]*\|([^\[\]]*)\]\]").unwrap());
    let re_plain_link = RE_PLAIN_LINK.get_or_init(|| Regex::new(r"\[\[([^\[\]]*)\]\]").unwrap());
    let re_ext_link =
        RE_EXT_LINK.get_or_init(|| Regex::new(r"\[\S+://\S+ ([^\]]*)\]").unwrap());
    let re_ext_bare = RE_EXT_BARE.get_or_init(|| Regex::new(r"\[\S+://[^\]]*\]").unwrap());
    let re_heading =
        RE_HEADING.get_or_init(|| Regex::new(r"(?m)^\s*=+\s*(.*?)\s*=+\s*$").unwrap());
    let re_quotes = RE_QUOTES.get_or_init(|| Regex::new(r"'{2,}").unwrap());
    let re_html_tag = RE_HTML_TAG.get_or_init(|| Regex::new(r"(?s)<[^<>]+>").unwrap());
    let re_magic = RE_MAGIC.get_or_init(|| Regex::new(r"__[A-Z]+__").unwrap());
    let re_list_marker =
        RE_LIST_MARKER.get_or_init(|| Regex::new(r"(?m)^[*#:;]+\s*").unwrap());
    let re_blank_runs = RE_BLANK_RUNS.get_or_init(|| Regex::new(r"\n{3,}").unwrap());

    let text = re_comment.replace_all(wikitext, "");
    let text = re_ref_pair.replace_all(&text, "");
    let text = re_ref_empty.replace_all(&text, "");
    let text = strip_templates(&text);
    let text = re_table.replace_all(&text, "");
    let text = re_media_link.replace_all(&text, "");
    let text = re_piped_link.replace_all(&text, "$1");
    let text = re_plain_link.replace_all(&text, "$1");
    let text = re_ext_link.replace_all(&text, "$1");
    let text = re_ext_bare.replace_all(&text, "");
    let text = re_heading.replace_all(&text, "$1");
    let text = re_quotes.replace_all(&text, "");
    let text = re_html_tag.replace_all(&text, "");
    let text = re_magic.replace_all(&text, "");
    let text = re_list_marker.replace_all(&text, "");
    let text = re_blank_runs.replace_all(&text, "\n\n");

    text.trim().to_string()
}

/// Removes `{{ ... }}` templates, which nest and therefore defeat regexes.
fn strip_templates(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    let bytes = text.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' && i + 1 < bytes.len() && bytes[i + 1] == b'{' {
            depth += 1;
            i += 2;
        } else if bytes[i] == b'}' && i + 1 < bytes.len() && bytes[i + 1] == b'}' && depth > 0 {
            depth -= 1;
            i += 2;
        } else {
            if depth == 0 {
                // Safe: i always lands on a char boundary because the
                // branches above only skip ASCII brace pairs.
                let ch_len = utf8_len(bytes[i]);
                out.push_str(&text[i..i + ch_len]);
                i += ch_len;
            } else {
                i += utf8_len(bytes[i]);
            }
        }
    }

    out
}

fn utf8_len(first_byte: u8) -> usize {
    match first_byte {
        b if b < 0x80 => 1,
        b if b < 0xE0 => 2,
        b if b < 0xF0 => 3,
        _ => 4,
    }
}
