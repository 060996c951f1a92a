//! Extraction of articles from raw RSS 2.0 / Atom markup.
//!
//! The parser works on the XML tree directly rather than on a normalized feed
//! model: item nodes are `item` elements, or `entry` elements when a document
//! has no `item` at all, and every field is looked up by tag name with a
//! fixed fallback order. Missing fields degrade to defaults instead of
//! failing the whole document.

use std::sync::LazyLock;

use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dates::DateFormatter;

pub const MAX_DESCRIPTION_CHARS: usize = 300;
pub const DEFAULT_TITLE: &str = "No title";

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// One normalized entry of a feed. Derived on every fetch, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub link: String,
    /// Plain text, at most [`MAX_DESCRIPTION_CHARS`] characters
    pub description: String,
    #[serde(rename = "pubDate")]
    pub published_label: String,
}

/// Parse `xml` into articles in document order.
///
/// Returns an empty list when the text is not well-formed XML or holds no
/// `item`/`entry` elements.
pub fn parse_articles(xml: &str, dates: &DateFormatter) -> Vec<Article> {
    // legacy RSS 0.91 documents carry a DOCTYPE
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;

    let doc = match Document::parse_with_options(xml, options) {
        Ok(doc) => doc,
        Err(e) => {
            debug!("Feed document is not well-formed XML: {}", e);
            return Vec::new();
        }
    };

    let mut nodes = elements_named(doc.root(), "item");
    if nodes.is_empty() {
        nodes = elements_named(doc.root(), "entry");
    }

    nodes
        .into_iter()
        .map(|node| extract_article(node, dates))
        .collect()
}

fn extract_article(item: Node<'_, '_>, dates: &DateFormatter) -> Article {
    let title = first_named(item, &["title"])
        .map(text_content)
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    // Atom carries the URL in href, RSS in the element text
    let link = first_named(item, &["link"])
        .map(|link| match link.attribute("href") {
            Some(href) if !href.is_empty() => href.to_string(),
            _ => text_content(link),
        })
        .unwrap_or_default();

    let description = first_named(item, &["description", "summary", "content"])
        .map(|node| truncate_chars(&strip_tags(&text_content(node)), MAX_DESCRIPTION_CHARS))
        .unwrap_or_default();

    let published_label = first_named(item, &["pubDate", "published", "updated"])
        .map(|node| dates.format(&text_content(node)))
        .unwrap_or_default();

    Article {
        title,
        link,
        description,
        published_label,
    }
}

/// All descendant elements with the given local name, in document order.
fn elements_named<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Vec<Node<'a, 'input>> {
    node.descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == name)
        .collect()
}

/// First descendant matching the earliest name in `names` that has any match.
fn first_named<'a, 'input>(node: Node<'a, 'input>, names: &[&str]) -> Option<Node<'a, 'input>> {
    names.iter().find_map(|name| {
        node.descendants()
            .skip(1)
            .find(|n| n.is_element() && n.tag_name().name() == *name)
    })
}

/// Concatenated text of every descendant text node, CDATA included.
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

/// Remove every `<...>` span. Not nesting-aware; an unclosed `<` is kept.
pub fn strip_tags(text: &str) -> String {
    TAG_PATTERN.replace_all(text, "").into_owned()
}

pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => text[..cut].to_string(),
        None => text.to_string(),
    }
}
