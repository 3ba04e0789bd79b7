use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

/// Title and main-content markup of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub content_html: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("document has neither a title nor readable text")]
    Unreadable,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<ExtractedContent, ExtractError>;
}

const CONTENT_CANDIDATES: &[&str] = &["article", "main", "[role=main]", "body"];
const NOISE: &str = "script, style, noscript, template, iframe";

/// Lightweight "readability-like" extractor:
/// - title from `og:title`, then `<title>`, then the first `<h1>`
/// - content from the first of `article`, `main`, `[role=main]`, `body`
///   that carries text, with script-like subtrees removed
#[derive(Debug, Default)]
pub struct ReadabilityLikeExtractor;

impl Extractor for ReadabilityLikeExtractor {
    fn extract(&self, html: &str) -> Result<ExtractedContent, ExtractError> {
        let mut doc = Html::parse_document(html);
        strip_noise(&mut doc);

        let title = og_title(&doc)
            .or_else(|| first_text(&doc, "title"))
            .or_else(|| first_text(&doc, "h1"));

        let content_html = CONTENT_CANDIDATES
            .iter()
            .filter_map(|css| Selector::parse(css).ok())
            .find_map(|sel| doc.select(&sel).find(has_text).map(|node| node.inner_html()));

        if title.is_none() && content_html.is_none() {
            return Err(ExtractError::Unreadable);
        }

        Ok(ExtractedContent {
            title,
            content_html,
        })
    }
}

fn strip_noise(doc: &mut Html) {
    let Ok(noise) = Selector::parse(NOISE) else {
        return;
    };
    let ids: Vec<NodeId> = doc.select(&noise).map(|node| node.id()).collect();
    for id in ids {
        if let Some(mut node) = doc.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn og_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[property="og:title"]"#).ok()?;
    doc.select(&sel)
        .filter_map(|meta| meta.value().attr("content"))
        .map(|content| content.trim().to_string())
        .find(|content| !content.is_empty())
}

fn first_text(doc: &Html, css: &str) -> Option<String> {
    let sel = Selector::parse(css).ok()?;
    doc.select(&sel)
        .next()
        .map(|node| collapse_whitespace(&node.text().collect::<String>()))
        .filter(|text| !text.is_empty())
}

fn has_text(node: &ElementRef<'_>) -> bool {
    node.text().any(|chunk| !chunk.trim().is_empty())
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
