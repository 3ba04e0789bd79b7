use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::Html;

pub const DESCRIPTION_MAX_CHARS: usize = 400;

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Plain-text summary of extracted content: markup stripped, whitespace
/// collapsed, cut to [`DESCRIPTION_MAX_CHARS`] characters. Empty when there is
/// no content.
pub fn build_description(content_html: Option<&str>) -> String {
    content_html
        .map(|html| truncate_chars(&strip_markup(html), DESCRIPTION_MAX_CHARS).to_string())
        .unwrap_or_default()
}

/// Text content of an HTML fragment. Block boundaries become spaces so that
/// `<p>a</p><p>b</p>` reads `a b`.
///
/// Escaped markup such as `&lt;b&gt;` decodes to tag-shaped text; that is
/// removed too, so the result never contains a tag.
pub fn strip_markup(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::with_capacity(html.len() / 2);
    for child in fragment.tree.root().children() {
        collect_text(child, &mut out);
    }
    crate::extract::collapse_whitespace(&drop_tag_like(&out))
}

/// Removes `<...>` runs that open like a tag (`<x`, `</`, `<!`, `<?`).
/// A lone `<`, as in `a < b`, is kept.
fn drop_tag_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let opens_tag = tail[1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        match tail.find('>') {
            Some(end) if opens_tag => {
                out.push(' ');
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('<');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            let name = element.name();
            if matches!(name, "script" | "style" | "noscript" | "template") {
                return;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push(' ');
            }
            for child in node.children() {
                collect_text(child, out);
            }
            if block {
                out.push(' ');
            }
        }
        _ => {
            for child in node.children() {
                collect_text(child, out);
            }
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::{build_description, strip_markup, truncate_chars, DESCRIPTION_MAX_CHARS};

    #[test]
    fn missing_content_gives_empty_description() {
        assert_eq!(build_description(None), "");
    }

    #[test]
    fn block_elements_are_separated() {
        assert_eq!(
            strip_markup("<h1>Head</h1><p>One <b>bold</b> word.</p><p>Two</p>"),
            "Head One bold word. Two"
        );
    }

    #[test]
    fn entities_are_decoded_and_scripts_dropped() {
        assert_eq!(
            strip_markup("<p>Fish &amp; chips</p><script>alert(1)</script>"),
            "Fish & chips"
        );
    }

    #[test]
    fn escaped_markup_does_not_come_back_as_tags() {
        let description = build_description(Some(
            "<p>Use &lt;script&gt;alert(1)&lt;/script&gt; carefully</p>",
        ));
        assert!(!description.contains('<'), "{description:?}");
        assert_eq!(description, "Use alert(1) carefully");
    }

    #[test]
    fn comparison_signs_survive() {
        assert_eq!(strip_markup("<p>1 &lt; 2 and 3 &gt; 2</p>"), "1 < 2 and 3 > 2");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let text = "é".repeat(DESCRIPTION_MAX_CHARS + 10);
        let cut = truncate_chars(&text, DESCRIPTION_MAX_CHARS);
        assert_eq!(cut.chars().count(), DESCRIPTION_MAX_CHARS);
    }

    #[test]
    fn long_content_is_bounded() {
        let html = format!("<p>{}</p>", "word ".repeat(500));
        let description = build_description(Some(&html));
        assert_eq!(description.chars().count(), DESCRIPTION_MAX_CHARS);
        assert!(!description.contains('<'));
    }
}
