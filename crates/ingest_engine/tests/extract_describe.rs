use ingest_engine::{
    build_description, decode_html, ExtractError, Extractor, ReadabilityLikeExtractor,
    DESCRIPTION_MAX_CHARS,
};
use pretty_assertions::assert_eq;

#[test]
fn decode_respects_charset_header() {
    let bytes = b"caf\xe9"; // iso-8859-1
    let decoded = decode_html(bytes, Some("text/html; charset=ISO-8859-1"));
    assert_eq!(decoded.html, "café");
    assert!(!decoded.lossy);
    assert!(
        decoded.encoding_label.eq_ignore_ascii_case("ISO-8859-1")
            || decoded.encoding_label.eq_ignore_ascii_case("windows-1252")
    );
}

#[test]
fn decode_handles_utf8_bom() {
    let bytes = b"\xEF\xBB\xBFhello";
    let decoded = decode_html(bytes, Some("text/html"));
    assert_eq!(decoded.html, "hello");
    assert_eq!(decoded.encoding_label, "UTF-8");
}

#[test]
fn decode_reads_meta_charset_when_header_is_silent() {
    let bytes = b"<html><head><meta charset=\"windows-1252\"></head><body>na\xefve</body></html>";
    let decoded = decode_html(bytes, Some("text/html"));
    assert!(decoded.html.contains("naïve"));
    assert_eq!(decoded.encoding_label, "windows-1252");
}

#[test]
fn decode_never_fails_on_garbage() {
    let decoded = decode_html(&[0xff, 0xfe, 0x00, 0xd8, 0x41], None);
    assert!(!decoded.encoding_label.is_empty());
}

#[test]
fn extractor_prefers_article_then_body() {
    let html = r#"
    <html><head><title>Title</title></head>
    <body>
        <nav>Navigation</nav>
        <article><h1>Heading</h1><p>Body text</p></article>
    </body></html>
    "#;
    let extracted = ReadabilityLikeExtractor.extract(html).unwrap();
    assert_eq!(extracted.title.as_deref(), Some("Title"));
    let content = extracted.content_html.unwrap();
    assert!(content.contains("Heading"));
    assert!(content.contains("Body text"));
    assert!(!content.contains("Navigation"));
}

#[test]
fn extractor_prefers_og_title() {
    let html = r#"<html><head><meta property="og:title" content=" Shared title ">
        <title>Site | Page</title></head><body><p>x</p></body></html>"#;
    let extracted = ReadabilityLikeExtractor.extract(html).unwrap();
    assert_eq!(extracted.title.as_deref(), Some("Shared title"));
}

#[test]
fn extractor_falls_back_to_body_without_scripts() {
    let html = r#"<html><body><script>var x = 1;</script><div>Plain body</div></body></html>"#;
    let extracted = ReadabilityLikeExtractor.extract(html).unwrap();
    assert_eq!(extracted.title, None);
    let content = extracted.content_html.unwrap();
    assert!(content.contains("Plain body"));
    assert!(!content.contains("var x"));
}

#[test]
fn extractor_rejects_empty_documents() {
    let err = ReadabilityLikeExtractor
        .extract("<html><body><script>1</script></body></html>")
        .unwrap_err();
    assert_eq!(err, ExtractError::Unreadable);
}

#[test]
fn description_follows_extracted_content() {
    let html = r#"<html><head><title>T</title></head><body><article>
        <h2>Lead</h2><p>First &amp; second.</p><p>Third.</p></article></body></html>"#;
    let extracted = ReadabilityLikeExtractor.extract(html).unwrap();
    let description = build_description(extracted.content_html.as_deref());
    assert_eq!(description, "Lead First & second. Third.");
}

#[test]
fn description_is_bounded() {
    let paragraph = "word ".repeat(500);
    let description = build_description(Some(&format!("<p>{paragraph}</p>")));
    assert_eq!(description.chars().count(), DESCRIPTION_MAX_CHARS);
}
