use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use ingest_logging::ingest_warn;

/// How far into the document to look for a `<meta charset>` declaration.
const META_PRESCAN_BYTES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding_label: String,
    /// Malformed sequences were replaced with U+FFFD.
    pub lossy: bool,
}

/// Decode raw page bytes into UTF-8.
///
/// Order: BOM, then the `Content-Type` charset, then a `<meta charset>` in
/// the document head, then chardetng. A declared encoding that fails to decode
/// cleanly is abandoned for detection; the detected encoding is applied lossily.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> DecodedHtml {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        if let Some(decoded) = decode_strict(bytes, encoding) {
            return decoded;
        }
    }

    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes));
    if let Some(enc) = declared.and_then(|label| Encoding::for_label(label.as_bytes())) {
        if let Some(decoded) = decode_strict(bytes, enc) {
            return decoded;
        }
        ingest_warn!("declared charset {} did not decode cleanly; detecting", enc.name());
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    let (text, _, had_errors) = enc.decode(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
        lossy: had_errors,
    }
}

fn decode_strict(bytes: &[u8], enc: &'static Encoding) -> Option<DecodedHtml> {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        return None;
    }
    Some(DecodedHtml {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
        lossy: false,
    })
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (name, value) = part.trim().split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim_matches([' ', '"', '\'']).to_string())
    })
}

fn charset_from_meta(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();
    (!label.is_empty()).then_some(label)
}
