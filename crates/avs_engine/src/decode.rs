use avs_logging::avs_warn;
use chardetng::EncodingDetector;
use encoding_rs::Encoding;

use crate::FetchOutput;

/// How far into the document to look for a `<meta charset>` declaration.
const META_SNIFF_BYTES: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding_label: String,
    /// Some bytes were invalid for the encoding and became U+FFFD.
    pub had_errors: bool,
}

/// Decode a fetched page using its Content-Type header.
pub fn decode_page(output: &FetchOutput) -> DecodedHtml {
    decode_html(&output.bytes, output.metadata.content_type.as_deref())
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> meta charset
/// -> chardetng guess. Decoding is lossy: pages whose declared charset does not
/// match their bytes still decode.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> DecodedHtml {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    let declared = content_type
        .and_then(charset_from_content_type)
        .or_else(|| charset_from_meta(bytes));
    if let Some(enc) = declared.and_then(|label| Encoding::for_label(label.as_bytes())) {
        return decode_with(bytes, enc);
    }

    // Receipt portals are Brazilian; bias the guess towards Portuguese text.
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(Some(&b"br"[..]), true);
    decode_with(bytes, enc)
}

fn charset_from_content_type(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        Some(value.trim_matches([' ', '"', '\''].as_ref()).to_string())
    })
}

fn charset_from_meta(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SNIFF_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();
    (!label.is_empty()).then_some(label)
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedHtml {
    let (text, _, had_errors) = enc.decode(bytes);
    if had_errors {
        avs_warn!("Invalid {} bytes replaced while decoding page", enc.name());
    }
    DecodedHtml {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
        had_errors,
    }
}
