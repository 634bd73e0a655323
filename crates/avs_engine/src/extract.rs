use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Where each receipt field lives on the page. Defaults match the consumer
/// receipt (NFC-e) query page served by the state tax portals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorConfig {
    pub issuer: String,
    pub total: String,
    /// Headings searched for `note_heading_text`; the note number is read from
    /// the block that follows the matching heading.
    pub note_heading: String,
    pub note_heading_text: String,
    pub note_number_marker: String,
    /// Elements scanned for `issued_at_marker`.
    pub issued_at_item: String,
    pub issued_at_marker: String,
    pub issued_at_delimiter: char,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            issuer: "div.txtTopo".to_string(),
            total: "span.totalNumb.txtMax".to_string(),
            note_heading: "h4".to_string(),
            note_heading_text: "Informações gerais da Nota".to_string(),
            note_number_marker: "Número:".to_string(),
            issued_at_item: "li".to_string(),
            issued_at_marker: "Emissão:".to_string(),
            issued_at_delimiter: '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid selector {selector:?}: {message}")]
pub struct SelectorError {
    pub selector: String,
    pub message: String,
}

/// Reads raw field text from a parsed receipt page, one method per field.
///
/// Values are trimmed text, never validated here.
pub trait ReceiptFieldStrategy: Send + Sync {
    fn issuer(&self, doc: &Html) -> Option<String>;
    fn total(&self, doc: &Html) -> Option<String>;
    fn note_number(&self, doc: &Html) -> Option<String>;
    fn issued_at(&self, doc: &Html) -> Option<String>;
}

/// CSS-selector and marker-text matching driven by a [`SelectorConfig`].
#[derive(Debug)]
pub struct SelectorStrategy {
    config: SelectorConfig,
    issuer: Selector,
    total: Selector,
    note_heading: Selector,
    issued_at_item: Selector,
}

impl SelectorStrategy {
    pub fn new(config: SelectorConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            issuer: compile(&config.issuer)?,
            total: compile(&config.total)?,
            note_heading: compile(&config.note_heading)?,
            issued_at_item: compile(&config.issued_at_item)?,
            config,
        })
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }
}

impl Default for SelectorStrategy {
    fn default() -> Self {
        // The default selectors are literals known to parse.
        Self::new(SelectorConfig::default()).expect("default selectors are valid")
    }
}

impl ReceiptFieldStrategy for SelectorStrategy {
    fn issuer(&self, doc: &Html) -> Option<String> {
        first_text(doc, &self.issuer)
    }

    fn total(&self, doc: &Html) -> Option<String> {
        first_text(doc, &self.total)
    }

    fn note_number(&self, doc: &Html) -> Option<String> {
        let heading = doc
            .select(&self.note_heading)
            .find(|h| element_text(*h).contains(&self.config.note_heading_text))?;

        heading
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .chain(heading.parent().and_then(ElementRef::wrap))
            .find_map(|block| {
                let text = element_text(block);
                let after = after_marker(&text, &self.config.note_number_marker)?;
                after
                    .split_whitespace()
                    .next()
                    .map(ToOwned::to_owned)
            })
    }

    fn issued_at(&self, doc: &Html) -> Option<String> {
        doc.select(&self.issued_at_item).find_map(|item| {
            let text = element_text(item);
            let after = after_marker(&text, &self.config.issued_at_marker)?;
            let value = after
                .split(self.config.issued_at_delimiter)
                .next()
                .unwrap_or(after)
                .trim();
            (!value.is_empty()).then(|| value.to_string())
        })
    }
}

fn compile(selector: &str) -> Result<Selector, SelectorError> {
    Selector::parse(selector).map_err(|err| SelectorError {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

fn first_text(doc: &Html, selector: &Selector) -> Option<String> {
    doc.select(selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

// Text of the element with runs of whitespace collapsed, so markers split
// across tags and line breaks still match.
fn element_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    collect_text(*element, &mut out);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => collect_text(child, out),
            _ => {}
        }
    }
}

fn after_marker<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    Some(text[start..].trim_start())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_selector_is_reported() {
        let config = SelectorConfig {
            total: "span..broken".to_string(),
            ..SelectorConfig::default()
        };
        let err = SelectorStrategy::new(config).unwrap_err();
        assert_eq!(err.selector, "span..broken");
    }

    #[test]
    fn after_marker_skips_leading_space() {
        assert_eq!(after_marker("Número: 42 Série", "Número:"), Some("42 Série"));
        assert_eq!(after_marker("nothing here", "Número:"), None);
    }
}
