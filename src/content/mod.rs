//! Content-type negotiation for response bodies
//!
//! Servers do not reliably label what they send: HTML arrives as JSON, JSON
//! arrives as HTML, and some engines wrap empty or invalid documents in a
//! `<pre>` element. [`classify`] turns a raw body plus an optional declared
//! type into a [`Classification`] by running an ordered list of rules where
//! the first match wins. Classification never fails; a string that matches
//! nothing else is plain text.
//!
//! The guessing rules can still take near-JSON markup for JSON (or the
//! reverse) because parse failures are swallowed. That ambiguity comes from
//! the servers and is kept as is.

pub mod html;

pub use html::{ActionLink, Element};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tracing::warn;

/// Semantic type of a classified body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    #[serde(rename = "text/plain")]
    TextPlain,
    #[serde(rename = "text/html")]
    TextHtml,
    #[serde(rename = "text/json")]
    TextJson,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "object/element")]
    ObjectElement,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::TextPlain => "text/plain",
            ContentType::TextHtml => "text/html",
            ContentType::TextJson => "text/json",
            ContentType::Object => "object",
            ContentType::ObjectElement => "object/element",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified content payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Json(Value),
    Element(Element),
}

impl Content {
    pub fn is_empty(&self) -> bool {
        match self {
            Content::Text(text) => text.is_empty(),
            Content::Json(value) => value.is_null(),
            Content::Element(element) => element.is_empty(),
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Content::Element(element) => Some(element),
            _ => None,
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Content::Text(text) => Value::String(text.clone()),
            Content::Json(value) => value.clone(),
            Content::Element(element) => Value::String(element.html().to_string()),
        }
    }
}

/// The `{content, type, data}` triple produced by [`classify`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    content: Content,
    #[serde(rename = "type")]
    content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl Classification {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: Content::Text(text.into()),
            content_type: ContentType::TextPlain,
            data: None,
        }
    }

    pub fn html(element: Element) -> Self {
        Self {
            content: Content::Element(element),
            content_type: ContentType::TextHtml,
            data: None,
        }
    }

    fn json(text: impl Into<String>, data: Value) -> Self {
        Self {
            content: Content::Text(text.into()),
            content_type: ContentType::TextJson,
            data: Some(data),
        }
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Decoded data if any, the content otherwise
    pub fn data(&self) -> Value {
        match &self.data {
            Some(data) => data.clone(),
            None => self.content.to_value(),
        }
    }

    pub fn into_content(self) -> Content {
        self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_plain_text(&self) -> bool {
        self.content_type == ContentType::TextPlain
    }

    pub fn is_json_or_object(&self) -> bool {
        matches!(self.content_type, ContentType::TextJson | ContentType::Object)
    }

    pub fn is_html_or_element(&self) -> bool {
        matches!(
            self.content_type,
            ContentType::TextHtml | ContentType::ObjectElement
        )
    }

    pub fn is_html(&self) -> bool {
        self.content_type == ContentType::TextHtml
    }
}

/// Anything [`classify`] accepts
#[derive(Debug, Clone, PartialEq)]
pub enum RawContent {
    Null,
    Text(String),
    Json(Value),
    Element(Element),
    Classified(Classification),
}

impl From<&str> for RawContent {
    fn from(text: &str) -> Self {
        RawContent::Text(text.to_string())
    }
}

impl From<String> for RawContent {
    fn from(text: String) -> Self {
        RawContent::Text(text)
    }
}

impl From<Value> for RawContent {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawContent::Null,
            Value::String(text) => RawContent::Text(text),
            other => RawContent::Json(other),
        }
    }
}

impl From<Element> for RawContent {
    fn from(element: Element) -> Self {
        RawContent::Element(element)
    }
}

impl From<Classification> for RawContent {
    fn from(classification: Classification) -> Self {
        RawContent::Classified(classification)
    }
}

impl<T: Into<RawContent>> From<Option<T>> for RawContent {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawContent::Null)
    }
}

/// Declared type families recognized by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    PlainText,
    Html,
    Json,
    Unknown,
}

impl DeclaredType {
    /// Map a MIME type (parameters ignored) to its family
    pub fn from_mime(declared: Option<&str>) -> Self {
        let Some(declared) = declared else {
            return DeclaredType::Unknown;
        };

        let essence = declared
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "text/plain" => DeclaredType::PlainText,
            "html" | "text/html" => DeclaredType::Html,
            "text/json" | "application/json" | "text/javascript" | "application/javascript" => {
                DeclaredType::Json
            }
            _ => DeclaredType::Unknown,
        }
    }
}

/// A classification rule: `Some` when it recognizes the text
pub type Rule = fn(&str) -> Option<Classification>;

const HTML_RULES: &[Rule] = &[json_when_plain_text, wrapped_json, html_fragment, plain_text];
const JSON_RULES: &[Rule] = &[json_document, plain_text];
const GUESS_RULES: &[Rule] = &[json_document, wrapped_json, html_fragment, plain_text];

/// Classify a raw value against an optional declared content type
pub fn classify(raw: impl Into<RawContent>, declared: Option<&str>) -> Classification {
    match raw.into() {
        RawContent::Null => Classification::text(String::new()),
        RawContent::Classified(classification) => classification,
        RawContent::Element(element) => Classification {
            content: Content::Element(element),
            content_type: ContentType::ObjectElement,
            data: None,
        },
        RawContent::Json(value) => Classification {
            content: Content::Json(value),
            content_type: ContentType::Object,
            data: None,
        },
        RawContent::Text(text) => classify_text(text, declared),
    }
}

fn classify_text(text: String, declared: Option<&str>) -> Classification {
    match DeclaredType::from_mime(declared) {
        DeclaredType::PlainText => Classification::text(text),
        DeclaredType::Html => first_match(HTML_RULES, &html::unwrap_pre(&text)),
        DeclaredType::Json => first_match(JSON_RULES, &html::unwrap_pre(&text)),
        DeclaredType::Unknown => {
            let guessed = first_match(GUESS_RULES, &html::unwrap_pre(&text));
            warn!(
                declared = declared.unwrap_or("none"),
                guessed = %guessed.content_type(),
                "response content type had to be guessed"
            );
            guessed
        }
    }
}

fn first_match(rules: &[Rule], text: &str) -> Classification {
    rules
        .iter()
        .find_map(|rule| rule(text))
        .unwrap_or_else(|| Classification::text(text))
}

/// Strict JSON document
pub fn json_document(text: &str) -> Option<Classification> {
    let data = serde_json::from_str::<Value>(text.trim()).ok()?;
    Some(Classification::json(text, data))
}

/// JSON mislabeled as HTML: only tried when the text does not read as markup
pub fn json_when_plain_text(text: &str) -> Option<Classification> {
    if html::looks_like_plain_text(text) {
        json_document(text)
    } else {
        None
    }
}

/// JSON inside the legacy `<json>` envelope
pub fn wrapped_json(text: &str) -> Option<Classification> {
    let inner = html::unwrap_json(text)?;
    let data = serde_json::from_str::<Value>(inner.trim()).ok()?;
    Some(Classification::json(inner, data))
}

pub fn html_fragment(text: &str) -> Option<Classification> {
    Element::parse(text).map(Classification::html)
}

pub fn plain_text(text: &str) -> Option<Classification> {
    Some(Classification::text(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_empty_text() {
        let classified = classify(RawContent::Null, None);
        assert_eq!(classified.content(), &Content::Text(String::new()));
        assert_eq!(classified.content_type(), ContentType::TextPlain);
        assert!(classified.is_empty());
    }

    #[test]
    fn test_classification_passthrough() {
        let first = classify("<div>x</div>", Some("text/html"));
        let second = classify(first.clone(), Some("text/plain"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_element_and_object() {
        let element = Element::parse("<span>x</span>").unwrap();
        let classified = classify(element.clone(), Some("text/plain"));
        assert_eq!(classified.content_type(), ContentType::ObjectElement);
        assert!(classified.is_html_or_element());
        assert!(!classified.is_html());

        let object = classify(json!({"a": 1}), None);
        assert_eq!(object.content_type(), ContentType::Object);
        assert!(object.is_json_or_object());
        assert_eq!(object.data(), json!({"a": 1}));
    }

    #[test]
    fn test_declared_plain_text_is_kept() {
        let classified = classify("<div>x</div>", Some("text/plain; charset=utf-8"));
        assert!(classified.is_plain_text());
        assert_eq!(classified.content(), &Content::Text("<div>x</div>".to_string()));
    }

    #[test]
    fn test_html_pre_wrapper_unwrapped_to_text() {
        let classified = classify("<pre>X</pre>", Some("html"));
        assert!(classified.is_plain_text());
        assert_eq!(classified.content(), &Content::Text("X".to_string()));
    }

    #[test]
    fn test_html_mislabeled_json() {
        let classified = classify("<pre>{\"a\": 1}</pre>", Some("text/html"));
        assert_eq!(classified.content_type(), ContentType::TextJson);
        assert_eq!(classified.data(), json!({"a": 1}));
    }

    #[test]
    fn test_html_legacy_json_wrapper() {
        let classified = classify("<json>{\"a\":1}</json>", Some("text/html"));
        assert_eq!(classified.content_type(), ContentType::TextJson);
        assert_eq!(classified.data(), json!({"a": 1}));
    }

    #[test]
    fn test_html_fragment() {
        let classified = classify("<div class=\"x\">Hello</div>", Some("text/html"));
        assert!(classified.is_html());
        let element = classified.content().as_element().unwrap();
        assert_eq!(element.text(), "Hello");
    }

    #[test]
    fn test_html_without_markup_degrades_to_text() {
        let classified = classify("not markup at all", Some("text/html"));
        assert!(classified.is_plain_text());
        assert_eq!(
            classified.content(),
            &Content::Text("not markup at all".to_string())
        );
    }

    #[test]
    fn test_empty_html_is_empty_fragment() {
        let classified = classify("", Some("text/html"));
        assert!(classified.is_html());
        assert!(classified.is_empty());
    }

    #[test]
    fn test_json_declared() {
        let classified = classify("{\"a\":1}", Some("text/json"));
        assert_eq!(classified.content_type(), ContentType::TextJson);
        assert_eq!(classified.data(), json!({"a": 1}));

        let classified = classify("<pre>[1, 2]</pre>", Some("application/json"));
        assert_eq!(classified.data(), json!([1, 2]));
    }

    #[test]
    fn test_json_declared_malformed_keeps_unwrapped_text() {
        let classified = classify("<pre>{\"a\":</pre>", Some("text/json"));
        assert!(classified.is_plain_text());
        assert_eq!(classified.content(), &Content::Text("{\"a\":".to_string()));
        assert_eq!(classified.data(), json!("{\"a\":"));
    }

    #[test]
    fn test_guess_cascade() {
        assert_eq!(
            classify("{\"a\":1}", None).content_type(),
            ContentType::TextJson
        );
        assert_eq!(
            classify("<json>[1]</json>", Some("application/octet-stream")).content_type(),
            ContentType::TextJson
        );
        assert_eq!(classify("<p>x</p>", None).content_type(), ContentType::TextHtml);
        assert_eq!(classify("words", None).content_type(), ContentType::TextPlain);
    }

    #[test]
    fn test_declared_type_families() {
        assert_eq!(DeclaredType::from_mime(None), DeclaredType::Unknown);
        assert_eq!(
            DeclaredType::from_mime(Some("Text/HTML; charset=utf-8")),
            DeclaredType::Html
        );
        assert_eq!(
            DeclaredType::from_mime(Some("application/javascript")),
            DeclaredType::Json
        );
        assert_eq!(
            DeclaredType::from_mime(Some("image/png")),
            DeclaredType::Unknown
        );
    }

    #[test]
    fn test_serialized_shape() {
        let value = serde_json::to_value(classify("{\"a\":1}", Some("text/json"))).unwrap();
        assert_eq!(value["type"], json!("text/json"));
        assert_eq!(value["content"], json!("{\"a\":1}"));
        assert_eq!(value["data"], json!({"a": 1}));
    }
}
