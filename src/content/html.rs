//! HTML fragments and the legacy response envelopes
//!
//! Fragments are parsed with `scraper` and stored serialized, so an [`Element`]
//! can be cloned into events and sent across tasks.

use crate::backend::{Form, FormMethod};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::sync::OnceLock;

/// Marker class of anchors that become dialog buttons
pub const ACTION_LINK_CLASS: &str = "ui-creme-dialog-action";

/// Marker class of the element whose text becomes the dialog title
pub const TITLE_BAR_CLASS: &str = "ui-creme-dialog-titlebar";

/// A parsed HTML fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Element {
    html: String,
}

/// An action link discovered inside fetched content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionLink {
    pub name: String,
    pub label: String,
    pub href: String,
    pub order: i32,
}

impl Element {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a fragment.
    ///
    /// Returns `None` when the markup holds no element at all (bare text is not
    /// a fragment). Blank markup is the valid empty fragment.
    pub fn parse(markup: &str) -> Option<Self> {
        if markup.trim().is_empty() {
            return Some(Self::empty());
        }

        let fragment = Html::parse_fragment(markup);
        let root = fragment.root_element();
        let has_element = root
            .descendants()
            .skip(1)
            .any(|node| node.value().is_element());

        if !has_element {
            return None;
        }

        Some(Self {
            html: root.inner_html(),
        })
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }

    /// Text content with whitespace collapsed
    pub fn text(&self) -> String {
        let fragment = Html::parse_fragment(&self.html);
        collapse_whitespace(&fragment.root_element().text().collect::<String>())
    }

    pub fn append(&mut self, other: &Element) {
        self.html.push_str(&other.html);
    }

    /// Anchors carrying [`ACTION_LINK_CLASS`], in document order.
    ///
    /// Links without an `href` are skipped; unnamed links get `link-N` where N
    /// is the link index.
    pub fn action_links(&self) -> Vec<ActionLink> {
        let Some(selector) = selector(&format!("a.{ACTION_LINK_CLASS}")) else {
            return Vec::new();
        };

        let fragment = Html::parse_fragment(&self.html);
        fragment
            .select(&selector)
            .enumerate()
            .filter_map(|(index, link)| {
                let href = link.value().attr("href")?.trim();
                if href.is_empty() {
                    return None;
                }

                let name = link
                    .value()
                    .attr("name")
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("link-{index}"));

                let label = collapse_whitespace(&link.text().collect::<String>());
                let order = link
                    .value()
                    .attr("data-order")
                    .and_then(|order| order.trim().parse().ok())
                    .unwrap_or(0);

                Some(ActionLink {
                    label: if label.is_empty() { name.clone() } else { label },
                    name,
                    href: href.to_string(),
                    order,
                })
            })
            .collect()
    }

    /// Text of the first [`TITLE_BAR_CLASS`] element, if any
    pub fn title_bar(&self) -> Option<String> {
        let selector = selector(&format!(".{TITLE_BAR_CLASS}"))?;
        let fragment = Html::parse_fragment(&self.html);
        let title = fragment.select(&selector).next()?;
        let text = collapse_whitespace(&title.text().collect::<String>());
        (!text.is_empty()).then_some(text)
    }

    /// The first form of the fragment with its successful controls
    pub fn form(&self) -> Option<Form> {
        let form_selector = selector("form")?;
        let fragment = Html::parse_fragment(&self.html);
        let form = fragment.select(&form_selector).next()?;

        let action = form
            .value()
            .attr("action")
            .map(str::trim)
            .filter(|action| !action.is_empty())
            .map(str::to_string);

        let method = match form.value().attr("method") {
            Some(method) if method.eq_ignore_ascii_case("post") => FormMethod::Post,
            _ => FormMethod::Get,
        };

        Some(Form {
            action,
            method,
            fields: form_fields(form),
        })
    }
}

fn form_fields(form: ElementRef<'_>) -> Vec<(String, String)> {
    let Some(controls) = selector("input[name], textarea[name], select[name]") else {
        return Vec::new();
    };

    let mut fields = Vec::new();

    for control in form.select(&controls) {
        let element = control.value();
        if element.attr("disabled").is_some() {
            continue;
        }

        let Some(name) = element.attr("name") else {
            continue;
        };

        match element.name() {
            "input" => {
                let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "button" | "image" | "reset" | "file" => continue,
                    "checkbox" | "radio" => {
                        if element.attr("checked").is_none() {
                            continue;
                        }
                        let value = element.attr("value").unwrap_or("on");
                        fields.push((name.to_string(), value.to_string()));
                    }
                    _ => {
                        let value = element.attr("value").unwrap_or_default();
                        fields.push((name.to_string(), value.to_string()));
                    }
                }
            }
            "textarea" => {
                fields.push((name.to_string(), control.text().collect()));
            }
            "select" => {
                let Some(options) = selector("option") else {
                    continue;
                };
                let mut choices: Vec<ElementRef<'_>> = control
                    .select(&options)
                    .filter(|option| option.value().attr("selected").is_some())
                    .collect();

                if choices.is_empty() && element.attr("multiple").is_none() {
                    choices.extend(control.select(&options).next());
                }

                for option in choices {
                    let value = option
                        .value()
                        .attr("value")
                        .map(str::to_string)
                        .unwrap_or_else(|| collapse_whitespace(&option.text().collect::<String>()));
                    fields.push((name.to_string(), value));
                }
            }
            _ => {}
        }
    }

    fields
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

fn pre_wrapper() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?is)^\s*<pre(?:\s[^>]*)?>(.*)</pre>\s*$").ok())
        .as_ref()
}

fn json_wrapper() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?is)^\s*<json>(.*)</json>\s*$").ok())
        .as_ref()
}

/// Strip a `<pre>` element wrapping the whole body.
///
/// Some engines wrap text responses this way; the wrapped text comes back with
/// its entities decoded. Anything else is returned untouched.
pub fn unwrap_pre(text: &str) -> String {
    let inner = pre_wrapper()
        .and_then(|pattern| pattern.captures(text))
        .and_then(|captures| captures.get(1))
        .map(|inner| inner.as_str())
        .filter(|inner| !inner.to_ascii_lowercase().contains("</pre"));

    match inner {
        Some(inner) => decode_entities(inner),
        None => text.to_string(),
    }
}

/// Body of a legacy `<json>...</json>` envelope
pub fn unwrap_json(text: &str) -> Option<&str> {
    json_wrapper()?
        .captures(text)?
        .get(1)
        .map(|inner| inner.as_str())
}

/// Whether a string reads as text rather than markup
pub fn looks_like_plain_text(text: &str) -> bool {
    !text.trim_start().starts_with('<')
}

pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    // Decoded as RCDATA; escaped `<` cannot close the textarea. The parser
    // drops one newline after `<textarea>` and normalizes bare CRs.
    let rcdata = text.replace('<', "&lt;").replace('\r', "&#13;");
    let fragment = Html::parse_fragment(&format!("<textarea>\n{rcdata}</textarea>"));
    fragment.root_element().text().collect()
}

pub fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn escape_attribute(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_bare_text() {
        assert!(Element::parse("just some words").is_none());
        assert!(Element::parse("<p>words</p>").is_some());
        assert!(Element::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_unwrap_pre() {
        assert_eq!(unwrap_pre("<pre>X</pre>"), "X");
        assert_eq!(unwrap_pre("  <PRE style=\"x\">{&quot;a&quot;: 1}</PRE>\n"), "{\"a\": 1}");
        assert_eq!(unwrap_pre("<pre>a</pre><pre>b</pre>"), "<pre>a</pre><pre>b</pre>");
        assert_eq!(unwrap_pre("<div>X</div>"), "<div>X</div>");
        assert_eq!(unwrap_pre("<prefix>X</prefix>"), "<prefix>X</prefix>");
    }

    #[test]
    fn test_unwrap_json() {
        assert_eq!(unwrap_json("<json>{\"a\":1}</json>"), Some("{\"a\":1}"));
        assert_eq!(unwrap_json("<div>{}</div>"), None);
    }

    #[test]
    fn test_action_links() {
        let element = Element::parse(
            r#"<div>
                <a class="ui-creme-dialog-action" href="/edit" name="edit">Edit  entry</a>
                <a class="other" href="/ignored">Ignored</a>
                <a class="ui-creme-dialog-action" href="/delete" data-order="-1">Delete</a>
                <a class="ui-creme-dialog-action">No target</a>
            </div>"#,
        )
        .unwrap();

        let links = element.action_links();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].name, "edit");
        assert_eq!(links[0].label, "Edit entry");
        assert_eq!(links[0].href, "/edit");
        assert_eq!(links[1].name, "link-1");
        assert_eq!(links[1].order, -1);
    }

    #[test]
    fn test_title_bar() {
        let element = Element::parse(
            r#"<div class="ui-creme-dialog-titlebar"> Edit &amp; save </div><p>body</p>"#,
        )
        .unwrap();
        assert_eq!(element.title_bar().as_deref(), Some("Edit & save"));
        assert_eq!(Element::parse("<p>x</p>").unwrap().title_bar(), None);
    }

    #[test]
    fn test_form_extraction() {
        let element = Element::parse(
            r#"<form action="/save" method="POST">
                <input name="title" value="Hello">
                <input type="checkbox" name="public" checked>
                <input type="checkbox" name="draft">
                <input type="submit" name="go" value="Go">
                <input name="locked" value="x" disabled>
                <textarea name="body">Some text</textarea>
                <select name="kind"><option value="a">A</option><option value="b" selected>B</option></select>
            </form>"#,
        )
        .unwrap();

        let form = element.form().unwrap();
        assert_eq!(form.action.as_deref(), Some("/save"));
        assert_eq!(form.method, FormMethod::Post);
        assert_eq!(
            form.fields,
            vec![
                ("title".to_string(), "Hello".to_string()),
                ("public".to_string(), "on".to_string()),
                ("body".to_string(), "Some text".to_string()),
                ("kind".to_string(), "b".to_string()),
            ]
        );
    }

    #[test]
    fn test_escape_round_trip() {
        assert_eq!(escape_text("<b>&"), "&lt;b&gt;&amp;");
        assert_eq!(decode_entities("&lt;b&gt;&amp;"), "<b>&");
    }

    #[test]
    fn test_decode_keeps_markup_and_line_breaks() {
        assert_eq!(
            decode_entities("Note &amp; </textarea><b>rest</b>"),
            "Note & </textarea><b>rest</b>"
        );
        assert_eq!(decode_entities("\nfirst &amp;\r\nsecond"), "\nfirst &\r\nsecond");
        assert_eq!(decode_entities("a &lt;/textarea&gt; b"), "a </textarea> b");
    }
}
