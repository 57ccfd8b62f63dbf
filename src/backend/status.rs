//! User-facing transport failure messages

use crate::content::html::{escape_attribute, escape_text};
use crate::content::Element;

/// Marker class of the synthesized error fragment
pub const WARNING_CLASS: &str = "ui-creme-dialog-warn";

/// Message shown for a failed request with this status
pub fn status_message(status: u16) -> &'static str {
    match status {
        0 => "Connection error",
        400 => "Bad request",
        401 => "Unauthorized",
        403 => "Forbidden access",
        404 => "Not found",
        405 => "Method not allowed",
        409 => "Conflicting request",
        500 => "Internal server error",
        502 => "Bad gateway",
        503 => "Service unavailable",
        504 => "Gateway timeout",
        _ => "Error",
    }
}

/// Localized strings of the error fragment
#[derive(Debug, Clone, Copy)]
pub struct StatusCatalog {
    locale: &'static str,
    messages: fn(u16) -> &'static str,
    reload_label: &'static str,
}

impl StatusCatalog {
    pub const ENGLISH: StatusCatalog = StatusCatalog {
        locale: "en",
        messages: status_message,
        reload_label: "Reload",
    };

    pub const fn new(locale: &'static str, messages: fn(u16) -> &'static str, reload_label: &'static str) -> Self {
        Self {
            locale,
            messages,
            reload_label,
        }
    }

    pub fn locale(&self) -> &'static str {
        self.locale
    }

    pub fn message(&self, status: u16) -> &'static str {
        (self.messages)(status)
    }

    pub fn reload_label(&self) -> &'static str {
        self.reload_label
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::ENGLISH
    }
}

// Catalogs are identified by locale
impl PartialEq for StatusCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.locale == other.locale
    }
}

/// Fragment describing a failed request, with a link to retry it
pub fn error_fragment(status: u16, url: &str, catalog: &StatusCatalog) -> Element {
    let markup = format!(
        r#"<div class="{WARNING_CLASS}"><h3 class="header">{message}</h3><p class="status">HTTP {status}</p><p class="url">{url_text}</p><a class="reload" href="{url_attr}">{reload}</a></div>"#,
        message = escape_text(catalog.message(status)),
        url_text = escape_text(url),
        url_attr = escape_attribute(url),
        reload = escape_text(catalog.reload_label()),
    );

    // Always holds the wrapping div
    Element::parse(&markup).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_fallback_messages() {
        assert_eq!(status_message(404), "Not found");
        assert_eq!(status_message(0), "Connection error");
        assert_eq!(status_message(418), "Error");
    }

    #[test]
    fn test_error_fragment_content() {
        let fragment = error_fragment(400, "/edit?a=1&b=<2>", &StatusCatalog::ENGLISH);
        let text = fragment.text();
        assert!(text.contains("Bad request"));
        assert!(text.contains("HTTP 400"));
        assert!(text.contains("/edit?a=1&b=<2>"));
        assert!(fragment.html().contains(WARNING_CLASS));
        assert!(fragment.html().contains("&lt;2&gt;"));
    }

    fn french(status: u16) -> &'static str {
        match status {
            404 => "Page introuvable",
            _ => "Erreur",
        }
    }

    #[test]
    fn test_localized_fragment() {
        let catalog = StatusCatalog::new("fr", french, "Recharger");
        let fragment = error_fragment(404, "/missing", &catalog);
        let text = fragment.text();
        assert!(text.contains("Page introuvable"));
        assert!(text.contains("Recharger"));
        assert!(!text.contains("Not found"));
        assert_eq!(catalog.message(500), "Erreur");
        assert_ne!(catalog, StatusCatalog::default());
    }
}
