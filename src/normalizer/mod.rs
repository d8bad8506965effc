use regex::Regex;
use scraper::{Html, Selector};

/// Title and description advertised by a page's Open Graph tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMeta {
    pub title: String,
    pub description: String,
}

impl PageMeta {
    pub fn is_empty(&self) -> bool {
        self.title.is_empty() && self.description.is_empty()
    }
}

/// Parses server-rendered page heads without a browser.
#[derive(Debug, Clone)]
pub struct Normalizer {
    title: Selector,
    description: Selector,
    title_segment: Regex,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            title: Selector::parse(r#"meta[property="og:title"]"#).expect("Invalid selector"),
            description: Selector::parse(r#"meta[property="og:description"]"#)
                .expect("Invalid selector"),
            title_segment: Regex::new(r"\|\s*([^|]+?)\s*\|").expect("Invalid regex"),
        }
    }

    pub fn page_meta(&self, body: &[u8]) -> PageMeta {
        let html = Html::parse_document(&String::from_utf8_lossy(body));
        let content = |selector: &Selector| {
            html.select(selector)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(|c| c.trim().to_string())
                .unwrap_or_default()
        };

        PageMeta {
            title: self.clean_title(&content(&self.title)),
            description: content(&self.description),
        }
    }

    /// Titles look like `12K views · 1K reactions | Caption | Creator`; keep
    /// the part between the first pair of bars, else the first segment.
    fn clean_title(&self, raw: &str) -> String {
        match self.title_segment.captures(raw) {
            Some(caps) => caps[1].trim().to_string(),
            None => raw.split('|').next().unwrap_or_default().trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html><html><head>
        <meta property="og:title" content="1.2M views · 40K reactions | Sunrise at the pier &amp; more | Lake Studio">
        <meta property="og:description" content="Filmed on the first day of spring.">
    </head><body></body></html>"#;

    #[test]
    fn test_page_meta() {
        let meta = Normalizer::new().page_meta(PAGE.as_bytes());
        assert_eq!(meta.title, "Sunrise at the pier & more");
        assert_eq!(meta.description, "Filmed on the first day of spring.");
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_title_without_bar_pair() {
        let normalizer = Normalizer::new();
        assert_eq!(normalizer.clean_title("Lake Studio | Facebook"), "Lake Studio");
        assert_eq!(normalizer.clean_title("Plain title"), "Plain title");
        assert_eq!(normalizer.clean_title(""), "");
    }

    #[test]
    fn test_page_without_tags() {
        let meta = Normalizer::new().page_meta(b"<html><head><title>x</title></head></html>");
        assert!(meta.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_tolerated() {
        let mut body = PAGE.as_bytes().to_vec();
        body.extend_from_slice(&[0xFF, 0xFE]);
        assert_eq!(Normalizer::new().page_meta(&body).description, "Filmed on the first day of spring.");
    }
}
