use std::sync::LazyLock;

use html_escape::decode_html_entities;
use regex::Regex;
use scraper::Selector;
use tracing::debug;

use crate::miner::dom::{image_source, DomView, BACKGROUND_ATTR};
use crate::miner::rules::MiningRules;
use crate::site::AssetFilter;
use crate::synth::CandidateList;

static IMAGES: LazyLock<Selector> = LazyLock::new(|| selector("img"));
static BACKGROUNDS: LazyLock<Selector> =
    LazyLock::new(|| selector(&format!("[{}], [style*=\"url(\"]", BACKGROUND_ATTR)));
static CODE_SCRIPTS: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"script:not([type="application/json"]):not([type="application/ld+json"])"#)
});
static DATA_SCRIPTS: LazyLock<Selector> = LazyLock::new(|| {
    selector(r#"script[type="application/json"], script[type="application/ld+json"]"#)
});
static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*["']?([^"')]+?)["']?\s*\)"#).expect("css url pattern must compile")
});

fn selector(source: &str) -> Selector {
    Selector::parse(source).expect("built-in selector must parse")
}

/// Undo the escaping applied to URLs embedded in JSON or HTML.
pub fn unescape_embedded(text: &str) -> String {
    let json = text
        .replace("\\/", "/")
        .replace("\\u0026", "&")
        .replace("\\u002F", "/");
    decode_html_entities(&json).into_owned()
}

/// Collect asset URLs from every place a page can reference them.
///
/// Order: image sources, computed backgrounds, inline code, embedded JSON.
/// Duplicates keep their first position.
pub fn discover_assets(view: &DomView, rules: &MiningRules, filter: &AssetFilter) -> Vec<String> {
    let mut found = CandidateList::new();
    let mut keep = |url: &str| {
        let url = unescape_embedded(url.trim());
        if filter.is_asset_host(&url) {
            found.push(url);
        }
    };

    for img in view.select(&IMAGES) {
        if let Some(src) = image_source(img) {
            keep(src);
        }
        for attr in &rules.lazy_source_attributes {
            if let Some(src) = img.value().attr(attr) {
                keep(src);
            }
        }
    }

    for el in view.select(&BACKGROUNDS) {
        let values = [el.value().attr(BACKGROUND_ATTR), el.value().attr("style")];
        for value in values.into_iter().flatten() {
            for caps in CSS_URL.captures_iter(value) {
                keep(&caps[1]);
            }
        }
    }

    for scripts in [&*CODE_SCRIPTS, &*DATA_SCRIPTS] {
        for script in view.select(scripts) {
            let body = unescape_embedded(&script.text().collect::<String>());
            for m in rules.script_asset_pattern.find_iter(&body) {
                keep(m.as_str());
            }
        }
    }

    debug!(count = found.len(), "assets discovered");
    found.into_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{FacebookAdapter, SiteAdapter};

    fn discover(markup: &str) -> Vec<String> {
        let adapter = FacebookAdapter::new();
        let view = DomView::parse(markup, "https://www.facebook.com/photo/?fbid=1");
        discover_assets(&view, adapter.mining_rules(), adapter.asset_filter())
    }

    #[test]
    fn test_unescape_embedded() {
        assert_eq!(
            unescape_embedded(r"https:\/\/a.fbcdn.net\/x.jpg?a=1&b=2&amp;c=3"),
            "https://a.fbcdn.net/x.jpg?a=1&b=2&c=3"
        );
    }

    #[test]
    fn test_unescape_numeric_and_quote_entities() {
        assert_eq!(
            unescape_embedded(r"https:\/\/scontent.xx.fbcdn.net\/v\/1.jpg?a=1&#38;b=2"),
            "https://scontent.xx.fbcdn.net/v/1.jpg?a=1&b=2"
        );
        assert_eq!(
            unescape_embedded("&quot;https:&#x2F;&#x2F;a.fbcdn.net&#x2F;y.png?oh=1&oe=2&quot;"),
            "\"https://a.fbcdn.net/y.png?oh=1&oe=2\""
        );
    }

    #[test]
    fn test_discovery_order_and_filtering() {
        let markup = r#"<html><body>
            <img src="https://scontent.xx.fbcdn.net/v/1_2_3_n.jpg" data-src="https://scontent.xx.fbcdn.net/v/lazy.jpg">
            <img src="https://www.facebook.com/images/logo.png">
            <div data-fbz-bg="url(&quot;https://scontent.xx.fbcdn.net/v/bg.jpg&quot;)"></div>
            <div style="background-image: url('https://external.xx.fbcdn.net/v/styled.png')"></div>
            <script>require("x", {"src":"https:\/\/scontent.xx.fbcdn.net\/v\/script.jpg?a=1&b=2"});</script>
            <script type="application/ld+json">{"image":"https://scontent.xx.fbcdn.net/v/ld.webp"}</script>
        </body></html>"#;

        assert_eq!(
            discover(markup),
            vec![
                "https://scontent.xx.fbcdn.net/v/1_2_3_n.jpg",
                "https://scontent.xx.fbcdn.net/v/lazy.jpg",
                "https://scontent.xx.fbcdn.net/v/bg.jpg",
                "https://external.xx.fbcdn.net/v/styled.png",
                "https://scontent.xx.fbcdn.net/v/script.jpg?a=1&b=2",
                "https://scontent.xx.fbcdn.net/v/ld.webp",
            ]
        );
    }

    #[test]
    fn test_duplicates_keep_first_position() {
        let markup = r#"<img src="https://scontent.xx.fbcdn.net/v/a.jpg">
            <script>var a = "https://scontent.xx.fbcdn.net/v/a.jpg";</script>"#;
        assert_eq!(discover(markup), vec!["https://scontent.xx.fbcdn.net/v/a.jpg"]);
    }

    #[test]
    fn test_annotated_source_wins_over_src() {
        let markup = r#"<img src="data:image/gif;base64,R0lGOD" data-fbz-src="https://scontent.xx.fbcdn.net/v/real.jpg">"#;
        assert_eq!(discover(markup), vec!["https://scontent.xx.fbcdn.net/v/real.jpg"]);
    }

    #[test]
    fn test_page_without_assets() {
        assert!(discover("<html><body><p>nothing</p></body></html>").is_empty());
    }
}
