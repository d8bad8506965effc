use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::miner::MineError;

/// Rendered bounding box written by the in-page snapshot script.
pub const RECT_ATTR: &str = "data-fbz-rect";
/// Computed `background-image`, present only when it is not `none`.
pub const BACKGROUND_ATTR: &str = "data-fbz-bg";
/// Resolved source of `img` / SVG `image` elements.
pub const SOURCE_ATTR: &str = "data-fbz-src";
/// `location.href` at snapshot time, on the root element.
pub const LOCATION_ATTR: &str = "data-fbz-href";
/// `window.innerHeight` at snapshot time, on the root element.
pub const VIEWPORT_ATTR: &str = "data-fbz-vh";

const DEFAULT_VIEWPORT_HEIGHT: f64 = 1080.0;

/// Tags whose text never counts as visible page text.
const HIDDEN_TEXT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Read-only view over a serialized, annotated page.
pub struct DomView {
    html: Html,
    page_url: String,
    viewport_height: f64,
}

impl DomView {
    /// Parse a snapshot. `fallback_url` is used when the snapshot carries no
    /// location annotation.
    pub fn parse(markup: &str, fallback_url: &str) -> Self {
        let html = Html::parse_document(markup);
        let root = html.root_element();

        let page_url = root
            .value()
            .attr(LOCATION_ATTR)
            .filter(|href| !href.is_empty())
            .unwrap_or(fallback_url)
            .to_string();

        let viewport_height = root
            .value()
            .attr(VIEWPORT_ATTR)
            .and_then(|vh| vh.parse::<f64>().ok())
            .filter(|vh| *vh > 0.0)
            .unwrap_or(DEFAULT_VIEWPORT_HEIGHT);

        Self {
            html,
            page_url,
            viewport_height,
        }
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    pub fn select<'a, 'b>(&'a self, selector: &'b Selector) -> scraper::html::Select<'a, 'b> {
        self.html.select(selector)
    }

    pub fn first<'a>(&'a self, selector: &Selector) -> Option<ElementRef<'a>> {
        self.html.select(selector).next()
    }

    /// `content` of the first element matching `selector`, trimmed.
    pub fn meta_content(&self, selector: &Selector) -> Option<String> {
        self.first(selector)
            .and_then(|el| el.value().attr("content"))
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
    }
}

/// Attribute lookup by local name, so `xlink:href` is found as `href`.
pub fn attr_local<'a>(el: ElementRef<'a>, local: &str) -> Option<&'a str> {
    el.value()
        .attrs()
        .find(|(name, _)| *name == local)
        .map(|(_, value)| value)
}

/// Resolved image source of an `img` or SVG `image` element.
pub fn image_source<'a>(el: ElementRef<'a>) -> Option<&'a str> {
    el.value()
        .attr(SOURCE_ATTR)
        .or_else(|| el.value().attr("src"))
        .or_else(|| attr_local(el, "href"))
        .filter(|src| !src.is_empty())
}

/// Rendered box of an element.
///
/// Falls back to `width`/`height` attributes (top-left origin) when the
/// element was never annotated; `None` when neither is available.
pub fn rect(el: ElementRef<'_>) -> Result<Option<Rect>, MineError> {
    if let Some(raw) = el.value().attr(RECT_ATTR) {
        let parts: Vec<f64> = raw
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| MineError::Snapshot(format!("bad {} value '{}'", RECT_ATTR, raw)))?;
        let [left, top, width, height] = parts[..] else {
            return Err(MineError::Snapshot(format!(
                "{} expects 4 values, got '{}'",
                RECT_ATTR, raw
            )));
        };
        return Ok(Some(Rect {
            left,
            top,
            width,
            height,
        }));
    }

    let dim = |name: &str| {
        el.value()
            .attr(name)
            .and_then(|v| v.trim_end_matches("px").parse::<f64>().ok())
    };
    Ok(match (dim("width"), dim("height")) {
        (Some(width), Some(height)) => Some(Rect {
            left: 0.0,
            top: 0.0,
            width,
            height,
        }),
        _ => None,
    })
}

/// Element has no element children.
pub fn is_leaf(el: ElementRef<'_>) -> bool {
    el.children().all(|child| !child.value().is_element())
}

pub fn child_element_count(el: ElementRef<'_>) -> usize {
    el.children().filter(|child| child.value().is_element()).count()
}

/// `el` or one of its ancestors matches `selector`.
pub fn closest_matches(el: ElementRef<'_>, selector: &Selector) -> bool {
    if selector.matches(&el) {
        return true;
    }
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| selector.matches(&ancestor))
}

fn is_hidden_container(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| HIDDEN_TEXT_TAGS.contains(&e.name()))
}

/// Visible text with whitespace collapsed to single spaces.
pub fn inner_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        if let Node::Text(text) = node.value() {
            if !node.ancestors().any(|a| is_hidden_container(a.value())) {
                raw.push_str(text);
            }
        }
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text with emoji images and labelled emoji spans inlined as their
/// alt / label text, in document order. Line structure is kept, blank lines
/// are dropped.
pub fn text_with_emojis(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => {
                if !node.ancestors().any(|a| is_hidden_container(a.value())) {
                    raw.push_str(text);
                }
            }
            Node::Element(element) => {
                if element.name() == "br" {
                    raw.push('\n');
                } else if element.name() == "img" {
                    if let Some(alt) = element.attr("alt") {
                        raw.push_str(alt);
                    }
                } else if element.attr("role") == Some("img") {
                    if let Some(label) = element.attr("aria-label") {
                        raw.push_str(label);
                    }
                }
            }
            _ => {}
        }
    }

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
