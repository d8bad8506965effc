use crate::miner::dom::{BACKGROUND_ATTR, LOCATION_ATTR, RECT_ATTR, SOURCE_ATTR, VIEWPORT_ATTR};

/// In-page scripts used by the orchestrator.
///
/// The snapshot script is the only one that returns page content: it writes
/// rendered geometry, computed backgrounds and resolved image sources onto
/// the elements as attributes, then returns the serialized document. Mining
/// happens on that string, outside the browser.
pub struct PageScripts;

impl PageScripts {
    /// Annotate every element and return `documentElement.outerHTML`.
    pub fn snapshot() -> String {
        format!(
            r#"
            (() => {{
                const root = document.documentElement;
                root.setAttribute('{LOCATION_ATTR}', location.href);
                root.setAttribute('{VIEWPORT_ATTR}', String(window.innerHeight));

                for (const el of document.querySelectorAll('body *')) {{
                    const r = el.getBoundingClientRect();
                    el.setAttribute('{RECT_ATTR}',
                        [r.left, r.top, r.width, r.height].map(v => Math.round(v)).join(','));

                    const bg = getComputedStyle(el).backgroundImage;
                    if (bg && bg !== 'none') {{
                        el.setAttribute('{BACKGROUND_ATTR}', bg);
                    }}

                    const tag = el.tagName.toLowerCase();
                    if (tag === 'img' && el.currentSrc) {{
                        el.setAttribute('{SOURCE_ATTR}', el.currentSrc);
                    }} else if (tag === 'image') {{
                        const href = el.href && el.href.baseVal
                            ? el.href.baseVal
                            : el.getAttribute('xlink:href');
                        if (href) {{
                            el.setAttribute('{SOURCE_ATTR}', href);
                        }}
                    }}
                }}

                return root.outerHTML;
            }})()
            "#
        )
    }

    /// Document fully loaded and every image decoded.
    pub fn readiness() -> &'static str {
        r#"
        (() => document.readyState === 'complete'
            && Array.from(document.images).every(img => img.complete))()
        "#
    }

    pub fn scroll_to_bottom() -> &'static str {
        "window.scrollTo(0, document.body ? document.body.scrollHeight : 0); true"
    }

    pub fn scroll_to_top() -> &'static str {
        "window.scrollTo(0, 0); true"
    }

    /// Image count and document height. Changes when lazy content lands.
    pub fn content_size() -> &'static str {
        "`${document.images.length}:${document.documentElement.scrollHeight}`"
    }

    /// Whether `selector` matches anything. Invalid selectors count as absent.
    pub fn element_exists(selector: &str) -> String {
        let literal = js_string(selector);
        format!(
            r#"
            (() => {{
                try {{
                    return document.querySelector({literal}) !== null;
                }} catch (e) {{
                    return false;
                }}
            }})()
            "#
        )
    }
}

/// Quote `value` as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}
