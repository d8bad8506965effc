//! Per-field metadata strategies.
//!
//! Each function here is a [`StrategyFn`](crate::miner::StrategyFn). They
//! read the snapshot, never mutate it, and return `Ok(None)` when their
//! signal is absent.

use scraper::{ElementRef, Selector};

use crate::miner::dom::{
    child_element_count, closest_matches, image_source, inner_text, is_leaf, rect,
    text_with_emojis, DomView, Rect,
};
use crate::miner::strategy::{MineContext, MineError, Strategy};

type Found = Result<Option<String>, MineError>;

fn sel(source: &str) -> Result<Selector, MineError> {
    Selector::parse(source)
        .map_err(|e| MineError::Strategy(format!("invalid selector '{}': {:?}", source, e)))
}

fn strip_creator_suffix(text: &str, separator: char) -> String {
    text.split(separator).next().unwrap_or_default().trim().to_string()
}

fn strip_see_more(text: &str, marker: &str) -> String {
    let trimmed = text.trim_end();
    match trimmed.strip_suffix(marker) {
        Some(rest) => rest
            .trim_end()
            .trim_end_matches('…')
            .trim_end_matches("...")
            .trim_end()
            .to_string(),
        None => trimmed.to_string(),
    }
}

/// Asset-host source of an image element.
fn asset_source(el: ElementRef<'_>, ctx: &MineContext<'_>) -> Option<String> {
    image_source(el)
        .filter(|src| ctx.assets.is_asset_host(src))
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// creator

pub fn creator_heading(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let rules = ctx.rules;
    Ok(view
        .first(&rules.creator_heading)
        .map(|el| strip_creator_suffix(&inner_text(el), rules.creator_suffix_separator))
        .filter(|name| !name.is_empty()))
}

pub fn creator_alternate_layout(view: &DomView, ctx: &MineContext<'_>) -> Found {
    if !ctx.alternate_layout {
        return Ok(None);
    }
    let rules = ctx.rules;
    Ok(view
        .select(&rules.creator_alternate)
        .map(inner_text)
        .find(|text| {
            text.chars().count() > 1
                && !rules
                    .creator_excluded_words
                    .iter()
                    .any(|w| text.contains(w.as_str()))
        })
        .map(|text| strip_creator_suffix(&text, rules.creator_suffix_separator)))
}

// ---------------------------------------------------------------------------
// creator logo

pub fn logo_svg_image(view: &DomView, ctx: &MineContext<'_>) -> Found {
    Ok(view
        .select(&sel("svg image")?)
        .find_map(|el| asset_source(el, ctx)))
}

pub fn logo_square_avatar(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let rules = ctx.rules;
    for img in view.select(&sel("img")?) {
        let Some(src) = asset_source(img, ctx) else {
            continue;
        };
        if src.contains(rules.thumbnail_marker.as_str()) {
            continue;
        }
        let Some(r) = rect(img)? else {
            continue;
        };
        if (r.width - r.height).abs() < 1.0 && rules.avatar_size_px.contains(&r.width) {
            return Ok(Some(src));
        }
    }
    Ok(None)
}

pub fn logo_profile_selectors(view: &DomView, ctx: &MineContext<'_>) -> Found {
    Ok(ctx
        .rules
        .profile_image_selectors
        .iter()
        .find_map(|s| view.select(s).find_map(|el| asset_source(el, ctx))))
}

pub fn logo_upper_viewport(view: &DomView, ctx: &MineContext<'_>) -> Found {
    if !ctx.alternate_layout {
        return Ok(None);
    }
    let fold = view.viewport_height() / 2.0;
    let mut visible: Vec<(Rect, ElementRef<'_>)> = Vec::new();
    for el in view.select(&sel("img, image")?) {
        let Some(r) = rect(el)? else {
            continue;
        };
        if r.width >= 20.0 && r.height >= 20.0 && r.top < fold && r.top + r.height > 0.0 {
            visible.push((r, el));
        }
    }
    visible.sort_by(|a, b| b.0.area().total_cmp(&a.0.area()));
    Ok(visible.into_iter().find_map(|(_, el)| asset_source(el, ctx)))
}

pub fn logo_avatar_class(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let images = sel("img, image")?;
    for el in view.select(&sel("[class]")?) {
        let class = el.value().attr("class").unwrap_or_default().to_lowercase();
        if !ctx
            .rules
            .avatar_class_markers
            .iter()
            .any(|m| class.contains(m.as_str()))
        {
            continue;
        }
        if let Some(src) = el.select(&images).find_map(|img| asset_source(img, ctx)) {
            return Ok(Some(src));
        }
    }
    Ok(None)
}

pub fn logo_any_sized_image(view: &DomView, ctx: &MineContext<'_>) -> Found {
    for el in view.select(&sel("img, image")?) {
        let Some(src) = asset_source(el, ctx) else {
            continue;
        };
        if let Some(r) = rect(el)? {
            if r.width > 30.0 && r.height > 30.0 {
                return Ok(Some(src));
            }
        }
    }
    Ok(None)
}

pub fn logo_article_image(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let Some(article) = view.first(&ctx.rules.main_container) else {
        return Ok(None);
    };
    for el in article.select(&sel("img, image")?) {
        let Some(src) = asset_source(el, ctx) else {
            continue;
        };
        match rect(el)? {
            Some(r) if r.width <= r.height * 1.2 => return Ok(Some(src)),
            _ => {}
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// description

pub fn description_meta(view: &DomView, _ctx: &MineContext<'_>) -> Found {
    Ok(view.meta_content(&sel(r#"meta[property="og:description"]"#)?))
}

pub fn description_layout(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let rules = ctx.rules;
    let scope = match view.first(&rules.main_container) {
        Some(article) => article,
        None => view.first(&sel("body")?).unwrap_or_else(|| view.root()),
    };

    for scoped in &rules.description_selectors {
        if !scoped.applies(ctx.alternate_layout) {
            continue;
        }
        for el in scope.select(&scoped.selector) {
            let text = strip_see_more(&text_with_emojis(el), &rules.see_more_marker);
            if text.chars().count() <= 1 {
                continue;
            }
            if let Some(creator) = &ctx.creator {
                if text.to_lowercase() == creator.to_lowercase() {
                    continue;
                }
            }
            return Ok(Some(text));
        }
    }
    Ok(None)
}

pub fn description_longest_span(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let rules = ctx.rules;
    let interactive = sel(r#"a, [role="button"]"#)?;
    let mut best: Option<String> = None;

    for span in view.select(&sel("span")?) {
        if child_element_count(span) > 5 || closest_matches(span, &interactive) {
            continue;
        }
        let text = strip_see_more(&text_with_emojis(span), &rules.see_more_marker);
        if text.chars().count() < 10 || rules.ui_vocabulary.is_match(&text) {
            continue;
        }
        let longer = best
            .as_ref()
            .map_or(true, |b| text.chars().count() > b.chars().count());
        if longer {
            best = Some(text);
        }
    }
    Ok(best)
}

// ---------------------------------------------------------------------------
// thumbnail

pub fn thumbnail_meta(view: &DomView, _ctx: &MineContext<'_>) -> Found {
    Ok(view.meta_content(&sel(r#"meta[property="og:image"]"#)?))
}

pub fn thumbnail_video_poster(view: &DomView, _ctx: &MineContext<'_>) -> Found {
    Ok(view
        .first(&sel("video[poster]")?)
        .and_then(|v| v.value().attr("poster"))
        .map(|p| p.trim().to_string()))
}

// ---------------------------------------------------------------------------
// counters

fn leaf_text_scan(view: &DomView, patterns: &[regex::Regex]) -> Found {
    let candidates = sel("span, div")?;
    let leaves: Vec<String> = view
        .select(&candidates)
        .filter(|el| is_leaf(*el))
        .map(inner_text)
        .filter(|t| !t.is_empty())
        .collect();

    Ok(patterns.iter().find_map(|pattern| {
        leaves
            .iter()
            .find_map(|text| pattern.find(text).map(|m| m.as_str().trim().to_string()))
    }))
}

pub fn plays_leaf_text(view: &DomView, ctx: &MineContext<'_>) -> Found {
    leaf_text_scan(view, &ctx.rules.plays_patterns)
}

pub fn comments_leaf_text(view: &DomView, ctx: &MineContext<'_>) -> Found {
    leaf_text_scan(view, &ctx.rules.comments_patterns)
}

pub fn followers_leaf_text(view: &DomView, ctx: &MineContext<'_>) -> Found {
    leaf_text_scan(view, &ctx.rules.followers_patterns)
}

pub fn likes_reaction_label(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let rules = ctx.rules;
    for el in view.select(&sel("span[aria-label], div[aria-label]")?) {
        let label = el.value().attr("aria-label").unwrap_or_default();
        let lower = label.to_lowercase();
        if !rules
            .reaction_keywords
            .iter()
            .any(|k| lower.contains(k.as_str()))
        {
            continue;
        }
        if let Some(m) = rules.count_token.find(label) {
            return Ok(Some(m.as_str().to_string()));
        }
    }
    Ok(None)
}

// ---------------------------------------------------------------------------
// duration / upload date

pub fn duration_player_text(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let text = inner_text(view.root());
    Ok(ctx
        .rules
        .duration_pattern
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string()))
}

pub fn uploaded_permalink(view: &DomView, ctx: &MineContext<'_>) -> Found {
    let rules = ctx.rules;
    for anchor in view.select(&sel("a[href]")?) {
        let href = anchor.value().attr("href").unwrap_or_default();
        if !rules.permalink_markers.iter().any(|m| href.contains(m.as_str())) {
            continue;
        }
        let text = inner_text(anchor);
        if !text.is_empty() && rules.date_vocabulary.is_match(&text) {
            return Ok(Some(text));
        }
    }
    Ok(None)
}

/// Ordered strategy lists, one per metadata field.
#[derive(Debug, Clone)]
pub struct FieldStrategies {
    pub creator: Vec<Strategy>,
    pub creator_logo: Vec<Strategy>,
    pub description: Vec<Strategy>,
    pub thumbnail: Vec<Strategy>,
    pub plays: Vec<Strategy>,
    pub comments: Vec<Strategy>,
    pub followers: Vec<Strategy>,
    pub likes: Vec<Strategy>,
    pub duration: Vec<Strategy>,
    pub uploaded_date: Vec<Strategy>,
}

impl Default for FieldStrategies {
    fn default() -> Self {
        Self {
            creator: vec![
                Strategy::new("creator_heading", creator_heading),
                Strategy::new("creator_alternate_layout", creator_alternate_layout),
            ],
            creator_logo: vec![
                Strategy::new("logo_svg_image", logo_svg_image),
                Strategy::new("logo_square_avatar", logo_square_avatar),
                Strategy::new("logo_profile_selectors", logo_profile_selectors),
                Strategy::new("logo_upper_viewport", logo_upper_viewport),
                Strategy::new("logo_avatar_class", logo_avatar_class),
                Strategy::new("logo_any_sized_image", logo_any_sized_image),
                Strategy::new("logo_article_image", logo_article_image),
            ],
            description: vec![
                Strategy::new("description_meta", description_meta),
                Strategy::new("description_layout", description_layout),
                Strategy::new("description_longest_span", description_longest_span),
            ],
            thumbnail: vec![
                Strategy::new("thumbnail_meta", thumbnail_meta),
                Strategy::new("thumbnail_video_poster", thumbnail_video_poster),
            ],
            plays: vec![Strategy::new("plays_leaf_text", plays_leaf_text)],
            comments: vec![Strategy::new("comments_leaf_text", comments_leaf_text)],
            followers: vec![Strategy::new("followers_leaf_text", followers_leaf_text)],
            likes: vec![Strategy::new("likes_reaction_label", likes_reaction_label)],
            duration: vec![Strategy::new("duration_player_text", duration_player_text)],
            uploaded_date: vec![Strategy::new("uploaded_permalink", uploaded_permalink)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{FacebookAdapter, SiteAdapter};

    fn check(
        strategy: fn(&DomView, &MineContext<'_>) -> Found,
        markup: &str,
        page_url: &str,
        creator: Option<&str>,
    ) -> Option<String> {
        let adapter = FacebookAdapter::new();
        let view = DomView::parse(markup, page_url);
        let ctx = MineContext {
            rules: adapter.mining_rules(),
            assets: adapter.asset_filter(),
            alternate_layout: adapter.is_alternate_layout(view.page_url()),
            creator: creator.map(str::to_string),
        };
        strategy(&view, &ctx).unwrap()
    }

    const WATCH: &str = "https://www.facebook.com/watch?v=1";
    const SHARE: &str = "https://www.facebook.com/share/v/abc/";

    #[test]
    fn test_creator_heading_strips_suffix() {
        let markup = r#"<h2><a href="/jane">Jane Doe · Follow</a></h2>"#;
        assert_eq!(check(creator_heading, markup, WATCH, None), Some("Jane Doe".into()));
    }

    #[test]
    fn test_creator_alternate_only_on_share_layout() {
        let markup = r#"<a role="link"><span><span>Share</span></span></a>
            <a role="link"><span><span>X</span></span></a>
            <a role="link"><span><span>Studio Ghibli</span></span></a>"#;
        assert_eq!(check(creator_alternate_layout, markup, WATCH, None), None);
        assert_eq!(
            check(creator_alternate_layout, markup, SHARE, None),
            Some("Studio Ghibli".into())
        );
    }

    #[test]
    fn test_logo_square_avatar_bounds() {
        let markup = r#"
            <img src="https://scontent.xx.fbcdn.net/v/big.jpg" data-fbz-rect="0,0,400,400">
            <img src="https://scontent.xx.fbcdn.net/v/x1y1/thumb.jpg" data-fbz-rect="0,0,40,40">
            <img src="https://www.facebook.com/avatar.jpg" data-fbz-rect="0,0,40,40">
            <img src="https://scontent.xx.fbcdn.net/v/avatar.jpg" data-fbz-rect="0,0,40,40">"#;
        assert_eq!(
            check(logo_square_avatar, markup, WATCH, None),
            Some("https://scontent.xx.fbcdn.net/v/avatar.jpg".into())
        );
    }

    #[test]
    fn test_logo_upper_viewport_prefers_largest() {
        let markup = r#"<html data-fbz-vh="1000"><body>
            <img src="https://scontent.xx.fbcdn.net/v/small.jpg" data-fbz-rect="0,10,40,40">
            <img src="https://scontent.xx.fbcdn.net/v/large.jpg" data-fbz-rect="0,100,80,80">
            <img src="https://scontent.xx.fbcdn.net/v/below.jpg" data-fbz-rect="0,800,300,300">
        </body></html>"#;
        assert_eq!(
            check(logo_upper_viewport, markup, SHARE, None),
            Some("https://scontent.xx.fbcdn.net/v/large.jpg".into())
        );
        assert_eq!(check(logo_upper_viewport, markup, WATCH, None), None);
    }

    #[test]
    fn test_logo_article_skips_wide_images() {
        let markup = r#"<div role="article">
            <img src="https://scontent.xx.fbcdn.net/v/banner.jpg" data-fbz-rect="0,0,600,200">
            <img src="https://scontent.xx.fbcdn.net/v/face.jpg" data-fbz-rect="0,0,50,48">
        </div>"#;
        assert_eq!(
            check(logo_article_image, markup, WATCH, None),
            Some("https://scontent.xx.fbcdn.net/v/face.jpg".into())
        );
    }

    #[test]
    fn test_logo_malformed_rect_is_reported() {
        let adapter = FacebookAdapter::new();
        let view = DomView::parse(
            r#"<img src="https://scontent.xx.fbcdn.net/v/a.jpg" data-fbz-rect="broken">"#,
            WATCH,
        );
        let ctx = MineContext {
            rules: adapter.mining_rules(),
            assets: adapter.asset_filter(),
            alternate_layout: false,
            creator: None,
        };
        assert!(logo_any_sized_image(&view, &ctx).is_err());
    }

    #[test]
    fn test_description_layout_skips_creator_text() {
        let markup = r#"<div role="article">
            <div data-ad-preview="message">Jane Doe</div>
            <div data-ad-preview="message">Sunset over the bay <img alt="🌅"> … See more</div>
        </div>"#;
        assert_eq!(
            check(description_layout, markup, WATCH, Some("jane doe")),
            Some("Sunset over the bay 🌅".into())
        );
    }

    #[test]
    fn test_description_alternate_selector_scoped_to_share_layout() {
        let markup = r#"<div class="x78zum5 x1qughib">Only on share links</div>"#;
        assert_eq!(check(description_layout, markup, WATCH, None), None);
        assert_eq!(
            check(description_layout, markup, SHARE, None),
            Some("Only on share links".into())
        );
    }

    #[test]
    fn test_description_longest_span() {
        let markup = r#"<body>
            <span>Short</span>
            <span>A quiet morning by the lake.</span>
            <span>12K views and counting along</span>
            <a href="/x"><span>This link text is much longer than everything else</span></a>
            <span>An even longer caption about the lake at dawn.</span>
            <span>Another caption of the exact same len...</span>
        </body>"#;
        assert_eq!(
            check(description_longest_span, markup, WATCH, None),
            Some("An even longer caption about the lake at dawn.".into())
        );
    }

    #[test]
    fn test_thumbnail_falls_back_to_poster() {
        let markup = r#"<video poster="https://scontent.xx.fbcdn.net/v/poster.jpg"></video>"#;
        assert_eq!(check(thumbnail_meta, markup, WATCH, None), None);
        assert_eq!(
            check(thumbnail_video_poster, markup, WATCH, None),
            Some("https://scontent.xx.fbcdn.net/v/poster.jpg".into())
        );
    }

    #[test]
    fn test_counters() {
        let markup = r#"<div>
            <span>1.2K views</span>
            <div><span>34 comments</span></div>
            <span>5.6M followers</span>
            <div aria-label="Like: 845 people"></div>
            <span>0:12 / 3:45</span>
        </div>"#;
        assert_eq!(check(plays_leaf_text, markup, WATCH, None), Some("1.2K views".into()));
        assert_eq!(check(comments_leaf_text, markup, WATCH, None), Some("34 comments".into()));
        assert_eq!(check(followers_leaf_text, markup, WATCH, None), Some("5.6M followers".into()));
        assert_eq!(check(likes_reaction_label, markup, WATCH, None), Some("845".into()));
        assert_eq!(check(duration_player_text, markup, WATCH, None), Some("3:45".into()));
    }

    #[test]
    fn test_plays_prefers_views_over_watches() {
        let markup = r#"<span>3 watches</span><span>99 views</span>"#;
        assert_eq!(check(plays_leaf_text, markup, WATCH, None), Some("99 views".into()));
    }

    #[test]
    fn test_uploaded_permalink() {
        let markup = r#"<a href="/jane/videos/1/">Watch again</a>
            <a href="/jane/videos/1/">3h</a>"#;
        assert_eq!(check(uploaded_permalink, markup, WATCH, None), Some("3h".into()));
    }

    #[test]
    fn test_strip_see_more() {
        assert_eq!(strip_see_more("Hello world... See more", "See more"), "Hello world");
        assert_eq!(strip_see_more("Hello world", "See more"), "Hello world");
    }
}
