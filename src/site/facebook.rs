use regex::Regex;
use scraper::Selector;
use url::Url;

use crate::miner::{MiningRules, ScopedSelector};
use crate::session::InteractionRules;
use crate::site::{AssetFilter, SiteAdapter};
use crate::synth::SynthesisRules;

const ASSET_DOMAIN: &str = "fbcdn.net";
const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".png", ".webp"];

/// Path markers of the CDN's profile-picture asset types.
const PROFILE_PICTURE_MARKERS: &[&str] = &["/t39.30808-1/", "/t1.6435-1/", "/t1.0-1/"];

const IMAGE_REQUEST_HEADERS: &[(&str, &str)] = &[
    ("Accept", "image/webp,image/apng,image/*,*/*;q=0.8"),
    ("Accept-Language", "en-US,en;q=0.9"),
    ("Cache-Control", "no-cache"),
    ("Pragma", "no-cache"),
    ("Sec-Fetch-Dest", "image"),
    ("Sec-Fetch-Mode", "no-cors"),
    ("Sec-Fetch-Site", "cross-site"),
];

/// Adapter for facebook.com pages and the fbcdn.net asset CDN.
pub struct FacebookAdapter {
    asset_filter: AssetFilter,
    synthesis: SynthesisRules,
    mining: MiningRules,
    interaction: InteractionRules,
    original_quality: Regex,
}

impl Default for FacebookAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FacebookAdapter {
    pub fn new() -> Self {
        Self {
            asset_filter: AssetFilter::new(ASSET_DOMAIN, IMAGE_EXTENSIONS),
            synthesis: synthesis_rules(),
            mining: mining_rules(),
            interaction: interaction_rules(),
            original_quality: pattern(r"(?i)_o\.(?:jpe?g|png|webp)$"),
        }
    }
}

impl SiteAdapter for FacebookAdapter {
    fn name(&self) -> &str {
        "facebook"
    }

    fn asset_filter(&self) -> &AssetFilter {
        &self.asset_filter
    }

    fn synthesis_rules(&self) -> &SynthesisRules {
        &self.synthesis
    }

    fn mining_rules(&self) -> &MiningRules {
        &self.mining
    }

    fn interaction_rules(&self) -> &InteractionRules {
        &self.interaction
    }

    fn image_request_headers(&self) -> &[(&'static str, &'static str)] {
        IMAGE_REQUEST_HEADERS
    }

    fn is_alternate_layout(&self, page_url: &str) -> bool {
        page_url.contains("/share/v/")
    }

    fn content_id(&self, page_url: &Url) -> Option<String> {
        if page_url.path().starts_with("/watch") {
            if let Some((_, v)) = page_url.query_pairs().find(|(k, _)| k == "v") {
                return Some(v.into_owned()).filter(|v| !v.is_empty());
            }
        }

        let segments: Vec<&str> = page_url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        if let Some(pos) = segments.windows(2).position(|w| w == ["share", "v"]) {
            return segments.get(pos + 2).map(|s| s.to_string());
        }

        segments.last().map(|s| s.to_string())
    }

    fn is_original_quality(&self, asset_url: &str) -> bool {
        let path = Url::parse(asset_url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| asset_url.to_string());
        self.original_quality.is_match(&path)
    }

    fn is_profile_picture(&self, asset_url: &str) -> bool {
        self.asset_filter.is_asset_host(asset_url)
            && PROFILE_PICTURE_MARKERS.iter().any(|m| asset_url.contains(m))
    }

    fn graph_photo_id(&self, page_url: &Url) -> Option<String> {
        page_url
            .query_pairs()
            .find(|(k, _)| k == "fbid")
            .map(|(_, v)| v.into_owned())
            .filter(|v| v.chars().all(|c| c.is_ascii_digit()) && !v.is_empty())
    }
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("built-in pattern must compile")
}

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("built-in selector must parse")
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn synthesis_rules() -> SynthesisRules {
    SynthesisRules {
        identifier_patterns: vec![
            pattern(r"^(?P<id>\d+_\d+_\d+_\d+)(?:_[a-z])?\.(?P<ext>jpg|png|webp)$"),
            pattern(r"^(?P<id>\d+_\d+_\d+)(?:_[a-z])?\.(?P<ext>jpg|png|webp)$"),
            pattern(r"^(?P<id>\d{6,})(?:_[a-z])?\.(?P<ext>jpg|png|webp)$"),
        ],
        quality_suffixes: strings(&["_o", "_b", "_n", "_t"]),
        resolution_prefixes: strings(&["p2048x2048", "p1080x1080", "p960x960", "p720x720"]),
        size_segment: pattern(r"^[ps]\d+x\d+$"),
        edge_host_prefix: "scontent".to_string(),
        sibling_host_labels: strings(&["scontent", "scontent-lax3-1", "external"]),
    }
}

fn mining_rules() -> MiningRules {
    let domain = regex::escape(ASSET_DOMAIN);
    MiningRules {
        lazy_source_attributes: strings(&["data-src", "data-original", "data-lazy-src"]),
        script_asset_pattern: pattern(&format!(
            r#"https://[^"'\s<>\\]*{domain}[^"'\s<>\\]*?\.(?:jpg|png|webp)(?:\?[^"'\s<>\\]*)?"#
        )),
        creator_heading: css("h2 a"),
        creator_alternate: css(r#"a[role="link"] > span > span"#),
        creator_excluded_words: strings(&["Share", "Like"]),
        creator_suffix_separator: '·',
        avatar_size_px: 30.0..=100.0,
        thumbnail_marker: "x1y1".to_string(),
        profile_image_selectors: vec![
            css("svg.x3ajldb image"),
            css("svg.xzg4506 image"),
            css(".x1rg5ohu image"),
            css(".x10l6tqk .x17qophe image"),
            css(r#"a[role="link"] svg image"#),
            css(r#"a[aria-label*="profile"] image"#),
        ],
        avatar_class_markers: strings(&["avatar", "profile", "user", "photo"]),
        main_container: css(r#"div[role="article"]"#),
        description_selectors: vec![
            ScopedSelector::always(css(r#"div[data-ad-preview="message"]"#)),
            ScopedSelector::always(css(r#"div[data-ad-comet-preview="message"]"#)),
            ScopedSelector::always(css(".x1iorvi4.x1pi30zi.x1l90r2v.x1swvt13")),
            ScopedSelector::always(css(".xdj266r.x11i5rnm.xat24cr.x1mh8g0r.x1vvkbs")),
            ScopedSelector::alternate_only(css(".x78zum5.x1qughib")),
            ScopedSelector::always(css(".userContent")),
            ScopedSelector::always(css("._5pbx")),
        ],
        ui_vocabulary: pattern(
            r"(Like|Comment|Share|Follow|views|reactions|ago|yesterday|Home|Live|Reels)",
        ),
        see_more_marker: "See more".to_string(),
        plays_patterns: vec![
            pattern(r"(?i)\d[\d,.]*\s*[KMB]?\s*(?:plays|views)"),
            pattern(r"(?i)\d[\d,.]*\s*[KMB]?\s*watch(?:es)?"),
        ],
        comments_patterns: vec![
            pattern(r"(?i)\d[\d,.]*\s*[KMB]?\s*comments?"),
            pattern(r"(?i)\d[\d,.]*\s*[KMB]?\s*repl(?:y|ies)"),
        ],
        followers_patterns: vec![pattern(r"(?i)\d[\d,.]*\s*[KMB]?\s*followers")],
        reaction_keywords: strings(&[
            "reaction", "like", "love", "care", "haha", "wow", "sad", "angry",
        ]),
        count_token: pattern(r"\d[\d,.]*[KMB]?"),
        duration_pattern: pattern(r"\d{1,2}:\d{2}\s*/\s*(\d{1,2}:\d{2}(?::\d{2})?)"),
        permalink_markers: strings(&["/posts/", "?v=", "/videos/"]),
        date_vocabulary: pattern(
            r"(?i)\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)[a-z]*\b|\b\d+\s*(?:s|m|h|d|w|y|mins?|hrs?)\b|\byesterday\b|\bnow\b",
        ),
    }
}

fn interaction_rules() -> InteractionRules {
    InteractionRules {
        popup_close: r#"[aria-label="Close"]"#.to_string(),
        video_ready_marker: "h2 a".to_string(),
        photo_expand: strings(&[
            r#"img[data-visualcompletion="media-vc-image"]"#,
            r#"img[style*="cursor: pointer"]"#,
            r#"img[width="500"], img[height="500"]"#,
            r#"img[src*="fbcdn.net"]:not([width="16"]):not([height="16"])"#,
        ]),
        profile_expand: strings(&[
            r#"svg[aria-label*="profile picture"]"#,
            r#"a[aria-label*="profile picture"]"#,
            r#"div[data-pagelet="ProfileActions"] ~ div svg image"#,
        ]),
    }
}
