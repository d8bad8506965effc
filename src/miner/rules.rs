use std::ops::RangeInclusive;

use regex::Regex;
use scraper::Selector;

/// A selector that may only apply to the alternate page layout.
#[derive(Debug, Clone)]
pub struct ScopedSelector {
    pub selector: Selector,
    pub alternate_only: bool,
}

impl ScopedSelector {
    pub fn always(selector: Selector) -> Self {
        Self {
            selector,
            alternate_only: false,
        }
    }

    pub fn alternate_only(selector: Selector) -> Self {
        Self {
            selector,
            alternate_only: true,
        }
    }

    pub fn applies(&self, alternate_layout: bool) -> bool {
        alternate_layout || !self.alternate_only
    }
}

/// Markup knowledge the mining strategies run against.
#[derive(Debug, Clone)]
pub struct MiningRules {
    /// Lazy-load attributes checked on `img` besides the primary source.
    pub lazy_source_attributes: Vec<String>,
    /// Matches asset URLs inside script bodies.
    pub script_asset_pattern: Regex,

    pub creator_heading: Selector,
    pub creator_alternate: Selector,
    /// Link labels that are UI actions, never a creator name.
    pub creator_excluded_words: Vec<String>,
    /// Everything after this separator in a creator name is metadata.
    pub creator_suffix_separator: char,

    /// Rendered edge length of a plausible avatar, in CSS pixels.
    pub avatar_size_px: RangeInclusive<f64>,
    /// Substring that marks a cropped thumbnail rather than an avatar.
    pub thumbnail_marker: String,
    pub profile_image_selectors: Vec<Selector>,
    pub avatar_class_markers: Vec<String>,

    pub main_container: Selector,
    pub description_selectors: Vec<ScopedSelector>,
    /// Text matching this is UI chrome, not a description.
    pub ui_vocabulary: Regex,
    pub see_more_marker: String,

    pub plays_patterns: Vec<Regex>,
    pub comments_patterns: Vec<Regex>,
    pub followers_patterns: Vec<Regex>,
    pub reaction_keywords: Vec<String>,
    pub count_token: Regex,
    /// `current / total`; group 1 is the total.
    pub duration_pattern: Regex,
    pub permalink_markers: Vec<String>,
    pub date_vocabulary: Regex,
}
