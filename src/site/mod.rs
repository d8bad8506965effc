//! Site adapters.
//!
//! Every selector, regex, host rule and UI vocabulary that depends on the
//! target site's markup lives behind [`SiteAdapter`], so the pipeline
//! (interception → mining → synthesis → validation) stays generic while the
//! adapter tracks markup changes.

mod facebook;

pub use facebook::FacebookAdapter;

use url::Url;

use crate::miner::MiningRules;
use crate::session::InteractionRules;
use crate::synth::SynthesisRules;

/// Site-specific knowledge consumed by the extraction pipeline.
pub trait SiteAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Which URLs count as media assets.
    fn asset_filter(&self) -> &AssetFilter;

    fn synthesis_rules(&self) -> &SynthesisRules;

    fn mining_rules(&self) -> &MiningRules;

    fn interaction_rules(&self) -> &InteractionRules;

    /// Header set sent when fetching candidate images outside the browser.
    fn image_request_headers(&self) -> &[(&'static str, &'static str)];

    /// Whether the page uses the alternate (share link) layout.
    fn is_alternate_layout(&self, page_url: &str) -> bool;

    /// Identifier of the post or video the page shows.
    fn content_id(&self, page_url: &Url) -> Option<String>;

    /// Whether the asset URL is guaranteed to point at the original upload.
    fn is_original_quality(&self, asset_url: &str) -> bool;

    /// Whether the asset URL is shaped like a profile picture.
    fn is_profile_picture(&self, asset_url: &str) -> bool;

    /// Photo identifier usable against the Graph API.
    fn graph_photo_id(&self, page_url: &Url) -> Option<String>;
}

/// Accepts URLs on the asset domain with an image-like extension.
#[derive(Debug, Clone)]
pub struct AssetFilter {
    domain: String,
    extensions: Vec<String>,
}

impl AssetFilter {
    pub fn new(domain: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            domain: domain.into().to_ascii_lowercase(),
            extensions: extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Host equals the asset domain or is one of its subdomains.
    pub fn is_asset_host(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        host == self.domain || host.ends_with(&format!(".{}", self.domain))
    }

    /// Asset host and an image extension in the path.
    pub fn accepts(&self, url: &str) -> bool {
        if !self.is_asset_host(url) {
            return false;
        }
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let path = parsed.path().to_ascii_lowercase();
        self.extensions.iter().any(|ext| path.contains(ext.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> AssetFilter {
        AssetFilter::new("fbcdn.net", &[".jpg", ".png", ".webp"])
    }

    #[test]
    fn test_accepts_cdn_images() {
        let f = filter();
        assert!(f.accepts("https://scontent-lax3-1.xx.fbcdn.net/v/t39.30808-6/1_2_3_n.jpg?stp=x"));
        assert!(f.accepts("https://fbcdn.net/a.PNG"));
        assert!(f.accepts("https://external.xx.fbcdn.net/x/photo.webp"));
    }

    #[test]
    fn test_rejects_other_hosts_and_types() {
        let f = filter();
        assert!(!f.accepts("https://www.facebook.com/photo.jpg"));
        assert!(!f.accepts("https://evilfbcdn.net/a.jpg"));
        assert!(!f.accepts("https://static.xx.fbcdn.net/rsrc.php/v3/script.js"));
        assert!(!f.accepts("https://scontent.xx.fbcdn.net/v/video.mp4?x=.jpg"));
        assert!(!f.accepts("not a url"));
    }

    #[test]
    fn test_asset_host_ignores_path() {
        let f = filter();
        assert!(f.is_asset_host("https://scontent.xx.fbcdn.net/v/t1.6435-1/avatar"));
        assert!(!f.is_asset_host("https://example.com/fbcdn.net/a.jpg"));
    }
}
