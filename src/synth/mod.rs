//! URL candidate synthesis.
//!
//! Turns one observed asset URL into an ordered list of higher-quality
//! variants using CDN naming knowledge. Pure string work, no network.
//!
//! ```text
//! seed → [seed, quality × resolution variants..., sibling-host variants...]
//! ```

use std::collections::HashSet;

use regex::Regex;
use url::Url;

/// Ordered list of unique candidate URLs. First insertion wins.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl CandidateList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `url` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, url: impl Into<String>) -> bool {
        let url = url.into();
        if self.seen.contains(&url) {
            return false;
        }
        self.seen.insert(url.clone());
        self.urls.push(url);
        true
    }

    pub fn extend<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for url in urls {
            self.push(url);
        }
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.urls
    }
}

/// Rewrite rules for one CDN's URL scheme.
#[derive(Debug, Clone)]
pub struct SynthesisRules {
    /// Patterns matched against the last path segment. Each must expose the
    /// named groups `id` and `ext`.
    pub identifier_patterns: Vec<Regex>,
    /// Quality suffixes, best first (`_o`, `_b`, ...).
    pub quality_suffixes: Vec<String>,
    /// Resolution directories inserted before the file name, largest first.
    pub resolution_prefixes: Vec<String>,
    /// Matches an existing size directory that should be replaced, not nested.
    pub size_segment: Regex,
    /// Host label prefix that marks an edge node (`scontent`).
    pub edge_host_prefix: String,
    /// Replacement first labels for sibling-host variants.
    pub sibling_host_labels: Vec<String>,
}

impl SynthesisRules {
    /// Expand one seed URL. The seed is always first and never repeated.
    pub fn synthesize(&self, seed: &str) -> Vec<String> {
        let mut list = CandidateList::new();
        list.push(seed);

        let Ok(parsed) = Url::parse(seed) else {
            return list.into_vec();
        };

        list.extend(self.quality_variants(&parsed));
        list.extend(self.host_variants(&parsed));
        list.into_vec()
    }

    /// Expand every seed and merge, keeping first-seen order.
    pub fn expand_all<I, S>(&self, seeds: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = CandidateList::new();
        for seed in seeds {
            list.extend(self.synthesize(seed.as_ref()));
        }
        list.into_vec()
    }

    fn quality_variants(&self, url: &Url) -> Vec<String> {
        let path = url.path().to_string();
        let Some((dir, file)) = path.rsplit_once('/') else {
            return Vec::new();
        };

        let base_dir = match dir.rsplit_once('/') {
            Some((parent, last)) if self.size_segment.is_match(last) => parent,
            _ => dir,
        };

        let mut variants = Vec::new();
        for pattern in &self.identifier_patterns {
            let Some(caps) = pattern.captures(file) else {
                continue;
            };
            let (Some(id), Some(ext)) = (caps.name("id"), caps.name("ext")) else {
                continue;
            };

            for suffix in &self.quality_suffixes {
                let name = format!("{}{}.{}", id.as_str(), suffix, ext.as_str());
                variants.push(with_path(url, &format!("{}/{}", base_dir, name)));
                for prefix in &self.resolution_prefixes {
                    variants.push(with_path(url, &format!("{}/{}/{}", base_dir, prefix, name)));
                }
            }
        }
        variants
    }

    fn host_variants(&self, url: &Url) -> Vec<String> {
        let Some(host) = url.host_str() else {
            return Vec::new();
        };
        let Some((label, rest)) = host.split_once('.') else {
            return Vec::new();
        };
        if !label.starts_with(&self.edge_host_prefix) {
            return Vec::new();
        }

        self.sibling_host_labels
            .iter()
            .filter_map(|sibling| {
                let mut variant = url.clone();
                variant.set_host(Some(&format!("{}.{}", sibling, rest))).ok()?;
                Some(variant.to_string())
            })
            .collect()
    }
}

fn with_path(url: &Url, path: &str) -> String {
    let mut variant = url.clone();
    variant.set_path(path);
    variant.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{FacebookAdapter, SiteAdapter};

    fn rules() -> SynthesisRules {
        FacebookAdapter::new().synthesis_rules().clone()
    }

    #[test]
    fn test_candidate_list_dedups_in_order() {
        let mut list = CandidateList::new();
        assert!(list.push("a"));
        assert!(list.push("b"));
        assert!(!list.push("a"));
        assert_eq!(list.len(), 2);
        assert_eq!(list.into_vec(), vec!["a", "b"]);
    }

    #[test]
    fn test_numeric_id_variants() {
        let seed = "https://cdn.example.net/v/t1/123456789_n.jpg";
        let out = rules().synthesize(seed);

        assert_eq!(out[0], seed);
        assert!(out.contains(&"https://cdn.example.net/v/t1/123456789_o.jpg".to_string()));
        assert!(out.contains(&"https://cdn.example.net/v/t1/123456789_b.jpg".to_string()));
        assert!(out.contains(&"https://cdn.example.net/v/t1/p1080x1080/123456789_o.jpg".to_string()));
    }

    #[test]
    fn test_best_quality_ranked_right_after_original() {
        let seed = "https://cdn.example.net/v/123456789_n.jpg";
        let out = rules().synthesize(seed);
        assert_eq!(out[1], "https://cdn.example.net/v/123456789_o.jpg");
        assert_eq!(out[2], "https://cdn.example.net/v/p2048x2048/123456789_o.jpg");
    }

    #[test]
    fn test_original_present_exactly_once_and_unique() {
        // `_n` is also one of the generated suffixes, so the seed reappears
        // as a variant and must be folded away.
        let seed = "https://scontent-lax3-1.xx.fbcdn.net/v/t39.30808-6/111_222_333_n.jpg?stp=dst-jpg&_nc_cat=1";
        let out = rules().synthesize(seed);

        assert_eq!(out.iter().filter(|u| *u == seed).count(), 1);
        assert_eq!(out[0], seed);
        let unique: HashSet<_> = out.iter().collect();
        assert_eq!(unique.len(), out.len());
    }

    #[test]
    fn test_non_matching_url_is_singleton() {
        let seed = "https://www.example.com/images/logo.svg";
        assert_eq!(rules().synthesize(seed), vec![seed.to_string()]);
    }

    #[test]
    fn test_unparseable_input_is_singleton() {
        assert_eq!(rules().synthesize("not a url"), vec!["not a url".to_string()]);
        assert_eq!(rules().synthesize(""), vec![String::new()]);
    }

    #[test]
    fn test_query_string_preserved() {
        let seed = "https://cdn.example.net/v/123456789_s.jpg?_nc_ht=abc&oh=1";
        let out = rules().synthesize(seed);
        assert!(out.contains(&"https://cdn.example.net/v/123456789_o.jpg?_nc_ht=abc&oh=1".to_string()));
    }

    #[test]
    fn test_existing_size_directory_replaced() {
        let seed = "https://cdn.example.net/v/s480x480/123456789_n.png";
        let out = rules().synthesize(seed);
        assert!(out.contains(&"https://cdn.example.net/v/p1080x1080/123456789_o.png".to_string()));
        assert!(out.contains(&"https://cdn.example.net/v/123456789_o.png".to_string()));
        assert!(!out.iter().any(|u| u.contains("s480x480/p1080x1080")));
    }

    #[test]
    fn test_underscore_groups_keep_full_identifier() {
        let seed = "https://cdn.example.net/v/1_2_3_4_n.webp";
        let out = rules().synthesize(seed);
        assert!(out.contains(&"https://cdn.example.net/v/1_2_3_4_o.webp".to_string()));
    }

    #[test]
    fn test_edge_host_siblings() {
        let seed = "https://scontent-iad3-1.xx.fbcdn.net/v/logo.png";
        let out = rules().synthesize(seed);
        assert_eq!(
            out,
            vec![
                seed.to_string(),
                "https://scontent.xx.fbcdn.net/v/logo.png".to_string(),
                "https://scontent-lax3-1.xx.fbcdn.net/v/logo.png".to_string(),
                "https://external.xx.fbcdn.net/v/logo.png".to_string(),
            ]
        );
    }

    #[test]
    fn test_expand_all_merges_without_duplicates() {
        let a = "https://cdn.example.net/v/123456789_n.jpg";
        let b = "https://cdn.example.net/v/123456789_o.jpg";
        let merged = rules().expand_all([a, b]);

        assert_eq!(merged[0], a);
        let unique: HashSet<_> = merged.iter().collect();
        assert_eq!(unique.len(), merged.len());
        // b was already generated from a, so it keeps a's ranking.
        let first_b = merged.iter().position(|u| u == b).unwrap();
        assert_eq!(first_b, 1);
    }
}
