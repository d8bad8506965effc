use std::fmt;

use serde::{Serialize, Serializer};

/// Marker emitted for any field no strategy could resolve.
pub const NOT_FOUND: &str = "Not Found";

/// A single best-effort metadata value.
///
/// Serializes to the resolved string or to [`NOT_FOUND`], never to null or
/// an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaField(Option<String>);

impl MetaField {
    pub fn found(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self(None)
        } else {
            Self(Some(value))
        }
    }

    pub fn missing() -> Self {
        Self(None)
    }

    pub fn is_found(&self) -> bool {
        self.0.is_some()
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// The value, or the sentinel when unresolved.
    pub fn as_str(&self) -> &str {
        self.0.as_deref().unwrap_or(NOT_FOUND)
    }
}

impl From<Option<String>> for MetaField {
    fn from(value: Option<String>) -> Self {
        value.map(Self::found).unwrap_or_default()
    }
}

impl fmt::Display for MetaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MetaField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Everything the video flow can recover about a post.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMetadata {
    pub creator: MetaField,
    pub creator_logo: MetaField,
    pub description: MetaField,
    pub likes: MetaField,
    pub comments: MetaField,
    pub plays: MetaField,
    pub duration: MetaField,
    pub uploaded_date: MetaField,
    pub thumbnail: MetaField,
    pub followers: MetaField,
}

impl ExtractedMetadata {
    /// Number of fields that resolved to a value.
    pub fn resolved_count(&self) -> usize {
        [
            &self.creator,
            &self.creator_logo,
            &self.description,
            &self.likes,
            &self.comments,
            &self.plays,
            &self.duration,
            &self.uploaded_date,
            &self.thumbnail,
            &self.followers,
        ]
        .iter()
        .filter(|f| f.is_found())
        .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_value_is_missing() {
        assert!(!MetaField::found("   ").is_found());
        assert!(!MetaField::from(Some(String::new())).is_found());
        assert!(MetaField::found("Jane").is_found());
    }

    #[test]
    fn test_default_metadata_serializes_sentinels() {
        let json = serde_json::to_value(ExtractedMetadata::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 10);
        for (key, value) in obj {
            assert_eq!(value, NOT_FOUND, "field {} should carry the sentinel", key);
        }
    }

    #[test]
    fn test_serialized_field_names() {
        let meta = ExtractedMetadata {
            creator_logo: MetaField::found("https://scontent.xx.fbcdn.net/a.jpg"),
            uploaded_date: MetaField::found("3h"),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["creatorLogo"], "https://scontent.xx.fbcdn.net/a.jpg");
        assert_eq!(json["uploadedDate"], "3h");
        assert_eq!(json["creator"], NOT_FOUND);
        assert_eq!(meta.resolved_count(), 2);
    }
}
