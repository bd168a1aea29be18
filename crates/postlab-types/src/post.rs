//! Post records as produced by the source collector.
//!
//! Records are partially populated: any of the text fields may be missing,
//! `null`, or empty. The accessors treat all three the same way, so callers
//! never need to look at the raw `Option`s.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of a post's `text_on_media` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaText {
    /// Text recognized on the media item
    #[serde(default)]
    pub text_on_media: Option<String>,

    /// Any other keys carried by the sub-record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaText {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text_on_media: Some(text.into()),
            extra: Map::new(),
        }
    }

    /// Raw media text, `""` when the sub-record has none.
    pub fn text(&self) -> &str {
        self.text_on_media.as_deref().unwrap_or_default()
    }
}

/// A social-media post.
///
/// Keys the pipeline does not know about are kept in `extra` and written back
/// unchanged. The `processed_*` fields are annotations added by the record
/// processor for auditing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_on_media: Option<Vec<MediaText>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashtags: Option<Vec<String>>,

    /// Canonical form of `title`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_title: Option<String>,

    /// Canonical form of each `text_on_media` entry, index-aligned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_text_on_media: Option<Vec<String>>,

    /// Canonical form of the space-joined hashtags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_hashtags: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PostRecord {
    /// Title, if present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref().filter(|t| !t.is_empty())
    }

    /// Media sub-records, if present and non-empty.
    pub fn media_texts(&self) -> Option<&[MediaText]> {
        self.text_on_media.as_deref().filter(|m| !m.is_empty())
    }

    /// Hashtags, if present and non-empty.
    pub fn hashtags(&self) -> Option<&[String]> {
        self.hashtags.as_deref().filter(|h| !h.is_empty())
    }

    /// True when none of the three text fields carries content.
    pub fn is_blank(&self) -> bool {
        self.title().is_none() && self.media_texts().is_none() && self.hashtags().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_record() {
        let json = r##"{
            "title": "Marcha das mulheres",
            "text_on_media": [{"text_on_media": "Juntas somos mais fortes", "confidence": 0.9}],
            "hashtags": ["#Feminismo", "#8M"],
            "likes": 42
        }"##;

        let record: PostRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.title(), Some("Marcha das mulheres"));
        assert_eq!(record.media_texts().unwrap()[0].text(), "Juntas somos mais fortes");
        assert_eq!(record.hashtags().unwrap().len(), 2);
        assert_eq!(record.extra.get("likes"), Some(&Value::from(42)));
        assert!(record.media_texts().unwrap()[0].extra.contains_key("confidence"));
    }

    #[test]
    fn test_empty_values_are_absent() {
        let json = r#"{"title": "", "text_on_media": [], "hashtags": null}"#;
        let record: PostRecord = serde_json::from_str(json).unwrap();

        assert!(record.title().is_none());
        assert!(record.media_texts().is_none());
        assert!(record.hashtags().is_none());
        assert!(record.is_blank());
    }

    #[test]
    fn test_unknown_keys_survive_roundtrip() {
        let json = r#"{"id": "abc", "owner": {"username": "planetaella"}}"#;
        let record: PostRecord = serde_json::from_str(json).unwrap();
        let back = serde_json::to_value(&record).unwrap();

        assert_eq!(back["id"], "abc");
        assert_eq!(back["owner"]["username"], "planetaella");
        assert!(back.get("processed_title").is_none());
    }

    #[test]
    fn test_media_text_without_text_field() {
        let media: MediaText = serde_json::from_str(r#"{"url": "x"}"#).unwrap();
        assert_eq!(media.text(), "");
    }
}
