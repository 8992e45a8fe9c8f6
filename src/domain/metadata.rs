use serde::{Deserialize, Serialize};

use super::{Source, Timestamp};

/// Source-specific metadata, tagged with the source it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SourceMetadata {
    Reddit(RedditMetadata),
    Government(GovernmentMetadata),
    PropertyGuru(PropertyGuruMetadata),
    HardwareZone(HardwareZoneMetadata),
}

impl SourceMetadata {
    pub fn source(&self) -> Source {
        match self {
            SourceMetadata::Reddit(_) => Source::Reddit,
            SourceMetadata::Government(_) => Source::Government,
            SourceMetadata::PropertyGuru(_) => Source::PropertyGuru,
            SourceMetadata::HardwareZone(_) => Source::HardwareZone,
        }
    }

    /// The date the content was originally published, when the source reports one.
    pub fn published_at(&self) -> Option<&Timestamp> {
        match self {
            SourceMetadata::Reddit(m) => m.created_at.as_ref(),
            SourceMetadata::Government(m) => m.published_date.as_ref(),
            SourceMetadata::PropertyGuru(m) => m.date_posted.as_ref(),
            SourceMetadata::HardwareZone(m) => m.date_posted.as_ref(),
        }
    }

    /// Every date-bearing field with its wire name, for validation.
    pub fn timestamps(&self) -> Vec<(&'static str, &Timestamp)> {
        match self {
            SourceMetadata::Reddit(m) => m.created_at.iter().map(|t| ("metadata.created_at", t)).collect(),
            SourceMetadata::Government(m) => m
                .published_date
                .iter()
                .map(|t| ("metadata.published_date", t))
                .collect(),
            SourceMetadata::PropertyGuru(m) => m
                .date_posted
                .iter()
                .map(|t| ("metadata.date_posted", t))
                .collect(),
            SourceMetadata::HardwareZone(m) => m
                .date_posted
                .iter()
                .map(|t| ("metadata.date_posted", t))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RedditMetadata {
    pub subreddit: Option<String>,
    pub author: Option<String>,
    /// Net upvotes
    pub score: Option<i64>,
    pub upvote_ratio: Option<f64>,
    pub num_comments: Option<u64>,
    pub created_at: Option<Timestamp>,
    pub permalink: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernmentMetadata {
    /// Publishing agency, e.g. "Housing & Development Board"
    pub source_agency: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub published_date: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyGuruMetadata {
    pub property_name: Option<String>,
    pub property_type: Option<String>,
    pub review_type: Option<String>,
    pub reviewer_profile: Option<String>,
    pub author: Option<String>,
    pub date_posted: Option<Timestamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareZoneMetadata {
    pub thread_title: Option<String>,
    pub thread_url: Option<String>,
    pub author: Option<String>,
    pub post_number: Option<u64>,
    pub likes: Option<u64>,
    pub replies_count: Option<u64>,
    pub date_posted: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_is_tagged_with_source() {
        let meta = SourceMetadata::PropertyGuru(PropertyGuruMetadata {
            reviewer_profile: Some("verified_resident".to_string()),
            ..Default::default()
        });
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["source"], json!("propertyguru"));
        assert_eq!(value["reviewer_profile"], json!("verified_resident"));

        let back: SourceMetadata = serde_json::from_value(value).unwrap();
        assert_eq!(back.source(), Source::PropertyGuru);
    }

    #[test]
    fn test_published_at_per_variant() {
        let ts = Timestamp::from_raw("2024-03-01");
        let meta = SourceMetadata::Government(GovernmentMetadata {
            published_date: Some(ts.clone()),
            ..Default::default()
        });
        assert_eq!(meta.published_at(), Some(&ts));
        assert_eq!(meta.timestamps(), vec![("metadata.published_date", &ts)]);
    }
}
