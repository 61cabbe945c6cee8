use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A project as returned by the listing source.
///
/// Only the fields the watcher reads are typed. Everything else the source
/// sends (poster, skills, category weights, links) lands in `extra` and is
/// passed along unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub slug: String,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    /// Epoch seconds of the last publish or edit. Ordering key for delta detection.
    pub updated: i64,
    /// ISO 8601 creation time, display only.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Response body of the project search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub projects: Option<Vec<Listing>>,
}

impl Listing {
    /// Creation time rendered in local time, or the raw value if it doesn't parse.
    pub fn created_display(&self) -> String {
        match DateTime::parse_from_rfc3339(&self.created) {
            Ok(created) => created
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M")
                .to_string(),
            Err(_) => self.created.clone(),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
