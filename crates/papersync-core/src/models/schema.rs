use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SyncError};

/// Logical fields filled from looked-up metadata. The title is not a role: it
/// is the lookup key and is never written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldRole {
    Authors,
    Published,
    Venue,
    Citation,
    Abstract,
}

impl FieldRole {
    pub const ALL: [FieldRole; 5] = [
        FieldRole::Authors,
        FieldRole::Published,
        FieldRole::Venue,
        FieldRole::Citation,
        FieldRole::Abstract,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authors => "authors",
            Self::Published => "published",
            Self::Venue => "venue",
            Self::Citation => "citation",
            Self::Abstract => "abstract",
        }
    }
}

impl fmt::Display for FieldRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from logical roles to destination field names.
///
/// `None` means the role is not tracked: it is never read or written. In TOML
/// an untracked role is written as an empty string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSchema {
    pub title: String,
    #[serde(serialize_with = "untracked_as_empty", deserialize_with = "empty_as_untracked")]
    pub authors: Option<String>,
    #[serde(serialize_with = "untracked_as_empty", deserialize_with = "empty_as_untracked")]
    pub published: Option<String>,
    #[serde(serialize_with = "untracked_as_empty", deserialize_with = "empty_as_untracked")]
    pub venue: Option<String>,
    #[serde(serialize_with = "untracked_as_empty", deserialize_with = "empty_as_untracked")]
    pub citation: Option<String>,
    #[serde(
        rename = "abstract",
        serialize_with = "untracked_as_empty",
        deserialize_with = "empty_as_untracked"
    )]
    pub abstract_text: Option<String>,
}

impl Default for FieldSchema {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            authors: Some("Author".to_string()),
            published: Some("Year".to_string()),
            venue: Some("Venue".to_string()),
            citation: Some("Citation".to_string()),
            abstract_text: Some("Abstract".to_string()),
        }
    }
}

impl FieldSchema {
    /// Destination field name for a role, or `None` if the role is untracked.
    pub fn field_name(&self, role: FieldRole) -> Option<&str> {
        let name = match role {
            FieldRole::Authors => &self.authors,
            FieldRole::Published => &self.published,
            FieldRole::Venue => &self.venue,
            FieldRole::Citation => &self.citation,
            FieldRole::Abstract => &self.abstract_text,
        };
        name.as_deref().filter(|n| !n.trim().is_empty())
    }

    /// Tracked roles with their field names, in role order.
    pub fn tracked(&self) -> impl Iterator<Item = (FieldRole, &str)> + '_ {
        FieldRole::ALL
            .into_iter()
            .filter_map(|role| self.field_name(role).map(|name| (role, name)))
    }

    pub fn untrack(&mut self, role: FieldRole) {
        match role {
            FieldRole::Authors => self.authors = None,
            FieldRole::Published => self.published = None,
            FieldRole::Venue => self.venue = None,
            FieldRole::Citation => self.citation = None,
            FieldRole::Abstract => self.abstract_text = None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(SyncError::ConfigError(
                "properties.title must name the title field".to_string(),
            ));
        }
        Ok(())
    }
}

fn untracked_as_empty<S: Serializer>(value: &Option<String>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_deref().unwrap_or_default())
}

fn empty_as_untracked<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}
