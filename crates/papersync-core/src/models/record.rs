use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SyncError};

/// Opaque identifier of a database row (a Notion page id).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind tag of a destination field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKind {
    Title,
    RichText,
    MultiSelect,
    Date,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateValue {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Current value of a field as read from the source, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Text segments, each holding its `plain_text`.
    Title(Vec<String>),
    RichText(Vec<String>),
    /// Selected option names.
    MultiSelect(Vec<String>),
    Date(Option<DateValue>),
    Unsupported(String),
}

impl PropertyValue {
    pub fn from_json(v: &Value) -> Self {
        let kind = v.get("type").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "title" => Self::Title(parse_text_segments(v.get("title"))),
            "rich_text" => Self::RichText(parse_text_segments(v.get("rich_text"))),
            "multi_select" => Self::MultiSelect(
                v.get("multi_select")
                    .and_then(Value::as_array)
                    .map(|options| {
                        options
                            .iter()
                            .filter_map(|option| option.get("name").and_then(Value::as_str))
                            .map(ToOwned::to_owned)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default(),
            ),
            "date" => Self::Date(v.get("date").filter(|d| d.is_object()).map(|d| DateValue {
                start: d.get("start").and_then(Value::as_str).map(ToOwned::to_owned),
                end: d.get("end").and_then(Value::as_str).map(ToOwned::to_owned),
            })),
            other => Self::Unsupported(other.to_string()),
        }
    }

    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Title(_) => PropertyKind::Title,
            Self::RichText(_) => PropertyKind::RichText,
            Self::MultiSelect(_) => PropertyKind::MultiSelect,
            Self::Date(_) => PropertyKind::Date,
            Self::Unsupported(kind) => PropertyKind::Unsupported(kind.clone()),
        }
    }

    /// Whether the field already holds data. Unsupported kinds never do.
    pub fn has_value(&self) -> bool {
        match self {
            Self::Title(segments) | Self::RichText(segments) => !segments.is_empty(),
            Self::MultiSelect(options) => !options.is_empty(),
            Self::Date(date) => date
                .as_ref()
                .and_then(|d| d.start.as_deref())
                .is_some_and(|start| !start.is_empty()),
            Self::Unsupported(_) => false,
        }
    }

    /// Concatenated text of a title or rich-text field.
    pub fn plain_text(&self) -> Option<String> {
        match self {
            Self::Title(segments) | Self::RichText(segments) => Some(segments.concat()),
            _ => None,
        }
    }
}

fn parse_text_segments(v: Option<&Value>) -> Vec<String> {
    v.and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    item.get("plain_text")
                        .and_then(Value::as_str)
                        .or_else(|| {
                            item.get("text")
                                .and_then(|t| t.get("content"))
                                .and_then(Value::as_str)
                        })
                        .unwrap_or_default()
                        .to_string()
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default()
}

/// A database row: identifier plus its named, typed fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: PropertyValue) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn from_json(v: &Value) -> Result<Self> {
        let id = v
            .get("id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SyncError::Parse("record without id".to_string()))?;

        let properties = v
            .get("properties")
            .and_then(Value::as_object)
            .map(|obj| {
                obj.iter()
                    .map(|(name, prop)| (name.clone(), PropertyValue::from_json(prop)))
                    .collect::<BTreeMap<_, _>>()
            })
            .unwrap_or_default();

        Ok(Self {
            id: RecordId::new(id),
            properties,
        })
    }
}
