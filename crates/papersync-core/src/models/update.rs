use std::collections::BTreeMap;

use serde::Serialize;

/// One text segment of a title or rich-text write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextSegment {
    Text { text: TextContent },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

impl TextSegment {
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            text: TextContent {
                content: content.into(),
            },
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Self::Text { text } => &text.content,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateStart {
    pub start: String,
}

/// A typed value to write into a single field.
///
/// Serializes to the destination's property-value shape, e.g.
/// `{"multi_select": [{"name": "J. Doe"}]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyUpdate {
    Title(Vec<TextSegment>),
    RichText(Vec<TextSegment>),
    MultiSelect(Vec<SelectOption>),
    Date(DateStart),
}

impl PropertyUpdate {
    /// Segment text joined back together, for title and rich-text writes.
    pub fn joined_text(&self) -> Option<String> {
        match self {
            Self::Title(segments) | Self::RichText(segments) => {
                Some(segments.iter().map(TextSegment::content).collect())
            }
            _ => None,
        }
    }

    pub fn option_names(&self) -> Option<Vec<&str>> {
        match self {
            Self::MultiSelect(options) => Some(options.iter().map(|o| o.name.as_str()).collect()),
            _ => None,
        }
    }
}

/// Field updates for one record, keyed by destination field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UpdatePayload(BTreeMap<String, PropertyUpdate>);

impl UpdatePayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, update: PropertyUpdate) {
        self.0.insert(field.into(), update);
    }

    pub fn get(&self, field: &str) -> Option<&PropertyUpdate> {
        self.0.get(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field_names(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PropertyUpdate)> {
        self.0.iter()
    }
}
