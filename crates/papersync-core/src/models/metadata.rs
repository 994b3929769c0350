use serde::{Deserialize, Serialize};

use crate::models::schema::FieldRole;
use crate::values::FieldInput;

/// Normalized result of a metadata lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,

    #[serde(default)]
    pub authors: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    /// ISO date, or `YYYY-01-01` when only the year is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
}

impl PaperMetadata {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// The raw value that feeds a role, if the lookup produced one.
    pub fn field_input(&self, role: FieldRole) -> Option<FieldInput<'_>> {
        let input = match role {
            FieldRole::Authors => FieldInput::List(&self.authors),
            FieldRole::Published => FieldInput::Text(self.publication_date.as_deref()?),
            FieldRole::Venue => FieldInput::Text(self.venue.as_deref()?),
            FieldRole::Citation => FieldInput::Text(self.citation.as_deref()?),
            FieldRole::Abstract => FieldInput::Text(self.abstract_text.as_deref()?),
        };
        (!input.is_empty()).then_some(input)
    }
}
