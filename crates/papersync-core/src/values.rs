//! Building typed field writes from raw metadata values.

use crate::models::{DateStart, PropertyKind, PropertyUpdate, SelectOption, TextSegment};

/// Longest text segment the destination accepts, in characters.
pub const MAX_SEGMENT_CHARS: usize = 1800;

/// Most options a multi-select write may carry.
pub const MAX_MULTI_SELECT_OPTIONS: usize = 100;

/// A raw value from the metadata layer: one string or an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldInput<'a> {
    Text(&'a str),
    List(&'a [String]),
}

impl FieldInput<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

/// Encodes `input` for a field of `kind`.
///
/// Returns `None` when the input is empty or the kind cannot be written.
pub fn build_property_value(kind: &PropertyKind, input: FieldInput<'_>) -> Option<PropertyUpdate> {
    if input.is_empty() {
        return None;
    }

    match kind {
        PropertyKind::RichText => build_rich_text(input).map(PropertyUpdate::RichText),
        PropertyKind::Title => build_rich_text(input).map(PropertyUpdate::Title),
        PropertyKind::MultiSelect => {
            let names = match input {
                FieldInput::Text(text) => split_tags(text),
                FieldInput::List(items) => items.to_vec(),
            };
            let options = names
                .into_iter()
                .take(MAX_MULTI_SELECT_OPTIONS)
                .map(|name| SelectOption { name })
                .collect::<Vec<_>>();
            (!options.is_empty()).then_some(PropertyUpdate::MultiSelect(options))
        }
        PropertyKind::Date => match input {
            FieldInput::Text(start) => Some(PropertyUpdate::Date(DateStart {
                start: start.to_string(),
            })),
            FieldInput::List(_) => None,
        },
        PropertyKind::Unsupported(_) => None,
    }
}

fn build_rich_text(input: FieldInput<'_>) -> Option<Vec<TextSegment>> {
    let joined;
    let text = match input {
        FieldInput::Text(text) => text,
        FieldInput::List(items) => {
            joined = items.join(", ");
            &joined
        }
    };
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    Some(
        chunk_text(text, MAX_SEGMENT_CHARS)
            .into_iter()
            .map(TextSegment::text)
            .collect(),
    )
}

/// Splits `text` into pieces of at most `max_chars` characters.
///
/// Concatenating the pieces yields `text` unchanged.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let chars = text.chars().collect::<Vec<_>>();
    chars
        .chunks(max_chars.max(1))
        .map(|chunk| chunk.iter().collect::<String>())
        .collect()
}

/// Comma-separated tags, trimmed, blanks dropped.
pub fn split_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}
