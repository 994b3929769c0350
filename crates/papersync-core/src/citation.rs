/// Authors listed by name before the rest collapse into "et al.".
const MAX_LISTED_AUTHORS: usize = 3;

/// Formats a short citation: `"{authors} ({year}). {title}. {venue}."`.
///
/// Returns `None` without a title. The year and venue clauses are omitted when
/// unknown; no authors renders as `Unknown`.
pub fn format_citation(
    title: Option<&str>,
    authors: &[String],
    year: Option<i32>,
    venue: Option<&str>,
) -> Option<String> {
    let title = title.map(str::trim).filter(|t| !t.is_empty())?;

    let listed = authors
        .iter()
        .take(MAX_LISTED_AUTHORS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let author_text = if authors.is_empty() {
        "Unknown".to_string()
    } else if authors.len() > MAX_LISTED_AUTHORS {
        format!("{listed} et al.")
    } else {
        listed
    };

    let year_part = year.map(|y| format!(" ({y})")).unwrap_or_default();
    let venue_part = venue
        .filter(|v| !v.is_empty())
        .map(|v| format!(" {v}."))
        .unwrap_or_default();

    Some(
        format!("{author_text}{year_part}. {title}.{venue_part}")
            .trim()
            .to_string(),
    )
}
