//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format lists of resource names and
//! "did you mean?" suggestions in error output.

/// Renders a list of names as a comma separated, back-quoted string.
///
/// # Examples
/// ```
/// use ataad_support::rendering::render_names;
///
/// assert_eq!(render_names(&["user", "todo_item"]), "`user`, `todo_item`");
/// let none: [&str; 0] = [];
/// assert_eq!(render_names(&none), "(none)");
/// ```
pub fn render_names(names: &[impl AsRef<str>]) -> String {
    if names.is_empty() {
        return "(none)".to_string();
    }
    names
        .iter()
        .map(|s| format!("`{}`", s.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Generates "did you mean?" suggestions for a misspelled name.
///
/// Candidates are scored by substring containment first, then by the
/// length of the common prefix (at least three characters).
///
/// ```
/// use ataad_support::rendering::suggest_similar;
///
/// let found = suggest_similar("usr", &["user", "todo_item"], 3);
/// assert!(found.is_empty());
///
/// let found = suggest_similar("todo", &["user", "todo_item"], 3);
/// assert_eq!(found, vec!["todo_item".to_string()]);
/// ```
pub fn suggest_similar(
    requested: &str,
    available: &[impl AsRef<str>],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| *name != requested)
        .filter_map(|name| {
            let name_lower = name.to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            let common = name_lower
                .chars()
                .zip(requested_lower.chars())
                .take_while(|(a, b)| a == b)
                .count();

            if common >= 3 {
                return Some((name, common * 10));
            }

            None
        })
        .collect();

    // stable sort keeps the caller's order among equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
