//! Header canonicalization shared by exact and fuzzy matching.

/// Canonical comparison form of a header.
///
/// Lower-cases and trims, turns `_ - . / \` into spaces, collapses runs of
/// whitespace and strips bracket characters.
pub fn normalize(header: &str) -> String {
    let spaced: String = header
        .to_lowercase()
        .chars()
        .filter_map(|c| match c {
            '_' | '-' | '.' | '/' | '\\' => Some(' '),
            '(' | ')' | '[' | ']' | '{' | '}' => None,
            c if c.is_whitespace() => Some(' '),
            c => Some(c),
        })
        .collect();

    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
