/// Canonical plate form: uppercase, every non-alphanumeric stripped.
///
/// Applied on every write and every lookup path, including the one the
/// verification engine takes, so that dashes, spaces, and case never
/// turn into a false "not authorized".
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
