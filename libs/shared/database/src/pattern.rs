/// Escapes `\`, `%` and `_` so user input matches literally in a
/// `LIKE ... ESCAPE '\'` clause.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Substring pattern for `ILIKE ... ESCAPE '\'`.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}
