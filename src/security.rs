/// Trims surrounding whitespace and HTML-escapes `input`.
///
/// Applied to user-supplied text before it is stored, so that titles and
/// names render inertly wherever they are displayed.
pub fn prepare_text(input: &str) -> String {
    let trimmed = input.trim();
    let mut escaped = String::with_capacity(trimmed.len());
    for c in trimmed.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
