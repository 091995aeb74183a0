/// Escapes `text` for placement inside a string literal delimited by
/// `quote`. Line breaks become escape sequences followed by a real,
/// backslash-continued line break so the literal stays multi-line.
pub(crate) fn escape_for_within_string(text: &str, quote: char) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                result.push_str("\\r\\n\\\n");
            }
            '\n' => result.push_str("\\n\\\n"),
            '\\' => result.push_str("\\\\"),
            ch if ch == quote => {
                result.push('\\');
                result.push(ch);
            }
            ch => result.push(ch),
        }
    }
    result
}
