//! Markup escaping for the chat surface's MarkdownV2 dialect.

/// Characters the chat dialect treats as markup control characters.
const ESCAPED: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '?',
    '@',
];

/// Prefix every markup-significant character with a backslash.
///
/// Not idempotent: running it over already-escaped text escapes the control
/// characters again while leaving the added backslashes alone. Callers
/// escape exactly once, right before sending.
pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ESCAPED.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
