//! Answer-text normalisation.
//!
//! Generated answers arrive with markdown-style emphasis markers and sloppy
//! comma spacing that read badly and sound worse when spoken.  [`normalize`]
//! cleans both before the answer is translated and voiced.

/// Strip emphasis markers and tidy comma spacing.
///
/// * every `*` is removed,
/// * whitespace around a comma collapses to exactly one space after it,
/// * leading/trailing whitespace is trimmed.
///
/// Pure and total: the empty string maps to the empty string.
///
/// # Example
///
/// ```
/// use agrivoice::text::normalize;
///
/// assert_eq!(
///     normalize("**Urea** , then  potash ,and water"),
///     "Urea, then potash, and water"
/// );
/// ```
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => {}
            ',' => {
                while out.ends_with(|ch: char| ch.is_whitespace()) {
                    out.pop();
                }
                out.push(',');
                out.push(' ');
                while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }

    out.trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
