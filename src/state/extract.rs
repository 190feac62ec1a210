use crate::constants::{SCRIPT_CLOSE_MARKER, STATE_MARKER};

/// Locate the embedded state assignment and return its right-hand side.
///
/// The text between the state marker and the next closing script tag is
/// taken, the assignment operator is dropped and a trailing statement
/// terminator is trimmed. Returns `None` when either marker is missing or
/// nothing remains.
#[must_use]
pub fn extract_state_expression(html: &str) -> Option<&str> {
    let start = html.find(STATE_MARKER)? + STATE_MARKER.len();
    let rest = &html[start..];
    let end = rest.find(SCRIPT_CLOSE_MARKER)?;

    let expression = rest[..end]
        .trim_start()
        .strip_prefix('=')?
        .trim()
        .trim_end_matches(';')
        .trim_end();

    if expression.is_empty() {
        None
    } else {
        Some(expression)
    }
}
