//! Embedded page state: locating the assignment and evaluating its value.
//!
//! Post pages carry their data as a JavaScript object literal assigned to a
//! global. The literal is not valid JSON (unquoted keys, `undefined`, the
//! occasional function), so it is read with a permissive parser into a
//! [`serde_json::Value`] tree instead of being executed.

mod extract;
mod parse;

pub use extract::extract_state_expression;
pub use parse::{parse_object_literal, ParseError};

use serde_json::Value;
use tracing::debug;

/// Extract and evaluate the embedded state of a post page.
///
/// Returns `None` when the page has no state script or the script cannot be
/// evaluated; callers then fall back to scanning the raw HTML.
#[must_use]
pub fn parse_state(html: &str) -> Option<Value> {
    let Some(expression) = extract_state_expression(html) else {
        debug!("No embedded state script found");
        return None;
    };

    match parse_object_literal(expression) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "Failed to evaluate embedded state");
            None
        }
    }
}
