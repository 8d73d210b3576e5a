//! CLI output: error mapping from pipeline errors to the stable CLI surface.

use crate::error::DdlError;

/// One line: error kind, then the message, then the root cause when it adds detail.
pub fn map_error(e: &DdlError) -> String {
    let message = e.to_string();
    let cause = e.root_cause();
    if cause == message || message.ends_with(&cause) {
        format!("{}: {}", e.kind(), message)
    } else {
        format!("{}: {} (caused by: {})", e.kind(), message, cause)
    }
}
