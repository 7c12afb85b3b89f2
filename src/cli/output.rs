//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::PageTypeError;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &PageTypeError) -> String {
    match e {
        PageTypeError::Validation { field, message } => {
            format!("Invalid value for '{}': {}", field, message)
        }
        other => other.to_string(),
    }
}
