//! Function identifiers.
//!
//! An identifier has the form `file_path::name`. The separator may only appear
//! in that one position; names are always read back from the *last* separator.

use crate::error::{CoreError, CoreResult};

/// Separator between the file path and the function name.
pub const KEY_SEPARATOR: &str = "::";

/// Build the identifier for a function defined in `file_path`.
pub fn make_key(name: &str, file_path: &str) -> CoreResult<String> {
    if name.is_empty() {
        return Err(CoreError::InvalidInput("function name is required".into()));
    }
    if file_path.is_empty() {
        return Err(CoreError::InvalidInput(format!("file path is required for '{name}'")));
    }
    Ok(format!("{file_path}{KEY_SEPARATOR}{name}"))
}

/// Extract the bare function name from an identifier.
pub fn name_from_key(key: &str) -> CoreResult<&str> {
    match key.rfind(KEY_SEPARATOR) {
        Some(pos) => Ok(&key[pos + KEY_SEPARATOR.len()..]),
        None => Err(CoreError::InvalidInput(format!(
            "identifier '{key}' lacks the '{KEY_SEPARATOR}' separator"
        ))),
    }
}

/// Extract the file path portion of an identifier.
pub fn file_from_key(key: &str) -> CoreResult<&str> {
    match key.rfind(KEY_SEPARATOR) {
        Some(pos) => Ok(&key[..pos]),
        None => Err(CoreError::InvalidInput(format!(
            "identifier '{key}' lacks the '{KEY_SEPARATOR}' separator"
        ))),
    }
}
