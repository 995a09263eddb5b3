//! Console rendering of errors.
//!
//! Filesystem failures get a one-line human message; everything else is
//! printed as the simplified error tree.

use tcs_core::{render_report, SchemaError};

/// One-line message for the filesystem failures users commonly hit, or
/// `None` if `err` is something else.
pub fn describe_io(err: &SchemaError) -> Option<String> {
    let SchemaError::Io { path, .. } = err.root_cause() else {
        return None;
    };
    match err.root_cause().code()? {
        "ENOENT" => Some(format!("ERROR: '{}' does not exist", path.display())),
        "EISDIR" => Some("ERROR: Is a directory".to_string()),
        "EACCES" => Some(format!(
            "ERROR: Don't have permissions to access '{}'",
            path.display()
        )),
        _ => None,
    }
}

/// Full console message for `err`.
pub fn error_message(err: &SchemaError) -> String {
    describe_io(err).unwrap_or_else(|| format!("ERROR: {}", render_report(&err.to_report())))
}

/// Print `err` to stderr.
pub fn print_error(err: &SchemaError) {
    eprintln!("{}", error_message(err));
}
