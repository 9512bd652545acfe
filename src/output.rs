//! Console output for CLI commands. Results go to stdout as JSON; status
//! lines go to stderr so the JSON stays pipeable.

use serde::Serialize;

use modelhub_core::error::AppError;

/// Print a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(msg: &str) {
    eprintln!("✓ {msg}");
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {msg}");
}
