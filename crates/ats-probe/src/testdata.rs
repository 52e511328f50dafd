//! Generated test inputs.

use chrono::Local;
use uuid::Uuid;

/// Format of [`timestamp`]
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// ASCII alphanumeric string of `len` characters
#[must_use]
pub fn random_string(len: usize) -> String {
    let mut out = String::with_capacity(len);
    while out.len() < len {
        let chunk = Uuid::new_v4().simple().to_string();
        out.extend(chunk.chars().take(len - out.len()));
    }
    out
}

/// Unique address of the form `test_xxxxxxxx@example.com`
#[must_use]
pub fn random_email() -> String {
    format!("test_{}@example.com", random_string(8))
}

/// Local time formatted with [`TIMESTAMP_FORMAT`], safe for file names
#[must_use]
pub fn timestamp() -> String {
    format_now(TIMESTAMP_FORMAT)
}

/// Local time formatted with a `strftime` pattern
#[must_use]
pub fn format_now(pattern: &str) -> String {
    Local::now().format(pattern).to_string()
}
