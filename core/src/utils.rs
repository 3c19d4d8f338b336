//! Utility functions and types.

use std::fmt::Debug;

/// Redacts a secret when formatting debug output.
///
/// Short values are hidden entirely; values of 12 or more characters keep
/// their first and last three characters so different secrets remain
/// distinguishable in logs without being leaked.
pub struct Redact<'a>(&'a str);

impl<'a> From<&'a str> for Redact<'a> {
    fn from(value: &'a str) -> Self {
        Redact(value)
    }
}

impl<'a> From<&'a String> for Redact<'a> {
    fn from(value: &'a String) -> Self {
        Redact(value.as_str())
    }
}

impl<'a> From<&'a Option<String>> for Redact<'a> {
    fn from(value: &'a Option<String>) -> Self {
        Redact(value.as_deref().unwrap_or(""))
    }
}

impl<'a> Debug for Redact<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.len() {
            0 => f.write_str("EMPTY"),
            n if n < 12 => f.write_str("***"),
            n => {
                f.write_str(&self.0[..3])?;
                f.write_str("***")?;
                f.write_str(&self.0[n - 3..])
            }
        }
    }
}
