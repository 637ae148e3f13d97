//! Shared helpers for the workspace's integration tests.
//!
//! Unique identifiers keep rows from colliding across test runs, `logging`
//! wires tracing into the test harness, and `db` hands out throwaway SQLite
//! databases.

pub mod db;
pub mod logging;

use ulid::Ulid;

/// Generate a unique string with the given prefix
///
/// # Examples
/// ```
/// use test_support::unique_str;
///
/// let id1 = unique_str("salon");
/// let id2 = unique_str("salon");
/// assert_ne!(id1, id2);
/// assert!(id1.starts_with("salon-"));
/// ```
pub fn unique_str(prefix: &str) -> String {
    format!("{}-{}", prefix, Ulid::new())
}

/// Generate a login name that fits the `admins.username` column
/// (lowercase, no separators other than `_`).
///
/// # Examples
/// ```
/// use test_support::unique_username;
///
/// let name = unique_username("admin");
/// assert!(name.starts_with("admin_"));
/// assert_eq!(name, name.to_lowercase());
/// ```
pub fn unique_username(prefix: &str) -> String {
    format!("{}_{}", prefix, Ulid::new().to_string().to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_str_produces_different_results() {
        let a = unique_str("test");
        let b = unique_str("test");
        assert_ne!(a, b);
    }

    #[test]
    fn test_unique_str_has_correct_prefix() {
        assert!(unique_str("user").starts_with("user-"));
    }

    #[test]
    fn test_unique_username_is_identifier_safe() {
        let name = unique_username("emp");
        assert!(name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'));
    }
}
