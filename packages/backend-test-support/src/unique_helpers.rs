//! Helpers for generating unique test identifiers
//!
//! Player ids are opaque strings scoped to a connection, so tests only need
//! them to be distinct across a run.

use uuid::Uuid;

/// Generate a unique player id with the given prefix
///
/// # Examples
/// ```
/// use findmines_test_support::unique_helpers::unique_player_id;
///
/// let a = unique_player_id("alice");
/// let b = unique_player_id("alice");
/// assert_ne!(a, b);
/// assert!(a.starts_with("alice-"));
/// ```
pub fn unique_player_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Generate `n` distinct player ids sharing a prefix
pub fn unique_player_ids(prefix: &str, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| unique_player_id(&format!("{prefix}{i}")))
        .collect()
}
