//! End-of-command marker tokens.

use uuid::Uuid;

/// Fixed marker used by the readiness probe written right after spawn.
pub const READY_MARKER: &str = "__SHELL_READY__";

const MARKER_PREFIX: &str = "__END_";
const MARKER_SUFFIX: &str = "__";

/// Random hex digits per marker (64 bits of a v4 UUID).
const MARKER_HEX_LEN: usize = 16;

/// A unique token appended to a command's input to detect, in the output
/// stream, the boundary marking that command's completion.
///
/// The random suffix makes collision with real command output negligible
/// by construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Marker(String);

impl Marker {
    /// Generate a fresh marker with a cryptographically random suffix.
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{MARKER_PREFIX}{}{MARKER_SUFFIX}",
            &hex[..MARKER_HEX_LEN]
        ))
    }

    /// The marker token itself.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Marker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_marker_shape() {
        let marker = Marker::generate();
        let token = marker.as_str();
        assert!(token.starts_with(MARKER_PREFIX));
        assert!(token.ends_with(MARKER_SUFFIX));

        let hex = &token[MARKER_PREFIX.len()..token.len() - MARKER_SUFFIX.len()];
        assert_eq!(hex.len(), MARKER_HEX_LEN);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_marker_uniqueness() {
        let mut seen = HashSet::new();
        for _ in 0..10_000 {
            assert!(seen.insert(Marker::generate().0));
        }
    }

    #[test]
    fn test_display_matches_as_str() {
        let marker = Marker::generate();
        assert_eq!(marker.to_string(), marker.as_str());
    }
}
