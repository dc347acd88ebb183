// src/utils/path.rs

//! Filesystem-safe path components.
//!
//! Run display names come verbatim from the CI server and may contain path
//! separators or other characters that are unsafe as a directory name. When
//! sanitizing changes the name, a short digest of the original is appended so
//! distinct names can never collide after sanitization.

use sha2::{Digest, Sha256};

/// Length of the hex digest suffix appended to altered names.
const DIGEST_LEN: usize = 8;

fn is_safe(c: char) -> bool {
    !c.is_control() && !matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
}

fn digest(name: &str) -> String {
    let hash = Sha256::digest(name.as_bytes());
    hex::encode(hash)[..DIGEST_LEN].to_string()
}

/// Turn an arbitrary display name into a safe single path component.
///
/// Names that are already safe are used verbatim, so archives written by
/// well-behaved servers keep human-readable directory names.
pub fn safe_component(name: &str) -> String {
    let trimmed = name.trim();
    let sanitized: String = trimmed
        .chars()
        .map(|c| if is_safe(c) { c } else { '_' })
        .collect();

    let unchanged = sanitized == trimmed && !trimmed.is_empty();
    let reserved = matches!(sanitized.as_str(), "" | "." | "..");

    if unchanged && !reserved {
        sanitized
    } else {
        let stem = if reserved { "run" } else { sanitized.as_str() };
        format!("{}-{}", stem.trim_matches('_'), digest(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_names_pass_through() {
        assert_eq!(
            safe_component("CouchDB » label=ubuntu #42"),
            "CouchDB » label=ubuntu #42"
        );
        assert_eq!(safe_component("label=ubuntu,arch=x86_64"), "label=ubuntu,arch=x86_64");
    }

    #[test]
    fn path_separators_are_replaced_and_suffixed() {
        let component = safe_component("a/b\\c");
        assert!(!component.contains('/'));
        assert!(!component.contains('\\'));
        assert!(component.starts_with("a_b_c-"));
    }

    #[test]
    fn distinct_unsafe_names_do_not_collide() {
        assert_ne!(safe_component("a/b"), safe_component("a\\b"));
        assert_ne!(safe_component("a/b"), safe_component("a?b"));
    }

    #[test]
    fn empty_and_dot_names_are_never_emitted() {
        for name in ["", "  ", ".", ".."] {
            let component = safe_component(name);
            assert!(!component.is_empty());
            assert_ne!(component, ".");
            assert_ne!(component, "..");
        }
    }

    #[test]
    fn deterministic() {
        assert_eq!(safe_component("x/y"), safe_component("x/y"));
    }
}
