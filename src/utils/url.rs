// src/utils/url.rs

//! URL manipulation utilities.

/// Join a suffix path onto a base URL, tolerating a missing trailing slash.
///
/// # Examples
/// ```
/// use logsift::utils::url::join;
///
/// assert_eq!(
///     join("https://ci.example.org/job/x/7/", "consoleText"),
///     "https://ci.example.org/job/x/7/consoleText"
/// );
/// assert_eq!(
///     join("https://ci.example.org/job/x/7", "api/json"),
///     "https://ci.example.org/job/x/7/api/json"
/// );
/// ```
pub fn join(base: &str, suffix: &str) -> String {
    let suffix = suffix.trim_start_matches('/');
    if base.ends_with('/') {
        format!("{base}{suffix}")
    } else {
        format!("{base}/{suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_with_trailing_slash() {
        assert_eq!(join("https://a/b/", "c"), "https://a/b/c");
    }

    #[test]
    fn test_join_without_trailing_slash() {
        assert_eq!(join("https://a/b", "c"), "https://a/b/c");
    }

    #[test]
    fn test_join_strips_leading_slash_on_suffix() {
        assert_eq!(join("https://a/b/", "/c/d"), "https://a/b/c/d");
    }
}
