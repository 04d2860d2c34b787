//! Route matching logic.
//!
//! # Responsibilities
//! - Match path prefix on segment boundaries
//! - Strip the mount prefix before forwarding
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - `/api/auth` matches `/api/auth` and `/api/auth/...`, never `/api/authz`
//! - No regex to guarantee O(n) matching

/// A mount prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefix {
    prefix: String,
}

impl PathPrefix {
    /// Create a new path prefix. A trailing slash is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let trimmed = prefix.trim_end_matches('/');
        Self {
            prefix: if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            },
        }
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Number of path segments; used to rank more specific prefixes first.
    pub fn segments(&self) -> usize {
        self.prefix.split('/').filter(|s| !s.is_empty()).count()
    }

    /// Returns true if `path` falls under this prefix.
    pub fn matches(&self, path: &str) -> bool {
        self.strip(path).is_some()
    }

    /// The part of `path` below the prefix, always starting with '/'.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if self.prefix == "/" {
            return path.starts_with('/').then_some(path);
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some("") => Some("/"),
            Some(rest) if rest.starts_with('/') => Some(rest),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefix::new("/api/auth");

        assert!(matcher.matches("/api/auth"));
        assert!(matcher.matches("/api/auth/"));
        assert!(matcher.matches("/api/auth/login"));
        assert!(!matcher.matches("/api/authz"));
        assert!(!matcher.matches("/api/customer/vehicles"));
        assert!(!matcher.matches("/API/auth/login")); // Case sensitive
    }

    #[test]
    fn test_strip() {
        let matcher = PathPrefix::new("/api/customer/");
        assert_eq!(matcher.as_str(), "/api/customer");
        assert_eq!(matcher.strip("/api/customer/vehicles"), Some("/vehicles"));
        assert_eq!(matcher.strip("/api/customer"), Some("/"));
        assert_eq!(matcher.strip("/api/customers"), None);
    }

    #[test]
    fn test_root_prefix() {
        let root = PathPrefix::new("/");
        assert!(root.matches("/"));
        assert!(root.matches("/anything/at/all"));
        assert_eq!(root.strip("/x"), Some("/x"));
        assert_eq!(root.segments(), 0);
        assert_eq!(PathPrefix::new("/api/auth").segments(), 2);
    }
}
