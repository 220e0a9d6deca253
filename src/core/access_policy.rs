//! Per-path authentication exemption policy.

/// Decides, per request path, whether identity verification is mandatory
/// before forwarding. Immutable after startup; evaluation is a pure prefix
/// scan with no failure mode.
pub struct AccessPolicy {
    exempt_prefixes: Vec<String>,
}

impl AccessPolicy {
    pub fn new(exempt_prefixes: &[String]) -> Self {
        Self {
            exempt_prefixes: exempt_prefixes.to_vec(),
        }
    }

    /// Returns false iff any exempt prefix matches the path. Matching uses
    /// `starts_with` semantics, so sub-paths of an exempt prefix are also
    /// exempt.
    pub fn requires_auth(&self, path: &str) -> bool {
        !self
            .exempt_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exempt_prefix_skips_auth() {
        let policy = AccessPolicy::new(&["/projects/graphql".to_string()]);
        assert!(!policy.requires_auth("/projects/graphql"));
    }

    #[test]
    fn sub_paths_of_exempt_prefix_are_exempt() {
        let policy = AccessPolicy::new(&["/a".to_string()]);
        assert!(!policy.requires_auth("/a/b"));
    }

    #[test]
    fn non_exempt_path_requires_auth() {
        let policy = AccessPolicy::new(&["/projects/graphql".to_string()]);
        assert!(policy.requires_auth("/projects-cell/projects/42"));
    }

    #[test]
    fn empty_exempt_set_requires_auth_everywhere() {
        let policy = AccessPolicy::new(&[]);
        assert!(policy.requires_auth("/anything"));
    }
}
