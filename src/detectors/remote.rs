/// Matches incoming SMS text against the configured secret code. The
/// match is a case-sensitive verbatim substring check; a blank code
/// never matches anything.
#[derive(Debug, Clone, Default)]
pub struct RemoteCommandMatcher {
    secret_code: String,
}

impl RemoteCommandMatcher {
    pub fn new(secret_code: impl Into<String>) -> Self {
        Self {
            secret_code: secret_code.into(),
        }
    }

    pub fn set_secret_code(&mut self, code: impl Into<String>) {
        self.secret_code = code.into();
    }

    pub fn matches(&self, message: &str) -> bool {
        if self.secret_code.trim().is_empty() {
            return false;
        }
        message.contains(&self.secret_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_match() {
        let matcher = RemoteCommandMatcher::new("LOCK-42");
        assert!(matcher.matches("please LOCK-42 now"));
        assert!(matcher.matches("LOCK-42"));
        assert!(!matcher.matches("lock-42"));
        assert!(!matcher.matches("LOCK 42"));
    }

    #[test]
    fn test_blank_code_never_matches() {
        assert!(!RemoteCommandMatcher::new("").matches("anything"));
        assert!(!RemoteCommandMatcher::new("  ").matches("  "));
    }
}
