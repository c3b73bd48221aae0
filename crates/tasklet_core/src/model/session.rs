//! Authentication session model.
//!
//! # Invariants
//! - An empty string means "absent" for both fields.
//! - The session is authenticated iff both fields are non-empty.

use std::fmt::{Debug, Formatter};

/// Bearer credential plus the identity it was issued to.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub credential: String,
    pub identity: String,
}

impl Session {
    pub fn new(credential: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            credential: credential.into(),
            identity: identity.into(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        !self.credential.is_empty() && !self.identity.is_empty()
    }
}

// Credentials must never reach logs through `{:?}`.
impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let credential = if self.credential.is_empty() {
            "<empty>"
        } else {
            "<redacted>"
        };
        f.debug_struct("Session")
            .field("credential", &credential)
            .field("identity", &self.identity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::Session;

    #[test]
    fn requires_both_fields() {
        assert!(!Session::default().is_authenticated());
        assert!(!Session::new("token", "").is_authenticated());
        assert!(!Session::new("", "a@b.c").is_authenticated());
        assert!(Session::new("token", "a@b.c").is_authenticated());
    }

    #[test]
    fn debug_output_redacts_credential() {
        let rendered = format!("{:?}", Session::new("secret-token", "a@b.c"));
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("a@b.c"));
    }
}
