//! Classification of rejected login attempts.
//!
//! The one rule that matters: a needs-verification signal always wins over a
//! generic failure message, and once recognized it stays recognized until
//! the workflow resets. The [`crate::machine::AuthSessionMachine`] enforces
//! the "stays recognized" half by keeping the resulting notice pinned; this
//! module is the pure decision.

use crate::{
    common::AuthOutcome,
    messages::{self, Notice},
};

/// What to do with a login attempt that didn't produce a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// Whether the user has to verify their email before proceeding.
    pub requires_verification: bool,
    /// The email address to verify, when verification is required.
    pub email: Option<String>,
    /// What to show the user.
    pub notice: Notice,
}

/// Classify a login outcome.
///
/// `submitted_identifier` is the identifier the user logged in with; it is
/// the fallback verification target when the backend flags the account as
/// unverified without naming the email address.
///
/// Callers only pass rejections. [`AuthOutcome::Success`] is not applicable
/// and classifies as a plain no-verification decision.
pub fn classify(outcome: &AuthOutcome, submitted_identifier: &str) -> GateDecision {
    match outcome {
        AuthOutcome::NeedsVerification { email } => GateDecision {
            requires_verification: true,
            email: Some(
                email
                    .clone()
                    .filter(|email| !email.is_empty())
                    .unwrap_or_else(|| submitted_identifier.to_string()),
            ),
            notice: Notice::warning(messages::PLEASE_VERIFY_EMAIL),
        },
        AuthOutcome::Failure { message } => GateDecision {
            requires_verification: false,
            email: None,
            notice: Notice::error(message.clone()),
        },
        AuthOutcome::Success { .. } => GateDecision {
            requires_verification: false,
            email: None,
            notice: Notice::info(""),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Severity;

    #[test]
    fn test_needs_verification_uses_backend_email() {
        let decision = classify(
            &AuthOutcome::NeedsVerification {
                email: Some("a@b.com".to_string()),
            },
            "someone-else",
        );

        assert!(decision.requires_verification);
        assert_eq!(decision.email.as_deref(), Some("a@b.com"));
        assert_eq!(decision.notice.text, messages::PLEASE_VERIFY_EMAIL);
        assert_eq!(decision.notice.severity, Severity::Warning);
    }

    #[test]
    fn test_needs_verification_falls_back_to_submitted_identifier() {
        for email in [None, Some(String::new())] {
            let decision =
                classify(&AuthOutcome::NeedsVerification { email }, "user@x.com");
            assert_eq!(decision.email.as_deref(), Some("user@x.com"));
        }
    }

    #[test]
    fn test_failure_passes_the_backend_message_through() {
        let decision = classify(
            &AuthOutcome::Failure {
                message: "Invalid credentials".to_string(),
            },
            "user@x.com",
        );

        assert!(!decision.requires_verification);
        assert_eq!(decision.email, None);
        assert_eq!(decision.notice, Notice::error("Invalid credentials"));
    }
}
