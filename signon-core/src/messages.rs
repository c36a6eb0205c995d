//! User-facing messages and how severe they should look.
//!
//! The embedding application (a page, a modal, a terminal) decides how to
//! render these. The important bit is the severity: a pending-verification
//! notice is a routing signal, not a failure, and must not be painted as one.

/// Shown when a login attempt is rejected because the account's email
/// address hasn't been verified yet.
pub const PLEASE_VERIFY_EMAIL: &str =
    "Please verify your email address before logging in.";

/// Shown after registration succeeds and a code is on its way.
pub const CODE_SENT: &str = "We've sent a 6-digit verification code to your email address.";

/// Local rejection of an incomplete code. No request is made in this case.
pub const CODE_MUST_BE_SIX_DIGITS: &str = "The verification code must be 6 digits.";

/// Fallback when the backend confirms a resend without a message of its own.
pub const CODE_RESENT: &str = "A new verification code has been sent to your email.";

/// Fallback when a resend fails and the backend didn't say why.
pub const RESEND_FAILED: &str = "Couldn't send a new verification code. Please try again.";

/// Fallback when code verification fails and the backend didn't say why.
pub const VERIFICATION_FAILED: &str = "That code didn't work. Please try again.";

/// Shown once the code is accepted and the user can log in.
pub const EMAIL_VERIFIED: &str = "Email verified successfully. You can now log in.";

/// How a [`Notice`] should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Neutral confirmation, e.g. "code sent".
    Info,
    /// Something the user has to act on, but nothing failed.
    Warning,
    /// An operation was rejected.
    Error,
}

/// A message destined for the user, tagged with its severity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// How to style this message.
    pub severity: Severity,
    /// The message text.
    pub text: String,
}

impl Notice {
    /// A neutral, informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    /// An act-on-this notice that isn't a failure.
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            text: text.into(),
        }
    }

    /// A failure notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}
