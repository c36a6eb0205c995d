//! Error taxonomy of the workflow.
//!
//! Everything here is caught before or at the machine boundary. Local
//! validation never reaches the transport layer, and transport failures are
//! converted into state + message instead of propagating to collaborators.

use validator::ValidationErrors;

/// Errors surfaced by the workflow components.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// A second submit arrived while a transport call is still in flight on
    /// this machine instance. The caller should wait, never queue.
    #[error("another request is already in progress")]
    Busy,

    /// The entered verification code isn't 6 digits. Rejected locally,
    /// no request is made.
    #[error("the verification code must be 6 digits")]
    IncompleteCode,

    /// A resend was triggered without an email address to send to.
    #[error("no email address to send the verification code to")]
    EmptyResendTarget,

    /// The requested operation doesn't apply to the machine's current state,
    /// e.g. submitting a code while not pending verification.
    #[error("not available in the current state")]
    InvalidState,

    /// A registration form failed local validation.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Failure to complete a round-trip to the identity backend.
///
/// These never escape the workflow: the flow driver converts them into
/// `Failure { message }` outcomes, so timeouts and connection errors surface
/// the same way backend rejections do.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP round-trip itself failed (connection, timeout, malformed body).
    #[error("request to the identity service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service could not be reached for a non-HTTP reason.
    #[error("{0}")]
    Unreachable(String),
}
