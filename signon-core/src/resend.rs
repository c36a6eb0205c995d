//! Regulated re-issuing of verification codes.
//!
//! One controller lives per pending-verification episode. Mutual exclusion
//! is a single state flag: a trigger while a resend is already in flight is
//! dropped on the floor, never queued, so rapid repeated taps can't make the
//! backend issue a pile of codes.

use crate::{common::ResendOutcome, error::AuthError, messages};

/// Where the controller currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResendState {
    /// No resend has been asked for yet (or the controller was reset).
    #[default]
    Idle,
    /// A resend request is in flight.
    Sending,
    /// The last resend finished.
    Sent {
        /// Whether the backend confirmed it sent a code.
        success: bool,
        /// Confirmation or failure text to show the user.
        message: String,
    },
}

/// Issues and regulates resend requests.
#[derive(Debug, Clone, Default)]
pub struct ResendController {
    state: ResendState,
}

impl ResendController {
    /// A fresh, idle controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    pub fn state(&self) -> &ResendState {
        &self.state
    }

    /// Whether a resend request is currently in flight.
    pub fn in_flight(&self) -> bool {
        matches!(self.state, ResendState::Sending)
    }

    /// Ask for a fresh code to be sent to `email`.
    ///
    /// Returns `Ok(true)` when the controller transitioned to
    /// [`ResendState::Sending`] and the caller should actually issue the
    /// request, and `Ok(false)` when a resend is already in flight and this
    /// trigger was suppressed.
    pub fn trigger(&mut self, email: &str) -> Result<bool, AuthError> {
        if email.is_empty() {
            return Err(AuthError::EmptyResendTarget);
        }

        if self.in_flight() {
            tracing::debug!(%email, "Resend already in flight, suppressing trigger");
            return Ok(false);
        }

        tracing::info!(%email, "Requesting a fresh verification code");
        self.state = ResendState::Sending;
        Ok(true)
    }

    /// Apply the outcome of the in-flight resend request.
    ///
    /// Ignored unless a resend is actually in flight, so a stale completion
    /// can't resurrect a controller that was reset in the meantime.
    pub fn complete(&mut self, outcome: ResendOutcome) {
        if !self.in_flight() {
            tracing::debug!(?outcome, "Discarding resend outcome, no resend in flight");
            return;
        }

        self.state = match outcome {
            ResendOutcome::Success { message } => ResendState::Sent {
                success: true,
                message: fallback(message, messages::CODE_RESENT),
            },
            ResendOutcome::Failure { message } => ResendState::Sent {
                success: false,
                message: fallback(message, messages::RESEND_FAILED),
            },
        };
    }

    /// Back to [`ResendState::Idle`], dropping any recorded result.
    pub fn reset(&mut self) {
        self.state = ResendState::Idle;
    }
}

fn fallback(message: String, default: &str) -> String {
    if message.is_empty() {
        default.to_string()
    } else {
        message
    }
}
