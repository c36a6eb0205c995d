//! The session state machine.
//!
//! Coordinates login, verification gating, code verification and the
//! transition into an authenticated session. The machine never performs
//! I/O itself: submit operations transition state and hand back a
//! [`TransportCall`] describing the request to make, and the matching
//! `on_*_outcome` method applies the response. [`crate::flow::AuthFlow`]
//! wires the two halves together.
//!
//! Only one submit call may be in flight per machine instance; overlapping
//! submits are rejected as busy, never queued. Outcomes carry the
//! generation of the call that produced them, so a response that arrives
//! after a `reset()` (or for a call that was superseded) is discarded
//! instead of applied.

use crate::{
    code::{CodeEntry, FocusRequest},
    common::{
        AuthOutcome, Credentials, RegisterOutcome, RegistrationRequest, ResendOutcome,
        Session, VerifyOutcome,
    },
    error::AuthError,
    gate,
    messages::{self, Notice},
    resend::{ResendController, ResendState},
};
use validator::Validate;

/// The single source of truth downstream collaborators observe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nobody is logged in and nothing is in flight.
    #[default]
    Unauthenticated,
    /// A login or registration request is in flight.
    Submitting,
    /// Credentials were accepted but the email address awaits verification.
    PendingVerification {
        /// The address the verification code is sent to.
        email: String,
    },
    /// A code verification request is in flight.
    VerifyingCode {
        /// The address being verified.
        email: String,
    },
    /// A session was issued.
    Authenticated {
        /// The issued session.
        session: Session,
    },
}

/// Where the embedding application should navigate after a transition.
///
/// Handed out exactly once per transition via
/// [`AuthSessionMachine::take_redirect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// A session was issued: leave the login surface.
    Home,
    /// The email was verified: return to the login prompt.
    Login,
}

/// A transport request the machine wants executed.
#[derive(Debug, Clone)]
pub struct TransportCall {
    /// Tag identifying the call; its outcome must be applied with the same
    /// value or it is considered stale.
    pub generation: u64,
    /// The request to perform.
    pub request: TransportRequest,
}

/// The request half of a [`TransportCall`].
#[derive(Debug, Clone)]
pub enum TransportRequest {
    /// Attempt a login.
    Login(Credentials),
    /// Create an account.
    Register(RegistrationRequest),
    /// Submit a verification code.
    VerifyCode {
        /// The address being verified.
        email: String,
        /// The assembled 6-digit code.
        code: String,
    },
    /// Ask for a fresh verification code.
    ResendCode {
        /// The address to send it to.
        email: String,
    },
}

/// State machine for the account-verification and login workflow.
#[derive(Debug, Default)]
pub struct AuthSessionMachine {
    state: SessionState,
    generation: u64,
    code: CodeEntry,
    resend: ResendController,
    resend_generation: Option<u64>,
    banner: Option<Notice>,
    error: Option<Notice>,
    redirect: Option<Redirect>,
    submitted_identifier: Option<String>,
}

impl AuthSessionMachine {
    /// A fresh machine in [`SessionState::Unauthenticated`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The pinned workflow notice: the "please verify" classification or a
    /// post-registration/post-verification confirmation. Survives later
    /// errors until the workflow resets.
    pub fn banner(&self) -> Option<&Notice> {
        self.banner.as_ref()
    }

    /// The latest failure message, if any.
    pub fn error(&self) -> Option<&Notice> {
        self.error.as_ref()
    }

    /// The code entry collecting the verification code.
    pub fn code_entry(&self) -> &CodeEntry {
        &self.code
    }

    /// Mutable access for the rendering collaborator feeding digits in.
    pub fn code_entry_mut(&mut self) -> &mut CodeEntry {
        &mut self.code
    }

    /// State of the resend controller for the current episode.
    pub fn resend_state(&self) -> &ResendState {
        self.resend.state()
    }

    /// Pop the pending navigation signal, if any. Each transition produces
    /// at most one, and it is handed out at most once.
    pub fn take_redirect(&mut self) -> Option<Redirect> {
        self.redirect.take()
    }

    /// Attempt a login with the given credentials.
    pub fn submit_login(&mut self, credentials: Credentials) -> Result<TransportCall, AuthError> {
        self.ensure_submittable()?;

        tracing::info!(identifier = %credentials.identifier, "Submitting login");
        self.error = None;
        self.banner = None;
        self.submitted_identifier = Some(credentials.identifier.clone());
        self.state = SessionState::Submitting;

        Ok(self.issue(TransportRequest::Login(credentials)))
    }

    /// Apply the outcome of the login call tagged `generation`.
    pub fn on_login_outcome(&mut self, generation: u64, outcome: AuthOutcome) {
        if generation != self.generation || !matches!(self.state, SessionState::Submitting) {
            tracing::debug!(generation, "Discarding stale login outcome");
            return;
        }

        let identifier = self.submitted_identifier.take().unwrap_or_default();
        match outcome {
            AuthOutcome::Success { session } => {
                tracing::info!(username = %session.user.username, "Login succeeded");
                self.state = SessionState::Authenticated { session };
                self.redirect = Some(Redirect::Home);
            }
            rejection => {
                let decision = gate::classify(&rejection, &identifier);
                if decision.requires_verification {
                    let email = decision.email.unwrap_or(identifier);
                    tracing::info!(%email, "Account needs email verification");
                    self.enter_pending_verification(email);
                    self.banner = Some(decision.notice);
                } else {
                    tracing::info!("Login rejected");
                    self.state = SessionState::Unauthenticated;
                    self.error = Some(decision.notice);
                }
            }
        }
    }

    /// Create an account. Validates the form locally before anything is sent.
    pub fn submit_registration(
        &mut self,
        request: RegistrationRequest,
    ) -> Result<TransportCall, AuthError> {
        self.ensure_submittable()?;
        request.validate()?;

        tracing::info!(username = %request.username, "Submitting registration");
        self.error = None;
        self.banner = None;
        self.submitted_identifier = Some(request.email.clone());
        self.state = SessionState::Submitting;

        Ok(self.issue(TransportRequest::Register(request)))
    }

    /// Apply the outcome of the registration call tagged `generation`.
    pub fn on_register_outcome(&mut self, generation: u64, outcome: RegisterOutcome) {
        if generation != self.generation || !matches!(self.state, SessionState::Submitting) {
            tracing::debug!(generation, "Discarding stale registration outcome");
            return;
        }

        let fallback_email = self.submitted_identifier.take().unwrap_or_default();
        match outcome {
            RegisterOutcome::Success { email } => {
                let email = if email.is_empty() { fallback_email } else { email };
                tracing::info!(%email, "Account created, code sent");
                self.enter_pending_verification(email);
                self.banner = Some(Notice::info(messages::CODE_SENT));
            }
            RegisterOutcome::Failure { message } => {
                tracing::info!("Registration rejected");
                self.state = SessionState::Unauthenticated;
                self.error = Some(Notice::error(message));
            }
        }
    }

    /// Submit the collected verification code.
    ///
    /// Rejected locally, with no request made, unless all 6 digits are in.
    pub fn submit_code(&mut self) -> Result<TransportCall, AuthError> {
        let email = match &self.state {
            SessionState::PendingVerification { email } => email.clone(),
            SessionState::Submitting | SessionState::VerifyingCode { .. } => {
                return Err(AuthError::Busy)
            }
            _ => return Err(AuthError::InvalidState),
        };

        if !self.code.is_complete() {
            self.error = Some(Notice::error(messages::CODE_MUST_BE_SIX_DIGITS));
            return Err(AuthError::IncompleteCode);
        }

        let code = self.code.assemble();
        tracing::info!(%email, "Submitting verification code");
        self.error = None;
        self.state = SessionState::VerifyingCode {
            email: email.clone(),
        };

        Ok(self.issue(TransportRequest::VerifyCode { email, code }))
    }

    /// Apply the outcome of the verification call tagged `generation`.
    ///
    /// On failure the code entry is cleared for another try; the returned
    /// [`FocusRequest`] asks the rendering collaborator to put the cursor
    /// back on the first digit box.
    pub fn on_verify_outcome(
        &mut self,
        generation: u64,
        outcome: VerifyOutcome,
    ) -> Option<FocusRequest> {
        let email = match &self.state {
            SessionState::VerifyingCode { email } if generation == self.generation => {
                email.clone()
            }
            _ => {
                tracing::debug!(generation, "Discarding stale verification outcome");
                return None;
            }
        };

        match outcome {
            VerifyOutcome::Success => {
                // No session is issued for a consumed code: re-enter the
                // login prompt instead of assuming authentication.
                tracing::info!(%email, "Email verified");
                self.clear_episode();
                self.state = SessionState::Unauthenticated;
                self.error = None;
                self.banner = Some(Notice::info(messages::EMAIL_VERIFIED));
                self.redirect = Some(Redirect::Login);
                None
            }
            VerifyOutcome::Failure { message } => {
                tracing::info!(%email, "Verification code rejected");
                self.state = SessionState::PendingVerification { email };
                self.error = Some(Notice::error(if message.is_empty() {
                    messages::VERIFICATION_FAILED.to_string()
                } else {
                    message
                }));
                Some(self.code.reset())
            }
        }
    }

    /// Ask for a fresh code for the pending episode.
    ///
    /// Returns `Ok(None)` when a resend is already in flight and the trigger
    /// was suppressed.
    pub fn request_resend(&mut self) -> Result<Option<TransportCall>, AuthError> {
        let email = match &self.state {
            SessionState::PendingVerification { email } => email.clone(),
            _ => return Err(AuthError::InvalidState),
        };

        if !self.resend.trigger(&email)? {
            return Ok(None);
        }

        let call = self.issue(TransportRequest::ResendCode { email });
        self.resend_generation = Some(call.generation);
        Ok(Some(call))
    }

    /// Apply the outcome of the resend call tagged `generation`.
    ///
    /// A confirmed resend clears the entered code so the fresh one can be
    /// typed in; the returned [`FocusRequest`] targets the first box. Resend
    /// failures leave the pending-verification notice untouched.
    pub fn on_resend_outcome(
        &mut self,
        generation: u64,
        outcome: ResendOutcome,
    ) -> Option<FocusRequest> {
        if self.resend_generation != Some(generation) {
            tracing::debug!(generation, "Discarding stale resend outcome");
            return None;
        }
        self.resend_generation = None;

        let succeeded = matches!(outcome, ResendOutcome::Success { .. });
        self.resend.complete(outcome);
        succeeded.then(|| self.code.reset())
    }

    /// Abandon the workflow from any state.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = SessionState::Unauthenticated;
        self.clear_episode();
        self.banner = None;
        self.error = None;
        self.redirect = None;
        self.submitted_identifier = None;
    }

    fn enter_pending_verification(&mut self, email: String) {
        self.clear_episode();
        self.state = SessionState::PendingVerification { email };
    }

    fn clear_episode(&mut self) {
        self.code.reset();
        self.resend.reset();
        self.resend_generation = None;
    }

    fn ensure_submittable(&self) -> Result<(), AuthError> {
        match self.state {
            SessionState::Unauthenticated => Ok(()),
            SessionState::Submitting | SessionState::VerifyingCode { .. } => {
                Err(AuthError::Busy)
            }
            _ => Err(AuthError::InvalidState),
        }
    }

    fn issue(&mut self, request: TransportRequest) -> TransportCall {
        self.generation += 1;
        TransportCall {
            generation: self.generation,
            request,
        }
    }
}
