//! Async driver connecting the session machine to a transport.
//!
//! The machine decides, the transport executes, and this module carries the
//! responses back. Transport failures never escape: they are converted into
//! `Failure { message }` outcomes right here, so a timeout surfaces to the
//! user the same way a backend rejection does.

use crate::{
    code::FocusRequest,
    common::{
        AuthOutcome, Credentials, RegisterOutcome, RegistrationRequest, ResendOutcome,
        VerifyOutcome,
    },
    error::AuthError,
    machine::{AuthSessionMachine, SessionState, TransportCall, TransportRequest},
    resend::ResendState,
    transport::AuthTransport,
};

/// A session machine wired to a transport.
#[derive(Debug)]
pub struct AuthFlow<T> {
    machine: AuthSessionMachine,
    transport: T,
    focus: Option<FocusRequest>,
}

impl<T: AuthTransport> AuthFlow<T> {
    /// A fresh, unauthenticated flow over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            machine: AuthSessionMachine::new(),
            transport,
            focus: None,
        }
    }

    /// The machine, for observing state, notices and the code entry.
    pub fn machine(&self) -> &AuthSessionMachine {
        &self.machine
    }

    /// Mutable machine access, e.g. for feeding code digits or resetting.
    pub fn machine_mut(&mut self) -> &mut AuthSessionMachine {
        &mut self.machine
    }

    /// Pop the pending focus signal for the code entry, if any.
    ///
    /// Produced when a failed verification or a confirmed resend clears the
    /// entered code: the rendering collaborator should put the cursor back
    /// on the named digit box. Handed out at most once.
    pub fn take_focus_request(&mut self) -> Option<FocusRequest> {
        self.focus.take()
    }

    /// Run a login attempt to completion and return the resulting state.
    pub async fn login(&mut self, credentials: Credentials) -> Result<&SessionState, AuthError> {
        let call = self.machine.submit_login(credentials)?;
        self.execute(call).await;
        Ok(self.machine.state())
    }

    /// Run a registration to completion and return the resulting state.
    pub async fn register(
        &mut self,
        request: RegistrationRequest,
    ) -> Result<&SessionState, AuthError> {
        let call = self.machine.submit_registration(request)?;
        self.execute(call).await;
        Ok(self.machine.state())
    }

    /// Submit the collected verification code and return the resulting state.
    pub async fn submit_code(&mut self) -> Result<&SessionState, AuthError> {
        let call = self.machine.submit_code()?;
        self.execute(call).await;
        Ok(self.machine.state())
    }

    /// Ask for a fresh verification code. Suppressed triggers (a resend
    /// already in flight) return the current resend state unchanged.
    pub async fn resend(&mut self) -> Result<&ResendState, AuthError> {
        if let Some(call) = self.machine.request_resend()? {
            self.execute(call).await;
        }
        Ok(self.machine.resend_state())
    }

    async fn execute(&mut self, call: TransportCall) {
        let TransportCall {
            generation,
            request,
        } = call;

        self.focus = None;
        match request {
            TransportRequest::Login(credentials) => {
                let outcome = self
                    .transport
                    .login(&credentials.identifier, &credentials.secret)
                    .await
                    .unwrap_or_else(|error| AuthOutcome::Failure {
                        message: error.to_string(),
                    });
                self.machine.on_login_outcome(generation, outcome);
            }
            TransportRequest::Register(request) => {
                let outcome = self
                    .transport
                    .register(&request)
                    .await
                    .unwrap_or_else(|error| RegisterOutcome::Failure {
                        message: error.to_string(),
                    });
                self.machine.on_register_outcome(generation, outcome);
            }
            TransportRequest::VerifyCode { email, code } => {
                let outcome = self
                    .transport
                    .verify_code(&email, &code)
                    .await
                    .unwrap_or_else(|error| VerifyOutcome::Failure {
                        message: error.to_string(),
                    });
                self.focus = self.machine.on_verify_outcome(generation, outcome);
            }
            TransportRequest::ResendCode { email } => {
                let outcome = self
                    .transport
                    .resend_code(&email)
                    .await
                    .unwrap_or_else(|error| ResendOutcome::Failure {
                        message: error.to_string(),
                    });
                self.focus = self.machine.on_resend_outcome(generation, outcome);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::{Session, StudyGroup, StudyLevel, User},
        error::TransportError,
        machine::Redirect,
    };
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    /// Scripted transport: pops pre-recorded outcomes and counts calls.
    #[derive(Debug, Default, Clone)]
    struct ScriptedTransport {
        inner: Arc<Script>,
    }

    #[derive(Debug, Default)]
    struct Script {
        login_outcomes: Mutex<Vec<Result<AuthOutcome, TransportError>>>,
        verify_outcomes: Mutex<Vec<Result<VerifyOutcome, TransportError>>>,
        resend_outcomes: Mutex<Vec<Result<ResendOutcome, TransportError>>>,
        register_outcomes: Mutex<Vec<Result<RegisterOutcome, TransportError>>>,
        verify_calls: AtomicUsize,
        resend_calls: AtomicUsize,
    }

    impl ScriptedTransport {
        fn on_login(&self, outcome: Result<AuthOutcome, TransportError>) -> &Self {
            self.inner.login_outcomes.lock().unwrap().push(outcome);
            self
        }

        fn on_verify(&self, outcome: Result<VerifyOutcome, TransportError>) -> &Self {
            self.inner.verify_outcomes.lock().unwrap().push(outcome);
            self
        }

        fn on_resend(&self, outcome: Result<ResendOutcome, TransportError>) -> &Self {
            self.inner.resend_outcomes.lock().unwrap().push(outcome);
            self
        }

        fn on_register(&self, outcome: Result<RegisterOutcome, TransportError>) -> &Self {
            self.inner.register_outcomes.lock().unwrap().push(outcome);
            self
        }

        fn verify_calls(&self) -> usize {
            self.inner.verify_calls.load(Ordering::SeqCst)
        }

        fn resend_calls(&self) -> usize {
            self.inner.resend_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthTransport for ScriptedTransport {
        async fn login(
            &self,
            _identifier: &str,
            _secret: &str,
        ) -> Result<AuthOutcome, TransportError> {
            self.inner.login_outcomes.lock().unwrap().remove(0)
        }

        async fn verify_code(
            &self,
            _email: &str,
            _code: &str,
        ) -> Result<VerifyOutcome, TransportError> {
            self.inner.verify_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.verify_outcomes.lock().unwrap().remove(0)
        }

        async fn resend_code(&self, _email: &str) -> Result<ResendOutcome, TransportError> {
            self.inner.resend_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resend_outcomes.lock().unwrap().remove(0)
        }

        async fn register(
            &self,
            _request: &RegistrationRequest,
        ) -> Result<RegisterOutcome, TransportError> {
            self.inner.register_outcomes.lock().unwrap().remove(0)
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            identifier: "user@x.com".to_string(),
            secret: "hunter22".to_string(),
        }
    }

    fn session() -> Session {
        Session {
            token: "tok".to_string(),
            user: User {
                username: "user".to_string(),
                name: "A User".to_string(),
                email: "user@x.com".to_string(),
                phone: None,
                study_level: StudyLevel::Hsc,
                group: StudyGroup::Commerce,
            },
        }
    }

    fn registration() -> RegistrationRequest {
        RegistrationRequest {
            username: "user".to_string(),
            name: "A User".to_string(),
            email: "user@x.com".to_string(),
            phone: Some("+8801700000000".to_string()),
            study_level: StudyLevel::Hsc,
            group: StudyGroup::Commerce,
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        }
    }

    fn fill_code(flow: &mut AuthFlow<ScriptedTransport>, code: &str) {
        for (index, digit) in code.chars().enumerate() {
            flow.machine_mut()
                .code_entry_mut()
                .set_digit(index, &digit.to_string());
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_login_to_authenticated() {
        let transport = ScriptedTransport::default();
        transport.on_login(Ok(AuthOutcome::Success { session: session() }));
        let mut flow = AuthFlow::new(transport);

        let state = flow.login(credentials()).await.unwrap();

        assert_matches!(state, SessionState::Authenticated { .. });
    }

    #[test_log::test(tokio::test)]
    async fn test_transport_error_surfaces_as_failure_message() {
        let transport = ScriptedTransport::default();
        transport.on_login(Err(TransportError::Unreachable("timeout".to_string())));
        let mut flow = AuthFlow::new(transport);

        let state = flow.login(credentials()).await.unwrap();

        assert_eq!(*state, SessionState::Unauthenticated);
        assert_eq!(flow.machine().error().unwrap().text, "timeout");
    }

    #[test_log::test(tokio::test)]
    async fn test_incomplete_code_never_reaches_the_transport() {
        let transport = ScriptedTransport::default();
        transport.on_login(Ok(AuthOutcome::NeedsVerification {
            email: Some("user@x.com".to_string()),
        }));
        let mut flow = AuthFlow::new(transport.clone());

        flow.login(credentials()).await.unwrap();
        fill_code(&mut flow, "12345");

        assert_matches!(flow.submit_code().await, Err(AuthError::IncompleteCode));
        assert_eq!(transport.verify_calls(), 0);
    }

    #[test_log::test(tokio::test)]
    async fn test_register_verify_round_trip_ends_ready_to_log_in() {
        let transport = ScriptedTransport::default();
        transport
            .on_register(Ok(RegisterOutcome::Success {
                email: "user@x.com".to_string(),
            }))
            .on_verify(Ok(VerifyOutcome::Success));
        let mut flow = AuthFlow::new(transport);

        let state = flow.register(registration()).await.unwrap();
        assert_eq!(
            *state,
            SessionState::PendingVerification {
                email: "user@x.com".to_string()
            }
        );

        fill_code(&mut flow, "123456");
        let state = flow.submit_code().await.unwrap();

        // never stuck in VerifyingCode: back at the login prompt
        assert_eq!(*state, SessionState::Unauthenticated);
        assert_eq!(flow.machine_mut().take_redirect(), Some(Redirect::Login));
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_verification_allows_another_attempt() {
        let transport = ScriptedTransport::default();
        transport
            .on_login(Ok(AuthOutcome::NeedsVerification {
                email: Some("user@x.com".to_string()),
            }))
            .on_verify(Ok(VerifyOutcome::Failure {
                message: "invalid code".to_string(),
            }))
            .on_verify(Ok(VerifyOutcome::Success));
        let mut flow = AuthFlow::new(transport.clone());

        flow.login(credentials()).await.unwrap();
        fill_code(&mut flow, "111111");
        let state = flow.submit_code().await.unwrap();

        assert_eq!(
            *state,
            SessionState::PendingVerification {
                email: "user@x.com".to_string()
            }
        );
        assert_eq!(flow.machine().code_entry().assemble(), "");

        fill_code(&mut flow, "222222");
        let state = flow.submit_code().await.unwrap();
        assert_eq!(*state, SessionState::Unauthenticated);
        assert_eq!(transport.verify_calls(), 2);
    }

    #[test_log::test(tokio::test)]
    async fn test_resend_failure_is_independent_of_the_pending_notice() {
        let transport = ScriptedTransport::default();
        transport
            .on_login(Ok(AuthOutcome::NeedsVerification {
                email: Some("user@x.com".to_string()),
            }))
            .on_resend(Err(TransportError::Unreachable("smtp down".to_string())));
        let mut flow = AuthFlow::new(transport.clone());

        flow.login(credentials()).await.unwrap();
        let resend_state = flow.resend().await.unwrap();

        assert_matches!(
            resend_state,
            ResendState::Sent { success: false, message } if message == "smtp down"
        );
        assert!(flow.machine().banner().is_some());
        assert_eq!(transport.resend_calls(), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_failed_verification_hands_out_a_focus_request_once() {
        let transport = ScriptedTransport::default();
        transport
            .on_login(Ok(AuthOutcome::NeedsVerification {
                email: Some("user@x.com".to_string()),
            }))
            .on_verify(Ok(VerifyOutcome::Failure {
                message: "invalid code".to_string(),
            }));
        let mut flow = AuthFlow::new(transport);

        flow.login(credentials()).await.unwrap();
        assert_eq!(flow.take_focus_request(), None);

        fill_code(&mut flow, "111111");
        flow.submit_code().await.unwrap();

        assert_eq!(flow.take_focus_request(), Some(FocusRequest { index: 0 }));
        assert_eq!(flow.take_focus_request(), None);
    }

    #[test_log::test(tokio::test)]
    async fn test_confirmed_resend_requests_focus_on_first_box() {
        let transport = ScriptedTransport::default();
        transport
            .on_login(Ok(AuthOutcome::NeedsVerification {
                email: Some("user@x.com".to_string()),
            }))
            .on_resend(Ok(ResendOutcome::Success {
                message: String::new(),
            }));
        let mut flow = AuthFlow::new(transport);

        flow.login(credentials()).await.unwrap();
        fill_code(&mut flow, "123");
        flow.resend().await.unwrap();

        assert_eq!(flow.machine().code_entry().assemble(), "");
        assert_eq!(flow.take_focus_request(), Some(FocusRequest { index: 0 }));
    }
}
