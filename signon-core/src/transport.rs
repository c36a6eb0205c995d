//! HTTP boundary to the identity backend.
//!
//! The trait abstracts the backend away so the workflow can be driven
//! against an in-memory fake in tests. [`HttpAuthTransport`] is the real
//! thing: it speaks the backend's JSON protocol and decides the
//! needs-verification tag exactly once, here, from an explicit response
//! field. Nothing downstream ever inspects response bodies or matches on
//! message strings.

use crate::{
    common::{
        AuthOutcome, RegisterOutcome, RegistrationRequest, ResendOutcome, Session,
        VerifyOutcome,
    },
    error::TransportError,
};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Request/response boundary to the identity backend.
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Attempt a login with an identifier (email or username) and password.
    async fn login(&self, identifier: &str, secret: &str)
        -> Result<AuthOutcome, TransportError>;

    /// Submit a verification code for consumption.
    async fn verify_code(&self, email: &str, code: &str)
        -> Result<VerifyOutcome, TransportError>;

    /// Ask for a fresh verification code to be sent.
    async fn resend_code(&self, email: &str) -> Result<ResendOutcome, TransportError>;

    /// Create a new account. On success a verification code is on its way.
    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegisterOutcome, TransportError>;
}

/// [`AuthTransport`] over HTTP, talking to the signon backend's auth routes.
#[derive(Debug, Clone)]
pub struct HttpAuthTransport {
    client: Client,
    api_endpoint: Url,
}

impl HttpAuthTransport {
    /// A transport for the backend at `api_endpoint`.
    pub fn new(api_endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            api_endpoint,
        }
    }

    fn server_request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut url = self.api_endpoint.clone();
        url.set_path(path);
        self.client.request(method, url)
    }
}

#[async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn login(
        &self,
        identifier: &str,
        secret: &str,
    ) -> Result<AuthOutcome, TransportError> {
        let response = self
            .server_request(Method::POST, "/auth/login")
            .json(&LoginBody {
                identifier,
                password: secret,
            })
            .send()
            .await?;

        if response.status().is_success() {
            let session: Session = response.json().await?;
            return Ok(AuthOutcome::Success { session });
        }

        let rejection = Rejection::read(response).await;
        if rejection.needs_verification {
            Ok(AuthOutcome::NeedsVerification {
                email: rejection.email,
            })
        } else {
            Ok(AuthOutcome::Failure {
                message: rejection.message,
            })
        }
    }

    async fn verify_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<VerifyOutcome, TransportError> {
        let response = self
            .server_request(Method::POST, "/auth/verify-code")
            .json(&VerifyBody { email, code })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(VerifyOutcome::Success)
        } else {
            let rejection = Rejection::read(response).await;
            Ok(VerifyOutcome::Failure {
                message: rejection.message,
            })
        }
    }

    async fn resend_code(&self, email: &str) -> Result<ResendOutcome, TransportError> {
        let response = self
            .server_request(Method::POST, "/auth/resend-code")
            .json(&EmailBody { email })
            .send()
            .await?;

        if response.status().is_success() {
            let body: MessageBody = response.json().await.unwrap_or_default();
            Ok(ResendOutcome::Success {
                message: body.message.unwrap_or_default(),
            })
        } else {
            let rejection = Rejection::read(response).await;
            Ok(ResendOutcome::Failure {
                message: rejection.message,
            })
        }
    }

    async fn register(
        &self,
        request: &RegistrationRequest,
    ) -> Result<RegisterOutcome, TransportError> {
        let response = self
            .server_request(Method::POST, "/auth/register")
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            let body: RegisteredBody = response.json().await.unwrap_or_default();
            Ok(RegisterOutcome::Success {
                email: body.email.unwrap_or_else(|| request.email.clone()),
            })
        } else {
            let rejection = Rejection::read(response).await;
            Ok(RegisterOutcome::Failure {
                message: rejection.message,
            })
        }
    }
}

#[derive(Serialize)]
struct LoginBody<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    email: &'a str,
    code: &'a str,
}

#[derive(Deserialize, Default)]
struct MessageBody {
    message: Option<String>,
}

#[derive(Deserialize, Default)]
struct RegisteredBody {
    email: Option<String>,
}

/// The decoded shape of a non-2xx response.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct ErrorBody {
    needs_verification: bool,
    email: Option<String>,
    message: Option<String>,
}

struct Rejection {
    needs_verification: bool,
    email: Option<String>,
    message: String,
}

impl Rejection {
    /// Decode a rejection, tolerating bodies that aren't the expected JSON.
    async fn read(response: Response) -> Self {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

        tracing::debug!(
            %status,
            needs_verification = body.needs_verification,
            "Request rejected by the identity service"
        );

        Self {
            needs_verification: body.needs_verification,
            email: body.email.filter(|email| !email.is_empty()),
            message: body
                .message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| default_message(status)),
        }
    }
}

fn default_message(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("The server rejected the request: {reason}"),
        None => format!("The server rejected the request (status {status})"),
    }
}
