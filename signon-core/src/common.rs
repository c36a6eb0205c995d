//! Request, response and session data types shared between clients of and the signon backend

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Credentials for a single login attempt.
///
/// Created per submit and discarded after use. When the backend answers
/// "needs verification", only the identifier survives (as the pending
/// email); the secret is dropped with the rest.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Email address or username
    pub identifier: String,
    /// Account password
    pub secret: String,
}

/// Level of study the account is registered for
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyLevel {
    /// Secondary school certificate track
    #[serde(rename = "SSC")]
    Ssc,
    /// Higher secondary certificate track
    #[serde(rename = "HSC")]
    Hsc,
}

/// Study group the account is registered for
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StudyGroup {
    /// Science group
    Science,
    /// Arts group
    Arts,
    /// Commerce group
    Commerce,
}

/// Registration request struct (for creating new accounts)
#[derive(Deserialize, Serialize, Validate, Clone, Debug)]
pub struct RegistrationRequest {
    /// Username associated with the account
    #[validate(length(min = 1, message = "username must not be empty"))]
    pub username: String,
    /// The user's full name
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    /// Email address the verification code will be sent to
    #[validate(email)]
    pub email: String,
    /// Phone number, if the user provided one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Level of study
    pub study_level: StudyLevel,
    /// Study group
    pub group: StudyGroup,
    /// Account password
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    /// Confirmation of the password. Checked locally, never sent.
    #[serde(skip_serializing)]
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub confirm_password: String,
}

/// The profile of a verified, authenticated user
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    /// Username associated with the account
    pub username: String,
    /// The user's full name
    pub name: String,
    /// Verified email address
    pub email: String,
    /// Phone number, if associated
    pub phone: Option<String>,
    /// Level of study
    pub study_level: StudyLevel,
    /// Study group
    pub group: StudyGroup,
}

/// An authenticated session as issued by the backend
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Session {
    /// Bearer token for subsequent requests
    pub token: String,
    /// The user this session belongs to
    pub user: User,
}

/// Outcome of a login attempt, decided once at the transport boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// The credentials were accepted and a session was issued
    Success {
        /// The issued session
        session: Session,
    },
    /// The credentials were accepted but the email address isn't verified yet.
    ///
    /// This is a control signal, not a failure.
    NeedsVerification {
        /// The unverified email address, if the backend provided it
        email: Option<String>,
    },
    /// The login attempt was rejected
    Failure {
        /// Why, as reported by the backend
        message: String,
    },
}

/// Outcome of submitting a verification code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// The code was accepted and consumed
    Success,
    /// The code was rejected
    Failure {
        /// Why, as reported by the backend
        message: String,
    },
}

/// Outcome of asking the backend to send a fresh verification code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResendOutcome {
    /// A new code is on its way
    Success {
        /// Confirmation text from the backend, possibly empty
        message: String,
    },
    /// No code was sent
    Failure {
        /// Why, as reported by the backend, possibly empty
        message: String,
    },
}

/// Outcome of a registration request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegisterOutcome {
    /// The account was created and a verification code was sent
    Success {
        /// The email address the code was sent to
        email: String,
    },
    /// The registration was rejected
    Failure {
        /// Why, as reported by the backend
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn registration() -> RegistrationRequest {
        RegistrationRequest {
            username: "tamim".to_string(),
            name: "Tamim Iqbal".to_string(),
            email: "tamim@example.com".to_string(),
            phone: None,
            study_level: StudyLevel::Hsc,
            group: StudyGroup::Science,
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        }
    }

    #[test]
    fn test_registration_valid() {
        assert_matches!(registration().validate(), Ok(()));
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        let mut request = registration();
        request.email = "not-an-email".to_string();
        assert_matches!(request.validate(), Err(_));
    }

    #[test]
    fn test_registration_rejects_short_password() {
        let mut request = registration();
        request.password = "abc".to_string();
        request.confirm_password = "abc".to_string();
        assert_matches!(request.validate(), Err(_));
    }

    #[test]
    fn test_registration_rejects_password_mismatch() {
        let mut request = registration();
        request.confirm_password = "hunter23".to_string();
        assert_matches!(request.validate(), Err(_));
    }

    #[test]
    fn test_confirmation_is_not_serialized() {
        let json = serde_json::to_value(registration()).unwrap();
        assert!(json.get("confirm_password").is_none());
        assert_eq!(json["study_level"], "HSC");
    }
}
