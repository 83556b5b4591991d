// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Authenticated session and the credentials used to obtain it.

use std::fmt;

use email_address::EmailAddress;
use serde::Serialize;

/// Token issued by the authentication service.
///
/// Lives only in memory: created from a login/registration response and
/// dropped on logout or when the backend answers 401.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    token: String,
}

impl Session {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Value of the `Authorization` header for authenticated requests.
    pub fn authorization(&self) -> String {
        format!("Token {}", self.token)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
        }
    }
}

/// Either kind of authentication attempt.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthRequest {
    Login(Credentials),
    Register(Registration),
}

impl AuthRequest {
    pub fn username(&self) -> &str {
        match self {
            AuthRequest::Login(c) => &c.username,
            AuthRequest::Register(r) => &r.username,
        }
    }
}

/// Client-side checks before contacting the authentication service.
pub fn validate_auth_request(request: &AuthRequest) -> Vec<String> {
    let mut errors = Vec::new();
    let (username, password) = match request {
        AuthRequest::Login(c) => (&c.username, &c.password),
        AuthRequest::Register(r) => (&r.username, &r.password),
    };
    if username.trim().is_empty() {
        errors.push("username: This field may not be blank.".to_string());
    }
    if password.is_empty() {
        errors.push("password: This field may not be blank.".to_string());
    }
    if let AuthRequest::Register(r) = request
        && EmailAddress::parse_with_options(r.email.trim(), Default::default()).is_err()
    {
        errors.push("email: Enter a valid email address.".to_string());
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_the_token() {
        let session = Session::new("ada", "s3cr3t-token");

        let debug = format!("{session:?}");

        assert!(debug.contains("ada"));
        assert!(!debug.contains("s3cr3t-token"));
        assert_eq!(session.authorization(), "Token s3cr3t-token");
    }

    #[test]
    fn login_requires_username_and_password() {
        let errors = validate_auth_request(&AuthRequest::Login(Credentials {
            username: "  ".into(),
            password: String::new(),
        }));

        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn registration_checks_email_format() {
        let mut registration = Registration {
            username: "ada".into(),
            email: "not-an-email".into(),
            password: "pw".into(),
        };
        let errors = validate_auth_request(&AuthRequest::Register(registration.clone()));
        assert_eq!(errors, vec!["email: Enter a valid email address.".to_string()]);

        registration.email = "ada@example.org".into();
        assert!(validate_auth_request(&AuthRequest::Register(registration)).is_empty());
    }
}
