// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Error taxonomy shared by the stager, the submission path and the backend client.
//!
//! Errors carry structured fields (file name, limit, observed value); the
//! human-readable text is produced by `Display` so the UI decides how to show it.

use thiserror::Error;
use uuid::Uuid;

use crate::models::attachment::{ALLOWED_IMAGE_TYPES, ALLOWED_VIDEO_TYPES, MIB};

/// Rejected user input: a file selection or a draft that cannot be published as-is.
///
/// Always recoverable; the user has to change the selection or the text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InputValidationError {
    #[error("{name}: unsupported file type '{mime_type}'. Allowed types: {}", allowed_types())]
    UnsupportedType { name: String, mime_type: String },

    #[error("{name} is too large ({}MB). Maximum size is {}MB.", mib_tenths(.size_bytes), mib_whole(.limit_bytes))]
    FileTooLarge {
        name: String,
        size_bytes: u64,
        limit_bytes: u64,
    },

    #[error("{name} is empty")]
    EmptyFile { name: String },

    #[error("{name} could not be read: {reason}")]
    Unreadable { name: String, reason: String },

    #[error("Too many files: {selected} selected but only {remaining} of {limit} slots are free")]
    TooManyFiles {
        selected: usize,
        remaining: usize,
        limit: usize,
    },

    #[error("Images and videos cannot be mixed in one post")]
    MixedMediaType,

    #[error("Only one video can be attached to a post ({count} selected)")]
    MultipleVideosNotAllowed { count: usize },

    #[error("Write something or attach media before publishing")]
    EmptyPost,

    #[error("Post is too long ({chars}/{limit} characters)")]
    ContentTooLong { chars: usize, limit: usize },
}

impl InputValidationError {
    /// File the violation refers to, for per-file errors.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::UnsupportedType { name, .. }
            | Self::FileTooLarge { name, .. }
            | Self::EmptyFile { name }
            | Self::Unreadable { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Failure of a publish or listing request. The draft is kept so the user can retry.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("Files are too large for the server. Please reduce the file sizes.")]
    FilesTooLarge,

    #[error("The server rejected the post: {0}")]
    Validation(String),

    #[error("Your session has expired. Please log in again.")]
    Unauthorized,

    #[error("Server error ({status}). Please try again in a moment.")]
    Server { status: u16 },

    #[error("Publishing failed: {0}")]
    Rejected(String),

    #[error("Request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Could not read attachment {name}: {reason}")]
    Attachment { name: String, reason: String },

    #[error("Unexpected response from server: {0}")]
    MalformedResponse(String),
}

impl SubmissionError {
    /// Whether resubmitting the same draft unchanged may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Server { .. } | Self::Network(_))
    }
}

/// Login or registration failure.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Field-level messages returned by the authentication service.
    #[error("{}", .0.join("\n"))]
    Rejected(Vec<String>),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed with status {status}")]
    Http { status: u16 },

    #[error("Unexpected response from server: {0}")]
    MalformedResponse(String),
}

impl AuthError {
    /// Messages to show next to the login form.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Rejected(messages) => messages.clone(),
            other => vec![other.to_string()],
        }
    }
}

/// Best-effort release of a preview handle failed. Logged, never shown.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResourceCleanupError {
    #[error("preview handle {0} is not registered (already released?)")]
    UnknownHandle(Uuid),
}

fn allowed_types() -> String {
    ALLOWED_IMAGE_TYPES
        .iter()
        .chain(ALLOWED_VIDEO_TYPES)
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}

fn mib_tenths(bytes: &u64) -> String {
    format!("{:.1}", *bytes as f64 / MIB as f64)
}

fn mib_whole(bytes: &u64) -> String {
    (*bytes / MIB).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_too_large_renders_size_in_mib_with_one_decimal() {
        let err = InputValidationError::FileTooLarge {
            name: "big.jpg".into(),
            size_bytes: 60 * MIB,
            limit_bytes: 50 * MIB,
        };

        let text = err.to_string();

        assert!(text.contains("big.jpg"), "{text}");
        assert!(text.contains("60.0MB"), "{text}");
        assert!(text.contains("50MB"), "{text}");
    }

    #[test]
    fn unsupported_type_lists_the_allow_list() {
        let err = InputValidationError::UnsupportedType {
            name: "notes.pdf".into(),
            mime_type: "application/pdf".into(),
        };

        let text = err.to_string();

        assert!(text.contains("notes.pdf"));
        assert!(text.contains("application/pdf"));
        assert!(text.contains("image/jpeg"));
        assert!(text.contains("video/mp4"));
    }

    #[test]
    fn composite_errors_have_no_file_name() {
        assert_eq!(InputValidationError::MixedMediaType.file_name(), None);
        assert_eq!(
            InputValidationError::EmptyFile { name: "a.png".into() }.file_name(),
            Some("a.png")
        );
    }

    #[test]
    fn only_server_and_network_failures_are_transient() {
        assert!(SubmissionError::Server { status: 500 }.is_transient());
        assert!(SubmissionError::Network("reset".into()).is_transient());
        assert!(!SubmissionError::FilesTooLarge.is_transient());
        assert!(!SubmissionError::Unauthorized.is_transient());
    }

    #[test]
    fn rejected_auth_error_keeps_each_field_message() {
        let err = AuthError::Rejected(vec!["username: required".into(), "bad password".into()]);

        assert_eq!(err.messages().len(), 2);
        assert_eq!(err.to_string(), "username: required\nbad password");
        assert_eq!(
            AuthError::Http { status: 502 }.messages(),
            vec!["Authentication failed with status 502".to_string()]
        );
    }
}
