// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Backend client: authentication, publishing and post history.
//!
//! The `Backend` trait is the seam between the MVU kernel and the network, so
//! kernel tests can run against an in-memory fake while the app uses
//! `HttpBackend`.

use std::time::Duration;

use anyhow::Context;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::error::{AuthError, SubmissionError};
use crate::logic::submission::{SubmissionPayload, WireField};
use crate::models::post::{AccountInfo, Post};
use crate::models::session::{Credentials, Registration, Session};

const LOGIN_PATH: &str = "/api/auth/login/";
const REGISTER_PATH: &str = "/api/auth/register/";
const PUBLISH_PATH: &str = "/api/mastodon/post/";
const POSTS_PATH: &str = "/api/mastodon/posts/";
const ACCOUNT_PATH: &str = "/api/mastodon/account/";

/// Operations the client needs from the remote service.
pub trait Backend: Send + Sync {
    fn login(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Create an account and return a session for it.
    fn register(&self, registration: &Registration) -> Result<Session, AuthError>;

    fn publish(
        &self,
        session: &Session,
        payload: &SubmissionPayload,
    ) -> Result<Post, SubmissionError>;

    fn list_posts(&self, session: &Session) -> Result<Vec<Post>, SubmissionError>;

    fn account_info(&self, session: &Session) -> Result<AccountInfo, SubmissionError>;
}

/// Production backend speaking JSON and multipart over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &Url, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fedipost/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authenticate(&self, path: &str, body: &impl serde::Serialize) -> Result<Option<String>, AuthError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .map_err(|e| AuthError::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| AuthError::Network(e.to_string()))?;
        parse_auth_response(status, &text)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<T, SubmissionError> {
        let request = self
            .client
            .get(self.endpoint(path))
            .header(AUTHORIZATION, session.authorization());
        let (status, body) = send(request)?;
        if !(200..300).contains(&status) {
            return Err(map_error_status(status, &body));
        }
        serde_json::from_str(&body).map_err(|e| SubmissionError::MalformedResponse(e.to_string()))
    }
}

impl Backend for HttpBackend {
    #[tracing::instrument(skip_all, fields(username = %credentials.username))]
    fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        match self.authenticate(LOGIN_PATH, credentials)? {
            Some(token) => {
                tracing::info!("login succeeded");
                Ok(Session::new(credentials.username.clone(), token))
            }
            None => Err(AuthError::MalformedResponse(
                "login response did not include a token".into(),
            )),
        }
    }

    #[tracing::instrument(skip_all, fields(username = %registration.username))]
    fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
        match self.authenticate(REGISTER_PATH, registration)? {
            Some(token) => Ok(Session::new(registration.username.clone(), token)),
            None => {
                tracing::debug!("registration returned no token, logging in");
                self.login(&registration.credentials())
            }
        }
    }

    #[tracing::instrument(skip_all, fields(user = %session.username, media = payload.media_count(), visibility = payload.visibility().as_str()))]
    fn publish(
        &self,
        session: &Session,
        payload: &SubmissionPayload,
    ) -> Result<Post, SubmissionError> {
        let form = build_form(payload)?;
        let request = self
            .client
            .post(self.endpoint(PUBLISH_PATH))
            .header(AUTHORIZATION, session.authorization())
            .multipart(form);
        let (status, body) = send(request)?;
        let result = map_publish_response(status, &body);
        match &result {
            Ok(post) => tracing::info!(post_id = %post.id, "post published"),
            Err(err) => tracing::warn!(status, error = %err, "publish failed"),
        }
        result
    }

    fn list_posts(&self, session: &Session) -> Result<Vec<Post>, SubmissionError> {
        let listing: PostListing = self.get_json(session, POSTS_PATH)?;
        Ok(listing.into_posts())
    }

    fn account_info(&self, session: &Session) -> Result<AccountInfo, SubmissionError> {
        let value: Value = self.get_json(session, ACCOUNT_PATH)?;
        parse_account(value)
    }
}

fn send(request: RequestBuilder) -> Result<(u16, String), SubmissionError> {
    let response = request.send().map_err(network_error)?;
    let status = response.status().as_u16();
    let body = response.text().map_err(network_error)?;
    Ok((status, body))
}

fn network_error(err: reqwest::Error) -> SubmissionError {
    if err.is_timeout() {
        SubmissionError::Network("request timed out".into())
    } else {
        SubmissionError::Network(err.to_string())
    }
}

/// Encode the payload's fields, in order, as multipart form data.
fn build_form(payload: &SubmissionPayload) -> Result<Form, SubmissionError> {
    let mut form = Form::new();
    for field in payload.fields() {
        form = match field {
            WireField::Text { name, value } => form.text(name, value.to_string()),
            WireField::File {
                name,
                path,
                file_name,
                mime_type,
            } => {
                let unreadable = |reason: String| SubmissionError::Attachment {
                    name: file_name.clone(),
                    reason,
                };
                let part = Part::file(path)
                    .map_err(|e| unreadable(e.to_string()))?
                    .file_name(file_name.clone())
                    .mime_str(mime_type)
                    .map_err(|e| unreadable(e.to_string()))?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

#[derive(Deserialize)]
struct PublishResponse {
    success: bool,
    #[serde(default)]
    post: Option<Post>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PostListing {
    List(Vec<Post>),
    Page { results: Vec<Post> },
}

impl PostListing {
    fn into_posts(self) -> Vec<Post> {
        match self {
            PostListing::List(posts) | PostListing::Page { results: posts } => posts,
        }
    }
}

fn map_publish_response(status: u16, body: &str) -> Result<Post, SubmissionError> {
    if !(200..300).contains(&status) {
        return Err(map_error_status(status, body));
    }
    let parsed: PublishResponse = serde_json::from_str(body)
        .map_err(|e| SubmissionError::MalformedResponse(e.to_string()))?;
    match parsed {
        PublishResponse {
            success: true,
            post: Some(post),
            ..
        } => Ok(post),
        PublishResponse { success: true, .. } => Err(SubmissionError::MalformedResponse(
            "publish response did not include the post".into(),
        )),
        PublishResponse { error, .. } => Err(SubmissionError::Rejected(
            error.unwrap_or_else(|| "unknown error".into()),
        )),
    }
}

fn map_error_status(status: u16, body: &str) -> SubmissionError {
    match status {
        413 => SubmissionError::FilesTooLarge,
        400 => SubmissionError::Validation(
            error_message(body).unwrap_or_else(|| "invalid request".into()),
        ),
        401 => SubmissionError::Unauthorized,
        500..=599 => SubmissionError::Server { status },
        _ => SubmissionError::Http {
            status,
            message: error_message(body)
                .unwrap_or_else(|| body.trim().chars().take(200).collect()),
        },
    }
}

fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let messages = field_messages(&value);
    (!messages.is_empty()).then(|| messages.join("; "))
}

fn parse_auth_response(status: u16, body: &str) -> Result<Option<String>, AuthError> {
    if (200..300).contains(&status) {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;
        return Ok(value
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string));
    }

    let messages = serde_json::from_str::<Value>(body)
        .map(|v| field_messages(&v))
        .unwrap_or_default();
    if messages.is_empty() {
        Err(AuthError::Http { status })
    } else {
        Err(AuthError::Rejected(messages))
    }
}

fn parse_account(value: Value) -> Result<AccountInfo, SubmissionError> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let error = value
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("account unavailable");
        return Err(SubmissionError::Rejected(error.to_string()));
    }
    serde_json::from_value(value).map_err(|e| SubmissionError::MalformedResponse(e.to_string()))
}

/// Flatten a DRF-style error body into readable lines.
///
/// Field errors become `field: message`; general keys (`non_field_errors`,
/// `detail`, `error`, `message`) are kept bare. Non-string leaves are ignored.
fn field_messages(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(field_messages).collect(),
        Value::Object(map) => map
            .iter()
            .flat_map(|(key, v)| {
                let general = matches!(
                    key.as_str(),
                    "non_field_errors" | "detail" | "error" | "message"
                );
                field_messages(v).into_iter().map(move |msg| {
                    if general {
                        msg
                    } else {
                        format!("{key}: {msg}")
                    }
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}
