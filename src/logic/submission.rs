// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Draft validation and the ordered multipart layout of a publish request.

use std::path::{Path, PathBuf};

use crate::error::InputValidationError;
use crate::models::post::Visibility;
use crate::utils::sanitize_component;

/// Longest post body accepted, counted in Unicode scalar values.
pub const MAX_CONTENT_CHARS: usize = 500;

/// One staged file together with its alt-text, as captured at publish time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaAttachment {
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
    pub alt_text: String,
}

/// Everything the user is about to publish.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionDraft {
    pub content: String,
    pub visibility: Visibility,
    pub attachments: Vec<MediaAttachment>,
}

/// Validated draft, ready to be encoded as `multipart/form-data`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionPayload {
    content: String,
    visibility: Visibility,
    media: Vec<MediaAttachment>,
}

/// A single form field in wire order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WireField<'a> {
    Text {
        name: &'static str,
        value: &'a str,
    },
    File {
        name: &'static str,
        path: &'a Path,
        file_name: String,
        mime_type: &'a str,
    },
}

impl SubmissionPayload {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn media_count(&self) -> usize {
        self.media.len()
    }

    /// Form fields in the order the publish endpoint expects them.
    ///
    /// `content` and `visibility` come first, then one `media_files` part per
    /// attachment, then one `alt_texts` part per attachment in the same order.
    /// The server pairs files with alt-texts by position.
    pub fn fields(&self) -> Vec<WireField<'_>> {
        let mut fields = Vec::with_capacity(2 + self.media.len() * 2);
        fields.push(WireField::Text {
            name: "content",
            value: &self.content,
        });
        fields.push(WireField::Text {
            name: "visibility",
            value: self.visibility.as_str(),
        });
        fields.extend(self.media.iter().map(|m| WireField::File {
            name: "media_files",
            path: &m.path,
            file_name: sanitize_component(&m.name),
            mime_type: &m.mime_type,
        }));
        fields.extend(self.media.iter().map(|m| WireField::Text {
            name: "alt_texts",
            value: &m.alt_text,
        }));
        fields
    }
}

/// Length of post text as it will be sent: trimmed, in Unicode scalar values.
pub fn content_chars(content: &str) -> usize {
    content.trim().chars().count()
}

/// Check a draft and freeze it into a payload.
///
/// # Errors
///
/// `EmptyPost` when there is neither text (after trimming) nor media;
/// `ContentTooLong` when the text exceeds `MAX_CONTENT_CHARS`.
pub fn build_submission_payload(
    draft: &SubmissionDraft,
) -> Result<SubmissionPayload, InputValidationError> {
    let content = draft.content.trim();
    if content.is_empty() && draft.attachments.is_empty() {
        return Err(InputValidationError::EmptyPost);
    }

    let chars = content_chars(content);
    if chars > MAX_CONTENT_CHARS {
        return Err(InputValidationError::ContentTooLong {
            chars,
            limit: MAX_CONTENT_CHARS,
        });
    }

    Ok(SubmissionPayload {
        content: content.to_string(),
        visibility: draft.visibility,
        media: draft.attachments.clone(),
    })
}

/// Status line shown after a successful publish.
pub fn success_message(media_count: usize) -> String {
    if media_count > 0 {
        format!("Post with {media_count} media file(s) published to Mastodon successfully!")
    } else {
        "Post published to Mastodon successfully!".to_string()
    }
}
