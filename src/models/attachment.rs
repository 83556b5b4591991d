// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Attachment domain model and per-file validation (UI-agnostic).

use std::fmt;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::InputValidationError;

pub const MIB: u64 = 1024 * 1024;

/// Largest single file accepted for upload.
pub const MAX_FILE_SIZE_BYTES: u64 = 50 * MIB;

/// Maximum number of attachments on one post.
pub const MAX_ATTACHMENTS: usize = 4;

/// Maximum number of videos on one post.
pub const MAX_VIDEOS: usize = 1;

pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];

pub const ALLOWED_VIDEO_TYPES: &[&str] = &["video/mp4", "video/webm", "video/quicktime"];

/// Extensions offered by the file picker; kept in line with the MIME allow-list.
pub const PICKER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "mp4", "webm", "mov"];

/// Identity of a candidate/staged file, used to route async results back to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AttachmentId(Uuid);

impl AttachmentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AttachmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Media family of an accepted file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify an allow-listed MIME type; `None` for anything else.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        if ALLOWED_IMAGE_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
        {
            Some(Self::Image)
        } else if ALLOWED_VIDEO_TYPES
            .iter()
            .any(|t| t.eq_ignore_ascii_case(essence))
        {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// A file chosen by the user, before validation. Immutable once read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandidateFile {
    pub id: AttachmentId,
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

impl CandidateFile {
    pub fn new(path: PathBuf, name: String, mime_type: String, size_bytes: u64) -> Self {
        Self {
            id: AttachmentId::new(),
            path,
            name,
            mime_type,
            size_bytes,
        }
    }

    /// Inspect a file on disk: name from the path, MIME type from the extension,
    /// size from metadata.
    pub fn from_path(path: &Path) -> Result<Self, InputValidationError> {
        let name = display_name(path);
        let metadata = std::fs::metadata(path).map_err(|err| InputValidationError::Unreadable {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        if !metadata.is_file() {
            return Err(InputValidationError::Unreadable {
                name,
                reason: "not a regular file".into(),
            });
        }
        Ok(Self::new(
            path.to_path_buf(),
            name,
            guess_mime(path),
            metadata.len(),
        ))
    }
}

/// Check a single candidate against type and size rules.
///
/// Every violation is reported; an empty vector means the file is acceptable.
pub fn validate_file(candidate: &CandidateFile) -> Vec<InputValidationError> {
    let mut violations = Vec::new();

    if MediaKind::from_mime(&candidate.mime_type).is_none() {
        violations.push(InputValidationError::UnsupportedType {
            name: candidate.name.clone(),
            mime_type: candidate.mime_type.clone(),
        });
    }
    if candidate.size_bytes > MAX_FILE_SIZE_BYTES {
        violations.push(InputValidationError::FileTooLarge {
            name: candidate.name.clone(),
            size_bytes: candidate.size_bytes,
            limit_bytes: MAX_FILE_SIZE_BYTES,
        });
    }
    if candidate.size_bytes == 0 {
        violations.push(InputValidationError::EmptyFile {
            name: candidate.name.clone(),
        });
    }

    violations
}

pub(crate) fn guess_mime(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn candidate(name: &str, mime: &str, size: u64) -> CandidateFile {
        CandidateFile::new(PathBuf::from(name), name.into(), mime.into(), size)
    }

    #[test]
    fn accepts_allow_listed_image_within_limits() {
        assert!(validate_file(&candidate("a.jpg", "image/jpeg", 10 * MIB)).is_empty());
        assert!(validate_file(&candidate("b.mov", "video/quicktime", MAX_FILE_SIZE_BYTES)).is_empty());
    }

    #[test]
    fn collects_every_violation_instead_of_stopping_at_the_first() {
        let violations = validate_file(&candidate("doc.pdf", "application/pdf", 51 * MIB));

        assert_eq!(violations.len(), 2);
        assert!(matches!(
            violations[0],
            InputValidationError::UnsupportedType { .. }
        ));
        assert!(matches!(
            violations[1],
            InputValidationError::FileTooLarge { .. }
        ));
    }

    #[test]
    fn zero_byte_file_is_rejected_as_empty() {
        let violations = validate_file(&candidate("blank.png", "image/png", 0));

        assert_eq!(
            violations,
            vec![InputValidationError::EmptyFile {
                name: "blank.png".into()
            }]
        );
    }

    #[test]
    fn media_kind_ignores_case_and_parameters() {
        assert_eq!(MediaKind::from_mime("IMAGE/PNG"), Some(MediaKind::Image));
        assert_eq!(
            MediaKind::from_mime("video/mp4; codecs=avc1"),
            Some(MediaKind::Video)
        );
        assert_eq!(MediaKind::from_mime("image/svg+xml"), None);
    }

    #[test]
    fn from_path_reads_name_mime_and_size() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("Photo.JPG");
        fs::write(&path, vec![0u8; 2048]).unwrap();

        let file = CandidateFile::from_path(&path).expect("readable file");

        assert_eq!(file.name, "Photo.JPG");
        assert_eq!(file.mime_type, "image/jpeg");
        assert_eq!(file.size_bytes, 2048);
    }

    #[test]
    fn from_path_reports_missing_file_as_unreadable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gone.png");

        let err = CandidateFile::from_path(&path).unwrap_err();

        assert!(matches!(err, InputValidationError::Unreadable { ref name, .. } if name == "gone.png"));
    }

    #[test]
    fn every_picker_extension_maps_into_the_allow_list() {
        for ext in PICKER_EXTENSIONS {
            let mime = guess_mime(Path::new(&format!("file.{ext}")));
            assert!(
                MediaKind::from_mime(&mime).is_some(),
                "{ext} guessed as {mime}"
            );
        }
    }
}
