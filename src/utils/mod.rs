// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Shared helper utilities reused by UI and business logic.

pub mod file_icons;
pub mod html_text;
pub mod sanitize_component;

/// Select a Phosphor icon for a staged media file.
pub use file_icons::icon_for;
/// Render federated HTML post bodies as plain text.
pub use html_text::html_to_text;
/// Make file names safe for multipart upload.
pub use sanitize_component::sanitize_component;
