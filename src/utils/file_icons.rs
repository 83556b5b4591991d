// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges
//! Phosphor icon mapping for staged media.

use crate::models::attachment::MediaKind;

/// Return a Phosphor file icon matching the media kind and MIME subtype.
pub fn icon_for(kind: MediaKind, mime: &str) -> &'static str {
    let mime = mime
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    match kind {
        MediaKind::Video => egui_phosphor::regular::FILE_VIDEO,
        MediaKind::Image => match mime.as_str() {
            "image/png" => egui_phosphor::regular::FILE_PNG,
            "image/jpeg" => egui_phosphor::regular::FILE_JPG,
            _ => egui_phosphor::regular::FILE_IMAGE,
        },
    }
}
