// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Transport-safe file names for multipart uploads.

/// Longest file name sent in a `Content-Disposition` header.
const MAX_NAME_LEN: usize = 100;

/// Produce an ASCII file name that survives multipart headers and server-side storage.
///
/// # Steps
/// - Transliterate Unicode to ASCII with `deunicode` (e.g., "Å" → "A").
/// - Keep ASCII alphanumerics plus `-`, `_`, and `.`; everything else becomes `_`.
/// - Collapse runs of `_` and `.`, drop leading dots, trim trailing dots.
/// - Shorten the stem so the whole name fits `MAX_NAME_LEN`, keeping the extension.
pub fn sanitize_component(value: &str) -> String {
    let transliterated = deunicode::deunicode(value);
    let mut out = String::with_capacity(transliterated.len());
    let mut last: Option<char> = None;

    for ch in transliterated.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.') {
            ch
        } else {
            '_'
        };
        if matches!(mapped, '_' | '.') && last == Some(mapped) {
            continue;
        }
        out.push(mapped);
        last = Some(mapped);
    }

    while let Some(pos) = out.find("_.") {
        out.remove(pos);
    }

    let stemless = out.starts_with('.');
    let out = out.trim_start_matches('.').trim_end_matches('.');
    let out = out.trim_matches('_');
    if out.is_empty() {
        return "attachment".to_string();
    }
    // ".mp4" is an extension without a stem, not a hidden file named "mp4".
    let out = if stemless && !out.contains('.') {
        format!("attachment.{out}")
    } else {
        out.to_string()
    };

    if out.len() <= MAX_NAME_LEN {
        return out;
    }

    // ASCII only at this point, so byte slicing is char-safe.
    match out.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() < MAX_NAME_LEN / 2 => {
            let keep = MAX_NAME_LEN - ext.len() - 1;
            format!("{}.{ext}", &stem[..keep.min(stem.len())])
        }
        _ => out[..MAX_NAME_LEN].to_string(),
    }
}
