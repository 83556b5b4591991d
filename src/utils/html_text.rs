// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Plain-text rendering of post bodies returned as HTML by the federated service.

use std::collections::HashSet;

/// Strip all markup from `html` and return readable text.
///
/// Paragraph and line breaks become newlines; script/style content is dropped
/// entirely.
pub fn html_to_text(html: &str) -> String {
    let with_breaks = html
        .replace("</p><p>", "\n\n")
        .replace("<br>", "\n")
        .replace("<br/>", "\n")
        .replace("<br />", "\n");

    let stripped = ammonia::Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(&with_breaks)
        .to_string();

    stripped
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}
