// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Business logic free of egui state: payload building, previews, backend client.

pub mod api;
pub mod preview;
pub mod submission;
