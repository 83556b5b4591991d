// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Application entry point wiring egui/eframe to launch the FediPost UI.

use std::sync::Arc;

use eframe::egui;
use egui_phosphor::Variant;

use crate::config::Config;
use crate::logic::api::Backend;
use crate::mvu::AppModel;
use crate::ui::FediPostApp;

/// Bootstrap the desktop application and run the main egui event loop.
pub fn run(config: &Config, backend: Arc<dyn Backend>) -> eframe::Result<()> {
    // Register Phosphor icon font.
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, Variant::Regular);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("FediPost")
            .with_inner_size([1024.0, 720.0])
            .with_min_inner_size([640.0, 420.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    let model = AppModel::new(config.notice_window());
    eframe::run_native(
        "FediPost",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(FediPostApp::new(backend, model)))
        }),
    )
}
