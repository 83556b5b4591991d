// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Post text editor with a live character counter and visibility selector.

use eframe::egui;

use crate::logic::submission::{MAX_CONTENT_CHARS, content_chars};
use crate::models::post::Visibility;

/// Draft text and audience, kept free of side effects.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct ComposerModel {
    pub content: String,
    pub visibility: Visibility,
}

/// Messages emitted by the composer view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComposerMsg {
    ContentChanged(String),
    VisibilityChanged(Visibility),
}

impl ComposerModel {
    /// Length of the draft in characters, as the server counts it.
    pub fn char_count(&self) -> usize {
        content_chars(&self.content)
    }

    pub fn is_over_limit(&self) -> bool {
        self.char_count() > MAX_CONTENT_CHARS
    }

    /// Clear the text; the chosen visibility is kept for the next post.
    pub fn clear(&mut self) {
        self.content.clear();
    }
}

pub fn update(model: &mut ComposerModel, msg: ComposerMsg) {
    match msg {
        ComposerMsg::ContentChanged(text) => model.content = text,
        ComposerMsg::VisibilityChanged(visibility) => model.visibility = visibility,
    }
}

/// Render the editor and return any messages triggered by user interaction.
pub fn view(ui: &mut egui::Ui, model: &ComposerModel, enabled: bool) -> Vec<ComposerMsg> {
    let mut msgs = Vec::new();

    let mut text = model.content.clone();
    let response = ui.add_enabled(
        enabled,
        egui::TextEdit::multiline(&mut text)
            .hint_text("What's on your mind?")
            .desired_rows(6)
            .desired_width(f32::INFINITY),
    );
    if response.changed() {
        msgs.push(ComposerMsg::ContentChanged(text));
    }

    ui.horizontal(|ui| {
        ui.label("Visibility");
        let mut choice = model.visibility;
        ui.add_enabled_ui(enabled, |ui| {
            egui::ComboBox::from_id_salt("visibility")
                .selected_text(choice.label())
                .show_ui(ui, |ui| {
                    for option in Visibility::ALL {
                        ui.selectable_value(&mut choice, option, option.label());
                    }
                });
        });
        if choice != model.visibility {
            msgs.push(ComposerMsg::VisibilityChanged(choice));
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let counter = format!("{}/{}", model.char_count(), MAX_CONTENT_CHARS);
            let color = if model.is_over_limit() {
                egui::Color32::from_rgb(220, 53, 69)
            } else {
                egui::Color32::from_gray(110)
            };
            ui.label(egui::RichText::new(counter).small().color(color));
        });
    });

    msgs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_counts_characters() {
        let mut model = ComposerModel::default();
        update(&mut model, ComposerMsg::ContentChanged("héllo 👋".into()));

        assert_eq!(model.char_count(), 7);
        assert!(!model.is_over_limit());
    }

    #[test]
    fn over_limit_flips_after_max_chars() {
        let mut model = ComposerModel {
            content: "x".repeat(MAX_CONTENT_CHARS),
            ..Default::default()
        };
        assert!(!model.is_over_limit());

        model.content.push('y');
        assert!(model.is_over_limit());
    }

    #[test]
    fn trailing_newline_does_not_push_over_limit() {
        let model = ComposerModel {
            content: format!("{}\n", "x".repeat(MAX_CONTENT_CHARS)),
            ..Default::default()
        };

        assert_eq!(model.char_count(), MAX_CONTENT_CHARS);
        assert!(!model.is_over_limit());
    }

    #[test]
    fn clear_keeps_visibility() {
        let mut model = ComposerModel::default();
        update(&mut model, ComposerMsg::ContentChanged("draft".into()));
        update(&mut model, ComposerMsg::VisibilityChanged(Visibility::Unlisted));

        model.clear();

        assert!(model.content.is_empty());
        assert_eq!(model.visibility, Visibility::Unlisted);
    }
}
