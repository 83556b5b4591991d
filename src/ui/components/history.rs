// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! List of previously published posts.

use eframe::egui;

use crate::error::SubmissionError;
use crate::models::post::Post;
use crate::utils::html_to_text;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HistoryModel {
    posts: Vec<Post>,
    loading: bool,
    error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryMsg {
    Refresh,
    Loaded(Result<Vec<Post>, SubmissionError>),
    OpenPost(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HistoryCommand {
    Fetch,
    OpenUrl(String),
}

impl HistoryModel {
    /// Posts as last returned by the backend, in the server's order.
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Apply a message. Returns the error of a failed load so the caller can react to it.
pub fn update(
    model: &mut HistoryModel,
    msg: HistoryMsg,
    cmds: &mut Vec<HistoryCommand>,
) -> Option<SubmissionError> {
    match msg {
        HistoryMsg::Refresh => {
            if !model.loading {
                model.loading = true;
                cmds.push(HistoryCommand::Fetch);
            }
            None
        }
        HistoryMsg::Loaded(Ok(posts)) => {
            tracing::debug!(count = posts.len(), "post history loaded");
            model.posts = posts;
            model.loading = false;
            model.error = None;
            None
        }
        HistoryMsg::Loaded(Err(err)) => {
            tracing::warn!(error = %err, "failed to load post history");
            model.loading = false;
            model.error = Some(err.to_string());
            Some(err)
        }
        HistoryMsg::OpenPost(url) => {
            cmds.push(HistoryCommand::OpenUrl(url));
            None
        }
    }
}

/// Render the history panel and return any messages triggered by user interaction.
pub fn view(ui: &mut egui::Ui, model: &HistoryModel) -> Vec<HistoryMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        ui.heading("Your posts");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui
                .add_enabled(
                    !model.loading,
                    egui::Button::new(egui_phosphor::regular::ARROWS_CLOCKWISE),
                )
                .on_hover_text("Refresh")
                .clicked()
            {
                msgs.push(HistoryMsg::Refresh);
            }
            if model.loading {
                ui.add(egui::Spinner::new().size(14.0));
            }
        });
    });

    if let Some(error) = &model.error {
        ui.colored_label(egui::Color32::from_rgb(220, 53, 69), error);
    }

    if model.posts.is_empty() && !model.loading {
        ui.label(egui::RichText::new("Nothing published yet.").color(egui::Color32::from_gray(150)));
        return msgs;
    }

    egui::ScrollArea::vertical()
        .id_salt("history_scroll")
        .show(ui, |ui| {
            for post in &model.posts {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(
                        egui::RichText::new(post.display_time())
                            .small()
                            .color(egui::Color32::from_gray(110)),
                    );
                    let text = html_to_text(&post.content);
                    if !text.is_empty() {
                        ui.label(text);
                    }
                    ui.horizontal(|ui| {
                        if post.media_count > 0 {
                            ui.label(
                                egui::RichText::new(format!(
                                    "{} {}",
                                    egui_phosphor::regular::PAPERCLIP,
                                    post.media_count
                                ))
                                .small(),
                            );
                        }
                        if let Some(url) = &post.url
                            && ui
                                .small_button(format!(
                                    "{} Open",
                                    egui_phosphor::regular::ARROW_SQUARE_OUT
                                ))
                                .clicked()
                        {
                            msgs.push(HistoryMsg::OpenPost(url.clone()));
                        }
                    });
                });
            }
        });

    msgs
}
