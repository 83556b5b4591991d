// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Top-level egui application shell for composing and publishing posts.
//! Handles layout, drag-and-drop, and wiring to the background workers.

pub mod components;

use std::sync::Arc;
use std::time::Instant;

use eframe::egui;

use crate::logic::api::Backend;
use crate::mvu::{self, AppModel, Command, Msg};
use crate::ui::components::attachments::AttachmentsMsg;
use crate::ui::components::{attachments, composer, history, login};

/// Stateful egui application driving the MVU kernel.
pub struct FediPostApp {
    model: AppModel,
    inbox: Vec<Msg>,
    cmd_tx: crossbeam_channel::Sender<Command>,
    msg_rx: crossbeam_channel::Receiver<Msg>,
}

impl FediPostApp {
    /// Spawn the worker pool and build an empty model.
    pub fn new(backend: Arc<dyn Backend>, model: AppModel) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<Msg>();

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().clamp(2, 4))
            .unwrap_or(2);
        for worker in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            let backend = Arc::clone(&backend);
            let spawned = std::thread::Builder::new()
                .name(format!("fedipost-worker-{worker}"))
                .spawn(move || {
                    for cmd in cmd_rx.iter() {
                        let msg = mvu::run_command(cmd, backend.as_ref());
                        if msg_tx.send(msg).is_err() {
                            break;
                        }
                    }
                });
            if let Err(err) = spawned {
                tracing::error!(worker, error = %err, "failed to spawn worker");
            }
        }
        tracing::debug!(threads, "worker pool started");

        Self {
            model,
            inbox: Vec::new(),
            cmd_tx,
            msg_rx,
        }
    }

    fn dispatch(&mut self, ctx: &egui::Context) {
        // Pull messages produced by the command workers.
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.model.pending_commands = self.model.pending_commands.saturating_sub(1);
            self.inbox.push(msg);
        }
        self.inbox.push(Msg::Tick(Instant::now()));

        let mut msgs = std::mem::take(&mut self.inbox);
        msgs.reverse();
        while let Some(msg) = msgs.pop() {
            match msg {
                Msg::PreviewDecoded { id, image } => {
                    let texture = ctx.load_texture(
                        format!("preview-{id}"),
                        image,
                        egui::TextureOptions::default(),
                    );
                    msgs.push(Msg::Attachments(AttachmentsMsg::PreviewReady { id, texture }));
                }
                other => {
                    let mut commands = Vec::new();
                    mvu::update(&mut self.model, other, &mut commands);
                    for cmd in commands {
                        if self.cmd_tx.send(cmd).is_ok() {
                            self.model.pending_commands += 1;
                        }
                    }
                }
            }
        }
    }

    fn collect_dropped_files(&mut self, ctx: &egui::Context) {
        if self.model.session.is_none() {
            return;
        }
        let dropped: Vec<_> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() {
            self.inbox
                .push(Msg::Attachments(AttachmentsMsg::FilesDropped(dropped)));
        }
    }

    fn schedule_repaint(&self, ctx: &egui::Context) {
        if self.model.pending_commands > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        } else if let Some(expiry) = self.model.next_expiry() {
            ctx.request_repaint_after(expiry.saturating_duration_since(Instant::now()));
        }
    }
}

impl eframe::App for FediPostApp {
    /// Required by eframe 0.34; all rendering happens in `update`, which the
    /// runtime still invokes before `ui` each frame.
    fn ui(&mut self, _ui: &mut egui::Ui, _frame: &mut eframe::Frame) {}

    /// Drain worker results, apply queued messages, then render either the
    /// login form or the composer with its history panel.
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);
        self.collect_dropped_files(ctx);
        self.dispatch(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("FediPost");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    self.render_theme_controls(ui);
                    if self.model.session.is_some() {
                        ui.separator();
                        self.render_account(ui);
                    }
                });
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status_panel")
            .resizable(false)
            .show(ctx, |ui| {
                self.render_notices(ui);
            });

        if self.model.session.is_none() {
            egui::CentralPanel::default().show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(40.0);
                    ui.set_max_width(360.0);
                    let msgs = login::view(ui, &self.model.login);
                    self.inbox.extend(msgs.into_iter().map(Msg::Login));
                });
            });
        } else {
            egui::SidePanel::right("history_panel")
                .resizable(true)
                .default_width(320.0)
                .show(ctx, |ui| {
                    let msgs = history::view(ui, &self.model.history);
                    self.inbox.extend(msgs.into_iter().map(Msg::History));
                });

            egui::CentralPanel::default().show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.render_composer(ui);
                });
            });
        }

        if !self.inbox.is_empty() {
            ctx.request_repaint();
        }
        self.schedule_repaint(ctx);
    }
}

impl FediPostApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    fn render_theme_controls(&mut self, ui: &mut egui::Ui) {
        ui.add_space(2.0);
        egui::widgets::global_theme_preference_switch(ui);
    }

    /// Account summary and logout button.
    fn render_account(&mut self, ui: &mut egui::Ui) {
        if ui
            .button(format!("{} Log out", egui_phosphor::regular::SIGN_OUT))
            .clicked()
        {
            self.inbox.push(Msg::Logout);
        }
        match &self.model.account {
            Some(account) => {
                let name = if account.display_name.is_empty() {
                    &account.username
                } else {
                    &account.display_name
                };
                ui.label(
                    egui::RichText::new(format!(
                        "{} following | {} followers",
                        account.following_count, account.followers_count
                    ))
                    .small()
                    .color(egui::Color32::from_gray(110)),
                );
                ui.label(format!("{} @{}", name, account.username));
            }
            None => {
                if let Some(session) = &self.model.session {
                    ui.label(format!("@{}", session.username));
                }
            }
        }
    }

    fn render_composer(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.model.is_submitting();

        ui.add_space(8.0);
        ui.label("New post");
        ui.add_space(4.0);
        let msgs = composer::view(ui, &self.model.composer, enabled);
        self.inbox.extend(msgs.into_iter().map(Msg::Composer));

        ui.add_space(12.0);
        ui.label("Media");
        ui.label(
            egui::RichText::new("Up to 4 images or 1 video, 50 MB each. Add alt-text for accessibility.")
                .small()
                .color(egui::Color32::from_gray(110)),
        );
        ui.add_space(4.0);
        let msgs = attachments::view(ui, &self.model.attachments, enabled);
        self.inbox.extend(msgs.into_iter().map(Msg::Attachments));

        ui.add_space(12.0);
        self.render_publish_button(ui);
    }

    /// The publish control stays disabled for the whole in-flight submission.
    fn render_publish_button(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let label = match self.model.submit {
                mvu::SubmitState::Submitting { media_count, .. } if media_count > 0 => {
                    format!("Uploading {media_count} file(s)…")
                }
                mvu::SubmitState::Submitting { .. } => "Publishing…".to_string(),
                mvu::SubmitState::Idle => {
                    format!("{} Publish", egui_phosphor::regular::PAPER_PLANE_TILT)
                }
            };
            let enabled = !self.model.is_submitting() && !self.model.composer.is_over_limit();
            if ui
                .add_enabled(enabled, egui::Button::new(label))
                .on_disabled_hover_text("Shorten the post or wait for the current upload")
                .clicked()
            {
                self.inbox.push(Msg::PublishRequested);
            }
            if self.model.is_submitting() {
                ui.add(egui::Spinner::new().size(14.0));
            }
        });
    }

    /// Render active notices, newest last, each with a dismiss button.
    fn render_notices(&mut self, ui: &mut egui::Ui) {
        if self.model.notices.is_empty() && self.model.pending_commands == 0 {
            ui.label(
                egui::RichText::new("Ready")
                    .small()
                    .color(egui::Color32::from_gray(110)),
            );
            return;
        }
        let mut dismiss = None;
        for (index, notice) in self.model.notices.iter().enumerate() {
            ui.horizontal(|ui| {
                let color = if notice.is_error {
                    egui::Color32::from_rgb(220, 53, 69)
                } else {
                    egui::Color32::from_rgb(25, 135, 84)
                };
                ui.label(egui::RichText::new(&notice.text).color(color));
                if ui
                    .small_button(egui_phosphor::regular::X)
                    .on_hover_text("Dismiss")
                    .clicked()
                {
                    dismiss = Some(index);
                }
            });
        }
        if self.model.pending_commands > 0 {
            ui.horizontal(|ui| {
                ui.add(egui::Spinner::new().size(14.0))
                    .on_hover_text(format!(
                        "{} task(s) running in background",
                        self.model.pending_commands
                    ));
            });
        }
        if let Some(index) = dismiss {
            self.inbox.push(Msg::DismissNotice(index));
        }
    }
}
