// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Attachment stager: accepts picked or dropped files, enforces the media
//! rules for a post, tracks previews and alt-texts until publish.

use std::fmt;
use std::path::{Path, PathBuf};

use eframe::egui;

use crate::error::InputValidationError;
use crate::logic::preview::{PreviewHandles, VideoContainer, VideoHandle};
use crate::logic::submission::MediaAttachment;
use crate::models::attachment::{
    AttachmentId, CandidateFile, MAX_ATTACHMENTS, MAX_VIDEOS, MediaKind, validate_file,
};
use crate::utils::icon_for;

/// Renderable preview of a staged file.
pub enum Preview {
    /// Derivation requested, result not back yet.
    Pending,
    Image(egui::TextureHandle),
    Video {
        handle: VideoHandle,
        container: VideoContainer,
    },
    Failed(String),
}

/// A file that passed validation and sits in the staging set.
#[derive(Debug)]
pub struct StagedAttachment {
    pub id: AttachmentId,
    pub path: PathBuf,
    pub name: String,
    pub mime_type: String,
    pub kind: MediaKind,
    pub size_bytes: u64,
    pub alt_text: String,
    pub preview: Preview,
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preview::Pending => f.write_str("Pending"),
            Preview::Image(texture) => f.debug_tuple("Image").field(&texture.id()).finish(),
            Preview::Video { handle, container } => f
                .debug_struct("Video")
                .field("handle", &handle.id())
                .field("container", container)
                .finish(),
            Preview::Failed(reason) => f.debug_tuple("Failed").field(reason).finish(),
        }
    }
}

impl StagedAttachment {
    /// Snapshot used to build the publish payload.
    pub fn to_media(&self) -> MediaAttachment {
        MediaAttachment {
            path: self.path.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            alt_text: self.alt_text.clone(),
        }
    }
}

/// MVU state for the staging set and its preview handles.
#[derive(Default)]
pub struct AttachmentsModel {
    staged: Vec<StagedAttachment>,
    handles: PreviewHandles,
}

/// Messages emitted by the attachments view or produced by worker results.
// Debug omitted because TextureHandle is not Debug.
pub enum AttachmentsMsg {
    RequestPickFiles,
    FilesPicked(Vec<PathBuf>),
    FilesDropped(Vec<PathBuf>),
    /// Inspection results for one picker/drop batch, in selection order.
    CandidatesRead(Vec<Result<CandidateFile, InputValidationError>>),
    PreviewReady {
        id: AttachmentId,
        texture: egui::TextureHandle,
    },
    VideoPreviewReady {
        id: AttachmentId,
        container: VideoContainer,
    },
    PreviewFailed {
        id: AttachmentId,
        reason: String,
    },
    Remove(usize),
    AltTextChanged {
        index: usize,
        text: String,
    },
    OpenVideo(usize),
}

/// Side effects requested by the stager.
#[derive(Debug, PartialEq, Eq)]
pub enum AttachmentsCommand {
    PickFiles,
    ReadCandidates(Vec<PathBuf>),
    LoadPreview {
        id: AttachmentId,
        path: PathBuf,
        kind: MediaKind,
    },
    OpenPath(PathBuf),
}

/// User-facing outcomes for the notice area.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttachmentsEvent {
    Staged { count: usize },
    Rejected(Vec<InputValidationError>),
    Removed { name: String },
    PreviewFailed { name: String, reason: String },
}

impl AttachmentsModel {
    /// Staged attachments in insertion order.
    pub fn staged(&self) -> &[StagedAttachment] {
        &self.staged
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn handles(&self) -> &PreviewHandles {
        &self.handles
    }

    /// Attachments with their alt-texts, in staging order.
    pub fn media(&self) -> Vec<MediaAttachment> {
        self.staged.iter().map(StagedAttachment::to_media).collect()
    }

    /// Validate a batch and append it atomically.
    ///
    /// Returns the newly staged attachments, or every violation found. On
    /// error the staging set is left untouched.
    pub fn stage_files(
        &mut self,
        candidates: Vec<CandidateFile>,
    ) -> Result<&[StagedAttachment], Vec<InputValidationError>> {
        self.stage_batch(candidates, Vec::new())
    }

    fn stage_batch(
        &mut self,
        candidates: Vec<CandidateFile>,
        mut errors: Vec<InputValidationError>,
    ) -> Result<&[StagedAttachment], Vec<InputValidationError>> {
        let mut accepted = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let violations = validate_file(&candidate);
            match MediaKind::from_mime(&candidate.mime_type) {
                Some(kind) if violations.is_empty() => accepted.push((candidate, kind)),
                _ => errors.extend(violations),
            }
        }

        errors.extend(composite_violations(&self.staged, &accepted));
        if !errors.is_empty() {
            tracing::info!(
                rejected = errors.len(),
                staged = self.staged.len(),
                "attachment batch rejected"
            );
            return Err(errors);
        }

        let start = self.staged.len();
        self.staged
            .extend(accepted.into_iter().map(|(c, kind)| StagedAttachment {
                id: c.id,
                path: c.path,
                name: c.name,
                mime_type: c.mime_type,
                kind,
                size_bytes: c.size_bytes,
                alt_text: String::new(),
                preview: Preview::Pending,
            }));
        Ok(&self.staged[start..])
    }

    /// Remove the attachment at `index`, releasing its preview handle.
    pub fn remove_attachment(&mut self, index: usize) -> Option<String> {
        if index >= self.staged.len() {
            return None;
        }
        let removed = self.staged.remove(index);
        let name = removed.name.clone();
        release(&mut self.handles, removed);
        Some(name)
    }

    /// Set the alt-text of the attachment at `index`. Returns false when out of range.
    pub fn update_alt_text(&mut self, index: usize, text: String) -> bool {
        match self.staged.get_mut(index) {
            Some(item) => {
                item.alt_text = text;
                true
            }
            None => false,
        }
    }

    /// Drop every staged attachment and release all video handles.
    pub fn reset(&mut self) {
        for attachment in std::mem::take(&mut self.staged) {
            release(&mut self.handles, attachment);
        }
    }

    fn find_pending(&mut self, id: AttachmentId) -> Option<&mut StagedAttachment> {
        self.staged
            .iter_mut()
            .find(|a| a.id == id && matches!(a.preview, Preview::Pending))
    }

    /// Attach a decoded image. False when the attachment is gone or already has a preview.
    pub fn attach_image_preview(&mut self, id: AttachmentId, texture: egui::TextureHandle) -> bool {
        match self.find_pending(id) {
            Some(item) => {
                item.preview = Preview::Image(texture);
                true
            }
            None => false,
        }
    }

    /// Open a handle for a probed video. No handle is opened for unknown ids.
    pub fn attach_video_preview(&mut self, id: AttachmentId, container: VideoContainer) -> bool {
        let Some(path) = self.find_pending(id).map(|item| item.path.clone()) else {
            return false;
        };
        let handle = self.handles.open(path);
        if let Some(item) = self.find_pending(id) {
            item.preview = Preview::Video { handle, container };
        }
        true
    }

    /// Record a preview failure; returns the affected file name.
    pub fn mark_preview_failed(&mut self, id: AttachmentId, reason: &str) -> Option<String> {
        let item = self.find_pending(id)?;
        item.preview = Preview::Failed(reason.to_string());
        Some(item.name.clone())
    }

    /// Playable path for the video at `index`, while its handle is live.
    pub fn video_path(&self, index: usize) -> Option<&Path> {
        match &self.staged.get(index)?.preview {
            Preview::Video { handle, .. } => self.handles.resolve(handle),
            _ => None,
        }
    }
}

/// Batch-level rules over the union of staged and newly accepted files.
fn composite_violations(
    staged: &[StagedAttachment],
    incoming: &[(CandidateFile, MediaKind)],
) -> Vec<InputValidationError> {
    let mut errors = Vec::new();
    if incoming.is_empty() {
        return errors;
    }

    let remaining = MAX_ATTACHMENTS.saturating_sub(staged.len());
    if incoming.len() > remaining {
        errors.push(InputValidationError::TooManyFiles {
            selected: incoming.len(),
            remaining,
            limit: MAX_ATTACHMENTS,
        });
    }

    let kinds = staged
        .iter()
        .map(|a| a.kind)
        .chain(incoming.iter().map(|(_, kind)| *kind));
    let (images, videos) = kinds.fold((0usize, 0usize), |(i, v), kind| match kind {
        MediaKind::Image => (i + 1, v),
        MediaKind::Video => (i, v + 1),
    });

    if images > 0 && videos > 0 {
        errors.push(InputValidationError::MixedMediaType);
    } else if videos > MAX_VIDEOS {
        errors.push(InputValidationError::MultipleVideosNotAllowed { count: videos });
    }

    errors
}

fn release(handles: &mut PreviewHandles, attachment: StagedAttachment) {
    if let Preview::Video { handle, .. } = attachment.preview
        && let Err(err) = handles.revoke(handle)
    {
        tracing::warn!(attachment = %attachment.id, error = %err, "failed to release video preview");
    }
}

/// Apply a message to the stager. Returns a user-facing event when relevant.
pub fn update(
    model: &mut AttachmentsModel,
    msg: AttachmentsMsg,
    cmds: &mut Vec<AttachmentsCommand>,
) -> Option<AttachmentsEvent> {
    match msg {
        AttachmentsMsg::RequestPickFiles => {
            cmds.push(AttachmentsCommand::PickFiles);
            None
        }
        AttachmentsMsg::FilesPicked(paths) => {
            tracing::debug!(count = paths.len(), "files picked");
            request_read(paths, cmds);
            None
        }
        AttachmentsMsg::FilesDropped(paths) => {
            tracing::debug!(count = paths.len(), "files dropped");
            request_read(paths, cmds);
            None
        }
        AttachmentsMsg::CandidatesRead(results) => {
            let mut unreadable = Vec::new();
            let mut candidates = Vec::with_capacity(results.len());
            for result in results {
                match result {
                    Ok(candidate) => candidates.push(candidate),
                    Err(err) => unreadable.push(err),
                }
            }
            match model.stage_batch(candidates, unreadable) {
                Ok([]) => None,
                Ok(new) => {
                    cmds.extend(new.iter().map(|a| AttachmentsCommand::LoadPreview {
                        id: a.id,
                        path: a.path.clone(),
                        kind: a.kind,
                    }));
                    Some(AttachmentsEvent::Staged { count: new.len() })
                }
                Err(errors) => Some(AttachmentsEvent::Rejected(errors)),
            }
        }
        AttachmentsMsg::PreviewReady { id, texture } => {
            if !model.attach_image_preview(id, texture) {
                tracing::debug!(attachment = %id, "discarding image preview for unstaged attachment");
            }
            None
        }
        AttachmentsMsg::VideoPreviewReady { id, container } => {
            if !model.attach_video_preview(id, container) {
                tracing::debug!(attachment = %id, "discarding video preview for unstaged attachment");
            }
            None
        }
        AttachmentsMsg::PreviewFailed { id, reason } => {
            tracing::warn!(attachment = %id, %reason, "preview derivation failed");
            model
                .mark_preview_failed(id, &reason)
                .map(|name| AttachmentsEvent::PreviewFailed { name, reason })
        }
        AttachmentsMsg::Remove(index) => model
            .remove_attachment(index)
            .map(|name| AttachmentsEvent::Removed { name }),
        AttachmentsMsg::AltTextChanged { index, text } => {
            model.update_alt_text(index, text);
            None
        }
        AttachmentsMsg::OpenVideo(index) => {
            if let Some(path) = model.video_path(index) {
                cmds.push(AttachmentsCommand::OpenPath(path.to_path_buf()));
            }
            None
        }
    }
}

fn request_read(paths: Vec<PathBuf>, cmds: &mut Vec<AttachmentsCommand>) {
    if !paths.is_empty() {
        cmds.push(AttachmentsCommand::ReadCandidates(paths));
    }
}

/// Render the stager and return any messages triggered by user interaction.
pub fn view(ui: &mut egui::Ui, model: &AttachmentsModel, enabled: bool) -> Vec<AttachmentsMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        let can_add = enabled && model.len() < MAX_ATTACHMENTS;
        let add = egui::Button::new(format!("{} Add media", egui_phosphor::regular::PLUS));
        if ui
            .add_enabled(can_add, add)
            .on_hover_text("Add up to 4 images or a single video")
            .on_disabled_hover_text("Attachment limit reached")
            .clicked()
        {
            msgs.push(AttachmentsMsg::RequestPickFiles);
        }
        ui.label(
            egui::RichText::new(format!("{}/{} attached", model.len(), MAX_ATTACHMENTS))
                .small()
                .color(egui::Color32::from_gray(110)),
        );
    });

    ui.add_space(6.0);

    let hovering_files = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
    let visuals = ui.visuals().clone();
    let stroke = if hovering_files {
        egui::Stroke::new(2.0, visuals.selection.bg_fill)
    } else {
        visuals.window_stroke()
    };

    egui::Frame::new()
        .fill(visuals.panel_fill)
        .stroke(stroke)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            if model.staged.is_empty() {
                ui.label(
                    egui::RichText::new("Drop images or a video here")
                        .color(egui::Color32::from_gray(150)),
                );
            } else {
                render_staged_list(ui, model, enabled, &mut msgs);
            }
        });

    msgs
}

fn render_staged_list(
    ui: &mut egui::Ui,
    model: &AttachmentsModel,
    enabled: bool,
    msgs: &mut Vec<AttachmentsMsg>,
) {
    for (index, item) in model.staged.iter().enumerate() {
        ui.horizontal(|ui| {
            render_preview(ui, item);

            ui.vertical(|ui| {
                ui.label(format!(
                    "{} {}",
                    icon_for(item.kind, &item.mime_type),
                    item.name
                ));
                ui.label(
                    egui::RichText::new(format!(
                        "{} | {}",
                        item.mime_type,
                        format_bytes(item.size_bytes)
                    ))
                    .small()
                    .color(egui::Color32::from_gray(90)),
                );

                let mut alt = item.alt_text.clone();
                let response = ui.add_enabled(
                    enabled,
                    egui::TextEdit::singleline(&mut alt)
                        .hint_text("Describe this for people using screen readers")
                        .desired_width(280.0),
                );
                if response.changed() {
                    msgs.push(AttachmentsMsg::AltTextChanged { index, text: alt });
                }
            });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui
                    .add_enabled(
                        enabled,
                        egui::Button::new(egui::RichText::new(
                            egui_phosphor::regular::TRASH_SIMPLE,
                        )),
                    )
                    .on_hover_text("Remove attachment")
                    .clicked()
                {
                    msgs.push(AttachmentsMsg::Remove(index));
                }
                if matches!(item.preview, Preview::Video { .. })
                    && ui
                        .button(egui_phosphor::regular::PLAY)
                        .on_hover_text("Play in system player")
                        .clicked()
                {
                    msgs.push(AttachmentsMsg::OpenVideo(index));
                }
            });
        });

        if index + 1 < model.staged.len() {
            ui.separator();
        }
    }
}

fn render_preview(ui: &mut egui::Ui, item: &StagedAttachment) {
    const SLOT: egui::Vec2 = egui::vec2(96.0, 72.0);

    match &item.preview {
        Preview::Image(texture) => {
            let size = texture.size_vec2();
            let scale = (SLOT.x / size.x).min(SLOT.y / size.y).min(1.0);
            ui.add(egui::Image::new((texture.id(), size * scale)));
        }
        Preview::Video { container, .. } => {
            ui.allocate_ui(SLOT, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new(egui_phosphor::regular::FILM_STRIP).size(32.0));
                    ui.label(egui::RichText::new(container.label()).small());
                });
            });
        }
        Preview::Pending => {
            ui.allocate_ui(SLOT, |ui| {
                ui.add(egui::Spinner::new().size(18.0));
            });
        }
        Preview::Failed(reason) => {
            ui.allocate_ui(SLOT, |ui| {
                ui.label(
                    egui::RichText::new(egui_phosphor::regular::WARNING)
                        .size(28.0)
                        .color(egui::Color32::from_rgb(232, 89, 12)),
                )
                .on_hover_text(format!("Preview unavailable: {reason}"));
            });
        }
    }
}

/// Human-readable formatting for byte sizes with binary units.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
