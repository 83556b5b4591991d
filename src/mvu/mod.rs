// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Root Model-View-Update kernel wiring component state, messages, and commands.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::error::{AuthError, InputValidationError, SubmissionError};
use crate::logic::api::Backend;
use crate::logic::preview::{load_image_thumbnail, probe_video};
use crate::logic::submission::{
    SubmissionDraft, SubmissionPayload, build_submission_payload, success_message,
};
use crate::models::attachment::{
    AttachmentId, CandidateFile, MediaKind, PICKER_EXTENSIONS,
};
use crate::models::post::{AccountInfo, Post};
use crate::models::session::{AuthRequest, Session};
use crate::ui::components::attachments::{
    self, AttachmentsCommand, AttachmentsEvent, AttachmentsModel, AttachmentsMsg,
};
use crate::ui::components::composer::{self, ComposerModel, ComposerMsg};
use crate::ui::components::history::{self, HistoryCommand, HistoryModel, HistoryMsg};
use crate::ui::components::login::{self, LoginModel, LoginMsg};

/// Default lifetime of a notice when none is configured.
pub const DEFAULT_NOTICE_WINDOW: Duration = Duration::from_secs(5);

/// Dismissible, auto-expiring user message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
    pub expires_at: Instant,
}

/// Publish lifecycle. Validation happens synchronously inside `update`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmitState {
    #[default]
    Idle,
    Submitting { attempt: u64, media_count: usize },
}

/// Top-level application state.
pub struct AppModel {
    /// Present while logged in.
    pub session: Option<Session>,
    pub login: LoginModel,
    pub composer: ComposerModel,
    /// Staged media for the next post.
    pub attachments: AttachmentsModel,
    pub history: HistoryModel,
    pub account: Option<AccountInfo>,
    pub submit: SubmitState,
    pub notices: Vec<Notice>,
    /// Count of queued background commands.
    pub pending_commands: usize,
    notice_window: Duration,
    next_attempt: u64,
    /// Bumped whenever the session changes; tags account and history requests.
    session_epoch: u64,
    /// Media selected while a post was in flight, staged once it settles.
    deferred: Vec<AttachmentsMsg>,
}

impl Default for AppModel {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_WINDOW)
    }
}

impl AppModel {
    pub fn new(notice_window: Duration) -> Self {
        Self {
            session: None,
            login: LoginModel::default(),
            composer: ComposerModel::default(),
            attachments: AttachmentsModel::default(),
            history: HistoryModel::default(),
            account: None,
            submit: SubmitState::Idle,
            notices: Vec::new(),
            pending_commands: 0,
            notice_window,
            next_attempt: 0,
            session_epoch: 0,
            deferred: Vec::new(),
        }
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.submit, SubmitState::Submitting { .. })
    }

    /// Earliest moment a notice will expire, for repaint scheduling.
    pub fn next_expiry(&self) -> Option<Instant> {
        self.notices.iter().map(|n| n.expires_at).min()
    }

    fn notify(&mut self, text: impl Into<String>, is_error: bool) {
        self.notices.push(Notice {
            text: text.into(),
            is_error,
            expires_at: Instant::now() + self.notice_window,
        });
    }

    fn draft(&self) -> SubmissionDraft {
        SubmissionDraft {
            content: self.composer.content.clone(),
            visibility: self.composer.visibility,
            attachments: self.attachments.media(),
        }
    }

    /// Clear the draft: text, staged media (releasing previews) and notices.
    fn reset_draft(&mut self) {
        self.composer.clear();
        self.attachments.reset();
        self.notices.clear();
    }
}

/// Application messages routed through the update function.
pub enum Msg {
    Login(LoginMsg),
    AuthCompleted(Result<Session, AuthError>),
    Logout,
    Composer(ComposerMsg),
    Attachments(AttachmentsMsg),
    /// Decoded thumbnail; turned into a texture on the UI thread before reaching `update`.
    PreviewDecoded {
        id: AttachmentId,
        image: egui::ColorImage,
    },
    PublishRequested,
    PublishCompleted {
        attempt: u64,
        result: Result<Post, SubmissionError>,
    },
    History(HistoryMsg),
    PostsLoaded {
        epoch: u64,
        result: Result<Vec<Post>, SubmissionError>,
    },
    AccountLoaded {
        epoch: u64,
        result: Result<AccountInfo, SubmissionError>,
    },
    OpenCompleted(Result<(), String>),
    DismissNotice(usize),
    Tick(Instant),
}

/// Side effects executed on worker threads.
pub enum Command {
    Authenticate(AuthRequest),
    PickFiles,
    ReadCandidates(Vec<PathBuf>),
    LoadPreview {
        id: AttachmentId,
        path: PathBuf,
        kind: MediaKind,
    },
    OpenPath(PathBuf),
    OpenUrl(String),
    Publish {
        attempt: u64,
        session: Session,
        payload: SubmissionPayload,
    },
    FetchPosts { epoch: u64, session: Session },
    FetchAccount { epoch: u64, session: Session },
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::Login(m) => {
            if let Some(request) = login::update(&mut model.login, m) {
                tracing::info!(username = request.username(), "authenticating");
                cmds.push(Command::Authenticate(request));
            }
        }
        Msg::AuthCompleted(Ok(session)) => {
            if model.session.is_some() {
                tracing::debug!("ignoring authentication result, already logged in");
                return;
            }
            model.login.succeed();
            model.notify(format!("Logged in as {}", session.username), false);
            model.session_epoch += 1;
            cmds.push(Command::FetchAccount {
                epoch: model.session_epoch,
                session: session.clone(),
            });
            model.session = Some(session);
            model.history.clear();
            update(model, Msg::History(HistoryMsg::Refresh), cmds);
        }
        Msg::AuthCompleted(Err(err)) => {
            tracing::warn!(error = %err, "authentication failed");
            model.login.fail(err.messages());
        }
        Msg::Logout => logout(model),
        Msg::Composer(m) => {
            if !model.is_submitting() {
                composer::update(&mut model.composer, m);
            }
        }
        Msg::Attachments(m) => {
            if model.is_submitting() && is_staging_edit(&m) {
                if is_incoming_media(&m) {
                    model.deferred.push(m);
                    model.notify("Selected media will be added once the current post is sent", false);
                } else {
                    tracing::debug!("ignoring staging change while a post is in flight");
                }
                return;
            }
            let mut att_cmds = Vec::new();
            if let Some(event) = attachments::update(&mut model.attachments, m, &mut att_cmds) {
                surface_attachment_event(model, event);
            }
            cmds.extend(att_cmds.into_iter().map(|c| match c {
                AttachmentsCommand::PickFiles => Command::PickFiles,
                AttachmentsCommand::ReadCandidates(paths) => Command::ReadCandidates(paths),
                AttachmentsCommand::LoadPreview { id, path, kind } => {
                    Command::LoadPreview { id, path, kind }
                }
                AttachmentsCommand::OpenPath(path) => Command::OpenPath(path),
            }));
        }
        Msg::PreviewDecoded { id, .. } => {
            // Textures need the egui context; the UI shell converts this before `update`.
            tracing::debug!(attachment = %id, "decoded preview reached update without a texture");
        }
        Msg::PublishRequested => request_publish(model, cmds),
        Msg::PublishCompleted { attempt, result } => complete_publish(model, attempt, result, cmds),
        Msg::History(m) => {
            let mut history_cmds = Vec::new();
            if let Some(err) = history::update(&mut model.history, m, &mut history_cmds)
                && err == SubmissionError::Unauthorized
            {
                expire_session(model);
                return;
            }
            for c in history_cmds {
                match c {
                    HistoryCommand::Fetch => match &model.session {
                        Some(session) => cmds.push(Command::FetchPosts {
                            epoch: model.session_epoch,
                            session: session.clone(),
                        }),
                        None => model.history.clear(),
                    },
                    HistoryCommand::OpenUrl(url) => cmds.push(Command::OpenUrl(url)),
                }
            }
        }
        Msg::PostsLoaded { epoch, result } => {
            if is_stale(model, epoch) {
                tracing::debug!(epoch, "dropping post history from a previous session");
                return;
            }
            update(model, Msg::History(HistoryMsg::Loaded(result)), cmds);
        }
        Msg::AccountLoaded { epoch, result } => {
            if is_stale(model, epoch) {
                tracing::debug!(epoch, "dropping account info from a previous session");
                return;
            }
            match result {
                Ok(account) => model.account = Some(account),
                Err(SubmissionError::Unauthorized) => expire_session(model),
                Err(err) => tracing::warn!(error = %err, "failed to load account info"),
            }
        }
        Msg::OpenCompleted(Ok(())) => {}
        Msg::OpenCompleted(Err(err)) => model.notify(err, true),
        Msg::DismissNotice(index) => {
            if index < model.notices.len() {
                model.notices.remove(index);
            }
        }
        Msg::Tick(now) => model.notices.retain(|n| n.expires_at > now),
    }
}

/// Whether a session-scoped result belongs to a session that no longer exists.
fn is_stale(model: &AppModel, epoch: u64) -> bool {
    model.session.is_none() || epoch != model.session_epoch
}

fn is_incoming_media(msg: &AttachmentsMsg) -> bool {
    matches!(
        msg,
        AttachmentsMsg::FilesPicked(_)
            | AttachmentsMsg::FilesDropped(_)
            | AttachmentsMsg::CandidatesRead(_)
    )
}

fn is_staging_edit(msg: &AttachmentsMsg) -> bool {
    matches!(
        msg,
        AttachmentsMsg::RequestPickFiles
            | AttachmentsMsg::FilesPicked(_)
            | AttachmentsMsg::FilesDropped(_)
            | AttachmentsMsg::CandidatesRead(_)
            | AttachmentsMsg::Remove(_)
            | AttachmentsMsg::AltTextChanged { .. }
    )
}

fn surface_attachment_event(model: &mut AppModel, event: AttachmentsEvent) {
    match event {
        AttachmentsEvent::Staged { count } => {
            model.notify(format!("Attached {count} file(s)"), false);
        }
        AttachmentsEvent::Rejected(errors) => {
            for err in errors {
                model.notify(err.to_string(), true);
            }
        }
        AttachmentsEvent::Removed { name } => model.notify(format!("Removed {name}"), false),
        AttachmentsEvent::PreviewFailed { name, reason } => {
            model.notify(format!("Preview unavailable for {name}: {reason}"), true);
        }
    }
}

fn request_publish(model: &mut AppModel, cmds: &mut Vec<Command>) {
    if model.is_submitting() {
        tracing::debug!("publish already in flight");
        return;
    }
    let Some(session) = model.session.clone() else {
        tracing::warn!("publish requested without a session");
        return;
    };

    let payload = match build_submission_payload(&model.draft()) {
        Ok(payload) => payload,
        Err(err) => {
            surface_validation_error(model, err);
            return;
        }
    };

    model.next_attempt += 1;
    let attempt = model.next_attempt;
    let media_count = payload.media_count();
    tracing::info!(attempt, media_count, "publishing post");
    model.submit = SubmitState::Submitting {
        attempt,
        media_count,
    };
    cmds.push(Command::Publish {
        attempt,
        session,
        payload,
    });
}

fn surface_validation_error(model: &mut AppModel, err: InputValidationError) {
    tracing::debug!(error = %err, "draft rejected before publish");
    model.notify(err.to_string(), true);
}

fn complete_publish(
    model: &mut AppModel,
    attempt: u64,
    result: Result<Post, SubmissionError>,
    cmds: &mut Vec<Command>,
) {
    match model.submit {
        SubmitState::Submitting { attempt: current, .. } if current == attempt => {}
        _ => {
            tracing::info!(attempt, "dropping publish result for an abandoned attempt");
            return;
        }
    }
    model.submit = SubmitState::Idle;

    match result {
        Ok(post) => {
            tracing::info!(attempt, post = %post.id, media = post.media_count, "post published");
            model.reset_draft();
            model.notify(success_message(post.media_count), false);
            update(model, Msg::History(HistoryMsg::Refresh), cmds);
        }
        Err(SubmissionError::Unauthorized) => {
            tracing::warn!(attempt, "session rejected while publishing");
            expire_session(model);
        }
        Err(err) => {
            tracing::warn!(attempt, error = %err, transient = err.is_transient(), "publish failed");
            model.notify(err.to_string(), true);
        }
    }

    for deferred in std::mem::take(&mut model.deferred) {
        update(model, Msg::Attachments(deferred), cmds);
    }
}

/// Drop the session after the backend rejected its token.
///
/// The draft stays, and an in-flight publish keeps its attempt so its result
/// is still applied when it arrives.
fn expire_session(model: &mut AppModel) {
    if model.session.take().is_some() {
        model.session_epoch += 1;
        model.account = None;
        model.history.clear();
        model.notify(SubmissionError::Unauthorized.to_string(), true);
    }
}

fn logout(model: &mut AppModel) {
    let Some(session) = model.session.take() else {
        return;
    };
    tracing::info!(username = %session.username, in_flight = model.is_submitting(), "logging out");
    model.reset_draft();
    model.deferred.clear();
    model.session_epoch += 1;
    model.submit = SubmitState::Idle;
    model.account = None;
    model.history.clear();
    model.login = LoginModel::for_user(session.username);
}

/// Execute a command (on a worker thread) and return a resulting message.
pub fn run_command(cmd: Command, backend: &dyn Backend) -> Msg {
    match cmd {
        Command::Authenticate(request) => {
            let result = match &request {
                AuthRequest::Login(credentials) => backend.login(credentials),
                AuthRequest::Register(registration) => backend.register(registration),
            };
            Msg::AuthCompleted(result)
        }
        Command::PickFiles => {
            let files = rfd::FileDialog::new()
                .set_title("Select images or a video")
                .add_filter("Images and videos", PICKER_EXTENSIONS)
                .pick_files()
                .unwrap_or_default();
            Msg::Attachments(AttachmentsMsg::FilesPicked(files))
        }
        Command::ReadCandidates(paths) => {
            let results = paths.iter().map(|p| CandidateFile::from_path(p)).collect();
            Msg::Attachments(AttachmentsMsg::CandidatesRead(results))
        }
        Command::LoadPreview { id, path, kind } => match kind {
            MediaKind::Image => match load_image_thumbnail(&path) {
                Ok(image) => Msg::PreviewDecoded { id, image },
                Err(err) => Msg::Attachments(AttachmentsMsg::PreviewFailed {
                    id,
                    reason: format!("{err:#}"),
                }),
            },
            MediaKind::Video => match probe_video(&path) {
                Ok(container) => Msg::Attachments(AttachmentsMsg::VideoPreviewReady { id, container }),
                Err(err) => Msg::Attachments(AttachmentsMsg::PreviewFailed {
                    id,
                    reason: format!("{err:#}"),
                }),
            },
        },
        Command::OpenPath(path) => Msg::OpenCompleted(
            open::that(&path).map_err(|e| format!("Could not open {}: {e}", path.display())),
        ),
        Command::OpenUrl(url) => {
            Msg::OpenCompleted(open::that(&url).map_err(|e| format!("Could not open {url}: {e}")))
        }
        Command::Publish {
            attempt,
            session,
            payload,
        } => Msg::PublishCompleted {
            attempt,
            result: backend.publish(&session, &payload),
        },
        Command::FetchPosts { epoch, session } => Msg::PostsLoaded {
            epoch,
            result: backend.list_posts(&session),
        },
        Command::FetchAccount { epoch, session } => Msg::AccountLoaded {
            epoch,
            result: backend.account_info(&session),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use image::{ImageBuffer, Rgba};
    use tempfile::TempDir;

    use super::*;
    use crate::logic::preview::VideoContainer;
    use crate::models::attachment::MIB;
    use crate::models::post::PostId;
    use crate::models::session::{Credentials, Registration};

    /// In-memory backend that records publish payloads.
    #[derive(Default)]
    struct FakeBackend {
        publish_result: Mutex<Option<Result<Post, SubmissionError>>>,
        published: Mutex<Vec<(usize, String)>>,
    }

    impl FakeBackend {
        fn answering(result: Result<Post, SubmissionError>) -> Self {
            Self {
                publish_result: Mutex::new(Some(result)),
                ..Default::default()
            }
        }
    }

    impl Backend for FakeBackend {
        fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
            if credentials.password == "hunter2" {
                Ok(Session::new(credentials.username.clone(), "tok"))
            } else {
                Err(AuthError::Rejected(vec![
                    "Unable to log in with provided credentials.".into(),
                ]))
            }
        }

        fn register(&self, registration: &Registration) -> Result<Session, AuthError> {
            self.login(&registration.credentials())
        }

        fn publish(
            &self,
            _session: &Session,
            payload: &SubmissionPayload,
        ) -> Result<Post, SubmissionError> {
            self.published
                .lock()
                .unwrap()
                .push((payload.media_count(), payload.content().to_string()));
            self.publish_result
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(SubmissionError::Network("no answer configured".into())))
        }

        fn list_posts(&self, _session: &Session) -> Result<Vec<Post>, SubmissionError> {
            Ok(Vec::new())
        }

        fn account_info(&self, session: &Session) -> Result<AccountInfo, SubmissionError> {
            Ok(AccountInfo {
                username: session.username.clone(),
                display_name: "Ada".into(),
                followers_count: 3,
                following_count: 7,
            })
        }
    }

    fn published_post(media_count: usize) -> Post {
        Post {
            id: PostId::Number(42),
            content: "<p>hi</p>".into(),
            created_at: "2025-05-01T12:00:00Z".into(),
            media_count,
            url: None,
        }
    }

    fn logged_in() -> AppModel {
        let mut model = AppModel::default();
        model.session = Some(Session::new("ada", "tok"));
        model
    }

    fn stage(model: &mut AppModel, files: Vec<CandidateFile>) {
        let mut cmds = Vec::new();
        update(
            model,
            Msg::Attachments(AttachmentsMsg::CandidatesRead(
                files.into_iter().map(Ok).collect(),
            )),
            &mut cmds,
        );
    }

    fn candidate(name: &str, mime: &str) -> CandidateFile {
        CandidateFile::new(PathBuf::from(name), name.into(), mime.into(), MIB)
    }

    fn only_publish(cmds: Vec<Command>) -> Command {
        let mut publishes: Vec<Command> = cmds
            .into_iter()
            .filter(|c| matches!(c, Command::Publish { .. }))
            .collect();
        assert_eq!(publishes.len(), 1, "expected exactly one publish command");
        publishes.remove(0)
    }

    fn has_notice(model: &AppModel, needle: &str) -> bool {
        model.notices.iter().any(|n| n.text.contains(needle))
    }

    #[test]
    fn publish_success_resets_draft_once_and_reports_media_count() {
        let backend = FakeBackend::answering(Ok(published_post(2)));
        let mut model = logged_in();
        update(&mut model, Msg::Composer(ComposerMsg::ContentChanged("Hello".into())), &mut Vec::new());
        stage(&mut model, vec![candidate("a.png", "image/png"), candidate("b.png", "image/png")]);

        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);
        assert!(model.is_submitting());

        let msg = run_command(only_publish(cmds), &backend);
        let mut cmds = Vec::new();
        update(&mut model, msg, &mut cmds);

        assert_eq!(model.submit, SubmitState::Idle);
        assert!(model.attachments.is_empty());
        assert!(model.composer.content.is_empty());
        assert!(has_notice(
            &model,
            "Post with 2 media file(s) published to Mastodon successfully!"
        ));
        assert!(cmds.iter().any(|c| matches!(c, Command::FetchPosts { .. })));
        assert_eq!(backend.published.lock().unwrap().as_slice(), &[(2, "Hello".to_string())]);
    }

    #[test]
    fn successful_publish_releases_video_handle_exactly_once() {
        let mut model = logged_in();
        stage(&mut model, vec![candidate("clip.mp4", "video/mp4")]);
        let id = model.attachments.staged()[0].id;
        update(
            &mut model,
            Msg::Attachments(AttachmentsMsg::VideoPreviewReady {
                id,
                container: VideoContainer::Mp4,
            }),
            &mut Vec::new(),
        );

        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);
        let Command::Publish { attempt, .. } = only_publish(cmds) else {
            unreachable!()
        };
        for _ in 0..2 {
            update(
                &mut model,
                Msg::PublishCompleted {
                    attempt,
                    result: Ok(published_post(1)),
                },
                &mut Vec::new(),
            );
        }

        assert_eq!(model.attachments.handles().revoked_count(), 1);
        assert_eq!(model.attachments.handles().live_count(), 0);
    }

    #[test]
    fn duplicate_publish_requests_are_ignored_while_submitting() {
        let mut model = logged_in();
        update(&mut model, Msg::Composer(ComposerMsg::ContentChanged("once".into())), &mut Vec::new());

        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);
        update(&mut model, Msg::PublishRequested, &mut cmds);

        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn empty_draft_is_rejected_without_a_request() {
        let mut model = logged_in();
        let mut cmds = Vec::new();

        update(&mut model, Msg::PublishRequested, &mut cmds);

        assert!(cmds.is_empty());
        assert_eq!(model.submit, SubmitState::Idle);
        assert!(model.notices.iter().any(|n| n.is_error));
    }

    #[test]
    fn failed_publish_keeps_the_draft_for_retry() {
        let backend = FakeBackend::answering(Err(SubmissionError::FilesTooLarge));
        let mut model = logged_in();
        update(&mut model, Msg::Composer(ComposerMsg::ContentChanged("keep me".into())), &mut Vec::new());
        stage(&mut model, vec![candidate("a.png", "image/png")]);

        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);
        let msg = run_command(only_publish(cmds), &backend);
        update(&mut model, msg, &mut Vec::new());

        assert_eq!(model.submit, SubmitState::Idle);
        assert_eq!(model.composer.content, "keep me");
        assert_eq!(model.attachments.len(), 1);
        assert!(has_notice(&model, "Please reduce the file sizes"));
        assert!(model.session.is_some());
    }

    #[test]
    fn unauthorized_publish_destroys_the_session() {
        let mut model = logged_in();
        update(&mut model, Msg::Composer(ComposerMsg::ContentChanged("x".into())), &mut Vec::new());
        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);
        let Command::Publish { attempt, .. } = only_publish(cmds) else {
            unreachable!()
        };

        update(
            &mut model,
            Msg::PublishCompleted {
                attempt,
                result: Err(SubmissionError::Unauthorized),
            },
            &mut Vec::new(),
        );

        assert!(model.session.is_none());
        assert_eq!(model.composer.content, "x");
    }

    #[test]
    fn logout_during_submission_releases_handles_and_drops_late_result() {
        let mut model = logged_in();
        stage(&mut model, vec![candidate("clip.webm", "video/webm")]);
        let id = model.attachments.staged()[0].id;
        update(
            &mut model,
            Msg::Attachments(AttachmentsMsg::VideoPreviewReady {
                id,
                container: VideoContainer::WebM,
            }),
            &mut Vec::new(),
        );
        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);
        let Command::Publish { attempt, .. } = only_publish(cmds) else {
            unreachable!()
        };

        update(&mut model, Msg::Logout, &mut Vec::new());
        assert_eq!(model.attachments.handles().live_count(), 0);
        assert_eq!(model.login.username, "ada");

        update(
            &mut model,
            Msg::PublishCompleted {
                attempt,
                result: Ok(published_post(1)),
            },
            &mut Vec::new(),
        );
        assert!(model.session.is_none());
        assert!(model.notices.is_empty());
    }

    #[test]
    fn staging_is_locked_while_submitting() {
        let mut model = logged_in();
        stage(&mut model, vec![candidate("a.png", "image/png")]);
        update(&mut model, Msg::PublishRequested, &mut Vec::new());

        update(&mut model, Msg::Attachments(AttachmentsMsg::Remove(0)), &mut Vec::new());
        stage(&mut model, vec![candidate("b.png", "image/png")]);

        assert_eq!(model.attachments.len(), 1);
    }

    #[test]
    fn media_picked_while_submitting_is_staged_after_the_result() {
        let mut model = logged_in();
        update(&mut model, Msg::Composer(ComposerMsg::ContentChanged("Hello".into())), &mut Vec::new());
        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);
        let Command::Publish { attempt, .. } = only_publish(cmds) else {
            unreachable!()
        };

        stage(&mut model, vec![candidate("late.png", "image/png")]);
        assert!(model.attachments.is_empty());
        assert!(has_notice(&model, "will be added once the current post is sent"));

        let mut cmds = Vec::new();
        update(
            &mut model,
            Msg::PublishCompleted {
                attempt,
                result: Err(SubmissionError::Network("timed out".into())),
            },
            &mut cmds,
        );

        assert_eq!(model.attachments.len(), 1);
        assert_eq!(model.attachments.staged()[0].name, "late.png");
        assert!(cmds.iter().any(|c| matches!(c, Command::LoadPreview { .. })));
    }

    fn login_as(model: &mut AppModel, backend: &FakeBackend, username: &str) -> Vec<Command> {
        let mut cmds = Vec::new();
        update(model, Msg::Login(LoginMsg::UsernameChanged(username.into())), &mut cmds);
        update(model, Msg::Login(LoginMsg::PasswordChanged("hunter2".into())), &mut cmds);
        update(model, Msg::Login(LoginMsg::Submit), &mut cmds);
        let msg = run_command(cmds.remove(0), backend);
        let mut cmds = Vec::new();
        update(model, msg, &mut cmds);
        cmds
    }

    #[test]
    fn results_from_a_previous_session_are_dropped() {
        let backend = FakeBackend::default();
        let mut model = AppModel::default();

        let alice_cmds = login_as(&mut model, &backend, "alice");
        update(&mut model, Msg::Logout, &mut Vec::new());
        let bob_cmds = login_as(&mut model, &backend, "bob");
        for cmd in bob_cmds {
            let msg = run_command(cmd, &backend);
            update(&mut model, msg, &mut Vec::new());
        }
        assert_eq!(model.account.as_ref().map(|a| a.username.as_str()), Some("bob"));

        for cmd in alice_cmds {
            let late = match run_command(cmd, &backend) {
                Msg::PostsLoaded { epoch, .. } => Msg::PostsLoaded {
                    epoch,
                    result: Err(SubmissionError::Unauthorized),
                },
                other => other,
            };
            update(&mut model, late, &mut Vec::new());
        }

        assert_eq!(model.session.as_ref().map(|s| s.username.as_str()), Some("bob"));
        assert_eq!(model.account.as_ref().map(|a| a.username.as_str()), Some("bob"));
        assert!(!has_notice(&model, &SubmissionError::Unauthorized.to_string()));
    }

    #[test]
    fn session_expiry_keeps_the_in_flight_publish() {
        let backend = FakeBackend::answering(Ok(published_post(0)));
        let mut model = AppModel::default();
        let login_cmds = login_as(&mut model, &backend, "ada");
        let epoch = login_cmds
            .iter()
            .find_map(|c| match c {
                Command::FetchPosts { epoch, .. } => Some(*epoch),
                _ => None,
            })
            .unwrap();
        update(&mut model, Msg::Composer(ComposerMsg::ContentChanged("Hello".into())), &mut Vec::new());
        let mut cmds = Vec::new();
        update(&mut model, Msg::PublishRequested, &mut cmds);
        let publish = only_publish(cmds);

        update(
            &mut model,
            Msg::PostsLoaded {
                epoch,
                result: Err(SubmissionError::Unauthorized),
            },
            &mut Vec::new(),
        );
        assert!(model.session.is_none());
        assert!(model.is_submitting());

        let msg = run_command(publish, &backend);
        update(&mut model, msg, &mut Vec::new());

        assert_eq!(model.submit, SubmitState::Idle);
        assert!(model.composer.content.is_empty());
        assert!(has_notice(&model, "Post published to Mastodon successfully!"));
    }

    #[test]
    fn rejected_batch_surfaces_every_error() {
        let mut model = logged_in();

        stage(
            &mut model,
            vec![
                CandidateFile::new("huge.png".into(), "huge.png".into(), "image/png".into(), 60 * MIB),
                candidate("notes.txt", "text/plain"),
            ],
        );

        assert!(model.attachments.is_empty());
        assert_eq!(model.notices.iter().filter(|n| n.is_error).count(), 2);
        assert!(has_notice(&model, "huge.png is too large (60.0MB)"));
    }

    #[test]
    fn notices_expire_on_tick_and_can_be_dismissed() {
        let mut model = AppModel::new(Duration::from_secs(5));
        update(&mut model, Msg::PublishRequested, &mut Vec::new());
        model.session = Some(Session::new("ada", "tok"));
        update(&mut model, Msg::PublishRequested, &mut Vec::new());
        update(&mut model, Msg::PublishRequested, &mut Vec::new());
        assert_eq!(model.notices.len(), 2);

        update(&mut model, Msg::DismissNotice(0), &mut Vec::new());
        assert_eq!(model.notices.len(), 1);

        update(&mut model, Msg::Tick(Instant::now()), &mut Vec::new());
        assert_eq!(model.notices.len(), 1);

        update(
            &mut model,
            Msg::Tick(Instant::now() + Duration::from_secs(6)),
            &mut Vec::new(),
        );
        assert!(model.notices.is_empty());
    }

    #[test]
    fn login_round_trip_requests_account_and_history() {
        let backend = FakeBackend::default();
        let mut model = AppModel::default();
        let mut cmds = Vec::new();
        update(&mut model, Msg::Login(LoginMsg::UsernameChanged("ada".into())), &mut cmds);
        update(&mut model, Msg::Login(LoginMsg::PasswordChanged("hunter2".into())), &mut cmds);
        update(&mut model, Msg::Login(LoginMsg::Submit), &mut cmds);
        assert_eq!(cmds.len(), 1);

        let msg = run_command(cmds.remove(0), &backend);
        update(&mut model, msg, &mut cmds);

        assert_eq!(model.session.as_ref().map(|s| s.username.as_str()), Some("ada"));
        assert!(cmds.iter().any(|c| matches!(c, Command::FetchAccount { .. })));
        assert!(cmds.iter().any(|c| matches!(c, Command::FetchPosts { .. })));

        for cmd in cmds.drain(..) {
            let msg = run_command(cmd, &backend);
            update(&mut model, msg, &mut Vec::new());
        }
        assert_eq!(model.account.as_ref().map(|a| a.following_count), Some(7));
        assert!(!model.history.is_loading());
    }

    #[test]
    fn failed_login_shows_server_messages() {
        let backend = FakeBackend::default();
        let mut model = AppModel::default();
        let mut cmds = Vec::new();
        update(&mut model, Msg::Login(LoginMsg::UsernameChanged("ada".into())), &mut cmds);
        update(&mut model, Msg::Login(LoginMsg::PasswordChanged("wrong".into())), &mut cmds);
        update(&mut model, Msg::Login(LoginMsg::Submit), &mut cmds);

        let msg = run_command(cmds.remove(0), &backend);
        update(&mut model, msg, &mut cmds);

        assert!(model.session.is_none());
        assert_eq!(
            model.login.errors(),
            ["Unable to log in with provided credentials.".to_string()]
        );
    }

    #[test]
    fn read_and_preview_commands_use_the_filesystem() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("dot.png");
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        img.save(&path).unwrap();
        let backend = FakeBackend::default();

        let msg = run_command(
            Command::ReadCandidates(vec![path.clone(), tmp.path().join("missing.png")]),
            &backend,
        );
        let Msg::Attachments(AttachmentsMsg::CandidatesRead(results)) = msg else {
            panic!("expected candidates");
        };
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(InputValidationError::Unreadable { .. })
        ));

        let id = AttachmentId::new();
        let msg = run_command(
            Command::LoadPreview {
                id,
                path,
                kind: MediaKind::Image,
            },
            &backend,
        );
        assert!(matches!(msg, Msg::PreviewDecoded { id: got, .. } if got == id));
    }
}
