use std::collections::VecDeque;

use anyhow::{Result, anyhow};
use blobdeck_app::{
    App, DeleteBlobRequest, DeleteUploadRequest, PurgeRequest, PurgeTarget, check_confirmation,
    concurrency_from_input, page_size_from_input, require_input,
};
use blobdeck_core::executor::{MAX_CONCURRENCY, MIN_CONCURRENCY};
use blobdeck_core::format::format_bytes;
use blobdeck_core::page::{MAX_PAGE_SIZE, MIN_PAGE_SIZE};
use blobdeck_core::store::{Space, Upload};
use crossterm::event::KeyEvent;

use crate::RootAction;
use crate::effects::{Effect, Effects};
use crate::keymap;
use crate::ui::binary_choice::{BinaryChoice, BinaryChoiceEvent};
use crate::ui::choice_list::{ChoiceList, ChoiceSignal};
use crate::ui::log_view::{JobSpawner, LogSink, LogView};
use crate::ui::message::MessageView;
use crate::ui::modal::render_notice_modal;
use crate::ui::prompt::{PromptSignal, TextPrompt};

/// Where an action goes once its prompts are answered.
pub(crate) enum ActionExit {
    Cancelled,
    /// Stopped before doing anything; the message is shown over the menu.
    Aborted(String),
    Failed(String),
    Show(MessageView),
    Log(LogView),
    BrowseUploads { space: Space, page_size: usize },
    BrowseBlobs { space: Space, page_size: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepKind {
    PickSpace,
    PurgeNote,
    RemoveShards,
    PageSize,
    Concurrency,
    Subject,
    Provider,
    UploadRoot,
    BlobDigest,
    Preview,
    Confirm,
    Token,
}

enum Step {
    Choice(ChoiceList),
    Notice(String),
    YesNo { choice: BinaryChoice, question: String },
    Prompt(TextPrompt),
    Preview(MessageView),
}

#[derive(Debug, Default)]
struct Answers {
    space: Option<Space>,
    remove_shards: bool,
    page_size: usize,
    concurrency: usize,
    subject: String,
    provider: Option<String>,
    item: String,
    preview: Vec<Upload>,
    token: String,
}

fn plan_for(action: RootAction) -> Vec<StepKind> {
    use StepKind::*;
    match action {
        RootAction::ListSpaces | RootAction::Exit => Vec::new(),
        RootAction::SpaceUsage => vec![PickSpace],
        RootAction::RateLimits => vec![Subject, Provider],
        RootAction::PurgeUploadsPage => vec![
            PickSpace,
            PurgeNote,
            RemoveShards,
            PageSize,
            Concurrency,
            Preview,
            Confirm,
        ],
        RootAction::PurgeUploadsAll => vec![
            PickSpace,
            PurgeNote,
            RemoveShards,
            PageSize,
            Concurrency,
            Token,
        ],
        RootAction::PurgeBlobsAll => vec![PickSpace, PageSize, Concurrency, Token],
        RootAction::DeleteUpload => vec![PickSpace, UploadRoot, RemoveShards, Confirm],
        RootAction::DeleteBlob => vec![PickSpace, BlobDigest, Confirm],
        RootAction::ListUploads | RootAction::ListBlobs => vec![PickSpace, PageSize],
    }
}

/// Prompt sequence for one root menu action.
pub(crate) struct ActionScreen {
    action: RootAction,
    plan: VecDeque<StepKind>,
    current: Option<(StepKind, Step)>,
    spaces: Vec<Space>,
    answers: Answers,
    effects: Effects,
}

impl ActionScreen {
    pub(crate) fn new(action: RootAction, app: &App) -> Self {
        Self {
            action,
            plan: plan_for(action).into(),
            current: None,
            spaces: Vec::new(),
            answers: Answers {
                page_size: app.config.defaults.page_size,
                concurrency: app.config.defaults.concurrency,
                ..Answers::default()
            },
            effects: Effects::default(),
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        match self.action {
            RootAction::SpaceUsage => "Space Usage",
            RootAction::RateLimits => "Rate Limits",
            RootAction::PurgeUploadsPage | RootAction::PurgeUploadsAll => "Purge Uploads",
            RootAction::PurgeBlobsAll => "Purge Blobs",
            RootAction::DeleteUpload => "Delete Upload",
            RootAction::DeleteBlob => "Delete Blob",
            RootAction::ListUploads => "Uploads",
            RootAction::ListBlobs => "Blobs",
            RootAction::ListSpaces | RootAction::Exit => "Spaces",
        }
    }

    pub(crate) fn take_effects(&mut self) -> Vec<Effect> {
        self.effects.take()
    }

    /// Moves to the next unanswered step, finishing the action when none remain.
    pub(crate) fn advance(&mut self, app: &App, spawner: &dyn JobSpawner) -> Option<ActionExit> {
        match self.try_advance(app, spawner) {
            Ok(exit) => exit,
            Err(error) => Some(ActionExit::Failed(format!("{error:#}"))),
        }
    }

    fn try_advance(&mut self, app: &App, spawner: &dyn JobSpawner) -> Result<Option<ActionExit>> {
        let Some(kind) = self.plan.pop_front() else {
            self.current = None;
            return self.complete(app, spawner).map(Some);
        };

        let title = self.title();
        let defaults = &app.config.defaults;
        let step = match kind {
            StepKind::PickSpace => {
                self.spaces = app.list_spaces()?;
                if self.spaces.is_empty() {
                    return Ok(Some(ActionExit::Aborted(
                        "No spaces known to this agent.".to_string(),
                    )));
                }
                let options = self
                    .spaces
                    .iter()
                    .map(|space| {
                        format!(
                            "{}  {}",
                            space.name.as_deref().unwrap_or("(no name)"),
                            space.did
                        )
                    })
                    .collect();
                Step::Choice(ChoiceList::new("Choose a space", options))
            }
            StepKind::PurgeNote => Step::Notice(
                "NOTE: the store has no hard-delete for a whole space. This action purges uploads from the space (and optionally their shards).".to_string(),
            ),
            StepKind::RemoveShards => Step::YesNo {
                choice: BinaryChoice::new(true),
                question: if self.action == RootAction::DeleteUpload {
                    "Delete shards together with this upload? (Keep shards = safer)"
                } else {
                    "Delete shards together while purging uploads? (Keep shards = safer)"
                }
                .to_string(),
            },
            StepKind::PageSize => Step::Prompt(
                TextPrompt::new(
                    title,
                    format!(
                        "Page size (default {}, {MIN_PAGE_SIZE}-{MAX_PAGE_SIZE}):",
                        defaults.page_size
                    ),
                )
                .with_initial(defaults.page_size.to_string()),
            ),
            StepKind::Concurrency => Step::Prompt(
                TextPrompt::new(
                    title,
                    format!(
                        "Delete concurrency (default {}, {MIN_CONCURRENCY}-{MAX_CONCURRENCY}):",
                        defaults.concurrency
                    ),
                )
                .with_initial(defaults.concurrency.to_string()),
            ),
            StepKind::Subject => Step::Prompt(TextPrompt::new(
                title,
                "Subject (e.g. did:mailto:alice@example.com):",
            )),
            StepKind::Provider => Step::Prompt(
                TextPrompt::new(title, "Provider DID (resource, blank for any):")
                    .with_initial(defaults.provider.clone().unwrap_or_default()),
            ),
            StepKind::UploadRoot => {
                Step::Prompt(TextPrompt::new(title, "Upload root CID to remove:"))
            }
            StepKind::BlobDigest => {
                Step::Prompt(TextPrompt::new(title, "Blob digest to remove:"))
            }
            StepKind::Preview => {
                let request = self.purge_request(PurgeTarget::UploadsPage)?;
                self.answers.preview = app.preview_upload_page(&request)?;
                if self.answers.preview.is_empty() {
                    return Ok(Some(ActionExit::Aborted(
                        "No uploads found on this page.".to_string(),
                    )));
                }
                Step::Preview(MessageView::new(
                    title,
                    App::preview_lines(&self.answers.preview, request.options().page_size),
                ))
            }
            StepKind::Confirm => Step::YesNo {
                choice: BinaryChoice::new(true),
                question: self.confirm_question()?,
            },
            StepKind::Token => {
                let target = self.purge_target();
                let request = self.purge_request(target)?;
                Step::Prompt(
                    TextPrompt::new(title, request.danger_message(&defaults.confirm_token))
                        .danger(),
                )
            }
        };
        self.current = Some((kind, step));
        Ok(None)
    }

    fn space(&self) -> Result<&Space> {
        self.answers
            .space
            .as_ref()
            .ok_or_else(|| anyhow!("no space was chosen"))
    }

    fn purge_target(&self) -> PurgeTarget {
        match self.action {
            RootAction::PurgeBlobsAll => PurgeTarget::BlobsAll,
            RootAction::PurgeUploadsPage => PurgeTarget::UploadsPage,
            _ => PurgeTarget::UploadsAll,
        }
    }

    fn purge_request(&self, target: PurgeTarget) -> Result<PurgeRequest> {
        Ok(PurgeRequest {
            space: self.space()?.clone(),
            target,
            page_size: self.answers.page_size,
            concurrency: self.answers.concurrency,
            remove_shards: self.answers.remove_shards,
        })
    }

    fn space_name(&self) -> Result<String> {
        let space = self.space()?;
        Ok(space.name.clone().unwrap_or_else(|| space.did.clone()))
    }

    fn confirm_question(&self) -> Result<String> {
        let name = self.space_name()?;
        Ok(match self.action {
            RootAction::PurgeUploadsPage => format!(
                "Confirm purge {} upload(s) from space {name}?",
                self.answers.preview.len()
            ),
            RootAction::DeleteUpload => {
                format!(
                    "Confirm remove upload {} from space {name}?",
                    self.answers.item
                )
            }
            _ => format!(
                "Confirm remove blob {} from space {name}?",
                self.answers.item
            ),
        })
    }

    pub(crate) fn on_key(
        &mut self,
        key: KeyEvent,
        app: &App,
        spawner: &dyn JobSpawner,
    ) -> Option<ActionExit> {
        let Some((kind, step)) = &mut self.current else {
            return Some(ActionExit::Cancelled);
        };
        let kind = *kind;

        match step {
            Step::Choice(list) => match list.on_key(key) {
                ChoiceSignal::Continue => None,
                ChoiceSignal::Cancel => Some(ActionExit::Cancelled),
                ChoiceSignal::Chosen(index) => {
                    self.answers.space = self.spaces.get(index).cloned();
                    self.advance(app, spawner)
                }
            },
            Step::Notice(_) => {
                if keymap::is_confirm(key) {
                    self.advance(app, spawner)
                } else if keymap::is_close(key) {
                    Some(ActionExit::Cancelled)
                } else {
                    None
                }
            }
            Step::YesNo { choice, .. } => match choice.on_key(key) {
                BinaryChoiceEvent::Continue => None,
                BinaryChoiceEvent::Back => Some(ActionExit::Cancelled),
                BinaryChoiceEvent::ConfirmYes => {
                    if kind == StepKind::RemoveShards {
                        self.answers.remove_shards = true;
                    }
                    self.advance(app, spawner)
                }
                BinaryChoiceEvent::ConfirmNo => {
                    if kind == StepKind::RemoveShards {
                        self.answers.remove_shards = false;
                        self.advance(app, spawner)
                    } else {
                        Some(ActionExit::Cancelled)
                    }
                }
            },
            Step::Preview(view) => {
                if keymap::is_confirm(key) {
                    self.advance(app, spawner)
                } else if keymap::is_close(key) {
                    Some(ActionExit::Cancelled)
                } else {
                    view.on_key(key, &mut self.effects);
                    None
                }
            }
            Step::Prompt(prompt) => match prompt.on_key(key) {
                PromptSignal::Continue => None,
                PromptSignal::Cancel => Some(ActionExit::Cancelled),
                PromptSignal::Submit(raw) => match self.accept_input(kind, &raw, app) {
                    Ok(()) => self.advance(app, spawner),
                    Err(error) => Some(ActionExit::Aborted(error.to_string())),
                },
            },
        }
    }

    fn accept_input(&mut self, kind: StepKind, raw: &str, app: &App) -> Result<()> {
        let defaults = &app.config.defaults;
        match kind {
            StepKind::PageSize => {
                self.answers.page_size = page_size_from_input(raw, defaults.page_size);
            }
            StepKind::Concurrency => {
                self.answers.concurrency = concurrency_from_input(raw, defaults.concurrency);
            }
            StepKind::Subject => self.answers.subject = require_input("subject", raw)?,
            StepKind::Provider => {
                let provider = raw.trim();
                self.answers.provider = (!provider.is_empty()).then(|| provider.to_string());
            }
            StepKind::UploadRoot => self.answers.item = require_input("upload root", raw)?,
            StepKind::BlobDigest => self.answers.item = require_input("blob digest", raw)?,
            StepKind::Token => {
                check_confirmation(raw, &defaults.confirm_token)?;
                self.answers.token = raw.to_string();
            }
            _ => {}
        }
        Ok(())
    }

    fn complete(&mut self, app: &App, spawner: &dyn JobSpawner) -> Result<ActionExit> {
        tracing::debug!(action = ?self.action, "running action");
        let exit = match self.action {
            RootAction::Exit => ActionExit::Cancelled,
            RootAction::ListSpaces => {
                ActionExit::Show(MessageView::new("Spaces", app.space_lines()?))
            }
            RootAction::SpaceUsage => {
                let report = app.usage(self.space()?)?;
                ActionExit::Show(MessageView::new("Space Usage", vec![report.line()]))
            }
            RootAction::RateLimits => {
                let report =
                    app.rate_limits(&self.answers.subject, self.answers.provider.as_deref())?;
                ActionExit::Show(MessageView::new("Rate Limits", report.lines()))
            }
            RootAction::PurgeUploadsPage => {
                let request = self.purge_request(PurgeTarget::UploadsPage)?;
                let roots: Vec<String> = self
                    .answers
                    .preview
                    .iter()
                    .map(|upload| upload.root.clone())
                    .collect();
                let header = request.header_lines();
                let app = app.clone();
                ActionExit::Log(LogView::start(
                    self.title(),
                    header,
                    spawner,
                    Box::new(move |log: LogSink<'_>| {
                        app.purge_upload_page(&request, &roots, log).map(|_| ())
                    }),
                ))
            }
            RootAction::PurgeUploadsAll | RootAction::PurgeBlobsAll => {
                let request = self.purge_request(self.purge_target())?;
                let token = self.answers.token.clone();
                let header = request.header_lines();
                let app = app.clone();
                ActionExit::Log(LogView::start(
                    self.title(),
                    header,
                    spawner,
                    Box::new(move |log: LogSink<'_>| {
                        app.purge_all(&request, &token, log).map(|_| ())
                    }),
                ))
            }
            RootAction::DeleteUpload => {
                let space = self.space()?;
                let request = DeleteUploadRequest {
                    space: space.did.clone(),
                    root: self.answers.item.clone(),
                    remove_shards: self.answers.remove_shards,
                };
                let header = vec![
                    format!("Space: {}", space.label()),
                    format!("Upload: {}", request.root),
                    format!(
                        "Remove shards: {}",
                        if request.remove_shards { "yes" } else { "no" }
                    ),
                ];
                let app = app.clone();
                ActionExit::Log(LogView::start(
                    self.title(),
                    header,
                    spawner,
                    Box::new(move |log: LogSink<'_>| {
                        log("Removing upload...".to_string());
                        match app.delete_upload(&request) {
                            Ok(_) => log("Removed.".to_string()),
                            Err(error) => log(format!("Failed: {error:#}")),
                        }
                        Ok(())
                    }),
                ))
            }
            RootAction::DeleteBlob => {
                let space = self.space()?;
                let request = DeleteBlobRequest {
                    space: space.did.clone(),
                    digest: self.answers.item.clone(),
                };
                let header = vec![
                    format!("Space: {}", space.label()),
                    format!("Blob: {}", request.digest),
                ];
                let app = app.clone();
                ActionExit::Log(LogView::start(
                    self.title(),
                    header,
                    spawner,
                    Box::new(move |log: LogSink<'_>| {
                        log("Removing blob...".to_string());
                        match app.delete_blob(&request) {
                            Ok(removed) => log(format!(
                                "Removed. Freed: {}.",
                                format_bytes(Some(removed.freed_bytes.unwrap_or(0)))
                            )),
                            Err(error) => log(format!("Failed: {error:#}")),
                        }
                        Ok(())
                    }),
                ))
            }
            RootAction::ListUploads => ActionExit::BrowseUploads {
                space: self.space()?.clone(),
                page_size: self.answers.page_size,
            },
            RootAction::ListBlobs => ActionExit::BrowseBlobs {
                space: self.space()?.clone(),
                page_size: self.answers.page_size,
            },
        };
        Ok(exit)
    }

    pub(crate) fn render(&self, frame: &mut ratatui::Frame<'_>) {
        let Some((_, step)) = &self.current else {
            return;
        };
        match step {
            Step::Choice(list) => list.render(frame),
            Step::Notice(message) => render_notice_modal(
                frame,
                self.title(),
                message,
                70,
                36,
                "Enter: continue    Esc/q: cancel",
            ),
            Step::YesNo { choice, question } => choice.render(frame, self.title(), question),
            Step::Prompt(prompt) => prompt.render(frame),
            Step::Preview(view) => view.render(frame),
        }
    }
}
