//! Scripted run of the task lifecycle for the command line.
//!
//! The workflow never touches the engine. It inspects `AppState` after every
//! message and answers with the next user messages to feed through `update`.

use translator_core::{AppState, Msg, PreviewTarget, Severity, Stage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowPlan {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub language: String,
    pub use_terminology: bool,
    /// Opened after analysis, before translation starts.
    pub previews_before: Vec<PreviewTarget>,
    /// Stop after the previews when unset.
    pub translate: bool,
    /// Opened once the translation has completed.
    pub previews_after: Vec<PreviewTarget>,
    pub download: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// Waiting on the backend or the push channel.
    Pending,
    Dispatch(Vec<Msg>),
    Finished,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Upload,
    Analyze,
    PreviewBefore(usize),
    Translate,
    PreviewAfter(usize),
    Download,
    Done,
}

#[derive(Debug)]
pub struct Workflow {
    plan: WorkflowPlan,
    step: Step,
    started: bool,
}

impl Workflow {
    pub fn new(plan: WorkflowPlan) -> Self {
        Self {
            plan,
            step: Step::Upload,
            started: false,
        }
    }

    #[cfg(test)]
    fn is_done(&self) -> bool {
        self.step == Step::Done
    }

    pub fn advance(&mut self, state: &AppState) -> Advance {
        if self.step == Step::Done {
            return Advance::Finished;
        }
        if !self.started {
            self.started = true;
            return Advance::Dispatch(self.start_messages());
        }
        match self.step {
            Step::Upload => {
                if state.upload_in_flight() {
                    Advance::Pending
                } else if state.session().is_some() {
                    self.next();
                    Advance::Pending
                } else {
                    Advance::Failed(last_error(state).unwrap_or("upload did not complete".into()))
                }
            }
            Step::Analyze => {
                if state.analyze_in_flight() {
                    Advance::Pending
                } else if state.stage() == Stage::Analyzed {
                    self.next();
                    Advance::Pending
                } else {
                    Advance::Failed(last_error(state).unwrap_or("analysis did not complete".into()))
                }
            }
            Step::PreviewBefore(_) | Step::PreviewAfter(_) => {
                if state.preview().pending().is_some() {
                    Advance::Pending
                } else {
                    self.next();
                    Advance::Dispatch(vec![Msg::PreviewClosed])
                }
            }
            Step::Translate => match state.stage() {
                Stage::Translating => Advance::Pending,
                Stage::Completed => {
                    self.next();
                    Advance::Pending
                }
                _ => Advance::Failed(last_error(state).unwrap_or("translation failed".into())),
            },
            Step::Download => {
                if state.download_in_flight() {
                    Advance::Pending
                } else if let Some(message) = last_error(state) {
                    Advance::Failed(message)
                } else {
                    self.next();
                    Advance::Finished
                }
            }
            Step::Done => Advance::Finished,
        }
    }

    fn start_messages(&self) -> Vec<Msg> {
        match self.step {
            Step::Upload => vec![
                Msg::LanguageSelected(self.plan.language.clone()),
                Msg::TerminologyToggled(self.plan.use_terminology),
                Msg::FileChosen {
                    filename: self.plan.filename.clone(),
                    bytes: self.plan.bytes.clone(),
                },
            ],
            Step::Analyze => vec![Msg::AnalyzeClicked],
            Step::PreviewBefore(index) => {
                vec![Msg::PreviewRequested(self.plan.previews_before[index])]
            }
            Step::Translate => vec![Msg::TranslateClicked],
            Step::PreviewAfter(index) => {
                vec![Msg::PreviewRequested(self.plan.previews_after[index])]
            }
            Step::Download => vec![Msg::DownloadClicked],
            Step::Done => Vec::new(),
        }
    }

    fn next(&mut self) {
        let before = self.plan.previews_before.len();
        let after = self.plan.previews_after.len();
        let previewed = if self.plan.translate {
            Step::Translate
        } else {
            Step::Done
        };
        let analyzed = match before {
            0 => previewed,
            _ => Step::PreviewBefore(0),
        };
        let translated = match (after, self.plan.download) {
            (0, true) => Step::Download,
            (0, false) => Step::Done,
            _ => Step::PreviewAfter(0),
        };
        self.step = match self.step {
            Step::Upload => Step::Analyze,
            Step::Analyze => analyzed,
            Step::PreviewBefore(index) if index + 1 < before => Step::PreviewBefore(index + 1),
            Step::PreviewBefore(_) => previewed,
            Step::Translate => translated,
            Step::PreviewAfter(index) if index + 1 < after => Step::PreviewAfter(index + 1),
            Step::PreviewAfter(_) if self.plan.download => Step::Download,
            Step::PreviewAfter(_) | Step::Download | Step::Done => Step::Done,
        };
        self.started = false;
    }
}

/// Message of the newest log entry when it is an error.
fn last_error(state: &AppState) -> Option<String> {
    state
        .log()
        .entries()
        .last()
        .filter(|entry| entry.severity == Severity::Error)
        .map(|entry| entry.message.clone())
}
