use crate::chunks::ChunkRegistry;
use crate::connection::{ChannelIndicator, ConnectionState};
use crate::format::{format_bytes, format_number};
use crate::language::{language_label, DEFAULT_LANGUAGE};
use crate::log_stream::{escape_markup, LogEntry, LogStream, PushOutcome, Severity};
use crate::msg::UploadInfo;
use crate::preview::PreviewState;
use crate::progress::ProgressTracker;
use crate::task::{Acceptance, Stage, TranslationHandle};
use crate::terminology::TerminologyPanel;
use crate::view_model::{
    AppViewModel, ButtonView, ControlsView, FileInfoView, LogRowView, ProgressView,
};

/// The live task as the server knows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub task_id: String,
    pub filename: String,
    pub size: u64,
    pub chars: u64,
    pub words: Option<u64>,
    /// Set once the task has been analyzed.
    pub language: Option<String>,
    pub use_terminology: bool,
}

impl Session {
    fn from_upload(info: UploadInfo, use_terminology: bool) -> Self {
        Self {
            task_id: info.task_id,
            filename: info.filename,
            size: info.size,
            chars: info.chars,
            words: info.words,
            language: None,
            use_terminology,
        }
    }

    /// `<stem>_<language>.md`, the name the backend gives the result.
    pub fn result_filename(&self) -> String {
        let stem = self.filename.split('.').next().unwrap_or(&self.filename);
        let language = self.language.as_deref().unwrap_or(DEFAULT_LANGUAGE);
        format!("{stem}_{language}.md")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    clock: String,
    session: Option<Session>,
    stage: Stage,
    language: String,
    use_terminology: bool,
    upload_in_flight: bool,
    analyze_in_flight: bool,
    download_in_flight: bool,
    translation: Option<TranslationHandle>,
    pub(crate) log: LogStream,
    pub(crate) progress: ProgressTracker,
    pub(crate) chunks: ChunkRegistry,
    pub(crate) preview: PreviewState,
    pub(crate) terminology: TerminologyPanel,
    connection: ConnectionState,
    dirty: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            clock: "00:00:00".to_string(),
            session: None,
            stage: Stage::NotStarted,
            language: DEFAULT_LANGUAGE.to_string(),
            use_terminology: true,
            upload_in_flight: false,
            analyze_in_flight: false,
            download_in_flight: false,
            translation: None,
            log: LogStream::new(),
            progress: ProgressTracker::new(),
            chunks: ChunkRegistry::new(),
            preview: PreviewState::new(),
            terminology: TerminologyPanel::default(),
            connection: ConnectionState::Disconnected,
            dirty: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn task_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.task_id.as_str())
    }

    pub fn is_current_task(&self, task_id: &str) -> bool {
        self.task_id() == Some(task_id)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn use_terminology(&self) -> bool {
        self.use_terminology
    }

    pub fn translation(&self) -> Option<&TranslationHandle> {
        self.translation.as_ref()
    }

    pub fn log(&self) -> &LogStream {
        &self.log
    }

    pub fn chunks(&self) -> &ChunkRegistry {
        &self.chunks
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn upload_in_flight(&self) -> bool {
        self.upload_in_flight
    }

    pub fn analyze_in_flight(&self) -> bool {
        self.analyze_in_flight
    }

    pub fn download_in_flight(&self) -> bool {
        self.download_in_flight
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_clock(&mut self, clock: String) {
        self.clock = clock;
    }

    pub(crate) fn clock(&self) -> &str {
        &self.clock
    }

    pub(crate) fn set_language(&mut self, language: String) {
        self.language = language;
        self.mark_dirty();
    }

    pub(crate) fn set_use_terminology(&mut self, enabled: bool) {
        self.use_terminology = enabled;
        self.mark_dirty();
    }

    pub(crate) fn set_connection(&mut self, connection: ConnectionState) {
        self.connection = connection;
        self.mark_dirty();
    }

    pub(crate) fn set_upload_in_flight(&mut self, in_flight: bool) {
        self.upload_in_flight = in_flight;
        self.mark_dirty();
    }

    pub(crate) fn set_analyze_in_flight(&mut self, in_flight: bool) {
        self.analyze_in_flight = in_flight;
        self.mark_dirty();
    }

    pub(crate) fn set_download_in_flight(&mut self, in_flight: bool) {
        self.download_in_flight = in_flight;
        self.mark_dirty();
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
        self.mark_dirty();
    }

    pub(crate) fn set_session_language(&mut self, language: String) {
        if let Some(session) = self.session.as_mut() {
            session.language = Some(language);
        }
    }

    pub(crate) fn translation_mut(&mut self) -> Option<&mut TranslationHandle> {
        self.dirty = true;
        self.translation.as_mut()
    }

    pub(crate) fn set_translation(&mut self, handle: TranslationHandle) {
        if let Some(session) = self.session.as_mut() {
            session.use_terminology = handle.use_terminology;
        }
        self.translation = Some(handle);
        self.mark_dirty();
    }

    /// Replace the active task. Every task-scoped component starts empty.
    pub(crate) fn begin_session(&mut self, info: UploadInfo) {
        self.session = Some(Session::from_upload(info, self.use_terminology));
        self.stage = self.stage.on_upload();
        self.upload_in_flight = false;
        self.analyze_in_flight = false;
        self.download_in_flight = false;
        self.translation = None;
        self.log.clear();
        self.progress.reset();
        self.chunks.clear();
        self.preview.reset();
        self.mark_dirty();
    }

    /// Append a locally generated entry stamped with the current clock.
    pub(crate) fn log_local(&mut self, severity: Severity, message: impl Into<String>) {
        let entry = LogEntry::new(self.clock.clone(), severity, message);
        self.log.push(entry, false);
        self.mark_dirty();
    }

    pub(crate) fn push_log(&mut self, entry: LogEntry, update_last: bool) -> PushOutcome {
        self.mark_dirty();
        self.log.push(entry, update_last)
    }

    pub fn view(&self) -> AppViewModel {
        let stage = self.stage;
        let has_session = self.session.is_some();
        let accepted = self
            .translation
            .as_ref()
            .is_some_and(|handle| handle.acceptance == Acceptance::Accepted);
        let translate_pending = self
            .translation
            .as_ref()
            .is_some_and(|handle| handle.acceptance == Acceptance::Pending);

        let analyze = ButtonView {
            enabled: has_session && stage.can_analyze() && !self.analyze_in_flight,
            label: if self.analyze_in_flight {
                "🔍 Analyzing...".to_string()
            } else if has_session && !matches!(stage, Stage::NotStarted | Stage::Uploaded) {
                "✅ Analysis Complete".to_string()
            } else {
                "🔍 Analyze Chunks".to_string()
            },
        };
        let translate = ButtonView {
            enabled: has_session && stage.can_translate() && !translate_pending,
            label: match stage {
                Stage::Translating => "🚀 Translating...".to_string(),
                Stage::Completed => "✅ Translation Complete".to_string(),
                _ => "🚀 Start Translation".to_string(),
            },
        };

        let snapshot = self.progress.snapshot();

        AppViewModel {
            stage,
            file: self.session.as_ref().map(|session| FileInfoView {
                filename: session.filename.clone(),
                size_label: format_bytes(session.size),
                chars_label: format_number(session.chars),
                words_label: session.words.map(format_number),
            }),
            language: self.language.clone(),
            language_label: language_label(&self.language),
            target_language_label: self
                .session
                .as_ref()
                .and_then(|session| session.language.as_deref())
                .map(language_label),
            use_terminology: self.use_terminology,
            controls: ControlsView {
                upload_enabled: !self.upload_in_flight,
                analyze,
                translate,
                download_visible: has_session && stage.is_downloadable(),
                preview_source_enabled: has_session,
                preview_translation_enabled: has_session && stage.is_downloadable(),
            },
            channel: ChannelIndicator::derive(self.connection, stage, accepted),
            log: self
                .log
                .entries()
                .iter()
                .map(|entry| LogRowView {
                    timestamp: entry.timestamp.clone(),
                    icon: entry.severity.icon(),
                    tone: entry.severity.tone(),
                    message: entry.message.clone(),
                    message_markup: escape_markup(&entry.message),
                })
                .collect(),
            progress: ProgressView {
                overall_percent: snapshot.overall_percent,
                chunk_percent: snapshot.chunk_percent,
                current_chunk: snapshot.current_chunk,
                total_chunks: snapshot.total_chunks,
            },
            chunks: self.chunks.rows(),
            highlights: self.progress.partition(&self.chunks),
            preview: self.preview.view(),
            terminology: self.terminology.view(),
            translation: self.translation.clone(),
            dirty: self.dirty,
        }
    }
}
