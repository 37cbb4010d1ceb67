//! Translation task controller core: pure state machine and view-model helpers.
mod chunks;
mod connection;
mod effect;
mod format;
mod language;
mod log_stream;
mod msg;
mod preview;
mod progress;
mod state;
mod task;
mod terminology;
mod update;
mod view_model;

pub use chunks::{Chunk, ChunkId, ChunkRegistry, ChunkRowView, RegistryError};
pub use connection::{ChannelIndicator, ConnectionState};
pub use effect::Effect;
pub use format::{format_bytes, format_number};
pub use language::{is_known_language, language_label, DEFAULT_LANGUAGE, TARGET_LANGUAGES};
pub use log_stream::{escape_markup, LogEntry, LogStream, PushOutcome, Severity, Tone};
pub use msg::{AnalysisResult, LogEvent, Msg, RemoteStage, RemoteStatus, UploadInfo};
pub use preview::{
    FailureKind, FetchedPreview, PreviewContent, PreviewState, PreviewStatus, PreviewStatusView,
    PreviewTarget, PreviewView, RequestId, SourceKind, ViewMode,
};
pub use progress::{partition, Highlight, ProgressSnapshot, ProgressTracker};
pub use state::{AppState, Session};
pub use task::{
    detect_completion, Acceptance, JobOutcome, Stage, TransitionError, TranslationHandle,
    COMPLETION_MARKERS,
};
pub use terminology::{
    TermCategory, TermCategoryView, TerminologyOverview, TerminologyPanel, TerminologyView,
};
pub use update::{update, MARKDOWN_ONLY_ALERT};
pub use view_model::{
    AppViewModel, ButtonView, ControlsView, FileInfoView, LogRowView, ProgressView,
};
