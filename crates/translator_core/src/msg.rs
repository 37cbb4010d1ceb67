use crate::chunks::Chunk;
use crate::connection::ConnectionState;
use crate::preview::{FetchedPreview, PreviewTarget, RequestId, ViewMode};
use crate::progress::ProgressSnapshot;
use crate::terminology::TerminologyOverview;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadInfo {
    pub task_id: String,
    pub filename: String,
    pub size: u64,
    pub chars: u64,
    pub words: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub total_chunks: u32,
    pub chunks: Vec<Chunk>,
}

/// A `log` event from the push channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEvent {
    pub message: String,
    pub level: String,
    pub timestamp: Option<String>,
    pub update_last: bool,
}

/// Structured job state pushed by backends that support it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStage {
    Completed,
    Failed(String),
}

/// Polled task status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatus {
    pub status: String,
    pub progress: u8,
    pub current_chunk: u32,
    pub total_chunks: u32,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a file to upload.
    FileChosen { filename: String, bytes: Vec<u8> },
    UploadSucceeded(UploadInfo),
    UploadFailed(String),
    /// User changed the target language selector.
    LanguageSelected(String),
    /// User toggled the terminology checkbox.
    TerminologyToggled(bool),
    AnalyzeClicked,
    AnalyzeSucceeded { task_id: String, result: AnalysisResult },
    AnalyzeFailed { task_id: String, message: String },
    TranslateClicked,
    /// Backend accepted the translate-start call; the job now runs remotely.
    TranslateAccepted { task_id: String },
    TranslateRejected { task_id: String, message: String },
    DownloadClicked,
    DownloadSaved { task_id: String, path: String },
    DownloadFailed { task_id: String, message: String },
    PreviewRequested(PreviewTarget),
    PreviewLoaded {
        request_id: RequestId,
        target: PreviewTarget,
        preview: FetchedPreview,
    },
    PreviewFailed { request_id: RequestId, message: String },
    PreviewModeSelected(ViewMode),
    PreviewClosed,
    TerminologyRequested,
    TerminologyLoaded(TerminologyOverview),
    TerminologyFailed(String),
    TerminologyClosed,
    StatusRequested,
    StatusLoaded { task_id: String, status: RemoteStatus },
    StatusFailed { task_id: String, message: String },
    ConnectionChanged(ConnectionState),
    PushLog(LogEvent),
    PushProgress(ProgressSnapshot),
    PushStage(RemoteStage),
    /// Local wall-clock time (`HH:MM:SS`, 24-hour) used to stamp entries
    /// that carry no server time.
    Tick(String),
    /// Fallback for placeholder wiring.
    NoOp,
}
