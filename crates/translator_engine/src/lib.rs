//! Translator engine: HTTP backend, push channel and effect execution.
mod backend;
mod engine;
mod persist;
pub mod push;
mod render;
mod sink;
mod types;

pub use backend::{
    attachment_filename, Backend, BackendError, BackendSettings, DownloadedFile, ReqwestBackend,
};
pub use engine::{EngineError, EngineHandle, EngineSettings};
pub use persist::{ensure_output_dir, safe_file_name, AtomicFileWriter, PersistError};
pub use push::{
    LogPayload, PollingTransport, ProgressPayload, PushError, PushEvent, PushSettings,
    PushTransport, StagePayload,
};
pub use render::{MarkdownRenderer, PulldownRenderer};
pub use sink::{ChannelEventSink, EventSink};
pub use types::{
    AnalyzeResponse, ChunkInfo, DownloadError, EngineEvent, PreviewKind, PreviewResponse,
    RenderedPreview, RequestId, StatusResponse, TerminologyResponse, TranslateResponse,
    UploadResponse,
};
