use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::backend::BackendError;
use crate::persist::PersistError;
use crate::push::PushEvent;

/// Tags a preview fetch so late results can be matched to their request.
pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewKind {
    Source,
    Chunk(u32),
    Translation,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadResponse {
    pub task_id: String,
    pub filename: String,
    pub size: u64,
    pub chars: u64,
    #[serde(default)]
    pub words: Option<u64>,
    #[serde(default)]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChunkInfo {
    pub id: u32,
    pub size: u64,
    #[serde(default)]
    pub chapters: Vec<String>,
    #[serde(default)]
    pub has_prologue: bool,
    #[serde(default)]
    pub has_epilogue: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyzeResponse {
    pub total_chunks: u32,
    #[serde(default)]
    pub total_chars: Option<u64>,
    pub chunks: Vec<ChunkInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranslateResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreviewResponse {
    pub content: String,
    /// Only chunk previews carry chapter names.
    #[serde(default)]
    pub chapters: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TerminologyResponse {
    pub terminology: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub current_chunk: u32,
    #[serde(default)]
    pub total_chunks: u32,
    #[serde(default)]
    pub error: Option<String>,
}

/// Preview content with its rendered form attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPreview {
    pub raw: String,
    pub rendered: String,
    pub chapters: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug)]
pub enum EngineEvent {
    Uploaded(Result<UploadResponse, BackendError>),
    Analyzed {
        task_id: String,
        result: Result<AnalyzeResponse, BackendError>,
    },
    TranslationStarted {
        task_id: String,
        result: Result<TranslateResponse, BackendError>,
    },
    PreviewFetched {
        request_id: RequestId,
        kind: PreviewKind,
        result: Result<RenderedPreview, BackendError>,
    },
    Downloaded {
        task_id: String,
        result: Result<PathBuf, DownloadError>,
    },
    Terminology(Result<TerminologyResponse, BackendError>),
    Status {
        task_id: String,
        result: Result<StatusResponse, BackendError>,
    },
    Push(PushEvent),
}
