use crate::preview::{PreviewTarget, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Blocking notice for the user; no request is made.
    Alert(String),
    Upload { filename: String, bytes: Vec<u8> },
    /// Subscribe the push channel to the task's notifications. Emitted as
    /// the first effect after a successful upload.
    JoinNotifications { task_id: String },
    Analyze { task_id: String, language: String },
    StartTranslation { task_id: String, use_terminology: bool },
    FetchPreview {
        request_id: RequestId,
        task_id: String,
        target: PreviewTarget,
    },
    Download { task_id: String, suggested_name: String },
    FetchTerminology,
    FetchStatus { task_id: String },
}
