use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn, set_task_context};
use translator_core::{
    AnalysisResult, Chunk, ConnectionState, Effect, FetchedPreview, LogEvent, Msg, PreviewTarget,
    ProgressSnapshot, RemoteStage, RemoteStatus, TermCategory, TerminologyOverview, UploadInfo,
};
use translator_engine::{
    EngineError, EngineEvent, EngineHandle, EngineSettings, PreviewKind, PushEvent,
};

/// Runs core effects against the engine and turns engine events back into
/// messages.
pub struct EffectRunner {
    engine: EngineHandle,
    alerts: Vec<String>,
}

impl EffectRunner {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(settings)?,
            alerts: Vec::new(),
        })
    }

    pub fn enqueue(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Alert(message) => {
                    engine_warn!("Alert: {}", message);
                    self.alerts.push(message);
                }
                Effect::Upload { filename, bytes } => {
                    engine_info!("Uploading {} ({} bytes)", filename, bytes.len());
                    self.engine.upload(filename, bytes);
                }
                Effect::JoinNotifications { task_id } => {
                    set_task_context(Some(&task_id));
                    self.engine.join(task_id);
                }
                Effect::Analyze { task_id, language } => {
                    engine_info!("Analyzing for {}", language);
                    self.engine.analyze(task_id, language);
                }
                Effect::StartTranslation {
                    task_id,
                    use_terminology,
                } => {
                    engine_info!("Starting translation (terminology: {})", use_terminology);
                    self.engine.start_translation(task_id, use_terminology);
                }
                Effect::FetchPreview {
                    request_id,
                    task_id,
                    target,
                } => {
                    engine_debug!("Preview request {} for {:?}", request_id, target);
                    self.engine
                        .fetch_preview(request_id, task_id, preview_kind(target));
                }
                Effect::Download {
                    task_id,
                    suggested_name,
                } => self.engine.download(task_id, suggested_name),
                Effect::FetchTerminology => self.engine.fetch_terminology(),
                Effect::FetchStatus { task_id } => self.engine.fetch_status(task_id),
            }
        }
    }

    /// Alerts raised since the last call.
    pub fn take_alerts(&mut self) -> Vec<String> {
        std::mem::take(&mut self.alerts)
    }

    /// Wait up to `timeout` for the next engine event, mapped to a message.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }

    pub fn shutdown(&self) {
        self.engine.shutdown();
    }
}

fn preview_kind(target: PreviewTarget) -> PreviewKind {
    match target {
        PreviewTarget::Source => PreviewKind::Source,
        PreviewTarget::Chunk(id) => PreviewKind::Chunk(id),
        PreviewTarget::Translation => PreviewKind::Translation,
    }
}

fn preview_target(kind: PreviewKind) -> PreviewTarget {
    match kind {
        PreviewKind::Source => PreviewTarget::Source,
        PreviewKind::Chunk(id) => PreviewTarget::Chunk(id),
        PreviewKind::Translation => PreviewTarget::Translation,
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Uploaded(Ok(response)) => Msg::UploadSucceeded(UploadInfo {
            task_id: response.task_id,
            filename: response.filename,
            size: response.size,
            chars: response.chars,
            words: response.words,
        }),
        EngineEvent::Uploaded(Err(err)) => Msg::UploadFailed(err.to_string()),
        EngineEvent::Analyzed {
            task_id,
            result: Ok(response),
        } => Msg::AnalyzeSucceeded {
            task_id,
            result: AnalysisResult {
                total_chunks: response.total_chunks,
                chunks: response
                    .chunks
                    .into_iter()
                    .map(|chunk| Chunk {
                        id: chunk.id,
                        size: chunk.size,
                        chapters: chunk.chapters,
                        has_prologue: chunk.has_prologue,
                        has_epilogue: chunk.has_epilogue,
                    })
                    .collect(),
            },
        },
        EngineEvent::Analyzed {
            task_id,
            result: Err(err),
        } => Msg::AnalyzeFailed {
            task_id,
            message: err.to_string(),
        },
        EngineEvent::TranslationStarted {
            task_id,
            result: Ok(response),
        } => {
            engine_debug!("Translate-start answered {:?}", response.status);
            Msg::TranslateAccepted { task_id }
        }
        EngineEvent::TranslationStarted {
            task_id,
            result: Err(err),
        } => Msg::TranslateRejected {
            task_id,
            message: err.to_string(),
        },
        EngineEvent::PreviewFetched {
            request_id,
            kind,
            result: Ok(preview),
        } => Msg::PreviewLoaded {
            request_id,
            target: preview_target(kind),
            preview: FetchedPreview {
                raw: preview.raw,
                rendered: preview.rendered,
                chapters: preview.chapters,
            },
        },
        EngineEvent::PreviewFetched {
            request_id,
            result: Err(err),
            ..
        } => Msg::PreviewFailed {
            request_id,
            message: err.to_string(),
        },
        EngineEvent::Downloaded {
            task_id,
            result: Ok(path),
        } => Msg::DownloadSaved {
            task_id,
            path: path.display().to_string(),
        },
        EngineEvent::Downloaded {
            task_id,
            result: Err(err),
        } => Msg::DownloadFailed {
            task_id,
            message: err.to_string(),
        },
        EngineEvent::Terminology(Ok(response)) => Msg::TerminologyLoaded(TerminologyOverview {
            categories: response
                .terminology
                .into_iter()
                .map(|(key, terms)| TermCategory { key, terms })
                .collect(),
        }),
        EngineEvent::Terminology(Err(err)) => Msg::TerminologyFailed(err.to_string()),
        EngineEvent::Status {
            task_id,
            result: Ok(status),
        } => Msg::StatusLoaded {
            task_id,
            status: RemoteStatus {
                status: status.status,
                progress: ProgressSnapshot::clamped(status.progress, 0.0, 0, 0).overall_percent,
                current_chunk: status.current_chunk,
                total_chunks: status.total_chunks,
                error: status.error,
            },
        },
        EngineEvent::Status {
            task_id,
            result: Err(err),
        } => Msg::StatusFailed {
            task_id,
            message: err.to_string(),
        },
        EngineEvent::Push(event) => map_push(event),
    }
}

fn map_push(event: PushEvent) -> Msg {
    match event {
        PushEvent::Connected => Msg::ConnectionChanged(ConnectionState::Connected),
        PushEvent::Disconnected => Msg::ConnectionChanged(ConnectionState::Disconnected),
        PushEvent::Log(log) => Msg::PushLog(LogEvent {
            message: log.message,
            level: log.level,
            timestamp: log.timestamp,
            update_last: log.update_last,
        }),
        PushEvent::Progress(progress) => Msg::PushProgress(ProgressSnapshot::clamped(
            progress.overall,
            progress.chunk,
            progress.current_chunk,
            progress.total_chunks,
        )),
        PushEvent::Stage(stage) => match stage.stage.as_str() {
            "completed" => Msg::PushStage(RemoteStage::Completed),
            "failed" => Msg::PushStage(RemoteStage::Failed(
                stage.message.unwrap_or_else(|| "unknown error".to_string()),
            )),
            other => {
                engine_debug!("Ignoring stage {:?}", other);
                Msg::NoOp
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use translator_engine::{
        BackendError, LogPayload, ProgressPayload, StagePayload, StatusResponse,
        TerminologyResponse,
    };

    #[test]
    fn backend_rejection_keeps_server_text() {
        let msg = map_event(EngineEvent::TranslationStarted {
            task_id: "t1".to_string(),
            result: Err(BackendError::Rejected {
                status: 400,
                message: "任务状态错误".to_string(),
            }),
        });
        assert_eq!(
            msg,
            Msg::TranslateRejected {
                task_id: "t1".to_string(),
                message: "任务状态错误".to_string(),
            }
        );
    }

    #[test]
    fn push_progress_is_clamped() {
        let msg = map_push(PushEvent::Progress(ProgressPayload {
            overall: 120.0,
            chunk: 33.4,
            current_chunk: 9,
            total_chunks: 4,
        }));
        assert_eq!(
            msg,
            Msg::PushProgress(ProgressSnapshot {
                overall_percent: 100,
                chunk_percent: 33,
                current_chunk: 4,
                total_chunks: 4,
            })
        );
    }

    #[test]
    fn push_log_passes_fields_through() {
        let msg = map_push(PushEvent::Log(LogPayload {
            message: "Chunk 1/3".to_string(),
            level: "warning".to_string(),
            timestamp: Some("09:00:00".to_string()),
            update_last: true,
        }));
        assert_eq!(
            msg,
            Msg::PushLog(LogEvent {
                message: "Chunk 1/3".to_string(),
                level: "warning".to_string(),
                timestamp: Some("09:00:00".to_string()),
                update_last: true,
            })
        );
    }

    #[test]
    fn stage_events_map_to_remote_stage() {
        let failed = map_push(PushEvent::Stage(StagePayload {
            stage: "failed".to_string(),
            message: None,
        }));
        assert_eq!(
            failed,
            Msg::PushStage(RemoteStage::Failed("unknown error".to_string()))
        );
        let other = map_push(PushEvent::Stage(StagePayload {
            stage: "translating".to_string(),
            message: None,
        }));
        assert_eq!(other, Msg::NoOp);
    }

    #[test]
    fn terminology_categories_keep_server_order() {
        let mut terminology = BTreeMap::new();
        terminology.insert("proper_nouns".to_string(), vec!["Alice".to_string()]);
        terminology.insert("key_concepts".to_string(), Vec::new());
        let msg = map_event(EngineEvent::Terminology(Ok(TerminologyResponse { terminology })));
        match msg {
            Msg::TerminologyLoaded(overview) => {
                let keys: Vec<_> = overview.categories.iter().map(|c| c.key.as_str()).collect();
                assert_eq!(keys, vec!["key_concepts", "proper_nouns"]);
                assert_eq!(overview.total(), 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn status_progress_is_rounded() {
        let msg = map_event(EngineEvent::Status {
            task_id: "t1".to_string(),
            result: Ok(StatusResponse {
                status: "translating".to_string(),
                progress: 37.6,
                current_chunk: 2,
                total_chunks: 4,
                error: None,
            }),
        });
        match msg {
            Msg::StatusLoaded { status, .. } => assert_eq!(status.progress, 38),
            other => panic!("unexpected {other:?}"),
        }
    }
}
