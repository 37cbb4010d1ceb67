use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use engine_logging::{engine_debug, engine_error};

use crate::backend::{Backend, BackendError, BackendSettings, ReqwestBackend};
use crate::persist::AtomicFileWriter;
use crate::push::{PollingTransport, PushError, PushSettings, PushTransport};
use crate::render::{MarkdownRenderer, PulldownRenderer};
use crate::sink::{ChannelEventSink, EventSink};
use crate::types::{DownloadError, PreviewKind, RenderedPreview, RequestId};
use crate::EngineEvent;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Push(#[from] PushError),
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub backend: BackendSettings,
    pub push: PushSettings,
    pub output_dir: PathBuf,
}

enum EngineCommand {
    Upload { filename: String, bytes: Vec<u8> },
    Join { task_id: String },
    Analyze { task_id: String, language: String },
    StartTranslation { task_id: String, use_terminology: bool },
    FetchPreview { request_id: RequestId, task_id: String, kind: PreviewKind },
    Download { task_id: String, suggested_name: String },
    FetchTerminology,
    FetchStatus { task_id: String },
}

/// Collaborators shared by every spawned request.
struct Services {
    backend: Arc<dyn Backend>,
    renderer: Arc<dyn MarkdownRenderer>,
    writer: AtomicFileWriter,
}

/// Owns the IO worker thread. Commands go in over one channel, results and
/// push notifications come back over another.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    cancel: CancellationToken,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let backend = Arc::new(ReqwestBackend::new(settings.backend)?);
        let transport = Arc::new(PollingTransport::new(settings.push)?);
        Self::with_parts(
            backend,
            transport,
            Arc::new(PulldownRenderer),
            AtomicFileWriter::new(settings.output_dir),
        )
    }

    pub fn with_parts(
        backend: Arc<dyn Backend>,
        transport: Arc<dyn PushTransport>,
        renderer: Arc<dyn MarkdownRenderer>,
        writer: AtomicFileWriter,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let cancel = CancellationToken::new();
        let (join_tx, join_rx) = watch::channel(None);
        let services = Arc::new(Services {
            backend,
            renderer,
            writer,
        });

        let push_cancel = cancel.clone();
        let push_sink = ChannelEventSink::new(event_tx.clone());
        runtime.spawn(async move {
            transport.run(join_rx, push_cancel, &push_sink).await;
        });

        thread::spawn(move || {
            while let Ok(command) = cmd_rx.recv() {
                if let EngineCommand::Join { task_id } = command {
                    engine_debug!("Routing notifications to task {}", task_id);
                    join_tx.send_replace(Some(task_id));
                    continue;
                }
                let services = services.clone();
                let sink = ChannelEventSink::new(event_tx.clone());
                runtime.spawn(async move {
                    handle_command(&services, command, &sink).await;
                });
            }
            engine_debug!("Engine command channel closed");
        });

        Ok(Self {
            cmd_tx,
            event_rx,
            cancel,
        })
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            engine_error!("Engine worker is gone; command dropped");
        }
    }

    pub fn upload(&self, filename: impl Into<String>, bytes: Vec<u8>) {
        self.send(EngineCommand::Upload {
            filename: filename.into(),
            bytes,
        });
    }

    pub fn join(&self, task_id: impl Into<String>) {
        self.send(EngineCommand::Join {
            task_id: task_id.into(),
        });
    }

    pub fn analyze(&self, task_id: impl Into<String>, language: impl Into<String>) {
        self.send(EngineCommand::Analyze {
            task_id: task_id.into(),
            language: language.into(),
        });
    }

    pub fn start_translation(&self, task_id: impl Into<String>, use_terminology: bool) {
        self.send(EngineCommand::StartTranslation {
            task_id: task_id.into(),
            use_terminology,
        });
    }

    pub fn fetch_preview(&self, request_id: RequestId, task_id: impl Into<String>, kind: PreviewKind) {
        self.send(EngineCommand::FetchPreview {
            request_id,
            task_id: task_id.into(),
            kind,
        });
    }

    pub fn download(&self, task_id: impl Into<String>, suggested_name: impl Into<String>) {
        self.send(EngineCommand::Download {
            task_id: task_id.into(),
            suggested_name: suggested_name.into(),
        });
    }

    pub fn fetch_terminology(&self) {
        self.send(EngineCommand::FetchTerminology);
    }

    pub fn fetch_status(&self, task_id: impl Into<String>) {
        self.send(EngineCommand::FetchStatus {
            task_id: task_id.into(),
        });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Stop the push transport. Requests already in flight still report back.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn handle_command(services: &Services, command: EngineCommand, sink: &dyn EventSink) {
    let backend = services.backend.as_ref();
    let event = match command {
        EngineCommand::Upload { filename, bytes } => {
            EngineEvent::Uploaded(backend.upload(&filename, bytes).await)
        }
        EngineCommand::Analyze { task_id, language } => {
            let result = backend.analyze(&task_id, &language).await;
            EngineEvent::Analyzed { task_id, result }
        }
        EngineCommand::StartTranslation {
            task_id,
            use_terminology,
        } => {
            let result = backend.start_translation(&task_id, use_terminology).await;
            EngineEvent::TranslationStarted { task_id, result }
        }
        EngineCommand::FetchPreview {
            request_id,
            task_id,
            kind,
        } => {
            let result = backend
                .preview(&task_id, kind)
                .await
                .map(|response| RenderedPreview {
                    rendered: services.renderer.to_html(&response.content),
                    raw: response.content,
                    chapters: response.chapters,
                });
            EngineEvent::PreviewFetched {
                request_id,
                kind,
                result,
            }
        }
        EngineCommand::Download {
            task_id,
            suggested_name,
        } => {
            let result = download(services, &task_id, &suggested_name).await;
            EngineEvent::Downloaded { task_id, result }
        }
        EngineCommand::FetchTerminology => EngineEvent::Terminology(backend.terminology().await),
        EngineCommand::FetchStatus { task_id } => {
            let result = backend.status(&task_id).await;
            EngineEvent::Status { task_id, result }
        }
        EngineCommand::Join { .. } => return,
    };
    sink.emit(event);
}

async fn download(
    services: &Services,
    task_id: &str,
    suggested_name: &str,
) -> Result<PathBuf, DownloadError> {
    let file = services.backend.download(task_id).await?;
    let name = file.filename.as_deref().unwrap_or(suggested_name);
    let writer = services.writer.clone();
    let name = name.to_string();
    // Blocking fs work stays off the async workers.
    let path = tokio::task::spawn_blocking(move || writer.write(&name, &file.bytes))
        .await
        .map_err(|err| std::io::Error::other(err.to_string()))
        .map_err(crate::persist::PersistError::from)??;
    Ok(path)
}
