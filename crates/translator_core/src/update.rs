use engine_logging::{engine_debug, engine_info, engine_warn};

use crate::format::{format_bytes, format_number};
use crate::log_stream::{LogEntry, Severity};
use crate::msg::{AnalysisResult, LogEvent, RemoteStage, RemoteStatus, UploadInfo};
use crate::preview::{FetchedPreview, PreviewContent, PreviewTarget, RequestId};
use crate::progress::ProgressSnapshot;
use crate::task::{detect_completion, Stage, TranslationHandle};
use crate::terminology::TerminologyPanel;
use crate::{AppState, Effect, Msg};

pub const MARKDOWN_ONLY_ALERT: &str = "Only Markdown (.md) files are supported!";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileChosen { filename, bytes } => choose_file(&mut state, filename, bytes),
        Msg::UploadSucceeded(info) => upload_succeeded(&mut state, info),
        Msg::UploadFailed(message) => {
            state.set_upload_in_flight(false);
            state.log_local(Severity::Error, format!("❌ Upload failed: {message}"));
            Vec::new()
        }
        Msg::LanguageSelected(language) => {
            state.set_language(language);
            Vec::new()
        }
        Msg::TerminologyToggled(enabled) => {
            state.set_use_terminology(enabled);
            Vec::new()
        }
        Msg::AnalyzeClicked => analyze_clicked(&mut state),
        Msg::AnalyzeSucceeded { task_id, result } => {
            if state.is_current_task(&task_id) {
                analyze_succeeded(&mut state, result);
            }
            Vec::new()
        }
        Msg::AnalyzeFailed { task_id, message } => {
            if state.is_current_task(&task_id) {
                state.set_analyze_in_flight(false);
                state.log_local(Severity::Error, format!("❌ Analysis failed: {message}"));
            }
            Vec::new()
        }
        Msg::TranslateClicked => translate_clicked(&mut state),
        Msg::TranslateAccepted { task_id } => {
            if state.is_current_task(&task_id) {
                if let Some(handle) = state.translation_mut() {
                    handle.accept();
                }
                state.log_local(Severity::Success, "✅ Translation task started");
            }
            Vec::new()
        }
        Msg::TranslateRejected { task_id, message } => {
            if state.is_current_task(&task_id) {
                translate_rejected(&mut state, message);
            }
            Vec::new()
        }
        Msg::DownloadClicked => download_clicked(&mut state),
        Msg::DownloadSaved { task_id, path } => {
            if state.is_current_task(&task_id) {
                state.set_download_in_flight(false);
                state.log_local(Severity::Success, format!("💾 Saved translation to {path}"));
            }
            Vec::new()
        }
        Msg::DownloadFailed { task_id, message } => {
            if state.is_current_task(&task_id) {
                state.set_download_in_flight(false);
                state.log_local(Severity::Error, format!("❌ Download failed: {message}"));
            }
            Vec::new()
        }
        Msg::PreviewRequested(target) => preview_requested(&mut state, target),
        Msg::PreviewLoaded {
            request_id,
            target,
            preview,
        } => {
            preview_loaded(&mut state, request_id, target, preview);
            Vec::new()
        }
        Msg::PreviewFailed { request_id, message } => {
            if state.preview.fail(request_id, message) {
                state.mark_dirty();
            } else {
                engine_debug!("Dropping stale preview failure for request {}", request_id);
            }
            Vec::new()
        }
        Msg::PreviewModeSelected(mode) => {
            state.preview.set_mode(mode);
            state.mark_dirty();
            Vec::new()
        }
        Msg::PreviewClosed => {
            state.preview.close();
            state.mark_dirty();
            Vec::new()
        }
        Msg::TerminologyRequested => {
            state.terminology = TerminologyPanel::Loading;
            state.mark_dirty();
            vec![Effect::FetchTerminology]
        }
        Msg::TerminologyLoaded(overview) => {
            if state.terminology == TerminologyPanel::Loading {
                state.terminology = TerminologyPanel::Loaded(overview);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TerminologyFailed(message) => {
            if state.terminology == TerminologyPanel::Loading {
                state.terminology = TerminologyPanel::Failed(message);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TerminologyClosed => {
            state.terminology = TerminologyPanel::Closed;
            state.mark_dirty();
            Vec::new()
        }
        Msg::StatusRequested => match state.task_id() {
            Some(task_id) => vec![Effect::FetchStatus {
                task_id: task_id.to_string(),
            }],
            None => Vec::new(),
        },
        Msg::StatusLoaded { task_id, status } => {
            if state.is_current_task(&task_id) {
                status_loaded(&mut state, status);
            }
            Vec::new()
        }
        Msg::StatusFailed { task_id, message } => {
            if state.is_current_task(&task_id) {
                state.log_local(Severity::Warning, format!("⚠️ Status check failed: {message}"));
            }
            Vec::new()
        }
        Msg::ConnectionChanged(connection) => {
            engine_info!("Push channel is now {:?}", connection);
            state.set_connection(connection);
            Vec::new()
        }
        Msg::PushLog(event) => {
            push_log(&mut state, event);
            Vec::new()
        }
        Msg::PushProgress(snapshot) => {
            if state.stage() == Stage::Translating {
                state.progress.apply(snapshot);
                state.mark_dirty();
            } else {
                engine_debug!("Dropping progress outside translation: {:?}", snapshot);
            }
            Vec::new()
        }
        Msg::PushStage(remote) => {
            apply_remote_stage(&mut state, remote);
            Vec::new()
        }
        Msg::Tick(clock) => {
            state.set_clock(clock);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn choose_file(state: &mut AppState, filename: String, bytes: Vec<u8>) -> Vec<Effect> {
    if !filename.ends_with(".md") {
        return vec![Effect::Alert(MARKDOWN_ONLY_ALERT.to_string())];
    }
    if state.upload_in_flight() {
        engine_warn!("Ignoring {} while another upload is in flight", filename);
        return Vec::new();
    }
    state.set_upload_in_flight(true);
    state.log_local(Severity::Info, "📤 Uploading file...");
    vec![Effect::Upload { filename, bytes }]
}

fn upload_succeeded(state: &mut AppState, info: UploadInfo) -> Vec<Effect> {
    let task_id = info.task_id.clone();
    let filename = info.filename.clone();
    let summary = format!(
        "📊 Size: {} | Characters: {}",
        format_bytes(info.size),
        format_number(info.chars)
    );
    state.begin_session(info);
    state.log_local(
        Severity::Success,
        format!("✅ File uploaded successfully: {filename}"),
    );
    state.log_local(Severity::Info, summary);
    vec![Effect::JoinNotifications { task_id }]
}

fn analyze_clicked(state: &mut AppState) -> Vec<Effect> {
    let Some(task_id) = state.task_id().map(str::to_string) else {
        return Vec::new();
    };
    if !state.stage().can_analyze() || state.analyze_in_flight() {
        return Vec::new();
    }
    state.set_analyze_in_flight(true);
    state.log_local(Severity::Info, "🔍 Analyzing chapter structure...");
    vec![Effect::Analyze {
        task_id,
        language: state.language().to_string(),
    }]
}

fn analyze_succeeded(state: &mut AppState, result: AnalysisResult) {
    state.set_analyze_in_flight(false);
    let stage = match state.stage().on_analyzed() {
        Ok(stage) => stage,
        Err(err) => {
            engine_warn!("Ignoring analysis result: {}", err);
            return;
        }
    };
    if result.total_chunks as usize != result.chunks.len() {
        engine_warn!(
            "Analysis reported {} chunks but listed {}",
            result.total_chunks,
            result.chunks.len()
        );
    }
    if let Err(err) = state.chunks.populate(result.chunks) {
        state.log_local(Severity::Error, format!("❌ Analysis failed: {err}"));
        return;
    }
    let language = state.language().to_string();
    state.set_session_language(language);
    state.set_stage(stage);
    let count = state.chunks.len();
    state.log_local(Severity::Success, "✅ Analysis complete!");
    state.log_local(Severity::Info, format!("✂️  Split into {count} chunks"));
}

fn translate_clicked(state: &mut AppState) -> Vec<Effect> {
    let Some(task_id) = state.task_id().map(str::to_string) else {
        return Vec::new();
    };
    if state
        .translation()
        .is_some_and(|handle| !handle.is_finished())
    {
        return Vec::new();
    }
    let stage = match state.stage().on_translate_issued() {
        Ok(stage) => stage,
        Err(err) => {
            engine_debug!("Translate ignored: {}", err);
            return Vec::new();
        }
    };
    let use_terminology = state.use_terminology();
    state.progress.reset();
    state.set_translation(TranslationHandle::issued(task_id.clone(), use_terminology));
    state.set_stage(stage);
    state.log_local(Severity::Info, "🚀 Starting translation task...");
    if use_terminology {
        state.log_local(Severity::Info, "📚 Using terminology database for consistency");
    } else {
        state.log_local(Severity::Info, "ℹ️  Terminology database disabled");
    }
    vec![Effect::StartTranslation {
        task_id,
        use_terminology,
    }]
}

fn translate_rejected(state: &mut AppState, message: String) {
    if let Some(handle) = state.translation_mut() {
        handle.reject(message.clone());
    }
    match state.stage().on_translate_rejected() {
        Ok(stage) => state.set_stage(stage),
        Err(err) => engine_warn!("Translate rejection arrived late: {}", err),
    }
    state.log_local(Severity::Error, format!("❌ Failed to start: {message}"));
}

fn download_clicked(state: &mut AppState) -> Vec<Effect> {
    let Some(session) = state.session() else {
        return Vec::new();
    };
    if !state.stage().is_downloadable() {
        return Vec::new();
    }
    let effect = Effect::Download {
        task_id: session.task_id.clone(),
        suggested_name: session.result_filename(),
    };
    state.set_download_in_flight(true);
    state.log_local(Severity::Info, "📥 Starting download...");
    vec![effect]
}

fn preview_requested(state: &mut AppState, target: PreviewTarget) -> Vec<Effect> {
    let Some(task_id) = state.task_id().map(str::to_string) else {
        return Vec::new();
    };
    if let PreviewTarget::Chunk(id) = target {
        if let Err(err) = state.chunks.get(id) {
            engine_warn!("Preview requested for unregistered chunk {}", id);
            state.preview.reject_unknown(target, err.to_string());
            state.mark_dirty();
            return Vec::new();
        }
    }
    let request_id = state.preview.begin(target);
    state.mark_dirty();
    vec![Effect::FetchPreview {
        request_id,
        task_id,
        target,
    }]
}

fn preview_loaded(
    state: &mut AppState,
    request_id: RequestId,
    target: PreviewTarget,
    preview: FetchedPreview,
) {
    let chapters = match (preview.chapters, target) {
        (Some(chapters), _) => chapters,
        (None, PreviewTarget::Chunk(id)) => state
            .chunks
            .get(id)
            .map(|chunk| chunk.chapters.clone())
            .unwrap_or_default(),
        (None, _) => Vec::new(),
    };
    let content = PreviewContent::new(target, preview.raw, preview.rendered, chapters);
    if state.preview.resolve(request_id, content) {
        state.mark_dirty();
    } else {
        engine_debug!("Dropping stale preview result for request {}", request_id);
    }
}

fn push_log(state: &mut AppState, event: LogEvent) {
    let timestamp = event
        .timestamp
        .filter(|ts| !ts.trim().is_empty())
        .unwrap_or_else(|| state.clock().to_string());
    let completes = detect_completion(&event.message);
    let entry = LogEntry::new(timestamp, Severity::from_level(&event.level), event.message);
    state.push_log(entry, event.update_last);

    if completes {
        complete_translation(state);
    }
}

fn complete_translation(state: &mut AppState) {
    match state.stage().on_completed() {
        Ok(stage) => {
            state.set_stage(stage);
            if let Some(handle) = state.translation_mut() {
                handle.complete();
            }
        }
        Err(err) => engine_debug!("Completion signal ignored: {}", err),
    }
}

fn fail_translation(state: &mut AppState, message: String) {
    match state.stage().on_failed() {
        Ok(stage) => {
            state.set_stage(stage);
            if let Some(handle) = state.translation_mut() {
                handle.fail(message.clone());
            }
            state.log_local(Severity::Error, format!("❌ Translation failed: {message}"));
        }
        Err(err) => engine_debug!("Failure signal ignored: {}", err),
    }
}

fn apply_remote_stage(state: &mut AppState, remote: RemoteStage) {
    match remote {
        RemoteStage::Completed => complete_translation(state),
        RemoteStage::Failed(message) => fail_translation(state, message),
    }
}

fn status_loaded(state: &mut AppState, status: RemoteStatus) {
    if status.total_chunks > 0 {
        let previous = state.progress.snapshot();
        state.progress.apply(ProgressSnapshot::clamped(
            f64::from(status.progress),
            f64::from(previous.chunk_percent),
            status.current_chunk,
            status.total_chunks,
        ));
        state.mark_dirty();
    }
    match status.status.as_str() {
        "completed" => complete_translation(state),
        "failed" => fail_translation(
            state,
            status.error.unwrap_or_else(|| "unknown error".to_string()),
        ),
        _ => {}
    }
}
