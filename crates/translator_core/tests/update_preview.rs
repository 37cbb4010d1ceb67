use std::sync::Once;

use pretty_assertions::assert_eq;
use translator_core::{
    update, AnalysisResult, AppState, Chunk, Effect, FailureKind, FetchedPreview, Msg,
    PreviewStatusView, PreviewTarget, UploadInfo, ViewMode,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn analyzed() -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::UploadSucceeded(UploadInfo {
            task_id: "t1".to_string(),
            filename: "novel.md".to_string(),
            size: 10_000,
            chars: 9_000,
            words: Some(1_500),
        }),
    );
    let (state, _) = update(state, Msg::AnalyzeClicked);
    let chunks = (1..=3)
        .map(|id| Chunk {
            id,
            size: 3_000,
            chapters: vec![format!("Chapter {id}")],
            has_prologue: false,
            has_epilogue: false,
        })
        .collect();
    let (state, _) = update(
        state,
        Msg::AnalyzeSucceeded {
            task_id: "t1".to_string(),
            result: AnalysisResult {
                total_chunks: 3,
                chunks,
            },
        },
    );
    state
}

fn request(state: AppState, target: PreviewTarget) -> (AppState, u64) {
    let (state, effects) = update(state, Msg::PreviewRequested(target));
    match effects.as_slice() {
        [Effect::FetchPreview {
            request_id,
            task_id,
            target: requested,
        }] => {
            assert_eq!(task_id, "t1");
            assert_eq!(*requested, target);
            (state, *request_id)
        }
        other => panic!("expected one FetchPreview, got {other:?}"),
    }
}

fn fetched(raw: &str) -> FetchedPreview {
    FetchedPreview {
        raw: raw.to_string(),
        rendered: format!("<p>{raw}</p>"),
        chapters: None,
    }
}

#[test]
fn chunk_preview_shows_content_and_registry_chapters() {
    init_logging();
    let (state, request_id) = request(analyzed(), PreviewTarget::Chunk(2));
    let view = state.view().preview;
    assert!(view.open);
    assert_eq!(view.title, "Chunk 2 Preview");
    assert_eq!(
        view.status,
        PreviewStatusView::Loading {
            label: "Loading chunk 2...".to_string()
        }
    );

    let (state, _) = update(
        state,
        Msg::PreviewLoaded {
            request_id,
            target: PreviewTarget::Chunk(2),
            preview: fetched("two words"),
        },
    );
    let view = state.view().preview;
    assert_eq!(view.status, PreviewStatusView::Ready);
    assert_eq!(view.body.as_deref(), Some("<p>two words</p>"));
    assert_eq!(
        view.stats.as_deref(),
        Some("📊 2 words • 9 characters • Chapter 2")
    );
}

#[test]
fn mode_toggle_switches_between_raw_and_rendered() {
    init_logging();
    let (state, request_id) = request(analyzed(), PreviewTarget::Source);
    let (state, _) = update(
        state,
        Msg::PreviewLoaded {
            request_id,
            target: PreviewTarget::Source,
            preview: fetched("# Title"),
        },
    );
    let (state, _) = update(state, Msg::PreviewModeSelected(ViewMode::Raw));
    assert_eq!(state.view().preview.body.as_deref(), Some("# Title"));

    let (state, _) = update(state, Msg::PreviewModeSelected(ViewMode::Rendered));
    assert_eq!(state.view().preview.body.as_deref(), Some("<p># Title</p>"));
}

#[test]
fn failed_chunk_preview_is_reported_inline_and_toggle_still_works() {
    init_logging();
    let (state, request_id) = request(analyzed(), PreviewTarget::Chunk(2));
    let (state, _) = update(
        state,
        Msg::PreviewFailed {
            request_id,
            message: "Chunk not found".to_string(),
        },
    );
    let view = state.view().preview;
    assert!(view.open);
    assert_eq!(
        view.status,
        PreviewStatusView::Failed {
            title: "Failed to load chunk 2".to_string(),
            message: "Chunk not found".to_string(),
            kind: FailureKind::Fetch,
        }
    );

    let (state, effects) = update(state, Msg::PreviewModeSelected(ViewMode::Raw));
    assert!(effects.is_empty());
    assert_eq!(state.view().preview.mode, ViewMode::Raw);
}

#[test]
fn unknown_chunk_is_rejected_without_a_request() {
    init_logging();
    let (state, effects) = update(analyzed(), Msg::PreviewRequested(PreviewTarget::Chunk(9)));
    assert!(effects.is_empty());
    match state.view().preview.status {
        PreviewStatusView::Failed { kind, title, .. } => {
            assert_eq!(kind, FailureKind::UnknownChunk);
            assert_eq!(title, "Failed to load chunk 9");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn superseded_result_never_replaces_newer_request() {
    init_logging();
    let (state, first) = request(analyzed(), PreviewTarget::Chunk(1));
    let (state, second) = request(state, PreviewTarget::Chunk(2));
    assert_ne!(first, second);

    let (state, _) = update(
        state,
        Msg::PreviewLoaded {
            request_id: second,
            target: PreviewTarget::Chunk(2),
            preview: fetched("second"),
        },
    );
    let (state, _) = update(
        state,
        Msg::PreviewLoaded {
            request_id: first,
            target: PreviewTarget::Chunk(1),
            preview: fetched("first"),
        },
    );

    let view = state.view().preview;
    assert_eq!(view.title, "Chunk 2 Preview");
    assert_eq!(view.body.as_deref(), Some("<p>second</p>"));
}

#[test]
fn late_failure_does_not_override_ready_preview() {
    init_logging();
    let (state, first) = request(analyzed(), PreviewTarget::Source);
    let (state, second) = request(state, PreviewTarget::Source);
    let (state, _) = update(
        state,
        Msg::PreviewLoaded {
            request_id: second,
            target: PreviewTarget::Source,
            preview: fetched("body"),
        },
    );
    let (state, _) = update(
        state,
        Msg::PreviewFailed {
            request_id: first,
            message: "timeout".to_string(),
        },
    );
    assert_eq!(state.view().preview.status, PreviewStatusView::Ready);
}

#[test]
fn closing_discards_in_flight_result() {
    init_logging();
    let (state, request_id) = request(analyzed(), PreviewTarget::Source);
    let (state, _) = update(state, Msg::PreviewClosed);
    let (state, _) = update(
        state,
        Msg::PreviewLoaded {
            request_id,
            target: PreviewTarget::Source,
            preview: fetched("late"),
        },
    );
    let view = state.view().preview;
    assert!(!view.open);
    assert_eq!(view.body, None);
    assert_eq!(view.status, PreviewStatusView::Idle);
}

#[test]
fn translation_preview_offers_download() {
    init_logging();
    let (state, request_id) = request(analyzed(), PreviewTarget::Translation);
    let (state, _) = update(
        state,
        Msg::PreviewLoaded {
            request_id,
            target: PreviewTarget::Translation,
            preview: fetched("翻訳"),
        },
    );
    assert!(state.view().preview.download_offered);
}

#[test]
fn preview_needs_a_task() {
    init_logging();
    let (_, effects) = update(AppState::new(), Msg::PreviewRequested(PreviewTarget::Source));
    assert!(effects.is_empty());
}
