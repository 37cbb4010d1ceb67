//! Preview modal: one fetch per request, raw and rendered forms kept side by
//! side, results from superseded requests dropped.

use crate::chunks::ChunkId;
use crate::format::format_number;

pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Source,
    Chunk,
    Translation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewTarget {
    Source,
    Chunk(ChunkId),
    Translation,
}

impl PreviewTarget {
    pub fn kind(self) -> SourceKind {
        match self {
            PreviewTarget::Source => SourceKind::Source,
            PreviewTarget::Chunk(_) => SourceKind::Chunk,
            PreviewTarget::Translation => SourceKind::Translation,
        }
    }

    pub fn title(self) -> String {
        match self {
            PreviewTarget::Source => "Uploaded File Preview".to_string(),
            PreviewTarget::Chunk(id) => format!("Chunk {id} Preview"),
            PreviewTarget::Translation => "Translation Preview".to_string(),
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            PreviewTarget::Source => "📄",
            PreviewTarget::Chunk(_) => "✂️",
            PreviewTarget::Translation => "✅",
        }
    }

    pub fn loading_label(self) -> String {
        match self {
            PreviewTarget::Source => "Loading uploaded file...".to_string(),
            PreviewTarget::Chunk(id) => format!("Loading chunk {id}..."),
            PreviewTarget::Translation => "Loading preview...".to_string(),
        }
    }

    pub fn failure_title(self) -> String {
        match self {
            PreviewTarget::Source => "Failed to load source file".to_string(),
            PreviewTarget::Chunk(id) => format!("Failed to load chunk {id}"),
            PreviewTarget::Translation => "Failed to load preview".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Raw,
    #[default]
    Rendered,
}

/// Result of a successful preview fetch, rendered by the caller's Markdown
/// renderer before it reaches the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPreview {
    pub raw: String,
    pub rendered: String,
    pub chapters: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewContent {
    pub target: PreviewTarget,
    pub raw: String,
    pub rendered: String,
    pub chapters: Vec<String>,
    pub word_count: usize,
    pub char_count: usize,
}

impl PreviewContent {
    pub fn new(target: PreviewTarget, raw: String, rendered: String, chapters: Vec<String>) -> Self {
        let word_count = raw.split_whitespace().count();
        let char_count = raw.chars().count();
        let chapters = match target {
            PreviewTarget::Chunk(_) => chapters,
            _ => Vec::new(),
        };
        Self {
            target,
            raw,
            rendered,
            chapters,
            word_count,
            char_count,
        }
    }

    pub fn stats_label(&self) -> String {
        let mut label = format!(
            "📊 {} words • {} characters",
            format_number(self.word_count as u64),
            format_number(self.char_count as u64)
        );
        if !self.chapters.is_empty() {
            label.push_str(" • ");
            label.push_str(&self.chapters.join(", "));
        }
        label
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The request never left: the chunk id is not in the registry.
    UnknownChunk,
    Fetch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewFailure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(PreviewFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewState {
    open: bool,
    target: Option<PreviewTarget>,
    pending: Option<RequestId>,
    next_request_id: RequestId,
    status: PreviewStatus,
    content: Option<PreviewContent>,
    mode: ViewMode,
}

impl PreviewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the modal in its loading state and allocate the id that tags the
    /// fetch for `target`.
    pub fn begin(&mut self, target: PreviewTarget) -> RequestId {
        self.next_request_id += 1;
        let request_id = self.next_request_id;
        self.open = true;
        self.target = Some(target);
        self.pending = Some(request_id);
        self.status = PreviewStatus::Loading;
        request_id
    }

    pub fn reject_unknown(&mut self, target: PreviewTarget, message: impl Into<String>) {
        self.open = true;
        self.target = Some(target);
        self.pending = None;
        self.status = PreviewStatus::Failed(PreviewFailure {
            kind: FailureKind::UnknownChunk,
            message: message.into(),
        });
    }

    /// Returns `false` when the result belongs to a superseded request.
    pub fn resolve(&mut self, request_id: RequestId, content: PreviewContent) -> bool {
        if self.pending != Some(request_id) {
            return false;
        }
        self.pending = None;
        self.status = PreviewStatus::Ready;
        self.content = Some(content);
        true
    }

    pub fn fail(&mut self, request_id: RequestId, message: impl Into<String>) -> bool {
        if self.pending != Some(request_id) {
            return false;
        }
        self.pending = None;
        self.status = PreviewStatus::Failed(PreviewFailure {
            kind: FailureKind::Fetch,
            message: message.into(),
        });
        true
    }

    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    /// Closing drops any in-flight request; its result will be ignored.
    pub fn close(&mut self) {
        self.open = false;
        self.pending = None;
        if self.status == PreviewStatus::Loading {
            self.status = PreviewStatus::Idle;
        }
    }

    pub fn reset(&mut self) {
        let next_request_id = self.next_request_id;
        *self = Self {
            next_request_id,
            ..Self::default()
        };
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn target(&self) -> Option<PreviewTarget> {
        self.target
    }

    pub fn pending(&self) -> Option<RequestId> {
        self.pending
    }

    pub fn status(&self) -> &PreviewStatus {
        &self.status
    }

    pub fn content(&self) -> Option<&PreviewContent> {
        self.content.as_ref()
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn view(&self) -> PreviewView {
        let status = match (&self.status, self.target) {
            (PreviewStatus::Loading, Some(target)) => PreviewStatusView::Loading {
                label: target.loading_label(),
            },
            (PreviewStatus::Failed(failure), Some(target)) => PreviewStatusView::Failed {
                title: target.failure_title(),
                message: failure.message.clone(),
                kind: failure.kind,
            },
            (PreviewStatus::Ready, _) => PreviewStatusView::Ready,
            _ => PreviewStatusView::Idle,
        };
        let body = self.content.as_ref().map(|content| match self.mode {
            ViewMode::Raw => content.raw.clone(),
            ViewMode::Rendered => content.rendered.clone(),
        });
        let download_offered = self.target == Some(PreviewTarget::Translation)
            && self
                .content
                .as_ref()
                .is_some_and(|content| content.target == PreviewTarget::Translation);

        PreviewView {
            open: self.open,
            title: self.target.map(PreviewTarget::title).unwrap_or_default(),
            icon: self.target.map(PreviewTarget::icon).unwrap_or_default(),
            status,
            mode: self.mode,
            body,
            stats: self.content.as_ref().map(PreviewContent::stats_label),
            download_offered,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreviewStatusView {
    #[default]
    Idle,
    Loading {
        label: String,
    },
    Ready,
    Failed {
        title: String,
        message: String,
        kind: FailureKind,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreviewView {
    pub open: bool,
    pub title: String,
    pub icon: &'static str,
    pub status: PreviewStatusView,
    pub mode: ViewMode,
    /// Last successfully loaded content in the selected mode.
    pub body: Option<String>,
    pub stats: Option<String>,
    pub download_offered: bool,
}
