use crate::chunks::{ChunkId, ChunkRowView};
use crate::connection::ChannelIndicator;
use crate::log_stream::Tone;
use crate::preview::PreviewView;
use crate::progress::Highlight;
use crate::task::{Stage, TranslationHandle};
use crate::terminology::TerminologyView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfoView {
    pub filename: String,
    pub size_label: String,
    pub chars_label: String,
    pub words_label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ButtonView {
    pub enabled: bool,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControlsView {
    pub upload_enabled: bool,
    pub analyze: ButtonView,
    pub translate: ButtonView,
    pub download_visible: bool,
    pub preview_source_enabled: bool,
    pub preview_translation_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRowView {
    pub timestamp: String,
    pub icon: &'static str,
    pub tone: Tone,
    /// Raw server text; never interpret as markup.
    pub message: String,
    /// `message` escaped for markup-based renderers.
    pub message_markup: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressView {
    pub overall_percent: u8,
    pub chunk_percent: u8,
    pub current_chunk: u32,
    pub total_chunks: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub stage: Stage,
    pub file: Option<FileInfoView>,
    pub language: String,
    pub language_label: String,
    /// Language the current task was analyzed for.
    pub target_language_label: Option<String>,
    pub use_terminology: bool,
    pub controls: ControlsView,
    pub channel: ChannelIndicator,
    pub log: Vec<LogRowView>,
    pub progress: ProgressView,
    pub chunks: Vec<ChunkRowView>,
    pub highlights: Vec<(ChunkId, Highlight)>,
    pub preview: PreviewView,
    pub terminology: TerminologyView,
    pub translation: Option<TranslationHandle>,
    pub dirty: bool,
}
