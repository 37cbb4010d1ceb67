use translator_core::{
    AppViewModel, ChannelIndicator, FileInfoView, Highlight, LogRowView, PreviewStatusView,
    PreviewView, ProgressView, Stage, TerminologyView, Tone,
};

use super::constants::*;

/// What a printed line represents; a replacement only applies to a line of
/// the same kind written immediately before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Log,
    Progress,
    Event,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub kind: LineKind,
    pub tone: Tone,
    pub text: String,
    /// Overwrite the previous line instead of appending.
    pub replace: bool,
}

impl Line {
    fn event(tone: Tone, text: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Event,
            tone,
            text: text.into(),
            replace: false,
        }
    }
}

/// Turns successive view models into the lines that changed since the last
/// render.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    stage: Option<Stage>,
    file: Option<FileInfoView>,
    channel: Option<ChannelIndicator>,
    log_printed: usize,
    last_log: Option<LogRowView>,
    progress: ProgressView,
    chunks_printed: bool,
    preview: PreviewView,
    terminology: TerminologyView,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel) -> Vec<Line> {
        let mut lines = Vec::new();
        self.render_file(view, &mut lines);
        self.render_stage(view, &mut lines);
        self.render_channel(view, &mut lines);
        self.render_log(view, &mut lines);
        self.render_chunks(view, &mut lines);
        self.render_progress(view, &mut lines);
        self.render_preview(view, &mut lines);
        self.render_terminology(view, &mut lines);
        lines
    }

    fn render_file(&mut self, view: &AppViewModel, lines: &mut Vec<Line>) {
        if view.file == self.file {
            return;
        }
        self.file = view.file.clone();
        self.chunks_printed = false;
        if let Some(file) = &view.file {
            let mut text = format!(
                "📄 {} | {} | {} chars",
                sanitize(&file.filename),
                file.size_label,
                file.chars_label
            );
            if let Some(words) = &file.words_label {
                text.push_str(&format!(" | {words} words"));
            }
            lines.push(Line::event(Tone::Blue, text));
        }
    }

    fn render_stage(&mut self, view: &AppViewModel, lines: &mut Vec<Line>) {
        if self.stage == Some(view.stage) {
            return;
        }
        self.stage = Some(view.stage);
        let tone = match view.stage {
            Stage::Completed => Tone::Green,
            Stage::Failed => Tone::Red,
            Stage::Translating => Tone::Yellow,
            _ => Tone::Gray,
        };
        let mut text = format!("Stage: {}", view.stage);
        if let (Stage::Analyzed, Some(target)) = (view.stage, &view.target_language_label) {
            text.push_str(&format!(" ({target})"));
        }
        lines.push(Line::event(tone, text));
    }

    fn render_channel(&mut self, view: &AppViewModel, lines: &mut Vec<Line>) {
        if self.channel == Some(view.channel) {
            return;
        }
        self.channel = Some(view.channel);
        lines.push(Line::event(
            view.channel.tone(),
            format!("{CHANNEL_DOT} {}", view.channel.label()),
        ));
    }

    fn render_log(&mut self, view: &AppViewModel, lines: &mut Vec<Line>) {
        if view.log.len() < self.log_printed {
            // Cleared by a new upload.
            self.log_printed = 0;
            self.last_log = None;
        }
        if self.log_printed > 0 {
            let previous = &view.log[self.log_printed - 1];
            if self.last_log.as_ref() != Some(previous) {
                let mut line = log_line(previous);
                line.replace = true;
                lines.push(line);
            }
        }
        for row in &view.log[self.log_printed..] {
            lines.push(log_line(row));
        }
        self.log_printed = view.log.len();
        self.last_log = view.log.last().cloned();
    }

    fn render_chunks(&mut self, view: &AppViewModel, lines: &mut Vec<Line>) {
        if self.chunks_printed || view.chunks.is_empty() {
            return;
        }
        self.chunks_printed = true;
        for chunk in &view.chunks {
            let mut text = format!("  {:<9} {:>14}", chunk.title, chunk.size_label);
            if !chunk.chapters.is_empty() {
                text.push_str(&format!("  {}", sanitize(&chunk.chapters)));
            }
            if chunk.prologue {
                text.push_str(&format!(" [{PROLOGUE_BADGE}]"));
            }
            if chunk.epilogue {
                text.push_str(&format!(" [{EPILOGUE_BADGE}]"));
            }
            lines.push(Line::event(Tone::Gray, text));
        }
    }

    fn render_progress(&mut self, view: &AppViewModel, lines: &mut Vec<Line>) {
        if view.progress == self.progress {
            return;
        }
        let replace = self.progress != ProgressView::default();
        self.progress = view.progress;
        if view.progress == ProgressView::default() {
            return;
        }
        let strip: String = view
            .highlights
            .iter()
            .map(|(_, highlight)| match highlight {
                Highlight::Done => CHUNK_DONE,
                Highlight::Active => CHUNK_ACTIVE,
                Highlight::Pending => CHUNK_PENDING,
            })
            .collect();
        let mut text = format!(
            "{} {:>3}% | Chunk {}/{} {:>3}%",
            progress_bar(view.progress.overall_percent),
            view.progress.overall_percent,
            view.progress.current_chunk,
            view.progress.total_chunks,
            view.progress.chunk_percent
        );
        if !strip.is_empty() {
            text.push_str(&format!(" {strip}"));
        }
        lines.push(Line {
            kind: LineKind::Progress,
            tone: Tone::Blue,
            text,
            replace,
        });
    }

    fn render_preview(&mut self, view: &AppViewModel, lines: &mut Vec<Line>) {
        let preview = &view.preview;
        if *preview == self.preview {
            return;
        }
        let status_changed = preview.status != self.preview.status;
        let mode_changed = preview.mode != self.preview.mode;
        self.preview = preview.clone();
        if !preview.open {
            return;
        }
        match &preview.status {
            PreviewStatusView::Loading { label } if status_changed => {
                lines.push(Line::event(Tone::Gray, format!("{} {label}", preview.icon)));
            }
            PreviewStatusView::Ready if status_changed || mode_changed => {
                let mut header = format!("{} {}", preview.icon, preview.title);
                if let Some(stats) = &preview.stats {
                    header.push_str(&format!(" ({stats})"));
                }
                lines.push(Line::event(Tone::Green, header));
                lines.push(Line::event(Tone::Gray, RULE));
                if let Some(body) = &preview.body {
                    for text in body.lines() {
                        lines.push(Line::event(Tone::Gray, sanitize(text)));
                    }
                }
                lines.push(Line::event(Tone::Gray, RULE));
                if preview.download_offered {
                    lines.push(Line::event(Tone::Blue, DOWNLOAD_HINT));
                }
            }
            PreviewStatusView::Failed { title, message, .. } if status_changed => {
                lines.push(Line::event(
                    Tone::Red,
                    format!("❌ {title}: {}", sanitize(message)),
                ));
            }
            _ => {}
        }
    }

    fn render_terminology(&mut self, view: &AppViewModel, lines: &mut Vec<Line>) {
        if view.terminology == self.terminology {
            return;
        }
        self.terminology = view.terminology.clone();
        match &view.terminology {
            TerminologyView::Closed => {}
            TerminologyView::Loading => {
                lines.push(Line::event(Tone::Gray, "📚 Loading terminology..."));
            }
            TerminologyView::Failed { message } => lines.push(Line::event(
                Tone::Red,
                format!("❌ Failed to load terminology: {}", sanitize(message)),
            )),
            TerminologyView::Loaded { total, categories } => {
                lines.push(Line::event(
                    Tone::Green,
                    format!("📚 Terminology database: {total} terms"),
                ));
                if categories.is_empty() {
                    lines.push(Line::event(Tone::Gray, "  (empty)"));
                }
                for category in categories {
                    lines.push(Line::event(
                        Tone::Blue,
                        format!("  {} ({})", category.name, category.count),
                    ));
                    let mut samples = category
                        .samples
                        .iter()
                        .map(|term| sanitize(term))
                        .collect::<Vec<_>>()
                        .join(", ");
                    if category.remaining > 0 {
                        samples.push_str(&format!(", ... and {} more", category.remaining));
                    }
                    lines.push(Line::event(Tone::Gray, format!("    {samples}")));
                }
            }
        }
    }
}

fn log_line(row: &LogRowView) -> Line {
    Line {
        kind: LineKind::Log,
        tone: row.tone,
        text: format!("[{}] {} {}", row.timestamp, row.icon, sanitize(&row.message)),
        replace: false,
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent) * PROGRESS_WIDTH / 100;
    format!(
        "[{}{}]",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    )
}

/// Server text is printed verbatim except for control characters, which
/// could otherwise drive the terminal.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use translator_core::{
        update, AnalysisResult, AppState, Chunk, LogEvent, Msg, ProgressSnapshot, UploadInfo,
    };

    fn uploaded() -> AppState {
        update(
            AppState::new(),
            Msg::UploadSucceeded(UploadInfo {
                task_id: "t1".to_string(),
                filename: "book.md".to_string(),
                size: 2048,
                chars: 1500,
                words: None,
            }),
        )
        .0
    }

    fn translating() -> AppState {
        let (state, _) = update(uploaded(), Msg::AnalyzeClicked);
        let chunks = (1..=2)
            .map(|id| Chunk {
                id,
                size: 1000,
                chapters: Vec::new(),
                has_prologue: false,
                has_epilogue: false,
            })
            .collect();
        let (state, _) = update(
            state,
            Msg::AnalyzeSucceeded {
                task_id: "t1".to_string(),
                result: AnalysisResult {
                    total_chunks: 2,
                    chunks,
                },
            },
        );
        update(state, Msg::TranslateClicked).0
    }

    fn push(state: AppState, message: &str, update_last: bool) -> AppState {
        update(
            state,
            Msg::PushLog(LogEvent {
                message: message.to_string(),
                level: "progress".to_string(),
                timestamp: Some("10:00:00".to_string()),
                update_last,
            }),
        )
        .0
    }

    fn texts(lines: &[Line], kind: LineKind) -> Vec<String> {
        lines
            .iter()
            .filter(|line| line.kind == kind)
            .map(|line| line.text.clone())
            .collect()
    }

    #[test]
    fn first_render_prints_file_stage_and_log() {
        let mut renderer = TerminalRenderer::new();
        let lines = renderer.render(&uploaded().view());
        assert_eq!(lines[0].text, "📄 book.md | 2 KB | 1,500 chars");
        assert_eq!(lines[1].text, "Stage: Uploaded");
        assert_eq!(texts(&lines, LineKind::Log).len(), 2);
        assert!(renderer.render(&uploaded().view()).is_empty());
    }

    #[test]
    fn coalesced_progress_line_replaces_the_last_row() {
        let mut renderer = TerminalRenderer::new();
        let state = push(uploaded(), "📥 Received 10 tokens", false);
        renderer.render(&state.view());

        let state = push(state, "📥 Received 20 tokens", true);
        let lines = renderer.render(&state.view());
        assert_eq!(lines.len(), 1);
        assert!(lines[0].replace);
        assert!(lines[0].text.ends_with("📥 Received 20 tokens"));
    }

    #[test]
    fn control_characters_are_stripped() {
        assert_eq!(sanitize("a\u{1b}[31mb\tc\r\n"), "a[31mb c");
    }

    #[test]
    fn progress_updates_replace_each_other() {
        let mut renderer = TerminalRenderer::new();
        let state = translating();
        renderer.render(&state.view());

        let (state, _) = update(
            state,
            Msg::PushProgress(ProgressSnapshot::clamped(50.0, 10.0, 1, 2)),
        );
        let first = renderer.render(&state.view());
        let progress: Vec<_> = first
            .iter()
            .filter(|line| line.kind == LineKind::Progress)
            .collect();
        assert_eq!(progress.len(), 1);
        assert!(!progress[0].replace);
        assert!(progress[0].text.contains(" 50% | Chunk 1/2  10%"));

        let (state, _) = update(
            state,
            Msg::PushProgress(ProgressSnapshot::clamped(75.0, 60.0, 2, 2)),
        );
        let second = renderer.render(&state.view());
        assert_eq!(second.len(), 1);
        assert!(second[0].replace);
    }

    #[test]
    fn new_upload_restarts_the_log() {
        let mut renderer = TerminalRenderer::new();
        let state = push(uploaded(), "one", false);
        let state = push(state, "two", false);
        renderer.render(&state.view());

        let lines = renderer.render(&uploaded().view());
        assert_eq!(texts(&lines, LineKind::Log).len(), 2);
    }

    #[test]
    fn progress_bar_scales_to_width() {
        assert_eq!(progress_bar(0), format!("[{}]", "-".repeat(PROGRESS_WIDTH)));
        assert_eq!(progress_bar(100), format!("[{}]", "#".repeat(PROGRESS_WIDTH)));
    }
}
