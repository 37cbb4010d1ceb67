//! Ordered log list with in-place coalescing of streaming progress lines.

const PROGRESS_MARKERS: &[&str] = &["📥", "已接收"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
    Progress,
}

impl Severity {
    /// Unrecognized levels fall back to `Info`.
    pub fn from_level(level: &str) -> Self {
        match level.trim().to_ascii_lowercase().as_str() {
            "success" => Severity::Success,
            "warning" | "warn" => Severity::Warning,
            "error" => Severity::Error,
            "progress" => Severity::Progress,
            _ => Severity::Info,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Success => "✅",
            Severity::Warning => "⚠️",
            Severity::Error => "❌",
            Severity::Progress => "📥",
        }
    }

    pub fn tone(self) -> Tone {
        match self {
            Severity::Info => Tone::Blue,
            Severity::Success => Tone::Green,
            Severity::Warning => Tone::Yellow,
            Severity::Error => Tone::Red,
            Severity::Progress => Tone::Gray,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Gray,
    Blue,
    Green,
    Yellow,
    Red,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub timestamp: String,
    pub severity: Severity,
    pub message: String,
    pub is_progress: bool,
}

impl LogEntry {
    pub fn new(timestamp: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        let message = message.into();
        let is_progress = severity == Severity::Progress || is_progress_text(&message);
        Self {
            timestamp: timestamp.into(),
            severity,
            message,
            is_progress,
        }
    }
}

fn is_progress_text(message: &str) -> bool {
    PROGRESS_MARKERS.iter().any(|marker| message.contains(marker))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Appended,
    Coalesced,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogStream {
    entries: Vec<LogEntry>,
}

impl LogStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry`, or fold it into the last entry when `update_last` is
    /// set and that entry is itself a progress line.
    pub fn push(&mut self, entry: LogEntry, update_last: bool) -> PushOutcome {
        if update_last {
            if let Some(last) = self.entries.last_mut().filter(|last| last.is_progress) {
                last.message = entry.message;
                last.timestamp = entry.timestamp;
                return PushOutcome::Coalesced;
            }
        }
        self.entries.push(entry);
        PushOutcome::Appended
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Escape text so it is shown literally by markup-based renderers.
pub fn escape_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(severity: Severity, message: &str) -> LogEntry {
        LogEntry::new("12:00:00", severity, message)
    }

    #[test]
    fn update_last_replaces_progress_entry_in_place() {
        let mut log = LogStream::new();
        log.push(entry(Severity::Info, "start"), false);
        log.push(entry(Severity::Progress, "📥 Receiving translation... 10 characters"), true);
        let outcome = log.push(
            LogEntry::new("12:00:05", Severity::Progress, "📥 Receiving translation... 90 characters"),
            true,
        );

        assert_eq!(outcome, PushOutcome::Coalesced);
        assert_eq!(log.len(), 2);
        assert_eq!(log.entries()[1].message, "📥 Receiving translation... 90 characters");
        assert_eq!(log.entries()[1].timestamp, "12:00:05");
    }

    #[test]
    fn update_last_appends_when_last_is_not_progress() {
        let mut log = LogStream::new();
        log.push(entry(Severity::Success, "Chunk 1 completed"), false);
        let outcome = log.push(entry(Severity::Progress, "📥 Receiving"), true);
        assert_eq!(outcome, PushOutcome::Appended);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn localized_received_marker_counts_as_progress() {
        let mut log = LogStream::new();
        log.push(entry(Severity::Info, "已接收 120 字符"), false);
        assert_eq!(log.push(entry(Severity::Info, "已接收 240 字符"), true), PushOutcome::Coalesced);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn update_last_on_empty_log_appends() {
        let mut log = LogStream::new();
        assert_eq!(log.push(entry(Severity::Progress, "📥 first"), true), PushOutcome::Appended);
    }

    #[test]
    fn coalesced_entry_keeps_original_severity() {
        let mut log = LogStream::new();
        log.push(entry(Severity::Progress, "📥 a"), false);
        log.push(entry(Severity::Warning, "b"), true);
        assert_eq!(log.entries()[0].severity, Severity::Progress);
        assert_eq!(log.entries()[0].message, "b");
    }

    #[test]
    fn unknown_level_falls_back_to_info() {
        assert_eq!(Severity::from_level("debug"), Severity::Info);
        assert_eq!(Severity::from_level("ERROR"), Severity::Error);
        assert_eq!(Severity::from_level("bogus").tone(), Tone::Blue);
    }

    #[test]
    fn markup_is_escaped() {
        assert_eq!(
            escape_markup("<b>\"x\" & 'y'</b>"),
            "&lt;b&gt;&quot;x&quot; &amp; &#39;y&#39;&lt;/b&gt;"
        );
    }
}
