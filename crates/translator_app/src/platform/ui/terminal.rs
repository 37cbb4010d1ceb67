use std::io::{self, Write};

use translator_core::Tone;

use super::render::{Line, LineKind};

const RESET: &str = "\x1b[0m";
const CURSOR_UP_CLEAR: &str = "\x1b[1A\x1b[2K\r";

fn color(tone: Tone) -> &'static str {
    match tone {
        Tone::Gray => "\x1b[90m",
        Tone::Blue => "\x1b[34m",
        Tone::Green => "\x1b[32m",
        Tone::Yellow => "\x1b[33m",
        Tone::Red => "\x1b[31m",
    }
}

/// Writes rendered lines, overwriting the previous line in place when a
/// replacement follows a line of the same kind.
pub struct TerminalWriter<W: Write> {
    out: W,
    colored: bool,
    last_kind: Option<LineKind>,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(out: W, colored: bool) -> Self {
        Self {
            out,
            colored,
            last_kind: None,
        }
    }

    pub fn write_lines(&mut self, lines: &[Line]) -> io::Result<()> {
        for line in lines {
            if line.replace && self.colored && self.last_kind == Some(line.kind) {
                self.out.write_all(CURSOR_UP_CLEAR.as_bytes())?;
            }
            if self.colored {
                writeln!(self.out, "{}{}{}", color(line.tone), line.text, RESET)?;
            } else {
                writeln!(self.out, "{}", line.text)?;
            }
            self.last_kind = Some(line.kind);
        }
        self.out.flush()
    }

    /// Print a free-standing notice, such as an alert, outside the view.
    pub fn notice(&mut self, tone: Tone, text: &str) -> io::Result<()> {
        self.write_lines(&[Line {
            kind: LineKind::Event,
            tone,
            text: text.to_string(),
            replace: false,
        }])
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}
