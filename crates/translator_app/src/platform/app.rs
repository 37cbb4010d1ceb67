use std::io::{self, Stdout};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use chrono::Local;
use engine_logging::{engine_info, engine_warn, set_task_context};
use translator_core::{update, AppState, Msg, Stage, TerminologyView, Tone, ViewMode};

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::ui::render::TerminalRenderer;
use super::ui::terminal::TerminalWriter;
use super::workflow::{Advance, Workflow};

const EVENT_WAIT: Duration = Duration::from_millis(50);
const TICK_INTERVAL: Duration = Duration::from_secs(1);

pub struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer,
    writer: TerminalWriter<Stdout>,
    ticks: mpsc::Receiver<Msg>,
    status_poll: Duration,
    last_status_poll: Instant,
    last_alert: Option<String>,
}

impl App {
    pub fn new(config: &AppConfig, colored: bool, preview_mode: ViewMode) -> Result<Self> {
        let runner = EffectRunner::new(config.engine_settings())?;

        let (tick_tx, ticks) = mpsc::channel();
        thread::spawn(move || {
            while tick_tx.send(Msg::Tick(clock_now())).is_ok() {
                thread::sleep(TICK_INTERVAL);
            }
        });

        let mut app = Self {
            state: AppState::new(),
            runner,
            renderer: TerminalRenderer::new(),
            writer: TerminalWriter::new(io::stdout(), colored),
            ticks,
            status_poll: config.status_poll_interval(),
            last_status_poll: Instant::now(),
            last_alert: None,
        };
        app.dispatch(Msg::Tick(clock_now()));
        app.dispatch(Msg::PreviewModeSelected(preview_mode));
        Ok(app)
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let view = state.view();
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);

        for alert in self.runner.take_alerts() {
            if let Err(err) = self.writer.notice(Tone::Yellow, &format!("⚠️  {alert}")) {
                engine_warn!("Terminal write failed: {}", err);
            }
            self.last_alert = Some(alert);
        }
        if was_dirty {
            let lines = self.renderer.render(&view);
            if let Err(err) = self.writer.write_lines(&lines) {
                engine_warn!("Terminal write failed: {}", err);
            }
        }
    }

    /// Drain ticks, poll status while translating, then wait briefly for the
    /// next engine event.
    fn pump(&mut self) {
        while let Ok(msg) = self.ticks.try_recv() {
            self.dispatch(msg);
        }
        if self.state.stage() == Stage::Translating {
            if self.last_status_poll.elapsed() >= self.status_poll {
                self.last_status_poll = Instant::now();
                self.dispatch(Msg::StatusRequested);
            }
        } else {
            self.last_status_poll = Instant::now();
        }
        if let Some(msg) = self.runner.next_msg(EVENT_WAIT) {
            self.dispatch(msg);
        }
    }

    pub fn run_workflow(&mut self, mut workflow: Workflow) -> Result<()> {
        loop {
            match workflow.advance(&self.state) {
                Advance::Dispatch(msgs) => {
                    for msg in msgs {
                        self.dispatch(msg);
                    }
                    continue;
                }
                Advance::Finished => {
                    engine_info!("Workflow finished");
                    return Ok(());
                }
                Advance::Failed(message) => {
                    let message = match self.last_alert.take() {
                        Some(alert) if self.state.session().is_none() => alert,
                        _ => message,
                    };
                    bail!(message);
                }
                Advance::Pending => self.pump(),
            }
        }
    }

    /// Open the terminology panel and wait for it to load.
    pub fn show_terminology(&mut self) -> Result<()> {
        self.dispatch(Msg::TerminologyRequested);
        loop {
            match self.state.view().terminology {
                TerminologyView::Loading => self.pump(),
                TerminologyView::Failed { message } => bail!(message),
                TerminologyView::Loaded { .. } | TerminologyView::Closed => break,
            }
        }
        self.dispatch(Msg::TerminologyClosed);
        Ok(())
    }

    pub fn shutdown(self) {
        set_task_context(None);
        self.runner.shutdown();
    }
}

fn clock_now() -> String {
    Local::now().format("%H:%M:%S").to_string()
}
