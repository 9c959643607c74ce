use hpcbatch::engine::progress::{Progress, ProgressCallback};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressState, ProgressStyle};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};

const CHANNEL_CAPACITY: usize = 1024;
const SPINNER_TICK: Duration = Duration::from_millis(80);

#[derive(Debug)]
pub enum UiEvent {
    Progress(Progress),
    Log(String),
}

/// The phase currently shown on screen.
struct ActivePhase {
    bar: ProgressBar,
    name: String,
    started: Instant,
}

/// Owns the terminal while a command runs: one bar per phase, log lines printed above it.
pub struct UiManager {
    mp: MultiProgress,
    phase: Option<ActivePhase>,
    event_receiver: mpsc::Receiver<UiEvent>,
    shutdown_receiver: watch::Receiver<bool>,
    _sentinel_bar: ProgressBar,
}

impl UiManager {
    pub fn new() -> (Self, mpsc::Sender<UiEvent>, watch::Sender<bool>) {
        let (event_sender, event_receiver) = mpsc::channel(CHANNEL_CAPACITY);
        let (shutdown_sender, shutdown_receiver) = watch::channel(false);
        let mp = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        let _sentinel_bar = mp.add(ProgressBar::hidden());
        let manager = Self {
            mp,
            phase: None,
            event_receiver,
            shutdown_receiver,
            _sentinel_bar,
        };
        (manager, event_sender, shutdown_sender)
    }

    pub async fn run(mut self) {
        loop {
            tokio::select! {
                Some(event) = self.event_receiver.recv() => self.handle_event(event),
                changed = self.shutdown_receiver.changed() => {
                    if changed.is_err() || *self.shutdown_receiver.borrow() {
                        break;
                    }
                }
            }
        }
        // Flush whatever the command queued just before it returned.
        while let Ok(event) = self.event_receiver.try_recv() {
            self.handle_event(event);
        }
        if let Some(phase) = self.phase.take() {
            phase.bar.finish_and_clear();
        }
        self._sentinel_bar.finish_and_clear();
    }

    fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(line) => self.print(line),
            UiEvent::Progress(progress) => self.handle_progress(progress),
        }
    }

    fn handle_progress(&mut self, progress: Progress) {
        match progress {
            Progress::PhaseStart { name } => self.start_phase(name),
            Progress::PhaseFinish => self.finish_phase(),
            Progress::TaskStart { total } => {
                if let Some(bar) = self.bar() {
                    bar.disable_steady_tick();
                    bar.set_style(bar_style());
                    bar.set_length(total);
                    bar.set_position(0);
                }
            }
            Progress::TaskIncrement { amount } => {
                if let Some(bar) = self.bar() {
                    bar.inc(amount);
                }
            }
            Progress::TaskFinish => {
                if let Some(bar) = self.bar() {
                    bar.finish();
                }
            }
            Progress::StatusUpdate { text } => {
                if let Some(phase) = &self.phase {
                    phase.bar.set_message(format!("{} ({})", phase.name, text));
                }
            }
            Progress::Message(text) => self.print(format!("  {}", text)),
        }
    }

    fn start_phase(&mut self, name: String) {
        if let Some(previous) = self.phase.take() {
            previous.bar.finish_and_clear();
        }
        let bar = self.mp.add(ProgressBar::new_spinner());
        bar.set_style(spinner_style());
        bar.set_message(name.clone());
        bar.enable_steady_tick(SPINNER_TICK);
        self.phase = Some(ActivePhase {
            bar,
            name,
            started: Instant::now(),
        });
    }

    fn finish_phase(&mut self) {
        let Some(phase) = self.phase.take() else {
            return;
        };
        phase.bar.finish_and_clear();
        self.print(format!(
            "✓ {} ({:.1}s)",
            phase.name,
            phase.started.elapsed().as_secs_f64()
        ));
    }

    fn bar(&self) -> Option<&ProgressBar> {
        self.phase.as_ref().map(|p| &p.bar)
    }

    fn print(&self, line: String) {
        // A hidden or closed terminal is not an error for a batch job.
        let _ = self.mp.println(line);
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{msg:<40} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key("eta", |state: &ProgressState, w: &mut dyn std::fmt::Write| {
            let _ = write!(w, "{:.0}s", state.eta().as_secs_f64());
        })
        .progress_chars("━╸ ")
}

/// Bridges core progress callbacks onto the UI channel.
#[derive(Clone)]
pub struct CliProgressHandler {
    sender: mpsc::Sender<UiEvent>,
}

impl CliProgressHandler {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    pub fn get_callback(&self) -> ProgressCallback<'static> {
        let sender = self.sender.clone();
        Box::new(move |progress: Progress| {
            // Dropping an update under backpressure only costs a redraw.
            let _ = sender.try_send(UiEvent::Progress(progress));
        })
    }
}
