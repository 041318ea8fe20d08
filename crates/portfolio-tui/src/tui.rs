use std::io::{self, Stderr};
use std::thread::{self, ThreadId};
use std::time::Duration;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind, MouseEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

pub const TICK_INTERVAL: Duration = Duration::from_millis(300);
pub const ROLE_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    /// Animation frame; also the cue to collect a finished assistant reply.
    Tick,
    /// Advance the hero's role line.
    RotateRole,
}

/// Sends `event` into the loop every `period` until dropped.
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn spawn(period: Duration, tx: mpsc::UnboundedSender<AppEvent>, event: AppEvent) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + period, period);
            loop {
                interval.tick().await;
                if tx.send(event.clone()).is_err() {
                    break;
                }
            }
        });
        Self { handle }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    reader: JoinHandle<()>,
    _tick: Ticker,
    _rotate: Ticker,
}

impl EventHandler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        // Spawn event reader task
        let tx_events = tx.clone();
        let reader = tokio::spawn(async move {
            let mut reader = event::EventStream::new();
            while let Some(evt) = reader.next().await {
                let app_event = match evt {
                    // Only handle key press events, not release
                    Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
                    Ok(Event::Mouse(mouse)) => Some(AppEvent::Mouse(mouse)),
                    Ok(Event::Resize(w, h)) => Some(AppEvent::Resize(w, h)),
                    Ok(_) => None,
                    Err(e) => {
                        tracing::warn!(error = %e, "Terminal event stream error");
                        None
                    }
                };

                if let Some(event) = app_event {
                    if tx_events.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        let _tick = Ticker::spawn(TICK_INTERVAL, tx.clone(), AppEvent::Tick);
        let _rotate = Ticker::spawn(ROLE_INTERVAL, tx, AppEvent::RotateRole);

        Self { rx, reader, _tick, _rotate }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(io::stderr());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Remembers which thread drives the terminal.
#[derive(Debug, Clone, Copy)]
struct TerminalOwner(ThreadId);

impl TerminalOwner {
    fn current() -> Self {
        Self(thread::current().id())
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.0
    }
}

/// Install panic hook to restore terminal on panic.
///
/// Must be called from the thread that runs the draw loop. A panic on any
/// other thread (a spawned assistant request, say) is recovered by its task,
/// so it is only logged and the screen is left alone.
pub fn install_panic_hook() {
    let owner = TerminalOwner::current();
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        if owner.is_current() {
            let _ = restore();
            original_hook(panic_info);
        } else {
            tracing::error!(panic = %panic_info, "Background task panicked");
        }
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_owner_is_the_installing_thread() {
        let owner = TerminalOwner::current();
        assert!(owner.is_current());

        let on_worker = thread::spawn(move || owner.is_current()).join().unwrap();
        assert!(!on_worker);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_task_runs_off_the_terminal_thread() {
        let owner = TerminalOwner::current();
        let in_task = tokio::spawn(async move { owner.is_current() }).await.unwrap();
        assert!(!in_task);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticker_waits_one_period_before_first_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();
        let _ticker = Ticker::spawn(ROLE_INTERVAL, tx, AppEvent::RotateRole);

        assert!(matches!(rx.recv().await, Some(AppEvent::RotateRole)));
        assert!(start.elapsed() >= ROLE_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_ticker_stops_events() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ticker = Ticker::spawn(TICK_INTERVAL, tx, AppEvent::Tick);

        assert!(matches!(rx.recv().await, Some(AppEvent::Tick)));
        drop(ticker);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tickers_run_independently() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _tick = Ticker::spawn(TICK_INTERVAL, tx.clone(), AppEvent::Tick);
        let _rotate = Ticker::spawn(ROLE_INTERVAL, tx, AppEvent::RotateRole);

        let mut ticks = 0;
        loop {
            match rx.recv().await {
                Some(AppEvent::Tick) => ticks += 1,
                Some(AppEvent::RotateRole) => break,
                other => panic!("unexpected event: {other:?}"),
            }
        }
        // 3s / 300ms, the tenth tick and the rotation share a deadline
        assert!((9..=10).contains(&ticks), "ticks: {ticks}");
    }
}
