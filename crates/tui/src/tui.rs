//! Terminal setup and the terminal event stream.
//!
//! `Tui` wraps ratatui's Terminal: it enters raw mode and the alternate
//! screen, restores both on drop or panic, and merges key presses, pastes and
//! coalesced redraw requests into one stream.

use anyhow::Result;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, Event, KeyEvent};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{stdout, Stdout};
use std::pin::Pin;
use std::time::{Duration, Instant};
use tokio::select;
use tokio::sync::{broadcast, mpsc};
use tokio_stream::{Stream, StreamExt};

pub type TerminalBackend = CrosstermBackend<Stdout>;

/// Input for the application loop.
#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyEvent),
    /// Text pasted with bracketed paste.
    Paste(String),
    /// Time to redraw.
    Draw,
}

pub struct Tui {
    terminal: Terminal<TerminalBackend>,
    frame_schedule_tx: mpsc::UnboundedSender<Instant>,
    draw_tx: broadcast::Sender<()>,
}

impl Tui {
    /// Switch the terminal to raw mode on the alternate screen.
    pub fn init() -> Result<Self> {
        enable_raw_mode()?;
        execute!(stdout(), EnableBracketedPaste, EnterAlternateScreen)?;
        set_panic_hook();

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

        let (frame_schedule_tx, frame_schedule_rx) = mpsc::unbounded_channel();
        let (draw_tx, _) = broadcast::channel(1);
        tokio::spawn(coalesce_frames(frame_schedule_rx, draw_tx.clone()));

        Ok(Self {
            terminal,
            frame_schedule_tx,
            draw_tx,
        })
    }

    pub fn restore(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    pub fn frame_requester(&self) -> FrameRequester {
        FrameRequester {
            frame_schedule_tx: self.frame_schedule_tx.clone(),
        }
    }

    /// Key presses, pastes and redraws. Resizes become redraws.
    pub fn event_stream(&self) -> Pin<Box<dyn Stream<Item = TuiEvent> + Send + 'static>> {
        let mut crossterm_events = crossterm::event::EventStream::new();
        let mut draw_rx = self.draw_tx.subscribe();

        Box::pin(async_stream::stream! {
            loop {
                select! {
                    Some(Ok(event)) = crossterm_events.next() => match event {
                        Event::Key(key_event) => yield TuiEvent::Key(key_event),
                        Event::Paste(text) => yield TuiEvent::Paste(text),
                        Event::Resize(_, _) => yield TuiEvent::Draw,
                        _ => {}
                    },
                    result = draw_rx.recv() => match result {
                        // A lagged receiver still owes exactly one redraw.
                        Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => yield TuiEvent::Draw,
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        })
    }

    pub fn draw<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame),
    {
        self.terminal.draw(f)?;
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Turn a burst of frame requests into a single draw at the earliest
/// requested instant.
async fn coalesce_frames(mut rx: mpsc::UnboundedReceiver<Instant>, draw_tx: broadcast::Sender<()>) {
    let mut deadline: Option<Instant> = None;
    loop {
        let target = deadline.unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
        select! {
            biased;
            requested = rx.recv() => match requested {
                Some(at) => deadline = Some(deadline.map_or(at, |d| d.min(at))),
                None => break,
            },
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(target)) => {
                if deadline.take().is_some() {
                    let _ = draw_tx.send(());
                }
            }
        }
    }
}

/// Handle for scheduling redraws.
#[derive(Clone, Debug)]
pub struct FrameRequester {
    frame_schedule_tx: mpsc::UnboundedSender<Instant>,
}

impl FrameRequester {
    pub fn schedule_frame(&self) {
        let _ = self.frame_schedule_tx.send(Instant::now());
    }
}

fn set_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), DisableBracketedPaste, LeaveAlternateScreen);
        original_hook(panic_info);
    }));
}
