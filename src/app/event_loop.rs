use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::DefaultTerminal;

use crate::app::{App, Message, Model, update};

const RESIZE_DEBOUNCE_MS: u64 = 100;
const RESIZE_POLL_MS: u64 = 10;
const REQUEST_POLL_MS: u64 = 50;
const IDLE_POLL_MS: u64 = 250;

pub(super) struct ResizeDebouncer {
    delay_ms: u64,
    pending: Option<(u16, u16, u64)>,
}

impl ResizeDebouncer {
    pub(super) const fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
        }
    }

    pub(super) const fn queue(&mut self, width: u16, height: u16, now_ms: u64) {
        self.pending = Some((width, height, now_ms));
    }

    pub(super) fn take_ready(&mut self, now_ms: u64) -> Option<(u16, u16)> {
        let (width, height, queued_at) = self.pending?;
        if now_ms.saturating_sub(queued_at) >= self.delay_ms {
            self.pending = None;
            Some((width, height))
        } else {
            None
        }
    }

    pub(super) const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// How long to wait for input before the next loop iteration.
pub(super) const fn poll_interval(
    needs_render: bool,
    resize_pending: bool,
    request_active: bool,
) -> Duration {
    let ms = if needs_render {
        0
    } else if resize_pending {
        RESIZE_POLL_MS
    } else if request_active {
        REQUEST_POLL_MS
    } else {
        IDLE_POLL_MS
    };
    Duration::from_millis(ms)
}

impl App {
    /// Run the main event loop.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal initialization or the event loop
    /// encounters an I/O failure.
    pub fn run(&mut self) -> Result<()> {
        let mut terminal = ratatui::try_init()
            .context("Failed to initialize terminal - lectern requires an interactive terminal")?;
        let size = terminal.size().context("Failed to read terminal size")?;

        let mut model = Model::new(self.book.clone(), (size.width, size.height))
            .with_request_timeout(self.request_timeout);
        tracing::info!(
            width = size.width,
            height = size.height,
            chapters = self.book.len(),
            "starting reader"
        );

        let result = self.event_loop(&mut terminal, &mut model);

        model.cancel_request();
        ratatui::restore();
        result
    }

    fn apply(&self, model: &mut Model, msg: Message) {
        *model = update(std::mem::take(model), msg);
        self.handle_message_side_effects(model);
    }

    fn event_loop(&self, terminal: &mut DefaultTerminal, model: &mut Model) -> Result<()> {
        let start = Instant::now();
        let mut resize_debouncer = ResizeDebouncer::new(RESIZE_DEBOUNCE_MS);
        let mut needs_render = true;

        loop {
            if model.expire_toast(Instant::now()) {
                needs_render = true;
            }

            if model.pending.is_some() {
                let seen = model.seen_revision();
                self.apply(model, Message::Tick);
                if model.pending.is_none() || model.seen_revision() != seen {
                    needs_render = true;
                }
            }

            let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
            if let Some((width, height)) = resize_debouncer.take_ready(now_ms) {
                self.apply(model, Message::Resize(width, height));
                needs_render = true;
            }

            let poll = poll_interval(
                needs_render,
                resize_debouncer.is_pending(),
                model.pending.is_some(),
            );
            if event::poll(poll)? {
                // Refresh timestamp after poll wait so the debouncer uses accurate times.
                let event_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if let Some(msg) =
                    Self::handle_event(&event::read()?, model, event_ms, &mut resize_debouncer)
                {
                    tracing::trace!(?msg, "message");
                    self.apply(model, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single render.
                while event::poll(Duration::ZERO)? {
                    let drain_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                    if let Some(msg) =
                        Self::handle_event(&event::read()?, model, drain_ms, &mut resize_debouncer)
                    {
                        self.apply(model, msg);
                        needs_render = true;
                    }
                }
            }

            if needs_render {
                terminal.draw(|frame| crate::ui::render(model, frame))?;
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
        }
        Ok(())
    }
}
