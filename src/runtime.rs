use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CtEvent, KeyEvent};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum SessionEvent {
    Key(KeyEvent),
    Resize,
    /// Carries the wall time since the previous step.
    Tick(Duration),
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<SessionEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => SessionEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => SessionEvent::Resize,
                Ok(_) => continue,
                Err(e) => {
                    log::error!("terminal event reader stopped: {e}");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// How often the runner produces a tick when no other event arrives.
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Event source fed from a channel, for tests and scripted runs
pub struct TestEventSource {
    rx: Receiver<SessionEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<SessionEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<SessionEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Where tick durations come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickClock {
    /// Measure real time between ticks.
    Wall,
    /// Every tick reports exactly the ticker interval. Keeps scripted runs
    /// deterministic.
    Fixed,
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
    clock: TickClock,
    last_tick: Instant,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self::with_clock(event_source, ticker, TickClock::Wall)
    }

    pub fn with_clock(event_source: E, ticker: T, clock: TickClock) -> Self {
        Self {
            event_source,
            ticker,
            clock,
            last_tick: Instant::now(),
        }
    }

    /// Blocks up to one tick interval. Returns the next event, or a tick
    /// once the interval has passed without one.
    pub fn step(&mut self) -> SessionEvent {
        let interval = self.ticker.interval();
        let waited = self.last_tick.elapsed();

        if waited < interval {
            match self.event_source.recv_timeout(interval - waited) {
                Ok(ev) => return ev,
                Err(RecvTimeoutError::Timeout) => {}
                // no more input, keep ticking at the same pace
                Err(RecvTimeoutError::Disconnected) => std::thread::sleep(interval - waited),
            }
        }

        let now = Instant::now();
        let elapsed = match self.clock {
            TickClock::Wall => now.duration_since(self.last_tick),
            TickClock::Fixed => interval,
        };
        self.last_tick = now;
        SessionEvent::Tick(elapsed)
    }
}
