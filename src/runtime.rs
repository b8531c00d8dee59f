use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, MouseEvent};

use crate::service::{GameService, ServiceReply, ServiceRequest};

/// Unified event type consumed by the app runner. Resolved remote calls come
/// back through the same channel so the session stays single-writer.
#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize,
    Tick,
    Reply(ServiceReply),
}

/// Source of loop events (keyboard, mouse, service replies, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    /// Returns Ok(event) if an event arrives before the timeout, or Err(Timeout) if it expires.
    fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError>;
}

/// Receiving end of the shared event channel; used in production and tests.
pub struct ChannelEventSource {
    rx: Receiver<Event>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<Event>) -> Self {
        Self { rx }
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<Event, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Forward crossterm terminal events onto the shared channel.
pub fn spawn_terminal_reader(tx: Sender<Event>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(CtEvent::Key(key)) => {
                if tx.send(Event::Key(key)).is_err() {
                    break;
                }
            }
            Ok(CtEvent::Mouse(mouse)) => {
                if tx.send(Event::Mouse(mouse)).is_err() {
                    break;
                }
            }
            Ok(CtEvent::Resize(_, _)) => {
                if tx.send(Event::Resize).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });
}

/// Handle for dispatching remote calls to the service worker. Dropping it
/// shuts the worker down, which is how a finished game's worker is retired.
pub struct ServiceHandle {
    tx: Sender<ServiceRequest>,
}

impl ServiceHandle {
    pub fn dispatch(&self, request: ServiceRequest) {
        // a dropped worker means the loop is shutting down; nothing to do
        let _ = self.tx.send(request);
    }
}

/// Own the game service on a worker thread; every resolved call is posted
/// back onto the event channel. At most one request is in flight per kind
/// because the session's lock never issues duplicates.
pub fn spawn_service(mut service: Box<dyn GameService>, events: Sender<Event>) -> ServiceHandle {
    let (tx, rx) = mpsc::channel::<ServiceRequest>();

    std::thread::spawn(move || {
        while let Ok(request) = rx.recv() {
            let reply = match request {
                ServiceRequest::Guess(guess) => ServiceReply::Guess(service.submit_guess(&guess)),
                ServiceRequest::Hint => ServiceReply::Hint(service.request_hint()),
                ServiceRequest::Surrender => ServiceReply::Surrender(service.surrender()),
            };
            if events.send(Event::Reply(reply)).is_err() {
                break;
            }
        }
    });

    ServiceHandle { tx }
}

/// Configurable ticker interface
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

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> Event {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => Event::Tick,
        }
    }
}
