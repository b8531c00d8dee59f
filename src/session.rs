use crate::board::Board;
use crate::input::Command;
use crate::service::{GuessReply, HintReply, ServiceReply, ServiceRequest, SurrenderReply};
use crate::timer::Countdown;
use crate::TICK_RATE_MS;

/// How long transient notices stay on screen, in runtime ticks.
const SHAKE_TICKS: u32 = 3;
const NOTICE_TICKS: u32 = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionConfig {
    pub code_length: usize,
    pub max_attempts: usize,
    pub time_limit_secs: u64,
}

/// The three states a session can be in. Commands are only accepted while
/// `Editing`; `Submitting` holds the re-entrancy lock for the in-flight guess.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Submitting,
    Over,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Outcome {
    Won,
    Lost,
}

/// Pending modal confirmation; any command other than `Confirm` dismisses it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirm {
    GiveUp,
    Hint,
}

impl Confirm {
    pub fn prompt(&self) -> &'static str {
        match self {
            Confirm::GiveUp => "Surrender and reveal the code? (y/n)",
            Confirm::Hint => "Use a hint? Max 2 per game (y/n)",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Incomplete-guess cue; visible but non-blocking.
    Shake,
    Info,
    /// Service-side rejection carrying the server's message.
    Rejection,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    ticks_left: u32,
}

impl Notice {
    fn new(text: impl Into<String>, kind: NoticeKind, ticks_left: u32) -> Self {
        Self {
            text: text.into(),
            kind,
            ticks_left,
        }
    }
}

/// Reported exactly once when the session reaches `Over`.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionEnd {
    pub outcome: Outcome,
    pub secret: String,
    /// 1-based attempt count, used for the stats distribution.
    pub attempt: usize,
}

/// The session state machine. Owns every mutable piece of game state and is
/// the only writer. It never performs remote calls itself: commands may yield
/// a [`ServiceRequest`] for the caller to dispatch, and resolved calls come
/// back through [`Session::apply`].
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    board: Board,
    timer: Countdown,
    phase: Phase,
    current_row: usize,
    guess: String,
    confirm: Option<Confirm>,
    notice: Option<Notice>,
    outcome: Option<Outcome>,
    secret: Option<String>,
    surrender_pending: bool,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            board: Board::new(config.code_length, config.max_attempts),
            timer: Countdown::new(config.time_limit_secs),
            config,
            phase: Phase::Editing,
            current_row: 0,
            guess: String::new(),
            confirm: None,
            notice: None,
            outcome: None,
            secret: None,
            surrender_pending: false,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    pub fn current_row(&self) -> usize {
        self.current_row
    }

    /// Number of digits entered in the current row.
    pub fn current_tile(&self) -> usize {
        self.guess.chars().count()
    }

    pub fn guess(&self) -> &str {
        &self.guess
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn confirm(&self) -> Option<Confirm> {
        self.confirm
    }

    pub fn confirm_open(&self) -> bool {
        self.confirm.is_some()
    }

    /// Handle a player command. Returns a request for the caller to dispatch
    /// when the command needs the game service.
    ///
    /// While a submission is in flight every command is dropped, not queued;
    /// the cross-out memory aid is the one exception since it never touches
    /// game state.
    pub fn handle(&mut self, cmd: Command) -> Option<ServiceRequest> {
        if let Command::ToggleCross(d) = cmd {
            self.board.toggle_crossed(d);
            return None;
        }

        if self.phase != Phase::Editing {
            return None;
        }

        if let Some(confirm) = self.confirm {
            match cmd {
                Command::Confirm => {
                    self.confirm = None;
                    match confirm {
                        Confirm::GiveUp => {
                            self.surrender_pending = true;
                            return Some(ServiceRequest::Surrender);
                        }
                        Confirm::Hint => return Some(ServiceRequest::Hint),
                    }
                }
                _ => {
                    self.confirm = None;
                    return None;
                }
            }
        }

        match cmd {
            Command::Digit(d) => {
                if self.current_tile() < self.config.code_length {
                    self.board.set_tile(self.current_row, self.current_tile(), d);
                    self.guess.push(d);
                }
                None
            }
            Command::Delete => {
                if self.guess.pop().is_some() {
                    self.board.clear_tile(self.current_row, self.current_tile());
                }
                None
            }
            Command::Submit => {
                if self.current_tile() != self.config.code_length {
                    self.notice = Some(Notice::new(
                        "Not enough digits!",
                        NoticeKind::Shake,
                        SHAKE_TICKS,
                    ));
                    return None;
                }
                self.phase = Phase::Submitting;
                Some(ServiceRequest::Guess(self.guess.clone()))
            }
            Command::GiveUp => {
                if !self.surrender_pending {
                    self.confirm = Some(Confirm::GiveUp);
                }
                None
            }
            Command::Hint => {
                self.confirm = Some(Confirm::Hint);
                None
            }
            Command::Confirm | Command::Cancel => None,
            // screen-level commands are not ours
            _ => None,
        }
    }

    /// Consume a resolved remote call. Returns the end-of-session report on
    /// the transition into `Over`, exactly once.
    pub fn apply(&mut self, reply: ServiceReply) -> Option<SessionEnd> {
        match reply {
            ServiceReply::Guess(result) => {
                // only the pending submission's own resolution may land
                if self.phase != Phase::Submitting {
                    return None;
                }
                match result {
                    Ok(GuessReply::Rejected { message }) => {
                        self.phase = Phase::Editing;
                        self.notice = Some(Notice::new(message, NoticeKind::Rejection, NOTICE_TICKS));
                        None
                    }
                    Ok(GuessReply::Scored {
                        feedback,
                        over,
                        won,
                        secret,
                    }) => {
                        self.board.apply_feedback(self.current_row, feedback);
                        if over {
                            let outcome = if won { Outcome::Won } else { Outcome::Lost };
                            Some(self.finish(outcome, secret))
                        } else {
                            self.current_row += 1;
                            self.guess.clear();
                            self.phase = Phase::Editing;
                            if self.board.should_grow(self.current_row) {
                                self.board.grow();
                            }
                            None
                        }
                    }
                    // transport failure: the guess is considered not submitted
                    Err(_) => {
                        self.phase = Phase::Editing;
                        None
                    }
                }
            }
            ServiceReply::Hint(result) => {
                if self.is_over() {
                    return None;
                }
                match result {
                    Ok(HintReply::Revealed { position, digit }) => {
                        self.notice = Some(Notice::new(
                            format!("HINT: Position {} is {}", position + 1, digit),
                            NoticeKind::Info,
                            NOTICE_TICKS,
                        ));
                    }
                    Ok(HintReply::Refused { message }) => {
                        self.notice = Some(Notice::new(message, NoticeKind::Info, NOTICE_TICKS));
                    }
                    Err(_) => {}
                }
                None
            }
            ServiceReply::Surrender(result) => {
                if self.is_over() {
                    return None;
                }
                match result {
                    Ok(SurrenderReply { secret }) => Some(self.finish(Outcome::Lost, Some(secret))),
                    Err(_) => {
                        self.surrender_pending = false;
                        None
                    }
                }
            }
        }
    }

    /// Advance the clock and decay transient notices. Returns a surrender
    /// request when the countdown expires.
    pub fn on_tick(&mut self) -> Option<ServiceRequest> {
        if let Some(notice) = &mut self.notice {
            notice.ticks_left = notice.ticks_left.saturating_sub(1);
            if notice.ticks_left == 0 {
                self.notice = None;
            }
        }

        if self.is_over() {
            return None;
        }

        if self.timer.tick(TICK_RATE_MS) && !self.surrender_pending {
            self.surrender_pending = true;
            self.confirm = None;
            self.notice = Some(Notice::new("TIME IS UP!", NoticeKind::Rejection, NOTICE_TICKS));
            return Some(ServiceRequest::Surrender);
        }
        None
    }

    fn finish(&mut self, outcome: Outcome, secret: Option<String>) -> SessionEnd {
        self.phase = Phase::Over;
        self.timer.stop();
        self.confirm = None;
        let secret = secret.unwrap_or_else(|| "?".repeat(self.config.code_length));
        self.outcome = Some(outcome);
        self.secret = Some(secret.clone());
        SessionEnd {
            outcome,
            secret,
            attempt: self.current_row + 1,
        }
    }
}
