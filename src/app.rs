use anyhow::Result;
use ratatui::layout::Rect;

use crate::input::{Command, InputContext};
use crate::service::{GameService, HttpService, LocalService, ServiceReply, ServiceRequest};
use crate::session::{Outcome, Session, SessionConfig, SessionEnd};
use crate::stats::{FileStatsStore, StatsRecord, StatsStore};

/// Attempt sentinel for endless games; anything past the long-game threshold
/// renders lazily anyway.
pub const ENDLESS_ATTEMPTS: usize = 10_000;

/// Ticks between game over and the results handoff, so the final feedback is
/// perceivable before the screen changes (1s at the default tick rate).
pub const HANDOFF_TICKS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    Playing,
    Results,
    Stats,
}

/// Everything needed to start (or restart) a game, derived from the CLI.
#[derive(Clone, Debug)]
pub struct GameSetup {
    pub code_length: usize,
    pub max_attempts: usize,
    pub time_limit_secs: u64,
    pub allow_repeats: bool,
    pub server: Option<String>,
    pub mode_label: String,
}

impl GameSetup {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            code_length: self.code_length,
            max_attempts: self.max_attempts,
            time_limit_secs: self.time_limit_secs,
        }
    }

    /// One service instance is one game; a new game gets a fresh one.
    pub fn build_service(&self) -> Result<Box<dyn GameService>> {
        match &self.server {
            Some(base) => {
                let service = HttpService::new(base)?;
                service.start_game(
                    self.code_length,
                    self.allow_repeats,
                    self.max_attempts,
                    self.time_limit_secs,
                    &self.mode_label,
                )?;
                Ok(Box::new(service))
            }
            None => Ok(Box::new(LocalService::new(
                self.code_length,
                self.allow_repeats,
                self.max_attempts,
            ))),
        }
    }
}

#[derive(Debug)]
pub struct App {
    pub setup: GameSetup,
    pub session: Session,
    pub screen: Screen,
    pub stats: StatsRecord,
    pub share: Option<String>,
    pub should_quit: bool,
    pub wants_new_game: bool,
    /// Last drawn area; the mouse dispatcher hit-tests against it.
    pub last_area: Rect,
    stats_store: FileStatsStore,
    handoff_ticks: Option<u32>,
    stats_return: Screen,
}

impl App {
    pub fn new(setup: GameSetup) -> Self {
        Self::with_stats_store(setup, FileStatsStore::new())
    }

    pub fn with_stats_store(setup: GameSetup, stats_store: FileStatsStore) -> Self {
        let stats = stats_store.load();
        Self {
            session: Session::new(setup.session_config()),
            setup,
            screen: Screen::Playing,
            stats,
            share: None,
            should_quit: false,
            wants_new_game: false,
            last_area: Rect::default(),
            stats_store,
            handoff_ticks: None,
            stats_return: Screen::Playing,
        }
    }

    pub fn input_context(&self) -> InputContext {
        match self.screen {
            Screen::Playing => InputContext::Playing,
            Screen::Results => InputContext::Results,
            Screen::Stats => InputContext::Stats,
        }
    }

    /// Route a command to the session or handle it at the screen level.
    pub fn handle_command(&mut self, cmd: Command) -> Option<ServiceRequest> {
        match self.screen {
            Screen::Playing => match cmd {
                Command::Quit => {
                    if self.session.confirm_open() {
                        self.session.handle(Command::Cancel);
                    } else {
                        self.should_quit = true;
                    }
                    None
                }
                Command::ToggleStats => {
                    self.stats_return = Screen::Playing;
                    self.screen = Screen::Stats;
                    None
                }
                Command::NewGame => None,
                _ => self.session.handle(cmd),
            },
            Screen::Results => {
                match cmd {
                    Command::NewGame => self.wants_new_game = true,
                    Command::ToggleStats => {
                        self.stats_return = Screen::Results;
                        self.screen = Screen::Stats;
                    }
                    Command::Quit => self.should_quit = true,
                    _ => {}
                }
                None
            }
            Screen::Stats => {
                match cmd {
                    Command::ToggleStats | Command::Cancel => self.screen = self.stats_return,
                    Command::Quit => self.should_quit = true,
                    _ => {}
                }
                None
            }
        }
    }

    pub fn on_reply(&mut self, reply: ServiceReply) {
        if let Some(end) = self.session.apply(reply) {
            self.finish_session(end);
        }
    }

    pub fn on_tick(&mut self) -> Option<ServiceRequest> {
        let request = self.session.on_tick();

        if let Some(ticks) = &mut self.handoff_ticks {
            *ticks = ticks.saturating_sub(1);
            if *ticks == 0 {
                self.handoff_ticks = None;
                self.screen = Screen::Results;
            }
        }

        request
    }

    /// Rebuild the session for a fresh game; the caller respawns the worker.
    pub fn start_new_game(&mut self) {
        self.session = Session::new(self.setup.session_config());
        self.screen = Screen::Playing;
        self.share = None;
        self.handoff_ticks = None;
        self.wants_new_game = false;
        self.stats_return = Screen::Playing;
    }

    fn finish_session(&mut self, end: SessionEnd) {
        let won = end.outcome == Outcome::Won;
        match self.stats_store.record_outcome(won, end.attempt as u32) {
            Ok(record) => self.stats = record,
            // storage trouble shouldn't lose the session's result on screen
            Err(_) => self.stats.record_outcome(won, end.attempt as u32),
        }
        self.share = Some(self.session.board().share_grid());
        self.handoff_ticks = Some(HANDOFF_TICKS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{Feedback, GuessReply};
    use tempfile::tempdir;

    fn setup() -> GameSetup {
        GameSetup {
            code_length: 4,
            max_attempts: 10,
            time_limit_secs: 0,
            allow_repeats: false,
            server: None,
            mode_label: "standard".to_string(),
        }
    }

    fn app_with_temp_stats() -> (App, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = FileStatsStore::with_path(dir.path().join("stats.json"));
        (App::with_stats_store(setup(), store), dir)
    }

    fn win_reply() -> ServiceReply {
        ServiceReply::Guess(Ok(GuessReply::Scored {
            feedback: Feedback { exact: 4, partial: 0 },
            over: true,
            won: true,
            secret: Some("1234".to_string()),
        }))
    }

    #[test]
    fn winning_records_stats_and_schedules_the_results_handoff() {
        let (mut app, _dir) = app_with_temp_stats();
        for d in "1234".chars() {
            app.handle_command(Command::Digit(d));
        }
        assert!(app.handle_command(Command::Submit).is_some());
        app.on_reply(win_reply());

        assert_eq!(app.stats.played, 1);
        assert_eq!(app.stats.won, 1);
        assert_eq!(app.stats.distribution.get(&1), Some(&1));
        assert!(app.share.is_some());

        // still on the playing screen until the handoff delay elapses
        assert_eq!(app.screen, Screen::Playing);
        for _ in 0..HANDOFF_TICKS {
            app.on_tick();
        }
        assert_eq!(app.screen, Screen::Results);
    }

    #[test]
    fn new_game_resets_the_session() {
        let (mut app, _dir) = app_with_temp_stats();
        for d in "1234".chars() {
            app.handle_command(Command::Digit(d));
        }
        app.handle_command(Command::Submit);
        app.on_reply(win_reply());
        for _ in 0..HANDOFF_TICKS {
            app.on_tick();
        }

        app.handle_command(Command::NewGame);
        assert!(app.wants_new_game);
        app.start_new_game();
        assert_eq!(app.screen, Screen::Playing);
        assert!(!app.session.is_over());
        assert_eq!(app.session.current_row(), 0);
        assert_eq!(app.share, None);
    }

    #[test]
    fn stats_screen_returns_to_where_it_was_opened() {
        let (mut app, _dir) = app_with_temp_stats();
        app.handle_command(Command::ToggleStats);
        assert_eq!(app.screen, Screen::Stats);
        app.handle_command(Command::ToggleStats);
        assert_eq!(app.screen, Screen::Playing);
    }

    #[test]
    fn quit_with_an_open_confirm_only_cancels_it() {
        let (mut app, _dir) = app_with_temp_stats();
        app.handle_command(Command::GiveUp);
        assert!(app.session.confirm_open());

        app.handle_command(Command::Quit);
        assert!(!app.should_quit);
        assert!(!app.session.confirm_open());

        app.handle_command(Command::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn local_service_is_built_without_a_server() {
        let service = setup().build_service();
        assert!(service.is_ok());
    }
}
