use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use codebreaker::{
    app::{App, GameSetup, ENDLESS_ATTEMPTS},
    input::{map_key, map_mouse},
    runtime::{spawn_service, spawn_terminal_reader, ChannelEventSource, Event, FixedTicker, Runner},
    ui::keypad_layout,
    TICK_RATE_MS,
};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    io::{self, stdin},
    sync::mpsc,
    time::Duration,
};

/// crack the secret number code before your attempts run out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A code-breaking TUI. Guess the secret code digit by digit; green pegs mark digits in the right spot, yellow pegs digits in the wrong spot. Play offline or against a remote game server."
)]
pub struct Cli {
    /// difficulty preset controlling code length and attempt limit
    #[clap(short, long, value_enum, default_value_t = Mode::Standard)]
    mode: Mode,

    /// override the code length
    #[clap(short = 'l', long)]
    length: Option<usize>,

    /// override the attempt limit
    #[clap(short = 'a', long)]
    attempts: Option<usize>,

    /// countdown in seconds; the game is lost when it expires
    #[clap(short = 't', long)]
    timer: Option<u64>,

    /// no attempt limit
    #[clap(long, conflicts_with = "attempts")]
    endless: bool,

    /// allow repeated digits regardless of mode
    #[clap(long)]
    repeats: bool,

    /// base URL of a remote game server to play against
    #[clap(short = 's', long)]
    server: Option<String>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Rookie,
    Standard,
    Expert,
    Master,
    Insane,
}

impl Mode {
    /// (code length, attempt limit, repeated digits allowed)
    fn preset(&self) -> (usize, usize, bool) {
        match self {
            Mode::Rookie => (3, 10, false),
            Mode::Standard => (4, 10, false),
            Mode::Expert => (5, 12, false),
            Mode::Master => (4, 12, true),
            Mode::Insane => (6, 15, true),
        }
    }
}

impl Cli {
    fn to_setup(&self) -> Result<GameSetup, String> {
        let (preset_length, preset_attempts, preset_repeats) = self.mode.preset();
        let code_length = self.length.unwrap_or(preset_length);
        let allow_repeats = self.repeats || preset_repeats;
        let max_attempts = if self.endless {
            ENDLESS_ATTEMPTS
        } else {
            self.attempts.unwrap_or(preset_attempts)
        };

        if code_length == 0 {
            return Err("the code needs at least one digit".to_string());
        }
        if code_length > 10 && !allow_repeats {
            return Err(format!(
                "a {code_length}-digit code is impossible without repeated digits; pass --repeats"
            ));
        }
        if max_attempts == 0 {
            return Err("at least one attempt is required".to_string());
        }

        Ok(GameSetup {
            code_length,
            max_attempts,
            time_limit_secs: self.timer.unwrap_or(0),
            allow_repeats,
            server: self.server.clone(),
            mode_label: self.mode.to_string(),
        })
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let setup = match cli.to_setup() {
        Ok(setup) => setup,
        Err(msg) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::InvalidValue, msg).exit();
        }
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(setup);
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel::<Event>();
    spawn_terminal_reader(tx.clone());

    let mut service = spawn_service(app.setup.build_service()?, tx.clone());

    let runner = Runner::new(
        ChannelEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        draw(terminal, app)?;

        match runner.step() {
            Event::Tick => {
                if let Some(request) = app.on_tick() {
                    service.dispatch(request);
                }
            }
            Event::Key(key) => {
                if let Some(cmd) = map_key(key, app.input_context()) {
                    if let Some(request) = app.handle_command(cmd) {
                        service.dispatch(request);
                    }
                }
            }
            Event::Mouse(mouse) => {
                let keypad = keypad_layout(app.last_area);
                if let Some(cmd) = map_mouse(&mouse, &keypad) {
                    if let Some(request) = app.handle_command(cmd) {
                        service.dispatch(request);
                    }
                }
            }
            Event::Resize => {}
            Event::Reply(reply) => app.on_reply(reply),
        }

        if app.should_quit {
            break;
        }
        if app.wants_new_game {
            // dropping the old handle retires the finished game's worker
            service = spawn_service(app.setup.build_service()?, tx.clone());
            app.start_new_game();
        }
    }

    Ok(())
}

fn draw<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    terminal.draw(|f| {
        app.last_area = f.area();
        f.render_widget(&*app, f.area());
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_standard_mode() {
        let cli = Cli::parse_from(["codebreaker"]);
        let setup = cli.to_setup().unwrap();
        assert_eq!(setup.code_length, 4);
        assert_eq!(setup.max_attempts, 10);
        assert_eq!(setup.time_limit_secs, 0);
        assert!(!setup.allow_repeats);
        assert_eq!(setup.server, None);
        assert_eq!(setup.mode_label, "standard");
    }

    #[test]
    fn mode_presets_set_length_attempts_and_repeats() {
        let cases = [
            ("rookie", 3, 10, false),
            ("standard", 4, 10, false),
            ("expert", 5, 12, false),
            ("master", 4, 12, true),
            ("insane", 6, 15, true),
        ];
        for (mode, length, attempts, repeats) in cases {
            let cli = Cli::parse_from(["codebreaker", "-m", mode]);
            let setup = cli.to_setup().unwrap();
            assert_eq!(setup.code_length, length, "{mode}");
            assert_eq!(setup.max_attempts, attempts, "{mode}");
            assert_eq!(setup.allow_repeats, repeats, "{mode}");
        }
    }

    #[test]
    fn overrides_beat_the_preset() {
        let cli = Cli::parse_from(["codebreaker", "-l", "6", "-a", "20", "-t", "300", "--repeats"]);
        let setup = cli.to_setup().unwrap();
        assert_eq!(setup.code_length, 6);
        assert_eq!(setup.max_attempts, 20);
        assert_eq!(setup.time_limit_secs, 300);
        assert!(setup.allow_repeats);
    }

    #[test]
    fn endless_lifts_the_attempt_limit() {
        let cli = Cli::parse_from(["codebreaker", "--endless"]);
        let setup = cli.to_setup().unwrap();
        assert_eq!(setup.max_attempts, ENDLESS_ATTEMPTS);
    }

    #[test]
    fn endless_conflicts_with_attempts() {
        assert!(Cli::try_parse_from(["codebreaker", "--endless", "-a", "5"]).is_err());
    }

    #[test]
    fn long_codes_require_repeats() {
        let cli = Cli::parse_from(["codebreaker", "-l", "11"]);
        assert!(cli.to_setup().is_err());

        let cli = Cli::parse_from(["codebreaker", "-l", "11", "--repeats"]);
        assert!(cli.to_setup().is_ok());
    }

    #[test]
    fn zero_length_and_zero_attempts_are_rejected() {
        assert!(Cli::parse_from(["codebreaker", "-l", "0"]).to_setup().is_err());
        assert!(Cli::parse_from(["codebreaker", "-a", "0"]).to_setup().is_err());
    }

    #[test]
    fn server_flag_is_carried_into_the_setup() {
        let cli = Cli::parse_from(["codebreaker", "-s", "http://localhost:5000"]);
        let setup = cli.to_setup().unwrap();
        assert_eq!(setup.server.as_deref(), Some("http://localhost:5000"));
    }
}
