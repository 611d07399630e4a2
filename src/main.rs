mod display;

use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::sync::mpsc::{self, TryRecvError};
use std::sync::Mutex;
use std::thread;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use robot_shooter::camera::pointer_to_ndc;
use robot_shooter::compute::{click, high_score, init_state, tick};
use robot_shooter::entities::{Game, Round, RoundStatus};
use robot_shooter::raster::{camera_for_terminal, render_scene};
use robot_shooter::{Config, GameError};

const MIN_WIDTH: u16 = 40;
const MIN_HEIGHT: u16 = 12;

/// Milliseconds since the program started. Every timestamp the game logic
/// sees comes from here.
struct Clock(Instant);

impl Clock {
    fn now_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

// ── Input ─────────────────────────────────────────────────────────────────────

enum Command {
    /// Start or restart a round.
    Go,
    Quit,
    Shoot { column: u16, row: u16 },
    Resize { width: u16, height: u16 },
}

fn command_for(event: Event) -> Option<Command> {
    match event {
        Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            modifiers,
            ..
        }) => match code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Command::Quit),
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Command::Quit)
            }
            KeyCode::Enter | KeyCode::Char(' ') => Some(Command::Go),
            _ => None,
        },
        Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column,
            row,
            ..
        }) => Some(Command::Shoot { column, row }),
        Event::Resize(width, height) => Some(Command::Resize { width, height }),
        _ => None,
    }
}

/// Block until the player starts (Enter, Space or a click) or quits.
fn wait_for_go(rx: &mpsc::Receiver<Event>) -> bool {
    loop {
        // Closed channel: the input thread is gone.
        let Ok(event) = rx.recv() else {
            tracing::warn!("input channel closed");
            return false;
        };
        match command_for(event) {
            Some(Command::Go) | Some(Command::Shoot { .. }) => return true,
            Some(Command::Quit) => return false,
            Some(Command::Resize { .. }) | None => {}
        }
    }
}

/// Everything queued since the last frame. `None` once the input thread
/// has gone away.
fn pending_commands(rx: &mpsc::Receiver<Event>) -> Option<Vec<Command>> {
    let mut commands = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => commands.extend(command_for(event)),
            Err(TryRecvError::Empty) => return Some(commands),
            Err(TryRecvError::Disconnected) => {
                tracing::warn!("input channel closed");
                return None;
            }
        }
    }
}

/// Resizes below the playable minimum keep the minimum layout.
fn playable_size(width: u16, height: u16) -> (u16, u16) {
    (width.max(MIN_WIDTH), height.max(MIN_HEIGHT))
}

fn terminal_size() -> Result<(u16, u16), GameError> {
    let (width, height) = terminal::size()?;
    if width < MIN_WIDTH || height < MIN_HEIGHT {
        return Err(GameError::TerminalTooSmall {
            width,
            height,
            min_width: MIN_WIDTH,
            min_height: MIN_HEIGHT,
        });
    }
    Ok((width, height))
}

// ── Round loop ────────────────────────────────────────────────────────────────

struct RoundOutcome {
    round: Round,
    width: u16,
    height: u16,
    quit: bool,
}

fn play_round<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &Config,
    rng: &mut StdRng,
    clock: &Clock,
) -> Result<RoundOutcome, GameError> {
    let (mut width, mut height) = terminal_size()?;
    let mut camera = camera_for_terminal(width, height);
    let mut state = init_state(config, clock.now_ms());
    let frame_budget = config.frame();

    loop {
        let frame_start = Instant::now();
        let now = clock.now_ms();

        // Losing input ends the round as a quit.
        let commands = pending_commands(rx).unwrap_or_else(|| vec![Command::Quit]);
        for command in commands {
            match command {
                Command::Quit => {
                    return Ok(RoundOutcome {
                        round: state.round,
                        width,
                        height,
                        quit: true,
                    });
                }
                Command::Shoot { column, row } => {
                    let ndc = pointer_to_ndc(column, row, width, height);
                    state = click(&state, &camera, ndc, now);
                }
                Command::Resize {
                    width: w,
                    height: h,
                } => {
                    (width, height) = playable_size(w, h);
                    camera = camera_for_terminal(width, height);
                    tracing::debug!(width, height, "terminal resized");
                }
                Command::Go => {}
            }
        }

        state = tick(&state, rng, now);

        let frame = render_scene(&state, &camera, width, height);
        display::render(out, &frame, &state, now)?;

        if state.status == RoundStatus::TimeUp {
            return Ok(RoundOutcome {
                round: state.round,
                width,
                height,
                quit: false,
            });
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_budget {
            thread::sleep(frame_budget - elapsed);
        }
    }
}

fn run<W: Write>(out: &mut W, rx: &mpsc::Receiver<Event>, config: &Config) -> Result<(), GameError> {
    let clock = Clock(Instant::now());
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = Game::default();

    display::draw_start(out)?;
    if !wait_for_go(rx) {
        return Ok(());
    }

    loop {
        let outcome = play_round(out, rx, config, &mut rng, &clock)?;
        game.rounds.push(outcome.round.clone());
        if outcome.quit {
            break;
        }

        let best = high_score(&game).unwrap_or_default();
        tracing::info!(rounds = game.rounds.len(), high_score = best, "round over");
        display::draw_time_up(out, outcome.width, outcome.height, &outcome.round, best)?;

        // Drop clicks that were still in flight when the clock ran out.
        while rx.try_recv().is_ok() {}
        if !wait_for_go(rx) {
            break;
        }
    }
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config<I, T>(args: I) -> Result<Config, GameError>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let config = Config::parse_from(args);
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let config = load_config(std::env::args_os())?;
    init_logging(&config)?;

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(EnableMouseCapture)?;

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the frame loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break; // receiver dropped → program exiting
            }
        }
    });

    let result = run(&mut out, &rx, &config);

    // Always restore the terminal
    let _ = out.execute(DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(err) = &result {
        tracing::error!("game aborted: {err}");
    }
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crossterm::event::KeyEventState;
    use robot_shooter::config::ConfigError;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn wait_for_go_gives_up_when_input_thread_is_gone() {
        let (tx, rx) = mpsc::channel::<Event>();
        drop(tx);

        // Run on a worker so a regression shows up as a timeout, not a hang.
        let (done_tx, done_rx) = mpsc::channel();
        thread::spawn(move || {
            let _ = done_tx.send(wait_for_go(&rx));
        });
        let result = done_rx.recv_timeout(std::time::Duration::from_secs(2));
        assert_eq!(result, Ok(false));
    }

    #[test]
    fn wait_for_go_skips_unbound_keys() {
        let (tx, rx) = mpsc::channel::<Event>();
        tx.send(press(KeyCode::Char('x'))).unwrap();
        tx.send(Event::Resize(100, 40)).unwrap();
        tx.send(press(KeyCode::Enter)).unwrap();
        assert!(wait_for_go(&rx));

        tx.send(press(KeyCode::Char('q'))).unwrap();
        assert!(!wait_for_go(&rx));
    }

    #[test]
    fn pending_commands_reports_closed_channel() {
        let (tx, rx) = mpsc::channel::<Event>();
        tx.send(press(KeyCode::Char('q'))).unwrap();
        let commands = pending_commands(&rx).expect("sender still alive");
        assert!(matches!(commands.as_slice(), [Command::Quit]));
        assert!(pending_commands(&rx).expect("sender still alive").is_empty());

        drop(tx);
        assert!(pending_commands(&rx).is_none());
    }

    #[test]
    fn invalid_flags_surface_as_game_errors() {
        let err = load_config(["robot_shooter", "--max-robots", "0"]).unwrap_err();
        assert!(matches!(err, GameError::Config(ConfigError::NoRobots)));
        assert_eq!(
            err.to_string(),
            format!("invalid configuration: {}", ConfigError::NoRobots)
        );

        let config = load_config(["robot_shooter", "--fps", "30"]).unwrap();
        assert_eq!(config.fps, 30);
    }

    #[test]
    fn resize_never_drops_below_minimum() {
        assert_eq!(playable_size(1, 1), (MIN_WIDTH, MIN_HEIGHT));
        assert_eq!(playable_size(10, 50), (MIN_WIDTH, 50));
        assert_eq!(playable_size(120, 40), (120, 40));
    }
}
