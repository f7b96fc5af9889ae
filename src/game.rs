//! The game module ties the engine to the terminal.
//!
//! It contains the `init()` function that parses the command line and runs the game loop, and the
//! key handling that turns key presses into engine calls.

use std::mem;
use std::num::NonZeroU32;
use std::ops::ControlFlow;
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use console::{Key, Term};
use log::{debug, info};

use crate::engine::{ClickOutcome, GameEngine};
use crate::frame::{render, Focus, Panel};
use crate::input::{parse_count, require_terminal, spawn_key_reader, take_count};

/// The longest the game loop waits for a key before advancing the clock and redrawing.
const FRAME: Duration = Duration::from_millis(50);

/// This struct holds information about the application when it comes to the command-line argument
/// parser. Every option can also be set through the environment.
#[derive(Parser)]
#[command(name = "findnum", version, about)]
#[command(next_line_help = true)]
struct Cli {
    /// The number of points to play with.
    ///
    /// The value is prefilled in the points field and can still be changed in game. Non-digit
    /// characters are ignored. When it is not given, the game asks for it before starting.
    #[arg(short, long, value_parser = verify_points)]
    #[arg(env = "FINDNUM_POINTS", value_name = "COUNT")]
    points: Option<NonZeroU32>,
    /// The seed for the target layouts.
    ///
    /// Two games started with the same seed and the same point counts place their targets in the
    /// same spots.
    #[arg(long)]
    #[arg(env = "FINDNUM_SEED", value_name = "SEED")]
    seed: Option<u64>,
}

/// This enum holds the actions a key press can trigger.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Action {
    /// This variant is used when the target with the given id is hit.
    Click(u32),
    /// This variant is used when the player quits.
    Finish,
    /// This variant is used when the key only edited the panel, or did nothing at all.
    Pass,
    /// This variant is used when the play/restart button is pressed.
    StartGame,
}

/// Initializes logging, reads the command line and runs the game until the player quits.
///
/// # Errors
///
/// The function may return any one of the following errors:
///
/// - io::Error
/// - dialoguer::Error
/// - findnum::CountError
pub fn init() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let term = Term::stdout();
    require_terminal(term.is_term())?;
    let mut engine = cli.seed.map_or_else(GameEngine::new, GameEngine::with_seed);

    let points = match cli.points {
        Some(points) => points,
        None => take_count(&term)?,
    };
    let mut panel = Panel::new(Some(points));

    term.set_title("findnum");
    term.hide_cursor()?;

    let result = run(&term, &mut engine, &mut panel);

    term.clear_screen()?;
    term.show_cursor()?;
    result
}

/// This function applies an action to the engine and the panel, and tells the game loop whether to
/// keep going.
pub(crate) fn apply(engine: &mut GameEngine, panel: &mut Panel, action: Action) -> ControlFlow<()> {
    match action {
        Action::Click(id) => {
            let outcome = engine.register_click(id);
            debug!("click on {id}: {outcome:?}");

            panel.notice = match outcome {
                ClickOutcome::Correct | ClickOutcome::Wrong => None,
                ClickOutcome::Ignored => Some(format!("{id} is not a target you can hit")),
            };
        }
        Action::Finish => {
            info!("player quit");
            return ControlFlow::Break(());
        }
        Action::Pass => {}
        Action::StartGame => match parse_count(&panel.points) {
            Ok(count) => {
                engine.start(i64::from(count.get()));
                panel.aim.clear();
                panel.focus = Focus::Aim;
                panel.notice = None;
            }
            Err(err) => panel.notice = Some(err.to_string()),
        },
    }

    ControlFlow::Continue(())
}

/// This function reads a key and returns the action bound to it. Keys that only edit the focused
/// field do so right away and return `Action::Pass`.
pub(crate) fn handle_key(panel: &mut Panel, key: Key) -> Action {
    match key {
        Key::Escape | Key::CtrlC => Action::Finish,
        Key::Tab | Key::BackTab | Key::ArrowUp | Key::ArrowDown => {
            panel.focus.next();
            Action::Pass
        }
        Key::Backspace => {
            let _ = panel.focused_mut().pop();
            Action::Pass
        }
        Key::Char(ch) if ch.is_ascii_digit() => {
            panel.focused_mut().push(ch);
            Action::Pass
        }
        Key::Enter => match panel.focus {
            Focus::Points => Action::StartGame,
            Focus::Aim => mem::take(&mut panel.aim)
                .parse()
                .map_or(Action::Pass, Action::Click),
        },
        _ => Action::Pass,
    }
}

/// This function runs the game loop: it waits for keys for at most one frame, moves the engine's
/// clock forward by the real time that passed and redraws when the frame changed.
fn run(term: &Term, engine: &mut GameEngine, panel: &mut Panel) -> Result<()> {
    let reader_term = term.clone();
    let keys = spawn_key_reader(move || reader_term.read_key_raw());
    let mut last = Instant::now();
    let mut shown = String::new();

    loop {
        let key = match keys.recv_timeout(FRAME) {
            Ok(key) => Some(key),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => break Ok(()),
        };

        let received = key.is_some();
        let now = Instant::now();
        let flow = step(engine, panel, now.duration_since(last), key);
        last = now;

        if flow.is_break() {
            // the reader is parked after handing over the quit key, so the terminal is restored
            keys.stop();
            break Ok(());
        }
        if received {
            keys.resume();
        }

        let (rows, cols) = term.size();
        let frame = render(panel, &engine.snapshot(), usize::from(rows), usize::from(cols))?;
        if frame != shown {
            term.clear_screen()?;
            term.write_str(&frame)?;
            shown = frame;
        }
    }
}

/// This function moves the engine's clock forward by `dt` and then handles `key`, so a key is
/// always applied at the logical time it was read.
pub(crate) fn step(
    engine: &mut GameEngine,
    panel: &mut Panel,
    dt: Duration,
    key: Option<Key>,
) -> ControlFlow<()> {
    engine.advance(dt);

    match key {
        Some(key) => {
            let action = handle_key(panel, key);
            apply(engine, panel, action)
        }
        None => ControlFlow::Continue(()),
    }
}

/// This function serves as a value parser for the command line argument parser in the `points`
/// field, applying the same sanitization as the in-game field.
fn verify_points(string: &str) -> Result<NonZeroU32, String> {
    parse_count(string).map_err(|err| console::strip_ansi_codes(&err.to_string()).into_owned())
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;
    use std::ops::ControlFlow;
    use std::time::Duration;

    use console::Key;

    use crate::engine::{GameEngine, Status, FADE_OUT};
    use crate::frame::{Focus, Panel};

    use super::{apply, handle_key, step, verify_points, Action};

    fn press(engine: &mut GameEngine, panel: &mut Panel, keys: &[Key]) -> ControlFlow<()> {
        for key in keys {
            let action = handle_key(panel, key.clone());
            apply(engine, panel, action)?;
        }
        ControlFlow::Continue(())
    }

    #[test]
    fn digits_edit_the_focused_field() {
        let mut panel = Panel::new(None);

        assert_eq!(handle_key(&mut panel, Key::Char('4')), Action::Pass, "typing");
        assert_eq!(handle_key(&mut panel, Key::Char('x')), Action::Pass, "ignored");
        assert_eq!(handle_key(&mut panel, Key::Char('2')), Action::Pass, "typing");
        assert_eq!(panel.points, "42", "digits only");

        assert_eq!(handle_key(&mut panel, Key::Backspace), Action::Pass, "delete");
        assert_eq!(panel.points, "4", "last digit removed");

        assert_eq!(handle_key(&mut panel, Key::Tab), Action::Pass, "switch");
        assert_eq!(panel.focus, Focus::Aim, "aim has focus");
        assert_eq!(handle_key(&mut panel, Key::Char('7')), Action::Pass, "typing");
        assert_eq!(handle_key(&mut panel, Key::Enter), Action::Click(7), "hit 7");
        assert!(panel.aim.is_empty(), "aim is cleared after a hit");
        assert_eq!(handle_key(&mut panel, Key::Enter), Action::Pass, "nothing to hit");
        assert_eq!(handle_key(&mut panel, Key::Escape), Action::Finish, "quit");
    }

    #[test]
    fn play_starts_a_round_and_focuses_aim() {
        let mut engine = GameEngine::with_seed(6);
        let mut panel = Panel::new(NonZeroU32::new(2));

        let flow = press(&mut engine, &mut panel, &[Key::Enter]);
        assert_eq!(flow, ControlFlow::Continue(()), "still running");
        assert_eq!(engine.status(), Status::Playing, "round started");
        assert_eq!(panel.focus, Focus::Aim, "ready to hit");

        let flow = press(&mut engine, &mut panel, &[Key::Char('1'), Key::Enter]);
        assert_eq!(flow, ControlFlow::Continue(()), "still running");
        let flow = press(&mut engine, &mut panel, &[Key::Char('2'), Key::Enter]);
        assert_eq!(flow, ControlFlow::Continue(()), "still running");
        engine.advance(FADE_OUT);
        assert_eq!(engine.status(), Status::AllCleared, "both targets hit in order");
    }

    #[test]
    fn rejected_counts_leave_a_notice() {
        let mut engine = GameEngine::with_seed(6);
        let mut panel = Panel::new(None);

        let flow = press(&mut engine, &mut panel, &[Key::Char('0'), Key::Enter]);
        assert_eq!(flow, ControlFlow::Continue(()), "still running");
        assert_eq!(engine.status(), Status::NotStarted, "zero starts nothing");
        assert!(panel.notice.is_some(), "the player is told why");
        assert_eq!(panel.focus, Focus::Points, "focus stays on points");
    }

    #[test]
    fn ignored_clicks_leave_a_notice() {
        let mut engine = GameEngine::with_seed(6);
        let mut panel = Panel::new(NonZeroU32::new(2));

        let flow = press(&mut engine, &mut panel, &[Key::Enter, Key::Char('9'), Key::Enter]);
        assert_eq!(flow, ControlFlow::Continue(()), "still running");
        assert_eq!(engine.status(), Status::Playing, "unknown id changes nothing");
        assert!(panel.notice.is_some(), "the player is told why");
    }

    #[test]
    fn escape_stops_the_loop() {
        let mut engine = GameEngine::with_seed(6);
        let mut panel = Panel::new(None);

        let flow = press(&mut engine, &mut panel, &[Key::Escape, Key::Enter]);
        assert_eq!(flow, ControlFlow::Break(()), "loop stops");
    }

    #[test]
    fn ctrl_c_quits_like_escape() {
        let mut engine = GameEngine::with_seed(6);
        let mut panel = Panel::new(NonZeroU32::new(2));

        let flow = press(&mut engine, &mut panel, &[Key::Enter, Key::CtrlC]);
        assert_eq!(flow, ControlFlow::Break(()), "loop stops through the normal quit path");
    }

    #[test]
    fn wrong_click_counts_the_time_waited_for_it() {
        let mut engine = GameEngine::with_seed(6);
        let mut panel = Panel::new(NonZeroU32::new(3));

        for key in [Key::Enter, Key::Char('2')] {
            let flow = step(&mut engine, &mut panel, Duration::ZERO, Some(key));
            assert_eq!(flow, ControlFlow::Continue(()), "still running");
        }

        // the miss arrives 250 ms later, after two ticks were due
        let flow = step(&mut engine, &mut panel, Duration::from_millis(250), Some(Key::Enter));
        assert_eq!(flow, ControlFlow::Continue(()), "still running");
        assert_eq!(engine.status(), Status::GameOver, "out of order");
        assert_eq!(engine.elapsed().tenths(), 2, "ticks before the miss are counted");
    }

    #[test]
    fn correct_click_fades_from_the_time_it_was_read() {
        let mut engine = GameEngine::with_seed(6);
        let mut panel = Panel::new(NonZeroU32::new(2));

        for key in [Key::Enter, Key::Char('1')] {
            let flow = step(&mut engine, &mut panel, Duration::ZERO, Some(key));
            assert_eq!(flow, ControlFlow::Continue(()), "still running");
        }
        let flow = step(&mut engine, &mut panel, Duration::from_millis(40), Some(Key::Enter));
        assert_eq!(flow, ControlFlow::Continue(()), "still running");

        let flow = step(&mut engine, &mut panel, FADE_OUT - Duration::from_millis(1), None);
        assert_eq!(flow, ControlFlow::Continue(()), "still running");
        assert_eq!(engine.targets().len(), 2, "target 1 is still fading");

        let flow = step(&mut engine, &mut panel, Duration::from_millis(1), None);
        assert_eq!(flow, ControlFlow::Continue(()), "still running");
        assert_eq!(engine.targets().len(), 1, "target 1 is gone three seconds after the hit");
    }

    #[test]
    fn command_line_points_are_sanitized() {
        assert_eq!(verify_points("1x5").map(NonZeroU32::get), Ok(15), "noise dropped");
        assert!(verify_points("0").is_err(), "zero rejected");
    }
}
