//! This module contains all functions related to taking input from the player. The point count
//! goes through the same sanitization whether it comes from the command line, the startup prompt or
//! the in-game field, and key presses are read on their own thread so the game keeps ticking while
//! the player thinks. That thread only touches the terminal while the game loop waits for a key.

use std::io;
use std::num::NonZeroU32;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::LazyLock;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{bail, Result};
use console::{style, Key, Term};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use log::debug;
use regex::Regex;

/// The largest number of points a round can be played with.
pub const MAX_POINTS: u32 = 9_999;

/// This static holds the pattern of every character that is stripped from a point count.
static NON_DIGITS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[^0-9]").expect("the non-digit pattern is a valid regular expression")
});

/// The reasons a point count is rejected.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountError {
    /// Nothing numeric was entered.
    #[error("{}", style("enter the number of points to play with").bold())]
    Empty,
    /// The count is larger than `MAX_POINTS`.
    #[error("{}", style(format!("at most {MAX_POINTS} points fit on the field")).bold())]
    TooMany,
    /// The count is zero.
    #[error("{}", style("the number of points must be greater than zero").bold())]
    Zero,
}

/// Parses a point count from free-form text. Every non-digit character is dropped first, so
/// `"1a2"` reads as 12.
///
/// # Errors
///
/// Returns a `CountError` when no digits remain, when they spell zero, or when they exceed
/// `MAX_POINTS`.
pub fn parse_count(text: &str) -> Result<NonZeroU32, CountError> {
    let digits = sanitize_count(text);

    if digits.is_empty() {
        return Err(CountError::Empty);
    }

    // only digits are left, so parsing can fail on overflow alone
    let Ok(count) = digits.parse::<u32>() else {
        return Err(CountError::TooMany);
    };

    if count > MAX_POINTS {
        return Err(CountError::TooMany);
    }

    NonZeroU32::new(count).ok_or(CountError::Zero)
}

/// Strips every character that is not an ASCII digit.
#[must_use]
pub fn sanitize_count(text: &str) -> String {
    NON_DIGITS.replace_all(text, "").into_owned()
}

/// This struct owns the thread that reads key presses for the game loop.
///
/// The thread reads exactly one key per `resume()` call. Between a key and the next `resume()` it
/// is parked outside of any terminal read, so the terminal is back in its normal mode whenever the
/// game loop decides to stop.
#[derive(Debug)]
pub(crate) struct KeyReader {
    /// This field contains the keys read so far, in order.
    keys: Receiver<Key>,
    /// This field contains the handle of the reading thread.
    reader: JoinHandle<()>,
    /// This field contains the channel that allows the thread to read one more key.
    resume: Sender<()>,
}

impl KeyReader {
    /// This function waits for the next key for at most `timeout`.
    pub(crate) fn recv_timeout(&self, timeout: Duration) -> Result<Key, RecvTimeoutError> {
        self.keys.recv_timeout(timeout)
    }

    /// This function allows the thread to read one more key. It must only be called after the
    /// previous key was received.
    pub(crate) fn resume(&self) {
        // a send error means the thread is gone, which `recv_timeout` reports on its own
        let _ = self.resume.send(());
    }

    /// This function stops the thread and waits for it to finish. It must only be called while
    /// the thread is parked, that is after receiving a key and before resuming.
    pub(crate) fn stop(self) {
        let Self {
            keys,
            reader,
            resume,
        } = self;
        drop(resume);
        drop(keys);

        if reader.join().is_err() {
            debug!("key reader panicked");
        }
    }
}

/// This function spawns the thread that reads key presses with `read` and forwards them to the game
/// loop. The first key is read right away; every following one waits for `KeyReader::resume()`.
/// The thread ends once the `KeyReader` is stopped or dropped, or `read` fails.
pub(crate) fn spawn_key_reader<F>(mut read: F) -> KeyReader
where
    F: FnMut() -> io::Result<Key> + Send + 'static,
{
    let (sender, keys) = mpsc::channel();
    let (resume, resumed) = mpsc::channel::<()>();

    let reader = thread::spawn(move || {
        while resumed.recv().is_ok() {
            let Ok(key) = read() else {
                break;
            };
            if sender.send(key).is_err() {
                break;
            }
        }
        debug!("key reader finished");
    });

    let reader = KeyReader {
        keys,
        reader,
        resume,
    };
    reader.resume();
    reader
}

/// This function refuses to run the interactive game on anything but a terminal, where key reads
/// would return immediately and the game loop would spin.
pub(crate) fn require_terminal(is_term: bool) -> Result<()> {
    if !is_term {
        bail!("findnum must be run in an interactive terminal");
    }
    Ok(())
}

/// This function is in charge of asking for the number of points when none was given on the
/// command line. The answer is validated with the same rules as every other count.
pub(crate) fn take_count(term: &Term) -> Result<NonZeroU32> {
    let input: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{}", style("How many points?").bold()))
        .validate_with(|input: &String| -> Result<(), CountError> {
            parse_count(input).map(|_count| ())
        })
        .interact_text_on(term)?;

    Ok(parse_count(&input)?)
}
