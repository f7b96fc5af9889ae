//! This module holds everything needed to draw a frame of the game: the control panel above the
//! play area and the play area itself.
//!
//! Frames are rendered to a plain string first so the game loop can skip redrawing when nothing
//! changed.

use std::fmt::Write as _;
use std::num::NonZeroU32;

use anyhow::Result;
use console::{pad_str, style, Alignment};

use crate::engine::{Snapshot, Status};

mod field;

use field::Field;

/// The number of terminal rows taken by everything but the play area.
const CHROME_ROWS: usize = 8;

/// This enum holds which of the two input fields receives typed digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    /// This variant is used when digits compose the id of the target to hit.
    Aim,
    /// This variant is used when digits edit the number of points of the next round.
    Points,
}

impl Focus {
    /// This function moves the focus to the other field.
    pub(crate) fn next(&mut self) {
        *self = match *self {
            Self::Aim => Self::Points,
            Self::Points => Self::Aim,
        };
    }
}

/// This struct holds the state of the control panel, which belongs to the frontend and never to
/// the engine.
#[derive(Debug)]
pub(crate) struct Panel {
    /// This field contains the digits typed into the aim field.
    pub(crate) aim: String,
    /// This field contains the field currently receiving input.
    pub(crate) focus: Focus,
    /// This field contains a one-line message shown under the fields, such as a rejected count.
    pub(crate) notice: Option<String>,
    /// This field contains the digits typed into the points field.
    pub(crate) points: String,
}

impl Panel {
    /// This function returns the text of the field that currently has focus.
    pub(crate) fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            Focus::Aim => &mut self.aim,
            Focus::Points => &mut self.points,
        }
    }

    /// This function creates a panel with the points field prefilled and focused.
    pub(crate) fn new(points: Option<NonZeroU32>) -> Self {
        Self {
            aim: String::new(),
            focus: Focus::Points,
            notice: None,
            points: points.map(|count| count.to_string()).unwrap_or_default(),
        }
    }
}

/// This function renders a whole frame for a terminal of `rows` by `cols` cells.
pub(crate) fn render(
    panel: &Panel,
    snapshot: &Snapshot<'_>,
    rows: usize,
    cols: usize,
) -> Result<String> {
    let mut output = String::new();

    let caption = style(snapshot.status.caption()).bold();
    let caption = match snapshot.status {
        Status::NotStarted | Status::Playing => caption,
        Status::AllCleared => caption.green(),
        Status::GameOver => caption.red(),
    };
    writeln!(output, "{caption}")?;

    let points = field_box(&panel.points, panel.focus == Focus::Points);
    writeln!(output, "Points: {points}")?;
    writeln!(output, "Time: {}", snapshot.elapsed)?;

    let button = if snapshot.is_first_play() {
        "[ Play ]"
    } else {
        "[ Restart ]"
    };
    writeln!(output, "{}", style(button).bold())?;

    writeln!(output, "Aim: {}", field_box(&panel.aim, panel.focus == Focus::Aim))?;
    writeln!(output, "{}", panel.notice.as_deref().unwrap_or_default())?;
    writeln!(output, "{}", "-".repeat(cols))?;

    let field = Field::layout(
        snapshot.visible_targets(),
        cols,
        rows.saturating_sub(CHROME_ROWS),
    );
    for row in field.rows() {
        writeln!(output, "{row}")?;
    }

    let help = "Tab switch field | Enter play or hit | Esc quit";
    write!(output, "{}", pad_str(help, cols, Alignment::Center, None))?;

    Ok(output)
}

/// This function draws the contents of an input field, highlighted when it has focus.
fn field_box(contents: &str, focused: bool) -> String {
    let contents = format!(" {contents:<5} ");

    if focused {
        format!("{}", style(contents).bold().on_cyan())
    } else {
        contents
    }
}
