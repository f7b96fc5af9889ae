//! The library components of the game. They allow starting rounds of numbered targets, hitting
//! them in ascending order, and drawing the whole thing in a terminal.
//!
//! The starting point of the library is the engine.rs file, which contains the game state machine.
//! Everything else is the terminal frontend around it, entered through `init()`.

mod engine;
mod frame;
mod game;
mod input;
mod timer;

pub use engine::{
    ClickOutcome, Elapsed, GameEngine, Position, Snapshot, Status, Target, TargetState, FADE_OUT,
    FIELD_EXTENT, TICK,
};
pub use game::init;
pub use input::{parse_count, sanitize_count, CountError, MAX_POINTS};
