//! # findnum
//!
//! This crate is a reflex game about finding numbers. You pick how many points to play with, they
//! get scattered over the terminal, and you hit them one by one in ascending order while the clock
//! runs. Hit one out of order and the game is over.
//!
//! Every hit point fades out for three seconds before it leaves the field, so the field slowly
//! empties as you go. Clearing it stops the clock and shows your time.

#![expect(
    unused_crate_dependencies,
    reason = "The dependencies are used in the library crate."
)]

use anyhow::Result;
use findnum::init;

fn main() -> Result<()> {
    init()
}
