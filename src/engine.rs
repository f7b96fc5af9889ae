//! The engine module contains the whole game state machine: target generation, click validation
//! against the expected sequence, delayed removal of correctly clicked targets and elapsed-time
//! tracking.
//!
//! The engine never reads a wall clock. It keeps a logical clock that the caller moves forward with
//! `GameEngine::advance()`, which replays every tick and removal that falls due in between.

use std::fmt;
use std::mem;
use std::time::Duration;

use fastrand::Rng;
use log::{debug, info, trace};

use crate::timer::{PendingRemovals, Ticker};

/// The delay between a correct click and the removal of the clicked target.
pub const FADE_OUT: Duration = Duration::from_millis(3_000);

/// The upper bound (exclusive) of both target coordinates, in percent of the play area.
pub const FIELD_EXTENT: f64 = 80.0;

/// The interval at which elapsed time grows while a round is being played.
pub const TICK: Duration = Duration::from_millis(100);

/// This enum reports what a call to `GameEngine::register_click()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click hit the expected target, which is now fading out.
    Correct,
    /// The click was not processed: no round is being played, or the id does not name an active
    /// target.
    Ignored,
    /// The click hit an active target out of order and ended the round.
    Wrong,
}

/// Elapsed play time, counted in whole tenths of a second.
///
/// Displays with one decimal place and a seconds unit, e.g. `12.3s`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Elapsed(u64);

impl Elapsed {
    /// No time at all.
    pub const ZERO: Self = Self(0);

    /// Returns the elapsed time as a duration.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        Duration::from_millis(self.0 * 100)
    }

    /// Returns the number of tenths of a second counted so far.
    #[must_use]
    pub const fn tenths(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Elapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}s", self.0 / 10, self.0 % 10)
    }
}

/// A point on the play area, both coordinates in percent and within `[0, FIELD_EXTENT)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Distance from the left edge.
    pub x: f64,
    /// Distance from the top edge.
    pub y: f64,
}

impl Position {
    /// This function samples both coordinates independently and uniformly.
    fn random(rng: &mut Rng) -> Self {
        Self {
            x: rng.f64() * FIELD_EXTENT,
            y: rng.f64() * FIELD_EXTENT,
        }
    }
}

/// The overall status of the game, as shown in the caption above the play area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The last target of the round has been removed.
    AllCleared,
    /// A target was clicked out of order.
    GameOver,
    /// No round has been started yet.
    NotStarted,
    /// A round is in progress.
    Playing,
}

impl Status {
    /// Returns the caption the status is rendered with.
    #[must_use]
    pub const fn caption(self) -> &'static str {
        match self {
            Self::NotStarted | Self::Playing => "LET'S PLAY",
            Self::AllCleared => "ALL CLEARED",
            Self::GameOver => "GAME OVER!",
        }
    }
}

/// A numbered target on the play area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Target {
    /// This field contains the target's number, unique within the round.
    id: u32,
    /// This field contains the place the target was generated at. It never moves.
    position: Position,
    /// This field contains whether the target is still clickable or already fading out.
    state: TargetState,
}

impl Target {
    /// Returns the target's number.
    #[must_use]
    pub const fn id(&self) -> u32 {
        self.id
    }

    /// Returns the target's fixed position.
    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Returns whether the target is active or clicked.
    #[must_use]
    pub const fn state(&self) -> TargetState {
        self.state
    }
}

/// The visual and interactive state of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    /// The target can be clicked.
    Active,
    /// The target has been clicked and no longer reacts to clicks.
    Clicked,
}

/// This struct holds the fields that only exist while a round is being played.
#[derive(Debug)]
struct Play {
    /// This field contains the elapsed time of the round so far.
    elapsed: Elapsed,
    /// This field contains the id a click must match to be accepted.
    expected_next: u32,
    /// This field contains the targets still on the field, ordered by id.
    targets: Vec<Target>,
}

/// This enum holds the state of the current round. Each variant carries only what is meaningful
/// in it, so time can only run and clicks can only count in `Playing`.
#[derive(Debug)]
enum Round {
    /// This variant holds the frozen time of a round whose last target was removed.
    AllCleared {
        /// This field contains the time the round took.
        elapsed: Elapsed,
    },
    /// This variant holds a round that ended on a wrong click, with its targets frozen in place.
    GameOver {
        /// This field contains the time at which the wrong click happened.
        elapsed: Elapsed,
        /// This field contains the targets left on the field, clicked ones included.
        targets: Vec<Target>,
    },
    /// This variant is the state before the first round.
    NotStarted,
    /// This variant holds a round in progress.
    Playing(Play),
}

/// A read-only view of the engine for the presentation layer.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'engine> {
    /// Elapsed time of the current or last round.
    pub elapsed: Elapsed,
    /// The id that a click must currently match.
    pub expected_next: u32,
    /// Whether a round has ever been started.
    pub has_started: bool,
    /// Number of fade-outs still waiting for their removal.
    pub pending_removals: usize,
    /// The current status.
    pub status: Status,
    /// The targets on the field, ordered by id.
    pub targets: &'engine [Target],
}

impl Snapshot<'_> {
    /// Returns whether the play button has never been pressed, which only decides whether it reads
    /// "Play" or "Restart".
    #[must_use]
    pub const fn is_first_play(&self) -> bool {
        !self.has_started
    }

    /// Returns the targets to draw; nothing is drawn before the first round.
    #[must_use]
    pub const fn visible_targets(&self) -> &[Target] {
        if self.has_started {
            self.targets
        } else {
            &[]
        }
    }
}

/// The game state machine.
///
/// All mutation goes through `start()`, `register_click()` and `advance()`, and all of them run on
/// the caller's thread.
#[derive(Debug)]
pub struct GameEngine {
    /// This field contains whether `start()` has ever succeeded.
    has_started: bool,
    /// This field contains the logical time since the engine was created.
    now: Duration,
    /// This field contains the delayed removals of correctly clicked targets.
    pending: PendingRemovals,
    /// This field contains the generator used to place targets.
    rng: Rng,
    /// This field contains the state of the current round.
    round: Round,
    /// This field contains the elapsed-time source.
    ticker: Ticker,
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEngine {
    /// Advances the logical clock by `dt`, firing every tick and removal that falls due on the way
    /// in chronological order. When a tick and a removal are due at the same instant, the tick
    /// goes first.
    pub fn advance(&mut self, dt: Duration) {
        let until = self.now + dt;

        loop {
            let tick = self.ticker.next_due().filter(|due| *due <= until);
            let removal = self.pending.next_due().filter(|due| *due <= until);

            match (tick, removal) {
                (Some(tick), Some(removal)) if removal < tick => self.fire_removal(),
                (Some(tick), _) => self.fire_tick(tick),
                (None, Some(_)) => self.fire_removal(),
                (None, None) => break,
            }
        }

        self.now = until;
    }

    /// Returns the elapsed time of the current or last round.
    #[must_use]
    pub const fn elapsed(&self) -> Elapsed {
        match self.round {
            Round::NotStarted => Elapsed::ZERO,
            Round::Playing(Play { elapsed, .. })
            | Round::AllCleared { elapsed }
            | Round::GameOver { elapsed, .. } => elapsed,
        }
    }

    /// Returns the id that a click must currently match. Outside a round this is always 1.
    #[must_use]
    pub const fn expected_next(&self) -> u32 {
        match self.round {
            Round::Playing(Play { expected_next, .. }) => expected_next,
            Round::NotStarted | Round::AllCleared { .. } | Round::GameOver { .. } => 1,
        }
    }

    /// This function takes the earliest pending removal off the queue and applies it.
    fn fire_removal(&mut self) {
        let Some(removal) = self.pending.pop_next() else {
            return;
        };
        self.now = removal.due;

        let Round::Playing(ref mut play) = self.round else {
            debug!("discarding removal {:?} outside of a round", removal.handle);
            return;
        };

        play.targets.retain(|target| target.id != removal.target);
        trace!("removed target {} at {:?}", removal.target, self.now);

        if play.targets.is_empty() {
            let elapsed = play.elapsed;
            self.ticker.stop();
            self.round = Round::AllCleared { elapsed };
            info!("all targets cleared in {elapsed}");
        }
    }

    /// This function applies one tick of elapsed time at the logical instant `at`.
    fn fire_tick(&mut self, at: Duration) {
        self.now = at;
        self.ticker.fire();

        if let Round::Playing(ref mut play) = self.round {
            play.elapsed = Elapsed(play.elapsed.0 + 1);
        }
    }

    /// Returns whether a round has ever been started.
    #[must_use]
    pub const fn has_started(&self) -> bool {
        self.has_started
    }

    /// Creates an engine seeded from the system's entropy.
    #[must_use]
    pub fn new() -> Self {
        Self::with_rng(Rng::new())
    }

    /// Returns the current logical time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Returns the number of fade-outs still waiting for their removal.
    #[must_use]
    pub fn pending_removals(&self) -> usize {
        self.pending.len()
    }

    /// Handles a click on the target numbered `id`.
    ///
    /// Clicks outside a round, and clicks on ids that are unknown or already clicked, are ignored.
    /// The expected target starts fading out and is removed after `FADE_OUT`; any other target
    /// ends the round immediately, freezing every fade-out in progress.
    pub fn register_click(&mut self, id: u32) -> ClickOutcome {
        let Round::Playing(ref mut play) = self.round else {
            trace!("ignoring click on {id}: no round in progress");
            return ClickOutcome::Ignored;
        };

        let Some(target) = play
            .targets
            .iter_mut()
            .find(|target| target.id == id && target.state == TargetState::Active)
        else {
            trace!("ignoring click on {id}: not an active target");
            return ClickOutcome::Ignored;
        };

        target.state = TargetState::Clicked;

        if id == play.expected_next {
            play.expected_next += 1;
            let handle = self.pending.schedule(self.now + FADE_OUT, id);
            debug!("target {id} hit, removal {handle:?} scheduled");
            return ClickOutcome::Correct;
        }

        let expected = play.expected_next;
        let elapsed = play.elapsed;
        let targets = mem::take(&mut play.targets);
        let abandoned = self.pending.cancel_all();
        self.ticker.stop();
        self.round = Round::GameOver { elapsed, targets };
        info!("game over: hit {id} while expecting {expected}, {abandoned} fade-outs abandoned");

        ClickOutcome::Wrong
    }

    /// Returns a read-only view of the whole engine state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            elapsed: self.elapsed(),
            expected_next: self.expected_next(),
            has_started: self.has_started,
            pending_removals: self.pending.len(),
            status: self.status(),
            targets: self.targets(),
        }
    }

    /// Starts a new round with `count` targets, abandoning the current one if any.
    ///
    /// A count that is not positive, or does not fit in a `u32`, is silently rejected and leaves
    /// the engine untouched.
    pub fn start(&mut self, count: i64) {
        let Some(count) = u32::try_from(count).ok().filter(|&count| count > 0) else {
            debug!("rejecting start with {count} targets");
            return;
        };

        let canceled = self.pending.cancel_all();
        let targets = (1..=count)
            .map(|id| Target {
                id,
                position: Position::random(&mut self.rng),
                state: TargetState::Active,
            })
            .collect();

        self.round = Round::Playing(Play {
            elapsed: Elapsed::ZERO,
            expected_next: 1,
            targets,
        });
        self.has_started = true;
        self.ticker.start(self.now);

        info!("round started with {count} targets, {canceled} pending removals canceled");
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> Status {
        match self.round {
            Round::NotStarted => Status::NotStarted,
            Round::Playing(_) => Status::Playing,
            Round::AllCleared { .. } => Status::AllCleared,
            Round::GameOver { .. } => Status::GameOver,
        }
    }

    /// Returns the targets on the field, ordered by id.
    #[must_use]
    pub fn targets(&self) -> &[Target] {
        match self.round {
            Round::Playing(Play { ref targets, .. }) | Round::GameOver { ref targets, .. } => {
                targets.as_slice()
            }
            Round::NotStarted | Round::AllCleared { .. } => &[],
        }
    }

    /// Creates an engine whose target layouts are reproducible from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(Rng::with_seed(seed))
    }

    /// This function creates an engine around an existing generator.
    fn with_rng(rng: Rng) -> Self {
        Self {
            has_started: false,
            now: Duration::ZERO,
            pending: PendingRemovals::default(),
            rng,
            round: Round::NotStarted,
            ticker: Ticker::new(TICK),
        }
    }
}
