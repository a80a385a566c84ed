//! Game session logic.
//!
//! This module drives the core data structures through a full game:
//!
//! - [`Session`] - One episode: current, next and held pieces, gravity, locking,
//!   line clears, game over and reward
//! - [`Action`] - The five independent input flags applied before a tick
//! - [`ClockSignal`] / [`FrameClock`] - Which gravity timers fired, and a
//!   deterministic frame counter that produces them
//! - [`PieceSource`] - Pluggable supply of piece kinds (uniform, 7-bag, scripted)
//! - [`RewardConfig`] - Reward shaping for learning agents
//! - [`SessionStats`] - Score and counters of an episode
//!
//! # Game Flow
//!
//! 1. Create a [`Session`] with a piece source
//! 2. The agent reads [`Session::observe`] and picks an [`Action`]
//! 3. [`Session::apply_action`] moves, rotates, speeds up or holds the piece
//! 4. [`Session::tick`] runs gravity when the matching timer fired
//! 5. Repeat until the returned [`StepOutcome`] reports game over, then
//!    [`Session::reset`]
//!
//! # Example
//!
//! ```
//! use rltris_engine::{Action, FrameClock, PieceSeed, Session, SessionConfig};
//!
//! let seed: PieceSeed = "00000000000000000000000000000001".parse().unwrap();
//! let mut session = Session::with_seed(SessionConfig::default(), seed);
//! let mut clock = FrameClock::default();
//!
//! for _ in 0..10_000 {
//!     let outcome = session.step(Action::SPEED_UP, clock.advance());
//!     if outcome.game_over {
//!         break;
//!     }
//! }
//! assert!(session.is_game_over());
//! ```

pub use self::{
    action::*, clock::*, piece_source::*, reward::*, session::*, session_stats::*,
};

mod action;
mod clock;
mod piece_source;
mod reward;
mod session;
mod session_stats;
