//! Falling-block game engine with an observation interface for learning agents.
//!
//! - [`core`] - Board grid and piece physics
//! - [`engine`] - Game session: actions, gravity ticks, locking, scoring and reward
//! - [`observation`] - Fixed-length feature vectors describing the session state

pub use self::{core::*, engine::*, observation::*};

pub mod core;
pub mod engine;
pub mod observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("cell ({x}, {y}) is outside the {width}x{height} board")]
pub struct OutOfBoundsError {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("board must be at least {min_width}x{min_height}, got {width}x{height}")]
pub struct InvalidBoardSizeError {
    pub width: usize,
    pub height: usize,
    pub min_width: usize,
    pub min_height: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum InvalidActionError {
    #[display("expected {expected} action flags, got {actual}")]
    WrongArity { expected: usize, actual: usize },
    #[display("action flag #{index} must be 0 or 1, got {value}")]
    NotAFlag { index: usize, value: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum HoldError {
    #[display("hold already used in this turn")]
    HoldAlreadyUsed,
    #[display("game is over")]
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("piece kind must be one of T, O, J, L, I, S, Z")]
pub struct ParsePieceKindError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParsePieceSeedError {
    #[display("invalid hex: expected 32 characters, got {len}")]
    InvalidLength { len: usize },
    #[display("invalid hex: non-hex digit in seed")]
    InvalidDigit,
}
