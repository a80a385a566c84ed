use std::mem;

use serde::{Deserialize, Serialize};

use crate::{
    HoldError, InvalidActionError, InvalidBoardSizeError,
    core::{Board, BoardSize, Direction, Piece, PieceRole},
    observation::FeatureExtractor,
};

use super::{
    Action, ClockSignal, PieceSeed, PieceSource, RewardConfig, SessionStats, UniformPieceSource,
};

/// Everything that shapes a session apart from its piece source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub board_size: BoardSize,
    pub reward: RewardConfig,
    pub observation: FeatureExtractor,
}

impl SessionConfig {
    /// # Errors
    ///
    /// Returns an error if the board is smaller than [`BoardSize::MIN`].
    pub fn validate(&self) -> Result<(), InvalidBoardSizeError> {
        self.board_size.validate()
    }
}

/// Result of one [`Session::tick`] or [`Session::step`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StepOutcome {
    pub score: usize,
    pub game_over: bool,
    /// Reward accumulated since the episode started.
    pub reward: f64,
    /// Part of `reward` earned by this call.
    pub reward_delta: f64,
    /// Rows removed by the sweep of this call.
    pub cleared_lines: usize,
}

/// Serializable view of a session at one point in time.
///
/// The piece string format carries no role, so deserialization assigns each
/// piece the role of the field it is read into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub board: Board,
    pub current: Piece,
    #[serde(deserialize_with = "deserialize_next")]
    pub next: Piece,
    #[serde(deserialize_with = "deserialize_held")]
    pub held: Option<Piece>,
    pub held_used: bool,
    pub speed_up: bool,
    pub game_over: bool,
    pub reward: f64,
    pub stats: SessionStats,
}

fn deserialize_next<'de, D>(deserializer: D) -> Result<Piece, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut piece = Piece::deserialize(deserializer)?;
    piece.set_role(PieceRole::Next);
    Ok(piece)
}

fn deserialize_held<'de, D>(deserializer: D) -> Result<Option<Piece>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut piece = Option::<Piece>::deserialize(deserializer)?;
    if let Some(piece) = &mut piece {
        piece.set_role(PieceRole::Held);
    }
    Ok(piece)
}

/// One game from spawn to top-out.
///
/// A session owns its board, the current, next and held pieces, and its piece
/// source, so independent sessions can run on separate threads. It is driven
/// from outside: [`Session::apply_action`] for player input and
/// [`Session::tick`] whenever a gravity timer fires.
///
/// # Example
///
/// ```
/// use rltris_engine::{Action, ClockSignal, PieceKind, SequencePieceSource, Session};
///
/// let mut session = Session::new(SequencePieceSource::new([PieceKind::I, PieceKind::O]));
/// session.apply_action(Action::MOVE_LEFT);
/// let outcome = session.tick(ClockSignal::BOTH);
///
/// assert!(!outcome.game_over);
/// assert_eq!(session.current_piece().position().y(), 1);
/// assert_eq!(session.observe().len(), 245);
/// ```
#[derive(Debug, Clone)]
pub struct Session<S = UniformPieceSource> {
    config: SessionConfig,
    source: S,
    board: Board,
    current: Piece,
    next: Piece,
    held: Option<Piece>,
    held_used: bool,
    speed_up: bool,
    game_over: bool,
    reward: f64,
    stats: SessionStats,
}

impl Session<UniformPieceSource> {
    /// Creates a session with uniformly random pieces drawn from `seed`.
    #[must_use]
    pub fn with_seed(config: SessionConfig, seed: PieceSeed) -> Self {
        Self::with_config(config, UniformPieceSource::with_seed(seed))
    }
}

impl<S> Session<S>
where
    S: PieceSource,
{
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_config(SessionConfig::default(), source)
    }

    /// # Panics
    ///
    /// Panics if the config fails [`SessionConfig::validate`].
    #[must_use]
    pub fn with_config(config: SessionConfig, mut source: S) -> Self {
        if let Err(err) = config.validate() {
            panic!("invalid session config: {err}");
        }
        let size = config.board_size;
        let current = Piece::new(source.next_kind(), size);
        let next = spawn_next(&mut source, size);
        Self {
            board: Board::new(size),
            config,
            source,
            current,
            next,
            held: None,
            held_used: false,
            speed_up: false,
            game_over: false,
            reward: 0.0,
            stats: SessionStats::new(),
        }
    }

    /// Replaces the board, for scripted starting positions.
    ///
    /// # Panics
    ///
    /// Panics if `board` does not have the configured size.
    #[must_use]
    pub fn with_board(mut self, board: Board) -> Self {
        assert_eq!(
            board.size(),
            self.config.board_size,
            "board size must match the session config"
        );
        self.board = board;
        self
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[must_use]
    pub fn current_piece(&self) -> &Piece {
        &self.current
    }

    #[must_use]
    pub fn next_piece(&self) -> &Piece {
        &self.next
    }

    #[must_use]
    pub fn held_piece(&self) -> Option<&Piece> {
        self.held.as_ref()
    }

    #[must_use]
    pub fn is_held_used(&self) -> bool {
        self.held_used
    }

    #[must_use]
    pub fn is_speed_up(&self) -> bool {
        self.speed_up
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.stats.score()
    }

    #[must_use]
    pub fn reward(&self) -> f64 {
        self.reward
    }

    #[must_use]
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Applies the set flags in the order left, right, rotate, speed-up, hold.
    ///
    /// Blocked moves and rotations are dropped silently, and so is a second
    /// hold within one piece's life. Does nothing once the game is over.
    pub fn apply_action(&mut self, action: Action) {
        if self.game_over {
            return;
        }
        if action.move_left {
            self.current.try_move(&self.board, Direction::Left);
        }
        if action.move_right {
            self.current.try_move(&self.board, Direction::Right);
        }
        if action.rotate {
            self.current.rotate(&self.board);
        }
        if action.speed_up {
            self.speed_up = true;
        }
        if action.hold
            && let Err(err) = self.try_hold()
        {
            tracing::trace!(%err, "hold ignored");
        }
    }

    /// Parses and applies an action in its 5-flag vector form.
    pub fn apply_flags(&mut self, flags: &[u8]) -> Result<(), InvalidActionError> {
        self.apply_action(Action::from_flags(flags)?);
        Ok(())
    }

    /// Advances gravity by one step if the timer matching the current speed
    /// fired.
    ///
    /// A gravity step sweeps full rows left by the previous lock and rewards
    /// them, moves the current piece down, then locks it if it landed. A
    /// piece that lands while still poking above the field ends the game
    /// instead, without touching the board. The score is updated last.
    pub fn tick(&mut self, signal: ClockSignal) -> StepOutcome {
        let reward_before = self.reward;
        let mut cleared_lines = 0;

        if !self.game_over && signal.fires(self.speed_up) {
            self.stats.record_gravity_tick();

            cleared_lines = self.board.sweep_full_rows();
            if cleared_lines > 0 {
                self.reward += self.config.reward.line_clear_reward(cleared_lines);
                tracing::debug!(cleared_lines, reward = self.reward, "rows swept");
            }

            self.current.try_move(&self.board, Direction::Down);
            if self.current.is_landing() {
                self.land_current();
            }

            self.stats.record_line_clear(cleared_lines);
        }

        StepOutcome {
            score: self.stats.score(),
            game_over: self.game_over,
            reward: self.reward,
            reward_delta: self.reward - reward_before,
            cleared_lines,
        }
    }

    /// Applies `action`, then ticks with `signal`.
    pub fn step(&mut self, action: Action, signal: ClockSignal) -> StepOutcome {
        self.apply_action(action);
        self.tick(signal)
    }

    /// Sets the current piece aside.
    ///
    /// With an empty hold slot the next piece becomes current. Otherwise the
    /// held piece swaps in and restarts from the spawn position. Only one hold
    /// is allowed until the current piece locks.
    pub fn try_hold(&mut self) -> Result<(), HoldError> {
        if self.game_over {
            return Err(HoldError::GameOver);
        }
        if self.held_used {
            return Err(HoldError::HoldAlreadyUsed);
        }

        let mut outgoing = match self.held.take() {
            None => {
                let outgoing = self.current;
                self.promote_next();
                outgoing
            }
            Some(mut held) => {
                held.reset_position(self.config.board_size);
                held.set_role(PieceRole::Current);
                mem::replace(&mut self.current, held)
            }
        };
        outgoing.set_role(PieceRole::Held);
        self.held = Some(outgoing);
        self.held_used = true;
        self.stats.record_hold();
        Ok(())
    }

    /// Starts a new episode on an empty board.
    ///
    /// The piece source keeps its state, so consecutive episodes see
    /// different pieces.
    pub fn reset(&mut self) {
        let size = self.config.board_size;
        self.board = Board::new(size);
        self.current = Piece::new(self.source.next_kind(), size);
        self.next = spawn_next(&mut self.source, size);
        self.held = None;
        self.held_used = false;
        self.speed_up = false;
        self.game_over = false;
        self.reward = 0.0;
        self.stats = SessionStats::new();
    }

    /// Feature vector of the current state. See [`FeatureExtractor::observe`].
    #[must_use]
    pub fn observe(&self) -> Vec<f32> {
        self.config
            .observation
            .observe(&self.board, &self.current, &self.next)
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            board: self.board.clone(),
            current: self.current,
            next: self.next,
            held: self.held,
            held_used: self.held_used,
            speed_up: self.speed_up,
            game_over: self.game_over,
            reward: self.reward,
            stats: self.stats.clone(),
        }
    }

    fn land_current(&mut self) {
        if self.current.cells().iter().any(|cell| cell.y() < 0) {
            let terminal = self.config.reward.terminal_reward(&self.board);
            self.reward += terminal.total();
            self.game_over = true;
            tracing::debug!(
                ?terminal,
                reward = self.reward,
                score = self.stats.score(),
                pieces = self.stats.completed_pieces(),
                "game over"
            );
            return;
        }

        self.board.fill_piece(&self.current);
        self.stats.complete_piece_drop();
        tracing::debug!(piece = ?self.current, "piece locked");
        self.speed_up = false;
        self.held_used = false;
        self.promote_next();
    }

    fn promote_next(&mut self) {
        let next = spawn_next(&mut self.source, self.config.board_size);
        self.current = mem::replace(&mut self.next, next);
        self.current.set_role(PieceRole::Current);
    }
}

fn spawn_next<S>(source: &mut S, size: BoardSize) -> Piece
where
    S: PieceSource,
{
    let mut piece = Piece::new(source.next_kind(), size);
    piece.set_role(PieceRole::Next);
    piece
}
