use serde::{Deserialize, Serialize};

/// Score values for line clears.
///
/// Index corresponds to number of lines removed by one sweep:
/// - 0 lines: 0 points
/// - 1 line: 1 point
/// - 2 lines: 3 points
/// - 3 lines: 7 points
/// - 4 lines: 15 points
const SCORE_TABLE: [usize; 5] = [0, 1, 3, 7, 15];

/// Counters for one episode.
///
/// The score only moves on line clears. Pieces, gravity ticks and holds are
/// tracked for reports and do not influence play.
///
/// # Example
///
/// ```
/// use rltris_engine::SessionStats;
///
/// let mut stats = SessionStats::new();
/// stats.complete_piece_drop();
/// stats.record_line_clear(4);
///
/// assert_eq!(stats.score(), 15);
/// assert_eq!(stats.total_cleared_lines(), 4);
/// assert_eq!(stats.line_cleared_counter()[4], 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    score: usize,
    completed_pieces: usize,
    total_cleared_lines: usize,
    line_cleared_counter: [usize; 5],
    gravity_ticks: usize,
    holds_used: usize,
}

impl SessionStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            score: 0,
            completed_pieces: 0,
            total_cleared_lines: 0,
            line_cleared_counter: [0; 5],
            gravity_ticks: 0,
            holds_used: 0,
        }
    }

    #[must_use]
    pub const fn score(&self) -> usize {
        self.score
    }

    /// Returns the number of pieces locked into the board.
    #[must_use]
    pub const fn completed_pieces(&self) -> usize {
        self.completed_pieces
    }

    #[must_use]
    pub const fn total_cleared_lines(&self) -> usize {
        self.total_cleared_lines
    }

    /// Returns a histogram of sweeps by number of lines removed.
    ///
    /// Index `0` counts locked pieces that completed no row. A piece locked
    /// on the last gravity tick is counted there until the next sweep.
    #[must_use]
    pub fn line_cleared_counter(&self) -> [usize; 5] {
        let clearing: usize = self.line_cleared_counter[1..].iter().sum();
        let mut counter = self.line_cleared_counter;
        counter[0] = self.completed_pieces.saturating_sub(clearing);
        counter
    }

    #[must_use]
    pub const fn gravity_ticks(&self) -> usize {
        self.gravity_ticks
    }

    #[must_use]
    pub const fn holds_used(&self) -> usize {
        self.holds_used
    }

    pub const fn complete_piece_drop(&mut self) {
        self.completed_pieces += 1;
    }

    /// Adds the points for a sweep that removed `cleared_lines` rows.
    ///
    /// Sweeps of more than four rows score as four.
    pub fn record_line_clear(&mut self, cleared_lines: usize) {
        if cleared_lines == 0 {
            return;
        }
        let index = cleared_lines.min(SCORE_TABLE.len() - 1);
        self.total_cleared_lines += cleared_lines;
        self.line_cleared_counter[index] += 1;
        self.score += SCORE_TABLE[index];
    }

    pub const fn record_gravity_tick(&mut self) {
        self.gravity_ticks += 1;
    }

    pub const fn record_hold(&mut self) {
        self.holds_used += 1;
    }
}
