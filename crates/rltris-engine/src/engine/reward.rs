//! Reward shaping for learning agents.
//!
//! Rewards are not part of the game rules. They only steer an external agent,
//! so every magnitude lives in [`RewardConfig`] and can be tuned without
//! touching the engine.
//!
//! Two kinds of reward exist:
//!
//! - **Line-clear reward**, granted on the gravity tick that sweeps full rows
//! - **Terminal reward**, granted once when the game ends, judging the final
//!   board: blocks high in the stack are rewarded, blocks deep in the stack,
//!   many holes and too few full rows are penalized

use serde::{Deserialize, Serialize};

use crate::core::Board;

/// Tunable reward magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Reward per sweep, indexed by number of rows removed (0-4).
    pub line_clear: [f64; 5],
    /// Terminal reward per occupied cell in each of the top rows.
    pub upper_row_cell: Vec<f64>,
    /// Terminal reward per occupied cell below the rows of `upper_row_cell`.
    pub lower_row_cell: LowerRowPenalty,
    pub holes: HolePenalty,
    pub full_rows: FullRowTerms,
    /// Flat penalty subtracted when the game ends.
    pub game_over_penalty: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            line_clear: [0.0, 2_000_000.0, 4_000_000.0, 8_000_000.0, 15_000_000.0],
            upper_row_cell: vec![50.0, 50.0, 50.0, 50.0, 40.0, 30.0, 20.0, 10.0, 50.0],
            lower_row_cell: LowerRowPenalty::default(),
            holes: HolePenalty::default(),
            full_rows: FullRowTerms::default(),
            game_over_penalty: 50.0,
        }
    }
}

/// Penalty for a cell `d` rows below the upper band: `-min(d * step, cap)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerRowPenalty {
    pub step: f64,
    pub cap: f64,
}

impl Default for LowerRowPenalty {
    fn default() -> Self {
        Self {
            step: 10.0,
            cap: 1.0,
        }
    }
}

/// Applied when the hole count exceeds `threshold`: `-per_hole * holes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HolePenalty {
    pub threshold: usize,
    pub per_hole: f64,
}

impl Default for HolePenalty {
    fn default() -> Self {
        Self {
            threshold: 5,
            per_hole: 100.0,
        }
    }
}

/// Bonus for many full rows, penalty for few.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FullRowTerms {
    /// More full rows than this earns `bonus_per_cell` for each of their cells.
    pub bonus_above: usize,
    pub bonus_per_cell: f64,
    /// Each full row short of this costs `penalty_per_missing_row`.
    pub penalty_below: usize,
    pub penalty_per_missing_row: f64,
}

impl Default for FullRowTerms {
    fn default() -> Self {
        Self {
            bonus_above: 7,
            bonus_per_cell: 100.0,
            penalty_below: 4,
            penalty_per_missing_row: 200.0,
        }
    }
}

/// Parts of the terminal reward, kept apart for logging.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TerminalReward {
    pub rows: f64,
    pub holes: f64,
    pub full_rows: f64,
    pub game_over: f64,
}

impl TerminalReward {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.rows + self.holes + self.full_rows + self.game_over
    }
}

impl RewardConfig {
    /// Reward for a sweep that removed `cleared_lines` rows.
    #[must_use]
    pub fn line_clear_reward(&self, cleared_lines: usize) -> f64 {
        self.line_clear
            .get(cleared_lines)
            .copied()
            .unwrap_or(self.line_clear[4])
    }

    /// Judges the final board of a finished game.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn terminal_reward(&self, board: &Board) -> TerminalReward {
        let mut rows = 0.0;
        for (y, row) in board.rows().enumerate() {
            let cells = row.iter().filter(|b| b.is_occupied()).count() as f64;
            rows += cells * self.cell_reward(y);
        }

        let holes = board.count_holes();
        let holes = if holes > self.holes.threshold {
            -self.holes.per_hole * holes as f64
        } else {
            0.0
        };

        let full = board.count_full_rows();
        let terms = &self.full_rows;
        let full_rows = if full > terms.bonus_above {
            (full * board.width()) as f64 * terms.bonus_per_cell
        } else if full < terms.penalty_below {
            -((terms.penalty_below - full) as f64) * terms.penalty_per_missing_row
        } else {
            0.0
        };

        TerminalReward {
            rows,
            holes,
            full_rows,
            game_over: -self.game_over_penalty,
        }
    }

    #[expect(clippy::cast_precision_loss)]
    fn cell_reward(&self, y: usize) -> f64 {
        if let Some(reward) = self.upper_row_cell.get(y) {
            return *reward;
        }
        let depth = (y - self.upper_row_cell.len()) as f64;
        -(depth * self.lower_row_cell.step).min(self.lower_row_cell.cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::BoardSize;

    #[test]
    fn test_line_clear_reward() {
        let config = RewardConfig::default();
        assert!(config.line_clear_reward(0).abs() < f64::EPSILON);
        assert!((config.line_clear_reward(1) - 2e6).abs() < f64::EPSILON);
        assert!((config.line_clear_reward(4) - 15e6).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cell_reward_by_row() {
        let config = RewardConfig::default();
        assert!((config.cell_reward(0) - 50.0).abs() < f64::EPSILON);
        assert!((config.cell_reward(5) - 30.0).abs() < f64::EPSILON);
        assert!((config.cell_reward(8) - 50.0).abs() < f64::EPSILON);
        // first row below the upper band costs nothing, deeper rows cost 1
        assert!(config.cell_reward(9).abs() < f64::EPSILON);
        assert!((config.cell_reward(10) + 1.0).abs() < f64::EPSILON);
        assert!((config.cell_reward(19) + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminal_reward_empty_board() {
        let config = RewardConfig::default();
        let reward = config.terminal_reward(&Board::new(BoardSize::default()));
        assert_eq!(
            reward,
            TerminalReward {
                rows: 0.0,
                holes: 0.0,
                full_rows: -800.0,
                game_over: -50.0,
            }
        );
        assert!((reward.total() + 850.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminal_reward_rewards_high_blocks() {
        let config = RewardConfig::default();
        let mut board = Board::new(BoardSize::default());
        board.set_cell(0, 0, crate::Block::Garbage).unwrap();
        board.set_cell(0, 19, crate::Block::Garbage).unwrap();
        let reward = config.terminal_reward(&board);
        assert!((reward.rows - 49.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminal_reward_hole_penalty() {
        let config = RewardConfig::default();
        // six holes: gaps at row 18 capped at row 17, floor block at row 19
        let board = Board::from_ascii(
            "
            ######....
            ..........
            ######....
            ",
        );
        assert_eq!(board.count_holes(), 6);
        let reward = config.terminal_reward(&board);
        assert!((reward.holes + 600.0).abs() < f64::EPSILON);

        let board = Board::from_ascii(
            "
            #####.....
            ..........
            #####.....
            ",
        );
        assert_eq!(board.count_holes(), 5);
        assert!(config.terminal_reward(&board).holes.abs() < f64::EPSILON);
    }

    #[test]
    fn test_terminal_reward_full_rows() {
        let config = RewardConfig::default();
        let full = "##########\n".repeat(8);
        let board = Board::from_ascii(&full);
        let reward = config.terminal_reward(&board);
        assert!((reward.full_rows - 8000.0).abs() < f64::EPSILON);

        let board = Board::from_ascii(&"##########\n".repeat(5));
        assert!(config.terminal_reward(&board).full_rows.abs() < f64::EPSILON);

        let board = Board::from_ascii(&"##########\n".repeat(2));
        assert!((config.terminal_reward(&board).full_rows + 400.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_from_partial_json() {
        let config: RewardConfig =
            serde_json::from_str(r#"{"game_over_penalty": 10.0, "holes": {"threshold": 2}}"#)
                .unwrap();
        assert!((config.game_over_penalty - 10.0).abs() < f64::EPSILON);
        assert_eq!(config.holes.threshold, 2);
        assert!((config.holes.per_hole - 100.0).abs() < f64::EPSILON);
        assert_eq!(config.upper_row_cell, RewardConfig::default().upper_row_cell);
    }
}
