//! Fixed-length feature vectors for learning agents.
//!
//! [`FeatureExtractor::observe`] turns the board and the two visible pieces
//! into a flat `Vec<f32>`. The vector is a pure function of its inputs, so it
//! can be recomputed at any time without touching the session.
//!
//! The vector is laid out as the consecutive groups of [`FeatureGroup::ALL`].
//! On the default 10×20 board it holds 245 values.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::core::{Board, BoardSize, Piece, PieceKind, PiecePosition};

/// A named slice of the observation vector, in vector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureGroup {
    /// Occupancy of every cell, row by row from the top, `1.0` if occupied.
    Cells,
    ColumnHeights,
    Bumpiness,
    Holes,
    /// Holes divided by the average column height, `0.0` on an empty board.
    HolesPerAverageHeight,
    MaxHeight,
    /// Tallest column minus lowest column.
    HeightSpread,
    /// Occupied cells in rows `blocks_below_row` and below.
    BlocksBelowRow,
    /// `x` and `y` of the current piece's pivot cell.
    ///
    /// Models trained against a fixed spawn-time anchor see moving values here.
    Anchor,
    CurrentKind,
    NextKind,
    /// Slot `k` counts rows holding exactly `k + 1` blocks, full rows excluded.
    AlmostFullRows,
    /// Index of the topmost row with a block, or the board height.
    TopmostRow,
    /// Horizontal shifts of the current piece that do not collide.
    ReachableOffsets,
    AverageHeight,
    /// Empty in-bounds cells diagonally adjacent to the anchor.
    FreeDiagonals,
}

impl FeatureGroup {
    pub const ALL: [Self; 16] = [
        Self::Cells,
        Self::ColumnHeights,
        Self::Bumpiness,
        Self::Holes,
        Self::HolesPerAverageHeight,
        Self::MaxHeight,
        Self::HeightSpread,
        Self::BlocksBelowRow,
        Self::Anchor,
        Self::CurrentKind,
        Self::NextKind,
        Self::AlmostFullRows,
        Self::TopmostRow,
        Self::ReachableOffsets,
        Self::AverageHeight,
        Self::FreeDiagonals,
    ];

    /// Number of values this group takes on a board of `size`.
    #[must_use]
    pub const fn value_count(self, size: BoardSize) -> usize {
        match self {
            Self::Cells => size.cell_count(),
            Self::ColumnHeights => size.width,
            Self::Anchor => 2,
            Self::CurrentKind | Self::NextKind => PieceKind::LEN,
            Self::AlmostFullRows => size.width.saturating_sub(1),
            Self::Bumpiness
            | Self::Holes
            | Self::HolesPerAverageHeight
            | Self::MaxHeight
            | Self::HeightSpread
            | Self::BlocksBelowRow
            | Self::TopmostRow
            | Self::ReachableOffsets
            | Self::AverageHeight
            | Self::FreeDiagonals => 1,
        }
    }

    /// Position of this group in the observation vector.
    #[must_use]
    pub fn range(self, size: BoardSize) -> Range<usize> {
        let start = Self::ALL
            .iter()
            .take_while(|group| **group != self)
            .map(|group| group.value_count(size))
            .sum();
        start..start + self.value_count(size)
    }
}

/// Length of the observation vector for a board of `size`.
#[must_use]
pub fn observation_len(size: BoardSize) -> usize {
    FeatureGroup::ALL
        .iter()
        .map(|group| group.value_count(size))
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureExtractor {
    /// First row counted by [`FeatureGroup::BlocksBelowRow`].
    pub blocks_below_row: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            blocks_below_row: 6,
        }
    }
}

impl FeatureExtractor {
    /// Builds the observation vector.
    ///
    /// The result has [`observation_len`] values and depends on nothing but
    /// the arguments.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn observe(&self, board: &Board, current: &Piece, next: &Piece) -> Vec<f32> {
        let size = board.size();
        let mut features = Vec::with_capacity(observation_len(size));

        features.extend(
            board
                .rows()
                .flatten()
                .map(|block| f32::from(u8::from(block.is_occupied()))),
        );

        let heights = board.column_heights();
        features.extend(heights.iter().map(|&h| h as f32));

        let holes = board.count_holes() as f32;
        let average_height = heights.iter().sum::<usize>() as f32 / size.width as f32;
        let max_height = heights.iter().copied().max().unwrap_or(0);
        let min_height = heights.iter().copied().min().unwrap_or(0);
        features.push(board.bumpiness() as f32);
        features.push(holes);
        features.push(if average_height > 0.0 {
            holes / average_height
        } else {
            0.0
        });
        features.push(max_height as f32);
        features.push((max_height - min_height) as f32);
        features.push(board.occupied_cells_from_row(self.blocks_below_row) as f32);

        let anchor = current.position();
        features.push(anchor.x() as f32);
        features.push(anchor.y() as f32);
        features.extend(one_hot(current.kind()));
        features.extend(one_hot(next.kind()));

        features.extend(almost_full_rows(board).into_iter().map(|n| n as f32));
        features.push(board.topmost_occupied_row().unwrap_or(size.height) as f32);
        features.push(reachable_offsets(board, current) as f32);
        features.push(average_height);
        features.push(free_diagonals(board, anchor) as f32);

        debug_assert_eq!(features.len(), observation_len(size));
        features
    }
}

fn one_hot(kind: PieceKind) -> [f32; PieceKind::LEN] {
    let mut encoded = [0.0; PieceKind::LEN];
    encoded[kind.index()] = 1.0;
    encoded
}

fn almost_full_rows(board: &Board) -> Vec<usize> {
    let width = board.width();
    let mut counts = vec![0; width.saturating_sub(1)];
    for y in 0..board.height() {
        let filled = board.row_fill_count(y);
        if filled > 0 && filled < width {
            counts[filled - 1] += 1;
        }
    }
    counts
}

#[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn reachable_offsets(board: &Board, piece: &Piece) -> usize {
    let width = board.width() as i32;
    (-width..width)
        .filter(|&dx| piece.can_move(board, dx, 0))
        .count()
}

fn free_diagonals(board: &Board, anchor: PiecePosition) -> usize {
    let size = board.size();
    [(-1, -1), (-1, 1), (1, -1), (1, 1)]
        .into_iter()
        .filter(|&(dx, dy)| {
            let (Ok(x), Ok(y)) = (
                usize::try_from(anchor.x() + dx),
                usize::try_from(anchor.y() + dy),
            ) else {
                return false;
            };
            size.contains(x, y) && !board.is_occupied(x, y)
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Direction;

    fn group(features: &[f32], group: FeatureGroup) -> &[f32] {
        &features[group.range(BoardSize::default())]
    }

    #[test]
    fn test_observation_len() {
        assert_eq!(observation_len(BoardSize::default()), 245);
        assert_eq!(observation_len(BoardSize::new(6, 12)), 72 + 12 + 25);
        let last = FeatureGroup::FreeDiagonals.range(BoardSize::default());
        assert_eq!(last, 244..245);
    }

    #[test]
    fn test_empty_board_observation() {
        let board = Board::new(BoardSize::default());
        let current = Piece::new(PieceKind::T, board.size());
        let next = Piece::new(PieceKind::O, board.size());
        let features = FeatureExtractor::default().observe(&board, &current, &next);

        assert_eq!(features.len(), 245);
        assert!(group(&features, FeatureGroup::Cells).iter().all(|&v| v == 0.0));
        assert_eq!(group(&features, FeatureGroup::HolesPerAverageHeight), &[0.0]);
        assert_eq!(group(&features, FeatureGroup::Anchor), &[4.0, 0.0]);
        assert_eq!(
            group(&features, FeatureGroup::CurrentKind),
            &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(
            group(&features, FeatureGroup::NextKind),
            &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(group(&features, FeatureGroup::TopmostRow), &[20.0]);
        // T spans columns 3..=5, so it can shift 3 left and 4 right
        assert_eq!(group(&features, FeatureGroup::ReachableOffsets), &[8.0]);
        // the two cells above the anchor are outside the board
        assert_eq!(group(&features, FeatureGroup::FreeDiagonals), &[2.0]);
    }

    #[test]
    fn test_board_features() {
        let board = Board::from_ascii(
            "
            ##........
            #########.
            ",
        );
        let current = Piece::new(PieceKind::I, board.size());
        let next = Piece::new(PieceKind::Z, board.size());
        let features = FeatureExtractor::default().observe(&board, &current, &next);

        assert_eq!(
            group(&features, FeatureGroup::ColumnHeights),
            &[2.0, 2.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0]
        );
        assert_eq!(group(&features, FeatureGroup::Bumpiness), &[2.0]);
        assert_eq!(group(&features, FeatureGroup::Holes), &[0.0]);
        assert_eq!(group(&features, FeatureGroup::MaxHeight), &[2.0]);
        assert_eq!(group(&features, FeatureGroup::HeightSpread), &[2.0]);
        assert_eq!(group(&features, FeatureGroup::BlocksBelowRow), &[11.0]);
        assert_eq!(
            group(&features, FeatureGroup::AlmostFullRows),
            &[0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(group(&features, FeatureGroup::TopmostRow), &[18.0]);
        assert_eq!(group(&features, FeatureGroup::AverageHeight), &[1.1]);
        assert_eq!(group(&features, FeatureGroup::NextKind)[6], 1.0);

        let cells = group(&features, FeatureGroup::Cells);
        assert_eq!(&cells[180..182], &[1.0, 1.0]);
        assert_eq!(
            &cells[190..],
            &[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 0.0]
        );
        assert_eq!(cells.iter().sum::<f32>(), 11.0);
    }

    #[test]
    fn test_holes_ratio() {
        let board = Board::from_ascii(
            "
            ##########
            ..........
            ##########
            ",
        );
        let current = Piece::new(PieceKind::T, board.size());
        let features = FeatureExtractor::default().observe(&board, &current, &current);
        assert_eq!(group(&features, FeatureGroup::Holes), &[10.0]);
        // every column is 3 high
        let ratio = group(&features, FeatureGroup::HolesPerAverageHeight)[0];
        assert!((ratio - 10.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_anchor_follows_pivot() {
        let board = Board::new(BoardSize::default());
        let mut current = Piece::new(PieceKind::L, board.size());
        assert!(current.try_move(&board, Direction::Left));
        assert!(current.try_move(&board, Direction::Down));
        let features = FeatureExtractor::default().observe(&board, &current, &current);
        assert_eq!(group(&features, FeatureGroup::Anchor), &[3.0, 1.0]);
        // (2, 0), (4, 0), (2, 2), (4, 2) are all free
        assert_eq!(group(&features, FeatureGroup::FreeDiagonals), &[4.0]);
    }

    #[test]
    fn test_observe_is_idempotent() {
        let board = Board::from_ascii(
            "
            .T........
            TTT.###...
            ",
        );
        let current = Piece::new(PieceKind::S, board.size());
        let next = Piece::new(PieceKind::J, board.size());
        let extractor = FeatureExtractor::default();
        let first = extractor.observe(&board, &current, &next);
        let second = extractor.observe(&board, &current, &next);
        assert_eq!(first, second);
    }

    #[test]
    fn test_blocks_below_row_threshold() {
        let board = Board::from_ascii(
            "
            #.........
            #.........
            ",
        );
        let current = Piece::new(PieceKind::T, board.size());
        let extractor = FeatureExtractor {
            blocks_below_row: 19,
        };
        let features = extractor.observe(&board, &current, &current);
        assert_eq!(group(&features, FeatureGroup::BlocksBelowRow), &[1.0]);
    }
}
