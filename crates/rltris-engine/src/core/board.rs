use serde::{Deserialize, Serialize};

use crate::{InvalidBoardSizeError, OutOfBoundsError};

use super::piece::{Piece, PieceKind};

/// Dimensions of the playfield in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSize {
    pub width: usize,
    pub height: usize,
}

impl Default for BoardSize {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
        }
    }
}

impl BoardSize {
    #[must_use]
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn cell_count(self) -> usize {
        self.width * self.height
    }

    #[must_use]
    pub const fn contains(self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Smallest board a session can be played on.
    ///
    /// Every piece fits at the spawn anchor in any orientation.
    pub const MIN: Self = Self::new(4, 4);

    /// Checks that a session can be played on a board of this size.
    ///
    /// # Errors
    ///
    /// Returns an error if either side is below [`BoardSize::MIN`].
    pub fn validate(self) -> Result<(), InvalidBoardSizeError> {
        if self.width < Self::MIN.width || self.height < Self::MIN.height {
            return Err(InvalidBoardSizeError {
                width: self.width,
                height: self.height,
                min_width: Self::MIN.width,
                min_height: Self::MIN.height,
            });
        }
        Ok(())
    }
}

/// Content of a single board cell.
///
/// The board only cares whether a cell is occupied. The piece kind is kept as
/// an opaque tag so a front-end can pick a color for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Block {
    /// Empty cell.
    #[default]
    Empty,
    /// Occupied cell with no piece identity (fixtures, garbage rows).
    Garbage,
    /// Cell left behind by a locked piece.
    Piece(PieceKind),
}

impl Block {
    #[must_use]
    pub fn is_empty(self) -> bool {
        self == Block::Empty
    }

    #[must_use]
    pub fn is_occupied(self) -> bool {
        !self.is_empty()
    }

    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Block::Empty => '.',
            Block::Garbage => '#',
            Block::Piece(kind) => kind.as_char(),
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '.' => Some(Block::Empty),
            '#' => Some(Block::Garbage),
            _ => match PieceKind::from_char(c) {
                Some(kind) => Some(Block::Piece(kind)),
                None => None,
            },
        }
    }
}

/// The fixed-size grid of locked blocks.
///
/// Row 0 is the top of the field and `x` grows to the right. Every board
/// statistic (heights, holes, bumpiness) is computed from the cells on demand,
/// so the grid is the only state.
///
/// # Example
///
/// ```
/// use rltris_engine::Board;
///
/// let board = Board::from_ascii(
///     "
///     ..#.......
///     .##.......
///     ",
/// );
/// assert_eq!(board.column_height(2), 2);
/// assert_eq!(board.bumpiness(), 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    size: BoardSize,
    cells: Vec<Block>,
}

impl Serialize for Board {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: one string per row, top to bottom (e.g., ["..........", "..TT#....."])
        let rows: Vec<String> = (0..self.size.height)
            .map(|y| self.row(y).iter().map(|b| b.as_char()).collect())
            .collect();
        rows.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Board {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let rows = Vec::<String>::deserialize(deserializer)?;
        let width = rows.first().map_or(0, |row| row.chars().count());
        if width == 0 {
            return Err(serde::de::Error::custom("board must have at least one column"));
        }

        let mut cells = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let count = row.chars().count();
            if count != width {
                return Err(serde::de::Error::custom(format!(
                    "expected {width} cells in row {y}, got {count}"
                )));
            }
            for c in row.chars() {
                let block = Block::from_char(c).ok_or_else(|| {
                    serde::de::Error::custom(format!("invalid cell '{c}' in row {y}"))
                })?;
                cells.push(block);
            }
        }

        Ok(Board {
            size: BoardSize::new(width, rows.len()),
            cells,
        })
    }
}

impl Board {
    /// Creates an empty board.
    ///
    /// # Panics
    ///
    /// Panics if `size` has no cells.
    #[must_use]
    pub fn new(size: BoardSize) -> Self {
        assert!(
            size.width > 0 && size.height > 0,
            "board must have at least one cell, got {}x{}",
            size.width,
            size.height
        );
        Self {
            size,
            cells: vec![Block::Empty; size.cell_count()],
        }
    }

    #[must_use]
    pub fn size(&self) -> BoardSize {
        self.size
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.size.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.size.height
    }

    pub fn cell(&self, x: usize, y: usize) -> Result<Block, OutOfBoundsError> {
        self.index(x, y).map(|i| self.cells[i])
    }

    pub fn set_cell(&mut self, x: usize, y: usize, block: Block) -> Result<(), OutOfBoundsError> {
        let i = self.index(x, y)?;
        self.cells[i] = block;
        Ok(())
    }

    /// Returns whether the cell is occupied.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the board.
    #[must_use]
    pub fn is_occupied(&self, x: usize, y: usize) -> bool {
        assert!(self.size.contains(x, y), "cell ({x}, {y}) is outside the board");
        self.cells[y * self.size.width + x].is_occupied()
    }

    /// Returns the cells of row `y`, left to right.
    #[must_use]
    pub fn row(&self, y: usize) -> &[Block] {
        &self.cells[y * self.size.width..][..self.size.width]
    }

    /// Returns an iterator over the rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Block]> + '_ {
        self.cells.chunks_exact(self.size.width)
    }

    fn index(&self, x: usize, y: usize) -> Result<usize, OutOfBoundsError> {
        if !self.size.contains(x, y) {
            return Err(OutOfBoundsError {
                x,
                y,
                width: self.size.width,
                height: self.size.height,
            });
        }
        Ok(y * self.size.width + x)
    }

    /// Height of column `x`: distance from the bottom of the field to the top
    /// of its highest block, or 0 for an empty column.
    #[must_use]
    pub fn column_height(&self, x: usize) -> usize {
        (0..self.size.height)
            .find(|&y| self.is_occupied(x, y))
            .map_or(0, |y| self.size.height - y)
    }

    #[must_use]
    pub fn column_heights(&self) -> Vec<usize> {
        (0..self.size.width).map(|x| self.column_height(x)).collect()
    }

    /// Sum of absolute height differences between adjacent columns.
    #[must_use]
    pub fn bumpiness(&self) -> usize {
        self.column_heights()
            .windows(2)
            .map(|w| w[0].abs_diff(w[1]))
            .sum()
    }

    /// Counts buried empty cells.
    ///
    /// An empty cell counts only if it has a block somewhere above it, the cell
    /// right below it is occupied, and either that cell is on the floor or the
    /// cell two below is occupied as well. A covered gap with empty space
    /// beneath it does not count.
    #[must_use]
    pub fn count_holes(&self) -> usize {
        let height = self.size.height;
        let mut holes = 0;
        for x in 0..self.size.width {
            let mut covered = false;
            for y in 0..height {
                if self.is_occupied(x, y) {
                    covered = true;
                    continue;
                }
                if !covered || y + 1 >= height || !self.is_occupied(x, y + 1) {
                    continue;
                }
                if y + 1 == height - 1 || (y + 2 < height && self.is_occupied(x, y + 2)) {
                    holes += 1;
                }
            }
        }
        holes
    }

    /// Number of occupied cells in row `y`.
    #[must_use]
    pub fn row_fill_count(&self, y: usize) -> usize {
        self.row(y).iter().filter(|b| b.is_occupied()).count()
    }

    #[must_use]
    pub fn is_row_full(&self, y: usize) -> bool {
        self.row(y).iter().all(|b| b.is_occupied())
    }

    #[must_use]
    pub fn count_full_rows(&self) -> usize {
        (0..self.size.height).filter(|&y| self.is_row_full(y)).count()
    }

    /// Index of the highest row holding at least one block.
    #[must_use]
    pub fn topmost_occupied_row(&self) -> Option<usize> {
        self.rows()
            .position(|row| row.iter().any(|b| b.is_occupied()))
    }

    /// Number of occupied cells in rows `threshold` and below.
    #[must_use]
    pub fn occupied_cells_from_row(&self, threshold: usize) -> usize {
        self.rows()
            .skip(threshold)
            .flatten()
            .filter(|b| b.is_occupied())
            .count()
    }

    /// Writes the cells of a locked piece into the grid.
    ///
    /// # Panics
    ///
    /// Panics if any cell of the piece is outside the board. The session only
    /// locks pieces that are fully inside the field.
    pub fn fill_piece(&mut self, piece: &Piece) {
        let block = Block::Piece(piece.kind());
        for cell in piece.cells() {
            let x = usize::try_from(cell.x()).expect("locked cell must not be left of the board");
            let y = usize::try_from(cell.y()).expect("locked cell must not be above the board");
            self.set_cell(x, y, block)
                .expect("locked cell must be inside the board");
        }
    }

    /// Removes every full row and returns how many were removed.
    ///
    /// Rows above a removed row shift down, keeping their order, and empty rows
    /// appear at the top.
    pub fn sweep_full_rows(&mut self) -> usize {
        let width = self.size.width;
        let mut count = 0;
        for y in (0..self.size.height).rev() {
            if self.is_row_full(y) {
                count += 1;
                continue;
            }
            if count > 0 {
                let src = y * width;
                self.cells.copy_within(src..src + width, src + count * width);
            }
        }
        self.cells[..count * width].fill(Block::Empty);
        count
    }

    /// Creates a 10×20 board from ASCII art for tests and fixtures.
    ///
    /// `.` is an empty cell, `#` a garbage block, and a piece letter a block of
    /// that piece. Leading and trailing whitespace on each line is ignored, and
    /// the last line is the bottom row of the board.
    ///
    /// # Panics
    ///
    /// Panics if a row is not 10 cells wide or there are more than 20 rows.
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let mut board = Self::new(BoardSize::default());
        let lines: Vec<&str> = art
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        assert!(
            lines.len() <= board.height(),
            "at most {} rows allowed, got {}",
            board.height(),
            lines.len()
        );

        let top = board.height() - lines.len();
        for (i, line) in lines.iter().enumerate() {
            let blocks: Vec<Block> = line
                .chars()
                .map(|c| Block::from_char(c).unwrap_or_else(|| panic!("invalid cell '{c}'")))
                .collect();
            assert_eq!(
                blocks.len(),
                board.width(),
                "each row must have exactly {} cells, got {} at row {}",
                board.width(),
                blocks.len(),
                i
            );
            for (x, block) in blocks.into_iter().enumerate() {
                board.cells[(top + i) * board.size.width + x] = block;
            }
        }
        board
    }
}
