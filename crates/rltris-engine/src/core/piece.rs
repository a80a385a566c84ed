use std::str::FromStr;

use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use crate::ParsePieceKindError;

use super::board::{Board, BoardSize};

/// The falling piece (tetromino): shape, orientation, anchor and landing state.
///
/// A piece never holds a reference to the board it falls on. Every operation
/// that needs collision data takes the [`Board`] explicitly, so any number of
/// sessions can be simulated side by side.
///
/// # Coordinate System
///
/// - `x` grows rightward, `y` grows downward, `(0, 0)` is the top-left cell
/// - `y` may be negative while part of the piece is above the visible field
/// - The anchor is the absolute position of the pivot cell (the first offset,
///   always `(0, 0)`); rotation turns every other cell around it
///
/// # Serialization
///
/// A piece serializes as `"kind#rotation@x,y"`. Role and landing state are
/// not part of the string: a deserialized piece is a current piece that has
/// not landed. [`SessionSnapshot`](crate::SessionSnapshot) restores the roles
/// of its next and held pieces.
///
/// # Example
///
/// ```
/// use rltris_engine::{Board, BoardSize, Direction, Piece, PieceKind};
///
/// let board = Board::new(BoardSize::default());
/// let mut piece = Piece::new(PieceKind::T, board.size());
/// assert!(piece.try_move(&board, Direction::Left));
/// assert!(piece.rotate(&board));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    kind: PieceKind,
    position: PiecePosition,
    rotation: PieceRotation,
    landing: bool,
    role: PieceRole,
}

impl Serialize for Piece {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: "kind#rotation@x,y" (e.g., "T#1@4,-1")
        let s = format!(
            "{}#{}@{},{}",
            self.kind.as_char(),
            self.rotation.0,
            self.position.x,
            self.position.y
        );
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Piece {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let (kind_str, rest) = s.split_once('#').ok_or_else(|| {
            serde::de::Error::custom(format!(
                "missing '#' in format 'kind#rotation@x,y', got '{s}'"
            ))
        })?;
        let kind = kind_str.parse::<PieceKind>().map_err(serde::de::Error::custom)?;

        let (rotation_str, position_str) = rest.split_once('@').ok_or_else(|| {
            serde::de::Error::custom(format!(
                "missing '@' in format 'kind#rotation@x,y', got '{s}'"
            ))
        })?;
        let rotation_num = rotation_str.parse::<u8>().map_err(|e| {
            serde::de::Error::custom(format!("invalid rotation: {rotation_str} ({e})"))
        })?;
        if rotation_num > 3 {
            return Err(serde::de::Error::custom(format!(
                "rotation must be 0-3, got {rotation_num}"
            )));
        }

        let (x_str, y_str) = position_str.split_once(',').ok_or_else(|| {
            serde::de::Error::custom(format!(
                "missing ',' in format 'kind#rotation@x,y', got '{s}'"
            ))
        })?;
        let x = x_str
            .parse::<i32>()
            .map_err(|e| serde::de::Error::custom(format!("invalid x position: {x_str} ({e})")))?;
        let y = y_str
            .parse::<i32>()
            .map_err(|e| serde::de::Error::custom(format!("invalid y position: {y_str} ({e})")))?;

        Ok(Piece {
            kind,
            position: PiecePosition::new(x, y),
            rotation: PieceRotation(rotation_num),
            landing: false,
            role: PieceRole::Current,
        })
    }
}

impl Piece {
    /// Creates a piece of the given kind at the spawn anchor of a board of `size`.
    #[must_use]
    pub fn new(kind: PieceKind, size: BoardSize) -> Self {
        Self {
            kind,
            position: PiecePosition::spawn(size),
            rotation: PieceRotation::default(),
            landing: false,
            role: PieceRole::Current,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn position(&self) -> PiecePosition {
        self.position
    }

    #[must_use]
    pub fn rotation(&self) -> PieceRotation {
        self.rotation
    }

    /// Returns `true` once a downward move has been blocked.
    #[must_use]
    pub fn is_landing(&self) -> bool {
        self.landing
    }

    #[must_use]
    pub fn role(&self) -> PieceRole {
        self.role
    }

    pub fn set_role(&mut self, role: PieceRole) {
        self.role = role;
    }

    #[must_use]
    pub fn is_current(&self) -> bool {
        self.role.is_current()
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.role.is_held()
    }

    /// Returns the cell offsets relative to the anchor in the current orientation.
    #[must_use]
    pub fn offsets(&self) -> [PieceOffset; 4] {
        self.kind.offsets(self.rotation)
    }

    /// Returns the absolute positions of the four cells.
    #[must_use]
    pub fn cells(&self) -> [PiecePosition; 4] {
        self.offsets().map(|offset| self.position.translated(offset))
    }

    /// Returns `true` if the piece translated by `(dx, dy)` would fit on `board`.
    ///
    /// A cell fits when its column is inside the board, its row is above the
    /// floor, and it does not overlap an occupied cell. Cells above the visible
    /// field (negative rows) never collide.
    #[must_use]
    pub fn can_move(&self, board: &Board, dx: i32, dy: i32) -> bool {
        let delta = PieceOffset::new(dx, dy);
        self.cells()
            .into_iter()
            .all(|cell| is_free(board, cell.translated(delta)))
    }

    /// Moves the piece one cell in `direction` if the destination is free.
    ///
    /// A blocked downward move sets the landing flag instead. Locking is left to
    /// the session. Returns whether the piece moved.
    pub fn try_move(&mut self, board: &Board, direction: Direction) -> bool {
        let delta = direction.delta();
        if self.can_move(board, delta.dx, delta.dy) {
            self.position = self.position.translated(delta);
            return true;
        }
        if direction.is_down() {
            self.landing = true;
        }
        false
    }

    /// Turns the piece a quarter turn around its pivot cell.
    ///
    /// There is no wall kick: a rotation that would collide is dropped. The O
    /// piece looks the same in every orientation and is left untouched.
    /// Returns whether the rotation was applied.
    pub fn rotate(&mut self, board: &Board) -> bool {
        if self.kind == PieceKind::O {
            return true;
        }
        let rotated = Self {
            rotation: self.rotation.rotated_right(),
            ..*self
        };
        if !rotated.cells().into_iter().all(|cell| is_free(board, cell)) {
            return false;
        }
        self.rotation = rotated.rotation;
        true
    }

    /// Puts the piece back to its spawn orientation at the spawn anchor.
    pub fn reset_position(&mut self, size: BoardSize) {
        self.position = PiecePosition::spawn(size);
        self.rotation = PieceRotation::default();
        self.landing = false;
    }
}

fn is_free(board: &Board, cell: PiecePosition) -> bool {
    let size = board.size();
    let Ok(x) = usize::try_from(cell.x) else {
        return false;
    };
    if x >= size.width {
        return false;
    }
    match usize::try_from(cell.y) {
        Ok(y) => y < size.height && !board.is_occupied(x, y),
        // above the visible field
        Err(_) => true,
    }
}

/// What part a piece currently plays in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum PieceRole {
    /// The falling piece under control.
    Current,
    /// The preview piece that spawns after the current one locks.
    Next,
    /// Set aside by a hold.
    Held,
}

/// A one-cell step of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Direction {
    Left,
    Right,
    Down,
}

impl Direction {
    #[must_use]
    pub const fn delta(self) -> PieceOffset {
        match self {
            Direction::Left => PieceOffset::new(-1, 0),
            Direction::Right => PieceOffset::new(1, 0),
            Direction::Down => PieceOffset::new(0, 1),
        }
    }
}

/// Absolute position of a cell, or of a piece's pivot cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct PiecePosition {
    x: i32,
    y: i32,
}

impl PiecePosition {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The spawn anchor: one column left of the horizontal center, top row.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub const fn spawn(size: BoardSize) -> Self {
        Self::new((size.width / 2) as i32 - 1, 0)
    }

    #[must_use]
    pub const fn x(self) -> i32 {
        self.x
    }

    #[must_use]
    pub const fn y(self) -> i32 {
        self.y
    }

    #[must_use]
    pub const fn translated(self, offset: PieceOffset) -> Self {
        Self::new(self.x + offset.dx, self.y + offset.dy)
    }
}

/// Position of a cell relative to the pivot cell of its piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceOffset {
    pub dx: i32,
    pub dy: i32,
}

impl PieceOffset {
    #[must_use]
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    /// Quarter turn clockwise on screen (y grows downward).
    #[must_use]
    pub const fn rotated_right(self) -> Self {
        Self::new(-self.dy, self.dx)
    }
}

/// Number of quarter turns applied since spawn, modulo 4.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PieceRotation(u8);

impl PieceRotation {
    #[must_use]
    pub fn rotated_right(self) -> Self {
        PieceRotation((self.0 + 1) % 4)
    }

    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        self.0
    }
}

/// The seven tetromino shapes.
///
/// The discriminant is the shape's slot in one-hot encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    T = 0,
    O = 1,
    J = 2,
    L = 3,
    I = 4,
    S = 5,
    Z = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

impl FromStr for PieceKind {
    type Err = ParsePieceKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c).ok_or(ParsePieceKindError),
            _ => Err(ParsePieceKindError),
        }
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [PieceKind; Self::LEN] = [
        PieceKind::T,
        PieceKind::O,
        PieceKind::J,
        PieceKind::L,
        PieceKind::I,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Slot of this kind in one-hot encodings.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Cell offsets at spawn. The first offset is the pivot.
    #[must_use]
    pub const fn spawn_offsets(self) -> [PieceOffset; 4] {
        SPAWN_OFFSETS[self as usize]
    }

    fn offsets(self, rotation: PieceRotation) -> [PieceOffset; 4] {
        let mut offsets = self.spawn_offsets();
        if self == PieceKind::O {
            return offsets;
        }
        for _ in 0..rotation.0 {
            offsets = offsets.map(PieceOffset::rotated_right);
        }
        offsets
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use rltris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::T => 'T',
            PieceKind::O => 'O',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::I => 'I',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use rltris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('I'), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'T' => Some(PieceKind::T),
            'O' => Some(PieceKind::O),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'I' => Some(PieceKind::I),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            _ => None,
        }
    }
}

const SPAWN_OFFSETS: [[PieceOffset; 4]; PieceKind::LEN] = {
    const fn o(dx: i32, dy: i32) -> PieceOffset {
        PieceOffset::new(dx, dy)
    }
    [
        // T-piece
        [o(0, 0), o(-1, 0), o(1, 0), o(0, -1)],
        // O-piece
        [o(0, 0), o(0, -1), o(1, 0), o(1, -1)],
        // J-piece
        [o(0, 0), o(-1, 0), o(0, -1), o(0, -2)],
        // L-piece
        [o(0, 0), o(1, 0), o(0, -1), o(0, -2)],
        // I-piece
        [o(0, 0), o(0, 1), o(0, -1), o(0, -2)],
        // S-piece
        [o(0, 0), o(-1, 0), o(0, -1), o(1, -1)],
        // Z-piece
        [o(0, 0), o(1, 0), o(0, -1), o(-1, -1)],
    ]
};

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_board() -> Board {
        Board::new(BoardSize::default())
    }

    fn positions(piece: &Piece) -> Vec<(i32, i32)> {
        piece.cells().iter().map(|c| (c.x(), c.y())).collect()
    }

    #[test]
    fn test_spawn_cells() {
        let piece = Piece::new(PieceKind::T, BoardSize::default());
        assert_eq!(piece.position(), PiecePosition::new(4, 0));
        assert_eq!(positions(&piece), vec![(4, 0), (3, 0), (5, 0), (4, -1)]);

        let piece = Piece::new(PieceKind::I, BoardSize::default());
        assert_eq!(positions(&piece), vec![(4, 0), (4, 1), (4, -1), (4, -2)]);
    }

    #[test]
    fn test_pivot_is_first_offset() {
        for kind in PieceKind::ALL {
            assert_eq!(kind.spawn_offsets()[0], PieceOffset::new(0, 0), "{kind:?}");
        }
    }

    #[test]
    fn test_four_rotations_restore_offsets() {
        let board = empty_board();
        for kind in PieceKind::ALL {
            let mut piece = Piece::new(kind, board.size());
            // move into open space so no rotation is blocked
            for _ in 0..8 {
                piece.try_move(&board, Direction::Down);
            }
            let original = piece.offsets();
            for _ in 0..4 {
                assert!(piece.rotate(&board), "{kind:?} rotation blocked");
            }
            assert_eq!(piece.offsets(), original, "{kind:?}");
        }
    }

    #[test]
    fn test_rotation_turns_clockwise_on_screen() {
        let board = empty_board();
        let mut piece = Piece::new(PieceKind::I, board.size());
        for _ in 0..5 {
            piece.try_move(&board, Direction::Down);
        }
        assert!(piece.rotate(&board));
        assert_eq!(
            piece.offsets(),
            [
                PieceOffset::new(0, 0),
                PieceOffset::new(-1, 0),
                PieceOffset::new(1, 0),
                PieceOffset::new(2, 0),
            ]
        );
    }

    #[test]
    fn test_o_piece_never_rotates() {
        let board = empty_board();
        let mut piece = Piece::new(PieceKind::O, board.size());
        let before = piece;
        assert!(piece.rotate(&board));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_blocked_rotation_is_noop() {
        // I-piece standing against the left wall cannot turn horizontal
        let board = empty_board();
        let mut piece = Piece::new(PieceKind::I, board.size());
        for _ in 0..4 {
            piece.try_move(&board, Direction::Down);
        }
        while piece.try_move(&board, Direction::Left) {}
        assert_eq!(piece.position().x(), 0);
        let before = piece;
        assert!(!piece.rotate(&board));
        assert_eq!(piece, before);
    }

    #[test]
    fn test_rotation_above_field_uses_same_rules() {
        // Spawned T-piece has a cell at row -1; turning it keeps cells above
        // the field, which must not count as collisions.
        let board = empty_board();
        let mut piece = Piece::new(PieceKind::T, board.size());
        assert!(piece.rotate(&board));
        assert!(piece.cells().iter().any(|c| c.y() < 0));
    }

    #[test]
    fn test_can_move_respects_walls_and_floor() {
        let board = empty_board();
        let piece = Piece::new(PieceKind::T, board.size());
        assert!(piece.can_move(&board, -3, 0));
        assert!(!piece.can_move(&board, -4, 0));
        assert!(piece.can_move(&board, 4, 0));
        assert!(!piece.can_move(&board, 5, 0));
        assert!(piece.can_move(&board, 0, 19));
        assert!(!piece.can_move(&board, 0, 20));
    }

    #[test]
    fn test_can_move_collides_with_blocks() {
        let board = Board::from_ascii(
            "
            ..........
            ...#......
            ",
        );
        let piece = Piece::new(PieceKind::T, board.size());
        assert!(!piece.can_move(&board, 0, 19));
        assert!(piece.can_move(&board, 2, 19));
    }

    #[test]
    fn test_blocked_down_sets_landing() {
        let board = empty_board();
        let mut piece = Piece::new(PieceKind::O, board.size());
        while piece.try_move(&board, Direction::Down) {}
        assert!(piece.is_landing());
        assert_eq!(piece.position().y(), 19);

        let mut piece = Piece::new(PieceKind::O, board.size());
        while piece.try_move(&board, Direction::Left) {}
        assert!(!piece.is_landing());
    }

    #[test]
    fn test_reset_position() {
        let board = empty_board();
        let mut piece = Piece::new(PieceKind::L, board.size());
        piece.try_move(&board, Direction::Down);
        piece.try_move(&board, Direction::Right);
        piece.rotate(&board);
        piece.reset_position(board.size());
        assert_eq!(piece, Piece::new(PieceKind::L, board.size()));
    }

    #[test]
    fn test_piece_serialization() {
        let board = empty_board();
        let mut piece = Piece::new(PieceKind::S, board.size());
        piece.rotate(&board);

        let serialized = serde_json::to_string(&piece).unwrap();
        assert_eq!(serialized, "\"S#1@4,0\"");

        let deserialized: Piece = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, piece);

        let above: Piece = serde_json::from_str("\"I#0@3,-2\"").unwrap();
        assert_eq!(above.position(), PiecePosition::new(3, -2));
    }

    #[test]
    fn test_deserialized_piece_is_current() {
        let board = empty_board();
        let mut piece = Piece::new(PieceKind::J, board.size());
        piece.set_role(PieceRole::Held);
        while piece.try_move(&board, Direction::Down) {}
        assert!(piece.is_landing());

        let json = serde_json::to_string(&piece).unwrap();
        let deserialized: Piece = serde_json::from_str(&json).unwrap();
        assert!(deserialized.is_current());
        assert!(!deserialized.is_landing());
        assert_eq!(deserialized.position(), piece.position());
    }

    #[test]
    fn test_piece_deserialization_error_cases() {
        assert!(serde_json::from_str::<Piece>("\"S1@4,18\"").is_err());
        assert!(serde_json::from_str::<Piece>("\"S#1#4,18\"").is_err());
        assert!(serde_json::from_str::<Piece>("\"S#1@4\"").is_err());
        assert!(serde_json::from_str::<Piece>("\"X#1@4,18\"").is_err());
        assert!(serde_json::from_str::<Piece>("\"SS#1@4,18\"").is_err());
        assert!(serde_json::from_str::<Piece>("\"S#4@4,18\"").is_err());
        assert!(serde_json::from_str::<Piece>("\"S#1@abc,18\"").is_err());
    }

    #[test]
    fn test_piece_kind_char_conversion() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_char(kind.as_char()), Some(kind));
            assert_eq!(kind.as_char().to_string().parse::<PieceKind>(), Ok(kind));
        }
        assert_eq!(PieceKind::from_char('x'), None);
        assert!("".parse::<PieceKind>().is_err());
    }

    #[test]
    fn test_piece_kind_index_order() {
        let indices: Vec<_> = PieceKind::ALL.iter().map(|k| k.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(PieceKind::I.index(), 4);
    }
}
