//! Square-array board storage.
//!
//! `Board` owns the coordinate → piece mapping and nothing else: it never
//! evaluates chess legality. Every mutator refuses to overwrite or lose a
//! piece, so two occupants can never share a coordinate.

use std::fmt;

use crate::engine::types::{Color, Coord, Piece, PieceType, ValidationError, in_bounds};

/// Back-rank layout from the a-file to the h-file.
const BACK_RANK: [PieceType; 8] = [
    PieceType::Rook,
    PieceType::Knight,
    PieceType::Bishop,
    PieceType::Queen,
    PieceType::King,
    PieceType::Bishop,
    PieceType::Knight,
    PieceType::Rook,
];

/// An 8×8 board, indexed `squares[y][x]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// A board with no pieces.
    pub fn empty() -> Self {
        Board {
            squares: [[None; 8]; 8],
        }
    }

    /// The standard starting setup: black on rows 0–1, white on rows 6–7.
    pub fn standard() -> Self {
        let mut board = Board::empty();
        for (x, &kind) in BACK_RANK.iter().enumerate() {
            board.squares[0][x] = Some(Piece::new(kind, Color::Black));
            board.squares[1][x] = Some(Piece::new(PieceType::Pawn, Color::Black));
            board.squares[6][x] = Some(Piece::new(PieceType::Pawn, Color::White));
            board.squares[7][x] = Some(Piece::new(kind, Color::White));
        }
        board
    }

    // -----------------------------------------------------------------------
    // Storage operations
    // -----------------------------------------------------------------------

    /// Whether `(x, y)` lies on the board.
    #[inline]
    pub fn in_bounds(x: i32, y: i32) -> bool {
        in_bounds(x, y)
    }

    /// What piece (if any) stands on `at`?
    #[inline]
    pub fn piece_at(&self, at: Coord) -> Option<&Piece> {
        self.squares[at.y() as usize][at.x() as usize].as_ref()
    }

    #[inline]
    pub fn is_empty_at(&self, at: Coord) -> bool {
        self.piece_at(at).is_none()
    }

    /// Put `piece` on an empty square.
    pub fn place(&mut self, piece: Piece, at: Coord) -> Result<(), ValidationError> {
        let cell = self.cell_mut(at);
        if cell.is_some() {
            return Err(ValidationError::SquareOccupied(at));
        }
        *cell = Some(piece);
        Ok(())
    }

    /// Take the occupant off `at`, if any.
    pub fn remove(&mut self, at: Coord) -> Option<Piece> {
        self.cell_mut(at).take()
    }

    /// Move the occupant of `from` onto the empty square `to`.
    ///
    /// Captures are the caller's job: `to` must already be cleared.
    pub fn relocate(&mut self, from: Coord, to: Coord) -> Result<(), ValidationError> {
        if self.piece_at(from).is_none() {
            return Err(ValidationError::EmptySquare(from));
        }
        if from != to && self.piece_at(to).is_some() {
            return Err(ValidationError::SquareOccupied(to));
        }
        let piece = self.cell_mut(from).take();
        *self.cell_mut(to) = piece;
        Ok(())
    }

    #[inline]
    pub(crate) fn piece_at_mut(&mut self, at: Coord) -> Option<&mut Piece> {
        self.cell_mut(at).as_mut()
    }

    #[inline]
    fn cell_mut(&mut self, at: Coord) -> &mut Option<Piece> {
        &mut self.squares[at.y() as usize][at.x() as usize]
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Every occupant with its coordinate, row by row from a8.
    pub fn pieces(&self) -> impl Iterator<Item = (Coord, &Piece)> + '_ {
        Coord::all().filter_map(move |c| self.piece_at(c).map(|p| (c, p)))
    }

    /// Occupants of one color.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Coord, &Piece)> + '_ {
        self.pieces().filter(move |(_, p)| p.color() == color)
    }

    /// Where the king of `color` stands.
    pub fn king_of(&self, color: Color) -> Option<Coord> {
        self.pieces_of(color)
            .find(|(_, p)| p.kind() == PieceType::King)
            .map(|(c, _)| c)
    }

    /// Number of pieces of a given color and kind.
    pub fn count(&self, color: Color, kind: PieceType) -> usize {
        self.pieces_of(color).filter(|(_, p)| p.kind() == kind).count()
    }

    // -----------------------------------------------------------------------
    // Board display (8×8 text grid)
    // -----------------------------------------------------------------------

    /// Render the board as an 8-line string (rank 8 at top).
    pub fn board_string(&self) -> String {
        self.render(|p| p.symbol())
    }

    /// Render with a caller-chosen glyph per piece.
    pub fn render(&self, glyph: impl Fn(&Piece) -> char) -> String {
        let mut s = String::with_capacity(200);
        for y in 0..8u8 {
            s.push((b'8' - y) as char);
            s.push(' ');
            for x in 0..8u8 {
                let ch = match self.squares[y as usize][x as usize] {
                    Some(ref p) => glyph(p),
                    None => '.',
                };
                s.push(ch);
                if x < 7 {
                    s.push(' ');
                }
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Board:")?;
        write!(f, "{}", self.board_string())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
