//! Game orchestrator wrapping `GameEngine`.
//!
//! `ChessGame` is the seam the UI talks to: move intents in, move results,
//! board snapshots and status out. It adds a game id for log correlation and
//! owns nothing else besides the engine.

use std::fmt;

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::engine::board::Board;
use crate::engine::movegen::MovePlan;
use crate::engine::rules::{GameEngine, MoveResult, PendingPromotion};
use crate::engine::types::{
    ChessError, Color, Coord, GameStatus, MoveRecord, Piece, PieceType,
};

// =========================================================================
// BoardSnapshot
// =========================================================================

/// Kind and color of an occupant, for rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PieceView {
    pub kind: PieceType,
    pub color: Color,
}

impl From<&Piece> for PieceView {
    fn from(piece: &Piece) -> Self {
        PieceView {
            kind: piece.kind(),
            color: piece.color(),
        }
    }
}

/// A copy of the board contents, row 0 (rank 8) first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BoardSnapshot {
    pub cells: [[Option<PieceView>; 8]; 8],
    pub turn: Color,
    pub status: GameStatus,
}

impl BoardSnapshot {
    fn capture(board: &Board, turn: Color, status: GameStatus) -> Self {
        let mut cells = [[None; 8]; 8];
        for (at, piece) in board.pieces() {
            cells[at.y() as usize][at.x() as usize] = Some(PieceView::from(piece));
        }
        BoardSnapshot {
            cells,
            turn,
            status,
        }
    }

    pub fn piece_at(&self, at: Coord) -> Option<PieceView> {
        self.cells[at.y() as usize][at.x() as usize]
    }

    /// Render with `glyph` per occupant, rank 8 at the top.
    pub fn render(&self, glyph: impl Fn(PieceView) -> char) -> String {
        let mut s = String::with_capacity(200);
        for (y, row) in self.cells.iter().enumerate() {
            s.push((b'8' - y as u8) as char);
            for cell in row {
                s.push(' ');
                s.push(cell.map_or('.', &glyph));
            }
            s.push('\n');
        }
        s.push_str("  a b c d e f g h");
        s
    }
}

impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(|v| v.kind.to_char(v.color)))
    }
}

// =========================================================================
// ChessGame
// =========================================================================

#[derive(Clone, Debug)]
pub struct ChessGame {
    pub id: String,
    engine: GameEngine,
}

impl ChessGame {
    /// A new game from the standard starting position.
    pub fn new() -> Self {
        Self::with_engine(GameEngine::new())
    }

    /// A game from a custom position (see `GameEngine::from_board`).
    pub fn from_board(board: Board, turn: Color) -> Result<Self, ChessError> {
        Ok(Self::with_engine(GameEngine::from_board(board, turn)?))
    }

    fn with_engine(engine: GameEngine) -> Self {
        let game = ChessGame {
            id: Uuid::new_v4().to_string(),
            engine,
        };
        debug!(game_id = %game.id, status = %game.status(), "game created");
        game
    }

    // -----------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------

    pub fn attempt_move(
        &mut self,
        from: Coord,
        to: Coord,
        promotion: Option<PieceType>,
    ) -> MoveResult {
        let span = tracing::debug_span!("attempt_move", game_id = %self.id);
        let _enter = span.enter();
        self.engine.attempt_move(from, to, promotion)
    }

    pub fn resume_promotion(&mut self, kind: PieceType) -> MoveResult {
        let span = tracing::debug_span!("resume_promotion", game_id = %self.id);
        let _enter = span.enter();
        self.engine.resume_promotion(kind)
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    pub fn current_turn(&self) -> Color {
        self.engine.turn()
    }

    pub fn status(&self) -> GameStatus {
        self.engine.status()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(self.engine.board(), self.engine.turn(), self.engine.status())
    }

    pub fn history(&self) -> &[MoveRecord] {
        self.engine.history()
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.engine.last_move()
    }

    pub fn pending_promotion(&self) -> Option<&PendingPromotion> {
        self.engine.pending_promotion()
    }

    /// Legal moves of the side-to-move piece on `from`.
    pub fn legal_moves_from(&self, from: Coord) -> Vec<MovePlan> {
        self.engine.legal_moves_from(from)
    }

    /// Pieces of `color` taken so far.
    pub fn captured_pieces(&self, color: Color) -> Vec<Piece> {
        self.engine
            .captured_pieces()
            .iter()
            .filter(|p| p.color() == color)
            .copied()
            .collect()
    }

    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }
}

impl Default for ChessGame {
    fn default() -> Self {
        Self::new()
    }
}

// =========================================================================
// Tests
// =========================================================================
