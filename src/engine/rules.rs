//! The turn-based rules state machine.
//!
//! `GameEngine` owns the board, turn order, history, castling rights and the
//! last-move lookback. Requests are validated without touching any of that;
//! a committed move is applied to a scratch board which is swapped in only
//! once the whole move (capture, rook hop, promotion) has succeeded.

use tracing::{debug, info};

use crate::engine::board::Board;
use crate::engine::movegen::{self, MovePlan};
use crate::engine::pieces::{self, MoveContext};
use crate::engine::types::{
    CastleSide, CastlingRights, ChessError, Color, Coord, GameStatus, MoveRecord, Piece,
    PieceType, StateError, ValidationError,
};

// =========================================================================
// Outcomes
// =========================================================================

/// What a successful request did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The move is on the board and in the history.
    Committed {
        record: MoveRecord,
        status: GameStatus,
    },
    /// A pawn reached the last rank; nothing is committed until
    /// `resume_promotion` supplies the piece kind.
    PromotionPending { from: Coord, to: Coord },
}

/// Result of a move attempt or promotion resume.
pub type MoveResult = Result<MoveOutcome, ChessError>;

/// A validated promotion waiting for its piece choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingPromotion {
    pawn: Piece,
    plan: MovePlan,
}

impl PendingPromotion {
    /// The pawn, as it stands before the move.
    pub fn pawn(&self) -> &Piece {
        &self.pawn
    }

    pub fn from(&self) -> Coord {
        self.plan.from
    }

    pub fn destination(&self) -> Coord {
        self.plan.to
    }
}

// =========================================================================
// GameEngine
// =========================================================================

#[derive(Clone, Debug)]
pub struct GameEngine {
    board: Board,
    turn: Color,
    history: Vec<MoveRecord>,
    castling: CastlingRights,
    last_move: Option<MoveRecord>,
    pending: Option<PendingPromotion>,
    status: GameStatus,
    /// Pieces taken so far, in capture order.
    captured: Vec<Piece>,
}

impl GameEngine {
    // -----------------------------------------------------------------
    // Constructors
    // -----------------------------------------------------------------

    /// A new game from the standard starting position, white to move.
    pub fn new() -> Self {
        GameEngine {
            board: Board::standard(),
            turn: Color::White,
            history: Vec::new(),
            castling: CastlingRights::ALL,
            last_move: None,
            pending: None,
            status: GameStatus::Ongoing,
            captured: Vec::new(),
        }
    }

    /// A game from a custom position.
    ///
    /// Each side needs exactly one king and the side not to move must not
    /// be in check. Castling rights are granted wherever an unmoved king and
    /// rook stand on their home squares.
    pub fn from_board(board: Board, turn: Color) -> Result<Self, ChessError> {
        for color in [Color::White, Color::Black] {
            match board.count(color, PieceType::King) {
                0 => return Err(ValidationError::MissingKing(color).into()),
                1 => {}
                _ => return Err(ValidationError::ExtraKing(color).into()),
            }
        }
        if pieces::is_in_check(&board, !turn) {
            return Err(ValidationError::IdleSideInCheck(!turn).into());
        }

        let castling = derive_castling_rights(&board)?;
        let mut engine = GameEngine {
            board,
            turn,
            history: Vec::new(),
            castling,
            last_move: None,
            pending: None,
            status: GameStatus::Ongoing,
            captured: Vec::new(),
        };
        engine.status = engine.compute_status();
        Ok(engine)
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Committed moves, oldest first.
    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.last_move.as_ref()
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling
    }

    pub fn pending_promotion(&self) -> Option<&PendingPromotion> {
        self.pending.as_ref()
    }

    /// Pieces taken so far, in capture order.
    pub fn captured_pieces(&self) -> &[Piece] {
        &self.captured
    }

    /// Legal moves for `color` in the current position, as if it were
    /// that side's turn.
    pub fn legal_moves(&self, color: Color) -> Vec<MovePlan> {
        movegen::legal_moves(&self.context(), self.castling, color)
    }

    /// Legal moves of the side-to-move piece on `from`.
    pub fn legal_moves_from(&self, from: Coord) -> Vec<MovePlan> {
        movegen::legal_moves_from(&self.context(), self.castling, self.turn, from)
    }

    fn context(&self) -> MoveContext<'_> {
        MoveContext::new(&self.board, self.last_move.as_ref())
    }

    // -----------------------------------------------------------------
    // Requests
    // -----------------------------------------------------------------

    /// Validate and, if legal, commit `from → to` for the side to move.
    ///
    /// `promotion` is only consulted when the move promotes; leaving it out
    /// for a promoting move suspends the engine until `resume_promotion`.
    pub fn attempt_move(
        &mut self,
        from: Coord,
        to: Coord,
        promotion: Option<PieceType>,
    ) -> MoveResult {
        if let Some(pending) = &self.pending {
            return Err(StateError::PromotionPending(pending.destination()).into());
        }
        if self.status.is_game_over() {
            return Err(StateError::GameOver(self.status).into());
        }
        if let Some(kind) = promotion
            && !kind.is_promotion_choice()
        {
            return Err(ValidationError::InvalidPromotionChoice(kind).into());
        }

        let plan = movegen::plan_move(&self.context(), self.castling, self.turn, from, to)
            .inspect_err(|err| debug!(%from, %to, error = %err, "move rejected"))?;

        if !plan.needs_promotion_choice() {
            return self.commit(plan, None);
        }
        match promotion {
            Some(kind) => self.commit(plan, Some(kind)),
            None => {
                let pawn = *self
                    .board
                    .piece_at(from)
                    .ok_or(ValidationError::EmptySquare(from))?;
                self.pending = Some(PendingPromotion { pawn, plan });
                debug!(%from, %to, "promotion awaiting piece choice");
                Ok(MoveOutcome::PromotionPending { from, to })
            }
        }
    }

    /// Finish a suspended promotion with the chosen piece kind.
    pub fn resume_promotion(&mut self, kind: PieceType) -> MoveResult {
        let pending = self.pending.ok_or(StateError::NoPendingPromotion)?;
        if !kind.is_promotion_choice() {
            return Err(ValidationError::InvalidPromotionChoice(kind).into());
        }
        self.commit(pending.plan, Some(kind))
    }

    // -----------------------------------------------------------------
    // Commit
    // -----------------------------------------------------------------

    fn commit(&mut self, plan: MovePlan, promotion: Option<PieceType>) -> MoveResult {
        let mut scratch = self.board.clone();
        let applied = movegen::apply_plan(&mut scratch, &plan, promotion)?;

        // Nothing below can fail.
        self.board = scratch;

        let record = MoveRecord {
            piece: applied.mover,
            from: plan.from,
            to: plan.to,
            captured: applied.captured,
            kind: plan.kind,
            promoted_to: promotion,
        };

        if let Some(taken) = applied.captured {
            self.captured.push(taken);
        }
        self.castling.revoke_touching(plan.from);
        self.castling.revoke_touching(plan.to);

        self.history.push(record);
        self.last_move = Some(record);
        self.pending = None;
        self.turn = !self.turn;
        self.status = self.compute_status();

        debug!(
            mv = %record,
            kind = record.kind.as_str(),
            ply = self.history.len(),
            "move committed"
        );
        match self.status {
            GameStatus::Ongoing => {}
            status => info!(%status, "game status changed"),
        }

        Ok(MoveOutcome::Committed {
            record,
            status: self.status,
        })
    }

    // -----------------------------------------------------------------
    // Status detection
    // -----------------------------------------------------------------

    fn compute_status(&self) -> GameStatus {
        let in_check = pieces::is_in_check(&self.board, self.turn);
        let can_move = movegen::has_legal_move(&self.context(), self.castling, self.turn);

        match (in_check, can_move) {
            (true, false) => GameStatus::Checkmate(self.turn),
            (false, false) => GameStatus::Stalemate,
            (true, true) => GameStatus::Check(self.turn),
            (false, true) => GameStatus::Ongoing,
        }
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Rights implied by unmoved kings and rooks standing on their home squares.
fn derive_castling_rights(board: &Board) -> Result<CastlingRights, ValidationError> {
    let mut rights = CastlingRights::NONE;
    for color in [Color::White, Color::Black] {
        let row = color.home_row() as i32;
        let unmoved = |x: i32, kind: PieceType| -> Result<bool, ValidationError> {
            Ok(board
                .piece_at(Coord::new(x, row)?)
                .is_some_and(|p| p.kind() == kind && p.color() == color && !p.has_moved()))
        };
        if !unmoved(4, PieceType::King)? {
            continue;
        }
        for side in [CastleSide::Kingside, CastleSide::Queenside] {
            if unmoved(side.rook_file() as i32, PieceType::Rook)? {
                rights.grant(color, side);
            }
        }
    }
    Ok(rights)
}

// =========================================================================
// Tests
// =========================================================================
