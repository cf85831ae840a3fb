//! Move validation, application and legal move generation.
//!
//! Pipeline for a single request:
//!   1. Piece rules (`pieces::check_move`), or the castling checks.
//!   2. Classify the move into a `MovePlan` (special tag, capture square,
//!      rook hop).
//!   3. Apply the plan to a scratch copy of the board and verify the mover's
//!      king is not left attacked.
//!
//! Generation is the same pipeline run for every (piece, square) pair, so a
//! move is generated exactly when a request for it would be accepted.

use crate::engine::attacks;
use crate::engine::board::Board;
use crate::engine::pieces::{self, MoveContext};
use crate::engine::types::{
    CastleSide, CastlingRights, ChessError, Color, Coord, IllegalMove, IllegalMoveReason,
    MoveKind, Piece, PieceType, ValidationError,
};

// =========================================================================
// MovePlan
// =========================================================================

/// A validated move, ready to be applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovePlan {
    pub from: Coord,
    pub to: Coord,
    pub kind: MoveKind,
    /// Square of the piece this move takes (differs from `to` en passant).
    pub capture: Option<Coord>,
    /// Rook hop for castling.
    pub rook: Option<(Coord, Coord)>,
}

impl MovePlan {
    /// Whether a piece kind must be chosen before the move can commit.
    #[inline]
    pub fn needs_promotion_choice(&self) -> bool {
        self.kind == MoveKind::Promotion
    }
}

/// What applying a plan changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    /// The mover after the move (a promoted pawn is flagged captured).
    pub mover: Piece,
    /// The piece taken, flagged captured.
    pub captured: Option<Piece>,
}

// =========================================================================
// Validation
// =========================================================================

/// Validate `from → to` for the side `turn` and classify it.
///
/// Never touches `ctx.board`; king safety is checked on a scratch copy.
pub fn plan_move(
    ctx: &MoveContext<'_>,
    castling: CastlingRights,
    turn: Color,
    from: Coord,
    to: Coord,
) -> Result<MovePlan, ChessError> {
    let illegal = |reason| IllegalMove { from, to, reason };

    let piece = ctx
        .board
        .piece_at(from)
        .ok_or(illegal(IllegalMoveReason::NoPiece))?;
    if piece.color() != turn {
        return Err(illegal(IllegalMoveReason::WrongTurn).into());
    }

    let plan = if piece.kind() == PieceType::King
        && from.y() == to.y()
        && from.x().abs_diff(to.x()) == 2
    {
        plan_castle(ctx, castling, piece, from, to)?
    } else {
        pieces::check_move(piece, from, to, ctx).map_err(illegal)?;
        classify(ctx, piece, from, to)
    };

    ensure_king_safe(ctx.board, &plan, turn)?;
    Ok(plan)
}

fn classify(ctx: &MoveContext<'_>, piece: &Piece, from: Coord, to: Coord) -> MovePlan {
    let mut plan = MovePlan {
        from,
        to,
        kind: MoveKind::Normal,
        capture: ctx.board.piece_at(to).map(|_| to),
        rook: None,
    };

    if piece.kind() != PieceType::Pawn {
        return plan;
    }

    if plan.capture.is_none()
        && let Some(victim) = pieces::en_passant_victim(piece, from, to, ctx)
    {
        plan.kind = MoveKind::EnPassant;
        plan.capture = Some(victim);
    } else if to.y() == piece.team().promotion_row() {
        plan.kind = MoveKind::Promotion;
    } else if from.y().abs_diff(to.y()) == 2 {
        plan.kind = MoveKind::DoublePawnStep;
    }
    plan
}

fn plan_castle(
    ctx: &MoveContext<'_>,
    castling: CastlingRights,
    king: &Piece,
    from: Coord,
    to: Coord,
) -> Result<MovePlan, IllegalMove> {
    let illegal = |reason| IllegalMove { from, to, reason };
    let color = king.color();
    let side = if to.x() > from.x() {
        CastleSide::Kingside
    } else {
        CastleSide::Queenside
    };

    if from.y() != color.home_row() || from.x() != 4 {
        return Err(illegal(IllegalMoveReason::GeometryInvalid));
    }
    if king.has_moved() || !castling.has(color, side) {
        return Err(illegal(IllegalMoveReason::CastlingForfeited));
    }

    let rook_from = from
        .offset(side.rook_file() as i8 - from.x() as i8, 0)
        .ok_or(illegal(IllegalMoveReason::GeometryInvalid))?;
    match ctx.board.piece_at(rook_from) {
        Some(rook)
            if rook.kind() == PieceType::Rook && rook.color() == color && !rook.has_moved() => {}
        _ => return Err(illegal(IllegalMoveReason::CastlingForfeited)),
    }

    if !attacks::path_clear(ctx.board, from, rook_from) {
        return Err(illegal(IllegalMoveReason::PathObstructed));
    }

    let transit = from
        .offset(side.step(), 0)
        .ok_or(illegal(IllegalMoveReason::GeometryInvalid))?;
    for square in [from, transit, to] {
        if pieces::is_square_attacked(ctx.board, square, !color) {
            return Err(illegal(IllegalMoveReason::CastlingPathAttacked));
        }
    }

    Ok(MovePlan {
        from,
        to,
        kind: side.move_kind(),
        capture: None,
        rook: Some((rook_from, transit)),
    })
}

fn ensure_king_safe(board: &Board, plan: &MovePlan, color: Color) -> Result<(), ChessError> {
    let mut scratch = board.clone();
    apply_plan(&mut scratch, plan, None)?;
    if pieces::is_in_check(&scratch, color) {
        return Err(IllegalMove {
            from: plan.from,
            to: plan.to,
            reason: IllegalMoveReason::MovesIntoCheck,
        }
        .into());
    }
    Ok(())
}

// =========================================================================
// Application
// =========================================================================

/// Apply a validated plan to `board`.
///
/// With `promotion = None` a promoting pawn is left standing on the last
/// rank, which is all a king-safety probe needs.
pub fn apply_plan(
    board: &mut Board,
    plan: &MovePlan,
    promotion: Option<PieceType>,
) -> Result<Applied, ValidationError> {
    if let Some(kind) = promotion
        && !kind.is_promotion_choice()
    {
        return Err(ValidationError::InvalidPromotionChoice(kind));
    }

    let captured = plan.capture.and_then(|at| board.remove(at)).map(|mut p| {
        p.mark_captured();
        p
    });

    board.relocate(plan.from, plan.to)?;
    let mut mover = {
        let piece = board
            .piece_at_mut(plan.to)
            .ok_or(ValidationError::EmptySquare(plan.to))?;
        piece.record_move();
        *piece
    };

    if let Some((rook_from, rook_to)) = plan.rook {
        board.relocate(rook_from, rook_to)?;
        if let Some(rook) = board.piece_at_mut(rook_to) {
            rook.record_move();
        }
    }

    if plan.needs_promotion_choice()
        && let Some(kind) = promotion
    {
        board.remove(plan.to);
        mover.mark_captured();
        board.place(Piece::new(kind, mover.color()), plan.to)?;
    }

    Ok(Applied { mover, captured })
}

// =========================================================================
// Generation
// =========================================================================

/// Every legal move for `color`, in board order.
pub fn legal_moves(ctx: &MoveContext<'_>, castling: CastlingRights, color: Color) -> Vec<MovePlan> {
    let mut moves = Vec::with_capacity(64);
    for (from, _) in ctx.board.pieces_of(color) {
        moves.extend(legal_moves_from(ctx, castling, color, from));
    }
    moves
}

/// Legal moves of the `color` piece standing on `from`.
pub fn legal_moves_from(
    ctx: &MoveContext<'_>,
    castling: CastlingRights,
    color: Color,
    from: Coord,
) -> Vec<MovePlan> {
    Coord::all()
        .filter_map(|to| plan_move(ctx, castling, color, from, to).ok())
        .collect()
}

/// Does `color` have at least one legal move?
pub fn has_legal_move(ctx: &MoveContext<'_>, castling: CastlingRights, color: Color) -> bool {
    ctx.board.pieces_of(color).any(|(from, _)| {
        Coord::all().any(|to| plan_move(ctx, castling, color, from, to).is_ok())
    })
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Coord {
        Coord::from_algebraic(name).unwrap()
    }

    fn board_with(pieces: &[(&str, PieceType, Color)]) -> Board {
        let mut board = Board::empty();
        for &(at, kind, color) in pieces {
            board.place(Piece::new(kind, color), sq(at)).unwrap();
        }
        board
    }

    fn reason(result: Result<MovePlan, ChessError>) -> Option<IllegalMoveReason> {
        result.err().and_then(|e| e.illegal_reason())
    }

    #[test]
    fn twenty_moves_from_the_start() {
        let board = Board::standard();
        let ctx = MoveContext::new(&board, None);
        let moves = legal_moves(&ctx, CastlingRights::ALL, Color::White);
        assert_eq!(moves.len(), 20);
        let doubles = moves
            .iter()
            .filter(|m| m.kind == MoveKind::DoublePawnStep)
            .count();
        assert_eq!(doubles, 8);
        assert_eq!(legal_moves(&ctx, CastlingRights::ALL, Color::Black).len(), 20);
    }

    #[test]
    fn plan_rejects_wrong_turn_and_empty_source() {
        let board = Board::standard();
        let ctx = MoveContext::new(&board, None);
        assert_eq!(
            reason(plan_move(&ctx, CastlingRights::ALL, Color::White, sq("e7"), sq("e5"))),
            Some(IllegalMoveReason::WrongTurn)
        );
        assert_eq!(
            reason(plan_move(&ctx, CastlingRights::ALL, Color::White, sq("e4"), sq("e5"))),
            Some(IllegalMoveReason::NoPiece)
        );
    }

    #[test]
    fn pinned_piece_cannot_leave_the_line() {
        let board = board_with(&[
            ("e1", PieceType::King, Color::White),
            ("e2", PieceType::Bishop, Color::White),
            ("e8", PieceType::Rook, Color::Black),
            ("a8", PieceType::King, Color::Black),
        ]);
        let ctx = MoveContext::new(&board, None);
        assert_eq!(
            reason(plan_move(&ctx, CastlingRights::NONE, Color::White, sq("e2"), sq("d3"))),
            Some(IllegalMoveReason::MovesIntoCheck)
        );
        assert!(legal_moves_from(&ctx, CastlingRights::NONE, Color::White, sq("e2")).is_empty());
    }

    #[test]
    fn king_cannot_capture_defended_piece() {
        let board = board_with(&[
            ("e1", PieceType::King, Color::White),
            ("e2", PieceType::Pawn, Color::Black),
            ("e3", PieceType::Pawn, Color::Black),
            ("a8", PieceType::King, Color::Black),
        ]);
        let ctx = MoveContext::new(&board, None);
        // e3 does not guard e2 (pawns guard diagonally), so this is fine.
        assert!(plan_move(&ctx, CastlingRights::NONE, Color::White, sq("e1"), sq("e2")).is_ok());

        let board = board_with(&[
            ("e1", PieceType::King, Color::White),
            ("e2", PieceType::Pawn, Color::Black),
            ("d3", PieceType::Pawn, Color::Black),
            ("a8", PieceType::King, Color::Black),
        ]);
        let ctx = MoveContext::new(&board, None);
        assert_eq!(
            reason(plan_move(&ctx, CastlingRights::NONE, Color::White, sq("e1"), sq("e2"))),
            Some(IllegalMoveReason::MovesIntoCheck)
        );
    }

    #[test]
    fn castling_plans_rook_hop() {
        let board = board_with(&[
            ("e1", PieceType::King, Color::White),
            ("h1", PieceType::Rook, Color::White),
            ("a1", PieceType::Rook, Color::White),
            ("e8", PieceType::King, Color::Black),
        ]);
        let ctx = MoveContext::new(&board, None);
        let plan = plan_move(&ctx, CastlingRights::ALL, Color::White, sq("e1"), sq("g1")).unwrap();
        assert_eq!(plan.kind, MoveKind::CastleKingside);
        assert_eq!(plan.rook, Some((sq("h1"), sq("f1"))));
        let plan = plan_move(&ctx, CastlingRights::ALL, Color::White, sq("e1"), sq("c1")).unwrap();
        assert_eq!(plan.kind, MoveKind::CastleQueenside);
        assert_eq!(plan.rook, Some((sq("a1"), sq("d1"))));

        let mut rights = CastlingRights::ALL;
        rights.revoke(Color::White, CastleSide::Queenside);
        assert_eq!(
            reason(plan_move(&ctx, rights, Color::White, sq("e1"), sq("c1"))),
            Some(IllegalMoveReason::CastlingForfeited)
        );
    }

    #[test]
    fn castling_blocked_or_attacked() {
        let board = board_with(&[
            ("e1", PieceType::King, Color::White),
            ("h1", PieceType::Rook, Color::White),
            ("a1", PieceType::Rook, Color::White),
            ("b1", PieceType::Knight, Color::White),
            ("e8", PieceType::King, Color::Black),
            ("f8", PieceType::Rook, Color::Black),
        ]);
        let ctx = MoveContext::new(&board, None);
        assert_eq!(
            reason(plan_move(&ctx, CastlingRights::ALL, Color::White, sq("e1"), sq("g1"))),
            Some(IllegalMoveReason::CastlingPathAttacked)
        );
        assert_eq!(
            reason(plan_move(&ctx, CastlingRights::ALL, Color::White, sq("e1"), sq("c1"))),
            Some(IllegalMoveReason::PathObstructed)
        );
    }

    #[test]
    fn apply_castle_moves_both_pieces() {
        let mut board = board_with(&[
            ("e8", PieceType::King, Color::Black),
            ("a8", PieceType::Rook, Color::Black),
            ("e1", PieceType::King, Color::White),
        ]);
        let plan = {
            let ctx = MoveContext::new(&board, None);
            plan_move(&ctx, CastlingRights::ALL, Color::Black, sq("e8"), sq("c8")).unwrap()
        };
        let applied = apply_plan(&mut board, &plan, None).unwrap();
        assert_eq!(applied.mover.kind(), PieceType::King);
        assert_eq!(applied.mover.moves_made(), 1);
        assert_eq!(board.piece_at(sq("c8")).unwrap().kind(), PieceType::King);
        assert_eq!(board.piece_at(sq("d8")).unwrap().kind(), PieceType::Rook);
        assert!(board.is_empty_at(sq("a8")));
        assert!(board.is_empty_at(sq("e8")));
    }

    #[test]
    fn apply_promotion_replaces_pawn() {
        let mut board = board_with(&[
            ("b7", PieceType::Pawn, Color::White),
            ("a8", PieceType::Rook, Color::Black),
            ("e1", PieceType::King, Color::White),
            ("h8", PieceType::King, Color::Black),
        ]);
        let plan = {
            let ctx = MoveContext::new(&board, None);
            plan_move(&ctx, CastlingRights::NONE, Color::White, sq("b7"), sq("a8")).unwrap()
        };
        assert_eq!(plan.kind, MoveKind::Promotion);
        assert_eq!(plan.capture, Some(sq("a8")));

        let applied = apply_plan(&mut board, &plan, Some(PieceType::Knight)).unwrap();
        assert!(applied.mover.is_captured());
        assert_eq!(applied.captured.map(|p| p.kind()), Some(PieceType::Rook));
        let knight = board.piece_at(sq("a8")).unwrap();
        assert_eq!((knight.kind(), knight.color()), (PieceType::Knight, Color::White));
        assert_eq!(knight.moves_made(), 0);
    }

    #[test]
    fn apply_refuses_king_promotion() {
        let mut board = board_with(&[
            ("c7", PieceType::Pawn, Color::White),
            ("e1", PieceType::King, Color::White),
            ("h8", PieceType::King, Color::Black),
        ]);
        let plan = MovePlan {
            from: sq("c7"),
            to: sq("c8"),
            kind: MoveKind::Promotion,
            capture: None,
            rook: None,
        };
        assert_eq!(
            apply_plan(&mut board, &plan, Some(PieceType::King)),
            Err(ValidationError::InvalidPromotionChoice(PieceType::King))
        );
    }

    #[test]
    fn no_moves_when_mated() {
        // Back-rank mate: black rook on a1, white king boxed in by its pawns.
        let board = board_with(&[
            ("g1", PieceType::King, Color::White),
            ("f2", PieceType::Pawn, Color::White),
            ("g2", PieceType::Pawn, Color::White),
            ("h2", PieceType::Pawn, Color::White),
            ("a1", PieceType::Rook, Color::Black),
            ("g8", PieceType::King, Color::Black),
        ]);
        let ctx = MoveContext::new(&board, None);
        assert!(!has_legal_move(&ctx, CastlingRights::NONE, Color::White));
        assert!(has_legal_move(&ctx, CastlingRights::NONE, Color::Black));
    }
}
