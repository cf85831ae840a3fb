//! Per-piece movement and threat rules.
//!
//! Every piece kind answers two questions, dispatched by an exhaustive
//! `match` on `PieceType`:
//!
//! * `check_move` / `legal_move`: may this piece go from `from` to `to`,
//!   judging geometry, obstruction and occupancy only (king safety and
//!   castling are the engine's job);
//! * `controlled_squares`: which squares does it threaten? For pawns this
//!   differs from where they may move.

use crate::engine::attacks::{self, BISHOP_DIRS, ROOK_DIRS};
use crate::engine::board::Board;
use crate::engine::types::{
    Color, Coord, IllegalMoveReason, MoveKind, MoveRecord, Piece, PieceType, SquareSet,
};

/// Read-only view a piece needs to judge a move.
#[derive(Clone, Copy, Debug)]
pub struct MoveContext<'a> {
    pub board: &'a Board,
    /// The immediately preceding move, for en passant.
    pub last_move: Option<&'a MoveRecord>,
}

impl<'a> MoveContext<'a> {
    pub fn new(board: &'a Board, last_move: Option<&'a MoveRecord>) -> Self {
        MoveContext { board, last_move }
    }
}

// =========================================================================
// Legal-move predicate
// =========================================================================

/// Pure predicate: does `piece` standing on `from` move legally to `to`?
pub fn legal_move(piece: &Piece, from: Coord, to: Coord, ctx: &MoveContext<'_>) -> bool {
    check_move(piece, from, to, ctx).is_ok()
}

/// Like [`legal_move`] but names the rule that fails.
pub fn check_move(
    piece: &Piece,
    from: Coord,
    to: Coord,
    ctx: &MoveContext<'_>,
) -> Result<(), IllegalMoveReason> {
    let dx = to.x() as i8 - from.x() as i8;
    let dy = to.y() as i8 - from.y() as i8;
    let (adx, ady) = (dx.abs(), dy.abs());

    match piece.kind() {
        PieceType::Pawn => return check_pawn(piece, from, to, ctx),
        PieceType::Knight => {
            ensure((adx, ady) == (1, 2) || (adx, ady) == (2, 1))?;
        }
        PieceType::Bishop => {
            ensure(adx == ady && adx > 0)?;
            ensure_path(ctx.board, from, to)?;
        }
        PieceType::Rook => {
            ensure((dx == 0) != (dy == 0))?;
            ensure_path(ctx.board, from, to)?;
        }
        PieceType::Queen => {
            ensure((adx == ady && adx > 0) || ((dx == 0) != (dy == 0)))?;
            ensure_path(ctx.board, from, to)?;
        }
        PieceType::King => {
            ensure(adx <= 1 && ady <= 1 && (adx, ady) != (0, 0))?;
        }
    }

    ensure_not_own(ctx.board, piece.color(), to)
}

fn check_pawn(
    pawn: &Piece,
    from: Coord,
    to: Coord,
    ctx: &MoveContext<'_>,
) -> Result<(), IllegalMoveReason> {
    let team = pawn.team();
    let dir = team.forward();
    let dx = to.x() as i8 - from.x() as i8;
    let dy = to.y() as i8 - from.y() as i8;

    // Forward steps never capture.
    if dx == 0 {
        if dy == dir {
            return if ctx.board.is_empty_at(to) {
                Ok(())
            } else {
                Err(IllegalMoveReason::PathObstructed)
            };
        }
        if dy == 2 * dir && from.y() == team.pawn_start_row() {
            let passed = from.offset(0, dir).ok_or(IllegalMoveReason::GeometryInvalid)?;
            return if ctx.board.is_empty_at(passed) && ctx.board.is_empty_at(to) {
                Ok(())
            } else {
                Err(IllegalMoveReason::PathObstructed)
            };
        }
        return Err(IllegalMoveReason::GeometryInvalid);
    }

    // Diagonal steps must capture.
    if dx.abs() == 1 && dy == dir {
        return match ctx.board.piece_at(to) {
            Some(target) if target.color() == pawn.color() => {
                Err(IllegalMoveReason::OwnPieceCapture)
            }
            Some(_) => Ok(()),
            None if en_passant_victim(pawn, from, to, ctx).is_some() => Ok(()),
            None => Err(IllegalMoveReason::GeometryInvalid),
        };
    }

    Err(IllegalMoveReason::GeometryInvalid)
}

/// If `from → to` is an en-passant capture, the square of the pawn it takes.
///
/// The preceding move must be an opponent pawn's double step that landed
/// beside `from` on the same row; `to` must be the square it passed over.
pub fn en_passant_victim(
    pawn: &Piece,
    from: Coord,
    to: Coord,
    ctx: &MoveContext<'_>,
) -> Option<Coord> {
    if pawn.kind() != PieceType::Pawn {
        return None;
    }
    let last = ctx.last_move?;
    if last.kind != MoveKind::DoublePawnStep || last.piece.color() == pawn.color() {
        return None;
    }

    let dir = pawn.team().forward();
    let beside = last.to.y() == from.y() && last.to.x().abs_diff(from.x()) == 1;
    let on_capture_row = from.y() == pawn.team().en_passant_row();
    let onto_passed_square = to.x() == last.to.x() && to.y() as i8 == from.y() as i8 + dir;

    // The victim must still be standing where it landed.
    let still_there = ctx
        .board
        .piece_at(last.to)
        .is_some_and(|p| p.kind() == PieceType::Pawn && p.color() != pawn.color());

    (beside && on_capture_row && onto_passed_square && still_there).then_some(last.to)
}

#[inline]
fn ensure(cond: bool) -> Result<(), IllegalMoveReason> {
    if cond {
        Ok(())
    } else {
        Err(IllegalMoveReason::GeometryInvalid)
    }
}

#[inline]
fn ensure_path(board: &Board, from: Coord, to: Coord) -> Result<(), IllegalMoveReason> {
    if attacks::path_clear(board, from, to) {
        Ok(())
    } else {
        Err(IllegalMoveReason::PathObstructed)
    }
}

#[inline]
fn ensure_not_own(board: &Board, color: Color, to: Coord) -> Result<(), IllegalMoveReason> {
    match board.piece_at(to) {
        Some(p) if p.color() == color => Err(IllegalMoveReason::OwnPieceCapture),
        _ => Ok(()),
    }
}

// =========================================================================
// Controlled squares
// =========================================================================

/// Squares `piece` on `from` threatens. Sliders include the first blocker of
/// either color, so a defended piece counts as controlled.
pub fn controlled_squares(piece: &Piece, board: &Board, from: Coord) -> SquareSet {
    let t = attacks::tables();
    match piece.kind() {
        PieceType::Pawn => t.pawn_attacks(piece.team(), from),
        PieceType::Knight => t.knight_attacks(from),
        PieceType::Bishop => attacks::ray_attacks(board, from, &BISHOP_DIRS),
        PieceType::Rook => attacks::ray_attacks(board, from, &ROOK_DIRS),
        PieceType::Queen => {
            attacks::ray_attacks(board, from, &BISHOP_DIRS)
                | attacks::ray_attacks(board, from, &ROOK_DIRS)
        }
        PieceType::King => t.king_attacks(from),
    }
}

/// Union of every square controlled by `by`.
pub fn attacked_squares(board: &Board, by: Color) -> SquareSet {
    let mut set = SquareSet::EMPTY;
    for (from, piece) in board.pieces_of(by) {
        set |= controlled_squares(piece, board, from);
    }
    set
}

/// Is `target` controlled by any piece of `by`?
pub fn is_square_attacked(board: &Board, target: Coord, by: Color) -> bool {
    board
        .pieces_of(by)
        .any(|(from, piece)| controlled_squares(piece, board, from).contains(target))
}

/// Is the king of `color` attacked? A board without that king is never in check.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    board
        .king_of(color)
        .is_some_and(|king| is_square_attacked(board, king, !color))
}

// =========================================================================
// Tests
// =========================================================================
