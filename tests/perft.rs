//! Perft (PERFormance Test) — exhaustive move-generation correctness suite.
//!
//! Each test verifies that the number of leaf nodes at a given depth matches
//! known-correct values for standard positions. If perft is wrong at any
//! depth, there is a bug in move validation, commit, or king-safety checks.
//!
//! A promoting move counts once per piece choice.
//!
//! Reference: <https://www.chessprogramming.org/Perft_Results>

use chess_rules::engine::{Board, Color, Coord, GameEngine, Piece, PieceType};

/// Build a game from the piece-placement field of a FEN record.
///
/// Castling rights follow from unmoved kings and rooks on their home squares.
fn position(placement: &str, turn: Color) -> GameEngine {
    let mut board = Board::empty();
    for (y, row) in placement.split('/').enumerate() {
        let mut x = 0;
        for c in row.chars() {
            if let Some(skip) = c.to_digit(10) {
                x += skip as i32;
                continue;
            }
            let (color, kind) = PieceType::from_char(c).unwrap();
            let at = Coord::new(x, y as i32).unwrap();
            board.place(Piece::new(kind, color), at).unwrap();
            x += 1;
        }
    }
    GameEngine::from_board(board, turn).unwrap()
}

/// Recursive perft: count leaf nodes at `depth`.
fn perft(engine: &GameEngine, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = engine.legal_moves(engine.turn());
    if depth == 1 {
        return moves
            .iter()
            .map(|m| {
                if m.needs_promotion_choice() {
                    PieceType::PROMOTIONS.len() as u64
                } else {
                    1
                }
            })
            .sum();
    }
    let mut nodes = 0u64;
    for plan in moves {
        let choices: Vec<Option<PieceType>> = if plan.needs_promotion_choice() {
            PieceType::PROMOTIONS.iter().copied().map(Some).collect()
        } else {
            vec![None]
        };
        for choice in choices {
            let mut child = engine.clone();
            child.attempt_move(plan.from, plan.to, choice).unwrap();
            nodes += perft(&child, depth - 1);
        }
    }
    nodes
}

// =====================================================================
// Position 1 — Starting position
// =====================================================================

#[test]
fn perft_start_depth_1() {
    assert_eq!(perft(&GameEngine::new(), 1), 20);
}

#[test]
fn perft_start_depth_2() {
    assert_eq!(perft(&GameEngine::new(), 2), 400);
}

#[test]
fn perft_start_depth_3() {
    assert_eq!(perft(&GameEngine::new(), 3), 8_902);
}

#[test]
fn perft_start_matches_placement_parser() {
    let parsed = position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR", Color::White);
    assert_eq!(parsed.board(), GameEngine::new().board());
    assert_eq!(parsed.castling_rights(), GameEngine::new().castling_rights());
}

// =====================================================================
// Position 2 — "Kiwipete" (tricky: castling, pins, promotions)
// =====================================================================

fn kiwipete() -> GameEngine {
    position(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R",
        Color::White,
    )
}

#[test]
fn perft_kiwipete_depth_1() {
    assert_eq!(perft(&kiwipete(), 1), 48);
}

#[test]
fn perft_kiwipete_depth_2() {
    assert_eq!(perft(&kiwipete(), 2), 2_039);
}

// =====================================================================
// Position 3 — rook and pawn endgame (en passant, discovered checks)
// =====================================================================

fn position_3() -> GameEngine {
    position("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8", Color::White)
}

#[test]
fn perft_pos3_depth_1() {
    assert_eq!(perft(&position_3(), 1), 14);
}

#[test]
fn perft_pos3_depth_2() {
    assert_eq!(perft(&position_3(), 2), 191);
}

#[test]
fn perft_pos3_depth_3() {
    assert_eq!(perft(&position_3(), 3), 2_812);
}

// =====================================================================
// Position 4 — promotions and castling under fire
// =====================================================================

fn position_4() -> GameEngine {
    position(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1",
        Color::White,
    )
}

#[test]
fn perft_pos4_depth_1() {
    assert_eq!(perft(&position_4(), 1), 6);
}

#[test]
fn perft_pos4_depth_2() {
    assert_eq!(perft(&position_4(), 2), 264);
}

// =====================================================================
// Position 5
// =====================================================================

fn position_5() -> GameEngine {
    position(
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R",
        Color::White,
    )
}

#[test]
fn perft_pos5_depth_1() {
    assert_eq!(perft(&position_5(), 1), 44);
}

#[test]
fn perft_pos5_depth_2() {
    assert_eq!(perft(&position_5(), 2), 1_486);
}
