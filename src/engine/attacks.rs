//! Pre-computed leaper tables and ray walking for slider geometry.
//!
//! The knight, king and pawn tables are initialised once (via `OnceLock`)
//! and live for the lifetime of the process. Sliders walk their rays against
//! the live board, so blockers are always current.

use std::sync::OnceLock;

use crate::engine::board::Board;
use crate::engine::types::{Coord, SquareSet, Team};

/// Diagonal unit steps.
pub const BISHOP_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// Orthogonal unit steps.
pub const ROOK_DIRS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const KING_STEPS: [(i8, i8); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];

// =========================================================================
// Public API
// =========================================================================

/// Get a reference to the global leaper tables.
pub fn tables() -> &'static AttackTables {
    static TABLES: OnceLock<AttackTables> = OnceLock::new();
    TABLES.get_or_init(AttackTables::init)
}

/// Squares each leaper reaches from every coordinate, on an empty board.
pub struct AttackTables {
    pub knight: [SquareSet; 64],
    pub king: [SquareSet; 64],
    /// `pawn[team][square]`: the two diagonal-forward squares.
    pub pawn: [[SquareSet; 64]; 2],
}

impl AttackTables {
    #[inline]
    pub fn knight_attacks(&self, from: Coord) -> SquareSet {
        self.knight[from.index()]
    }

    #[inline]
    pub fn king_attacks(&self, from: Coord) -> SquareSet {
        self.king[from.index()]
    }

    #[inline]
    pub fn pawn_attacks(&self, team: Team, from: Coord) -> SquareSet {
        self.pawn[team_index(team)][from.index()]
    }

    fn init() -> Self {
        let mut knight = [SquareSet::EMPTY; 64];
        let mut king = [SquareSet::EMPTY; 64];
        let mut pawn = [[SquareSet::EMPTY; 64]; 2];

        for from in Coord::all() {
            knight[from.index()] = leaper_set(from, &KNIGHT_JUMPS);
            king[from.index()] = leaper_set(from, &KING_STEPS);
            for team in [Team::Ally, Team::Opponent] {
                let dy = team.forward();
                pawn[team_index(team)][from.index()] = leaper_set(from, &[(-1, dy), (1, dy)]);
            }
        }

        AttackTables { knight, king, pawn }
    }
}

/// Squares reached by sliding from `from` along each direction, stopping at
/// (and including) the first occupant of either color.
pub fn ray_attacks(board: &Board, from: Coord, dirs: &[(i8, i8)]) -> SquareSet {
    let mut set = SquareSet::EMPTY;
    for &(dx, dy) in dirs {
        let mut cur = from;
        while let Some(next) = cur.offset(dx, dy) {
            set.insert(next);
            if !board.is_empty_at(next) {
                break;
            }
            cur = next;
        }
    }
    set
}

/// Whether every square strictly between `from` and `to` is empty.
///
/// Only meaningful for squares on a shared rank, file or diagonal.
pub fn path_clear(board: &Board, from: Coord, to: Coord) -> bool {
    let dx = (to.x() as i8 - from.x() as i8).signum();
    let dy = (to.y() as i8 - from.y() as i8).signum();
    let mut cur = from;
    while let Some(next) = cur.offset(dx, dy) {
        if next == to {
            return true;
        }
        if !board.is_empty_at(next) {
            return false;
        }
        cur = next;
    }
    // Walked off the board without meeting `to`: not on a shared line.
    false
}

// =========================================================================
// Initialisation helpers
// =========================================================================

#[inline]
fn team_index(team: Team) -> usize {
    match team {
        Team::Ally => 0,
        Team::Opponent => 1,
    }
}

fn leaper_set(from: Coord, deltas: &[(i8, i8)]) -> SquareSet {
    deltas
        .iter()
        .filter_map(|&(dx, dy)| from.offset(dx, dy))
        .collect()
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::{Color, Piece, PieceType};

    fn sq(name: &str) -> Coord {
        Coord::from_algebraic(name).unwrap()
    }

    #[test]
    fn knight_attacks_corner() {
        let set = tables().knight_attacks(sq("a1"));
        assert_eq!(set.len(), 2);
        assert!(set.contains(sq("b3")));
        assert!(set.contains(sq("c2")));
    }

    #[test]
    fn knight_attacks_center() {
        assert_eq!(tables().knight_attacks(sq("d4")).len(), 8);
    }

    #[test]
    fn king_attacks_edge() {
        assert_eq!(tables().king_attacks(sq("a1")).len(), 3);
        assert_eq!(tables().king_attacks(sq("e1")).len(), 5);
        assert_eq!(tables().king_attacks(sq("e4")).len(), 8);
    }

    #[test]
    fn pawn_attacks_point_forward() {
        let white = tables().pawn_attacks(Team::Ally, sq("e4"));
        assert!(white.contains(sq("d5")));
        assert!(white.contains(sq("f5")));
        assert_eq!(white.len(), 2);

        let black = tables().pawn_attacks(Team::Opponent, sq("a5"));
        assert!(black.contains(sq("b4")));
        assert_eq!(black.len(), 1);
    }

    #[test]
    fn rook_rays_stop_at_blockers() {
        let mut board = Board::empty();
        board
            .place(Piece::new(PieceType::Pawn, Color::Black), sq("d6"))
            .unwrap();
        board
            .place(Piece::new(PieceType::Pawn, Color::White), sq("f4"))
            .unwrap();
        let set = ray_attacks(&board, sq("d4"), &ROOK_DIRS);
        assert!(set.contains(sq("d5")));
        assert!(set.contains(sq("d6")));
        assert!(!set.contains(sq("d7")));
        assert!(set.contains(sq("f4")));
        assert!(!set.contains(sq("g4")));
        assert!(set.contains(sq("a4")));
        assert!(set.contains(sq("d1")));
        // two toward d6, three toward d1, three toward a4, two toward f4
        assert_eq!(set.len(), 10);
    }

    #[test]
    fn empty_board_bishop_from_corner() {
        let set = ray_attacks(&Board::empty(), sq("a1"), &BISHOP_DIRS);
        assert_eq!(set.len(), 7);
        assert!(set.contains(sq("h8")));
    }

    #[test]
    fn path_clear_detects_blockers() {
        let board = Board::standard();
        assert!(!path_clear(&board, sq("a1"), sq("a3")));
        assert!(path_clear(&board, sq("a2"), sq("a7")));
        assert!(path_clear(&board, sq("c1"), sq("b2")));
        assert!(!path_clear(&board, sq("c1"), sq("a3")));
    }
}
