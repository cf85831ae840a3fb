pub mod attacks;
pub mod board;
pub mod game;
pub mod movegen;
pub mod pieces;
pub mod rules;
pub mod types;

pub use board::Board;
pub use game::{BoardSnapshot, ChessGame, PieceView};
pub use movegen::MovePlan;
pub use rules::{GameEngine, MoveOutcome, MoveResult, PendingPromotion};
pub use types::*;
