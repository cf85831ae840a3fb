use std::io::{self, BufRead, Write};

use chess_rules::config::{AppConfig, parse_promotion};
use chess_rules::engine::{ChessGame, Coord, GameStatus, MoveOutcome, MoveResult, PieceType};

/// One line of player input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Move {
        from: Coord,
        to: Coord,
        promotion: Option<PieceType>,
    },
    Moves(Coord),
    History,
    Board,
    Help,
    Quit,
    Empty,
}

impl Command {
    fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim();
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Command::Empty);
        };
        match head.to_ascii_lowercase().as_str() {
            "quit" | "exit" => Ok(Command::Quit),
            "board" => Ok(Command::Board),
            "history" => Ok(Command::History),
            "help" | "?" => Ok(Command::Help),
            "moves" => {
                let square = words.next().ok_or("usage: moves <square>")?;
                Coord::from_algebraic(square)
                    .map(Command::Moves)
                    .map_err(|e| e.to_string())
            }
            text => parse_move(text),
        }
    }
}

/// `e2e4`, or `e7e8q` with an inline promotion choice.
fn parse_move(text: &str) -> Result<Command, String> {
    if !text.is_ascii() || !(4..=5).contains(&text.len()) {
        return Err(format!("unrecognised command: {text} (try `help`)"));
    }
    let from = Coord::from_algebraic(&text[0..2]).map_err(|e| e.to_string())?;
    let to = Coord::from_algebraic(&text[2..4]).map_err(|e| e.to_string())?;
    let promotion = match &text[4..] {
        "" => None,
        choice => Some(
            parse_promotion(choice).ok_or_else(|| format!("cannot promote to `{choice}`"))?,
        ),
    };
    Ok(Command::Move {
        from,
        to,
        promotion,
    })
}

fn main() -> io::Result<()> {
    let config = AppConfig::from_env();

    // Initialize tracing (structured logging).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.as_str().into()),
        )
        .with_writer(io::stderr)
        .init();

    let mut game = ChessGame::new();
    tracing::info!(
        game_id = %game.id,
        "chess-rules v{} ready",
        env!("CARGO_PKG_VERSION")
    );

    let mut input = io::stdin().lock().lines();
    print_board(&game, &config);

    loop {
        prompt(&format!("{} to move> ", game.current_turn()))?;
        let Some(line) = input.next() else {
            break;
        };

        let command = match Command::parse(&line?) {
            Ok(command) => command,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };

        match command {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => print_help(),
            Command::Board => print_board(&game, &config),
            Command::History => print_history(&game),
            Command::Moves(from) => {
                let targets: Vec<String> = game
                    .legal_moves_from(from)
                    .iter()
                    .map(|m| m.to.to_algebraic())
                    .collect();
                if targets.is_empty() {
                    println!("no legal moves from {from}");
                } else {
                    println!("{from}: {}", targets.join(" "));
                }
            }
            Command::Move {
                from,
                to,
                promotion,
            } => {
                let mut result = game.attempt_move(from, to, promotion);
                while let Ok(MoveOutcome::PromotionPending { .. }) = result {
                    let choice = match config.auto_promote {
                        Some(kind) => kind,
                        None => match ask_promotion(&mut input)? {
                            Some(kind) => kind,
                            None => return Ok(()),
                        },
                    };
                    result = game.resume_promotion(choice);
                }
                report(&game, &config, result);
            }
        }
    }

    Ok(())
}

fn prompt(text: &str) -> io::Result<()> {
    print!("{text}");
    io::stdout().flush()
}

/// Keep asking until a valid piece is given. `None` on end of input.
fn ask_promotion(
    input: &mut impl Iterator<Item = io::Result<String>>,
) -> io::Result<Option<PieceType>> {
    loop {
        prompt("promote to [q/r/b/n]: ")?;
        let Some(line) = input.next() else {
            return Ok(None);
        };
        match parse_promotion(&line?) {
            Some(kind) => return Ok(Some(kind)),
            None => println!("choose one of q, r, b or n"),
        }
    }
}

fn report(game: &ChessGame, config: &AppConfig, result: MoveResult) {
    match result {
        Ok(MoveOutcome::Committed { record, status }) => {
            println!("{record}");
            print_board(game, config);
            match status {
                GameStatus::Ongoing => {}
                GameStatus::Checkmate(loser) => println!("checkmate, {} wins", !loser),
                status => println!("{status}"),
            }
            if config.snapshot_json {
                match serde_json::to_string(&game.snapshot()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => tracing::warn!(error = %e, "snapshot serialization failed"),
                }
            }
        }
        Ok(MoveOutcome::PromotionPending { to, .. }) => {
            println!("promotion on {to} is waiting for a piece");
        }
        Err(e) => println!("rejected: {e}"),
    }
}

fn print_board(game: &ChessGame, config: &AppConfig) {
    let snapshot = game.snapshot();
    let board = if config.unicode {
        snapshot.render(|v| v.kind.glyph(v.color))
    } else {
        snapshot.to_string()
    };
    println!("{board}");
}

fn print_history(game: &ChessGame) {
    if game.history().is_empty() {
        println!("no moves yet");
        return;
    }
    for (n, pair) in game.history().chunks(2).enumerate() {
        let black = pair.get(1).map(|m| m.to_string()).unwrap_or_default();
        println!("{:>3}. {:<10} {}", n + 1, pair[0].to_string(), black);
    }
}

fn print_help() {
    println!("  e2e4      move a piece");
    println!("  e7e8q     move and promote (q, r, b or n)");
    println!("  moves e2  list legal destinations");
    println!("  history   list moves played");
    println!("  board     show the board");
    println!("  quit      leave");
}
