use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Color & Team
// ---------------------------------------------------------------------------

/// The two sides in a chess game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Index for array lookups: White=0, Black=1.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The direction-math label for this side.
    #[inline]
    pub const fn team(self) -> Team {
        match self {
            Color::White => Team::Ally,
            Color::Black => Team::Opponent,
        }
    }

    /// Row index of this side's back rank.
    #[inline]
    pub const fn home_row(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Symmetric side label used for direction-dependent math.
///
/// The ally side sits on rows 6–7 and advances toward row 0; the opponent
/// sits on rows 0–1 and advances toward row 7.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Team {
    Ally,
    Opponent,
}

impl Team {
    /// Row delta of one forward step.
    #[inline]
    pub const fn forward(self) -> i8 {
        match self {
            Team::Ally => -1,
            Team::Opponent => 1,
        }
    }

    /// Row a pawn of this team starts on (and may double-step from).
    #[inline]
    pub const fn pawn_start_row(self) -> u8 {
        match self {
            Team::Ally => 6,
            Team::Opponent => 1,
        }
    }

    /// Row a pawn of this team promotes on.
    #[inline]
    pub const fn promotion_row(self) -> u8 {
        match self {
            Team::Ally => 0,
            Team::Opponent => 7,
        }
    }

    /// Row a pawn of this team must stand on to capture en passant.
    #[inline]
    pub const fn en_passant_row(self) -> u8 {
        match self {
            Team::Ally => 3,
            Team::Opponent => 4,
        }
    }
}

// ---------------------------------------------------------------------------
// PieceType
// ---------------------------------------------------------------------------

/// The six piece kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceType {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceType {
    /// All piece types in order.
    pub const ALL: [PieceType; 6] = [
        PieceType::Pawn,
        PieceType::Knight,
        PieceType::Bishop,
        PieceType::Rook,
        PieceType::Queen,
        PieceType::King,
    ];

    /// Kinds a pawn may promote to, in the order a picker offers them.
    pub const PROMOTIONS: [PieceType; 4] = [
        PieceType::Queen,
        PieceType::Rook,
        PieceType::Bishop,
        PieceType::Knight,
    ];

    /// Whether a pawn may promote to this kind.
    #[inline]
    pub fn is_promotion_choice(self) -> bool {
        Self::PROMOTIONS.contains(&self)
    }

    /// Single uppercase letter for white, lowercase for black.
    pub fn to_char(self, color: Color) -> char {
        let c = match self {
            PieceType::Pawn => 'p',
            PieceType::Knight => 'n',
            PieceType::Bishop => 'b',
            PieceType::Rook => 'r',
            PieceType::Queen => 'q',
            PieceType::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parse a piece character; case selects the color.
    pub fn from_char(c: char) -> Option<(Color, PieceType)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => PieceType::Pawn,
            'n' => PieceType::Knight,
            'b' => PieceType::Bishop,
            'r' => PieceType::Rook,
            'q' => PieceType::Queen,
            'k' => PieceType::King,
            _ => return None,
        };
        Some((color, piece))
    }

    /// Unicode chess glyph.
    pub fn glyph(self, color: Color) -> char {
        match (color, self) {
            (Color::White, PieceType::King) => '♔',
            (Color::White, PieceType::Queen) => '♕',
            (Color::White, PieceType::Rook) => '♖',
            (Color::White, PieceType::Bishop) => '♗',
            (Color::White, PieceType::Knight) => '♘',
            (Color::White, PieceType::Pawn) => '♙',
            (Color::Black, PieceType::King) => '♚',
            (Color::Black, PieceType::Queen) => '♛',
            (Color::Black, PieceType::Rook) => '♜',
            (Color::Black, PieceType::Bishop) => '♝',
            (Color::Black, PieceType::Knight) => '♞',
            (Color::Black, PieceType::Pawn) => '♟',
        }
    }
}

impl fmt::Display for PieceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PieceType::Pawn => write!(f, "pawn"),
            PieceType::Knight => write!(f, "knight"),
            PieceType::Bishop => write!(f, "bishop"),
            PieceType::Rook => write!(f, "rook"),
            PieceType::Queen => write!(f, "queen"),
            PieceType::King => write!(f, "king"),
        }
    }
}

// ---------------------------------------------------------------------------
// Coord
// ---------------------------------------------------------------------------

/// A validated board coordinate.
///
/// `x` is the file (0 = a-file), `y` is the row counted from black's back
/// rank: `(0, 0)` is a8 and `(7, 7)` is h1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Coord {
    x: u8,
    y: u8,
}

impl Coord {
    pub const NUM: usize = 64;

    /// Build a coordinate, rejecting anything outside the board.
    pub fn new(x: i32, y: i32) -> Result<Self, ValidationError> {
        if in_bounds(x, y) {
            Ok(Coord {
                x: x as u8,
                y: y as u8,
            })
        } else {
            Err(ValidationError::InvalidCoordinate { x, y })
        }
    }

    /// Coordinate from a dense index (`y * 8 + x`).
    #[inline]
    pub(crate) fn from_index(index: u8) -> Self {
        debug_assert!(index < 64, "coordinate index out of range: {index}");
        Coord {
            x: index & 7,
            y: index >> 3,
        }
    }

    #[inline]
    pub const fn x(self) -> u8 {
        self.x
    }

    #[inline]
    pub const fn y(self) -> u8 {
        self.y
    }

    /// 0-indexed rank as a player reads it (rank 1 = 0, rank 8 = 7).
    #[inline]
    pub const fn rank(self) -> u8 {
        7 - self.y
    }

    /// Dense index (`y * 8 + x`).
    #[inline]
    pub const fn index(self) -> usize {
        (self.y as usize) * 8 + self.x as usize
    }

    /// The coordinate `(dx, dy)` away, if it is still on the board.
    #[inline]
    pub fn offset(self, dx: i8, dy: i8) -> Option<Self> {
        let x = self.x as i32 + dx as i32;
        let y = self.y as i32 + dy as i32;
        Coord::new(x, y).ok()
    }

    /// All 64 coordinates, row by row.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..Self::NUM as u8).map(Coord::from_index)
    }

    /// Parse algebraic notation like "e4".
    pub fn from_algebraic(s: &str) -> Result<Self, ValidationError> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ValidationError::InvalidSquareName(s.to_string()));
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Ok(Coord { x: file, y: 7 - rank })
        } else {
            Err(ValidationError::InvalidSquareName(s.to_string()))
        }
    }

    /// Convert to algebraic notation like "e4".
    pub fn to_algebraic(self) -> String {
        let file = (b'a' + self.x) as char;
        let rank = (b'1' + self.rank()) as char;
        format!("{file}{rank}")
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

/// Whether `(x, y)` lies on the 8×8 board.
#[inline]
pub fn in_bounds(x: i32, y: i32) -> bool {
    (0..8).contains(&x) && (0..8).contains(&y)
}

// ---------------------------------------------------------------------------
// SquareSet
// ---------------------------------------------------------------------------

/// A set of coordinates, one bit per square (bit = `Coord::index`).
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct SquareSet(pub u64);

impl SquareSet {
    pub const EMPTY: SquareSet = SquareSet(0);

    #[inline]
    pub fn from_coord(c: Coord) -> Self {
        SquareSet(1u64 << c.index())
    }

    #[inline]
    pub fn contains(self, c: Coord) -> bool {
        self.0 & (1u64 << c.index()) != 0
    }

    #[inline]
    pub fn insert(&mut self, c: Coord) {
        self.0 |= 1u64 << c.index();
    }

    #[inline]
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over all members as `Coord`s, row by row.
    #[inline]
    pub fn iter(self) -> SquareSetIter {
        SquareSetIter(self)
    }
}

/// Iterator over the members of a `SquareSet`.
pub struct SquareSetIter(SquareSet);

impl Iterator for SquareSetIter {
    type Item = Coord;

    #[inline]
    fn next(&mut self) -> Option<Coord> {
        let bits = (self.0).0;
        if bits == 0 {
            return None;
        }
        let c = Coord::from_index(bits.trailing_zeros() as u8);
        (self.0).0 = bits & (bits - 1);
        Some(c)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let count = self.0.len() as usize;
        (count, Some(count))
    }
}

impl ExactSizeIterator for SquareSetIter {}

impl FromIterator<Coord> for SquareSet {
    fn from_iter<I: IntoIterator<Item = Coord>>(iter: I) -> Self {
        let mut set = SquareSet::EMPTY;
        for c in iter {
            set.insert(c);
        }
        set
    }
}

impl std::ops::BitOr for SquareSet {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        SquareSet(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for SquareSet {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for SquareSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SquareSet(0x{:016x})", self.0)?;
        for y in 0..8u8 {
            write!(f, "  {} ", 8 - y)?;
            for x in 0..8u8 {
                let c = Coord { x, y };
                write!(f, "{}", if self.contains(c) { '1' } else { '.' })?;
                if x < 7 {
                    write!(f, " ")?;
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "    a b c d e f g h")
    }
}

// ---------------------------------------------------------------------------
// Piece
// ---------------------------------------------------------------------------

/// A piece as the board stores it. Its position is owned by the board.
///
/// Mutation (`record_move`, `mark_captured`) is crate-private and only
/// happens while a move is being applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Piece {
    kind: PieceType,
    color: Color,
    #[serde(skip)]
    team: Team,
    moves_made: u32,
    captured: bool,
}

impl Piece {
    /// A fresh, unmoved piece.
    pub fn new(kind: PieceType, color: Color) -> Self {
        Piece {
            kind,
            color,
            team: color.team(),
            moves_made: 0,
            captured: false,
        }
    }

    #[inline]
    pub fn kind(&self) -> PieceType {
        self.kind
    }

    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    #[inline]
    pub fn team(&self) -> Team {
        self.team
    }

    #[inline]
    pub fn moves_made(&self) -> u32 {
        self.moves_made
    }

    #[inline]
    pub fn has_moved(&self) -> bool {
        self.moves_made > 0
    }

    #[inline]
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Letter symbol: uppercase for white, lowercase for black.
    pub fn symbol(&self) -> char {
        self.kind.to_char(self.color)
    }

    pub(crate) fn record_move(&mut self) {
        self.moves_made += 1;
    }

    pub(crate) fn mark_captured(&mut self) {
        self.captured = true;
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.color, self.kind)
    }
}

// ---------------------------------------------------------------------------
// MoveKind & MoveRecord
// ---------------------------------------------------------------------------

/// Special-move tag attached to every history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    Normal,
    DoublePawnStep,
    EnPassant,
    CastleKingside,
    CastleQueenside,
    Promotion,
}

impl MoveKind {
    pub fn as_str(&self) -> &str {
        match self {
            MoveKind::Normal => "normal",
            MoveKind::DoublePawnStep => "double_pawn_step",
            MoveKind::EnPassant => "en_passant",
            MoveKind::CastleKingside => "castle_kingside",
            MoveKind::CastleQueenside => "castle_queenside",
            MoveKind::Promotion => "promotion",
        }
    }
}

/// One committed move in the game history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MoveRecord {
    /// The mover as it was right after the move (a promoted pawn is flagged
    /// captured).
    pub piece: Piece,
    pub from: Coord,
    pub to: Coord,
    /// The piece taken by this move, if any.
    pub captured: Option<Piece>,
    pub kind: MoveKind,
    /// Kind the pawn turned into, for promotions.
    pub promoted_to: Option<PieceType>,
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            MoveKind::CastleKingside => return write!(f, "O-O"),
            MoveKind::CastleQueenside => return write!(f, "O-O-O"),
            _ => {}
        }
        let sep = if self.captured.is_some() { 'x' } else { '-' };
        write!(f, "{}{}{}", self.from, sep, self.to)?;
        if let Some(kind) = self.promoted_to {
            write!(f, "={}", kind.to_char(Color::White))?;
        }
        if self.kind == MoveKind::EnPassant {
            write!(f, " e.p.")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CastlingRights
// ---------------------------------------------------------------------------

/// The two castling directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    /// File of the rook that castles on this side.
    #[inline]
    pub const fn rook_file(self) -> u8 {
        match self {
            CastleSide::Kingside => 7,
            CastleSide::Queenside => 0,
        }
    }

    /// Horizontal direction the king travels.
    #[inline]
    pub const fn step(self) -> i8 {
        match self {
            CastleSide::Kingside => 1,
            CastleSide::Queenside => -1,
        }
    }

    pub const fn move_kind(self) -> MoveKind {
        match self {
            CastleSide::Kingside => MoveKind::CastleKingside,
            CastleSide::Queenside => MoveKind::CastleQueenside,
        }
    }
}

/// Castling availability bitfield: bits 0-3 = WK, WQ, BK, BQ.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights(pub u8);

impl CastlingRights {
    pub const NONE: CastlingRights = CastlingRights(0);
    pub const ALL: CastlingRights = CastlingRights(0b1111);

    #[inline]
    const fn flag(color: Color, side: CastleSide) -> u8 {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => 1,
            (Color::White, CastleSide::Queenside) => 2,
            (Color::Black, CastleSide::Kingside) => 4,
            (Color::Black, CastleSide::Queenside) => 8,
        }
    }

    #[inline]
    pub fn has(self, color: Color, side: CastleSide) -> bool {
        self.0 & Self::flag(color, side) != 0
    }

    #[inline]
    pub fn grant(&mut self, color: Color, side: CastleSide) {
        self.0 |= Self::flag(color, side);
    }

    #[inline]
    pub fn revoke(&mut self, color: Color, side: CastleSide) {
        self.0 &= !Self::flag(color, side);
    }

    /// Drop every right tied to a piece standing on (or leaving) `c`:
    /// a king's home square revokes both sides, a rook corner revokes one.
    pub fn revoke_touching(&mut self, c: Coord) {
        for color in [Color::White, Color::Black] {
            if c.y() != color.home_row() {
                continue;
            }
            match c.x() {
                4 => {
                    self.revoke(color, CastleSide::Kingside);
                    self.revoke(color, CastleSide::Queenside);
                }
                7 => self.revoke(color, CastleSide::Kingside),
                0 => self.revoke(color, CastleSide::Queenside),
                _ => {}
            }
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }
        for (color, side, c) in [
            (Color::White, CastleSide::Kingside, 'K'),
            (Color::White, CastleSide::Queenside, 'Q'),
            (Color::Black, CastleSide::Kingside, 'k'),
            (Color::Black, CastleSide::Queenside, 'q'),
        ] {
            if self.has(color, side) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

/// Status of the side to move after the latest committed move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "color", rename_all = "lowercase")]
pub enum GameStatus {
    Ongoing,
    /// The given side's king is attacked.
    Check(Color),
    /// The given side is mated.
    Checkmate(Color),
    Stalemate,
}

impl GameStatus {
    pub fn as_str(&self) -> &str {
        match self {
            GameStatus::Ongoing => "ongoing",
            GameStatus::Check(_) => "check",
            GameStatus::Checkmate(_) => "checkmate",
            GameStatus::Stalemate => "stalemate",
        }
    }

    pub fn is_game_over(&self) -> bool {
        matches!(self, GameStatus::Checkmate(_) | GameStatus::Stalemate)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Check(c) | GameStatus::Checkmate(c) => {
                write!(f, "{} ({c})", self.as_str())
            }
            _ => write!(f, "{}", self.as_str()),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a well-formed move request was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IllegalMoveReason {
    NoPiece,
    WrongTurn,
    GeometryInvalid,
    PathObstructed,
    OwnPieceCapture,
    MovesIntoCheck,
    CastlingForfeited,
    CastlingPathAttacked,
}

impl IllegalMoveReason {
    pub fn as_str(&self) -> &str {
        match self {
            IllegalMoveReason::NoPiece => "no piece on the source square",
            IllegalMoveReason::WrongTurn => "not this side's turn",
            IllegalMoveReason::GeometryInvalid => "the piece cannot move that way",
            IllegalMoveReason::PathObstructed => "the path is obstructed",
            IllegalMoveReason::OwnPieceCapture => "destination holds an own piece",
            IllegalMoveReason::MovesIntoCheck => "the move leaves the king in check",
            IllegalMoveReason::CastlingForfeited => "castling right forfeited",
            IllegalMoveReason::CastlingPathAttacked => "the king passes through an attacked square",
        }
    }
}

impl fmt::Display for IllegalMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A rule violation. Recoverable: the caller may try another move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("illegal move {from} -> {to}: {reason}")]
pub struct IllegalMove {
    pub from: Coord,
    pub to: Coord,
    pub reason: IllegalMoveReason,
}

/// Malformed input or misuse of board storage.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("coordinate ({x}, {y}) is off the board")]
    InvalidCoordinate { x: i32, y: i32 },

    #[error("invalid square notation: {0}")]
    InvalidSquareName(String),

    #[error("a pawn cannot promote to a {0}")]
    InvalidPromotionChoice(PieceType),

    #[error("square {0} is already occupied")]
    SquareOccupied(Coord),

    #[error("square {0} is empty")]
    EmptySquare(Coord),

    #[error("{0} has no king")]
    MissingKing(Color),

    #[error("{0} has more than one king")]
    ExtraKing(Color),

    #[error("{0} is in check but it is not their turn")]
    IdleSideInCheck(Color),
}

/// A request that does not fit the current engine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("a promotion on {0} is waiting for a piece choice")]
    PromotionPending(Coord),

    #[error("no promotion is pending")]
    NoPendingPromotion,

    #[error("game is already over: {0}")]
    GameOver(GameStatus),
}

/// Domain errors for the rules engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),

    #[error(transparent)]
    State(#[from] StateError),
}

impl ChessError {
    /// The rule that was violated, for `IllegalMove` errors.
    pub fn illegal_reason(&self) -> Option<IllegalMoveReason> {
        match self {
            ChessError::IllegalMove(e) => Some(e.reason),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
