/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};
use chessie::{Color, Game, Move, PieceKind, Square};

use crate::Rules;

/// Number of half-moves without a capture or pawn push after which the game is drawn.
const FIFTY_MOVE_PLIES: usize = 100;

/// Number of times a position must occur for the game to be drawn by repetition.
const REPETITION_LIMIT: usize = 3;

/// A game of chess that can be walked forwards and backwards.
///
/// Wraps a [`Game`] with the history needed to undo moves, and to detect draws by repetition.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    /// The current state of the game.
    game: Game,

    /// Every state this game has been in, paired with the move that was played from it.
    ///
    /// The last entry is the state that [`Rules::undo_move`] will restore.
    history: Vec<(Game, Move)>,
}

impl Position {
    /// Creates a new [`Position`] with no history from the provided [`Game`].
    #[inline(always)]
    pub fn new(game: Game) -> Self {
        Self {
            game,
            history: Vec::new(),
        }
    }

    /// Creates a new [`Position`] from the provided FEN string.
    #[inline(always)]
    pub fn from_fen(fen: &str) -> Result<Self> {
        let game = Game::from_fen(fen).with_context(|| format!("Invalid FEN {fen:?}"))?;
        Ok(Self::new(game))
    }

    /// Fetch the current state of the underlying [`Game`].
    #[inline(always)]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Generates a FEN string for the current state.
    #[inline(always)]
    pub fn to_fen(&self) -> String {
        self.game.to_fen()
    }

    /// Number of moves that can currently be undone.
    #[inline(always)]
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    /// The most recently applied move, if any.
    #[inline(always)]
    pub fn last_move(&self) -> Option<Move> {
        self.history.last().map(|&(_, mv)| mv)
    }

    /// Returns `true` if the side-to-move is in check.
    #[inline(always)]
    pub fn is_in_check(&self) -> bool {
        self.game.is_in_check()
    }

    /// Legal moves for the piece on `square`.
    ///
    /// Only pieces belonging to the side-to-move have moves; any other square yields nothing.
    pub fn legal_moves_from(&self, square: Square) -> Vec<Move> {
        match self.game.piece_at(square) {
            Some(piece) if piece.color() == self.game.side_to_move() => self
                .game
                .get_legal_moves_from(square.into())
                .into_iter()
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Returns a copy of this position with the other side to move, and no history.
    ///
    /// This is the "null move" view used to look at the opponent's options.
    /// Any en passant square is cleared, since it only ever belongs to the side that was to move.
    pub fn flipped(&self) -> Self {
        let mut game = self.game;

        if game.ep_square().is_some() {
            let fen = game.to_fen();
            let mut fields = fen.split_ascii_whitespace().collect::<Vec<_>>();
            if let Some(ep) = fields.get_mut(3) {
                *ep = "-";
            }

            // The FEN was just generated from a valid game, so this cannot fail
            game = Game::from_fen(&fields.join(" ")).unwrap_or(game);
        }

        game.toggle_side_to_move();
        Self::new(game)
    }

    /// Parses `uci` as a move in the current position and applies it.
    ///
    /// Returns the applied move, or an error if it could not be parsed or is not legal.
    pub fn apply_uci(&mut self, uci: &str) -> Result<Move> {
        let mv = Move::from_uci(&self.game, uci)
            .with_context(|| format!("Failed to parse {uci:?} as a move"))?;

        self.apply_move(mv)
            .with_context(|| format!("Cannot play {uci:?} in {:?}", self.to_fen()))?;

        Ok(mv)
    }

    /// Number of times the current position has occurred in this game, including now.
    ///
    /// Two positions are the same if they share piece layout, side-to-move, castling rights, and en passant square.
    pub fn repetitions(&self) -> usize {
        let key = self.game.key();
        1 + self
            .history
            .iter()
            .filter(|(prev, _)| prev.key() == key)
            .count()
    }

    /// Returns `true` if neither side has enough material left to deliver checkmate.
    ///
    /// That is: lone Kings, a single minor piece, or only Bishops that all stand on the same square color.
    pub fn is_insufficient_material(&self) -> bool {
        let mut knights = 0;
        let mut bishop_square_colors = [0; 2];

        for (square, piece) in self.game.board() {
            match piece.kind() {
                PieceKind::King => {}
                PieceKind::Knight => knights += 1,
                PieceKind::Bishop => {
                    let parity = (square.file().index() + square.rank().index()) % 2;
                    bishop_square_colors[parity] += 1;
                }
                // Pawns, Rooks, and Queens can always mate
                _ => return false,
            }
        }

        let bishops = bishop_square_colors[0] + bishop_square_colors[1];
        match (knights, bishops) {
            (0, 0) | (1, 0) | (0, 1) => true,
            (0, _) => bishop_square_colors[0] == 0 || bishop_square_colors[1] == 0,
            _ => false,
        }
    }

    /// Returns the reason this game is drawn, if it is.
    ///
    /// A checkmate is never a draw, even if another draw condition also holds.
    pub fn draw_reason(&self) -> Option<DrawReason> {
        let no_moves = self.game.get_legal_moves().is_empty();

        if no_moves {
            return if self.is_in_check() {
                None
            } else {
                Some(DrawReason::Stalemate)
            };
        }

        if self.game.halfmove() as usize >= FIFTY_MOVE_PLIES {
            Some(DrawReason::FiftyMoves)
        } else if self.is_insufficient_material() {
            Some(DrawReason::InsufficientMaterial)
        } else if self.repetitions() >= REPETITION_LIMIT {
            Some(DrawReason::Repetition)
        } else {
            None
        }
    }

    /// Summarizes the state of the game.
    pub fn status(&self) -> GameStatus {
        let stm = self.game.side_to_move();

        if self.is_checkmate() {
            GameStatus::Checkmate {
                winner: stm.opponent(),
            }
        } else if let Some(reason) = self.draw_reason() {
            GameStatus::Draw(reason)
        } else {
            GameStatus::Ongoing {
                side_to_move: stm,
                in_check: self.is_in_check(),
            }
        }
    }
}

impl Rules for Position {
    type Move = Move;

    #[inline(always)]
    fn legal_moves(&self) -> Vec<Move> {
        self.game.get_legal_moves().into_iter().collect()
    }

    fn apply_move(&mut self, mv: Move) -> Result<()> {
        if !self.game.get_legal_moves().into_iter().any(|legal| legal == mv) {
            bail!("{mv} is not a legal move");
        }

        self.history.push((self.game, mv));
        self.game.make_move(mv);
        Ok(())
    }

    #[inline(always)]
    fn undo_move(&mut self) -> Option<Move> {
        let (game, mv) = self.history.pop()?;
        self.game = game;
        Some(mv)
    }

    #[inline(always)]
    fn is_checkmate(&self) -> bool {
        self.is_in_check() && self.game.get_legal_moves().is_empty()
    }

    #[inline(always)]
    fn is_draw(&self) -> bool {
        self.draw_reason().is_some()
    }

    #[inline(always)]
    fn side_to_move(&self) -> Color {
        self.game.side_to_move()
    }
}

impl Default for Position {
    /// The standard starting position.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Game::default())
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl fmt::Display for Position {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.game)
    }
}

/// Rules under which a game ends in a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawReason {
    Stalemate,
    Repetition,
    InsufficientMaterial,
    FiftyMoves,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Stalemate => "stalemate",
            Self::Repetition => "threefold repetition",
            Self::InsufficientMaterial => "insufficient material",
            Self::FiftyMoves => "fifty-move rule",
        };
        write!(f, "{reason}")
    }
}

/// The state of a game, as shown to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameStatus {
    Ongoing { side_to_move: Color, in_check: bool },
    Checkmate { winner: Color },
    Draw(DrawReason),
}

impl GameStatus {
    /// Returns `true` if no more moves can be played.
    #[inline(always)]
    pub const fn is_game_over(&self) -> bool {
        !matches!(self, Self::Ongoing { .. })
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ongoing {
                side_to_move,
                in_check,
            } => {
                let name = display_name(*side_to_move);
                write!(f, "{name} to move")?;
                if *in_check {
                    write!(f, ", {name} is in check")?;
                }
                Ok(())
            }
            Self::Checkmate { winner } => write!(
                f,
                "Game over, {} is in checkmate",
                display_name(winner.opponent())
            ),
            Self::Draw(reason) => write!(f, "Game over, drawn position ({reason})"),
        }
    }
}

/// Capitalized name of `color`, for messages shown to a player.
#[inline(always)]
const fn display_name(color: Color) -> &'static str {
    match color {
        Color::White => "White",
        Color::Black => "Black",
    }
}
