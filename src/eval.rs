/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use chessie::{Color, File, Piece, PieceKind, Rank, Square};

use crate::{piece_square_tables, GameStatus, PieceSquareTables, Position, Rules, Score};

/// Bonus for each side a King may still castle to.
const CASTLING_RIGHT: i32 = 20;

/// Penalty when a single enemy piece stands next to the King.
const MINOR_THREAT: i32 = 100;

/// Penalty when several enemy pieces stand next to the King.
const MAJOR_THREAT: i32 = 500;

/// Returns the material value of the provided `PieceKind`.
///
/// Values are obtained from here: <https://www.chessprogramming.org/Simplified_Evaluation_Function>
#[inline(always)]
pub const fn value_of(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 100,
        PieceKind::Knight => 320,
        PieceKind::Bishop => 330,
        PieceKind::Rook => 500,
        PieceKind::Queen => 900,
        // Both sides always have exactly one King, so this always cancels out
        PieceKind::King => 20_000,
    }
}

/// Anything that can statically score a state of some [`Rules`].
///
/// Scores are always from White's perspective: positive is good for White, negative is good for Black.
pub trait Evaluate<R: Rules> {
    fn evaluate(&self, rules: &R) -> Score;
}

/// Which terms are summed into an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvalConfig {
    /// Material balance.
    pub material: bool,

    /// Piece-Square Table bonuses.
    pub positional: bool,

    /// Difference in the number of legal moves available to each side.
    pub mobility: bool,

    /// Castling rights and King placement.
    pub king_safety: bool,

    /// Enemy pieces adjacent to each King.
    pub threat_detection: bool,
}

impl EvalConfig {
    /// A config with every term disabled. Only checkmates and draws are scored.
    pub const NONE: Self = Self {
        material: false,
        positional: false,
        mobility: false,
        king_safety: false,
        threat_detection: false,
    };

    /// A config with every term enabled.
    pub const ALL: Self = Self {
        material: true,
        positional: true,
        mobility: true,
        king_safety: true,
        threat_detection: true,
    };
}

impl Default for EvalConfig {
    /// Material, placement, and mobility are on. King safety and threat detection are off.
    #[inline(always)]
    fn default() -> Self {
        Self {
            material: true,
            positional: true,
            mobility: true,
            king_safety: false,
            threat_detection: false,
        }
    }
}

/// Every term of an evaluation, kept separate.
///
/// All values are White-relative. Disabled terms are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EvalBreakdown {
    pub material: Score,
    pub positional: Score,
    pub mobility: Score,
    pub king_safety: Score,
    pub threats: Score,

    /// Set if the game is over, in which case it replaces every other term.
    pub terminal: Option<Score>,
}

impl EvalBreakdown {
    /// Sums all terms into the final score.
    #[inline(always)]
    pub fn total(&self) -> Score {
        self.terminal.unwrap_or(
            self.material + self.positional + self.mobility + self.king_safety + self.threats,
        )
    }
}

impl Default for EvalBreakdown {
    #[inline(always)]
    fn default() -> Self {
        Self {
            material: Score::DRAW,
            positional: Score::DRAW,
            mobility: Score::DRAW,
            king_safety: Score::DRAW,
            threats: Score::DRAW,
            terminal: None,
        }
    }
}

/// Encapsulates the logic of scoring a chess position.
///
/// A high score is good for White, and a low score is good for Black, regardless of whose turn it is.
/// Searches are responsible for viewing the score from the side-to-move's perspective.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    /// Terms to include.
    config: EvalConfig,

    /// Positional bonuses for each piece.
    tables: &'static PieceSquareTables,
}

impl Evaluator {
    /// Construct a new [`Evaluator`] that sums the terms enabled in `config`.
    #[inline(always)]
    pub fn new(config: EvalConfig) -> Self {
        Self {
            config,
            tables: piece_square_tables(),
        }
    }

    /// The terms this evaluator includes.
    #[inline(always)]
    pub const fn config(&self) -> EvalConfig {
        self.config
    }

    /// Evaluate `position` from White's perspective.
    #[inline(always)]
    pub fn evaluate(&self, position: &Position) -> Score {
        self.breakdown(position).total()
    }

    /// Evaluate `position`, keeping each term separate.
    pub fn breakdown(&self, position: &Position) -> EvalBreakdown {
        let mut breakdown = EvalBreakdown::default();

        // Game-ending states override everything else
        match position.status() {
            GameStatus::Checkmate { winner } => {
                breakdown.terminal = Some(Score::MATE * sign(winner));
                return breakdown;
            }
            GameStatus::Draw(_) => {
                breakdown.terminal = Some(Score::DRAW);
                return breakdown;
            }
            GameStatus::Ongoing { .. } => {}
        }

        let config = self.config;
        let stm = position.side_to_move();

        // Moves of the side not on move can only be generated with the other side to move
        let flipped = config.mobility.then(|| position.flipped());

        for (square, piece) in position.game().board() {
            let multiplier = sign(piece.color());

            if config.material {
                breakdown.material += value_of(piece.kind()) * multiplier;
            }

            if config.positional {
                breakdown.positional += self.tables.get(piece, square) * multiplier;
            }

            if let Some(flipped) = &flipped {
                let view = if piece.color() == stm {
                    position
                } else {
                    flipped
                };
                breakdown.mobility += view.legal_moves_from(square).len() as i32 * multiplier;
            }
        }

        if config.king_safety {
            breakdown.king_safety = Score(self.king_safety(position));
        }

        if config.threat_detection {
            breakdown.threats = Score(threats(position));
        }

        breakdown
    }

    /// Returns a printable breakdown of how each piece contributes to the evaluation of `position`.
    #[inline(always)]
    pub fn display<'a>(&'a self, position: &'a Position) -> EvalDisplay<'a> {
        EvalDisplay {
            evaluator: self,
            position,
        }
    }

    /// Rewards each side for the castling rights it keeps and where its King stands, White minus Black.
    fn king_safety(&self, position: &Position) -> i32 {
        let kings = king_squares(position);
        let rights = position.game().castling_rights_uci();

        [Color::White, Color::Black]
            .into_iter()
            .map(|color| {
                let king = Piece::new(color, PieceKind::King);

                // Rights are listed as `KQkq`, with White's in uppercase
                let castling = rights
                    .chars()
                    .filter(|c| c.is_ascii_uppercase() == color.is_white() && *c != '-')
                    .count() as i32;

                let placement = kings[color.index()]
                    .map(|square| self.tables.get(king, square))
                    .unwrap_or_default();

                (castling * CASTLING_RIGHT + placement) * sign(color)
            })
            .sum()
    }

    /// Fetches the static value of the piece on the specified square, if one exists.
    ///
    /// Only used when printing the evaluator
    #[inline(always)]
    fn value_at(&self, position: &Position, square: Square) -> Option<Score> {
        position.game().piece_at(square).map(|piece| {
            let mut value = 0;
            if self.config.material {
                value += value_of(piece.kind());
            }
            if self.config.positional {
                value += self.tables.get(piece, square);
            }
            Score(value * sign(piece.color()))
        })
    }
}

impl Default for Evaluator {
    #[inline(always)]
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

impl Evaluate<Position> for Evaluator {
    #[inline(always)]
    fn evaluate(&self, position: &Position) -> Score {
        Evaluator::evaluate(self, position)
    }
}

/// Displays a board annotated with every piece's contribution to the score.
pub struct EvalDisplay<'a> {
    evaluator: &'a Evaluator,
    position: &'a Position,
}

impl fmt::Display for EvalDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ranks = Rank::iter().rev();

        write!(f, "  +")?;
        for _ in File::iter() {
            write!(f, "-------+")?;
        }
        writeln!(f)?;
        for rank in ranks {
            write!(f, "{rank} |")?;

            // Step 1: Write the piece char
            for file in File::iter() {
                let square = Square::new(file, rank);
                let piece = self.position.game().piece_at(square);
                let piece_char = piece.map(|p| p.char()).unwrap_or(' ');
                write!(f, "   {piece_char}   |")?;
            }
            writeln!(f)?;
            write!(f, "  |")?;

            // Step 2: Write the contribution of that piece
            for file in File::iter() {
                let square = Square::new(file, rank);
                let score = if let Some(val) = self.evaluator.value_at(self.position, square) {
                    let s = if val > Score::DRAW {
                        format!("+{}", val.normalize())
                    } else {
                        format!("{}", val.normalize())
                    };

                    format!("{s:^7}")
                } else {
                    String::from("       ")
                };
                write!(f, "{score}|")?;
            }

            writeln!(f)?;

            write!(f, "  +")?;
            for _ in File::iter() {
                write!(f, "-------+")?;
            }
            writeln!(f)?;
        }
        for file in File::iter() {
            write!(f, "       {file}")?;
        }

        let breakdown = self.evaluator.breakdown(self.position);
        let score = breakdown.total();

        writeln!(f, "\n")?;
        if breakdown.terminal.is_some() {
            writeln!(f, "Game over: {}", self.position.status())?;
        } else {
            writeln!(f, "Material:    {}", breakdown.material)?;
            writeln!(f, "Positional:  {}", breakdown.positional)?;
            writeln!(f, "Mobility:    {}", breakdown.mobility)?;
            writeln!(f, "King safety: {}", breakdown.king_safety)?;
            writeln!(f, "Threats:     {}", breakdown.threats)?;
        }

        let winning_side = if score > Score::DRAW {
            "White"
        } else if score < Score::DRAW {
            "Black"
        } else {
            "N/A"
        };
        writeln!(f, "Winning side: {winning_side}")?;
        write!(f, "Score: {score}")
    }
}

/// `1` for White and `-1` for Black.
#[inline(always)]
fn sign(color: Color) -> i32 {
    color.negation_multiplier() as i32
}

/// Finds the King of each color, indexed by [`Color::index`].
#[inline(always)]
fn king_squares(position: &Position) -> [Option<Square>; Color::COUNT] {
    let mut kings = [None; Color::COUNT];
    for (square, piece) in position.game().board() {
        if piece.kind() == PieceKind::King {
            kings[piece.color().index()] = Some(square);
        }
    }
    kings
}

/// Signed file and rank distance from `from` to `to`, with ranks counted towards `color`'s opponent.
#[inline(always)]
fn relative_offset(from: Square, to: Square, color: Color) -> (i32, i32) {
    let files = to.file().index() as i32 - from.file().index() as i32;
    let ranks = to.rank().index() as i32 - from.rank().index() as i32;
    (files, ranks * sign(color))
}

/// Penalizes enemy pieces crowding each King, White minus Black.
fn threats(position: &Position) -> i32 {
    let kings = king_squares(position);
    let mut attackers = [0; Color::COUNT];

    for (square, piece) in position.game().board() {
        // The King at risk is the one *not* of this piece's color
        let defender = piece.color().opponent();
        let Some(king) = kings[defender.index()] else {
            continue;
        };

        if let (-1..=1, -1..=1) = relative_offset(king, square, defender) {
            attackers[defender.index()] += 1;
        }
    }

    [Color::White, Color::Black]
        .into_iter()
        .map(|color| {
            let penalty = match attackers[color.index()] {
                0 => 0,
                1 => MINOR_THREAT,
                _ => MAJOR_THREAT,
            };
            -penalty * sign(color)
        })
        .sum()
}

/// Finds the [`Piece`] whose FEN character is `c`, such as `N` for a White Knight.
#[inline(always)]
pub fn piece_from_char(c: char) -> Option<Piece> {
    [Color::White, Color::Black]
        .into_iter()
        .flat_map(|color| PieceKind::all().map(|kind| Piece::new(color, kind)))
        .find(|piece| piece.char() == c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_fen(fen: &str, config: EvalConfig) -> EvalBreakdown {
        let position = Position::from_fen(fen).unwrap();
        Evaluator::new(config).breakdown(&position)
    }

    /// A lone White pawn on e4 against bare Kings.
    const LONE_PAWN: &str = "4k3/8/8/8/4P3/8/8/4K3 w - - 0 1";

    /// [`LONE_PAWN`] with colors swapped and the board mirrored.
    const LONE_PAWN_MIRRORED: &str = "4k3/8/8/4p3/8/8/8/4K3 b - - 0 1";

    #[test]
    fn test_startpos_is_balanced() {
        let breakdown = Evaluator::default().breakdown(&Position::default());
        assert_eq!(breakdown.material, 0);
        assert_eq!(breakdown.positional, 0);
        assert_eq!(breakdown.mobility, 0);
        assert_eq!(breakdown.total(), 0);
    }

    #[test]
    fn test_individual_terms() {
        let all = eval_fen(LONE_PAWN, EvalConfig::default());
        assert_eq!(all.material, 100);
        assert_eq!(all.positional, 20);
        // King has 5 moves and the pawn 1, against the Black King's 5
        assert_eq!(all.mobility, 1);
        assert_eq!(all.total(), 121);

        let material = EvalConfig {
            material: true,
            ..EvalConfig::NONE
        };
        assert_eq!(eval_fen(LONE_PAWN, material).total(), 100);

        let positional = EvalConfig {
            positional: true,
            ..EvalConfig::NONE
        };
        assert_eq!(eval_fen(LONE_PAWN, positional).total(), 20);

        let mobility = EvalConfig {
            mobility: true,
            ..EvalConfig::NONE
        };
        assert_eq!(eval_fen(LONE_PAWN, mobility).total(), 1);

        assert_eq!(eval_fen(LONE_PAWN, EvalConfig::NONE).total(), 0);
    }

    #[test]
    fn test_colors_are_symmetric() {
        let white = eval_fen(LONE_PAWN, EvalConfig::ALL);
        let black = eval_fen(LONE_PAWN_MIRRORED, EvalConfig::ALL);
        assert_eq!(white.total(), -black.total());
        assert_eq!(white.material, -black.material);
        assert_eq!(white.positional, -black.positional);
        assert_eq!(white.mobility, -black.mobility);
    }

    #[test]
    fn test_score_does_not_depend_on_side_to_move() {
        let white = eval_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", EvalConfig::default());
        let black = eval_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1", EvalConfig::default());
        assert_eq!(white.material, black.material);
        assert_eq!(white.positional, black.positional);
        assert_eq!(white.mobility, black.mobility);
    }

    #[test]
    fn test_checkmate_overrides_everything() {
        // Fool's mate: White is mated despite equal material
        let mut position = Position::default();
        for mv in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            position.apply_uci(mv).unwrap();
        }

        for config in [EvalConfig::default(), EvalConfig::NONE, EvalConfig::ALL] {
            assert_eq!(Evaluator::new(config).evaluate(&position), -Score::MATE);
        }

        // Black is mated by a Queen supported by its King
        let mated = eval_fen("k7/1Q6/1K6/8/8/8/8/8 b - - 0 1", EvalConfig::default());
        assert_eq!(mated.terminal, Some(Score::MATE));
        assert_eq!(mated.total(), Score::MATE);
    }

    #[test]
    fn test_draws_are_zero() {
        // Insufficient material, even though White is a Bishop up
        let bishop = eval_fen("8/4k3/8/8/3K4/8/5B2/8 w - - 0 1", EvalConfig::ALL);
        assert_eq!(bishop.total(), Score::DRAW);

        // Stalemate, even though White is a Queen up
        let stalemate = eval_fen("k7/8/KQ6/8/8/8/8/8 b - - 0 1", EvalConfig::ALL);
        assert_eq!(stalemate.total(), Score::DRAW);

        // Fifty-move rule, even though White is a Rook up
        let fifty = eval_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 90", EvalConfig::ALL);
        assert_eq!(fifty.total(), Score::DRAW);
    }

    #[test]
    fn test_king_safety() {
        let config = EvalConfig {
            king_safety: true,
            ..EvalConfig::NONE
        };

        // Same rights and mirrored Kings
        let even = eval_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", config);
        assert_eq!(even.king_safety, 0);

        // Only White may still castle, to either side
        let white_rights = eval_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQ - 0 1", config);
        assert_eq!(white_rights.king_safety, CASTLING_RIGHT * 2);

        // Each side keeps one right
        let one_each = eval_fen("r3k2r/8/8/8/8/8/8/R3K2R b Kq - 0 1", config);
        assert_eq!(one_each.king_safety, 0);

        // Only Black may castle, and only kingside
        let black_short = eval_fen("r3k2r/8/8/8/8/8/8/R3K2R w k - 0 1", config);
        assert_eq!(black_short.king_safety, -CASTLING_RIGHT);

        // Without rights, only King placement counts: a White King tucked away on g1
        let tables = piece_square_tables();
        let placed = eval_fen("4k3/8/8/8/8/8/8/6K1 w - - 0 1", config);
        let expected = tables.get(Piece::new(Color::White, PieceKind::King), Square::G1)
            - tables.get(Piece::new(Color::Black, PieceKind::King), Square::E8);
        assert_eq!(placed.king_safety, expected);
        assert_eq!(placed.king_safety, 30);

        // Looking at both colors, no matter whose turn it is
        let black_to_move = eval_fen("4k3/8/8/8/8/8/8/6K1 b - - 0 1", config);
        assert_eq!(black_to_move.king_safety, placed.king_safety);

        // Disabled by default
        let default = eval_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQ - 0 1", EvalConfig::default());
        assert_eq!(default.king_safety, 0);
    }

    #[test]
    fn test_threat_detection() {
        let config = EvalConfig {
            threat_detection: true,
            ..EvalConfig::NONE
        };

        // A Black Queen next to the White King
        let single = eval_fen("4k3/8/8/8/8/8/3q4/4K3 w - - 0 1", config);
        assert_eq!(single.threats, -MINOR_THREAT);

        // A Black Queen and Rook next to the White King
        let double = eval_fen("4k3/8/8/8/8/8/3qr3/4K3 w - - 0 1", config);
        assert_eq!(double.threats, -MAJOR_THREAT);

        // Nothing near either King
        let quiet = eval_fen(LONE_PAWN, config);
        assert_eq!(quiet.threats, 0);
    }

    #[test]
    fn test_piece_from_char() {
        assert_eq!(
            piece_from_char('N'),
            Some(Piece::new(Color::White, PieceKind::Knight))
        );
        assert_eq!(
            piece_from_char('q'),
            Some(Piece::new(Color::Black, PieceKind::Queen))
        );
        assert_eq!(piece_from_char('x'), None);
    }

    #[test]
    fn test_display_shows_score() {
        let position = Position::from_fen(LONE_PAWN).unwrap();
        let evaluator = Evaluator::default();
        let shown = evaluator.display(&position).to_string();
        assert!(shown.contains("Score: 121"), "{shown}");
        assert!(shown.contains("Winning side: White"), "{shown}");
    }
}
