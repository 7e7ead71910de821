/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::str::FromStr;

use anyhow::anyhow;
use chessie::{Piece, Square};
use clap::Parser;
use uci_parser::{UciCommand, UciParseError};

use crate::{piece_from_char, Position, SearchResult};

/// A command to be sent to the engine.
#[derive(Debug, Clone, Parser)]
#[command(
    multicall = true,
    about,
    rename_all = "lower",
    override_usage("<ENGINE COMMAND> | <UCI COMMAND>")
)]
pub enum EngineCommand {
    /// Run a fixed-depth search on a series of positions and report the node count.
    Bench {
        /// If set, the benchmarking results will be printed in a well-formatted table.
        #[arg(short, long, default_value = "false")]
        pretty: bool,

        /// Override the default benchmark depth.
        #[arg(short, long, required = false)]
        depth: Option<u8>,
    },

    /// Print a visual representation of the current board state.
    #[command(alias = "d")]
    Display,

    /// Print an evaluation of the current position.
    Eval {
        /// If set, each piece's contribution and every term of the evaluation will be printed.
        #[arg(short, long, default_value = "false")]
        pretty: bool,
    },

    /// Quit the engine.
    Exit {
        /// If set, the engine will await the completion of any search threads before exiting.
        #[arg(short, long, default_value = "false")]
        cleanup: bool,
    },

    /// Generate and print a FEN string for the current position.
    Fen,

    /// Shows all legal moves in the current position, or for a specific piece.
    Moves {
        #[arg(value_parser = parse_square)]
        square: Option<Square>,
    },

    /// Reset the game to the starting position.
    #[command(alias = "newgame")]
    New,

    /// Display the current value of the specified option.
    Option {
        name: Vec<String>, // This is a vector in order to support multi-word options
    },

    /// Performs a perft on the current position at the supplied depth, printing total node count.
    Perft {
        depth: usize,

        /// If set, the node count will also be printed for every move at the root.
        #[arg(short, long, default_value = "false")]
        split: bool,
    },

    /// Play a move for the side to move, after which the engine replies.
    #[command(alias = "move")]
    Play { mv_string: String },

    /// Outputs the Piece-Square table value for the provided piece, or its entire table.
    #[command(aliases = ["psq", "pst"])]
    Psqt {
        /// The piece whose Piece-Square table value(s) to fetch, as a FEN character.
        #[arg(value_parser = parse_piece)]
        piece: Piece,

        /// Fetch the value of `piece` at `square`.
        #[arg(value_parser = parse_square)]
        square: Option<Square>,
    },

    /// Have the engine choose and play a move for the side to move.
    #[command(alias = "go-play")]
    Reply {
        /// Override the configured search depth.
        #[arg(short, long, required = false)]
        depth: Option<u8>,
    },

    /// Print whose turn it is, or how the game ended.
    Status,

    /// Take back the most recent move.
    #[command(alias = "takeback")]
    Undo,

    /// Wrapper over UCI commands sent to the engine.
    #[command(skip)]
    Uci { cmd: UciCommand },

    /// Sent by a search thread when it finishes, handing the position back to the engine.
    #[command(skip)]
    SearchDone {
        /// The position that was searched, restored to how it was before the search.
        position: Box<Position>,

        /// Result of the search, if it completed.
        result: Option<SearchResult>,

        /// Whether the best move should be played on the position.
        commit: bool,
    },
}

impl EngineCommand {
    /// Returns `true` if this command can be executed while a search thread owns the position.
    ///
    /// Everything else waits until the search concludes.
    pub fn is_immediate(&self) -> bool {
        match self {
            Self::Exit { .. } | Self::SearchDone { .. } | Self::Option { .. } => true,
            Self::Uci { cmd } => matches!(
                cmd,
                UciCommand::Uci
                    | UciCommand::Debug(_)
                    | UciCommand::IsReady
                    | UciCommand::Stop
                    | UciCommand::Quit
            ),
            _ => false,
        }
    }
}

impl FromStr for EngineCommand {
    type Err = anyhow::Error;

    /// Attempt to parse an [`EngineCommand`] from a string.
    ///
    /// The string is parsed as a [`UciCommand`] first, since that's the primary use case of the engine.
    /// If it is not a recognized UCI command, it is parsed as an engine-specific command.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match UciCommand::new(s) {
            Ok(cmd) => Ok(Self::Uci { cmd }),

            // If it's not a UCI command, check if it's an engine-specific command
            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => {
                Ok(Self::try_parse_from(s.split_ascii_whitespace())?)
            }

            // If it was a UCI command, report its usage error
            Err(uci_err) => Err(anyhow!("{uci_err}")),
        }
    }
}

/// Parses a square from its name, such as `e4`.
fn parse_square(s: &str) -> Result<Square, String> {
    let name = s.to_ascii_lowercase();
    Square::iter()
        .find(|square| square.to_string() == name)
        .ok_or_else(|| format!("invalid square {s:?}. Expected a file and a rank, such as `e4`"))
}

/// Parses a piece from its FEN character, such as `N` or `q`.
fn parse_piece(s: &str) -> Result<Piece, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => piece_from_char(c),
        _ => None,
    }
    .ok_or_else(|| format!("invalid piece {s:?}. Expected one of PNBRQKpnbrqk"))
}

#[cfg(test)]
mod tests {
    use chessie::{Color, PieceKind};

    use super::*;

    #[test]
    fn test_parse_square() {
        assert_eq!(parse_square("e4"), Ok(Square::E4));
        assert_eq!(parse_square("H8"), Ok(Square::H8));
        assert!(parse_square("i9").is_err());
        assert!(parse_square("e").is_err());
    }

    #[test]
    fn test_parse_piece() {
        assert_eq!(
            parse_piece("K"),
            Ok(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(
            parse_piece("p"),
            Ok(Piece::new(Color::Black, PieceKind::Pawn))
        );
        assert!(parse_piece("Kq").is_err());
        assert!(parse_piece("").is_err());
    }

    #[test]
    fn test_immediate_commands() {
        let stop: EngineCommand = "stop".parse().unwrap();
        assert!(stop.is_immediate());

        let display: EngineCommand = "display".parse().unwrap();
        assert!(!display.is_immediate());

        let go: EngineCommand = "go depth 3".parse().unwrap();
        assert!(!go.is_immediate());
    }
}
