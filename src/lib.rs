/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Commands that can be sent to the engine.
mod cli;

/// Code related to the engine's functionality, such as user input handling.
mod engine;

/// Evaluation of chess positions.
mod eval;

/// The game state searched by the engine, with undo history and draw detection.
mod position;

/// Piece-Square Tables, built once at compile time.
mod psqt;

/// The interface between a search and the rules of the game.
mod rules;

/// Centipawn scores.
mod score;

/// Main engine logic; all search related code.
mod search;

/// Misc utility functions, constants, and types.
mod utils;

pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use position::*;
pub use psqt::*;
pub use rules::*;
pub use score::*;
pub use search::*;
pub use utils::*;

pub use chessie::{Color, Move, Piece, PieceKind, Square};
