/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Depth used when none is supplied by the user.
pub const DEFAULT_DEPTH: u8 = 3;

/// Positions used by the `bench` command.
///
/// These cover an opening, a few middlegames, and some endgames with very few moves available.
pub const BENCHMARK_FENS: [&str; 8] = [
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2",
    "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1",
    "6k1/5ppp/8/8/8/8/5PPP/3R2K1 w - - 0 1",
];

/// A marker trait for how much a search prints while it runs.
///
/// Implemented by zero-sized types so that unused logging is compiled away.
pub trait LogLevel {
    /// Print the final `info` line and `bestmove`.
    const INFO: bool;

    /// Print extra `info string` diagnostics.
    const DEBUG: bool;
}

/// Print nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogNone;

/// Print the search summary and `bestmove`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogInfo;

/// Print everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogDebug;

impl LogLevel for LogNone {
    const INFO: bool = false;
    const DEBUG: bool = false;
}

impl LogLevel for LogInfo {
    const INFO: bool = true;
    const DEBUG: bool = false;
}

impl LogLevel for LogDebug {
    const INFO: bool = true;
    const DEBUG: bool = true;
}
