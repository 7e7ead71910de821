/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    marker::PhantomData,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use anyhow::{bail, Result};
use chessie::{Color, Move};
use uci_parser::{UciInfo, UciResponse};

use crate::{Evaluate, Evaluator, LogLevel, LogNone, Position, Rules, Score};

/// Maximum depth that can be searched.
pub const MAX_DEPTH: u8 = 32;

/// Finds the best move for the side to move in `position`, searching `depth` plies with the default [`Evaluator`].
///
/// Returns `Ok(None)` if there are no legal moves. `position` is left exactly as it was given.
#[inline(always)]
pub fn choose_move(position: &mut Position, depth: u8) -> Result<Option<Move>> {
    let evaluator = Evaluator::default();
    let config = SearchConfig {
        depth,
        ..Default::default()
    };

    let res = Search::<LogNone, _>::new(config, &evaluator).start(position)?;
    Ok(res.bestmove)
}

/// The result of a search, containing the best move found, score, and total nodes searched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchResult<M = Move> {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search, if there were any legal moves.
    pub bestmove: Option<M>,

    /// Evaluation of the position after `bestmove` is made, from the perspective of the side to move at the root.
    pub score: Score,
}

impl<M> Default for SearchResult<M> {
    /// A default search result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: -Score::INF,
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of plies to search below the root.
    pub depth: u8,

    /// If supplied, the search exits as soon as this is `false`.
    ///
    /// The flag is cleared once the search concludes.
    pub is_searching: Option<Arc<AtomicBool>>,
}

impl Default for SearchConfig {
    #[inline(always)]
    fn default() -> Self {
        Self {
            depth: crate::DEFAULT_DEPTH,
            is_searching: None,
        }
    }
}

/// Executes a fixed-depth search on some [`Rules`] state.
///
/// `Log` determines how much is printed to `stdout` while searching,
/// and `E` scores the states found at the end of each line.
pub struct Search<'a, Log, E> {
    /// Number of nodes visited so far.
    nodes: u64,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// Scores positions at the leaves.
    evaluator: &'a E,

    /// Marker for what kind of logging this search will perform.
    log: PhantomData<Log>,
}

impl<'a, Log: LogLevel, E> Search<'a, Log, E> {
    /// Construct a new [`Search`] instance to execute.
    #[inline(always)]
    pub fn new(config: SearchConfig, evaluator: &'a E) -> Self {
        Self {
            nodes: 0,
            config,
            evaluator,
            log: PhantomData,
        }
    }

    /// Start the search on the supplied state, returning a [`SearchResult`].
    ///
    /// Every move made while searching is undone before this returns, including when the search is cancelled.
    pub fn start<R>(mut self, rules: &mut R) -> Result<SearchResult<R::Move>>
    where
        R: Rules,
        E: Evaluate<R>,
    {
        let depth = self.config.depth;
        if depth > MAX_DEPTH {
            bail!("Cannot search to depth {depth}. Maximum depth is {MAX_DEPTH}");
        }

        let starttime = Instant::now();

        if Log::DEBUG {
            self.send_string(format!(
                "Starting depth {depth} search with {:?} to move",
                rules.side_to_move()
            ));
        }

        let res = self.root(rules, depth);

        // Search has concluded, alert other thread(s) that we are no longer searching
        if let Some(flag) = &self.config.is_searching {
            flag.store(false, Ordering::Relaxed);
        }

        let res = match res {
            Ok(res) => res,
            Err(e) => {
                if Log::DEBUG {
                    self.send_string(format!("Search cancelled after {} nodes", self.nodes));
                }
                return Err(e);
            }
        };

        if Log::INFO {
            let elapsed = starttime.elapsed();
            self.send_info(
                UciInfo::new()
                    .depth(depth)
                    .nodes(res.nodes)
                    .score(res.score)
                    .nps((res.nodes as f32 / elapsed.as_secs_f32()).trunc())
                    .time(elapsed.as_millis()),
            );

            self.send_response(UciResponse::BestMove {
                bestmove: res.bestmove.map(|mv| mv.to_string()),
                ponder: None,
            });
        }

        Ok(res)
    }

    /// Searches every move at the root with a full window, keeping the best one.
    ///
    /// Ties go to the move generated last.
    fn root<R>(&mut self, rules: &mut R, depth: u8) -> Result<SearchResult<R::Move>>
    where
        R: Rules,
        E: Evaluate<R>,
    {
        self.check_cancelled()?;
        self.nodes += 1;

        let mut result = SearchResult::default();
        let moves = rules.legal_moves();

        // Checkmate or stalemate
        if moves.is_empty() {
            result.score = self.relative_eval(rules, 0);
            result.nodes = self.nodes;
            return Ok(result);
        }

        for mv in moves {
            let score = {
                let mut child = rules.scoped(mv)?;
                -self.negamax(&mut *child, depth.saturating_sub(1), 1, -Score::INF, Score::INF)?
            };

            if Log::DEBUG {
                self.send_string(format!("{mv} scored {score}"));
            }

            if score >= result.score {
                result.score = score;
                result.bestmove = Some(mv);
            }
        }

        result.nodes = self.nodes;
        Ok(result)
    }

    /// Primary location of search logic.
    ///
    /// Uses the [negamax](https://www.chessprogramming.org/Negamax) algorithm with
    /// [alpha-beta pruning](https://www.chessprogramming.org/Alpha-Beta).
    /// The returned score is relative to the side to move in `rules`, which is `ply` plies below the root.
    fn negamax<R>(
        &mut self,
        rules: &mut R,
        depth: u8,
        ply: u8,
        mut alpha: Score,
        beta: Score,
    ) -> Result<Score>
    where
        R: Rules,
        E: Evaluate<R>,
    {
        self.check_cancelled()?;
        self.nodes += 1;

        if depth == 0 {
            return Ok(self.relative_eval(rules, ply));
        }

        let moves = rules.legal_moves();

        // The evaluator knows whether this is mate or a draw
        if moves.is_empty() {
            return Ok(self.relative_eval(rules, ply));
        }

        // Start with a *really bad* initial score
        let mut best = -Score::INF;

        for mv in moves {
            // The move is undone when `child` drops, before any cutoff is taken
            let score = {
                let mut child = rules.scoped(mv)?;
                -self.negamax(&mut *child, depth - 1, ply + 1, -beta, -alpha)?
            };

            best = best.max(score);
            alpha = alpha.max(score);

            // Fail high
            if alpha >= beta {
                break;
            }
        }

        Ok(best)
    }

    /// Static evaluation of `rules`, from the perspective of the side to move.
    ///
    /// Mates are scored by their distance from the root, so a quicker mate is always preferred.
    #[inline(always)]
    fn relative_eval<R>(&self, rules: &R, ply: u8) -> Score
    where
        R: Rules,
        E: Evaluate<R>,
    {
        let score = self.evaluator.evaluate(rules);
        let score = match rules.side_to_move() {
            Color::White => score,
            Color::Black => -score,
        };
        score.at_ply(ply)
    }

    /// Returns an error if the search has been told to stop.
    #[inline(always)]
    fn check_cancelled(&self) -> Result<()> {
        if let Some(flag) = &self.config.is_searching {
            if !flag.load(Ordering::Relaxed) {
                bail!("Search was cancelled");
            }
        }
        Ok(())
    }

    /// Sends a [`UciResponse`] to `stdout`.
    #[inline(always)]
    fn send_response<T: fmt::Display>(&self, response: UciResponse<T>) {
        println!("{response}");
    }

    /// Sends a [`UciInfo`] to `stdout`.
    #[inline(always)]
    fn send_info(&self, info: UciInfo) {
        let resp = UciResponse::<String>::Info(Box::new(info));
        self.send_response(resp);
    }

    /// Helper to send a [`UciInfo`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(&self, string: T) {
        self.send_info(UciInfo::new().string(string));
    }
}
