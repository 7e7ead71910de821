/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    collections::VecDeque,
    fmt,
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::{bail, Context, Result};
use chessie::{print_perft, Piece, Square};
use uci_parser::{UciCommand, UciInfo, UciOption, UciResponse};

use crate::{
    piece_square_tables, EngineCommand, EvalConfig, Evaluator, LogDebug, LogInfo, LogLevel,
    LogNone, Position, Rules, Search, SearchConfig, SearchResult, BENCHMARK_FENS, DEFAULT_DEPTH,
    MAX_DEPTH,
};

/// Default depth at which to run the benchmark searches.
const BENCH_DEPTH: u8 = 4;

/// The Minnow chess engine.
#[derive(Debug)]
pub struct Engine {
    /// The current state of the game, as known to the engine.
    ///
    /// This is `None` while a search thread has it. The thread hands it back through [`EngineCommand::SearchDone`].
    position: Option<Position>,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,

    /// Commands received during a search that need the position, in the order they arrived.
    deferred: VecDeque<EngineCommand>,

    /// Atomic flag to determine whether a search is currently running
    is_searching: Arc<AtomicBool>,

    /// Handle to the currently-running search thread, if one exists.
    search_thread: Option<JoinHandle<()>>,

    /// Terms used when evaluating positions.
    eval_config: EvalConfig,

    /// Depth of searches that don't specify one.
    depth: u8,

    /// Whether to display extra information during execution.
    debug: bool,
}

impl Engine {
    /// Constructs a new [`Engine`] instance to be executed with [`Engine::run`].
    #[inline(always)]
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            position: Some(Position::default()),
            sender,
            receiver,
            deferred: VecDeque::new(),
            is_searching: Arc::default(),
            search_thread: None,
            eval_config: EvalConfig::default(),
            depth: DEFAULT_DEPTH,
            debug: false,
        }
    }

    /// Returns a string of the engine's name and current version.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Returns a string of all authors of this engine.
    #[inline(always)]
    pub fn authors(&self) -> String {
        // Split multiple authors by comma-space
        env!("CARGO_PKG_AUTHORS").replace(':', ", ").to_string()
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    #[inline(always)]
    pub fn send_command(&self, command: EngineCommand) {
        // Safe unwrap: `send` can only fail if it's corresponding receiver doesn't exist,
        //  and the only way our engine's `Receiver` can no longer exist is when our engine
        //  doesn't exist either, so this is always safe.
        self.sender
            .send(command)
            .expect("Failed to send a command to the engine via channels.");
    }

    /// Entrypoint of the engine.
    ///
    /// This function first spawns a new thread that handles user input from `stdin`.
    /// It then loops on commands received by the engine, executing them in the order received.
    /// Commands that need the position are held back while a search is running.
    pub fn run(&mut self) {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler thread stopping after fatal error: {err:#}");
            }
        });

        while let Some(cmd) = self.next_command() {
            if !cmd.is_immediate() && self.position.is_none() {
                self.deferred.push_back(cmd);
                continue;
            }

            // Keep running, even on error
            match self.execute(cmd) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => eprintln!("Error: {e:#}"),
            }
        }
    }

    /// Fetches the next command to execute, preferring any that were deferred during a search.
    #[inline(always)]
    fn next_command(&mut self) -> Option<EngineCommand> {
        if self.position.is_some() {
            if let Some(cmd) = self.deferred.pop_front() {
                return Some(cmd);
            }
        }

        self.receiver.recv().ok()
    }

    /// Execute a single [`EngineCommand`], returning `false` if the engine should exit.
    fn execute(&mut self, cmd: EngineCommand) -> Result<bool> {
        match cmd {
            EngineCommand::Bench { depth, pretty } => self.bench(depth, pretty)?,

            EngineCommand::Display => println!("{}", self.position()?),

            EngineCommand::Eval { pretty } => self.eval(pretty)?,

            EngineCommand::Exit { cleanup } => {
                // If requested, await the completion of any ongoing search threads
                if cleanup {
                    self.await_search();
                }

                // Exit the loop so the engine can quit
                return Ok(false);
            }

            EngineCommand::Fen => println!("{}", self.position()?.to_fen()),

            EngineCommand::Moves { square } => {
                let position = self.position()?;

                // Get the legal moves
                let moves = if let Some(square) = square {
                    position.legal_moves_from(square)
                } else {
                    position.legal_moves()
                };

                // If there are none, print "(none)"
                let moves_string = if moves.is_empty() {
                    String::from("(none)")
                } else {
                    // Otherwise, join them by comma-space
                    moves
                        .into_iter()
                        .map(|mv| mv.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                println!("{moves_string}");
            }

            EngineCommand::New => self.new_game(),

            EngineCommand::Option { name } => {
                let name = name.join(" ");
                if let Some(value) = self.get_option(&name) {
                    println!("{name} := {value}");
                } else {
                    println!("{} has no option {name:?}", self.name());
                }
            }

            EngineCommand::Perft { depth, split } => {
                let game = self.position()?.game();
                if split {
                    print_perft::<false, true>(game, depth);
                } else {
                    print_perft::<false, false>(game, depth);
                }
            }

            EngineCommand::Play { mv_string } => self.play(&mv_string)?,

            EngineCommand::Psqt { piece, square } => self.psqt(piece, square),

            EngineCommand::Reply { depth } => {
                let depth = depth.unwrap_or(self.depth);
                self.reply(depth)?;
            }

            EngineCommand::Status => println!("{}", self.position()?.status()),

            EngineCommand::Undo => {
                let position = self.position_mut()?;
                let Some(mv) = position.undo_move() else {
                    bail!("There are no moves to take back");
                };
                println!("Took back {mv}");
            }

            EngineCommand::Uci { cmd } => return self.handle_uci_command(cmd),

            EngineCommand::SearchDone {
                position,
                result,
                commit,
            } => self.search_done(*position, result, commit)?,
        };

        Ok(true)
    }

    /// Handle the execution of a single [`UciCommand`].
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<bool> {
        use UciCommand::*;
        match uci {
            Uci => self.uci(),

            Debug(status) => self.debug = status,

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            SetOption { name, value } => self.set_option(&name, value)?,

            Register { name: _, code: _ } => println!("{} requires no registration", self.name()),

            UciNewGame => self.new_game(),

            Position { fen, moves } => self.set_position(fen, moves)?,

            Go(options) => {
                if let Some(depth) = options.perft {
                    print_perft::<false, true>(self.position()?.game(), depth as usize);
                    return Ok(true);
                }

                let depth = match options.depth {
                    Some(depth) => u8::try_from(depth)
                        .ok()
                        .filter(|&depth| depth <= MAX_DEPTH)
                        .with_context(|| {
                            format!("Search depth must be between 0 and {MAX_DEPTH}. Got {depth}")
                        })?,
                    None => self.depth,
                };

                if self.debug {
                    self.start_search::<LogDebug>(depth, false)?;
                } else {
                    self.start_search::<LogInfo>(depth, false)?;
                }
            }

            Stop => self.set_is_searching(false),

            // PonderHit => self.ponderhit(),
            Quit => return Ok(false),

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(true)
    }

    /// The current position.
    ///
    /// Fails if a search thread currently has it.
    #[inline(always)]
    fn position(&self) -> Result<&Position> {
        self.position
            .as_ref()
            .context("The position is unavailable while a search is running")
    }

    /// The current position, mutably.
    ///
    /// Fails if a search thread currently has it.
    #[inline(always)]
    fn position_mut(&mut self) -> Result<&mut Position> {
        self.position
            .as_mut()
            .context("The position is unavailable while a search is running")
    }

    /// Execute the `bench` command, running a benchmark of a fixed search on a series of positions and displaying the results.
    fn bench(&mut self, depth: Option<u8>, pretty: bool) -> Result<()> {
        let depth = depth.unwrap_or(BENCH_DEPTH);
        let evaluator = Evaluator::new(self.eval_config);
        let starttime = Instant::now();

        let benches = BENCHMARK_FENS;
        let mut nodes = 0;

        // Padding for printing FENs
        let width = benches.iter().map(|fen| fen.len()).max().unwrap_or_default();

        println!(
            "Running fixed-depth search (d={depth}) on {} positions",
            benches.len()
        );

        // Run a fixed search on each position
        for (i, fen) in benches.into_iter().enumerate() {
            print!("{:>2}/{:>2}: {fen:<width$} := ", i + 1, benches.len());
            // flush stdout so the node count will appear on the same line after search concludes
            io::stdout().lock().flush()?;

            let mut position = Position::from_fen(fen)?;
            let config = SearchConfig {
                depth,
                ..Default::default()
            };
            let res = Search::<LogNone, _>::new(config, &evaluator).start(&mut position)?;

            nodes += res.nodes;
            println!("{}", res.nodes);
        }

        // Compute results
        let elapsed = starttime.elapsed();
        let nps = (nodes as f32 / elapsed.as_secs_f32()) as u64;
        let m_nps = nodes as f32 / elapsed.as_secs_f32() / 1_000_000.0;
        let ms = elapsed.as_millis();

        if pretty {
            // Display the results in a nice table
            println!();
            println!("+-- Benchmark Complete --+");
            println!("| time (ms)  {ms:<12}|");
            println!("|     nodes  {nodes:<12}|");
            println!("|       nps  {nps:<12}|");
            println!("|      Mnps  {m_nps:<12.2}|");
            println!("+------------------------+");
        } else {
            println!("{nodes} nodes / {elapsed:?} := {nps} nps");
        }

        Ok(())
    }

    /// Executes the `eval` command, printing an evaluation of the current position.
    fn eval(&self, pretty: bool) -> Result<()> {
        let position = self.position()?;
        let evaluator = Evaluator::new(self.eval_config);

        if pretty {
            println!("{}", evaluator.display(position));
        } else {
            println!("{}", evaluator.evaluate(position));
        }

        Ok(())
    }

    /// Executes the `psqt` command, printing a single value or the entire table for `piece`.
    fn psqt(&self, piece: Piece, square: Option<Square>) {
        let tables = piece_square_tables();
        if let Some(square) = square {
            println!("{}", tables.get(piece, square));
        } else {
            println!("{}", tables.table(piece.kind(), piece.color()));
        }
    }

    /// Executes the `play` command: plays `mv_string` for the side to move, then starts the engine's reply.
    fn play(&mut self, mv_string: &str) -> Result<()> {
        let position = self.position_mut()?;
        let mv = position.apply_uci(mv_string)?;
        let status = position.status();

        println!("Played {mv}. {status}");

        if !status.is_game_over() {
            self.reply(self.depth)?;
        }

        Ok(())
    }

    /// Starts a search on the current position whose best move will be played once found.
    fn reply(&mut self, depth: u8) -> Result<()> {
        let status = self.position()?.status();
        if status.is_game_over() {
            bail!("Cannot reply: {status}");
        }

        if self.debug {
            self.start_search::<LogDebug>(depth, true)
        } else {
            self.start_search::<LogNone>(depth, true)
        }
    }

    /// Called when a search thread hands the position back.
    ///
    /// If `commit` is set, the best move is played.
    /// Otherwise, the search was started by `go`, which expects `bestmove` even when the search did not finish.
    fn search_done(
        &mut self,
        position: Position,
        result: Option<SearchResult>,
        commit: bool,
    ) -> Result<()> {
        self.position = Some(position);

        if let Some(handle) = self.search_thread.take() {
            if handle.join().is_err() {
                eprintln!("Search thread panicked");
            }
        }

        let Some(result) = result else {
            if !commit {
                println!("{}", UciResponse::<String>::BestMove {
                    bestmove: None,
                    ponder: None,
                });
            }
            return Ok(());
        };

        if commit {
            let Some(mv) = result.bestmove else {
                bail!("No legal moves to reply with");
            };

            let position = self.position_mut()?;
            position.apply_move(mv)?;
            println!("Engine plays {mv}. {}", position.status());
        }

        Ok(())
    }

    /// Set the position to the supplied FEN string (defaults to the standard startpos if not supplied),
    /// and then apply `moves` one-by-one to the position.
    fn set_position<T: AsRef<str>>(
        &mut self,
        fen: Option<T>,
        moves: impl IntoIterator<Item = T>,
    ) -> Result<()> {
        // Build the new position in full before replacing the current one
        let mut position = if let Some(fen) = fen {
            Position::from_fen(fen.as_ref())?
        } else {
            Position::default()
        };

        // Apply the provided moves
        for mv_str in moves {
            position.apply_uci(mv_str.as_ref())?;
        }

        self.position = Some(position);
        Ok(())
    }

    /// Resets the engine's internal game state.
    #[inline(always)]
    fn new_game(&mut self) {
        self.position = Some(Position::default());
    }

    /// Sets the search flag to signal that the engine is starting/stopping a search.
    #[inline(always)]
    fn set_is_searching(&self, status: bool) {
        self.is_searching.store(status, Ordering::Relaxed);
    }

    /// Starts a search on the current position in a new thread.
    ///
    /// The position is moved into the thread, and sent back with the result through [`EngineCommand::SearchDone`].
    fn start_search<Log: LogLevel + 'static>(&mut self, depth: u8, commit: bool) -> Result<()> {
        let Some(mut position) = self.position.take() else {
            bail!("A search is already running");
        };
        self.set_is_searching(true);

        let config = SearchConfig {
            depth,
            is_searching: Some(Arc::clone(&self.is_searching)),
        };
        let eval_config = self.eval_config;
        let sender = self.sender.clone();

        // Spawn a thread to conduct the search
        let handle = thread::spawn(move || {
            let evaluator = Evaluator::new(eval_config);
            let result = match Search::<Log, _>::new(config, &evaluator).start(&mut position) {
                Ok(res) => Some(res),
                Err(e) => {
                    eprintln!("Search stopped: {e:#}");
                    None
                }
            };

            // This can only fail if the engine has already exited, in which case nobody needs the position
            _ = sender.send(EngineCommand::SearchDone {
                position: Box::new(position),
                result,
                commit,
            });
        });

        self.search_thread = Some(handle);
        Ok(())
    }

    /// Cancels any ongoing search and blocks until its thread concludes.
    fn await_search(&mut self) {
        let Some(handle) = self.search_thread.take() else {
            return;
        };

        self.set_is_searching(false);

        let id = handle.thread().id();
        if handle.join().is_err() {
            eprintln!("Failed to join on thread {id:?}");
        }
    }

    /// Called when the engine receives the `uci` command.
    ///
    /// Prints engine's ID, version, and authors, and lists all UCI options.
    fn uci(&self) {
        println!("id name {}\nid author {}\n", self.name(), self.authors());

        // Print all UCI options
        for opt in self.options() {
            println!("{}", UciResponse::Option(opt));
        }

        // We're ready to go!
        println!("{}", UciResponse::<&str>::UciOk)
    }

    /// Convenience function to return an iterator over all UCI options this engine supports.
    fn options(&self) -> impl Iterator<Item = UciOption> {
        let defaults = EvalConfig::default();
        [
            UciOption::spin("Depth", DEFAULT_DEPTH as i32, 0, MAX_DEPTH as i32),
            UciOption::check("Material", defaults.material),
            UciOption::check("Positional", defaults.positional),
            UciOption::check("Mobility", defaults.mobility),
            UciOption::check("KingSafety", defaults.king_safety),
            UciOption::check("ThreatDetection", defaults.threat_detection),
        ]
        .into_iter()
    }

    /// Handles the `setoption` command, setting option `name` to `value`.
    ///
    /// Will return an error if `name` isn't a valid option or `value` is not a valid value for that option.
    fn set_option(&mut self, name: &str, value: Option<String>) -> Result<()> {
        let Some(value) = value.as_ref() else {
            bail!("usage: setoption name {name} value <value>");
        };

        match name {
            "Depth" => {
                let Ok(depth) = value.parse::<u8>() else {
                    bail!("expected integer between 0 and {MAX_DEPTH}. got {value:?}");
                };

                if depth > MAX_DEPTH {
                    bail!("Maximum value for Depth is {MAX_DEPTH}");
                }

                self.depth = depth;
            }

            "Material" => self.eval_config.material = parse_bool(value)?,

            "Positional" => self.eval_config.positional = parse_bool(value)?,

            "Mobility" => self.eval_config.mobility = parse_bool(value)?,

            "KingSafety" => self.eval_config.king_safety = parse_bool(value)?,

            "ThreatDetection" => self.eval_config.threat_detection = parse_bool(value)?,

            _ => bail!("Unrecognized option {name:?} with value {value:?}"),
        }

        if self.debug {
            Self::send_string(format!("Option {name} set to {value}"));
        }

        Ok(())
    }

    /// Returns the current value of the option `name`, if it exists on this engine.
    fn get_option(&self, name: &str) -> Option<String> {
        let config = self.eval_config;
        let value = match name {
            "Depth" => self.depth.to_string(),
            "Material" => config.material.to_string(),
            "Positional" => config.positional.to_string(),
            "Mobility" => config.mobility.to_string(),
            "KingSafety" => config.king_safety.to_string(),
            "ThreatDetection" => config.threat_detection.to_string(),
            _ => return None,
        };

        Some(value)
    }

    /// Helper to send a [`UciInfo`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(info: T) {
        let resp = UciResponse::<String>::Info(Box::new(UciInfo::new().string(info)));
        println!("{resp}");
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Parses the value of a `check` option.
#[inline(always)]
fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse()
        .with_context(|| format!("expected bool. got {value:?}"))
}

/// Loops endlessly to await input via `stdin`, sending all successfully-parsed commands through the supplied `sender`.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048); // Seems like a good amount of space to pre-allocate

    loop {
        // Clear the buffer, read input, and trim the trailing newline
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing UCI commands")?;

        // For ctrl + d
        if 0 == bytes {
            // Send the Quit command and exit this function
            sender
                .send(EngineCommand::Exit { cleanup: false })
                .context("Failed to send 'quit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        // Trim any leading/trailing whitespace
        let buf = buffer.trim();

        // Ignore empty lines
        if buf.is_empty() {
            continue;
        }

        match buf.parse::<EngineCommand>() {
            Ok(cmd) => sender
                .send(cmd)
                .context("Failed to send command to engine")?,

            // If an invalid command was received, just print the error and continue running
            Err(err) => eprintln!("{err:#}"),
        }
    }
}
