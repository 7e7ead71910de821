/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use minnow::{Engine, EngineCommand};

fn main() {
    let mut engine = Engine::new();

    // Every argument is a command to run before reading from stdin, such as `"position startpos" "go depth 4"`
    for arg in std::env::args().skip(1) {
        match arg.parse::<EngineCommand>() {
            Ok(cmd) => engine.send_command(cmd),
            Err(e) => eprintln!("Failed to parse {arg:?}: {e:#}"),
        }
    }

    engine.run();
}
