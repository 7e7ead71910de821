/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use minnow::{EngineCommand, Square};
use uci_parser::UciCommand;

fn parse(s: &str) -> EngineCommand {
    s.parse().unwrap()
}

#[test]
fn test_engine_commands() {
    assert!(matches!(parse("d"), EngineCommand::Display));
    assert!(matches!(parse("display"), EngineCommand::Display));
    assert!(matches!(parse("status"), EngineCommand::Status));
    assert!(matches!(parse("undo"), EngineCommand::Undo));
    assert!(matches!(parse("eval --pretty"), EngineCommand::Eval { pretty: true }));

    let EngineCommand::Moves { square } = parse("moves e2") else {
        panic!("expected moves");
    };
    assert_eq!(square, Some(Square::E2));

    assert!(matches!(
        parse("perft 3"),
        EngineCommand::Perft {
            depth: 3,
            split: false
        }
    ));

    let EngineCommand::Psqt { piece, square } = parse("psqt N e4") else {
        panic!("expected psqt");
    };
    assert_eq!(piece.to_string(), "N");
    assert_eq!(square, Some(Square::E4));

    let EngineCommand::Play { mv_string } = parse("play e2e4") else {
        panic!("expected play");
    };
    assert_eq!(mv_string, "e2e4");
}

#[test]
fn test_reply_depth() {
    assert!(matches!(
        parse("reply"),
        EngineCommand::Reply { depth: None }
    ));
    assert!(matches!(
        parse("reply --depth 4"),
        EngineCommand::Reply { depth: Some(4) }
    ));

    // Depths must fit in a byte and cannot be negative
    assert!("reply --depth -1".parse::<EngineCommand>().is_err());
    assert!("reply --depth 256".parse::<EngineCommand>().is_err());
    assert!("bench --depth x".parse::<EngineCommand>().is_err());
}

#[test]
fn test_uci_commands() {
    assert!(matches!(
        parse("isready"),
        EngineCommand::Uci {
            cmd: UciCommand::IsReady
        }
    ));

    let EngineCommand::Uci {
        cmd: UciCommand::Go(options),
    } = parse("go depth 3")
    else {
        panic!("expected go");
    };
    assert_eq!(options.depth.map(|depth| depth as u64), Some(3));

    assert!(matches!(
        parse("position startpos moves e2e4 e7e5"),
        EngineCommand::Uci {
            cmd: UciCommand::Position { .. }
        }
    ));
}

#[test]
fn test_invalid_commands() {
    assert!("frobnicate".parse::<EngineCommand>().is_err());
    assert!("moves z9".parse::<EngineCommand>().is_err());
    assert!("psqt X".parse::<EngineCommand>().is_err());
    assert!("perft".parse::<EngineCommand>().is_err());
}
