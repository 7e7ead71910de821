/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use minnow::{
    mirror, piece_square_tables, Color, EvalConfig, Evaluator, PieceKind, PieceSquareTables,
    Position, Score, Square,
};

fn evaluate(fen: &str, config: EvalConfig) -> Score {
    Evaluator::new(config).evaluate(&Position::from_fen(fen).unwrap())
}

#[test]
fn test_tables_are_mirrored() {
    let tables = piece_square_tables();
    for kind in PieceKind::all() {
        for square in Square::iter() {
            let white = tables.table(kind, Color::White).get(square);
            let black = tables.table(kind, Color::Black).get_index(mirror(square.index()));
            assert_eq!(white, black, "{kind:?} on {square}");
        }
    }
}

#[test]
fn test_tables_are_built_deterministically() {
    let first = PieceSquareTables::build();
    let second = PieceSquareTables::build();
    assert_eq!(first, second);
    assert_eq!(&first, piece_square_tables());
}

#[test]
fn test_evaluation_does_not_modify_position() {
    let position =
        Position::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4")
            .unwrap();
    let before = position.clone();
    let evaluator = Evaluator::new(EvalConfig::ALL);

    let first = evaluator.evaluate(&position);
    let second = evaluator.evaluate(&position);
    assert_eq!(first, second);
    assert_eq!(position, before);
}

#[test]
fn test_material_only() {
    let config = EvalConfig {
        material: true,
        ..EvalConfig::NONE
    };

    // White is up a Knight and a Pawn
    assert_eq!(
        evaluate("4k3/8/8/8/8/8/4P3/1N2K3 w - - 0 1", config),
        420
    );

    // Black is up a Queen, regardless of who is to move
    assert_eq!(evaluate("3qk3/8/8/8/8/8/8/4K3 w - - 0 1", config), -900);
    assert_eq!(evaluate("3qk3/8/8/8/8/8/8/4K3 b - - 0 1", config), -900);
}

#[test]
fn test_terminal_scores() {
    // Scholar's mate: Black is mated
    let mut position = Position::default();
    for mv in ["e2e4", "e7e5", "f1c4", "b8c6", "d1h5", "g8f6", "h5f7"] {
        position.apply_uci(mv).unwrap();
    }
    for config in [EvalConfig::default(), EvalConfig::NONE, EvalConfig::ALL] {
        assert_eq!(Evaluator::new(config).evaluate(&position), Score::MATE);
    }

    // Bare kings
    assert_eq!(
        evaluate("8/8/4k3/8/8/3K4/8/8 w - - 0 1", EvalConfig::ALL),
        Score::DRAW
    );

    // King and Knight against King
    assert_eq!(
        evaluate("8/8/4k3/8/8/3K4/8/6N1 b - - 0 1", EvalConfig::ALL),
        Score::DRAW
    );
}

#[test]
fn test_repetition_is_draw() {
    let mut position = Position::default();
    let evaluator = Evaluator::default();

    for _ in 0..2 {
        for mv in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            position.apply_uci(mv).unwrap();
        }
    }

    assert_eq!(evaluator.evaluate(&position), Score::DRAW);
}
