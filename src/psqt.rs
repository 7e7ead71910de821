/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use chessie::{Color, File, Piece, PieceKind, Rank, Square};

/// Number of files/ranks on the board.
const SIDE: usize = 8;

/// A canonical table, written as the board is seen from White's side: the first row is the 8th rank.
type Canonical = [[i32; SIDE]; SIDE];

/// Canonical tables copied from the [Simplified Evaluation Function](https://www.chessprogramming.org/Simplified_Evaluation_Function)
#[rustfmt::skip]
const PAWN: Canonical = [
    [ 0,  0,   0,   0,   0,   0,  0,  0],
    [50, 50,  50,  50,  50,  50, 50, 50],
    [10, 10,  20,  30,  30,  20, 10, 10],
    [ 5,  5,  10,  25,  25,  10,  5,  5],
    [ 0,  0,   0,  20,  20,   0,  0,  0],
    [ 5, -5, -10,   0,   0, -10, -5,  5],
    [ 5, 10,  10, -20, -20,  10, 10,  5],
    [ 0,  0,   0,   0,   0,   0,  0,  0],
];

#[rustfmt::skip]
const KNIGHT: Canonical = [
    [-50, -40, -30, -30, -30, -30, -40, -50],
    [-40, -20,   0,   0,   0,   0, -20, -40],
    [-30,   0,  10,  15,  15,  10,   0, -30],
    [-30,   5,  15,  20,  20,  15,   5, -30],
    [-30,   0,  15,  20,  20,  15,   0, -30],
    [-30,   5,  10,  15,  15,  10,   5, -30],
    [-40, -20,   0,   5,   5,   0, -20, -40],
    [-50, -40, -30, -30, -30, -30, -40, -50],
];

#[rustfmt::skip]
const BISHOP: Canonical = [
    [-20, -10, -10, -10, -10, -10, -10, -20],
    [-10,   0,   0,   0,   0,   0,   0, -10],
    [-10,   0,   5,  10,  10,   5,   0, -10],
    [-10,   5,   5,  10,  10,   5,   5, -10],
    [-10,   0,  10,  10,  10,  10,   0, -10],
    [-10,  10,  10,  10,  10,  10,  10, -10],
    [-10,   5,   0,   0,   0,   0,   5, -10],
    [-20, -10, -10, -10, -10, -10, -10, -20],
];

#[rustfmt::skip]
const ROOK: Canonical = [
    [ 0,  0,  0,  0,  0,  0,  0,  0],
    [ 5, 10, 10, 10, 10, 10, 10,  5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [-5,  0,  0,  0,  0,  0,  0, -5],
    [ 0,  0,  0,  5,  5,  0,  0,  0],
];

#[rustfmt::skip]
const QUEEN: Canonical = [
    [-20, -10, -10, -5, -5, -10, -10, -20],
    [-10,   0,   0,  0,  0,   0,   0, -10],
    [-10,   0,   5,  5,  5,   5,   0, -10],
    [ -5,   0,   5,  5,  5,   5,   0,  -5],
    [  0,   0,   5,  5,  5,   5,   0,  -5],
    [-10,   5,   5,  5,  5,   5,   0, -10],
    [-10,   0,   5,  0,  0,   0,   0, -10],
    [-20, -10, -10, -5, -5, -10, -10, -20],
];

#[rustfmt::skip]
const KING: Canonical = [
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-30, -40, -40, -50, -50, -40, -40, -30],
    [-20, -30, -30, -40, -40, -30, -30, -20],
    [-10, -20, -20, -20, -20, -20, -20, -10],
    [ 20,  20,   0,   0,   0,   0,  20,  20],
    [ 20,  30,  10,   0,   0,  10,  30,  20],
];

/// Process-wide tables, built once during compilation.
static PIECE_SQUARE_TABLES: PieceSquareTables = PieceSquareTables::build();

/// Fetch the process-wide [`PieceSquareTables`].
#[inline(always)]
pub fn piece_square_tables() -> &'static PieceSquareTables {
    &PIECE_SQUARE_TABLES
}

/// Index of a square in a 64-entry table, where `a1 == 0` and `h8 == 63`.
#[inline(always)]
const fn square_index(file: usize, rank: usize) -> usize {
    rank * SIDE + file
}

/// Mirrors a table index across the middle of the board, keeping its file.
#[inline(always)]
pub const fn mirror(index: usize) -> usize {
    index ^ 56
}

/// A [Piece-Square Table](https://www.chessprogramming.org/Piece-Square_Tables) for a single piece of a single color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Psqt([i32; Square::COUNT]);

impl Psqt {
    /// Lays out a canonical table so it can be indexed directly by [`Square`] from White's side.
    const fn from_canonical(canonical: &Canonical) -> Self {
        let mut values = [0; Square::COUNT];

        let mut rank = 0;
        while rank < SIDE {
            let mut file = 0;
            while file < SIDE {
                // Row 0 of the canonical table is the 8th rank
                values[square_index(file, rank)] = canonical[SIDE - 1 - rank][file];
                file += 1;
            }
            rank += 1;
        }

        Self(values)
    }

    /// Returns this table with its ranks reversed, for use by the opposing color.
    const fn mirrored(&self) -> Self {
        let mut values = [0; Square::COUNT];

        let mut i = 0;
        while i < values.len() {
            values[i] = self.0[mirror(i)];
            i += 1;
        }

        Self(values)
    }

    /// Get the value of this PSQT at the provided square.
    #[inline(always)]
    pub fn get(&self, square: Square) -> i32 {
        self.0[square.index()]
    }

    /// Get the value of this PSQT at the provided raw index.
    #[inline(always)]
    pub const fn get_index(&self, index: usize) -> i32 {
        self.0[index]
    }
}

impl fmt::Display for Psqt {
    /// Prints the table the way the board is usually drawn, with the 8th rank on top.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in Rank::iter().rev() {
            write!(f, "{rank}| ")?;
            for file in File::iter() {
                let value = self.get(Square::new(file, rank));
                write!(f, "{value:4} ")?;
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in File::iter() {
            write!(f, "-----")?;
        }
        write!(f, "\n   ")?;
        for file in File::iter() {
            write!(f, "{file:>4} ")?;
        }

        Ok(())
    }
}

/// White's and Black's tables for a single piece kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PsqtPair {
    white: Psqt,
    black: Psqt,
}

impl PsqtPair {
    const fn new(canonical: &Canonical) -> Self {
        let white = Psqt::from_canonical(canonical);
        let black = white.mirrored();
        Self { white, black }
    }
}

/// Piece-Square Tables for every piece kind and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSquareTables([PsqtPair; PieceKind::COUNT]);

impl PieceSquareTables {
    /// Build the full set of tables from the canonical, White-oriented literals.
    ///
    /// This is a pure function of the literals, so calling it repeatedly yields identical tables.
    pub const fn build() -> Self {
        Self([
            PsqtPair::new(&PAWN),
            PsqtPair::new(&KNIGHT),
            PsqtPair::new(&BISHOP),
            PsqtPair::new(&ROOK),
            PsqtPair::new(&QUEEN),
            PsqtPair::new(&KING),
        ])
    }

    /// Fetch the table for the provided piece kind and color.
    #[inline(always)]
    pub const fn table(&self, kind: PieceKind, color: Color) -> &Psqt {
        let pair = &self.0[slot(kind)];
        match color {
            Color::White => &pair.white,
            Color::Black => &pair.black,
        }
    }

    /// Fetch the positional value of `piece` standing on `square`.
    ///
    /// The value is always "good for the owner of the piece"; callers apply the color's sign.
    #[inline(always)]
    pub fn get(&self, piece: Piece, square: Square) -> i32 {
        self.table(piece.kind(), piece.color()).get(square)
    }
}

impl Default for PieceSquareTables {
    fn default() -> Self {
        Self::build()
    }
}

/// Position of a piece kind's tables within [`PieceSquareTables`].
#[inline(always)]
const fn slot(kind: PieceKind) -> usize {
    match kind {
        PieceKind::Pawn => 0,
        PieceKind::Knight => 1,
        PieceKind::Bishop => 2,
        PieceKind::Rook => 3,
        PieceKind::Queen => 4,
        PieceKind::King => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_black_is_mirror_of_white() {
        let tables = piece_square_tables();

        for kind in PieceKind::all() {
            let white = tables.table(kind, Color::White);
            let black = tables.table(kind, Color::Black);

            for i in 0..Square::COUNT {
                assert_eq!(
                    black.get_index(i),
                    white.get_index(mirror(i)),
                    "{} table is not symmetric at index {i}",
                    kind.name()
                );
            }
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        assert_eq!(PieceSquareTables::build(), PieceSquareTables::build());
        assert_eq!(*piece_square_tables(), PieceSquareTables::build());
    }

    #[test]
    fn test_known_values() {
        let tables = piece_square_tables();
        let wp = Piece::new(Color::White, PieceKind::Pawn);
        let bp = Piece::new(Color::Black, PieceKind::Pawn);

        // Pawns about to promote are rewarded
        assert_eq!(tables.get(wp, Square::E7), 50);
        assert_eq!(tables.get(bp, Square::E2), 50);

        // Blocking the center pawns is discouraged
        assert_eq!(tables.get(wp, Square::D2), -20);
        assert_eq!(tables.get(bp, Square::D7), -20);

        let wn = Piece::new(Color::White, PieceKind::Knight);
        assert_eq!(tables.get(wn, Square::A1), -50);
        assert_eq!(tables.get(wn, Square::E4), 20);

        // Castled kings sit on favorable squares
        let wk = Piece::new(Color::White, PieceKind::King);
        let bk = Piece::new(Color::Black, PieceKind::King);
        assert_eq!(tables.get(wk, Square::G1), 30);
        assert_eq!(tables.get(bk, Square::G8), 30);

        // The queen table is not file-symmetric, so this also checks that files are not flipped
        let wq = Piece::new(Color::White, PieceKind::Queen);
        assert_eq!(tables.get(wq, Square::A4), 0);
        assert_eq!(tables.get(wq, Square::H4), -5);
    }

    #[test]
    fn test_square_index_matches_chessie() {
        for square in Square::iter() {
            let index = square_index(square.file().index(), square.rank().index());
            assert_eq!(index, square.index(), "{square} has an unexpected index");
        }
    }
}
