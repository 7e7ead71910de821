/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use uci_parser::UciScore;

use crate::MAX_DEPTH;

/// A numerical representation of the evaluation of a position / move, in units of ["centipawns"](https://www.chessprogramming.org/Score).
///
/// Static evaluations are White-relative; scores produced during search are relative to the side-to-move.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Score(pub i32);

impl Score {
    /// Larger than any score a search can produce.
    ///
    /// Used as the initial `(-INF, INF)` alpha-beta window.
    pub const INF: Self = Self(1_000_000);

    /// Score of a checkmated position, from the perspective of the side delivering mate.
    pub const MATE: Self = Self(100_000);

    /// Score of a draw.
    pub const DRAW: Self = Self(0);

    /// Lowest possible score for mate.
    ///
    /// This is only obtainable if mate is delivered [`MAX_DEPTH`] plies from the root.
    pub const LOWEST_MATE: Self = Self(Self::MATE.0 - MAX_DEPTH as i32);

    /// Returns `true` if the score is a mate score.
    #[inline(always)]
    pub const fn is_mate(&self) -> bool {
        self.0.abs() >= Self::LOWEST_MATE.0
    }

    /// Pulls a mate score `ply` plies towards zero, so that mates closer to the root score higher.
    ///
    /// Any other score is returned unchanged.
    #[inline(always)]
    pub const fn at_ply(self, ply: u8) -> Self {
        if !self.is_mate() {
            self
        } else if self.0 > 0 {
            Self(self.0 - ply as i32)
        } else {
            Self(self.0 + ply as i32)
        }
    }

    /// Returns the number of plies (half moves) this score is from mate.
    #[inline(always)]
    pub const fn plies_to_mate(&self) -> i32 {
        Self::MATE.0 - self.0.abs()
    }

    /// Returns the number of moves (full moves) this score is from mate.
    ///
    /// Negative if the side this score belongs to is getting mated.
    #[inline(always)]
    pub const fn moves_to_mate(&self) -> i32 {
        let plies = self.plies_to_mate();

        // Delivering mate takes our own move as well
        if self.0 > 0 {
            (plies + 1) / 2
        } else {
            -plies / 2
        }
    }

    /// Converts this [`Score`] into a [`UciScore`],
    /// determining whether it is a centipawns score or a mate score.
    #[inline(always)]
    pub fn into_uci(self) -> UciScore {
        if self.is_mate() {
            UciScore::mate(self.moves_to_mate())
        } else {
            UciScore::cp(self.0)
        }
    }

    /// Returns the absolute value of this [`Score`].
    #[inline(always)]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// "Normalizes" a score so that it can be printed as a float.
    ///
    /// Presently, this just divides by 100, since a score represents a centipawn value.
    #[inline(always)]
    pub fn normalize(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

impl From<Score> for UciScore {
    #[inline(always)]
    fn from(value: Score) -> Self {
        value.into_uci()
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<i32> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: i32) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<i32> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: i32) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl PartialEq<i32> for Score {
    fn eq(&self, other: &i32) -> bool {
        self.0.eq(other)
    }
}

impl PartialOrd<i32> for Score {
    fn partial_cmp(&self, other: &i32) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(other)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mate() {
            write!(f, "{} (mate)", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use chessie::PieceKind;

    use super::*;
    use crate::value_of;

    #[test]
    fn test_window_contains_every_mate() {
        // Most material one side could ever own: its King, and every pawn promoted to a Queen
        let most_material = value_of(PieceKind::King)
            + value_of(PieceKind::Queen) * 9
            + (value_of(PieceKind::Rook) + value_of(PieceKind::Bishop) + value_of(PieceKind::Knight)) * 2;

        // No material count can be mistaken for mate, and every mate fits inside the search window
        assert!(Score(most_material) < Score::LOWEST_MATE);
        assert!(Score(-most_material) > -Score::LOWEST_MATE);
        assert!(Score::MATE < Score::INF);
        assert!(-Score::MATE > -Score::INF);
    }

    #[test]
    fn test_is_mate() {
        assert!(Score::MATE.is_mate());
        assert!((-Score::MATE).is_mate());
        assert!(Score::LOWEST_MATE.is_mate());
        assert!(!(Score::LOWEST_MATE - 1).is_mate());
        assert!(!Score::DRAW.is_mate());
    }

    #[test]
    fn test_mates_at_ply() {
        // Mating in 1 ply beats mating in 3
        let quick = Score::MATE.at_ply(1);
        let slow = Score::MATE.at_ply(3);
        assert!(quick > slow);
        assert_eq!(quick.moves_to_mate(), 1);
        assert_eq!(slow.moves_to_mate(), 2);

        // Getting mated later is better than getting mated sooner
        let soon = (-Score::MATE).at_ply(2);
        let late = (-Score::MATE).at_ply(4);
        assert!(late > soon);
        assert_eq!(soon.moves_to_mate(), -1);
        assert_eq!(late.moves_to_mate(), -2);

        // Anything else is left alone
        assert_eq!(Score(250).at_ply(5), Score(250));
        assert_eq!(Score::DRAW.at_ply(5), Score::DRAW);
    }

    #[test]
    fn test_arithmetic() {
        let mut score = Score(100);
        score += 20;
        score -= Score(30);
        assert_eq!(score, 90);
        assert_eq!(-score, Score(-90));
        assert_eq!(score * 2, Score(180));
        assert_eq!((Score(-5)).abs(), Score(5));
    }
}
