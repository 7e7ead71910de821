/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    ops::{Deref, DerefMut},
};

use anyhow::Result;
use chessie::Color;

/// The operations a searcher needs from a rules engine.
///
/// Implementors own a single mutable game state that is walked with [`Rules::apply_move`] and
/// rolled back with [`Rules::undo_move`], in strict LIFO order.
pub trait Rules {
    /// A single ply, as produced by [`Rules::legal_moves`].
    type Move: Copy + PartialEq + fmt::Debug + fmt::Display;

    /// All legal moves in the current state.
    ///
    /// The order is up to the implementor, but must be the same every time it is called on the same state.
    fn legal_moves(&self) -> Vec<Self::Move>;

    /// Applies `mv` to the current state.
    ///
    /// Returns an error, leaving the state untouched, if `mv` is not legal.
    fn apply_move(&mut self, mv: Self::Move) -> Result<()>;

    /// Reverts the most recently applied move, returning it.
    ///
    /// Returns `None` if there is no move to undo.
    fn undo_move(&mut self) -> Option<Self::Move>;

    /// Returns `true` if the side-to-move has been checkmated.
    fn is_checkmate(&self) -> bool;

    /// Returns `true` if the game is drawn by rule.
    fn is_draw(&self) -> bool;

    /// The color whose turn it is.
    fn side_to_move(&self) -> Color;

    /// Applies `mv`, returning a guard that undoes it when dropped.
    ///
    /// The guard dereferences to `self`, so it can be searched through like the original state.
    #[inline(always)]
    fn scoped(&mut self, mv: Self::Move) -> Result<Scoped<'_, Self>>
    where
        Self: Sized,
    {
        self.apply_move(mv)?;
        Ok(Scoped { rules: self })
    }
}

/// A move that has been applied to some [`Rules`] state, and will be undone when this is dropped.
///
/// Every exit path out of a scope holding one of these (normal return, early return, `?`, or panic)
/// restores the state to what it was before the move was made.
pub struct Scoped<'a, R: Rules> {
    rules: &'a mut R,
}

impl<R: Rules> Deref for Scoped<'_, R> {
    type Target = R;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.rules
    }
}

impl<R: Rules> DerefMut for Scoped<'_, R> {
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.rules
    }
}

impl<R: Rules> Drop for Scoped<'_, R> {
    #[inline(always)]
    fn drop(&mut self) {
        self.rules.undo_move();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Position;

    #[test]
    fn test_scoped_undoes_on_drop() {
        let mut position = Position::default();
        let before = position.clone();
        let mv = position.legal_moves()[0];

        {
            let child = position.scoped(mv).unwrap();
            assert_eq!(child.side_to_move(), Color::Black);
            assert_ne!(*child, before);
        }

        assert_eq!(position, before);
    }

    #[test]
    fn test_scoped_nested() {
        let mut position = Position::default();
        let before = position.clone();

        {
            let white = position.legal_moves()[0];
            let mut child = position.scoped(white).unwrap();

            let black = child.legal_moves()[0];
            let grandchild = child.scoped(black).unwrap();
            assert_eq!(grandchild.side_to_move(), Color::White);
        }

        assert_eq!(position, before);
    }

    #[test]
    fn test_scoped_rejects_illegal_move() {
        let mut position = Position::default();
        let before = position.clone();

        // A Black move while White is to move
        let mut flipped = Position::default();
        flipped.apply_uci("e2e4").unwrap();
        let black = flipped.legal_moves()[0];

        assert!(position.scoped(black).is_err());
        assert_eq!(position, before);
    }
}
