use std::collections::HashSet;

use shakmaty::Square;

/// User-drawn study marks: highlighted squares and square-to-square arrows.
///
/// Both sets have toggle semantics; issuing the same mark or arrow twice
/// removes it. Annotations are presentation-local: the session clears them on
/// clicks and new games, they are never sent to the authority, and undo/redo
/// does not restore them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    marks: HashSet<Square>,
    arrows: HashSet<(Square, Square)>,
}

impl Annotations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the mark if absent, remove it if present.
    pub fn toggle_mark(&mut self, square: Square) {
        if !self.marks.insert(square) {
            self.marks.remove(&square);
        }
    }

    /// Add the arrow if absent, remove it if present. Arrows are directed:
    /// `(a, b)` and `(b, a)` are distinct.
    pub fn toggle_arrow(&mut self, from: Square, to: Square) {
        if !self.arrows.insert((from, to)) {
            self.arrows.remove(&(from, to));
        }
    }

    #[inline]
    pub fn is_marked(&self, square: Square) -> bool {
        self.marks.contains(&square)
    }

    #[inline]
    pub fn has_arrow(&self, from: Square, to: Square) -> bool {
        self.arrows.contains(&(from, to))
    }

    pub fn marks(&self) -> impl Iterator<Item = Square> + '_ {
        self.marks.iter().copied()
    }

    pub fn arrows(&self) -> impl Iterator<Item = (Square, Square)> + '_ {
        self.arrows.iter().copied()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.marks.is_empty() && self.arrows.is_empty()
    }

    pub fn clear(&mut self) {
        self.marks.clear();
        self.arrows.clear();
    }
}
