use shakmaty::{Piece, Square};

use crate::UndoToken;
use crate::moves::MoveDescriptor;

/// One applied move as recorded by the session.
///
/// `piece` is captured at application time because the piece that stood on
/// `from` can no longer be queried once later moves supersede it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub from: Square,
    pub to: Square,
    pub piece: Piece,
    pub descriptor: MoveDescriptor,
    pub undo: UndoToken,
}

/// Ordered record of applied moves with a cursor for time-travel.
///
/// Entries at indices `<= current` are applied to the authority's live
/// position, in order; entries past the cursor are retained future moves,
/// reachable by redo until a new move truncates them. `current == None`
/// means the ledger stands at the starting position.
#[derive(Debug, Clone, Default)]
pub struct MoveLedger {
    entries: Vec<LedgerEntry>,
    current: Option<usize>,
}

impl MoveLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly applied move at the cursor, discarding any retained
    /// future entries first. There is exactly one future branch at any time;
    /// moving while rewound overwrites the old one.
    pub fn append(&mut self, entry: LedgerEntry) {
        let insert_at = self.current.map_or(0, |i| i + 1);
        self.entries.truncate(insert_at);
        self.entries.push(entry);
        self.current = Some(self.entries.len() - 1);
    }

    /// True iff at least one applied move can be taken back.
    #[inline]
    pub fn can_undo(&self) -> bool {
        self.current.is_some()
    }

    /// True iff a retained future move can be re-applied.
    #[inline]
    pub fn can_redo(&self) -> bool {
        self.current.map_or(!self.entries.is_empty(), |i| i + 1 < self.entries.len())
    }

    /// Cursor position; `None` at the starting position.
    #[inline]
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All recorded entries, applied and future alike.
    #[inline]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// The entry at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds; callers gate on `can_undo` /
    /// `can_redo` / `len` first.
    #[inline]
    pub fn entry(&self, index: usize) -> &LedgerEntry {
        &self.entries[index]
    }

    /// The most recently applied entry, if any.
    #[inline]
    pub fn current_entry(&self) -> Option<&LedgerEntry> {
        self.current.map(|i| &self.entries[i])
    }

    /// The next future entry, if any.
    #[inline]
    pub fn next_entry(&self) -> Option<&LedgerEntry> {
        let next = self.current.map_or(0, |i| i + 1);
        self.entries.get(next)
    }

    /// Move the cursor one step toward the starting position.
    ///
    /// Caller must have checked [`Self::can_undo`].
    pub fn step_back(&mut self) {
        debug_assert!(self.can_undo());
        self.current = match self.current {
            Some(0) | None => None,
            Some(i) => Some(i - 1),
        };
    }

    /// Move the cursor one step toward the tail.
    ///
    /// Caller must have checked [`Self::can_redo`].
    pub fn step_forward(&mut self) {
        debug_assert!(self.can_redo());
        self.current = Some(self.current.map_or(0, |i| i + 1));
    }

    /// Replace the undo token of an already-recorded entry.
    ///
    /// The one permitted entry mutation: redo must store the fresh token the
    /// authority issued, since tokens are not stable across undo/redo cycles.
    pub fn refresh_undo_token(&mut self, index: usize, token: UndoToken) {
        self.entries[index].undo = token;
    }

    /// Drop all entries and return to the starting position.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.current = None;
    }
}
