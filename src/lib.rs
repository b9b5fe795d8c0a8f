use shakmaty::{Piece, Square};

use crate::moves::MoveDescriptor;

pub mod annotations;
pub mod authority;
pub mod ledger;
pub mod moves;
pub mod session;
pub mod terminal;

/// Full board snapshot as reported by the authority, indexed by square
/// (`a1 = 0` … `h8 = 63`, rank-major).
pub type PiecePlacement = [Option<Piece>; 64];

/// Payload the authority needs to reverse exactly one move.
///
/// The fields mirror what the rules engine saves before mutating its
/// position: the captured piece (if any), the castling rights and en-passant
/// square the move may destroy, and the half-move clock it may reset. The
/// session never interprets these; it only stores them in the ledger and
/// hands them back on undo. The version tag lets the authority reject tokens
/// it did not issue in the current format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoToken {
    pub version: u8,
    pub captured: Option<Piece>,
    pub castle_rights: u8,
    pub en_passant: Option<Square>,
    pub halfmove_clock: u32,
}

impl UndoToken {
    /// Current token format version.
    pub const VERSION: u8 = 1;

    /// Castle-rights bitmask bits.
    pub const WHITE_KING_SIDE: u8 = 1;
    pub const WHITE_QUEEN_SIDE: u8 = 2;
    pub const BLACK_KING_SIDE: u8 = 4;
    pub const BLACK_QUEEN_SIDE: u8 = 8;
}

/// Interface contract for the external rules engine.
///
/// The session treats the implementor as the single source of truth for
/// position state and move legality: it never derives a position locally,
/// only re-fetches after each mutation. Implementations must validate
/// `apply_move` against their own legal-move list and accept `undo_move`
/// only for the most recently applied move (single-step undo contract).
pub trait RulesAuthority {
    /// Error type for rejected moves and undos.
    type Error: std::fmt::Debug + std::fmt::Display;

    /// Reset to the starting position, discarding all applied moves.
    fn new_game(&mut self);

    /// Apply a currently legal move, returning the token that reverses it.
    fn apply_move(&mut self, descriptor: MoveDescriptor) -> Result<UndoToken, Self::Error>;

    /// Reverse exactly the move the token was issued for.
    fn undo_move(
        &mut self,
        descriptor: MoveDescriptor,
        token: &UndoToken,
    ) -> Result<(), Self::Error>;

    /// All legal moves in the current position.
    fn legal_moves(&self) -> Vec<MoveDescriptor>;

    /// Full board snapshot.
    fn pieces(&self) -> PiecePlacement;

    /// Positional notation string; the second space-delimited field is the
    /// side to move (`"w"` or `"b"`).
    fn position_fen(&self) -> String;

    fn in_check(&self) -> bool;
    fn is_checkmate(&self) -> bool;
    fn is_stalemate(&self) -> bool;
    fn is_insufficient_material(&self) -> bool;
    fn is_threefold_repetition(&self) -> bool;
    fn is_fifty_move_rule(&self) -> bool;
}
