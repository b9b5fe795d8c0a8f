use shakmaty::{
    CastlingSide, Chess, Color, EnPassantMode, File, Move, Piece, Position, Role, Square, fen::Fen,
};
use thiserror::Error;

use crate::moves::{MoveDescriptor, flags};
use crate::{PiecePlacement, RulesAuthority, UndoToken};

/// Error type for rejected authority operations.
///
/// Any of these reaching the session indicates a ledger/authority
/// desynchronization, not a user mistake.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthorityError {
    #[error("move {0:?} is not legal in the current position")]
    IllegalMove(MoveDescriptor),
    #[error("undo token does not match the last applied move {0:?}")]
    TokenMismatch(MoveDescriptor),
    #[error("no applied move to undo")]
    NothingToUndo,
}

/// A move applied to the live position, retained for single-step undo.
#[derive(Debug, Clone)]
struct AppliedMove {
    descriptor: MoveDescriptor,
    token: UndoToken,
    previous: Chess,
}

/// Reference [`RulesAuthority`] backed by `shakmaty`.
///
/// Keeps the live position plus a stack of applied moves. Undo only accepts
/// the descriptor and token of the top entry; anything else is rejected as a
/// [`AuthorityError::TokenMismatch`].
#[derive(Debug, Clone, Default)]
pub struct ShakmatyAuthority {
    position: Chess,
    applied: Vec<AppliedMove>,
}

impl ShakmatyAuthority {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an authority from an existing position (FEN loading, tests).
    pub fn from_position(position: Chess) -> Self {
        Self {
            position,
            applied: Vec::new(),
        }
    }

    fn castle_rights_mask(&self) -> u8 {
        let castles = self.position.castles();
        let mut mask = 0;
        if castles.has(Color::White, CastlingSide::KingSide) {
            mask |= UndoToken::WHITE_KING_SIDE;
        }
        if castles.has(Color::White, CastlingSide::QueenSide) {
            mask |= UndoToken::WHITE_QUEEN_SIDE;
        }
        if castles.has(Color::Black, CastlingSide::KingSide) {
            mask |= UndoToken::BLACK_KING_SIDE;
        }
        if castles.has(Color::Black, CastlingSide::QueenSide) {
            mask |= UndoToken::BLACK_QUEEN_SIDE;
        }
        mask
    }

    /// Build the undo token from the position as it stands before the move.
    fn token_for(&self, mv: &Move) -> UndoToken {
        UndoToken {
            version: UndoToken::VERSION,
            captured: mv.capture().map(|role| Piece {
                color: !self.position.turn(),
                role,
            }),
            castle_rights: self.castle_rights_mask(),
            en_passant: self.position.ep_square(EnPassantMode::Always),
            halfmove_clock: self.position.halfmoves(),
        }
    }

    /// Repetition-relevant identity of a position: placement, turn, castling
    /// rights, and (legal) en-passant square, clocks excluded.
    fn repetition_key(position: &Chess) -> String {
        let fen = Fen::from_position(position, EnPassantMode::Legal).to_string();
        fen.split(' ').take(4).collect::<Vec<_>>().join(" ")
    }
}

impl RulesAuthority for ShakmatyAuthority {
    type Error = AuthorityError;

    fn new_game(&mut self) {
        self.position = Chess::default();
        self.applied.clear();
    }

    fn apply_move(&mut self, descriptor: MoveDescriptor) -> Result<UndoToken, Self::Error> {
        let mv = self
            .position
            .legal_moves()
            .into_iter()
            .find(|mv| descriptor_for(mv) == descriptor)
            .ok_or(AuthorityError::IllegalMove(descriptor))?;

        let token = self.token_for(&mv);
        let previous = self.position.clone();
        self.position.play_unchecked(mv);
        self.applied.push(AppliedMove {
            descriptor,
            token: token.clone(),
            previous,
        });
        Ok(token)
    }

    fn undo_move(
        &mut self,
        descriptor: MoveDescriptor,
        token: &UndoToken,
    ) -> Result<(), Self::Error> {
        match self.applied.pop() {
            Some(last)
                if last.descriptor == descriptor
                    && last.token == *token
                    && token.version == UndoToken::VERSION =>
            {
                self.position = last.previous;
                Ok(())
            }
            Some(last) => {
                self.applied.push(last);
                Err(AuthorityError::TokenMismatch(descriptor))
            }
            None => Err(AuthorityError::NothingToUndo),
        }
    }

    fn legal_moves(&self) -> Vec<MoveDescriptor> {
        self.position.legal_moves().iter().map(descriptor_for).collect()
    }

    fn pieces(&self) -> PiecePlacement {
        let mut placement = [None; 64];
        for square in Square::ALL {
            placement[usize::from(square)] = self.position.board().piece_at(square);
        }
        placement
    }

    fn position_fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Always).to_string()
    }

    fn in_check(&self) -> bool {
        self.position.is_check()
    }

    fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    fn is_insufficient_material(&self) -> bool {
        self.position.has_insufficient_material(Color::White)
            && self.position.has_insufficient_material(Color::Black)
    }

    fn is_threefold_repetition(&self) -> bool {
        let key = Self::repetition_key(&self.position);
        let earlier = self
            .applied
            .iter()
            .filter(|a| Self::repetition_key(&a.previous) == key)
            .count();
        earlier + 1 >= 3
    }

    fn is_fifty_move_rule(&self) -> bool {
        self.position.halfmoves() >= 100
    }
}

/// Describe a `shakmaty` move in the 16-bit wire format.
///
/// Castling is described from the king's perspective: the destination is the
/// king's target square (g- or c-file), not the rook square `shakmaty` uses.
fn descriptor_for(mv: &Move) -> MoveDescriptor {
    match *mv {
        Move::Normal {
            role,
            from,
            capture,
            to,
            promotion,
        } => {
            let fl = match promotion {
                Some(promoted) => {
                    let base = match promoted {
                        Role::Knight => flags::KNIGHT_PROMOTION,
                        Role::Bishop => flags::BISHOP_PROMOTION,
                        Role::Rook => flags::ROOK_PROMOTION,
                        _ => flags::QUEEN_PROMOTION,
                    };
                    if capture.is_some() {
                        base + flags::PROMOTION_CAPTURE_OFFSET
                    } else {
                        base
                    }
                }
                None if capture.is_some() => flags::CAPTURE,
                None if role == Role::Pawn
                    && u32::from(from.rank()).abs_diff(u32::from(to.rank())) == 2 =>
                {
                    flags::DOUBLE_PUSH
                }
                None => flags::QUIET,
            };
            MoveDescriptor::new(from, to, fl)
        }
        Move::EnPassant { from, to } => MoveDescriptor::new(from, to, flags::EN_PASSANT),
        Move::Castle { king, rook } if rook.file() > king.file() => MoveDescriptor::new(
            king,
            Square::from_coords(File::G, king.rank()),
            flags::KING_CASTLE,
        ),
        Move::Castle { king, .. } => MoveDescriptor::new(
            king,
            Square::from_coords(File::C, king.rank()),
            flags::QUEEN_CASTLE,
        ),
        // Drops exist only in variants; standard chess never generates them.
        Move::Put { to, .. } => MoveDescriptor::new(to, to, flags::QUIET),
    }
}
