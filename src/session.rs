use std::fmt;

use log::debug;
use shakmaty::{Color, Piece, Role, Square};
use thiserror::Error;

use crate::annotations::Annotations;
use crate::ledger::{LedgerEntry, MoveLedger};
use crate::moves::{MoveDescriptor, PromotionChoice, flags};
use crate::{PiecePlacement, RulesAuthority};

/// Internal-consistency failure between the session and its authority.
///
/// User-level mistakes (clicking an empty square, undoing at the start) are
/// silent no-ops and never produce these. A `SessionError` means the
/// authority rejected something the session itself sourced from the
/// authority, which is a desynchronization bug, not a recoverable condition.
#[derive(Debug, Error)]
pub enum SessionError<E: fmt::Debug + fmt::Display> {
    #[error("authority rejected {descriptor:?} from its own legal move list: {reason}")]
    MoveRejected {
        descriptor: MoveDescriptor,
        reason: E,
    },
    #[error("authority rejected undo of {descriptor:?}: {reason}")]
    UndoRejected {
        descriptor: MoveDescriptor,
        reason: E,
    },
    #[error("board snapshot lost the piece on {0}")]
    MissingPiece(Square),
}

/// How a finished game ended, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverKind {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
    FiftyMoveRule,
}

impl fmt::Display for GameOverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Checkmate => "checkmate",
            Self::Stalemate => "stalemate",
            Self::InsufficientMaterial => "insufficient material",
            Self::ThreefoldRepetition => "threefold repetition",
            Self::FiftyMoveRule => "fifty-move rule",
        })
    }
}

/// Terminal-state snapshot; `winner` is set only for checkmate and credits
/// the side that delivered mate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameOver {
    pub winner: Option<Color>,
    pub kind: GameOverKind,
}

/// A move awaiting the player's promotion piece choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingPromotion {
    pub from: Square,
    pub to: Square,
}

/// Coordinator that keeps the visible board, the move ledger, and the
/// annotation layer consistent with the external rules authority.
///
/// All mutation goes through this type's methods; after every position
/// change the board snapshot and derived state (check highlight, last move,
/// terminal state) are re-fetched from the authority rather than inferred
/// from the move itself, since captures, castling, and en passant move
/// pieces the descriptor does not mention.
#[derive(Debug)]
pub struct GameSession<A: RulesAuthority> {
    authority: A,
    ledger: MoveLedger,
    annotations: Annotations,

    pieces: PiecePlacement,
    side_to_move: Color,

    selected: Option<Square>,
    candidates: Vec<MoveDescriptor>,
    pending_promotion: Option<PendingPromotion>,

    last_move: Option<(Square, Square)>,
    check_square: Option<Square>,
    game_over: Option<GameOver>,
}

impl<A: RulesAuthority> GameSession<A> {
    pub fn new(authority: A) -> Self {
        let mut session = Self {
            authority,
            ledger: MoveLedger::new(),
            annotations: Annotations::new(),
            pieces: [None; 64],
            side_to_move: Color::White,
            selected: None,
            candidates: Vec::new(),
            pending_promotion: None,
            last_move: None,
            check_square: None,
            game_over: None,
        };
        session.refresh_derived();
        session
    }

    /// Handle a primary click (or drag drop) on a square.
    ///
    /// With nothing selected this attempts to select a piece of the side to
    /// move; with a selection it attempts to complete a move to `square`.
    /// Either way any study annotations are cleared, and clicks are ignored
    /// while a promotion choice is pending.
    pub fn click_square(&mut self, square: Square) -> Result<(), SessionError<A::Error>> {
        if self.pending_promotion.is_some() {
            return Ok(());
        }
        self.annotations.clear();

        if self.selected.is_none() {
            self.select_piece(square);
            Ok(())
        } else {
            self.try_move(square)
        }
    }

    /// Select a piece and fetch its legal destinations. Empty squares and
    /// opponent pieces are silent no-ops.
    fn select_piece(&mut self, square: Square) {
        let Some(piece) = self.pieces[usize::from(square)] else {
            return;
        };
        if piece.color != self.side_to_move {
            return;
        }

        self.candidates = self
            .authority
            .legal_moves()
            .into_iter()
            .filter(|d| d.from() == square)
            .collect();
        self.selected = Some(square);
    }

    /// Complete a move attempt to `to`. A destination that matches no
    /// candidate just clears the selection.
    fn try_move(&mut self, to: Square) -> Result<(), SessionError<A::Error>> {
        let Some(from) = self.selected else {
            return Ok(());
        };
        let Some(descriptor) = self
            .candidates
            .iter()
            .copied()
            .find(|d| d.from() == from && d.to() == to)
        else {
            self.clear_selection();
            return Ok(());
        };

        if descriptor.is_promotion() {
            // Park the move; the final flag depends on the piece choice and
            // on destination occupancy, resolved in `resolve_promotion`.
            self.pending_promotion = Some(PendingPromotion { from, to });
            self.clear_selection();
            return Ok(());
        }

        self.clear_selection();
        self.apply(descriptor, from, to)
    }

    /// Resolve a pending promotion with the chosen piece.
    ///
    /// Occupancy of the destination decides between the capture and plain
    /// promotion flag, read from the snapshot preceding the move — after the
    /// move the promoted piece itself occupies the square.
    pub fn resolve_promotion(
        &mut self,
        choice: PromotionChoice,
    ) -> Result<(), SessionError<A::Error>> {
        let Some(PendingPromotion { from, to }) = self.pending_promotion.take() else {
            return Ok(());
        };

        let base = choice.base_flag();
        let flag = if self.pieces[usize::from(to)].is_some() {
            base + flags::PROMOTION_CAPTURE_OFFSET
        } else {
            base
        };
        self.apply(MoveDescriptor::new(from, to, flag), from, to)
    }

    /// Submit a descriptor to the authority and record it in the ledger,
    /// truncating any retained redo branch.
    fn apply(
        &mut self,
        descriptor: MoveDescriptor,
        from: Square,
        to: Square,
    ) -> Result<(), SessionError<A::Error>> {
        let piece = self.pieces[usize::from(from)].ok_or(SessionError::MissingPiece(from))?;
        self.annotations.clear();

        let token = self
            .authority
            .apply_move(descriptor)
            .map_err(|reason| SessionError::MoveRejected { descriptor, reason })?;
        debug!("applied {descriptor:?}");

        self.ledger.append(LedgerEntry {
            from,
            to,
            piece,
            descriptor,
            undo: token,
        });
        self.refresh_derived();
        Ok(())
    }

    /// Take back the most recent move. A no-op at the starting position.
    pub fn undo(&mut self) -> Result<(), SessionError<A::Error>> {
        if !self.ledger.can_undo() {
            return Ok(());
        }
        self.step_undo()?;
        self.refresh_derived();
        Ok(())
    }

    /// Re-apply the next retained move. A no-op at the ledger tail.
    pub fn redo(&mut self) -> Result<(), SessionError<A::Error>> {
        if !self.ledger.can_redo() {
            return Ok(());
        }
        self.step_redo()?;
        self.refresh_derived();
        Ok(())
    }

    /// Rewind or replay to the given ledger index (`None` = starting
    /// position) as a strictly sequential chain of single-step undos or
    /// redos; the authority only ever reverses its top-of-stack move.
    /// Out-of-range targets are silent no-ops. Derived state is refreshed
    /// once, after the whole chain completes.
    pub fn jump_to(&mut self, target: Option<usize>) -> Result<(), SessionError<A::Error>> {
        if target.is_some_and(|t| t >= self.ledger.len()) {
            return Ok(());
        }

        let ordinal = |index: Option<usize>| index.map_or(-1, |i| i as i64);
        let goal = ordinal(target);
        if ordinal(self.ledger.current_index()) == goal {
            return Ok(());
        }
        debug!("jumping from {:?} to {target:?}", self.ledger.current_index());

        while ordinal(self.ledger.current_index()) > goal {
            self.step_undo()?;
        }
        while ordinal(self.ledger.current_index()) < goal {
            self.step_redo()?;
        }
        self.refresh_derived();
        Ok(())
    }

    /// Reset the authority and every piece of session state.
    pub fn reset(&mut self) {
        debug!("starting a new game");
        self.authority.new_game();
        self.ledger.clear();
        self.annotations.clear();
        self.selected = None;
        self.candidates.clear();
        self.pending_promotion = None;
        self.refresh_derived();
    }

    /// Undo one ledger step against the authority, without refreshing
    /// derived state. Caller has checked `can_undo`.
    fn step_undo(&mut self) -> Result<(), SessionError<A::Error>> {
        let Some(entry) = self.ledger.current_entry() else {
            return Ok(());
        };
        let descriptor = entry.descriptor;
        self.authority
            .undo_move(descriptor, &entry.undo)
            .map_err(|reason| SessionError::UndoRejected { descriptor, reason })?;
        debug!("undid {descriptor:?}");
        self.ledger.step_back();
        Ok(())
    }

    /// Redo one ledger step, storing the fresh token the authority issued in
    /// place of the stale one. Caller has checked `can_redo`.
    fn step_redo(&mut self) -> Result<(), SessionError<A::Error>> {
        let index = self.ledger.current_index().map_or(0, |i| i + 1);
        let descriptor = self.ledger.entry(index).descriptor;
        let token = self
            .authority
            .apply_move(descriptor)
            .map_err(|reason| SessionError::MoveRejected { descriptor, reason })?;
        debug!("redid {descriptor:?}");
        self.ledger.refresh_undo_token(index, token);
        self.ledger.step_forward();
        Ok(())
    }

    fn clear_selection(&mut self) {
        self.selected = None;
        self.candidates.clear();
    }

    /// Re-fetch the board and recompute all derived state from the
    /// authority's fresh position.
    ///
    /// `in_check` is queried before the snapshot and the position string so
    /// all three describe the same position with no intervening mutation.
    fn refresh_derived(&mut self) {
        let in_check = self.authority.in_check();
        self.pieces = self.authority.pieces();
        let fen = self.authority.position_fen();
        self.side_to_move = side_to_move_from_fen(&fen);

        self.check_square = if in_check {
            self.find_king(self.side_to_move)
        } else {
            None
        };
        self.last_move = self.ledger.current_entry().map(|e| (e.from, e.to));
        self.game_over = self.evaluate_game_over();
    }

    fn find_king(&self, color: Color) -> Option<Square> {
        let king = Piece {
            color,
            role: Role::King,
        };
        self.pieces
            .iter()
            .position(|p| *p == Some(king))
            .map(|i| Square::new(i as u32))
    }

    /// Query terminal conditions in priority order; checkmate beats every
    /// draw condition. On checkmate the winner is the side not to move in
    /// the position just reached.
    fn evaluate_game_over(&self) -> Option<GameOver> {
        let kind = if self.authority.is_checkmate() {
            GameOverKind::Checkmate
        } else if self.authority.is_stalemate() {
            GameOverKind::Stalemate
        } else if self.authority.is_insufficient_material() {
            GameOverKind::InsufficientMaterial
        } else if self.authority.is_threefold_repetition() {
            GameOverKind::ThreefoldRepetition
        } else if self.authority.is_fifty_move_rule() {
            GameOverKind::FiftyMoveRule
        } else {
            return None;
        };

        let winner = (kind == GameOverKind::Checkmate).then(|| !self.side_to_move);
        Some(GameOver { winner, kind })
    }

    // --- annotations -----------------------------------------------------

    pub fn toggle_mark(&mut self, square: Square) {
        self.annotations.toggle_mark(square);
    }

    pub fn toggle_arrow(&mut self, from: Square, to: Square) {
        self.annotations.toggle_arrow(from, to);
    }

    #[inline]
    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    // --- read accessors --------------------------------------------------

    #[inline]
    pub fn pieces(&self) -> &PiecePlacement {
        &self.pieces
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.pieces[usize::from(square)]
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn selected_square(&self) -> Option<Square> {
        self.selected
    }

    /// Legal destinations from the selected square.
    pub fn destinations(&self) -> impl Iterator<Item = Square> + '_ {
        self.candidates.iter().map(|d| d.to())
    }

    pub fn is_destination(&self, square: Square) -> bool {
        self.candidates.iter().any(|d| d.to() == square)
    }

    #[inline]
    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    #[inline]
    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    /// Square of the side-to-move's king when it stands in check.
    #[inline]
    pub fn check_square(&self) -> Option<Square> {
        self.check_square
    }

    #[inline]
    pub fn game_over(&self) -> Option<GameOver> {
        self.game_over
    }

    /// All ledger entries, applied and future alike, for history panes.
    #[inline]
    pub fn history(&self) -> &[LedgerEntry] {
        self.ledger.entries()
    }

    #[inline]
    pub fn current_move_index(&self) -> Option<usize> {
        self.ledger.current_index()
    }

    #[inline]
    pub fn can_undo(&self) -> bool {
        self.ledger.can_undo()
    }

    #[inline]
    pub fn can_redo(&self) -> bool {
        self.ledger.can_redo()
    }

    /// Position string for export.
    pub fn position_fen(&self) -> String {
        self.authority.position_fen()
    }
}

/// Side to move from the second space-delimited field of a position string.
fn side_to_move_from_fen(fen: &str) -> Color {
    match fen.split_whitespace().nth(1) {
        Some("b") => Color::Black,
        _ => Color::White,
    }
}
