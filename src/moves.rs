use std::fmt;

use shakmaty::Square;

/// Move subtype flags, carried in bits 12–15 of a [`MoveDescriptor`].
///
/// Values 0–7 are non-promotion subtypes; values ≥ 8 are promotions, where
/// the low two bits select the promoted piece and adding
/// [`flags::PROMOTION_CAPTURE_OFFSET`] marks a promotion that also captures.
pub mod flags {
    pub const QUIET: u16 = 0;
    pub const DOUBLE_PUSH: u16 = 1;
    pub const KING_CASTLE: u16 = 2;
    pub const QUEEN_CASTLE: u16 = 3;
    pub const CAPTURE: u16 = 4;
    pub const EN_PASSANT: u16 = 5;

    pub const KNIGHT_PROMOTION: u16 = 8;
    pub const BISHOP_PROMOTION: u16 = 9;
    pub const ROOK_PROMOTION: u16 = 10;
    pub const QUEEN_PROMOTION: u16 = 11;

    /// Added to a base promotion flag when the promotion also captures.
    pub const PROMOTION_CAPTURE_OFFSET: u16 = 4;
}

/// A move packed into 16 bits: `from` in bits 0–5, `to` in bits 6–11,
/// `flags` in bits 12–15.
///
/// Pure bit-packing; no legality or range validation is performed. Callers
/// must supply squares already in range and flags in `[0, 15]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveDescriptor(u16);

impl MoveDescriptor {
    /// Pack a move from its components.
    #[inline]
    pub fn new(from: Square, to: Square, flags: u16) -> Self {
        let from = u16::from(from) & 0x3F;
        let to = u16::from(to) & 0x3F;
        Self(from | (to << 6) | ((flags & 0xF) << 12))
    }

    /// Origin square, bits 0–5.
    #[inline]
    pub fn from(self) -> Square {
        Square::new(u32::from(self.0) & 0x3F)
    }

    /// Destination square, bits 6–11.
    #[inline]
    pub fn to(self) -> Square {
        Square::new((u32::from(self.0) >> 6) & 0x3F)
    }

    /// Flag nibble, bits 12–15.
    #[inline]
    pub fn flags(self) -> u16 {
        (self.0 >> 12) & 0xF
    }

    /// True if the capture flag bit is set (plain, en passant, or
    /// promotion captures).
    #[inline]
    pub fn is_capture(self) -> bool {
        self.flags() & flags::CAPTURE != 0
    }

    /// True for any promotion variant.
    #[inline]
    pub fn is_promotion(self) -> bool {
        self.flags() >= flags::KNIGHT_PROMOTION
    }

    /// The raw packed value.
    #[inline]
    pub fn raw(self) -> u16 {
        self.0
    }

    /// Reinterpret a raw 16-bit value as a descriptor.
    #[inline]
    pub fn from_raw(raw: u16) -> Self {
        Self(raw)
    }
}

impl fmt::Display for MoveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from(), self.to())
    }
}

impl fmt::Debug for MoveDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{} (flags {})", self.from(), self.to(), self.flags())
    }
}

/// Piece kind a player may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromotionChoice {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl PromotionChoice {
    /// Base (non-capture) promotion flag for this choice.
    #[inline]
    pub fn base_flag(self) -> u16 {
        match self {
            Self::Knight => flags::KNIGHT_PROMOTION,
            Self::Bishop => flags::BISHOP_PROMOTION,
            Self::Rook => flags::ROOK_PROMOTION,
            Self::Queen => flags::QUEEN_PROMOTION,
        }
    }
}
