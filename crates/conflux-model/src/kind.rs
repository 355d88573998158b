//! The kind lattice — spec §3 "Kind", §4.B.
//!
//! Kinds form a bounded lattice under bitwise `&` (meet) and `|` (join):
//! `bottom` is the empty set of bits, `top` is every bit set. `number` is
//! the compound `int | float`, matching CUE's own treatment of it as
//! neither a primitive nor a plain union.

use std::fmt;
use std::ops::{BitAnd, BitOr};

/// A set of basic kinds, packed as bits. Meet (`&`) narrows, join (`|`)
/// widens; both are commutative, associative, and idempotent.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Kind(u16);

impl Kind {
    pub const BOTTOM: Kind = Kind(0);
    pub const NULL: Kind = Kind(1 << 0);
    pub const BOOL: Kind = Kind(1 << 1);
    pub const INT: Kind = Kind(1 << 2);
    pub const FLOAT: Kind = Kind(1 << 3);
    pub const STRING: Kind = Kind(1 << 4);
    pub const BYTES: Kind = Kind(1 << 5);
    pub const LIST: Kind = Kind(1 << 6);
    pub const STRUCT: Kind = Kind(1 << 7);

    pub const NUMBER: Kind = Kind(Self::INT.0 | Self::FLOAT.0);
    pub const TOP: Kind = Kind(
        Self::NULL.0
            | Self::BOOL.0
            | Self::NUMBER.0
            | Self::STRING.0
            | Self::BYTES.0
            | Self::LIST.0
            | Self::STRUCT.0,
    );

    #[inline]
    pub fn meet(self, other: Kind) -> Kind {
        Kind(self.0 & other.0)
    }

    #[inline]
    pub fn join(self, other: Kind) -> Kind {
        Kind(self.0 | other.0)
    }

    #[inline]
    pub fn contains(self, other: Kind) -> bool {
        self.meet(other) == other
    }

    #[inline]
    pub fn intersects(self, other: Kind) -> bool {
        !self.meet(other).is_bottom()
    }

    #[inline]
    pub fn is_bottom(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_top(self) -> bool {
        self == Self::TOP
    }

    /// True when exactly one bit is set — a single concrete basic kind
    /// rather than a union like `number` or `top`.
    pub fn is_single(self) -> bool {
        self.0 != 0 && self.0 & (self.0 - 1) == 0
    }

    pub fn bits(self) -> u16 {
        self.0
    }
}

impl BitAnd for Kind {
    type Output = Kind;
    fn bitand(self, rhs: Kind) -> Kind {
        self.meet(rhs)
    }
}

impl BitOr for Kind {
    type Output = Kind;
    fn bitor(self, rhs: Kind) -> Kind {
        self.join(rhs)
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bottom() {
            return write!(f, "bottom");
        }
        if self.is_top() {
            return write!(f, "top");
        }
        if *self == Self::NUMBER {
            return write!(f, "number");
        }
        let names = [
            (Self::NULL, "null"),
            (Self::BOOL, "bool"),
            (Self::INT, "int"),
            (Self::FLOAT, "float"),
            (Self::STRING, "string"),
            (Self::BYTES, "bytes"),
            (Self::LIST, "list"),
            (Self::STRUCT, "struct"),
        ];
        let parts: Vec<&str> = names
            .iter()
            .filter(|(k, _)| self.contains(*k))
            .map(|(_, n)| *n)
            .collect();
        write!(f, "{}", parts.join("|"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meet_is_commutative_associative_idempotent() {
        let a = Kind::NUMBER;
        let b = Kind::INT;
        let c = Kind::TOP;
        assert_eq!(a.meet(b), b.meet(a));
        assert_eq!(a.meet(b).meet(c), a.meet(b.meet(c)));
        assert_eq!(a.meet(a), a);
    }

    #[test]
    fn number_is_int_or_float() {
        assert!(Kind::NUMBER.contains(Kind::INT));
        assert!(Kind::NUMBER.contains(Kind::FLOAT));
        assert!(!Kind::NUMBER.contains(Kind::STRING));
    }

    #[test]
    fn disjoint_kinds_meet_to_bottom() {
        assert!(Kind::INT.meet(Kind::STRING).is_bottom());
    }

    #[test]
    fn top_is_identity_for_meet() {
        assert_eq!(Kind::TOP.meet(Kind::STRUCT), Kind::STRUCT);
    }

    #[test]
    fn is_single_distinguishes_unions() {
        assert!(Kind::INT.is_single());
        assert!(!Kind::NUMBER.is_single());
        assert!(!Kind::BOTTOM.is_single());
    }

    #[test]
    fn debug_formatting() {
        assert_eq!(format!("{:?}", Kind::BOTTOM), "bottom");
        assert_eq!(format!("{:?}", Kind::TOP), "top");
        assert_eq!(format!("{:?}", Kind::NUMBER), "number");
        assert_eq!(format!("{:?}", Kind::INT), "int");
    }
}
