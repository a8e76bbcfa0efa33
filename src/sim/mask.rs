//! Four-way connectivity masks
//!
//! A mask is a 4-bit set of connector directions:
//! - bit 0 (1): North
//! - bit 1 (2): East
//! - bit 2 (4): South
//! - bit 3 (8): West
//!
//! Rotation is clockwise in 90° steps: W -> N, N -> E, E -> S, S -> W.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A connector direction on a tile edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All directions in bit order
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Bit value of this direction inside a mask
    #[inline]
    pub fn bit(self) -> u8 {
        match self {
            Direction::North => 1,
            Direction::East => 2,
            Direction::South => 4,
            Direction::West => 8,
        }
    }

    /// Direction after a single clockwise quarter turn
    pub fn clockwise(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }
}

/// Connectivity mask of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Mask(u8);

impl Mask {
    pub const EMPTY: Mask = Mask(0);
    pub const ALL: Mask = Mask(0xF);

    /// Build a mask from raw bits, rejecting anything above 4 bits
    pub fn new(bits: u8) -> Result<Self, ConfigError> {
        if bits > 0xF {
            return Err(ConfigError::InvalidMask(bits));
        }
        Ok(Self(bits))
    }

    /// Build a mask from raw bits, dropping anything above 4 bits
    #[inline]
    pub const fn truncate(bits: u8) -> Self {
        Self(bits & 0xF)
    }

    /// Build a mask from a set of directions
    pub fn from_directions(dirs: &[Direction]) -> Self {
        Self(dirs.iter().fold(0, |acc, d| acc | d.bit()))
    }

    #[inline]
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Whether the mask has a connector facing `dir`
    #[inline]
    pub fn connects(self, dir: Direction) -> bool {
        self.0 & dir.bit() != 0
    }

    /// Rotate one quarter turn clockwise
    pub fn rotate_cw(self) -> Self {
        let mut out = 0;
        for dir in Direction::ALL {
            if self.connects(dir) {
                out |= dir.clockwise().bit();
            }
        }
        Self(out)
    }

    /// Rotate clockwise `steps` quarter turns (taken mod 4)
    pub fn rotated(self, steps: u8) -> Self {
        (0..steps % 4).fold(self, |m, _| m.rotate_cw())
    }
}

impl TryFrom<u8> for Mask {
    type Error = ConfigError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        Mask::new(bits)
    }
}

impl From<Mask> for u8 {
    fn from(mask: Mask) -> u8 {
        mask.0
    }
}

impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letters = ['N', 'E', 'S', 'W'];
        let mut any = false;
        for (dir, letter) in Direction::ALL.iter().zip(letters) {
            if self.connects(*dir) {
                write!(f, "{letter}")?;
                any = true;
            }
        }
        if !any {
            write!(f, "-")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rotate_single_bits() {
        let n = Mask::from_directions(&[Direction::North]);
        assert_eq!(n.rotate_cw(), Mask::truncate(2));
        assert_eq!(Mask::truncate(2).rotate_cw(), Mask::truncate(4));
        assert_eq!(Mask::truncate(4).rotate_cw(), Mask::truncate(8));
        // West wraps back to North
        assert_eq!(Mask::truncate(8).rotate_cw(), Mask::truncate(1));
    }

    #[test]
    fn test_rotate_straight_and_corner() {
        // W+E straight becomes N+S
        assert_eq!(Mask::truncate(10).rotate_cw(), Mask::truncate(5));
        // S+E corner (6) turns into S+W (12)
        assert_eq!(Mask::truncate(6).rotate_cw(), Mask::truncate(12));
        assert_eq!(Mask::truncate(6).rotated(3), Mask::truncate(3));
    }

    #[test]
    fn test_new_rejects_high_bits() {
        assert!(Mask::new(15).is_ok());
        assert!(matches!(Mask::new(16), Err(ConfigError::InvalidMask(16))));
    }

    #[test]
    fn test_serde_uses_raw_bits() {
        let mask: Mask = serde_json::from_str("9").unwrap();
        assert_eq!(mask.to_string(), "NW");
        assert_eq!(serde_json::to_string(&mask).unwrap(), "9");
        assert!(serde_json::from_str::<Mask>("31").is_err());
    }

    proptest! {
        #[test]
        fn prop_rotate_then_inverse_is_identity(bits in 0u8..16, k in 0u8..4) {
            let m = Mask::truncate(bits);
            prop_assert_eq!(m.rotated(k).rotated((4 - k) % 4), m);
        }

        #[test]
        fn prop_four_turns_is_identity(bits in 0u8..16) {
            let m = Mask::truncate(bits);
            prop_assert_eq!(m.rotate_cw().rotate_cw().rotate_cw().rotate_cw(), m);
        }

        #[test]
        fn prop_rotation_keeps_connector_count(bits in 0u8..16, k in 0u8..8) {
            let m = Mask::truncate(bits);
            prop_assert_eq!(m.rotated(k).bits().count_ones(), m.bits().count_ones());
        }
    }
}
