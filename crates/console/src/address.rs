// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Galaxy zone/output addressing.
//!
//! Operators and the panel name a zone by a 4-digit number `LRRP`: line
//! (1-4), RIO expander on that line (00-15) and point on that RIO (1-8 for
//! zones, 1-4 for outputs). The wire format packs the same triple into a
//! 1-based index, and the bulk state replies are bitmaps laid out one byte
//! per RIO (zones) or one nibble per RIO (outputs). The server and this
//! client must agree on these layouts bit for bit.

use std::fmt;

/// Number of lines (buses) on a panel.
pub const LINES: u8 = 4;
/// RIO expanders per line.
pub const RIOS_PER_LINE: u8 = 16;

/// Split a 4-digit number into `(line, rio, point)`.
///
/// `point_mask` is `points - 1` (7 for zones, 3 for outputs). Out-of-range
/// input wraps the same way the panel firmware does.
fn split(nr: u32, point_mask: i64) -> (u8, u8, u8) {
    let nr = i64::from(nr);
    let line = 1 + (((nr - 1000) / 1000) & 3);
    let rio = ((nr - line * 1000) / 10) & 15;
    let point = 1 + ((nr - line * 1000 - rio * 10 - 1) & point_mask);
    (line as u8, rio as u8, point as u8)
}

macro_rules! address_type {
    ($(#[$meta:meta])* $name:ident, points = $points:literal, shift = $shift:literal, label = $label:literal) => {
        $(#[$meta])*
        ///
        /// Only [`Self::new`], [`Self::decode`] and friends build one, so the
        /// components are always in range.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name {
            line: u8,
            rio: u8,
            point: u8,
        }

        impl $name {
            /// Points per RIO for this address kind.
            pub const POINTS: u8 = $points;

            pub fn line(&self) -> u8 {
                self.line
            }

            pub fn rio(&self) -> u8 {
                self.rio
            }

            pub fn point(&self) -> u8 {
                self.point
            }

            /// Build from components, rejecting anything outside the panel's range.
            pub fn new(line: u8, rio: u8, point: u8) -> Option<Self> {
                let valid = (1..=LINES).contains(&line)
                    && rio < RIOS_PER_LINE
                    && (1..=Self::POINTS).contains(&point);
                valid.then_some(Self { line, rio, point })
            }

            /// Decode a 4-digit number. Never fails; invalid digits wrap.
            pub fn decode(nr: u32) -> Self {
                let (line, rio, point) = split(nr, i64::from(Self::POINTS - 1));
                Self { line, rio, point }
            }

            /// The 4-digit number for this address.
            pub fn number(&self) -> u32 {
                u32::from(self.line) * 1000 + u32::from(self.rio) * 10 + u32::from(self.point)
            }

            /// 1-based packed index used on the wire.
            pub fn packed(&self) -> u16 {
                (u16::from(self.line - 1) << ($shift + 4))
                    + (u16::from(self.rio) << $shift)
                    + u16::from(self.point)
            }

            /// Inverse of [`Self::packed`]. Returns `None` for 0 or indices past the last point.
            pub fn from_packed(packed: u16) -> Option<Self> {
                let max = u16::from(LINES) * u16::from(RIOS_PER_LINE) * u16::from(Self::POINTS);
                if packed == 0 || packed > max {
                    return None;
                }
                let p = packed - 1;
                Some(Self {
                    line: (p >> ($shift + 4)) as u8 + 1,
                    rio: ((p >> $shift) & 15) as u8,
                    point: (p & (u16::from(Self::POINTS) - 1)) as u8 + 1,
                })
            }

            /// Parse operator input, accepting only numbers that name a real point.
            pub fn parse(s: &str) -> anyhow::Result<Self> {
                let nr: u32 = s
                    .trim()
                    .parse()
                    .map_err(|_| anyhow::anyhow!("invalid {} number: {s:?}", $label))?;
                let addr = Self::decode(nr);
                if addr.number() != nr {
                    anyhow::bail!("{} {nr} does not exist (nearest is {addr})", $label);
                }
                Ok(addr)
            }

            /// The RIO this point belongs to.
            pub fn rio_address(&self) -> RioAddress {
                RioAddress { line: self.line, rio: self.rio }
            }

            /// Every address from `start` to `end` inclusive, in panel order.
            ///
            /// Reversed bounds are swapped. Steps over RIO and line boundaries.
            pub fn range(start: Self, end: Self) -> impl Iterator<Item = Self> {
                let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
                (lo.packed()..=hi.packed()).filter_map(Self::from_packed)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.number())
            }
        }
    };
}

address_type!(
    /// A zone (sensor input): 8 points per RIO.
    ZoneAddress, points = 8, shift = 3, label = "zone"
);

address_type!(
    /// An output (relay): 4 points per RIO.
    OutputAddress, points = 4, shift = 2, label = "output"
);

impl ZoneAddress {
    /// Whether this zone's bit is set in a bulk zone bitmap.
    pub fn is_set(&self, bitmap: &[u8]) -> bool {
        self.rio_address().zone_bits(bitmap) & (1 << (self.point - 1)) != 0
    }
}

impl OutputAddress {
    /// Whether this output is on in a packed output-state array.
    pub fn is_set(&self, outputs: &[u8]) -> bool {
        self.rio_address().output_bits(outputs) & (1 << (self.point - 1)) != 0
    }
}

/// A RIO expander, written by operators as 3 digits `LRR` (e.g. `101`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RioAddress {
    line: u8,
    rio: u8,
}

impl RioAddress {
    pub fn new(line: u8, rio: u8) -> Option<Self> {
        ((1..=LINES).contains(&line) && rio < RIOS_PER_LINE).then_some(Self { line, rio })
    }

    pub fn line(&self) -> u8 {
        self.line
    }

    pub fn rio(&self) -> u8 {
        self.rio
    }

    /// Decode a 3-digit RIO number.
    pub fn decode(nr: u32) -> Self {
        let nr = i64::from(nr);
        let line = 1 + (((nr - 100) / 100) & 3);
        let rio = (nr - line * 100) & 15;
        Self { line: line as u8, rio: rio as u8 }
    }

    pub fn number(&self) -> u32 {
        u32::from(self.line) * 100 + u32::from(self.rio)
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let nr: u32 =
            s.trim().parse().map_err(|_| anyhow::anyhow!("invalid RIO number: {s:?}"))?;
        let addr = Self::decode(nr);
        if addr.number() != nr {
            anyhow::bail!("RIO {nr} does not exist");
        }
        Ok(addr)
    }

    /// Byte offset of this RIO in a bulk zone bitmap (index 0 is unused).
    pub fn zone_index(&self) -> usize {
        (usize::from(self.line - 1) << 4) + usize::from(self.rio) + 1
    }

    /// Byte offset of this RIO in the packed output array.
    pub fn output_index(&self) -> usize {
        (usize::from(self.line - 1) << 3) + usize::from(self.rio >> 1)
    }

    /// The 8 zone bits for this RIO. Missing bytes read as zero.
    pub fn zone_bits(&self, bitmap: &[u8]) -> u8 {
        bitmap.get(self.zone_index()).copied().unwrap_or(0)
    }

    /// The 4 output bits for this RIO: high nibble for odd RIOs.
    pub fn output_bits(&self, outputs: &[u8]) -> u8 {
        let byte = outputs.get(self.output_index()).copied().unwrap_or(0);
        if self.rio & 1 == 1 {
            byte >> 4
        } else {
            byte & 15
        }
    }

    /// All RIOs on the panel in order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=LINES).flat_map(|line| (0..RIOS_PER_LINE).map(move |rio| Self { line, rio }))
    }
}

impl fmt::Display for RioAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
#[path = "address_tests.rs"]
mod tests;
