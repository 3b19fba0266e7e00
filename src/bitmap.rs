use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::str::FromStr;

/// N-lane request/grant vector. Lane `i` is bit `i`, so index 0 is the
/// rightmost character in the textual form, as in an RTL `[N-1:0]` vector.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct ReqBitmap<const N: usize>(u64);

impl<const N: usize> ReqBitmap<N> {
    const fn lanes() -> u64 {
        const { assert!(N > 0 && N <= 64, "ReqBitmap supports 1..=64 lanes") };
        u64::MAX >> (64 - N)
    }

    pub const fn empty() -> Self {
        ReqBitmap(0)
    }

    pub const fn full() -> Self {
        ReqBitmap(Self::lanes())
    }

    /// Bits above lane `N-1` are dropped.
    pub const fn from_bits(bits: u64) -> Self {
        ReqBitmap(bits & Self::lanes())
    }

    pub fn one_hot(id: usize) -> Self {
        let mut b = Self::empty();
        b.set(id, true);
        b
    }

    /// Lane `i` is set when `slots[i]` holds a request. Slots past `N` are ignored.
    pub fn from_slots<T>(slots: &[Option<T>]) -> Self {
        slots
            .iter()
            .take(N)
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .fold(Self::empty(), |mut b, (i, _)| {
                b.set(i, true);
                b
            })
    }

    pub const fn bits(&self) -> u64 {
        self.0
    }

    pub fn bit(&self, id: usize) -> bool {
        id < N && (self.0 >> id) & 1 == 1
    }

    pub fn set(&mut self, id: usize, v: bool) {
        assert!(id < N, "lane {} out of range for {} lanes", id, N);
        if v {
            self.0 |= 1u64 << id;
        } else {
            self.0 &= !(1u64 << id);
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn count_ones(&self) -> u32 {
        self.0.count_ones()
    }

    /// Lowest set lane.
    pub const fn lowest(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        (0..N).filter(move |&i| self.bit(i))
    }
}

impl<const N: usize> BitAnd for ReqBitmap<N> {
    type Output = Self;
    fn bitand(self, rhs: Self) -> Self {
        ReqBitmap(self.0 & rhs.0)
    }
}

impl<const N: usize> BitOr for ReqBitmap<N> {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        ReqBitmap(self.0 | rhs.0)
    }
}

impl<const N: usize> Not for ReqBitmap<N> {
    type Output = Self;
    fn not(self) -> Self {
        Self::from_bits(!self.0)
    }
}

impl<const N: usize> fmt::Display for ReqBitmap<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..N).rev() {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Debug for ReqBitmap<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'b{}", N, self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseBitmapError {
    pub value: String,
    pub lanes: usize,
}

impl fmt::Display for ParseBitmapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is not a {}-lane bit vector (expect {} of '0'/'1', '_' allowed)",
            self.value, self.lanes, self.lanes
        )
    }
}

impl std::error::Error for ParseBitmapError {}

impl<const N: usize> FromStr for ReqBitmap<N> {
    type Err = ParseBitmapError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBitmapError {
            value: s.to_string(),
            lanes: N,
        };
        let digits = s.trim().chars().filter(|c| *c != '_').collect::<Vec<_>>();
        if digits.len() != N {
            return Err(err());
        }
        let mut b = Self::empty();
        for (i, c) in digits.iter().rev().enumerate() {
            match c {
                '0' => {}
                '1' => b.set(i, true),
                _ => return Err(err()),
            }
        }
        Ok(b)
    }
}
