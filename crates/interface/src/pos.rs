use std::{
    fmt,
    ops::{Add, Sub},
};

/// A byte offset into the source text a tree was built from.
///
/// Trees built programmatically (for example in tests) use offsets that only need to be
/// consistent with each other.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BytePos(pub u32);

impl fmt::Debug for BytePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BytePos({})", self.0)
    }
}

impl BytePos {
    #[inline(always)]
    pub fn from_u32(n: u32) -> Self {
        Self(n)
    }

    #[inline(always)]
    pub fn from_usize(n: usize) -> Self {
        Self(n as u32)
    }

    #[inline(always)]
    pub fn to_u32(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub fn to_usize(self) -> usize {
        self.0 as usize
    }
}

impl Add<u32> for BytePos {
    type Output = Self;

    #[inline(always)]
    fn add(self, rhs: u32) -> Self {
        Self(self.0 + rhs)
    }
}

impl Sub for BytePos {
    type Output = u32;

    #[inline(always)]
    fn sub(self, rhs: Self) -> u32 {
        self.0 - rhs.0
    }
}
