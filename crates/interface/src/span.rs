use crate::BytePos;
use std::{cmp, fmt, ops::Range};

/// A source code location.
///
/// Essentially a `lo..hi` range into the source text of the method body being analyzed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    lo: BytePos,
    hi: BytePos,
}

impl Default for Span {
    #[inline(always)]
    fn default() -> Self {
        Self::DUMMY
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({lo}..{hi})", lo = self.lo.0, hi = self.hi.0)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.lo.0, self.hi.0)
    }
}

impl PartialOrd for Span {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Span {
    #[inline]
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        self.lo.cmp(&other.lo).then(self.hi.cmp(&other.hi))
    }
}

impl Span {
    /// A dummy span.
    pub const DUMMY: Self = Self { lo: BytePos(0), hi: BytePos(0) };

    /// Creates a new span from two byte positions.
    #[inline]
    pub fn new(mut lo: BytePos, mut hi: BytePos) -> Self {
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        Self { lo, hi }
    }

    /// Creates a new span from a `lo..hi` range of raw offsets.
    #[inline]
    pub fn from_range(range: Range<u32>) -> Self {
        Self::new(BytePos(range.start), BytePos(range.end))
    }

    /// Returns the span as a `Range<usize>`.
    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.lo.to_usize()..self.hi.to_usize()
    }

    /// Returns the span's start position.
    #[inline(always)]
    pub fn lo(self) -> BytePos {
        self.lo
    }

    /// Returns the span's end position.
    #[inline(always)]
    pub fn hi(self) -> BytePos {
        self.hi
    }

    /// Returns `true` if this is a dummy span.
    #[inline]
    pub fn is_dummy(self) -> bool {
        self == Self::DUMMY
    }

    /// Returns `true` if `self` fully encloses `other`.
    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.lo <= other.lo && other.hi <= self.hi
    }

    /// Returns a `Span` that would enclose both `self` and `end`.
    ///
    /// Dummy spans are ignored.
    ///
    /// ```text
    ///     ____             ___
    ///     self lorem ipsum end
    ///     ^^^^^^^^^^^^^^^^^^^^
    /// ```
    pub fn to(self, end: Self) -> Self {
        if self.is_dummy() {
            return end;
        }
        if end.is_dummy() {
            return self;
        }
        Self::new(cmp::min(self.lo, end.lo), cmp::max(self.hi, end.hi))
    }

    /// Joins all the spans in the given iterator using [`to`](Self::to).
    ///
    /// Returns [`DUMMY`](Self::DUMMY) if the iterator is empty.
    pub fn join_many(spans: impl IntoIterator<Item = Self>) -> Self {
        spans.into_iter().fold(Self::DUMMY, Self::to)
    }
}
