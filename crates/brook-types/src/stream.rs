//! Stream identifiers.

use std::fmt;

/// Identifier of a record stream participating in a query.
///
/// Stream numbers are assigned densely by the enclosing compiler, starting at
/// zero, and double as indexes into the per-query scratch table. They carry
/// identity only; no arithmetic is defined on them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct StreamId(u32);

impl StreamId {
    /// Create a stream identifier from its raw number.
    #[inline]
    #[must_use]
    pub const fn new(n: u32) -> Self {
        Self(n)
    }

    /// Get the raw number.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The identifier as an index into per-query tables.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for StreamId {
    fn from(n: u32) -> Self {
        Self(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_id_roundtrip() {
        let s = StreamId::new(7);
        assert_eq!(s.get(), 7);
        assert_eq!(s.index(), 7);
        assert_eq!(StreamId::from(7), s);
    }

    #[test]
    fn test_stream_id_display() {
        assert_eq!(StreamId::new(3).to_string(), "3");
    }

    #[test]
    fn test_stream_id_ordering() {
        assert!(StreamId::new(1) < StreamId::new(2));
        assert_eq!(StreamId::new(5), StreamId::new(5));
    }
}
