//! Allocator-specific error types.

use std::error::Error;
use std::fmt;

/// Reported allocation failure on a checked allocation path.
///
/// Every allocation primitive signals failure by returning a null-equivalent
/// (`None` or `Err`); `AllocError` carries the diagnostic detail for the
/// `Err` form used by checked container growth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AllocError {
    /// The platform allocator could not provide the requested memory.
    OutOfMemory {
        /// Number of bytes requested.
        requested: usize,
    },
    /// A size computation overflowed before any allocation was attempted.
    SizeOverflow {
        /// Element count of the failing request.
        count: usize,
        /// Element size of the failing request.
        size: usize,
    },
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "allocation of {requested} bytes failed")
            }
            Self::SizeOverflow { count, size } => {
                write!(f, "size computation overflowed: {count} x {size} bytes")
            }
        }
    }
}

impl Error for AllocError {}

/// A self-consistency violation found by [`ArenaAllocator::sanitize`].
///
/// Sanitize walks are a debug and test facility; a violation always means a
/// bug in the allocator or memory corruption by a caller, never an ordinary
/// runtime condition.
///
/// [`ArenaAllocator::sanitize`]: crate::ArenaAllocator::sanitize
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SanitizeError {
    /// A record starts before the previous record ended.
    RecordOverlap {
        /// Index of the page containing the records.
        page: usize,
        /// Index of the overlapping record within the page.
        record: usize,
    },
    /// A record extends past the page cursor or the page capacity.
    RecordOutOfBounds {
        /// Index of the offending page.
        page: usize,
        /// Index of the offending record within the page.
        record: usize,
    },
    /// A record's user region does not satisfy its recorded alignment.
    Misaligned {
        /// Index of the offending page.
        page: usize,
        /// Index of the offending record within the page.
        record: usize,
        /// The alignment the record claims.
        align: u32,
    },
    /// A page cursor points past the page capacity.
    CursorOutOfBounds {
        /// Index of the offending page.
        page: usize,
    },
    /// A freed or rolled-back region no longer holds the poison pattern.
    ///
    /// Only reported in debug builds, where freed regions are poisoned.
    PoisonDamaged {
        /// Index of the page containing the damaged region.
        page: usize,
        /// Byte offset of the first damaged byte within the page.
        offset: usize,
    },
}

impl fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RecordOverlap { page, record } => {
                write!(f, "page {page}: record {record} overlaps its predecessor")
            }
            Self::RecordOutOfBounds { page, record } => {
                write!(f, "page {page}: record {record} extends out of bounds")
            }
            Self::Misaligned {
                page,
                record,
                align,
            } => {
                write!(
                    f,
                    "page {page}: record {record} violates alignment {align}"
                )
            }
            Self::CursorOutOfBounds { page } => {
                write!(f, "page {page}: cursor past capacity")
            }
            Self::PoisonDamaged { page, offset } => {
                write!(f, "page {page}: poisoned byte at offset {offset} was overwritten")
            }
        }
    }
}

impl Error for SanitizeError {}
