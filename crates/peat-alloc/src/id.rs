//! Allocator identity: the kind tag and per-instance unique IDs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity tag distinguishing the allocator families.
///
/// Containers and debug assertions use the kind for diagnostics; the
/// capability surface is otherwise identical across kinds. `Temp` marks the
/// thread-local short-lived arena so that misuse reports can name it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AllocatorKind {
    /// General-purpose heap allocator wrapping the platform allocator.
    Heap,
    /// Page-chained bump allocator with scoped bulk reclamation.
    Arena,
    /// The thread-local default short-lived arena.
    Temp,
}

impl fmt::Display for AllocatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heap => write!(f, "heap"),
            Self::Arena => write!(f, "arena"),
            Self::Temp => write!(f, "temp"),
        }
    }
}

/// Counter for unique [`AllocatorId`] allocation.
static ALLOCATOR_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for an allocator.
///
/// Allocated from a monotonic atomic counter via [`AllocatorId::next`].
/// Two distinct allocator instances always have different IDs. Containers
/// record the ID of the allocator they were created against and assert it
/// on every mutation — transplanting a container across allocator instances
/// is a programmer error, and the ID check catches it without the container
/// holding a reference to its allocator.
///
/// ID `0` is reserved for [`Block::NULL`](crate::Block::NULL) and never
/// returned by [`AllocatorId::next`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AllocatorId(pub(crate) u64);

impl AllocatorId {
    /// Allocate a fresh, unique instance ID.
    ///
    /// Each call returns a new ID that has never been returned before
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(ALLOCATOR_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// The reserved null ID carried by [`Block::NULL`](crate::Block::NULL).
    pub(crate) const NULL: AllocatorId = AllocatorId(0);
}

impl fmt::Display for AllocatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_nonzero() {
        let a = AllocatorId::next();
        let b = AllocatorId::next();
        assert_ne!(a, b);
        assert_ne!(a, AllocatorId::NULL);
        assert_ne!(b, AllocatorId::NULL);
    }

    #[test]
    fn kind_display_names() {
        assert_eq!(AllocatorKind::Heap.to_string(), "heap");
        assert_eq!(AllocatorKind::Arena.to_string(), "arena");
        assert_eq!(AllocatorKind::Temp.to_string(), "temp");
    }
}
