//! Opaque allocation handles.
//!
//! A [`Block`] identifies one live allocation within the allocator that
//! produced it. It replaces the raw pointers of a conventional allocator
//! API: callers never see addresses, only handles, and resolve them to byte
//! slices through [`Allocator::data`]/[`Allocator::data_mut`]. Presenting a
//! block to an allocator that did not create it is a programmer error and
//! panics at resolution time.
//!
//! [`Allocator::data`]: crate::Allocator::data
//! [`Allocator::data_mut`]: crate::Allocator::data_mut

use std::fmt;

use crate::id::AllocatorId;

/// Handle to a single allocation.
///
/// Blocks are small `Copy` values. They carry the ID of the allocator that
/// issued them so that cross-allocator misuse is caught at the first
/// resolution rather than corrupting unrelated memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[must_use]
pub struct Block {
    /// ID of the issuing allocator (the null ID for [`Block::NULL`]).
    pub(crate) owner: AllocatorId,
    /// Physical location within the issuing allocator.
    pub(crate) repr: BlockRepr,
}

/// Where a block's bytes live. Internal to the allocator implementations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockRepr {
    /// The null block.
    Null,
    /// A heap allocation: index into the heap allocator's slab.
    Heap {
        /// Slab slot holding the backing buffer and its offset record.
        slot: u32,
    },
    /// An arena allocation: page index plus record index within the page.
    Arena {
        /// Index into the arena's page list.
        page: u32,
        /// Index into the page's allocation record table.
        record: u32,
    },
}

impl Block {
    /// The null block: the handle equivalent of a null pointer.
    ///
    /// Returned by nothing, accepted by [`release`](crate::Allocator::release)
    /// (as a no-op) and [`reallocate`](crate::Allocator::reallocate) (as a
    /// plain allocation). Resolving it to data panics.
    pub const NULL: Block = Block {
        owner: AllocatorId::NULL,
        repr: BlockRepr::Null,
    };

    /// Whether this is the null block.
    pub fn is_null(&self) -> bool {
        matches!(self.repr, BlockRepr::Null)
    }

    pub(crate) fn heap(owner: AllocatorId, slot: u32) -> Self {
        Self {
            owner,
            repr: BlockRepr::Heap { slot },
        }
    }

    pub(crate) fn arena(owner: AllocatorId, page: u32, record: u32) -> Self {
        Self {
            owner,
            repr: BlockRepr::Arena { page, record },
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.repr {
            BlockRepr::Null => write!(f, "Block(null)"),
            BlockRepr::Heap { slot } => write!(f, "Block(heap #{}, slot {slot})", self.owner),
            BlockRepr::Arena { page, record } => {
                write!(f, "Block(arena #{}, page {page}, record {record})", self.owner)
            }
        }
    }
}
