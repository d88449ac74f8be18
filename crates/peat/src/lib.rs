//! Peat: scoped arena allocation and allocator-aware containers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the Peat sub-crates. For most users, adding `peat` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use peat::prelude::*;
//!
//! // A heap allocator lives for the process; containers record which
//! // allocator they were created against.
//! let heap = HeapAllocator::new();
//! let mut counts: HashTable<&str, u32> = HashTable::new(&heap);
//! counts.set(&heap, "warnings", 3);
//! assert_eq!(counts.get("warnings", 0), 3);
//!
//! // An arena reclaims everything when its scope exits.
//! let mut arena = ArenaAllocator::new(ArenaConfig::default());
//! {
//!     let mut scope = arena.scope();
//!     let mut names: GrowBuf<&str> = GrowBuf::new(&*scope);
//!     names.push(&*scope, "parse");
//!     names.push(&*scope, "resolve");
//!     assert_eq!(names.len(), 2);
//!
//!     let block = scope.allocate(256, 16).unwrap();
//!     scope.data_mut(block).fill(0);
//! } // scope exits: the arena is back to zero bytes used
//! assert_eq!(arena.used(), 0);
//!
//! // Short-lived work can use the thread-local temp arena.
//! let total = peat::alloc::temp::with_temp(|arena| {
//!     let block = arena.allocate_zeroed(8, 8, 8).unwrap();
//!     arena.data(block).len()
//! });
//! assert_eq!(total, 64);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`alloc`] | `peat-alloc` | `Allocator` trait, heap and arena allocators, scopes |
//! | [`collections`] | `peat-collections` | `GrowBuf`, `HashTable`, key kinds |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Allocator capability interface and implementations (`peat-alloc`).
///
/// The [`alloc::Allocator`] trait is the seam every container builds on;
/// [`alloc::temp`] holds the thread-local default arena.
pub use peat_alloc as alloc;

/// Allocator-aware containers (`peat-collections`).
///
/// [`collections::GrowBuf`] and [`collections::HashTable`] plus the
/// [`collections::TableKey`] key kinds.
pub use peat_collections as collections;

/// Common imports for typical Peat usage.
///
/// ```rust
/// use peat::prelude::*;
/// ```
pub mod prelude {
    // Allocators
    pub use peat_alloc::{
        AllocError, Allocator, AllocatorId, AllocatorKind, ArenaAllocator, ArenaConfig, Block,
        HeapAllocator, Scope,
    };

    // Containers
    pub use peat_collections::{BufKind, GrowBuf, HashTable, TableKey, TableOptions};
}
