//! Allocator-aware generic containers for Peat.
//!
//! Two containers share one growable-buffer core:
//!
//! - [`GrowBuf`] — a dynamic array whose header records the owning
//!   allocator and its scope depth at creation, so cross-allocator and
//!   use-after-scope-exit misuse panics instead of corrupting memory.
//! - [`HashTable`] — bucketed open addressing with tombstones and
//!   stored-hash rebuilds, layered over a [`GrowBuf`] of key/value
//!   records.
//!
//! Neither container holds a reference to its allocator: operations that
//! allocate or mutate take it as a parameter and re-check the recorded
//! discipline, so a container transplanted across allocators or used
//! after its arena scope exited fails loudly at the call site.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod buffer;
pub mod hash;
mod key;
mod table;

pub use buffer::{BufKind, GrowBuf};
pub use key::{KeyPool, StrStored, TableKey};
pub use table::{HashTable, TableOptions};
