//! Benchmark profiles and utilities for the Peat subsystem.
//!
//! Provides pre-built allocator and table configurations so the benches
//! measure the same shapes:
//!
//! - [`arena_4k`]: arena with the 4 KiB page size used across the suite
//! - [`pre_sized_table_options`]: table options sized for N records

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use peat_alloc::{ArenaAllocator, ArenaConfig};
use peat_collections::TableOptions;

/// Build an arena with 4 KiB nominal pages.
///
/// Small pages keep the page-overflow path hot in the benchmarks instead
/// of everything landing in one page.
pub fn arena_4k() -> ArenaAllocator {
    ArenaAllocator::new(ArenaConfig::new(4096))
}

/// Table options pre-sized for `records` entries with a fixed seed.
///
/// A fixed seed keeps probe sequences identical across runs so the
/// numbers are comparable.
pub fn pre_sized_table_options(records: usize) -> TableOptions {
    TableOptions {
        capacity: records,
        seed: Some(0xBE7C),
        copy_keys: false,
    }
}
