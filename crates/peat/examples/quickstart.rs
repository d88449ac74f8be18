//! Peat quickstart — allocators and containers from scratch.
//!
//! Demonstrates:
//!   1. Creating a heap allocator and a process-lifetime symbol table
//!   2. Opening an arena scope for one unit of short-lived work
//!   3. Building scratch containers inside the scope
//!   4. Bulk reclamation at scope exit
//!   5. The thread-local temp arena for one-off scratch space
//!
//! Run with:
//!   cargo run --example quickstart

use peat::prelude::*;

// ─── Inputs ─────────────────────────────────────────────────────

const SOURCES: &[(&str, &[&str])] = &[
    ("main.c", &["util.h", "lexer.h"]),
    ("lexer.c", &["lexer.h", "util.h"]),
    ("util.c", &["util.h"]),
];

fn main() {
    // Process-lifetime state goes on the heap allocator. The table copies
    // its string keys, so it does not borrow the per-file scratch data
    // built below.
    let heap = HeapAllocator::new();
    let mut include_counts: HashTable<&str, u32> = HashTable::with_options(
        &heap,
        TableOptions {
            copy_keys: true,
            ..TableOptions::default()
        },
    );

    // Per-file work runs inside an arena scope: every allocation made in
    // the scope is reclaimed in one step when it exits.
    let mut arena = ArenaAllocator::new(ArenaConfig::default());
    for (file, includes) in SOURCES {
        let scope = arena.scope();

        // Scratch container owned by this scope's discipline.
        let mut seen: GrowBuf<&str> = GrowBuf::new(&*scope);
        for &include in *includes {
            if !seen.iter().any(|&s| s == include) {
                seen.push(&*scope, include);
                let count = include_counts.get(include, 0);
                include_counts.set(&heap, include, count + 1);
            }
        }
        println!("{file}: {} unique includes", seen.len());
    }
    assert_eq!(arena.used(), 0, "scope exit reclaims everything");

    println!("---");
    for (header, count) in include_counts.iter() {
        println!("{header} included by {count} files");
    }

    // One-off scratch space without threading an arena through: the
    // thread-local temp arena.
    let checksum = peat::alloc::temp::with_temp(|arena| {
        let block = arena.allocate_zeroed(SOURCES.len(), 16, 8).unwrap();
        let bytes = arena.data_mut(block);
        for (i, (file, _)) in SOURCES.iter().enumerate() {
            bytes[i * 16] = file.len() as u8;
        }
        bytes.iter().map(|&b| u32::from(b)).sum::<u32>()
    });
    println!("scratch checksum: {checksum}");
}
