//! Seeded randomized stress across the container/allocator seam.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use peat_alloc::{Allocator, ArenaAllocator, ArenaConfig, HeapAllocator};
use peat_collections::{GrowBuf, HashTable, TableOptions};

#[test]
fn buffer_survives_mixed_traffic_on_the_heap() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xB0F);
    let heap = HeapAllocator::new();
    let mut buf: GrowBuf<u64> = GrowBuf::new(&heap);
    let mut model: Vec<u64> = Vec::new();

    for _ in 0..5000 {
        match rng.random_range(0..10) {
            0..=5 => {
                let v = rng.random();
                buf.push(&heap, v);
                model.push(v);
            }
            6 => {
                assert_eq!(buf.pop(&heap), model.pop());
            }
            7 if !model.is_empty() => {
                let i = rng.random_range(0..model.len());
                assert_eq!(buf.remove(&heap, i), model.remove(i));
            }
            8 if !model.is_empty() => {
                let i = rng.random_range(0..model.len());
                assert_eq!(buf.swap_remove(&heap, i), model.swap_remove(i));
            }
            _ => {
                buf.clear(&heap);
                model.clear();
            }
        }
        assert_eq!(buf.len(), model.len());
        assert!(buf.capacity() >= buf.len());
    }
    assert_eq!(buf.as_slice(), model.as_slice());
}

#[test]
fn table_tracks_a_model_under_churn() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x7AB1E);
    let heap = HeapAllocator::new();
    let mut table: HashTable<u32, u64> = HashTable::with_options(
        &heap,
        TableOptions {
            seed: Some(rng.random()),
            ..TableOptions::default()
        },
    );
    let mut model: std::collections::BTreeMap<u32, u64> = std::collections::BTreeMap::new();

    for _ in 0..20_000 {
        let key = rng.random_range(0..512u32);
        if rng.random_bool(0.6) {
            let value = rng.random();
            table.set(&heap, key, value);
            model.insert(key, value);
        } else {
            assert_eq!(table.delete(&heap, key), model.remove(&key).is_some());
        }
        assert_eq!(table.len(), model.len());
    }
    for (&key, &value) in &model {
        assert_eq!(table.get(key, value.wrapping_add(1)), value);
    }
}

#[test]
fn scoped_arena_tables_reclaim_with_their_scope() {
    let mut arena = ArenaAllocator::new(ArenaConfig::new(4096));

    for round in 0..50u64 {
        let mut scope = arena.scope();
        let mut table: HashTable<u64, u64> = HashTable::new(&*scope);
        for k in 0..100u64 {
            table.set(&*scope, k, k.rotate_left(round as u32));
        }
        for k in 0..100u64 {
            assert_eq!(table.get(k, u64::MAX), k.rotate_left(round as u32));
        }
        // Scratch allocations alongside the table share the scope.
        let block = scope.allocate(256, 16).unwrap();
        scope.data_mut(block).fill(round as u8);
        drop(table);
    }
    assert_eq!(arena.used(), 0);
    assert!(arena.sanitize().is_ok());
}
