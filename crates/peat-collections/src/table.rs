//! Open-addressing hash table with cache-line buckets and tombstones.
//!
//! [`HashTable`] layers a probe index over a [`GrowBuf`] of key/value
//! records:
//!
//! ```text
//! HashTable
//! ├── records: GrowBuf<Record>   (hash, stored key, value) — live entries only
//! ├── slots:   Vec<Slot>         (hash, record index) in 4-slot buckets
//! └── pool:    KeyPool           copied string keys (copy_keys mode)
//! ```
//!
//! The slot array is a power of two, scanned bucket-by-bucket: a probe
//! lands somewhere inside a 4-slot cache-line bucket, scans that bucket
//! from the landing offset with wrap-around, then moves on quadratically
//! (`pos += step; step += BUCKET_WIDTH`). Deletion tombstones the slot and
//! swap-compacts the record storage, so iteration order changes after
//! deletions. Rebuilds (2x growth at 75% load, same-size at the tombstone
//! threshold, halving shrink at 25%) reuse each record's stored hash
//! rather than recomputing it.

use std::sync::atomic::{AtomicU64, Ordering};

use peat_alloc::{AllocError, Allocator};

use crate::buffer::{BufKind, GrowBuf};
use crate::hash::{bump_sentinel, mix64, DELETED_HASH, EMPTY_HASH};
use crate::key::{KeyPool, TableKey};

/// Slots per cache-line bucket (4 x 16-byte slot = one 64-byte line).
const BUCKET_WIDTH: usize = 4;

/// Smallest slot array; shrinking stops here.
const MIN_SLOTS: usize = 16;

/// One probe slot: a stored hash and the index of its record.
#[derive(Clone, Copy, Debug)]
struct Slot {
    /// Record hash, or one of the reserved sentinels.
    hash: u64,
    /// Index into the record buffer (meaningless for sentinels).
    index: u32,
}

const EMPTY_SLOT: Slot = Slot {
    hash: EMPTY_HASH,
    index: 0,
};

/// One key/value record. The hash is stored so rebuilds never recompute it.
struct Record<S, V> {
    hash: u64,
    key: S,
    value: V,
}

/// Construction options for [`HashTable`].
#[derive(Clone, Copy, Debug)]
pub struct TableOptions {
    /// Records to pre-size for (the slot array is sized so this many
    /// inserts trigger no growth). 0 means the default minimum.
    pub capacity: usize,
    /// Hash seed. `None` draws a fresh per-table seed.
    pub seed: Option<u64>,
    /// Copy string keys into the table's own [`KeyPool`] instead of
    /// borrowing caller storage. Chosen here, at construction — not
    /// inferred from the key type. Non-string key kinds ignore it.
    pub copy_keys: bool,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            capacity: 0,
            seed: None,
            copy_keys: false,
        }
    }
}

/// Counter mixed into fresh per-table seeds.
static SEED_COUNTER: AtomicU64 = AtomicU64::new(1);

fn fresh_seed() -> u64 {
    mix64(0x5EED_0F_7AB1E5, SEED_COUNTER.fetch_add(1, Ordering::Relaxed))
}

/// Outcome of a probe walk.
enum Probe {
    /// The key is present; its slot index.
    Found { slot: usize },
    /// The key is absent; the slot an insert should use (the first
    /// tombstone seen, else the terminating empty slot).
    Absent { insert_at: usize },
}

/// Allocator-disciplined open-addressing hash table.
///
/// Keys are any [`TableKey`] kind; values are arbitrary. Lookups are
/// non-allocating; `set` and `delete` take the owning allocator and are
/// subject to the same identity and scope-discipline checks as
/// [`GrowBuf`].
///
/// ```
/// use peat_alloc::HeapAllocator;
/// use peat_collections::HashTable;
///
/// let heap = HeapAllocator::new();
/// let mut table: HashTable<&str, i32> = HashTable::new(&heap);
/// table.set(&heap, "a", 1);
/// table.set(&heap, "b", 2);
/// table.set(&heap, "a", 3);
/// assert_eq!(table.get("a", 0), 3);
/// assert_eq!(table.len(), 2);
/// assert!(table.delete(&heap, "a"));
/// assert_eq!(table.get("a", 0), 0);
/// assert_eq!(table.len(), 1);
/// ```
pub struct HashTable<K: TableKey, V> {
    records: GrowBuf<Record<K::Stored, V>>,
    slots: Vec<Slot>,
    tombstones: usize,
    seed: u64,
    copy_keys: bool,
    pool: KeyPool,
}

impl<K: TableKey, V> HashTable<K, V> {
    /// Create an empty table with default options.
    pub fn new<A: Allocator + ?Sized>(a: &A) -> Self {
        Self::with_options(a, TableOptions::default())
    }

    /// Create a table with explicit options.
    pub fn with_options<A: Allocator + ?Sized>(a: &A, options: TableOptions) -> Self {
        let slot_count = Self::slot_count_for(options.capacity);
        Self {
            records: GrowBuf::with_kind(a, BufKind::HashRecords, options.capacity),
            slots: vec![EMPTY_SLOT; slot_count],
            tombstones: 0,
            seed: options.seed.unwrap_or_else(fresh_seed),
            copy_keys: options.copy_keys,
            pool: KeyPool::new(),
        }
    }

    /// Slot count whose 75% load bound covers `capacity` records.
    fn slot_count_for(capacity: usize) -> usize {
        let needed = capacity.saturating_mul(4) / 3 + 1;
        needed.max(MIN_SLOTS).next_power_of_two()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Current slot count (a power of two).
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Current tombstone count.
    pub fn tombstones(&self) -> usize {
        self.tombstones
    }

    /// The table's hash seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Bytes of copied key storage currently interned.
    pub fn key_pool_bytes(&self) -> usize {
        self.pool.len()
    }

    /// `used + tombstones < slot_count` is what guarantees probe
    /// termination; it must hold at every rest point.
    fn debug_check_invariants(&self) {
        debug_assert!(self.slots.len().is_power_of_two());
        debug_assert!(self.slots.len() >= MIN_SLOTS);
        debug_assert!(self.records.len() + self.tombstones < self.slots.len());
        debug_assert_eq!(self.records.kind(), BufKind::HashRecords);
    }

    /// Walk the probe sequence for `hash`, checking key equality on
    /// stored-hash matches.
    fn probe(&self, hash: u64, key: &K) -> Probe {
        let mask = self.slots.len() - 1;
        let mut pos = (hash as usize) & mask;
        let mut step = BUCKET_WIDTH;
        let mut first_tombstone: Option<usize> = None;

        loop {
            let bucket = pos & !(BUCKET_WIDTH - 1);
            let offset = pos - bucket;
            // Scan the bucket from the landing offset to its end, then
            // wrap to its start.
            for i in 0..BUCKET_WIDTH {
                let slot_index = bucket + (offset + i) % BUCKET_WIDTH;
                let slot = self.slots[slot_index];
                if slot.hash == EMPTY_HASH {
                    return Probe::Absent {
                        insert_at: first_tombstone.unwrap_or(slot_index),
                    };
                }
                if slot.hash == DELETED_HASH {
                    if first_tombstone.is_none() {
                        first_tombstone = Some(slot_index);
                    }
                    continue;
                }
                if slot.hash == hash {
                    let record = &self.records[slot.index as usize];
                    if key.matches(&record.key, &self.pool) {
                        return Probe::Found { slot: slot_index };
                    }
                }
            }
            pos = (pos + step) & mask;
            step += BUCKET_WIDTH;
        }
    }

    /// Find the empty slot the probe sequence for `hash` terminates at.
    ///
    /// Used by rebuilds, where the fresh slot array has no tombstones and
    /// no duplicate keys.
    fn find_empty(slots: &[Slot], hash: u64) -> usize {
        let mask = slots.len() - 1;
        let mut pos = (hash as usize) & mask;
        let mut step = BUCKET_WIDTH;
        loop {
            let bucket = pos & !(BUCKET_WIDTH - 1);
            let offset = pos - bucket;
            for i in 0..BUCKET_WIDTH {
                let slot_index = bucket + (offset + i) % BUCKET_WIDTH;
                if slots[slot_index].hash == EMPTY_HASH {
                    return slot_index;
                }
            }
            pos = (pos + step) & mask;
            step += BUCKET_WIDTH;
        }
    }

    /// Find the slot holding `(hash, record_index)`.
    ///
    /// Used to repair the index entry of a record moved by
    /// swap-compaction.
    fn find_slot_of_record(&self, hash: u64, record_index: u32) -> usize {
        let mask = self.slots.len() - 1;
        let mut pos = (hash as usize) & mask;
        let mut step = BUCKET_WIDTH;
        loop {
            let bucket = pos & !(BUCKET_WIDTH - 1);
            let offset = pos - bucket;
            for i in 0..BUCKET_WIDTH {
                let slot_index = bucket + (offset + i) % BUCKET_WIDTH;
                let slot = self.slots[slot_index];
                if slot.hash == hash && slot.index == record_index {
                    return slot_index;
                }
                assert!(
                    slot.hash != EMPTY_HASH,
                    "hash index out of sync: record {record_index} has no slot"
                );
            }
            pos = (pos + step) & mask;
            step += BUCKET_WIDTH;
        }
    }

    /// Rebuild the slot array at `new_slot_count`, rehashing every
    /// record's stored hash. Clears tombstones.
    fn rebuild(&mut self, new_slot_count: usize) -> Result<(), AllocError> {
        let mut new_slots: Vec<Slot> = Vec::new();
        new_slots
            .try_reserve_exact(new_slot_count)
            .map_err(|_| AllocError::OutOfMemory {
                requested: new_slot_count * std::mem::size_of::<Slot>(),
            })?;
        new_slots.resize(new_slot_count, EMPTY_SLOT);

        for (index, record) in self.records.iter().enumerate() {
            let slot_index = Self::find_empty(&new_slots, record.hash);
            new_slots[slot_index] = Slot {
                hash: record.hash,
                index: index as u32,
            };
        }
        self.slots = new_slots;
        self.tombstones = 0;
        Ok(())
    }

    /// Pre-insert maintenance: grow at 75% load, rebuild in place when
    /// tombstones pass their threshold.
    fn maintain(&mut self) -> Result<(), AllocError> {
        let slot_count = self.slots.len();
        if (self.records.len() + 1) * 4 > slot_count * 3 {
            self.rebuild(slot_count * 2)
        } else if self.tombstones > slot_count / 8 {
            self.rebuild(slot_count)
        } else {
            Ok(())
        }
    }

    /// Insert or overwrite, fatal on allocation failure.
    ///
    /// Returns a reference to the stored value.
    pub fn set<A: Allocator + ?Sized>(&mut self, a: &A, key: K, value: V) -> &mut V {
        self.try_set(a, key, value)
            .expect("hash table allocation failed")
    }

    /// Insert or overwrite on the checked-allocation path.
    ///
    /// On `Err` the table is unchanged.
    pub fn try_set<A: Allocator + ?Sized>(
        &mut self,
        a: &A,
        key: K,
        value: V,
    ) -> Result<&mut V, AllocError> {
        self.maintain()?;
        let hash = bump_sentinel(key.hash_key(self.seed));
        match self.probe(hash, &key) {
            Probe::Found { slot } => {
                let index = self.slots[slot].index as usize;
                self.records[index].value = value;
                Ok(&mut self.records[index].value)
            }
            Probe::Absent { insert_at } => {
                // Reserve before interning so a failed reservation leaves
                // no side effects.
                self.records.try_reserve(a, 1)?;
                let stored = key.store(&mut self.pool, self.copy_keys);
                self.records.push(
                    a,
                    Record {
                        hash,
                        key: stored,
                        value,
                    },
                );
                let index = (self.records.len() - 1) as u32;
                if self.slots[insert_at].hash == DELETED_HASH {
                    self.tombstones -= 1;
                }
                self.slots[insert_at] = Slot { hash, index };
                self.debug_check_invariants();
                Ok(&mut self.records[index as usize].value)
            }
        }
    }

    /// Look up `key`, returning `default` when absent.
    pub fn get(&self, key: K, default: V) -> V
    where
        V: Copy,
    {
        self.get_ptr(key).copied().unwrap_or(default)
    }

    /// Look up `key`, returning a reference to its value.
    pub fn get_ptr(&self, key: K) -> Option<&V> {
        let hash = bump_sentinel(key.hash_key(self.seed));
        match self.probe(hash, &key) {
            Probe::Found { slot } => {
                Some(&self.records[self.slots[slot].index as usize].value)
            }
            Probe::Absent { .. } => None,
        }
    }

    /// Look up `key`, returning a mutable reference to its value.
    pub fn get_mut(&mut self, key: K) -> Option<&mut V> {
        let hash = bump_sentinel(key.hash_key(self.seed));
        match self.probe(hash, &key) {
            Probe::Found { slot } => {
                let index = self.slots[slot].index as usize;
                Some(&mut self.records[index].value)
            }
            Probe::Absent { .. } => None,
        }
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: K) -> bool {
        self.get_ptr(key).is_some()
    }

    /// Remove `key`. Returns whether it was present.
    ///
    /// The slot becomes a tombstone and the logically-last record is
    /// swap-compacted into the freed record position, so iteration order
    /// changes. May trigger a same-size rebuild (tombstone threshold) or a
    /// halving shrink (under 25% load, bounded at 16 slots).
    pub fn delete<A: Allocator + ?Sized>(&mut self, a: &A, key: K) -> bool {
        let hash = bump_sentinel(key.hash_key(self.seed));
        let slot = match self.probe(hash, &key) {
            Probe::Found { slot } => slot,
            Probe::Absent { .. } => return false,
        };

        let removed_index = self.slots[slot].index as usize;
        self.slots[slot] = Slot {
            hash: DELETED_HASH,
            index: 0,
        };
        self.tombstones += 1;

        // Swap-compact: move the last record into the hole and repair its
        // slot via a fresh probe on its stored hash.
        let last = self.records.len() - 1;
        drop(self.records.swap_remove(a, removed_index));
        if removed_index != last {
            let moved_hash = self.records[removed_index].hash;
            let moved_slot = self.find_slot_of_record(moved_hash, last as u32);
            self.slots[moved_slot].index = removed_index as u32;
        }

        // Deletes convert a used slot into a tombstone, so the probe
        // termination invariant cannot degrade even if these rebuilds are
        // skipped; allocation failure here is therefore non-fatal.
        let slot_count = self.slots.len();
        if slot_count > MIN_SLOTS && self.records.len() * 4 < slot_count {
            let _ = self.rebuild(slot_count / 2);
        } else if self.tombstones > slot_count / 8 {
            let _ = self.rebuild(slot_count);
        }
        self.debug_check_invariants();
        true
    }

    /// Drop every entry, keeping the slot array size and record capacity.
    ///
    /// Copied key storage is reset wholesale.
    pub fn clear<A: Allocator + ?Sized>(&mut self, a: &A) {
        self.records.clear(a);
        self.slots.fill(EMPTY_SLOT);
        self.tombstones = 0;
        self.pool.reset();
    }

    /// Iterate over `(key view, value)` pairs in record order.
    ///
    /// Record order is insertion order until a deletion swap-compacts the
    /// storage; after that it is unspecified but stable until the next
    /// mutation.
    pub fn iter(&self) -> impl Iterator<Item = (K::View<'_>, &V)> {
        self.records
            .iter()
            .map(move |record| (K::view(&record.key, &self.pool), &record.value))
    }
}
