//! Table key kinds and the copied-key intern pool.
//!
//! Key kinds are trait impls selecting a hash family and an equality
//! check. The borrowed-vs-copied distinction for string keys is
//! deliberately *not* a property of the key type: it is a construction
//! option on the table ([`TableOptions::copy_keys`]), and only string
//! keys are affected by it.
//!
//! [`TableOptions::copy_keys`]: crate::TableOptions::copy_keys

use crate::hash::{hash_bytes, mix64};

/// Append-only string storage for copied keys.
///
/// A dedicated growing sub-allocator: interned keys live as `(offset,
/// len)` spans of one contiguous byte region, so their lifetime is
/// independent of caller storage. Clearing or dropping the owning table
/// resets the pool wholesale; individual keys are never released.
#[derive(Debug, Default)]
pub struct KeyPool {
    bytes: Vec<u8>,
}

impl KeyPool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self { bytes: Vec::new() }
    }

    /// Copy `s` into the pool, returning its span.
    pub(crate) fn intern(&mut self, s: &str) -> (u32, u32) {
        let offset = self.bytes.len();
        assert!(
            offset + s.len() <= u32::MAX as usize,
            "key pool exceeds addressable size"
        );
        self.bytes.extend_from_slice(s.as_bytes());
        (offset as u32, s.len() as u32)
    }

    /// Resolve a span produced by [`KeyPool::intern`].
    pub(crate) fn get(&self, offset: u32, len: u32) -> &str {
        let start = offset as usize;
        let end = start + len as usize;
        std::str::from_utf8(&self.bytes[start..end]).expect("pool spans are interned str data")
    }

    /// Bytes currently interned.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the pool holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Discard all interned keys.
    pub(crate) fn reset(&mut self) {
        self.bytes.clear();
    }
}

/// A key type usable in [`HashTable`](crate::HashTable).
///
/// Implementations select the hash family (integer mix for fixed 4/8-byte
/// keys, byte hash for everything else), define the stored representation
/// of a key inside table records, and supply the equality check used when
/// a stored hash matches during probing.
pub trait TableKey: Sized {
    /// What a record stores for this key kind.
    type Stored;

    /// Borrowed view of a stored key, handed back by iteration.
    type View<'p>
    where
        Self: 'p;

    /// Hash the lookup key with the table's seed.
    fn hash_key(&self, seed: u64) -> u64;

    /// Build the stored representation.
    ///
    /// `copy_keys` is the table's construction-time option; only string
    /// keys interpret it (by interning into `pool`).
    fn store(&self, pool: &mut KeyPool, copy_keys: bool) -> Self::Stored;

    /// Whether the lookup key equals a stored key.
    fn matches(&self, stored: &Self::Stored, pool: &KeyPool) -> bool;

    /// View a stored key.
    fn view<'p>(stored: &'p Self::Stored, pool: &'p KeyPool) -> Self::View<'p>
    where
        Self: 'p;
}

impl TableKey for u32 {
    type Stored = u32;
    type View<'p> = u32
    where
        Self: 'p;

    fn hash_key(&self, seed: u64) -> u64 {
        mix64(seed, u64::from(*self))
    }

    fn store(&self, _pool: &mut KeyPool, _copy_keys: bool) -> u32 {
        *self
    }

    fn matches(&self, stored: &u32, _pool: &KeyPool) -> bool {
        self == stored
    }

    fn view<'p>(stored: &'p u32, _pool: &'p KeyPool) -> u32
    where
        Self: 'p,
    {
        *stored
    }
}

impl TableKey for u64 {
    type Stored = u64;
    type View<'p> = u64
    where
        Self: 'p;

    fn hash_key(&self, seed: u64) -> u64 {
        mix64(seed, *self)
    }

    fn store(&self, _pool: &mut KeyPool, _copy_keys: bool) -> u64 {
        *self
    }

    fn matches(&self, stored: &u64, _pool: &KeyPool) -> bool {
        self == stored
    }

    fn view<'p>(stored: &'p u64, _pool: &'p KeyPool) -> u64
    where
        Self: 'p,
    {
        *stored
    }
}

/// Fixed-size character/byte buffer keys.
impl<const N: usize> TableKey for [u8; N] {
    type Stored = [u8; N];
    type View<'p> = &'p [u8; N]
    where
        Self: 'p;

    fn hash_key(&self, seed: u64) -> u64 {
        hash_bytes(seed, self)
    }

    fn store(&self, _pool: &mut KeyPool, _copy_keys: bool) -> [u8; N] {
        *self
    }

    fn matches(&self, stored: &[u8; N], _pool: &KeyPool) -> bool {
        self == stored
    }

    fn view<'p>(stored: &'p [u8; N], _pool: &'p KeyPool) -> &'p [u8; N]
    where
        Self: 'p,
    {
        stored
    }
}

/// Stored representation of a string key.
///
/// Borrowed keys keep the caller's reference (the table's lifetime
/// parameter enforces validity); copied keys are spans of the table's
/// [`KeyPool`].
#[derive(Clone, Copy, Debug)]
pub enum StrStored<'a> {
    /// Caller-owned key storage.
    Borrowed(&'a str),
    /// Span interned in the table's key pool.
    Pooled {
        /// Byte offset within the pool.
        offset: u32,
        /// Length in bytes.
        len: u32,
    },
}

impl<'a> TableKey for &'a str {
    type Stored = StrStored<'a>;
    type View<'p> = &'p str
    where
        Self: 'p;

    fn hash_key(&self, seed: u64) -> u64 {
        hash_bytes(seed, self.as_bytes())
    }

    fn store(&self, pool: &mut KeyPool, copy_keys: bool) -> StrStored<'a> {
        if copy_keys {
            let (offset, len) = pool.intern(self);
            StrStored::Pooled { offset, len }
        } else {
            StrStored::Borrowed(*self)
        }
    }

    fn matches(&self, stored: &StrStored<'a>, pool: &KeyPool) -> bool {
        match *stored {
            StrStored::Borrowed(s) => *self == s,
            StrStored::Pooled { offset, len } => *self == pool.get(offset, len),
        }
    }

    fn view<'p>(stored: &'p StrStored<'a>, pool: &'p KeyPool) -> &'p str
    where
        Self: 'p,
    {
        match *stored {
            StrStored::Borrowed(s) => s,
            StrStored::Pooled { offset, len } => pool.get(offset, len),
        }
    }
}
