//! General-purpose heap allocator with alignment support.
//!
//! [`HeapAllocator`] wraps the platform allocator (through owned byte
//! buffers) and adds alignment the platform may not natively honour for a
//! given request: each allocation over-allocates `size + align` bytes and
//! records the round-up offset from the buffer's actual address in its slab
//! record — the handle-based equivalent of the classic "small header placed
//! immediately before the returned pointer". `reallocate` recovers the
//! record and grows in place while the over-allocated tail has room,
//! falling back to copy-and-release when growth would break alignment.

use crate::api::{check_align, Allocator, POISON};
use crate::block::{Block, BlockRepr};
use crate::id::{AllocatorId, AllocatorKind};

/// One live heap allocation: the backing buffer plus its offset record.
struct HeapBlock {
    /// Over-allocated backing storage (`size + align` bytes).
    data: Vec<u8>,
    /// Round-up offset of the user region within `data`.
    offset: usize,
    /// Current user size in bytes.
    size: usize,
    /// Requested alignment.
    align: usize,
}

/// Heap allocator: slab of independent platform allocations.
///
/// Scope operations are no-ops at depth 0, as permitted for scope-less
/// allocators. Released slots are recycled through a free list; releasing
/// a block clears its slot, so a double release panics instead of handing
/// out another allocation's bytes.
pub struct HeapAllocator {
    id: AllocatorId,
    slots: Vec<Option<HeapBlock>>,
    free_slots: Vec<u32>,
    live_bytes: usize,
}

impl HeapAllocator {
    /// Create a new heap allocator.
    pub fn new() -> Self {
        Self {
            id: AllocatorId::next(),
            slots: Vec::new(),
            free_slots: Vec::new(),
            live_bytes: 0,
        }
    }

    /// Total user bytes currently allocated (excludes alignment slack).
    pub fn live_bytes(&self) -> usize {
        self.live_bytes
    }

    /// Number of live allocations.
    pub fn live_blocks(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    fn slot_of(&self, block: Block) -> u32 {
        assert_eq!(
            block.owner, self.id,
            "block {block} does not belong to heap allocator #{}",
            self.id,
        );
        match block.repr {
            BlockRepr::Heap { slot } => slot,
            BlockRepr::Null => panic!("null block resolved against heap allocator"),
            BlockRepr::Arena { .. } => {
                panic!("arena block {block} presented to heap allocator")
            }
        }
    }

    fn entry(&self, block: Block) -> &HeapBlock {
        let slot = self.slot_of(block) as usize;
        self.slots
            .get(slot)
            .and_then(|s| s.as_ref())
            .unwrap_or_else(|| panic!("{block} has already been released"))
    }

    fn entry_mut(&mut self, block: Block) -> &mut HeapBlock {
        let slot = self.slot_of(block) as usize;
        self.slots
            .get_mut(slot)
            .and_then(|s| s.as_mut())
            .unwrap_or_else(|| panic!("{block} has already been released"))
    }

    /// Build the over-allocated backing buffer for a request.
    ///
    /// Returns `None` if the platform refuses the memory.
    fn make_buffer(size: usize, align: usize) -> Option<(Vec<u8>, usize)> {
        let total = size.checked_add(align)?;
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(total).ok()?;
        let fill = if cfg!(debug_assertions) { POISON } else { 0 };
        data.resize(total, fill);
        let base = data.as_ptr() as usize;
        let offset = (align - base % align) % align;
        Some((data, offset))
    }

    fn install(&mut self, entry: HeapBlock) -> Block {
        self.live_bytes += entry.size;
        let slot = match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(entry);
                slot
            }
            None => {
                assert!(
                    self.slots.len() < u32::MAX as usize,
                    "heap allocator slab exhausted"
                );
                self.slots.push(Some(entry));
                (self.slots.len() - 1) as u32
            }
        };
        Block::heap(self.id, slot)
    }
}

impl Default for HeapAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl Allocator for HeapAllocator {
    fn kind(&self) -> AllocatorKind {
        AllocatorKind::Heap
    }

    fn id(&self) -> AllocatorId {
        self.id
    }

    fn allocate(&mut self, size: usize, align: usize) -> Option<Block> {
        check_align(align);
        let (data, offset) = Self::make_buffer(size, align)?;
        Some(self.install(HeapBlock {
            data,
            offset,
            size,
            align,
        }))
    }

    fn reallocate(&mut self, block: Block, new_size: usize, align: usize) -> Option<Block> {
        check_align(align);
        if block.is_null() {
            return self.allocate(new_size, align);
        }

        let entry = self.entry(block);
        let fits_in_place = entry.offset + new_size <= entry.data.len();
        let alignment_preserved = align <= entry.align;
        if fits_in_place && alignment_preserved {
            let old_size = entry.size;
            let entry = self.entry_mut(block);
            entry.size = new_size;
            self.live_bytes = self.live_bytes - old_size + new_size;
            return Some(block);
        }

        // In-place growth would overrun the buffer or break alignment:
        // allocate fresh, copy the surviving prefix, release the original.
        let (mut data, offset) = Self::make_buffer(new_size, align)?;
        let entry = self.entry(block);
        let keep = entry.size.min(new_size);
        data[offset..offset + keep]
            .copy_from_slice(&entry.data[entry.offset..entry.offset + keep]);
        let fresh = self.install(HeapBlock {
            data,
            offset,
            size: new_size,
            align,
        });
        self.release(block);
        Some(fresh)
    }

    fn release(&mut self, block: Block) {
        if block.is_null() {
            return;
        }
        let slot = self.slot_of(block) as usize;
        let entry = self.slots[slot]
            .take()
            .unwrap_or_else(|| panic!("double release of {block}"));
        self.live_bytes -= entry.size;
        self.free_slots.push(slot as u32);
    }

    fn data(&self, block: Block) -> &[u8] {
        let entry = self.entry(block);
        &entry.data[entry.offset..entry.offset + entry.size]
    }

    fn data_mut(&mut self, block: Block) -> &mut [u8] {
        let entry = self.entry_mut(block);
        let (offset, size) = (entry.offset, entry.size);
        &mut entry.data[offset..offset + size]
    }

    fn enter_scope(&mut self) -> u32 {
        0
    }

    fn exit_scope(&mut self) {}

    fn scope_depth(&self) -> u32 {
        0
    }
}
