//! Page-chained bump allocator with scoped bulk reclamation.
//!
//! [`ArenaAllocator`] carves allocations from monotonically advancing pages
//! and reclaims them in bulk when a scope exits. The design:
//!
//! ```text
//! ArenaAllocator
//! ├── Vec<Page> (most-recent-last; each a bump-allocated Vec<u8>)
//! │   └── Vec<AllocRecord> (per-page allocation record table)
//! ├── marks: SmallVec<u64> (scope stack: cumulative-used snapshots)
//! └── used / high_water accounting
//! ```
//!
//! Individual `release` calls only mark records freed (and poison the bytes
//! in debug builds); memory is actually reclaimed when the enclosing scope
//! exits, by rolling the boundary page's cursor back to the scope mark and
//! dropping pages created entirely inside the scope.
//!
//! The scope stack is bounded by [`ArenaConfig::tracked_scope_depth`].
//! Scopes nested beyond the bound still balance the depth counter, but
//! their reclamation is deferred until [`ArenaAllocator::reset`] or drop —
//! a deliberate, documented limitation for pathological nesting.

use std::ops::{Deref, DerefMut};

use smallvec::SmallVec;

use crate::api::{align_up, check_align, Allocator, POISON};
use crate::block::{Block, BlockRepr};
use crate::config::ArenaConfig;
use crate::error::SanitizeError;
use crate::id::{AllocatorId, AllocatorKind};

/// Cursor advances are always a multiple of this.
const CURSOR_QUANTUM: usize = 8;

/// Metadata for one arena allocation.
///
/// Lives in the page's record table rather than inline in page bytes; the
/// [`Block`] handle indexes it directly, so no offset-back field is
/// needed and user data stays contiguous.
#[derive(Clone, Copy, Debug)]
struct AllocRecord {
    /// Byte offset of the user region within the page.
    offset: u32,
    /// Current user size in bytes.
    size: u32,
    /// Effective alignment (at least 8).
    align: u32,
    /// Set by `release`; reclamation still waits for scope exit.
    freed: bool,
}

/// One fixed-capacity arena page.
struct Page {
    /// Backing storage. Never grows; a full page triggers a new page.
    data: Vec<u8>,
    /// Bump cursor: next free byte offset.
    cursor: usize,
    /// The arena's cumulative `used` value when this page was created.
    ///
    /// Scope exit compares marks against this to decide between rolling
    /// the cursor back and dropping the page outright.
    base_used: u64,
    /// Allocation record table, in cursor order.
    records: Vec<AllocRecord>,
}

impl Page {
    /// Offset at or after `cursor` where an allocation of alignment `align`
    /// can start, measured so the resulting *address* is aligned.
    fn aligned_offset(&self, align: usize) -> usize {
        let addr = self.data.as_ptr() as usize + self.cursor;
        self.cursor + (align_up(addr, align) - addr)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.cursor
    }
}

/// Arena allocator: bump allocation over a page chain, bulk free on scope
/// exit.
///
/// Allocation is only legal inside an open scope; see
/// [`ArenaAllocator::scope`] for the RAII entry point. One thread-local
/// instance (kind [`AllocatorKind::Temp`]) serves as the default
/// short-lived allocator; see [`crate::temp::with_temp`].
pub struct ArenaAllocator {
    id: AllocatorId,
    kind: AllocatorKind,
    config: ArenaConfig,
    pages: Vec<Page>,
    /// Cumulative live bytes (sum of page cursor advances minus rollbacks).
    used: u64,
    /// Peak of `used` over the arena's lifetime.
    high_water: u64,
    /// Scope nesting depth, including untracked overflow scopes.
    depth: u32,
    /// Tracked scope marks: `used` snapshots, innermost last.
    marks: SmallVec<[u64; 8]>,
}

impl ArenaAllocator {
    /// Create an arena allocator with the given configuration.
    ///
    /// # Panics
    ///
    /// Panics if the configuration is invalid (see [`ArenaConfig`]).
    pub fn new(config: ArenaConfig) -> Self {
        Self::with_kind(config, AllocatorKind::Arena)
    }

    /// Create an arena with an explicit kind tag.
    ///
    /// Used by the `temp` module to tag the thread-local instance.
    pub(crate) fn with_kind(config: ArenaConfig, kind: AllocatorKind) -> Self {
        config.validate();
        assert!(
            matches!(kind, AllocatorKind::Arena | AllocatorKind::Temp),
            "arena allocator cannot carry kind {kind}"
        );
        Self {
            id: AllocatorId::next(),
            kind,
            config,
            pages: Vec::new(),
            used: 0,
            high_water: 0,
            depth: 0,
            marks: SmallVec::new(),
        }
    }

    /// Open a scope and return a guard that closes it on drop.
    ///
    /// The guard derefs to the arena, so allocation happens through it:
    ///
    /// ```
    /// use peat_alloc::{Allocator, ArenaAllocator, ArenaConfig};
    ///
    /// let mut arena = ArenaAllocator::new(ArenaConfig::default());
    /// {
    ///     let mut scope = arena.scope();
    ///     let block = scope.allocate(128, 8).unwrap();
    ///     scope.data_mut(block)[0] = 1;
    /// } // scope exits here; the allocation is reclaimed
    /// assert_eq!(arena.used(), 0);
    /// ```
    pub fn scope(&mut self) -> Scope<'_> {
        self.enter_scope();
        Scope { arena: self }
    }

    /// Cumulative live bytes currently allocated.
    pub fn used(&self) -> u64 {
        self.used
    }

    /// Peak value of [`ArenaAllocator::used`] over the arena's lifetime.
    pub fn high_water(&self) -> u64 {
        self.high_water
    }

    /// Number of pages currently chained.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total backing memory across all pages in bytes.
    pub fn memory_bytes(&self) -> usize {
        self.pages.iter().map(|p| p.data.len()).sum()
    }

    /// Drop all pages and scope marks, returning to the initial state.
    ///
    /// This is the teardown point where reclamation deferred by scope-stack
    /// overflow finally happens. `high_water` is preserved.
    pub fn reset(&mut self) {
        self.pages.clear();
        self.marks.clear();
        self.used = 0;
        self.depth = 0;
    }

    /// Validate the self-consistency of every page and record.
    ///
    /// Checks record ordering, bounds, and alignment; in debug builds,
    /// additionally checks that freed regions still hold the poison
    /// pattern. Intended for tests and debugging.
    pub fn sanitize(&self) -> Result<(), SanitizeError> {
        for (pi, page) in self.pages.iter().enumerate() {
            if page.cursor > page.data.len() {
                return Err(SanitizeError::CursorOutOfBounds { page: pi });
            }
            let mut prev_end = 0usize;
            for (ri, rec) in page.records.iter().enumerate() {
                let offset = rec.offset as usize;
                let size = rec.size as usize;
                if offset < prev_end {
                    return Err(SanitizeError::RecordOverlap { page: pi, record: ri });
                }
                if offset + size > page.cursor {
                    return Err(SanitizeError::RecordOutOfBounds { page: pi, record: ri });
                }
                let addr = page.data.as_ptr() as usize + offset;
                if addr % rec.align as usize != 0 {
                    return Err(SanitizeError::Misaligned {
                        page: pi,
                        record: ri,
                        align: rec.align,
                    });
                }
                if cfg!(debug_assertions) && rec.freed {
                    if let Some(bad) = page.data[offset..offset + size]
                        .iter()
                        .position(|&b| b != POISON)
                    {
                        return Err(SanitizeError::PoisonDamaged {
                            page: pi,
                            offset: offset + bad,
                        });
                    }
                }
                prev_end = offset + size;
            }
        }
        Ok(())
    }

    /// Size in bytes for a new page that must hold an aligned request of
    /// `need` bytes.
    ///
    /// Requests above ~70% of the nominal page size get a dedicated
    /// oversized page at 1.5x the request, clamped to the configured hard
    /// maximum but never below the request itself.
    fn page_size_for(&self, need: usize) -> usize {
        let nominal = self.config.page_size;
        if need > nominal / 10 * 7 {
            let padded = need.saturating_add(need / 2);
            padded.clamp(need, self.config.max_page_size.max(need))
        } else {
            nominal
        }
    }

    /// Append a fresh page sized for `need` bytes. Returns `None` if the
    /// platform refuses the memory.
    fn push_page(&mut self, need: usize) -> Option<()> {
        let size = self.page_size_for(need);
        let mut data: Vec<u8> = Vec::new();
        data.try_reserve_exact(size).ok()?;
        let fill = if cfg!(debug_assertions) { POISON } else { 0 };
        data.resize(size, fill);
        self.pages.push(Page {
            data,
            cursor: 0,
            base_used: self.used,
            records: Vec::new(),
        });
        Some(())
    }

    /// Place `size` bytes at alignment `align` in the last page, which must
    /// have room. Returns the new block.
    fn place(&mut self, size: usize, align: usize) -> Block {
        let id = self.id;
        let page_index = self.pages.len() - 1;
        let page = self.pages.last_mut().expect("place() without a page");

        let offset = page.aligned_offset(align);
        let advance = align_up(offset - page.cursor + size, CURSOR_QUANTUM);
        debug_assert!(page.cursor + advance <= page.data.len());

        #[cfg(debug_assertions)]
        page.data[page.cursor..page.cursor + advance].fill(POISON);

        page.records.push(AllocRecord {
            offset: offset as u32,
            size: size as u32,
            align: align as u32,
            freed: false,
        });
        page.cursor += advance;
        let record_index = (page.records.len() - 1) as u32;

        self.used += advance as u64;
        self.high_water = self.high_water.max(self.used);

        Block::arena(id, page_index as u32, record_index)
    }

    /// Whether the last page can take `size` bytes at `align` without
    /// growing.
    fn fits_in_last_page(&self, size: usize, align: usize) -> bool {
        match self.pages.last() {
            Some(page) => {
                let offset = page.aligned_offset(align);
                let advance = align_up(offset - page.cursor + size, CURSOR_QUANTUM);
                advance <= page.remaining()
            }
            None => false,
        }
    }

    fn record(&self, block: Block) -> (&Page, &AllocRecord) {
        assert_eq!(
            block.owner, self.id,
            "block {block} does not belong to {} allocator #{}",
            self.kind, self.id,
        );
        let (page, record) = match block.repr {
            BlockRepr::Arena { page, record } => (page as usize, record as usize),
            BlockRepr::Null => panic!("null block resolved against arena allocator"),
            BlockRepr::Heap { .. } => {
                panic!("heap block {block} presented to arena allocator")
            }
        };
        let page = self
            .pages
            .get(page)
            .unwrap_or_else(|| panic!("{block} is stale: its page was reclaimed by a scope exit"));
        let rec = page
            .records
            .get(record)
            .unwrap_or_else(|| panic!("{block} is stale: its record was reclaimed by a scope exit"));
        (page, rec)
    }

    /// Whether `block` is the arena's most recent allocation (the only one
    /// eligible for in-place growth).
    fn is_most_recent(&self, block: Block) -> bool {
        let BlockRepr::Arena { page, record } = block.repr else {
            return false;
        };
        page as usize == self.pages.len() - 1
            && self
                .pages
                .last()
                .is_some_and(|p| record as usize == p.records.len() - 1)
    }

    /// Reclaim until cumulative used falls back to `mark`.
    ///
    /// Walks pages from the most recent: a page created at-or-after the
    /// mark is dropped whole; the boundary page has its cursor rolled back
    /// (tail poisoned in debug builds) and the records allocated past the
    /// mark discarded.
    fn reclaim_to(&mut self, mark: u64) {
        while self.used > mark {
            let page = self
                .pages
                .last_mut()
                .expect("used accounting out of sync with pages");
            if page.base_used >= mark {
                self.used = page.base_used;
                self.pages.pop();
                continue;
            }
            // Boundary page: the mark lies inside it. Cursor advances are
            // what `used` accumulates, so the rollback distance within this
            // page is exactly `used - mark`.
            let delta = (self.used - mark) as usize;
            debug_assert!(delta <= page.cursor);
            let new_cursor = page.cursor - delta;

            #[cfg(debug_assertions)]
            page.data[new_cursor..page.cursor].fill(POISON);

            page.records.retain(|r| (r.offset as usize) < new_cursor);
            page.cursor = new_cursor;
            self.used = mark;
        }
    }
}

impl Allocator for ArenaAllocator {
    fn kind(&self) -> AllocatorKind {
        self.kind
    }

    fn id(&self) -> AllocatorId {
        self.id
    }

    fn allocate(&mut self, size: usize, align: usize) -> Option<Block> {
        check_align(align);
        assert!(
            self.depth > 0,
            "arena allocation outside an open scope (enter_scope first)"
        );
        // Record offsets and sizes are u32; keep offset + size comfortably
        // inside that range even on an oversized page.
        if size > u32::MAX as usize / 2 {
            return None;
        }
        let align = align.max(CURSOR_QUANTUM);

        if !self.fits_in_last_page(size, align) {
            // Worst-case slack: the new page's base address may need
            // rounding up to `align`.
            self.push_page(size.checked_add(align)?)?;
            debug_assert!(self.fits_in_last_page(size, align));
        }
        Some(self.place(size, align))
    }

    fn reallocate(&mut self, block: Block, new_size: usize, align: usize) -> Option<Block> {
        check_align(align);
        if block.is_null() {
            return self.allocate(new_size, align);
        }
        if new_size > u32::MAX as usize / 2 {
            return None;
        }

        let (_, rec) = self.record(block);
        assert!(!rec.freed, "reallocate of released {block}");
        let (old_size, rec_align) = (rec.size as usize, rec.align as usize);

        // Shrink-in-place is free: the record shrinks, the cursor stays.
        if new_size <= old_size {
            let BlockRepr::Arena { page, record } = block.repr else {
                unreachable!()
            };
            let page = &mut self.pages[page as usize];
            let rec = &mut page.records[record as usize];
            rec.size = new_size as u32;
            #[cfg(debug_assertions)]
            {
                let start = rec.offset as usize + new_size;
                let end = rec.offset as usize + old_size;
                page.data[start..end].fill(POISON);
            }
            return Some(block);
        }

        // Grow in place only for the most recent allocation with spare room
        // in its page.
        if align <= rec_align && self.is_most_recent(block) {
            let BlockRepr::Arena { page, record } = block.repr else {
                unreachable!()
            };
            let page_ref = &self.pages[page as usize];
            let offset = page_ref.records[record as usize].offset as usize;
            let advance = align_up((offset + new_size).saturating_sub(page_ref.cursor), CURSOR_QUANTUM);
            let new_cursor = page_ref.cursor + advance;
            if new_cursor <= page_ref.data.len() {
                let page = &mut self.pages[page as usize];
                #[cfg(debug_assertions)]
                page.data[page.cursor..new_cursor].fill(POISON);
                page.cursor = new_cursor;
                page.records[record as usize].size = new_size as u32;
                self.used += advance as u64;
                self.high_water = self.high_water.max(self.used);
                return Some(block);
            }
        }

        // Allocate fresh, copy, mark the old block freed.
        let fresh = self.allocate(new_size, align)?;
        let BlockRepr::Arena { page: old_page, record: old_record } = block.repr else {
            unreachable!()
        };
        let (old_offset, keep) = {
            let rec = &self.pages[old_page as usize].records[old_record as usize];
            (rec.offset as usize, (rec.size as usize).min(new_size))
        };
        let BlockRepr::Arena { page: new_page, record: new_record } = fresh.repr else {
            unreachable!()
        };
        let new_offset = self.pages[new_page as usize].records[new_record as usize].offset as usize;

        if old_page == new_page {
            let page = &mut self.pages[old_page as usize];
            page.data
                .copy_within(old_offset..old_offset + keep, new_offset);
        } else {
            let (old_pages, new_pages) = self.pages.split_at_mut(new_page as usize);
            new_pages[0].data[new_offset..new_offset + keep]
                .copy_from_slice(&old_pages[old_page as usize].data[old_offset..old_offset + keep]);
        }
        self.release(block);
        Some(fresh)
    }

    fn release(&mut self, block: Block) {
        if block.is_null() {
            return;
        }
        let (_, rec) = self.record(block);
        assert!(!rec.freed, "double release of {block}");
        let BlockRepr::Arena { page, record } = block.repr else {
            unreachable!()
        };
        let page = &mut self.pages[page as usize];
        let rec = &mut page.records[record as usize];
        rec.freed = true;
        #[cfg(debug_assertions)]
        {
            let (offset, size) = (rec.offset as usize, rec.size as usize);
            page.data[offset..offset + size].fill(POISON);
        }
    }

    fn data(&self, block: Block) -> &[u8] {
        let (page, rec) = self.record(block);
        assert!(!rec.freed, "access to released {block}");
        let offset = rec.offset as usize;
        &page.data[offset..offset + rec.size as usize]
    }

    fn data_mut(&mut self, block: Block) -> &mut [u8] {
        let (_, rec) = self.record(block);
        assert!(!rec.freed, "access to released {block}");
        let BlockRepr::Arena { page, record } = block.repr else {
            unreachable!()
        };
        let page = &mut self.pages[page as usize];
        let rec = &page.records[record as usize];
        let offset = rec.offset as usize;
        let size = rec.size as usize;
        &mut page.data[offset..offset + size]
    }

    fn enter_scope(&mut self) -> u32 {
        self.depth += 1;
        if self.depth as usize <= self.config.tracked_scope_depth {
            self.marks.push(self.used);
        }
        self.depth
    }

    fn exit_scope(&mut self) {
        assert!(self.depth > 0, "exit_scope without a matching enter_scope");
        if self.depth as usize <= self.config.tracked_scope_depth {
            let mark = self
                .marks
                .pop()
                .expect("mark stack out of sync with depth");
            self.reclaim_to(mark);
        }
        // Past the tracked bound the depth still balances, but reclamation
        // is deferred to reset() or drop.
        self.depth -= 1;
    }

    fn scope_depth(&self) -> u32 {
        self.depth
    }
}

/// RAII guard for an open arena scope.
///
/// Created by [`ArenaAllocator::scope`]; closes the scope on drop. Derefs
/// to the arena so the full [`Allocator`] surface is available on the
/// guard. Calling `exit_scope` manually through the guard would unbalance
/// the stack the guard is about to pop; use nested [`ArenaAllocator::scope`]
/// calls for nested scopes instead.
#[must_use]
pub struct Scope<'a> {
    arena: &'a mut ArenaAllocator,
}

impl Deref for Scope<'_> {
    type Target = ArenaAllocator;

    fn deref(&self) -> &ArenaAllocator {
        self.arena
    }
}

impl DerefMut for Scope<'_> {
    fn deref_mut(&mut self) -> &mut ArenaAllocator {
        self.arena
    }
}

impl Drop for Scope<'_> {
    fn drop(&mut self) {
        self.arena.exit_scope();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena_4k() -> ArenaAllocator {
        ArenaAllocator::new(ArenaConfig::new(4096))
    }

    #[test]
    fn allocate_and_resolve_round_trip() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let block = scope.allocate(64, 8).unwrap();
        scope.data_mut(block).fill(0x11);
        assert_eq!(scope.data(block).len(), 64);
        assert!(scope.data(block).iter().all(|&b| b == 0x11));
    }

    #[test]
    #[should_panic(expected = "outside an open scope")]
    fn allocate_outside_scope_panics() {
        let mut arena = arena_4k();
        let _ = arena.allocate(8, 8);
    }

    #[test]
    fn returned_regions_honour_alignment() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        for align in [8usize, 16, 32, 64] {
            let block = scope.allocate(24, align).unwrap();
            let addr = scope.data(block).as_ptr() as usize;
            assert_eq!(addr % align, 0, "align {align}");
        }
    }

    #[test]
    fn cursor_advances_are_quantised() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        scope.allocate(3, 8).unwrap();
        assert_eq!(scope.used() % CURSOR_QUANTUM as u64, 0);
        scope.allocate(13, 8).unwrap();
        assert_eq!(scope.used() % CURSOR_QUANTUM as u64, 0);
    }

    #[test]
    fn scope_exit_restores_used() {
        let mut arena = arena_4k();
        arena.enter_scope();
        arena.allocate(100, 8).unwrap();
        let outer_used = arena.used();

        arena.enter_scope();
        for _ in 0..5 {
            arena.allocate(200, 8).unwrap();
        }
        assert!(arena.used() > outer_used);
        arena.exit_scope();
        assert_eq!(arena.used(), outer_used);

        arena.exit_scope();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.scope_depth(), 0);
    }

    #[test]
    fn ten_small_objects_then_exit_releases_the_page() {
        // Scenario from the subsystem requirements: page=4096, ten 64-byte
        // allocations, one scope.
        let mut arena = arena_4k();
        arena.enter_scope();
        for _ in 0..10 {
            arena.allocate(64, 8).unwrap();
        }
        assert_eq!(arena.page_count(), 1);
        arena.exit_scope();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.page_count(), 0);
    }

    #[test]
    fn overflow_into_second_page() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        scope.allocate(3000, 8).unwrap();
        scope.allocate(3000, 8).unwrap();
        assert_eq!(scope.page_count(), 2);
        scope.sanitize().unwrap();
    }

    #[test]
    fn oversized_request_gets_dedicated_page() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        // 3000 > 70% of 4096, so the page is sized ~1.5x the request.
        scope.allocate(3000, 8).unwrap();
        assert_eq!(scope.page_count(), 1);
        assert!(scope.memory_bytes() >= 3000);
        assert!(scope.memory_bytes() < 4096 + 3000);
    }

    #[test]
    fn release_marks_but_does_not_reclaim() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let block = scope.allocate(512, 8).unwrap();
        let used = scope.used();
        scope.release(block);
        assert_eq!(scope.used(), used);
        scope.sanitize().unwrap();
    }

    #[test]
    #[should_panic(expected = "access to released")]
    fn access_after_release_panics() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let block = scope.allocate(16, 8).unwrap();
        scope.release(block);
        let _ = scope.data(block);
    }

    #[test]
    #[should_panic(expected = "double release")]
    fn double_release_panics() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let block = scope.allocate(16, 8).unwrap();
        scope.release(block);
        scope.release(block);
    }

    #[test]
    #[should_panic(expected = "stale")]
    fn stale_block_after_scope_exit_panics() {
        let mut arena = arena_4k();
        let block = {
            let mut scope = arena.scope();
            scope.allocate(16, 8).unwrap()
        };
        let _ = arena.data(block);
    }

    #[test]
    fn shrink_in_place_keeps_block_and_used() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let block = scope.allocate(256, 8).unwrap();
        scope.data_mut(block).fill(0x22);
        let used = scope.used();
        let shrunk = scope.reallocate(block, 100, 8).unwrap();
        assert_eq!(shrunk, block);
        assert_eq!(scope.used(), used);
        assert_eq!(scope.data(shrunk).len(), 100);
        assert!(scope.data(shrunk).iter().all(|&b| b == 0x22));
    }

    #[test]
    fn grow_in_place_when_most_recent() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let block = scope.allocate(64, 8).unwrap();
        scope.data_mut(block).fill(0x33);
        let pages_before = scope.page_count();
        let grown = scope.reallocate(block, 256, 8).unwrap();
        // Same block, same page: grew in place.
        assert_eq!(grown, block);
        assert_eq!(scope.page_count(), pages_before);
        assert!(scope.data(grown)[..64].iter().all(|&b| b == 0x33));
    }

    #[test]
    fn grow_moves_when_not_most_recent() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let first = scope.allocate(64, 8).unwrap();
        scope.data_mut(first).fill(0x44);
        let _second = scope.allocate(64, 8).unwrap();
        let moved = scope.reallocate(first, 256, 8).unwrap();
        assert_ne!(moved, first);
        assert!(scope.data(moved)[..64].iter().all(|&b| b == 0x44));
        scope.sanitize().unwrap();
    }

    #[test]
    fn balanced_scopes_cause_no_net_growth() {
        let mut arena = arena_4k();
        for _ in 0..20 {
            let mut scope = arena.scope();
            scope.allocate(1000, 8).unwrap();
        }
        assert_eq!(arena.used(), 0);
    }

    #[test]
    fn nested_scope_rolls_back_within_a_page() {
        let mut arena = arena_4k();
        arena.enter_scope();
        arena.allocate(100, 8).unwrap();
        let outer_used = arena.used();

        arena.enter_scope();
        arena.allocate(100, 8).unwrap();
        arena.exit_scope();

        // Same page: the cursor rolled back rather than the page dropping.
        assert_eq!(arena.used(), outer_used);
        assert_eq!(arena.page_count(), 1);
        arena.sanitize().unwrap();
        arena.exit_scope();
    }

    #[test]
    fn nested_scope_drops_pages_created_inside_it() {
        let mut arena = arena_4k();
        arena.enter_scope();
        arena.allocate(100, 8).unwrap();

        arena.enter_scope();
        for _ in 0..10 {
            arena.allocate(3000, 8).unwrap();
        }
        assert!(arena.page_count() > 1);
        arena.exit_scope();
        assert_eq!(arena.page_count(), 1);
        arena.exit_scope();
        assert_eq!(arena.page_count(), 0);
    }

    #[test]
    fn allocation_reuses_rolled_back_space() {
        let mut arena = arena_4k();
        arena.enter_scope();
        arena.allocate(100, 8).unwrap();
        {
            let mut inner = arena.scope();
            inner.allocate(1024, 8).unwrap();
        }
        assert_eq!(arena.page_count(), 1);
        arena.allocate(1024, 8).unwrap();
        // The rolled-back page was reused; no new page appeared.
        assert_eq!(arena.page_count(), 1);
        arena.exit_scope();
    }

    #[test]
    fn untracked_depth_defers_reclamation_to_reset() {
        let mut config = ArenaConfig::new(4096);
        config.tracked_scope_depth = 2;
        let mut arena = ArenaAllocator::new(config);

        arena.enter_scope();
        arena.enter_scope();
        arena.enter_scope(); // beyond the tracked bound
        arena.allocate(500, 8).unwrap();
        let used = arena.used();
        arena.exit_scope(); // untracked: no reclamation
        assert_eq!(arena.used(), used);
        assert_eq!(arena.scope_depth(), 2);

        arena.exit_scope(); // tracked: reclaims back to its mark
        assert_eq!(arena.used(), 0);
        arena.exit_scope();

        arena.enter_scope();
        arena.allocate(100, 8).unwrap();
        arena.reset();
        assert_eq!(arena.used(), 0);
        assert_eq!(arena.page_count(), 0);
        assert_eq!(arena.scope_depth(), 0);
    }

    #[test]
    #[should_panic(expected = "without a matching enter_scope")]
    fn unbalanced_exit_panics() {
        let mut arena = arena_4k();
        arena.exit_scope();
    }

    #[test]
    fn high_water_survives_reclamation() {
        let mut arena = arena_4k();
        {
            let mut scope = arena.scope();
            scope.allocate(2048, 8).unwrap();
        }
        assert_eq!(arena.used(), 0);
        assert!(arena.high_water() >= 2048);
    }

    #[test]
    fn allocate_zeroed_is_zeroed_despite_poison() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let block = scope.allocate_zeroed(32, 4, 8).unwrap();
        assert_eq!(scope.data(block).len(), 128);
        assert!(scope.data(block).iter().all(|&b| b == 0));
    }

    #[test]
    fn temp_kind_is_preserved() {
        let arena = ArenaAllocator::with_kind(ArenaConfig::default(), AllocatorKind::Temp);
        assert_eq!(arena.kind(), AllocatorKind::Temp);
    }

    #[cfg(debug_assertions)]
    #[test]
    fn sanitize_detects_poison_damage() {
        let mut arena = arena_4k();
        let mut scope = arena.scope();
        let block = scope.allocate(64, 8).unwrap();
        let BlockRepr::Arena { page, record } = block.repr else {
            unreachable!()
        };
        scope.release(block);
        scope.sanitize().unwrap();
        // Scribble over the freed region behind the allocator's back.
        let offset = scope.arena.pages[page as usize].records[record as usize].offset as usize;
        scope.arena.pages[page as usize].data[offset] = 0;
        assert!(matches!(
            scope.sanitize(),
            Err(SanitizeError::PoisonDamaged { .. })
        ));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn used_is_restored_across_balanced_scopes(
                outer in proptest::collection::vec(1usize..2000, 0..8),
                inner in proptest::collection::vec(1usize..2000, 0..8),
            ) {
                let mut arena = ArenaAllocator::new(ArenaConfig::new(4096));
                arena.enter_scope();
                for &size in &outer {
                    arena.allocate(size, 8).unwrap();
                }
                let before = arena.used();

                arena.enter_scope();
                for &size in &inner {
                    arena.allocate(size, 8).unwrap();
                }
                arena.exit_scope();

                prop_assert_eq!(arena.used(), before);
                prop_assert!(arena.sanitize().is_ok());
                arena.exit_scope();
                prop_assert_eq!(arena.used(), 0);
            }

            #[test]
            fn mixed_traffic_stays_consistent(
                ops in proptest::collection::vec((1usize..1500, 0u8..3), 1..40),
            ) {
                let mut arena = ArenaAllocator::new(ArenaConfig::new(4096));
                let mut scope = arena.scope();
                let mut live: Vec<Block> = Vec::new();
                for (size, op) in ops {
                    match op {
                        0 => live.push(scope.allocate(size, 8).unwrap()),
                        1 => {
                            if let Some(block) = live.pop() {
                                scope.release(block);
                            }
                        }
                        _ => {
                            if let Some(block) = live.pop() {
                                live.push(scope.reallocate(block, size, 8).unwrap());
                            }
                        }
                    }
                }
                prop_assert!(scope.sanitize().is_ok());
            }
        }
    }
}
