//! The thread-local default short-lived arena.
//!
//! Many call sites need a scratch allocator for the duration of one
//! operation and nothing longer. Rather than threading an arena through
//! every signature, each thread lazily owns one default arena (kind
//! [`AllocatorKind::Temp`]), and [`with_temp`] brackets a closure in a
//! scope of it. Threads never share an instance, which is the only
//! concurrency accommodation this subsystem makes.
//!
//! [`AllocatorKind::Temp`]: crate::AllocatorKind::Temp

use std::cell::RefCell;

use crate::arena::ArenaAllocator;
use crate::config::ArenaConfig;
use crate::id::AllocatorKind;

thread_local! {
    static TEMP_ARENA: RefCell<ArenaAllocator> = RefCell::new(ArenaAllocator::with_kind(
        ArenaConfig::default(),
        AllocatorKind::Temp,
    ));
}

/// Run `f` inside a scope of this thread's temp arena.
///
/// Everything allocated by `f` through the provided arena is reclaimed
/// when `f` returns (or unwinds — the scope is guard-managed). The closure
/// holds the thread's instance exclusively, so `with_temp` must not be
/// called again from inside `f`; open a nested scope on the provided
/// arena instead (`arena.scope()`).
///
/// ```
/// use peat_alloc::{temp, Allocator};
///
/// let sum = temp::with_temp(|arena| {
///     let block = arena.allocate_zeroed(16, 4, 8).unwrap();
///     arena.data_mut(block)[0] = 3;
///     arena.data(block).iter().map(|&b| b as u32).sum::<u32>()
/// });
/// assert_eq!(sum, 3);
/// ```
pub fn with_temp<R>(f: impl FnOnce(&mut ArenaAllocator) -> R) -> R {
    TEMP_ARENA.with(|cell| {
        let mut arena = cell.borrow_mut();
        let mut scope = arena.scope();
        f(&mut scope)
    })
}

/// Current live bytes in this thread's temp arena.
///
/// Outside any [`with_temp`] call this is normally 0; a nonzero value
/// inside nested calls reflects the enclosing scopes.
pub fn temp_used() -> u64 {
    TEMP_ARENA.with(|cell| cell.borrow().used())
}
