//! Arena configuration parameters.

/// Configuration for the arena allocator.
///
/// Controls page sizing and the depth of the tracked scope stack.
/// Validated at arena construction; all values are immutable after creation.
#[derive(Clone, Copy, Debug)]
pub struct ArenaConfig {
    /// Nominal size of each arena page in bytes.
    ///
    /// Default: 65_536. Must be a power of two and at least 1024. Requests
    /// larger than ~70% of a nominal page get a dedicated oversized page.
    pub page_size: usize,

    /// Hard upper bound on the size of an oversized page in bytes.
    ///
    /// Default: 16 MiB. Oversized pages are sized 1.5x the request and
    /// clamped to this bound (but never below the request itself, which
    /// must always be satisfiable).
    pub max_page_size: usize,

    /// Number of scope marks tracked before reclamation degrades.
    ///
    /// Default: 64. Scopes nested beyond this bound still balance the depth
    /// counter, but their allocations are only reclaimed when the arena is
    /// reset or dropped.
    pub tracked_scope_depth: usize,
}

impl ArenaConfig {
    /// Default nominal page size: 64 KiB.
    pub const DEFAULT_PAGE_SIZE: usize = 65_536;

    /// Default oversized-page cap: 16 MiB.
    pub const DEFAULT_MAX_PAGE_SIZE: usize = 16 * 1024 * 1024;

    /// Default tracked scope depth.
    pub const DEFAULT_TRACKED_SCOPE_DEPTH: usize = 64;

    /// Create a config with the given nominal page size and defaults for
    /// everything else.
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            max_page_size: Self::DEFAULT_MAX_PAGE_SIZE.max(page_size),
            tracked_scope_depth: Self::DEFAULT_TRACKED_SCOPE_DEPTH,
        }
    }

    /// Validate the configuration, panicking on programmer error.
    ///
    /// Called by `ArenaAllocator::new`; invalid configuration is not a
    /// runtime condition.
    pub(crate) fn validate(&self) {
        assert!(
            self.page_size.is_power_of_two() && self.page_size >= 1024,
            "page_size must be a power of two and >= 1024 (got {})",
            self.page_size,
        );
        assert!(
            self.max_page_size >= self.page_size,
            "max_page_size ({}) must be >= page_size ({})",
            self.max_page_size,
            self.page_size,
        );
        assert!(
            self.tracked_scope_depth >= 1,
            "tracked_scope_depth must be at least 1",
        );
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE)
    }
}
