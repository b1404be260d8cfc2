use crate::zip::DEFAULT_MAX_ENTRY_SIZE;

/// Default arena size; every single token must fit in it.
pub const DEFAULT_ARENA_CAPACITY: usize = 64 * 1024;

/// Tunable limits for one extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Size of the arena backing the tokenizer
    pub arena_capacity: usize,
    /// Largest uncompressed size accepted for any archive entry
    pub max_entry_size: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            arena_capacity: DEFAULT_ARENA_CAPACITY,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
        }
    }
}

impl ExtractConfig {
    pub fn with_arena_capacity(mut self, arena_capacity: usize) -> Self {
        self.arena_capacity = arena_capacity;
        self
    }

    pub fn with_max_entry_size(mut self, max_entry_size: u64) -> Self {
        self.max_entry_size = max_entry_size;
        self
    }
}
