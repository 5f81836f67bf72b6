//! Linear-memory ceiling enforcement for a single instance, grounded on the
//! teacher's `isola::internal::resource::MemoryLimiter` (same
//! `ResourceLimiter` impl, reject-on-exceed rather than clamp).

use wasmtime::ResourceLimiter;

/// Caps an instance's linear memory at `max_memory_hard` bytes. Installed
/// per-instantiation via `Store::limiter` so one process's handler can never
/// grow its sandbox beyond the configured policy (distilled spec §4.1).
pub struct MemoryLimiter {
    max_memory_hard: usize,
}

impl MemoryLimiter {
    pub const fn new(max_memory_hard: usize) -> Self {
        Self {
            max_memory_hard,
        }
    }
}

impl ResourceLimiter for MemoryLimiter {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        Ok(desired <= self.max_memory_hard)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> wasmtime::Result<bool> {
        Ok(desired <= self.max_memory_hard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_limit_is_enforced() {
        let mut limiter = MemoryLimiter::new(1024);
        assert!(limiter.memory_growing(0, 1024, None).expect("memory grow"));
        assert!(!limiter
            .memory_growing(1024, 1025, None)
            .expect("memory grow"));
    }

    #[test]
    fn table_limit_shares_the_memory_budget() {
        let mut limiter = MemoryLimiter::new(64);
        assert!(limiter.table_growing(0, 64, None).expect("table grow"));
        assert!(!limiter.table_growing(64, 65, None).expect("table grow"));
    }
}
