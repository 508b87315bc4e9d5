// Two-allocator discipline (SPEC_FULL §4.3 "Two-allocator discipline", §9
// "Two-allocator problem").
//
// `ScriptPool` (the current execution's own allocations, released via
// ordinary `Drop`) and `ParserPool` (a previously-invoked parser's bump
// arena, bulk-released when the parser's root drops, whose individual
// buffers this crate may never free into). This crate has no real parser
// in scope, so `ParserPool` exists only as the *origin* half of that
// distinction — a container's `is_heap = false` flag marks data as having
// come from one, grounded on the teacher's `typed_arena`-is-bulk-only
// pattern (`vex-ast/src/arena.rs`) as the nearest existing analogue of
// "allocate many, free never individually."

use std::cell::Cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolOrigin {
    Script,
    Parser,
}

/// Bookkeeping for the script-execution allocator. Tracks bytes handed out
/// and bytes explicitly freed back to it; this crate models allocation
/// itself as ordinary `Vec`/`Box` (freed via `Drop`), so these counters
/// exist for the discipline's accounting, not to actually back allocation.
#[derive(Debug, Default)]
pub struct ScriptPool {
    bytes_allocated: Cell<usize>,
    bytes_freed: Cell<usize>,
}

impl ScriptPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_alloc(&self, bytes: usize) {
        self.bytes_allocated.set(self.bytes_allocated.get() + bytes);
    }

    pub fn record_free(&self, bytes: usize) {
        self.bytes_freed.set(self.bytes_freed.get() + bytes);
    }

    pub fn bytes_allocated(&self) -> usize {
        self.bytes_allocated.get()
    }

    pub fn bytes_freed(&self) -> usize {
        self.bytes_freed.get()
    }
}

/// Where a rebuild's new buffer is allocated from, and whether the old
/// buffer may be freed — SPEC_FULL §4.3's discipline table:
///
/// | is_heap | is_data_migrated | allocate from | free old? |
/// |---------|------------------|----------------|-----------|
/// | true    | (irrelevant)     | script_pool    | yes       |
/// | false   | false            | script_pool    | no        |
/// | false   | true             | script_pool    | yes       |
///
/// The new shape/data always comes from `script_pool`; only the freeing of
/// the *old* buffer depends on whether it was ever a parser-owned buffer
/// that has not yet been migrated.
pub fn rebuild_site(is_heap: bool, is_data_migrated: bool) -> (PoolOrigin, bool) {
    let may_free_old = is_heap || is_data_migrated;
    (PoolOrigin::Script, may_free_old)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_container_always_frees_old_buffer() {
        assert_eq!(rebuild_site(true, false), (PoolOrigin::Script, true));
        assert_eq!(rebuild_site(true, true), (PoolOrigin::Script, true));
    }

    #[test]
    fn first_mutation_of_parser_container_does_not_free() {
        assert_eq!(rebuild_site(false, false), (PoolOrigin::Script, false));
    }

    #[test]
    fn subsequent_mutation_of_parser_container_frees() {
        assert_eq!(rebuild_site(false, true), (PoolOrigin::Script, true));
    }
}
