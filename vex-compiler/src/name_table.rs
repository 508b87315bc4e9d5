// Per-scope binding table.
//
// Grounded on `ImmutabilityChecker`'s scope-as-cloned-set pattern (the
// teacher's borrow checker pushed/popped scopes by cloning a
// `HashSet<String>` of mutable/immutable names on function entry/exit);
// generalized here from a bare name set to a full binding record carrying
// the type-flow metadata the assignment analyzer needs.

use std::collections::HashMap;
use vex_ast::Type;

/// A unique id for a scope, assigned in declaration order. Scope 0 is the
/// outermost (a function body); nested blocks and closures get fresh ids.
pub type ScopeId = u32;

/// A named value in some scope (SPEC_FULL §3, "Binding record").
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    pub declared_type: Type,
    pub is_mutable: bool,
    pub has_type_annotation: bool,
    pub type_widened: bool,
    pub scope: ScopeId,
}

impl Binding {
    pub fn new(name: String, declared_type: Type, is_mutable: bool, has_type_annotation: bool, scope: ScopeId) -> Self {
        Self {
            name,
            declared_type,
            is_mutable,
            has_type_annotation,
            type_widened: false,
            scope,
        }
    }

    /// Widen this binding to the tagged-any representation. Monotone:
    /// once true, `type_widened` never flips back (SPEC_FULL §3 invariant).
    pub fn widen(&mut self) {
        self.type_widened = true;
    }
}

/// A chain of scopes, innermost last. Mirrors the teacher's save/restore
/// discipline but keyed by binding record rather than a plain name set, and
/// kept as a stack of maps instead of clone-on-enter/restore-on-exit so a
/// later widening can still reach back into an enclosing scope's binding.
#[derive(Debug, Default)]
pub struct NameTable {
    scopes: Vec<HashMap<String, Binding>>,
    next_scope_id: ScopeId,
}

impl NameTable {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            next_scope_id: 0,
        }
    }

    /// Enter a new scope (function body, block, or closure body) and return
    /// its id.
    pub fn push_scope(&mut self) -> ScopeId {
        let id = self.next_scope_id;
        self.next_scope_id += 1;
        self.scopes.push(HashMap::new());
        id
    }

    /// Pop the innermost scope and return its final bindings. The caller
    /// (the analyzer) is responsible for keeping whatever of this snapshot
    /// downstream consumers (tests, the emitter contract) still need —
    /// `NameTable` itself never holds on to a destroyed scope's bindings
    /// (SPEC_FULL §3: "Destroyed when its scope is destroyed").
    pub fn pop_scope(&mut self) -> HashMap<String, Binding> {
        self.scopes.pop().unwrap_or_default()
    }

    pub fn current_scope(&self) -> Option<ScopeId> {
        // Scope ids are assigned sequentially on push, so the current
        // scope's id is always next_scope_id - scopes.len().
        if self.scopes.is_empty() {
            None
        } else {
            Some(self.next_scope_id - self.scopes.len() as u32)
        }
    }

    pub fn declare(&mut self, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(binding.name.clone(), binding);
        }
    }

    /// Resolve a name through the scope chain, innermost first.
    pub fn resolve(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn resolve_mut(&mut self, name: &str) -> Option<&mut Binding> {
        self.scopes.iter_mut().rev().find_map(|scope| scope.get_mut(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_finds_innermost_shadow() {
        let mut table = NameTable::new();
        table.push_scope();
        table.declare(Binding::new("x".into(), Type::I32, true, false, 0));
        table.push_scope();
        table.declare(Binding::new("x".into(), Type::Str, false, true, 1));

        let resolved = table.resolve("x").unwrap();
        assert_eq!(resolved.declared_type, Type::Str);
        assert!(!resolved.is_mutable);

        table.pop_scope();
        let resolved = table.resolve("x").unwrap();
        assert_eq!(resolved.declared_type, Type::I32);
        assert!(resolved.is_mutable);
    }

    #[test]
    fn widen_is_visible_through_resolve_mut() {
        let mut table = NameTable::new();
        table.push_scope();
        table.declare(Binding::new("y".into(), Type::I32, true, false, 0));

        table.resolve_mut("y").unwrap().widen();
        assert!(table.resolve("y").unwrap().type_widened);
    }

    #[test]
    fn unresolved_name_returns_none() {
        let table = NameTable::new();
        assert!(table.resolve("nope").is_none());
    }
}
