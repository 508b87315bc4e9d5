// The container (SPEC_FULL §3 "Container", §9 "Variant containers").
//
// The spec's structural invariant is that all six variants share one
// layout-identical header so a kind tag can be reassigned in place without
// relocating the container. This crate realizes that invariant not by
// `unsafe` union-of-layouts punning but by giving every container one
// stable `Rc<Container>` handle wrapping a `RefCell<ContainerData>` enum:
// reassigning `kind` is replacing the enum's active variant behind the
// `RefCell`, so every outstanding `Rc` clone observes the change by
// construction.

use crate::shape::Shape;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    GenericArray,
    List,
    SpecializedInt56,
    SpecializedInt64,
    SpecializedFloat64,
    Map,
    Element,
}

pub enum ContainerData {
    GenericArray(Vec<Value>),
    List(Vec<Value>),
    SpecializedInt56(Vec<i64>),
    SpecializedInt64(Vec<i64>),
    SpecializedFloat64(Vec<f64>),
    Map {
        shape: Rc<Shape>,
        fields: Vec<Value>,
    },
    Element {
        shape: Rc<Shape>,
        fields: Vec<Value>,
        /// Ordered children (the list axis element extends alongside its
        /// map axis `fields`/`shape`). Index-write/read operate on this
        /// vector exactly as they do for `GenericArray`/`List` (SPEC_FULL
        /// §4.2 dispatch table: "list, element -> same as generic array").
        children: Vec<Value>,
        tag_name: String,
        namespace: Option<String>,
    },
}

impl ContainerData {
    pub fn kind(&self) -> ContainerKind {
        match self {
            ContainerData::GenericArray(_) => ContainerKind::GenericArray,
            ContainerData::List(_) => ContainerKind::List,
            ContainerData::SpecializedInt56(_) => ContainerKind::SpecializedInt56,
            ContainerData::SpecializedInt64(_) => ContainerKind::SpecializedInt64,
            ContainerData::SpecializedFloat64(_) => ContainerKind::SpecializedFloat64,
            ContainerData::Map { .. } => ContainerKind::Map,
            ContainerData::Element { .. } => ContainerKind::Element,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ContainerData::GenericArray(v) | ContainerData::List(v) => v.len(),
            ContainerData::SpecializedInt56(v) | ContainerData::SpecializedInt64(v) => v.len(),
            ContainerData::SpecializedFloat64(v) => v.len(),
            ContainerData::Map { fields, .. } => fields.len(),
            // An element's "length" for index-write purposes is its
            // ordered-children count (the list axis), not its attribute
            // count (the map axis) — see `children` on the `Element` variant.
            ContainerData::Element { children, .. } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A container header plus its payload (SPEC_FULL §3). `is_heap` is set at
/// construction and never changes; `is_data_migrated` transitions
/// false→true exactly once (§4.3's two-allocator discipline).
pub struct Container {
    is_heap: bool,
    is_data_migrated: Cell<bool>,
    data: RefCell<ContainerData>,
}

impl Container {
    pub fn new(is_heap: bool, data: ContainerData) -> Rc<Self> {
        Rc::new(Self {
            is_heap,
            is_data_migrated: Cell::new(false),
            data: RefCell::new(data),
        })
    }

    /// Construct a container as if produced by an input parser: `is_heap =
    /// false`, `is_data_migrated = false` until its first rebuild.
    pub fn from_parser(data: ContainerData) -> Rc<Self> {
        Self::new(false, data)
    }

    /// Construct a container as if produced by a procedural expression
    /// (literal, builder): `is_heap = true`.
    pub fn from_script(data: ContainerData) -> Rc<Self> {
        Self::new(true, data)
    }

    pub fn is_heap(&self) -> bool {
        self.is_heap
    }

    pub fn is_data_migrated(&self) -> bool {
        self.is_data_migrated.get()
    }

    /// Mark the data buffer migrated. Monotone: never called with `false`
    /// after having been set `true` (§3 invariant 2).
    pub fn mark_migrated(&self) {
        self.is_data_migrated.set(true);
    }

    pub fn kind(&self) -> ContainerKind {
        self.data.borrow().kind()
    }

    pub fn len(&self) -> usize {
        self.data.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data(&self) -> std::cell::Ref<'_, ContainerData> {
        self.data.borrow()
    }

    pub fn data_mut(&self) -> std::cell::RefMut<'_, ContainerData> {
        self.data.borrow_mut()
    }

    /// Reassign the container's payload in place, preserving identity
    /// (SPEC_FULL §4.2 step 4, §9 "Variant containers"). Every outstanding
    /// `Rc<Container>` clone observes the new kind on its next borrow.
    pub fn replace_data(&self, new_data: ContainerData) -> ContainerData {
        self.data.replace(new_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replacing_data_preserves_identity_across_clones() {
        let c = Container::from_script(ContainerData::SpecializedInt56(vec![1, 2, 3]));
        let alias = c.clone();

        assert_eq!(c.kind(), ContainerKind::SpecializedInt56);
        c.replace_data(ContainerData::GenericArray(vec![Value::Int64(1)]));

        // `alias` is the same Rc, so it observes the conversion too.
        assert_eq!(alias.kind(), ContainerKind::GenericArray);
        assert!(Rc::ptr_eq(&c, &alias));
    }

    #[test]
    fn migration_flag_is_monotone_in_practice() {
        let c = Container::from_parser(ContainerData::GenericArray(vec![]));
        assert!(!c.is_data_migrated());
        c.mark_migrated();
        assert!(c.is_data_migrated());
    }
}
