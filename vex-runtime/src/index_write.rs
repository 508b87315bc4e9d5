// Index-write and the specialized-to-generic conversion (SPEC_FULL §4.2).
//
// Grounded on `vex-compiler/src/codegen_ast/statements/assignment.rs`'s
// "try the fast specialized path, fall back to the generic path"
// structure (kept as the stylistic model for this dispatch; its own
// inkwell-emitting body has no counterpart here, there is no back end in
// this crate to emit into).

use crate::allocator::{rebuild_site, ScriptPool};
use crate::container::{Container, ContainerData, ContainerKind};
use crate::errors::{RuntimeError, RuntimeResult};
use crate::value::Value;
use std::rc::Rc;

/// `index_write(container, index, value)` — SPEC_FULL §6.
///
/// Dispatches per container kind; converts a specialized array to generic
/// when the incoming value's tag is incompatible with the specialized
/// slot width, then always finishes with a generic write.
pub fn index_write(container: &Rc<Container>, pool: &ScriptPool, index: usize, value: Value) -> RuntimeResult<()> {
    let len = container.len();
    if index >= len {
        return Err(RuntimeError::IndexOutOfBounds { index, length: len });
    }

    match container.kind() {
        ContainerKind::GenericArray | ContainerKind::List | ContainerKind::Element => {
            write_generic(container, index, value)
        }

        ContainerKind::SpecializedInt56 => {
            if value.fits_int56() {
                write_raw_int(container, index, value.as_i64().expect("fits_int56 implies as_i64"));
                Ok(())
            } else {
                convert_to_generic(container, pool);
                write_generic(container, index, value)
            }
        }

        ContainerKind::SpecializedInt64 => {
            if matches!(value, Value::Int32(_) | Value::Int64(_)) {
                write_raw_int(container, index, value.as_i64().expect("int kind implies as_i64"));
                Ok(())
            } else {
                convert_to_generic(container, pool);
                write_generic(container, index, value)
            }
        }

        ContainerKind::SpecializedFloat64 => {
            if let Some(f) = value.as_f64() {
                write_raw_float(container, index, f);
                Ok(())
            } else {
                convert_to_generic(container, pool);
                write_generic(container, index, value)
            }
        }

        // Index-write on a bare map is not a spec'd operation (maps are
        // field-write targets only, §4.3); reaching here means the caller
        // mismatched container kind to operation.
        ContainerKind::Map => Err(RuntimeError::UnknownField {
            key: format!("<index {}>", index),
        }),
    }
}

fn write_generic(container: &Rc<Container>, index: usize, value: Value) -> RuntimeResult<()> {
    let mut data = container.data_mut();
    match &mut *data {
        ContainerData::GenericArray(cells) | ContainerData::List(cells) => {
            // Assigning over `cells[index]` drops the displaced cell in
            // place, which is this crate's decrement-ref of any boxed
            // payload it held (SPEC_FULL §4.2 dispatch table).
            cells[index] = value;
            Ok(())
        }
        // `element` extends `list` for index-write purposes: its ordered
        // children are a distinct vector from its shape-keyed attribute
        // fields (SPEC_FULL §4.2: "list, element -> same as generic array").
        ContainerData::Element { children, .. } => {
            children[index] = value;
            Ok(())
        }
        _ => unreachable!("write_generic called after conversion guarantees a generic variant"),
    }
}

fn write_raw_int(container: &Rc<Container>, index: usize, raw: i64) {
    let mut data = container.data_mut();
    match &mut *data {
        ContainerData::SpecializedInt56(slots) | ContainerData::SpecializedInt64(slots) => {
            slots[index] = raw;
        }
        _ => unreachable!("write_raw_int called only for specialized int kinds"),
    }
}

fn write_raw_float(container: &Rc<Container>, index: usize, raw: f64) {
    let mut data = container.data_mut();
    match &mut *data {
        ContainerData::SpecializedFloat64(slots) => slots[index] = raw,
        _ => unreachable!("write_raw_float called only for SpecializedFloat64"),
    }
}

/// Specialized-to-generic conversion (SPEC_FULL §4.2, "the central
/// algorithm"). The container's identity (`Rc<Container>` handle) is not
/// relocated; every outstanding reference observes the new kind on its
/// next access.
fn convert_to_generic(container: &Rc<Container>, pool: &ScriptPool) {
    let is_heap = container.is_heap();
    let is_migrated = container.is_data_migrated();
    let (_, may_free_old) = rebuild_site(is_heap, is_migrated);

    let boxed: Vec<Value> = {
        let data = container.data();
        match &*data {
            ContainerData::SpecializedInt56(slots) | ContainerData::SpecializedInt64(slots) => {
                slots.iter().map(|raw| Value::Int64(*raw)).collect()
            }
            ContainerData::SpecializedFloat64(slots) => slots.iter().map(|raw| Value::Float(*raw)).collect(),
            other => {
                debug_assert!(
                    false,
                    "convert_to_generic called on non-specialized kind {:?}",
                    other.kind()
                );
                Vec::new()
            }
        }
    };

    pool.record_alloc(boxed.len() * std::mem::size_of::<Value>());
    let old = container.replace_data(ContainerData::GenericArray(boxed));
    if may_free_old {
        pool.record_free(old.len() * std::mem::size_of::<Value>());
    }
    if !is_heap && !is_migrated {
        container.mark_migrated();
    }

    log::debug!(
        "converted container from {:?} to GenericArray (len {})",
        old.kind(),
        container.len()
    );
}

/// `specialized_read_with_fallback(container, index)` — SPEC_FULL §6.
/// Checks the kind tag at the top and, if the container has since been
/// converted to generic, defers to the generic read and boxes the raw
/// result. A single comparison is the entire cost of "always backed"
/// dynamism (SPEC_FULL §4.2).
pub fn specialized_read_with_fallback(container: &Rc<Container>, index: usize) -> RuntimeResult<Value> {
    let len = container.len();
    if index >= len {
        return Err(RuntimeError::IndexOutOfBounds { index, length: len });
    }

    let data = container.data();
    Ok(match &*data {
        ContainerData::GenericArray(cells) | ContainerData::List(cells) => cells[index].clone(),
        ContainerData::Element { children, .. } => children[index].clone(),
        ContainerData::SpecializedInt56(slots) | ContainerData::SpecializedInt64(slots) => Value::Int64(slots[index]),
        ContainerData::SpecializedFloat64(slots) => Value::Float(slots[index]),
        ContainerData::Map { .. } => {
            return Err(RuntimeError::UnknownField {
                key: format!("<index {}>", index),
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_within_int56_range_stays_specialized() {
        let c = Container::from_script(ContainerData::SpecializedInt56(vec![0, 0, 0]));
        let pool = ScriptPool::new();
        index_write(&c, &pool, 1, Value::Int32(42)).unwrap();
        assert_eq!(c.kind(), ContainerKind::SpecializedInt56);
        assert_eq!(specialized_read_with_fallback(&c, 1).unwrap().as_i64(), Some(42));
    }

    #[test]
    fn writing_string_into_specialized_int56_converts_to_generic() {
        let c = Container::from_script(ContainerData::SpecializedInt56(vec![1, 2, 3]));
        let pool = ScriptPool::new();
        index_write(&c, &pool, 0, Value::Str(Rc::new("hi".into()))).unwrap();
        assert_eq!(c.kind(), ContainerKind::GenericArray);

        // Prior slots were boxed during conversion; slot 1 survives untouched.
        let read_back = specialized_read_with_fallback(&c, 1).unwrap();
        assert_eq!(read_back.as_i64(), Some(2));
    }

    #[test]
    fn out_of_bounds_index_is_rejected() {
        let c = Container::from_script(ContainerData::GenericArray(vec![Value::Null]));
        let pool = ScriptPool::new();
        let err = index_write(&c, &pool, 5, Value::Int32(1)).unwrap_err();
        assert!(matches!(err, RuntimeError::IndexOutOfBounds { .. }));
    }

    #[test]
    fn parser_owned_container_first_conversion_does_not_free_old_buffer() {
        let c = Container::from_parser(ContainerData::SpecializedFloat64(vec![1.0, 2.0]));
        let pool = ScriptPool::new();
        assert!(!c.is_data_migrated());

        index_write(&c, &pool, 0, Value::Str(Rc::new("oops".into()))).unwrap();

        assert!(c.is_data_migrated());
        assert_eq!(pool.bytes_freed(), 0);
        assert!(pool.bytes_allocated() > 0);
    }

    #[test]
    fn float_slot_accepts_widened_integers() {
        let c = Container::from_script(ContainerData::SpecializedFloat64(vec![0.0]));
        let pool = ScriptPool::new();
        index_write(&c, &pool, 0, Value::Int32(7)).unwrap();
        assert_eq!(c.kind(), ContainerKind::SpecializedFloat64);
        assert_eq!(specialized_read_with_fallback(&c, 0).unwrap().as_f64(), Some(7.0));
    }

    #[test]
    fn element_index_write_targets_children_not_attributes() {
        // `element` extends both map (attributes) and list (children);
        // index-write must reach the children vector, identically to a
        // generic array/list (SPEC_FULL §4.2 dispatch table).
        let shape = crate::shape::intern(&[("id".to_string(), crate::shape::FieldType::Int32)]).unwrap();
        let c = Container::from_script(ContainerData::Element {
            shape,
            fields: vec![Value::Int32(1)],
            children: vec![Value::Str(Rc::new("a".into())), Value::Str(Rc::new("b".into()))],
            tag_name: "div".to_string(),
            namespace: None,
        });
        let pool = ScriptPool::new();

        index_write(&c, &pool, 1, Value::Str(Rc::new("replaced".into()))).unwrap();

        let read_back = specialized_read_with_fallback(&c, 1).unwrap();
        assert!(matches!(read_back, Value::Str(s) if *s == "replaced".to_string()));

        // The attribute fields are untouched by an index-write.
        match &*c.data() {
            ContainerData::Element { fields, .. } => assert_eq!(fields[0].as_i64(), Some(1)),
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn element_index_write_out_of_bounds_uses_child_count() {
        let shape = crate::shape::intern(&[]).unwrap();
        let c = Container::from_script(ContainerData::Element {
            shape,
            fields: vec![],
            children: vec![Value::Null],
            tag_name: "span".to_string(),
            namespace: None,
        });
        let pool = ScriptPool::new();

        let err = index_write(&c, &pool, 1, Value::Int32(1)).unwrap_err();
        assert!(matches!(err, RuntimeError::IndexOutOfBounds { index: 1, length: 1 }));
    }
}
