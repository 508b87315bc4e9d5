// Field-write and shape rebuild (SPEC_FULL §4.3).
//
// No teacher runtime source exists for this (confirmed: no C-level map/
// array runtime anywhere in the pack). The dispatch shape
// (resolve-then-match-then-rebuild) follows the same "try the fast path,
// escalate" structure `index_write` borrows from
// `codegen_ast/statements/assignment.rs`; the algorithm itself is authored
// directly from SPEC_FULL §4.3's 6-step rebuild procedure.

use crate::allocator::{rebuild_site, ScriptPool};
use crate::container::{Container, ContainerData, ContainerKind};
use crate::errors::{RuntimeError, RuntimeResult};
use crate::shape::{intern_with_field_type, FieldType};
use crate::value::{Value, ValueKind};
use std::rc::Rc;

/// `field_write(container, key, value)` — SPEC_FULL §6.
pub fn field_write(container: &Rc<Container>, pool: &ScriptPool, key: &str, value: Value) -> RuntimeResult<()> {
    match container.kind() {
        ContainerKind::Map | ContainerKind::Element => {}
        _ => {
            return Err(RuntimeError::UnknownField {
                key: key.to_string(),
            })
        }
    }

    let (idx, field_ty) = {
        let data = container.data();
        let shape = match &*data {
            ContainerData::Map { shape, .. } | ContainerData::Element { shape, .. } => shape,
            _ => unreachable!("kind already checked above"),
        };
        let (idx, entry) = shape.field(key).ok_or_else(|| RuntimeError::UnknownField {
            key: key.to_string(),
        })?;
        (idx, entry.ty)
    };

    if same_path_compatible(field_ty, &value) {
        let mut data = container.data_mut();
        match &mut *data {
            ContainerData::Map { fields, .. } | ContainerData::Element { fields, .. } => {
                // Overwriting the slot drops the displaced value in place —
                // this crate's decrement-ref of any boxed payload it held.
                fields[idx] = value;
            }
            _ => unreachable!("kind already checked above"),
        }
        return Ok(());
    }

    rebuild_shape_and_write(container, pool, key, idx, value)
}

/// Whether `value` can be written into a field of static type `field_ty`
/// without a shape rebuild (SPEC_FULL §4.3, "Same-type fast path").
fn same_path_compatible(field_ty: FieldType, value: &Value) -> bool {
    match field_ty {
        FieldType::Any => true,
        FieldType::Float => value.is_numeric(),
        FieldType::Decimal => matches!(value, Value::Decimal(_)),
        FieldType::Int64 => matches!(value, Value::Int32(_) | Value::Int64(_)),
        FieldType::Int32 => matches!(value, Value::Int32(_)),
        FieldType::Bool => matches!(value, Value::Bool(_)),
        FieldType::Str => matches!(value, Value::Str(_)),
        FieldType::Container => matches!(value, Value::Container(_)),
        FieldType::Null => matches!(value, Value::Null),
    }
}

fn field_type_for(kind: ValueKind) -> FieldType {
    match kind {
        ValueKind::Bool => FieldType::Bool,
        ValueKind::Int32 => FieldType::Int32,
        ValueKind::Int64 => FieldType::Int64,
        ValueKind::Float => FieldType::Float,
        ValueKind::Decimal => FieldType::Decimal,
        ValueKind::Str => FieldType::Str,
        ValueKind::Container => FieldType::Container,
        ValueKind::Null => FieldType::Null,
    }
}

/// Shape-rebuild slow path (SPEC_FULL §4.3, steps 1-6).
fn rebuild_shape_and_write(
    container: &Rc<Container>,
    pool: &ScriptPool,
    key: &str,
    idx: usize,
    value: Value,
) -> RuntimeResult<()> {
    let is_heap = container.is_heap();
    let is_migrated = container.is_data_migrated();
    let (_, may_free_old) = rebuild_site(is_heap, is_migrated);

    let new_ty = field_type_for(value.kind());

    let (old_shape, old_fields, element_meta) = {
        let data = container.data();
        match &*data {
            ContainerData::Map { shape, fields } => (shape.clone(), fields.clone(), None),
            ContainerData::Element {
                shape,
                fields,
                children,
                tag_name,
                namespace,
            } => (
                shape.clone(),
                fields.clone(),
                Some((children.clone(), tag_name.clone(), namespace.clone())),
            ),
            _ => unreachable!("kind already checked in field_write"),
        }
    };

    // Step 1: intern the new shape (clone + replace field type + recompute offsets).
    let new_shape = intern_with_field_type(&old_shape, key, new_ty)?;

    // Steps 2-3: allocate a new buffer and copy each unchanged field across.
    pool.record_alloc(new_shape.total_size);
    let mut new_fields = old_fields;

    // Step 4: store the new value at its (possibly new) position — the
    // field's index into the shape's field vector is stable across a
    // single-field type change, only its byte offset/size move.
    new_fields[idx] = value;

    // Step 5: release the old buffer, per the two-allocator discipline.
    if may_free_old {
        pool.record_free(old_shape.total_size);
    }
    if !is_heap && !is_migrated {
        container.mark_migrated();
    }

    // Step 6: install the new shape and data. The rebuilt shape only ever
    // touches the map axis (`fields`); an element's ordered `children`
    // carry across untouched (SPEC_FULL §4.3: "the new shape carries
    // across the element-specific metadata").
    let new_data = match element_meta {
        Some((children, tag_name, namespace)) => ContainerData::Element {
            shape: new_shape,
            fields: new_fields,
            children,
            tag_name,
            namespace,
        },
        None => ContainerData::Map {
            shape: new_shape,
            fields: new_fields,
        },
    };
    container.replace_data(new_data);

    log::debug!("rebuilt shape for field `{}` on container", key);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::intern;

    fn map_container(fields: &[(&str, FieldType)], values: Vec<Value>) -> Rc<Container> {
        let field_types: Vec<(String, FieldType)> =
            fields.iter().map(|(n, t)| (n.to_string(), *t)).collect();
        let shape = intern(&field_types).unwrap();
        Container::from_script(ContainerData::Map {
            shape,
            fields: values,
        })
    }

    #[test]
    fn exact_type_match_writes_in_place_without_rebuild() {
        let c = map_container(&[("age", FieldType::Int64)], vec![Value::Int64(30)]);
        let pool = ScriptPool::new();
        field_write(&c, &pool, "age", Value::Int64(31)).unwrap();

        let data = c.data();
        match &*data {
            ContainerData::Map { fields, shape } => {
                assert_eq!(fields[0].as_i64(), Some(31));
                assert_eq!(shape.fields.len(), 1);
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn int_into_float_field_widens_without_rebuild() {
        let c = map_container(&[("score", FieldType::Float)], vec![Value::Float(1.5)]);
        let pool = ScriptPool::new();
        field_write(&c, &pool, "score", Value::Int32(9)).unwrap();

        let data = c.data();
        match &*data {
            ContainerData::Map { fields, .. } => assert_eq!(fields[0].as_f64(), Some(9.0)),
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn int_field_written_with_float_rebuilds_shape() {
        let c = map_container(&[("age", FieldType::Int32), ("name", FieldType::Str)], vec![
            Value::Int32(5),
            Value::Str(Rc::new("a".into())),
        ]);
        let pool = ScriptPool::new();
        field_write(&c, &pool, "age", Value::Float(5.5)).unwrap();

        let data = c.data();
        match &*data {
            ContainerData::Map { fields, shape } => {
                let (idx, entry) = shape.field("age").unwrap();
                assert_eq!(entry.ty, FieldType::Float);
                assert_eq!(fields[idx].as_f64(), Some(5.5));
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn unknown_field_is_rejected() {
        let c = map_container(&[("x", FieldType::Int32)], vec![Value::Int32(1)]);
        let pool = ScriptPool::new();
        let err = field_write(&c, &pool, "missing", Value::Int32(2)).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownField { .. }));
    }

    #[test]
    fn parser_owned_map_first_rebuild_does_not_free_old_buffer() {
        let field_types = vec![("age".to_string(), FieldType::Int32)];
        let shape = intern(&field_types).unwrap();
        let c = Container::from_parser(ContainerData::Map {
            shape,
            fields: vec![Value::Int32(1)],
        });
        let pool = ScriptPool::new();

        field_write(&c, &pool, "age", Value::Str(Rc::new("oops".into()))).unwrap();

        assert!(c.is_data_migrated());
        assert_eq!(pool.bytes_freed(), 0);
    }

    #[test]
    fn element_field_write_rebuilds_shape_and_preserves_children() {
        let shape = intern(&[("id".to_string(), FieldType::Int32)]).unwrap();
        let child = Value::Str(Rc::new("child-0".into()));
        let c = Container::from_script(ContainerData::Element {
            shape,
            fields: vec![Value::Int32(1)],
            children: vec![child.clone()],
            tag_name: "div".to_string(),
            namespace: None,
        });
        let pool = ScriptPool::new();

        // "id" written with a string rebuilds the shape (int -> string).
        field_write(&c, &pool, "id", Value::Str(Rc::new("a1".into()))).unwrap();

        let data = c.data();
        match &*data {
            ContainerData::Element {
                shape,
                fields,
                children,
                tag_name,
                ..
            } => {
                assert_eq!(shape.field("id").unwrap().1.ty, FieldType::Str);
                assert!(matches!(&fields[0], Value::Str(s) if **s == "a1"));
                assert_eq!(tag_name, "div");
                // Rebuilding the attribute shape must not disturb the
                // element's ordered children (SPEC_FULL §4.3).
                assert_eq!(children.len(), 1);
            }
            _ => panic!("expected element"),
        }
    }

    #[test]
    fn container_to_null_rebuilds_shape_to_null_type() {
        let inner = Container::from_script(ContainerData::GenericArray(vec![]));
        let c = map_container(&[("child", FieldType::Container)], vec![Value::Container(inner)]);
        let pool = ScriptPool::new();

        field_write(&c, &pool, "child", Value::Null).unwrap();

        let data = c.data();
        match &*data {
            ContainerData::Map { shape, .. } => {
                assert_eq!(shape.field("child").unwrap().1.ty, FieldType::Null);
            }
            _ => panic!("expected map"),
        }
    }
}
