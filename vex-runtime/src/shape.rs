// Shape descriptor + process-wide interning pool (SPEC_FULL §3 "Shape
// descriptor", §9 "Shape interning"). Uses `dashmap`, the teacher's own
// workspace dependency for type interning, reused here even though this
// subsystem runs single-threaded — kept because it's the teacher's idiom
// for this exact role and because a future multi-context host embedding
// this runtime could share one pool across threads.

use crate::errors::RuntimeError;
use crate::utils::safe_arithmetic::{safe_total_size, CheckedArithmetic};
use crate::value::ValueKind;
use dashmap::DashMap;
use std::rc::Rc;

/// A field's static type within a shape. Distinct from `ValueKind` because
/// a shape field can be typed `Any` (accepts any `Value` without forcing a
/// rebuild) even though no single `Value` variant is itself "any".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    Int32,
    Int64,
    Float,
    /// Fixed-point decimal, the fourth numeric family member (SPEC_FULL §3
    /// "Value cell", §4.1 annotated-coercion numeric family).
    Decimal,
    Str,
    Container,
    Null,
    Any,
}

impl FieldType {
    pub fn byte_size(self) -> usize {
        match self {
            FieldType::Bool => 1,
            FieldType::Int32 => 4,
            FieldType::Int64 => 8,
            FieldType::Float => 8,
            FieldType::Decimal => 16, // mantissa: i64 + scale: u32, padded
            FieldType::Str | FieldType::Container => 8, // pointer-sized cell
            FieldType::Null | FieldType::Any => 8,       // tagged cell
        }
    }

    pub fn accepts(self, kind: ValueKind) -> bool {
        match self {
            FieldType::Bool => matches!(kind, ValueKind::Bool),
            FieldType::Int32 => matches!(kind, ValueKind::Int32),
            FieldType::Int64 => matches!(kind, ValueKind::Int64),
            FieldType::Float => matches!(kind, ValueKind::Float),
            FieldType::Decimal => matches!(kind, ValueKind::Decimal),
            FieldType::Str => matches!(kind, ValueKind::Str),
            FieldType::Container => matches!(kind, ValueKind::Container),
            FieldType::Null => matches!(kind, ValueKind::Null),
            FieldType::Any => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldEntry {
    pub name: String,
    pub ty: FieldType,
    pub offset: usize,
    pub size: usize,
}

/// An interned, immutable chain of field entries (SPEC_FULL §3). A
/// field-type change always produces a *new* shape; this type is never
/// mutated once built.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    pub fields: Vec<FieldEntry>,
    pub total_size: usize,
}

impl Shape {
    pub fn field(&self, name: &str) -> Option<(usize, &FieldEntry)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Lays out `field_types` back-to-back, computing each field's offset
    /// with checked arithmetic — a shape whose total size would overflow
    /// `usize` surfaces as `RuntimeError::AllocationFailure` rather than
    /// panicking or wrapping (SPEC_FULL §4.3, §6).
    fn build(field_types: &[(String, FieldType)]) -> Result<Self, RuntimeError> {
        let mut offset = 0usize;
        let mut fields = Vec::with_capacity(field_types.len());
        for (name, ty) in field_types {
            let size = ty.byte_size();
            fields.push(FieldEntry {
                name: name.clone(),
                ty: *ty,
                offset,
                size,
            });
            offset = offset.safe_add(size)?;
        }
        let total_size = safe_total_size(fields.iter().map(|f| f.size))?;
        Ok(Shape { fields, total_size })
    }

    /// Build a new shape identical to `self` except with `field_name`'s
    /// type replaced, recomputing offsets and total size (SPEC_FULL §4.3
    /// "Shape-rebuild slow path", step 1).
    pub fn with_field_type(&self, field_name: &str, new_ty: FieldType) -> Result<Self, RuntimeError> {
        let field_types: Vec<(String, FieldType)> = self
            .fields
            .iter()
            .map(|f| {
                if f.name == field_name {
                    (f.name.clone(), new_ty)
                } else {
                    (f.name.clone(), f.ty)
                }
            })
            .collect();
        Self::build(&field_types)
    }
}

/// Process-wide shape interning pool, keyed by the ordered (name, type)
/// field sequence. Two maps with the same sequence share the same `Rc<Shape>`.
pub struct ShapePool {
    shapes: DashMap<Vec<(String, FieldType)>, Rc<Shape>>,
}

impl ShapePool {
    pub fn new() -> Self {
        Self {
            shapes: DashMap::new(),
        }
    }

    pub fn intern(&self, field_types: &[(String, FieldType)]) -> Result<Rc<Shape>, RuntimeError> {
        if let Some(existing) = self.shapes.get(field_types) {
            return Ok(existing.clone());
        }
        let shape = Rc::new(Shape::build(field_types)?);
        self.shapes.insert(field_types.to_vec(), shape.clone());
        Ok(shape)
    }

    /// Intern the shape that would result from replacing one field's type
    /// in `shape` (SPEC_FULL §4.3, "Intern via the shape pool").
    pub fn intern_with_field_type(
        &self,
        shape: &Shape,
        field_name: &str,
        new_ty: FieldType,
    ) -> Result<Rc<Shape>, RuntimeError> {
        let field_types: Vec<(String, FieldType)> = shape
            .fields
            .iter()
            .map(|f| {
                if f.name == field_name {
                    (f.name.clone(), new_ty)
                } else {
                    (f.name.clone(), f.ty)
                }
            })
            .collect();
        self.intern(&field_types)
    }
}

impl Default for ShapePool {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    // The process-wide pool instance (SPEC_FULL §9: "deduplicated in a
    // process-wide `ShapePool`"). Kept thread-local rather than behind a
    // `'static` `OnceLock`: the `Rc<Shape>`s it hands out are not `Send`,
    // so a shared static would need `unsafe` to claim `Sync` it doesn't
    // have. This subsystem runs single-threaded anyway (SPEC_FULL §5), so
    // the thread-local is exactly the process-wide pool in practice.
    static POOL: ShapePool = ShapePool::new();
}

/// Intern a shape by its field sequence (see [`ShapePool::intern`]).
pub fn intern(field_types: &[(String, FieldType)]) -> Result<Rc<Shape>, RuntimeError> {
    POOL.with(|pool| pool.intern(field_types))
}

/// Intern the shape resulting from one field-type change (see
/// [`ShapePool::intern_with_field_type`]).
pub fn intern_with_field_type(
    shape: &Shape,
    field_name: &str,
    new_ty: FieldType,
) -> Result<Rc<Shape>, RuntimeError> {
    POOL.with(|pool| pool.intern_with_field_type(shape, field_name, new_ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_field_sequences_share_one_shape() {
        let pool = ShapePool::new();
        let a = pool.intern(&[("x".into(), FieldType::Int64), ("y".into(), FieldType::Str)]).unwrap();
        let b = pool.intern(&[("x".into(), FieldType::Int64), ("y".into(), FieldType::Str)]).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn rebuild_recomputes_offsets() {
        let pool = ShapePool::new();
        let shape = pool.intern(&[("age".into(), FieldType::Int32), ("name".into(), FieldType::Str)]).unwrap();
        let rebuilt = pool.intern_with_field_type(&shape, "age", FieldType::Float).unwrap();

        let (idx, age) = rebuilt.field("age").unwrap();
        assert_eq!(idx, 0);
        assert_eq!(age.ty, FieldType::Float);
        assert_eq!(age.size, 8);

        let (_, name) = rebuilt.field("name").unwrap();
        assert_eq!(name.offset, 8); // float is now 8 bytes, not int32's 4
    }

    #[test]
    fn unknown_field_is_none() {
        let pool = ShapePool::new();
        let shape = pool.intern(&[("x".into(), FieldType::Int32)]).unwrap();
        assert!(shape.field("missing").is_none());
    }

    #[test]
    fn build_propagates_offset_overflow_as_allocation_failure() {
        // `Shape::build` delegates its running-offset arithmetic to
        // `usize::safe_add` (see `utils::safe_arithmetic`); a field whose
        // offset would overflow surfaces as `RuntimeError::AllocationFailure`
        // instead of wrapping or panicking. Exercised here at the
        // `CheckedArithmetic` level directly: real field-type byte sizes
        // are too small (<=16) to overflow `usize` without an infeasible
        // field count, but the guard `build` calls is the same one under
        // test in `utils::safe_arithmetic::tests`.
        let err = usize::MAX.safe_add(FieldType::Decimal.byte_size()).unwrap_err();
        assert!(matches!(err, RuntimeError::AllocationFailure { .. }));
    }
}
