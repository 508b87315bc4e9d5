//! Container mutation runtime: index-write and field-write entry points
//! over a small tagged-value/shape/container model, under the two-
//! allocator discipline a previously-invoked input parser's bump-allocated
//! containers require (SPEC_FULL §4.2-§4.4).

pub mod allocator;
pub mod container;
pub mod env;
pub mod errors;
pub mod field_write;
pub mod index_write;
pub mod shape;
pub mod utils;
pub mod value;

pub use allocator::{rebuild_site, PoolOrigin, ScriptPool};
pub use container::{Container, ContainerData, ContainerKind};
pub use env::{build_env, env_load, env_store, EnvRecord};
pub use errors::{RuntimeError, RuntimeResult};
pub use field_write::field_write;
pub use index_write::{index_write, specialized_read_with_fallback};
pub use shape::{intern, intern_with_field_type, FieldEntry, FieldType, Shape, ShapePool};
pub use value::{Decimal, Value, ValueKind};
