// Env record for mutable closure captures (SPEC_FULL §3 "Env record", §4.4
// "Env lifetime").
//
// A heap-allocated tuple of tagged-cell slots, one per mutable-captured
// variable, shared by every invocation of one closure instance
// (`Rc<EnvRecord>`). Writes inside the closure store through the env
// record; they never propagate back to the outer binding (SPEC_FULL §4.4
// "Semantics": "by-writable-copy").

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub struct EnvRecord {
    names: Vec<String>,
    slots: Vec<RefCell<Value>>,
}

impl EnvRecord {
    pub fn slot_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// `build_env(captures, outer_env) -> Rc<EnvRecord>` — SPEC_FULL §6.
/// Allocates one slot per captured name, initialized from that name's
/// current value in the enclosing scope at the point the closure value is
/// constructed.
pub fn build_env(capture_names: &[String], outer_values: &HashMap<String, Value>) -> Rc<EnvRecord> {
    let names = capture_names.to_vec();
    let slots = capture_names
        .iter()
        .map(|name| RefCell::new(outer_values.get(name).cloned().unwrap_or(Value::Null)))
        .collect();
    Rc::new(EnvRecord { names, slots })
}

/// `env_load(env_ref, slot_index) -> Value` — SPEC_FULL §6.
pub fn env_load(env: &Rc<EnvRecord>, slot_index: usize) -> Value {
    env.slots[slot_index].borrow().clone()
}

/// `env_store(env_ref, slot_index, value)` — SPEC_FULL §6.
pub fn env_store(env: &Rc<EnvRecord>, slot_index: usize, value: Value) {
    *env.slots[slot_index].borrow_mut() = value;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_env_snapshots_outer_values_at_construction() {
        let mut outer = HashMap::new();
        outer.insert("c".to_string(), Value::Int64(5));
        let env = build_env(&["c".to_string()], &outer);

        let idx = env.slot_index("c").unwrap();
        assert_eq!(env_load(&env, idx).as_i64(), Some(5));
    }

    #[test]
    fn writes_through_env_do_not_touch_a_second_closure_instance() {
        let mut outer = HashMap::new();
        outer.insert("c".to_string(), Value::Int64(0));

        let env_a = build_env(&["c".to_string()], &outer);
        let env_b = build_env(&["c".to_string()], &outer);

        let idx = env_a.slot_index("c").unwrap();
        env_store(&env_a, idx, Value::Int64(99));

        assert_eq!(env_load(&env_a, idx).as_i64(), Some(99));
        assert_eq!(env_load(&env_b, idx).as_i64(), Some(0));
    }

    #[test]
    fn missing_outer_value_defaults_to_null() {
        let outer = HashMap::new();
        let env = build_env(&["ghost".to_string()], &outer);
        let idx = env.slot_index("ghost").unwrap();
        assert!(matches!(env_load(&env, idx), Value::Null));
    }
}
