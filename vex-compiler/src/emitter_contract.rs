// Emitter contract (SPEC_FULL §4.1 / §4.4 emission tables).
//
// A pure decision layer between analysis and whatever downstream consumer
// lowers a binding or capture to storage (`vex-runtime`'s env records and
// containers). No codegen lives here — this module only classifies what
// kind of slot a binding or capture needs, grounded on the teacher's
// `BorrowChecker`/`CaptureAnalyzer` pattern of separating "what did we
// learn about this name" from "what do we do about it at the call site".

use crate::name_table::Binding;
use crate::closure_capture::CaptureRecord;

/// How a binding's storage slot must be represented, decided from its
/// final `type_widened` flag (SPEC_FULL §4.1, "Emission").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    /// Binding never observed a type-incompatible write; storage can stay
    /// a single unboxed representation of `declared_type`.
    Fixed,
    /// Binding was widened at least once; storage must be a tagged
    /// union slot capable of holding any of its observed types.
    TaggedAny,
}

pub fn slot_kind(binding: &Binding) -> SlotKind {
    if binding.type_widened {
        SlotKind::TaggedAny
    } else {
        SlotKind::Fixed
    }
}

/// How a closure must obtain one captured name (SPEC_FULL §4.4,
/// "Emission"):
///
/// | capture mutable | outer binding widened | emission           |
/// |------------------|------------------------|--------------------|
/// | no                | no                     | `ByValueCopy`      |
/// | no                | yes                    | `ByValueCopy`      |
/// | yes               | any                    | `ByEnvRecordCell`  |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEmission {
    /// Inner function reads a snapshot of the value; no aliasing with the
    /// enclosing scope is required.
    ByValueCopy,
    /// Inner function and enclosing scope must observe the same storage
    /// cell (env-record promotion); required whenever the inner function
    /// mutates the captured name.
    ByEnvRecordCell,
}

pub fn capture_emission(capture: &CaptureRecord) -> CaptureEmission {
    if capture.is_mutable {
        CaptureEmission::ByEnvRecordCell
    } else {
        CaptureEmission::ByValueCopy
    }
}

/// Convenience wrapper over a binding plus its captures for functions
/// that need both (e.g. building an env record needs each captured
/// binding's slot kind too, since a `TaggedAny` capture needs cell
/// storage that already holds a tagged value).
pub fn capture_slot_kind(capture: &CaptureRecord, outer_binding: Option<&Binding>) -> SlotKind {
    match outer_binding {
        Some(binding) => slot_kind(binding),
        None => SlotKind::Fixed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vex_ast::Type;

    fn binding(type_widened: bool) -> Binding {
        let mut b = Binding::new("x".into(), Type::I64, true, false, 0);
        if type_widened {
            b.widen();
        }
        b
    }

    #[test]
    fn fixed_binding_gets_fixed_slot() {
        assert_eq!(slot_kind(&binding(false)), SlotKind::Fixed);
    }

    #[test]
    fn widened_binding_gets_tagged_slot() {
        assert_eq!(slot_kind(&binding(true)), SlotKind::TaggedAny);
    }

    #[test]
    fn mutable_capture_always_needs_env_cell() {
        let capture = CaptureRecord {
            name: "c".into(),
            is_mutable: true,
        };
        assert_eq!(capture_emission(&capture), CaptureEmission::ByEnvRecordCell);
    }

    #[test]
    fn read_only_capture_is_copied_by_value() {
        let capture = CaptureRecord {
            name: "c".into(),
            is_mutable: false,
        };
        assert_eq!(capture_emission(&capture), CaptureEmission::ByValueCopy);
    }
}
