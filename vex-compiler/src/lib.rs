pub mod assignment_analyzer; // Assignment legality + type-widening analysis
pub mod closure_capture; // Free-name collection + mutable-capture promotion
pub mod emitter_contract; // Binding/capture -> storage-slot decision tables
pub mod errors;
pub mod name_table; // Per-scope binding table

// Re-export diagnostics from vex-diagnostics crate
pub use vex_diagnostics as diagnostics;

pub use assignment_analyzer::AssignmentAnalyzer;
pub use closure_capture::{CaptureRecord, CaptureTable, ClosureCapturePromoter};
pub use diagnostics::{error_codes, Diagnostic, DiagnosticEngine, ErrorLevel, Span};
pub use emitter_contract::{capture_emission, slot_kind, CaptureEmission, SlotKind};
pub use errors::{AnalysisError, AnalyzeResult};
pub use name_table::{Binding, NameTable, ScopeId};
