// Assignment Analyzer (SPEC_FULL §4.1).
//
// Grounded on two teacher files: `borrow_checker::immutability::
// ImmutabilityChecker`'s walk structure (`check_program`/`check_item`/
// `check_statement`/`check_expression`, scope push on function entry, scope
// pop on exit) for the traversal shape and the exact rule "assignment
// target `Ident` not mutable -> error"; and `borrow_checker::closure_traits
// ::CaptureAnalyzer`'s use of a saved/restored local-variable set across
// nested scopes for how this analyzer threads its `NameTable` through
// nested blocks. Type reconciliation itself is authored fresh from
// SPEC_FULL §4.1 since the teacher's own widening logic targets LLVM
// locals, not a binding-record model.

use crate::diagnostics::{DiagnosticEngine, Span};
use crate::errors::{AnalysisError, AnalyzeResult};
use crate::name_table::{Binding, NameTable};
use std::collections::HashMap;
use vex_ast::{Block, Expression, Function, Item, Program, Statement, Type};

/// Walks a program's assignment statements, enforcing immutability and
/// deciding per-binding type-flow metadata.
///
/// Source-order, single pass. SPEC_FULL §4.1's "two pass / fixed point"
/// note describes how an emitter consuming this analyzer's output would
/// need to re-walk to retroactively re-emit earlier reads once a later
/// assignment widens a binding; this analyzer itself only needs one
/// forward pass because `type_widened` is monotone (false -> true) and the
/// final decorated `NameTable` already reflects the fixed point once the
/// pass completes — re-walking here would recompute the same answer.
pub struct AssignmentAnalyzer {
    table: NameTable,
    errors: Vec<AnalysisError>,
    /// Each function's top-level bindings as they stood the instant its
    /// scope was destroyed — the decorated state an emitter would consult
    /// for that function (SPEC_FULL §6, "Interface exposed to the
    /// emitter"). Keyed by function name; nested-block bindings are not
    /// retained once their own (inner) scope pops, matching §3's binding
    /// lifecycle.
    function_bindings: HashMap<String, HashMap<String, Binding>>,
}

impl AssignmentAnalyzer {
    pub fn new() -> Self {
        Self {
            table: NameTable::new(),
            errors: Vec::new(),
            function_bindings: HashMap::new(),
        }
    }

    /// Analyze every function in the program. Returns all static errors
    /// collected across the whole program; analysis never aborts early so
    /// multiple errors can be reported together (SPEC_FULL §4.1, §7).
    pub fn analyze_program(&mut self, program: &Program) -> &[AnalysisError] {
        for item in &program.items {
            if let Item::Function(func) = item {
                self.analyze_function(func);
            }
        }
        &self.errors
    }

    /// Emit every collected error onto a diagnostic engine.
    pub fn report(&self, engine: &mut DiagnosticEngine) {
        for err in &self.errors {
            err.emit(engine);
        }
    }

    pub fn errors(&self) -> &[AnalysisError] {
        &self.errors
    }

    /// Lookup a binding's current record while its scope is still live.
    /// Used internally during analysis; once a function's scope has
    /// popped, use [`Self::binding_in`] instead.
    pub fn resolve(&self, name: &str) -> Option<&Binding> {
        self.table.resolve(name)
    }

    /// Lookup a binding's final (post-analysis) record by function name.
    /// Used by the closure capture promoter to read `type_widened` for the
    /// emitter contract table (SPEC_FULL §4.4).
    pub fn binding_in(&self, func_name: &str, name: &str) -> Option<&Binding> {
        self.function_bindings.get(func_name)?.get(name)
    }

    fn analyze_function(&mut self, func: &Function) {
        self.table.push_scope();

        for param in &func.params {
            // Parameters are never mutable (SPEC_FULL §4.1: "let bindings
            // and function parameters both fail this check").
            self.table.declare(Binding::new(
                param.name.clone(),
                param.ty.clone(),
                false,
                true,
                self.table.current_scope().unwrap_or(0),
            ));
        }

        self.analyze_block(&func.body);
        let bindings = self.table.pop_scope();
        self.function_bindings.insert(func.name.clone(), bindings);
    }

    fn analyze_block(&mut self, block: &Block) {
        for stmt in &block.statements {
            self.analyze_statement(stmt);
        }
    }

    fn analyze_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Let {
                is_mutable,
                name,
                ty,
                value,
            } => {
                let declared = ty.clone().unwrap_or_else(|| self.infer_type(value));
                let scope = self.table.current_scope().unwrap_or(0);
                self.table.declare(Binding::new(
                    name.clone(),
                    declared,
                    *is_mutable,
                    ty.is_some(),
                    scope,
                ));
            }

            Statement::Assign { target, value } => {
                self.analyze_assignment(target, value);
            }

            Statement::CompoundAssign { target, value, .. } => {
                // A compound assignment both reads and writes the target;
                // it goes through the same legality/reconciliation path as
                // a plain assignment (SPEC_FULL §4.4 treats it identically
                // for mutation detection).
                self.analyze_assignment(target, value);
            }

            Statement::If {
                condition: _,
                then_block,
                else_block,
            } => {
                self.table.push_scope();
                self.analyze_block(then_block);
                self.table.pop_scope();
                if let Some(else_block) = else_block {
                    self.table.push_scope();
                    self.analyze_block(else_block);
                    self.table.pop_scope();
                }
            }

            Statement::While { condition: _, body } => {
                self.table.push_scope();
                self.analyze_block(body);
                self.table.pop_scope();
            }

            Statement::Return(_) | Statement::Expression(_) => {}
        }
    }

    /// analyze(assign, scope_chain) — SPEC_FULL §4.1.
    fn analyze_assignment(&mut self, target: &Expression, value: &Expression) {
        match target {
            Expression::Ident(name) => {
                let span = Span::unknown();

                let Some(binding) = self.table.resolve(name) else {
                    self.errors.push(AnalysisError::UnknownBinding {
                        name: name.clone(),
                        span,
                    });
                    return;
                };

                if !binding.is_mutable {
                    self.errors.push(AnalysisError::ImmutableAssignment {
                        name: name.clone(),
                        span,
                    });
                    return;
                }

                let val_ty = self.infer_type(value);
                if let Err(err) = self.reconcile(name, &val_ty, span) {
                    self.errors.push(err);
                }
            }

            Expression::Index { object, .. } | Expression::FieldAccess { object, .. } => {
                // Resolve the innermost receiver; the binding itself is
                // never mutated (no mutability/type-flow check applies to
                // it — the container identity the binding holds is
                // unchanged by a field/index write, only its runtime
                // contents are, which is `vex-runtime`'s concern).
                if let Some(recv) = Self::innermost_receiver(object) {
                    if self.table.resolve(recv).is_none() {
                        self.errors.push(AnalysisError::UnknownBinding {
                            name: recv.to_string(),
                            span: Span::unknown(),
                        });
                    }
                }
            }

            _ => {}
        }
    }

    fn innermost_receiver(expr: &Expression) -> Option<&str> {
        match expr {
            Expression::Ident(name) => Some(name),
            Expression::Index { object, .. } => Self::innermost_receiver(object),
            Expression::FieldAccess { object, .. } => Self::innermost_receiver(object),
            _ => None,
        }
    }

    fn reconcile(&mut self, name: &str, val_ty: &Type, span: Span) -> AnalyzeResult<()> {
        let binding = self
            .table
            .resolve(name)
            .expect("caller already confirmed this binding resolves");
        let bind_ty = binding.declared_type.clone();

        if *val_ty == bind_ty {
            return Ok(());
        }

        // A binding already typed null/any is already tagged-cell
        // storage: any value fits, annotated or not, and no further
        // widening is meaningful (SPEC_FULL §4.1).
        if bind_ty.is_null_or_any() {
            return Ok(());
        }

        if binding.has_type_annotation {
            if val_ty.is_null_or_any() {
                return Ok(());
            }
            if val_ty.is_numeric() && bind_ty.is_numeric() {
                return Ok(());
            }
            return Err(AnalysisError::AnnotatedTypeMismatch {
                name: name.to_string(),
                expected: format!("{:?}", bind_ty),
                found: format!("{:?}", val_ty),
                span,
            });
        }

        if !binding.type_widened {
            let binding = self
                .table
                .resolve_mut(name)
                .expect("caller already confirmed this binding resolves");
            binding.widen();
        }

        Ok(())
    }

    /// Infer a static type for an expression. Used both for unannotated
    /// `let` declarations (the binding's initial `declared_type`) and for
    /// the RHS of an assignment. Index/field/call results are unknowable
    /// without the out-of-scope type checker that tracks struct/container
    /// shapes, so they infer as `Any` — the dynamic-any type is always a
    /// legal RHS (SPEC_FULL §4.1: accepted unconditionally for annotated
    /// bindings, and widens an unannotated one like any other mismatch).
    fn infer_type(&self, expr: &Expression) -> Type {
        match expr {
            Expression::IntLiteral(_) => Type::I64,
            Expression::FloatLiteral(_) => Type::F64,
            Expression::StringLiteral(_) => Type::Str,
            Expression::BoolLiteral(_) => Type::Bool,
            Expression::Nil => Type::Null,
            Expression::Ident(name) => self
                .table
                .resolve(name)
                .map(|b| b.declared_type.clone())
                .unwrap_or(Type::Any),
            Expression::Binary { left, right, .. } => {
                let lt = self.infer_type(left);
                let rt = self.infer_type(right);
                if lt == rt {
                    lt
                } else if lt.is_numeric() && rt.is_numeric() {
                    Type::F64
                } else {
                    Type::Any
                }
            }
            Expression::Unary { expr, .. } => self.infer_type(expr),
            Expression::Array(elems) => {
                let elem_ty = elems
                    .first()
                    .map(|e| self.infer_type(e))
                    .unwrap_or(Type::Any);
                Type::Array(Box::new(elem_ty))
            }
            Expression::MapLiteral(_) => Type::Map(Box::new(Type::Any)),
            Expression::Call { .. } | Expression::Index { .. } | Expression::FieldAccess { .. } => {
                Type::Any
            }
            Expression::Closure { .. } => Type::Any,
        }
    }
}

impl Default for AssignmentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn func_with(body: Vec<Statement>) -> Function {
        Function {
            name: "f".into(),
            params: vec![],
            return_type: None,
            body: Block { statements: body },
        }
    }

    fn program(body: Vec<Statement>) -> Program {
        Program {
            items: vec![Item::Function(func_with(body))],
        }
    }

    #[test]
    fn immutable_assignment_is_rejected() {
        // let x = 5; x = 10;
        let prog = program(vec![
            Statement::Let {
                is_mutable: false,
                name: "x".into(),
                ty: None,
                value: Expression::IntLiteral(5),
            },
            Statement::Assign {
                target: Expression::Ident("x".into()),
                value: Expression::IntLiteral(10),
            },
        ]);
        let mut analyzer = AssignmentAnalyzer::new();
        let errors = analyzer.analyze_program(&prog);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], AnalysisError::ImmutableAssignment { .. }));
    }

    #[test]
    fn mutable_assignment_with_heterogeneous_types_widens() {
        // var y = 42; y = "hi";
        let prog = program(vec![
            Statement::Let {
                is_mutable: true,
                name: "y".into(),
                ty: None,
                value: Expression::IntLiteral(42),
            },
            Statement::Assign {
                target: Expression::Ident("y".into()),
                value: Expression::StringLiteral("hi".into()),
            },
        ]);
        let mut analyzer = AssignmentAnalyzer::new();
        let errors = analyzer.analyze_program(&prog);
        assert!(errors.is_empty());
        assert!(analyzer.binding_in("f", "y").unwrap().type_widened);
    }

    #[test]
    fn annotated_numeric_coercion_is_accepted() {
        // var z: int = 42; z = 3.7;  (I64 and F64 are both numeric)
        let prog = program(vec![
            Statement::Let {
                is_mutable: true,
                name: "z".into(),
                ty: Some(Type::I64),
                value: Expression::IntLiteral(42),
            },
            Statement::Assign {
                target: Expression::Ident("z".into()),
                value: Expression::FloatLiteral(3.7),
            },
        ]);
        let mut analyzer = AssignmentAnalyzer::new();
        let errors = analyzer.analyze_program(&prog);
        assert!(errors.is_empty());
    }

    #[test]
    fn annotated_non_numeric_mismatch_is_rejected() {
        let prog = program(vec![
            Statement::Let {
                is_mutable: true,
                name: "z".into(),
                ty: Some(Type::I64),
                value: Expression::IntLiteral(42),
            },
            Statement::Assign {
                target: Expression::Ident("z".into()),
                value: Expression::StringLiteral("nope".into()),
            },
        ]);
        let mut analyzer = AssignmentAnalyzer::new();
        let errors = analyzer.analyze_program(&prog);
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            errors[0],
            AnalysisError::AnnotatedTypeMismatch { .. }
        ));
    }

    #[test]
    fn unknown_binding_is_reported() {
        let prog = program(vec![Statement::Assign {
            target: Expression::Ident("ghost".into()),
            value: Expression::IntLiteral(1),
        }]);
        let mut analyzer = AssignmentAnalyzer::new();
        let errors = analyzer.analyze_program(&prog);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], AnalysisError::UnknownBinding { .. }));
    }

    #[test]
    fn field_and_index_writes_do_not_require_mutable_binding() {
        // let m = {..}; m.age = "x";  -- legal: binding mutability gates
        // only simple-name assignment (SPEC_FULL §4.1).
        let prog = program(vec![
            Statement::Let {
                is_mutable: false,
                name: "m".into(),
                ty: None,
                value: Expression::MapLiteral(vec![]),
            },
            Statement::Assign {
                target: Expression::FieldAccess {
                    object: Box::new(Expression::Ident("m".into())),
                    field: "age".into(),
                },
                value: Expression::StringLiteral("thirty".into()),
            },
        ]);
        let mut analyzer = AssignmentAnalyzer::new();
        let errors = analyzer.analyze_program(&prog);
        assert!(errors.is_empty());
    }

    #[test]
    fn no_widening_once_bound_type_is_any() {
        let prog = program(vec![
            Statement::Let {
                is_mutable: true,
                name: "a".into(),
                ty: Some(Type::Any),
                value: Expression::IntLiteral(1),
            },
            Statement::Assign {
                target: Expression::Ident("a".into()),
                value: Expression::StringLiteral("x".into()),
            },
        ]);
        let mut analyzer = AssignmentAnalyzer::new();
        let errors = analyzer.analyze_program(&prog);
        assert!(errors.is_empty());
        assert!(!analyzer.binding_in("f", "a").unwrap().type_widened);
    }
}
