// Closure Capture Promoter (SPEC_FULL §4.4).
//
// Grounded on `borrow_checker::closure_analysis`'s recursive AST walk (an
// `analyze_*_closures` family that locates `Expression::Closure` nodes
// wherever they occur) and `borrow_checker::closure_traits
// ::CaptureAnalyzer`'s free-name collection (`captured_vars:
// HashMap<String, CaptureInfo>`, `param_names`/`local_vars` sets) and its
// `Statement::Assign`/`CompoundAssign` handling that flips `is_mutated`
// only when the assignment target is a free, non-local, non-parameter
// name — exactly SPEC_FULL §4.4's mutation-detection rule. Extended to
// emit a full `CaptureRecord` per free name (not one aggregate capture
// mode per closure), since the emitter contract table (§4.4) is keyed per
// captured binding.

use std::collections::{HashMap, HashSet};
use vex_ast::{Block, Expression, Item, Param, Program, Statement};

/// A free-identifier reference inside one inner function, classified as
/// read-only or mutable (SPEC_FULL §3, "Capture record").
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    pub name: String,
    pub is_mutable: bool,
}

/// Captures for every closure in a program, keyed by the closure's `id`
/// (assigned at AST-build time; see `vex_ast::Expression::Closure`).
pub type CaptureTable = HashMap<u32, Vec<CaptureRecord>>;

pub struct ClosureCapturePromoter {
    captures: CaptureTable,
}

impl ClosureCapturePromoter {
    pub fn new() -> Self {
        Self {
            captures: CaptureTable::new(),
        }
    }

    /// Find every closure in the program (at any nesting depth) and record
    /// its captures. Each closure is analyzed independently: "free name"
    /// means not bound within that closure's own parameters or
    /// `let`-declared locals (SPEC_FULL §4.4, "Free-name collection").
    pub fn promote(&mut self, program: &Program) -> &CaptureTable {
        for item in &program.items {
            if let Item::Function(func) = item {
                let mut bound: HashSet<String> = func.params.iter().map(|p| p.name.clone()).collect();
                self.scan_block(&func.body, &mut bound);
            }
        }
        &self.captures
    }

    pub fn captures_for(&self, closure_id: u32) -> Option<&[CaptureRecord]> {
        self.captures.get(&closure_id).map(|v| v.as_slice())
    }

    /// Walk statements/expressions purely to find `Expression::Closure`
    /// nodes wherever they're nested; `bound` tracks names declared so far
    /// in the current lexical scope, threaded through so a closure found
    /// inside an `if`/`while` body still sees outer lets.
    fn scan_block(&mut self, block: &Block, bound: &mut HashSet<String>) {
        for stmt in &block.statements {
            self.scan_statement(stmt, bound);
        }
    }

    fn scan_statement(&mut self, stmt: &Statement, bound: &mut HashSet<String>) {
        match stmt {
            Statement::Let { name, value, .. } => {
                self.scan_expression(value, bound);
                bound.insert(name.clone());
            }
            Statement::Assign { target, value } | Statement::CompoundAssign { target, value, .. } => {
                self.scan_expression(value, bound);
                self.scan_expression(target, bound);
            }
            Statement::Return(Some(expr)) | Statement::Expression(expr) => {
                self.scan_expression(expr, bound);
            }
            Statement::Return(None) => {}
            Statement::If {
                condition,
                then_block,
                else_block,
            } => {
                self.scan_expression(condition, bound);
                self.scan_block(then_block, &mut bound.clone());
                if let Some(else_block) = else_block {
                    self.scan_block(else_block, &mut bound.clone());
                }
            }
            Statement::While { condition, body } => {
                self.scan_expression(condition, bound);
                self.scan_block(body, &mut bound.clone());
            }
        }
    }

    fn scan_expression(&mut self, expr: &Expression, bound: &HashSet<String>) {
        match expr {
            Expression::Binary { left, right, .. } => {
                self.scan_expression(left, bound);
                self.scan_expression(right, bound);
            }
            Expression::Unary { expr, .. } => self.scan_expression(expr, bound),
            Expression::Call { func, args } => {
                self.scan_expression(func, bound);
                for arg in args {
                    self.scan_expression(arg, bound);
                }
            }
            Expression::FieldAccess { object, .. } => self.scan_expression(object, bound),
            Expression::Index { object, index } => {
                self.scan_expression(object, bound);
                self.scan_expression(index, bound);
            }
            Expression::Array(elems) => {
                for e in elems {
                    self.scan_expression(e, bound);
                }
            }
            Expression::MapLiteral(fields) => {
                for (_, v) in fields {
                    self.scan_expression(v, bound);
                }
            }
            Expression::Closure { id, params, body, .. } => {
                let records = self.analyze_closure(params, body);
                self.captures.insert(*id, records);
            }
            Expression::Ident(_)
            | Expression::IntLiteral(_)
            | Expression::FloatLiteral(_)
            | Expression::StringLiteral(_)
            | Expression::BoolLiteral(_)
            | Expression::Nil => {}
        }
    }

    /// Free-name collection + mutation detection for one closure body
    /// (SPEC_FULL §4.4, "Analysis"). `local` accumulates the closure's own
    /// parameters and `let`-declared locals in source order; any name
    /// referenced that is not in `local` is a capture of the enclosing
    /// scope. Recurses into any closure nested inside this one, since a
    /// doubly-nested closure gets its own independent entry in the
    /// capture table.
    fn analyze_closure(&mut self, params: &[Param], body: &Block) -> Vec<CaptureRecord> {
        let mut local: HashSet<String> = params.iter().map(|p| p.name.clone()).collect();
        let mut captured: HashMap<String, bool> = HashMap::new();
        self.collect_block(body, &mut local, &mut captured);

        captured
            .into_iter()
            .map(|(name, is_mutable)| CaptureRecord { name, is_mutable })
            .collect()
    }

    fn collect_block(&mut self, block: &Block, local: &mut HashSet<String>, captured: &mut HashMap<String, bool>) {
        for stmt in &block.statements {
            self.collect_statement(stmt, local, captured);
        }
    }

    fn collect_statement(
        &mut self,
        stmt: &Statement,
        local: &mut HashSet<String>,
        captured: &mut HashMap<String, bool>,
    ) {
        match stmt {
            Statement::Let { name, value, .. } => {
                self.collect_expression(value, local, captured);
                local.insert(name.clone());
            }
            Statement::Assign { target, value } | Statement::CompoundAssign { target, value, .. } => {
                self.collect_expression(value, local, captured);
                self.mark_if_free_write(target, local, captured);
            }
            Statement::Return(Some(expr)) | Statement::Expression(expr) => {
                self.collect_expression(expr, local, captured);
            }
            Statement::Return(None) => {}
            Statement::If {
                condition,
                then_block,
                else_block,
            } => {
                self.collect_expression(condition, local, captured);
                self.collect_block(then_block, &mut local.clone(), captured);
                if let Some(else_block) = else_block {
                    self.collect_block(else_block, &mut local.clone(), captured);
                }
            }
            Statement::While { condition, body } => {
                self.collect_expression(condition, local, captured);
                self.collect_block(body, &mut local.clone(), captured);
            }
        }
    }

    /// A write to a bare free identifier marks its capture mutable
    /// (SPEC_FULL §4.4: "every assignment statement... whose target is a
    /// free name"). A write to an indexed/field target mutates the
    /// *container* the receiver holds, never the receiver binding's own
    /// identity, so it does not by itself make the receiver's capture
    /// mutable — reads of the receiver are still recorded normally via
    /// `collect_expression`.
    fn mark_if_free_write(&mut self, target: &Expression, local: &HashSet<String>, captured: &mut HashMap<String, bool>) {
        if let Expression::Ident(name) = target {
            if !local.contains(name) {
                captured.insert(name.clone(), true);
            }
        } else {
            self.collect_expression(target, local, captured);
        }
    }

    fn collect_expression(&mut self, expr: &Expression, local: &HashSet<String>, captured: &mut HashMap<String, bool>) {
        match expr {
            Expression::Ident(name) => {
                if !local.contains(name) {
                    captured.entry(name.clone()).or_insert(false);
                }
            }
            Expression::Binary { left, right, .. } => {
                self.collect_expression(left, local, captured);
                self.collect_expression(right, local, captured);
            }
            Expression::Unary { expr, .. } => self.collect_expression(expr, local, captured),
            Expression::Call { func, args } => {
                self.collect_expression(func, local, captured);
                for arg in args {
                    self.collect_expression(arg, local, captured);
                }
            }
            Expression::FieldAccess { object, .. } => self.collect_expression(object, local, captured),
            Expression::Index { object, index } => {
                self.collect_expression(object, local, captured);
                self.collect_expression(index, local, captured);
            }
            Expression::Array(elems) => {
                for e in elems {
                    self.collect_expression(e, local, captured);
                }
            }
            Expression::MapLiteral(fields) => {
                for (_, v) in fields {
                    self.collect_expression(v, local, captured);
                }
            }
            Expression::Closure { id, params, body, .. } => {
                // A nested closure is recorded independently in the
                // capture table, but any name it treats as free that is
                // also free here propagates as a capture of this closure
                // too, so an env record built for this closure carries it
                // down to the nested one.
                let nested = self.analyze_closure(params, body);
                for record in &nested {
                    if !local.contains(&record.name) {
                        let entry = captured.entry(record.name.clone()).or_insert(false);
                        *entry = *entry || record.is_mutable;
                    }
                }
                self.captures.insert(*id, nested);
            }
            Expression::IntLiteral(_)
            | Expression::FloatLiteral(_)
            | Expression::StringLiteral(_)
            | Expression::BoolLiteral(_)
            | Expression::Nil => {}
        }
    }
}

impl Default for ClosureCapturePromoter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vex_ast::{BinaryOp, Function, Type};

    fn program_with(main_body: Vec<Statement>) -> Program {
        Program {
            items: vec![Item::Function(Function {
                name: "main".into(),
                params: vec![],
                return_type: None,
                body: Block { statements: main_body },
            })],
        }
    }

    #[test]
    fn closure_that_mutates_free_name_is_captured_mutable() {
        let closure_id = 1;
        let closure = Expression::Closure {
            id: closure_id,
            params: vec![],
            return_type: None,
            body: Box::new(Block {
                statements: vec![
                    Statement::Assign {
                        target: Expression::Ident("c".into()),
                        value: Expression::Binary {
                            left: Box::new(Expression::Ident("c".into())),
                            op: BinaryOp::Add,
                            right: Box::new(Expression::IntLiteral(1)),
                        },
                    },
                    Statement::Return(Some(Expression::Ident("c".into()))),
                ],
            }),
        };

        let program = program_with(vec![
            Statement::Let {
                is_mutable: true,
                name: "c".into(),
                ty: Some(Type::I64),
                value: Expression::IntLiteral(0),
            },
            Statement::Let {
                is_mutable: false,
                name: "next".into(),
                ty: None,
                value: closure,
            },
        ]);

        let mut promoter = ClosureCapturePromoter::new();
        promoter.promote(&program);

        let captures = promoter.captures_for(closure_id).unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].name, "c");
        assert!(captures[0].is_mutable);
    }

    #[test]
    fn closure_that_only_reads_free_name_is_captured_read_only() {
        let closure_id = 2;
        let closure = Expression::Closure {
            id: closure_id,
            params: vec![],
            return_type: None,
            body: Box::new(Block {
                statements: vec![Statement::Return(Some(Expression::Binary {
                    left: Box::new(Expression::Ident("x".into())),
                    op: BinaryOp::Add,
                    right: Box::new(Expression::IntLiteral(1)),
                }))],
            }),
        };
        let program = program_with(vec![
            Statement::Let {
                is_mutable: false,
                name: "x".into(),
                ty: Some(Type::I64),
                value: Expression::IntLiteral(5),
            },
            Statement::Let {
                is_mutable: false,
                name: "f".into(),
                ty: None,
                value: closure,
            },
        ]);

        let mut promoter = ClosureCapturePromoter::new();
        promoter.promote(&program);
        let captures = promoter.captures_for(closure_id).unwrap();
        assert_eq!(
            captures,
            &[CaptureRecord {
                name: "x".into(),
                is_mutable: false,
            }]
        );
    }

    #[test]
    fn closure_params_and_locals_are_not_captures() {
        let closure_id = 3;
        let closure = Expression::Closure {
            id: closure_id,
            params: vec![Param {
                name: "y".into(),
                ty: Type::I64,
            }],
            return_type: None,
            body: Box::new(Block {
                statements: vec![Statement::Let {
                    is_mutable: false,
                    name: "local".into(),
                    ty: None,
                    value: Expression::Ident("y".into()),
                }],
            }),
        };
        let program = program_with(vec![Statement::Let {
            is_mutable: false,
            name: "f".into(),
            ty: None,
            value: closure,
        }]);

        let mut promoter = ClosureCapturePromoter::new();
        promoter.promote(&program);
        assert!(promoter.captures_for(closure_id).unwrap().is_empty());
    }

    #[test]
    fn field_write_through_a_captured_receiver_does_not_mark_it_mutable() {
        // let m = {}; let f = || { m.age = 1; };
        let closure_id = 4;
        let closure = Expression::Closure {
            id: closure_id,
            params: vec![],
            return_type: None,
            body: Box::new(Block {
                statements: vec![Statement::Assign {
                    target: Expression::FieldAccess {
                        object: Box::new(Expression::Ident("m".into())),
                        field: "age".into(),
                    },
                    value: Expression::IntLiteral(1),
                }],
            }),
        };
        let program = program_with(vec![
            Statement::Let {
                is_mutable: false,
                name: "m".into(),
                ty: None,
                value: Expression::MapLiteral(vec![]),
            },
            Statement::Let {
                is_mutable: false,
                name: "f".into(),
                ty: None,
                value: closure,
            },
        ]);

        let mut promoter = ClosureCapturePromoter::new();
        promoter.promote(&program);
        let captures = promoter.captures_for(closure_id).unwrap();
        assert_eq!(
            captures,
            &[CaptureRecord {
                name: "m".into(),
                is_mutable: false
            }]
        );
    }
}
