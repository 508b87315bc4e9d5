use crate::{Block, Expression, Function, Item, Program, Statement, Struct, Type};
use typed_arena::Arena;

/// Arena for AST nodes built up programmatically (tests, tools) instead of
/// decoded whole from JSON. Nodes are bulk-allocated and bulk-freed: unlike
/// the runtime's container data buffers (see `vex_runtime::allocator`),
/// nothing here is ever released individually or migrated between pools.
pub struct AstArena {
    pub programs: Arena<Program>,
    pub items: Arena<Item>,
    pub functions: Arena<Function>,
    pub structs: Arena<Struct>,
    pub expressions: Arena<Expression>,
    pub statements: Arena<Statement>,
    pub blocks: Arena<Block>,
    pub types: Arena<Type>,
}

impl AstArena {
    pub fn new() -> Self {
        Self {
            programs: Arena::new(),
            items: Arena::new(),
            functions: Arena::new(),
            structs: Arena::new(),
            expressions: Arena::new(),
            statements: Arena::new(),
            blocks: Arena::new(),
            types: Arena::new(),
        }
    }

    pub fn alloc_program(&self, program: Program) -> &Program {
        self.programs.alloc(program)
    }

    pub fn alloc_item(&self, item: Item) -> &Item {
        self.items.alloc(item)
    }

    pub fn alloc_function(&self, func: Function) -> &Function {
        self.functions.alloc(func)
    }

    pub fn alloc_struct(&self, strukt: Struct) -> &Struct {
        self.structs.alloc(strukt)
    }

    pub fn alloc_expression(&self, expr: Expression) -> &Expression {
        self.expressions.alloc(expr)
    }

    pub fn alloc_statement(&self, stmt: Statement) -> &Statement {
        self.statements.alloc(stmt)
    }

    pub fn alloc_block(&self, block: Block) -> &Block {
        self.blocks.alloc(block)
    }

    pub fn alloc_type(&self, ty: Type) -> &Type {
        self.types.alloc(ty)
    }
}

impl Default for AstArena {
    fn default() -> Self {
        Self::new()
    }
}