use serde::{Deserialize, Serialize};

/// Root of a Vex program: the unit the compiler's analysis passes run over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Top-level items. Trimmed to what the assignment/closure passes need to
/// walk into; struct/trait/enum machinery lives one layer up, out of scope
/// here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    Function(Function),
    Struct(Struct),
}

/// Function or method definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<Type>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub ty: Type,
}

/// Struct definition, kept only so map/element field-write targets have a
/// shape to resolve against at analysis time; methods are out of scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

/// Static type annotations as they appear in source. This is the analyzer's
/// view of a type, not the runtime's tagged-cell representation (`Value` in
/// vex-runtime) or the shape descriptor's per-field type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    I32,
    I64,
    F64,
    /// Arbitrary-precision decimal, the fourth member of the numeric
    /// family alongside `I32`/`I64`/`F64` (SPEC_FULL §3 "Value cell").
    Decimal,
    Bool,
    Str,
    Null,
    /// The dynamic-any type: a binding already using the tagged
    /// representation, or a value whose type is not statically known.
    Any,
    Array(Box<Type>),
    Map(Box<Type>),
    Named(String),
}

impl Type {
    /// int-32, int-64, float-64, decimal: the numeric family eligible for
    /// widening/rounding coercions under an explicit annotation.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::I32 | Type::I64 | Type::F64 | Type::Decimal)
    }

    pub fn is_null_or_any(&self) -> bool {
        matches!(self, Type::Null | Type::Any)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

/// Statements. Control flow is kept to the minimum needed to exercise
/// nested scopes and assignment targets inside loops/branches/closures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `let x = expr;` or `let! x = expr;`, optionally `let x: T = expr;`.
    Let {
        is_mutable: bool,
        name: String,
        ty: Option<Type>,
        value: Expression,
    },

    /// `target = value;`
    Assign {
        target: Expression,
        value: Expression,
    },

    /// `target += value;` and friends.
    CompoundAssign {
        target: Expression,
        op: CompoundOp,
        value: Expression,
    },

    Return(Option<Expression>),

    If {
        condition: Expression,
        then_block: Block,
        else_block: Option<Block>,
    },

    While {
        condition: Expression,
        body: Block,
    },

    Expression(Expression),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Expressions. Trimmed to the forms the analyzer needs to infer a static
/// type for, plus the three assignment-target shapes (ident, index, field).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),
    BoolLiteral(bool),
    Nil,

    Ident(String),

    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },

    Unary {
        op: UnaryOp,
        expr: Box<Expression>,
    },

    Call {
        func: Box<Expression>,
        args: Vec<Expression>,
    },

    /// `object.field`
    FieldAccess {
        object: Box<Expression>,
        field: String,
    },

    /// `object[index]`
    Index {
        object: Box<Expression>,
        index: Box<Expression>,
    },

    Array(Vec<Expression>),

    /// `{key: value, ...}` — keys are field names, not arbitrary expressions,
    /// matching the map/element shape model in vex-runtime.
    MapLiteral(Vec<(String, Expression)>),

    /// `|params| body`. `id` is a small integer assigned when the AST is
    /// built (by a test, or by `vex-cli`'s JSON loader) so the closure
    /// capture pass can key its output by closure identity without relying
    /// on AST node addresses, which an owned (non-arena) tree does not have
    /// stable across clones.
    Closure {
        id: u32,
        params: Vec<Param>,
        return_type: Option<Type>,
        body: Box<Block>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
}

pub mod arena;
