//! Abstract syntax tree
//!
//! Produced once by the parser and read-only afterwards. Every expression and
//! statement carries the position of the token it starts with; statement
//! positions are what breakpoints match against.

use std::fmt;
use std::rc::Rc;

use crate::position::Position;

/// A parsed program: the top-level statement list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// Top-level statements in source order
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Create a program from its statements.
    pub fn new(statements: Vec<Stmt>) -> Self {
        Self { statements }
    }

    /// Number of top-level statements.
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// True for a program without statements.
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Expressions
// ═══════════════════════════════════════════════════════════════════════

/// A numeric literal, already split into integer and float forms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    /// Literal without a decimal point
    Int(i64),
    /// Literal with a decimal point
    Float(f64),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Neg,
}

impl UnaryOp {
    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
        }
    }
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `//`
    FloorDiv,
    /// `%`
    Mod,
    /// `**`
    Pow,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl BinaryOp {
    /// Map an operator lexeme to its operator, if it is an infix one.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "//" => BinaryOp::FloorDiv,
            "%" => BinaryOp::Mod,
            "**" => BinaryOp::Pow,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            _ => return None,
        })
    }

    /// Source spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }

    /// True for the six comparison operators.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `42`, `3.5`
    NumberLit {
        /// The literal value
        value: Number,
        /// Literal position
        pos: Position,
    },

    /// `"text"` with its quotes still attached; unquoted at evaluation
    StringLit {
        /// Raw lexeme including quotes
        raw: String,
        /// Literal position
        pos: Position,
    },

    /// `true` / `false`
    BoolLit {
        /// The literal value
        value: bool,
        /// Literal position
        pos: Position,
    },

    /// `nil`
    NilLit {
        /// Literal position
        pos: Position,
    },

    /// `[a, b, c]`
    ArrayLit {
        /// Element expressions
        elements: Vec<Expr>,
        /// Position of `[`
        pos: Position,
    },

    /// `{k: v, ...}`
    DictLit {
        /// Key/value expression pairs in source order
        entries: Vec<(Expr, Expr)>,
        /// Position of `{`
        pos: Position,
    },

    /// A variable reference
    Identifier {
        /// Variable name
        name: String,
        /// Reference position
        pos: Position,
    },

    /// `target[index]`
    Index {
        /// Indexed expression
        target: Box<Expr>,
        /// Index expression
        index: Box<Expr>,
        /// Position of the target
        pos: Position,
    },

    /// `-x`, `+x`
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        operand: Box<Expr>,
        /// Operator position
        pos: Position,
    },

    /// `left op right`
    BinaryOp {
        /// The operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expr>,
        /// Right operand
        right: Box<Expr>,
        /// Operator position
        pos: Position,
    },

    /// `name(args...)`
    FunctionCall {
        /// Callee name
        name: String,
        /// Argument expressions
        args: Vec<Expr>,
        /// Position of the callee name
        pos: Position,
    },
}

impl Expr {
    /// Position of the expression.
    pub fn pos(&self) -> Position {
        match self {
            Expr::NumberLit { pos, .. }
            | Expr::StringLit { pos, .. }
            | Expr::BoolLit { pos, .. }
            | Expr::NilLit { pos }
            | Expr::ArrayLit { pos, .. }
            | Expr::DictLit { pos, .. }
            | Expr::Identifier { pos, .. }
            | Expr::Index { pos, .. }
            | Expr::Unary { pos, .. }
            | Expr::BinaryOp { pos, .. }
            | Expr::FunctionCall { pos, .. } => *pos,
        }
    }

    /// Human-readable name of the expression kind, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::NumberLit { .. } => "number literal",
            Expr::StringLit { .. } => "string literal",
            Expr::BoolLit { .. } => "boolean literal",
            Expr::NilLit { .. } => "nil",
            Expr::ArrayLit { .. } => "array literal",
            Expr::DictLit { .. } => "dict literal",
            Expr::Identifier { .. } => "identifier",
            Expr::Index { .. } => "index expression",
            Expr::Unary { .. } => "unary operation",
            Expr::BinaryOp { .. } => "binary operation",
            Expr::FunctionCall { .. } => "function call",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Statements
// ═══════════════════════════════════════════════════════════════════════

/// `if cond: body (elif cond: body)* (else: body)?`
#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    /// Condition of the leading `if`
    pub cond: Expr,
    /// Body of the leading `if`
    pub body: Vec<Stmt>,
    /// `elif` arms in order
    pub elifs: Vec<(Expr, Vec<Stmt>)>,
    /// `else` body (empty when absent)
    pub orelse: Vec<Stmt>,
    /// Position of the `if` keyword
    pub pos: Position,
}

impl IfStmt {
    /// The condition and body of arm `arm`, where arm 0 is the `if` itself
    /// and arms `1..=elifs.len()` are the `elif`s.
    pub fn arm(&self, arm: usize) -> Option<(&Expr, &[Stmt])> {
        if arm == 0 {
            Some((&self.cond, &self.body))
        } else {
            self.elifs
                .get(arm - 1)
                .map(|(cond, body)| (cond, body.as_slice()))
        }
    }

    /// Number of conditional arms (`if` plus `elif`s).
    pub fn arm_count(&self) -> usize {
        1 + self.elifs.len()
    }
}

/// `def name(params): body`
///
/// Shared with the function values created from it, so defining a function
/// never copies its body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Function name
    pub name: String,
    /// Parameter names
    pub params: Vec<String>,
    /// Function body
    pub body: Vec<Stmt>,
    /// Position of the `def` keyword
    pub pos: Position,
}

/// A statement node.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `target = value`
    Assign {
        /// Assignment target (validated at evaluation)
        target: Expr,
        /// Assigned value
        value: Expr,
        /// Position of the target
        pos: Position,
    },

    /// `print(expr)`
    Print {
        /// Printed expression
        value: Expr,
        /// Position of `print`
        pos: Position,
    },

    /// Conditional
    If(IfStmt),

    /// `while cond: body`
    While {
        /// Loop condition
        cond: Expr,
        /// Loop body
        body: Vec<Stmt>,
        /// Position of `while`
        pos: Position,
    },

    /// `for var in iterable: body`
    For {
        /// Loop variable
        var: String,
        /// Iterated expression
        iterable: Expr,
        /// Loop body
        body: Vec<Stmt>,
        /// Position of `for`
        pos: Position,
    },

    /// Function definition
    FunctionDef(Rc<FunctionDef>),

    /// `return [value]`
    Return {
        /// Returned expression, if any
        value: Option<Expr>,
        /// Position of `return`
        pos: Position,
    },

    /// An expression evaluated for its side effects
    Expr(Expr),
}

impl Stmt {
    /// Position of the statement's first token.
    pub fn pos(&self) -> Position {
        match self {
            Stmt::Assign { pos, .. }
            | Stmt::Print { pos, .. }
            | Stmt::While { pos, .. }
            | Stmt::For { pos, .. }
            | Stmt::Return { pos, .. } => *pos,
            Stmt::If(stmt) => stmt.pos,
            Stmt::FunctionDef(def) => def.pos,
            Stmt::Expr(expr) => expr.pos(),
        }
    }

    /// Line the statement starts on.
    pub fn line(&self) -> usize {
        self.pos().line
    }
}
