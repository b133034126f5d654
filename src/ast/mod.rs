//! Abstract syntax tree accepted by the IR builder.
//!
//! The tree is produced by an external parser and is assumed to be syntactically well-formed;
//! name resolution and type checking happen during lowering in
//! [`CompilationUnit::from_ast`](crate::CompilationUnit::from_ast).
//!
//! Two kinds of root exist: [`Node::Stmt`] for a bare statement program (usually one compound
//! statement) and [`Node::Program`] for a list of function prototypes and definitions.
//!
//! The constructor helpers keep hand-written trees readable:
//!
//! ```rust
//! use tacflow::ast::{Expr, Stmt};
//!
//! // { int x = 1; if (x > 0) { x = x - 1; } }
//! let program = Stmt::compound(vec![
//!     Stmt::decl_int("x", Some(Expr::int(1))),
//!     Stmt::if_then(
//!         Expr::gt(Expr::var("x"), Expr::int(0)),
//!         Stmt::compound(vec![Stmt::expr(Expr::assign(
//!             Expr::var("x"),
//!             Expr::sub(Expr::var("x"), Expr::int(1)),
//!         ))]),
//!     ),
//! ]);
//! assert_eq!(program.to_string(), "{ int x = 1; if (x > 0) { x = x - 1; } }");
//! ```

use std::fmt;

use strum::Display;

use crate::ir::Type;

/// Declared type in the source program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum AstType {
    /// `int`
    #[strum(to_string = "int")]
    Int,
    /// `float`
    #[strum(to_string = "float")]
    Float,
    /// `void`, only valid as a function result
    #[strum(to_string = "void")]
    Void,
}

impl From<AstType> for Type {
    fn from(ty: AstType) -> Self {
        match ty {
            AstType::Int => Type::Int,
            AstType::Float => Type::Float,
            AstType::Void => Type::None,
        }
    }
}

/// Binary operators, including assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[allow(missing_docs)]
pub enum BinaryOp {
    #[strum(to_string = "+")]
    Add,
    #[strum(to_string = "-")]
    Sub,
    #[strum(to_string = "*")]
    Mul,
    #[strum(to_string = "/")]
    Div,
    #[strum(to_string = "==")]
    Eq,
    #[strum(to_string = "!=")]
    Ne,
    #[strum(to_string = "<=")]
    Le,
    #[strum(to_string = ">=")]
    Ge,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = "=")]
    Assign,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[allow(missing_docs)]
pub enum UnaryOp {
    #[strum(to_string = "-")]
    Minus,
    #[strum(to_string = "!")]
    Not,
}

/// An expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer constant
    IntLiteral(i32),
    /// Float constant
    FloatLiteral(f32),
    /// Scalar variable reference
    Variable(String),
    /// `array[index]`
    ArrayAccess {
        /// Array name
        array: String,
        /// Element index
        index: Box<Expr>,
    },
    /// `lhs op rhs`, including `lhs = rhs`
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: Box<Expr>,
        /// Right operand
        rhs: Box<Expr>,
    },
    /// `op operand`
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expr>,
    },
    /// `(inner)`
    Paren(Box<Expr>),
    /// `function(args...)`
    Call {
        /// Callee name
        function: String,
        /// Arguments in source order
        args: Vec<Expr>,
    },
}

impl Expr {
    /// `value`
    #[must_use]
    pub fn int(value: i32) -> Self {
        Expr::IntLiteral(value)
    }

    /// `value`
    #[must_use]
    pub fn float(value: f32) -> Self {
        Expr::FloatLiteral(value)
    }

    /// `name`
    #[must_use]
    pub fn var(name: &str) -> Self {
        Expr::Variable(name.to_string())
    }

    /// `array[index]`
    #[must_use]
    pub fn index(array: &str, index: Expr) -> Self {
        Expr::ArrayAccess {
            array: array.to_string(),
            index: Box::new(index),
        }
    }

    /// `lhs op rhs`
    #[must_use]
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `lhs + rhs`
    #[must_use]
    pub fn add(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Add, lhs, rhs)
    }

    /// `lhs - rhs`
    #[must_use]
    pub fn sub(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Sub, lhs, rhs)
    }

    /// `lhs * rhs`
    #[must_use]
    pub fn mul(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Mul, lhs, rhs)
    }

    /// `lhs / rhs`
    #[must_use]
    pub fn div(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Div, lhs, rhs)
    }

    /// `lhs == rhs`
    #[must_use]
    pub fn eq(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Eq, lhs, rhs)
    }

    /// `lhs != rhs`
    #[must_use]
    pub fn ne(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Ne, lhs, rhs)
    }

    /// `lhs <= rhs`
    #[must_use]
    pub fn le(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Le, lhs, rhs)
    }

    /// `lhs >= rhs`
    #[must_use]
    pub fn ge(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Ge, lhs, rhs)
    }

    /// `lhs < rhs`
    #[must_use]
    pub fn lt(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Lt, lhs, rhs)
    }

    /// `lhs > rhs`
    #[must_use]
    pub fn gt(lhs: Expr, rhs: Expr) -> Self {
        Self::binary(BinaryOp::Gt, lhs, rhs)
    }

    /// `target = value`
    #[must_use]
    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::binary(BinaryOp::Assign, target, value)
    }

    /// `-operand`
    #[must_use]
    pub fn neg(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Minus,
            operand: Box::new(operand),
        }
    }

    /// `!operand`
    #[must_use]
    pub fn not(operand: Expr) -> Self {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(operand),
        }
    }

    /// `(inner)`
    #[must_use]
    pub fn paren(inner: Expr) -> Self {
        Expr::Paren(Box::new(inner))
    }

    /// `function(args...)`
    #[must_use]
    pub fn call(function: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            function: function.to_string(),
            args,
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLiteral(value) => write!(f, "{value}"),
            Expr::FloatLiteral(value) => write!(f, "{value:?}"),
            Expr::Variable(name) => f.write_str(name),
            Expr::ArrayAccess { array, index } => write!(f, "{array}[{index}]"),
            Expr::Binary { op, lhs, rhs } => write!(f, "{lhs} {op} {rhs}"),
            Expr::Unary { op, operand } => write!(f, "{op}{operand}"),
            Expr::Paren(inner) => write!(f, "({inner})"),
            Expr::Call { function, args } => {
                write!(f, "{function}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Expression evaluated for its effect
    Expr(Expr),
    /// `{ ... }`, opens a scope
    Compound(Vec<Stmt>),
    /// `if (cond) then [else otherwise]`
    If {
        /// Condition
        cond: Expr,
        /// Taken when the condition is non-zero
        then_branch: Box<Stmt>,
        /// Taken when the condition is zero
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (cond) body`
    While {
        /// Loop condition, evaluated before every iteration
        cond: Expr,
        /// Loop body
        body: Box<Stmt>,
    },
    /// `ty name [= init];`
    Decl {
        /// Declared type
        ty: AstType,
        /// Variable name
        name: String,
        /// Optional initializer
        init: Option<Expr>,
    },
    /// `ty name[length];`
    ArrayDecl {
        /// Element type
        ty: AstType,
        /// Array name
        name: String,
        /// Element count
        length: usize,
    },
    /// `return [value];`
    Return(Option<Expr>),
}

impl Stmt {
    /// `expr;`
    #[must_use]
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    /// `{ stmts... }`
    #[must_use]
    pub fn compound(stmts: Vec<Stmt>) -> Self {
        Stmt::Compound(stmts)
    }

    /// `ty name [= init];`
    #[must_use]
    pub fn decl(ty: AstType, name: &str, init: Option<Expr>) -> Self {
        Stmt::Decl {
            ty,
            name: name.to_string(),
            init,
        }
    }

    /// `int name [= init];`
    #[must_use]
    pub fn decl_int(name: &str, init: Option<Expr>) -> Self {
        Self::decl(AstType::Int, name, init)
    }

    /// `float name [= init];`
    #[must_use]
    pub fn decl_float(name: &str, init: Option<Expr>) -> Self {
        Self::decl(AstType::Float, name, init)
    }

    /// `ty name[length];`
    #[must_use]
    pub fn array(ty: AstType, name: &str, length: usize) -> Self {
        Stmt::ArrayDecl {
            ty,
            name: name.to_string(),
            length,
        }
    }

    /// `if (cond) then`
    #[must_use]
    pub fn if_then(cond: Expr, then_branch: Stmt) -> Self {
        Stmt::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: None,
        }
    }

    /// `if (cond) then else otherwise`
    #[must_use]
    pub fn if_else(cond: Expr, then_branch: Stmt, else_branch: Stmt) -> Self {
        Stmt::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        }
    }

    /// `while (cond) body`
    #[must_use]
    pub fn while_loop(cond: Expr, body: Stmt) -> Self {
        Stmt::While {
            cond,
            body: Box::new(body),
        }
    }

    /// `return [value];`
    #[must_use]
    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::Return(value)
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(expr) => write!(f, "{expr};"),
            Stmt::Compound(stmts) => {
                f.write_str("{")?;
                for stmt in stmts {
                    write!(f, " {stmt}")?;
                }
                f.write_str(" }")
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                write!(f, "if ({cond}) {then_branch}")?;
                match else_branch {
                    Some(otherwise) => write!(f, " else {otherwise}"),
                    None => Ok(()),
                }
            }
            Stmt::While { cond, body } => write!(f, "while ({cond}) {body}"),
            Stmt::Decl { ty, name, init } => match init {
                Some(init) => write!(f, "{ty} {name} = {init};"),
                None => write!(f, "{ty} {name};"),
            },
            Stmt::ArrayDecl { ty, name, length } => write!(f, "{ty} {name}[{length}];"),
            Stmt::Return(Some(value)) => write!(f, "return {value};"),
            Stmt::Return(None) => f.write_str("return;"),
        }
    }
}

/// A function parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter type
    pub ty: AstType,
    /// Parameter name
    pub name: String,
}

impl Parameter {
    /// Creates a parameter.
    #[must_use]
    pub fn new(ty: AstType, name: &str) -> Self {
        Parameter {
            ty,
            name: name.to_string(),
        }
    }
}

/// A function signature without body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionPrototype {
    /// Function name
    pub name: String,
    /// Result type
    pub return_type: AstType,
    /// Parameters in declaration order
    pub params: Vec<Parameter>,
}

impl FunctionPrototype {
    /// Creates a prototype.
    #[must_use]
    pub fn new(name: &str, return_type: AstType, params: Vec<Parameter>) -> Self {
        FunctionPrototype {
            name: name.to_string(),
            return_type,
            params,
        }
    }
}

/// A function with its body.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    /// Signature
    pub prototype: FunctionPrototype,
    /// Body, normally a [`Stmt::Compound`]
    pub body: Stmt,
}

impl FunctionDef {
    /// Creates a function definition.
    #[must_use]
    pub fn new(prototype: FunctionPrototype, body: Stmt) -> Self {
        FunctionDef { prototype, body }
    }
}

/// A top-level item of a [`Node::Program`].
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// Forward declaration
    Prototype(FunctionPrototype),
    /// Definition
    Function(FunctionDef),
}

/// Root of a program handed to the IR builder.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A statement program
    Stmt(Stmt),
    /// A sequence of function prototypes and definitions
    Program(Vec<Item>),
}

impl From<Stmt> for Node {
    fn from(stmt: Stmt) -> Self {
        Node::Stmt(stmt)
    }
}

impl From<Vec<Item>> for Node {
    fn from(items: Vec<Item>) -> Self {
        Node::Program(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expr_display() {
        let expr = Expr::assign(
            Expr::index("a", Expr::var("i")),
            Expr::neg(Expr::paren(Expr::mul(Expr::float(1.5), Expr::var("f")))),
        );
        assert_eq!(expr.to_string(), "a[i] = -(1.5 * f)");
        assert_eq!(
            Expr::call("max", vec![Expr::int(1), Expr::var("x")]).to_string(),
            "max(1, x)"
        );
    }

    #[test]
    fn test_stmt_display() {
        let stmt = Stmt::while_loop(
            Expr::lt(Expr::var("i"), Expr::int(10)),
            Stmt::compound(vec![
                Stmt::array(AstType::Float, "buf", 4),
                Stmt::ret(None),
            ]),
        );
        assert_eq!(stmt.to_string(), "while (i < 10) { float buf[4]; return; }");
    }

    #[test]
    fn test_type_conversion() {
        assert_eq!(Type::from(AstType::Int), Type::Int);
        assert_eq!(Type::from(AstType::Void), Type::None);
    }
}
