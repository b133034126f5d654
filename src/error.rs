use thiserror::Error;

use crate::ir::{Scope, Type};

/// The generic Error type, which covers every failure this library can report to a caller.
///
/// Errors fall into two groups. *Translation errors* are raised while lowering an AST into the
/// three-address IR and abort the conversion of the whole compilation unit. *Structural errors*
/// are raised when an analysis is asked to work on input it cannot represent, such as a
/// control-flow graph over an empty instruction stream.
///
/// Violated internal invariants (an instruction missing from the block it was stamped with, a
/// dominator query on an unreachable block) are bugs in an earlier stage and panic instead of
/// producing an `Error`.
///
/// # Error Categories
///
/// ## Translation Errors
/// - [`Error::UndeclaredVariable`] - A name is read or written without a visible declaration
/// - [`Error::UndeclaredFunction`] - A call names a function that was never declared
/// - [`Error::TypeMismatch`] - Operand, initializer, argument or return types disagree
/// - [`Error::DuplicateDeclaration`] - A name is declared twice in the same scope
/// - [`Error::ArityMismatch`] - A call passes the wrong number of arguments
/// - [`Error::NotAssignable`] - The left side of an assignment is not a storage location
///
/// ## Structural Errors
/// - [`Error::Empty`] - The compilation unit has no instructions
/// - [`Error::GraphError`] - A graph edge references a vertex that does not exist
///
/// # Examples
///
/// ```rust
/// use tacflow::{ast::{Expr, Stmt}, CompilationUnit, Error};
///
/// let program = Stmt::compound(vec![Stmt::expr(Expr::var("missing"))]);
///
/// match CompilationUnit::from_ast(&program.into()) {
///     Err(Error::UndeclaredVariable { name, .. }) => assert_eq!(name, "missing"),
///     other => panic!("unexpected result: {other:?}"),
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Translation errors
    /// A variable or array was referenced without a declaration in any enclosing scope.
    ///
    /// The lookup walks from the innermost scope outward; this error is raised once the
    /// outermost scope has been searched without a match.
    ///
    /// # Fields
    ///
    /// * `name` - The name as written in the source program
    /// * `scope` - The scope in which the lookup started
    #[error("Use of undeclared variable `{name}` in scope {scope}")]
    UndeclaredVariable {
        /// The unresolved name
        name: String,
        /// The scope where resolution started
        scope: Scope,
    },

    /// A call names a function that has neither a prototype nor a definition.
    #[error("Call to undeclared function `{0}`")]
    UndeclaredFunction(String),

    /// Two types that must agree do not.
    ///
    /// Raised for binary operands of different types, initializers and assigned values that
    /// differ from their target, call arguments that differ from the callee's parameters, array
    /// indices that are not `int`, return values that differ from the function's result
    /// type, and whole arrays used as values (`found` is [`Type::None`]).
    ///
    /// # Fields
    ///
    /// * `context` - Short description of the construct being checked
    /// * `expected` - The type required by the construct
    /// * `found` - The type actually supplied
    #[error("Type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        /// The construct being checked
        context: String,
        /// The required type
        expected: Type,
        /// The supplied type
        found: Type,
    },

    /// A name was declared twice in the same scope, or a function was defined twice or
    /// redeclared with a different signature.
    #[error("Duplicate declaration of `{name}` in scope {scope}")]
    DuplicateDeclaration {
        /// The redeclared name
        name: String,
        /// The scope holding both declarations
        scope: Scope,
    },

    /// A call supplies a different number of arguments than the callee declares.
    #[error("Function `{function}` expects {expected} argument(s), {found} given")]
    ArityMismatch {
        /// The callee
        function: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        found: usize,
    },

    /// The left-hand side of an assignment is neither a variable nor an array element.
    #[error("Expression is not assignable: {0}")]
    NotAssignable(String),

    // Structural errors
    /// The compilation unit contains no instructions, so no blocks or graph can be built.
    #[error("Compilation unit is empty")]
    Empty,

    /// Graph construction error.
    ///
    /// Raised when an edge references a vertex outside the graph. The control-flow graph builder
    /// only produces edges between existing blocks, so this indicates malformed input to the
    /// generic graph type.
    #[error("{0}")]
    GraphError(String),
}
