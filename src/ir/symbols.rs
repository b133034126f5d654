//! Symbol tables: lexical scopes, arrays, functions and labels.

use std::{collections::HashMap, fmt};

use crate::{
    ir::{InstrId, Scope, Type, VarId, VariableStore},
    Error, Result,
};

index_type! {
    /// Identifies an array in an [`ArrayTable`].
    pub struct ArrayId;
}

index_type! {
    /// Identifies a label in a [`LabelTable`].
    pub struct LabelId;
}

/// What a name in a scope frame refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    /// A scalar variable; the id is the declaration, renames are resolved through the store
    Variable(VarId),
    /// A fixed-size array
    Array(ArrayId),
}

#[derive(Debug, Clone)]
struct Frame {
    scope: Scope,
    names: HashMap<String, Symbol>,
}

/// Stack of lexical scope frames used while lowering the AST.
///
/// Names resolve innermost frame first. A declaration is visible to everything that follows it
/// in the same frame and in nested frames, and disappears when its frame is popped.
///
/// # Examples
///
/// ```rust
/// use tacflow::ir::{Scope, ScopeStack, Symbol, Type, VarFlags, VariableStore};
///
/// let mut vars = VariableStore::new();
/// let mut scopes = ScopeStack::new();
///
/// let outer = scopes.push();
/// let x = vars.declare("x", Type::Int, outer, VarFlags::empty());
/// scopes.bind("x", Symbol::Variable(x))?;
///
/// let inner = scopes.push();
/// assert_eq!(inner, Scope::new(2, 0));
/// assert_eq!(scopes.lookup("x", &vars), Some(Symbol::Variable(x)));
/// scopes.pop();
/// # Ok::<(), tacflow::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<Frame>,
    /// Number of scopes opened so far at each depth (index 0 = depth 1)
    opened: Vec<usize>,
}

impl ScopeStack {
    /// Creates an empty stack; no name is visible until the first [`push`](Self::push).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a new innermost scope and returns its identifier.
    pub fn push(&mut self) -> Scope {
        let depth = self.frames.len() + 1;
        if self.opened.len() < depth {
            self.opened.resize(depth, 0);
        }
        let index = self.opened[depth - 1];
        self.opened[depth - 1] += 1;

        let scope = Scope::new(depth, index);
        self.frames.push(Frame {
            scope,
            names: HashMap::new(),
        });
        scope
    }

    /// Closes the innermost scope. Popping an empty stack does nothing.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// Returns the innermost scope, or the default `0:0` scope if none is open.
    #[must_use]
    pub fn current(&self) -> Scope {
        self.frames.last().map(|f| f.scope).unwrap_or_default()
    }

    /// Returns the number of open scopes.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Binds `name` in the innermost scope, opening the outermost scope first if none is open.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDeclaration`] if the innermost scope already binds `name`.
    /// Names bound in enclosing scopes are shadowed without error.
    pub fn bind(&mut self, name: &str, symbol: Symbol) -> Result<()> {
        if self.frames.is_empty() {
            self.push();
        }
        let scope = self.current();
        let Some(frame) = self.frames.last_mut() else {
            unreachable!("a frame was opened above");
        };
        if frame.names.contains_key(name) {
            return Err(Error::DuplicateDeclaration {
                name: name.to_string(),
                scope,
            });
        }
        frame.names.insert(name.to_string(), symbol);
        Ok(())
    }

    /// Returns `true` if the innermost scope binds `name`.
    #[must_use]
    pub fn is_bound_locally(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.names.contains_key(name))
    }

    /// Resolves `name`, innermost scope first.
    ///
    /// Variables resolve to the newest rename of their declaration.
    #[must_use]
    pub fn lookup(&self, name: &str, vars: &VariableStore) -> Option<Symbol> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.names.get(name))
            .map(|symbol| match *symbol {
                Symbol::Variable(var) => Symbol::Variable(vars.current(var)),
                array @ Symbol::Array(_) => array,
            })
    }
}

/// A fixed-size array declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayInfo {
    /// Source name
    pub name: String,
    /// Element type
    pub element: Type,
    /// Number of elements
    pub length: usize,
    /// Declaring scope
    pub scope: Scope,
}

impl fmt::Display for ArrayInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.scope)
    }
}

/// Arena of the arrays declared in a unit.
#[derive(Debug, Clone, Default)]
pub struct ArrayTable {
    arrays: Vec<ArrayInfo>,
}

impl ArrayTable {
    /// Registers an array and returns its id.
    pub fn declare(&mut self, info: ArrayInfo) -> ArrayId {
        let id = ArrayId::new(self.arrays.len());
        self.arrays.push(info);
        id
    }

    /// Returns the number of arrays.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    /// Returns `true` if no array was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Returns the declaration of an array.
    #[must_use]
    pub fn get(&self, id: ArrayId) -> Option<&ArrayInfo> {
        self.arrays.get(id.index())
    }
}

impl std::ops::Index<ArrayId> for ArrayTable {
    type Output = ArrayInfo;

    fn index(&self, id: ArrayId) -> &ArrayInfo {
        &self.arrays[id.index()]
    }
}

/// Signature and state of a declared function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    /// Result type, [`Type::None`] for `void`
    pub return_type: Type,
    /// Parameter types in declaration order
    pub params: Vec<Type>,
    /// Label marking the function's first instruction
    pub label: LabelId,
    /// Whether a body has been lowered
    pub defined: bool,
}

/// Functions known to a unit, by name.
#[derive(Debug, Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, FunctionSignature>,
}

impl FunctionTable {
    /// Returns the signature of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    /// Returns the number of declared functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if no function was declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Iterates `(name, signature)` in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FunctionSignature)> + '_ {
        self.functions.iter().map(|(name, sig)| (name.as_str(), sig))
    }

    /// Registers a prototype or definition.
    ///
    /// A prototype may be repeated with an identical signature, and a definition may follow a
    /// matching prototype.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateDeclaration`] if `name` is already declared with a different
    /// signature, or if it is defined twice.
    pub fn declare(
        &mut self,
        name: &str,
        return_type: Type,
        params: Vec<Type>,
        define: bool,
        label: impl FnOnce() -> LabelId,
    ) -> Result<&FunctionSignature> {
        if let Some(existing) = self.functions.get_mut(name) {
            if existing.return_type != return_type
                || existing.params != params
                || (define && existing.defined)
            {
                return Err(Error::DuplicateDeclaration {
                    name: name.to_string(),
                    scope: Scope::default(),
                });
            }
            existing.defined |= define;
        } else {
            self.functions.insert(
                name.to_string(),
                FunctionSignature {
                    return_type,
                    params,
                    label: label(),
                    defined: define,
                },
            );
        }
        self.functions
            .get(name)
            .ok_or_else(|| Error::UndeclaredFunction(name.to_string()))
    }
}

/// What a label names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelKind {
    /// Compiler-generated branch target, printed `L{n}`
    Synthetic(u32),
    /// Entry of the named function
    Function(String),
}

/// A branch target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelInfo {
    /// What the label names
    pub kind: LabelKind,
    /// The `label` instruction defining it, once emitted
    pub site: Option<InstrId>,
}

impl fmt::Display for LabelInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LabelKind::Synthetic(n) => write!(f, "L{n}"),
            LabelKind::Function(name) => f.write_str(name),
        }
    }
}

/// Arena of the labels of a unit.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: Vec<LabelInfo>,
    next_synthetic: u32,
}

impl LabelTable {
    /// Creates a fresh `L{n}` label without a site.
    pub fn synthetic(&mut self) -> LabelId {
        let n = self.next_synthetic;
        self.next_synthetic += 1;
        self.push(LabelKind::Synthetic(n))
    }

    /// Creates the entry label of a function.
    pub fn function(&mut self, name: &str) -> LabelId {
        self.push(LabelKind::Function(name.to_string()))
    }

    /// Records the instruction that defines `label`.
    pub fn place(&mut self, label: LabelId, site: InstrId) {
        self.labels[label.index()].site = Some(site);
    }

    /// Returns the number of labels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns `true` if no label exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns a label.
    #[must_use]
    pub fn get(&self, id: LabelId) -> Option<&LabelInfo> {
        self.labels.get(id.index())
    }

    fn push(&mut self, kind: LabelKind) -> LabelId {
        let id = LabelId::new(self.labels.len());
        self.labels.push(LabelInfo { kind, site: None });
        id
    }
}

impl std::ops::Index<LabelId> for LabelTable {
    type Output = LabelInfo;

    fn index(&self, id: LabelId) -> &LabelInfo {
        &self.labels[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::VarFlags;

    #[test]
    fn test_scope_numbering() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.push(), Scope::new(1, 0));
        assert_eq!(scopes.push(), Scope::new(2, 0));
        scopes.pop();
        assert_eq!(scopes.push(), Scope::new(2, 1));
        assert_eq!(scopes.push(), Scope::new(3, 0));
        scopes.pop();
        scopes.pop();
        scopes.pop();
        assert_eq!(scopes.depth(), 0);
        assert_eq!(scopes.push(), Scope::new(1, 1));
    }

    #[test]
    fn test_lookup_innermost_first() {
        let mut vars = VariableStore::new();
        let mut scopes = ScopeStack::new();

        let s1 = scopes.push();
        let outer = vars.declare("x", Type::Int, s1, VarFlags::empty());
        scopes.bind("x", Symbol::Variable(outer)).unwrap();

        let s2 = scopes.push();
        let inner = vars.declare("x", Type::Float, s2, VarFlags::empty());
        scopes.bind("x", Symbol::Variable(inner)).unwrap();
        assert_eq!(scopes.lookup("x", &vars), Some(Symbol::Variable(inner)));

        scopes.pop();
        assert_eq!(scopes.lookup("x", &vars), Some(Symbol::Variable(outer)));
        assert_eq!(scopes.lookup("y", &vars), None);
    }

    #[test]
    fn test_lookup_returns_newest_rename() {
        let mut vars = VariableStore::new();
        let mut scopes = ScopeStack::new();
        let s1 = scopes.push();
        let x = vars.declare("x", Type::Int, s1, VarFlags::empty());
        scopes.bind("x", Symbol::Variable(x)).unwrap();

        let renamed = vars.rename(x);
        assert_eq!(scopes.lookup("x", &vars), Some(Symbol::Variable(renamed)));
    }

    #[test]
    fn test_duplicate_in_same_scope() {
        let mut scopes = ScopeStack::new();
        scopes.push();
        scopes.bind("a", Symbol::Array(ArrayId::new(0))).unwrap();
        let err = scopes.bind("a", Symbol::Array(ArrayId::new(1))).unwrap_err();
        assert!(matches!(err, Error::DuplicateDeclaration { ref name, .. } if name == "a"));
    }

    #[test]
    fn test_function_redeclaration() {
        let mut functions = FunctionTable::default();
        let mut labels = LabelTable::default();

        functions
            .declare("f", Type::Int, vec![Type::Int], false, || labels.function("f"))
            .unwrap();
        // matching definition after prototype
        let sig = functions
            .declare("f", Type::Int, vec![Type::Int], true, || labels.function("f"))
            .unwrap();
        assert!(sig.defined);
        assert_eq!(labels.len(), 1);

        // second definition
        assert!(functions
            .declare("f", Type::Int, vec![Type::Int], true, || labels.function("f"))
            .is_err());
        // conflicting prototype
        assert!(functions
            .declare("f", Type::Float, vec![Type::Int], false, || labels.function("f"))
            .is_err());
    }

    #[test]
    fn test_label_display() {
        let mut labels = LabelTable::default();
        let l0 = labels.synthetic();
        let main = labels.function("main");
        let l1 = labels.synthetic();
        assert_eq!(labels[l0].to_string(), "L0");
        assert_eq!(labels[main].to_string(), "main");
        assert_eq!(labels[l1].to_string(), "L1");
    }
}
