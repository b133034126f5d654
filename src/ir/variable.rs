//! Variables, scopes and the variable arena.
//!
//! Every variable of a compilation unit lives in one [`VariableStore`] and is addressed by a dense
//! [`VarId`]. Identity is the id: two declarations of the same name in different scopes, or a
//! shadowing redeclaration, always produce distinct variables. Variables are never removed while
//! a unit is being processed, so a `VarId` stays valid for the unit's whole lifetime and can be
//! used directly as an index into liveness bit sets.
//!
//! # Naming
//!
//! Named variables print as `{name}{disambiguator}:{depth}:{index}`, where `depth:index` is the
//! [`Scope`] of the declaration and the disambiguator counts renames of the same declaration.
//! Temporaries print as `$t{serial}` with a serial that is unique within the unit.

use std::{collections::HashMap, fmt};

use bitflags::bitflags;

use crate::ir::Type;

index_type! {
    /// Identifies a variable in a [`VariableStore`].
    pub struct VarId;
}

/// A lexical scope, identified by its nesting depth and the number of scopes opened at that
/// depth before it.
///
/// The outermost compound statement of a program is scope `1:0`; its first nested compound is
/// `2:0`, the second sibling nested compound `2:1`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Scope {
    /// Nesting depth, starting at 1 for the outermost scope
    pub depth: usize,
    /// Ordinal of this scope among all scopes opened at the same depth
    pub index: usize,
}

impl Scope {
    /// Creates a scope identifier.
    #[must_use]
    pub const fn new(depth: usize, index: usize) -> Self {
        Scope { depth, index }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.depth, self.index)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Properties of a variable that do not affect its identity
    pub struct VarFlags: u8 {
        /// Bound by a `param` instruction at function entry
        const PARAMETER = 0x01;
        /// Introduced by an optimization pass rather than by the source program
        const SYNTHETIC = 0x02;
    }
}

/// How a variable came into existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKind {
    /// Declared in the source program.
    Named {
        /// Source name
        name: String,
        /// Scope holding the declaration
        scope: Scope,
        /// Rename counter; 0 for the declaration itself
        disambiguator: u32,
        /// The declaration this variable is a rename of (itself for the declaration)
        root: VarId,
    },
    /// Compiler-generated temporary.
    Temporary {
        /// Unit-wide serial number
        serial: u32,
    },
}

/// A variable of the compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    id: VarId,
    kind: VariableKind,
    ty: Type,
    flags: VarFlags,
}

impl Variable {
    /// Returns the id of this variable.
    #[must_use]
    pub fn id(&self) -> VarId {
        self.id
    }

    /// Returns how this variable was introduced.
    #[must_use]
    pub fn kind(&self) -> &VariableKind {
        &self.kind
    }

    /// Returns the value type.
    #[must_use]
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// Returns the flags.
    #[must_use]
    pub fn flags(&self) -> VarFlags {
        self.flags
    }

    /// Returns the source name, or `None` for temporaries.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            VariableKind::Named { name, .. } => Some(name),
            VariableKind::Temporary { .. } => None,
        }
    }

    /// Returns the declaring scope, or `None` for temporaries.
    #[must_use]
    pub fn scope(&self) -> Option<Scope> {
        match &self.kind {
            VariableKind::Named { scope, .. } => Some(*scope),
            VariableKind::Temporary { .. } => None,
        }
    }

    /// Returns `true` for compiler-generated temporaries.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        matches!(self.kind, VariableKind::Temporary { .. })
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            VariableKind::Named {
                name,
                scope,
                disambiguator,
                ..
            } => write!(f, "{name}{disambiguator}:{scope}"),
            VariableKind::Temporary { serial } => write!(f, "$t{serial}"),
        }
    }
}

/// Arena of all variables of one compilation unit.
///
/// # Examples
///
/// ```rust
/// use tacflow::ir::{Scope, Type, VarFlags, VariableStore};
///
/// let mut store = VariableStore::new();
/// let x = store.declare("x", Type::Int, Scope::new(1, 0), VarFlags::empty());
/// let t = store.temporary(Type::Int, VarFlags::empty());
///
/// assert_eq!(store[x].to_string(), "x0:1:0");
/// assert_eq!(store[t].to_string(), "$t0");
///
/// let x1 = store.rename(x);
/// assert_eq!(store[x1].to_string(), "x1:1:0");
/// assert_eq!(store.current(x), x1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    vars: Vec<Variable>,
    next_temp: u32,
    /// Newest rename of each declaration, keyed by the declaration's id
    latest: HashMap<VarId, VarId>,
}

impl VariableStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of variables; valid ids are `0..len()`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` if no variable has been created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Returns the variable with the given id.
    #[must_use]
    pub fn get(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(id.index())
    }

    /// Iterates all variables in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.vars.iter()
    }

    /// Creates a named variable for a fresh declaration.
    pub fn declare(&mut self, name: &str, ty: Type, scope: Scope, flags: VarFlags) -> VarId {
        let id = VarId::new(self.vars.len());
        self.push(
            VariableKind::Named {
                name: name.to_string(),
                scope,
                disambiguator: 0,
                root: id,
            },
            ty,
            flags,
        )
    }

    /// Creates a fresh temporary.
    pub fn temporary(&mut self, ty: Type, flags: VarFlags) -> VarId {
        let serial = self.next_temp;
        self.next_temp += 1;
        self.push(VariableKind::Temporary { serial }, ty, flags)
    }

    /// Creates a new identity for the declaration `var` belongs to and records it as that
    /// declaration's newest rename.
    ///
    /// The new variable copies name, scope, type and flags; its disambiguator is one more than
    /// the newest existing rename.
    ///
    /// # Panics
    ///
    /// Panics if `var` is a temporary, which has no declaration to rename.
    pub fn rename(&mut self, var: VarId) -> VarId {
        let VariableKind::Named { root, .. } = self[var].kind else {
            panic!("cannot rename temporary {}", self[var]);
        };
        let newest = self.current(root);
        let Variable { kind, ty, flags, .. } = self[newest].clone();
        let VariableKind::Named {
            name,
            scope,
            disambiguator,
            ..
        } = kind
        else {
            unreachable!("renames of a named variable are named");
        };

        let renamed = self.push(
            VariableKind::Named {
                name,
                scope,
                disambiguator: disambiguator + 1,
                root,
            },
            ty,
            flags,
        );
        self.latest.insert(root, renamed);
        renamed
    }

    /// Returns the newest identity of the declaration `var` belongs to.
    ///
    /// Temporaries and never-renamed variables return themselves.
    #[must_use]
    pub fn current(&self, var: VarId) -> VarId {
        match self.vars.get(var.index()).map(|v| &v.kind) {
            Some(VariableKind::Named { root, .. }) => {
                self.latest.get(root).copied().unwrap_or(*root)
            }
            _ => var,
        }
    }

    fn push(&mut self, kind: VariableKind, ty: Type, flags: VarFlags) -> VarId {
        let id = VarId::new(self.vars.len());
        self.vars.push(Variable {
            id,
            kind,
            ty,
            flags,
        });
        id
    }
}

impl std::ops::Index<VarId> for VariableStore {
    type Output = Variable;

    fn index(&self, id: VarId) -> &Variable {
        &self.vars[id.index()]
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_and_temporary_display() {
        let mut store = VariableStore::new();
        let x = store.declare("x", Type::Int, Scope::new(2, 3), VarFlags::empty());
        let t0 = store.temporary(Type::Float, VarFlags::empty());
        let t1 = store.temporary(Type::Int, VarFlags::SYNTHETIC);

        assert_eq!(store[x].to_string(), "x0:2:3");
        assert_eq!(store[t0].to_string(), "$t0");
        assert_eq!(store[t1].to_string(), "$t1");
        assert!(store[t1].flags().contains(VarFlags::SYNTHETIC));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_shadowing_creates_new_identity() {
        let mut store = VariableStore::new();
        let outer = store.declare("x", Type::Int, Scope::new(1, 0), VarFlags::empty());
        let inner = store.declare("x", Type::Float, Scope::new(2, 0), VarFlags::empty());
        assert_ne!(outer, inner);
        assert_eq!(store.current(outer), outer);
        assert_eq!(store.current(inner), inner);
    }

    #[test]
    fn test_rename_chain() {
        let mut store = VariableStore::new();
        let x = store.declare("x", Type::Int, Scope::new(1, 0), VarFlags::PARAMETER);
        let x1 = store.rename(x);
        let x2 = store.rename(x1);

        assert_eq!(store[x2].to_string(), "x2:1:0");
        assert_eq!(store.current(x), x2);
        assert_eq!(store.current(x1), x2);
        assert_eq!(store[x2].flags(), VarFlags::PARAMETER);
        assert_eq!(store[x2].ty(), Type::Int);
    }

    #[test]
    #[should_panic(expected = "cannot rename temporary")]
    fn test_rename_temporary_panics() {
        let mut store = VariableStore::new();
        let t = store.temporary(Type::Int, VarFlags::empty());
        store.rename(t);
    }
}
