//! Lowering of the AST into the three-address instruction stream.
//!
//! The builder walks the tree once, resolving names through a [`ScopeStack`], checking types,
//! and appending instructions to a fresh [`CompilationUnit`]. Every instruction is stamped with
//! the basic block it belongs to while it is emitted, so the block partition can later be read
//! directly off the stream.
//!
//! # Block stamping
//!
//! The builder tracks the current block id and whether that block already holds an instruction.
//! Starting a new block only advances the id if the current block is non-empty, which makes
//! consecutive boundaries (a jump immediately followed by a label) open a single block and keeps
//! every block non-empty:
//!
//! - a `label` first starts a new block and is then placed into it;
//! - `jump`, `jumpfalse` and `return` are placed and then start a new block.
//!
//! # Unreachable code
//!
//! After a `jump` or `return` the current path has ended and stays ended until a label is
//! placed. Statements lowered on an ended path are dropped, a branch that ends its path gets no
//! `jump` to the join point, and a join label nothing jumps or falls into is never placed. Every
//! block of a function is therefore reachable from the function's label.
//!
//! # Control flow lowering
//!
//! ```text
//! if (c) S1 else S2        while (c) S
//!
//!     $t = c                   Lc:
//!     jumpfalse $t Lf          $t = c
//!     S1                       jumpfalse $t Le
//!     jump Lj                  S
//! Lf:                          jump Lc
//!     S2                   Le:
//! Lj:
//! ```
//!
//! `jump Lj` is omitted when `S1` ends in a `return`, `jump Lc` when `S` does, and `Lj:` when
//! both branches do.

use crate::{
    ast::{AstType, BinaryOp, Expr, FunctionDef, FunctionPrototype, Item, Node, Stmt, UnaryOp},
    ir::{
        ArrayInfo, BlockId, CompilationUnit, InstrId, LabelId, Operand, Operator, ScopeStack,
        Symbol, Type, VarFlags, VarId,
    },
    Error, Result,
};

/// A lowered expression: the operand holding its value and the value's type.
#[derive(Debug, Clone)]
struct Value {
    operand: Operand,
    ty: Type,
}

#[derive(Debug, Clone)]
struct FunctionContext {
    name: String,
    return_type: Type,
}

/// Translates an AST into a [`CompilationUnit`].
pub(crate) struct IrBuilder {
    unit: CompilationUnit,
    scopes: ScopeStack,
    block: usize,
    block_used: bool,
    /// The last instruction was a `jump` or `return` and no label has been placed since.
    path_ended: bool,
    function: Option<FunctionContext>,
}

impl IrBuilder {
    pub(crate) fn new() -> Self {
        IrBuilder {
            unit: CompilationUnit::new(),
            scopes: ScopeStack::new(),
            block: 0,
            block_used: false,
            path_ended: false,
            function: None,
        }
    }

    /// Lowers `root` and returns the finished unit.
    pub(crate) fn build(mut self, root: &Node) -> Result<CompilationUnit> {
        match root {
            Node::Stmt(stmt) => self.lower_stmt(stmt)?,
            Node::Program(items) => {
                for item in items {
                    match item {
                        Item::Prototype(prototype) => self.declare_prototype(prototype)?,
                        Item::Function(function) => self.lower_function(function)?,
                    }
                }
            }
        }

        log::debug!(
            "lowered program into {} instructions, {} blocks, {} variables, {} functions",
            self.unit.len(),
            self.unit.block_count(),
            self.unit.variables().len(),
            self.unit.functions().len()
        );
        Ok(self.unit)
    }

    // Block stamping

    fn emit(
        &mut self,
        op: Operator,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        target: Option<Operand>,
    ) -> InstrId {
        let id = self
            .unit
            .emit(op, arg1, arg2, target, BlockId::new(self.block));
        self.block_used = true;
        self.path_ended = matches!(op, Operator::Jump | Operator::Return);
        if op.ends_block() {
            self.next_block();
        }
        id
    }

    fn next_block(&mut self) {
        if self.block_used {
            self.block += 1;
            self.block_used = false;
        }
    }

    fn place_label(&mut self, label: LabelId) {
        self.next_block();
        let site = self.emit(Operator::Label, Some(Operand::Label(label)), None, None);
        self.unit.labels_mut().place(label, site);
        log::trace!("placed {} in block {}", self.unit.labels()[label], self.block);
    }

    fn new_label(&mut self) -> LabelId {
        self.unit.labels_mut().synthetic()
    }

    // Functions

    fn declare_prototype(&mut self, prototype: &FunctionPrototype) -> Result<()> {
        let params = prototype.params.iter().map(|p| Type::from(p.ty)).collect();
        self.unit.declare_function(
            &prototype.name,
            prototype.return_type.into(),
            params,
            false,
        )?;
        Ok(())
    }

    fn lower_function(&mut self, function: &FunctionDef) -> Result<()> {
        let prototype = &function.prototype;
        let params = prototype.params.iter().map(|p| Type::from(p.ty)).collect();
        let return_type = Type::from(prototype.return_type);
        let signature =
            self.unit
                .declare_function(&prototype.name, return_type, params, true)?;

        self.place_label(signature.label);
        let scope = self.scopes.push();
        for param in &prototype.params {
            let ty = self.value_type(param.ty, &param.name)?;
            let var = self
                .unit
                .variables_mut()
                .declare(&param.name, ty, scope, VarFlags::PARAMETER);
            self.scopes.bind(&param.name, Symbol::Variable(var))?;
            self.emit(Operator::Param, None, None, Some(Operand::Variable(var)));
        }

        self.function = Some(FunctionContext {
            name: prototype.name.clone(),
            return_type,
        });
        self.lower_stmt(&function.body)?;
        if !self.path_ended {
            self.emit(Operator::Return, None, None, None);
        }

        self.function = None;
        self.scopes.pop();
        Ok(())
    }

    // Statements

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        if self.path_ended {
            log::trace!("dropping unreachable statement `{stmt}`");
            return Ok(());
        }
        match stmt {
            Stmt::Expr(expr) => {
                self.lower_expr(expr)?;
            }
            Stmt::Compound(stmts) => {
                self.scopes.push();
                for stmt in stmts {
                    self.lower_stmt(stmt)?;
                }
                self.scopes.pop();
            }
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.lower_condition(cond)?;
                let on_false = self.new_label();
                self.emit(
                    Operator::JumpFalse,
                    Some(cond),
                    Some(Operand::Label(on_false)),
                    None,
                );
                self.lower_stmt(then_branch)?;

                match else_branch {
                    Some(else_branch) => {
                        let join = (!self.path_ended).then(|| {
                            let join = self.new_label();
                            self.emit(Operator::Jump, Some(Operand::Label(join)), None, None);
                            join
                        });
                        self.place_label(on_false);
                        self.lower_stmt(else_branch)?;
                        if let Some(join) = join {
                            self.place_label(join);
                        }
                    }
                    None => self.place_label(on_false),
                }
            }
            Stmt::While { cond, body } => {
                let head = self.new_label();
                self.place_label(head);
                let cond = self.lower_condition(cond)?;
                let exit = self.new_label();
                self.emit(
                    Operator::JumpFalse,
                    Some(cond),
                    Some(Operand::Label(exit)),
                    None,
                );
                self.lower_stmt(body)?;
                if !self.path_ended {
                    self.emit(Operator::Jump, Some(Operand::Label(head)), None, None);
                }
                self.place_label(exit);
            }
            Stmt::Decl { ty, name, init } => self.lower_decl(*ty, name, init.as_ref())?,
            Stmt::ArrayDecl { ty, name, length } => {
                let element = self.value_type(*ty, name)?;
                let scope = self.scopes.current();
                if self.scopes.is_bound_locally(name) {
                    return Err(Error::DuplicateDeclaration {
                        name: name.clone(),
                        scope,
                    });
                }
                let array = self.unit.arrays_mut().declare(ArrayInfo {
                    name: name.clone(),
                    element,
                    length: *length,
                    scope,
                });
                self.scopes.bind(name, Symbol::Array(array))?;
            }
            Stmt::Return(value) => {
                let value = value.as_ref().map(|v| self.lower_expr(v)).transpose()?;
                if let Some(function) = &self.function {
                    let found = value.as_ref().map_or(Type::None, |v| v.ty);
                    if found != function.return_type {
                        return Err(Error::TypeMismatch {
                            context: format!("return from `{}`", function.name),
                            expected: function.return_type,
                            found,
                        });
                    }
                }
                self.emit(Operator::Return, value.map(|v| v.operand), None, None);
            }
        }
        Ok(())
    }

    /// Declares a scalar. The initializer is lowered before the name is bound, so it still
    /// sees any outer variable of the same name.
    fn lower_decl(&mut self, ty: AstType, name: &str, init: Option<&Expr>) -> Result<()> {
        let ty = self.value_type(ty, name)?;
        let scope = self.scopes.current();
        if self.scopes.is_bound_locally(name) {
            return Err(Error::DuplicateDeclaration {
                name: name.to_string(),
                scope,
            });
        }

        let var = self
            .unit
            .variables_mut()
            .declare(name, ty, scope, VarFlags::empty());

        if let Some(init) = init {
            let value = self.lower_expr_into(init, Some(var))?;
            if value.ty != ty {
                return Err(Error::TypeMismatch {
                    context: format!("initializer of `{name}`"),
                    expected: ty,
                    found: value.ty,
                });
            }
            if value.operand != Operand::Variable(var) {
                self.emit(
                    Operator::Assign,
                    Some(value.operand),
                    None,
                    Some(Operand::Variable(var)),
                );
            }
        }

        self.scopes.bind(name, Symbol::Variable(var))
    }

    fn value_type(&self, ty: AstType, name: &str) -> Result<Type> {
        match ty {
            AstType::Void => Err(Error::TypeMismatch {
                context: format!("declaration of `{name}`"),
                expected: Type::Int,
                found: Type::None,
            }),
            ty => Ok(ty.into()),
        }
    }

    // Expressions

    fn lower_condition(&mut self, cond: &Expr) -> Result<Operand> {
        let value = self.lower_expr(cond)?;
        if !value.ty.is_value() {
            return Err(Error::TypeMismatch {
                context: "condition".to_string(),
                expected: Type::Int,
                found: value.ty,
            });
        }
        Ok(value.operand)
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<Value> {
        self.lower_expr_into(expr, None)
    }

    /// Lowers `expr`. A computed expression (binary, unary or call) writes its result into
    /// `dest` when given, otherwise into a fresh temporary; leaves ignore `dest`.
    fn lower_expr_into(&mut self, expr: &Expr, dest: Option<VarId>) -> Result<Value> {
        match expr {
            Expr::IntLiteral(value) => Ok(Value {
                operand: Operand::IntLiteral(*value),
                ty: Type::Int,
            }),
            Expr::FloatLiteral(value) => Ok(Value {
                operand: Operand::FloatLiteral(*value),
                ty: Type::Float,
            }),
            Expr::Variable(name) => match self.resolve(name)? {
                Symbol::Variable(var) => Ok(Value {
                    operand: Operand::Variable(var),
                    ty: self.unit.variables()[var].ty(),
                }),
                Symbol::Array(array) => Err(Error::TypeMismatch {
                    context: format!("use of array `{name}` as a value"),
                    expected: self.unit.arrays()[array].element,
                    found: Type::None,
                }),
            },
            Expr::ArrayAccess { array, index } => self.lower_element(array, index),
            Expr::Paren(inner) => self.lower_expr_into(inner, dest),
            Expr::Binary {
                op: BinaryOp::Assign,
                lhs,
                rhs,
            } => self.lower_assign(lhs, rhs),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                let op = binary_operator(*op);
                if lhs.ty != rhs.ty || !lhs.ty.is_value() {
                    return Err(Error::TypeMismatch {
                        context: format!("operands of `{op}`"),
                        expected: lhs.ty,
                        found: rhs.ty,
                    });
                }

                let ty = op.result_type(lhs.ty);
                let target = self.destination(dest, ty);
                self.emit(
                    op,
                    Some(lhs.operand),
                    Some(rhs.operand),
                    Some(Operand::Variable(target)),
                );
                Ok(Value {
                    operand: Operand::Variable(target),
                    ty,
                })
            }
            Expr::Unary { op, operand } => {
                let value = self.lower_expr(operand)?;
                let op = match op {
                    UnaryOp::Minus => Operator::Minus,
                    UnaryOp::Not => Operator::Not,
                };
                if !value.ty.is_value() {
                    return Err(Error::TypeMismatch {
                        context: format!("operand of `{op}`"),
                        expected: Type::Int,
                        found: value.ty,
                    });
                }

                let ty = op.result_type(value.ty);
                let target = self.destination(dest, ty);
                self.emit(
                    op,
                    Some(value.operand),
                    None,
                    Some(Operand::Variable(target)),
                );
                Ok(Value {
                    operand: Operand::Variable(target),
                    ty,
                })
            }
            Expr::Call { function, args } => self.lower_call(function, args, dest),
        }
    }

    fn destination(&mut self, dest: Option<VarId>, ty: Type) -> VarId {
        match dest {
            Some(var) => var,
            None => self.unit.new_temporary(ty, VarFlags::empty()),
        }
    }

    fn resolve(&self, name: &str) -> Result<Symbol> {
        self.scopes
            .lookup(name, self.unit.variables())
            .ok_or_else(|| Error::UndeclaredVariable {
                name: name.to_string(),
                scope: self.scopes.current(),
            })
    }

    /// Lowers `array[index]` into an element operand whose index is a scalar.
    fn lower_element(&mut self, array: &str, index: &Expr) -> Result<Value> {
        let Symbol::Array(array_id) = self.resolve(array)? else {
            return Err(Error::UndeclaredVariable {
                name: array.to_string(),
                scope: self.scopes.current(),
            });
        };

        let index = self.lower_expr(index)?;
        if index.ty != Type::Int {
            return Err(Error::TypeMismatch {
                context: format!("index of `{array}`"),
                expected: Type::Int,
                found: index.ty,
            });
        }
        let index = if index.operand.is_scalar() {
            index.operand
        } else {
            let temp = self.unit.new_temporary(Type::Int, VarFlags::empty());
            self.emit(
                Operator::Assign,
                Some(index.operand),
                None,
                Some(Operand::Variable(temp)),
            );
            Operand::Variable(temp)
        };

        Ok(Value {
            operand: Operand::ArrayAccess {
                array: array_id,
                index: Box::new(index),
            },
            ty: self.unit.arrays()[array_id].element,
        })
    }

    fn lower_assign(&mut self, lhs: &Expr, rhs: &Expr) -> Result<Value> {
        let value = self.lower_expr(rhs)?;

        let mut place = lhs;
        while let Expr::Paren(inner) = place {
            place = inner;
        }

        let target = match place {
            Expr::Variable(name) => match self.resolve(name)? {
                Symbol::Variable(var) => Value {
                    operand: Operand::Variable(var),
                    ty: self.unit.variables()[var].ty(),
                },
                Symbol::Array(_) => return Err(Error::NotAssignable(place.to_string())),
            },
            Expr::ArrayAccess { array, index } => self.lower_element(array, index)?,
            other => return Err(Error::NotAssignable(other.to_string())),
        };

        if target.ty != value.ty {
            return Err(Error::TypeMismatch {
                context: format!("assignment to `{place}`"),
                expected: target.ty,
                found: value.ty,
            });
        }

        self.emit(
            Operator::Assign,
            Some(value.operand),
            None,
            Some(target.operand.clone()),
        );
        Ok(target)
    }

    fn lower_call(&mut self, function: &str, args: &[Expr], dest: Option<VarId>) -> Result<Value> {
        let signature = self
            .unit
            .functions()
            .get(function)
            .cloned()
            .ok_or_else(|| Error::UndeclaredFunction(function.to_string()))?;

        if signature.params.len() != args.len() {
            return Err(Error::ArityMismatch {
                function: function.to_string(),
                expected: signature.params.len(),
                found: args.len(),
            });
        }

        let mut values = Vec::with_capacity(args.len());
        for (position, (arg, &expected)) in args.iter().zip(&signature.params).enumerate() {
            let value = self.lower_expr(arg)?;
            if value.ty != expected {
                return Err(Error::TypeMismatch {
                    context: format!("argument {} of `{function}`", position + 1),
                    expected,
                    found: value.ty,
                });
            }
            values.push(value.operand);
        }
        for value in values {
            self.emit(Operator::Push, Some(value), None, None);
        }

        let callee = Some(Operand::Label(signature.label));
        if signature.return_type.is_value() {
            let target = self.destination(dest, signature.return_type);
            self.emit(Operator::Call, callee, None, Some(Operand::Variable(target)));
            Ok(Value {
                operand: Operand::Variable(target),
                ty: signature.return_type,
            })
        } else {
            let call = self.emit(Operator::Call, callee, None, None);
            Ok(Value {
                operand: Operand::Instruction(call),
                ty: Type::None,
            })
        }
    }
}

fn binary_operator(op: BinaryOp) -> Operator {
    match op {
        BinaryOp::Add => Operator::Add,
        BinaryOp::Sub => Operator::Sub,
        BinaryOp::Mul => Operator::Mul,
        BinaryOp::Div => Operator::Div,
        BinaryOp::Eq => Operator::Eq,
        BinaryOp::Ne => Operator::Ne,
        BinaryOp::Le => Operator::Le,
        BinaryOp::Ge => Operator::Ge,
        BinaryOp::Lt => Operator::Lt,
        BinaryOp::Gt => Operator::Gt,
        BinaryOp::Assign => Operator::Assign,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{FunctionDef, FunctionPrototype, Parameter};

    fn lower(stmts: Vec<Stmt>) -> Result<CompilationUnit> {
        CompilationUnit::from_ast(&Stmt::compound(stmts).into())
    }

    fn dump(unit: &CompilationUnit) -> Vec<String> {
        unit.instructions()
            .map(|i| format!("{}: {}", i.block().index(), i.display(unit)))
            .collect()
    }

    #[test]
    fn test_leaf_and_computed_initializers() {
        let unit = lower(vec![
            Stmt::decl_int("x", Some(Expr::int(5))),
            Stmt::decl_int("y", Some(Expr::add(Expr::var("x"), Expr::int(12)))),
            Stmt::decl_int("z", None),
        ])
        .unwrap();

        assert_eq!(dump(&unit), vec!["0: x0:1:0 = 5", "0: y0:1:0 = x0:1:0 + 12"]);
        assert_eq!(unit.variables().len(), 3);
    }

    #[test]
    fn test_assignment_goes_through_temporary() {
        let unit = lower(vec![
            Stmt::decl_float("y", Some(Expr::float(3.0))),
            Stmt::expr(Expr::assign(
                Expr::var("y"),
                Expr::mul(Expr::var("y"), Expr::float(1.5)),
            )),
        ])
        .unwrap();

        assert_eq!(
            dump(&unit),
            vec!["0: y0:1:0 = 3.0", "0: $t0 = y0:1:0 * 1.5", "0: y0:1:0 = $t0"]
        );
    }

    #[test]
    fn test_if_else_blocks() {
        let unit = lower(vec![
            Stmt::decl_int("x", Some(Expr::int(1))),
            Stmt::if_else(
                Expr::gt(Expr::var("x"), Expr::int(0)),
                Stmt::compound(vec![Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(2)))]),
                Stmt::compound(vec![Stmt::expr(Expr::assign(Expr::var("x"), Expr::int(3)))]),
            ),
        ])
        .unwrap();

        assert_eq!(
            dump(&unit),
            vec![
                "0: x0:1:0 = 1",
                "0: $t0 = x0:1:0 > 0",
                "0: jumpfalse $t0 L0",
                "1: x0:1:0 = 2",
                "1: jump L1",
                "2: L0:",
                "2: x0:1:0 = 3",
                "3: L1:",
            ]
        );
        assert_eq!(unit.block_count(), 4);
    }

    #[test]
    fn test_while_loop_blocks() {
        let unit = lower(vec![
            Stmt::decl_int("i", Some(Expr::int(0))),
            Stmt::while_loop(
                Expr::lt(Expr::var("i"), Expr::int(10)),
                Stmt::expr(Expr::assign(
                    Expr::var("i"),
                    Expr::add(Expr::var("i"), Expr::int(1)),
                )),
            ),
        ])
        .unwrap();

        assert_eq!(
            dump(&unit),
            vec![
                "0: i0:1:0 = 0",
                "1: L0:",
                "1: $t0 = i0:1:0 < 10",
                "1: jumpfalse $t0 L1",
                "2: $t1 = i0:1:0 + 1",
                "2: i0:1:0 = $t1",
                "2: jump L0",
                "3: L1:",
            ]
        );
    }

    #[test]
    fn test_initializer_sees_outer_binding() {
        let unit = lower(vec![
            Stmt::decl_float("x", Some(Expr::float(1.0))),
            Stmt::compound(vec![Stmt::decl_float(
                "x",
                Some(Expr::add(Expr::var("x"), Expr::var("x"))),
            )]),
        ])
        .unwrap();

        assert_eq!(
            dump(&unit),
            vec!["0: x0:1:0 = 1.0", "0: x0:2:0 = x0:1:0 + x0:1:0"]
        );
    }

    #[test]
    fn test_declarations_do_not_leak() {
        let err = lower(vec![
            Stmt::compound(vec![Stmt::decl_int("inner", Some(Expr::int(1)))]),
            Stmt::expr(Expr::var("inner")),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            Error::UndeclaredVariable {
                name: "inner".to_string(),
                scope: crate::ir::Scope::new(1, 0),
            }
        );
    }

    #[test]
    fn test_translation_errors() {
        let mismatch = lower(vec![
            Stmt::decl_int("i", Some(Expr::int(1))),
            Stmt::decl_float("f", Some(Expr::float(1.0))),
            Stmt::expr(Expr::add(Expr::var("i"), Expr::var("f"))),
        ])
        .unwrap_err();
        assert!(matches!(
            mismatch,
            Error::TypeMismatch { expected: Type::Int, found: Type::Float, .. }
        ));

        let duplicate = lower(vec![
            Stmt::decl_int("a", None),
            Stmt::decl_float("a", None),
        ])
        .unwrap_err();
        assert!(matches!(duplicate, Error::DuplicateDeclaration { .. }));

        let not_assignable = lower(vec![Stmt::expr(Expr::assign(Expr::int(1), Expr::int(2)))])
            .unwrap_err();
        assert_eq!(not_assignable, Error::NotAssignable("1".to_string()));

        let bad_init = lower(vec![Stmt::decl_int("x", Some(Expr::float(2.0)))]).unwrap_err();
        assert!(matches!(bad_init, Error::TypeMismatch { .. }));

        let undeclared_call = lower(vec![Stmt::expr(Expr::call("f", vec![]))]).unwrap_err();
        assert_eq!(undeclared_call, Error::UndeclaredFunction("f".to_string()));
    }

    #[test]
    fn test_arrays() {
        let unit = lower(vec![
            Stmt::array(AstType::Int, "a", 4),
            Stmt::decl_int("i", Some(Expr::int(2))),
            Stmt::expr(Expr::assign(Expr::index("a", Expr::var("i")), Expr::int(7))),
            Stmt::decl_int("v", Some(Expr::index("a", Expr::var("i")))),
        ])
        .unwrap();

        assert_eq!(
            dump(&unit),
            vec!["0: i0:1:0 = 2", "0: a:1:0[i0:1:0] = 7", "0: v0:1:0 = a:1:0[i0:1:0]"]
        );
        let i = unit[unit.stream()[0]].target_var().unwrap();
        let store = &unit[unit.stream()[1]];
        assert_eq!(store.target_var(), None);
        assert_eq!(unit.used_variables(store), vec![i]);

        let float_index = lower(vec![
            Stmt::array(AstType::Int, "a", 4),
            Stmt::expr(Expr::index("a", Expr::float(1.0))),
        ])
        .unwrap_err();
        assert!(matches!(
            float_index,
            Error::TypeMismatch { expected: Type::Int, .. }
        ));
    }

    #[test]
    fn test_array_name_is_not_a_value() {
        let whole = |value: Expr| {
            lower(vec![
                Stmt::array(AstType::Float, "a", 4),
                Stmt::decl_float("x", Some(value)),
            ])
            .unwrap_err()
        };

        let expected = Error::TypeMismatch {
            context: "use of array `a` as a value".to_string(),
            expected: Type::Float,
            found: Type::None,
        };
        assert_eq!(whole(Expr::var("a")), expected);
        assert_eq!(whole(Expr::add(Expr::var("a"), Expr::float(1.0))), expected);

        let stored = lower(vec![
            Stmt::array(AstType::Float, "a", 4),
            Stmt::array(AstType::Float, "b", 4),
            Stmt::expr(Expr::assign(Expr::index("b", Expr::int(0)), Expr::var("a"))),
        ])
        .unwrap_err();
        assert_eq!(stored, expected);
    }

    #[test]
    fn test_functions_and_calls() {
        let program: Node = vec![
            Item::Prototype(FunctionPrototype::new(
                "square",
                AstType::Int,
                vec![Parameter::new(AstType::Int, "n")],
            )),
            Item::Function(FunctionDef::new(
                FunctionPrototype::new("main", AstType::Void, vec![]),
                Stmt::compound(vec![Stmt::decl_int(
                    "r",
                    Some(Expr::call("square", vec![Expr::int(3)])),
                )]),
            )),
            Item::Function(FunctionDef::new(
                FunctionPrototype::new(
                    "square",
                    AstType::Int,
                    vec![Parameter::new(AstType::Int, "n")],
                ),
                Stmt::compound(vec![Stmt::ret(Some(Expr::mul(Expr::var("n"), Expr::var("n"))))]),
            )),
        ]
        .into();

        let unit = CompilationUnit::from_ast(&program).unwrap();
        assert_eq!(
            dump(&unit),
            vec![
                "0: main:",
                "0: push 3",
                "0: r0:2:0 = call square",
                "0: return",
                "1: square:",
                "1: param n0:1:1",
                "1: $t0 = n0:1:1 * n0:1:1",
                "1: return $t0",
            ]
        );
        assert!(unit.functions().get("square").unwrap().defined);
    }

    #[test]
    fn test_call_checks() {
        let program = |args: Vec<Expr>| -> Node {
            vec![
                Item::Prototype(FunctionPrototype::new(
                    "f",
                    AstType::Float,
                    vec![Parameter::new(AstType::Float, "x")],
                )),
                Item::Function(FunctionDef::new(
                    FunctionPrototype::new("main", AstType::Void, vec![]),
                    Stmt::compound(vec![Stmt::expr(Expr::call("f", args))]),
                )),
            ]
            .into()
        };

        let arity = CompilationUnit::from_ast(&program(vec![])).unwrap_err();
        assert_eq!(
            arity,
            Error::ArityMismatch {
                function: "f".to_string(),
                expected: 1,
                found: 0
            }
        );

        let types = CompilationUnit::from_ast(&program(vec![Expr::int(1)])).unwrap_err();
        assert!(matches!(
            types,
            Error::TypeMismatch { expected: Type::Float, found: Type::Int, .. }
        ));
    }

    fn ops(unit: &CompilationUnit) -> Vec<(usize, Operator)> {
        unit.instructions()
            .map(|i| (i.block().index(), i.op()))
            .collect()
    }

    #[test]
    fn test_returning_branches_get_no_join() {
        // int f(int c) { if (c) { return 1; } else { return 2; } }
        let program: Node = vec![Item::Function(FunctionDef::new(
            FunctionPrototype::new(
                "f",
                AstType::Int,
                vec![Parameter::new(AstType::Int, "c")],
            ),
            Stmt::compound(vec![Stmt::if_else(
                Expr::var("c"),
                Stmt::compound(vec![Stmt::ret(Some(Expr::int(1)))]),
                Stmt::compound(vec![Stmt::ret(Some(Expr::int(2)))]),
            )]),
        ))]
        .into();

        let unit = CompilationUnit::from_ast(&program).unwrap();
        assert_eq!(
            ops(&unit),
            vec![
                (0, Operator::Label),
                (0, Operator::Param),
                (0, Operator::JumpFalse),
                (1, Operator::Return),
                (2, Operator::Label),
                (2, Operator::Return),
            ]
        );
        assert_eq!(unit.block_count(), 3);
    }

    #[test]
    fn test_one_returning_branch_keeps_fallthrough() {
        // int f(int c) { if (c) { return 1; } else { c = 2; } return c; }
        let program: Node = vec![Item::Function(FunctionDef::new(
            FunctionPrototype::new(
                "f",
                AstType::Int,
                vec![Parameter::new(AstType::Int, "c")],
            ),
            Stmt::compound(vec![
                Stmt::if_else(
                    Expr::var("c"),
                    Stmt::ret(Some(Expr::int(1))),
                    Stmt::expr(Expr::assign(Expr::var("c"), Expr::int(2))),
                ),
                Stmt::ret(Some(Expr::var("c"))),
            ]),
        ))]
        .into();

        let unit = CompilationUnit::from_ast(&program).unwrap();
        assert_eq!(
            ops(&unit),
            vec![
                (0, Operator::Label),
                (0, Operator::Param),
                (0, Operator::JumpFalse),
                (1, Operator::Return),
                (2, Operator::Label),
                (2, Operator::Assign),
                (2, Operator::Return),
            ]
        );
    }

    #[test]
    fn test_statements_after_return_are_dropped() {
        // void g() { while (1) { return; int dead = 3; } return; int x = 1; }
        let program: Node = vec![Item::Function(FunctionDef::new(
            FunctionPrototype::new("g", AstType::Void, vec![]),
            Stmt::compound(vec![
                Stmt::while_loop(
                    Expr::int(1),
                    Stmt::compound(vec![
                        Stmt::ret(None),
                        Stmt::decl_int("dead", Some(Expr::int(3))),
                    ]),
                ),
                Stmt::ret(None),
                Stmt::decl_int("x", Some(Expr::int(1))),
            ]),
        ))]
        .into();

        let unit = CompilationUnit::from_ast(&program).unwrap();
        assert_eq!(
            dump(&unit),
            vec![
                "0: g:",
                "1: L0:",
                "1: jumpfalse 1 L1",
                "2: return",
                "3: L1:",
                "3: return",
            ]
        );
        assert!(unit.variables().is_empty());
    }

    #[test]
    fn test_return_type_checked() {
        let program: Node = vec![Item::Function(FunctionDef::new(
            FunctionPrototype::new("f", AstType::Int, vec![]),
            Stmt::compound(vec![Stmt::ret(Some(Expr::float(1.0)))]),
        ))]
        .into();

        let err = CompilationUnit::from_ast(&program).unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch { expected: Type::Int, found: Type::Float, .. }
        ));
    }
}
