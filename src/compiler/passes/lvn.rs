//! Local Value Numbering (LVN) pass.
//!
//! This pass eliminates redundant computations inside a basic block and folds binary operations
//! over two literals.
//!
//! # Example
//!
//! Before:
//! ```text
//! x = 5
//! y = x + 12
//! z = x + 12    // Redundant - same operator and operand values
//! w = 8 * 5     // Both operands are literals
//! ```
//!
//! After:
//! ```text
//! x = 5
//! y = x + 12
//! z = y
//! w = 40
//! ```
//!
//! # Algorithm
//!
//! Every block is scanned once with an empty table:
//!
//! 1. For each scalar binary instruction, key it by `(lhs value, operator, rhs value)`
//! 2. If the key is cached, rewrite the instruction into a copy of the cached value
//! 3. Otherwise fold it if both operands are literals, caching the literal
//! 4. Otherwise cache the key with the instruction's target as the holder of the value
//! 5. Every definition drops the keys reading the defined variable and detaches the entries it
//!    held
//!
//! A hit on a detached entry needs the value from before the holder was overwritten, so a
//! synthetic temporary `$tN = holder` is placed directly after the original computation. Those
//! copies are spliced in after the block scan and the partition is rebuilt.
//!
//! # Limitations
//!
//! - Operand order is significant: `a + b` and `b + a` are different keys
//! - Unary operations and array element operands are never numbered
//! - Works within a single block

use std::collections::HashMap;

use crate::{
    compiler::{pass::IrPass, EventKind, EventLog},
    config::LvnConfig,
    ir::{
        partition, BasicBlock, CompilationUnit, ExpressionKey, Operand, OperandKey, Operator,
        VarFlags, VarId,
    },
    Result,
};

/// Where a cached value can be read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HolderState {
    /// The holder still contains the value.
    Live,
    /// The holder was overwritten; the value is not reachable yet.
    Detached,
    /// The value was preserved in a synthetic temporary.
    Materialized(VarId),
}

#[derive(Debug, Clone, Copy)]
enum CachedValue {
    /// A folded constant.
    Literal(OperandKey),
    /// The result of the instruction at block position `origin`, assigned to `var`.
    Held {
        var: VarId,
        origin: usize,
        state: HolderState,
    },
}

/// A synthetic copy `temp = source` to place directly after block position `origin`.
#[derive(Debug)]
struct PendingCopy {
    origin: usize,
    temp: VarId,
    source: VarId,
}

/// Local value numbering with constant folding.
pub struct LocalValueNumberingPass {
    config: LvnConfig,
}

impl Default for LocalValueNumberingPass {
    fn default() -> Self {
        Self::new(LvnConfig::default())
    }
}

impl LocalValueNumberingPass {
    /// Creates a new pass with the given toggles.
    #[must_use]
    pub fn new(config: LvnConfig) -> Self {
        Self { config }
    }

    /// Returns the toggles this pass runs with.
    #[must_use]
    pub fn config(&self) -> &LvnConfig {
        &self.config
    }

    /// Evaluates a key over two literals, if folding is enabled and the host can evaluate it.
    fn fold(&self, key: &ExpressionKey) -> Option<OperandKey> {
        if !self.config.fold_constants {
            return None;
        }
        match (key.lhs, key.rhs) {
            (OperandKey::Int(a), OperandKey::Int(b)) => fold_int(key.op, a, b).map(OperandKey::Int),
            (OperandKey::Float(a), OperandKey::Float(b)) => {
                fold_float(key.op, f32::from_bits(a), f32::from_bits(b))
            }
            _ => None,
        }
    }

    /// Scans one block, rewriting instructions in place.
    ///
    /// Returns whether anything was rewritten and the synthetic copies still to be spliced.
    fn number_block(
        &self,
        unit: &mut CompilationUnit,
        block: &BasicBlock,
        events: &mut EventLog,
    ) -> (bool, Vec<PendingCopy>) {
        let mut table: HashMap<ExpressionKey, CachedValue> = HashMap::new();
        let mut pending = Vec::new();
        let mut changed = false;

        for (position, &id) in block.instructions().iter().enumerate() {
            let (target, key) = {
                let instr = &unit[id];
                (instr.target_var(), ExpressionKey::of(unit, instr))
            };

            let mut entry = None;
            let mut keeps_holders = false;

            if let (Some(key), Some(target)) = (key, target) {
                let hit = if self.config.eliminate_redundancy {
                    table.get(&key).copied()
                } else {
                    None
                };

                if let Some(cached) = hit {
                    let value = match cached {
                        CachedValue::Literal(literal) => literal.to_operand(),
                        CachedValue::Held {
                            var,
                            state: HolderState::Live,
                            ..
                        } => Operand::Variable(var),
                        CachedValue::Held {
                            state: HolderState::Materialized(temp),
                            ..
                        } => Operand::Variable(temp),
                        CachedValue::Held {
                            var,
                            origin,
                            state: HolderState::Detached,
                        } => {
                            let ty = unit.variables()[var].ty();
                            let temp = unit.new_temporary(ty, VarFlags::SYNTHETIC);
                            pending.push(PendingCopy {
                                origin,
                                temp,
                                source: var,
                            });
                            table.insert(
                                key,
                                CachedValue::Held {
                                    var,
                                    origin,
                                    state: HolderState::Materialized(temp),
                                },
                            );
                            events
                                .record(EventKind::CopyMaterialized)
                                .pass(self.name())
                                .at(block.id(), block.instructions()[origin])
                                .message(format!(
                                    "{} = {}",
                                    unit.variables()[temp],
                                    unit.variables()[var]
                                ));
                            Operand::Variable(temp)
                        }
                    };

                    // `x = x` leaves every value x holds in place.
                    keeps_holders = value == Operand::Variable(target);

                    log::trace!(
                        "{}: `{}` replaced by `{}`",
                        block.id(),
                        key.display(unit),
                        value.display(unit)
                    );
                    events
                        .record(EventKind::ExpressionEliminated)
                        .pass(self.name())
                        .at(block.id(), id)
                        .message(format!(
                            "{} replaced by {}",
                            key.display(unit),
                            value.display(unit)
                        ));
                    unit.instruction_mut(id).rewrite_as_copy(value);
                    changed = true;
                } else if let Some(literal) = self.fold(&key) {
                    let value = literal.to_operand();
                    log::trace!(
                        "{}: `{}` folded to `{}`",
                        block.id(),
                        key.display(unit),
                        value.display(unit)
                    );
                    events
                        .record(EventKind::ConstantFolded)
                        .pass(self.name())
                        .at(block.id(), id)
                        .message(format!(
                            "{} folded to {}",
                            key.display(unit),
                            value.display(unit)
                        ));
                    unit.instruction_mut(id).rewrite_as_copy(value);
                    changed = true;
                    entry = Some(CachedValue::Literal(literal));
                } else if !key.reads(target) {
                    entry = Some(CachedValue::Held {
                        var: target,
                        origin: position,
                        state: HolderState::Live,
                    });
                }
            }

            if let Some(target) = target {
                table.retain(|cached_key, _| !cached_key.reads(target));
                if !keeps_holders {
                    for cached in table.values_mut() {
                        if let CachedValue::Held { var, state, .. } = cached {
                            if *var == target && *state == HolderState::Live {
                                *state = HolderState::Detached;
                            }
                        }
                    }
                }
            }

            if let (Some(key), Some(entry)) = (key, entry) {
                table.insert(key, entry);
            }
        }

        (changed, pending)
    }

    /// Places the synthetic copies of `block` directly after their original computations.
    fn splice(unit: &mut CompilationUnit, block: &BasicBlock, mut pending: Vec<PendingCopy>) {
        pending.sort_by_key(|copy| copy.origin);

        let Some(first) = block.first() else {
            return;
        };
        let Some(start) = unit.stream().iter().position(|&id| id == first) else {
            return;
        };

        for (inserted, copy) in pending.into_iter().enumerate() {
            unit.insert_copy(
                start + copy.origin + 1 + inserted,
                copy.temp,
                Operand::Variable(copy.source),
                block.id(),
            );
        }
    }
}

fn fold_int(op: Operator, a: i32, b: i32) -> Option<i32> {
    Some(match op {
        Operator::Add => a.wrapping_add(b),
        Operator::Sub => a.wrapping_sub(b),
        Operator::Mul => a.wrapping_mul(b),
        Operator::Div => a.checked_div(b)?,
        Operator::Eq => i32::from(a == b),
        Operator::Ne => i32::from(a != b),
        Operator::Le => i32::from(a <= b),
        Operator::Ge => i32::from(a >= b),
        Operator::Lt => i32::from(a < b),
        Operator::Gt => i32::from(a > b),
        _ => return None,
    })
}

#[allow(clippy::float_cmp)]
fn fold_float(op: Operator, a: f32, b: f32) -> Option<OperandKey> {
    let value = match op {
        Operator::Add => a + b,
        Operator::Sub => a - b,
        Operator::Mul => a * b,
        Operator::Div => a / b,
        Operator::Eq => return Some(OperandKey::Int(i32::from(a == b))),
        Operator::Ne => return Some(OperandKey::Int(i32::from(a != b))),
        Operator::Le => return Some(OperandKey::Int(i32::from(a <= b))),
        Operator::Ge => return Some(OperandKey::Int(i32::from(a >= b))),
        Operator::Lt => return Some(OperandKey::Int(i32::from(a < b))),
        Operator::Gt => return Some(OperandKey::Int(i32::from(a > b))),
        _ => return None,
    };
    Some(OperandKey::Float(value.to_bits()))
}

impl IrPass for LocalValueNumberingPass {
    fn name(&self) -> &'static str {
        "local-value-numbering"
    }

    fn description(&self) -> &'static str {
        "Eliminates redundant computations within blocks and folds literal operations"
    }

    fn run(&self, unit: &mut CompilationUnit, events: &mut EventLog) -> Result<bool> {
        let mut changes = EventLog::new();
        let mut changed = false;
        let mut blocks = partition(unit);
        let mut index = 0;

        while let Some(block) = blocks.get(index) {
            let (block_changed, pending) = self.number_block(unit, block, &mut changes);
            changed |= block_changed;
            if !pending.is_empty() {
                Self::splice(unit, block, pending);
                blocks = partition(unit);
            }
            index += 1;
        }

        log::debug!(
            "local value numbering over {} block(s): {}",
            blocks.len(),
            changes.summary()
        );
        events.merge(changes);
        Ok(changed)
    }
}
