#![no_main]

use libfuzzer_sys::fuzz_target;
use tacflow::{
    analysis::LivenessStrategy,
    ast::{Expr, Node, Stmt},
    compiler::{EventLog, IrPass, LocalValueNumberingPass},
    ir::Operator,
    CompilationUnit, ControlFlowGraph, Pipeline,
};

const VARS: [&str; 3] = ["a", "b", "c"];

/// Turns fuzzer bytes into a well-typed program over three int variables.
struct Decoder<'a> {
    data: &'a [u8],
}

impl Decoder<'_> {
    fn next(&mut self) -> Option<u8> {
        let (&byte, rest) = self.data.split_first()?;
        self.data = rest;
        Some(byte)
    }

    fn expr(&mut self, depth: usize) -> Expr {
        let Some(byte) = self.next() else {
            return Expr::int(0);
        };
        match byte % 4 {
            0 => Expr::int(i32::from(byte as i8)),
            1 => Expr::var(VARS[usize::from(byte / 4) % VARS.len()]),
            _ if depth > 3 => Expr::int(1),
            _ => {
                let lhs = self.expr(depth + 1);
                let rhs = self.expr(depth + 1);
                match byte / 4 % 10 {
                    0 => Expr::add(lhs, rhs),
                    1 => Expr::sub(lhs, rhs),
                    2 => Expr::mul(lhs, rhs),
                    3 => Expr::div(lhs, rhs),
                    4 => Expr::eq(lhs, rhs),
                    5 => Expr::ne(lhs, rhs),
                    6 => Expr::le(lhs, rhs),
                    7 => Expr::ge(lhs, rhs),
                    8 => Expr::lt(lhs, rhs),
                    _ => Expr::gt(lhs, rhs),
                }
            }
        }
    }

    fn stmts(&mut self, depth: usize) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while let Some(byte) = self.next() {
            let stmt = match byte % 5 {
                0 if depth > 0 => break,
                1 if depth < 4 => Stmt::if_then(self.expr(0), Stmt::compound(self.stmts(depth + 1))),
                2 if depth < 4 => Stmt::if_else(
                    self.expr(0),
                    Stmt::compound(self.stmts(depth + 1)),
                    Stmt::compound(self.stmts(depth + 1)),
                ),
                3 if depth < 4 => {
                    Stmt::while_loop(self.expr(0), Stmt::compound(self.stmts(depth + 1)))
                }
                _ => {
                    let target = VARS[usize::from(byte / 5) % VARS.len()];
                    Stmt::expr(Expr::assign(Expr::var(target), self.expr(0)))
                }
            };
            stmts.push(stmt);
        }
        stmts
    }

    fn program(mut self) -> Node {
        let mut stmts: Vec<Stmt> = VARS
            .iter()
            .map(|name| Stmt::decl_int(name, Some(Expr::int(0))))
            .collect();
        stmts.extend(self.stmts(0));
        Stmt::compound(stmts).into()
    }
}

fuzz_target!(|data: &[u8]| {
    let program = Decoder { data }.program();
    let Ok(mut unit) = CompilationUnit::from_ast(&program) else {
        return;
    };

    let ops: Vec<Operator> = unit.instructions().map(|i| i.op()).collect();
    let boundaries = (1..ops.len())
        .filter(|&i| ops[i] == Operator::Label || ops[i - 1].ends_block())
        .count();
    assert_eq!(unit.block_count(), 1 + boundaries);

    {
        let cfg = ControlFlowGraph::new(&unit).unwrap();
        assert_eq!(
            cfg.compute_liveness(LivenessStrategy::Worklist),
            cfg.compute_liveness(LivenessStrategy::FullPass)
        );
        for block in cfg.reverse_postorder() {
            assert!(cfg.dominators().dominates(cfg.entry(), block));
        }
    }

    let pass = LocalValueNumberingPass::default();
    let mut events = EventLog::new();
    pass.run(&mut unit, &mut events).unwrap();
    let once = unit.to_string();
    assert!(!pass.run(&mut unit, &mut events).unwrap());
    assert_eq!(unit.to_string(), once);

    let pipeline = Pipeline::default();
    let cfg = pipeline.analyze(&unit).unwrap();
    assert_eq!(
        cfg.compute_liveness(LivenessStrategy::Worklist),
        cfg.compute_liveness(LivenessStrategy::FullPass)
    );
});
