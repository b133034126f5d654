//! End-to-end scenarios over the public API.
//!
//! Each test lowers a small program, optionally optimizes it, and checks the shape of the
//! resulting stream, control-flow graph, dominator tree or liveness sets.

use std::collections::BTreeSet;

use tacflow::{
    analysis::CfgEdgeKind,
    ast::{Expr, Node, Stmt},
    ir::{BlockId, VarId},
    CompilationUnit, ControlFlowGraph, Pipeline, PipelineConfig, Result,
};

/// `{ int x=1; float y=3.0; if(x>0){y=y*1.5;}else{y=y+2.0;} int a=0; if(1<=2){a=1;}else{a=2;} }`
fn two_conditionals() -> Node {
    Stmt::compound(vec![
        Stmt::decl_int("x", Some(Expr::int(1))),
        Stmt::decl_float("y", Some(Expr::float(3.0))),
        Stmt::if_else(
            Expr::gt(Expr::var("x"), Expr::int(0)),
            Stmt::compound(vec![Stmt::expr(Expr::assign(
                Expr::var("y"),
                Expr::mul(Expr::var("y"), Expr::float(1.5)),
            ))]),
            Stmt::compound(vec![Stmt::expr(Expr::assign(
                Expr::var("y"),
                Expr::add(Expr::var("y"), Expr::float(2.0)),
            ))]),
        ),
        Stmt::decl_int("a", Some(Expr::int(0))),
        Stmt::if_else(
            Expr::le(Expr::int(1), Expr::int(2)),
            Stmt::compound(vec![Stmt::expr(Expr::assign(Expr::var("a"), Expr::int(1)))]),
            Stmt::compound(vec![Stmt::expr(Expr::assign(Expr::var("a"), Expr::int(2)))]),
        ),
    ])
    .into()
}

fn named(unit: &CompilationUnit, name: &str) -> VarId {
    unit.variables()
        .iter()
        .find(|v| v.name() == Some(name))
        .map(|v| v.id())
        .unwrap_or_else(|| panic!("no variable named {name}"))
}

fn b(index: usize) -> BlockId {
    BlockId::new(index)
}

#[test]
fn test_two_diamonds_cfg_shape() -> Result<()> {
    let unit = CompilationUnit::from_ast(&two_conditionals())?;
    let cfg = ControlFlowGraph::new(&unit)?;

    assert_eq!(cfg.block_count(), 7);
    assert_eq!(unit.variables().len(), 7);

    let edges: Vec<(usize, usize)> = cfg
        .edges()
        .iter()
        .map(|e| (e.source().index(), e.target().index()))
        .collect();
    assert_eq!(
        edges,
        vec![
            (0, 1),
            (0, 2),
            (1, 3),
            (2, 3),
            (3, 4),
            (3, 5),
            (4, 6),
            (5, 6)
        ]
    );

    let kinds: Vec<CfgEdgeKind> = cfg.outgoing_edges(b(0)).map(|e| e.kind()).collect();
    assert_eq!(
        kinds,
        vec![CfgEdgeKind::ConditionalTrue, CfgEdgeKind::ConditionalFalse]
    );

    assert_eq!(cfg.idom(b(0)), b(0));
    for block in 1..=3 {
        assert_eq!(cfg.idom(b(block)), b(0), "idom of B{block}");
    }
    for block in 4..=6 {
        assert_eq!(cfg.idom(b(block)), b(3), "idom of B{block}");
    }
    assert_eq!(cfg.dom_set(b(0)), BTreeSet::from([b(0)]));
    assert_eq!(cfg.dom_set(b(5)), BTreeSet::from([b(0), b(3), b(5)]));
    Ok(())
}

#[test]
fn test_two_diamonds_survive_optimization() -> Result<()> {
    // Folding `1 <= 2` rewrites an instruction but adds no block.
    let pipeline = Pipeline::default();
    let unit = pipeline.compile(&two_conditionals())?;
    let cfg = pipeline.analyze(&unit)?;
    assert_eq!(cfg.block_count(), 7);
    assert_eq!(cfg.edge_count(), 8);
    Ok(())
}

#[test]
fn test_literal_folding() -> Result<()> {
    let program: Node = Stmt::compound(vec![
        Stmt::decl_float("x", Some(Expr::sub(Expr::float(3.5), Expr::float(1.5)))),
        Stmt::decl_int("y", Some(Expr::add(Expr::int(5), Expr::int(3)))),
        Stmt::decl_int("z", Some(Expr::mul(Expr::int(8), Expr::int(5)))),
    ])
    .into();

    let unit = Pipeline::default().compile(&program)?;
    assert_eq!(unit.len(), 3);
    assert_eq!(unit.to_string(), "x0:1:0 = 2.0\ny0:1:0 = 8\nz0:1:0 = 40\n");
    Ok(())
}

#[test]
fn test_repeated_expression_becomes_copy() -> Result<()> {
    let program: Node = Stmt::compound(vec![
        Stmt::decl_int("x", Some(Expr::int(5))),
        Stmt::decl_int("y", Some(Expr::add(Expr::var("x"), Expr::int(12)))),
        Stmt::decl_int("z", Some(Expr::add(Expr::var("x"), Expr::int(12)))),
    ])
    .into();

    let unoptimized = Pipeline::new(PipelineConfig::unoptimized()).compile(&program)?;
    let unit = Pipeline::default().compile(&program)?;

    let before: Vec<String> = unoptimized.to_string().lines().map(str::to_string).collect();
    let after: Vec<String> = unit.to_string().lines().map(str::to_string).collect();
    assert_eq!(after.len(), 3);
    assert_eq!(after[..2], before[..2]);
    assert_eq!(after[2], "z0:1:0 = y0:1:0");
    Ok(())
}

#[test]
fn test_liveness_across_branches() -> Result<()> {
    let unit = CompilationUnit::from_ast(&two_conditionals())?;
    let cfg = ControlFlowGraph::new(&unit)?;
    let y = named(&unit, "y");

    assert!(cfg.live_out(b(0)).contains(y));
    assert!(cfg.live_in(b(1)).contains(y));
    assert!(cfg.live_in(b(2)).contains(y));
    // y is dead once both branches have merged
    assert!(!cfg.live_in(b(3)).contains(y));
    Ok(())
}
