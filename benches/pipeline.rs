extern crate tacflow;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use tacflow::{
    analysis::LivenessStrategy,
    ast::{Expr, Node, Stmt},
    CompilationUnit, ControlFlowGraph, Pipeline, PipelineConfig,
};

/// Builds `depth` nested while loops, each body doing some redundant arithmetic.
fn nested_loops(depth: usize) -> Node {
    let mut body = Stmt::compound(vec![
        Stmt::decl_int("p", Some(Expr::add(Expr::var("a"), Expr::var("b")))),
        Stmt::decl_int("q", Some(Expr::add(Expr::var("a"), Expr::var("b")))),
        Stmt::expr(Expr::assign(
            Expr::var("a"),
            Expr::add(Expr::var("q"), Expr::mul(Expr::int(2), Expr::int(3))),
        )),
    ]);

    for level in 0..depth {
        let counter = format!("i{level}");
        body = Stmt::compound(vec![
            Stmt::decl_int(&counter, Some(Expr::int(0))),
            Stmt::while_loop(
                Expr::lt(Expr::var(&counter), Expr::int(10)),
                Stmt::compound(vec![
                    body,
                    Stmt::if_else(
                        Expr::gt(Expr::var("a"), Expr::var("b")),
                        Stmt::expr(Expr::assign(Expr::var("b"), Expr::var("a"))),
                        Stmt::expr(Expr::assign(Expr::var("a"), Expr::var("b"))),
                    ),
                    Stmt::expr(Expr::assign(
                        Expr::var(&counter),
                        Expr::add(Expr::var(&counter), Expr::int(1)),
                    )),
                ]),
            ),
        ]);
    }

    Stmt::compound(vec![
        Stmt::decl_int("a", Some(Expr::int(1))),
        Stmt::decl_int("b", Some(Expr::int(2))),
        body,
    ])
    .into()
}

/// Benchmark lowering plus local value numbering.
fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");
    for depth in [4, 16, 64] {
        let program = nested_loops(depth);
        let pipeline = Pipeline::new(PipelineConfig::default());
        let unoptimized = Pipeline::new(PipelineConfig::unoptimized());
        group.throughput(Throughput::Elements(depth as u64));

        group.bench_with_input(BenchmarkId::new("lower", depth), &program, |b, program| {
            b.iter(|| black_box(unoptimized.compile(black_box(program)).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("optimize", depth), &program, |b, program| {
            b.iter(|| black_box(pipeline.compile(black_box(program)).unwrap()));
        });
    }
    group.finish();
}

/// Benchmark CFG construction, dominators and both liveness solvers.
fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    for depth in [4, 16, 64] {
        let unit = CompilationUnit::from_ast(&nested_loops(depth)).unwrap();
        group.throughput(Throughput::Elements(unit.block_count() as u64));

        group.bench_with_input(BenchmarkId::new("dominators", depth), &unit, |b, unit| {
            b.iter(|| {
                let cfg = ControlFlowGraph::new(black_box(unit)).unwrap();
                black_box(cfg.dominators().node_count())
            });
        });

        let cfg = ControlFlowGraph::new(&unit).unwrap();
        for strategy in [LivenessStrategy::Worklist, LivenessStrategy::FullPass] {
            group.bench_with_input(
                BenchmarkId::new(format!("liveness/{strategy}"), depth),
                &cfg,
                |b, cfg| b.iter(|| black_box(cfg.compute_liveness(strategy))),
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_compile, bench_analysis);
criterion_main!(benches);
