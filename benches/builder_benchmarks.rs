//! Performance benchmarks for fragment construction.
//!
//! - Function assembly: counted loops and nested ifs, finalized into a
//!   declaration
//! - Staged insert: generating the insert body for a record list, and
//!   interpreting it over live rows
//!
//! ## Profiling with Puffin
//!
//! Run with the `profile-with-puffin` feature to record the finalization
//! scopes:
//!
//! ```bash
//! cargo bench --features profile-with-puffin -- --profile-time 5
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use stagegen::core::Field;
use stagegen::prelude::*;
use std::hint::black_box;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

/// Initialize puffin profiler.
#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

/// Call at the end of each benchmark iteration to flush profiling data.
#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// `func sum(n int) int` with `loops` sequential counted loops, each
/// holding an if.
fn build_loops(loops: usize) -> ast::FuncDecl {
    let mut pkg = Package::default();
    let int = pkg.types().int();
    let params = vec![("n", int)];
    let sig = pkg.new_signature(params, vec![int], false).unwrap();
    let flags = FuncFlags::empty();
    let mut func = pkg.new_func("sum", &sig, flags, Span::NONE).unwrap();
    let n = func.param_val(&pkg, "n").unwrap();

    let total = pkg.define_var("total", 0, true, Span::NONE).unwrap();
    func.body_add(total.clone());
    for _ in 0..loops {
        let (lp, i) = pkg.times(&n, "i", Span::NONE).unwrap();
        let odd = pkg.binary_op(&i, BinaryOp::Rem, 2, Span::NONE).unwrap();
        let cond = pkg.binary_op(odd, BinaryOp::Equal, 1, Span::NONE).unwrap();
        let bump = pkg.inc_dec(total.reference(), true, Span::NONE);
        func.body_add(lp.add(pkg.if_stmt(Span::NONE).cond(cond).add(bump)));
    }
    func.body_add(pkg.return_stmt(vec![total.val()], Span::NONE));
    let decl = func.decl(&mut pkg).unwrap();
    end_profiling_frame();
    decl
}

fn assembly_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let mut group = c.benchmark_group("builder/assembly");
    for loops in [1usize, 10, 100] {
        group.throughput(Throughput::Elements(loops as u64));
        group.bench_with_input(BenchmarkId::new("counted_loops", loops), &loops, |b, &loops| {
            b.iter(|| black_box(build_loops(black_box(loops))))
        });
    }
    group.finish();
}

fn insert_benchmarks(c: &mut Criterion) {
    setup_profiler();

    let mut group = c.benchmark_group("staged/insert");
    group.bench_function("generate_record_list", |b| {
        b.iter(|| {
            let mut pkg = Package::default();
            let types = pkg.types_mut();
            let (int, string) = (types.int(), types.string());
            let rec = types.struct_of(vec![Field::new("ID", int), Field::new("Name", string)]);
            let list = types.slice(rec);
            let params = vec![("rows", list)];
            let sig = pkg.new_signature(params, vec![], false).unwrap();
            let flags = FuncFlags::empty();
            let func = pkg.new_func("insertRows", &sig, flags, Span::NONE).unwrap();
            let rows = func.param_val(&pkg, "rows").unwrap();
            let mut class = Class::new();
            class.use_table("users");
            let mut generator = Generator::new(&mut pkg);
            class.insert(&mut generator, &[rows]).unwrap();
            black_box(generator.finish())
        })
    });

    for n in [10i64, 1000] {
        let record = |i| Value::record([("id", Value::Int(i)), ("name", Value::from("x"))]);
        let rows = Value::list((0..n).map(record));
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("interpret_rows", n), &rows, |b, rows| {
            b.iter(|| {
                let mut class = Class::new();
                class.use_table("users");
                let exec = RecordingExecutor::default();
                let mut it = Interpreter::with_config(exec, ExecConfig::default());
                black_box(class.insert(&mut it, std::slice::from_ref(rows)).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, assembly_benchmarks, insert_benchmarks);

criterion_main!(benches);
