//! Performance benchmarks for the module build pipeline.
//!
//! Measures the cost of the three hot paths a backend frontend hits:
//! type interning, function construction plus validation at `finish`,
//! and whole-module re-validation before emission.

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use ingot::{BlockTag, Cmp, FunctionBuilder, Module};

fn build_arith_function(module: &mut Module, name: &str) {
    let i32t = module.int32t();
    let sig = module.func_type(vec![i32t, i32t], vec![i32t]);
    let mut b = FunctionBuilder::new(name, sig, module)
        .unwrap_or_else(|e| panic!("builder: {e}"));
    let x = b.get_arg(0).unwrap();
    let y = b.get_arg(1).unwrap();
    b.ld_local(x);
    b.ld_local(y);
    b.iadd();
    b.ld_local(y);
    b.imul();
    b.ret();
    b.finish(module).unwrap_or_else(|e| panic!("finish: {e}"));
}

fn build_loop_function(module: &mut Module, name: &str) {
    let i32t = module.int32t();
    let sig = module.func_type(vec![i32t], vec![]);
    let mut b = FunctionBuilder::new(name, sig, module)
        .unwrap_or_else(|e| panic!("builder: {e}"));
    let n = b.get_arg(0).unwrap();

    let body = b.new_block(vec![], BlockTag::Loop);
    let exit = b.new_block(vec![], BlockTag::IfElse);
    b.switch_block(exit).unwrap();
    b.break_();
    b.switch_block(body).unwrap();
    b.ld_local(n);
    b.ld_int(1, i32t);
    b.isub();
    b.st_local(n);
    b.ld_local(n);
    b.ld_int(0, i32t);
    b.icmp(Cmp::Le);
    b.if_(exit);
    b.switch_block(ingot::BlockId::entry()).unwrap();
    b.loop_(body);
    b.finish(module).unwrap_or_else(|e| panic!("finish: {e}"));
}

fn bench_type_interning(c: &mut Criterion) {
    c.bench_function("intern_1000_function_types", |b| {
        b.iter(|| {
            let mut module = Module::new();
            let i32t = module.int32t();
            for n in 0..1000u32 {
                let params = vec![i32t; (n % 8) as usize];
                black_box(module.func_type(params, vec![i32t]));
            }
            module
        });
    });
}

fn bench_function_builds(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_and_finish");
    for count in [10usize, 100, 500] {
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("arith_{count}"), |b| {
            b.iter(|| {
                let mut module = Module::new();
                for i in 0..count {
                    build_arith_function(&mut module, &format!("f{i}"));
                }
                module
            });
        });
    }
    group.bench_function("loops_100", |b| {
        b.iter(|| {
            let mut module = Module::new();
            for i in 0..100 {
                build_loop_function(&mut module, &format!("f{i}"));
            }
            module
        });
    });
    group.finish();
}

fn bench_reverification(c: &mut Criterion) {
    let mut module = Module::new();
    for i in 0..200 {
        build_arith_function(&mut module, &format!("f{i}"));
    }
    c.bench_function("verify_module_200", |b| {
        b.iter(|| ingot::verify_module(black_box(&module)));
    });
}

criterion_group!(
    benches,
    bench_type_interning,
    bench_function_builds,
    bench_reverification
);
criterion_main!(benches);
