//! Envelope scanner and dispatch benchmarks

use std::hint::black_box;
use std::sync::Arc;

use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use tokio::runtime::Runtime;

use jsonrpc_engine::prelude::*;
use jsonrpc_engine::{batch, scanner};

const SINGLE: &[u8] = br#"{"jsonrpc":"2.0","method":"sum","params":[1, 2, 3, 4],"id":1}"#;
const NESTED: &[u8] = br#"{"jsonrpc":"2.0","params":{"filter":{"tags":["a","b","}"],"range":[1,{"x":2}]},"limit":50},"method":"search","id":"req-42"}"#;

fn batch_body(len: usize) -> Vec<u8> {
    let items: Vec<Value> = (0..len)
        .map(|id| json!({"jsonrpc": "2.0", "method": "sum", "params": [id, 1, 2], "id": id}))
        .collect();
    serde_json::to_vec(&items).unwrap()
}

fn scanner_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanner");

    group.bench_function("flat_envelope", |b| {
        b.iter(|| scanner::scan(black_box(SINGLE)).unwrap())
    });

    group.bench_function("nested_params", |b| {
        b.iter(|| scanner::scan(black_box(NESTED)).unwrap())
    });

    // full decode into a generic value, for comparison
    group.bench_function("serde_json_value", |b| {
        b.iter(|| serde_json::from_slice::<Value>(black_box(NESTED)).unwrap())
    });

    group.finish();
}

fn splitter_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("splitter");

    for len in [1usize, 10, 100] {
        let body = batch_body(len);
        group.bench_with_input(BenchmarkId::new("split", len), &body, |b, body| {
            b.iter(|| batch::split(black_box(body)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("array_len", len), &body, |b, body| {
            b.iter(|| batch::array_len(black_box(body)).unwrap())
        });
    }

    group.finish();
}

fn dispatch_benchmarks(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut builder = JsonRpcServerBuilder::new(Options::default().with_batch_max_len(100));
    builder.register(
        "sum",
        handler_fn(|ctx: RequestContext| async move {
            let numbers: Vec<i64> = ctx.params()?;
            ctx.result(&numbers.iter().sum::<i64>())
        }),
    );
    builder.use_middleware(Recovery);
    let server = builder.build();

    let (parts, ()) = http::Request::new(()).into_parts();
    let transport = Arc::new(parts);

    let mut group = c.benchmark_group("dispatch");

    group.bench_function("single", |b| {
        b.to_async(&rt).iter(|| {
            server.dispatch(Arc::clone(&transport), Bytes::from_static(SINGLE))
        })
    });

    for len in [10usize, 100] {
        let body = Bytes::from(batch_body(len));
        group.bench_with_input(BenchmarkId::new("batch", len), &body, |b, body| {
            b.to_async(&rt)
                .iter(|| server.dispatch(Arc::clone(&transport), body.clone()))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    scanner_benchmarks,
    splitter_benchmarks,
    dispatch_benchmarks
);
criterion_main!(benches);
