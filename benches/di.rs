use criterion::{black_box, criterion_group, criterion_main, Criterion};
use slim_di::{Constructor, Injectable, ServiceManager};

struct Config {
    port: u16,
}
impl Injectable for Config {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Config { port: 8080 }))]
    }
}

struct Request {
    payload: [u8; 64],
}
impl Injectable for Request {
    fn constructors() -> Vec<Constructor<Self>> {
        vec![Constructor::new(|_| Ok(Request { payload: [0; 64] }))]
    }
}

fn bench_singleton_hit(c: &mut Criterion) {
    let manager = ServiceManager::new();
    manager.register_singleton_self::<Config>().unwrap();

    // Prime the cache
    let _ = manager.get_required::<Config>();

    c.bench_function("singleton_hit", |b| {
        b.iter(|| {
            let config = manager.get_required::<Config>();
            black_box(config.port);
        })
    });
}

fn bench_transient_build(c: &mut Criterion) {
    let manager = ServiceManager::new();
    manager.register_transient_self::<Request>().unwrap();

    c.bench_function("transient_build", |b| {
        b.iter(|| {
            let request = manager.get_required::<Request>();
            black_box(&request.payload);
        })
    });
}

fn bench_scope_create(c: &mut Criterion) {
    let manager = ServiceManager::new();
    manager.register_singleton_self::<Config>().unwrap();
    manager.register_scoped_self::<Request>().unwrap();

    c.bench_function("scope_create", |b| {
        b.iter(|| {
            let scope = manager.create_scope();
            black_box(&scope);
        })
    });
}

fn bench_scoped_hit(c: &mut Criterion) {
    let manager = ServiceManager::new();
    manager.register_scoped_self::<Request>().unwrap();
    let scope = manager.create_scope();
    let _ = scope.get_required::<Request>();

    c.bench_function("scoped_hit", |b| {
        b.iter(|| {
            let request = scope.get_required::<Request>();
            black_box(&request.payload);
        })
    });
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_transient_build,
    bench_scope_create,
    bench_scoped_hit
);
criterion_main!(benches);
