#![allow(clippy::uninlined_format_args)]
//! 依赖注入容器的性能基准测试

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lifetime_di::sample::{register_duck_services, DuckFeeder, Food, NameCounter, Transcript};
use lifetime_di::{Registry, ServiceContainer, ServiceLifetime};
use std::sync::Arc;

/// 测试用的简单服务
struct SimpleService {
    value: i32,
}

fn simple_container(lifetime: ServiceLifetime) -> ServiceContainer {
    let mut registry = Registry::new();
    registry
        .register(lifetime, |_| Ok(Arc::new(SimpleService { value: 42 })))
        .unwrap();
    ServiceContainer::new(registry)
}

/// 基准测试：瞬态与作用域解析
fn bench_resolution_by_lifetime(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution_by_lifetime");

    for lifetime in [ServiceLifetime::Transient, ServiceLifetime::Scoped] {
        let container = simple_container(lifetime);
        group.bench_with_input(
            BenchmarkId::from_parameter(lifetime),
            &container,
            |b, container| {
                b.iter(|| black_box(container.resolve::<SimpleService>().unwrap().value));
            },
        );
    }

    group.finish();
}

/// 基准测试：作用域创建与销毁
fn bench_scope_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("scope_lifecycle");

    for resolutions in [0usize, 1, 10, 100] {
        let transcript = Transcript::default();
        let mut registry = Registry::new();
        register_duck_services(&mut registry, NameCounter::default(), transcript).unwrap();
        let container = ServiceContainer::new(registry);

        group.bench_with_input(
            BenchmarkId::from_parameter(resolutions),
            &resolutions,
            |b, &resolutions| {
                b.iter(|| {
                    container
                        .with_scope(|scope| {
                            for _ in 0..resolutions {
                                let feeder = scope.resolve::<DuckFeeder>().unwrap();
                                feeder.feed(Food::Apple);
                            }
                        })
                        .unwrap()
                });
            },
        );
    }

    group.finish();
}

/// 基准测试：多线程并发解析同一作用域服务
fn bench_concurrent_scoped_resolution(c: &mut Criterion) {
    let container = simple_container(ServiceLifetime::Scoped);

    c.bench_function("concurrent_scoped_resolution", |b| {
        b.iter(|| {
            std::thread::scope(|s| {
                for _ in 0..4 {
                    s.spawn(|| {
                        for _ in 0..250 {
                            black_box(container.resolve::<SimpleService>().unwrap());
                        }
                    });
                }
            })
        });
    });
}

criterion_group!(
    benches,
    bench_resolution_by_lifetime,
    bench_scope_lifecycle,
    bench_concurrent_scoped_resolution
);
criterion_main!(benches);
