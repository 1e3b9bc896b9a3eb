// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use url::Url;

use mustekala::{HandlerRegistry, HandlerScope, RouteContext, RouteHandler, RoutePattern};

fn noop_handler() -> Arc<dyn RouteHandler> {
    Arc::new(|_route: RouteContext| async move { Ok::<(), mustekala::Error>(()) })
}

fn glob_matching_benchmark(c: &mut Criterion) {
    let pattern = RoutePattern::glob("**/api/*/items/**").unwrap();
    let urls: Vec<Url> = [
        "https://example.com/api/v1/items/42",
        "https://example.com/api/v1/users/42",
        "https://example.com/static/app.js",
        "https://example.com/api/v2/items/nested/deep",
    ]
    .iter()
    .map(|u| Url::parse(u).unwrap())
    .collect();

    c.bench_function("glob_match", |b| {
        b.iter(|| {
            for url in &urls {
                black_box(pattern.matches(url));
            }
        })
    });
}

fn registry_scan_benchmark(c: &mut Criterion) {
    let registry = HandlerRegistry::new();
    for i in 0..50 {
        registry.register(
            RoutePattern::glob(&format!("**/fixture/{}/**", i)).unwrap(),
            noop_handler(),
            HandlerScope::Page,
        );
    }
    registry.register(
        RoutePattern::glob("**/api/items").unwrap(),
        noop_handler(),
        HandlerScope::Page,
    );

    let hit = Url::parse("https://example.com/api/items").unwrap();
    let miss = Url::parse("https://example.com/unrouted").unwrap();

    c.bench_function("registry_scan_hit", |b| {
        b.iter(|| black_box(registry.find_match(&hit).is_some()))
    });
    c.bench_function("registry_scan_miss", |b| {
        b.iter(|| black_box(registry.find_match(&miss).is_some()))
    });
}

criterion_group!(benches, glob_matching_benchmark, registry_scan_benchmark);
criterion_main!(benches);
