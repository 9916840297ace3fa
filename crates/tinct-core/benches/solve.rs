//! Benchmark for the end-to-end solve
//!
//! Measures the full pipeline (validate, partition, seed, optimize) on a
//! Muen-style 4-core system and on a single-region system that forces the
//! optimizer to sweep a large color universe.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tinct_core::{solve, CacheConfig, CpuId, DomainId, Input, RegionId};

fn muen_style_input() -> Input {
    let cpu = CpuId::new;
    let dom = DomainId::new;

    let mut input = Input::new(CacheConfig::new(1, 8, 128))
        .with_cpus([cpu(0), cpu(1), cpu(2), cpu(3)])
        .with_kernel("muen_sk", [cpu(0)])
        .with_subject("trusted_app", [cpu(1)])
        .with_subject("trusted_crypto", [cpu(1)])
        .with_subject("linux_vs_vertr", [cpu(2), cpu(3)])
        .with_subject("linux_vs_nfd_1", [cpu(2), cpu(3)])
        .with_subject("linux_vs_nfd_2", [cpu(2), cpu(3)])
        .with_subject("linux_public", [cpu(2), cpu(3)])
        .with_subject("untrusted_app", [cpu(2), cpu(3)])
        .with_isolation(RegionId::executor("muen_sk"), dom(1))
        .with_isolation(RegionId::executor("trusted_app"), dom(2))
        .with_isolation(RegionId::executor("trusted_crypto"), dom(2))
        .with_isolation(RegionId::executor("linux_vs_vertr"), dom(3))
        .with_isolation(RegionId::executor("linux_vs_nfd_1"), dom(4))
        .with_isolation(RegionId::executor("linux_vs_nfd_2"), dom(5))
        .with_isolation(RegionId::executor("linux_public"), dom(6))
        .with_isolation(RegionId::executor("untrusted_app"), dom(6));

    let links: [(&str, &str, u32); 6] = [
        ("trusted_app", "trusted_crypto", 2),
        ("trusted_crypto", "linux_vs_vertr", 7),
        ("trusted_crypto", "linux_vs_nfd_1", 8),
        ("trusted_crypto", "linux_vs_nfd_2", 9),
        ("trusted_crypto", "linux_public", 10),
        ("linux_public", "untrusted_app", 6),
    ];
    for (a, b, domain) in links {
        input = input
            .with_channel(a, b)
            .with_isolation(RegionId::channel(a, b), dom(domain))
            .with_channel(b, a)
            .with_isolation(RegionId::channel(b, a), dom(domain));
    }
    input
}

fn single_region_input() -> Input {
    Input::new(CacheConfig::new(2, 8, 32))
        .with_cpus([CpuId::new(0)])
        .with_subject("s", [CpuId::new(0)])
        .with_isolation(RegionId::executor("s"), DomainId::new(1))
}

fn benchmark_solve(c: &mut Criterion) {
    let muen = muen_style_input();
    c.bench_function("solve_muen_style", |b| {
        b.iter(|| {
            let assignment = solve(black_box(&muen)).unwrap();
            black_box(assignment);
        })
    });

    let single = single_region_input();
    c.bench_function("solve_single_region_spread", |b| {
        b.iter(|| {
            let assignment = solve(black_box(&single)).unwrap();
            black_box(assignment);
        })
    });
}

fn benchmark_render(c: &mut Criterion) {
    let assignment = solve(&muen_style_input()).unwrap();
    c.bench_function("render_assignment", |b| {
        b.iter(|| {
            let text = assignment.render();
            black_box(text);
        })
    });
}

criterion_group!(benches, benchmark_solve, benchmark_render);
criterion_main!(benches);
