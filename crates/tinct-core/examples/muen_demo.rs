//! Example: coloring a Muen-style separation kernel system
//!
//! Models a 4-core system running a separation kernel, two trusted
//! subjects, several untrusted Linux subjects, and the channels between
//! them, then prints the computed page-coloring assignment.
//!
//! Run with: cargo run --example muen_demo

use tinct_core::{solve, CacheConfig, CpuId, DomainId, Input, RegionId};
use tinct_tracing::{init_global_tracing, TracingConfig};

/// Page-granular colors a set-associative cache offers.
///
/// `sets = capacity / (associativity * line)`; one page touches
/// `page / line` consecutive sets, and each such group of sets forms one
/// color.
fn cache_colors(total_capacity: u32, associativity: u32, line: u32, page: u32) -> u32 {
    let sets = total_capacity / (associativity * line);
    sets / (page / line)
}

fn main() {
    if let Err(err) = init_global_tracing(&TracingConfig::from_env()) {
        eprintln!("tracing setup failed: {err}");
    }

    const PAGE: u32 = 4096;
    let config = CacheConfig::new(
        cache_colors(32 * 1024, 8, 64, PAGE),     // L1: 32 KiB, 8-way
        cache_colors(256 * 1024, 8, 64, PAGE),    // L2: 256 KiB, 8-way
        cache_colors(6 * 1024 * 1024, 12, 64, PAGE), // L3: 6 MiB, 12-way
    );
    println!("cache colors: {config}");

    let cpu = CpuId::new;
    let dom = DomainId::new;

    // Kernel on core 0, trusted subjects on core 1, untrusted Linux guests
    // share cores 2 and 3.
    let mut input = Input::new(config)
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

    // Bidirectional channel pairs. The trusted pair shares the trusted
    // domain; each crypto <-> Linux link gets a domain of its own so the
    // guests cannot interfere with each other through the buffers.
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

    match solve(&input) {
        Ok(assignment) => {
            println!("{}", assignment.render());
            println!(
                "distinct colors used: l3={} l2={} l1={}",
                assignment.l3_count(),
                assignment.l2_count(),
                assignment.l1_count()
            );
            for diagnostic in assignment.diagnostics() {
                println!("note: {diagnostic}");
            }
        }
        Err(err) => {
            eprintln!("no assignment: {err}");
            std::process::exit(1);
        }
    }
}
