//! # Tinct Core – Cache-Aware Page Coloring
//!
//! `tinct-core` computes a page-coloring assignment for a statically
//! partitioned system (a separation kernel with a fixed set of kernels,
//! subjects, and inter-component channels). Given the number of colors each
//! cache level offers and a workload description, it assigns every memory
//! region a set of page colors so that regions in different *cache
//! isolation domains* never share cache at the enforceable levels:
//!
//! - **L3** is shared by all CPUs, so isolated regions get disjoint L3
//!   colors unconditionally.
//! - **L2** is private per CPU, so disjointness is enforced only between
//!   regions that share a CPU.
//! - **L1** is private per CPU and never shared across regions of
//!   different CPUs, so it carries no exclusion constraint.
//!
//! Among feasible assignments the solver maximizes the number of distinct
//! colors in use, L3 before L2 before L1, so the workload spreads over as
//! much of each cache as isolation permits.
//!
//! ## Overview
//!
//! The pipeline is strictly linear: validate and derive regions, enumerate
//! the page-color universe, partition the shared levels among isolation
//! domains, emit a minimal feasible assignment, then optimize the spread.
//! The whole computation is pure and single-threaded; long solves can be
//! interrupted through a [`CancellationToken`].
//!
//! ## Quick Start
//!
//! ```
//! use tinct_core::{solve, CacheConfig, CpuId, DomainId, Input, RegionId};
//!
//! let input = Input::new(CacheConfig::new(2, 4, 8))
//!     .with_cpus([CpuId::new(0)])
//!     .with_subject("crypto", [CpuId::new(0)])
//!     .with_subject("linux", [CpuId::new(0)])
//!     .with_isolation(RegionId::executor("crypto"), DomainId::new(1))
//!     .with_isolation(RegionId::executor("linux"), DomainId::new(2));
//!
//! let assignment = solve(&input)?;
//!
//! // Both subjects are colored, and together they use the whole cache.
//! assert_eq!(assignment.l3_count(), 8);
//! assert_eq!(assignment.l2_count(), 4);
//!
//! // Isolation: the two subjects share no L3 color.
//! let l3_ids = |region: &RegionId| -> std::collections::BTreeSet<u32> {
//!     assignment.page_colors(region).unwrap().iter().map(|pc| pc.l3().id).collect()
//! };
//! let crypto = l3_ids(&RegionId::executor("crypto"));
//! let linux = l3_ids(&RegionId::executor("linux"));
//! assert!(crypto.is_disjoint(&linux));
//! # Ok::<(), tinct_core::SolveError>(())
//! ```

pub mod assignment;
pub mod cancel;
pub mod error;
pub mod input;
pub mod model;
pub mod universe;
pub mod validate;

mod optimize;
mod solver;

use tracing::debug;

pub use assignment::{Assignment, SerializedAssignment, SerializedRegionColors};
pub use cancel::CancellationToken;
pub use error::{Result, SolveError, ValidationError};
pub use input::Input;
pub use model::{CacheConfig, CpuId, DomainId, L1Color, L2Color, L3Color, Name, PageColor, RegionId, RegionKind};
pub use universe::ColorUniverse;
pub use validate::{Diagnostic, Model, Region};

/// Compute the page-coloring assignment for one system description.
///
/// Either a complete valid mapping is returned or an error; partial
/// assignments are never produced.
pub fn solve(input: &Input) -> Result<Assignment> {
    solve_cancellable(input, &CancellationToken::new())
}

/// [`solve`] with cooperative cancellation.
///
/// The solver polls `token` at checkpoints in its outer loops and returns
/// [`SolveError::Cancelled`] once cancellation is observed.
pub fn solve_cancellable(input: &Input, token: &CancellationToken) -> Result<Assignment> {
    let (model, diagnostics) = validate::validate(input)?;
    let universe = ColorUniverse::build(&model.cache_config, &model.cpus);
    debug!(
        regions = model.regions.len(),
        cpus = model.cpus.len(),
        universe = universe.len(),
        "model validated"
    );

    let map = solver::run(&model, &universe, token)?;
    Ok(Assignment::from_map(map, diagnostics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solve_degenerate_input() {
        let input = Input::new(CacheConfig::new(1, 1, 1));
        let assignment = solve(&input).unwrap();
        assert!(assignment.map_pc().is_empty());
        assert_eq!(assignment.l3_count(), 0);
    }

    #[test]
    fn test_solve_surfaces_validation_errors() {
        let input = Input::new(CacheConfig::new(1, 1, 1)).with_cpus([CpuId::new(0)]);
        assert_eq!(
            solve(&input),
            Err(SolveError::InputValidation(ValidationError::UnusedCpu(CpuId::new(0))))
        );
    }

    #[test]
    fn test_solve_cancellable_observes_token() {
        let input = Input::new(CacheConfig::new(1, 1, 1))
            .with_cpus([CpuId::new(0)])
            .with_subject("s", [CpuId::new(0)])
            .with_isolation(RegionId::executor("s"), DomainId::new(1));

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(solve_cancellable(&input, &token), Err(SolveError::Cancelled));
    }
}
