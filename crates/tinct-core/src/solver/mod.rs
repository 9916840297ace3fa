//! The constraint solver
//!
//! Control flow is the decomposition the problem admits: the L3 exclusion
//! subproblem is solved once globally, the L2 exclusion subproblem once per
//! CPU, then a minimal seed assignment is emitted and handed to the
//! lexicographic optimizer which spreads colors until every allocated color
//! is in use.

mod emit;
mod partition;

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::cancel::CancellationToken;
use crate::error::SolveError;
use crate::model::{PageColor, RegionId};
use crate::optimize;
use crate::universe::ColorUniverse;
use crate::validate::Model;

/// Compute a feasible, lexicographically optimal region-to-page-color map.
pub(crate) fn run(
    model: &Model,
    universe: &ColorUniverse,
    token: &CancellationToken,
) -> Result<BTreeMap<RegionId, BTreeSet<PageColor>>, SolveError> {
    if model.regions.is_empty() {
        return Ok(BTreeMap::new());
    }

    let l3 = partition::L3Allocation::compute(model)?;
    let l2 = partition::L2Allocation::compute(model)?;
    debug!(
        domains = model.domains.len(),
        regions = model.regions.len(),
        cpus = model.cpus.len(),
        "cache color partitions computed"
    );

    let mut map = emit::seed(model, &l3, &l2, token)?;
    optimize::maximize(model, universe, &l3, &l2, &mut map, token)?;
    Ok(map)
}

pub(crate) use partition::{L2Allocation, L3Allocation};
