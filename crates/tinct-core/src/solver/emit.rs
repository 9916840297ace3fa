//! Seed assignment construction
//!
//! Emits the minimal feasible assignment: one page color per region per CPU
//! of the region, drawn from the colors allocated to the region's isolation
//! domain. The optimizer later inflates this seed to spread colors.

use std::collections::{BTreeMap, BTreeSet};

use crate::cancel::CancellationToken;
use crate::error::SolveError;
use crate::model::{PageColor, RegionId};
use crate::solver::partition::{L2Allocation, L3Allocation};
use crate::validate::Model;

/// Build the seed assignment.
///
/// Per region the L3 id is the domain's smallest allocated color. The L2 id
/// is one id valid on the region's whole CPU span when the allocation admits
/// one (the page colors then form a complete per-CPU family for the triple),
/// otherwise the smallest id on each CPU. The L1 id starts at 1; spreading
/// is the optimizer's concern.
pub(crate) fn seed(
    model: &Model,
    l3: &L3Allocation,
    l2: &L2Allocation,
    token: &CancellationToken,
) -> Result<BTreeMap<RegionId, BTreeSet<PageColor>>, SolveError> {
    let mut map: BTreeMap<RegionId, BTreeSet<PageColor>> = BTreeMap::new();

    for region in model.regions.values() {
        if token.is_cancelled() {
            return Err(SolveError::Cancelled);
        }

        let c = l3.first_color_of(region.domain);
        let span_b = l2.common_color(&region.cpus, region.domain);
        let colors = map.entry(region.id.clone()).or_default();
        for &cpu in &region.cpus {
            let b = span_b.unwrap_or_else(|| l2.first_color_of(cpu, region.domain));
            colors.insert(PageColor::new(1, b, c, cpu));
        }
    }

    Ok(map)
}
