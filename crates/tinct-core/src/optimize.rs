//! Lexicographic spread optimization
//!
//! Takes the solver's feasible seed assignment and applies augmentation
//! moves until no move improves the objective `(distinct L3, distinct L2,
//! distinct L1)` in lexicographic order. Moves only ever add page colors
//! drawn from the adopting region's own domain allocation, so coverage and
//! the exclusion constraints are preserved by construction and every
//! applied move is a strict improvement.
//!
//! Because the three subproblems are independent once the partitions are
//! fixed, the local optimum this loop terminates at is the global optimum:
//! every allocated L3 color, every allocated `(L2, cpu)` pair, and every
//! `(L1, cpu)` pair ends up in use.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use crate::cancel::CancellationToken;
use crate::error::SolveError;
use crate::model::{CpuId, PageColor, RegionId};
use crate::solver::{L2Allocation, L3Allocation};
use crate::universe::ColorUniverse;
use crate::validate::Model;

/// Inflate `map` until the lex objective is maximal.
pub(crate) fn maximize(
    model: &Model,
    universe: &ColorUniverse,
    l3: &L3Allocation,
    l2: &L2Allocation,
    map: &mut BTreeMap<RegionId, BTreeSet<PageColor>>,
    token: &CancellationToken,
) -> Result<(), SolveError> {
    let mut moves = 0usize;
    loop {
        if token.is_cancelled() {
            return Err(SolveError::Cancelled);
        }

        let applied = augment_l3(model, universe, l3, l2, map)
            || augment_l2(model, universe, l3, l2, map)
            || augment_l1(model, universe, l3, l2, map);
        if !applied {
            break;
        }
        moves += 1;
    }
    debug!(moves, "optimizer reached fixpoint");
    Ok(())
}

/// Adopt one allocated-but-unused L3 color into its owning domain.
fn augment_l3(
    model: &Model,
    universe: &ColorUniverse,
    l3: &L3Allocation,
    l2: &L2Allocation,
    map: &mut BTreeMap<RegionId, BTreeSet<PageColor>>,
) -> bool {
    let used: BTreeSet<u32> = map
        .values()
        .flatten()
        .map(|pc| pc.l3().id)
        .collect();

    for color in universe.l3_colors() {
        if used.contains(&color.id) {
            continue;
        }
        let Some(domain) = l3.owner_of(color.id) else {
            continue;
        };
        let Some(region_id) = model.domains[&domain].first() else {
            continue;
        };
        let region = &model.regions[region_id];
        let Some(&cpu) = region.cpus.iter().next() else {
            continue;
        };
        let b = l2.first_color_of(cpu, domain);
        let pc = PageColor::new(1, b, color.id, cpu);
        trace!(region = %region_id, color = %pc, "augment l3");
        map.entry(region_id.clone()).or_default().insert(pc);
        return true;
    }
    false
}

/// Adopt one allocated-but-unused `(L2, cpu)` pair into its owning domain.
fn augment_l2(
    model: &Model,
    universe: &ColorUniverse,
    l3: &L3Allocation,
    l2: &L2Allocation,
    map: &mut BTreeMap<RegionId, BTreeSet<PageColor>>,
) -> bool {
    let used: BTreeSet<(CpuId, u32)> = map
        .values()
        .flatten()
        .map(|pc| (pc.l2().cpu, pc.l2().id))
        .collect();

    for color in universe.l2_colors() {
        if used.contains(&(color.cpu, color.id)) {
            continue;
        }
        let Some(domain) = l2.owner_of(color.cpu, color.id) else {
            continue;
        };
        let Some(region_id) = model.domains[&domain]
            .iter()
            .find(|id| model.regions[*id].cpus.contains(&color.cpu))
        else {
            continue;
        };
        let c = l3.first_color_of(domain);
        let pc = PageColor::new(1, color.id, c, color.cpu);
        trace!(region = %region_id, color = %pc, "augment l2");
        map.entry(region_id.clone()).or_default().insert(pc);
        return true;
    }
    false
}

/// Adopt one unused `(L1, cpu)` pair into the first region on that CPU.
fn augment_l1(
    model: &Model,
    universe: &ColorUniverse,
    l3: &L3Allocation,
    l2: &L2Allocation,
    map: &mut BTreeMap<RegionId, BTreeSet<PageColor>>,
) -> bool {
    let used: BTreeSet<(CpuId, u32)> = map
        .values()
        .flatten()
        .map(|pc| (pc.l1().cpu, pc.l1().id))
        .collect();

    for color in universe.l1_colors() {
        if used.contains(&(color.cpu, color.id)) {
            continue;
        }
        let Some(region) = model
            .regions
            .values()
            .find(|region| region.cpus.contains(&color.cpu))
        else {
            continue;
        };
        let b = l2.first_color_of(color.cpu, region.domain);
        let c = l3.first_color_of(region.domain);
        let pc = PageColor::new(color.id, b, c, color.cpu);
        trace!(region = %region.id, color = %pc, "augment l1");
        map.entry(region.id.clone()).or_default().insert(pc);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Input;
    use crate::model::{CacheConfig, DomainId};
    use crate::validate::validate;

    fn optimized(input: &Input) -> BTreeMap<RegionId, BTreeSet<PageColor>> {
        let (model, _) = validate(input).unwrap();
        let universe = ColorUniverse::build(&model.cache_config, &model.cpus);
        crate::solver::run(&model, &universe, &CancellationToken::new()).unwrap()
    }

    fn distinct_counts(map: &BTreeMap<RegionId, BTreeSet<PageColor>>) -> (usize, usize, usize) {
        let l3: BTreeSet<u32> = map.values().flatten().map(|pc| pc.l3().id).collect();
        let l2: BTreeSet<(CpuId, u32)> = map.values().flatten().map(|pc| (pc.l2().cpu, pc.l2().id)).collect();
        let l1: BTreeSet<(CpuId, u32)> = map.values().flatten().map(|pc| (pc.l1().cpu, pc.l1().id)).collect();
        (l3.len(), l2.len(), l1.len())
    }

    #[test]
    fn test_single_region_uses_every_color() {
        let input = Input::new(CacheConfig::new(2, 4, 8))
            .with_cpus([CpuId::new(0)])
            .with_subject("s", [CpuId::new(0)])
            .with_isolation(RegionId::executor("s"), DomainId::new(1));
        let map = optimized(&input);
        assert_eq!(distinct_counts(&map), (8, 4, 2));
    }

    #[test]
    fn test_two_domains_still_saturate_the_universe() {
        let input = Input::new(CacheConfig::new(2, 4, 8))
            .with_cpus([CpuId::new(0)])
            .with_subject("s1", [CpuId::new(0)])
            .with_subject("s2", [CpuId::new(0)])
            .with_isolation(RegionId::executor("s1"), DomainId::new(1))
            .with_isolation(RegionId::executor("s2"), DomainId::new(2));
        let map = optimized(&input);
        assert_eq!(distinct_counts(&map), (8, 4, 2));
    }

    #[test]
    fn test_optimizer_preserves_l3_exclusion() {
        let input = Input::new(CacheConfig::new(2, 4, 8))
            .with_cpus([CpuId::new(0)])
            .with_subject("s1", [CpuId::new(0)])
            .with_subject("s2", [CpuId::new(0)])
            .with_isolation(RegionId::executor("s1"), DomainId::new(1))
            .with_isolation(RegionId::executor("s2"), DomainId::new(2));
        let map = optimized(&input);

        let l3_of = |region: &RegionId| -> BTreeSet<u32> {
            map[region].iter().map(|pc| pc.l3().id).collect()
        };
        let s1 = l3_of(&RegionId::executor("s1"));
        let s2 = l3_of(&RegionId::executor("s2"));
        assert!(s1.is_disjoint(&s2));
        assert_eq!(s1.len() + s2.len(), 8);
    }

    #[test]
    fn test_optimizer_preserves_l2_exclusion_per_cpu() {
        let input = Input::new(CacheConfig::new(2, 4, 8))
            .with_cpus([CpuId::new(0)])
            .with_subject("s1", [CpuId::new(0)])
            .with_subject("s2", [CpuId::new(0)])
            .with_isolation(RegionId::executor("s1"), DomainId::new(1))
            .with_isolation(RegionId::executor("s2"), DomainId::new(2));
        let map = optimized(&input);

        let l2_of = |region: &RegionId| -> BTreeSet<u32> {
            map[region].iter().map(|pc| pc.l2().id).collect()
        };
        assert!(l2_of(&RegionId::executor("s1")).is_disjoint(&l2_of(&RegionId::executor("s2"))));
    }

    #[test]
    fn test_multi_cpu_counts_scale_with_cpus() {
        let input = Input::new(CacheConfig::new(2, 3, 4))
            .with_cpus([CpuId::new(0), CpuId::new(1)])
            .with_subject("s1", [CpuId::new(0)])
            .with_subject("s2", [CpuId::new(1)])
            .with_isolation(RegionId::executor("s1"), DomainId::new(1))
            .with_isolation(RegionId::executor("s2"), DomainId::new(2));
        let map = optimized(&input);
        // All colors on both CPUs reachable: 4 L3, 3 L2 x 2 CPUs, 2 L1 x 2 CPUs.
        assert_eq!(distinct_counts(&map), (4, 6, 4));
    }

    #[test]
    fn test_cancellation_inside_optimizer() {
        let input = Input::new(CacheConfig::new(2, 4, 8))
            .with_cpus([CpuId::new(0)])
            .with_subject("s", [CpuId::new(0)])
            .with_isolation(RegionId::executor("s"), DomainId::new(1));
        let (model, _) = validate(&input).unwrap();
        let universe = ColorUniverse::build(&model.cache_config, &model.cpus);
        let l3 = L3Allocation::compute(&model).unwrap();
        let l2 = L2Allocation::compute(&model).unwrap();
        let mut map = BTreeMap::new();

        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            maximize(&model, &universe, &l3, &l2, &mut map, &token),
            Err(SolveError::Cancelled)
        );
    }
}
