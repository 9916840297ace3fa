//! Materialization of the valid page-color universe
//!
//! The universe is the Cartesian product of the per-level color ranges and
//! the CPU set, constrained so the L1 and L2 components of a page color
//! agree on the CPU. Its cardinality is `n_l1 * n_l2 * n_l3 * |CPUs|`.

use std::collections::BTreeSet;

use crate::model::{CacheConfig, CpuId, L1Color, L2Color, L3Color, PageColor};

/// The enumerated cache-color lists and the page-color product over them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorUniverse {
    l1: Vec<L1Color>,
    l2: Vec<L2Color>,
    l3: Vec<L3Color>,
    cpus: BTreeSet<CpuId>,
    config: CacheConfig,
}

impl ColorUniverse {
    /// Enumerate all cache colors for the given geometry and CPU set.
    ///
    /// Color ids are 1-based. CPU-bound lists are ordered by `(cpu, id)`,
    /// the canonical enumeration order used by the optimizer.
    pub fn build(config: &CacheConfig, cpus: &BTreeSet<CpuId>) -> Self {
        let mut l1 = Vec::with_capacity(cpus.len() * config.n_l1 as usize);
        let mut l2 = Vec::with_capacity(cpus.len() * config.n_l2 as usize);
        for &cpu in cpus {
            for id in 1..=config.n_l1 {
                l1.push(L1Color { id, cpu });
            }
            for id in 1..=config.n_l2 {
                l2.push(L2Color { id, cpu });
            }
        }
        let l3 = (1..=config.n_l3).map(|id| L3Color { id }).collect();

        ColorUniverse {
            l1,
            l2,
            l3,
            cpus: cpus.clone(),
            config: *config,
        }
    }

    /// All L1 colors, ordered by `(cpu, id)`
    pub fn l1_colors(&self) -> &[L1Color] {
        &self.l1
    }

    /// All L2 colors, ordered by `(cpu, id)`
    pub fn l2_colors(&self) -> &[L2Color] {
        &self.l2
    }

    /// All L3 colors, ordered by id
    pub fn l3_colors(&self) -> &[L3Color] {
        &self.l3
    }

    /// The constrained Cartesian product, CPU-major then `(l1, l2, l3)`
    pub fn page_colors(&self) -> impl Iterator<Item = PageColor> + '_ {
        self.cpus.iter().flat_map(move |&cpu| {
            (1..=self.config.n_l1).flat_map(move |a| {
                (1..=self.config.n_l2)
                    .flat_map(move |b| (1..=self.config.n_l3).map(move |c| PageColor::new(a, b, c, cpu)))
            })
        })
    }

    /// Cardinality of the page-color universe
    pub fn len(&self) -> usize {
        self.cpus.len() * self.config.n_l1 as usize * self.config.n_l2 as usize * self.config.n_l3 as usize
    }

    /// True when no page color exists
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Membership test for a page color
    pub fn contains(&self, pc: &PageColor) -> bool {
        self.cpus.contains(&pc.cpu())
            && (1..=self.config.n_l1).contains(&pc.l1().id)
            && (1..=self.config.n_l2).contains(&pc.l2().id)
            && (1..=self.config.n_l3).contains(&pc.l3().id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpus(ids: &[u32]) -> BTreeSet<CpuId> {
        ids.iter().copied().map(CpuId::new).collect()
    }

    #[test]
    fn test_cardinality() {
        let universe = ColorUniverse::build(&CacheConfig::new(2, 4, 8), &cpus(&[0, 1]));
        assert_eq!(universe.len(), 2 * 4 * 8 * 2);
        assert_eq!(universe.page_colors().count(), universe.len());
    }

    #[test]
    fn test_per_level_lists() {
        let universe = ColorUniverse::build(&CacheConfig::new(2, 3, 4), &cpus(&[0, 1]));
        assert_eq!(universe.l1_colors().len(), 4);
        assert_eq!(universe.l2_colors().len(), 6);
        assert_eq!(universe.l3_colors().len(), 4);
    }

    #[test]
    fn test_l1_l2_cpu_agreement_in_product() {
        let universe = ColorUniverse::build(&CacheConfig::new(2, 2, 2), &cpus(&[0, 1]));
        for pc in universe.page_colors() {
            assert_eq!(pc.l1().cpu, pc.l2().cpu);
        }
    }

    #[test]
    fn test_contains() {
        let universe = ColorUniverse::build(&CacheConfig::new(1, 2, 3), &cpus(&[0]));
        assert!(universe.contains(&PageColor::new(1, 2, 3, CpuId::new(0))));
        assert!(!universe.contains(&PageColor::new(2, 2, 3, CpuId::new(0))));
        assert!(!universe.contains(&PageColor::new(1, 2, 3, CpuId::new(1))));
        assert!(!universe.contains(&PageColor::new(1, 2, 4, CpuId::new(0))));
    }

    #[test]
    fn test_empty_universe() {
        let universe = ColorUniverse::build(&CacheConfig::new(1, 1, 1), &BTreeSet::new());
        assert!(universe.is_empty());
        assert_eq!(universe.page_colors().count(), 0);
    }
}
