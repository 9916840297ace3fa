//! Exclusive color partitions for the shared cache levels
//!
//! The L3 cache is shared by all CPUs, so mutually isolated domains must
//! receive pairwise-disjoint L3 color sets. L2 caches are private per CPU,
//! so the same partitioning is applied independently on every CPU, over the
//! domains actually present there.
//!
//! Both allocators hand out every available color: one color per domain
//! first (feasibility), then leftovers round-robin by demand so the
//! optimizer can later spread assignments across the full color space.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::SolveError;
use crate::model::{CpuId, DomainId};
use crate::validate::Model;

/// Disjoint L3 color sets per isolation domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct L3Allocation {
    by_domain: BTreeMap<DomainId, BTreeSet<u32>>,
    owner: BTreeMap<u32, DomainId>,
}

impl L3Allocation {
    /// Partition `1..=n_l3` among all isolation domains.
    ///
    /// Every domain receives at least one color; every color is owned by
    /// exactly one domain. Leftover colors go round-robin to domains by
    /// descending member count, ties in canonical domain order.
    pub(crate) fn compute(model: &Model) -> Result<Self, SolveError> {
        let available = model.cache_config.n_l3;
        let domain_ids: Vec<DomainId> = model.domains.keys().copied().collect();
        let required = domain_ids.len() as u32;
        if required > available {
            return Err(SolveError::UnsatL3 {
                domains: domain_ids,
                required,
                available,
            });
        }

        let mut by_domain: BTreeMap<DomainId, BTreeSet<u32>> = BTreeMap::new();
        let mut owner = BTreeMap::new();

        for (index, &domain) in domain_ids.iter().enumerate() {
            let id = index as u32 + 1;
            by_domain.entry(domain).or_default().insert(id);
            owner.insert(id, domain);
        }

        if !domain_ids.is_empty() {
            let mut order = domain_ids.clone();
            order.sort_by_key(|domain| (Reverse(model.domains[domain].len()), *domain));
            for (offset, id) in (required + 1..=available).enumerate() {
                let domain = order[offset % order.len()];
                by_domain.entry(domain).or_default().insert(id);
                owner.insert(id, domain);
            }
        }

        Ok(L3Allocation { by_domain, owner })
    }

    /// Colors allocated to a domain
    pub(crate) fn colors_of(&self, domain: DomainId) -> Option<&BTreeSet<u32>> {
        self.by_domain.get(&domain)
    }

    /// Smallest color allocated to a domain
    pub(crate) fn first_color_of(&self, domain: DomainId) -> u32 {
        self.by_domain
            .get(&domain)
            .and_then(|colors| colors.iter().next().copied())
            .expect("every modeled domain owns at least one L3 color")
    }

    /// Owning domain of a color id
    pub(crate) fn owner_of(&self, id: u32) -> Option<DomainId> {
        self.owner.get(&id).copied()
    }
}

/// Per-CPU disjoint L2 color sets per isolation domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct L2Allocation {
    by_cpu: BTreeMap<CpuId, BTreeMap<DomainId, BTreeSet<u32>>>,
    owner: BTreeMap<(CpuId, u32), DomainId>,
}

impl L2Allocation {
    /// Partition `1..=n_l2` among the domains present on each CPU.
    ///
    /// Id choice prefers ids the domain already holds on other CPUs, so a
    /// region spanning several CPUs usually finds one id valid on its whole
    /// span and its page colors form complete per-CPU families.
    pub(crate) fn compute(model: &Model) -> Result<Self, SolveError> {
        let available = model.cache_config.n_l2;
        let mut by_cpu: BTreeMap<CpuId, BTreeMap<DomainId, BTreeSet<u32>>> = BTreeMap::new();
        let mut owner: BTreeMap<(CpuId, u32), DomainId> = BTreeMap::new();
        let mut held: BTreeMap<DomainId, BTreeSet<u32>> = BTreeMap::new();

        for &cpu in &model.cpus {
            let domains = model.domains_on_cpu(cpu);
            if domains.is_empty() {
                by_cpu.insert(cpu, BTreeMap::new());
                continue;
            }
            let required = domains.len() as u32;
            if required > available {
                return Err(SolveError::UnsatL2 {
                    cpu,
                    domains: domains.into_iter().collect(),
                    required,
                    available,
                });
            }

            let mut taken: BTreeSet<u32> = BTreeSet::new();
            let mut alloc: BTreeMap<DomainId, BTreeSet<u32>> = BTreeMap::new();

            for &domain in &domains {
                let preferred = held
                    .get(&domain)
                    .into_iter()
                    .flatten()
                    .copied()
                    .find(|id| !taken.contains(id));
                let id = preferred
                    .or_else(|| (1..=available).find(|id| !taken.contains(id)))
                    .expect("a free L2 color exists while the domains fit on the CPU");
                taken.insert(id);
                alloc.entry(domain).or_default().insert(id);
                owner.insert((cpu, id), domain);
            }

            let leftovers: Vec<u32> = (1..=available).filter(|id| !taken.contains(id)).collect();
            if !leftovers.is_empty() {
                let mut order: Vec<DomainId> = domains.iter().copied().collect();
                order.sort_by_key(|domain| (Reverse(demand_on_cpu(model, *domain, cpu)), *domain));
                for (offset, id) in leftovers.into_iter().enumerate() {
                    let domain = order[offset % order.len()];
                    alloc.entry(domain).or_default().insert(id);
                    owner.insert((cpu, id), domain);
                }
            }

            for (domain, ids) in &alloc {
                held.entry(*domain).or_default().extend(ids.iter().copied());
            }
            by_cpu.insert(cpu, alloc);
        }

        Ok(L2Allocation { by_cpu, owner })
    }

    /// Colors allocated to a domain on one CPU
    pub(crate) fn colors_of(&self, cpu: CpuId, domain: DomainId) -> Option<&BTreeSet<u32>> {
        self.by_cpu.get(&cpu).and_then(|alloc| alloc.get(&domain))
    }

    /// Smallest color allocated to a domain on one CPU
    pub(crate) fn first_color_of(&self, cpu: CpuId, domain: DomainId) -> u32 {
        self.colors_of(cpu, domain)
            .and_then(|colors| colors.iter().next().copied())
            .expect("every domain present on a CPU owns at least one L2 color there")
    }

    /// Smallest color allocated to a domain on every CPU of `span`
    pub(crate) fn common_color(&self, span: &BTreeSet<CpuId>, domain: DomainId) -> Option<u32> {
        let mut cpus = span.iter();
        let first = self.colors_of(*cpus.next()?, domain)?;
        first
            .iter()
            .copied()
            .find(|id| span.iter().all(|&cpu| self.colors_of(cpu, domain).is_some_and(|ids| ids.contains(id))))
    }

    /// Owning domain of a color id on one CPU
    pub(crate) fn owner_of(&self, cpu: CpuId, id: u32) -> Option<DomainId> {
        self.owner.get(&(cpu, id)).copied()
    }
}

/// Number of member regions of `domain` pinned to `cpu`.
fn demand_on_cpu(model: &Model, domain: DomainId, cpu: CpuId) -> usize {
    model.domains[&domain]
        .iter()
        .filter(|region| model.regions[*region].cpus.contains(&cpu))
        .count()
}
