//! The input record consumed by [`solve`](crate::solve)
//!
//! An [`Input`] is the fully materialized, pre-parsed description of the
//! system: who executes, on which CPUs, who may talk to whom, and how many
//! colors each cache level offers. Front-ends (YAML/JSON loaders, policy
//! compilers) produce this value; the solver consumes it read-only.
//!
//! All collections are ordered (`BTreeSet`/`BTreeMap`), so two inputs built
//! from the same facts in any insertion order compare equal and solve to
//! identical assignments.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{CacheConfig, CpuId, DomainId, Name, RegionId};

/// Input records for one solve
///
/// The fields mirror the fact base of the workload description:
/// executor sets, channel pairs, CPU set, executor-to-CPU pinning, declared
/// isolation domains, and the region-to-domain relation. The relation is a
/// pair set rather than a map so a region accidentally mapped to two
/// domains is representable (and rejected during validation).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Input {
    pub kernels: BTreeSet<Name>,
    pub subjects: BTreeSet<Name>,
    pub channels: BTreeSet<(Name, Name)>,
    pub cpus: BTreeSet<CpuId>,
    pub ex_cpu: BTreeMap<Name, BTreeSet<CpuId>>,
    pub cache_isolation_domains: BTreeSet<DomainId>,
    pub mr_cache_isolation: BTreeSet<(RegionId, DomainId)>,
    pub cache_config: CacheConfig,
}

impl Input {
    /// Create an empty input with the given cache configuration
    pub fn new(cache_config: CacheConfig) -> Self {
        Input {
            kernels: BTreeSet::new(),
            subjects: BTreeSet::new(),
            channels: BTreeSet::new(),
            cpus: BTreeSet::new(),
            ex_cpu: BTreeMap::new(),
            cache_isolation_domains: BTreeSet::new(),
            mr_cache_isolation: BTreeSet::new(),
            cache_config,
        }
    }

    /// Add CPUs to the hardware description
    pub fn with_cpus(mut self, cpus: impl IntoIterator<Item = CpuId>) -> Self {
        self.cpus.extend(cpus);
        self
    }

    /// Declare a kernel pinned to the given CPUs
    pub fn with_kernel(mut self, name: impl Into<Name>, cpus: impl IntoIterator<Item = CpuId>) -> Self {
        let name = name.into();
        self.kernels.insert(name.clone());
        self.ex_cpu.entry(name).or_default().extend(cpus);
        self
    }

    /// Declare a subject pinned to the given CPUs
    pub fn with_subject(mut self, name: impl Into<Name>, cpus: impl IntoIterator<Item = CpuId>) -> Self {
        let name = name.into();
        self.subjects.insert(name.clone());
        self.ex_cpu.entry(name).or_default().extend(cpus);
        self
    }

    /// Declare a directed channel between two executors
    pub fn with_channel(mut self, from: impl Into<Name>, to: impl Into<Name>) -> Self {
        self.channels.insert((from.into(), to.into()));
        self
    }

    /// Place a memory region in a cache isolation domain
    ///
    /// The domain is declared implicitly if it was not declared before.
    pub fn with_isolation(mut self, region: RegionId, domain: DomainId) -> Self {
        self.cache_isolation_domains.insert(domain);
        self.mr_cache_isolation.insert((region, domain));
        self
    }
}
