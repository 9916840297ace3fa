//! Input validation and memory-region derivation
//!
//! Turns an [`Input`] record into a validated [`Model`]: every executor
//! becomes a region carrying its own CPU set, every channel becomes a
//! region whose CPU set is the union of its endpoints' sets (a channel is
//! shared reader/writer memory, so both sides touch it), and every region
//! is resolved to exactly one cache isolation domain.
//!
//! Checks are ordered so the first structural defect in canonical order is
//! reported: duplicate names, executor CPU totality, CPU coverage,
//! isolation totality and functionality, then empty declared domains.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::warn;

use crate::error::ValidationError;
use crate::input::Input;
use crate::model::{CacheConfig, CpuId, DomainId, Name, RegionId, RegionKind};

/// A validated memory region with its derived CPU set and resolved domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub id: RegionId,
    pub kind: RegionKind,
    pub cpus: BTreeSet<CpuId>,
    pub domain: DomainId,
}

/// The validated system model handed to the solver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    /// All memory regions, keyed canonically
    pub regions: BTreeMap<RegionId, Region>,
    /// The CPU universe
    pub cpus: BTreeSet<CpuId>,
    /// Isolation domains and their member regions, members in canonical order
    pub domains: BTreeMap<DomainId, Vec<RegionId>>,
    /// Per-level color counts
    pub cache_config: CacheConfig,
}

impl Model {
    /// True when the system has neither regions nor CPUs
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty() && self.cpus.is_empty()
    }

    /// Domains with at least one member region pinned to `cpu`
    pub fn domains_on_cpu(&self, cpu: CpuId) -> BTreeSet<DomainId> {
        self.regions
            .values()
            .filter(|region| region.cpus.contains(&cpu))
            .map(|region| region.domain)
            .collect()
    }
}

/// Non-fatal findings surfaced alongside a successful validation
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Diagnostic {
    /// A channel is isolated differently from its endpoints' shared domain.
    ///
    /// When both endpoints of a channel live in one isolation domain, the
    /// channel's buffer could share that domain and save colors; the
    /// explicit assignment is honored regardless.
    ChannelDomainMismatch {
        channel: RegionId,
        channel_domain: DomainId,
        endpoint_domain: DomainId,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ChannelDomainMismatch {
                channel,
                channel_domain,
                endpoint_domain,
            } => write!(
                f,
                "channel {channel} is in isolation domain {channel_domain} while both endpoints share domain {endpoint_domain}"
            ),
        }
    }
}

/// Validate the input and derive the region model.
///
/// Returns the model plus any non-fatal diagnostics. Diagnostics are also
/// logged at `warn` level as they are found.
pub fn validate(input: &Input) -> std::result::Result<(Model, Vec<Diagnostic>), ValidationError> {
    let no_regions = input.kernels.is_empty() && input.subjects.is_empty() && input.channels.is_empty();
    if no_regions && input.cpus.is_empty() {
        // Degenerate system: nothing to color, nothing to validate.
        return Ok((
            Model {
                regions: BTreeMap::new(),
                cpus: BTreeSet::new(),
                domains: BTreeMap::new(),
                cache_config: input.cache_config,
            },
            Vec::new(),
        ));
    }

    let config = input.cache_config;
    if config.n_l1 == 0 || config.n_l2 == 0 || config.n_l3 == 0 {
        return Err(ValidationError::InvalidCacheConfig(config));
    }

    if let Some(name) = input.kernels.intersection(&input.subjects).next() {
        return Err(ValidationError::DuplicateEntityId(name.clone()));
    }

    // Executor CPU totality, in canonical name order. A pin referencing a
    // CPU outside the declared set cannot place anything on this hardware,
    // so only the intersection counts.
    let executors: BTreeSet<&Name> = input.kernels.iter().chain(input.subjects.iter()).collect();
    let mut executor_cpus: BTreeMap<&Name, BTreeSet<CpuId>> = BTreeMap::new();
    for &name in &executors {
        let pinned: BTreeSet<CpuId> = input
            .ex_cpu
            .get(name)
            .map(|cpus| cpus.intersection(&input.cpus).copied().collect())
            .unwrap_or_default();
        if pinned.is_empty() {
            return Err(ValidationError::MissingExecutorCpu(name.clone()));
        }
        executor_cpus.insert(name, pinned);
    }

    // Every CPU must carry at least one executor.
    for &cpu in &input.cpus {
        let covered = executor_cpus.values().any(|cpus| cpus.contains(&cpu));
        if !covered {
            return Err(ValidationError::UnusedCpu(cpu));
        }
    }

    let regions = derive_regions(input, &executor_cpus)?;

    let mut domains: BTreeMap<DomainId, Vec<RegionId>> = BTreeMap::new();
    for region in regions.values() {
        domains.entry(region.domain).or_default().push(region.id.clone());
    }

    // Declared domains must not be empty; referenced-but-undeclared domains
    // are accepted as implicit declarations.
    for &domain in &input.cache_isolation_domains {
        if !domains.contains_key(&domain) {
            return Err(ValidationError::EmptyIsolationDomain(domain));
        }
    }

    let diagnostics = channel_domain_diagnostics(input, &regions);
    for diagnostic in &diagnostics {
        warn!(%diagnostic, "isolation diagnostic");
    }

    Ok((
        Model {
            regions,
            cpus: input.cpus.clone(),
            domains,
            cache_config: config,
        },
        diagnostics,
    ))
}

/// Derive the full region set with CPU sets and resolved domains.
fn derive_regions(
    input: &Input,
    executor_cpus: &BTreeMap<&Name, BTreeSet<CpuId>>,
) -> std::result::Result<BTreeMap<RegionId, Region>, ValidationError> {
    let mut regions = BTreeMap::new();

    for name in &input.kernels {
        let id = RegionId::Executor(name.clone());
        let domain = resolve_domain(input, &id)?;
        regions.insert(
            id.clone(),
            Region {
                id,
                kind: RegionKind::Kernel,
                cpus: executor_cpus[name].clone(),
                domain,
            },
        );
    }

    for name in &input.subjects {
        let id = RegionId::Executor(name.clone());
        let domain = resolve_domain(input, &id)?;
        regions.insert(
            id.clone(),
            Region {
                id,
                kind: RegionKind::Subject,
                cpus: executor_cpus[name].clone(),
                domain,
            },
        );
    }

    for (from, to) in &input.channels {
        let id = RegionId::Channel(from.clone(), to.clone());
        let domain = resolve_domain(input, &id)?;
        // Union rule: the channel buffer is visible to both endpoints.
        let mut cpus = endpoint_cpus(executor_cpus, from)?;
        cpus.extend(endpoint_cpus(executor_cpus, to)?);
        regions.insert(
            id.clone(),
            Region {
                id,
                kind: RegionKind::Channel,
                cpus,
                domain,
            },
        );
    }

    Ok(regions)
}

/// CPU set of a channel endpoint; an endpoint that is not a pinned executor
/// cannot contribute CPUs and is reported as missing.
fn endpoint_cpus(
    executor_cpus: &BTreeMap<&Name, BTreeSet<CpuId>>,
    endpoint: &Name,
) -> std::result::Result<BTreeSet<CpuId>, ValidationError> {
    match executor_cpus.get(endpoint) {
        Some(cpus) => Ok(cpus.clone()),
        None => Err(ValidationError::MissingExecutorCpu(endpoint.clone())),
    }
}

/// Resolve the isolation domain of one region: exactly one entry required.
fn resolve_domain(input: &Input, id: &RegionId) -> std::result::Result<DomainId, ValidationError> {
    let found: Vec<DomainId> = input
        .mr_cache_isolation
        .iter()
        .filter(|(region, _)| region == id)
        .map(|&(_, domain)| domain)
        .collect();

    match found.as_slice() {
        [] => Err(ValidationError::MissingIsolationDomain(id.clone())),
        [domain] => Ok(*domain),
        _ => Err(ValidationError::NonFunctionalIsolation {
            region: id.clone(),
            domains: found,
        }),
    }
}

/// Detect channels whose explicit domain differs from the domain both
/// endpoints share.
fn channel_domain_diagnostics(input: &Input, regions: &BTreeMap<RegionId, Region>) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    for (from, to) in &input.channels {
        let channel_id = RegionId::Channel(from.clone(), to.clone());
        let from_id = RegionId::Executor(from.clone());
        let to_id = RegionId::Executor(to.clone());
        let (Some(channel), Some(from_region), Some(to_region)) =
            (regions.get(&channel_id), regions.get(&from_id), regions.get(&to_id))
        else {
            continue;
        };
        if from_region.domain == to_region.domain && channel.domain != from_region.domain {
            diagnostics.push(Diagnostic::ChannelDomainMismatch {
                channel: channel_id,
                channel_domain: channel.domain,
                endpoint_domain: from_region.domain,
            });
        }
    }
    diagnostics
}
