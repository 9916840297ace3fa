//! Core domain types for the page-coloring model
//!
//! This module defines the entities the solver operates on:
//! - Identifiers: executor names, CPU ids, cache isolation domain ids
//! - Memory region identities (executor-backed or channel-backed)
//! - Cache colors per level and the combined page color
//! - The cache geometry summary consumed by the solver
//!
//! A *color* is an equivalence class of physical addresses that map to the
//! same cache sets at one level; two addresses with different colors never
//! conflict in that cache. A *page color* binds one color per level, with
//! the L1 and L2 components pinned to the same CPU because those caches are
//! private per core.

use std::fmt;

// ================================================================================================
// Identifiers
// ================================================================================================

/// Name of an executor (kernel or subject).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct Name(String);

impl Name {
    /// Create a new name
    pub fn new(name: impl Into<String>) -> Self {
        Name(name.into())
    }

    /// Borrow the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Name {
    fn from(name: &str) -> Self {
        Name(name.to_string())
    }
}

impl From<String> for Name {
    fn from(name: String) -> Self {
        Name(name)
    }
}

/// CPU core identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct CpuId(pub u32);

impl CpuId {
    /// Create a new CPU id
    pub const fn new(id: u32) -> Self {
        CpuId(id)
    }

    /// Get the numeric id
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CpuId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cache isolation domain identifier
///
/// An isolation domain is an operator-supplied equivalence class of memory
/// regions that are permitted to share cache. Regions of different domains
/// must not share cache colors at the enforceable levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct DomainId(pub u32);

impl DomainId {
    /// Create a new domain id
    pub const fn new(id: u32) -> Self {
        DomainId(id)
    }

    /// Get the numeric id
    pub const fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ================================================================================================
// Memory regions
// ================================================================================================

/// Identity of a memory region
///
/// Executor-backed regions are identified by the executor's name; a channel
/// `(from, to)` induces a synthetic region identified by the pair. The two
/// namespaces never collide: `c(from,to)` is distinct from any executor name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum RegionId {
    /// The image of a kernel or subject
    Executor(Name),
    /// The shared buffer backing a directed channel
    Channel(Name, Name),
}

impl RegionId {
    /// Region backed by an executor's own image
    pub fn executor(name: impl Into<Name>) -> Self {
        RegionId::Executor(name.into())
    }

    /// Region backed by the channel `(from, to)`
    pub fn channel(from: impl Into<Name>, to: impl Into<Name>) -> Self {
        RegionId::Channel(from.into(), to.into())
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionId::Executor(name) => write!(f, "{name}"),
            RegionId::Channel(from, to) => write!(f, "c({from},{to})"),
        }
    }
}

/// Kind tag of a memory region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum RegionKind {
    Kernel,
    Subject,
    Channel,
}

// ================================================================================================
// Cache colors
// ================================================================================================

/// An L1 color. L1 caches are private per CPU, so the color is CPU-bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct L1Color {
    pub id: u32,
    pub cpu: CpuId,
}

impl fmt::Display for L1Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l1={}@{}", self.id, self.cpu)
    }
}

/// An L2 color. L2 caches are private per CPU, so the color is CPU-bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct L2Color {
    pub id: u32,
    pub cpu: CpuId,
}

impl fmt::Display for L2Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l2={}@{}", self.id, self.cpu)
    }
}

/// An L3 color. The last-level cache is shared across all CPUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct L3Color {
    pub id: u32,
}

impl fmt::Display for L3Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l3={}", self.id)
    }
}

/// A page color: one color per cache level, L1/L2 bound to the same CPU
///
/// A physical frame with this page color occupies the `l1`/`l2` sets on the
/// named CPU and the `l3` sets in the shared last-level cache. The
/// constructor takes a single [`CpuId`], so the L1/L2 CPU agreement holds
/// by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PageColor {
    l1: L1Color,
    l2: L2Color,
    l3: L3Color,
}

impl PageColor {
    /// Create a page color binding the given per-level ids on one CPU
    pub const fn new(l1_id: u32, l2_id: u32, l3_id: u32, cpu: CpuId) -> Self {
        PageColor {
            l1: L1Color { id: l1_id, cpu },
            l2: L2Color { id: l2_id, cpu },
            l3: L3Color { id: l3_id },
        }
    }

    /// The L1 component
    pub const fn l1(&self) -> L1Color {
        self.l1
    }

    /// The L2 component
    pub const fn l2(&self) -> L2Color {
        self.l2
    }

    /// The L3 component
    pub const fn l3(&self) -> L3Color {
        self.l3
    }

    /// The CPU the L1/L2 components are bound to
    pub const fn cpu(&self) -> CpuId {
        self.l1.cpu
    }

    /// Sort key `(l3, l2, l1, cpu)`, the rendering order
    fn sort_key(&self) -> (u32, u32, u32, u32) {
        (self.l3.id, self.l2.id, self.l1.id, self.l1.cpu.id())
    }
}

impl Ord for PageColor {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for PageColor {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PageColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.l1, self.l2, self.l3)
    }
}

// ================================================================================================
// Cache geometry
// ================================================================================================

/// Number of colors available at each cache level
///
/// The counts are derived from cache geometry by the caller (total
/// capacity, associativity, line size, and page size determine how many
/// page-granular partition classes a cache offers). The solver treats them
/// as opaque partition sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct CacheConfig {
    pub n_l1: u32,
    pub n_l2: u32,
    pub n_l3: u32,
}

impl CacheConfig {
    /// Create a new cache configuration
    pub const fn new(n_l1: u32, n_l2: u32, n_l3: u32) -> Self {
        CacheConfig { n_l1, n_l2, n_l3 }
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l1={} l2={} l3={}", self.n_l1, self.n_l2, self.n_l3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_id_display() {
        assert_eq!(RegionId::executor("crypto").to_string(), "crypto");
        assert_eq!(RegionId::channel("a", "b").to_string(), "c(a,b)");
    }

    #[test]
    fn test_page_color_cpu_agreement() {
        let pc = PageColor::new(1, 2, 3, CpuId::new(7));
        assert_eq!(pc.l1().cpu, pc.l2().cpu);
        assert_eq!(pc.cpu(), CpuId::new(7));
    }

    #[test]
    fn test_page_color_display() {
        let pc = PageColor::new(1, 2, 3, CpuId::new(0));
        assert_eq!(pc.to_string(), "(l1=1@0, l2=2@0, l3=3)");
    }

    #[test]
    fn test_page_color_ordering_is_l3_major() {
        // (c, b, a, p) ordering: L3 dominates, then L2, L1, CPU.
        let low = PageColor::new(9, 9, 1, CpuId::new(9));
        let high = PageColor::new(1, 1, 2, CpuId::new(0));
        assert!(low < high);

        let a = PageColor::new(2, 1, 1, CpuId::new(0));
        let b = PageColor::new(1, 2, 1, CpuId::new(0));
        assert!(a < b);
    }

    #[test]
    fn test_channel_region_distinct_from_executor() {
        let exec = RegionId::executor("c(a,b)");
        let chan = RegionId::channel("a", "b");
        assert_ne!(exec, chan);
    }
}
