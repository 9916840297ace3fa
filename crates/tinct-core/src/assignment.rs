//! The immutable solve result
//!
//! An [`Assignment`] owns the final region-to-page-color mapping, the
//! per-level distinct-color counts (the optimizer's reported objective
//! values), and any non-fatal diagnostics gathered during validation.
//!
//! # Formats
//!
//! Two stable renderings are provided:
//! - **Text** ([`Assignment::render`]): one line per region, regions sorted
//!   by name, colors by `(l3, l2, l1, cpu)`. Used for test fixtures and
//!   operator-facing reports.
//! - **JSON** ([`Assignment::to_json`] / [`Assignment::from_json`]): a
//!   serialized mirror with the map flattened to entry pairs, suitable for
//!   downstream tooling.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use crate::model::{CpuId, PageColor, RegionId};
use crate::validate::Diagnostic;

/// The final mapping from memory regions to page-color sets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    map_pc: BTreeMap<RegionId, BTreeSet<PageColor>>,
    l1_count: u32,
    l2_count: u32,
    l3_count: u32,
    diagnostics: Vec<Diagnostic>,
}

impl Assignment {
    /// Freeze a solver map into an assignment, computing the per-level
    /// distinct-color counts from the map itself.
    pub(crate) fn from_map(map_pc: BTreeMap<RegionId, BTreeSet<PageColor>>, diagnostics: Vec<Diagnostic>) -> Self {
        let l3: BTreeSet<u32> = map_pc.values().flatten().map(|pc| pc.l3().id).collect();
        let l2: BTreeSet<(CpuId, u32)> = map_pc.values().flatten().map(|pc| (pc.l2().cpu, pc.l2().id)).collect();
        let l1: BTreeSet<(CpuId, u32)> = map_pc.values().flatten().map(|pc| (pc.l1().cpu, pc.l1().id)).collect();

        Assignment {
            map_pc,
            l1_count: l1.len() as u32,
            l2_count: l2.len() as u32,
            l3_count: l3.len() as u32,
            diagnostics,
        }
    }

    /// The full mapping
    pub fn map_pc(&self) -> &BTreeMap<RegionId, BTreeSet<PageColor>> {
        &self.map_pc
    }

    /// Page colors of one region
    pub fn page_colors(&self, region: &RegionId) -> Option<&BTreeSet<PageColor>> {
        self.map_pc.get(region)
    }

    /// Number of distinct L1 `(id, cpu)` colors in use
    pub fn l1_count(&self) -> u32 {
        self.l1_count
    }

    /// Number of distinct L2 `(id, cpu)` colors in use
    pub fn l2_count(&self) -> u32 {
        self.l2_count
    }

    /// Number of distinct L3 colors in use
    pub fn l3_count(&self) -> u32 {
        self.l3_count
    }

    /// Non-fatal findings from validation
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Stable textual rendering.
    ///
    /// One line per region: `name -> {(l1=a@p, l2=b@p, l3=c), ...}`.
    /// Regions are sorted by display name, colors by `(l3, l2, l1, cpu)`.
    pub fn render(&self) -> String {
        let mut lines: Vec<(String, &BTreeSet<PageColor>)> = self
            .map_pc
            .iter()
            .map(|(region, colors)| (region.to_string(), colors))
            .collect();
        lines.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::new();
        for (name, colors) in lines {
            let _ = write!(out, "{name} -> {{");
            for (index, pc) in colors.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{pc}");
            }
            out.push_str("}\n");
        }
        out
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&SerializedAssignment::from(self))
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let serialized: SerializedAssignment = serde_json::from_str(json)?;
        Ok(serialized.into())
    }
}

/// Serializable mirror of [`Assignment`]
///
/// The mapping is flattened to entry pairs because JSON object keys must be
/// strings and [`RegionId`] is a structured value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SerializedAssignment {
    pub regions: Vec<SerializedRegionColors>,
    pub l1_count: u32,
    pub l2_count: u32,
    pub l3_count: u32,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// One region's entry in [`SerializedAssignment`]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SerializedRegionColors {
    pub region: RegionId,
    pub colors: Vec<PageColor>,
}

impl From<&Assignment> for SerializedAssignment {
    fn from(assignment: &Assignment) -> Self {
        SerializedAssignment {
            regions: assignment
                .map_pc
                .iter()
                .map(|(region, colors)| SerializedRegionColors {
                    region: region.clone(),
                    colors: colors.iter().copied().collect(),
                })
                .collect(),
            l1_count: assignment.l1_count,
            l2_count: assignment.l2_count,
            l3_count: assignment.l3_count,
            diagnostics: assignment.diagnostics.clone(),
        }
    }
}

impl From<SerializedAssignment> for Assignment {
    fn from(serialized: SerializedAssignment) -> Self {
        let map_pc = serialized
            .regions
            .into_iter()
            .map(|entry| (entry.region, entry.colors.into_iter().collect()))
            .collect();
        // Counts are recomputed from the map, not trusted from the wire.
        Assignment::from_map(map_pc, serialized.diagnostics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Assignment {
        let mut map = BTreeMap::new();
        map.insert(
            RegionId::executor("b"),
            BTreeSet::from([
                PageColor::new(1, 2, 3, CpuId::new(0)),
                PageColor::new(2, 1, 1, CpuId::new(0)),
            ]),
        );
        map.insert(
            RegionId::executor("a"),
            BTreeSet::from([PageColor::new(1, 1, 2, CpuId::new(1))]),
        );
        Assignment::from_map(map, Vec::new())
    }

    #[test]
    fn test_counts_are_distinct_per_level() {
        let assignment = sample();
        assert_eq!(assignment.l3_count(), 3); // ids 1, 2, 3
        assert_eq!(assignment.l2_count(), 3); // (1@0), (2@0), (1@1)
        assert_eq!(assignment.l1_count(), 3); // (1@0), (2@0), (1@1)
    }

    #[test]
    fn test_render_is_sorted_and_stable() {
        let rendered = sample().render();
        assert_eq!(
            rendered,
            "a -> {(l1=1@1, l2=1@1, l3=2)}\n\
             b -> {(l1=2@0, l2=1@0, l3=1), (l1=1@0, l2=2@0, l3=3)}\n"
        );
    }

    #[test]
    fn test_json_round_trip() {
        let assignment = sample();
        let json = assignment.to_json().unwrap();
        let restored = Assignment::from_json(&json).unwrap();
        assert_eq!(assignment, restored);
    }

    #[test]
    fn test_empty_assignment() {
        let assignment = Assignment::from_map(BTreeMap::new(), Vec::new());
        assert_eq!(assignment.l1_count(), 0);
        assert_eq!(assignment.l2_count(), 0);
        assert_eq!(assignment.l3_count(), 0);
        assert_eq!(assignment.render(), "");
    }
}
