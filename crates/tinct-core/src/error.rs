//! Error types for the page-coloring solver

use crate::model::{CacheConfig, CpuId, DomainId, Name, RegionId};

/// Result type for solver operations
pub type Result<T> = std::result::Result<T, SolveError>;

/// Rejections produced by the input validator
///
/// Each variant corresponds to one structural defect in the workload
/// description and names the offending element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// An executor has no CPU assignment (or an empty one)
    #[error("executor {0} has no CPU assignment")]
    MissingExecutorCpu(Name),

    /// A declared CPU has no executor pinned to it
    #[error("CPU {0} has no executor pinned to it")]
    UnusedCpu(CpuId),

    /// A derived memory region is missing from the isolation relation
    #[error("memory region {0} has no cache isolation domain")]
    MissingIsolationDomain(RegionId),

    /// A memory region is mapped to more than one isolation domain
    #[error("memory region {region} is mapped to multiple isolation domains: {domains:?}")]
    NonFunctionalIsolation { region: RegionId, domains: Vec<DomainId> },

    /// A declared isolation domain has no member region
    #[error("cache isolation domain {0} has no member region")]
    EmptyIsolationDomain(DomainId),

    /// A name is used for more than one entity
    #[error("name {0} is used for more than one entity")]
    DuplicateEntityId(Name),

    /// A cache level offers zero colors
    #[error("cache configuration has a level with zero colors ({0})")]
    InvalidCacheConfig(CacheConfig),
}

/// Errors that can occur during a solve
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolveError {
    /// The input records were structurally invalid
    #[error("input validation failed: {0}")]
    InputValidation(#[from] ValidationError),

    /// More mutually isolated domains than L3 colors
    #[error("isolation domains {domains:?} demand {required} L3 colors but only {available} exist")]
    UnsatL3 {
        domains: Vec<DomainId>,
        required: u32,
        available: u32,
    },

    /// On one CPU, more isolation domains than L2 colors
    #[error("CPU {cpu} hosts isolation domains {domains:?} demanding {required} L2 colors but only {available} exist")]
    UnsatL2 {
        cpu: CpuId,
        domains: Vec<DomainId>,
        required: u32,
        available: u32,
    },

    /// Cooperative cancellation was observed
    #[error("solve was cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_carry_context() {
        let err = SolveError::UnsatL2 {
            cpu: CpuId::new(3),
            domains: vec![DomainId::new(1), DomainId::new(2)],
            required: 2,
            available: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("CPU 3"), "message should name the CPU: {msg}");
        assert!(msg.contains("only 1 exist"), "message should name the budget: {msg}");
    }

    #[test]
    fn test_validation_error_converts() {
        let err: SolveError = ValidationError::UnusedCpu(CpuId::new(2)).into();
        assert!(matches!(
            err,
            SolveError::InputValidation(ValidationError::UnusedCpu(_))
        ));
    }
}
