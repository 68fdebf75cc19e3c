//! Role partition: the fixed mapping from agent id to [`AgentType`].
//!
//! The partition is an ordered list of contiguous, non-overlapping id
//! ranges that covers `[1, N]` exactly. It is built once from
//! configuration and never changes, so `type_of` is a pure lookup.

use resilience_types::{AgentId, AgentType};

use crate::config::RoleAllocation;
use crate::error::SwarmError;

/// A contiguous, inclusive run of ids sharing one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRange {
    /// The role for every id in the range.
    pub role: AgentType,
    /// First id (inclusive).
    pub first: AgentId,
    /// Last id (inclusive).
    pub last: AgentId,
}

impl RoleRange {
    /// Whether `id` falls inside this range.
    pub fn contains(&self, id: AgentId) -> bool {
        self.first <= id && id <= self.last
    }
}

/// Validated id-to-role partition of `[1, N]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePartition {
    ranges: Vec<RoleRange>,
    size: u32,
}

impl RolePartition {
    /// Build a partition from an ordered role allocation.
    ///
    /// Ids are assigned contiguously starting at 1 in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Configuration`] if `size` is zero, any count
    /// is zero, or the counts do not sum to exactly `size`.
    pub fn from_allocations(allocations: &[RoleAllocation], size: u32) -> Result<Self, SwarmError> {
        if size == 0 {
            return Err(SwarmError::Configuration(
                "swarm size must be greater than zero".to_owned(),
            ));
        }

        let mut ranges = Vec::with_capacity(allocations.len());
        let mut next: u32 = 1;
        for alloc in allocations {
            if alloc.count == 0 {
                return Err(SwarmError::Configuration(format!(
                    "role {} has a zero count",
                    alloc.role
                )));
            }
            let last = next
                .checked_add(alloc.count.saturating_sub(1))
                .filter(|last| *last <= size)
                .ok_or_else(|| {
                    SwarmError::Configuration(format!(
                        "role allocation exceeds swarm size {size} at role {}",
                        alloc.role
                    ))
                })?;
            ranges.push(RoleRange {
                role: alloc.role,
                first: AgentId(next),
                last: AgentId(last),
            });
            next = last.saturating_add(1);
        }

        let covered = next.saturating_sub(1);
        if covered != size {
            return Err(SwarmError::Configuration(format!(
                "role allocation covers {covered} ids but swarm size is {size}"
            )));
        }

        Ok(Self { ranges, size })
    }

    /// Number of ids in the partition (`N`).
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// The ranges in ascending id order.
    pub fn ranges(&self) -> &[RoleRange] {
        &self.ranges
    }

    /// Role of the agent with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidId`] if `id` is outside `[1, N]`.
    pub fn type_of(&self, id: AgentId) -> Result<AgentType, SwarmError> {
        self.ranges
            .iter()
            .find(|range| range.contains(id))
            .map(|range| range.role)
            .ok_or(SwarmError::InvalidId { id, max: self.size })
    }
}
