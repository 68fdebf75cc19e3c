//! Snapshot builder: immutable point-in-time views of the registry.
//!
//! A [`SwarmSnapshot`] is a copy. Counts come from a full scan at build
//! time and the grid places agent `id` at row `(id-1)/W`, column
//! `(id-1)%W`.

use chrono::Utc;
use resilience_types::{AgentCell, AgentStatus, SwarmSnapshot};

use crate::error::SwarmError;
use crate::registry::AgentRegistry;

/// Width and height of the snapshot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    width: u32,
    rows: u32,
}

impl GridShape {
    /// Choose the grid for a swarm of `size` agents.
    ///
    /// With no explicit width, a perfect-square size gets a square grid
    /// (10x10 for 100) and anything else falls back to a single row.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Configuration`] if `size` is zero, or if an
    /// explicit width is zero or does not divide `size`.
    pub fn new(size: u32, width: Option<u32>) -> Result<Self, SwarmError> {
        if size == 0 {
            return Err(SwarmError::Configuration(
                "grid requires at least one agent".to_owned(),
            ));
        }
        let width = match width {
            Some(0) => {
                return Err(SwarmError::Configuration(
                    "grid_width must be greater than zero".to_owned(),
                ));
            }
            Some(w) if size % w != 0 => {
                return Err(SwarmError::Configuration(format!(
                    "grid_width {w} does not divide swarm size {size}"
                )));
            }
            Some(w) => w,
            None => exact_sqrt(size).unwrap_or(size),
        };
        Ok(Self {
            width,
            rows: size / width,
        })
    }

    /// Cells per row.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    pub const fn rows(&self) -> u32 {
        self.rows
    }
}

/// Integer square root of `n` when `n` is a perfect square.
fn exact_sqrt(n: u32) -> Option<u32> {
    let mut root: u32 = 0;
    while root.checked_mul(root).is_some_and(|sq| sq < n) {
        root = root.saturating_add(1);
    }
    (root.checked_mul(root) == Some(n)).then_some(root)
}

/// Build a snapshot of `registry` laid out on `grid`.
///
/// The caller must hold the registry read guard for the duration, which
/// is what keeps a record from being observed half-updated.
pub fn build_snapshot(registry: &AgentRegistry, grid: GridShape) -> SwarmSnapshot {
    let agents = registry.agents();
    let mut active_count: u32 = 0;
    let mut standby_count: u32 = 0;
    for agent in agents {
        match agent.status {
            AgentStatus::Active => active_count = active_count.saturating_add(1),
            AgentStatus::Standby => standby_count = standby_count.saturating_add(1),
            AgentStatus::Processing | AgentStatus::Error | AgentStatus::Offline => {}
        }
    }

    let grid = agents
        .chunks(grid.width as usize)
        .map(|row| row.iter().map(AgentCell::from).collect())
        .collect();

    SwarmSnapshot {
        total_agents: registry.size(),
        active_count,
        standby_count,
        timestamp: Utc::now(),
        grid,
    }
}
