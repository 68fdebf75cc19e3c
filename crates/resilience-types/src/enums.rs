//! Enumeration types for the ResilienceGrid swarm.
//!
//! Wire names are `snake_case` and match what the dashboard expects.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Agent roles
// ---------------------------------------------------------------------------

/// The specialised role a swarm member plays.
///
/// A role is never set directly: it is derived from the agent id through
/// the configured role partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    // --- Intake ---
    /// Social media monitoring.
    Social,
    /// News wire and article monitoring.
    News,
    /// Satellite imagery analysis.
    Satellite,
    /// Ground sensor (`IoT`) network monitoring.
    #[serde(rename = "iot")]
    Sensor,

    // --- Analysis ---
    /// Triage and severity classification of incoming reports.
    Classifier,
    /// Relief resource inventory tracking.
    Resource,
    /// Route and supply-chain optimisation.
    Logistics,
    /// Impact forecasting.
    Predictor,

    // --- Output ---
    /// Live dashboard updates.
    Dashboard,
    /// Situation report generation.
    Reporter,
    /// Emergency alert dispatch.
    Alert,
}

impl AgentType {
    /// Every role in canonical partition order.
    pub const ALL: [Self; 11] = [
        Self::Social,
        Self::News,
        Self::Satellite,
        Self::Sensor,
        Self::Classifier,
        Self::Resource,
        Self::Logistics,
        Self::Predictor,
        Self::Dashboard,
        Self::Reporter,
        Self::Alert,
    ];

    /// The wire name of this role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Social => "social",
            Self::News => "news",
            Self::Satellite => "satellite",
            Self::Sensor => "iot",
            Self::Classifier => "classifier",
            Self::Resource => "resource",
            Self::Logistics => "logistics",
            Self::Predictor => "predictor",
            Self::Dashboard => "dashboard",
            Self::Reporter => "reporter",
            Self::Alert => "alert",
        }
    }
}

impl core::fmt::Display for AgentType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Agent status
// ---------------------------------------------------------------------------

/// Operational status of a single agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Ready but not deployed.
    Standby,
    /// Deployed to a disaster.
    Active,
    /// Working on a dispatched task.
    Processing,
    /// Last task failed.
    Error,
    /// Not running (swarm not yet initialised).
    Offline,
}

impl AgentStatus {
    /// Whether an agent in this status can accept work.
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Standby | Self::Active)
    }
}

impl core::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let s = match self {
            Self::Standby => "standby",
            Self::Active => "active",
            Self::Processing => "processing",
            Self::Error => "error",
            Self::Offline => "offline",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Control
// ---------------------------------------------------------------------------

/// A lifecycle transition requested for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    /// Move the agent to `active`.
    Activate,
    /// Return the agent to `standby` and drop its current task.
    Deactivate,
}

/// Coarse mode of the whole swarm, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum SwarmMode {
    /// The swarm has not been initialised.
    Offline,
    /// Initialised with no agent deployed.
    Standby,
    /// At least one agent is active or processing.
    Active,
}
