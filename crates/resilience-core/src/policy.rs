//! Deployment selection policy.
//!
//! Maps a disaster type to the number `K` of agents to activate; the
//! selection is always the first `K` ids. The table is configuration data
//! (see [`DeploymentConfig`]) so new disaster types need no code change.

use std::collections::BTreeMap;

use resilience_types::AgentId;

use crate::config::DeploymentConfig;
use crate::error::SwarmError;

/// Validated disaster-type to agent-count mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    default_count: u32,
    by_type: BTreeMap<String, u32>,
}

impl SelectionPolicy {
    /// Build the policy and check every count against the swarm size.
    ///
    /// Keys are normalised the same way lookups are (trimmed, ASCII
    /// lowercase).
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Configuration`] if any count exceeds `size`
    /// or two keys normalise to the same disaster type.
    pub fn from_config(config: &DeploymentConfig, size: u32) -> Result<Self, SwarmError> {
        if config.default_count > size {
            return Err(SwarmError::Configuration(format!(
                "deployment.default_count {} exceeds swarm size {size}",
                config.default_count
            )));
        }
        let mut by_type = BTreeMap::new();
        for (disaster_type, count) in &config.policies {
            if *count > size {
                return Err(SwarmError::Configuration(format!(
                    "deployment policy {disaster_type} selects {count} agents but swarm size is {size}"
                )));
            }
            let key = normalize(disaster_type);
            if by_type.insert(key, *count).is_some() {
                return Err(SwarmError::Configuration(format!(
                    "deployment policy {disaster_type:?} duplicates another key after normalisation"
                )));
            }
        }
        Ok(Self {
            default_count: config.default_count,
            by_type,
        })
    }

    /// Number of agents selected for `disaster_type`.
    pub fn count_for(&self, disaster_type: &str) -> u32 {
        self.by_type
            .get(&normalize(disaster_type))
            .copied()
            .unwrap_or(self.default_count)
    }

    /// Whether `disaster_type` has its own entry (as opposed to the default).
    pub fn is_known(&self, disaster_type: &str) -> bool {
        self.by_type.contains_key(&normalize(disaster_type))
    }

    /// The ids selected for `disaster_type`, ascending.
    pub fn select(&self, disaster_type: &str) -> Vec<AgentId> {
        (1..=self.count_for(disaster_type)).map(AgentId).collect()
    }
}

fn normalize(disaster_type: &str) -> String {
    disaster_type.trim().to_ascii_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn policy() -> SelectionPolicy {
        SelectionPolicy::from_config(&DeploymentConfig::default(), 100).unwrap()
    }

    #[test]
    fn known_types_select_their_prefix() {
        let p = policy();
        assert_eq!(p.count_for("earthquake"), 50);
        assert_eq!(p.count_for("flood"), 60);
        assert_eq!(p.count_for("wildfire"), 70);

        let ids = p.select("earthquake");
        assert_eq!(ids.len(), 50);
        assert_eq!(ids.first(), Some(&AgentId(1)));
        assert_eq!(ids.last(), Some(&AgentId(50)));
    }

    #[test]
    fn unknown_type_falls_back_to_default() {
        let p = policy();
        assert!(!p.is_known("unknown-type"));
        assert_eq!(p.select("unknown-type").len(), 30);
        assert_eq!(p.select("").len(), 30);
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let p = policy();
        assert!(p.is_known(" Flood "));
        assert_eq!(p.count_for("WILDFIRE"), 70);
    }

    #[test]
    fn keys_that_collide_after_normalisation_are_rejected() {
        let mut config = DeploymentConfig::default();
        config.policies.insert("Flood".to_owned(), 10);
        assert!(matches!(
            SelectionPolicy::from_config(&config, 100),
            Err(SwarmError::Configuration(_))
        ));

        let mut config = DeploymentConfig::default();
        config.policies.insert(" tsunami ".to_owned(), 40);
        let p = SelectionPolicy::from_config(&config, 100).unwrap();
        assert_eq!(p.count_for("tsunami"), 40);
    }

    #[test]
    fn selection_is_deterministic() {
        let p = policy();
        assert_eq!(p.select("flood"), p.select("flood"));
    }

    #[test]
    fn counts_above_swarm_size_are_rejected() {
        let mut config = DeploymentConfig::default();
        config.policies.insert("meteor".to_owned(), 11);
        assert!(matches!(
            SelectionPolicy::from_config(&config, 10),
            Err(SwarmError::Configuration(_))
        ));

        let config = DeploymentConfig {
            default_count: 200,
            policies: BTreeMap::new(),
        };
        assert!(SelectionPolicy::from_config(&config, 100).is_err());
    }
}
