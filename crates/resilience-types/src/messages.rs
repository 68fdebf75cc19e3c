//! Messages exchanged over the streaming channel.
//!
//! [`ServerMessage`] is the typed envelope pushed to subscribers and
//! [`ClientCommand`] is what a subscriber may send back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::AgentAction;
use crate::ids::AgentId;
use crate::structs::{Location, StatusBatch, SwarmSnapshot};

/// Outbound envelope, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Full snapshot sent once when a subscriber joins.
    SwarmStatus {
        /// The snapshot.
        data: SwarmSnapshot,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// Recurring grid and stats pushed every scheduler tick.
    AgentStatusBatch {
        /// Grid and aggregate counts.
        data: StatusBatch,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// Human-readable notice broadcast after a channel command.
    System {
        /// Notice text.
        message: String,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
    /// Rejection of a command, sent only to the subscriber that issued it.
    Error {
        /// Why the command was rejected.
        message: String,
        /// Send time.
        timestamp: DateTime<Utc>,
    },
}

impl ServerMessage {
    /// Initial status message for a new subscriber.
    pub fn swarm_status(snapshot: SwarmSnapshot) -> Self {
        Self::SwarmStatus {
            data: snapshot,
            timestamp: Utc::now(),
        }
    }

    /// Recurring batch built from a fresh snapshot.
    pub fn status_batch(snapshot: SwarmSnapshot) -> Self {
        let timestamp = snapshot.timestamp;
        Self::AgentStatusBatch {
            data: StatusBatch::from(snapshot),
            timestamp,
        }
    }

    /// System notice.
    pub fn system(message: impl Into<String>) -> Self {
        Self::System {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Command rejection.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// The wire tag of this message.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SwarmStatus { .. } => "swarm_status",
            Self::AgentStatusBatch { .. } => "agent_status_batch",
            Self::System { .. } => "system",
            Self::Error { .. } => "error",
        }
    }
}

/// Inbound command, tagged by `action`.
///
/// An `action` outside [`ClientCommand::ACTIONS`] is unrecognized and
/// ignored by the channel handler; a recognized action whose fields fail
/// to parse is rejected back to the sender.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Initialise (or reset) the whole swarm.
    ActivateSwarm,
    /// Deploy agents for a disaster.
    DeployAgents {
        /// Disaster type key.
        #[serde(alias = "disasterType")]
        disaster_type: String,
        /// Disaster location.
        location: Location,
    },
    /// Drive one agent through a lifecycle transition.
    AgentAction {
        /// Target agent.
        #[serde(alias = "agentId")]
        agent_id: AgentId,
        /// Requested transition.
        #[serde(alias = "actionType")]
        action_type: AgentAction,
    },
}

impl ClientCommand {
    /// Every `action` tag this enum accepts.
    pub const ACTIONS: [&'static str; 3] = ["activate_swarm", "deploy_agents", "agent_action"];
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_tagged_by_type() {
        let json = serde_json::to_value(ServerMessage::system("hello")).unwrap();
        assert_eq!(json["type"], "system");
        assert_eq!(json["message"], "hello");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn parses_activate_swarm() {
        let cmd: Result<ClientCommand, _> = serde_json::from_str(r#"{"action":"activate_swarm"}"#);
        assert!(matches!(cmd, Ok(ClientCommand::ActivateSwarm)));
    }

    #[test]
    fn parses_deploy_agents_with_either_key_style() {
        let snake = r#"{"action":"deploy_agents","disaster_type":"flood","location":{"lat":0.0,"lng":0.0}}"#;
        let camel = r#"{"action":"deploy_agents","disasterType":"flood","location":{"lat":0.0,"lng":0.0}}"#;
        for raw in [snake, camel] {
            let cmd: Result<ClientCommand, _> = serde_json::from_str(raw);
            assert!(
                matches!(cmd, Ok(ClientCommand::DeployAgents { ref disaster_type, .. }) if disaster_type == "flood")
            );
        }
    }

    #[test]
    fn unknown_action_does_not_parse() {
        let cmd: Result<ClientCommand, _> = serde_json::from_str(r#"{"action":"self_destruct"}"#);
        assert!(cmd.is_err());
    }

    #[test]
    fn actions_list_matches_serde_tags() {
        let commands = [
            ClientCommand::ActivateSwarm,
            ClientCommand::DeployAgents {
                disaster_type: "flood".to_owned(),
                location: Location { lat: 0.0, lng: 0.0 },
            },
            ClientCommand::AgentAction {
                agent_id: AgentId(1),
                action_type: AgentAction::Activate,
            },
        ];
        for (command, expected) in commands.iter().zip(ClientCommand::ACTIONS) {
            let json = serde_json::to_value(command).unwrap();
            assert_eq!(json["action"], expected);
        }
    }
}
