//! Capability table: what each agent role does with a task.
//!
//! Roles are data, not types. Every [`AgentType`] has one static
//! [`Capability`] entry; processing a task is an opaque call through that
//! entry. The real per-role work (scraping feeds, running models,
//! dispatching alerts) plugs in behind [`Capability::process`].

use resilience_types::{AgentId, AgentType, TaskReport};

/// Static description of one role's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capability {
    /// The role this entry describes.
    pub role: AgentType,
    /// One-line description of the role.
    pub summary: &'static str,
    /// Result label reported after a task.
    pub result: &'static str,
    /// Name of the role's work counter.
    pub metric: &'static str,
}

impl Capability {
    /// Process one task for `agent_id` and report the outcome.
    ///
    /// The task body is opaque here; the counter reports zero units of
    /// work until a concrete integration is attached.
    pub fn process(&self, agent_id: AgentId, _task: &serde_json::Value) -> TaskReport {
        TaskReport {
            agent_id,
            agent_type: self.role,
            summary: self.summary.to_owned(),
            result: self.result.to_owned(),
            metric: self.metric.to_owned(),
            processed: 0,
            tasks_completed: 0,
        }
    }
}

const SOCIAL: Capability = Capability {
    role: AgentType::Social,
    summary: "Monitors social media platforms for disaster signals",
    result: "monitoring_active",
    metric: "posts_analyzed",
};

const NEWS: Capability = Capability {
    role: AgentType::News,
    summary: "Monitors news outlets for disaster coverage",
    result: "monitoring_active",
    metric: "articles_analyzed",
};

const SATELLITE: Capability = Capability {
    role: AgentType::Satellite,
    summary: "Analyzes satellite imagery for damage assessment",
    result: "analysis_complete",
    metric: "images_processed",
};

const SENSOR: Capability = Capability {
    role: AgentType::Sensor,
    summary: "Monitors IoT sensor networks",
    result: "monitoring_active",
    metric: "sensors_monitored",
};

const CLASSIFIER: Capability = Capability {
    role: AgentType::Classifier,
    summary: "Classifies and triages disaster reports by severity",
    result: "classification_complete",
    metric: "reports_classified",
};

const RESOURCE: Capability = Capability {
    role: AgentType::Resource,
    summary: "Tracks relief resource inventory",
    result: "inventory_updated",
    metric: "resources_tracked",
};

const LOGISTICS: Capability = Capability {
    role: AgentType::Logistics,
    summary: "Optimizes delivery routes and supply chains",
    result: "routes_optimized",
    metric: "routes_calculated",
};

const PREDICTOR: Capability = Capability {
    role: AgentType::Predictor,
    summary: "Forecasts disaster impact and spread",
    result: "predictions_generated",
    metric: "models_run",
};

const DASHBOARD: Capability = Capability {
    role: AgentType::Dashboard,
    summary: "Pushes live updates to operator dashboards",
    result: "dashboard_updated",
    metric: "updates_sent",
};

const REPORTER: Capability = Capability {
    role: AgentType::Reporter,
    summary: "Generates situation reports",
    result: "report_generated",
    metric: "reports_created",
};

const ALERT: Capability = Capability {
    role: AgentType::Alert,
    summary: "Dispatches emergency alerts and notifications",
    result: "alerts_dispatched",
    metric: "notifications_sent",
};

/// The capability entry for `role`.
pub const fn capability_for(role: AgentType) -> &'static Capability {
    match role {
        AgentType::Social => &SOCIAL,
        AgentType::News => &NEWS,
        AgentType::Satellite => &SATELLITE,
        AgentType::Sensor => &SENSOR,
        AgentType::Classifier => &CLASSIFIER,
        AgentType::Resource => &RESOURCE,
        AgentType::Logistics => &LOGISTICS,
        AgentType::Predictor => &PREDICTOR,
        AgentType::Dashboard => &DASHBOARD,
        AgentType::Reporter => &REPORTER,
        AgentType::Alert => &ALERT,
    }
}
