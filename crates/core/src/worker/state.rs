//! Lifecycle states of the offline cache manager.

use serde::{Deserialize, Serialize};

/// Where an instance is in its install/activate lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    /// Not yet registered; requests go straight to the network.
    #[default]
    Unregistered,
    /// Provisioning the current generation.
    Installing,
    /// Provisioned and waiting to activate.
    Installed,
    /// Reclaiming stale generations.
    Activating,
    /// Intercepting requests.
    Active,
    /// Installation failed; this instance will never serve.
    Redundant,
}

impl WorkerState {
    /// Whether requests are routed through `serve`'s cache logic.
    pub fn intercepts_requests(self) -> bool {
        matches!(self, WorkerState::Active)
    }

    /// Whether `install` may start from this state.
    pub fn can_install(self) -> bool {
        matches!(self, WorkerState::Unregistered | WorkerState::Redundant)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            WorkerState::Unregistered => "unregistered",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}
