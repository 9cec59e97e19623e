//! Authorization core.
//!
//! A static policy table maps `(resource kind, action)` to the roles that may
//! perform it; the engine walks each resource's ACL-parent chain and searches
//! the representative bindings for a matching role. Decisions are boolean and
//! fail closed.

pub mod engine;
pub mod policy;
pub mod principal;

pub use engine::{AuthTarget, AuthzEngine};
pub use policy::PolicyTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Update,
    Delete,
    View,
    Plan,
    HistoryView,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::View => "view",
            Action::Plan => "plan",
            Action::HistoryView => "history_view",
        }
    }
}

/// COORDINATOR and MANAGER are stored on bindings; AUTHOR and ALL are
/// evaluated structurally and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Coordinator,
    Manager,
    Author,
    All,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Coordinator => "coordinator",
            Role::Manager => "manager",
            Role::Author => "author",
            Role::All => "all",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "coordinator" => Some(Role::Coordinator),
            "manager" => Some(Role::Manager),
            "author" => Some(Role::Author),
            "all" => Some(Role::All),
            _ => None,
        }
    }

    pub fn is_binding_role(&self) -> bool {
        matches!(self, Role::Coordinator | Role::Manager)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Organization,
    Representative,
    Dataset,
    Distribution,
    Structure,
    Request,
    Project,
    User,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Organization => "organization",
            ResourceKind::Representative => "representative",
            ResourceKind::Dataset => "dataset",
            ResourceKind::Distribution => "distribution",
            ResourceKind::Structure => "structure",
            ResourceKind::Request => "request",
            ResourceKind::Project => "project",
            ResourceKind::User => "user",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "organization" => Some(ResourceKind::Organization),
            "representative" => Some(ResourceKind::Representative),
            "dataset" => Some(ResourceKind::Dataset),
            "distribution" => Some(ResourceKind::Distribution),
            "structure" => Some(ResourceKind::Structure),
            "request" => Some(ResourceKind::Request),
            "project" => Some(ResourceKind::Project),
            "user" => Some(ResourceKind::User),
            _ => None,
        }
    }
}
