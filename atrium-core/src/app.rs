//! App identity types shared across the client
//!
//! Modes, workspace roles, and the routes the client navigates to after an
//! operation completes. Route strings match the console's URL scheme.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution mode of an application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppMode {
    Chat,
    AgentChat,
    AdvancedChat,
    Workflow,
    Completion,
}

impl AppMode {
    /// Wire representation, identical to the serde form
    pub fn as_str(&self) -> &'static str {
        match self {
            AppMode::Chat => "chat",
            AppMode::AgentChat => "agent-chat",
            AppMode::AdvancedChat => "advanced-chat",
            AppMode::Workflow => "workflow",
            AppMode::Completion => "completion",
        }
    }

    /// Category used when registering a published app with the catalog
    ///
    /// The chat-like modes all register under `chat`; only `workflow` and
    /// `completion` keep their own category.
    pub fn catalog_category(&self) -> &'static str {
        match self {
            AppMode::Workflow => "workflow",
            AppMode::Completion => "completion",
            _ => "chat",
        }
    }

    /// Whether the app is edited in the workflow canvas rather than the
    /// configuration form
    pub fn uses_workflow_editor(&self) -> bool {
        matches!(self, AppMode::Workflow | AppMode::AdvancedChat)
    }
}

impl fmt::Display for AppMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of the current actor within a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    Editor,
    Normal,
    DatasetOperator,
}

impl WorkspaceRole {
    /// Owners, admins and editors may edit apps in the workspace
    pub fn can_edit(&self) -> bool {
        matches!(
            self,
            WorkspaceRole::Owner | WorkspaceRole::Admin | WorkspaceRole::Editor
        )
    }
}

/// A console destination the client can navigate to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppRoute {
    /// Workflow canvas for workflow / advanced-chat apps
    WorkflowEditor { app_id: String },
    /// Configuration form for the remaining modes
    Configuration { app_id: String },
    /// Read-only overview for actors without edit permission
    Overview { app_id: String },
    /// A workspace-local installation of a published app
    InstalledApp { installed_app_id: String },
}

impl AppRoute {
    pub fn path(&self) -> String {
        match self {
            AppRoute::WorkflowEditor { app_id } => format!("/app/{app_id}/workflow"),
            AppRoute::Configuration { app_id } => format!("/app/{app_id}/configuration"),
            AppRoute::Overview { app_id } => format!("/app/{app_id}/overview"),
            AppRoute::InstalledApp { installed_app_id } => {
                format!("/explore/installed/{installed_app_id}")
            }
        }
    }
}

/// Destination for an app the actor just obtained (created or cloned)
///
/// Actors without edit permission always land on the overview; editors land
/// on the editor surface matching the app's mode.
pub fn editor_route(can_edit: bool, mode: AppMode, app_id: &str) -> AppRoute {
    if !can_edit {
        return AppRoute::Overview {
            app_id: app_id.to_string(),
        };
    }

    if mode.uses_workflow_editor() {
        AppRoute::WorkflowEditor {
            app_id: app_id.to_string(),
        }
    } else {
        AppRoute::Configuration {
            app_id: app_id.to_string(),
        }
    }
}
