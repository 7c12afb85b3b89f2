//! Per-request state shared between the host router and page types.

use crate::page::Page;
use serde::{Deserialize, Serialize};

/// The person (or process) making a request
///
/// Permission checks are the host's business; the page type only asks
/// whether the actor may edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub can_edit: bool,
}

impl Actor {
    pub fn visitor(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            can_edit: false,
        }
    }

    pub fn editor(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            can_edit: true,
        }
    }
}

/// Entry in the editing context menu shown on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMenuItem {
    pub name: String,
    pub label: String,
}

impl ContextMenuItem {
    pub fn new(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
        }
    }
}

/// How the host should answer a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Render { template: String },
    NotFound,
    Redirect { location: String },
}

/// Request state
///
/// Created by the host router, filled in by a page type's loader, read by
/// the host response layer.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Requested URL path
    pub path: String,
    /// Page whose slug matched the whole path, if any
    pub page: Option<Page>,
    /// Page whose slug is the longest prefix of the path
    pub best_page: Option<Page>,
    /// Part of the path after the best page's slug
    pub remainder: String,
    pub actor: Option<Actor>,
    pub context_menu: Option<Vec<ContextMenuItem>>,
    pub outcome: Option<DispatchOutcome>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Context for work that is not tied to a URL (scripts, tasks, tests)
    pub fn task() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor = Some(actor);
        self
    }

    pub fn can_edit(&self) -> bool {
        self.actor.as_ref().map(|a| a.can_edit).unwrap_or(false)
    }
}
