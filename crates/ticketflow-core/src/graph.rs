//! Workflow graphs: statuses-in-use plus the directed transitions between
//! them.
//!
//! The entry node is an explicit flag, never inferred from insertion order or
//! a name match. The first node added to an empty graph becomes the entry;
//! `set_entry` moves it.

use crate::error::{Result, TicketflowError};
use crate::status::{Status, StatusRegistry};
use crate::types::StatusCategory;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// GraphNode
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: Uuid,
    pub status_id: Uuid,
    /// Layout coordinates, purely cosmetic.
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub is_entry: bool,
}

// ---------------------------------------------------------------------------
// Transition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transition {
    pub id: Uuid,
    pub from: Uuid,
    pub to: Uuid,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub is_automatic: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Everything about a transition except its endpoints.
#[derive(Debug, Clone, Default)]
pub struct TransitionDraft {
    pub roles: Vec<String>,
    pub is_automatic: bool,
    pub condition: Option<serde_json::Value>,
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// WorkflowGraph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowGraph {
    pub id: Uuid,
    pub name: String,
    pub is_template: bool,
    pub is_active: bool,
    /// Template this graph was cloned from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    pub nodes: Vec<GraphNode>,
    pub transitions: Vec<Transition>,
}

impl WorkflowGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_template: false,
            is_active: true,
            template_id: None,
            nodes: Vec::new(),
            transitions: Vec::new(),
        }
    }

    pub fn new_template(name: impl Into<String>) -> Self {
        let mut graph = Self::new(name);
        graph.is_template = true;
        graph
    }

    pub fn node(&self, id: Uuid) -> Result<&GraphNode> {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| TicketflowError::NodeNotFound(id.to_string()))
    }

    pub fn node_by_status(&self, status_id: Uuid) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.status_id == status_id)
    }

    pub fn entry_node(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.is_entry)
    }

    /// Bind a status into this graph. Each status appears at most once; the
    /// first node of an empty graph becomes the entry.
    pub fn add_node(&mut self, status: &Status) -> Result<&GraphNode> {
        if self.node_by_status(status.id).is_some() {
            return Err(TicketflowError::AlreadyPresent(status.code.clone()));
        }
        let is_entry = self.nodes.is_empty();
        debug!(graph = %self.name, status = %status.code, is_entry, "adding node");
        self.nodes.push(GraphNode {
            id: Uuid::new_v4(),
            status_id: status.id,
            x: 0.0,
            y: 0.0,
            is_entry,
        });
        Ok(self.nodes.last().unwrap())
    }

    pub fn set_layout(&mut self, node_id: Uuid, x: f64, y: f64) -> Result<()> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| TicketflowError::NodeNotFound(node_id.to_string()))?;
        node.x = x;
        node.y = y;
        Ok(())
    }

    /// Move the entry flag. Rejected if any transition already targets the
    /// new entry, since no transition may point at the entry status.
    pub fn set_entry(&mut self, node_id: Uuid, registry: &StatusRegistry) -> Result<()> {
        let status_id = self.node(node_id)?.status_id;
        if self.transitions.iter().any(|t| t.to == node_id) {
            let code = registry.get(status_id)?.code.clone();
            return Err(TicketflowError::TransitionToEntry(code));
        }
        for node in &mut self.nodes {
            node.is_entry = node.id == node_id;
        }
        Ok(())
    }

    /// Unbind a status, cascading to every transition touching the node.
    ///
    /// If the entry was removed, the oldest surviving node with no incoming
    /// transitions is promoted; if none qualifies the graph is left without
    /// an entry and `validate` will report it.
    pub fn remove_node(&mut self, node_id: Uuid, registry: &StatusRegistry) -> Result<()> {
        let node = self.node(node_id)?;
        let status = registry.get(node.status_id)?;
        if status.category == StatusCategory::System {
            return Err(TicketflowError::Locked(format!(
                "system status '{}' cannot be removed from a workflow",
                status.code
            )));
        }
        let was_entry = node.is_entry;
        debug!(graph = %self.name, status = %status.code, "removing node");

        self.transitions
            .retain(|t| t.from != node_id && t.to != node_id);
        self.nodes.retain(|n| n.id != node_id);

        if was_entry {
            let candidate = self
                .nodes
                .iter()
                .find(|n| !self.transitions.iter().any(|t| t.to == n.id))
                .map(|n| n.id);
            if let Some(id) = candidate {
                for node in &mut self.nodes {
                    node.is_entry = node.id == id;
                }
            }
        }
        Ok(())
    }

    /// Add a transition, validating in this fixed order: self-loop, source
    /// not final, destination not entry, no duplicate (from, to) pair.
    pub fn add_transition(
        &mut self,
        from: Uuid,
        to: Uuid,
        draft: TransitionDraft,
        registry: &StatusRegistry,
    ) -> Result<&Transition> {
        let from_status = registry.get(self.node(from)?.status_id)?;
        let to_node = self.node(to)?;
        let to_status = registry.get(to_node.status_id)?;

        if from == to {
            return Err(TicketflowError::SelfLoop);
        }
        if from_status.is_final {
            return Err(TicketflowError::TransitionFromFinal(
                from_status.code.clone(),
            ));
        }
        if to_node.is_entry {
            return Err(TicketflowError::TransitionToEntry(to_status.code.clone()));
        }
        if self.transitions.iter().any(|t| t.from == from && t.to == to) {
            return Err(TicketflowError::DuplicateTransition {
                from: from_status.code.clone(),
                to: to_status.code.clone(),
            });
        }

        debug!(
            graph = %self.name,
            from = %from_status.code,
            to = %to_status.code,
            automatic = draft.is_automatic,
            "adding transition"
        );
        self.transitions.push(Transition {
            id: Uuid::new_v4(),
            from,
            to,
            roles: draft.roles,
            is_automatic: draft.is_automatic,
            condition: draft.condition,
            label: draft.label,
        });
        Ok(self.transitions.last().unwrap())
    }

    pub fn remove_transition(&mut self, id: Uuid) -> Result<()> {
        let before = self.transitions.len();
        self.transitions.retain(|t| t.id != id);
        if self.transitions.len() == before {
            return Err(TicketflowError::TransitionNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Re-check every structural invariant of an assembled graph; returns the
    /// first violation found.
    pub fn validate(&self, registry: &StatusRegistry) -> Result<()> {
        if !self.nodes.is_empty() && self.entry_node().is_none() {
            return Err(TicketflowError::NoEntry(self.name.clone()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if self.nodes[..i].iter().any(|n| n.status_id == node.status_id) {
                let code = registry.get(node.status_id)?.code.clone();
                return Err(TicketflowError::AlreadyPresent(code));
            }
        }
        for (i, t) in self.transitions.iter().enumerate() {
            if t.from == t.to {
                return Err(TicketflowError::SelfLoop);
            }
            let from_status = registry.get(self.node(t.from)?.status_id)?;
            if from_status.is_final {
                return Err(TicketflowError::TransitionFromFinal(
                    from_status.code.clone(),
                ));
            }
            let to_node = self.node(t.to)?;
            if to_node.is_entry {
                let code = registry.get(to_node.status_id)?.code.clone();
                return Err(TicketflowError::TransitionToEntry(code));
            }
            if self.transitions[..i]
                .iter()
                .any(|prev| prev.from == t.from && prev.to == t.to)
            {
                return Err(TicketflowError::DuplicateTransition {
                    from: from_status.code.clone(),
                    to: registry.get(to_node.status_id)?.code.clone(),
                });
            }
        }
        Ok(())
    }

    /// Transition endpoints as (from, to) status-code pairs, for reporting
    /// and clone round-trip checks.
    pub fn transition_code_pairs(&self, registry: &StatusRegistry) -> Result<Vec<(String, String)>> {
        self.transitions
            .iter()
            .map(|t| {
                let from = registry.get(self.node(t.from)?.status_id)?.code.clone();
                let to = registry.get(self.node(t.to)?.status_id)?.code.clone();
                Ok((from, to))
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
