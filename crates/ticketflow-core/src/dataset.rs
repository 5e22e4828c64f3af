//! YAML dataset loading for the CLI and for fixtures.
//!
//! The file format references statuses by code for authoring convenience;
//! loading resolves codes to ids and builds the registry and graphs through
//! the normal operations, so every invariant is enforced on the way in.

use crate::error::Result;
use crate::graph::{TransitionDraft, WorkflowGraph};
use crate::status::{NewStatus, StatusRegistry};
use crate::store::WorkflowStore;
use crate::ticket::TicketRecord;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

// ---------------------------------------------------------------------------
// File shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DatasetFile {
    #[serde(default)]
    statuses: Vec<NewStatus>,
    #[serde(default)]
    workflows: Vec<WorkflowFile>,
    #[serde(default)]
    tickets: Vec<TicketRecord>,
}

#[derive(Debug, Deserialize)]
struct WorkflowFile {
    name: String,
    #[serde(default)]
    template: bool,
    /// Clone an earlier workflow in the file instead of listing structure.
    #[serde(default)]
    cloned_from: Option<String>,
    /// Entry status code; defaults to the first listed status.
    #[serde(default)]
    entry: Option<String>,
    #[serde(default)]
    statuses: Vec<String>,
    #[serde(default)]
    transitions: Vec<TransitionFile>,
}

#[derive(Debug, Deserialize)]
struct TransitionFile {
    from: String,
    to: String,
    #[serde(default)]
    roles: Vec<String>,
    #[serde(default)]
    automatic: bool,
    #[serde(default)]
    condition: Option<serde_json::Value>,
    #[serde(default)]
    label: Option<String>,
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct Dataset {
    pub registry: StatusRegistry,
    pub store: WorkflowStore,
    pub tickets: Vec<TicketRecord>,
}

impl Dataset {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let dataset = Self::from_yaml(&content)?;
        info!(
            path = %path.display(),
            statuses = dataset.registry.list(false).len(),
            workflows = dataset.store.ids().len(),
            tickets = dataset.tickets.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: DatasetFile = serde_yaml::from_str(content)?;

        let mut registry = StatusRegistry::new();
        for (i, mut status) in file.statuses.into_iter().enumerate() {
            // File position drives display order unless set explicitly.
            if status.sort_order == 0 {
                status.sort_order = (i as i32 + 1) * 10;
            }
            registry.create(status)?;
        }

        let mut store = WorkflowStore::new();
        for workflow in file.workflows {
            if let Some(source) = &workflow.cloned_from {
                let source_id = store.find_by_name(source).ok_or_else(|| {
                    crate::error::TicketflowError::GraphNotFound(source.clone())
                })?;
                store.clone_graph(source_id, workflow.name)?;
                continue;
            }

            let mut graph = if workflow.template {
                WorkflowGraph::new_template(workflow.name)
            } else {
                WorkflowGraph::new(workflow.name)
            };
            for code in &workflow.statuses {
                let status = registry.get_by_code(code)?.clone();
                graph.add_node(&status)?;
            }
            if let Some(entry_code) = &workflow.entry {
                let status_id = registry.get_by_code(entry_code)?.id;
                let node_id = graph
                    .node_by_status(status_id)
                    .ok_or_else(|| {
                        crate::error::TicketflowError::NodeNotFound(entry_code.clone())
                    })?
                    .id;
                graph.set_entry(node_id, &registry)?;
            }
            for t in workflow.transitions {
                let from = node_id_for(&graph, &registry, &t.from)?;
                let to = node_id_for(&graph, &registry, &t.to)?;
                graph.add_transition(
                    from,
                    to,
                    TransitionDraft {
                        roles: t.roles,
                        is_automatic: t.automatic,
                        condition: t.condition,
                        label: t.label,
                    },
                    &registry,
                )?;
            }
            graph.validate(&registry)?;
            store.insert(graph);
        }

        Ok(Dataset {
            registry,
            store,
            tickets: file.tickets,
        })
    }

    pub fn ticket(&self, id: &str) -> Result<&TicketRecord> {
        self.tickets
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| crate::error::TicketflowError::TicketNotFound(id.to_string()))
    }
}

fn node_id_for(
    graph: &WorkflowGraph,
    registry: &StatusRegistry,
    code: &str,
) -> Result<uuid::Uuid> {
    let status_id = registry.get_by_code(code)?.id;
    graph
        .node_by_status(status_id)
        .map(|n| n.id)
        .ok_or_else(|| crate::error::TicketflowError::NodeNotFound(code.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
