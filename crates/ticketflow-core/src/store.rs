//! In-memory home for workflow graphs and templates.
//!
//! Every graph sits behind its own mutex: mutation is single-writer per
//! graph because the validity rules read the full node/transition set before
//! writing. Cloning reads the source under its lock, builds the copy
//! entirely off-store, and inserts it in one step, so a failed clone leaves
//! zero partial state.

use crate::error::{Result, TicketflowError};
use crate::graph::{GraphNode, Transition, WorkflowGraph};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct WorkflowStore {
    graphs: HashMap<Uuid, Mutex<WorkflowGraph>>,
}

impl WorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, graph: WorkflowGraph) -> Uuid {
        let id = graph.id;
        self.graphs.insert(id, Mutex::new(graph));
        id
    }

    /// Cascades to the graph's nodes and transitions (they live inside it).
    pub fn delete(&mut self, id: Uuid) -> Result<()> {
        self.graphs
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| TicketflowError::GraphNotFound(id.to_string()))
    }

    pub fn ids(&self) -> Vec<Uuid> {
        self.graphs.keys().copied().collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Uuid> {
        self.graphs
            .iter()
            .find(|(_, g)| lock(g).name == name)
            .map(|(id, _)| *id)
    }

    /// Read access under the graph's lock.
    pub fn with_graph<R>(&self, id: Uuid, f: impl FnOnce(&WorkflowGraph) -> R) -> Result<R> {
        let graph = self
            .graphs
            .get(&id)
            .ok_or_else(|| TicketflowError::GraphNotFound(id.to_string()))?;
        Ok(f(&lock(graph)))
    }

    /// Serialized mutation: the closure holds the graph's lock for its whole
    /// read-validate-write cycle.
    pub fn with_graph_mut<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut WorkflowGraph) -> Result<R>,
    ) -> Result<R> {
        let graph = self
            .graphs
            .get(&id)
            .ok_or_else(|| TicketflowError::GraphNotFound(id.to_string()))?;
        f(&mut lock(graph))
    }

    /// Name of some graph binding the status, if any. Drives the registry's
    /// referential delete guard.
    pub fn references_status(&self, status_id: Uuid) -> Option<String> {
        self.graphs.values().find_map(|g| {
            let graph = lock(g);
            graph.node_by_status(status_id).map(|_| graph.name.clone())
        })
    }

    /// Clone a template (or any graph) into a fresh instance graph: every
    /// node with its layout and entry flag, every transition with endpoints
    /// remapped to the new node ids.
    pub fn clone_graph(&mut self, source_id: Uuid, name: impl Into<String>) -> Result<Uuid> {
        let name = name.into();
        let copy = {
            let source = self
                .graphs
                .get(&source_id)
                .ok_or_else(|| TicketflowError::GraphNotFound(source_id.to_string()))?;
            let source = lock(source);

            let mut node_map: HashMap<Uuid, Uuid> = HashMap::new();
            let nodes: Vec<GraphNode> = source
                .nodes
                .iter()
                .map(|n| {
                    let id = Uuid::new_v4();
                    node_map.insert(n.id, id);
                    GraphNode {
                        id,
                        status_id: n.status_id,
                        x: n.x,
                        y: n.y,
                        is_entry: n.is_entry,
                    }
                })
                .collect();

            let transitions: Vec<Transition> = source
                .transitions
                .iter()
                .map(|t| {
                    let from = node_map
                        .get(&t.from)
                        .copied()
                        .ok_or_else(|| TicketflowError::NodeNotFound(t.from.to_string()))?;
                    let to = node_map
                        .get(&t.to)
                        .copied()
                        .ok_or_else(|| TicketflowError::NodeNotFound(t.to.to_string()))?;
                    Ok(Transition {
                        id: Uuid::new_v4(),
                        from,
                        to,
                        roles: t.roles.clone(),
                        is_automatic: t.is_automatic,
                        condition: t.condition.clone(),
                        label: t.label.clone(),
                    })
                })
                .collect::<Result<_>>()?;

            info!(
                source = %source.name,
                instance = %name,
                nodes = nodes.len(),
                transitions = transitions.len(),
                "cloning workflow"
            );
            WorkflowGraph {
                id: Uuid::new_v4(),
                name,
                is_template: false,
                is_active: true,
                template_id: Some(source.id),
                nodes,
                transitions,
            }
        };
        Ok(self.insert(copy))
    }
}

/// Mutex poisoning only happens if a holder panicked mid-operation; the
/// graph data itself is still structurally valid, so recover the guard.
fn lock(m: &Mutex<WorkflowGraph>) -> std::sync::MutexGuard<'_, WorkflowGraph> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TransitionDraft;
    use crate::status::{NewStatus, StatusRegistry};
    use crate::types::{SlaBehavior, StatusCategory};

    fn registry() -> StatusRegistry {
        let mut reg = StatusRegistry::new();
        for (code, is_final, behavior) in [
            ("new", false, SlaBehavior::Run),
            ("in_progress", false, SlaBehavior::Run),
            ("on_hold", false, SlaBehavior::Pause),
            ("resolved", true, SlaBehavior::Stop),
        ] {
            reg.create(NewStatus {
                name: code.to_string(),
                code: code.to_string(),
                category: StatusCategory::Agent,
                is_final,
                sla_behavior: behavior,
                sort_order: 0,
            })
            .unwrap();
        }
        reg
    }

    fn template(reg: &StatusRegistry) -> WorkflowGraph {
        let mut graph = WorkflowGraph::new_template("default");
        let mut ids = Vec::new();
        for code in ["new", "in_progress", "on_hold", "resolved"] {
            let status = reg.get_by_code(code).unwrap().clone();
            ids.push(graph.add_node(&status).unwrap().id);
        }
        graph
            .add_transition(ids[0], ids[1], TransitionDraft::default(), reg)
            .unwrap();
        graph
            .add_transition(ids[1], ids[2], TransitionDraft::default(), reg)
            .unwrap();
        graph
            .add_transition(ids[2], ids[1], TransitionDraft::default(), reg)
            .unwrap();
        graph
            .add_transition(ids[1], ids[3], TransitionDraft::default(), reg)
            .unwrap();
        graph
    }

    #[test]
    fn clone_copies_counts_and_remaps_endpoints() {
        let reg = registry();
        let mut store = WorkflowStore::new();
        let template_id = store.insert(template(&reg));

        let clone_id = store.clone_graph(template_id, "team-a").unwrap();

        let (template_pairs, template_node_ids) = store
            .with_graph(template_id, |g| {
                (
                    g.transition_code_pairs(&reg).unwrap(),
                    g.nodes.iter().map(|n| n.id).collect::<Vec<_>>(),
                )
            })
            .unwrap();
        store
            .with_graph(clone_id, |g| {
                assert_eq!(g.nodes.len(), 4);
                assert_eq!(g.transitions.len(), 4);
                assert_eq!(g.template_id, Some(template_id));
                assert!(!g.is_template);
                // Same (from, to) status pairs, none of the old node ids.
                assert_eq!(g.transition_code_pairs(&reg).unwrap(), template_pairs);
                assert!(g.nodes.iter().all(|n| !template_node_ids.contains(&n.id)));
                // Entry flag carried over.
                let entry_status = g.entry_node().unwrap().status_id;
                assert_eq!(reg.get(entry_status).unwrap().code, "new");
                g.validate(&reg).unwrap();
            })
            .unwrap();
    }

    #[test]
    fn references_status_guards_registry_delete() {
        let mut reg = registry();
        let mut store = WorkflowStore::new();
        store.insert(template(&reg));

        let bound = reg.get_by_code("on_hold").unwrap().id;
        let err = reg.delete(bound, &store).unwrap_err();
        assert!(matches!(err, TicketflowError::ReferencedByGraph { .. }));

        let free = reg
            .create(NewStatus {
                name: "Spare".into(),
                code: "spare".into(),
                category: StatusCategory::Agent,
                is_final: false,
                sla_behavior: SlaBehavior::Run,
                sort_order: 0,
            })
            .unwrap()
            .id;
        reg.delete(free, &store).unwrap();
    }

    #[test]
    fn delete_graph_releases_references() {
        let mut reg = registry();
        let mut store = WorkflowStore::new();
        let id = store.insert(template(&reg));
        store.delete(id).unwrap();

        let bound = reg.get_by_code("on_hold").unwrap().id;
        reg.delete(bound, &store).unwrap();
    }

    #[test]
    fn clone_missing_graph_not_found() {
        let mut store = WorkflowStore::new();
        let err = store.clone_graph(Uuid::new_v4(), "x").unwrap_err();
        assert!(matches!(err, TicketflowError::GraphNotFound(_)));
    }

    #[test]
    fn find_by_name() {
        let reg = registry();
        let mut store = WorkflowStore::new();
        let id = store.insert(template(&reg));
        assert_eq!(store.find_by_name("default"), Some(id));
        assert_eq!(store.find_by_name("missing"), None);
    }
}
