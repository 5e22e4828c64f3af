//! Status catalog — the single source of truth for per-status attributes.
//!
//! Category locking lives here and only here: system statuses reject every
//! mutation except the active toggle, so no caller needs to duplicate the
//! rule.

use crate::error::{Result, TicketflowError};
use crate::store::WorkflowStore;
use crate::types::{SlaBehavior, StatusCategory};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;
use uuid::Uuid;

static CODE_RE: OnceLock<Regex> = OnceLock::new();

fn code_re() -> &'static Regex {
    CODE_RE.get_or_init(|| Regex::new(r"^[a-z0-9_]+$").unwrap())
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub id: Uuid,
    pub name: String,
    pub code: String,
    pub category: StatusCategory,
    pub is_final: bool,
    pub sla_behavior: SlaBehavior,
    pub sort_order: i32,
    pub is_active: bool,
}

/// Input for `StatusRegistry::create`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStatus {
    pub name: String,
    pub code: String,
    #[serde(default = "default_category")]
    pub category: StatusCategory,
    #[serde(default)]
    pub is_final: bool,
    #[serde(default = "default_behavior")]
    pub sla_behavior: SlaBehavior,
    #[serde(default)]
    pub sort_order: i32,
}

fn default_category() -> StatusCategory {
    StatusCategory::Agent
}

fn default_behavior() -> SlaBehavior {
    SlaBehavior::Run
}

/// Full-record update; `None` fields keep their current value.
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub is_final: Option<bool>,
    pub sla_behavior: Option<SlaBehavior>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl StatusUpdate {
    /// True if anything beyond the active toggle would change.
    fn touches_locked_fields(&self) -> bool {
        self.name.is_some()
            || self.code.is_some()
            || self.is_final.is_some()
            || self.sla_behavior.is_some()
            || self.sort_order.is_some()
    }
}

// ---------------------------------------------------------------------------
// StatusRegistry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusRegistry {
    statuses: Vec<Status>,
}

impl StatusRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses sorted by `sort_order`, then code for a stable tie-break.
    pub fn list(&self, active_only: bool) -> Vec<&Status> {
        let mut out: Vec<&Status> = self
            .statuses
            .iter()
            .filter(|s| !active_only || s.is_active)
            .collect();
        out.sort_by(|a, b| {
            a.sort_order
                .cmp(&b.sort_order)
                .then_with(|| a.code.cmp(&b.code))
        });
        out
    }

    pub fn get(&self, id: Uuid) -> Result<&Status> {
        self.statuses
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| TicketflowError::StatusNotFound(id.to_string()))
    }

    pub fn get_by_code(&self, code: &str) -> Result<&Status> {
        self.statuses
            .iter()
            .find(|s| s.code == code)
            .ok_or_else(|| TicketflowError::StatusNotFound(code.to_string()))
    }

    /// Clock behavior for a status code; unknown codes default to `Run` so a
    /// stale trail never silently pauses a clock.
    pub fn behavior_of(&self, code: &str) -> SlaBehavior {
        self.statuses
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.sla_behavior)
            .unwrap_or(SlaBehavior::Run)
    }

    pub fn is_final_code(&self, code: &str) -> bool {
        self.statuses
            .iter()
            .any(|s| s.code == code && s.is_final)
    }

    pub fn create(&mut self, new: NewStatus) -> Result<&Status> {
        if new.name.trim().is_empty() {
            return Err(TicketflowError::MissingField("name"));
        }
        if !code_re().is_match(&new.code) {
            return Err(TicketflowError::InvalidCode(new.code));
        }
        if self.statuses.iter().any(|s| s.code == new.code) {
            return Err(TicketflowError::DuplicateCode(new.code));
        }
        if new.is_final && new.sla_behavior == SlaBehavior::Run {
            return Err(TicketflowError::InvalidSlaCombination(new.code));
        }

        debug!(code = %new.code, category = %new.category, "creating status");
        self.statuses.push(Status {
            id: Uuid::new_v4(),
            name: new.name,
            code: new.code,
            category: new.category,
            is_final: new.is_final,
            sla_behavior: new.sla_behavior,
            sort_order: new.sort_order,
            is_active: true,
        });
        Ok(self.statuses.last().unwrap())
    }

    /// Apply a full-record update. The final+run invariant is checked on the
    /// merged record, so it holds no matter which field changes first.
    pub fn update(&mut self, id: Uuid, update: StatusUpdate) -> Result<&Status> {
        let pos = self
            .statuses
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| TicketflowError::StatusNotFound(id.to_string()))?;

        if self.statuses[pos].category == StatusCategory::System
            && update.touches_locked_fields()
        {
            return Err(TicketflowError::Locked(format!(
                "system status '{}' only allows the active toggle",
                self.statuses[pos].code
            )));
        }

        let merged_code = update
            .code
            .clone()
            .unwrap_or_else(|| self.statuses[pos].code.clone());
        if !code_re().is_match(&merged_code) {
            return Err(TicketflowError::InvalidCode(merged_code));
        }
        if merged_code != self.statuses[pos].code
            && self.statuses.iter().any(|s| s.code == merged_code)
        {
            return Err(TicketflowError::DuplicateCode(merged_code));
        }

        let merged_final = update.is_final.unwrap_or(self.statuses[pos].is_final);
        let merged_behavior = update
            .sla_behavior
            .unwrap_or(self.statuses[pos].sla_behavior);
        if merged_final && merged_behavior == SlaBehavior::Run {
            return Err(TicketflowError::InvalidSlaCombination(merged_code));
        }

        let status = &mut self.statuses[pos];
        if let Some(name) = update.name {
            status.name = name;
        }
        status.code = merged_code;
        status.is_final = merged_final;
        status.sla_behavior = merged_behavior;
        if let Some(order) = update.sort_order {
            status.sort_order = order;
        }
        if let Some(active) = update.is_active {
            status.is_active = active;
        }
        Ok(&self.statuses[pos])
    }

    /// Delete a status. Refused while any workflow still binds it.
    pub fn delete(&mut self, id: Uuid, graphs: &WorkflowStore) -> Result<()> {
        let status = self.get(id)?;
        if status.category == StatusCategory::System {
            return Err(TicketflowError::Locked(format!(
                "system status '{}' cannot be deleted",
                status.code
            )));
        }
        if let Some(graph_name) = graphs.references_status(id) {
            return Err(TicketflowError::ReferencedByGraph {
                status: status.code.clone(),
                graph: graph_name,
            });
        }
        debug!(code = %status.code, "deleting status");
        self.statuses.retain(|s| s.id != id);
        Ok(())
    }

    /// Reorder agent statuses. System statuses keep their positions and may
    /// not appear in the list.
    pub fn reorder(&mut self, ids: &[Uuid]) -> Result<()> {
        for id in ids {
            let status = self.get(*id)?;
            if status.category == StatusCategory::System {
                return Err(TicketflowError::Locked(format!(
                    "system status '{}' cannot be reordered",
                    status.code
                )));
            }
        }
        for (i, id) in ids.iter().enumerate() {
            let order = (i as i32 + 1) * 10;
            if let Some(status) = self.statuses.iter_mut().find(|s| s.id == *id) {
                status.sort_order = order;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
