use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// StatusCategory
// ---------------------------------------------------------------------------

/// System statuses ship with the product and are locked against edits
/// (except the active toggle); agent statuses are freely managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    System,
    Agent,
}

impl StatusCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            StatusCategory::System => "system",
            StatusCategory::Agent => "agent",
        }
    }
}

impl fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusCategory {
    type Err = crate::error::TicketflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(StatusCategory::System),
            "agent" => Ok(StatusCategory::Agent),
            _ => Err(crate::error::TicketflowError::InvalidCategory(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// SlaBehavior
// ---------------------------------------------------------------------------

/// What the SLA deadline counter does while a ticket sits in a status.
///
/// `Pause` accrues toward the paused-minutes deduction; `Stop` exempts the
/// ticket from overdue evaluation entirely. The two are never conflated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaBehavior {
    Run,
    Pause,
    Stop,
}

impl SlaBehavior {
    pub fn as_str(self) -> &'static str {
        match self {
            SlaBehavior::Run => "run",
            SlaBehavior::Pause => "pause",
            SlaBehavior::Stop => "stop",
        }
    }
}

impl fmt::Display for SlaBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SlaBehavior {
    type Err = crate::error::TicketflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "run" => Ok(SlaBehavior::Run),
            "pause" => Ok(SlaBehavior::Pause),
            "stop" => Ok(SlaBehavior::Stop),
            _ => Err(crate::error::TicketflowError::InvalidSlaBehavior(
                s.to_string(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// RoleTier
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleTier {
    L1,
    L2,
}

impl RoleTier {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleTier::L1 => "l1",
            RoleTier::L2 => "l2",
        }
    }
}

impl fmt::Display for RoleTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoleTier {
    type Err = crate::error::TicketflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "l1" | "L1" => Ok(RoleTier::L1),
            "l2" | "L2" => Ok(RoleTier::L2),
            _ => Err(crate::error::TicketflowError::InvalidTier(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// Typed trail event kinds, written by the event-producing side.
///
/// The clock engine and splitter match on these variants; there is no
/// keyword scanning of free-form action text anywhere in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    /// Ticket moved between statuses; `from`/`to` are status codes.
    StatusChanged { from: String, to: String },
    /// A human agent posted a reply to the requester.
    AgentReplied,
    /// Ticket handed from first-line to second-line support.
    Escalated { target: Option<String> },
    /// Automated reminder/notification noise; never an escalation or a
    /// response, never a handler source.
    Notification,
    /// Internal note with no SLA significance.
    Note,
}

impl ActionKind {
    pub fn is_status_change(&self) -> bool {
        matches!(self, ActionKind::StatusChanged { .. })
    }

    pub fn is_escalation(&self) -> bool {
        matches!(self, ActionKind::Escalated { .. })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn category_roundtrip() {
        for c in [StatusCategory::System, StatusCategory::Agent] {
            assert_eq!(StatusCategory::from_str(c.as_str()).unwrap(), c);
        }
        assert!(StatusCategory::from_str("bogus").is_err());
    }

    #[test]
    fn behavior_roundtrip() {
        for b in [SlaBehavior::Run, SlaBehavior::Pause, SlaBehavior::Stop] {
            assert_eq!(SlaBehavior::from_str(b.as_str()).unwrap(), b);
        }
        assert!(SlaBehavior::from_str("running").is_err());
    }

    #[test]
    fn tier_accepts_both_cases() {
        assert_eq!(RoleTier::from_str("l1").unwrap(), RoleTier::L1);
        assert_eq!(RoleTier::from_str("L2").unwrap(), RoleTier::L2);
        assert!(RoleTier::from_str("l3").is_err());
    }

    #[test]
    fn action_kind_predicates() {
        let change = ActionKind::StatusChanged {
            from: "new".into(),
            to: "open".into(),
        };
        assert!(change.is_status_change());
        assert!(!change.is_escalation());
        assert!(ActionKind::Escalated { target: None }.is_escalation());
        assert!(!ActionKind::Notification.is_escalation());
    }
}
