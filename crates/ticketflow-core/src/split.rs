//! Escalation splitter: attributes net resolution time to the L1 and L2
//! support tiers around the latest escalation event.
//!
//! The split is asymmetric on purpose: L1 is charged raw wall-clock time up
//! to the escalation, while L2 absorbs the entire paused-minutes deduction.
//! Reporting and export both consume this one implementation.

use crate::clock::{minutes_between, SlaEvaluation};
use crate::ticket::{ActorRef, TicketRecord, TrailEvent};
use crate::types::{ActionKind, RoleTier};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct TierSplit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalated_at: Option<DateTime<Utc>>,
    pub l1_minutes: i64,
    pub l2_minutes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l1_handler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l2_handler: Option<String>,
}

fn human_actor(actor: &ActorRef, tier: RoleTier) -> Option<String> {
    (actor.tier == Some(tier) && !actor.is_automated()).then(|| actor.name.clone())
}

/// First human actor tagged with `tier` among `events`.
fn handler_from_events<'a>(
    mut events: impl Iterator<Item = &'a TrailEvent>,
    tier: RoleTier,
) -> Option<String> {
    events.find_map(|e| human_actor(&e.actor, tier))
}

fn assignee_for_tier(record: &TicketRecord, tier: RoleTier) -> Option<String> {
    record
        .assignee
        .as_ref()
        .and_then(|a| human_actor(a, tier))
}

/// Split the evaluated ticket's time across the two support tiers.
pub fn split(record: &TicketRecord, eval: &SlaEvaluation, now: DateTime<Utc>) -> TierSplit {
    let escalation = record
        .latest_escalation()
        .filter(|e| e.at > record.created_at);

    match escalation {
        Some(esc) => {
            let until = eval.terminal_at.unwrap_or(now);
            // L1 is raw clock time; the whole pause deduction lands on L2.
            let l1_minutes = minutes_between(record.created_at, esc.at);
            let l2_minutes = (minutes_between(esc.at, until) - eval.paused_minutes).max(0);

            let l1_handler = handler_from_events(
                record.events.iter().filter(|e| e.at <= esc.at),
                RoleTier::L1,
            )
            .or_else(|| assignee_for_tier(record, RoleTier::L1));

            let escalation_target = match &esc.kind {
                ActionKind::Escalated { target } => target
                    .as_ref()
                    .filter(|name| !crate::ticket::is_automated_name(name))
                    .cloned(),
                _ => None,
            };
            let l2_handler = handler_from_events(
                record.events.iter().filter(|e| e.at > esc.at),
                RoleTier::L2,
            )
            .or(escalation_target)
            .or_else(|| assignee_for_tier(record, RoleTier::L2));

            TierSplit {
                escalated_at: Some(esc.at),
                l1_minutes,
                l2_minutes,
                l1_handler,
                l2_handler,
            }
        }
        None => TierSplit {
            escalated_at: None,
            l1_minutes: eval.net_resolution_minutes,
            l2_minutes: 0,
            l1_handler: handler_from_events(record.events.iter(), RoleTier::L1)
                .or_else(|| assignee_for_tier(record, RoleTier::L1)),
            l2_handler: None,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
