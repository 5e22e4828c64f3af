//! SLA clock engine: elapsed, paused, and net time for a ticket as of a
//! reference instant, with overdue verdicts.
//!
//! Pure function of (record, registry, now); safe to call concurrently per
//! ticket. All minute figures are floored, uniformly. Paused time is always
//! recomputed from the status-change trail — never read from a cached
//! counter — so it cannot drift.

use crate::policy::{self, SlaTargets};
use crate::status::StatusRegistry;
use crate::ticket::TicketRecord;
use crate::types::{ActionKind, SlaBehavior};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct SlaEvaluation {
    pub ticket_id: String,
    pub targets: SlaTargets,
    /// The clock target is no longer evaluated: the ticket sits in a
    /// stop-behavior status (canceled-class). Both overdue flags are false.
    pub clock_stopped: bool,
    pub has_responded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_response_at: Option<DateTime<Utc>>,
    pub response_elapsed_minutes: i64,
    pub response_overdue: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_at: Option<DateTime<Utc>>,
    pub raw_resolution_minutes: i64,
    pub paused_minutes: i64,
    pub net_resolution_minutes: i64,
    pub resolution_overdue: bool,
}

/// Whole minutes between two instants, floored, never negative.
pub(crate) fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    ((to - from).num_seconds() / 60).max(0)
}

/// Instant of the status change that moved the ticket into its final status.
///
/// Uses the last such change, and only while the ticket still sits in a
/// final status — a reopened ticket is live again.
fn terminal_instant(record: &TicketRecord, registry: &StatusRegistry) -> Option<DateTime<Utc>> {
    if !registry.is_final_code(&record.current_status) {
        return None;
    }
    record
        .status_changes()
        .filter(|(_, _, to)| registry.is_final_code(to))
        .last()
        .map(|(e, _, _)| e.at)
}

/// Earliest response marker: an agent reply from a human actor, or the first
/// status change that left the initial status.
fn first_response(record: &TicketRecord) -> Option<DateTime<Utc>> {
    let initial = record.initial_status();
    record
        .events
        .iter()
        .find(|e| match &e.kind {
            ActionKind::AgentReplied => !e.actor.is_automated(),
            ActionKind::StatusChanged { to, .. } => to != initial,
            _ => false,
        })
        .map(|e| e.at)
}

/// Total whole minutes the ticket spent in pause-behavior statuses between
/// creation and `until`, from walking the status-change trail.
pub fn paused_minutes(
    record: &TicketRecord,
    registry: &StatusRegistry,
    until: DateTime<Utc>,
) -> i64 {
    let mut current = record.initial_status().to_string();
    let mut segment_start = record.created_at;
    let mut paused_secs: i64 = 0;

    for (event, _, to) in record.status_changes() {
        let end = event.at.min(until);
        if registry.behavior_of(&current) == SlaBehavior::Pause && end > segment_start {
            paused_secs += (end - segment_start).num_seconds();
        }
        current = to.to_string();
        if event.at > segment_start {
            segment_start = event.at.min(until);
        }
    }
    if registry.behavior_of(&current) == SlaBehavior::Pause && until > segment_start {
        paused_secs += (until - segment_start).num_seconds();
    }
    (paused_secs / 60).max(0)
}

/// Evaluate the SLA clock for one ticket as of `now`.
pub fn evaluate(record: &TicketRecord, registry: &StatusRegistry, now: DateTime<Utc>) -> SlaEvaluation {
    let targets = policy::targets_for(&record.priority);
    let clock_stopped = registry.behavior_of(&record.current_status) == SlaBehavior::Stop;

    let first_response_at = first_response(record);
    let has_responded = first_response_at.is_some();
    let response_elapsed_minutes =
        minutes_between(record.created_at, first_response_at.unwrap_or(now));
    let response_overdue =
        !clock_stopped && response_elapsed_minutes > targets.response_minutes;

    let terminal_at = terminal_instant(record, registry);
    let until = terminal_at.unwrap_or(now);
    let raw_resolution_minutes = minutes_between(record.created_at, until);
    let paused = paused_minutes(record, registry, until);
    let net_resolution_minutes = (raw_resolution_minutes - paused).max(0);
    let resolution_overdue =
        !clock_stopped && net_resolution_minutes > targets.resolution_minutes;

    debug!(
        ticket = %record.id,
        net = net_resolution_minutes,
        paused,
        response_overdue,
        resolution_overdue,
        "evaluated sla clock"
    );
    SlaEvaluation {
        ticket_id: record.id.clone(),
        targets,
        clock_stopped,
        has_responded,
        first_response_at,
        response_elapsed_minutes,
        response_overdue,
        terminal_at,
        raw_resolution_minutes,
        paused_minutes: paused,
        net_resolution_minutes,
        resolution_overdue,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::NewStatus;
    use crate::ticket::{ActorRef, TrailEvent};
    use crate::types::StatusCategory;
    use chrono::{Duration, TimeZone};

    fn registry() -> StatusRegistry {
        let mut reg = StatusRegistry::new();
        for (code, is_final, behavior) in [
            ("new", false, SlaBehavior::Run),
            ("in_progress", false, SlaBehavior::Run),
            ("on_hold", false, SlaBehavior::Pause),
            ("resolved", true, SlaBehavior::Pause),
            ("canceled", true, SlaBehavior::Stop),
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

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn agent(name: &str) -> ActorRef {
        ActorRef {
            id: name.to_string(),
            name: name.to_string(),
            tier: None,
        }
    }

    fn change(minute: i64, from: &str, to: &str) -> TrailEvent {
        TrailEvent {
            at: t0() + Duration::minutes(minute),
            actor: agent("dana"),
            kind: ActionKind::StatusChanged {
                from: from.to_string(),
                to: to.to_string(),
            },
        }
    }

    fn ticket(priority: &str, current: &str, events: Vec<TrailEvent>) -> TicketRecord {
        TicketRecord {
            id: "T-1".into(),
            created_at: t0(),
            priority: priority.into(),
            current_status: current.into(),
            assignee: None,
            events,
        }
    }

    #[test]
    fn critical_resolved_within_target() {
        let reg = registry();
        let record = ticket(
            "Critical",
            "resolved",
            vec![
                change(5, "new", "in_progress"),
                change(50, "in_progress", "resolved"),
            ],
        );
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(600));
        assert_eq!(eval.net_resolution_minutes, 50);
        assert!(!eval.resolution_overdue);
    }

    #[test]
    fn critical_resolved_past_target() {
        let reg = registry();
        let record = ticket(
            "Critical",
            "resolved",
            vec![
                change(5, "new", "in_progress"),
                change(61, "in_progress", "resolved"),
            ],
        );
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(600));
        assert_eq!(eval.net_resolution_minutes, 61);
        assert!(eval.resolution_overdue);
    }

    #[test]
    fn unknown_priority_uses_fallback_target() {
        let reg = registry();
        let record = ticket("P0", "new", vec![]);
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(10));
        assert_eq!(eval.targets.resolution_minutes, 480);
        assert_eq!(eval.targets.response_minutes, 120);
    }

    #[test]
    fn canceled_never_overdue() {
        let reg = registry();
        let record = ticket(
            "Critical",
            "canceled",
            vec![change(5000, "new", "canceled")],
        );
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(9000));
        assert!(eval.clock_stopped);
        assert!(!eval.response_overdue);
        assert!(!eval.resolution_overdue);
    }

    #[test]
    fn pause_intervals_deducted_from_net() {
        let reg = registry();
        // 10 min running, 50 min on hold, 60 min running, resolved at T+120.
        let record = ticket(
            "Critical",
            "resolved",
            vec![
                change(10, "new", "on_hold"),
                change(60, "on_hold", "in_progress"),
                change(120, "in_progress", "resolved"),
            ],
        );
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(600));
        assert_eq!(eval.raw_resolution_minutes, 120);
        assert_eq!(eval.paused_minutes, 50);
        assert_eq!(eval.net_resolution_minutes, 70);
        assert!(eval.resolution_overdue); // 70 > 60
    }

    #[test]
    fn live_pause_accrues_up_to_now() {
        let reg = registry();
        let record = ticket("High", "on_hold", vec![change(30, "new", "on_hold")]);
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(100));
        assert_eq!(eval.paused_minutes, 70);
        assert_eq!(eval.net_resolution_minutes, 30);
    }

    #[test]
    fn net_resolution_never_negative() {
        let reg = registry();
        // Ticket paused from creation onward.
        let record = ticket("High", "on_hold", vec![change(0, "new", "on_hold")]);
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(300));
        assert!(eval.net_resolution_minutes >= 0);
        assert_eq!(eval.net_resolution_minutes, 0);
    }

    #[test]
    fn response_uses_actual_instant_once_responded() {
        let reg = registry();
        // Responded at T+10; evaluating much later must not flip the verdict.
        let record = ticket("Critical", "in_progress", vec![change(10, "new", "in_progress")]);
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(5000));
        assert!(eval.has_responded);
        assert_eq!(eval.response_elapsed_minutes, 10);
        assert!(!eval.response_overdue); // 10 <= 15
    }

    #[test]
    fn unresponded_ticket_uses_live_clock() {
        let reg = registry();
        let record = ticket("Critical", "new", vec![]);
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(16));
        assert!(!eval.has_responded);
        assert!(eval.response_overdue); // 16 > 15

        let eval = evaluate(&record, &reg, t0() + Duration::minutes(14));
        assert!(!eval.response_overdue);
    }

    #[test]
    fn agent_reply_counts_as_response_but_notification_does_not() {
        let reg = registry();
        let mut record = ticket("Critical", "new", vec![]);
        record.events.push(TrailEvent {
            at: t0() + Duration::minutes(3),
            actor: agent("sla-notification-bot"),
            kind: ActionKind::AgentReplied,
        });
        record.events.push(TrailEvent {
            at: t0() + Duration::minutes(8),
            actor: agent("dana"),
            kind: ActionKind::AgentReplied,
        });
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(100));
        assert!(eval.has_responded);
        assert_eq!(eval.response_elapsed_minutes, 8);
    }

    #[test]
    fn pause_in_final_status_stops_accruing_after_terminal() {
        let reg = registry();
        // `resolved` has pause behavior; time after the terminal instant
        // must not accrue anywhere.
        let record = ticket("High", "resolved", vec![change(40, "new", "resolved")]);
        let eval = evaluate(&record, &reg, t0() + Duration::minutes(400));
        assert_eq!(eval.terminal_at, Some(t0() + Duration::minutes(40)));
        assert_eq!(eval.raw_resolution_minutes, 40);
        assert_eq!(eval.paused_minutes, 0);
        assert_eq!(eval.net_resolution_minutes, 40);
    }

    #[test]
    fn minutes_are_floored() {
        let reg = registry();
        let record = TicketRecord {
            id: "T-9".into(),
            created_at: t0(),
            priority: "critical".into(),
            current_status: "new".into(),
            assignee: None,
            events: vec![],
        };
        let eval = evaluate(&record, &reg, t0() + Duration::seconds(119));
        assert_eq!(eval.response_elapsed_minutes, 1);
    }
}
