//! Breach aggregation across a ticket population.
//!
//! Per-ticket evaluation is pure, so the population is embarrassingly
//! parallel: map over tickets, reduce tallies. Tickets sitting in a
//! stop-behavior status are outside the SLA universe entirely — excluded
//! from numerator and denominator both.

use crate::clock::{evaluate, SlaEvaluation};
use crate::split::{split, TierSplit};
use crate::status::StatusRegistry;
use crate::ticket::TicketRecord;
use crate::types::SlaBehavior;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AgentBreakdown {
    pub total: usize,
    pub overdue: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct BreachReport {
    pub as_of: DateTime<Utc>,
    pub total: usize,
    pub overdue_count: usize,
    pub sla_met_percent: f64,
    pub per_agent: BTreeMap<String, AgentBreakdown>,
    /// Ids of overdue tickets, in input order.
    pub breached: Vec<String>,
}

#[derive(Default)]
struct Tally {
    total: usize,
    overdue: usize,
    per_agent: BTreeMap<String, AgentBreakdown>,
    breached: Vec<String>,
}

impl Tally {
    fn add(&mut self, record: &TicketRecord, eval: &SlaEvaluation, tiers: &TierSplit) {
        self.total += 1;
        let handler = if tiers.escalated_at.is_some() {
            tiers.l2_handler.as_ref().or(tiers.l1_handler.as_ref())
        } else {
            tiers.l1_handler.as_ref()
        };
        let key = handler.cloned().unwrap_or_else(|| "unassigned".to_string());
        let entry = self.per_agent.entry(key).or_default();
        entry.total += 1;
        if eval.resolution_overdue {
            self.overdue += 1;
            entry.overdue += 1;
            self.breached.push(record.id.clone());
        }
    }

    fn merge(&mut self, other: Tally) {
        self.total += other.total;
        self.overdue += other.overdue;
        self.breached.extend(other.breached);
        for (agent, breakdown) in other.per_agent {
            let entry = self.per_agent.entry(agent).or_default();
            entry.total += breakdown.total;
            entry.overdue += breakdown.overdue;
        }
    }

    fn into_report(self, as_of: DateTime<Utc>) -> BreachReport {
        let sla_met_percent = if self.total == 0 {
            100.0
        } else {
            (self.total - self.overdue) as f64 / self.total as f64 * 100.0
        };
        BreachReport {
            as_of,
            total: self.total,
            overdue_count: self.overdue,
            sla_met_percent,
            per_agent: self.per_agent,
            breached: self.breached,
        }
    }
}

fn tally_chunk(records: &[TicketRecord], registry: &StatusRegistry, as_of: DateTime<Utc>) -> Tally {
    let mut tally = Tally::default();
    for record in records {
        if registry.behavior_of(&record.current_status) == SlaBehavior::Stop {
            continue;
        }
        let eval = evaluate(record, registry, as_of);
        let tiers = split(record, &eval, as_of);
        tally.add(record, &eval, &tiers);
    }
    tally
}

/// Aggregate serially, in input order.
pub fn aggregate(
    records: &[TicketRecord],
    registry: &StatusRegistry,
    as_of: DateTime<Utc>,
) -> BreachReport {
    let report = tally_chunk(records, registry, as_of).into_report(as_of);
    info!(
        total = report.total,
        overdue = report.overdue_count,
        met_percent = report.sla_met_percent,
        "aggregated breach report"
    );
    report
}

/// Aggregate across a bounded pool of scoped worker threads. Chunk tallies
/// are merged in input order, so the result matches `aggregate` exactly.
pub fn aggregate_parallel(
    records: &[TicketRecord],
    registry: &StatusRegistry,
    as_of: DateTime<Utc>,
) -> BreachReport {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(records.len().max(1));
    if workers <= 1 {
        return aggregate(records, registry, as_of);
    }

    let chunk_size = records.len().div_ceil(workers);
    let mut total = Tally::default();
    std::thread::scope(|scope| {
        let handles: Vec<_> = records
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || tally_chunk(chunk, registry, as_of)))
            .collect();
        for handle in handles {
            let tally = handle.join().expect("aggregation worker panicked");
            total.merge(tally);
        }
    });
    total.into_report(as_of)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
