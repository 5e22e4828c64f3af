use crate::output::{print_json, print_table};
use chrono::{DateTime, Utc};
use ticketflow_core::dataset::Dataset;
use ticketflow_core::report;

pub fn run(dataset: &Dataset, as_of: DateTime<Utc>, json: bool) -> anyhow::Result<()> {
    let report = report::aggregate_parallel(&dataset.tickets, &dataset.registry, as_of);

    if json {
        return print_json(&report);
    }

    println!(
        "Tickets: {}   Overdue: {}   SLA met: {:.1}%",
        report.total, report.overdue_count, report.sla_met_percent
    );
    if !report.breached.is_empty() {
        println!("Breached: {}", report.breached.join(", "));
    }
    if !report.per_agent.is_empty() {
        let rows = report
            .per_agent
            .iter()
            .map(|(agent, b)| vec![agent.clone(), b.total.to_string(), b.overdue.to_string()])
            .collect();
        print_table(&["AGENT", "TICKETS", "OVERDUE"], rows);
    }
    Ok(())
}
