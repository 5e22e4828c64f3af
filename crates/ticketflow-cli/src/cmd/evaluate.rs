use crate::output::print_json;
use chrono::{DateTime, Utc};
use ticketflow_core::clock;
use ticketflow_core::dataset::Dataset;
use ticketflow_core::split;

pub fn run(
    dataset: &Dataset,
    ticket_id: &str,
    as_of: DateTime<Utc>,
    json: bool,
) -> anyhow::Result<()> {
    let record = dataset.ticket(ticket_id)?;
    let eval = clock::evaluate(record, &dataset.registry, as_of);
    let tiers = split::split(record, &eval, as_of);

    if json {
        #[derive(serde::Serialize)]
        struct Evaluation<'a> {
            #[serde(flatten)]
            clock: &'a clock::SlaEvaluation,
            tiers: &'a split::TierSplit,
        }
        return print_json(&Evaluation {
            clock: &eval,
            tiers: &tiers,
        });
    }

    println!("Ticket:          {}", record.id);
    println!("Priority:        {}", record.priority);
    println!("Current status:  {}", record.current_status);
    if eval.clock_stopped {
        println!("Clock:           stopped (exempt from SLA evaluation)");
    }
    println!(
        "Response:        {} min elapsed / {} min target{}",
        eval.response_elapsed_minutes,
        eval.targets.response_minutes,
        verdict(eval.response_overdue)
    );
    println!(
        "Resolution:      {} min net ({} raw - {} paused) / {} min target{}",
        eval.net_resolution_minutes,
        eval.raw_resolution_minutes,
        eval.paused_minutes,
        eval.targets.resolution_minutes,
        verdict(eval.resolution_overdue)
    );
    match tiers.escalated_at {
        Some(at) => println!(
            "Tiers:           L1 {} min ({}) → escalated {} → L2 {} min ({})",
            tiers.l1_minutes,
            tiers.l1_handler.as_deref().unwrap_or("unassigned"),
            at.to_rfc3339(),
            tiers.l2_minutes,
            tiers.l2_handler.as_deref().unwrap_or("unassigned"),
        ),
        None => println!(
            "Tiers:           L1 {} min ({}), never escalated",
            tiers.l1_minutes,
            tiers.l1_handler.as_deref().unwrap_or("unassigned"),
        ),
    }
    Ok(())
}

fn verdict(overdue: bool) -> &'static str {
    if overdue {
        "  [BREACHED]"
    } else {
        ""
    }
}
