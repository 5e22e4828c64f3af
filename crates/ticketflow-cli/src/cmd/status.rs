use crate::output::{print_json, print_table};
use clap::Subcommand;
use ticketflow_core::dataset::Dataset;

#[derive(Subcommand)]
pub enum StatusSubcommand {
    /// List statuses in sort order
    List {
        /// Only active statuses
        #[arg(long)]
        active: bool,
    },
}

pub fn run(dataset: &Dataset, subcmd: StatusSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        StatusSubcommand::List { active } => list(dataset, active, json),
    }
}

fn list(dataset: &Dataset, active_only: bool, json: bool) -> anyhow::Result<()> {
    let statuses = dataset.registry.list(active_only);
    if json {
        return print_json(&statuses);
    }
    let rows = statuses
        .iter()
        .map(|s| {
            vec![
                s.code.clone(),
                s.name.clone(),
                s.category.to_string(),
                s.sla_behavior.to_string(),
                if s.is_final { "yes" } else { "no" }.to_string(),
                if s.is_active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["CODE", "NAME", "CATEGORY", "SLA", "FINAL", "ACTIVE"], rows);
    Ok(())
}
