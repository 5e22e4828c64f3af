use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use ticketflow_core::dataset::Dataset;
use uuid::Uuid;

#[derive(Subcommand)]
pub enum WorkflowSubcommand {
    /// List workflows and templates
    List,
    /// Show a workflow's nodes and transitions
    Show { name: String },
    /// Re-validate a workflow's structural invariants
    Check { name: String },
    /// Clone a template into a fresh instance workflow
    Clone { template: String, name: String },
}

pub fn run(mut dataset: Dataset, subcmd: WorkflowSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        WorkflowSubcommand::List => list(&dataset, json),
        WorkflowSubcommand::Show { name } => show(&dataset, &name, json),
        WorkflowSubcommand::Check { name } => check(&dataset, &name),
        WorkflowSubcommand::Clone { template, name } => clone(&mut dataset, &template, &name, json),
    }
}

fn find_graph(dataset: &Dataset, name: &str) -> anyhow::Result<Uuid> {
    dataset
        .store
        .find_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("workflow not found: {name}"))
}

fn list(dataset: &Dataset, json: bool) -> anyhow::Result<()> {
    #[derive(serde::Serialize)]
    struct WorkflowSummary {
        name: String,
        template: bool,
        nodes: usize,
        transitions: usize,
    }

    let mut summaries: Vec<WorkflowSummary> = Vec::new();
    for id in dataset.store.ids() {
        let summary = dataset.store.with_graph(id, |g| WorkflowSummary {
            name: g.name.clone(),
            template: g.is_template,
            nodes: g.nodes.len(),
            transitions: g.transitions.len(),
        })?;
        summaries.push(summary);
    }
    summaries.sort_by(|a, b| a.name.cmp(&b.name));

    if json {
        return print_json(&summaries);
    }
    let rows = summaries
        .into_iter()
        .map(|s| {
            vec![
                s.name,
                if s.template { "template" } else { "instance" }.to_string(),
                s.nodes.to_string(),
                s.transitions.to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "KIND", "NODES", "TRANSITIONS"], rows);
    Ok(())
}

fn show(dataset: &Dataset, name: &str, json: bool) -> anyhow::Result<()> {
    let id = find_graph(dataset, name)?;
    if json {
        let graph = dataset.store.with_graph(id, |g| g.clone())?;
        return print_json(&graph);
    }

    let (entry, pairs) = dataset.store.with_graph(id, |g| {
        let entry = g
            .entry_node()
            .and_then(|n| dataset.registry.get(n.status_id).ok())
            .map(|s| s.code.clone());
        let pairs = g.transition_code_pairs(&dataset.registry);
        (entry, pairs)
    })?;
    let pairs = pairs.context("workflow references unknown statuses")?;

    println!("Workflow: {name}");
    println!("Entry:    {}", entry.as_deref().unwrap_or("(none)"));
    let rows = pairs
        .into_iter()
        .map(|(from, to)| vec![from, to])
        .collect();
    print_table(&["FROM", "TO"], rows);
    Ok(())
}

fn check(dataset: &Dataset, name: &str) -> anyhow::Result<()> {
    let id = find_graph(dataset, name)?;
    dataset
        .store
        .with_graph(id, |g| g.validate(&dataset.registry))?
        .with_context(|| format!("workflow '{name}' failed validation"))?;
    println!("Workflow '{name}' is structurally valid");
    Ok(())
}

fn clone(dataset: &mut Dataset, template: &str, name: &str, json: bool) -> anyhow::Result<()> {
    let source_id = find_graph(dataset, template)?;
    let clone_id = dataset
        .store
        .clone_graph(source_id, name)
        .with_context(|| format!("failed to clone workflow '{template}'"))?;

    let (nodes, transitions) = dataset
        .store
        .with_graph(clone_id, |g| (g.nodes.len(), g.transitions.len()))?;
    if json {
        #[derive(serde::Serialize)]
        struct CloneResult<'a> {
            template: &'a str,
            name: &'a str,
            nodes: usize,
            transitions: usize,
        }
        return print_json(&CloneResult {
            template,
            name,
            nodes,
            transitions,
        });
    }
    println!("Cloned '{template}' into '{name}': {nodes} nodes, {transitions} transitions");
    Ok(())
}
