//! axiom CLI - a thin front end over axiom-core

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;

use axiom_core::{Graph, Node};

#[derive(Parser)]
#[command(name = "axiom")]
#[command(about = "An in-memory symbolic knowledge graph with a forward-chaining rule engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose tracing output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a fact/rule file and run it to a fixpoint
    Run {
        /// Fact/rule file, in the `atom`/`rule` line format
        file: PathBuf,

        /// Run a single pass instead of iterating to a fixpoint
        #[arg(long)]
        once: bool,

        /// Suppress per-deduction diagnostic lines, printing only the summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Load a fact/rule file and evaluate a one-shot query against it
    Query {
        /// Fact/rule file, in the `atom`/`rule` line format
        file: PathBuf,

        /// A pattern such as `likes(X, bob)`; uppercase/`_`-prefixed names are variables
        pattern: String,
    },

    /// Load a fact/rule file, run it to a fixpoint, and write a binary snapshot
    Save {
        /// Fact/rule file, in the `atom`/`rule` line format
        file: PathBuf,

        /// Destination snapshot path
        snapshot: PathBuf,
    },

    /// Load a binary snapshot and print a summary of its contents
    Load {
        /// Snapshot path previously written by `save`
        snapshot: PathBuf,
    },

    /// Parse a fact/rule file and validate every rule is range-restricted
    Check {
        /// Fact/rule file, in the `atom`/`rule` line format
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("axiom=debug").init();
    }
    axiom_core::monitoring::init();

    match cli.command {
        Commands::Run { file, once, quiet } => run_command(file, once, quiet),
        Commands::Query { file, pattern } => query_command(file, pattern),
        Commands::Save { file, snapshot } => save_command(file, snapshot),
        Commands::Load { snapshot } => load_command(snapshot),
        Commands::Check { file } => check_command(file),
    }
}

fn load_graph(file: &PathBuf) -> Result<Graph> {
    let contents = fs::read_to_string(file)
        .with_context(|| format!("failed to read fact/rule file: {}", file.display()))?;
    let graph = Graph::new();
    let report = axiom_core::load_str(&graph, &contents)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    println!(
        "{} loaded {} facts, {} rules",
        "→".blue(),
        report.facts_asserted,
        report.rules_asserted
    );
    Ok(graph)
}

fn run_command(file: PathBuf, once: bool, quiet: bool) -> Result<()> {
    let graph = load_graph(&file)?;

    println!("{} running to {}...", "→".blue(), if once { "one pass" } else { "fixpoint" });
    let report = if quiet {
        axiom_core::run(&graph, once)
    } else {
        axiom_core::run_with_diagnostics(&graph, once, |line, important| {
            if important {
                println!("{} {}", "!".red(), line.red());
            } else {
                println!("{} {}", "+".green(), line);
            }
        })
    };

    println!("\n{} Run summary", "═".blue().bold());
    println!("{} Iterations: {}", "▸".blue(), report.iterations);
    println!("{} Deductions: {}", "▸".blue(), report.deductions);
    if report.has_contradiction() {
        println!(
            "{} Contradictions: {}",
            "▸".red(),
            report.contradictions.len()
        );
    } else {
        println!("{} Contradictions: {}", "▸".blue(), 0);
    }

    Ok(())
}

fn query_command(file: PathBuf, pattern: String) -> Result<()> {
    let graph = load_graph(&file)?;

    let (condition, variables) = axiom_core::parse_condition(&graph, &pattern)
        .with_context(|| format!("failed to parse query pattern `{pattern}`"))?;

    let bindings = axiom_core::apply_rule(&graph, condition);

    if bindings.is_empty() {
        println!("{} no bindings satisfy `{}`", "✗".red(), pattern);
        return Ok(());
    }

    println!("{} {} binding(s) for `{}`", "✓".green(), bindings.len(), pattern);
    for (i, binding) in bindings.iter().enumerate() {
        let mut names: Vec<&String> = variables.keys().collect();
        names.sort();
        let resolved: Vec<String> = names
            .into_iter()
            .map(|name| {
                let node = variables[name];
                let value = binding.get(&node).copied().unwrap_or(node);
                format!("{name} = {}", display_name(&graph, value))
            })
            .collect();
        println!("  {} {}", format!("[{i}]").blue(), resolved.join(", "));
    }

    Ok(())
}

fn save_command(file: PathBuf, snapshot: PathBuf) -> Result<()> {
    let graph = load_graph(&file)?;
    let report = axiom_core::run(&graph, false);
    if report.has_contradiction() {
        println!(
            "{} {} contradiction(s) raised while running to fixpoint",
            "!".yellow(),
            report.contradictions.len()
        );
    }

    axiom_core::save(&graph, &snapshot)
        .with_context(|| format!("failed to write snapshot to {}", snapshot.display()))?;
    println!("{} snapshot written to {}", "✓".green(), snapshot.display());
    Ok(())
}

fn load_command(snapshot: PathBuf) -> Result<()> {
    let graph = axiom_core::load(&snapshot)
        .with_context(|| format!("failed to read snapshot from {}", snapshot.display()))?;

    let nodes = graph.store().all_nodes();
    let names = graph.naming().all_entries();
    println!("{} snapshot loaded from {}", "✓".green(), snapshot.display());
    println!("{} Nodes: {}", "▸".blue(), nodes.len());
    println!("{} Names: {}", "▸".blue(), names.len());
    Ok(())
}

fn check_command(file: PathBuf) -> Result<()> {
    let graph = load_graph(&file)?;

    let causes = graph.predicates().causes;
    let rules = graph.store().left_of(causes);
    let mut unsafe_rules = 0;

    for rule in &rules {
        let Some(parsed) = graph.parse_fact(*rule) else { continue };
        let condition_vars = collect_variables(&graph, parsed.subject);

        for deduction in &parsed.objects {
            if *deduction == graph.predicates().contradiction {
                continue;
            }
            let deduction_vars = collect_variables(&graph, *deduction);
            let unbound: Vec<Node> = deduction_vars.difference(&condition_vars).copied().collect();
            if !unbound.is_empty() {
                unsafe_rules += 1;
                println!(
                    "{} rule {} has {} unbound variable(s) in its conclusion",
                    "✗".red(),
                    rule,
                    unbound.len()
                );
            }
        }
    }

    println!(
        "\n{} {} rule(s) checked, {} unsafe",
        "═".blue().bold(),
        rules.len(),
        unsafe_rules
    );

    if unsafe_rules > 0 {
        bail!("{unsafe_rules} rule(s) reference a conclusion variable never bound by their condition");
    }
    println!("{} every rule is range-restricted", "✓".green());
    Ok(())
}

/// Every variable node reachable by walking `node`'s fact/conjunction
/// structure, cycle-guarded the same way `traversal::format_fact` is.
fn collect_variables(graph: &Graph, node: Node) -> HashSet<Node> {
    let mut out = HashSet::new();
    collect_variables_inner(graph, node, &mut Vec::new(), &mut out);
    out
}

fn collect_variables_inner(graph: &Graph, node: Node, history: &mut Vec<Node>, out: &mut HashSet<Node>) {
    if node.is_variable() {
        out.insert(node);
        return;
    }
    if history.contains(&node) {
        return;
    }
    if graph.is_conjunction(node) {
        history.push(node);
        for sub in graph.parse_conjunction(node).unwrap_or_default() {
            collect_variables_inner(graph, sub, history, out);
        }
        history.pop();
        return;
    }
    if let Some(parsed) = graph.parse_fact(node) {
        history.push(node);
        collect_variables_inner(graph, parsed.subject, history, out);
        for object in &parsed.objects {
            collect_variables_inner(graph, *object, history, out);
        }
        history.pop();
    }
}

fn display_name(graph: &Graph, node: Node) -> String {
    graph
        .naming()
        .get_name(node, "en", true)
        .unwrap_or_else(|| node.to_string())
}
