//! # webflow
//!
//! Command-line front end for the flow engine.
//!
//! ## Quick Start
//! ```bash
//! # Run a flow file against the local backend
//! cargo run -- run flow.json
//!
//! # Seed a flow from a prompt, then run it
//! cargo run -- generate "summarize https://example.com" --run
//! ```

// =============================================================================
// IMPORTS
// =============================================================================
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use webflow::{
    generate_graph, heuristic_flow, Config, FlowDefinition, FlowScheduler, GraphStore,
    HttpServiceClient, NodeExecutor, NodeStatus, RunEvent, RunReport,
};

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "webflow",
    version,
    about = "Run graphs of search, crawl, extract, map and QA operations in dependency order",
    long_about = r#"
webflow executes a flow: a small directed graph of web-intelligence operations.
Every node runs once, after all of its parents, and receives the text, URL or
URL list its parents produced.

PREREQUISITES:
  A backend exposing /web_search/search, /extract/, /crawl/, /map/ and
  /flow/generate (default http://127.0.0.1:8000, see WEBFLOW_API_BASE_URL).

EXAMPLES:
  # Run a saved flow and keep the final node states
  webflow run flow.json --output result.json

  # Build a flow from a prompt without calling the generator
  webflow generate --offline "compare Python and JavaScript" --output flow.json
"#
)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL (overrides WEBFLOW_API_BASE_URL)
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a flow definition file
    Run {
        /// Flow file: {"nodes": [...], "edges": [...]}
        #[arg(value_name = "FLOW_FILE")]
        flow: PathBuf,

        /// Write the final graph (with statuses and results) here
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },

    /// Build a flow from a natural-language prompt
    Generate {
        #[arg(value_name = "PROMPT")]
        prompt: String,

        /// Skip the generation service and use the built-in heuristics
        #[arg(long = "offline", default_value = "false")]
        offline: bool,

        /// Run the flow right after generating it
        #[arg(long = "run", default_value = "false")]
        run: bool,

        /// Write the generated (or executed) graph here
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(api_url) = args.api_url {
        config.api_base_url = api_url;
    }

    init_logging(args.verbose, &config.log_level)?;
    config.validate()?;

    info!(
        api = %config.api_base_url,
        max_extract_urls = config.max_extract_urls,
        timeout = ?config.request_timeout,
        "Configuration loaded"
    );

    let mut client = HttpServiceClient::new(&config.api_base_url);
    if let Some(timeout) = config.request_timeout {
        client = client.with_timeout(timeout);
    }
    let client = Arc::new(client);

    match args.command {
        Command::Run { flow, output } => {
            let definition = FlowDefinition::load(&flow)
                .with_context(|| format!("Failed to load flow file {}", flow.display()))?;
            let mut graph = GraphStore::from_definition(definition)?;

            let report = run_flow(&config, client, &mut graph).await;
            print_results(&graph, &report);
            save_output(&graph, output)?;
        }
        Command::Generate {
            prompt,
            offline,
            run,
            output,
        } => {
            let mut graph = if offline {
                info!("Using offline flow heuristics");
                GraphStore::from_definition(heuristic_flow(&prompt))?
            } else {
                generate_graph(client.as_ref(), &prompt).await?
            };

            println!("Generated flow with {} nodes:", graph.len());
            for node in graph.nodes() {
                let parents: Vec<&str> = graph.parents_of(&node.id).iter().map(|p| p.id.as_str()).collect();
                println!("  {} [{}] <- {:?}", node.id, node.kind, parents);
            }

            if run {
                let report = run_flow(&config, client, &mut graph).await;
                print_results(&graph, &report);
            }
            save_output(&graph, output)?;
        }
    }

    Ok(())
}

// =============================================================================
// FLOW EXECUTION
// =============================================================================
/// Run `graph` and stream node progress to stdout while it executes.
async fn run_flow(config: &Config, client: Arc<HttpServiceClient>, graph: &mut GraphStore) -> RunReport {
    let (tx, mut rx) = mpsc::unbounded_channel();

    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::NodeStarted { node_id, kind, .. } => println!("▶ {node_id} ({kind}) running..."),
                RunEvent::NodeFinished { node_id, status, .. } => println!("  {node_id}: {status}"),
                RunEvent::RunStarted { .. } | RunEvent::RunFinished(_) => {}
            }
        }
    });

    let executor = NodeExecutor::new(client).with_max_extract_urls(config.max_extract_urls);
    let scheduler = FlowScheduler::new(executor).with_events(tx);
    let report = scheduler.run(graph).await;

    // Dropping the scheduler closes the channel so the printer can finish.
    drop(scheduler);
    if let Err(e) = progress.await {
        error!(error = %e, "Progress printer stopped unexpectedly");
    }

    report
}

fn print_results(graph: &GraphStore, report: &RunReport) {
    println!("\n{}", "=".repeat(60));
    println!("FLOW RESULTS");
    println!("{}\n", "=".repeat(60));

    for node in graph.nodes() {
        let marker = match node.data.status {
            NodeStatus::Completed => "✔",
            NodeStatus::Error => "✘",
            NodeStatus::Idle | NodeStatus::Running => "·",
        };
        println!("{marker} {} [{}] {}", node.id, node.kind, node.data.status);
        if let Some(result) = &node.data.result {
            for line in result.lines() {
                println!("    {line}");
            }
        }
    }

    println!(
        "\n{} executed, {} completed, {} failed, {} skipped",
        report.executed(),
        report.completed.len(),
        report.failed.len(),
        report.skipped.len()
    );
}

fn save_output(graph: &GraphStore, output: Option<PathBuf>) -> Result<()> {
    if let Some(path) = output {
        graph
            .to_definition()
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Graph written");
    }
    Ok(())
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Initialize the tracing subscriber for structured logging.
fn init_logging(verbose: bool, level: &str) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_run() {
        let args = Args::parse_from(["webflow", "run", "flow.json"]);
        match args.command {
            Command::Run { flow, output } => {
                assert_eq!(flow, PathBuf::from("flow.json"));
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!args.verbose);
    }

    #[test]
    fn test_args_generate_with_flags() {
        let args = Args::parse_from([
            "webflow",
            "--verbose",
            "generate",
            "--offline",
            "--run",
            "--output",
            "out.json",
            "summarize https://example.com",
        ]);

        assert!(args.verbose);
        match args.command {
            Command::Generate {
                prompt,
                offline,
                run,
                output,
            } => {
                assert_eq!(prompt, "summarize https://example.com");
                assert!(offline);
                assert!(run);
                assert_eq!(output, Some(PathBuf::from("out.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_args_api_url_is_global() {
        let args = Args::parse_from(["webflow", "run", "f.json", "--api-url", "http://backend:9000"]);
        assert_eq!(args.api_url.as_deref(), Some("http://backend:9000"));
    }
}
