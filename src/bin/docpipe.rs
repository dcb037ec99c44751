//! CLI binary for docpipe.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use docpipe::{
    analyze_many, derive_actions, filter_by_priority, AnalysisOutput, PipelineConfig,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

/// Classify business PDFs and extract typed metadata.
#[derive(Parser, Debug)]
#[command(name = "docpipe", version, about, long_about = None)]
struct Cli {
    /// PDF files to analyse.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Emit one JSON object per document instead of the human summary.
    #[arg(long)]
    json: bool,

    /// Include derived follow-up actions in the output.
    #[arg(long)]
    actions: bool,

    /// With --actions: keep only actions of this exact priority
    /// (low, medium, high; case-sensitive).
    #[arg(long, requires = "actions")]
    priority: Option<String>,

    /// Model identifier.
    #[arg(short, long, env = "DOCPIPE_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// Page cap for classification input.
    #[arg(long, default_value_t = 10)]
    max_pages: usize,

    /// PDF user password for encrypted documents.
    #[arg(long)]
    password: Option<String>,

    /// Concurrent documents when analysing a batch.
    #[arg(short = 'j', long, default_value_t = 4)]
    concurrency: usize,

    /// Verbose logging (repeat for more).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut builder = PipelineConfig::builder()
        .model(&cli.model)
        .max_pages_classification(cli.max_pages);
    if let Some(pwd) = &cli.password {
        builder = builder.password(pwd);
    }
    let config = builder.build().context("invalid configuration")?;

    let batch = cli.inputs.len() > 1;
    let bar = if batch && !cli.json {
        Some(progress_bar(cli.inputs.len()))
    } else {
        None
    };

    let results = analyze_many(&cli.inputs, &config, cli.concurrency).await;

    let mut failures = 0usize;
    let mut total_input_tokens = 0u64;
    let mut total_output_tokens = 0u64;
    let mut total_cost = 0.0f64;

    for (path, result) in &results {
        if let Some(bar) = &bar {
            bar.inc(1);
        }
        match result {
            Ok(output) => {
                total_input_tokens += output.stats.input_tokens;
                total_output_tokens += output.stats.output_tokens;
                total_cost += output.stats.estimated_cost_usd;
                if cli.json {
                    print_json(output, &cli)?;
                } else {
                    print_summary(path, output, &cli, bar.as_ref());
                }
            }
            Err(e) => {
                failures += 1;
                let line = format!("{} {}: {e}", red("✗"), path.display());
                match &bar {
                    Some(bar) => bar.println(line),
                    None => eprintln!("{line}"),
                }
            }
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    if !cli.json {
        eprintln!(
            "\n{} {} document(s), {} failed  {}",
            cyan("◆"),
            results.len(),
            failures,
            dim(&format!(
                "tokens: {total_input_tokens} in / {total_output_tokens} out (~${total_cost:.4})"
            )),
        );
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("docpipe={default}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar(total: usize) -> ProgressBar {
    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} [{bar:40.green/238}] {pos}/{len} documents  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

fn print_json(output: &AnalysisOutput, cli: &Cli) -> Result<()> {
    let mut value = serde_json::to_value(output)?;
    if cli.actions {
        let actions = selected_actions(output, cli);
        value["actions"] = serde_json::to_value(actions)?;
    }
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_summary(
    path: &std::path::Path,
    output: &AnalysisOutput,
    cli: &Cli,
    bar: Option<&ProgressBar>,
) {
    let classification = &output.entry.classification;
    let mut text = format!(
        "{} {}  {} {}\n",
        green("✓"),
        bold(&path.display().to_string()),
        classification.doc_type,
        dim(&format!("({:.0}% confident)", classification.confidence * 100.0)),
    );

    let metadata = serde_json::to_string_pretty(&output.entry.metadata)
        .unwrap_or_else(|_| "{}".to_string());
    for line in metadata.lines() {
        text.push_str(&format!("    {line}\n"));
    }

    if cli.actions {
        for action in selected_actions(output, cli) {
            let deadline = action
                .deadline
                .as_deref()
                .map(|d| format!(" by {d}"))
                .unwrap_or_default();
            text.push_str(&format!(
                "    → {} [{}]{}  {}\n",
                action.kind,
                action.priority,
                deadline,
                dim(&action.description),
            ));
        }
    }

    match bar {
        Some(bar) => bar.println(text),
        None => print!("{text}"),
    }
}

fn selected_actions(output: &AnalysisOutput, cli: &Cli) -> Vec<docpipe::Action> {
    let actions = derive_actions(&output.entry.metadata);
    match &cli.priority {
        Some(priority) => filter_by_priority(actions, priority),
        None => actions,
    }
}
