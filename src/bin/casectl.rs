//! Command line driver for cx-lab.
//!
//! Local subcommands work on JSON files without a server; `analyze`, `status`
//! and `cancel` talk to a running API.
//!
//! Usage:
//!   cargo run --bin casectl -- scenarios
//!   cargo run --bin casectl -- generate --project project.json
//!   cargo run --bin casectl -- refine --report report.json --input "focus on budget"
//!   cargo run --bin casectl -- render --report report.json
//!   cargo run --bin casectl -- regenerate --project story.json --report story_report.json
//!   cargo run --bin casectl -- wizard --project project.json --refine "faster timeline"
//!   cargo run --bin casectl -- analyze --project project.json

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cx_lab::catalog::{BOOKS, DATA_SOURCES, GOALS, SCENARIOS, resolve_scenario};
use cx_lab::client::AnalysisClient;
use cx_lab::config::{Config, log_filter};
use cx_lab::pipeline::agent_by_name;
use cx_lab::project::{ProjectData, ReportKind};
use cx_lab::report::{
    Report, generate_report, refine_report, regenerate_story, render_text, report_filename,
};
use cx_lab::wizard::{Wizard, WizardStep};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "casectl")]
#[command(about = "cx-lab business case utilities", long_about = None)]
struct Cli {
    /// Print JSON instead of rendered text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the scenario catalog, report goals, data sources and story books
    Scenarios,
    /// Generate a report locally from a project file
    Generate {
        #[arg(long)]
        project: PathBuf,
        /// Write the report JSON here as well
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Apply refinement text to a saved report
    Refine {
        #[arg(long)]
        report: PathBuf,
        #[arg(long)]
        input: String,
    },
    /// Write the next revision of a saved story report
    Regenerate {
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        report: PathBuf,
    },
    /// Render a saved report as plain text
    Render {
        #[arg(long)]
        report: PathBuf,
        /// Write to <out>/<project_id>.txt instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Walk the four wizard steps locally
    Wizard {
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        refine: Option<String>,
    },
    /// Run the analysis pipeline on a server and wait for the result
    Analyze {
        #[arg(long)]
        project: PathBuf,
        #[arg(long)]
        refine: Option<String>,
    },
    /// Show a remote session's status
    Status { session_id: String },
    /// Cancel a remote session
    Cancel { session_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter().as_str())
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();
    let config = Config::load()?;

    match cli.command {
        Commands::Scenarios => scenarios(cli.json),
        Commands::Generate { project, out } => generate(&project, out.as_deref(), cli.json),
        Commands::Refine { report, input } => refine(&report, &input, cli.json),
        Commands::Regenerate { project, report } => regenerate(&project, &report, cli.json),
        Commands::Render { report, out } => render(&report, out.as_deref()),
        Commands::Wizard { project, refine } => wizard(&project, refine.as_deref(), cli.json),
        Commands::Analyze { project, refine } => {
            analyze(&config, &project, refine.as_deref(), cli.json).await
        }
        Commands::Status { session_id } => {
            let client = AnalysisClient::from_config(&config)?;
            let status = client.status(&session_id).await?;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Commands::Cancel { session_id } => {
            let client = AnalysisClient::from_config(&config)?;
            let status = client.cancel(&session_id).await?;
            println!("Cancelled {} ({:?})", status.session_id, status.status);
            Ok(())
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn load_project(path: &Path) -> Result<ProjectData> {
    let project: ProjectData = read_json(path)?;
    project.validate()?;
    if project.kind != ReportKind::Story && !project.business_scenario.trim().is_empty() {
        resolve_scenario(&project.business_scenario)?;
    }
    Ok(project)
}

fn print_report(report: &Report, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", render_text(report));
    }
    Ok(())
}

fn scenarios(json: bool) -> Result<()> {
    if json {
        let catalog = serde_json::json!({
            "scenarios": SCENARIOS,
            "goals": GOALS,
            "data_sources": DATA_SOURCES,
            "books": BOOKS,
        });
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }
    for s in SCENARIOS {
        println!("{:<36} {:<14} {}", s.title, s.industry, s.complexity);
        println!("    {}", s.description);
    }
    println!("\nReport goals:");
    for goal in GOALS {
        println!("  {}", goal);
    }
    println!("\nData sources:");
    for source in DATA_SOURCES {
        println!("  {}", source);
    }
    println!("\nBooks for story rewrites:");
    for book in BOOKS {
        println!("  {} ({}, {})", book.title, book.author, book.period);
    }
    Ok(())
}

fn generate(project: &Path, out: Option<&Path>, json: bool) -> Result<()> {
    let project = load_project(project)?;
    let report = generate_report(&project);
    if let Some(out) = out {
        std::fs::write(out, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("writing {}", out.display()))?;
        eprintln!("Saved {} to {}", report.project_id, out.display());
    }
    print_report(&report, json)
}

fn refine(report: &Path, input: &str, json: bool) -> Result<()> {
    if input.trim().is_empty() {
        anyhow::bail!("refinement input cannot be empty");
    }
    let original: Report = read_json(report)?;
    let refined = refine_report(&original, input);
    print_report(&refined, json)
}

fn regenerate(project: &Path, report: &Path, json: bool) -> Result<()> {
    let project = load_project(project)?;
    let previous: Report = read_json(report)?;
    let next = regenerate_story(&previous, &project)?;
    print_report(&next, json)
}

fn render(report: &Path, out: Option<&Path>) -> Result<()> {
    let report: Report = read_json(report)?;
    let text = render_text(&report);
    match out {
        Some(dir) => {
            let path = dir.join(report_filename(&report));
            std::fs::write(&path, text).with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

fn wizard(project: &Path, refinement: Option<&str>, json: bool) -> Result<()> {
    let project = load_project(project)?;
    let mut wizard = Wizard::new(project.kind);
    wizard.project = project;

    for step in WizardStep::ALL {
        let state = if wizard.is_step_complete(step) { "complete" } else { "incomplete" };
        eprintln!("[{}] {}: {}", step.index(), step.label(), state);
    }

    wizard.advance()?;
    wizard.run_local_analysis()?;
    eprintln!("Reached step {}: {}", wizard.current_step.index(), wizard.current_step.label());

    if let Some(input) = refinement {
        wizard.refine(input)?;
    }
    let report = wizard
        .active_report()
        .context("wizard finished without a report")?;
    print_report(report, json)
}

async fn analyze(config: &Config, project: &Path, refinement: Option<&str>, json: bool) -> Result<()> {
    let project = load_project(project)?;
    if project.kind == ReportKind::Story {
        anyhow::bail!("story projects are written locally; use `casectl wizard`");
    }
    let client = AnalysisClient::from_config(config)?;

    let created = client.create(&project.to_analysis_request()).await?;
    eprintln!("{}", created.message);
    eprintln!("Session {}", created.session_id);

    let mut seen = 0;
    let status = client
        .wait_for_completion(&created.session_id, |status| {
            for agent in status.completed_agents.iter().skip(seen) {
                let name = agent_by_name(agent).map_or(agent.as_str(), |a| a.display_name);
                eprintln!("  done: {}", name);
            }
            seen = status.completed_agents.len();
            eprintln!("  progress {}%", status.progress_percentage);
        })
        .await?;

    if let Some(input) = refinement {
        let refined = client.refine(&created.session_id, input).await?;
        return print_report(&refined, json);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&status.result)?);
    } else {
        print!("{}", client.report_text(&created.session_id).await?);
    }
    Ok(())
}
