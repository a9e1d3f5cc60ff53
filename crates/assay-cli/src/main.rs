use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use assay_core::document::{ingest, schema_warnings};
use assay_core::{
    format_currency, normalize_role, parse_amount, scenario_analysis, AnalysisDocument, Pipeline,
    PipelineStatus, PolicyConfig, Scenario, Warning,
};

#[derive(Parser)]
#[command(name = "assay", version, about = "Validate and correct model-generated value assessments")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the correction pipeline over an assessment
    Validate {
        /// Assessment document (JSON or YAML)
        input: PathBuf,
        /// Policy overrides (YAML)
        #[arg(long)]
        policy: Option<PathBuf>,
        /// Write the corrected document here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Print a run report to stderr
        #[arg(long)]
        report: bool,
    },
    /// Schema and ingestion diagnostics only; the document is not corrected
    Check {
        input: PathBuf,
        #[arg(long)]
        policy: Option<PathBuf>,
    },
    /// Resolve a free-text role label against the role table
    Role {
        label: String,
        /// Business function of the record, used as a fallback
        #[arg(long)]
        function: Option<String>,
        #[arg(long)]
        policy: Option<PathBuf>,
    },
    /// Three-scenario projection for a benefit and implementation cost
    Project {
        /// Annual benefit, e.g. "$1.2M"
        #[arg(long)]
        benefit: String,
        /// Implementation cost, e.g. "500K"
        #[arg(long)]
        cost: String,
        /// Annual run cost
        #[arg(long)]
        run_cost: Option<String>,
        #[arg(long)]
        discount_rate: Option<f64>,
        #[arg(long)]
        policy: Option<PathBuf>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunReport {
    input: String,
    generated_at: String,
    status: PipelineStatus,
    warning_count: usize,
    warnings_by_kind: BTreeMap<&'static str, usize>,
    benefits_capped: Option<bool>,
    cap_scale_factor: Option<f64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate {
            input,
            policy,
            output,
            report,
        } => run_validate(&input, policy.as_deref(), output.as_deref(), report),
        Commands::Check { input, policy } => run_check(&input, policy.as_deref()),
        Commands::Role {
            label,
            function,
            policy,
        } => run_role(&label, function.as_deref(), policy.as_deref()),
        Commands::Project {
            benefit,
            cost,
            run_cost,
            discount_rate,
            policy,
        } => run_project(&benefit, &cost, run_cost.as_deref(), discount_rate, policy.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn load_policy(path: Option<&Path>) -> Result<PolicyConfig> {
    match path {
        Some(path) => PolicyConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load policy {}", path.display())),
        None => Ok(PolicyConfig::default()),
    }
}

fn load_document(path: &Path) -> Result<AnalysisDocument> {
    AnalysisDocument::from_file(path).with_context(|| format!("Failed to read assessment {}", path.display()))
}

fn count_by_kind(warnings: &[Warning]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for warning in warnings {
        *counts.entry(warning.kind.as_str()).or_insert(0) += 1;
    }
    counts
}

fn run_validate(input: &Path, policy: Option<&Path>, output: Option<&Path>, report: bool) -> Result<()> {
    let config = load_policy(policy)?;
    let document = load_document(input)?;

    let outcome = Pipeline::new(config).run(&document);
    tracing::info!(status = ?outcome.status, warnings = outcome.warnings.len(), "Validation finished");

    let json = outcome
        .document
        .to_json_pretty()
        .context("Failed to serialize corrected document")?;
    match output {
        Some(path) => fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{}", json),
    }

    if report {
        let run = RunReport {
            input: input.display().to_string(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            status: outcome.status,
            warning_count: outcome.warnings.len(),
            warnings_by_kind: count_by_kind(&outcome.warnings),
            benefits_capped: outcome.document.benefits_capped,
            cap_scale_factor: outcome.document.cap_scale_factor,
        };
        eprintln!("{}", serde_json::to_string_pretty(&run)?);
        for warning in &outcome.warnings {
            eprintln!("  {}", warning);
        }
    }

    Ok(())
}

fn run_check(input: &Path, policy: Option<&Path>) -> Result<()> {
    let config = load_policy(policy)?;
    let document = load_document(input)?;

    let mut warnings = schema_warnings(&document.to_value()?);
    let ingested = ingest(&document, &config);
    warnings.extend(ingested.warnings.iter().cloned());

    let context = &ingested.context;
    println!(
        "Annual revenue: {}",
        context.annual_revenue.map_or_else(|| "unknown".to_string(), format_currency)
    );
    println!(
        "Employees:      {}",
        context.total_employees.map_or_else(|| "unknown".to_string(), |n| format!("{}", n))
    );
    for (step, records) in &ingested.records {
        println!("Step {}: {} record(s)", step, records.len());
    }
    if ingested.legacy_promoted > 0 {
        println!("Readiness records on the 1-5 scale: {}", ingested.legacy_promoted);
    }

    if warnings.is_empty() {
        println!("No issues found");
    } else {
        println!("{} issue(s):", warnings.len());
        for warning in &warnings {
            println!("  {}", warning);
        }
    }
    Ok(())
}

fn run_role(label: &str, function: Option<&str>, policy: Option<&Path>) -> Result<()> {
    let config = load_policy(policy)?;
    let matched = normalize_role(label, function, &config);

    println!("{} ({})", matched.role.name, matched.role.id);
    println!("  match:       {} ({:.2})", matched.confidence.as_str(), matched.score);
    println!("  hourly rate: {}", format_currency(matched.role.hourly_rate));
    Ok(())
}

fn parse_money_arg(name: &str, value: &str) -> Result<f64> {
    parse_amount(value)
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| anyhow!("--{} expects a non-negative amount, got {:?}", name, value))
}

fn run_project(
    benefit: &str,
    cost: &str,
    run_cost: Option<&str>,
    discount_rate: Option<f64>,
    policy: Option<&Path>,
) -> Result<()> {
    let mut config = load_policy(policy)?;
    if let Some(rate) = discount_rate {
        config.projection.discount_rate = rate;
        config.validate().context("Invalid --discount-rate")?;
    }

    let benefit = parse_money_arg("benefit", benefit)?;
    let cost = parse_money_arg("cost", cost)?;
    let run_cost = run_cost.map(|r| parse_money_arg("run-cost", r)).transpose()?.unwrap_or(0.0);

    let analysis = scenario_analysis(benefit, cost, run_cost, None, &config);

    println!(
        "{:<14} {:>14} {:>14} {:>10} {:>8}",
        "Scenario", "Annual benefit", "NPV", "Payback", "IRR"
    );
    for scenario in Scenario::ALL {
        let outcome = analysis.get(scenario);
        let payback = outcome
            .payback_months
            .map_or_else(|| "never".to_string(), |m| format!("{:.1} mo", m));
        let irr = outcome
            .irr
            .map_or_else(|| "n/a".to_string(), |r| format!("{:.1}%", r * 100.0));
        println!(
            "{:<14} {:>14} {:>14} {:>10} {:>8}",
            scenario.as_str(),
            format_currency(outcome.annual_benefit),
            format_currency(outcome.npv),
            payback,
            irr
        );
    }
    println!(
        "Implementation {}, run cost {}/yr, discount rate {:.1}%",
        format_currency(analysis.implementation_cost),
        format_currency(analysis.annual_run_cost),
        analysis.discount_rate * 100.0
    );
    Ok(())
}
