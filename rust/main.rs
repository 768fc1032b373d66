use sales_dashboard::config::{ConfigOverrides, DashboardConfig};
use sales_dashboard::observability::init_tracing;
use sales_dashboard::{DashboardBuilder, IngestionContext, IngestionFormat, Report, Table};

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "sales-dashboard")]
#[command(about = "Build sales dashboard reports from a CSV, JSON or XML dataset")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Source selection shared by every subcommand
#[derive(ClapArgs)]
struct SourceArgs {
    /// Dataset to ingest (default: SALES_DASHBOARD_INPUT or datasets/Financials.csv)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Ingestion format: csv, json or xml (default: from the file extension)
    #[arg(short, long)]
    format: Option<IngestionFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report bundle and write it as JSON
    Build {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Report id to build; repeat for several (default: all)
        #[arg(short, long = "report")]
        reports: Vec<Report>,
    },
    /// Print a single report table
    Report {
        /// Report id (e.g. profit-by-country)
        id: Report,

        #[command(flatten)]
        source: SourceArgs,
    },
    /// List the columns of the ingested table
    Columns {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = DashboardConfig::load(overrides_for(&args.command))?;
    init_tracing(&config.log_level);

    match args.command {
        Commands::Build { output, .. } => build(&config, output),
        Commands::Report { id, .. } => print_report(&config, id),
        Commands::Columns { .. } => print_columns(&config),
    }
}

/// Command-line values that take precedence over the environment.
fn overrides_for(command: &Commands) -> ConfigOverrides {
    let (source, reports) = match command {
        Commands::Build { source, reports, .. } => {
            (source, (!reports.is_empty()).then(|| reports.clone()))
        }
        Commands::Report { id, source } => (source, Some(vec![*id])),
        Commands::Columns { source } => (source, None),
    };
    ConfigOverrides {
        input: source.input.clone(),
        format: source.format,
        reports,
        ..Default::default()
    }
}

fn build(config: &DashboardConfig, output: Option<PathBuf>) -> Result<()> {
    let dashboard = DashboardBuilder::from_config(config)
        .build()
        .with_context(|| format!("Failed to build dashboard from {}", config.input.display()))?;
    let json = serde_json::to_string_pretty(&dashboard.bundle()?)?;

    match output {
        Some(path) => {
            fs::write(&path, json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {} reports to {}", dashboard.reports().len(), path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn print_report(config: &DashboardConfig, report: Report) -> Result<()> {
    let dashboard = DashboardBuilder::from_config(config)
        .reports(vec![report])
        .build()?;

    println!("{}", report.title());
    if let Some(table) = dashboard.report(report) {
        print_table(table);
    }
    Ok(())
}

fn print_columns(config: &DashboardConfig) -> Result<()> {
    let table = IngestionContext::for_format(config.resolved_format()?).ingest(&config.input)?;
    println!("{} rows", table.height());
    for series in table.frame().get_columns() {
        println!("  {:<24} {}", series.name(), series.dtype());
    }
    Ok(())
}

fn print_table(table: &Table) {
    match table.index() {
        Some(labels) => {
            let frame = table.frame();
            for (row, label) in labels.iter().enumerate() {
                let cells: Vec<String> = frame
                    .get_columns()
                    .iter()
                    .map(|s| s.get(row).map(|v| v.to_string()).unwrap_or_default())
                    .collect();
                println!("{:<20} {}", label, cells.join("  "));
            }
            println!("columns: {}", table.column_names().join(", "));
        }
        None => println!("{}", table.frame()),
    }
}
