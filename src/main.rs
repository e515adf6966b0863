// src/main.rs
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use attendance_compliance::{
    config::AppConfig,
    connectivity::ConnectionProbe,
    export, roster, server, InMemoryAttendanceStore, InMemoryDirectory, Importer,
    ResolutionPolicy, ScheduleBook,
};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "attendance-compliance",
    version,
    about = "Timeclock import and attendance compliance"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a timeclock export (CSV, events report, or spreadsheet)
    Import {
        #[arg(long)]
        file: PathBuf,
        /// employees.csv with id,name,external_id,department
        #[arg(long)]
        employees: Option<PathBuf>,
        /// schedules.csv with employee_id,day_of_week,official_entry_time,day_off
        #[arg(long)]
        schedules: Option<PathBuf>,
        /// Write records.csv and summaries.csv here
        #[arg(long)]
        export_dir: Option<PathBuf>,
        /// Drop rows for unknown employees instead of creating them
        #[arg(long)]
        no_create_employees: bool,
    },
    /// Run the ping endpoints
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Check whether the timeclock service answers
    CheckConnection {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

fn load_directory(path: Option<&Path>) -> Result<InMemoryDirectory> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open employees file {}", path.display()))?;
            roster::load_employees(file)
                .with_context(|| format!("Failed to load employees from {}", path.display()))
        }
        None => Ok(InMemoryDirectory::new()),
    }
}

fn load_schedule_book(path: Option<&Path>) -> Result<ScheduleBook> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open schedules file {}", path.display()))?;
            roster::load_schedules(file)
                .with_context(|| format!("Failed to load schedules from {}", path.display()))
        }
        None => Ok(ScheduleBook::new()),
    }
}

fn run_import(
    config: &AppConfig,
    file: &Path,
    employees: Option<&Path>,
    schedules: Option<&Path>,
    export_dir: Option<&Path>,
    no_create_employees: bool,
) -> Result<()> {
    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let policy = if no_create_employees {
        ResolutionPolicy::DropMissing
    } else {
        config.resolution_policy()
    };

    let mut importer = Importer::new(
        load_directory(employees)?,
        load_schedule_book(schedules)?,
        InMemoryAttendanceStore::new(),
    )
    .with_policy(policy);

    let filename = file.file_name().and_then(|name| name.to_str());
    let today = chrono::Local::now().date_naive();
    let outcome = match importer.import(&bytes, filename, today) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e.user_message());
            return Err(e).context("Import failed");
        }
    };

    println!(
        "{} records created, {} duplicates skipped, {} unresolved rows, {} rejected rows",
        outcome.records_created,
        outcome.duplicates_skipped,
        outcome.unresolved_rows,
        outcome.rejected_rows
    );
    for summary in &outcome.summaries {
        let name = importer
            .directory()
            .employees()
            .find(|e| e.id == summary.employee)
            .map(|e| e.name.as_str())
            .unwrap_or("?");
        println!(
            "{} ({}..{}): {} [{:?}]",
            name, summary.date_from, summary.date_to, summary.verdict_text, summary.status
        );
    }

    if let Some(dir) = export_dir {
        export::export_to_dir(
            dir,
            importer.directory(),
            importer.store().records(),
            importer.store().summaries(),
        )
        .with_context(|| format!("Failed to export to {}", dir.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded.");

    match cli.command {
        Command::Import {
            file,
            employees,
            schedules,
            export_dir,
            no_create_employees,
        } => run_import(
            &config,
            &file,
            employees.as_deref(),
            schedules.as_deref(),
            export_dir.as_deref(),
            no_create_employees,
        ),
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.server_host = host;
            }
            if let Some(port) = port {
                config.server_port = port;
            }
            server::serve(&config)
                .await
                .context("Ping server stopped with an error")
        }
        Command::CheckConnection { host, port } => {
            let host = host.unwrap_or_else(|| config.zk_host.clone());
            let port = port.unwrap_or(config.zk_port);
            let probe = ConnectionProbe::new(
                &host,
                port,
                Duration::from_secs(config.probe_timeout_secs),
            )?;
            let report = probe.check().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if report.is_reachable() {
                Ok(())
            } else {
                anyhow::bail!("Timeclock service at {}:{} is unreachable", host, port)
            }
        }
    }
}
