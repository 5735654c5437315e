use clap::Parser;
use solarleads::application::summarize::RunSummary;
use solarleads::cli::commands::{Cli, Commands, RunArgs};
use solarleads::config::load_app_config;
use solarleads::domain::entities::run_session::RunSession;
use solarleads::domain::error::DomainError;
use solarleads::domain::values::run_status::RunStatus;
use solarleads::infrastructure::collectors::records_file::RecordsFileCollector;
use solarleads::SolarLeads;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match load_app_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let app = match SolarLeads::new(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Error initializing solarleads: {e}");
            std::process::exit(1);
        }
    };

    match run_command(&app, cli.into_command()).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the command ran but the outcome is a failure.
async fn run_command(app: &SolarLeads, cmd: Commands) -> Result<bool, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Run(args) => run(app, args).await,
        Commands::History { limit } => {
            let runs = app.history(limit)?;
            if runs.is_empty() {
                println!("No runs recorded.");
            }
            for r in runs {
                println!(
                    "{}  {:<9}  {:<20}  leads={:<4} failed_sources={}  {}",
                    r.started_at.format("%Y-%m-%d %H:%M:%S"),
                    r.status,
                    r.target_location,
                    r.lead_count,
                    r.failed_sources,
                    r.id
                );
            }
            Ok(true)
        }
        Commands::LockStatus => {
            match app.lock_status()? {
                Some(status) => println!("{}", serde_json::to_string_pretty(&status)?),
                None => println!("No run lock held."),
            }
            Ok(true)
        }
    }
}

async fn run(app: &SolarLeads, args: RunArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let records = args
        .records
        .iter()
        .map(|spec| RecordsFileCollector::from_spec(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let sources = app.default_sources(records, !args.no_reddit);

    let session = match app.run(args.location.as_deref(), &sources).await {
        Ok(s) => s,
        Err(e @ DomainError::ConcurrentRun { .. }) => {
            eprintln!("{e}. Try again later.");
            return Ok(false);
        }
        Err(e) => return Err(e.into()),
    };

    for export in app.export(&session).await {
        match export.result {
            Ok(dest) => println!("{}: {dest}", export.sink),
            Err(e) => eprintln!("{}: failed ({e})", export.sink),
        }
    }
    print_summary(&session, app.config().report_top_n);
    Ok(session.status() == RunStatus::Completed)
}

fn print_summary(session: &RunSession, top_n: usize) {
    let summary = RunSummary::from_session(session, top_n);
    println!();
    println!("Run {} for {}: {}", summary.run_id, summary.target_location, summary.status);
    if let Some(err) = &summary.error_message {
        println!("  error: {err}");
    }
    println!(
        "  leads: {} (hot {}, warm {}, cold {})",
        summary.total_leads, summary.hot, summary.warm, summary.cold
    );
    for o in &summary.outcomes {
        let status = if o.timed_out {
            "timeout".to_string()
        } else {
            o.status.to_string()
        };
        println!(
            "  {:<24} {:<8} leads={:<4} fetched={:<4} filtered={:<4} dupes={:<4} rejected={}",
            o.source, status, o.count, o.fetched, o.filtered, o.duplicates, o.rejected
        );
        if let Some(err) = &o.error_message {
            println!("  {:<24} {err}", "");
        }
    }
}
