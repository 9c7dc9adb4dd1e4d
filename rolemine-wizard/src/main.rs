//! rolemine-wizard - role mining wizard service
//!
//! `serve` exposes the wizard as a local REST + SSE service. `run` drives one full
//! pass (upload, summary, configure, results) from a directory of CSV files and
//! optionally writes the CSV report.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rolemine_common::config::{resolve_config, ConfigOverrides, FailurePolicy, LoggingConfig, TomlConfig};
use rolemine_common::EventBus;
use rolemine_wizard::config_form::{MiningConfigForm, NumericField};
use rolemine_wizard::ingest;
use rolemine_wizard::results::{ResultsPage, ResultsTab};
use rolemine_wizard::summary_view::SummaryView;
use rolemine_wizard::wizard::WizardController;
use rolemine_wizard::{build_router, AppState};
use std::path::{Path, PathBuf};
use tokio::signal;
use tracing::{error, info, warn};

const EVENT_BUS_CAPACITY: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "rolemine-wizard")]
#[command(about = "Role mining wizard: CSV upload, data summary, mining configuration and results")]
#[command(version)]
struct Cli {
    /// Path to TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Role mining backend base URL
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Backend failure policy: fallback or fail
    #[arg(long, global = true)]
    on_failure: Option<FailurePolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the wizard HTTP service
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Drive the wizard once from a directory of CSV files
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Directory holding users.csv, ou.csv, applications.csv, entitlements.csv, assignment.csv
    #[arg(long)]
    data_dir: PathBuf,

    /// Minimum users per role
    #[arg(long)]
    min_users: Option<String>,

    /// Maximum permissions per role
    #[arg(long)]
    max_permissions: Option<String>,

    /// Minimum permissions per role
    #[arg(long)]
    min_permissions: Option<String>,

    /// Applications to include (comma separated, empty = all)
    #[arg(long, value_delimiter = ',')]
    applications: Vec<String>,

    /// Organizational units to include (comma separated, empty = all)
    #[arg(long, value_delimiter = ',')]
    ous: Vec<String>,

    /// Skip AI suggestions
    #[arg(long)]
    no_ai: bool,

    /// Write the CSV report to this file or directory
    #[arg(long)]
    report: Option<PathBuf>,

    /// Results tab to export: filter or ai
    #[arg(long, default_value = "filter")]
    tab: ResultsTab,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (host, port) = match &cli.command {
        Command::Serve { host, port } => (host.clone(), *port),
        Command::Run(_) => (None, None),
    };
    let overrides = ConfigOverrides {
        backend_url: cli.backend_url.clone(),
        host,
        port,
        on_failure: cli.on_failure,
    };
    let config = resolve_config(cli.config.as_deref(), &overrides).context("Failed to resolve configuration")?;

    init_tracing(&config.logging)?;

    info!(
        "Starting rolemine-wizard v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    info!(
        backend = %config.backend.base_url,
        on_failure = %config.backend.on_failure,
        "Configuration resolved"
    );

    match cli.command {
        Command::Serve { .. } => serve(config).await,
        Command::Run(args) => run_once(config, args).await,
    }
}

/// `RUST_LOG` wins; the configured level is the fallback
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    match &logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn serve(config: TomlConfig) -> Result<()> {
    let controller = WizardController::from_config(&config, EventBus::new(EVENT_BUS_CAPACITY))
        .context("Failed to create backend client")?;
    let app = build_router(AppState::new(controller));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("rolemine-wizard listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn run_once(config: TomlConfig, args: RunArgs) -> Result<()> {
    let controller = WizardController::from_config(&config, EventBus::new(EVENT_BUS_CAPACITY))
        .context("Failed to create backend client")?;

    // Upload
    let files = ingest::load_directory(&args.data_dir)
        .with_context(|| format!("Failed to read {}", args.data_dir.display()))?;
    controller.upload(files).await?;

    // Summary
    if let SummaryView::Ready { cards, total_records } = controller.summary_view().await {
        println!("Data summary ({} records)", total_records);
        for card in cards {
            println!("  {:<22} {:>8} rows  [{}]", card.label, card.count, card.columns.join(", "));
        }
    }
    controller.proceed().await?;

    // Configure
    let options = controller.options().await?;
    info!(
        applications = options.applications.len(),
        organizational_units = options.organizational_units.len(),
        source = ?options.source,
        "Loaded filter options"
    );

    let mut form = MiningConfigForm::new();
    for (field, raw) in [
        (NumericField::MinUsersPerRole, &args.min_users),
        (NumericField::MaxPermissionsPerRole, &args.max_permissions),
        (NumericField::MinPermissionsPerRole, &args.min_permissions),
    ] {
        if let Some(raw) = raw {
            form.set_numeric(field, raw.clone());
        }
    }
    form.set_applications(args.applications.iter().filter(|a| !a.trim().is_empty()).cloned());
    form.set_organizational_units(args.ous.iter().filter(|o| !o.trim().is_empty()).cloned());
    form.set_enable_ai(!args.no_ai);

    let mining_config = form.submit()?;
    let status = controller.submit_config(mining_config).await?;
    info!(step = %status.step, "Mining finished");

    // Results
    for tab in [ResultsTab::Filter, ResultsTab::Ai] {
        let page = controller.results_page(tab).await?;
        print_results(&page);
    }

    if let Some(target) = &args.report {
        let report = controller.report(args.tab).await?;
        let path = report_path(target, &report.filename);
        std::fs::write(&path, report.contents)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn print_results(page: &ResultsPage) {
    let source = page
        .source
        .map(|s| format!("{:?}", s).to_lowercase())
        .unwrap_or_else(|| "disabled".to_string());
    println!();
    println!("{} roles ({})", page.tab, source);

    if let Some(message) = page.message {
        println!("  {}", message);
        return;
    }
    for card in &page.cards {
        let confidence = card
            .confidence
            .map(|c| format!("  confidence {:.0}%", c))
            .unwrap_or_default();
        println!(
            "  [{}] {} - {} users, {} permissions, apps: {}{}",
            card.id,
            card.name,
            card.user_count,
            card.permission_count,
            card.applications.join(", "),
            confidence
        );
    }
}

/// A directory target gets the generated file name
fn report_path(target: &Path, filename: &str) -> PathBuf {
    if target.is_dir() {
        target.join(filename)
    } else if target.as_os_str().is_empty() {
        PathBuf::from(filename)
    } else {
        target.to_path_buf()
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
