//! Keboola project access manager
//!
//! Inspect and revoke user access to the projects of a Keboola organization.

use anyhow::Context;
use clap::{Parser, Subcommand};
use keboola_access::{
    config::{AppConfig, LogFormat, ORG_ENV_VAR, Stack, TOKEN_ENV_VAR, load_config},
    dashboard::{DashboardConfig, run_dashboard},
    report::{audit_text, matrix_table, notification_line, project_legend},
    session::Session,
    util::SecretString,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Keboola Project User Manager - who can access which project, and revoke it
#[derive(Parser, Debug)]
#[command(name = "keboola-access")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "KBC_ACCESS_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "KBC_ACCESS_LOG_LEVEL")]
    log_level: Option<String>,

    /// Stack (us-virginia-aws, us-virginia-gcp, eu-frankfurt-aws, eu-ireland-azure, eu-frankfurt-gcp, custom)
    #[arg(long)]
    stack: Option<String>,

    /// API host for the custom stack (include https://)
    #[arg(long)]
    url: Option<String>,

    /// Management API token
    #[arg(long, env = TOKEN_ENV_VAR, hide_env_values = true)]
    token: Option<String>,

    /// Organization ID
    #[arg(long, env = ORG_ENV_VAR)]
    org: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Verify the management token
    CheckToken,

    /// Load users of every project and print the role matrix
    Load {
        /// Also write the user-project mapping as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Remove a user from one or more projects (by project name)
    Remove {
        /// Email of the user to remove
        #[arg(long)]
        email: String,

        /// Project name; repeat for several projects
        #[arg(long = "project", required = true)]
        projects: Vec<String>,
    },

    /// Run the web dashboard
    Serve {
        /// Dashboard host
        #[arg(long, env = "KBC_ACCESS_DASHBOARD_HOST")]
        host: Option<String>,

        /// Dashboard port
        #[arg(long, env = "KBC_ACCESS_DASHBOARD_PORT")]
        port: Option<u16>,
    },
}

fn init_logging(config: &AppConfig, level: Option<&str>) {
    let level = level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.logging.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

/// Command-line values win over the configuration file and environment
fn apply_overrides(config: &mut AppConfig, args: &Args) -> anyhow::Result<()> {
    if let Some(stack) = &args.stack {
        config.manage.stack = stack.parse::<Stack>()?;
    }
    if let Some(url) = &args.url {
        config.manage.url = Some(url.clone());
    }
    if let Some(token) = &args.token {
        config.manage.token = Some(SecretString::new(token.clone()));
    }
    if let Some(org) = &args.org {
        config.manage.organization_id = Some(org.clone());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, &args)?;

    init_logging(&config, args.log_level.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        stack = %config.manage.stack,
        "Starting keboola-access"
    );

    let mut session = Session::new(&config.manage)
        .inspect_err(|e| error!(error = %e, "Failed to start session"))?;

    match args.command {
        Command::CheckToken => check_token(&session).await,
        Command::Load { csv } => load(&mut session, csv).await,
        Command::Remove { email, projects } => remove(&mut session, &email, &projects).await,
        Command::Serve { host, port } => {
            let host = host.unwrap_or(config.dashboard.host.clone());
            let port = port.unwrap_or(config.dashboard.port);
            let dashboard = DashboardConfig::new(&host, port)
                .with_context(|| format!("Invalid dashboard address {}:{}", host, port))?;
            run_dashboard(dashboard, Arc::new(Mutex::new(session))).await
        }
    }
}

async fn check_token(session: &Session) -> anyhow::Result<()> {
    let check = session.on_check_token().await?;
    println!("{}", check.request);
    println!("{}", notification_line(&check.notification));

    if !check.verification.valid {
        let status = check
            .verification
            .status_code
            .map_or_else(|| "n/a".to_string(), |s| s.to_string());
        println!("Status Code: {}\n{}", status, check.verification.raw_body);
        anyhow::bail!("token verification failed");
    }
    Ok(())
}

async fn load(session: &mut Session, csv: Option<PathBuf>) -> anyhow::Result<()> {
    let report = session.on_load_users().await?;
    println!("Connected to: {}", report.api_host);
    for notification in &report.notifications {
        println!("{}", notification_line(notification));
    }

    if let Some(matrix) = session.matrix() {
        println!();
        matrix_table(&matrix).printstd();
        println!();
        project_legend(&matrix).printstd();
    }

    if let (Some(path), Some(table)) = (csv, session.table()) {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        table.write_csv(BufWriter::new(file))?;
        println!("Wrote {} rows to {}", table.len(), path.display());
    }

    Ok(())
}

async fn remove(session: &mut Session, email: &str, projects: &[String]) -> anyhow::Result<()> {
    session.on_load_users().await?;
    let report = session.on_remove_access(email, projects).await?;

    for notification in report.notifications() {
        println!("{}", notification_line(notification));
    }

    if !session.audit().is_empty() {
        println!("\nAudit Log\n");
        println!("{}", audit_text(session.audit()));
    }

    if report.failed() > 0 {
        anyhow::bail!(
            "{} of {} removals failed",
            report.failed(),
            report.results.len()
        );
    }
    Ok(())
}
