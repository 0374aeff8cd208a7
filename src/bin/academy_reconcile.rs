//! academy-reconcile: operator tooling for registration payment status
//!
//! Diagnoses and repairs registrations whose payment status disagrees with
//! the payment evidence on record. Every command is safe to run repeatedly.
//!
//! ## Usage
//! ```text
//! academy-reconcile inspect <email>   registrations for an email, newest first
//! academy-reconcile repair <email>    complete pending rows that carry a payment id
//! academy-reconcile expire            fail unpaid pending rows past the timeout
//! academy-reconcile --config academy.yaml <command>
//! ```
//!
//! ## Configuration
//! - --config / ACADEMY_CONFIG: YAML config file (optional)
//! - ACADEMY__STORAGE__TYPE: memory | sqlite | postgres
//! - ACADEMY__RECONCILIATION__PENDING_TIMEOUT_MINUTES: expiry age
//! - ACADEMY_LOG: tracing filter (default: info)

use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{error, info};

use academy_promo::reconcile::ReconcileError;
use academy_promo::services::ServiceError;
use academy_promo::utils::bootstrap::init_tracing;
use academy_promo::{init_storage, Config, PromoService};

#[derive(Debug, Parser)]
#[command(name = "academy-reconcile")]
#[command(about = "Registration payment status diagnostics and repair")]
struct Cli {
    /// YAML config file, layered under ACADEMY_CONFIG and ACADEMY__* overrides
    #[arg(long)]
    config: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
enum Command {
    /// Registrations for an email, newest first
    Inspect { email: String },
    /// Complete pending rows that carry a payment id
    Repair { email: String },
    /// Fail unpaid pending rows past the timeout
    Expire,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let command = cli.command;

    let config = Config::load(cli.config.as_deref())?;
    let stores = init_storage(&config.storage).await?;
    let service = PromoService::new(stores, &config);

    info!(command = ?command, "academy-reconcile started");

    match command {
        Command::Inspect { email } => {
            let history = service.get_registrations_by_email(&email).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Command::Repair { email } => match service.force_complete_pending_with_payment(&email).await {
            Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
            Err(ServiceError::Reconcile(ReconcileError::PartialRepair { report, failures })) => {
                error!(
                    changed = report.changed,
                    candidates = report.candidates,
                    failed = failures.len(),
                    "Repair incomplete"
                );
                let body = json!({ "report": report, "failures": failures });
                println!("{}", serde_json::to_string_pretty(&body)?);
                std::process::exit(1);
            }
            Err(e) => return Err(e.into()),
        },
        Command::Expire => {
            let report = service.expire_stale_pending(chrono::Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.failures.is_empty() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
