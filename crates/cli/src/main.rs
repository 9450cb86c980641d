//! `scholaris-authz`: operator tool for the permission taxonomy.
//!
//! Validates a taxonomy file, lists the generated permissions and roles, and
//! answers "may this role do that" questions offline.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use scholaris_auth::{AdminAction, RoleId};
use scholaris_core::OrganizationId;
use scholaris_observability::LogFormat;

mod commands;
mod config;

use commands::AdminCheck;

#[derive(Parser)]
#[command(name = "scholaris-authz")]
#[command(about = "Inspect and check the school permission taxonomy", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Taxonomy file (TOML); the built-in school defaults when omitted
    #[arg(short, long, global = true, env = "SCHOLARIS_TAXONOMY")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the taxonomy and report any configuration error
    Validate,

    /// List catalog permissions
    Permissions {
        /// Only this module
        #[arg(short, long)]
        module: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// List roles with their effective permission counts
    Roles,

    /// Print the capability matrix of a role
    Capabilities {
        #[arg(short, long)]
        role: String,

        #[arg(long)]
        json: bool,
    },

    /// Explain why a role does or does not hold a permission
    Explain {
        #[arg(short, long)]
        role: String,

        #[arg(short, long)]
        permission: String,
    },

    /// Evaluate an administrative action between two accounts
    AdminCheck {
        /// delete, edit, change_role, change_status, reset_password,
        /// resend_invitation or impersonate
        #[arg(short, long)]
        action: AdminAction,

        #[arg(long)]
        actor_role: String,

        #[arg(long)]
        actor_org: Option<OrganizationId>,

        #[arg(long)]
        target_role: String,

        #[arg(long)]
        target_org: Option<OrganizationId>,

        /// The target has completed email verification
        #[arg(long)]
        target_verified: bool,

        /// Actor and target are the same account
        #[arg(long)]
        same_account: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let format = if cli.log_json { LogFormat::Json } else { LogFormat::Text };
    let log_level = if cli.verbose { "debug" } else { "warn" };
    scholaris_observability::init_with(format, Some(log_level));

    let config = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate => commands::validate(&config)?,
        Commands::Permissions { module, json } => commands::permissions(&config, module.as_deref(), json)?,
        Commands::Roles => commands::roles(&config)?,
        Commands::Capabilities { role, json } => commands::capabilities(&config, RoleId::new(role), json)?,
        Commands::Explain { role, permission } => commands::explain(&config, RoleId::new(role), &permission)?,
        Commands::AdminCheck {
            action,
            actor_role,
            actor_org,
            target_role,
            target_org,
            target_verified,
            same_account,
        } => {
            let check = AdminCheck {
                action,
                actor_role: RoleId::new(actor_role),
                actor_org,
                target_role: RoleId::new(target_role),
                target_org,
                target_verified,
                same_account,
            };
            if !commands::admin_check(&config, &check)? {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
