//! grantsmith command-line interface
//!
//! Usage:
//!   grantsmith plan --spec permissions.yml --state account.json
//!   grantsmith spec-test --spec permissions.yml --state account.json
//!
//! Exit codes:
//!   0 - Success
//!   1 - Spec, validation or configuration error
//!   2 - Connector error

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use grantsmith::connector::SnapshotConnector;
use grantsmith::{LoadOptions, PermissionsError, RunList, SpecLoader, SqlCommand};

#[derive(Parser)]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Reconcile warehouse grants against a declarative permissions spec")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the statements that converge the account onto the permissions file
    Plan {
        #[command(flatten)]
        target: Target,

        /// Only process these roles (repeatable)
        #[arg(long = "role")]
        roles: Vec<String>,

        /// Only process these users (repeatable)
        #[arg(long = "user")]
        users: Vec<String>,

        /// Phases to run: users, roles, or both (comma-separated)
        #[arg(long)]
        run_list: Option<String>,

        /// Leave memberships and user attributes untouched
        #[arg(long)]
        ignore_memberships: bool,

        /// Prune entities missing on the server instead of failing
        #[arg(long)]
        ignore_missing_entities: bool,

        /// Also print statements that are already in effect
        #[arg(long)]
        all: bool,

        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Validate the permissions file against the account without generating statements
    SpecTest {
        #[command(flatten)]
        target: Target,

        /// Prune entities missing on the server instead of failing
        #[arg(long)]
        ignore_missing_entities: bool,
    },
}

#[derive(Args)]
struct Target {
    /// Permissions spec (YAML)
    #[arg(long, env = "GRANTSMITH_SPEC")]
    spec: PathBuf,

    /// Account snapshot (JSON)
    #[arg(long, env = "GRANTSMITH_STATE")]
    state: PathBuf,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Permissions(#[from] PermissionsError),
    #[error("Output error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Output error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Permissions(PermissionsError::Connector(_)) => 2,
            _ => 1,
        }
    }
}

fn print_commands(commands: &[SqlCommand], format: Format, all: bool) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, commands)?;
            writeln!(out)?;
        }
        Format::Text => {
            for command in commands {
                if !command.already_granted {
                    writeln!(out, "{};", command.sql)?;
                } else if all {
                    writeln!(out, "-- already granted: {};", command.sql)?;
                }
            }
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut options = LoadOptions::from_env()?;

    match cli.command {
        Command::Plan {
            target,
            roles,
            users,
            run_list,
            ignore_memberships,
            ignore_missing_entities,
            all,
            format,
        } => {
            options.ignore_missing_entities |= ignore_missing_entities;
            options.run.ignore_memberships |= ignore_memberships;
            if !roles.is_empty() {
                options.run.roles = Some(roles);
            }
            if !users.is_empty() {
                options.run.users = Some(users);
            }
            if let Some(run_list) = run_list {
                options.run.run_list = RunList::parse(&run_list)?;
            }

            let connector =
                SnapshotConnector::from_path(&target.state).map_err(PermissionsError::from)?;
            let loader = SpecLoader::from_path(&target.spec, &connector, &options).await?;
            let commands = loader
                .generate_permission_queries(&connector, &options.run)
                .await?;
            tracing::debug!(queries = connector.issued().len(), "Account queries issued");
            print_commands(&commands, format, all)?;
        }
        Command::SpecTest {
            target,
            ignore_missing_entities,
        } => {
            options.ignore_missing_entities |= ignore_missing_entities;
            options.skip_grant_fetch = true;

            let connector =
                SnapshotConnector::from_path(&target.state).map_err(PermissionsError::from)?;
            SpecLoader::from_path(&target.spec, &connector, &options).await?;
            eprintln!("Spec is valid: {}", target.spec.display());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("ERROR: {}", e);
        std::process::exit(e.exit_code());
    }
}
