//! Talentgate operator CLI.
//!
//! Evaluate access requests, compute device fingerprints and review the
//! audit trail of the recruiting portal.
//!
//! # Quick Start
//!
//! ```bash
//! # Would a recruiter in engineering be allowed to read this resume?
//! talentgate decide --role recruiter --department engineering --clearance 3 \
//!     --kind candidate --id c-7 --resource-department engineering --sensitivity 2 \
//!     --action read
//!
//! # Review denials
//! talentgate audit query --status denied
//!
//! # Check the hash chain
//! talentgate audit verify
//! ```

mod commands;
mod style;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use talentgate_audit::AuditQuery;
use talentgate_config::{ConfigLoader, SinkKind, TalentgateConfig};
use talentgate_device::DeviceAttributes;
use talentgate_types::{AuditStatus, ResourceDescriptor};
use tracing_subscriber::EnvFilter;

/// Talentgate - attribute-based access control and audit for the recruiting portal.
#[derive(Parser)]
#[command(name = "talentgate")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Directory holding talentgate.toml.
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Audit trail file; implies the json-lines sink.
    #[arg(long, global = true)]
    trail: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Evaluate one access request against the policy.
    Decide {
        #[command(flatten)]
        subject: SubjectFlags,

        #[command(flatten)]
        resource: ResourceFlags,

        /// Action to check (read, write, delete).
        #[arg(long)]
        action: String,

        /// Route through the gateway and record the decision under this verb.
        #[arg(long, value_name = "VERB")]
        audit: Option<String>,
    },

    /// Compute a device fingerprint.
    Fingerprint {
        #[command(flatten)]
        device: DeviceFlags,

        /// Previously stored fingerprint to compare against.
        #[arg(long)]
        stored: Option<String>,
    },

    /// Audit trail commands.
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args)]
struct SubjectFlags {
    /// Subject user id (omit for anonymous).
    #[arg(long)]
    user_id: Option<String>,

    /// Subject role, as stored in session state.
    #[arg(long)]
    role: Option<String>,

    /// Subject department.
    #[arg(long)]
    department: Option<String>,

    /// Subject clearance level.
    #[arg(long)]
    clearance: Option<String>,
}

#[derive(Args)]
struct ResourceFlags {
    /// Resource type.
    #[arg(long, default_value = "candidate")]
    kind: String,

    /// Resource id.
    #[arg(long)]
    id: String,

    /// Owning user id.
    #[arg(long)]
    owner: Option<String>,

    /// Department the resource belongs to.
    #[arg(long)]
    resource_department: Option<String>,

    /// Resource sensitivity.
    #[arg(long, default_value_t = 0)]
    sensitivity: u32,
}

impl ResourceFlags {
    fn descriptor(&self) -> ResourceDescriptor {
        let mut resource =
            ResourceDescriptor::new(&self.kind, &self.id).with_sensitivity(self.sensitivity);
        if let Some(owner) = &self.owner {
            resource = resource.with_owner(owner.as_str());
        }
        if let Some(department) = &self.resource_department {
            resource = resource.with_department(department.as_str());
        }
        resource
    }
}

#[derive(Args)]
struct DeviceFlags {
    #[arg(long)]
    user_agent: String,

    #[arg(long, default_value = "en-US")]
    language: String,

    /// Minutes offset from UTC as the browser reports it (UTC+1 is -60).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    timezone_offset: i32,

    /// Logical CPU cores, if exposed.
    #[arg(long)]
    cores: Option<u32>,

    /// Device memory in GB, if exposed.
    #[arg(long)]
    memory: Option<f64>,

    #[arg(long)]
    width: u32,

    #[arg(long)]
    height: u32,

    #[arg(long, default_value_t = 24)]
    color_depth: u32,
}

impl DeviceFlags {
    fn attributes(&self) -> DeviceAttributes {
        DeviceAttributes {
            user_agent: self.user_agent.clone(),
            language: self.language.clone(),
            timezone_offset_minutes: self.timezone_offset,
            hardware_concurrency: self.cores,
            device_memory_gb: self.memory,
            screen_width: self.width,
            screen_height: self.height,
            color_depth: self.color_depth,
        }
    }
}

impl Commands {
    /// Whether the command reads the audit trail or the resolved configuration.
    fn needs_config(&self) -> bool {
        matches!(
            self,
            Commands::Audit(_) | Commands::Config(_) | Commands::Decide { audit: Some(_), .. }
        )
    }
}

#[derive(Subcommand)]
enum AuditCommands {
    /// Search and list audit records.
    Query {
        /// Substring matched against actor, action, resource and address.
        #[arg(short, long)]
        search: Option<String>,

        /// Only records with this status (success, denied, error).
        #[arg(long)]
        status: Option<AuditStatus>,

        #[arg(long)]
        actor: Option<String>,

        #[arg(long)]
        action: Option<String>,

        /// Resource type, e.g. `candidate`.
        #[arg(long)]
        kind: Option<String>,

        /// Maximum number of records to show.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print records as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Verify sequence numbers and the hash chain.
    Verify,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration as TOML.
    Show,
}

fn load_config(cli: &Cli) -> Result<TalentgateConfig> {
    let mut config = ConfigLoader::new()
        .with_project_dir(&cli.project_dir)
        .load()
        .context("Failed to load configuration")?;

    if let Some(trail) = &cli.trail {
        config.audit.sink = SinkKind::JsonLines;
        config.audit.path = trail.clone();
        config.resolve_paths(&cli.project_dir);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    style::set_no_color(cli.no_color);

    // Commands that never touch the trail run on defaults when the
    // configuration cannot be loaded.
    let config = if cli.command.needs_config() {
        load_config(&cli)?
    } else {
        load_config(&cli).unwrap_or_default()
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.logging.ansi && !cli.no_color)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Decide {
            subject,
            resource,
            action,
            audit,
        } => commands::decide::run(
            &config,
            commands::decide::SubjectArgs {
                user_id: subject.user_id,
                role: subject.role,
                department: subject.department,
                clearance: subject.clearance,
            },
            &resource.descriptor(),
            &action,
            audit.as_deref(),
        ),
        Commands::Fingerprint { device, stored } => {
            commands::fingerprint::run(&device.attributes(), stored.as_deref())
        }
        Commands::Audit(cmd) => match cmd {
            AuditCommands::Query {
                search,
                status,
                actor,
                action,
                kind,
                limit,
                json,
            } => {
                let filter = AuditQuery {
                    search,
                    status,
                    actor,
                    action,
                    resource_kind: kind,
                    limit,
                    ..AuditQuery::default()
                };
                commands::audit::query(&config, &filter, json)
            }
            AuditCommands::Verify => commands::audit::verify(&config),
        },
        Commands::Config(ConfigCommands::Show) => commands::config::show(&config),
    }
}
