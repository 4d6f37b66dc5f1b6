use anyhow::Result;
use clap::{Parser, Subcommand};
use dcm_core::ComposeApplier;
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "dcm")]
#[command(about = "Docker Compose Manager CLI", long_about = None)]
struct Cli {
    /// Compose file to operate on
    #[arg(short, long, global = true, default_value = "docker-compose.yml")]
    file: PathBuf,

    /// Command used to restart the stack
    #[arg(long, global = true, default_value = "docker compose")]
    compose_command: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty compose file
    Init {
        /// Format version written to the file
        #[arg(long, default_value = "3.8")]
        version: String,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List services
    Ls,

    /// Show a service definition
    Show {
        /// Service name
        service: String,
    },

    /// Remove a service and the volumes it mounts
    Rm {
        /// Service name
        service: String,

        /// Restart the stack afterwards
        #[arg(long)]
        apply: bool,
    },

    /// Manage top-level volumes
    #[command(subcommand)]
    Volume(VolumeCommands),

    /// Manage top-level networks
    #[command(subcommand)]
    Network(NetworkCommands),

    /// Restart the stack (down, then up -d)
    Apply,
}

#[derive(Subcommand)]
enum VolumeCommands {
    /// Add or replace a volume
    Add {
        /// Volume name
        name: String,

        /// Volume driver
        #[arg(short, long)]
        driver: Option<String>,
    },

    /// Remove a volume
    Rm {
        /// Volume name
        name: String,
    },
}

#[derive(Subcommand)]
enum NetworkCommands {
    /// Add or replace a network
    Add {
        /// Network name
        name: String,

        /// Network driver
        #[arg(short, long)]
        driver: Option<String>,

        /// Name of the network on the host
        #[arg(long)]
        host_name: Option<String>,

        /// Network is managed outside this file
        #[arg(long)]
        external: bool,
    },

    /// Remove a network
    Rm {
        /// Network name
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let file = cli.file.as_path();
    let applier = ComposeApplier::new(&commands::split_command(&cli.compose_command));

    match cli.command {
        Commands::Init { version, force } => commands::compose::init(file, &version, force)?,
        Commands::Ls => commands::compose::ls(file)?,
        Commands::Show { service } => commands::compose::show(file, &service)?,
        Commands::Rm { service, apply } => {
            let applier = apply.then_some(&applier);
            commands::compose::rm(file, &service, applier).await?
        }
        Commands::Volume(cmd) => match cmd {
            VolumeCommands::Add { name, driver } => {
                commands::compose::volume_add(file, &name, driver)?
            }
            VolumeCommands::Rm { name } => commands::compose::volume_rm(file, &name)?,
        },
        Commands::Network(cmd) => match cmd {
            NetworkCommands::Add { name, driver, host_name, external } => {
                commands::compose::network_add(file, &name, driver, host_name, external)?
            }
            NetworkCommands::Rm { name } => commands::compose::network_rm(file, &name)?,
        },
        Commands::Apply => commands::compose::apply(file, &applier).await?,
    }

    Ok(())
}
