//! Commands that edit a compose file in place.

use anyhow::{bail, Context, Result};
use colored::Colorize;
use dcm_core::{ComposeApplier, ComposeCodec, ComposeFile, Network, Service, StackApplier, Volume};
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

/// Create an empty compose file.
pub fn init(file: &Path, version: &str, force: bool) -> Result<()> {
    if file.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", file.display());
    }

    let compose = ComposeFile::new(version);
    save(&compose, file)?;

    println!(
        "{} Created {} (version {})",
        "✓".green().bold(),
        file.display().to_string().bold(),
        compose.version
    );
    Ok(())
}

/// List the services of a compose file.
pub fn ls(file: &Path) -> Result<()> {
    let compose = load(file)?;

    if compose.services.is_empty() {
        println!("No services defined in {}", file.display());
        return Ok(());
    }

    let table = Table::new(service_rows(&compose)).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}

/// Print one service definition.
pub fn show(file: &Path, name: &str) -> Result<()> {
    let compose = load(file)?;
    let service = compose.get_service(name)?;

    println!("{} {}", "Service".bold(), name.cyan().bold());
    if let Some(limits) = format_limits(service) {
        println!("{} {}", "Limits:".bold(), limits);
    }
    println!();

    let yaml = serde_yaml::to_string(service).context("Failed to render service")?;
    print!("{}", yaml);
    Ok(())
}

/// Remove a service and the volumes it mounts, optionally restarting the stack.
pub async fn rm(file: &Path, name: &str, applier: Option<&ComposeApplier>) -> Result<()> {
    let mut compose = load(file)?;
    let removed = compose.remove_service_cascading(name)?;
    save(&compose, file)?;

    println!("{} Removed service {}", "✓".green().bold(), name.bold());
    for volume in &removed {
        println!("  {} volume {}", "-".dimmed(), volume.dimmed());
    }

    if let Some(applier) = applier {
        apply(file, applier).await?;
    }
    Ok(())
}

/// Add or replace a top-level volume.
pub fn volume_add(file: &Path, name: &str, driver: Option<String>) -> Result<()> {
    let mut compose = load(file)?;
    compose.add_volume(name, Volume { driver });
    save(&compose, file)?;

    println!("{} Volume {} added", "✓".green().bold(), name.bold());
    Ok(())
}

/// Remove a top-level volume.
pub fn volume_rm(file: &Path, name: &str) -> Result<()> {
    let mut compose = load(file)?;
    compose.delete_volume(name)?;
    save(&compose, file)?;

    println!("{} Volume {} removed", "✓".green().bold(), name.bold());
    Ok(())
}

/// Add or replace a top-level network.
pub fn network_add(
    file: &Path,
    name: &str,
    driver: Option<String>,
    host_name: Option<String>,
    external: bool,
) -> Result<()> {
    let mut compose = load(file)?;
    compose.add_network(name, Network { driver, name: host_name, external });
    save(&compose, file)?;

    println!("{} Network {} added", "✓".green().bold(), name.bold());
    Ok(())
}

/// Remove a top-level network.
pub fn network_rm(file: &Path, name: &str) -> Result<()> {
    let mut compose = load(file)?;
    compose.delete_network(name)?;
    save(&compose, file)?;

    println!("{} Network {} removed", "✓".green().bold(), name.bold());
    Ok(())
}

/// Restart the stack described by the compose file.
pub async fn apply(file: &Path, applier: &ComposeApplier) -> Result<()> {
    println!("{} Restarting stack from {}", "→".cyan().bold(), file.display());

    applier
        .apply(file)
        .await
        .with_context(|| format!("Failed to restart stack from {}", file.display()))?;

    println!("{} Stack restarted", "✓".green().bold());
    Ok(())
}

fn load(file: &Path) -> Result<ComposeFile> {
    ComposeCodec::load(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn save(compose: &ComposeFile, file: &Path) -> Result<()> {
    ComposeCodec::save(compose, file).with_context(|| format!("Failed to write {}", file.display()))
}

#[derive(Tabled)]
pub(crate) struct ServiceRow {
    #[tabled(rename = "SERVICE")]
    pub name: String,
    #[tabled(rename = "IMAGE")]
    pub image: String,
    #[tabled(rename = "PORTS")]
    pub ports: String,
    #[tabled(rename = "VOLUMES")]
    pub volumes: String,
}

pub(crate) fn service_rows(compose: &ComposeFile) -> Vec<ServiceRow> {
    compose
        .services
        .iter()
        .map(|(name, service)| ServiceRow {
            name: name.clone(),
            image: service.image.clone().unwrap_or_else(|| "-".to_string()),
            ports: join_or_dash(&service.ports),
            volumes: join_or_dash(&service.volumes),
        })
        .collect()
}

/// Summarize the deploy resource limits of a service, if any.
pub(crate) fn format_limits(service: &Service) -> Option<String> {
    let resources = service.deploy.as_ref()?.resources.as_ref()?;

    let mut parts = Vec::new();
    if let Some(cpus) = resources.cpu_limit() {
        parts.push(format!("{} CPU", cpus));
    }
    if let Some(mb) = resources.memory_limit_mb() {
        parts.push(format!("{} MB", mb));
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

fn join_or_dash(items: &[String]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}
