use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;

use kontalk_cli::cli::{Cli, Commands};
use kontalk_cli::core::backup::{ConsolePrompt, OrchestratorError, RetryPolicy};
use kontalk_cli::core::{BackupManager, DockerManager, InstanceConfig};
use kontalk_cli::utils::{format_bytes, format_timestamp, get_project_root, DEFAULT_PROPERTIES_FILE};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<OrchestratorError>() {
            // Not an error: the operator chose not to proceed
            Some(OrchestratorError::Declined) => {
                eprintln!("Aborted.");
            }
            _ => {
                eprintln!("{} {:#}", "Error:".red(), err);
            }
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Status => handle_status(&config).await?,
        Commands::Bootstrap => handle_bootstrap(&config).await?,
        Commands::Start { service } => handle_start(&config, service).await?,
        Commands::Stop { all, service } => handle_stop(&config, all, service).await?,
        Commands::Restart { service } => handle_restart(&config, service).await?,
        Commands::Logs {
            service,
            follow,
            tail,
        } => handle_logs(&config, service, follow, tail).await?,
        Commands::Backup => handle_backup(&config).await?,
        Commands::Backups => handle_backups(&config).await?,
        Commands::Restore {
            archive,
            wait_attempts,
        } => handle_restore(&config, archive, wait_attempts).await?,
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<InstanceConfig> {
    let path = match path {
        Some(path) => path,
        None => get_project_root()?.join(DEFAULT_PROPERTIES_FILE),
    };
    InstanceConfig::load(path)
}

async fn manager(config: &InstanceConfig) -> Result<BackupManager> {
    let docker = DockerManager::new(&config.instance).await?;
    Ok(BackupManager::new(docker, config.clone()))
}

async fn handle_status(config: &InstanceConfig) -> Result<()> {
    let docker = DockerManager::new(&config.instance).await?;

    if !docker.check_docker().await? {
        println!("{}", "Docker daemon is not reachable".red());
        return Ok(());
    }

    let containers = docker.list_containers().await?;

    println!("Instance: {}\n", config.instance.bold());
    println!(
        "{:<28} {:<22} {:<12} {:<24} {:<10}",
        "Container", "Image", "State", "Status", "Health"
    );
    println!("{}", "-".repeat(98));

    if containers.is_empty() {
        println!("No containers found. Run 'kontalk-cli bootstrap' to create the instance.");
        return Ok(());
    }

    for container in containers {
        let health = container.health.as_deref().unwrap_or("N/A");
        println!(
            "{:<28} {:<22} {:<12} {:<24} {:<10}",
            container.name,
            container.image,
            container.state.as_str().color(container.state.color()),
            container.status,
            health
        );
    }

    Ok(())
}

async fn handle_bootstrap(config: &InstanceConfig) -> Result<()> {
    let manager = manager(config).await?;
    manager.bootstrap().await?;
    println!("Instance {} is up", config.instance);
    Ok(())
}

async fn handle_start(config: &InstanceConfig, service: Option<String>) -> Result<()> {
    let docker = DockerManager::new(&config.instance).await?;

    if let Some(service) = service {
        println!("Starting service: {}", service);
        docker.start_service(&service).await?;
        println!("Service {} started", service);
    } else {
        println!("Starting all services...");
        docker.up_detached().await?;
        println!("All services started");
    }

    Ok(())
}

async fn handle_stop(config: &InstanceConfig, all: bool, service: Option<String>) -> Result<()> {
    let docker = DockerManager::new(&config.instance).await?;

    if all {
        println!("Stopping all services...");
        docker.stop_all().await?;
        println!("All services stopped");
    } else if let Some(service) = service {
        println!("Stopping service: {}", service);
        docker.stop_service(&service).await?;
        println!("Service {} stopped", service);
    } else {
        anyhow::bail!("Specify either --all or a service name");
    }

    Ok(())
}

async fn handle_restart(config: &InstanceConfig, service: String) -> Result<()> {
    let docker = DockerManager::new(&config.instance).await?;
    println!("Restarting service: {}", service);
    docker.restart_service(&service).await?;
    println!("Service {} restarted", service);

    Ok(())
}

async fn handle_logs(
    config: &InstanceConfig,
    service: String,
    follow: bool,
    tail: usize,
) -> Result<()> {
    let docker = DockerManager::new(&config.instance).await?;

    if follow {
        docker.follow_logs(&service).await?;
    } else {
        let logs = docker.get_logs(&service, Some(tail)).await?;
        print!("{}", logs);
    }

    Ok(())
}

async fn handle_backup(config: &InstanceConfig) -> Result<()> {
    let manager = manager(config).await?;
    let archive = manager.create_backup().await?;
    println!("{} {}", "Backup written to".green(), archive.display());
    Ok(())
}

async fn handle_backups(config: &InstanceConfig) -> Result<()> {
    let manager = manager(config).await?;
    let entries = manager.list_backups()?;

    if entries.is_empty() {
        println!("No backups found in {}", config.backup_dir.display());
        return Ok(());
    }

    println!("{:<50} {:>10}  {}", "Archive", "Size", "Created");
    println!("{}", "-".repeat(80));
    for entry in entries {
        let name = entry
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!(
            "{:<50} {:>10}  {}",
            name,
            format_bytes(entry.size),
            format_timestamp(entry.modified)
        );
    }

    Ok(())
}

async fn handle_restore(
    config: &InstanceConfig,
    archive: PathBuf,
    wait_attempts: Option<u32>,
) -> Result<()> {
    let manager = manager(config).await?;

    let policy = match wait_attempts {
        Some(attempts) => RetryPolicy::bounded(Duration::from_secs(2), attempts),
        None => RetryPolicy::default(),
    };

    manager.restore(&archive, &ConsolePrompt, policy).await?;
    println!(
        "{} Instance {} now serves the data captured in {}",
        "Restore complete.".green(),
        config.instance,
        archive.display()
    );

    Ok(())
}
