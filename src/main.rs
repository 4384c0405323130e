use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result, anyhow};
use aurad::{
    application::Application,
    cli::{Cli, Command},
    client,
    config::{BusKind, ConfigManager},
};
use clap::Parser;
use daemonize::Daemonize;
use log::LevelFilter;
use syslog::{BasicLogger, Facility, Formatter3164};
use tracing_subscriber::EnvFilter;

const DAEMON_LOG: &str = "/var/tmp/aurad.log";

fn init_log(level: LevelFilter) -> Result<()> {
    syslog::unix(Formatter3164 {
        facility: Facility::LOG_USER,
        hostname: None,
        process: "aurad".into(),
        pid: std::process::id(),
    })
    .map_err(|e| anyhow!("{e}"))
    .and_then(|logger| {
        log::set_boxed_logger(Box::new(BasicLogger::new(logger)))
            .map(|_| log::set_max_level(level))
            .map_err(|e| anyhow!("{e}"))
    })
}

/// Client runs report to the terminal; `RUST_LOG` overrides the level.
fn init_client_log() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {e}"))
}

fn into_daemon() -> Result<()> {
    File::create(DAEMON_LOG)
        .and_then(|out| Ok((out.try_clone()?, out)))
        .map_err(|e| anyhow!("{e}"))
        .and_then(|(stderr, stdout)| {
            Daemonize::new()
                .stdout(stdout)
                .stderr(stderr)
                .start()
                .map_err(|e| anyhow!("{e}"))
        })
}

/// Daemonizing changes the working directory, so a relative `-c` is
/// resolved up front.
fn config_path(cli: &Cli) -> Result<Option<PathBuf>> {
    cli.config
        .as_deref()
        .map(std::path::absolute)
        .transpose()
        .context("Failed to resolve config path")
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start tokio runtime")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = config_path(&cli)?;
    let command = cli.command();

    // Logging is up before the config is read, and the fork happens before
    // the runtime spawns its threads.
    if command == Command::Serve {
        if cli.daemonize {
            into_daemon()?;
        }
        let level = if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        };
        init_log(level)?;
        log::info!("Starting aurad {}", env!("CARGO_PKG_VERSION"));
    } else {
        init_client_log()?;
    }

    let mut config_manager = ConfigManager::load(config_path)?;
    if cli.session {
        config_manager.get_mut().dbus.bus = BusKind::Session;
    }

    match command {
        Command::Serve => runtime()?.block_on(async {
            Application::builder()
                .with_config_manager(config_manager)
                .build()?
                .run()
                .await
        }),
        command => {
            let output = runtime()?.block_on(client::execute(
                command,
                config_manager.get(),
                cli.direct,
            ))?;
            if let Some(line) = output {
                println!("{line}");
            }
            Ok(())
        }
    }
}
