//! System coordinator for managing service lifecycle.

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::signal::unix::{SignalKind, signal};

use crate::{
    bus::I2cDevOpener,
    config::ConfigManager,
    lighting::LightingController,
    providers::{DBusServiceProvider, ServiceProvider},
    service::ControlService,
    task_manager::TaskManager,
};

/// Owns the services of the daemon from startup to shutdown.
///
/// Critical services must start, non-critical ones may fail with a
/// warning. The main loop ends on Ctrl+C, SIGTERM, or when a service task
/// exits by itself.
pub struct SystemCoordinator {
    task_manager: TaskManager,
    service_providers: Vec<Box<dyn ServiceProvider>>,
}

impl Default for SystemCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemCoordinator {
    pub fn new() -> Self {
        Self {
            task_manager: TaskManager::new(),
            service_providers: Vec::new(),
        }
    }

    /// Builds the lighting service and registers the providers exposing it.
    pub async fn initialize(&mut self, config_manager: &ConfigManager) -> Result<()> {
        info!("Initializing SystemCoordinator...");
        let config = config_manager.get();

        let controller = LightingController::new(
            &config.device,
            I2cDevOpener::new(&config.device.dev_dir),
        );
        let service = ControlService::new(controller);

        let provider = DBusServiceProvider::new(service, config.dbus.clone())
            .await
            .context("Failed to create D-Bus service provider")?;
        self.register(Box::new(provider));

        info!("SystemCoordinator initialization completed");
        Ok(())
    }

    /// Adds a provider, keeping the list in descending priority order.
    pub fn register(&mut self, provider: Box<dyn ServiceProvider>) {
        self.service_providers.push(provider);
        self.service_providers
            .sort_by_key(|p| std::cmp::Reverse(p.priority()));
    }

    /// Starts all registered services in priority order.
    pub async fn start_all_services(&mut self) -> Result<()> {
        info!(
            "Starting {} services in priority order...",
            self.service_providers.len()
        );

        for provider in &self.service_providers {
            match provider.start(&mut self.task_manager).await {
                Ok(()) => info!(
                    "Service '{}' started (priority: {}, critical: {})",
                    provider.name(),
                    provider.priority(),
                    provider.is_critical()
                ),
                Err(e) if provider.is_critical() => {
                    return Err(e).with_context(|| {
                        format!("Critical service '{}' failed to start", provider.name())
                    });
                }
                Err(e) => warn!(
                    "Non-critical service '{}' failed to start: {e:#}",
                    provider.name()
                ),
            }
        }

        Ok(())
    }

    /// Waits for a shutdown signal, then stops every service.
    pub async fn run_main_loop(&mut self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
        info!("Starting main loop");

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl+C")?;
                info!("Received Ctrl+C, initiating graceful shutdown...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, initiating graceful shutdown...");
            }
            name = self.task_manager.any_finished() => {
                warn!("Service task '{name}' exited unexpectedly, shutting down");
            }
        }

        self.shutdown().await
    }

    async fn shutdown(&mut self) -> Result<()> {
        info!("Initiating graceful shutdown...");
        self.task_manager
            .shutdown_all()
            .await
            .context("Failed to shut down services")?;
        info!("Shutdown complete");
        Ok(())
    }

    pub fn running_services(&self) -> Vec<&'static str> {
        self.service_providers.iter().map(|p| p.name()).collect()
    }
}
