//! Application entry point and builder pattern implementation.

use crate::{config::ConfigManager, coordinator::SystemCoordinator};
use anyhow::Result;

/// The daemon: configuration plus the coordinator running its services.
///
/// # Example
///
/// ```no_run
/// use aurad::application::Application;
/// use aurad::config::ConfigManager;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config_manager = ConfigManager::load(None)?;
/// let mut app = Application::builder()
///     .with_config_manager(config_manager)
///     .build()?;
///
/// app.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Application {
    coordinator: SystemCoordinator,
    config_manager: ConfigManager,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Runs the complete daemon lifecycle: initialize, start services, and
    /// wait for shutdown.
    pub async fn run(&mut self) -> Result<()> {
        self.coordinator.initialize(&self.config_manager).await?;
        self.coordinator.start_all_services().await?;
        self.coordinator.run_main_loop().await
    }
}

pub struct ApplicationBuilder {
    config_manager: Option<ConfigManager>,
}

impl ApplicationBuilder {
    fn new() -> Self {
        Self {
            config_manager: None,
        }
    }

    pub fn with_config_manager(mut self, config_manager: ConfigManager) -> Self {
        self.config_manager = Some(config_manager);
        self
    }

    pub fn build(self) -> Result<Application> {
        let config_manager = self
            .config_manager
            .ok_or_else(|| anyhow::anyhow!("Configuration manager is required"))?;

        Ok(Application {
            coordinator: SystemCoordinator::new(),
            config_manager,
        })
    }
}
