//! D-Bus service provider.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::info;
use tokio_util::sync::CancellationToken;
use zbus::Connection;

use crate::{
    bus::I2cDevOpener,
    config::{BusKind, DbusConfig},
    interface::AuraInterface,
    providers::traits::ServiceProvider,
    service::ControlService,
    task_manager::TaskManager,
};

/// Publishes the [`ControlService`] on D-Bus.
///
/// # Priority and Criticality
///
/// - **Priority**: 8 (high)
/// - **Critical**: Yes; the daemon has no other way to be reached
///
/// # Interface
///
/// Defaults to:
/// - **Service Name**: `NeuroticTumbleweed.Aura`
/// - **Object Path**: `/Aura`
/// - **Bus**: system
pub struct DBusServiceProvider {
    service: ControlService<I2cDevOpener>,
    config: DbusConfig,
    connection: Connection,
}

impl DBusServiceProvider {
    /// Connects to the configured bus.
    pub async fn new(service: ControlService<I2cDevOpener>, config: DbusConfig) -> Result<Self> {
        let connection = connect(config.bus).await?;
        Ok(Self {
            service,
            config,
            connection,
        })
    }
}

/// Opens a connection to the system or session bus.
pub async fn connect(bus: BusKind) -> Result<Connection> {
    match bus {
        BusKind::System => Connection::system()
            .await
            .context("Failed to connect to the D-Bus system bus"),
        BusKind::Session => Connection::session()
            .await
            .context("Failed to connect to the D-Bus session bus"),
    }
}

#[async_trait]
impl ServiceProvider for DBusServiceProvider {
    async fn start(&self, task_manager: &mut TaskManager) -> Result<()> {
        let interface = AuraInterface::new(
            self.service.clone(),
            env!("CARGO_PKG_VERSION").to_string(),
        );
        self.connection
            .object_server()
            .at(self.config.path.as_str(), interface)
            .await
            .with_context(|| format!("Failed to serve interface at {}", self.config.path))?;

        self.connection
            .request_name(self.config.name.as_str())
            .await
            .with_context(|| format!("Failed to acquire bus name {}", self.config.name))?;
        info!(
            "Serving {} at {} on the {:?} bus",
            self.config.name, self.config.path, self.config.bus
        );

        let connection = self.connection.clone();
        let config = self.config.clone();
        task_manager.spawn_task(self.name(), move |cancel_token| async move {
            run_dbus_service(connection, config, cancel_token).await
        })
    }

    fn name(&self) -> &'static str {
        "DBusService"
    }

    fn priority(&self) -> i32 {
        8
    }

    fn is_critical(&self) -> bool {
        true
    }
}

/// Keeps the connection alive until cancellation, then withdraws the
/// interface and releases the name.
///
/// Incoming calls are dispatched by the connection's own executor; this
/// task only owns the connection's lifetime.
async fn run_dbus_service(
    connection: Connection,
    config: DbusConfig,
    cancel_token: CancellationToken,
) -> Result<()> {
    cancel_token.cancelled().await;
    info!("D-Bus service cancelled");

    connection
        .object_server()
        .remove::<AuraInterface<I2cDevOpener>, _>(config.path.as_str())
        .await
        .context("Failed to withdraw interface")?;
    connection
        .release_name(config.name.as_str())
        .await
        .context("Failed to release bus name")?;
    Ok(())
}
