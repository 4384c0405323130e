//! D-Bus face of the [`ControlService`].

use log::{error, warn};
use zbus::{DBusError, interface};

use crate::{
    bus::BusOpener,
    error::LightingError,
    lighting::{Color, Mode},
    service::ControlService,
};

/// D-Bus interface name of the lighting service.
pub const INTERFACE_NAME: &str = "NeuroticTumbleweed.Aura.Interface";

/// Failure kinds returned to D-Bus callers.
///
/// Each variant maps to its own error name under the
/// `NeuroticTumbleweed.Aura.` prefix, e.g.
/// `NeuroticTumbleweed.Aura.AdapterNotFound`.
#[derive(Debug, DBusError)]
#[zbus(prefix = "NeuroticTumbleweed.Aura")]
pub enum ServiceError {
    #[zbus(error)]
    ZBus(zbus::Error),
    SysFsUnavailable(String),
    AdapterNotFound(String),
    BusIoError(String),
    AmbiguousDeviceState(String),
    InvalidArgument(String),
    Internal(String),
}

impl From<LightingError> for ServiceError {
    fn from(err: LightingError) -> Self {
        let message = err.to_string();
        match err {
            LightingError::SysFsUnavailable { .. } => Self::SysFsUnavailable(message),
            LightingError::AdapterNotFound { .. } => Self::AdapterNotFound(message),
            LightingError::BusIo { .. } => Self::BusIoError(message),
            LightingError::AmbiguousDeviceState { .. } => Self::AmbiguousDeviceState(message),
            LightingError::InvalidArgument(_) => Self::InvalidArgument(message),
            LightingError::Worker(_) => Self::Internal(message),
        }
    }
}

fn reply<T>(method: &str, result: Result<T, LightingError>) -> Result<T, ServiceError> {
    result.map_err(|e| {
        match &e {
            LightingError::AmbiguousDeviceState { .. } | LightingError::InvalidArgument(_) => {
                warn!("{method}: {e}")
            }
            _ => error!("{method}: {e}"),
        }
        ServiceError::from(e)
    })
}

/// Object served at the configured path.
///
/// Method names are exported in snake case (`ping`, `get_color`, ...) so
/// existing clients of the `NeuroticTumbleweed.Aura` service keep working.
pub struct AuraInterface<O> {
    service: ControlService<O>,
    version: String,
}

impl<O: BusOpener> AuraInterface<O> {
    pub fn new(service: ControlService<O>, version: String) -> Self {
        Self { service, version }
    }
}

#[interface(name = "NeuroticTumbleweed.Aura.Interface")]
impl<O: BusOpener> AuraInterface<O> {
    /// Returns "pong"; lets clients check reachability before real commands.
    #[zbus(name = "ping")]
    async fn ping(&self) -> String {
        self.service.ping().to_string()
    }

    /// Current color as `0xRRGGBB`.
    #[zbus(name = "get_color")]
    async fn get_color(&self) -> Result<u32, ServiceError> {
        reply("get_color", self.service.get_color().await).map(u32::from)
    }

    #[zbus(name = "set_color")]
    async fn set_color(&self, color: u32) -> Result<(), ServiceError> {
        let color = reply("set_color", Color::try_from(color))?;
        reply("set_color", self.service.set_color(color).await)
    }

    /// Name of the active effect.
    #[zbus(name = "get_mode")]
    async fn get_mode(&self) -> Result<String, ServiceError> {
        reply("get_mode", self.service.get_mode().await).map(|mode| mode.to_string())
    }

    /// Accepts one of: static, breathing, blink, demo.
    #[zbus(name = "set_mode")]
    async fn set_mode(&self, mode: &str) -> Result<(), ServiceError> {
        let mode = reply("set_mode", mode.parse::<Mode>())?;
        reply("set_mode", self.service.set_mode(mode).await)
    }

    #[zbus(property)]
    async fn version(&self) -> String {
        self.version.clone()
    }
}
