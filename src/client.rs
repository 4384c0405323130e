//! Command-line client for the lighting service.

use anyhow::{Context, Result, anyhow, bail};
use zbus::proxy;

use crate::{
    bus::{BusOpener, I2cDevOpener},
    cli::Command,
    config::{Config, DbusConfig},
    lighting::{Color, LightingController},
    providers::dbus::connect,
    service::PING_REPLY,
};

#[proxy(
    interface = "NeuroticTumbleweed.Aura.Interface",
    default_service = "NeuroticTumbleweed.Aura",
    default_path = "/Aura",
    gen_blocking = false
)]
pub trait Aura {
    #[zbus(name = "ping")]
    fn ping(&self) -> zbus::Result<String>;
    #[zbus(name = "get_color")]
    fn get_color(&self) -> zbus::Result<u32>;
    #[zbus(name = "set_color")]
    fn set_color(&self, color: u32) -> zbus::Result<()>;
    #[zbus(name = "get_mode")]
    fn get_mode(&self) -> zbus::Result<String>;
    #[zbus(name = "set_mode")]
    fn set_mode(&self, mode: &str) -> zbus::Result<()>;

    #[zbus(property)]
    fn version(&self) -> zbus::Result<String>;
}

/// Runs a client command and returns what should be printed, if anything.
pub async fn execute(command: Command, config: &Config, direct: bool) -> Result<Option<String>> {
    if direct {
        let device = config.device.clone();
        return tokio::task::spawn_blocking(move || {
            let controller = LightingController::new(&device, I2cDevOpener::new(&device.dev_dir));
            execute_local(command, &controller)
        })
        .await
        .context("Hardware worker failed")?;
    }
    execute_remote(command, &config.dbus).await
}

/// Performs the command against the chip from this process.
pub fn execute_local<O: BusOpener>(
    command: Command,
    controller: &LightingController<O>,
) -> Result<Option<String>> {
    let output = match command {
        Command::Serve => bail!("serve is not a client command"),
        Command::Ping => Some(PING_REPLY.to_string()),
        Command::GetColor => Some(controller.get_color()?.to_string()),
        Command::SetColor { color } => {
            controller.set_color(color)?;
            None
        }
        Command::GetMode => Some(controller.get_mode()?.to_string()),
        Command::SetMode { mode } => {
            controller.set_mode(mode)?;
            None
        }
    };
    Ok(output)
}

async fn execute_remote(command: Command, dbus: &DbusConfig) -> Result<Option<String>> {
    let connection = connect(dbus.bus).await?;
    let proxy = AuraProxy::builder(&connection)
        .destination(dbus.name.as_str())?
        .path(dbus.path.as_str())?
        .build()
        .await
        .context("Failed to create service proxy")?;

    let output = match command {
        Command::Serve => bail!("serve is not a client command"),
        Command::Ping => Some(proxy.ping().await.map_err(remote_error)?),
        Command::GetColor => {
            let raw = proxy.get_color().await.map_err(remote_error)?;
            Some(Color::try_from(raw)?.to_string())
        }
        Command::SetColor { color } => {
            proxy.set_color(color.into()).await.map_err(remote_error)?;
            None
        }
        Command::GetMode => Some(proxy.get_mode().await.map_err(remote_error)?),
        Command::SetMode { mode } => {
            proxy
                .set_mode(mode.name())
                .await
                .map_err(remote_error)?;
            None
        }
    };
    Ok(output)
}

/// Keeps the remote error name visible, e.g.
/// `NeuroticTumbleweed.Aura.AdapterNotFound: could not find ...`.
fn remote_error(err: zbus::Error) -> anyhow::Error {
    match err {
        zbus::Error::MethodError(name, Some(description), _) => {
            anyhow!("{}: {description}", name.as_str())
        }
        zbus::Error::MethodError(name, None, _) => anyhow!("{}", name.as_str()),
        other => anyhow::Error::new(other).context("D-Bus call failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bus::{channel::tests::FakeBus, locator::tests::FakeSysfs},
        lighting::Mode,
    };
    use pretty_assertions::assert_eq;

    fn setup() -> (FakeSysfs, FakeBus) {
        (
            FakeSysfs::new(&[("i2c-3", "NVIDIA i2c adapter 1 bus")]),
            FakeBus::default(),
        )
    }

    #[test]
    fn local_color_commands() {
        let (sysfs, bus) = setup();
        let controller = LightingController::new(&sysfs.device_config(), bus);

        let set = Command::SetColor {
            color: Color::from_rgb(0xff, 0x80, 0x00),
        };
        assert_eq!(execute_local(set, &controller).unwrap(), None);
        assert_eq!(
            execute_local(Command::GetColor, &controller).unwrap(),
            Some("#ff8000".to_string())
        );
    }

    #[test]
    fn local_mode_commands() {
        let (sysfs, bus) = setup();
        let controller = LightingController::new(&sysfs.device_config(), bus);

        execute_local(Command::SetMode { mode: Mode::Demo }, &controller).unwrap();
        assert_eq!(
            execute_local(Command::GetMode, &controller).unwrap(),
            Some("demo".to_string())
        );
    }

    #[test]
    fn local_ping_and_serve() {
        let (sysfs, bus) = setup();
        let controller = LightingController::new(&sysfs.device_config(), bus);

        assert_eq!(
            execute_local(Command::Ping, &controller).unwrap(),
            Some("pong".to_string())
        );
        assert!(execute_local(Command::Serve, &controller).is_err());
    }

    #[test]
    fn local_errors_keep_lighting_kind() {
        let sysfs = FakeSysfs::new(&[]);
        let controller = LightingController::new(&sysfs.device_config(), FakeBus::default());

        let err = execute_local(Command::GetMode, &controller).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::error::LightingError>(),
            Some(crate::error::LightingError::AdapterNotFound { .. })
        ));
    }
}
