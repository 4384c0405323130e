//! Color and mode control of the graphics card lighting chip.
//!
//! Every operation without an explicit [`BusHandle`] resolves the bus again
//! through [`BusLocator`], opens one session, performs its register
//! transfers in a fixed order and closes the session.
//!
//! Writing a color takes three separate register writes. The chip offers no
//! multi-register transaction, so a failure after the first write leaves a
//! mixed color on the card and is reported as
//! [`LightingError::BusIo`] without any rollback.

mod color;
mod mode;

pub use color::Color;
pub use mode::Mode;

use log::debug;

use crate::{
    bus::{BusHandle, BusLocator, BusOpener, RegisterChannel},
    config::{DeviceConfig, RegisterMap},
    error::LightingResult,
};

/// Domain API over the lighting chip.
///
/// # Example
///
/// ```no_run
/// use aurad::bus::I2cDevOpener;
/// use aurad::config::DeviceConfig;
/// use aurad::lighting::{Color, LightingController, Mode};
///
/// let config = DeviceConfig::default();
/// let controller = LightingController::new(&config, I2cDevOpener::new(&config.dev_dir));
/// controller.set_color(Color::from_rgb(0xff, 0x80, 0x00))?;
/// controller.set_mode(Mode::Breathing)?;
/// # Ok::<(), aurad::error::LightingError>(())
/// ```
#[derive(Debug)]
pub struct LightingController<O> {
    locator: BusLocator,
    channel: RegisterChannel<O>,
    registers: RegisterMap,
}

impl<O: BusOpener> LightingController<O> {
    pub fn new(config: &DeviceConfig, opener: O) -> Self {
        Self {
            locator: BusLocator::new(config),
            channel: RegisterChannel::new(opener, config.chip_address),
            registers: config.registers,
        }
    }

    pub fn get_color(&self) -> LightingResult<Color> {
        self.get_color_on(self.locator.locate()?)
    }

    pub fn set_color(&self, color: Color) -> LightingResult<()> {
        self.set_color_on(self.locator.locate()?, color)
    }

    pub fn get_mode(&self) -> LightingResult<Mode> {
        self.get_mode_on(self.locator.locate()?)
    }

    pub fn set_mode(&self, mode: Mode) -> LightingResult<()> {
        self.set_mode_on(self.locator.locate()?, mode)
    }

    /// Reads red, green and blue, in that order, in one session.
    pub fn get_color_on(&self, bus: BusHandle) -> LightingResult<Color> {
        let regs = self.registers;
        let (red, green, blue) = self.channel.with_session(bus, |session| {
            Ok((
                session.read_byte(regs.red)?,
                session.read_byte(regs.green)?,
                session.read_byte(regs.blue)?,
            ))
        })?;
        Ok(Color::from_rgb(red, green, blue))
    }

    /// Writes red, green and blue, in that order, in one session.
    pub fn set_color_on(&self, bus: BusHandle, color: Color) -> LightingResult<()> {
        let regs = self.registers;
        let (red, green, blue) = color.channels();
        debug!("Setting color {color} on {bus}");
        self.channel.with_session(bus, |session| {
            session.write_byte(regs.red, red)?;
            session.write_byte(regs.green, green)?;
            session.write_byte(regs.blue, blue)
        })
    }

    /// Fails with `AmbiguousDeviceState` when the register holds an
    /// unknown byte.
    pub fn get_mode_on(&self, bus: BusHandle) -> LightingResult<Mode> {
        let raw = self
            .channel
            .with_session(bus, |session| session.read_byte(self.registers.mode))?;
        Mode::try_from(raw)
    }

    pub fn set_mode_on(&self, bus: BusHandle, mode: Mode) -> LightingResult<()> {
        debug!("Setting mode {mode} on {bus}");
        self.channel.with_session(bus, |session| {
            session.write_byte(self.registers.mode, mode.raw())
        })
    }
}
