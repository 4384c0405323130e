//! Scoped register sessions against the lighting chip.

use log::debug;

use crate::error::{LightingError, LightingResult};

use super::{BusHandle, BusOpener, RegisterIo};

/// Opens short-lived sessions against one chip address.
///
/// No retries happen here: a failed transfer is returned to the caller at
/// once, tagged with the register it touched.
#[derive(Debug, Clone)]
pub struct RegisterChannel<O> {
    opener: O,
    chip_address: u8,
}

impl<O: BusOpener> RegisterChannel<O> {
    pub fn new(opener: O, chip_address: u8) -> Self {
        Self {
            opener,
            chip_address,
        }
    }

    pub fn chip_address(&self) -> u8 {
        self.chip_address
    }

    /// Runs `body` with the bus open and closes it afterwards.
    ///
    /// The bus is released on every exit path, including errors returned from
    /// `body` and panics unwinding through it.
    pub fn with_session<T, F>(&self, bus: BusHandle, body: F) -> LightingResult<T>
    where
        F: FnOnce(&mut Session<O::Device>) -> LightingResult<T>,
    {
        let device = self
            .opener
            .open(bus, self.chip_address)
            .map_err(|source| LightingError::BusIo {
                register: None,
                source,
            })?;
        debug!("Opened {bus} for chip {:#04x}", self.chip_address);

        let mut session = Session { device, bus };
        body(&mut session)
    }
}

/// An open bus bound to the chip. Dropping it releases the bus.
#[derive(Debug)]
pub struct Session<D: RegisterIo> {
    device: D,
    bus: BusHandle,
}

impl<D: RegisterIo> Session<D> {
    pub fn read_byte(&mut self, register: u8) -> LightingResult<u8> {
        self.device
            .read_byte_data(register)
            .map_err(|e| LightingError::bus_io(register, e))
    }

    pub fn write_byte(&mut self, register: u8, value: u8) -> LightingResult<()> {
        self.device
            .write_byte_data(register, value)
            .map_err(|e| LightingError::bus_io(register, e))
    }
}

impl<D: RegisterIo> Drop for Session<D> {
    fn drop(&mut self) {
        debug!("Closing {}", self.bus);
    }
}
