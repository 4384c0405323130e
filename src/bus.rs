//! I2C bus discovery and register access.

use std::{fmt, io};

pub mod channel;
pub mod locator;
pub mod smbus;

pub use channel::{RegisterChannel, Session};
pub use locator::{Adapter, BusLocator};
pub use smbus::I2cDevOpener;

/// Number of an I2C adapter, as in `/dev/i2c-<N>`.
///
/// Valid for a single transaction only; callers resolve it again through
/// [`BusLocator`] instead of caching it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusHandle(u32);

impl BusHandle {
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    pub const fn number(self) -> u32 {
        self.0
    }
}

impl fmt::Display for BusHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i2c-{}", self.0)
    }
}

/// Byte-wide register access to one chip on an open bus.
pub trait RegisterIo {
    fn read_byte_data(&mut self, register: u8) -> io::Result<u8>;
    fn write_byte_data(&mut self, register: u8, value: u8) -> io::Result<()>;
}

/// Opens a bus and binds it to a chip address.
///
/// The returned device releases the bus when dropped.
pub trait BusOpener: Send + Sync + 'static {
    type Device: RegisterIo;

    fn open(&self, bus: BusHandle, chip_address: u8) -> io::Result<Self::Device>;
}
