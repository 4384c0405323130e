//! Linux i2c-dev backend speaking SMBus byte-data transfers.

use std::{
    fs::{File, OpenOptions},
    io,
    os::fd::AsRawFd,
    path::PathBuf,
};

use super::{BusHandle, BusOpener, RegisterIo};

// linux/i2c-dev.h
const I2C_SLAVE: libc::c_ulong = 0x0703;
const I2C_SMBUS: libc::c_ulong = 0x0720;

// linux/i2c.h
const I2C_SMBUS_WRITE: u8 = 0;
const I2C_SMBUS_READ: u8 = 1;
const I2C_SMBUS_BYTE_DATA: u32 = 2;
const I2C_SMBUS_BLOCK_MAX: usize = 32;

// Only `byte` is used, the rest keeps the kernel's size.
#[allow(dead_code)]
#[repr(C)]
union SmbusData {
    byte: u8,
    word: u16,
    block: [u8; I2C_SMBUS_BLOCK_MAX + 2],
}

#[repr(C)]
struct SmbusIoctlData {
    read_write: u8,
    command: u8,
    size: u32,
    data: *mut SmbusData,
}

/// Opens `/dev/i2c-<N>` character devices.
#[derive(Debug, Clone)]
pub struct I2cDevOpener {
    dev_dir: PathBuf,
}

impl I2cDevOpener {
    pub fn new(dev_dir: impl Into<PathBuf>) -> Self {
        Self {
            dev_dir: dev_dir.into(),
        }
    }

    fn device_path(&self, bus: BusHandle) -> PathBuf {
        self.dev_dir.join(bus.to_string())
    }
}

impl BusOpener for I2cDevOpener {
    type Device = I2cDevice;

    fn open(&self, bus: BusHandle, chip_address: u8) -> io::Result<I2cDevice> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(self.device_path(bus))?;

        // SAFETY: I2C_SLAVE takes the address by value; the fd is owned by `file`.
        let rc = unsafe {
            libc::ioctl(
                file.as_raw_fd(),
                I2C_SLAVE as _,
                libc::c_ulong::from(chip_address),
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(I2cDevice { file })
    }
}

/// An open i2c-dev file bound to one chip. Closed on drop.
#[derive(Debug)]
pub struct I2cDevice {
    file: File,
}

impl I2cDevice {
    fn smbus_access(&self, read_write: u8, command: u8, data: &mut SmbusData) -> io::Result<()> {
        let mut args = SmbusIoctlData {
            read_write,
            command,
            size: I2C_SMBUS_BYTE_DATA,
            data,
        };
        // SAFETY: `args` and `data` outlive the call and match the kernel layout.
        let rc = unsafe {
            libc::ioctl(
                self.file.as_raw_fd(),
                I2C_SMBUS as _,
                &mut args as *mut SmbusIoctlData,
            )
        };
        if rc < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl RegisterIo for I2cDevice {
    fn read_byte_data(&mut self, register: u8) -> io::Result<u8> {
        let mut data = SmbusData { word: 0 };
        self.smbus_access(I2C_SMBUS_READ, register, &mut data)?;
        // SAFETY: the kernel filled the `byte` member for a BYTE_DATA read.
        Ok(unsafe { data.byte })
    }

    fn write_byte_data(&mut self, register: u8, value: u8) -> io::Result<()> {
        let mut data = SmbusData { byte: value };
        self.smbus_access(I2C_SMBUS_WRITE, register, &mut data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_path_follows_bus_number() {
        let opener = I2cDevOpener::new("/dev");
        assert_eq!(
            opener.device_path(BusHandle::new(3)),
            PathBuf::from("/dev/i2c-3")
        );
    }

    #[test]
    fn missing_device_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let opener = I2cDevOpener::new(dir.path());
        let err = opener.open(BusHandle::new(0), 0x29).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn ioctl_struct_matches_kernel_layout() {
        assert_eq!(std::mem::size_of::<SmbusData>(), I2C_SMBUS_BLOCK_MAX + 2);
        assert_eq!(
            std::mem::size_of::<SmbusIoctlData>(),
            8 + std::mem::size_of::<*mut SmbusData>()
        );
    }
}
