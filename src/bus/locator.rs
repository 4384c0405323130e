//! Discovery of the I2C adapter that carries the lighting chip.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, warn};

use crate::{
    config::DeviceConfig,
    error::{LightingError, LightingResult},
};

use super::BusHandle;

/// Device and filesystem-type tag of the sysfs entry in the mount table.
const SYSFS_TAG: &str = "sysfs";

/// Directory under sysfs listing the i2c character devices.
const I2C_DEV_CLASS: &str = "class/i2c-dev";

/// Prefix of every entry under [`I2C_DEV_CLASS`].
const ADAPTER_ENTRY_PREFIX: &str = "i2c-";

/// One enumerated I2C adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapter {
    pub bus: BusHandle,
    pub name: String,
}

/// Resolves the bus number of the adapter whose name starts with the
/// configured prefix.
#[derive(Debug, Clone)]
pub struct BusLocator {
    mounts_path: PathBuf,
    sysfs_default: PathBuf,
    adapter_prefix: String,
}

impl BusLocator {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            mounts_path: config.mounts_path.clone(),
            sysfs_default: config.sysfs_default.clone(),
            adapter_prefix: config.adapter_prefix.clone(),
        }
    }

    /// Finds the bus carrying the lighting chip.
    ///
    /// Adapters are visited in ascending bus order, so with several matching
    /// adapters the lowest-numbered one wins regardless of directory order.
    pub fn locate(&self) -> LightingResult<BusHandle> {
        let sysfs = self.locate_sysfs();
        let adapters = list_adapters(&sysfs)?;

        adapters
            .into_iter()
            .find(|adapter| adapter.name.starts_with(&self.adapter_prefix))
            .map(|adapter| {
                debug!("Found '{}' on {}", adapter.name, adapter.bus);
                adapter.bus
            })
            .ok_or_else(|| LightingError::AdapterNotFound {
                prefix: self.adapter_prefix.clone(),
            })
    }

    /// Returns the sysfs mount point from the mount table.
    ///
    /// Falls back to the default path with a warning when the table has no
    /// sysfs entry or cannot be read.
    pub fn locate_sysfs(&self) -> PathBuf {
        let mount_point = match fs::read_to_string(&self.mounts_path) {
            Ok(table) => find_sysfs_mount(&table),
            Err(e) => {
                warn!("Cannot read {}: {e}", self.mounts_path.display());
                None
            }
        };

        mount_point.unwrap_or_else(|| {
            warn!(
                "sysfs not found in {}. Using default {}",
                self.mounts_path.display(),
                self.sysfs_default.display()
            );
            self.sysfs_default.clone()
        })
    }
}

/// Enumerates `<sysfs>/class/i2c-dev`, sorted by bus number.
pub fn list_adapters(sysfs: &Path) -> LightingResult<Vec<Adapter>> {
    let base = sysfs.join(I2C_DEV_CLASS);
    let entries = fs::read_dir(&base).map_err(|e| LightingError::SysFsUnavailable {
        path: base.clone(),
        reason: e.to_string(),
    })?;

    let mut adapters = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| LightingError::SysFsUnavailable {
            path: base.clone(),
            reason: e.to_string(),
        })?;
        let file_name = entry.file_name();
        let Some(bus) = file_name.to_str().and_then(parse_entry_name) else {
            debug!("Skipping unexpected i2c-dev entry {file_name:?}");
            continue;
        };

        let name_path = entry.path().join("name");
        let name = fs::read_to_string(&name_path).map_err(|e| LightingError::SysFsUnavailable {
            path: name_path,
            reason: e.to_string(),
        })?;

        adapters.push(Adapter {
            bus,
            name: name.trim().to_string(),
        });
    }

    adapters.sort_by_key(|adapter| adapter.bus);
    Ok(adapters)
}

fn parse_entry_name(entry: &str) -> Option<BusHandle> {
    entry
        .strip_prefix(ADAPTER_ENTRY_PREFIX)?
        .parse()
        .ok()
        .map(BusHandle::new)
}

/// Picks the mount point of the last `sysfs sysfs` entry of a mount table.
fn find_sysfs_mount(table: &str) -> Option<PathBuf> {
    table
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [device, mount_point, fs_type, ..]
                    if *device == SYSFS_TAG && *fs_type == SYSFS_TAG =>
                {
                    Some(PathBuf::from(unescape_mount_field(mount_point)))
                }
                _ => None,
            }
        })
        .last()
}

/// Decodes the `\ooo` octal escapes the kernel uses for whitespace in
/// mount table fields.
fn unescape_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escape = bytes.get(i + 1..i + 4).filter(|_| bytes[i] == b'\\');
        match escape.and_then(|digits| std::str::from_utf8(digits).ok()) {
            Some(digits) if digits.bytes().all(|d| (b'0'..=b'7').contains(&d)) => {
                match u8::from_str_radix(digits, 8) {
                    Ok(byte) => {
                        out.push(byte);
                        i += 4;
                        continue;
                    }
                    Err(_) => out.push(bytes[i]),
                }
            }
            _ => out.push(bytes[i]),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// Fake sysfs tree plus mount table pointing at it.
    pub(crate) struct FakeSysfs {
        pub dir: TempDir,
    }

    impl FakeSysfs {
        pub(crate) fn new(adapters: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let sysfs = dir.path().join("sys");
            let class = sysfs.join(I2C_DEV_CLASS);
            fs::create_dir_all(&class).unwrap();
            for (entry, name) in adapters {
                let adapter = class.join(entry);
                fs::create_dir(&adapter).unwrap();
                fs::write(adapter.join("name"), format!("{name}\n")).unwrap();
            }
            fs::write(
                dir.path().join("mounts"),
                format!(
                    "proc /proc proc rw,nosuid 0 0\nsysfs {} sysfs rw,nosuid 0 0\n",
                    sysfs.display()
                ),
            )
            .unwrap();
            Self { dir }
        }

        pub(crate) fn device_config(&self) -> DeviceConfig {
            DeviceConfig {
                mounts_path: self.dir.path().join("mounts"),
                sysfs_default: self.dir.path().join("missing"),
                ..DeviceConfig::default()
            }
        }

        pub(crate) fn sysfs(&self) -> PathBuf {
            self.dir.path().join("sys")
        }
    }

    #[test]
    fn locate_picks_nvidia_adapter() {
        let fake = FakeSysfs::new(&[
            ("i2c-0", "Some other adapter"),
            ("i2c-3", "NVIDIA i2c adapter 1 bus"),
        ]);
        let locator = BusLocator::new(&fake.device_config());
        assert_eq!(locator.locate().unwrap(), BusHandle::new(3));
    }

    #[test]
    fn locate_without_match_is_adapter_not_found() {
        let fake = FakeSysfs::new(&[
            ("i2c-0", "Some other adapter"),
            ("i2c-1", "NVIDIA i2c adapter 3 bus"),
        ]);
        let locator = BusLocator::new(&fake.device_config());
        match locator.locate() {
            Err(LightingError::AdapterNotFound { prefix }) => {
                assert_eq!(prefix, "NVIDIA i2c adapter 1")
            }
            other => panic!("expected AdapterNotFound, got {other:?}"),
        }
    }

    #[test]
    fn locate_prefers_lowest_bus_number() {
        let fake = FakeSysfs::new(&[
            ("i2c-12", "NVIDIA i2c adapter 1 bus"),
            ("i2c-7", "NVIDIA i2c adapter 1 bus"),
            ("i2c-9", "NVIDIA i2c adapter 1 bus"),
        ]);
        let locator = BusLocator::new(&fake.device_config());
        assert_eq!(locator.locate().unwrap(), BusHandle::new(7));
    }

    #[test]
    fn missing_class_dir_is_sysfs_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        match list_adapters(dir.path()) {
            Err(LightingError::SysFsUnavailable { path, .. }) => {
                assert_eq!(path, dir.path().join(I2C_DEV_CLASS))
            }
            other => panic!("expected SysFsUnavailable, got {other:?}"),
        }
    }

    #[test]
    fn missing_name_file_is_sysfs_unavailable() {
        let fake = FakeSysfs::new(&[("i2c-0", "Some other adapter")]);
        fs::create_dir(fake.sysfs().join(I2C_DEV_CLASS).join("i2c-4")).unwrap();
        assert!(matches!(
            list_adapters(&fake.sysfs()),
            Err(LightingError::SysFsUnavailable { .. })
        ));
    }

    #[test]
    fn list_adapters_skips_foreign_entries() {
        let fake = FakeSysfs::new(&[("i2c-2", "b"), ("i2c-1", "a"), ("bogus", "c")]);
        let adapters = list_adapters(&fake.sysfs()).unwrap();
        assert_eq!(
            adapters,
            vec![
                Adapter {
                    bus: BusHandle::new(1),
                    name: "a".into()
                },
                Adapter {
                    bus: BusHandle::new(2),
                    name: "b".into()
                },
            ]
        );
    }

    #[test]
    fn locate_sysfs_reads_mount_table() {
        let fake = FakeSysfs::new(&[]);
        let locator = BusLocator::new(&fake.device_config());
        assert_eq!(locator.locate_sysfs(), fake.sysfs());
    }

    #[test]
    fn locate_sysfs_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let mounts = dir.path().join("mounts");
        fs::write(&mounts, "proc /proc proc rw 0 0\nnone /sys tmpfs rw 0 0\n").unwrap();
        let config = DeviceConfig {
            mounts_path: mounts,
            sysfs_default: PathBuf::from("/default/sys"),
            ..DeviceConfig::default()
        };
        assert_eq!(
            BusLocator::new(&config).locate_sysfs(),
            PathBuf::from("/default/sys")
        );
    }

    #[test]
    fn locate_sysfs_unreadable_table_falls_back() {
        let config = DeviceConfig {
            mounts_path: PathBuf::from("/nonexistent/mounts"),
            sysfs_default: PathBuf::from("/default/sys"),
            ..DeviceConfig::default()
        };
        assert_eq!(
            BusLocator::new(&config).locate_sysfs(),
            PathBuf::from("/default/sys")
        );
    }

    #[test]
    fn find_sysfs_mount_takes_last_entry() {
        let table = "sysfs /sys sysfs rw 0 0\nsysfs /chroot/sys sysfs rw 0 0\n";
        assert_eq!(find_sysfs_mount(table), Some(PathBuf::from("/chroot/sys")));
    }

    #[test]
    fn find_sysfs_mount_requires_both_tags() {
        let table = "sysfs /sys tmpfs rw 0 0\nnone /other sysfs rw 0 0\n";
        assert_eq!(find_sysfs_mount(table), None);
    }

    #[test]
    fn mount_field_escapes_are_decoded() {
        assert_eq!(unescape_mount_field(r"/mnt/my\040sys"), "/mnt/my sys");
        assert_eq!(unescape_mount_field(r"/plain"), "/plain");
        assert_eq!(unescape_mount_field(r"/odd\9"), r"/odd\9");
    }

    #[test]
    fn parse_entry_name_requires_number() {
        assert_eq!(parse_entry_name("i2c-10"), Some(BusHandle::new(10)));
        assert_eq!(parse_entry_name("i2c-"), None);
        assert_eq!(parse_entry_name("spi-1"), None);
    }
}
