use std::{fmt, str::FromStr};

use crate::error::LightingError;

/// Built-in lighting effects of the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Static,
    Breathing,
    Blink,
    Demo,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Static, Mode::Breathing, Mode::Blink, Mode::Demo];

    /// Byte written to the mode register.
    pub const fn raw(self) -> u8 {
        match self {
            Mode::Static => 0x01,
            Mode::Breathing => 0x02,
            Mode::Blink => 0x03,
            Mode::Demo => 0x04,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Mode::Static => "static",
            Mode::Breathing => "breathing",
            Mode::Blink => "blink",
            Mode::Demo => "demo",
        }
    }
}

/// Decodes a mode register value; unknown bytes have no symbolic name.
impl TryFrom<u8> for Mode {
    type Error = LightingError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.raw() == raw)
            .ok_or(LightingError::AmbiguousDeviceState { raw })
    }
}

impl FromStr for Mode {
    type Err = LightingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| {
                LightingError::InvalidArgument(format!(
                    "unknown mode '{s}', expected one of: static, breathing, blink, demo"
                ))
            })
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values() {
        assert_eq!(Mode::Static.raw(), 0x01);
        assert_eq!(Mode::Breathing.raw(), 0x02);
        assert_eq!(Mode::Blink.raw(), 0x03);
        assert_eq!(Mode::Demo.raw(), 0x04);
    }

    #[test]
    fn mapping_is_invertible() {
        for mode in Mode::ALL {
            assert_eq!(Mode::try_from(mode.raw()).unwrap(), mode);
            assert_eq!(mode.name().parse::<Mode>().unwrap(), mode);
            assert_eq!(mode.to_string(), mode.name());
        }
    }

    #[test]
    fn unknown_raw_bytes_are_ambiguous() {
        for raw in (0..=u8::MAX).filter(|b| !(0x01..=0x04).contains(b)) {
            match Mode::try_from(raw) {
                Err(LightingError::AmbiguousDeviceState { raw: got }) => assert_eq!(got, raw),
                other => panic!("{raw:#04x} decoded as {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_names_are_invalid() {
        for name in ["", "Static", "rainbow", "blink "] {
            assert!(matches!(
                name.parse::<Mode>(),
                Err(LightingError::InvalidArgument(_))
            ));
        }
    }
}
