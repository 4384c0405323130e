use std::{fmt, str::FromStr};

use crate::error::LightingError;

/// A 24-bit RGB color, `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color(u32);

impl Color {
    pub const MAX: u32 = 0x00FF_FFFF;

    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self(((red as u32) << 16) | ((green as u32) << 8) | blue as u32)
    }

    /// Splits the color into its `(red, green, blue)` bytes.
    pub const fn channels(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }

    pub const fn value(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for Color {
    type Error = LightingError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            return Err(LightingError::InvalidArgument(format!(
                "color {value:#x} exceeds 24 bits"
            )));
        }
        Ok(Self(value))
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// Accepts `#rrggbb`, `0xrrggbb` or bare `rrggbb`.
impl FromStr for Color {
    type Err = LightingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('#')
            .or_else(|| s.strip_prefix("0x"))
            .unwrap_or(s);
        if digits.is_empty() || digits.len() > 6 {
            return Err(LightingError::InvalidArgument(format!(
                "'{s}' is not a 24-bit hex color"
            )));
        }
        u32::from_str_radix(digits, 16)
            .map_err(|e| LightingError::InvalidArgument(format!("'{s}': {e}")))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn channels_recombine_over_full_range() {
        for value in 0..=Color::MAX {
            let (r, g, b) = Color(value).channels();
            let recombined = ((r as u32) << 16) + ((g as u32) << 8) + b as u32;
            assert_eq!(recombined, value);
        }
    }

    #[test]
    fn channel_order() {
        assert_eq!(Color(0x112233).channels(), (0x11, 0x22, 0x33));
        assert_eq!(Color::from_rgb(0x11, 0x22, 0x33), Color(0x112233));
    }

    #[test]
    fn rejects_values_above_24_bits() {
        assert!(Color::try_from(0x0100_0000).is_err());
        assert_eq!(Color::try_from(0xFFFFFF).unwrap().value(), 0xFFFFFF);
    }

    #[test]
    fn parse_accepted_forms() {
        assert_eq!("#ff8000".parse::<Color>().unwrap(), Color(0xFF8000));
        assert_eq!("0x0000ff".parse::<Color>().unwrap(), Color(0x0000FF));
        assert_eq!("12".parse::<Color>().unwrap(), Color(0x12));
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", "#", "#1234567", "zzzzzz", "#-12345"] {
            assert!(
                matches!(input.parse::<Color>(), Err(LightingError::InvalidArgument(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn display_is_lowercase_hex() {
        assert_eq!(Color(0xABCDEF).to_string(), "#abcdef");
        assert_eq!(Color(0x1).to_string(), "#000001");
    }

    proptest! {
        #[test]
        fn rgb_roundtrip(r in any::<u8>(), g in any::<u8>(), b in any::<u8>()) {
            prop_assert_eq!(Color::from_rgb(r, g, b).channels(), (r, g, b));
        }

        #[test]
        fn display_parse_roundtrip(value in 0u32..=Color::MAX) {
            let color = Color(value);
            prop_assert_eq!(color.to_string().parse::<Color>().unwrap(), color);
        }
    }
}
