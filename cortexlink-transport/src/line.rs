/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Serial line parameters.
//!
//! The companion link always runs at 115200 baud, 8 data bits, no parity and
//! one stop bit; [`LineConfig::default`] yields exactly that.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default baud rate of the companion link.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataBits {
    /// 7 data bits.
    Seven,
    /// 8 data bits.
    #[default]
    Eight,
}

/// Parity checking mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parity {
    /// No parity bit.
    #[default]
    None,
    /// Even parity.
    Even,
    /// Odd parity.
    Odd,
}

/// Number of stop bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StopBits {
    /// One stop bit.
    #[default]
    One,
    /// Two stop bits.
    Two,
}

/// Line configuration applied to a transport during session init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineConfig {
    /// Baud rate in bits per second.
    pub baud_rate: u32,
    /// Data bits per character.
    pub data_bits: DataBits,
    /// Parity mode.
    pub parity: Parity,
    /// Stop bits.
    pub stop_bits: StopBits,
}

impl LineConfig {
    /// Creates an 8N1 configuration at the given baud rate.
    #[must_use]
    pub const fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }

    /// Sets the parity mode.
    #[must_use]
    pub const fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Sets the stop bits.
    #[must_use]
    pub const fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Returns true for 8 data bits, no parity, one stop bit.
    #[must_use]
    pub const fn is_8n1(&self) -> bool {
        matches!(
            (self.data_bits, self.parity, self.stop_bits),
            (DataBits::Eight, Parity::None, StopBits::One)
        )
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BAUD_RATE)
    }
}

impl fmt::Display for LineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = match self.data_bits {
            DataBits::Seven => '7',
            DataBits::Eight => '8',
        };
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Even => 'E',
            Parity::Odd => 'O',
        };
        let stop = match self.stop_bits {
            StopBits::One => '1',
            StopBits::Two => '2',
        };
        write!(f, "{} {bits}{parity}{stop}", self.baud_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_115200_8n1() {
        let line = LineConfig::default();
        assert_eq!(line.baud_rate, 115_200);
        assert!(line.is_8n1());
        assert_eq!(line.to_string(), "115200 8N1");
    }

    #[test]
    fn test_line_config_setters() {
        let line = LineConfig::new(230_400)
            .with_parity(Parity::Even)
            .with_stop_bits(StopBits::Two);
        assert!(!line.is_8n1());
        assert_eq!(line.to_string(), "230400 8E2");
    }
}
