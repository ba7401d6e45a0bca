/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Transport trait definition.
//!
//! This module defines the abstract interface for byte-oriented serial lines.

use crate::line::LineConfig;
use cortexlink_core::error::TransportError;

/// Abstract interface for a byte-oriented serial line.
///
/// Both I/O primitives are non-blocking: a read returns whatever is buffered
/// right now and a write accepts as much as the device can take right now.
/// A return of zero is progress of zero, not an error.
pub trait Transport: Send {
    /// Applies line parameters to the device.
    ///
    /// # Errors
    /// Returns `TransportError` if the device rejects the configuration.
    fn configure(&mut self, line: &LineConfig) -> Result<(), TransportError>;

    /// Copies currently buffered input octets into `buf`.
    ///
    /// # Returns
    /// The number of octets copied, at most `buf.len()`; zero if none.
    ///
    /// # Errors
    /// Returns `TransportError` on a device failure.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Offers `octets` to the device.
    ///
    /// # Returns
    /// The number of leading octets accepted, possibly zero.
    ///
    /// # Errors
    /// Returns `TransportError` on a device failure.
    fn write_some(&mut self, octets: &[u8]) -> Result<usize, TransportError>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn configure(&mut self, line: &LineConfig) -> Result<(), TransportError> {
        (**self).configure(line)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read_available(buf)
    }

    fn write_some(&mut self, octets: &[u8]) -> Result<usize, TransportError> {
        (**self).write_some(octets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullTransport;

    impl Transport for NullTransport {
        fn configure(&mut self, _line: &LineConfig) -> Result<(), TransportError> {
            Ok(())
        }

        fn read_available(&mut self, _buf: &mut [u8]) -> Result<usize, TransportError> {
            Ok(0)
        }

        fn write_some(&mut self, octets: &[u8]) -> Result<usize, TransportError> {
            Ok(octets.len())
        }
    }

    #[test]
    fn test_boxed_transport_forwards() {
        let mut transport: Box<dyn Transport> = Box::new(NullTransport);
        let mut buf = [0u8; 8];

        assert!(transport.configure(&LineConfig::default()).is_ok());
        assert_eq!(transport.read_available(&mut buf).unwrap(), 0);
        assert_eq!(transport.write_some(b"abc").unwrap(), 3);
    }
}
