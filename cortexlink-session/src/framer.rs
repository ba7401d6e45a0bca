/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! Packet framer interface.
//!
//! A framer turns the raw octet stream into verified packets and back, and
//! knows whether its link handshake has completed. The session owns one
//! framer per link and binds its callbacks through a [`FrameSink`] on every
//! call, so a framer never holds references back into the session.

use cortexlink_core::error::FramerError;

/// Callbacks a framer uses to hand data back to the session.
pub trait FrameSink {
    /// Called with each complete, verified inbound packet.
    fn deliver(&mut self, packet: &[u8]);

    /// Called with encoded outbound octets to be put on the line.
    ///
    /// # Returns
    /// The number of octets accepted.
    ///
    /// # Errors
    /// Returns `FramerError::Sink` if the octets cannot be queued.
    fn write(&mut self, octets: &[u8]) -> Result<usize, FramerError>;
}

/// Byte-level framing and integrity protocol.
pub trait Framer: Send {
    /// Returns the framer to its initial, unconnected state.
    fn init(&mut self);

    /// Feeds one received octet.
    ///
    /// May call [`FrameSink::deliver`] when the octet completes a packet and
    /// [`FrameSink::write`] to answer handshakes, each zero or more times.
    fn deliver_octet(&mut self, octet: u8, sink: &mut dyn FrameSink);

    /// Encodes one outbound packet and writes it through `sink`.
    ///
    /// # Returns
    /// The number of encoded octets written.
    ///
    /// # Errors
    /// Returns `FramerError` if the packet cannot be framed or written.
    fn write_packet(&mut self, packet: &[u8], sink: &mut dyn FrameSink)
    -> Result<usize, FramerError>;

    /// Returns true once the link handshake has completed.
    fn is_connected(&self) -> bool;
}

impl<T: Framer + ?Sized> Framer for Box<T> {
    fn init(&mut self) {
        (**self).init();
    }

    fn deliver_octet(&mut self, octet: u8, sink: &mut dyn FrameSink) {
        (**self).deliver_octet(octet, sink);
    }

    fn write_packet(
        &mut self,
        packet: &[u8],
        sink: &mut dyn FrameSink,
    ) -> Result<usize, FramerError> {
        (**self).write_packet(packet, sink)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }
}
