//! Transport traits implemented by the hardware collaborator layer.
//!
//! A [`Connector`] knows how to open a link for a given
//! [`TransportSpec`]; the resulting [`Link`] accepts opaque
//! [`DevicePayload`]s.  Drivers implement these traits and the rest of the
//! stack only ever talks to the traits, so a USB driver, a UART driver and
//! the simulator are interchangeable.

use tickwork_types::{DevicePayload, TickError, TransportSpec};

/// An open connection to one physical device.
pub trait Link: Send {
    /// Hand `payload` to the device.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::HardwareFault`] if the driver could not deliver
    /// the payload.
    fn send(&mut self, payload: &DevicePayload) -> Result<(), TickError>;

    /// Whether the driver still considers the link healthy.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Opens links on behalf of a [`DeviceHandle`][crate::device::DeviceHandle].
///
/// `try_open` may block (serial port enumeration, USB handshakes); it is only
/// ever called while subsystems are being constructed, never inside a tick.
pub trait Connector {
    /// Make a single attempt to open `spec`.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::TransportFailed`] when nothing answers on that
    /// transport.
    fn try_open(&mut self, spec: &TransportSpec) -> Result<Box<dyn Link>, TickError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingLink {
        sent: usize,
    }

    impl Link for CountingLink {
        fn send(&mut self, _payload: &DevicePayload) -> Result<(), TickError> {
            self.sent += 1;
            Ok(())
        }
    }

    #[test]
    fn link_is_alive_by_default() {
        let mut link = CountingLink { sent: 0 };
        assert!(link.is_alive());
        link.send(&DevicePayload::Neutral).unwrap();
        assert_eq!(link.sent, 1);
    }
}
