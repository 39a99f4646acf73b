//! In-process simulated transports for CI and for running without a robot.
//!
//! [`SimConnector`] answers on a fixed set of transports and refuses all
//! others, which makes fallback behaviour easy to exercise.  Every link it
//! opens writes into a shared [`SimWire`] so tests can inspect exactly what
//! reached each transport.
//!
//! # Example
//!
//! ```rust
//! use tickwork_hal::{Connector, Link, SimConnector};
//! use tickwork_types::{DevicePayload, TransportSpec};
//!
//! let mut connector = SimConnector::new([TransportSpec::usb("USB1")]);
//! let wire = connector.wire();
//!
//! assert!(connector.try_open(&TransportSpec::usb("USB2")).is_err());
//! let mut link = connector.try_open(&TransportSpec::usb("USB1")).unwrap();
//! link.send(&DevicePayload::Neutral).unwrap();
//!
//! assert_eq!(wire.sent().len(), 1);
//! ```

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tickwork_types::{DevicePayload, TickError, TransportSpec};

use crate::transport::{Connector, Link};

// ────────────────────────────────────────────────────────────────────────────
// Wire recorder
// ────────────────────────────────────────────────────────────────────────────

/// Shared log of every payload delivered over a simulated link.
#[derive(Clone, Default)]
pub struct SimWire {
    sent: Arc<Mutex<Vec<(TransportSpec, DevicePayload)>>>,
}

impl SimWire {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in delivery order.
    pub fn sent(&self) -> Vec<(TransportSpec, DevicePayload)> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Payloads delivered over `transport`, in delivery order.
    pub fn sent_to(&self, transport: &TransportSpec) -> Vec<DevicePayload> {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|(t, _)| t == transport)
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn record(&self, transport: &TransportSpec, payload: &DevicePayload) {
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((transport.clone(), payload.clone()));
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub link
// ────────────────────────────────────────────────────────────────────────────

/// A simulated link that records payloads on its [`SimWire`].  Always
/// succeeds.
pub struct SimLink {
    transport: TransportSpec,
    wire: SimWire,
}

impl SimLink {
    pub fn new(transport: TransportSpec, wire: SimWire) -> Self {
        Self { transport, wire }
    }
}

impl Link for SimLink {
    fn send(&mut self, payload: &DevicePayload) -> Result<(), TickError> {
        self.wire.record(&self.transport, payload);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Connector
// ────────────────────────────────────────────────────────────────────────────

/// Simulated hardware bus: a device answers on each transport in
/// `available`, nothing answers anywhere else.
pub struct SimConnector {
    available: HashSet<TransportSpec>,
    attempts: Vec<TransportSpec>,
    wire: SimWire,
}

impl SimConnector {
    pub fn new(available: impl IntoIterator<Item = TransportSpec>) -> Self {
        Self {
            available: available.into_iter().collect(),
            attempts: Vec::new(),
            wire: SimWire::new(),
        }
    }

    /// A bus where nothing answers.
    pub fn offline() -> Self {
        Self::new(Vec::new())
    }

    /// Every transport `try_open` was called with, in call order.
    pub fn attempts(&self) -> &[TransportSpec] {
        &self.attempts
    }

    /// Handle on the shared wire recorder.
    pub fn wire(&self) -> SimWire {
        self.wire.clone()
    }
}

impl Connector for SimConnector {
    fn try_open(&mut self, spec: &TransportSpec) -> Result<Box<dyn Link>, TickError> {
        self.attempts.push(spec.clone());
        if self.available.contains(spec) {
            Ok(Box::new(SimLink::new(spec.clone(), self.wire.clone())))
        } else {
            Err(TickError::TransportFailed {
                transport: spec.clone(),
                reason: "no simulated device on this transport".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_unknown_transports() {
        let mut connector = SimConnector::new([TransportSpec::uart("MXP")]);
        let err = connector
            .try_open(&TransportSpec::uart_at("MXP", 230_400))
            .err()
            .unwrap();
        assert!(matches!(err, TickError::TransportFailed { .. }));
    }

    #[test]
    fn records_attempts_in_order() {
        let mut connector = SimConnector::offline();
        let _ = connector.try_open(&TransportSpec::usb("USB1"));
        let _ = connector.try_open(&TransportSpec::can(3));
        assert_eq!(
            connector.attempts(),
            &[TransportSpec::usb("USB1"), TransportSpec::can(3)]
        );
    }

    #[test]
    fn wire_is_shared_between_links() {
        let mut connector =
            SimConnector::new([TransportSpec::usb("USB1"), TransportSpec::usb("USB2")]);
        let wire = connector.wire();
        let mut a = connector.try_open(&TransportSpec::usb("USB1")).unwrap();
        let mut b = connector.try_open(&TransportSpec::usb("USB2")).unwrap();

        a.send(&DevicePayload::MotorOutput(1.0)).unwrap();
        b.send(&DevicePayload::Neutral).unwrap();

        assert_eq!(wire.sent().len(), 2);
        assert_eq!(
            wire.sent_to(&TransportSpec::usb("USB2")),
            vec![DevicePayload::Neutral]
        );
        wire.clear();
        assert!(wire.sent().is_empty());
    }
}
