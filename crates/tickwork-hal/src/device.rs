//! [`DeviceHandle`] – multi-transport device acquisition.
//!
//! Link quality is only knowable at runtime: the USB cable may be missing, or
//! the UART may need a specific baud rate.  A device therefore declares its
//! transports as an ordered preference list, and the handle walks that list
//! once, stopping at the first transport that opens.
//!
//! Acquisition happens once per boot.  After a success the handle never
//! tries another candidate; after exhausting every candidate it stays
//! disconnected and every output call fails with
//! [`TickError::DeviceDisconnected`] instead of driving hardware.
//!
//! # Example
//!
//! ```rust
//! use tickwork_hal::{DeviceConfig, DeviceHandle, SimConnector};
//! use tickwork_types::TransportSpec;
//!
//! let mut connector = SimConnector::new([TransportSpec::uart("MXP")]);
//! let mut handle = DeviceHandle::new(DeviceConfig::new(
//!     "connector-x",
//!     vec![TransportSpec::usb("USB2"), TransportSpec::uart("MXP")],
//! ));
//!
//! let active = handle.connect(&mut connector).unwrap();
//! assert_eq!(active, TransportSpec::uart("MXP"));
//! assert!(handle.is_connected());
//! ```

use tickwork_types::{DevicePayload, DeviceStatus, TickError, TransportSpec};
use tracing::{debug, info, warn};

use crate::transport::{Connector, Link};

/// Transport that won acquisition, or [`TickError::AllTransportsFailed`].
pub type ConnectionResult = Result<TransportSpec, TickError>;

/// Immutable description of one device: a name for logs and telemetry plus
/// its transport candidates in order of preference.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceConfig {
    pub name: String,
    pub candidates: Vec<TransportSpec>,
}

impl DeviceConfig {
    pub fn new(name: impl Into<String>, candidates: Vec<TransportSpec>) -> Self {
        Self {
            name: name.into(),
            candidates,
        }
    }
}

/// Owns the connection to one physical actuator or sensor.
pub struct DeviceHandle {
    config: DeviceConfig,
    active_transport: Option<TransportSpec>,
    link: Option<Box<dyn Link>>,
    /// Set once acquisition has run, successful or not.
    attempted: bool,
}

impl DeviceHandle {
    /// Create a handle that has not attempted any transport yet.
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            config,
            active_transport: None,
            link: None,
            attempted: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn candidates(&self) -> &[TransportSpec] {
        &self.config.candidates
    }

    /// Try every candidate transport in declared order, one attempt each,
    /// stopping at the first that opens.
    ///
    /// Repeated calls do not retry: after a success they return the active
    /// transport, after a failure they return the same error.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::AllTransportsFailed`] when no candidate opened
    /// (including the case of an empty candidate list).
    pub fn connect(&mut self, connector: &mut dyn Connector) -> ConnectionResult {
        if let Some(active) = &self.active_transport {
            return Ok(active.clone());
        }
        if self.attempted {
            return Err(self.exhausted());
        }
        self.attempted = true;

        for spec in &self.config.candidates {
            debug!(device = %self.config.name, transport = %spec, "attempting transport");
            match connector.try_open(spec) {
                Ok(link) => {
                    info!(device = %self.config.name, transport = %spec, "device connected");
                    self.link = Some(link);
                    self.active_transport = Some(spec.clone());
                    return Ok(spec.clone());
                }
                Err(e) => {
                    debug!(device = %self.config.name, transport = %spec, error = %e, "transport candidate failed");
                }
            }
        }

        warn!(
            device = %self.config.name,
            attempted = self.config.candidates.len(),
            "all transport candidates failed; device stays inert"
        );
        Err(self.exhausted())
    }

    pub fn is_connected(&self) -> bool {
        self.active_transport.is_some()
    }

    pub fn active_transport(&self) -> Option<&TransportSpec> {
        self.active_transport.as_ref()
    }

    /// Forward `payload` to the connected device.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::DeviceDisconnected`] when acquisition never
    /// succeeded; nothing is sent in that case.  Link errors are passed
    /// through unchanged.
    pub fn send(&mut self, payload: &DevicePayload) -> Result<(), TickError> {
        match self.link.as_mut() {
            Some(link) => link.send(payload),
            None => Err(TickError::DeviceDisconnected {
                device: self.config.name.clone(),
            }),
        }
    }

    pub fn status(&self) -> DeviceStatus {
        DeviceStatus {
            name: self.config.name.clone(),
            connected: self.is_connected() && self.link.as_ref().is_some_and(|l| l.is_alive()),
            active_transport: self.active_transport.clone(),
        }
    }

    fn exhausted(&self) -> TickError {
        TickError::AllTransportsFailed {
            device: self.config.name.clone(),
            attempted: self.config.candidates.len(),
        }
    }
}

impl std::fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("name", &self.config.name)
            .field("candidates", &self.config.candidates)
            .field("active_transport", &self.active_transport)
            .field("attempted", &self.attempted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimConnector;

    fn usb(port: &str) -> TransportSpec {
        TransportSpec::usb(port)
    }

    #[test]
    fn falls_back_to_second_candidate() {
        let mut connector = SimConnector::new([usb("B")]);
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![usb("A"), usb("B")]));

        assert_eq!(handle.connect(&mut connector), Ok(usb("B")));
        assert!(handle.is_connected());
        assert_eq!(handle.active_transport(), Some(&usb("B")));
        assert_eq!(connector.attempts(), &[usb("A"), usb("B")]);
    }

    #[test]
    fn stops_at_first_success() {
        let mut connector = SimConnector::new([usb("A"), usb("B")]);
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![usb("A"), usb("B")]));

        assert_eq!(handle.connect(&mut connector), Ok(usb("A")));
        // B was never tried.
        assert_eq!(connector.attempts(), &[usb("A")]);
    }

    #[test]
    fn all_candidates_failing_leaves_handle_disconnected() {
        let mut connector = SimConnector::offline();
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![usb("A"), usb("B")]));

        let result = handle.connect(&mut connector);
        assert_eq!(
            result,
            Err(TickError::AllTransportsFailed {
                device: "dev".into(),
                attempted: 2,
            })
        );
        assert!(!handle.is_connected());
        assert!(handle.active_transport().is_none());
        assert!(!handle.status().connected);
    }

    #[test]
    fn connect_after_success_does_not_retry() {
        let mut connector = SimConnector::new([usb("A")]);
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![usb("A")]));
        handle.connect(&mut connector).unwrap();
        assert_eq!(handle.connect(&mut connector), Ok(usb("A")));
        assert_eq!(connector.attempts().len(), 1);
    }

    #[test]
    fn failure_is_terminal_for_the_boot_cycle() {
        let mut connector = SimConnector::offline();
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![usb("A")]));
        assert!(handle.connect(&mut connector).is_err());

        // Even if the device shows up later, the handle does not re-attempt.
        let mut late = SimConnector::new([usb("A")]);
        assert!(handle.connect(&mut late).is_err());
        assert!(late.attempts().is_empty());
    }

    #[test]
    fn empty_candidate_list_fails() {
        let mut connector = SimConnector::new([usb("A")]);
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![]));
        assert!(matches!(
            handle.connect(&mut connector),
            Err(TickError::AllTransportsFailed { attempted: 0, .. })
        ));
    }

    #[test]
    fn send_on_disconnected_handle_is_rejected() {
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![usb("A")]));
        let result = handle.send(&DevicePayload::Neutral);
        assert!(matches!(result, Err(TickError::DeviceDisconnected { .. })));
    }

    #[test]
    fn send_reaches_the_active_link() {
        let mut connector = SimConnector::new([usb("A")]);
        let wire = connector.wire();
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![usb("A")]));
        handle.connect(&mut connector).unwrap();

        handle.send(&DevicePayload::MotorOutput(0.5)).unwrap();
        assert_eq!(wire.sent_to(&usb("A")), vec![DevicePayload::MotorOutput(0.5)]);
    }

    #[test]
    fn status_reports_active_transport() {
        let mut connector = SimConnector::new([usb("A")]);
        let mut handle = DeviceHandle::new(DeviceConfig::new("dev", vec![usb("A")]));
        handle.connect(&mut connector).unwrap();
        let status = handle.status();
        assert_eq!(status.name, "dev");
        assert!(status.connected);
        assert_eq!(status.active_transport, Some(usb("A")));
    }
}
