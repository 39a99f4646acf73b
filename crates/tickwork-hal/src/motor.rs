//! Motor controller device driven by a normalised duty cycle.

use tickwork_types::{DevicePayload, DeviceStatus, TickError};

use crate::device::{ConnectionResult, DeviceConfig, DeviceHandle};
use crate::transport::Connector;

/// A motor controller reached through a [`DeviceHandle`].
///
/// Output is a duty cycle in `-1.0..=1.0`; values outside that range are
/// clamped before they leave the process.
#[derive(Debug)]
pub struct MotorController {
    handle: DeviceHandle,
    /// Last duty cycle the device accepted.
    output: f32,
}

impl MotorController {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            handle: DeviceHandle::new(config),
            output: 0.0,
        }
    }

    /// Acquire the controller; see [`DeviceHandle::connect`].
    pub fn connect(&mut self, connector: &mut dyn Connector) -> ConnectionResult {
        self.handle.connect(connector)
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_connected()
    }

    /// Command a duty cycle.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::DeviceDisconnected`] while the controller is inert;
    /// the recorded output is left unchanged.
    pub fn set_output(&mut self, duty: f32) -> Result<(), TickError> {
        let duty = if duty.is_nan() { 0.0 } else { duty.clamp(-1.0, 1.0) };
        self.handle.send(&DevicePayload::MotorOutput(duty))?;
        self.output = duty;
        Ok(())
    }

    /// Put the controller in its neutral (coast) state.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::DeviceDisconnected`] while the controller is inert.
    pub fn stop(&mut self) -> Result<(), TickError> {
        self.handle.send(&DevicePayload::Neutral)?;
        self.output = 0.0;
        Ok(())
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn status(&self) -> DeviceStatus {
        self.handle.status()
    }
}
