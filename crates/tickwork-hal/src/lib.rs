//! `tickwork-hal` – Device acquisition and hardware collaborators
//!
//! The control layer never speaks a physical protocol.  It talks to devices
//! through two small traits and leaves the wire format to the driver behind
//! them.
//!
//! # Modules
//!
//! - [`transport`] – [`Connector`][transport::Connector] and
//!   [`Link`][transport::Link]: the connect/send/status capability the
//!   hardware layer provides.
//! - [`device`] – [`DeviceHandle`][device::DeviceHandle]: owns one device
//!   connection, chosen from an ordered list of transport candidates.
//! - [`led`] – [`LedController`][led::LedController]: zone/group colours and
//!   scrolling text for LED controllers.
//! - [`motor`] – [`MotorController`][motor::MotorController]: normalised
//!   duty-cycle output for a motor controller.
//! - [`sim`] – [`SimConnector`][sim::SimConnector]: in-process transports for
//!   tests and for running without a robot attached.

pub mod device;
pub mod led;
pub mod motor;
pub mod sim;
pub mod transport;

pub use device::{ConnectionResult, DeviceConfig, DeviceHandle};
pub use led::LedController;
pub use motor::MotorController;
pub use sim::{SimConnector, SimLink, SimWire};
pub use transport::{Connector, Link};
